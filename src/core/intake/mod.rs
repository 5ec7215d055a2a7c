//! Intake queue: discovery of approved requisitions and their processing state

pub mod manager;
pub mod window;

pub use manager::{IntakeQueueManager, WindowSettings};
pub use window::DiscoveryWindow;
