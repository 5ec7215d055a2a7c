//! Reference-data synchronization
//!
//! Master data (customers, materials, prices, sales staff) arrives from the
//! ERP as XML extracts. Each kind has a static descriptor in [`schemas`];
//! [`RecordMapper`] turns extract records into rows and the staged loader
//! merges them into the reference tables.

pub mod mapper;
pub mod processor;
pub mod registry;
pub mod report;
pub mod schemas;

pub use mapper::{map_field, RawRecord, RecordMapper, ReferenceRow};
pub use processor::{
    FileProcessingResult, KindDirectories, ReferenceDataProcessor, SingleFileResult,
};
pub use registry::SchemaRegistry;
pub use schemas::ReferenceKind;
