//! Transformation of approved forms into export lines
//!
//! Three rule sets expand source detail rows into [`ExportLineItem`]s:
//!
//! - **Order**: primary sale, conditional discount, matched free goods, add-ons
//! - **Sample**: one no-charge sample line per row
//! - **Return**: one or two lines per row chosen by the form's request type
//!
//! The rule sets are declared as tables in [`rules`] and executed by
//! [`RuleEngine`]. The transformation is a pure function of the source rows,
//! so re-running it over the same requisition yields the same lines.
//!
//! [`ExportLineItem`]: crate::domain::ExportLineItem

pub mod engine;
pub mod format;
pub mod line;
pub mod pricing;
pub mod rules;

pub use engine::{RuleEngine, TransformOptions, VariantOutput};
pub use format::{format_item, form_no};
