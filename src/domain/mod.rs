//! Domain models and types for Formbridge.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`RequisitionId`], [`DomainVariant`])
//! - **Source rows** read from the workflow store ([`OrderDetail`], [`SampleDetail`], [`ReturnDetail`])
//! - **The export line** ([`ExportLineItem`]) and its categories
//! - **Table descriptors** ([`TableSchema`], [`FieldSpec`]) shared by mapping and loading
//! - **Error types** ([`FormbridgeError`], [`TransformError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, FormbridgeError>`]:
//!
//! ```rust
//! use formbridge::domain::{FormbridgeError, Result};
//!
//! fn check_table(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(FormbridgeError::Validation("table name is empty".into()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod export;
pub mod ids;
pub mod records;
pub mod result;
pub mod schema;
pub mod value;

pub use errors::{FormbridgeError, TransformError};
pub use export::{export_schema, DebitCredit, ExportLineItem, ItemCategory, EXPORT_FIELDS};
pub use ids::{DomainVariant, RequisitionId};
pub use records::{
    AddOnDetail, FormHeader, FreeGoodsDetail, OrderBatch, OrderDetail, QueueCandidate,
    QueueEntry, ReturnDetail, SampleDetail,
};
pub use result::Result;
pub use schema::{FieldDefault, FieldSpec, TableSchema};
pub use value::{ColumnValue, StageRow};
