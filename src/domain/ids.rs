//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that travel through the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requisition identifier newtype wrapper
///
/// Identifies one approved workflow form instance. Queue entries, source
/// detail rows and export lines all carry it.
///
/// # Examples
///
/// ```
/// use formbridge::domain::ids::RequisitionId;
/// use std::str::FromStr;
///
/// let id = RequisitionId::from_str("REQ-2024-000117").unwrap();
/// assert_eq!(id.as_str(), "REQ-2024-000117");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequisitionId(String);

impl RequisitionId {
    /// Creates a new RequisitionId
    ///
    /// Returns `Err` when the identifier is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Requisition ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the requisition ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RequisitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequisitionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RequisitionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Workflow type of a source approval record
///
/// Each variant has its own detail schema and rule set. The diagram ID is
/// the tag the workflow store uses for the form type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainVariant {
    /// Sales order forms
    Order,
    /// Free sample requests
    Sample,
    /// Returns, exchanges and discounts
    Return,
}

impl DomainVariant {
    /// All variants in processing order
    pub const ALL: [DomainVariant; 3] = [Self::Order, Self::Sample, Self::Return];

    /// Diagram ID used by the workflow store
    pub fn diagram_id(self) -> &'static str {
        match self {
            Self::Order => "TWC1D002",
            Self::Sample => "TWC0D003",
            Self::Return => "TWC0D004",
        }
    }

    /// Resolves a diagram ID back to its variant
    pub fn from_diagram_id(diagram_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.diagram_id().eq_ignore_ascii_case(diagram_id.trim()))
    }
}

impl fmt::Display for DomainVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diagram_id())
    }
}

impl FromStr for DomainVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "order" => Ok(Self::Order),
            "sample" => Ok(Self::Sample),
            "return" => Ok(Self::Return),
            other => Self::from_diagram_id(other)
                .ok_or_else(|| format!("Unknown domain variant '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requisition_id_rejects_blank() {
        assert!(RequisitionId::new("").is_err());
        assert!(RequisitionId::new("   ").is_err());
        assert_eq!(RequisitionId::new("R1").unwrap().to_string(), "R1");
    }

    #[test]
    fn test_requisition_id_serializes_as_plain_string() {
        let id = RequisitionId::new("R-77").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"R-77\"");
    }

    #[test]
    fn test_variant_diagram_round_trip() {
        for variant in DomainVariant::ALL {
            assert_eq!(
                DomainVariant::from_diagram_id(variant.diagram_id()),
                Some(variant)
            );
        }
        assert_eq!(DomainVariant::from_diagram_id("TWC9D999"), None);
    }

    #[test]
    fn test_variant_from_str_accepts_names_and_diagrams() {
        assert_eq!("order".parse::<DomainVariant>().unwrap(), DomainVariant::Order);
        assert_eq!("TWC0D004".parse::<DomainVariant>().unwrap(), DomainVariant::Return);
        assert!("invoice".parse::<DomainVariant>().is_err());
    }
}
