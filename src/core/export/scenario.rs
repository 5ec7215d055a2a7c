//! Export file scenarios
//!
//! Each scenario selects pending export lines for one downstream party and
//! writes them with a fixed element list.

use crate::domain::{export_schema, ExportLineItem, FormbridgeError, StageRow};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Export table column and the element it is written as, in file order
const FILE_COLUMNS: &[(&str, &str)] = &[
    ("FormNo", "FormNo"),
    ("FormItem", "FormItem"),
    ("FormRefItem", "FormRefItem"),
    ("ApplicantID", "ApplicantID"),
    ("SalesOrg", "SalesOrg"),
    ("DistributionChannel", "DistributionChannel"),
    ("Division", "Division"),
    ("ReceivingParty", "ReceivingParty"),
    ("CustomerCode", "CustomerNumber"),
    ("CustomerName", "CustomerName"),
    ("SPNumber", "SPNumber"),
    ("ApprovalDate", "ApprovalDate"),
    ("Remark", "Remark"),
    ("ItemCategory", "ItemCategory"),
    ("PricingType", "PricingType"),
    ("PricingGroup", "PricingGroup"),
    ("MaterialCode", "MaterialCode"),
    ("Batch", "Batch"),
    ("SalesChannel", "SalesChannel"),
    ("Qty", "Qty"),
    ("SalesUnit", "SalesUnit"),
    ("DebitCreditType", "DebitCreditType"),
    ("Currency", "Currency"),
    ("InvoicePriceWithTax", "InvoicePriceWithTax"),
    ("InvoicePrice", "InvoicePrice"),
    ("TotalInvoicePriceWithTax", "TotalInvoicePriceWithTax"),
    ("TotalInvoicePrice", "TotalInvoicePrice"),
    ("FixedPriceWithTax", "FixedPriceWithTax"),
    ("PricingUnit", "PricingUnit"),
    ("ItemPurpose", "ItemPurpose"),
    ("ReturnCode", "ReturnCode"),
    ("SalesDate", "SalesDate"),
    ("OriginSONumber", "OriginSONumber"),
    ("OriginSOItem", "OriginSOItem"),
    ("NewSONumber", "NewSONumber"),
    ("NewSOItem", "NewSOItem"),
    ("InvoiceNumber", "InvoiceNumber"),
    ("InvoiceDate", "InvoiceDate"),
    ("CreditNote", "CreditNote"),
    ("ValidityPeriod", "ValidityPeriod"),
    ("Sloc", "Sloc"),
    ("CostCenter", "CostCenter"),
];

const COST_CENTER: &str = "CostCenter";

/// Downstream receiver of export files
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExportScenario {
    /// Every pending line, for the ERP
    #[serde(rename = "to_sap", alias = "ToSAP")]
    ToSap,
    /// Lines billed through the logistics partner (`L`)
    #[serde(rename = "to_arich", alias = "ToARICH")]
    ToArich,
    /// Lines billed directly (`B`)
    #[serde(rename = "to_zl", alias = "ToZL")]
    ToZl,
}

impl ExportScenario {
    /// Scenarios in the order they are written
    pub const ALL: [ExportScenario; 3] = [Self::ToSap, Self::ToArich, Self::ToZl];

    /// Name used in file names and logs
    pub fn name(self) -> &'static str {
        match self {
            Self::ToSap => "ToSAP",
            Self::ToArich => "ToARICH",
            Self::ToZl => "ToZL",
        }
    }

    /// Receiving party filter; `None` selects every line
    pub fn receiving_party(self) -> Option<&'static str> {
        match self {
            Self::ToSap => None,
            Self::ToArich => Some("L"),
            Self::ToZl => Some("B"),
        }
    }

    pub fn includes_cost_center(self) -> bool {
        matches!(self, Self::ToSap)
    }

    /// Element names written for each record
    pub fn elements(self) -> Vec<&'static str> {
        self.file_columns().map(|(_, element)| element).collect()
    }

    fn file_columns(self) -> impl Iterator<Item = (&'static str, &'static str)> {
        let with_cost_center = self.includes_cost_center();
        FILE_COLUMNS
            .iter()
            .copied()
            .filter(move |(column, _)| with_cost_center || *column != COST_CENTER)
    }

    /// `BPM_Export_{scenario}_{formNo}_{yyyyMMddHHmmss}.xml`
    pub fn file_name(self, form_no: &str, at: NaiveDateTime) -> String {
        format!(
            "BPM_Export_{}_{}_{}.xml",
            self.name(),
            form_no,
            at.format("%Y%m%d%H%M%S")
        )
    }

    /// Element/value pairs of one line as written to the file
    pub fn record(self, line: &ExportLineItem) -> Vec<(String, String)> {
        let schema = export_schema("export");
        let values = line.column_values();
        self.file_columns()
            .map(|(column, element)| {
                let value = schema
                    .index_of(column)
                    .and_then(|i| values.get(i))
                    .map(|v| v.render())
                    .unwrap_or_default();
                (element.to_string(), value)
            })
            .collect()
    }
}

impl fmt::Display for ExportScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportScenario {
    type Err = FormbridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tosap" | "to_sap" | "sap" => Ok(Self::ToSap),
            "toarich" | "to_arich" | "arich" => Ok(Self::ToArich),
            "tozl" | "to_zl" | "zl" => Ok(Self::ToZl),
            other => Err(FormbridgeError::Validation(format!(
                "Unknown export scenario '{other}'"
            ))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{at, line};
    use super::*;
    use test_case::test_case;

    #[test_case(ExportScenario::ToSap, None, true ; "sap takes every line")]
    #[test_case(ExportScenario::ToArich, Some("L"), false ; "arich takes partner lines")]
    #[test_case(ExportScenario::ToZl, Some("B"), false ; "zl takes direct lines")]
    fn test_scenario_selection(scenario: ExportScenario, party: Option<&str>, cost_center: bool) {
        assert_eq!(scenario.receiving_party(), party);
        assert_eq!(scenario.includes_cost_center(), cost_center);
        assert_eq!(scenario.elements().contains(&"CostCenter"), cost_center);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            ExportScenario::ToArich.file_name("2512000042", at()),
            "BPM_Export_ToARICH_2512000042_20251205083000.xml"
        );
    }

    #[test]
    fn test_record_renders_file_elements() {
        let line = line("REQ-1", "TWC12512000042", 2, 1);
        let record = ExportScenario::ToSap.record(&line);

        assert_eq!(record.len(), 42);
        assert_eq!(record[0], ("FormNo".to_string(), "2512000042".to_string()));
        assert!(record.contains(&("CustomerNumber".to_string(), "C100".to_string())));
        assert!(record.contains(&("Qty".to_string(), "2".to_string())));
        assert!(record.contains(&("Remark".to_string(), String::new())));
        assert_eq!(
            record.last(),
            Some(&("CostCenter".to_string(), "TW02_72100".to_string()))
        );
        assert!(!record.iter().any(|(tag, _)| tag == "RequisitionID"));

        let partner = ExportScenario::ToArich.record(&line);
        assert_eq!(partner.len(), 41);
        assert_eq!(partner.last().map(|(tag, _)| tag.as_str()), Some("Sloc"));
    }

    #[test_case("ToSAP", ExportScenario::ToSap)]
    #[test_case("arich", ExportScenario::ToArich)]
    #[test_case("to_zl", ExportScenario::ToZl)]
    fn test_parse(input: &str, expected: ExportScenario) {
        assert_eq!(input.parse::<ExportScenario>().unwrap(), expected);
    }
}
