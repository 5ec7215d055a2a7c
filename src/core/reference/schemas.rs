//! Reference-data descriptors
//!
//! One constant field table per master-data kind. Column order is storage
//! order; `source_tag` is the element name in the ERP's XML extracts.

use crate::domain::{FieldDefault, FieldSpec, TableSchema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Master-data file kinds, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Customer,
    Material,
    Price,
    Sales,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 4] = [Self::Customer, Self::Material, Self::Price, Self::Sales];

    pub fn name(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Material => "Material",
            Self::Price => "Price",
            Self::Sales => "Sales",
        }
    }

    /// Unqualified target table
    pub fn table(self) -> &'static str {
        match self {
            Self::Customer => "Sales_CustomerMaster",
            Self::Material => "Sales_MaterialMaster",
            Self::Price => "Sales_PriceMaster",
            Self::Sales => "Sales_SalesMaster",
        }
    }

    pub fn root_element(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Material => "MATERIAL",
            Self::Price => "PRICE",
            Self::Sales => "SALES",
        }
    }

    pub fn primary_key(self) -> &'static [&'static str] {
        match self {
            Self::Customer => &["Number"],
            Self::Material => &["MaterialCode", "SalesOrg", "DistributionChannel", "Division"],
            Self::Price => &[
                "SalesOrg",
                "DistributionChannel",
                "PricingType",
                "PricingGroup",
                "DocCurrency",
                "MaterialCode",
            ],
            Self::Sales => &["ADAccount"],
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Customer => CUSTOMER_FIELDS,
            Self::Material => MATERIAL_FIELDS,
            Self::Price => PRICE_FIELDS,
            Self::Sales => SALES_FIELDS,
        }
    }

    /// Descriptor with the table optionally qualified by `table_schema`
    pub fn descriptor(self, table_schema: Option<&str>) -> TableSchema {
        let table = match table_schema {
            Some(schema) if !schema.is_empty() => format!("{schema}.{}", self.table()),
            _ => self.table().to_string(),
        };
        TableSchema::new(table, self.root_element(), self.primary_key(), self.fields())
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("Unknown reference kind '{s}'. Must be one of: customer, material, price, sales")
            })
    }
}

const MODIFIED_BY_PIPELINE: FieldSpec = FieldSpec::skipped("ModifyBy", FieldDefault::Text("4PLAPI"));
const MODIFIED_AT: FieldSpec = FieldSpec::skipped("ModifyTime", FieldDefault::Now);

pub const CUSTOMER_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("Number", "KUNNR"),
    FieldSpec::text("SalesOrg", "VKORG"),
    FieldSpec::text("DistributionChannel", "VTWEG"),
    FieldSpec::text("Division", "SPART"),
    FieldSpec::text("PartnerFunction", "PARVW"),
    FieldSpec::text("SPNumber", "KUNNR_SP"),
    FieldSpec::text("Name", "NAME1"),
    FieldSpec::text("AccountGroup", "KTOKD"),
    FieldSpec::text("Address", "STRAS"),
    FieldSpec::text("Country", "LAND1"),
    FieldSpec::text("PostalCode", "PSTLZ"),
    FieldSpec::text("City", "ORT01"),
    FieldSpec::text("OwnerName", "SORT2"),
    FieldSpec::text("TEL", "TEL_NUMBER"),
    FieldSpec::text("FAX", "FAX_NUMBER"),
    FieldSpec::text("CreditLimit", "KLIMK"),
    FieldSpec::text("NextReviewDate", "NXTRV"),
    FieldSpec::text("ExternalUnitNumber", "ZEXGEN_UNIT"),
    FieldSpec::text("ExternalLicenseNumber", "ZEXGEN_LCNS"),
    FieldSpec::text("GUINumber", "ZSTCD1"),
    FieldSpec::text("InvoiceCoupon", "ZSTCD2"),
    FieldSpec::text("Remark", "ZCSMEMO"),
    FieldSpec::text("PaymentTermsDays", "ZTERM"),
    FieldSpec::text("PaymentTerms", "ZWELS"),
    FieldSpec::text("PriceListType", "PLTYP"),
    FieldSpec::text("SalesType", "KLABC"),
    // Read from the extract, unlike the other kinds
    FieldSpec::text("ModifyBy", "ModifyBy"),
    FieldSpec::flag("IsDelete", "DEL"),
];

pub const MATERIAL_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("MaterialCode", "MATNR"),
    FieldSpec::text("SalesOrg", "VKORG"),
    FieldSpec::text("DistributionChannel", "VTWEG"),
    FieldSpec::text("Division", "SPART"),
    FieldSpec::text("MaterialDesc", "MAKTX"),
    FieldSpec::text("BaseUOM", "MEINS"),
    FieldSpec::text("PurchaseText", "ZLEGCTL"),
    FieldSpec::text("LegalControl", "Z_TW_NHIBX"),
    FieldSpec::text("NHIBCode", "Z_TW_NHIB"),
    FieldSpec::text("StorageConditions", "RAUBE"),
    FieldSpec::text("SalesUnit", "VRKME"),
    FieldSpec::text("MaterialGroup", "MVGR5"),
    FieldSpec::text("ProductSpec", "Z_TW_SPEC"),
    FieldSpec::text("DrugPermitLicense", "Z_TW_DRUG_LICENSE"),
    FieldSpec::text("MinUnit", "Z_MINIMUM_UOM"),
    FieldSpec::text("PackageUnit", "Z_PACK_UOM"),
    FieldSpec::text("Indication1", "Z_INDIC_1"),
    FieldSpec::text("Indication2", "Z_INDIC_2"),
    FieldSpec::text("Indication3", "Z_INDIC_3"),
    FieldSpec::text("DosageForm", "Z_DOSAGE_FORM"),
    FieldSpec::text("Strength", "Z_STRENGHT"),
    FieldSpec::text("PackSize", "Z_PACK_SIZE"),
    MODIFIED_BY_PIPELINE,
    MODIFIED_AT,
];

pub const PRICE_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("SalesOrg", "VKORG"),
    FieldSpec::text("DistributionChannel", "VTWEG"),
    FieldSpec::text("PricingType", "PRCTYP"),
    FieldSpec::text("PricingGroup", "PLTYP_KUNNR"),
    FieldSpec::text("DocCurrency", "WAERK"),
    FieldSpec::text("MaterialCode", "MATNR"),
    FieldSpec::text("ValidOn", "VALID"),
    FieldSpec::numeric("InvoicePrice", "KBETR_PR00"),
    FieldSpec::text("Currency", "KONWA"),
    FieldSpec::numeric("ConditionPriceUnit", "KPEIN"),
    FieldSpec::text("ConditionUnit", "KMEIN"),
    FieldSpec::text("ConditionValidFrom", "DATAB"),
    FieldSpec::text("ConditionValidTo", "DATBI"),
    FieldSpec::numeric("FixedPrice", "KBETR_ZTW2"),
    FieldSpec::numeric("MinQty", "KNRMM"),
    FieldSpec::numeric("FreeGoodsQty", "KNRNM"),
    FieldSpec::numeric("AdditionFreeGoodsQty", "KNRZM"),
    FieldSpec::text("AdditionFreeGoodsMaterialCode", "KNRMAT"),
    FieldSpec::text("AdditionFreeGoodsUnit", "KNREZ"),
    FieldSpec::text("ScaleQty", "SCALE_QUANTITY"),
    FieldSpec::text("ScaleAmount", "SCALE_AMOUNT"),
    FieldSpec::text("Responsibility", "KZUST"),
    FieldSpec::text("BPMFormNo", "FORM_NO"),
    MODIFIED_BY_PIPELINE,
    MODIFIED_AT,
];

pub const SALES_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("ADAccount", "SALES_AD"),
    FieldSpec::text("Name", "ENAME"),
    FieldSpec::text("District", "BZIRK"),
    FieldSpec::text("Office", "VKBUR"),
    FieldSpec::text("GroupCode", "VKGRP"),
    FieldSpec::text("Account", "SALESA"),
    FieldSpec::text("EmployeeID", "PERNR"),
    MODIFIED_BY_PIPELINE,
    MODIFIED_AT,
];
