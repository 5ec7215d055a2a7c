//! Descriptor-driven record mapping
//!
//! External files carry flat records: one element per field, keyed by the
//! field's source tag. The mapper turns such a record into a row of column
//! values in descriptor order, and back.

use crate::domain::{ColumnValue, FieldDefault, FieldSpec, StageRow, TableSchema};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Flat tag/value record as read from or written to a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(tag.into(), value.into());
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields.get(tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A mapped reference-data row
///
/// Serializes as a column/value map, which is what failure reports show.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    fields: &'static [FieldSpec],
    values: Vec<ColumnValue>,
}

impl ReferenceRow {
    pub fn values(&self) -> &[ColumnValue] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.fields
            .iter()
            .position(|f| f.column == column)
            .and_then(|i| self.values.get(i))
    }
}

impl Serialize for ReferenceRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.fields.iter().zip(&self.values) {
            map.serialize_entry(field.column, value)?;
        }
        map.end()
    }
}

impl StageRow for ReferenceRow {
    fn column_values(&self) -> Vec<ColumnValue> {
        self.values.clone()
    }
}

/// Maps records of one schema
pub struct RecordMapper<'a> {
    schema: &'a TableSchema,
    now: NaiveDateTime,
}

impl<'a> RecordMapper<'a> {
    /// `now` fills every `FieldDefault::Now` column
    pub fn new(schema: &'a TableSchema, now: NaiveDateTime) -> Self {
        Self { schema, now }
    }

    pub fn map(&self, record: &RawRecord) -> ReferenceRow {
        ReferenceRow {
            fields: self.schema.fields,
            values: self
                .schema
                .fields
                .iter()
                .map(|f| map_field(f, record.get(f.source_tag), self.now))
                .collect(),
        }
    }

    pub fn map_all(&self, records: &[RawRecord]) -> Vec<ReferenceRow> {
        records.iter().map(|r| self.map(r)).collect()
    }

    /// Render column values back to a record keyed by source tag
    pub fn to_record(&self, values: &[ColumnValue]) -> RawRecord {
        self.schema
            .fields
            .iter()
            .zip(values)
            .map(|(f, v)| (f.source_tag, v.render()))
            .collect()
    }
}

/// Value of one field given its raw source text
pub fn map_field(field: &FieldSpec, raw: Option<&str>, now: NaiveDateTime) -> ColumnValue {
    if field.skip_on_read {
        return default_value(field.default, now);
    }

    let value = raw.map(str::trim).unwrap_or_default();

    if field.is_boolean_flag {
        let flag = if value.eq_ignore_ascii_case("X") { "1" } else { "0" };
        return ColumnValue::text(flag);
    }

    if field.is_numeric {
        if value.is_empty() {
            return ColumnValue::Decimal(None);
        }
        // Unparsable text is kept so the row fails on insert and gets reported
        return parse_decimal(value)
            .map(|d| ColumnValue::Decimal(Some(d)))
            .unwrap_or_else(|| ColumnValue::text(value));
    }

    ColumnValue::text(value)
}

fn default_value(default: FieldDefault, now: NaiveDateTime) -> ColumnValue {
    match default {
        FieldDefault::Empty => ColumnValue::text(""),
        FieldDefault::Text(text) => ColumnValue::text(text),
        FieldDefault::Now => ColumnValue::Timestamp(Some(now)),
    }
}

/// Decimal parse accepting the ERP's trailing minus sign (`12.50-`)
fn parse_decimal(value: &str) -> Option<Decimal> {
    match value.strip_suffix('-') {
        Some(abs) => Decimal::from_str(abs.trim()).ok().map(|d| -d),
        None => Decimal::from_str(value).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::text("Code", "CODE"),
        FieldSpec::flag("IsDelete", "DEL"),
        FieldSpec::numeric("Price", "PRICE"),
        FieldSpec::skipped("ModifyBy", FieldDefault::Text("4PLAPI")),
        FieldSpec::skipped("ModifyTime", FieldDefault::Now),
    ];

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn schema() -> TableSchema {
        TableSchema::new("Items", "ITEM", &["Code"], FIELDS)
    }

    #[test_case(Some("X"), "1")]
    #[test_case(Some("x"), "1")]
    #[test_case(Some(""), "0")]
    #[test_case(Some("Y"), "0")]
    #[test_case(None, "0")]
    fn test_boolean_flag(raw: Option<&str>, expected: &str) {
        assert_eq!(map_field(&FIELDS[1], raw, now()), ColumnValue::text(expected));
    }

    #[test_case(Some("  "), ColumnValue::Decimal(None) ; "blank is null")]
    #[test_case(None, ColumnValue::Decimal(None) ; "absent is null")]
    #[test_case(Some("12.50"), ColumnValue::Decimal(Some(Decimal::new(1250, 2))) ; "plain")]
    #[test_case(Some("3.5-"), ColumnValue::Decimal(Some(Decimal::new(-35, 1))) ; "trailing minus")]
    #[test_case(Some("abc"), ColumnValue::text("abc") ; "unparsable kept as text")]
    fn test_numeric(raw: Option<&str>, expected: ColumnValue) {
        assert_eq!(map_field(&FIELDS[2], raw, now()), expected);
    }

    #[test]
    fn test_map_record() {
        let record: RawRecord = [("CODE", "  A1 "), ("DEL", "X"), ("ModifyBy", "someone")]
            .into_iter()
            .collect();
        let schema = schema();
        let row = RecordMapper::new(&schema, now()).map(&record);

        assert_eq!(row.get("Code"), Some(&ColumnValue::text("A1")));
        assert_eq!(row.get("IsDelete"), Some(&ColumnValue::text("1")));
        assert_eq!(row.get("Price"), Some(&ColumnValue::Decimal(None)));
        assert_eq!(row.get("ModifyBy"), Some(&ColumnValue::text("4PLAPI")));
        assert_eq!(row.get("ModifyTime"), Some(&ColumnValue::Timestamp(Some(now()))));
        assert_eq!(row.column_values().len(), FIELDS.len());
    }

    #[test]
    fn test_missing_text_is_empty() {
        let schema = schema();
        let row = RecordMapper::new(&schema, now()).map(&RawRecord::new());
        assert_eq!(row.get("Code"), Some(&ColumnValue::text("")));
    }

    #[test]
    fn test_row_serializes_as_column_map() {
        let record: RawRecord = [("CODE", "A1")].into_iter().collect();
        let schema = schema();
        let row = RecordMapper::new(&schema, now()).map(&record);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Code"], "A1");
        assert_eq!(json["Price"], serde_json::Value::Null);
    }

    #[test]
    fn test_to_record_uses_source_tags() {
        let schema = schema();
        let mapper = RecordMapper::new(&schema, now());
        let row = mapper.map(&[("CODE", "A1"), ("PRICE", "2")].into_iter().collect());
        let record = mapper.to_record(row.values());
        assert_eq!(record.get("CODE"), Some("A1"));
        assert_eq!(record.get("PRICE"), Some("2"));
        assert_eq!(record.get("ModifyTime"), Some("2024-05-01 08:30:00"));
    }
}
