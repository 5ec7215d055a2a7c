//! Diff-merge statement construction
//!
//! A merge matches staging rows to target rows on every key column. Matched
//! rows are updated only when a compared column is distinct; unmatched rows
//! are inserted. Two renderings are supported: PostgreSQL `MERGE` and
//! `INSERT .. ON CONFLICT DO UPDATE .. WHERE`, which needs a unique index on
//! the key columns.

use crate::domain::TableSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a merge is rendered as SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// `MERGE INTO .. USING ..`
    #[default]
    Merge,
    /// `INSERT .. ON CONFLICT (key) DO UPDATE .. WHERE ..`
    Upsert,
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "upsert" => Ok(Self::Upsert),
            _ => Err(format!(
                "Invalid merge strategy '{s}'. Must be one of: merge, upsert"
            )),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => f.write_str("merge"),
            Self::Upsert => f.write_str("upsert"),
        }
    }
}

/// Everything needed to merge one staging table into its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub target: String,
    pub staging: String,
    pub key_columns: Vec<String>,
    /// Non-key columns whose difference triggers an update
    pub compare_columns: Vec<String>,
    /// Non-key columns written on update
    pub update_columns: Vec<String>,
    /// All columns, written on insert
    pub insert_columns: Vec<String>,
    pub strategy: MergeStrategy,
}

impl MergePlan {
    pub fn from_schema(schema: &TableSchema, staging: &str, strategy: MergeStrategy) -> Self {
        let owned = |cols: Vec<&str>| cols.into_iter().map(str::to_string).collect();
        Self {
            target: schema.table.clone(),
            staging: staging.to_string(),
            key_columns: schema.primary_key.iter().map(|k| k.to_string()).collect(),
            compare_columns: owned(schema.compare_columns()),
            update_columns: owned(schema.update_columns()),
            insert_columns: owned(schema.columns()),
            strategy,
        }
    }

    /// Whether matched rows can ever be updated
    pub fn updates_matched(&self) -> bool {
        !self.compare_columns.is_empty() && !self.update_columns.is_empty()
    }

    pub fn to_sql(&self) -> String {
        match self.strategy {
            MergeStrategy::Merge => self.merge_sql(),
            MergeStrategy::Upsert => self.upsert_sql(),
        }
    }

    fn merge_sql(&self) -> String {
        let on = self
            .key_columns
            .iter()
            .map(|k| format!("t.{c} = s.{c}", c = quote_ident(k)))
            .collect::<Vec<_>>()
            .join(" AND ");

        let mut sql = format!(
            "MERGE INTO {} AS t\nUSING {} AS s\nON {}",
            quote_qualified(&self.target),
            quote_qualified(&self.staging),
            on
        );

        if self.updates_matched() {
            let sets = self
                .update_columns
                .iter()
                .map(|c| format!("{col} = s.{col}", col = quote_ident(c)))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(
                "\nWHEN MATCHED AND ({}) THEN\n    UPDATE SET {}",
                change_predicate(&self.compare_columns, "t", "s"),
                sets
            ));
        }

        sql.push_str(&format!(
            "\nWHEN NOT MATCHED THEN\n    INSERT ({}) VALUES ({})",
            column_list(&self.insert_columns, None),
            column_list(&self.insert_columns, Some("s"))
        ));
        sql
    }

    fn upsert_sql(&self) -> String {
        let mut sql = format!(
            "INSERT INTO {} AS t ({})\nSELECT {} FROM {}\nON CONFLICT ({})",
            quote_qualified(&self.target),
            column_list(&self.insert_columns, None),
            column_list(&self.insert_columns, None),
            quote_qualified(&self.staging),
            column_list(&self.key_columns, None)
        );

        if self.updates_matched() {
            let sets = self
                .update_columns
                .iter()
                .map(|c| format!("{col} = EXCLUDED.{col}", col = quote_ident(c)))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(
                " DO UPDATE SET {}\nWHERE {}",
                sets,
                change_predicate(&self.compare_columns, "t", "EXCLUDED")
            ));
        } else {
            sql.push_str(" DO NOTHING");
        }
        sql
    }
}

/// OR-joined NULL-safe difference test over `columns`
pub fn change_predicate(columns: &[String], left: &str, right: &str) -> String {
    columns
        .iter()
        .map(|c| {
            let col = quote_ident(c);
            format!("{left}.{col} IS DISTINCT FROM {right}.{col}")
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Double-quotes an identifier, escaping embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes each part of a possibly schema-qualified name
pub fn quote_qualified(name: &str) -> String {
    name.split('.').map(quote_ident).collect::<Vec<_>>().join(".")
}

fn column_list(columns: &[String], alias: Option<&str>) -> String {
    columns
        .iter()
        .map(|c| match alias {
            Some(a) => format!("{a}.{}", quote_ident(c)),
            None => quote_ident(c),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
