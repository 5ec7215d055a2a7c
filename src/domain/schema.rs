//! Static table descriptors
//!
//! A `TableSchema` names a target table, its key columns and an ordered list
//! of `FieldSpec`s. Descriptors are plain constant tables; the reference-data
//! mapper, the staged loader and the XML writer all read the same list.

/// Value a field takes when it is not read from the source record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// Empty text
    Empty,
    /// Fixed text literal
    Text(&'static str),
    /// Timestamp of the mapping run
    Now,
}

/// One column of a table descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Target column name
    pub column: &'static str,
    /// Element name in external records
    pub source_tag: &'static str,
    /// `X` marker becomes `1`, anything else `0`
    pub is_boolean_flag: bool,
    /// Not read from the source; keeps `default`. Also excluded from the
    /// merge change detection.
    pub skip_on_read: bool,
    /// Blank source text becomes NULL
    pub is_numeric: bool,
    pub default: FieldDefault,
}

impl FieldSpec {
    /// Plain text column read from `source_tag`
    pub const fn text(column: &'static str, source_tag: &'static str) -> Self {
        Self {
            column,
            source_tag,
            is_boolean_flag: false,
            skip_on_read: false,
            is_numeric: false,
            default: FieldDefault::Empty,
        }
    }

    /// Numeric column; blank source text maps to NULL
    pub const fn numeric(column: &'static str, source_tag: &'static str) -> Self {
        let mut spec = Self::text(column, source_tag);
        spec.is_numeric = true;
        spec
    }

    /// Boolean marker column stored as `1`/`0`
    pub const fn flag(column: &'static str, source_tag: &'static str) -> Self {
        let mut spec = Self::text(column, source_tag);
        spec.is_boolean_flag = true;
        spec
    }

    /// Column that is never read from the source
    pub const fn skipped(column: &'static str, default: FieldDefault) -> Self {
        let mut spec = Self::text(column, column);
        spec.skip_on_read = true;
        spec.default = default;
        spec
    }

    /// Column written by the pipeline itself, named the same in files
    pub const fn column(column: &'static str) -> Self {
        Self::text(column, column)
    }

    pub const fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }
}

/// Descriptor of a target table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Target table name
    pub table: String,
    /// Element name of one row in external files
    pub root_element: &'static str,
    /// Key columns used to match staging rows against the target
    pub primary_key: &'static [&'static str],
    /// Columns in storage order
    pub fields: &'static [FieldSpec],
}

impl TableSchema {
    pub fn new(
        table: impl Into<String>,
        root_element: &'static str,
        primary_key: &'static [&'static str],
        fields: &'static [FieldSpec],
    ) -> Self {
        Self {
            table: table.into(),
            root_element,
            primary_key,
            fields,
        }
    }

    /// All column names in storage order
    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.column).collect()
    }

    pub fn is_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|k| k.eq_ignore_ascii_case(column))
    }

    /// Position of a column in the field list
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.column.eq_ignore_ascii_case(column))
    }

    /// Non-key columns that take part in change detection
    pub fn compare_columns(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| !f.skip_on_read && !self.is_key(f.column))
            .map(|f| f.column)
            .collect()
    }

    /// Non-key columns written when a matched row is updated
    pub fn update_columns(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| !self.is_key(f.column))
            .map(|f| f.column)
            .collect()
    }

    /// Checks that every key column is part of the field list
    pub fn validate(&self) -> Result<(), String> {
        if self.table.trim().is_empty() {
            return Err("table name cannot be empty".to_string());
        }
        if self.primary_key.is_empty() {
            return Err(format!("table '{}' has no key columns", self.table));
        }
        for key in self.primary_key {
            if self.index_of(key).is_none() {
                return Err(format!(
                    "key column '{}' is not a field of table '{}'",
                    key, self.table
                ));
            }
        }
        Ok(())
    }
}
