//! Column descriptors and cell values.

use std::fmt::{Display, Formatter};

/// Declared data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Integer,
    Decimal,
    Boolean,
}

impl ColumnType {
    /// Default horizontal alignment of cells in this column.
    pub fn alignment(self) -> CellAlignment {
        match self {
            Self::Text => CellAlignment::Leading,
            Self::Integer | Self::Decimal => CellAlignment::Trailing,
            Self::Boolean => CellAlignment::Center,
        }
    }

    /// Accessor name prefix used by name-bound columns.
    pub fn accessor_prefix(self) -> &'static str {
        match self {
            Self::Boolean => "is",
            _ => "get",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAlignment {
    Leading,
    Center,
    Trailing,
}

/// Value rendered in one table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<V: Into<CellValue>> From<Option<V>> for CellValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Name-bound column: header, record property and data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub header: String,
    pub property: String,
    pub data_type: ColumnType,
}

impl ColumnDescriptor {
    pub fn new(
        header: impl Into<String>,
        property: impl Into<String>,
        data_type: ColumnType,
    ) -> Self {
        Self {
            header: header.into(),
            property: property.into(),
            data_type,
        }
    }
}

/// Read accessor of a record type.
pub type Accessor<T> = fn(&T) -> CellValue;

/// Record types that publish their read accessors by name.
///
/// Names follow the `get<Property>` / `is<Property>` convention and are
/// matched case-insensitively by name-bound columns.
pub trait AccessorTable: Sized {
    fn accessors() -> Vec<(&'static str, Accessor<Self>)>;
}

#[cfg(test)]
mod tests {
    use super::{CellAlignment, CellValue, ColumnType};

    #[test]
    fn numbers_align_trailing_and_flags_center() {
        assert_eq!(ColumnType::Integer.alignment(), CellAlignment::Trailing);
        assert_eq!(ColumnType::Decimal.alignment(), CellAlignment::Trailing);
        assert_eq!(ColumnType::Boolean.alignment(), CellAlignment::Center);
        assert_eq!(ColumnType::Text.alignment(), CellAlignment::Leading);
    }

    #[test]
    fn missing_optional_values_render_empty() {
        let value = CellValue::from(None::<i64>);
        assert_eq!(value, CellValue::Empty);
        assert_eq!(value.to_string(), "");
        assert_eq!(CellValue::from(Some(7_i64)).to_string(), "7");
    }
}
