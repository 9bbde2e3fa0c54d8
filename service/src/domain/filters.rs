//! Query filters derived from field operations.

use std::cmp::Ordering;
use std::str::FromStr;

use serde_json::{Map, Value};

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Equal to the filter value.
    Eq,
    /// Not equal to the filter value.
    Ne,
    /// Strictly greater than the filter value.
    Gt,
    /// Greater than or equal to the filter value.
    Ge,
    /// Strictly less than the filter value.
    Lt,
    /// Less than or equal to the filter value.
    Le,
}

/// Returned when a query op is not one of the supported comparisons.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported filter operation: {0}")]
pub struct UnknownFilterOp(String);

impl FromStr for FilterOp {
    type Err = UnknownFilterOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "gt" => Ok(Self::Gt),
            "ge" => Ok(Self::Ge),
            "lt" => Ok(Self::Lt),
            "le" => Ok(Self::Le),
            other => Err(UnknownFilterOp(other.to_owned())),
        }
    }
}

/// A single `field op value` predicate over JSON records.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    op: FilterOp,
    value: Value,
}

impl Filter {
    /// Build a filter.
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Field the filter applies to.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Comparison operator.
    pub fn op(&self) -> FilterOp {
        self.op
    }

    /// Validated comparison value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether `record` satisfies the predicate.
    ///
    /// A record without the field only satisfies `ne`. Ordering comparisons
    /// between values of different kinds never match.
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        let Some(actual) = record.get(&self.field).filter(|value| !value.is_null()) else {
            return self.op == FilterOp::Ne;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Ne => actual != &self.value,
            FilterOp::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            FilterOp::Ge => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Le => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64()?.partial_cmp(&right.as_f64()?),
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        _ => None,
    }
}
