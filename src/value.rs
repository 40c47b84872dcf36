//! Cell values held by a dataset.
//!
//! A cell is either a categorical label or a number. Values are totally
//! ordered and hashable so they can be used directly as grouping keys.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A single dataset cell.
///
/// Ordering puts numbers before categories; numbers compare by IEEE total
/// order and categories compare lexically. Equality and hashing agree with
/// that ordering, so `NaN` equals itself and `-0.0` differs from `0.0`.
///
/// # Examples
///
/// ```
/// use simpsons::Value;
///
/// let dept = Value::from("A");
/// let count = Value::from(90.0);
///
/// assert!(dept.is_category());
/// assert_eq!(count.as_number(), Some(90.0));
/// assert!(count < dept);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Category(String),
}

impl Value {
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    pub const fn is_category(&self) -> bool {
        matches!(self, Self::Category(_))
    }

    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::Category(v) => Some(v),
            Self::Number(_) => None,
        }
    }

    /// Label used when matching against configured category orders and
    /// when naming partitions in chart legends.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Category(_) => "category",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Category(a), Self::Category(b)) => a.cmp(b),
            (Self::Number(_), Self::Category(_)) => Ordering::Less,
            (Self::Category(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Number(v) => {
                0u8.hash(state);
                v.to_bits().hash(state);
            }
            Self::Category(v) => {
                1u8.hash(state);
                v.hash(state);
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Category(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Category(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Category(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_value_category() {
        let val = Value::from("men");
        assert!(val.is_category());
        assert_eq!(val.as_category(), Some("men"));
        assert_eq!(val.as_number(), None);
        assert_eq!(val.type_name(), "category");
    }

    #[test]
    fn test_value_number() {
        let val = Value::from(42);
        assert!(val.is_number());
        assert_eq!(val.as_number(), Some(42.0));
        assert_eq!(val.as_category(), None);
        assert_eq!(val.type_name(), "number");
    }

    #[test]
    fn test_value_ordering() {
        let mut vals = vec![
            Value::from("b"),
            Value::from(10.0),
            Value::from("a"),
            Value::from(-1.5),
        ];
        vals.sort();
        assert_eq!(
            vals,
            vec![
                Value::from(-1.5),
                Value::from(10.0),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_value_hash_agrees_with_eq() {
        let mut set = HashSet::new();
        set.insert(Value::from(f64::NAN));
        set.insert(Value::from(f64::NAN));
        set.insert(Value::from("x"));
        set.insert(Value::from("x"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("A").to_string(), "A");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(3.0).to_string(), "3");
    }

    #[test]
    fn test_value_untagged_serialization() {
        let json = serde_json::to_string(&vec![Value::from("A"), Value::from(1.5)]).unwrap();
        assert_eq!(json, r#"["A",1.5]"#);
        let back: Vec<Value> = serde_json::from_str(r#"["A", 7]"#).unwrap();
        assert_eq!(back, vec![Value::from("A"), Value::from(7.0)]);
    }
}
