//! Partition and entity id newtypes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters allowed in anything that ends up as a path component.
fn is_path_safe(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Isolated acquisition scope, e.g. the season starting year `"2019"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Partition(String);

impl Partition {
    /// Validate and wrap a partition name.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidPartition> {
        let name = name.into();
        if is_path_safe(&name) {
            Ok(Self(name))
        } else {
            Err(InvalidPartition(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Partition {
    type Err = InvalidPartition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Partition {
    type Error = InvalidPartition;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Partition> for String {
    fn from(p: Partition) -> Self {
        p.0
    }
}

/// Rejected partition name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPartition(pub String);

impl fmt::Display for InvalidPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid partition {:?}: use letters, digits, '-', '_' or '.'",
            self.0
        )
    }
}

impl std::error::Error for InvalidPartition {}

/// Opaque identifier of one fetchable unit.
///
/// Kept as the exact text the remote source produced. Game ids such as
/// `"0021900001"` carry leading zeros, so ids are never parsed as numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Canonical id text for a JSON cell.
    ///
    /// Strings pass through verbatim. Integers render in decimal, floats only
    /// when they have no fractional part. Anything else is not an id.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Some(Self(u.to_string()))
                } else {
                    n.as_f64()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| Self(format!("{f:.0}")))
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can be used as a file name.
    pub fn is_path_safe(&self) -> bool {
        is_path_safe(&self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partition_accepts_season_year() {
        assert_eq!(Partition::new("2019").unwrap().as_str(), "2019");
        assert!(Partition::new("2019-20").is_ok());
    }

    #[test]
    fn partition_rejects_paths() {
        assert!(Partition::new("").is_err());
        assert!(Partition::new("..").is_err());
        assert!(Partition::new("a/b").is_err());
        assert!(Partition::new("20*").is_err());
    }

    #[test]
    fn id_from_string_keeps_leading_zeros() {
        let id = EntityId::from_value(&json!("0021900001")).unwrap();
        assert_eq!(id.as_str(), "0021900001");
    }

    #[test]
    fn id_from_numbers() {
        assert_eq!(EntityId::from_value(&json!(203500)).unwrap().as_str(), "203500");
        assert_eq!(EntityId::from_value(&json!(4.0)).unwrap().as_str(), "4");
        assert!(EntityId::from_value(&json!(4.5)).is_none());
    }

    #[test]
    fn id_from_non_scalar() {
        assert!(EntityId::from_value(&json!(null)).is_none());
        assert!(EntityId::from_value(&json!("")).is_none());
        assert!(EntityId::from_value(&json!([1])).is_none());
    }

    #[test]
    fn id_path_safety() {
        assert!(EntityId::new("0021900050_3").is_path_safe());
        assert!(!EntityId::new("../etc").is_path_safe());
    }
}
