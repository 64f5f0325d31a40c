//! The canonical verdict order: `ok < caution < warning < danger`.
//!
//! Threshold comparison, exit-code mapping, and severity bucketing all use
//! this single `Ord` implementation. Nothing else in the workspace is
//! allowed to invent its own ranking.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// The final verdict returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Recommendation {
    Ok,
    Caution,
    Warning,
    Danger,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Ok => "ok",
            Recommendation::Caution => "caution",
            Recommendation::Warning => "warning",
            Recommendation::Danger => "danger",
        }
    }

    /// True when this verdict is at or above the given threshold.
    pub fn at_least(&self, threshold: Recommendation) -> bool {
        *self >= threshold
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for strings outside the closed verdict set.
#[derive(Debug, thiserror::Error)]
#[error("Unknown recommendation {0:?}")]
pub struct RecommendationParseError(pub String);

impl FromStr for Recommendation {
    type Err = RecommendationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" => Ok(Recommendation::Ok),
            "caution" => Ok(Recommendation::Caution),
            "warning" => Ok(Recommendation::Warning),
            "danger" => Ok(Recommendation::Danger),
            _ => Err(RecommendationParseError(s.to_string())),
        }
    }
}

impl Serialize for Recommendation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Recommendation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Recommendation::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(Recommendation::Ok < Recommendation::Caution);
        assert!(Recommendation::Caution < Recommendation::Warning);
        assert!(Recommendation::Warning < Recommendation::Danger);
    }

    #[test]
    fn test_at_least() {
        assert!(Recommendation::Danger.at_least(Recommendation::Warning));
        assert!(Recommendation::Warning.at_least(Recommendation::Warning));
        assert!(!Recommendation::Caution.at_least(Recommendation::Warning));
    }

    #[test]
    fn test_serde_roundtrip() {
        let serialized = serde_json::to_string(&Recommendation::Caution).unwrap();
        assert_eq!(serialized, "\"caution\"");
        let parsed: Recommendation = serde_json::from_str("\"danger\"").unwrap();
        assert_eq!(parsed, Recommendation::Danger);
        assert!(serde_json::from_str::<Recommendation>("\"severe\"").is_err());
    }
}
