use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::pattern::SegmentPattern;

/// Identifiant opaque d'un segment ("a", "dp", "g1"...).
///
/// Égalité stricte sur la chaîne : pas de normalisation, la casse est conservée.
///
/// # Example
/// ```
/// use sg_core::segment::SegmentId;
/// let a = SegmentId::new("a").unwrap();
/// assert_eq!(a.as_str(), "a");
/// assert_ne!(a, SegmentId::new("A").unwrap());
/// assert!(SegmentId::new("").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SegmentId(String);

impl SegmentId {
    /// Wrap a segment name.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the name is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::Config("nom de segment vide".into()));
        }
        Ok(Self(name))
    }

    /// Borrow the underlying name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SegmentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Electrical convention of the display.
///
/// # Example
/// ```
/// use sg_core::segment::Polarity;
/// let p: Polarity = "anode".parse().unwrap();
/// assert_eq!(p, Polarity::CommonAnode);
/// assert_eq!(Polarity::default(), Polarity::CommonCathode);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Bit à 1 = segment allumé.
    #[default]
    CommonCathode,
    /// Bit à 1 = segment éteint (inverse de la cathode sur les N bits utilisés).
    CommonAnode,
}

impl Polarity {
    /// Both polarities, cathode first.
    pub const ALL: [Self; 2] = [Self::CommonCathode, Self::CommonAnode];

    /// Convert a "lit" pattern to the value to write for this polarity.
    ///
    /// Common anode flips exactly the pattern's N bits, never the bits above.
    ///
    /// # Example
    /// ```
    /// use sg_core::pattern::SegmentPattern;
    /// use sg_core::segment::Polarity;
    /// let lit = SegmentPattern::from_u128(7, 0x3F);
    /// assert_eq!(Polarity::CommonAnode.apply(lit).to_u128(), Some(0x40));
    /// ```
    #[must_use]
    pub fn apply(self, lit: SegmentPattern) -> SegmentPattern {
        match self {
            Self::CommonCathode => lit,
            Self::CommonAnode => lit.inverted(),
        }
    }

    /// Short lowercase name, used for file suffixes.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            Self::CommonCathode => "cathode",
            Self::CommonAnode => "anode",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CommonCathode => "common_cathode",
            Self::CommonAnode => "common_anode",
        })
    }
}

impl FromStr for Polarity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cathode" | "common_cathode" | "common-cathode" | "cc" => Ok(Self::CommonCathode),
            "anode" | "common_anode" | "common-anode" | "ca" => Ok(Self::CommonAnode),
            other => Err(CoreError::Config(format!(
                "polarité inconnue '{other}' (attendu : cathode, anode)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_ids_are_case_sensitive() {
        let lower = SegmentId::new("dp").unwrap();
        let upper = SegmentId::new("DP").unwrap();
        assert_ne!(lower, upper);
        assert_eq!(lower.to_string(), "dp");
    }

    #[test]
    fn segment_id_keeps_whitespace() {
        let id = SegmentId::new(" a").unwrap();
        assert_eq!(id.as_str(), " a");
    }

    #[test]
    fn polarity_parses_aliases() {
        for s in ["cathode", "Common_Cathode", "cc", "common-cathode"] {
            assert_eq!(s.parse::<Polarity>().unwrap(), Polarity::CommonCathode, "{s}");
        }
        for s in ["anode", "COMMON_ANODE", "ca"] {
            assert_eq!(s.parse::<Polarity>().unwrap(), Polarity::CommonAnode, "{s}");
        }
        assert!(matches!(
            "bipolar".parse::<Polarity>(),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn polarity_display_matches_serde_names() {
        assert_eq!(Polarity::CommonAnode.to_string(), "common_anode");
        assert_eq!(Polarity::CommonCathode.short_name(), "cathode");
    }
}
