//! Customer segments.

use serde::{Deserialize, Serialize};

/// Coarse customer classification computed by the store from order history.
///
/// The store reports it as a snake-case string; the console shows the
/// capitalised label. Segments are never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CustomerSegment {
    #[default]
    New,
    Regular,
    #[serde(rename = "VIP")]
    Vip,
    Inactive,
    AtRisk,
}

impl CustomerSegment {
    /// All segments in tab order.
    pub const ALL: [Self; 5] = [
        Self::New,
        Self::Regular,
        Self::Vip,
        Self::Inactive,
        Self::AtRisk,
    ];

    /// Map the store's segment value to a segment.
    ///
    /// Unknown or blank values fall back to [`CustomerSegment::New`].
    #[must_use]
    pub fn from_store(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("regular") => Self::Regular,
            Some("vip") => Self::Vip,
            Some("inactive") => Self::Inactive,
            Some("at_risk") => Self::AtRisk,
            _ => Self::New,
        }
    }

    /// Parse a segment tab from a query string, accepting either the store
    /// value (`at_risk`) or the display label (`AtRisk`). `all` means no filter.
    #[must_use]
    pub fn from_tab(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "new" => Some(Self::New),
            "regular" => Some(Self::Regular),
            "vip" => Some(Self::Vip),
            "inactive" => Some(Self::Inactive),
            "at_risk" | "atrisk" => Some(Self::AtRisk),
            _ => None,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Regular => "Regular",
            Self::Vip => "VIP",
            Self::Inactive => "Inactive",
            Self::AtRisk => "AtRisk",
        }
    }
}

impl std::fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_known_values() {
        assert_eq!(CustomerSegment::from_store(Some("new")), CustomerSegment::New);
        assert_eq!(
            CustomerSegment::from_store(Some("regular")),
            CustomerSegment::Regular
        );
        assert_eq!(CustomerSegment::from_store(Some("vip")), CustomerSegment::Vip);
        assert_eq!(
            CustomerSegment::from_store(Some("inactive")),
            CustomerSegment::Inactive
        );
        assert_eq!(
            CustomerSegment::from_store(Some("at_risk")),
            CustomerSegment::AtRisk
        );
    }

    #[test]
    fn test_from_store_defaults_to_new() {
        assert_eq!(CustomerSegment::from_store(None), CustomerSegment::New);
        assert_eq!(CustomerSegment::from_store(Some("")), CustomerSegment::New);
        assert_eq!(
            CustomerSegment::from_store(Some("platinum")),
            CustomerSegment::New
        );
    }

    #[test]
    fn test_labels() {
        let labels: Vec<_> = CustomerSegment::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, ["New", "Regular", "VIP", "Inactive", "AtRisk"]);
    }

    #[test]
    fn test_from_tab() {
        assert_eq!(CustomerSegment::from_tab("AtRisk"), Some(CustomerSegment::AtRisk));
        assert_eq!(CustomerSegment::from_tab("at_risk"), Some(CustomerSegment::AtRisk));
        assert_eq!(CustomerSegment::from_tab("VIP"), Some(CustomerSegment::Vip));
        assert_eq!(CustomerSegment::from_tab("all"), None);
    }

    #[test]
    fn test_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&CustomerSegment::Vip).unwrap(),
            "\"VIP\""
        );
        assert_eq!(
            serde_json::to_string(&CustomerSegment::AtRisk).unwrap(),
            "\"AtRisk\""
        );
    }
}
