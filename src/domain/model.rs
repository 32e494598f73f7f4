use serde::{Deserialize, Serialize};
use std::fmt;

/// Party identifier. Source data sometimes carries stray whitespace, so the
/// id is always stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllianceId(String);

impl AllianceId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AllianceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub region: Region,
    pub party: PartyId,
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAllocation {
    pub region: Region,
    pub seats: u32,
}

/// Display attributes of a party, looked up by id only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMeta {
    pub color: Option<String>,
    pub short: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceDisplay {
    pub color: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
}

/// A grouping of parties competing as one unit.
///
/// `members` keeps insertion order (it drives packing order) but never holds
/// the same party twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliance {
    pub id: AllianceId,
    pub members: Vec<PartyId>,
    pub display: AllianceDisplay,
}

impl Alliance {
    pub fn new(id: AllianceId, members: Vec<PartyId>) -> Self {
        Self {
            id,
            members,
            display: AllianceDisplay::default(),
        }
    }

    pub fn with_display(mut self, display: AllianceDisplay) -> Self {
        self.display = display;
        self
    }

    pub fn contains(&self, party: &PartyId) -> bool {
        self.members.iter().any(|member| member == party)
    }

    pub fn is_dissolved(&self) -> bool {
        self.members.is_empty()
    }
}

/// Initial grouping as supplied by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceSpec {
    pub name: String,
    pub parties: Vec<String>,
    #[serde(default)]
    pub display: AllianceDisplay,
}

/// Derived per-cycle figures for one alliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceSummary {
    pub total_votes: u64,
    pub seats_won: u32,
    pub display: AllianceDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_trimmed() {
        assert_eq!(PartyId::new("  PRO \t"), PartyId::new("PRO"));
        assert_eq!(Region::new(" Norte ").as_str(), "Norte");
        assert_eq!(AllianceId::new("A ").to_string(), "A");
    }

    #[test]
    fn test_alliance_contains() {
        let alliance = Alliance::new(
            AllianceId::new("A"),
            vec![PartyId::new("P1"), PartyId::new("P2")],
        );
        assert!(alliance.contains(&PartyId::new(" P2")));
        assert!(!alliance.contains(&PartyId::new("P3")));
        assert!(!alliance.is_dissolved());
    }
}
