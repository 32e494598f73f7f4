use serde::{Deserialize, Serialize};

/// Ordering of equal D'Hondt quotients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Stable sort: registry order of alliances, then ascending divisor.
    #[default]
    GenerationOrder,
    /// Alliance with the larger regional tally first, then generation order.
    LargerTally,
}

/// Which alliance wins when a pointer lies inside several circles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum OverlapRule {
    /// Last circle in iteration order.
    #[default]
    LastWins,
    FirstWins,
    /// Smallest center distance; earlier circle on an exact tie.
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub width: f64,
    pub height: f64,
    /// Padding between packed siblings, in packed units before scaling.
    pub padding: f64,
    /// Grid columns; `None` keeps every alliance on one row.
    pub columns: Option<usize>,
    pub row_gap: f64,
    pub label_offset: f64,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 300.0,
            padding: 3.0,
            columns: None,
            row_gap: 20.0,
            label_offset: 10.0,
        }
    }
}
