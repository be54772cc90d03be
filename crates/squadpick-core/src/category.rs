// Player categories (squad positions).

use serde::Serialize;
use std::fmt;

/// Squad positions. The set is closed: every candidate belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 4] = [
        Category::Goalkeeper,
        Category::Defender,
        Category::Midfielder,
        Category::Forward,
    ];

    /// Parse a position string into a Category.
    ///
    /// Accepts the dataset abbreviations ("GK", "DEF", "MID", "FWD") as well as
    /// the long names, case-insensitively. "GKP" and "FW" are common aliases.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GKP" | "GOALKEEPER" => Some(Category::Goalkeeper),
            "DEF" | "D" | "DEFENDER" => Some(Category::Defender),
            "MID" | "M" | "MIDFIELDER" => Some(Category::Midfielder),
            "FWD" | "FW" | "F" | "FORWARD" => Some(Category::Forward),
            _ => None,
        }
    }

    /// Short display string, matching the dataset abbreviations.
    pub fn display_str(&self) -> &'static str {
        match self {
            Category::Goalkeeper => "GK",
            Category::Defender => "DEF",
            Category::Midfielder => "MID",
            Category::Forward => "FWD",
        }
    }

    /// Deterministic ordering index for display and search order.
    pub fn sort_order(&self) -> u8 {
        match self {
            Category::Goalkeeper => 0,
            Category::Defender => 1,
            Category::Midfielder => 2,
            Category::Forward => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}
