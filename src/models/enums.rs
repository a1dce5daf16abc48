//! Enums shared by the catalog models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Track genre categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Genre {
    Pop,
    Rock,
    #[serde(rename = "Hip-Hop")]
    HipHop,
    Jazz,
    Classical,
    Electronic,
    #[default]
    Other,
}

impl Genre {
    pub const ALL: [Genre; 7] = [
        Genre::Pop,
        Genre::Rock,
        Genre::HipHop,
        Genre::Jazz,
        Genre::Classical,
        Genre::Electronic,
        Genre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Pop => "Pop",
            Genre::Rock => "Rock",
            Genre::HipHop => "Hip-Hop",
            Genre::Jazz => "Jazz",
            Genre::Classical => "Classical",
            Genre::Electronic => "Electronic",
            Genre::Other => "Other",
        }
    }

    /// Exact, case-sensitive lookup of a stored or submitted label
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == s)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
