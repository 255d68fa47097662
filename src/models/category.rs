//! This file defines the closed set of expense categories.
//!
//! Categories are a fixed enumeration rather than user-defined strings so that
//! aggregation and filtering can be exhaustive: a new category added here will
//! show up in every breakdown without further changes.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The category an expense belongs to.
///
/// Every expense has exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transportation,
    Entertainment,
    Shopping,
    Bills,
    Healthcare,
    Education,
    Travel,
    Other,
}

impl Category {
    /// Every category, in declaration order.
    ///
    /// Used by the aggregation engine to zero-initialize per-category totals
    /// so that categories without expenses still appear in breakdowns.
    pub const ALL: [Category; 9] = [
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Shopping,
        Category::Bills,
        Category::Healthcare,
        Category::Education,
        Category::Travel,
        Category::Other,
    ];

    /// The category name as stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Travel => "Travel",
            Category::Other => "Other",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| Error::InvalidCategory(s.to_owned()))
    }
}
