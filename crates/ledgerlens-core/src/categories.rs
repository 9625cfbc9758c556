//! Expense categories and the local keyword classifier
//!
//! The classifier is the last link of the categorization fallback chain:
//! it is total, so `remote AI -> keywords -> Other` always yields a category.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transportation,
    Entertainment,
    Shopping,
    Bills,
    Healthcare,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Healthcare => "Healthcare",
            Category::Other => "Other",
        }
    }

    /// All categories, in keyword priority order with Other last
    pub fn all() -> &'static [Category] {
        &[
            Category::Food,
            Category::Transportation,
            Category::Entertainment,
            Category::Shopping,
            Category::Bills,
            Category::Healthcare,
            Category::Other,
        ]
    }

    /// Exact match against a member name, ignoring surrounding whitespace only
    ///
    /// "food" or "FOOD" do not match.
    pub fn parse_strict(s: &str) -> Option<Category> {
        let s = s.trim();
        Category::all().iter().copied().find(|c| c.as_str() == s)
    }

    /// Like `parse_strict` but coerces unknown values to `Other`
    pub fn coerce(s: &str) -> Category {
        Category::parse_strict(s).unwrap_or(Category::Other)
    }

    /// Comma-separated list for prompts
    pub fn prompt_list() -> String {
        Category::all()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const FOOD_KEYWORDS: &[&str] = &[
    "restaurant",
    "cafe",
    "coffee",
    "starbucks",
    "latte",
    "mcdonald",
    "burger",
    "pizza",
    "sushi",
    "lunch",
    "dinner",
    "breakfast",
    "brunch",
    "grocery",
    "groceries",
    "supermarket",
    "whole foods",
    "trader joe",
    "bakery",
    "takeout",
    "doordash",
    "grubhub",
    "food",
    "snack",
];

const TRANSPORTATION_KEYWORDS: &[&str] = &[
    "uber",
    "lyft",
    "taxi",
    "gas station",
    "gasoline",
    "fuel",
    "parking",
    "metro",
    "subway",
    "train",
    "airline",
    "flight",
    "toll",
    "shell",
    "chevron",
    "bus fare",
    "car wash",
    "transit",
];

const ENTERTAINMENT_KEYWORDS: &[&str] = &[
    "movie",
    "cinema",
    "netflix",
    "spotify",
    "hulu",
    "disney+",
    "concert",
    "theater",
    "theatre",
    "museum",
    "game",
    "steam",
    "bowling",
    "festival",
    "tickets",
];

const SHOPPING_KEYWORDS: &[&str] = &[
    "amazon",
    "walmart",
    "target",
    "costco",
    "ebay",
    "mall",
    "clothes",
    "clothing",
    "shoes",
    "ikea",
    "best buy",
    "shopping",
    "purchase",
];

const BILLS_KEYWORDS: &[&str] = &[
    "bill",
    "rent",
    "mortgage",
    "electric",
    "water",
    "internet",
    "phone",
    "utility",
    "utilities",
    "insurance",
    "verizon",
    "comcast",
];

const HEALTHCARE_KEYWORDS: &[&str] = &[
    "doctor",
    "hospital",
    "pharmacy",
    "medicine",
    "medical",
    "dentist",
    "clinic",
    "prescription",
    "cvs",
    "walgreens",
    "therapy",
    "checkup",
];

/// Keyword sets in priority order; the first set with a hit wins
const KEYWORD_TABLE: &[(Category, &[&str])] = &[
    (Category::Food, FOOD_KEYWORDS),
    (Category::Transportation, TRANSPORTATION_KEYWORDS),
    (Category::Entertainment, ENTERTAINMENT_KEYWORDS),
    (Category::Shopping, SHOPPING_KEYWORDS),
    (Category::Bills, BILLS_KEYWORDS),
    (Category::Healthcare, HEALTHCARE_KEYWORDS),
];

/// Categorize a description by substring keyword match
pub fn classify(description: &str) -> Category {
    let normalized = description.trim().to_lowercase();
    if normalized.is_empty() {
        return Category::Other;
    }

    KEYWORD_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| normalized.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}
