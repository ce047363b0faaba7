use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A reference category tasks are tagged with.
///
/// Categories are seeded at startup and never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub title: String,
    /// Display color as a hex string, e.g. `#80D8FF`.
    pub color: String,
    pub icon_name: String,
}

/// One entry of the fixed catalog. Seeding is keyed on `title`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySeed {
    pub title: &'static str,
    pub color: &'static str,
    pub icon_name: &'static str,
}

const fn seed(title: &'static str, color: &'static str, icon_name: &'static str) -> CategorySeed {
    CategorySeed {
        title,
        color,
        icon_name,
    }
}

pub const CATALOG: [CategorySeed; 14] = [
    seed("Home", "#FFAB91", "home"),
    seed("Work", "#80D8FF", "briefcase"),
    seed("Sports", "#81C784", "soccer"),
    seed("Couple", "#F48FB1", "heart"),
    seed("Health", "#EF9A9A", "heart-outline"),
    seed("Study", "#FFF59D", "book"),
    seed("Shopping", "#CE93D8", "shopping_cart"),
    seed("Finance", "#A5D6A7", "attach_money"),
    seed("Travel", "#90CAF9", "flight"),
    seed("Social", "#FFCC80", "groups"),
    seed("Creativity", "#B39DDB", "palette"),
    seed("Pets", "#BCAAA4", "pets"),
    seed("Meals", "#FF8A65", "restaurant"),
    seed("Others", "#B0BEC5", "more_horiz"),
];
