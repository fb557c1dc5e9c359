//! Domain types shared by the store, the collaborators and the web API.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an item sits in its lifecycle.
///
/// Items start as `Draft` (staged from a scan or manual entry) and move to
/// `Confirmed` once the user accepts them. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Draft,
    Confirmed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Draft => "draft",
            ItemStatus::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ItemStatus::Draft),
            "confirmed" => Ok(ItemStatus::Confirmed),
            other => Err(format!("unknown item status: {other}")),
        }
    }
}

impl ToSql for ItemStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ItemStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        // NULL only appears when a row bypassed the column default; treat it as draft
        if let ValueRef::Null = value {
            return Ok(ItemStatus::Draft);
        }
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// A food item in the kitchen inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    /// `None` is persisted as the empty string
    pub image_url: Option<String>,
    pub quantity: i64,
    pub status: ItemStatus,
}

/// Descriptive recipe fields that are estimated after a recipe is first shown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeMetadata {
    pub time: String,
    pub difficulty: String,
    pub servings: String,
}

/// A recipe proposed by the language model, not yet persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeSuggestion {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub how_to_cook: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub servings: Option<String>,
}

/// A saved recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub ingredients: Vec<String>,
    pub how_to_cook: Option<String>,
    pub time: Option<String>,
    pub difficulty: Option<String>,
    pub servings: Option<String>,
}

impl Recipe {
    /// Metadata is only complete once all three fields are filled in
    pub fn has_metadata(&self) -> bool {
        [&self.time, &self.difficulty, &self.servings]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

impl From<Recipe> for RecipeSuggestion {
    fn from(recipe: Recipe) -> Self {
        RecipeSuggestion {
            name: recipe.name,
            image_url: recipe.image_url,
            ingredients: recipe.ingredients,
            how_to_cook: recipe.how_to_cook,
            time: recipe.time,
            difficulty: recipe.difficulty,
            servings: recipe.servings,
        }
    }
}

/// Quantity as the vision model reports it: `"3"`, `3` or `"2 bottles"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Number(f64),
    Text(String),
}

/// One `{name, quantity}` guess returned by the vision collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<RawQuantity>,
}

impl ScannedItem {
    /// Integer quantity to stage, see [`normalize_quantity`]
    pub fn quantity(&self) -> i64 {
        normalize_quantity(self.quantity.as_ref())
    }
}

/// Integer quantity from user or model input. Text that does not start with a
/// non-zero integer falls back to 1; numbers are truncated; absent means 1.
pub fn normalize_quantity(raw: Option<&RawQuantity>) -> i64 {
    match raw {
        Some(RawQuantity::Number(n)) => n.trunc() as i64,
        Some(RawQuantity::Text(text)) => match parse_leading_int(text) {
            Some(0) | None => 1,
            Some(n) => n,
        },
        None => 1,
    }
}

/// Parses the integer prefix of `text` ("12 eggs" -> 12), ignoring leading whitespace.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
