use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "difficulty", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown difficulty `{0}`")]
pub struct UnknownDifficulty(pub String);

/// Exact, case-sensitive match on the lowercase names.
impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(UnknownDifficulty(other.to_string())),
        }
    }
}

/// Recipe record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub ingredients: String, // free text, comma separated
    pub prep_time: i32,      // minutes
    pub cook_time: i32,      // minutes
    pub difficulty: Difficulty,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Recipe {
    pub fn total_time(&self) -> i64 {
        i64::from(self.prep_time) + i64::from(self.cook_time)
    }
}

/// A validated recipe ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub difficulty: Difficulty,
    pub description: String,
}

/// Validated partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub ingredients: Option<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub description: Option<String>,
}

impl RecipeChanges {
    pub fn is_empty(&self) -> bool {
        *self == RecipeChanges::default()
    }
}
