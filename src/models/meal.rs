use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => Err(format!(
                "Invalid meal type '{}'. Valid options: breakfast, lunch, dinner, snack",
                s
            )),
        }
    }
}

/// Calories by the 4/4/9 convention when the user doesn't supply them.
pub fn derived_calories(protein: u32, carbs: u32, fat: u32) -> u32 {
    protein * 4 + carbs * 4 + fat * 9
}

/// A logged meal as stored locally.
///
/// `id` is the store-assigned key and never leaves this device; `sync_id`
/// is the cross-device identity. Rows written before sync support existed
/// carry neither `sync_id` nor `modified_at` until the engine backfills them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub date: NaiveDate,
    pub name: String,
    pub meal_type: MealType,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub sugar: u32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub sync_id: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// A meal about to be inserted; the repository assigns the id.
#[derive(Debug, Clone)]
pub struct NewMeal {
    pub date: NaiveDate,
    pub name: String,
    pub meal_type: MealType,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub sugar: u32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub sync_id: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl NewMeal {
    /// A user-created meal: fresh sync identity, stamped now.
    pub fn new(date: NaiveDate, name: impl Into<String>, meal_type: MealType) -> Self {
        let now = Utc::now();
        Self {
            date,
            name: name.into(),
            meal_type,
            calories: 0,
            protein: 0,
            carbs: 0,
            fat: 0,
            sugar: 0,
            notes: String::new(),
            created_at: now,
            sync_id: Some(Uuid::new_v4().to_string()),
            modified_at: Some(now),
        }
    }

    pub fn with_macros(mut self, protein: u32, carbs: u32, fat: u32, sugar: u32) -> Self {
        self.protein = protein;
        self.carbs = carbs;
        self.fat = fat;
        self.sugar = sugar;
        self.calories = derived_calories(protein, carbs, fat);
        self
    }

    /// Overrides the derived calorie count.
    pub fn with_calories(mut self, calories: u32) -> Self {
        self.calories = calories;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Keeps an identity assigned elsewhere, used when importing rows that
    /// already live in the spreadsheet.
    pub fn with_sync_identity(
        mut self,
        sync_id: impl Into<String>,
        modified_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.sync_id = Some(sync_id.into());
        self.modified_at = modified_at.or(self.modified_at);
        self
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} - {} ({} kcal, P{} C{} F{} S{})",
            self.id,
            self.date,
            self.meal_type,
            self.name,
            self.calories,
            self.protein,
            self.carbs,
            self.fat,
            self.sugar
        )?;
        if !self.notes.is_empty() {
            write!(f, " - {}", self.notes)?;
        }
        Ok(())
    }
}
