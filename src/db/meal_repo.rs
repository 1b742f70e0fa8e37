use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use super::StoreError;
use crate::models::{Meal, MealType, NewMeal};

pub struct MealRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct MealRow {
    id: i64,
    date: String,
    name: String,
    meal_type: String,
    calories: i64,
    protein: i64,
    carbs: i64,
    fat: i64,
    sugar: i64,
    notes: String,
    created_at: String,
    sync_id: Option<String>,
    modified_at: Option<String>,
}

impl MealRow {
    fn into_meal(self) -> Meal {
        Meal {
            id: self.id,
            date: NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
                .unwrap_or_else(|_| Utc::now().date_naive()),
            name: self.name,
            meal_type: self.meal_type.parse().unwrap_or(MealType::Snack),
            calories: self.calories.max(0) as u32,
            protein: self.protein.max(0) as u32,
            carbs: self.carbs.max(0) as u32,
            fat: self.fat.max(0) as u32,
            sugar: self.sugar.max(0) as u32,
            notes: self.notes,
            created_at: parse_instant(&self.created_at).unwrap_or_else(Utc::now),
            sync_id: self.sync_id,
            modified_at: self.modified_at.as_deref().and_then(parse_instant),
        }
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

impl MealRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a meal and returns it with its store-assigned id.
    ///
    /// Ids come from `AUTOINCREMENT` and are never reused after a delete.
    pub async fn create(&self, meal: &NewMeal) -> Result<Meal, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO meals (date, name, meal_type, calories, protein, carbs, fat, sugar, notes, created_at, sync_id, modified_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(meal.date.to_string())
        .bind(&meal.name)
        .bind(meal.meal_type.to_string())
        .bind(meal.calories as i64)
        .bind(meal.protein as i64)
        .bind(meal.carbs as i64)
        .bind(meal.fat as i64)
        .bind(meal.sugar as i64)
        .bind(&meal.notes)
        .bind(meal.created_at.to_rfc3339())
        .bind(&meal.sync_id)
        .bind(meal.modified_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id).await?.ok_or(StoreError::NotFound(id))
    }

    /// Full-replace update by id.
    pub async fn update(&self, meal: &Meal) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE meals
            SET date = ?, name = ?, meal_type = ?, calories = ?, protein = ?,
                carbs = ?, fat = ?, sugar = ?, notes = ?, sync_id = ?, modified_at = ?
            WHERE id = ?
            "#,
        )
        .bind(meal.date.to_string())
        .bind(&meal.name)
        .bind(meal.meal_type.to_string())
        .bind(meal.calories as i64)
        .bind(meal.protein as i64)
        .bind(meal.carbs as i64)
        .bind(meal.fat as i64)
        .bind(meal.sugar as i64)
        .bind(&meal.notes)
        .bind(&meal.sync_id)
        .bind(meal.modified_at.map(|dt| dt.to_rfc3339()))
        .bind(meal.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(meal.id));
        }
        Ok(())
    }

    /// Deleting an absent id is not an error; the caller has already
    /// confirmed intent.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM meals WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Meal>, StoreError> {
        let row: Option<MealRow> = sqlx::query_as("SELECT * FROM meals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MealRow::into_meal))
    }

    pub async fn get_by_date(&self, date: NaiveDate) -> Result<Vec<Meal>, StoreError> {
        let rows: Vec<MealRow> = sqlx::query_as("SELECT * FROM meals WHERE date = ? ORDER BY id")
            .bind(date.to_string())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(MealRow::into_meal).collect())
    }

    pub async fn get_all(&self) -> Result<Vec<Meal>, StoreError> {
        let rows: Vec<MealRow> = sqlx::query_as("SELECT * FROM meals ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(MealRow::into_meal).collect())
    }

    /// Sync-only lookup; not a hot path.
    pub async fn get_by_sync_id(&self, sync_id: &str) -> Result<Option<Meal>, StoreError> {
        let row: Option<MealRow> = sqlx::query_as("SELECT * FROM meals WHERE sync_id = ?")
            .bind(sync_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MealRow::into_meal))
    }

    /// Removes every meal. Only the destructive step of a full remote load
    /// calls this, and only with replacement data already in hand.
    pub async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM meals").execute(&self.pool).await?;
        Ok(())
    }
}
