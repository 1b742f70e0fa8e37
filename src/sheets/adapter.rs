use chrono::{DateTime, Local, NaiveDate, Utc};
use std::collections::BTreeMap;

use super::api::SheetsApi;
use super::RemoteError;
use crate::models::{Meal, MealType};

pub const MEALS_SHEET: &str = "Meals";
pub const SETTINGS_SHEET: &str = "Settings";

// Fixed bounds sized well past realistic data volume; nothing paginates.
const HEADER_RANGE: &str = "Meals!A1:L1";
const DATA_RANGE: &str = "Meals!A2:L10000";
const DATA_START: &str = "Meals!A2";
const SETTINGS_HEADER_RANGE: &str = "Settings!A1:B1";
const SETTINGS_DATA_RANGE: &str = "Settings!A2:B50";
const SETTINGS_DATA_START: &str = "Settings!A2";

/// Column contract for the Meals sheet, A through L.
const MEAL_HEADER: [&str; 12] = [
    "ID",
    "Date",
    "Name",
    "Type",
    "Calories",
    "Protein",
    "Carbs",
    "Fat",
    "Sugar",
    "Notes",
    "SyncID",
    "ModifiedAt",
];

/// A meal as parsed from one spreadsheet row.
///
/// `local_id` is whatever device wrote the row last and is informational
/// only; identity across devices is `sync_id` alone.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMeal {
    pub local_id: Option<i64>,
    pub date: NaiveDate,
    pub name: String,
    pub meal_type: MealType,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub sugar: u32,
    pub notes: String,
    pub sync_id: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl RemoteMeal {
    /// Parses one sheet row. Returns `None` for blank padding (no name).
    ///
    /// Cells that fail to parse degrade instead of erroring: numbers to 0,
    /// the date to today, the type to snack.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        let num = |i: usize| cell(i).trim().parse::<u32>().unwrap_or(0);

        let name = cell(2).trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            local_id: cell(0).trim().parse::<i64>().ok(),
            date: NaiveDate::parse_from_str(cell(1).trim(), "%Y-%m-%d")
                .unwrap_or_else(|_| Local::now().date_naive()),
            name: name.to_string(),
            meal_type: cell(3).trim().parse().unwrap_or(MealType::Snack),
            calories: num(4),
            protein: num(5),
            carbs: num(6),
            fat: num(7),
            sugar: num(8),
            notes: cell(9).to_string(),
            sync_id: match cell(10).trim() {
                "" => None,
                s => Some(s.to_string()),
            },
            modified_at: DateTime::parse_from_rfc3339(cell(11).trim())
                .map(|dt| dt.with_timezone(&Utc))
                .ok(),
        })
    }
}

/// Projects a local meal onto the column contract.
pub fn meal_to_row(meal: &Meal) -> Vec<String> {
    vec![
        meal.id.to_string(),
        meal.date.to_string(),
        meal.name.clone(),
        meal.meal_type.to_string(),
        meal.calories.to_string(),
        meal.protein.to_string(),
        meal.carbs.to_string(),
        meal.fat.to_string(),
        meal.sugar.to_string(),
        meal.notes.clone(),
        meal.sync_id.clone().unwrap_or_default(),
        meal.modified_at
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default(),
    ]
}

/// Read/write access to one spreadsheet's Meals and Settings regions.
pub struct SheetAdapter<'a, A> {
    api: &'a A,
    spreadsheet_id: &'a str,
}

impl<'a, A: SheetsApi> SheetAdapter<'a, A> {
    pub fn new(api: &'a A, spreadsheet_id: &'a str) -> Self {
        Self {
            api,
            spreadsheet_id,
        }
    }

    /// Reads the data region and drops blank padding rows.
    pub async fn fetch_rows(&self) -> Result<Vec<RemoteMeal>, RemoteError> {
        let rows = self.api.get_values(self.spreadsheet_id, DATA_RANGE).await?;
        Ok(rows
            .iter()
            .filter_map(|row| RemoteMeal::from_row(row))
            .collect())
    }

    /// Rewrites the header, clears the data region, and writes `meals` in
    /// one batch. Any failure propagates so the caller lands in an error
    /// state rather than treating a partial write as success.
    pub async fn replace_rows(&self, meals: &[Meal]) -> Result<(), RemoteError> {
        self.write_meal_header().await?;
        self.api
            .clear_values(self.spreadsheet_id, DATA_RANGE)
            .await?;

        if !meals.is_empty() {
            let rows: Vec<Vec<String>> = meals.iter().map(meal_to_row).collect();
            self.api
                .update_values(self.spreadsheet_id, DATA_START, &rows)
                .await?;
        }

        tracing::debug!("Pushed {} row(s) to {}", meals.len(), MEALS_SHEET);
        Ok(())
    }

    pub async fn write_meal_header(&self) -> Result<(), RemoteError> {
        let header: Vec<String> = MEAL_HEADER.iter().map(|s| s.to_string()).collect();
        self.api
            .update_values(self.spreadsheet_id, HEADER_RANGE, &[header])
            .await
    }

    /// Creates the Settings sheet iff it is missing. Safe to call on every
    /// sync round.
    pub async fn ensure_settings_sheet(&self) -> Result<(), RemoteError> {
        let titles = self.api.sheet_titles(self.spreadsheet_id).await?;
        if titles.iter().any(|t| t == SETTINGS_SHEET) {
            return Ok(());
        }

        tracing::debug!("Creating {} sheet", SETTINGS_SHEET);
        self.api
            .add_sheet(self.spreadsheet_id, SETTINGS_SHEET)
            .await?;
        let header = vec![vec!["Key".to_string(), "Value".to_string()]];
        self.api
            .update_values(self.spreadsheet_id, SETTINGS_HEADER_RANGE, &header)
            .await
    }

    /// Key/value pairs from the settings region. Rows with a blank key or
    /// a non-numeric value are skipped.
    pub async fn read_settings(&self) -> Result<BTreeMap<String, u32>, RemoteError> {
        let rows = self
            .api
            .get_values(self.spreadsheet_id, SETTINGS_DATA_RANGE)
            .await?;

        let mut settings = BTreeMap::new();
        for row in &rows {
            let key = row.first().map(String::as_str).unwrap_or("").trim();
            if key.is_empty() {
                continue;
            }
            if let Some(value) = row.get(1).and_then(|v| v.trim().parse::<u32>().ok()) {
                settings.insert(key.to_string(), value);
            }
        }
        Ok(settings)
    }

    pub async fn write_settings(
        &self,
        settings: &BTreeMap<String, u32>,
    ) -> Result<(), RemoteError> {
        self.api
            .clear_values(self.spreadsheet_id, SETTINGS_DATA_RANGE)
            .await?;

        if settings.is_empty() {
            return Ok(());
        }
        let rows: Vec<Vec<String>> = settings
            .iter()
            .map(|(k, v)| vec![k.clone(), v.to_string()])
            .collect();
        self.api
            .update_values(self.spreadsheet_id, SETTINGS_DATA_START, &rows)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMeal;
    use crate::sheets::fake::FakeSheets;

    fn meal(id: i64, name: &str, sync_id: &str) -> Meal {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let draft = NewMeal::new(date, name, MealType::Lunch)
            .with_macros(30, 40, 10, 5)
            .with_sync_identity(sync_id, None);
        Meal {
            id,
            date: draft.date,
            name: draft.name,
            meal_type: draft.meal_type,
            calories: draft.calories,
            protein: draft.protein,
            carbs: draft.carbs,
            fat: draft.fat,
            sugar: draft.sugar,
            notes: draft.notes,
            created_at: draft.created_at,
            sync_id: draft.sync_id,
            modified_at: draft.modified_at,
        }
    }

    async fn setup() -> (FakeSheets, String) {
        let api = FakeSheets::new();
        let id = api.create_spreadsheet("Test", MEALS_SHEET).await.unwrap();
        (api, id)
    }

    #[test]
    fn test_row_roundtrip_preserves_content() {
        let original = meal(7, "Chicken bowl", "s-123");
        let row = meal_to_row(&original);
        let parsed = RemoteMeal::from_row(&row).unwrap();

        assert_eq!(parsed.local_id, Some(7));
        assert_eq!(parsed.name, "Chicken bowl");
        assert_eq!(parsed.meal_type, MealType::Lunch);
        assert_eq!(parsed.calories, original.calories);
        assert_eq!(parsed.sugar, 5);
        assert_eq!(parsed.sync_id.as_deref(), Some("s-123"));
        assert_eq!(parsed.modified_at, original.modified_at);
    }

    #[test]
    fn test_blank_name_row_is_padding() {
        let row: Vec<String> = vec!["1".into(), "2025-03-10".into(), "  ".into()];
        assert!(RemoteMeal::from_row(&row).is_none());
    }

    #[test]
    fn test_garbage_cells_degrade_to_defaults() {
        let row: Vec<String> = vec![
            "not-a-number".into(),
            "bad-date".into(),
            "Eggs".into(),
            "elevenses".into(),
            "NaN".into(),
        ];
        let parsed = RemoteMeal::from_row(&row).unwrap();

        assert_eq!(parsed.local_id, None);
        assert_eq!(parsed.meal_type, MealType::Snack);
        assert_eq!(parsed.calories, 0);
        assert!(parsed.sync_id.is_none());
        assert!(parsed.modified_at.is_none());
    }

    #[tokio::test]
    async fn test_replace_then_fetch_roundtrip() {
        let (api, id) = setup().await;
        let adapter = SheetAdapter::new(&api, &id);

        let meals = vec![meal(1, "Oatmeal", "s1"), meal(2, "Salad", "s2")];
        adapter.replace_rows(&meals).await.unwrap();

        let fetched = adapter.fetch_rows().await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].name, "Oatmeal");
        assert_eq!(fetched[1].sync_id.as_deref(), Some("s2"));
    }

    #[tokio::test]
    async fn test_replace_rows_drops_stale_rows() {
        let (api, id) = setup().await;
        let adapter = SheetAdapter::new(&api, &id);

        adapter
            .replace_rows(&[meal(1, "A", "s1"), meal(2, "B", "s2"), meal(3, "C", "s3")])
            .await
            .unwrap();
        adapter.replace_rows(&[meal(1, "A", "s1")]).await.unwrap();

        let fetched = adapter.fetch_rows().await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].name, "A");
    }

    #[tokio::test]
    async fn test_ensure_settings_sheet_is_repeat_safe() {
        let (api, id) = setup().await;
        let adapter = SheetAdapter::new(&api, &id);

        adapter.ensure_settings_sheet().await.unwrap();
        adapter.ensure_settings_sheet().await.unwrap();

        let titles = api.sheet_titles(&id).await.unwrap();
        assert_eq!(
            titles.iter().filter(|t| *t == SETTINGS_SHEET).count(),
            1,
            "settings sheet must not be duplicated"
        );
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let (api, id) = setup().await;
        let adapter = SheetAdapter::new(&api, &id);
        adapter.ensure_settings_sheet().await.unwrap();

        let mut settings = BTreeMap::new();
        settings.insert("protein_target".to_string(), 150u32);
        settings.insert("carbs_target".to_string(), 250u32);
        adapter.write_settings(&settings).await.unwrap();

        let read = adapter.read_settings().await.unwrap();
        assert_eq!(read, settings);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let (api, id) = setup().await;
        api.fail_requests(true);

        let adapter = SheetAdapter::new(&api, &id);
        assert!(adapter.fetch_rows().await.is_err());
    }
}
