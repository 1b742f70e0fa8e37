use std::collections::HashMap;

use crate::models::Meal;
use crate::sheets::RemoteMeal;

/// One record edited on both sides: content differs and so do the
/// modification stamps. Requires a human decision; there is no automatic
/// last-writer-wins.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub sync_id: String,
    pub local: Meal,
    pub remote: RemoteMeal,
}

/// Per-conflict decision. "This device" is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictChoice {
    #[default]
    Local,
    Remote,
}

/// A conflict paired with the caller's decision.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub sync_id: String,
    pub choice: ConflictChoice,
    pub local: Meal,
    pub remote: RemoteMeal,
}

/// The three partitions of a suspended sync round, held while the caller
/// decides. Nothing is written until the round is resumed or canceled.
#[derive(Debug, Clone)]
pub struct PendingSync {
    pub conflicts: Vec<Conflict>,
    pub new_from_remote: Vec<RemoteMeal>,
    pub local_only: Vec<Meal>,
}

impl PendingSync {
    /// Applies the caller's per-item choices, defaulting every conflict the
    /// caller didn't name to keeping this device's version. All-or-nothing:
    /// every conflict in the batch gets a decision before anything merges.
    pub fn resolve(
        self,
        choices: &HashMap<String, ConflictChoice>,
    ) -> (Vec<Resolution>, Vec<RemoteMeal>) {
        let resolutions = self
            .conflicts
            .into_iter()
            .map(|c| Resolution {
                choice: choices.get(&c.sync_id).copied().unwrap_or_default(),
                sync_id: c.sync_id,
                local: c.local,
                remote: c.remote,
            })
            .collect();
        (resolutions, self.new_from_remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealType, NewMeal};
    use chrono::NaiveDate;

    fn conflict(sync_id: &str) -> Conflict {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let draft = NewMeal::new(date, "Eggs", MealType::Breakfast)
            .with_sync_identity(sync_id, None);
        let local = Meal {
            id: 1,
            date: draft.date,
            name: draft.name.clone(),
            meal_type: draft.meal_type,
            calories: draft.calories,
            protein: draft.protein,
            carbs: draft.carbs,
            fat: draft.fat,
            sugar: draft.sugar,
            notes: draft.notes.clone(),
            created_at: draft.created_at,
            sync_id: draft.sync_id.clone(),
            modified_at: draft.modified_at,
        };
        let remote = RemoteMeal {
            local_id: Some(9),
            date,
            name: "Eggs Benedict".to_string(),
            meal_type: MealType::Breakfast,
            calories: 400,
            protein: 20,
            carbs: 30,
            fat: 22,
            sugar: 3,
            notes: String::new(),
            sync_id: Some(sync_id.to_string()),
            modified_at: None,
        };
        Conflict {
            sync_id: sync_id.to_string(),
            local,
            remote,
        }
    }

    #[test]
    fn test_unnamed_conflicts_default_to_local() {
        let pending = PendingSync {
            conflicts: vec![conflict("s1"), conflict("s2")],
            new_from_remote: Vec::new(),
            local_only: Vec::new(),
        };

        let (resolutions, _) = pending.resolve(&HashMap::new());

        assert_eq!(resolutions.len(), 2);
        assert!(resolutions
            .iter()
            .all(|r| r.choice == ConflictChoice::Local));
    }

    #[test]
    fn test_per_item_choices_apply() {
        let pending = PendingSync {
            conflicts: vec![conflict("s1"), conflict("s2")],
            new_from_remote: Vec::new(),
            local_only: Vec::new(),
        };
        let choices = HashMap::from([("s2".to_string(), ConflictChoice::Remote)]);

        let (resolutions, _) = pending.resolve(&choices);

        let by_id: HashMap<&str, ConflictChoice> = resolutions
            .iter()
            .map(|r| (r.sync_id.as_str(), r.choice))
            .collect();
        assert_eq!(by_id["s1"], ConflictChoice::Local);
        assert_eq!(by_id["s2"], ConflictChoice::Remote);
    }

    #[test]
    fn test_resolve_passes_imports_through() {
        let c = conflict("s1");
        let pending = PendingSync {
            conflicts: vec![],
            new_from_remote: vec![c.remote.clone()],
            local_only: vec![],
        };

        let (resolutions, imports) = pending.resolve(&HashMap::new());
        assert!(resolutions.is_empty());
        assert_eq!(imports.len(), 1);
    }
}
