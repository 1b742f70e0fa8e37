use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-macro daily goals. Zero means "not set".
///
/// Targets are device-local until a sync round writes them to the
/// spreadsheet's settings sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroTargets {
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub sugar: u32,
}

impl MacroTargets {
    pub fn is_set(&self) -> bool {
        self.protein != 0 || self.carbs != 0 || self.fat != 0 || self.sugar != 0
    }

    /// Adopts remote values for macros this device never configured.
    pub fn fill_missing_from(&mut self, remote: &MacroTargets) {
        if self.protein == 0 {
            self.protein = remote.protein;
        }
        if self.carbs == 0 {
            self.carbs = remote.carbs;
        }
        if self.fat == 0 {
            self.fat = remote.fat;
        }
        if self.sugar == 0 {
            self.sugar = remote.sugar;
        }
    }

    /// Flat key/value projection for the settings sheet.
    pub fn to_settings(&self) -> BTreeMap<String, u32> {
        BTreeMap::from([
            ("carbs_target".to_string(), self.carbs),
            ("fat_target".to_string(), self.fat),
            ("protein_target".to_string(), self.protein),
            ("sugar_target".to_string(), self.sugar),
        ])
    }

    pub fn from_settings(settings: &BTreeMap<String, u32>) -> Self {
        Self {
            protein: settings.get("protein_target").copied().unwrap_or(0),
            carbs: settings.get("carbs_target").copied().unwrap_or(0),
            fat: settings.get("fat_target").copied().unwrap_or(0),
            sugar: settings.get("sugar_target").copied().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        let targets = MacroTargets::default();
        assert!(!targets.is_set());
    }

    #[test]
    fn test_fill_missing_keeps_local_values() {
        let mut local = MacroTargets {
            protein: 150,
            carbs: 0,
            fat: 0,
            sugar: 40,
        };
        let remote = MacroTargets {
            protein: 120,
            carbs: 250,
            fat: 70,
            sugar: 50,
        };

        local.fill_missing_from(&remote);

        assert_eq!(local.protein, 150);
        assert_eq!(local.carbs, 250);
        assert_eq!(local.fat, 70);
        assert_eq!(local.sugar, 40);
    }

    #[test]
    fn test_settings_roundtrip() {
        let targets = MacroTargets {
            protein: 150,
            carbs: 250,
            fat: 70,
            sugar: 40,
        };
        let map = targets.to_settings();
        assert_eq!(map.get("protein_target"), Some(&150));
        assert_eq!(MacroTargets::from_settings(&map), targets);
    }

    #[test]
    fn test_from_settings_ignores_unknown_keys() {
        let mut map = BTreeMap::new();
        map.insert("protein_target".to_string(), 100);
        map.insert("water_target".to_string(), 2000);

        let targets = MacroTargets::from_settings(&map);
        assert_eq!(targets.protein, 100);
        assert_eq!(targets.carbs, 0);
    }
}
