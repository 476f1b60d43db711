use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::PrayerType;

/// Count of owed makeup prayers per prayer type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QadaLedger {
    #[serde(default)]
    pub owed: BTreeMap<PrayerType, u32>,
}

impl QadaLedger {
    pub fn add(&mut self, prayer: PrayerType, count: u32) {
        let entry = self.owed.entry(prayer).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Complete one makeup prayer. With no prayer given, the earliest prayer
    /// of the day that is still owed is taken. Returns the prayer completed.
    pub fn complete(&mut self, prayer: Option<PrayerType>) -> Option<PrayerType> {
        let target = match prayer {
            Some(p) => p,
            None => PrayerType::all().into_iter().find(|p| self.count(*p) > 0)?,
        };
        let entry = self.owed.get_mut(&target)?;
        if *entry == 0 {
            return None;
        }
        *entry -= 1;
        if *entry == 0 {
            self.owed.remove(&target);
        }
        Some(target)
    }

    pub fn count(&self, prayer: PrayerType) -> u32 {
        self.owed.get(&prayer).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.owed.values().sum()
    }
}
