use crate::models::{GoalCategory, StreakType, UserId};

/// Every piece of per-user local state lives under one of these keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Goals(GoalCategory),
    Streak(StreakType),
    DailyReset,
    WeeklyReset,
    Qada,
    LastFast,
}

impl StorageKey {
    fn stem(&self) -> String {
        match self {
            StorageKey::Goals(category) => format!("goals:{}", category.as_str()),
            StorageKey::Streak(streak_type) => format!("streak:{}", streak_type.as_str()),
            StorageKey::DailyReset => "reset:daily".to_string(),
            StorageKey::WeeklyReset => "reset:weekly".to_string(),
            StorageKey::Qada => "qada".to_string(),
            StorageKey::LastFast => "fast:last".to_string(),
        }
    }

    /// The stored key, suffixed with the owning user so accounts sharing a
    /// device never read each other's state.
    pub fn for_user(&self, user: &UserId) -> String {
        format!("{}:{}", self.stem(), user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn keys_are_namespaced_per_user() {
        let alice = UserId::from_str("alice").unwrap();
        let bob = UserId::from_str("bob").unwrap();
        let key = StorageKey::Goals(GoalCategory::Prayer);
        assert_eq!(key.for_user(&alice), "goals:prayer:alice");
        assert_ne!(key.for_user(&alice), key.for_user(&bob));
        assert_eq!(
            StorageKey::Streak(StreakType::Quran).for_user(&bob),
            "streak:quran:bob"
        );
        assert_eq!(StorageKey::DailyReset.for_user(&bob), "reset:daily:bob");
    }
}
