use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Streak lengths announced to the user.
pub const MILESTONES: &[u32] = &[3, 7, 14, 30, 40, 100, 365];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakType {
    General,
    Prayer,
    Workout,
    Quran,
}

impl StreakType {
    pub fn all() -> [StreakType; 4] {
        [
            StreakType::General,
            StreakType::Prayer,
            StreakType::Workout,
            StreakType::Quran,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreakType::General => "general",
            StreakType::Prayer => "prayer",
            StreakType::Workout => "workout",
            StreakType::Quran => "quran",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StreakType::General => "Activity",
            StreakType::Prayer => "Prayer",
            StreakType::Workout => "Workout",
            StreakType::Quran => "Quran",
        }
    }
}

impl std::fmt::Display for StreakType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for StreakType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" | "activity" => Ok(StreakType::General),
            "prayer" | "salah" => Ok(StreakType::Prayer),
            "workout" => Ok(StreakType::Workout),
            "quran" => Ok(StreakType::Quran),
            _ => Err(anyhow::anyhow!("Unknown streak type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakState {
    NoActivityYet,
    ActiveToday,
    /// Last active yesterday; today still counts toward the streak.
    Continuing,
    StreakBroken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// Today was already counted (or the clock moved backwards).
    AlreadyCounted,
    /// Yesterday was active, the streak grew.
    Extended,
    /// First activity, or the previous streak had lapsed.
    Started,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub streak_type: StreakType,
    pub days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days_active: u32,
    pub last_active_date: Option<NaiveDate>,
}

impl StreakRecord {
    /// Whole calendar days between the last active day and `today`.
    pub fn days_since_active(&self, today: NaiveDate) -> Option<i64> {
        self.last_active_date.map(|last| (today - last).num_days())
    }

    pub fn state(&self, today: NaiveDate) -> StreakState {
        match self.days_since_active(today) {
            None => StreakState::NoActivityYet,
            Some(d) if d <= 0 => StreakState::ActiveToday,
            Some(1) if self.current_streak > 0 => StreakState::Continuing,
            Some(_) => StreakState::StreakBroken,
        }
    }

    pub fn record_activity(&mut self, today: NaiveDate) -> StreakOutcome {
        let outcome = match self.days_since_active(today) {
            Some(d) if d <= 0 => return StreakOutcome::AlreadyCounted,
            Some(1) if self.current_streak > 0 => {
                self.current_streak += 1;
                StreakOutcome::Extended
            }
            _ => {
                self.current_streak = 1;
                StreakOutcome::Started
            }
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.total_days_active = self.total_days_active.saturating_add(1);
        self.last_active_date = Some(today);
        outcome
    }

    /// Zero the current streak once more than a day has passed without
    /// activity. Returns whether the streak was broken by this call.
    pub fn check_for_break(&mut self, today: NaiveDate) -> bool {
        match self.days_since_active(today) {
            Some(d) if d > 1 && self.current_streak > 0 => {
                self.current_streak = 0;
                true
            }
            _ => false,
        }
    }

    /// Explicit user reset. Lifetime active days survive.
    pub fn reset(&mut self) {
        self.current_streak = 0;
        self.longest_streak = 0;
        self.last_active_date = None;
    }

    pub fn milestone(&self, streak_type: StreakType) -> Option<Milestone> {
        MILESTONES
            .contains(&self.current_streak)
            .then_some(Milestone {
                streak_type,
                days: self.current_streak,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, n).unwrap()
    }

    #[test]
    fn consecutive_days_extend_the_streak() {
        let mut s = StreakRecord::default();
        assert_eq!(s.record_activity(day(1)), StreakOutcome::Started);
        assert_eq!(s.record_activity(day(2)), StreakOutcome::Extended);
        assert_eq!(s.current_streak, 2);
        assert_eq!(s.longest_streak, 2);
        assert_eq!(s.total_days_active, 2);
    }

    #[test]
    fn same_day_is_counted_once() {
        let mut s = StreakRecord::default();
        s.record_activity(day(1));
        let before = s.clone();
        assert_eq!(s.record_activity(day(1)), StreakOutcome::AlreadyCounted);
        assert_eq!(s, before);
    }

    #[test]
    fn gap_restarts_at_one() {
        let mut s = StreakRecord::default();
        s.record_activity(day(1));
        s.record_activity(day(2));
        s.record_activity(day(3));
        assert_eq!(s.record_activity(day(6)), StreakOutcome::Started);
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.longest_streak, 3);
        assert_eq!(s.total_days_active, 4);
    }

    #[test]
    fn break_is_detected_passively() {
        let mut s = StreakRecord {
            current_streak: 5,
            longest_streak: 5,
            total_days_active: 9,
            last_active_date: Some(day(10)),
        };
        assert!(!s.check_for_break(day(11)));
        assert_eq!(s.current_streak, 5);
        assert!(s.check_for_break(day(13)));
        assert_eq!(s.current_streak, 0);
        assert_eq!(s.longest_streak, 5);
        assert!(!s.check_for_break(day(13)));
    }

    #[test]
    fn clock_moving_backwards_does_not_count() {
        let mut s = StreakRecord::default();
        s.record_activity(day(5));
        assert_eq!(s.record_activity(day(4)), StreakOutcome::AlreadyCounted);
        assert_eq!(s.last_active_date, Some(day(5)));
        assert_eq!(s.state(day(4)), StreakState::ActiveToday);
    }

    #[test]
    fn states_follow_the_calendar() {
        let mut s = StreakRecord::default();
        assert_eq!(s.state(day(1)), StreakState::NoActivityYet);
        s.record_activity(day(1));
        assert_eq!(s.state(day(1)), StreakState::ActiveToday);
        assert_eq!(s.state(day(2)), StreakState::Continuing);
        assert_eq!(s.state(day(3)), StreakState::StreakBroken);
    }

    #[test]
    fn longest_never_trails_current() {
        let mut s = StreakRecord::default();
        for d in [1, 2, 3, 5, 6, 9, 10, 11, 12] {
            s.record_activity(day(d));
            assert!(s.longest_streak >= s.current_streak);
            s.check_for_break(day(d + 2));
            assert!(s.longest_streak >= s.current_streak);
        }
    }

    #[test]
    fn reset_keeps_lifetime_days() {
        let mut s = StreakRecord::default();
        s.record_activity(day(1));
        s.record_activity(day(2));
        s.reset();
        assert_eq!(s.current_streak, 0);
        assert_eq!(s.longest_streak, 0);
        assert_eq!(s.total_days_active, 2);
        assert_eq!(s.state(day(3)), StreakState::NoActivityYet);
    }

    #[test]
    fn milestones_fire_on_exact_lengths() {
        let mut s = StreakRecord::default();
        for d in 1..=3 {
            s.record_activity(day(d));
        }
        assert_eq!(
            s.milestone(StreakType::Prayer),
            Some(Milestone {
                streak_type: StreakType::Prayer,
                days: 3
            })
        );
        s.record_activity(day(4));
        assert_eq!(s.milestone(StreakType::Prayer), None);
    }
}
