pub mod goal;
pub mod prayer;
pub mod qada;
pub mod score;
pub mod streak;
pub mod user;

pub use goal::{Frequency, Goal, GoalCategory, GoalError, GoalKind, GoalRecord, GOAL_RECORD_VERSION};
pub use prayer::PrayerType;
pub use qada::QadaLedger;
pub use score::{DailyScore, SectionScore};
pub use streak::{Milestone, StreakOutcome, StreakRecord, StreakState, StreakType, MILESTONES};
pub use user::UserId;
