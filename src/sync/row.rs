use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{GoalRecord, QadaLedger, StreakRecord};

/// The single remote row kept per user. Goal and streak records travel as
/// JSON columns; scores are flattened so the server can query them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRow {
    pub user_id: String,

    pub prayer_goals: GoalRecord,
    pub dhikr_goals: GoalRecord,
    pub quran_goals: GoalRecord,
    pub fasting_goals: GoalRecord,

    pub prayer_score: Option<f64>,
    pub dhikr_score: Option<f64>,
    pub quran_score: Option<f64>,
    pub fasting_score: Option<f64>,
    pub iman_score: f64,

    pub general_streak: StreakRecord,
    pub prayer_streak: StreakRecord,
    pub workout_streak: StreakRecord,
    pub quran_streak: StreakRecord,

    #[serde(default)]
    pub qada: QadaLedger,
    #[serde(default)]
    pub last_daily_reset: Option<NaiveDate>,
    #[serde(default)]
    pub last_weekly_reset: Option<String>,

    pub updated_at: NaiveDateTime,
}
