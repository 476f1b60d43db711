use serde::{Deserialize, Serialize};

use crate::models::GoalCategory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub category: GoalCategory,
    /// Shown to the user; over-achieving goals may push it past 100.
    pub display: f64,
    /// Every goal capped at 100; this feeds the overall score.
    pub capped: f64,
}

/// One day of score history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyScore {
    pub date: String,
    pub overall: f64,
    pub prayer: Option<f64>,
    pub dhikr: Option<f64>,
    pub quran: Option<f64>,
    pub fasting: Option<f64>,
}
