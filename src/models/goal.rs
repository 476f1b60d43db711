use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Schema version written into every stored goal record.
pub const GOAL_RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Prayer,
    Dhikr,
    Quran,
    Fasting,
}

impl GoalCategory {
    pub fn all() -> [GoalCategory; 4] {
        [
            GoalCategory::Prayer,
            GoalCategory::Dhikr,
            GoalCategory::Quran,
            GoalCategory::Fasting,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalCategory::Prayer => "prayer",
            GoalCategory::Dhikr => "dhikr",
            GoalCategory::Quran => "quran",
            GoalCategory::Fasting => "fasting",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GoalCategory::Prayer => "Prayer",
            GoalCategory::Dhikr => "Dhikr",
            GoalCategory::Quran => "Quran",
            GoalCategory::Fasting => "Fasting",
        }
    }

    /// Upper bound accepted for a goal target in this category.
    pub fn target_limit(&self, goal_name: &str) -> u32 {
        match self {
            GoalCategory::Prayer => 1,
            GoalCategory::Dhikr => 100_000,
            GoalCategory::Quran if goal_name.eq_ignore_ascii_case("verses") => 6_236,
            GoalCategory::Quran => 604,
            GoalCategory::Fasting => 7,
        }
    }
}

impl std::fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for GoalCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prayer" | "prayers" | "salah" => Ok(GoalCategory::Prayer),
            "dhikr" | "adhkar" => Ok(GoalCategory::Dhikr),
            "quran" => Ok(GoalCategory::Quran),
            "fasting" | "fast" => Ok(GoalCategory::Fasting),
            _ => Err(anyhow::anyhow!("Unknown goal category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            _ => Err(anyhow::anyhow!("Unknown frequency: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GoalKind {
    /// A checkbox: counts as target 1 while enabled.
    Flag { enabled: bool, done: bool },
    /// A tally toward `target`. Over-achieving counters keep counting past it.
    Counter {
        target: u32,
        completed: u32,
        #[serde(default)]
        allow_over: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub name: String,
    pub frequency: Frequency,
    pub kind: GoalKind,
}

impl Goal {
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frequency: Frequency::Daily,
            kind: GoalKind::Flag {
                enabled: true,
                done: false,
            },
        }
    }

    pub fn counter(name: impl Into<String>, target: u32, frequency: Frequency) -> Self {
        Self {
            name: name.into(),
            frequency,
            kind: GoalKind::Counter {
                target,
                completed: 0,
                allow_over: false,
            },
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn allowing_over(mut self) -> Self {
        if let GoalKind::Counter { allow_over, .. } = &mut self.kind {
            *allow_over = true;
        }
        self
    }

    pub fn target(&self) -> u32 {
        match self.kind {
            GoalKind::Flag { enabled, .. } => enabled as u32,
            GoalKind::Counter { target, .. } => target,
        }
    }

    pub fn completed(&self) -> u32 {
        match self.kind {
            GoalKind::Flag { enabled, done } => (enabled && done) as u32,
            GoalKind::Counter { completed, .. } => completed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.target() > 0
    }

    pub fn allows_over(&self) -> bool {
        matches!(self.kind, GoalKind::Counter { allow_over: true, .. })
    }

    pub fn is_met(&self) -> bool {
        self.is_active() && self.completed() >= self.target()
    }

    pub fn has_progress(&self) -> bool {
        self.completed() > 0
    }

    /// Completion ratio, `None` for inactive goals.
    pub fn ratio(&self) -> Option<f64> {
        let target = self.target();
        if target == 0 {
            return None;
        }
        Some(self.completed() as f64 / target as f64)
    }

    fn add(&mut self, amount: u32) {
        match &mut self.kind {
            GoalKind::Flag { done, .. } => *done = true,
            GoalKind::Counter {
                target,
                completed,
                allow_over,
            } => {
                let next = completed.saturating_add(amount);
                *completed = if *allow_over { next } else { next.min(*target) };
            }
        }
    }

    fn clear(&mut self) -> bool {
        match &mut self.kind {
            GoalKind::Flag { done, .. } => std::mem::replace(done, false),
            GoalKind::Counter { completed, .. } => std::mem::replace(completed, 0) > 0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GoalError {
    #[error("No goal named '{name}' in {category}")]
    UnknownGoal { category: GoalCategory, name: String },

    #[error("Target {value} for '{name}' is out of range (0..={max})")]
    OutOfRange { name: String, value: u32, max: u32 },

    #[error("'{0}' is a checkbox goal and has no count")]
    NotACounter(String),

    #[error("A goal named '{0}' already exists")]
    Duplicate(String),
}

/// All goals of one category, stored as a single JSON blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub version: u32,
    pub category: GoalCategory,
    pub goals: Vec<Goal>,
}

impl GoalRecord {
    pub fn new(category: GoalCategory, goals: Vec<Goal>) -> Self {
        Self {
            version: GOAL_RECORD_VERSION,
            category,
            goals,
        }
    }

    pub fn goal(&self, name: &str) -> Option<&Goal> {
        let name = name.to_lowercase();
        self.goals.iter().find(|g| g.name.to_lowercase() == name)
    }

    fn goal_mut(&mut self, name: &str) -> Result<&mut Goal, GoalError> {
        let category = self.category;
        let wanted = name.to_lowercase();
        self.goals
            .iter_mut()
            .find(|g| g.name.to_lowercase() == wanted)
            .ok_or_else(|| GoalError::UnknownGoal {
                category,
                name: name.to_string(),
            })
    }

    pub fn is_active(&self) -> bool {
        self.goals.iter().any(Goal::is_active)
    }

    pub fn has_progress(&self) -> bool {
        self.goals.iter().any(|g| g.is_active() && g.has_progress())
    }

    /// Progress that can only have been made today: weekly counters carry
    /// earlier days and are left out.
    pub fn has_daily_progress(&self) -> bool {
        self.goals
            .iter()
            .any(|g| g.frequency == Frequency::Daily && g.is_active() && g.has_progress())
    }

    /// Whether any active goal completed more than it did in `before`.
    pub fn progressed_since(&self, before: &GoalRecord) -> bool {
        self.goals.iter().filter(|g| g.is_active()).any(|g| {
            let earlier = before.goal(&g.name).map_or(0, Goal::completed);
            g.completed() > earlier
        })
    }

    /// True when every active goal is met and at least one is active.
    pub fn all_met(&self) -> bool {
        self.is_active() && self.goals.iter().filter(|g| g.is_active()).all(Goal::is_met)
    }

    /// Set or clear a checkbox goal. Counters are set to their target or zero.
    pub fn set_done(&mut self, name: &str, value: bool) -> Result<&Goal, GoalError> {
        let goal = self.goal_mut(name)?;
        match &mut goal.kind {
            GoalKind::Flag { done, .. } => *done = value,
            GoalKind::Counter {
                target, completed, ..
            } => *completed = if value { *target } else { 0 },
        }
        Ok(&*goal)
    }

    /// Add progress to a goal. On a checkbox this marks it done.
    pub fn add_progress(&mut self, name: &str, amount: u32) -> Result<&Goal, GoalError> {
        let goal = self.goal_mut(name)?;
        goal.add(amount);
        Ok(&*goal)
    }

    /// Change a goal target, keeping completion. A checkbox accepts 0 or 1
    /// to disable or enable it.
    pub fn set_target(&mut self, name: &str, value: u32) -> Result<&Goal, GoalError> {
        let max = self.category.target_limit(name);
        if value > max {
            return Err(GoalError::OutOfRange {
                name: name.to_string(),
                value,
                max,
            });
        }
        let goal = self.goal_mut(name)?;
        match &mut goal.kind {
            GoalKind::Flag { enabled, .. } => {
                if value > 1 {
                    return Err(GoalError::OutOfRange {
                        name: name.to_string(),
                        value,
                        max: 1,
                    });
                }
                *enabled = value == 1;
            }
            GoalKind::Counter {
                target,
                completed,
                allow_over,
            } => {
                *target = value;
                if !*allow_over {
                    *completed = (*completed).min(value);
                }
            }
        }
        Ok(&*goal)
    }

    pub fn push_goal(&mut self, goal: Goal) -> Result<(), GoalError> {
        if self.goal(&goal.name).is_some() {
            return Err(GoalError::Duplicate(goal.name));
        }
        let max = self.category.target_limit(&goal.name);
        if goal.target() > max {
            return Err(GoalError::OutOfRange {
                name: goal.name.clone(),
                value: goal.target(),
                max,
            });
        }
        self.goals.push(goal);
        Ok(())
    }

    /// Zero completion of every goal with the given frequency. Returns
    /// whether anything changed.
    pub fn reset(&mut self, frequency: Frequency) -> bool {
        let mut changed = false;
        for goal in self.goals.iter_mut().filter(|g| g.frequency == frequency) {
            changed |= goal.clear();
        }
        changed
    }
}
