use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::config::ScoringConfig;
use crate::models::{DailyScore, GoalCategory, GoalRecord, SectionScore};
use crate::utils::dates::date_key;

/// Score one category. Each active goal contributes `round(100 * completed /
/// target)`; the section is the mean over active goals. `None` when the user
/// has no active goal in the category, so it can be left out of the blend.
pub fn compute_section_score(record: &GoalRecord) -> Option<SectionScore> {
    let mut display_sum = 0.0;
    let mut capped_sum = 0.0;
    let mut active = 0usize;

    for goal in &record.goals {
        let Some(ratio) = goal.ratio() else {
            continue;
        };
        let capped = (100.0 * ratio.min(1.0)).round();
        let display = if goal.allows_over() {
            (100.0 * ratio).round()
        } else {
            capped
        };
        display_sum += display;
        capped_sum += capped;
        active += 1;
    }

    if active == 0 {
        return None;
    }
    Some(SectionScore {
        category: record.category,
        display: display_sum / active as f64,
        capped: capped_sum / active as f64,
    })
}

/// Weighted mean of the capped section values. Weights of missing sections
/// are dropped and the rest renormalized.
pub fn compute_overall_score(sections: &[SectionScore], weights: &ScoringConfig) -> f64 {
    let (weighted, total) = sections.iter().fold((0.0, 0.0), |(sum, total), s| {
        let w = weights.weight(s.category);
        (sum + w * s.capped, total + w)
    });
    if total <= 0.0 {
        return 0.0;
    }
    (weighted / total).clamp(0.0, 100.0)
}

/// Latest scores for the signed-in user.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    sections: BTreeMap<GoalCategory, Option<SectionScore>>,
    overall: f64,
    computed_at: Option<NaiveDateTime>,
}

impl ScoreBoard {
    pub fn section(&self, category: GoalCategory) -> Option<SectionScore> {
        self.sections.get(&category).copied().flatten()
    }

    pub fn overall(&self) -> f64 {
        self.overall
    }

    pub fn computed_at(&self) -> Option<NaiveDateTime> {
        self.computed_at
    }

    /// Recompute the given categories and the overall blend.
    pub fn refresh<'a>(
        &mut self,
        records: &BTreeMap<GoalCategory, GoalRecord>,
        categories: impl IntoIterator<Item = &'a GoalCategory>,
        weights: &ScoringConfig,
        now: NaiveDateTime,
    ) {
        for category in categories {
            let score = records.get(category).and_then(compute_section_score);
            self.sections.insert(*category, score);
        }
        let active: Vec<SectionScore> = self.sections.values().flatten().copied().collect();
        self.overall = compute_overall_score(&active, weights);
        self.computed_at = Some(now);
    }

    pub fn refresh_all(
        &mut self,
        records: &BTreeMap<GoalCategory, GoalRecord>,
        weights: &ScoringConfig,
        now: NaiveDateTime,
    ) {
        self.refresh(records, GoalCategory::all().iter(), weights, now);
    }

    pub fn daily_score(&self, now: NaiveDateTime) -> DailyScore {
        let display = |c| self.section(c).map(|s| s.display);
        DailyScore {
            date: date_key(now.date()),
            overall: self.overall,
            prayer: display(GoalCategory::Prayer),
            dhikr: display(GoalCategory::Dhikr),
            quran: display(GoalCategory::Quran),
            fasting: display(GoalCategory::Fasting),
        }
    }
}
