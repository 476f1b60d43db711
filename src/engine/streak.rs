use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::collections::BTreeMap;

use crate::db::repository::KvRepo;
use crate::db::StorageKey;
use crate::models::{
    GoalCategory, GoalRecord, StreakOutcome, StreakRecord, StreakType, UserId,
};
use crate::notify::Notifier;

/// Day-granularity streak counters for one user, written through to local
/// storage on every change.
pub struct StreakEngine {
    user: UserId,
    records: BTreeMap<StreakType, StreakRecord>,
    notifier: Box<dyn Notifier>,
}

impl StreakEngine {
    pub fn load(conn: &Connection, user: UserId, notifier: Box<dyn Notifier>) -> Self {
        let records = StreakType::all()
            .into_iter()
            .map(|t| (t, read_record(conn, &user, t)))
            .collect();
        Self {
            user,
            records,
            notifier,
        }
    }

    pub fn record(&self, streak_type: StreakType) -> StreakRecord {
        self.records.get(&streak_type).cloned().unwrap_or_default()
    }

    /// Count `now`'s calendar day toward the streak. Repeated calls on the
    /// same day are no-ops.
    pub fn record_activity(
        &mut self,
        conn: &Connection,
        streak_type: StreakType,
        now: NaiveDateTime,
    ) -> Result<StreakOutcome> {
        let record = self.records.entry(streak_type).or_default();
        let outcome = record.record_activity(now.date());
        if outcome == StreakOutcome::AlreadyCounted {
            return Ok(outcome);
        }
        let milestone = record.milestone(streak_type);
        log::debug!(
            "{} streak {:?}: now {} day(s)",
            streak_type,
            outcome,
            record.current_streak
        );
        let snapshot = record.clone();
        self.store(conn, streak_type, &snapshot)?;
        if let Some(m) = milestone {
            self.notifier.announce(&m);
        }
        Ok(outcome)
    }

    /// Zero a lapsed streak without waiting for the next activity.
    pub fn check_for_break(
        &mut self,
        conn: &Connection,
        streak_type: StreakType,
        now: NaiveDateTime,
    ) -> Result<bool> {
        let record = self.records.entry(streak_type).or_default();
        if !record.check_for_break(now.date()) {
            return Ok(false);
        }
        log::info!("{} streak broken (longest {})", streak_type, record.longest_streak);
        let snapshot = record.clone();
        self.store(conn, streak_type, &snapshot)?;
        Ok(true)
    }

    /// Break check for every type. Types are independent, so a storage error
    /// on one does not stop the others.
    pub fn check_all(&mut self, conn: &Connection, now: NaiveDateTime) -> Vec<StreakType> {
        let mut broken = Vec::new();
        for t in StreakType::all() {
            match self.check_for_break(conn, t, now) {
                Ok(true) => broken.push(t),
                Ok(false) => {}
                Err(e) => log::warn!("Could not save {} streak: {:#}", t, e),
            }
        }
        broken
    }

    /// Advance the streaks whose qualifying predicate holds for today's goals.
    /// `progressed` names the category the current action added progress to,
    /// which is the only way a weekly goal counts toward today.
    /// Workout streaks are only advanced by an explicit workout log.
    pub fn evaluate(
        &mut self,
        conn: &Connection,
        goals: &BTreeMap<GoalCategory, GoalRecord>,
        progressed: Option<GoalCategory>,
        now: NaiveDateTime,
    ) -> Vec<(StreakType, StreakOutcome)> {
        let active_today = |c: GoalCategory| {
            progressed == Some(c) || goals.get(&c).is_some_and(GoalRecord::has_daily_progress)
        };
        let qualifies = |t: StreakType| match t {
            StreakType::General => GoalCategory::all().into_iter().any(&active_today),
            StreakType::Prayer => goals
                .get(&GoalCategory::Prayer)
                .is_some_and(GoalRecord::all_met),
            StreakType::Quran => active_today(GoalCategory::Quran),
            StreakType::Workout => false,
        };

        let mut outcomes = Vec::new();
        for t in StreakType::all() {
            if !qualifies(t) {
                continue;
            }
            match self.record_activity(conn, t, now) {
                Ok(outcome) => outcomes.push((t, outcome)),
                Err(e) => log::warn!("Could not save {} streak: {:#}", t, e),
            }
        }
        outcomes
    }

    pub fn reset(&mut self, conn: &Connection, streak_type: StreakType) -> Result<()> {
        let record = self.records.entry(streak_type).or_default();
        record.reset();
        let snapshot = record.clone();
        self.store(conn, streak_type, &snapshot)
    }

    /// Replace a record wholesale and persist it.
    pub fn replace(
        &mut self,
        conn: &Connection,
        streak_type: StreakType,
        record: StreakRecord,
    ) -> Result<()> {
        self.records.insert(streak_type, record.clone());
        self.store(conn, streak_type, &record)
    }

    fn store(&self, conn: &Connection, streak_type: StreakType, record: &StreakRecord) -> Result<()> {
        KvRepo::put_json(conn, &self.user, StorageKey::Streak(streak_type), record)
    }
}

fn read_record(conn: &Connection, user: &UserId, streak_type: StreakType) -> StreakRecord {
    KvRepo::get_json(conn, user, StorageKey::Streak(streak_type))
        .unwrap_or_else(|e| {
            log::warn!("Could not load {} streak: {:#}", streak_type, e);
            None
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{Frequency, Goal, Milestone};
    use crate::notify::RecordingNotifier;
    use chrono::{Duration, NaiveDate};
    use std::str::FromStr;

    fn setup() -> (Connection, StreakEngine, RecordingNotifier) {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let notifier = RecordingNotifier::default();
        let engine = StreakEngine::load(
            &conn,
            UserId::from_str("u1").unwrap(),
            Box::new(notifier.clone()),
        );
        (conn, engine, notifier)
    }

    fn day1() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn prayer_streak_grows_then_breaks() {
        let (conn, mut engine, _) = setup();
        let day2 = day1() + Duration::days(1);

        engine.record_activity(&conn, StreakType::Prayer, day1()).unwrap();
        assert_eq!(engine.record(StreakType::Prayer).current_streak, 1);
        engine.record_activity(&conn, StreakType::Prayer, day2).unwrap();
        assert_eq!(engine.record(StreakType::Prayer).current_streak, 2);

        assert!(engine
            .check_for_break(&conn, StreakType::Prayer, day2 + Duration::days(3))
            .unwrap());
        let record = engine.record(StreakType::Prayer);
        assert_eq!(record.current_streak, 0);
        assert_eq!(record.longest_streak, 2);
    }

    #[test]
    fn records_survive_reload() {
        let (conn, mut engine, _) = setup();
        engine.record_activity(&conn, StreakType::Quran, day1()).unwrap();
        let fresh = StreakEngine::load(
            &conn,
            UserId::from_str("u1").unwrap(),
            Box::new(RecordingNotifier::default()),
        );
        assert_eq!(fresh.record(StreakType::Quran).total_days_active, 1);
        assert_eq!(fresh.record(StreakType::Prayer), StreakRecord::default());
    }

    #[test]
    fn second_activity_same_day_changes_nothing() {
        let (conn, mut engine, _) = setup();
        engine.record_activity(&conn, StreakType::General, day1()).unwrap();
        let before = engine.record(StreakType::General);
        let outcome = engine
            .record_activity(&conn, StreakType::General, day1() + Duration::hours(5))
            .unwrap();
        assert_eq!(outcome, StreakOutcome::AlreadyCounted);
        assert_eq!(engine.record(StreakType::General), before);
    }

    #[test]
    fn third_day_announces_milestone_once() {
        let (conn, mut engine, notifier) = setup();
        for d in 0..3 {
            engine
                .record_activity(&conn, StreakType::Workout, day1() + Duration::days(d))
                .unwrap();
        }
        engine
            .record_activity(&conn, StreakType::Workout, day1() + Duration::days(2))
            .unwrap();
        assert_eq!(
            notifier.seen(),
            vec![Milestone {
                streak_type: StreakType::Workout,
                days: 3
            }]
        );
    }

    #[test]
    fn evaluate_applies_each_predicate() {
        let (conn, mut engine, _) = setup();
        let mut goals = BTreeMap::new();
        let mut prayer = GoalRecord::new(
            GoalCategory::Prayer,
            vec![Goal::flag("fajr"), Goal::flag("zuhr")],
        );
        prayer.set_done("fajr", true).unwrap();
        goals.insert(GoalCategory::Prayer, prayer.clone());

        let outcomes = engine.evaluate(&conn, &goals, Some(GoalCategory::Prayer), day1());
        assert_eq!(outcomes, vec![(StreakType::General, StreakOutcome::Started)]);

        prayer.set_done("zuhr", true).unwrap();
        goals.insert(GoalCategory::Prayer, prayer);
        let outcomes = engine.evaluate(&conn, &goals, Some(GoalCategory::Prayer), day1());
        assert_eq!(
            outcomes,
            vec![
                (StreakType::General, StreakOutcome::AlreadyCounted),
                (StreakType::Prayer, StreakOutcome::Started),
            ]
        );
        assert_eq!(engine.record(StreakType::Quran), StreakRecord::default());
        assert_eq!(engine.record(StreakType::Workout), StreakRecord::default());
    }

    #[test]
    fn carried_weekly_progress_does_not_qualify() {
        let (conn, mut engine, _) = setup();
        let mut fasting = GoalRecord::new(
            GoalCategory::Fasting,
            vec![Goal::counter("days", 2, Frequency::Weekly)],
        );
        fasting.add_progress("days", 1).unwrap();
        let mut goals = BTreeMap::new();
        goals.insert(GoalCategory::Fasting, fasting);

        assert!(engine.evaluate(&conn, &goals, None, day1()).is_empty());
        let outcomes = engine.evaluate(&conn, &goals, Some(GoalCategory::Fasting), day1());
        assert_eq!(outcomes, vec![(StreakType::General, StreakOutcome::Started)]);
    }

    #[test]
    fn check_all_reports_broken_types() {
        let (conn, mut engine, _) = setup();
        engine.record_activity(&conn, StreakType::General, day1()).unwrap();
        engine
            .record_activity(&conn, StreakType::Quran, day1() + Duration::days(2))
            .unwrap();
        let broken = engine.check_all(&conn, day1() + Duration::days(3));
        assert_eq!(broken, vec![StreakType::General]);
    }

    #[test]
    fn reset_is_persisted() {
        let (conn, mut engine, _) = setup();
        engine.record_activity(&conn, StreakType::Prayer, day1()).unwrap();
        engine.reset(&conn, StreakType::Prayer).unwrap();
        let fresh = StreakEngine::load(
            &conn,
            UserId::from_str("u1").unwrap(),
            Box::new(RecordingNotifier::default()),
        );
        let record = fresh.record(StreakType::Prayer);
        assert_eq!(record.current_streak, 0);
        assert_eq!(record.total_days_active, 1);
        assert!(record.last_active_date.is_none());
    }
}
