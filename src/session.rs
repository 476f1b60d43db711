//! The signed-in user's application state.
//!
//! A [`Session`] is created on sign-in (or resumed for the user who is already
//! signed in) and owns everything the core needs: the local database, the
//! goal store, the score board, the streak engine and the sync bridge. Each
//! user action runs one synchronous pass:
//!
//! goal mutation → score recompute → streak day-check → optional sync push
//!
//! Storage and network failures along that path are logged and skipped; only
//! invalid input is reported back to the caller.

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::AppConfig;
use crate::db::repository::{HistoryRepo, KvRepo, MetaRepo};
use crate::db::StorageKey;
use crate::engine::{GoalStore, ScoreBoard, StreakEngine};
use crate::models::{
    DailyScore, Frequency, Goal, GoalCategory, GoalError, GoalKind, GoalRecord, PrayerType,
    QadaLedger, StreakOutcome, StreakRecord, StreakType, UserId,
};
use crate::notify::Notifier;
use crate::sync::{InitOutcome, RemoteStore, SyncBridge, SyncError, SyncStatus};
use crate::utils::dates::date_key;

const CURRENT_USER_KEY: &str = "current_user";

pub struct Session {
    conn: Connection,
    config: AppConfig,
    user: UserId,
    records: BTreeMap<GoalCategory, GoalRecord>,
    goals: GoalStore,
    scores: ScoreBoard,
    streaks: StreakEngine,
    sync: SyncBridge,
}

impl Session {
    pub fn current_user(conn: &Connection) -> Result<Option<UserId>> {
        MetaRepo::get(conn, CURRENT_USER_KEY)?
            .map(|s| UserId::from_str(&s))
            .transpose()
    }

    /// Sign `user` in on this device. With sync configured, the remote row is
    /// created from local state or pulled over it.
    pub fn sign_in(
        conn: Connection,
        config: AppConfig,
        user: UserId,
        remote: Option<Box<dyn RemoteStore>>,
        notifier: Box<dyn Notifier>,
        now: NaiveDateTime,
    ) -> Result<Self> {
        MetaRepo::set(&conn, CURRENT_USER_KEY, user.as_str())?;
        let mut session = Self::build(conn, config, user, remote, notifier, now);

        if session.sync.is_enabled() {
            let outcome = session.sync.initialize_for_new_user(
                &session.conn,
                &mut session.goals,
                &mut session.streaks,
                &session.scores,
                now,
            );
            match outcome {
                Ok(InitOutcome::PulledRemote) => {
                    session.records = session.goals.load_all(&session.conn);
                    log::info!("Restored {} from remote", session.user);
                }
                Ok(InitOutcome::CreatedRemote) => {
                    log::info!("Created remote row for {}", session.user)
                }
                Err(_) => {}
            }
        }

        session.tick_recompute(now);
        Ok(session)
    }

    /// Resume the session of the user already signed in on this device.
    pub fn open(
        conn: Connection,
        config: AppConfig,
        remote: Option<Box<dyn RemoteStore>>,
        notifier: Box<dyn Notifier>,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let user = Self::current_user(&conn)?
            .ok_or_else(|| anyhow!("Not signed in. Run `iman login <user-id>` first."))?;
        let mut session = Self::build(conn, config, user, remote, notifier, now);
        session.tick_recompute(now);
        Ok(session)
    }

    fn build(
        conn: Connection,
        config: AppConfig,
        user: UserId,
        remote: Option<Box<dyn RemoteStore>>,
        notifier: Box<dyn Notifier>,
        now: NaiveDateTime,
    ) -> Self {
        let goals = GoalStore::new(user.clone(), config.goals.clone());
        let records = goals.load_all(&conn);
        let streaks = StreakEngine::load(&conn, user.clone(), notifier);
        let mut scores = ScoreBoard::default();
        scores.refresh_all(&records, &config.scoring, now);
        Self {
            conn,
            config,
            user,
            records,
            goals,
            scores,
            streaks,
            sync: SyncBridge::new(remote),
        }
    }

    /// Final best-effort push, then forget the signed-in user. Local data is
    /// kept for the next sign-in.
    pub fn sign_out(mut self, now: NaiveDateTime) -> Result<()> {
        if self.sync.is_enabled() {
            let _ = self.push(now);
        }
        MetaRepo::delete(&self.conn, CURRENT_USER_KEY)?;
        log::info!("Signed out {}", self.user);
        Ok(())
    }

    /// Remove every trace of the user, locally and (best effort) remotely.
    /// Returns the number of local keys deleted.
    pub fn delete_account(mut self, now: NaiveDateTime) -> Result<usize> {
        if self.sync.is_enabled() {
            let _ = self.sync.delete_remote(&self.goals, now);
        }
        let deleted = KvRepo::delete_user(&self.conn, &self.user)?;
        HistoryRepo::delete_user(&self.conn, &self.user)?;
        MetaRepo::delete(&self.conn, CURRENT_USER_KEY)?;
        log::info!("Deleted account data for {}", self.user);
        Ok(deleted)
    }

    // ─── Read side ───────────────────────────────────────────────────────────

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn goals(&self, category: GoalCategory) -> GoalRecord {
        self.records
            .get(&category)
            .cloned()
            .unwrap_or_else(|| self.goals.default_record(category))
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn streak(&self, streak_type: StreakType) -> StreakRecord {
        self.streaks.record(streak_type)
    }

    pub fn sync_status(&self) -> &SyncStatus {
        self.sync.status()
    }

    pub fn sync_enabled(&self) -> bool {
        self.sync.is_enabled()
    }

    pub fn qada(&self) -> QadaLedger {
        KvRepo::get_json(&self.conn, &self.user, StorageKey::Qada)
            .unwrap_or_else(|e| {
                log::warn!("Could not read qada ledger: {:#}", e);
                None
            })
            .unwrap_or_default()
    }

    /// Score history for the `days` days ending today.
    pub fn history(&self, days: u32, now: NaiveDateTime) -> Result<Vec<DailyScore>> {
        let end = now.date();
        let start = end - Duration::days(days.saturating_sub(1) as i64);
        HistoryRepo::get_range(&self.conn, &self.user, &date_key(start), &date_key(end))
    }

    // ─── User actions ────────────────────────────────────────────────────────

    pub fn mark_prayer(&mut self, prayer: PrayerType, done: bool, now: NaiveDateTime) -> Result<()> {
        self.mutate(GoalCategory::Prayer, now, |r| {
            r.set_done(prayer.as_str(), done).map(|_| ())
        })
    }

    /// Clear the prayer and owe a makeup for it.
    pub fn mark_prayer_missed(&mut self, prayer: PrayerType, now: NaiveDateTime) -> Result<()> {
        self.mark_prayer(prayer, false, now)?;
        self.update_qada(now, |ledger| {
            ledger.add(prayer, 1);
            true
        })?;
        Ok(())
    }

    /// Toggle a checkbox dhikr, or add `count` (default 1) to a counter.
    pub fn dhikr(&mut self, name: &str, count: Option<u32>, now: NaiveDateTime) -> Result<Goal> {
        self.mutate(GoalCategory::Dhikr, now, |r| {
            let goal = r.goal(name).ok_or_else(|| GoalError::UnknownGoal {
                category: GoalCategory::Dhikr,
                name: name.to_string(),
            })?;
            let toggled = match goal.kind {
                GoalKind::Flag { done, .. } => Some(!done),
                GoalKind::Counter { .. } => None,
            };
            let goal_name = goal.name.clone();
            match (toggled, count) {
                (Some(_), Some(_)) => Err(GoalError::NotACounter(goal_name)),
                (Some(done), None) => r.set_done(name, done).cloned(),
                (None, count) => r.add_progress(name, count.unwrap_or(1)).cloned(),
            }
        })
    }

    /// Log Quran progress against `goal` ("pages" or "verses").
    pub fn log_quran(&mut self, goal: &str, amount: u32, now: NaiveDateTime) -> Result<Goal> {
        self.mutate(GoalCategory::Quran, now, |r| r.add_progress(goal, amount).cloned())
    }

    /// Count today as a fasting day. Returns false if today was already
    /// logged.
    pub fn log_fast(&mut self, now: NaiveDateTime) -> Result<bool> {
        let today = now.date();
        let last: Option<chrono::NaiveDate> =
            KvRepo::get_json(&self.conn, &self.user, StorageKey::LastFast).unwrap_or_else(|e| {
                log::warn!("Could not read last fast marker: {:#}", e);
                None
            });
        if last == Some(today) {
            return Ok(false);
        }
        self.mutate(GoalCategory::Fasting, now, |r| r.add_progress("days", 1).map(|_| ()))?;
        if let Err(e) = KvRepo::put_json(&self.conn, &self.user, StorageKey::LastFast, &today) {
            log::warn!("Could not save last fast marker: {:#}", e);
        }
        Ok(true)
    }

    /// Workouts have no goal record; they only feed the workout and general
    /// streaks.
    pub fn log_workout(&mut self, now: NaiveDateTime) -> Result<StreakOutcome> {
        let outcome = self.streaks.record_activity(&self.conn, StreakType::Workout, now)?;
        if let Err(e) = self.streaks.record_activity(&self.conn, StreakType::General, now) {
            log::warn!("Could not save general streak: {:#}", e);
        }
        self.push_on_change(now);
        Ok(outcome)
    }

    pub fn set_target(
        &mut self,
        category: GoalCategory,
        name: &str,
        target: u32,
        now: NaiveDateTime,
    ) -> Result<Goal> {
        self.mutate(category, now, |r| r.set_target(name, target).cloned())
    }

    pub fn add_dhikr_goal(
        &mut self,
        name: &str,
        counter: bool,
        target: u32,
        frequency: Frequency,
        now: NaiveDateTime,
    ) -> Result<()> {
        let goal = if counter {
            Goal::counter(name, target, frequency).allowing_over()
        } else {
            Goal::flag(name).with_frequency(frequency)
        };
        self.mutate(GoalCategory::Dhikr, now, |r| r.push_goal(goal))
    }

    pub fn qada_add(&mut self, prayer: PrayerType, count: u32, now: NaiveDateTime) -> Result<()> {
        self.update_qada(now, |ledger| {
            ledger.add(prayer, count);
            count > 0
        })?;
        Ok(())
    }

    /// Make up one owed prayer: the given one, or the earliest in the day
    /// that is owed. Returns which prayer was cleared, if any.
    pub fn qada_complete(
        &mut self,
        prayer: Option<PrayerType>,
        now: NaiveDateTime,
    ) -> Result<Option<PrayerType>> {
        let mut done = None;
        self.update_qada(now, |ledger| {
            done = ledger.complete(prayer);
            done.is_some()
        })?;
        Ok(done)
    }

    pub fn reset_streak(&mut self, streak_type: StreakType, now: NaiveDateTime) -> Result<()> {
        self.streaks.reset(&self.conn, streak_type)?;
        self.push_on_change(now);
        Ok(())
    }

    // ─── Periodic work ───────────────────────────────────────────────────────

    /// Day/week rollover, passive streak breaks and a full score recompute.
    pub fn tick_recompute(&mut self, now: NaiveDateTime) {
        self.roll_over(now);
        self.streaks.check_all(&self.conn, now);
        self.goals.take_stale();
        self.scores.refresh_all(&self.records, &self.config.scoring, now);
        self.record_history(now);
    }

    pub fn tick_sync(&mut self, now: NaiveDateTime) {
        if self.sync.is_enabled() {
            let _ = self.push(now);
        }
    }

    pub fn push(&mut self, now: NaiveDateTime) -> Result<(), SyncError> {
        self.sync
            .push_local_to_remote(&self.conn, &self.goals, &self.streaks, &self.scores, now)
    }

    /// Replace local state with the remote row, if there is one.
    pub fn pull(&mut self, now: NaiveDateTime) -> Result<bool, SyncError> {
        let found =
            self.sync
                .pull_remote_to_local(&self.conn, &mut self.goals, &mut self.streaks, now)?;
        if found {
            self.records = self.goals.load_all(&self.conn);
            // The row may have been pushed on an earlier day
            self.roll_over(now);
            self.streaks.check_all(&self.conn, now);
            self.goals.take_stale();
            self.scores.refresh_all(&self.records, &self.config.scoring, now);
            self.record_history(now);
        }
        Ok(found)
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    fn mutate<T>(
        &mut self,
        category: GoalCategory,
        now: NaiveDateTime,
        f: impl FnOnce(&mut GoalRecord) -> Result<T, GoalError>,
    ) -> Result<T> {
        self.roll_over(now);
        let mut record = self.goals(category);
        let before = record.clone();
        let value = f(&mut record)?;
        let progressed = record.progressed_since(&before).then_some(category);

        if let Err(e) = self.goals.save_goals(&self.conn, category, &record) {
            log::warn!("Could not save {} goals: {:#}", category, e);
        }
        self.records.insert(category, record);

        let stale = self.goals.take_stale();
        self.scores
            .refresh(&self.records, stale.iter(), &self.config.scoring, now);
        self.record_history(now);

        self.streaks
            .evaluate(&self.conn, &self.records, progressed, now);
        self.push_on_change(now);
        Ok(value)
    }

    /// `f` returns whether it changed the ledger.
    fn update_qada(
        &mut self,
        now: NaiveDateTime,
        f: impl FnOnce(&mut QadaLedger) -> bool,
    ) -> Result<bool> {
        let mut ledger = self.qada();
        if !f(&mut ledger) {
            return Ok(false);
        }
        KvRepo::put_json(&self.conn, &self.user, StorageKey::Qada, &ledger)?;
        self.push_on_change(now);
        Ok(true)
    }

    /// Apply any daily or weekly reset that is due, in storage and in the
    /// cached records alike.
    fn roll_over(&mut self, now: NaiveDateTime) {
        match self.goals.apply_daily_reset(&self.conn, now) {
            Ok(true) => self.reset_cached(Frequency::Daily),
            Ok(false) => {}
            Err(e) => log::warn!("Daily reset failed: {:#}", e),
        }
        match self.goals.apply_weekly_reset(&self.conn, now) {
            Ok(true) => self.reset_cached(Frequency::Weekly),
            Ok(false) => {}
            Err(e) => log::warn!("Weekly reset failed: {:#}", e),
        }
    }

    fn reset_cached(&mut self, frequency: Frequency) {
        for record in self.records.values_mut() {
            record.reset(frequency);
        }
    }

    fn record_history(&self, now: NaiveDateTime) {
        let day = self.scores.daily_score(now);
        if let Err(e) = HistoryRepo::record_day(&self.conn, &self.user, &day) {
            log::warn!("Could not record score history: {:#}", e);
        }
    }

    fn push_on_change(&mut self, now: NaiveDateTime) {
        if self.config.sync.push_on_change && self.sync.is_enabled() {
            let _ = self.push(now);
        }
    }
}
