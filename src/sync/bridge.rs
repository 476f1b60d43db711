use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::repository::KvRepo;
use crate::db::StorageKey;
use crate::engine::{GoalStore, ScoreBoard, StreakEngine};
use crate::models::{GoalCategory, QadaLedger, StreakType};
use crate::sync::{RemoteRow, RemoteStore, SyncError};

#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    NeverAttempted,
    LocalOnly,
    Synced(NaiveDateTime),
    Failed { at: NaiveDateTime, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    CreatedRemote,
    PulledRemote,
}

/// Moves the local state of one user to and from the remote table. Local
/// storage stays authoritative: every failure is logged and left for the
/// next periodic attempt.
pub struct SyncBridge {
    remote: Option<Box<dyn RemoteStore>>,
    status: SyncStatus,
}

impl SyncBridge {
    pub fn new(remote: Option<Box<dyn RemoteStore>>) -> Self {
        let status = if remote.is_some() {
            SyncStatus::NeverAttempted
        } else {
            SyncStatus::LocalOnly
        };
        Self { remote, status }
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_some()
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Assemble the row for the current local state.
    pub fn snapshot(
        conn: &Connection,
        goals: &GoalStore,
        streaks: &StreakEngine,
        scores: &ScoreBoard,
        now: NaiveDateTime,
    ) -> RemoteRow {
        let user = goals.user();
        let score = |c| scores.section(c).map(|s| s.display);
        let qada = KvRepo::get_json::<QadaLedger>(conn, user, StorageKey::Qada)
            .unwrap_or_else(|e| {
                log::warn!("Could not read qada ledger: {:#}", e);
                None
            })
            .unwrap_or_default();

        RemoteRow {
            user_id: user.to_string(),
            prayer_goals: goals.load_goals(conn, GoalCategory::Prayer),
            dhikr_goals: goals.load_goals(conn, GoalCategory::Dhikr),
            quran_goals: goals.load_goals(conn, GoalCategory::Quran),
            fasting_goals: goals.load_goals(conn, GoalCategory::Fasting),
            prayer_score: score(GoalCategory::Prayer),
            dhikr_score: score(GoalCategory::Dhikr),
            quran_score: score(GoalCategory::Quran),
            fasting_score: score(GoalCategory::Fasting),
            iman_score: scores.overall(),
            general_streak: streaks.record(StreakType::General),
            prayer_streak: streaks.record(StreakType::Prayer),
            workout_streak: streaks.record(StreakType::Workout),
            quran_streak: streaks.record(StreakType::Quran),
            qada,
            last_daily_reset: goals.last_daily_reset(conn),
            last_weekly_reset: goals.last_weekly_reset(conn),
            updated_at: now,
        }
    }

    pub fn push_local_to_remote(
        &mut self,
        conn: &Connection,
        goals: &GoalStore,
        streaks: &StreakEngine,
        scores: &ScoreBoard,
        now: NaiveDateTime,
    ) -> Result<(), SyncError> {
        let Some(remote) = &self.remote else {
            return Err(SyncError::Disabled);
        };
        let row = Self::snapshot(conn, goals, streaks, scores, now);
        let result = remote.upsert(&row);
        self.note("push", now, result)
    }

    /// Overwrite local state with the remote row. Returns whether a row was
    /// found; a missing row leaves local state alone.
    pub fn pull_remote_to_local(
        &mut self,
        conn: &Connection,
        goals: &mut GoalStore,
        streaks: &mut StreakEngine,
        now: NaiveDateTime,
    ) -> Result<bool, SyncError> {
        let Some(remote) = &self.remote else {
            return Err(SyncError::Disabled);
        };
        let fetched = remote.fetch(goals.user());
        let row = match self.note("pull", now, fetched)? {
            Some(row) => row,
            None => return Ok(false),
        };
        Self::apply_row(conn, goals, streaks, row)?;
        log::info!("Pulled remote state for {}", goals.user());
        Ok(true)
    }

    /// Create the remote row on first sign-in, otherwise pull it. Safe to
    /// call repeatedly.
    pub fn initialize_for_new_user(
        &mut self,
        conn: &Connection,
        goals: &mut GoalStore,
        streaks: &mut StreakEngine,
        scores: &ScoreBoard,
        now: NaiveDateTime,
    ) -> Result<InitOutcome, SyncError> {
        let Some(remote) = &self.remote else {
            return Err(SyncError::Disabled);
        };
        let fetched = remote.fetch(goals.user());
        match self.note("init", now, fetched)? {
            Some(row) => {
                Self::apply_row(conn, goals, streaks, row)?;
                Ok(InitOutcome::PulledRemote)
            }
            None => {
                self.push_local_to_remote(conn, goals, streaks, scores, now)?;
                Ok(InitOutcome::CreatedRemote)
            }
        }
    }

    pub fn delete_remote(&mut self, goals: &GoalStore, now: NaiveDateTime) -> Result<(), SyncError> {
        let Some(remote) = &self.remote else {
            return Err(SyncError::Disabled);
        };
        let result = remote.delete(goals.user());
        self.note("delete", now, result)
    }

    fn apply_row(
        conn: &Connection,
        goals: &mut GoalStore,
        streaks: &mut StreakEngine,
        row: RemoteRow,
    ) -> Result<(), SyncError> {
        let user = goals.user().clone();
        for (category, record) in [
            (GoalCategory::Prayer, row.prayer_goals),
            (GoalCategory::Dhikr, row.dhikr_goals),
            (GoalCategory::Quran, row.quran_goals),
            (GoalCategory::Fasting, row.fasting_goals),
        ] {
            if record.category != category {
                log::warn!(
                    "Remote {} goals column holds {} goals; keeping local",
                    category,
                    record.category
                );
                continue;
            }
            goals.save_goals(conn, category, &record)?;
        }
        for (t, record) in [
            (StreakType::General, row.general_streak),
            (StreakType::Prayer, row.prayer_streak),
            (StreakType::Workout, row.workout_streak),
            (StreakType::Quran, row.quran_streak),
        ] {
            streaks.replace(conn, t, record)?;
        }
        KvRepo::put_json(conn, &user, StorageKey::Qada, &row.qada)?;
        if let Some(date) = row.last_daily_reset {
            KvRepo::put_json(conn, &user, StorageKey::DailyReset, &date)?;
        }
        if let Some(week) = row.last_weekly_reset {
            KvRepo::put_json(conn, &user, StorageKey::WeeklyReset, &week)?;
        }
        Ok(())
    }

    fn note<T>(
        &mut self,
        op: &str,
        now: NaiveDateTime,
        result: Result<T, SyncError>,
    ) -> Result<T, SyncError> {
        match &result {
            Ok(_) => {
                log::debug!("Sync {} ok", op);
                self.status = SyncStatus::Synced(now);
            }
            Err(e) => {
                log::warn!("Sync {} failed: {}", op, e);
                self.status = SyncStatus::Failed {
                    at: now,
                    message: e.to_string(),
                };
            }
        }
        result
    }
}
