use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::config::GoalsConfig;
use crate::db::repository::KvRepo;
use crate::db::StorageKey;
use crate::models::{
    Frequency, Goal, GoalCategory, GoalRecord, PrayerType, UserId, GOAL_RECORD_VERSION,
};
use crate::utils::dates::iso_week_key;

/// Reads and writes the per-category goal records of one user.
pub struct GoalStore {
    user: UserId,
    defaults: GoalsConfig,
    stale: BTreeSet<GoalCategory>,
}

impl GoalStore {
    pub fn new(user: UserId, defaults: GoalsConfig) -> Self {
        Self {
            user,
            defaults,
            stale: BTreeSet::new(),
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Goals a user starts with before touching anything.
    pub fn default_record(&self, category: GoalCategory) -> GoalRecord {
        let goals = match category {
            GoalCategory::Prayer => PrayerType::all()
                .into_iter()
                .map(|p| Goal::flag(p.as_str()))
                .collect(),
            GoalCategory::Dhikr => {
                let mut goals = vec![
                    Goal::flag("Morning Adhkar"),
                    Goal::flag("Evening Adhkar"),
                    Goal::counter("Tasbih", self.defaults.tasbih_target, Frequency::Daily)
                        .allowing_over(),
                ];
                for custom in &self.defaults.custom_dhikr {
                    let frequency =
                        Frequency::from_str(&custom.frequency).unwrap_or(Frequency::Daily);
                    let goal = match custom.dhikr_type.as_str() {
                        "counter" => {
                            Goal::counter(custom.name.as_str(), custom.target, frequency)
                                .allowing_over()
                        }
                        _ => Goal::flag(custom.name.as_str()).with_frequency(frequency),
                    };
                    if goals.iter().any(|g| g.name.eq_ignore_ascii_case(&goal.name)) {
                        log::warn!("Ignoring duplicate custom dhikr '{}'", goal.name);
                        continue;
                    }
                    goals.push(goal);
                }
                goals
            }
            GoalCategory::Quran => vec![
                Goal::counter("pages", self.defaults.quran_pages, Frequency::Daily),
                Goal::counter("verses", self.defaults.quran_verses, Frequency::Daily),
            ],
            GoalCategory::Fasting => vec![Goal::counter(
                "days",
                self.defaults.fasting_days_per_week,
                Frequency::Weekly,
            )],
        };
        GoalRecord::new(category, goals)
    }

    /// Never fails: a missing, unreadable or too-new record yields defaults.
    pub fn load_goals(&self, conn: &Connection, category: GoalCategory) -> GoalRecord {
        match KvRepo::get_json::<GoalRecord>(conn, &self.user, StorageKey::Goals(category)) {
            Ok(Some(record)) if record.version > GOAL_RECORD_VERSION => {
                log::warn!(
                    "{} goals were written by a newer version ({}); using defaults",
                    category,
                    record.version
                );
                self.default_record(category)
            }
            Ok(Some(record)) if record.category != category => {
                log::warn!("Stored {} goals have the wrong category; using defaults", category);
                self.default_record(category)
            }
            Ok(Some(record)) => record,
            Ok(None) => self.default_record(category),
            Err(e) => {
                log::warn!("Could not load {} goals: {:#}", category, e);
                self.default_record(category)
            }
        }
    }

    pub fn load_all(&self, conn: &Connection) -> BTreeMap<GoalCategory, GoalRecord> {
        GoalCategory::all()
            .into_iter()
            .map(|c| (c, self.load_goals(conn, c)))
            .collect()
    }

    /// Overwrite the stored record and mark its score stale.
    pub fn save_goals(
        &mut self,
        conn: &Connection,
        category: GoalCategory,
        record: &GoalRecord,
    ) -> Result<()> {
        self.stale.insert(category);
        KvRepo::put_json(conn, &self.user, StorageKey::Goals(category), record)
    }

    pub fn take_stale(&mut self) -> BTreeSet<GoalCategory> {
        std::mem::take(&mut self.stale)
    }

    pub fn last_daily_reset(&self, conn: &Connection) -> Option<NaiveDate> {
        KvRepo::get_json(conn, &self.user, StorageKey::DailyReset)
            .unwrap_or_else(|e| {
                log::warn!("Could not read daily reset marker: {:#}", e);
                None
            })
    }

    pub fn last_weekly_reset(&self, conn: &Connection) -> Option<String> {
        KvRepo::get_json(conn, &self.user, StorageKey::WeeklyReset)
            .unwrap_or_else(|e| {
                log::warn!("Could not read weekly reset marker: {:#}", e);
                None
            })
    }

    /// Zero daily completion once per local calendar day. Returns whether a
    /// reset happened.
    pub fn apply_daily_reset(&mut self, conn: &Connection, now: NaiveDateTime) -> Result<bool> {
        let today = now.date();
        let last = self.last_daily_reset(conn);
        match last {
            Some(last) if last >= today => return Ok(false),
            None => {
                KvRepo::put_json(conn, &self.user, StorageKey::DailyReset, &today)?;
                return Ok(false);
            }
            Some(_) => {}
        }
        self.reset_all(conn, Frequency::Daily)?;
        KvRepo::put_json(conn, &self.user, StorageKey::DailyReset, &today)?;
        log::info!("Daily reset for {} ({})", self.user, today);
        Ok(true)
    }

    /// Zero weekly completion once per ISO week.
    pub fn apply_weekly_reset(&mut self, conn: &Connection, now: NaiveDateTime) -> Result<bool> {
        let week = iso_week_key(now.date());
        match self.last_weekly_reset(conn) {
            // Week keys sort chronologically
            Some(last) if last >= week => return Ok(false),
            None => {
                KvRepo::put_json(conn, &self.user, StorageKey::WeeklyReset, &week)?;
                return Ok(false);
            }
            Some(_) => {}
        }
        self.reset_all(conn, Frequency::Weekly)?;
        KvRepo::put_json(conn, &self.user, StorageKey::WeeklyReset, &week)?;
        log::info!("Weekly reset for {} ({})", self.user, week);
        Ok(true)
    }

    fn reset_all(&mut self, conn: &Connection, frequency: Frequency) -> Result<()> {
        for category in GoalCategory::all() {
            let mut record = self.load_goals(conn, category);
            if record.reset(frequency) {
                self.save_goals(conn, category, &record)?;
            }
        }
        Ok(())
    }
}
