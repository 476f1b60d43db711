use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::StorageKey;
use crate::models::{DailyScore, UserId};

// ─── Per-user JSON blobs ────────────────────────────────────────────────────

pub struct KvRepo;

impl KvRepo {
    pub fn get_raw(conn: &Connection, user: &UserId, key: StorageKey) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key.for_user(user)],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn get_json<T: DeserializeOwned>(
        conn: &Connection,
        user: &UserId,
        key: StorageKey,
    ) -> Result<Option<T>> {
        match Self::get_raw(conn, user, key)? {
            None => Ok(None),
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Decoding {}", key.for_user(user)))?;
                Ok(Some(value))
            }
        }
    }

    pub fn put_json<T: Serialize>(
        conn: &Connection,
        user: &UserId,
        key: StorageKey,
        value: &T,
    ) -> Result<()> {
        let raw = serde_json::to_string(value).context("Encoding value")?;
        conn.execute(
            "INSERT INTO kv_store (key, user_id, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![key.for_user(user), user.as_str(), raw],
        )?;
        Ok(())
    }

    /// Remove every key owned by `user`. Returns the number of keys deleted.
    pub fn delete_user(conn: &Connection, user: &UserId) -> Result<usize> {
        let n = conn.execute(
            "DELETE FROM kv_store WHERE user_id = ?1",
            params![user.as_str()],
        )?;
        Ok(n)
    }
}

// ─── Score history ───────────────────────────────────────────────────────────

pub struct HistoryRepo;

impl HistoryRepo {
    pub fn record_day(conn: &Connection, user: &UserId, day: &DailyScore) -> Result<()> {
        conn.execute(
            "INSERT INTO score_history (user_id, date, overall, prayer, dhikr, quran, fasting)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id, date) DO UPDATE SET
                overall = ?3, prayer = ?4, dhikr = ?5, quran = ?6, fasting = ?7",
            params![
                user.as_str(),
                day.date,
                day.overall,
                day.prayer,
                day.dhikr,
                day.quran,
                day.fasting
            ],
        )?;
        Ok(())
    }

    pub fn get_range(
        conn: &Connection,
        user: &UserId,
        start: &str,
        end: &str,
    ) -> Result<Vec<DailyScore>> {
        let mut stmt = conn.prepare(
            "SELECT date, overall, prayer, dhikr, quran, fasting
             FROM score_history
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;

        let rows = stmt.query_map(params![user.as_str(), start, end], |row| {
            Ok(DailyScore {
                date: row.get(0)?,
                overall: row.get(1)?,
                prayer: row.get(2)?,
                dhikr: row.get(3)?,
                quran: row.get(4)?,
                fasting: row.get(5)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn delete_user(conn: &Connection, user: &UserId) -> Result<()> {
        conn.execute(
            "DELETE FROM score_history WHERE user_id = ?1",
            params![user.as_str()],
        )?;
        Ok(())
    }
}

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, key: &str) -> Result<()> {
        conn.execute("DELETE FROM app_meta WHERE key = ?1", params![key])?;
        Ok(())
    }
}
