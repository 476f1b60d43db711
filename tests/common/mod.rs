use chrono::{NaiveDate, NaiveDateTime};
use iman::config::AppConfig;
use iman::db::migrations::run_migrations;
use iman::models::UserId;
use iman::notify::{LogNotifier, RecordingNotifier};
use iman::sync::{MemoryRemote, RemoteStore};
use iman::Session;
use rusqlite::Connection;
use std::path::Path;
use std::str::FromStr;

/// Local wall-clock time on the given day.
#[allow(dead_code)]
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[allow(dead_code)]
pub fn user(id: &str) -> UserId {
    UserId::from_str(id).unwrap()
}

/// Fresh in-memory database with the schema applied.
#[allow(dead_code)]
pub fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
}

/// On-disk database, for tests that reopen it between sessions.
#[allow(dead_code)]
pub fn file_db(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    run_migrations(&conn).unwrap();
    conn
}

fn boxed(remote: Option<&MemoryRemote>) -> Option<Box<dyn RemoteStore>> {
    remote.map(|r| Box::new(r.clone()) as Box<dyn RemoteStore>)
}

#[allow(dead_code)]
pub fn sign_in(
    conn: Connection,
    remote: Option<&MemoryRemote>,
    id: &str,
    now: NaiveDateTime,
) -> (Session, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let session = Session::sign_in(
        conn,
        AppConfig::default(),
        user(id),
        boxed(remote),
        Box::new(notifier.clone()),
        now,
    )
    .unwrap();
    (session, notifier)
}

#[allow(dead_code)]
pub fn open(conn: Connection, remote: Option<&MemoryRemote>, now: NaiveDateTime) -> anyhow::Result<Session> {
    Session::open(
        conn,
        AppConfig::default(),
        boxed(remote),
        Box::new(LogNotifier),
        now,
    )
}
