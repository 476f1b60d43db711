mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers::{self, ConsoleNotifier};
use iman::config::AppConfig;
use iman::db::migrations::run_migrations;
use iman::schedule::{Clock, SystemClock};
use iman::sync::remote_from_config;
use iman::Session;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;
    if !AppConfig::config_path()?.exists() {
        // First run: leave an editable config.toml with every default spelled out
        if let Err(e) = config.save() {
            log::warn!("Could not write default config: {:#}", e);
        }
    }

    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    run_migrations(&conn)?;

    let remote = remote_from_config(&config.sync);
    let now = SystemClock.now();

    if let Commands::Login { user } = &cli.command {
        return handlers::handle_login(conn, config, user, remote, now);
    }

    let mut session = Session::open(conn, config, remote, Box::new(ConsoleNotifier), now)?;
    match cli.command {
        Commands::Login { .. } => unreachable!(),
        Commands::Logout => handlers::handle_logout(session, now)?,
        Commands::DeleteAccount { yes } => handlers::handle_delete_account(session, yes, now)?,
        Commands::Status { week } => handlers::handle_status(&session, week, now)?,
        Commands::Prayer {
            prayer,
            missed,
            undo,
        } => handlers::handle_prayer(&mut session, &prayer, missed, undo, now)?,
        Commands::Dhikr { action } => handlers::handle_dhikr(&mut session, &action, now)?,
        Commands::Quran { amount, verses } => {
            handlers::handle_quran(&mut session, amount, verses, now)?
        }
        Commands::Fast => handlers::handle_fast(&mut session, now)?,
        Commands::Workout => handlers::handle_workout(&mut session, now)?,
        Commands::Goals { action } => handlers::handle_goals(&mut session, &action, now)?,
        Commands::Qada { action } => handlers::handle_qada(&mut session, &action, now)?,
        Commands::Streak { action } => handlers::handle_streak(&mut session, &action, now)?,
        Commands::Sync { action } => handlers::handle_sync(&mut session, &action, now)?,
        Commands::Watch { ticks } => handlers::handle_watch(&mut session, ticks)?,
    }

    Ok(())
}
