use anyhow::{anyhow, bail, Result};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use iman::config::AppConfig;
use iman::models::{
    Frequency, Goal, GoalCategory, GoalKind, GoalRecord, Milestone, PrayerType, StreakState, StreakType,
    UserId,
};
use iman::notify::Notifier;
use iman::schedule::{CancellationToken, Clock, Scheduler, SystemClock, TaskKind};
use iman::sync::{RemoteStore, SyncStatus};
use iman::utils::format::{format_duration_secs, format_score, pad_display, score_bar};
use iman::Session;

use crate::cli::args::{DhikrCommands, GoalCommands, QadaCommands, StreakCommands, SyncCommands};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

/// Prints milestones as they are reached.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn announce(&self, milestone: &Milestone) {
        println_colored!(
            GOLD,
            "  ★ {} streak: {} days!",
            milestone.streak_type.display_name(),
            milestone.days
        );
    }
}

// ─── Account ─────────────────────────────────────────────────────────────────

pub fn handle_login(
    conn: Connection,
    config: AppConfig,
    user: &str,
    remote: Option<Box<dyn RemoteStore>>,
    now: NaiveDateTime,
) -> Result<()> {
    let user = UserId::from_str(user)?;
    if let Some(current) = Session::current_user(&conn)? {
        if current != user {
            bail!("Signed in as {}. Run `iman logout` first.", current);
        }
    }
    let session = Session::sign_in(conn, config, user, remote, Box::new(ConsoleNotifier), now)?;
    println_colored!(GREEN, "  ✓ Signed in as {}", session.user());
    print_sync_line(&session, now);
    Ok(())
}

pub fn handle_logout(session: Session, now: NaiveDateTime) -> Result<()> {
    let user = session.user().clone();
    session.sign_out(now)?;
    println_colored!(GREEN, "  ✓ Signed out {}", user);
    Ok(())
}

pub fn handle_delete_account(session: Session, yes: bool, now: NaiveDateTime) -> Result<()> {
    let user = session.user().clone();
    if !yes {
        let answer = prompt(&format!(
            "  Delete all data for {}? This cannot be undone. [y/N] ",
            user
        ))?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println_colored!(DIM, "  Cancelled");
            return Ok(());
        }
    }
    let removed = session.delete_account(now)?;
    println_colored!(RED, "  ✗ Deleted {} ({} local records)", user, removed);
    Ok(())
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn handle_status(session: &Session, week: bool, now: NaiveDateTime) -> Result<()> {
    let scores = session.scores();

    println!();
    println_colored!(GOLD, "  Iman Score — {}", session.user());
    if let Some(at) = scores.computed_at() {
        println_colored!(DIM, "  as of {}", at.format("%Y-%m-%d %H:%M"));
    }
    println!();
    println_colored!(
        BOLD,
        "  {}  {}",
        score_bar(scores.overall(), 20),
        format_score(scores.overall())
    );
    println!();

    for category in GoalCategory::all() {
        let label = pad_display(category.display_name(), 10);
        match scores.section(category) {
            Some(s) => println!(
                "  {}  {}  {}",
                label,
                score_bar(s.display, 10),
                format_score(s.display)
            ),
            None => println_colored!(DIM, "  {}  no active goals", label),
        }
    }

    println!();
    print_streaks(session, now);

    let owed = session.qada().total();
    if owed == 0 {
        println_colored!(GREEN, "  Qada:     0 owed ✓");
    } else {
        println_colored!(AMBER, "  Qada:     {} owed", owed);
    }
    print_sync_line(session, now);

    if week {
        println!();
        println_colored!(DIM, "  Last 7 days");
        for day in session.history(7, now)? {
            println!(
                "  {}  {}  {}",
                day.date,
                score_bar(day.overall, 10),
                format_score(day.overall)
            );
        }
    }
    println!();
    Ok(())
}

// ─── Prayer ──────────────────────────────────────────────────────────────────

pub fn handle_prayer(
    session: &mut Session,
    prayer: &str,
    missed: bool,
    undo: bool,
    now: NaiveDateTime,
) -> Result<()> {
    let prayer = PrayerType::from_str(prayer)
        .map_err(|_| anyhow!("Unknown prayer '{}'. Use: fajr, zuhr, asr, maghrib, isha", prayer))?;

    if missed {
        session.mark_prayer_missed(prayer, now)?;
        println_colored!(RED, "  ✗ {} marked as missed, 1 qada owed", prayer);
    } else if undo {
        session.mark_prayer(prayer, false, now)?;
        println_colored!(DIM, "  ○ {} unmarked", prayer);
    } else {
        session.mark_prayer(prayer, true, now)?;
        println_colored!(GREEN, "  ✓ {} marked as done", prayer);
    }
    print_section_score(session, GoalCategory::Prayer);
    Ok(())
}

// ─── Dhikr ───────────────────────────────────────────────────────────────────

pub fn handle_dhikr(session: &mut Session, action: &DhikrCommands, now: NaiveDateTime) -> Result<()> {
    match action {
        DhikrCommands::Morning => mark_dhikr(session, "Morning Adhkar", None, now)?,
        DhikrCommands::Evening => mark_dhikr(session, "Evening Adhkar", None, now)?,
        DhikrCommands::Mark { name, count } => mark_dhikr(session, name, *count, now)?,
        DhikrCommands::Add {
            name,
            r#type,
            target,
            freq,
        } => {
            let counter = match r#type.as_str() {
                "counter" => true,
                "checkbox" => false,
                other => bail!("Unknown dhikr type '{}'. Use: checkbox, counter", other),
            };
            let frequency = Frequency::from_str(freq)?;
            session.add_dhikr_goal(name, counter, *target, frequency, now)?;
            println_colored!(GREEN, "  ✓ Added dhikr: {}", name);
        }
        DhikrCommands::List => {
            println!();
            println_colored!(GOLD, "  Adhkar");
            println!();
            print_goals(&session.goals(GoalCategory::Dhikr));
            println!();
        }
    }
    Ok(())
}

fn mark_dhikr(session: &mut Session, name: &str, count: Option<u32>, now: NaiveDateTime) -> Result<()> {
    let goal = session.dhikr(name, count, now)?;
    if matches!(goal.kind, GoalKind::Counter { .. }) {
        if goal.is_met() {
            println_colored!(
                GREEN,
                "  ✓ {} — {}/{} (complete!)",
                goal.name,
                goal.completed(),
                goal.target()
            );
        } else {
            println_colored!(AMBER, "  ◑ {} — {}/{}", goal.name, goal.completed(), goal.target());
        }
    } else if goal.is_met() {
        println_colored!(GREEN, "  ✓ {} — done", goal.name);
    } else {
        println_colored!(DIM, "  ○ {} — unmarked", goal.name);
    }
    print_section_score(session, GoalCategory::Dhikr);
    Ok(())
}

// ─── Quran / fasting / workout ───────────────────────────────────────────────

pub fn handle_quran(session: &mut Session, amount: u32, verses: bool, now: NaiveDateTime) -> Result<()> {
    let unit = if verses { "verses" } else { "pages" };
    let goal = session.log_quran(unit, amount, now)?;
    println_colored!(
        GREEN,
        "  ✓ Logged {} {} — today: {}/{}",
        amount,
        unit,
        goal.completed(),
        goal.target()
    );
    print_section_score(session, GoalCategory::Quran);
    Ok(())
}

pub fn handle_fast(session: &mut Session, now: NaiveDateTime) -> Result<()> {
    if session.log_fast(now)? {
        println_colored!(GREEN, "  ✓ Fast logged for today");
    } else {
        println_colored!(DIM, "  Today's fast is already logged");
    }
    print_section_score(session, GoalCategory::Fasting);
    Ok(())
}

pub fn handle_workout(session: &mut Session, now: NaiveDateTime) -> Result<()> {
    session.log_workout(now)?;
    let streak = session.streak(StreakType::Workout);
    println_colored!(
        GREEN,
        "  ✓ Workout logged — {} day streak",
        streak.current_streak
    );
    Ok(())
}

// ─── Goals ───────────────────────────────────────────────────────────────────

pub fn handle_goals(session: &mut Session, action: &GoalCommands, now: NaiveDateTime) -> Result<()> {
    match action {
        GoalCommands::List { category } => {
            let categories = match category {
                Some(c) => vec![GoalCategory::from_str(c)?],
                None => GoalCategory::all().to_vec(),
            };
            println!();
            for category in categories {
                println_colored!(GOLD, "  {}", category.display_name());
                print_goals(&session.goals(category));
                println!();
            }
        }
        GoalCommands::Set {
            category,
            name,
            target,
        } => {
            let category = GoalCategory::from_str(category)?;
            let goal = session.set_target(category, name, *target, now)?;
            if goal.is_active() {
                println_colored!(GREEN, "  ✓ {} target set to {}", goal.name, goal.target());
            } else {
                println_colored!(DIM, "  ○ {} disabled", goal.name);
            }
            print_section_score(session, category);
        }
    }
    Ok(())
}

// ─── Qada ────────────────────────────────────────────────────────────────────

pub fn handle_qada(session: &mut Session, action: &QadaCommands, now: NaiveDateTime) -> Result<()> {
    match action {
        QadaCommands::List => {
            let ledger = session.qada();
            println!();
            if ledger.total() == 0 {
                println_colored!(GREEN, "  ✓ No qada prayers outstanding");
            } else {
                println_colored!(AMBER, "  Qada owed ({} prayers)", ledger.total());
                println!();
                for prayer in PrayerType::all() {
                    let count = ledger.count(prayer);
                    if count > 0 {
                        println!("  {}  {}", pad_display(prayer.display_name(), 10), count);
                    }
                }
                println!();
                println_colored!(DIM, "  At 1 per day: ~{} days to clear", ledger.total());
            }
            println!();
        }
        QadaCommands::Complete { prayer } => {
            let prayer = prayer.as_deref().map(PrayerType::from_str).transpose()?;
            match session.qada_complete(prayer, now)? {
                Some(p) => println_colored!(GREEN, "  ✓ {} qada completed", p),
                None => println_colored!(GREEN, "  ✓ Nothing owed"),
            }
        }
        QadaCommands::Add { prayer, count } => {
            let prayer = PrayerType::from_str(prayer)
                .map_err(|_| anyhow!("Unknown prayer '{}'", prayer))?;
            session.qada_add(prayer, *count, now)?;
            println_colored!(AMBER, "  Added {} × {} to qada", count, prayer);
        }
    }
    Ok(())
}

// ─── Streaks ─────────────────────────────────────────────────────────────────

pub fn handle_streak(session: &mut Session, action: &StreakCommands, now: NaiveDateTime) -> Result<()> {
    match action {
        StreakCommands::Show => {
            println!();
            print_streaks(session, now);
            println!();
        }
        StreakCommands::Reset { streak } => {
            let streak_type = StreakType::from_str(streak)?;
            session.reset_streak(streak_type, now)?;
            println_colored!(AMBER, "  {} streak reset", streak_type.display_name());
        }
    }
    Ok(())
}

// ─── Sync ────────────────────────────────────────────────────────────────────

pub fn handle_sync(session: &mut Session, action: &SyncCommands, now: NaiveDateTime) -> Result<()> {
    match action {
        SyncCommands::Push => {
            session.push(now)?;
            println_colored!(GREEN, "  ✓ Pushed local state");
        }
        SyncCommands::Pull => {
            if session.pull(now)? {
                println_colored!(GREEN, "  ✓ Local state replaced with remote row");
            } else {
                println_colored!(DIM, "  No remote row yet; local state kept");
            }
        }
        SyncCommands::Status => print_sync_line(session, now),
    }
    Ok(())
}

// ─── Watch ───────────────────────────────────────────────────────────────────

pub fn handle_watch(session: &mut Session, ticks: Option<u32>) -> Result<()> {
    let clock = SystemClock;
    let token = CancellationToken::default();
    let mut scheduler = Scheduler::from_config(
        &session.config().schedule,
        clock.now(),
        session.sync_enabled(),
    );
    let mut recomputes = 0u32;

    println_colored!(DIM, "  Watching {} (Ctrl-C to stop)", session.user());
    scheduler.run_until_cancelled(&clock, &token, std::thread::sleep, |kind, now| match kind {
        TaskKind::Recompute => {
            session.tick_recompute(now);
            println!(
                "  {}  {}  {}",
                now.format("%H:%M:%S"),
                score_bar(session.scores().overall(), 20),
                format_score(session.scores().overall())
            );
            recomputes += 1;
            if ticks.is_some_and(|limit| recomputes >= limit) {
                token.cancel();
            }
        }
        TaskKind::Sync => session.tick_sync(now),
    });
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn print_goals(record: &GoalRecord) {
    for goal in &record.goals {
        println!("  {}  {}", pad_display(&goal.name, 24), goal_status(goal));
    }
}

fn goal_status(goal: &Goal) -> String {
    if !goal.is_active() {
        return format!("{}disabled\x1b[0m", DIM);
    }
    let checkbox = matches!(goal.kind, GoalKind::Flag { .. });
    match (goal.is_met(), checkbox) {
        (true, true) => format!("{}✓\x1b[0m", GREEN),
        (false, true) => "○".to_string(),
        (true, false) => format!("{}{}/{} ✓\x1b[0m", GREEN, goal.completed(), goal.target()),
        (false, false) => format!("{}/{}", goal.completed(), goal.target()),
    }
}

fn print_section_score(session: &Session, category: GoalCategory) {
    let scores = session.scores();
    let section = scores
        .section(category)
        .map(|s| format_score(s.display))
        .unwrap_or_else(|| "—".to_string());
    println_colored!(
        DIM,
        "  {} {}  ·  Iman {}",
        category.display_name(),
        section,
        format_score(scores.overall())
    );
}

fn print_streaks(session: &Session, now: NaiveDateTime) {
    let today = now.date();
    for streak_type in StreakType::all() {
        let record = session.streak(streak_type);
        let label = pad_display(streak_type.display_name(), 8);
        let line = format!(
            "  {}  {} days current  |  {} best",
            label, record.current_streak, record.longest_streak
        );
        match record.state(today) {
            StreakState::ActiveToday => println_colored!(GREEN, "{}", line),
            StreakState::Continuing => println_colored!(AMBER, "{}  (log today to keep it)", line),
            StreakState::NoActivityYet | StreakState::StreakBroken => {
                println_colored!(DIM, "{}", line)
            }
        }
    }
}

fn print_sync_line(session: &Session, now: NaiveDateTime) {
    match session.sync_status() {
        SyncStatus::LocalOnly => println_colored!(DIM, "  Sync:     local only"),
        SyncStatus::NeverAttempted => println_colored!(DIM, "  Sync:     not yet attempted"),
        SyncStatus::Synced(at) => {
            let ago = (now - *at).num_seconds();
            if ago < 60 {
                println_colored!(GREEN, "  Sync:     ok (just now)");
            } else {
                println_colored!(GREEN, "  Sync:     ok ({} ago)", format_duration_secs(ago));
            }
        }
        SyncStatus::Failed { message, .. } => {
            println_colored!(RED, "  Sync:     failed: {}", message)
        }
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().lock().read_line(&mut buf)?;
    Ok(buf.trim_end_matches('\n').trim_end_matches('\r').to_string())
}
