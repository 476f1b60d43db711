mod common;

use chrono::Duration;
use common::{at, file_db, memory_db, open, sign_in};
use iman::config::ScheduleConfig;
use iman::models::{
    Frequency, GoalCategory, GoalError, Milestone, PrayerType, StreakOutcome, StreakState,
    StreakType,
};
use iman::schedule::{CancellationToken, Clock, ManualClock, Scheduler};

#[test]
fn marking_prayers_updates_scores_and_streaks() {
    let now = at(2026, 3, 2, 9, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", now);
    assert_eq!(session.scores().overall(), 0.0);

    session.mark_prayer(PrayerType::Fajr, true, now).unwrap();
    session.mark_prayer(PrayerType::Zuhr, true, now).unwrap();

    let prayer = session.scores().section(GoalCategory::Prayer).unwrap();
    assert_eq!(prayer.display, 40.0);
    // 40 * 40 / (40 + 25 + 25 + 10)
    assert_eq!(session.scores().overall(), 16.0);

    assert_eq!(session.streak(StreakType::General).current_streak, 1);
    assert_eq!(session.streak(StreakType::Prayer).current_streak, 0);

    for p in [PrayerType::Asr, PrayerType::Maghrib, PrayerType::Isha] {
        session.mark_prayer(p, true, now).unwrap();
    }
    assert_eq!(session.scores().section(GoalCategory::Prayer).unwrap().display, 100.0);
    assert_eq!(session.streak(StreakType::Prayer).current_streak, 1);
}

#[test]
fn open_requires_a_signed_in_user() {
    let err = open(memory_db(), None, at(2026, 3, 2, 9, 0)).err().unwrap();
    assert!(err.to_string().contains("Not signed in"));
}

#[test]
fn new_day_clears_daily_goals_but_keeps_streaks() {
    let day1 = at(2026, 3, 2, 9, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", day1);
    for p in PrayerType::all() {
        session.mark_prayer(p, true, day1).unwrap();
    }

    let day2 = at(2026, 3, 3, 0, 1);
    session.tick_recompute(day2);
    let prayers = session.goals(GoalCategory::Prayer);
    assert!(prayers.goals.iter().all(|g| !g.is_met()));
    assert_eq!(session.scores().section(GoalCategory::Prayer).unwrap().display, 0.0);
    let streak = session.streak(StreakType::Prayer);
    assert_eq!(streak.current_streak, 1);
    assert_eq!(streak.state(day2.date()), StreakState::Continuing);

    for p in PrayerType::all() {
        session.mark_prayer(p, true, day2).unwrap();
    }
    assert_eq!(session.streak(StreakType::Prayer).current_streak, 2);

    session.tick_recompute(at(2026, 3, 5, 8, 0));
    let streak = session.streak(StreakType::Prayer);
    assert_eq!(streak.current_streak, 0);
    assert_eq!(streak.longest_streak, 2);
}

#[test]
fn actions_on_a_new_day_roll_over_first() {
    let day1 = at(2026, 3, 2, 21, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", day1);
    for p in PrayerType::all() {
        session.mark_prayer(p, true, day1).unwrap();
    }

    // No tick in between: marking one prayer tomorrow must not count
    // yesterday's four others toward the prayer streak.
    let day2 = at(2026, 3, 3, 6, 0);
    session.mark_prayer(PrayerType::Fajr, true, day2).unwrap();
    assert_eq!(session.scores().section(GoalCategory::Prayer).unwrap().display, 20.0);
    assert_eq!(session.streak(StreakType::Prayer).current_streak, 1);
    assert_eq!(session.streak(StreakType::General).current_streak, 2);
}

#[test]
fn third_consecutive_day_announces_milestones() {
    let (mut session, notifier) = sign_in(memory_db(), None, "alice", at(2026, 3, 2, 9, 0));
    for day in 2..=4 {
        let now = at(2026, 3, day, 9, 0);
        for p in PrayerType::all() {
            session.mark_prayer(p, true, now).unwrap();
        }
    }
    assert_eq!(
        notifier.seen(),
        vec![
            Milestone {
                streak_type: StreakType::General,
                days: 3
            },
            Milestone {
                streak_type: StreakType::Prayer,
                days: 3
            },
        ]
    );
}

#[test]
fn tasbih_over_achievement_shows_but_is_capped_in_the_blend() {
    let now = at(2026, 3, 2, 9, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", now);
    let tasbih = session.dhikr("Tasbih", Some(150), now).unwrap();
    assert_eq!(tasbih.completed(), 150);

    let dhikr = session.scores().section(GoalCategory::Dhikr).unwrap();
    // Morning 0, Evening 0, Tasbih 150 (capped at 100)
    assert_eq!(dhikr.display, 50.0);
    assert!((dhikr.capped - 33.333).abs() < 0.01);
}

#[test]
fn checkbox_dhikr_toggles() {
    let now = at(2026, 3, 2, 9, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", now);
    assert!(session.dhikr("morning adhkar", None, now).unwrap().is_met());
    assert!(!session.dhikr("Morning Adhkar", None, now).unwrap().is_met());
}

#[test]
fn invalid_input_is_rejected_without_side_effects() {
    let now = at(2026, 3, 2, 9, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", now);

    let err = session.set_target(GoalCategory::Quran, "pages", 700, now).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GoalError>(),
        Some(GoalError::OutOfRange { max: 604, .. })
    ));
    let pages = session.goals(GoalCategory::Quran);
    assert_eq!(pages.goal("pages").unwrap().target(), 2);

    let err = session.dhikr("Morning Adhkar", Some(3), now).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GoalError>(),
        Some(GoalError::NotACounter(_))
    ));

    let err = session.dhikr("Salawat", None, now).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GoalError>(),
        Some(GoalError::UnknownGoal { .. })
    ));
    assert_eq!(session.streak(StreakType::General).current_streak, 0);
}

#[test]
fn custom_dhikr_can_be_added_once() {
    let now = at(2026, 3, 2, 9, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", now);
    session
        .add_dhikr_goal("Istighfar", true, 100, Frequency::Daily, now)
        .unwrap();
    let goal = session.dhikr("istighfar", Some(30), now).unwrap();
    assert_eq!((goal.completed(), goal.target()), (30, 100));

    let err = session
        .add_dhikr_goal("ISTIGHFAR", false, 1, Frequency::Daily, now)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GoalError>(),
        Some(GoalError::Duplicate(_))
    ));
}

#[test]
fn disabling_goals_removes_them_from_the_score() {
    let now = at(2026, 3, 2, 9, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", now);
    session.set_target(GoalCategory::Fasting, "days", 0, now).unwrap();
    assert!(session.scores().section(GoalCategory::Fasting).is_none());

    session.mark_prayer(PrayerType::Fajr, true, now).unwrap();
    // 20 * 40 / (40 + 25 + 25)
    assert!((session.scores().overall() - 8.888).abs() < 0.01);
}

#[test]
fn fasting_counts_once_per_day_and_resets_weekly() {
    let monday = at(2026, 3, 2, 19, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", monday);

    assert!(session.log_fast(monday).unwrap());
    assert!(!session.log_fast(monday + Duration::hours(2)).unwrap());
    assert_eq!(
        session.goals(GoalCategory::Fasting).goal("days").unwrap().completed(),
        1
    );

    let thursday = at(2026, 3, 5, 19, 0);
    assert!(session.log_fast(thursday).unwrap());
    assert_eq!(session.scores().section(GoalCategory::Fasting).unwrap().display, 100.0);

    session.tick_recompute(at(2026, 3, 9, 7, 0));
    assert_eq!(
        session.goals(GoalCategory::Fasting).goal("days").unwrap().completed(),
        0
    );
}

#[test]
fn last_weeks_fast_does_not_extend_the_general_streak() {
    let monday = at(2026, 3, 2, 19, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", monday);
    session.log_fast(monday).unwrap();
    assert_eq!(session.streak(StreakType::General).current_streak, 1);

    let tuesday = at(2026, 3, 3, 6, 0);
    session.mark_prayer_missed(PrayerType::Fajr, tuesday).unwrap();
    session
        .set_target(GoalCategory::Quran, "pages", 3, tuesday)
        .unwrap();

    let general = session.streak(StreakType::General);
    assert_eq!(general.current_streak, 1);
    assert_eq!(general.total_days_active, 1);
    assert_eq!(general.last_active_date, Some(monday.date()));

    // A second fast on Tuesday is new progress
    assert!(session.log_fast(tuesday).unwrap());
    assert_eq!(session.streak(StreakType::General).current_streak, 2);
}

#[test]
fn workouts_feed_workout_and_general_streaks() {
    let now = at(2026, 3, 2, 18, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", now);
    assert_eq!(session.log_workout(now).unwrap(), StreakOutcome::Started);
    assert_eq!(
        session.log_workout(now + Duration::hours(1)).unwrap(),
        StreakOutcome::AlreadyCounted
    );
    assert_eq!(
        session.log_workout(now + Duration::days(1)).unwrap(),
        StreakOutcome::Extended
    );
    assert_eq!(session.streak(StreakType::Workout).current_streak, 2);
    assert_eq!(session.streak(StreakType::General).current_streak, 2);
    assert_eq!(session.streak(StreakType::Prayer).current_streak, 0);
}

#[test]
fn missed_prayers_go_to_qada() {
    let now = at(2026, 3, 2, 22, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", now);
    session.mark_prayer(PrayerType::Asr, true, now).unwrap();
    session.mark_prayer_missed(PrayerType::Asr, now).unwrap();
    session.qada_add(PrayerType::Fajr, 2, now).unwrap();

    let prayers = session.goals(GoalCategory::Prayer);
    assert!(!prayers.goal("asr").unwrap().is_met());
    assert_eq!(session.qada().total(), 3);

    assert_eq!(session.qada_complete(None, now).unwrap(), Some(PrayerType::Fajr));
    assert_eq!(
        session.qada_complete(Some(PrayerType::Asr), now).unwrap(),
        Some(PrayerType::Asr)
    );
    assert_eq!(session.qada_complete(Some(PrayerType::Isha), now).unwrap(), None);
    assert_eq!(session.qada().count(PrayerType::Fajr), 1);
}

#[test]
fn streak_reset_keeps_lifetime_days() {
    let now = at(2026, 3, 2, 9, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", now);
    session.log_workout(now).unwrap();
    session.reset_streak(StreakType::Workout, now).unwrap();
    let record = session.streak(StreakType::Workout);
    assert_eq!((record.current_streak, record.longest_streak), (0, 0));
    assert_eq!(record.total_days_active, 1);
}

#[test]
fn history_keeps_one_row_per_day() {
    let day1 = at(2026, 3, 2, 9, 0);
    let (mut session, _) = sign_in(memory_db(), None, "alice", day1);
    session.mark_prayer(PrayerType::Fajr, true, day1).unwrap();

    let day2 = at(2026, 3, 3, 9, 0);
    session.mark_prayer(PrayerType::Fajr, true, day2).unwrap();
    session.mark_prayer(PrayerType::Zuhr, true, day2).unwrap();

    let history = session.history(7, day2).unwrap();
    let days: Vec<(&str, f64)> = history.iter().map(|d| (d.date.as_str(), d.overall)).collect();
    assert_eq!(days, vec![("2026-03-02", 8.0), ("2026-03-03", 16.0)]);
}

#[test]
fn users_on_one_device_do_not_see_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iman.db");
    let now = at(2026, 3, 2, 9, 0);

    let (mut alice, _) = sign_in(file_db(&path), None, "alice", now);
    alice.mark_prayer(PrayerType::Fajr, true, now).unwrap();
    alice.sign_out(now).unwrap();

    let (bob, _) = sign_in(file_db(&path), None, "bob", now);
    assert!(!bob.goals(GoalCategory::Prayer).goal("fajr").unwrap().is_met());
    assert_eq!(bob.streak(StreakType::General).current_streak, 0);
    bob.sign_out(now).unwrap();

    let (alice, _) = sign_in(file_db(&path), None, "alice", now);
    assert!(alice.goals(GoalCategory::Prayer).goal("fajr").unwrap().is_met());
}

#[test]
fn state_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iman.db");
    let now = at(2026, 3, 2, 9, 0);

    let (mut session, _) = sign_in(file_db(&path), None, "alice", now);
    session.log_quran("pages", 1, now).unwrap();
    drop(session);

    let session = open(file_db(&path), None, now + Duration::hours(3)).unwrap();
    assert_eq!(session.user().as_str(), "alice");
    assert_eq!(session.scores().section(GoalCategory::Quran).unwrap().display, 50.0);
    assert_eq!(session.streak(StreakType::Quran).current_streak, 1);
}

#[test]
fn delete_account_removes_local_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iman.db");
    let now = at(2026, 3, 2, 9, 0);

    let (mut session, _) = sign_in(file_db(&path), None, "alice", now);
    session.mark_prayer(PrayerType::Fajr, true, now).unwrap();
    assert!(session.delete_account(now).unwrap() > 0);

    assert!(open(file_db(&path), None, now).is_err());
    let (session, _) = sign_in(file_db(&path), None, "alice", now);
    assert!(!session.goals(GoalCategory::Prayer).goal("fajr").unwrap().is_met());
    assert!(session.history(7, now).unwrap().iter().all(|d| d.overall == 0.0));
}

#[test]
fn scheduled_recompute_rolls_over_at_midnight() {
    let start = at(2026, 3, 2, 23, 59);
    let (mut session, _) = sign_in(memory_db(), None, "alice", start);
    session.mark_prayer(PrayerType::Isha, true, start).unwrap();

    let clock = ManualClock::new(start);
    let token = CancellationToken::default();
    let mut scheduler = Scheduler::from_config(&ScheduleConfig::default(), clock.now(), false);
    let mut ticks = 0;
    scheduler.run_until_cancelled(
        &clock,
        &token,
        |d| clock.advance(Duration::from_std(d).unwrap()),
        |_, now| {
            session.tick_recompute(now);
            ticks += 1;
            if now >= at(2026, 3, 3, 0, 0) {
                token.cancel();
            }
        },
    );

    assert_eq!(ticks, 3);
    assert!(!session.goals(GoalCategory::Prayer).goal("isha").unwrap().is_met());
    assert_eq!(session.streak(StreakType::General).current_streak, 1);
}
