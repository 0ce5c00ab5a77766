//! Multi-day jump equivalence: advancing the clock straight to a target date
//! must leave exactly the state that stepping through every day leaves.

use cadence_core::Engine;
use cadence_core::config::EngineConfig;
use cadence_core::model::milestone::MilestoneDraft;
use cadence_core::model::ticket::{Priority, TicketDraft, TicketType};
use cadence_core::model::user::{ExpertiseArea, Role, Seniority, User};
use chrono::{Days, NaiveDate};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, d).expect("valid date")
}

fn seeded_engine(due_offsets: &[u64]) -> Engine {
    let mut dana = User::new("dana", "dana@example.com", Role::Developer);
    dana.expertise_area = Some(ExpertiseArea::Fullstack);
    dana.seniority = Some(Seniority::Senior);

    let mut engine = Engine::new(
        EngineConfig::default(),
        vec![
            User::new("mira", "mira@example.com", Role::Manager),
            User::new("alice", "alice@example.com", Role::Reporter),
            dana,
        ],
    );
    engine.stamp(day(1));

    for (index, offset) in due_offsets.iter().enumerate() {
        let id = engine
            .report_ticket(
                "alice",
                TicketDraft {
                    kind: TicketType::Bug,
                    title: format!("bug {index}"),
                    priority: Priority::Low,
                    expertise_area: ExpertiseArea::Backend,
                    description: "replay fodder".into(),
                    reported_by: Some("alice".into()),
                },
            )
            .expect("report accepted");
        engine
            .create_milestone(
                "mira",
                MilestoneDraft {
                    name: format!("m{index}"),
                    due_date: day(1).checked_add_days(Days::new(*offset)).expect("in range"),
                    blocking_for: if index == 0 { Vec::new() } else { vec![format!("m{}", index - 1)] },
                    ticket_ids: vec![id],
                    assigned_devs: vec!["dana".into()],
                },
            )
            .expect("milestone accepted");
    }
    engine
}

fn assert_same_state(jumped: &Engine, stepped: &Engine) {
    assert_eq!(jumped.current_date(), stepped.current_date());
    assert_eq!(jumped.milestones(), stepped.milestones());
    assert_eq!(jumped.tickets(), stepped.tickets());
    assert_eq!(jumped.users(), stepped.users());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn jumping_a_week_equals_stepping_through_it() {
    let mut jumped = seeded_engine(&[9, 5, 14]);
    let mut stepped = jumped.clone();

    jumped.stamp(day(7));
    for d in 2..=7 {
        stepped.stamp(day(d));
    }
    assert_same_state(&jumped, &stepped);
}

#[test]
fn replay_crosses_due_dates_and_escalations_identically() {
    // Day 10 crosses m1's due date (day 6) and three escalation intervals.
    let mut jumped = seeded_engine(&[9, 5]);
    let mut stepped = jumped.clone();

    jumped.stamp(day(10));
    for d in 2..=10 {
        stepped.stamp(day(d));
    }
    assert_same_state(&jumped, &stepped);

    // Sanity: something actually happened during the window.
    assert!(
        jumped
            .tickets()
            .values()
            .any(|t| t.priority == Priority::Critical)
    );
}

#[test]
fn stamping_the_same_day_twice_changes_nothing() {
    let mut engine = seeded_engine(&[9]);
    engine.stamp(day(6));
    let snapshot = engine.clone();

    engine.stamp(day(6));
    engine.stamp(day(3));
    assert_same_state(&engine, &snapshot);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any split of a jump into consecutive sub-jumps lands in the same state.
    #[test]
    fn any_stepping_schedule_is_equivalent(
        offsets in prop::collection::vec(1u64..=20, 1..=3),
        target in 2u32..=24,
        split in 1u32..=23,
    ) {
        let mut jumped = seeded_engine(&offsets);
        let mut stepped = jumped.clone();

        jumped.stamp(day(target));

        let mid = split.min(target);
        stepped.stamp(day(mid));
        stepped.stamp(day(target));

        prop_assert_eq!(jumped.milestones(), stepped.milestones());
        prop_assert_eq!(jumped.tickets(), stepped.tickets());
        prop_assert_eq!(jumped.users(), stepped.users());
    }
}
