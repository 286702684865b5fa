use std::time::Duration;

use seizure_drill_core::{
    ActivityLevel, AlertState, Command, Event, FeedbackKind, RandomSource, Remedy, SeededRandom,
    Stressor,
};
use seizure_drill_world::{self as world, query, ActivityState, World};

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn alert_changes(events: &[Event]) -> Vec<AlertState> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::AlertChanged { state } => Some(*state),
            _ => None,
        })
        .collect()
}

#[test]
fn stress_then_overload_clamps_and_signals() {
    let mut world = World::new();
    assert_eq!(query::activity_level(&world), ActivityLevel::BASELINE);

    let _ = run(&mut world, Command::AddStress { amount: 0.15 });
    assert!((query::activity_level(&world).get() - 0.20).abs() < 1e-12);
    assert_eq!(query::alert_state(&world), AlertState::Idle);

    let events = run(&mut world, Command::AddStress { amount: 0.90 });
    assert_eq!(query::activity_level(&world).get(), ActivityLevel::CEILING);
    assert_eq!(query::alert_state(&world), AlertState::Signaling);
    assert_eq!(alert_changes(&events), vec![AlertState::Signaling]);
}

#[test]
fn random_mutation_sequences_preserve_range_and_alert_invariant() {
    let mut source = SeededRandom::from_seed(0x0ddb_a11);
    let mut activity = ActivityState::new();
    let mut events = Vec::new();

    for _ in 0..2_000 {
        let amount = source.uniform(0.0, 1.0);
        match (source.next_unit() * 3.0) as u32 {
            0 => activity.add_stress(amount, &mut events),
            1 => activity.calm_down(amount, &mut events),
            _ => activity.set_level(source.uniform(-1.0, 2.0), &mut events),
        }

        let level = activity.level().get();
        assert!(
            (ActivityLevel::FLOOR..=ActivityLevel::CEILING).contains(&level),
            "level escaped range: {level}"
        );
        assert_eq!(
            activity.alert_state() == AlertState::Signaling,
            level > ActivityLevel::ALERT_THRESHOLD,
            "alert out of sync at level {level}"
        );
    }
}

#[test]
fn negative_amounts_are_absorbed() {
    let mut world = World::new();
    let _ = run(&mut world, Command::SetActivityLevel { level: 0.5 });

    let events = run(&mut world, Command::AddStress { amount: -0.4 });
    assert!(events.is_empty(), "no change expected: {events:?}");
    let events = run(&mut world, Command::CalmDown { amount: -0.4 });
    assert!(events.is_empty(), "no change expected: {events:?}");
    assert!((query::activity_level(&world).get() - 0.5).abs() < 1e-12);
}

#[test]
fn calming_below_threshold_stops_alert_once() {
    let mut world = World::new();
    let _ = run(&mut world, Command::SetActivityLevel { level: 0.95 });
    assert_eq!(query::alert_state(&world), AlertState::Signaling);

    let first = run(&mut world, Command::ApplyRemedy { remedy: Remedy::Rest });
    assert_eq!(alert_changes(&first), vec![AlertState::Idle]);

    let second = run(
        &mut world,
        Command::ApplyRemedy {
            remedy: Remedy::Mindfulness,
        },
    );
    assert!(alert_changes(&second).is_empty(), "stop must be idempotent");
    assert_eq!(query::alert_state(&world), AlertState::Idle);

    let later = run(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(5),
        },
    );
    assert!(
        !later.iter().any(|event| matches!(event, Event::Feedback { .. })),
        "stopped alert must not emit feedback"
    );
}

#[test]
fn signalling_alert_pulses_heavy_feedback() {
    let mut world = World::new();
    let _ = run(&mut world, Command::SetActivityLevel { level: 0.9 });

    let mut heavy = 0;
    for _ in 0..12 {
        let events = run(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
        );
        heavy += events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::Feedback {
                        kind: FeedbackKind::Heavy
                    }
                )
            })
            .count();
    }

    assert_eq!(heavy, 3, "expected one pulse per 400ms");
}

#[test]
fn catalogue_commands_use_documented_magnitudes() {
    let mut world = World::new();
    let _ = run(
        &mut world,
        Command::ApplyStressor {
            stressor: Stressor::MissedMeds,
        },
    );
    assert!((query::activity_level(&world).get() - 0.30).abs() < 1e-12);

    let _ = run(
        &mut world,
        Command::ApplyRemedy {
            remedy: Remedy::Medication,
        },
    );
    assert_eq!(query::activity_level(&world), ActivityLevel::BASELINE);

    let _ = run(&mut world, Command::RestoreBaseline);
    assert_eq!(query::activity_level(&world), ActivityLevel::RESTORED);
}

#[test]
fn unchanged_level_emits_no_activity_event() {
    let mut world = World::new();
    let events = run(&mut world, Command::CalmDown { amount: 0.2 });
    assert!(events.is_empty(), "already at the floor: {events:?}");
}

#[test]
fn long_tick_emits_a_bounded_burst() {
    let mut world = World::new();
    let _ = run(&mut world, Command::SetActivityLevel { level: 0.95 });

    let events = run(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(7_200_000),
        },
    );
    let heavy = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::Feedback {
                    kind: FeedbackKind::Heavy
                }
            )
        })
        .count();
    assert!((1..=16).contains(&heavy), "unbounded catch-up: {heavy}");
    assert_eq!(query::alert_state(&world), AlertState::Signaling);

    let _ = run(&mut world, Command::BeginDrill);
    let events = run(&mut world, Command::Tick { dt: Duration::MAX });
    assert!(events.len() < 64, "drill replayed {} events", events.len());
    assert_eq!(query::clock(&world), Duration::MAX);
}

#[test]
fn relapse_fires_once_from_a_calm_level() {
    let mut world = World::new();
    let _ = run(&mut world, Command::RestoreBaseline);

    let events = run(&mut world, Command::TriggerRelapse);
    assert_eq!(
        events,
        vec![Event::ActivityChanged {
            level: ActivityLevel::RELAPSE
        }]
    );
    assert_eq!(query::alert_state(&world), AlertState::Idle);

    let _ = run(&mut world, Command::RestoreBaseline);
    let events = run(&mut world, Command::TriggerRelapse);
    assert!(events.is_empty(), "relapse must not repeat: {events:?}");
    assert_eq!(query::activity_level(&world), ActivityLevel::RESTORED);
}

#[test]
fn relapse_is_skipped_when_already_agitated() {
    let mut world = World::new();
    let _ = run(&mut world, Command::SetActivityLevel { level: 0.5 });

    let events = run(&mut world, Command::TriggerRelapse);
    assert!(events.is_empty());

    let _ = run(&mut world, Command::SetActivityLevel { level: 0.3 });
    let events = run(&mut world, Command::TriggerRelapse);
    assert_eq!(events.len(), 1, "0.3 is still calm enough");
    assert_eq!(query::activity_level(&world), ActivityLevel::RELAPSE);
}
