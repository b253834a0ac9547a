// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::value::StringTrigger;

fn int_action() -> Action {
    let (from, to) = TriggerValue::default_numeric_pair();
    Action::new(OptionInfo::new(3, "button"), "scan", "test.script", from, to)
}

#[test]
fn first_observation_records_baseline() {
    let mut action = int_action();

    assert_eq!(action.observe(OptionValue::Int(0)), Observation::Baseline);
    assert_eq!(action.last(), Some(&OptionValue::Int(0)));
}

#[test]
fn fires_on_configured_transition_only() {
    let mut action = int_action();

    assert_eq!(action.observe(OptionValue::Int(0)), Observation::Baseline);
    assert!(!action.observe(OptionValue::Int(0)).is_transition());
    assert!(action.observe(OptionValue::Int(1)).is_transition());
    // 1 -> 1 does not satisfy from == 0
    assert!(!action.observe(OptionValue::Int(1)).is_transition());
    // 1 -> 0 is the reverse transition
    assert!(!action.observe(OptionValue::Int(0)).is_transition());
    assert!(action.observe(OptionValue::Int(1)).is_transition());
}

#[test]
fn string_transition_uses_regex_on_both_sides() {
    let from = TriggerValue::String(StringTrigger::new("").unwrap());
    let to = TriggerValue::String(StringTrigger::new(".+").unwrap());
    let mut action = Action::new(OptionInfo::new(0, "tag"), "tagged", "s", from, to);

    assert_eq!(
        action.observe(OptionValue::String(String::new())),
        Observation::Baseline
    );
    assert!(!action.observe(OptionValue::String(String::new())).is_transition());
    assert!(action.observe(OptionValue::String("hi".into())).is_transition());
}

#[test]
fn kind_mismatch_is_reported_and_updates_baseline() {
    let mut action = int_action();

    action.observe(OptionValue::Int(0));
    let observation = action.observe(OptionValue::String("boom".into()));
    assert_eq!(
        observation,
        Observation::KindMismatch {
            last: ValueKind::Int,
            current: ValueKind::String,
        }
    );
    assert!(!observation.is_transition());
    // The mismatched value still becomes the baseline.
    assert_eq!(action.last(), Some(&OptionValue::String("boom".into())));

    // A good read afterwards mismatches against the string baseline and
    // re-establishes the numeric one.
    assert_eq!(
        action.observe(OptionValue::Int(0)),
        Observation::KindMismatch {
            last: ValueKind::String,
            current: ValueKind::Int,
        }
    );
    assert_eq!(action.last(), Some(&OptionValue::Int(0)));
    assert!(action.observe(OptionValue::Int(1)).is_transition());
}

#[test]
fn seeded_baseline_skips_the_baseline_step() {
    let (from, to) = TriggerValue::default_numeric_pair();
    let mut action = Action::new(OptionInfo::new(3, "button"), "scan", "s", from, to)
        .with_last(OptionValue::Int(0));

    assert!(action.observe(OptionValue::Int(1)).is_transition());
}

#[test]
fn reset_baseline_prevents_refire() {
    let mut action = int_action();

    action.observe(OptionValue::Int(0));
    assert!(action.observe(OptionValue::Int(1)).is_transition());

    action.reset_baseline();
    // Next observation only re-establishes the baseline.
    assert_eq!(action.observe(OptionValue::Int(1)), Observation::Baseline);
    assert!(!action.observe(OptionValue::Int(1)).is_transition());
}

#[test]
fn trigger_flag_is_consumed_once() {
    let action = int_action();
    let flag = action.trigger();

    assert!(!action.take_trigger());
    flag.set();
    assert!(flag.is_set());
    assert!(action.take_trigger());
    assert!(!action.take_trigger());
}

#[test]
fn rebind_replaces_binding_in_place() {
    let mut action = int_action();
    action.observe(OptionValue::Int(0));

    let (from, to) = TriggerValue::default_numeric_pair();
    action.rebind("email", "other.script", from, to, Some(OptionValue::Int(0)));

    assert_eq!(action.name(), "email");
    assert_eq!(action.script(), "other.script");
    assert_eq!(action.last(), Some(&OptionValue::Int(0)));
    // The shared trigger flag survives the rebind.
    let flag = action.trigger();
    flag.set();
    assert!(action.take_trigger());
}

#[test]
fn observe_records_current_value() {
    let mut action = int_action();
    assert!(action.current().is_none());

    action.observe(OptionValue::Int(5));
    assert_eq!(action.current(), Some(&OptionValue::Int(5)));
}
