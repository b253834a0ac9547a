// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A configured action bound to a concrete device option.
//!
//! An action watches one option for a configured from -> to transition and
//! carries the script to run when it fires. The trigger flag is shared with
//! the supervisor so external commands can fire an action between polls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::device::OptionInfo;
use crate::value::{OptionValue, TriggerValue, ValueKind};

/// Shared fire-request flag, settable from other threads.
#[derive(Debug, Clone, Default)]
pub struct TriggerFlag(Arc<AtomicBool>);

impl TriggerFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a fire on the next poll iteration.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Consume the request, clearing it.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of feeding one observed value into an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First observation; the baseline was recorded, nothing compared.
    Baseline,
    /// The value kind differs from the recorded baseline kind.
    KindMismatch { last: ValueKind, current: ValueKind },
    /// Compared against the previous value.
    Compared { transition: bool },
}

impl Observation {
    pub fn is_transition(self) -> bool {
        matches!(self, Observation::Compared { transition: true })
    }
}

/// One configured action bound to one device option.
#[derive(Debug)]
pub struct Action {
    option: OptionInfo,
    name: String,
    script: String,
    from_value: TriggerValue,
    to_value: TriggerValue,
    last_value: Option<OptionValue>,
    current_value: Option<OptionValue>,
    trigger: TriggerFlag,
}

impl Action {
    pub fn new(
        option: OptionInfo,
        name: impl Into<String>,
        script: impl Into<String>,
        from_value: TriggerValue,
        to_value: TriggerValue,
    ) -> Self {
        Self {
            option,
            name: name.into(),
            script: script.into(),
            from_value,
            to_value,
            last_value: None,
            current_value: None,
            trigger: TriggerFlag::new(),
        }
    }

    /// Seed the baseline with the value read during action setup.
    pub fn with_last(mut self, value: OptionValue) -> Self {
        self.last_value = Some(value);
        self
    }

    pub fn option(&self) -> &OptionInfo {
        &self.option
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Shared handle for requesting an external fire.
    pub fn trigger(&self) -> TriggerFlag {
        self.trigger.clone()
    }

    /// Consume a pending external fire request.
    pub fn take_trigger(&self) -> bool {
        self.trigger.take()
    }

    /// Replace the binding in place, keeping the trigger flag and baseline
    /// slot. Used when a later config section claims an already-bound option
    /// and multiple actions are not allowed.
    pub fn rebind(
        &mut self,
        name: impl Into<String>,
        script: impl Into<String>,
        from_value: TriggerValue,
        to_value: TriggerValue,
        last_value: Option<OptionValue>,
    ) {
        self.name = name.into();
        self.script = script.into();
        self.from_value = from_value;
        self.to_value = to_value;
        self.last_value = last_value;
    }

    /// Value read earlier in the same poll iteration, if any.
    pub fn current(&self) -> Option<&OptionValue> {
        self.current_value.as_ref()
    }

    pub fn last(&self) -> Option<&OptionValue> {
        self.last_value.as_ref()
    }

    /// Drop the baseline so the next iteration starts fresh. Called after a
    /// script ran, otherwise the to-value lingering as the baseline could
    /// re-fire immediately.
    pub fn reset_baseline(&mut self) {
        self.last_value = None;
    }

    /// Record one observed value and compare it against the baseline.
    ///
    /// The observed value always becomes the new baseline. A kind mismatch
    /// is reported instead of compared.
    pub fn observe(&mut self, value: OptionValue) -> Observation {
        self.current_value = Some(value.clone());

        let Some(last) = self.last_value.take() else {
            self.last_value = Some(value);
            return Observation::Baseline;
        };

        if last.kind() != value.kind() {
            let observation = Observation::KindMismatch {
                last: last.kind(),
                current: value.kind(),
            };
            self.last_value = Some(value);
            return observation;
        }

        let transition = self.to_value.matches(&value) && self.from_value.matches(&last);
        self.last_value = Some(value);
        Observation::Compared { transition }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
