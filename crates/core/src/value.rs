// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed option values and trigger patterns.
//!
//! Scanner options carry one of six value kinds; only the four data kinds
//! (`Int`, `Fixed`, `Bool`, `String`) can participate in trigger matching.
//! A trigger is either an integer equality test or a regular expression that
//! must match the whole string value.

use std::fmt;

use regex::Regex;

/// Default numeric trigger transition: 0 -> 1.
pub const FROM_VALUE_DEF_INT: i32 = 0;
pub const TO_VALUE_DEF_INT: i32 = 1;

/// Default string trigger transition: "" -> any non-empty value.
pub const FROM_VALUE_DEF_STR: &str = "";
pub const TO_VALUE_DEF_STR: &str = ".+";

/// A 16.16 fixed-point scalar as used by scanner backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixed(i32);

impl Fixed {
    /// Wrap a raw 16.16 fixed-point word.
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Build a fixed-point value from a whole number.
    pub fn from_int(value: i32) -> Self {
        Self(value << 16)
    }

    /// The raw 16.16 word.
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Integer part, truncating the fraction.
    pub fn as_int(self) -> i32 {
        self.0 >> 16
    }

    /// The value as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / f64::from(1 << 16)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.as_f64())
    }
}

/// The kind of a value, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Fixed,
    Bool,
    String,
    Group,
    Button,
}

impl ValueKind {
    /// Kinds matched by numeric triggers.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Fixed | ValueKind::Bool)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Fixed => "fixed",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Group => "group",
            ValueKind::Button => "button",
        };
        write!(f, "{}", name)
    }
}

/// A value read from a device option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i32),
    Fixed(Fixed),
    Bool(bool),
    String(String),
    /// Structural option kind; carries no value.
    Group,
    /// Write-only option kind; carries no value.
    Button,
}

impl OptionValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            OptionValue::Int(_) => ValueKind::Int,
            OptionValue::Fixed(_) => ValueKind::Fixed,
            OptionValue::Bool(_) => ValueKind::Bool,
            OptionValue::String(_) => ValueKind::String,
            OptionValue::Group => ValueKind::Group,
            OptionValue::Button => ValueKind::Button,
        }
    }

    /// Whether this value can participate in trigger matching.
    pub fn is_data(&self) -> bool {
        !matches!(self, OptionValue::Group | OptionValue::Button)
    }

    /// Render the value for an environment variable.
    ///
    /// Integers and booleans render as decimal (booleans as 0/1), fixed-point
    /// values as their decimal expansion. `Group` and `Button` have no
    /// rendering.
    pub fn as_env_str(&self) -> Option<String> {
        match self {
            OptionValue::Int(v) => Some(v.to_string()),
            OptionValue::Bool(v) => Some(i32::from(*v).to_string()),
            OptionValue::Fixed(v) => Some(v.to_string()),
            OptionValue::String(v) => Some(v.clone()),
            OptionValue::Group | OptionValue::Button => None,
        }
    }
}

/// Compile a pattern so that it must match an entire subject string.
///
/// Filters and string triggers use whole-string semantics; the regex crate
/// searches for substrings, so the pattern is wrapped in anchors.
pub fn full_match_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

/// An integer equality trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntTrigger(pub i32);

/// A whole-string regex trigger.
#[derive(Debug, Clone)]
pub struct StringTrigger {
    pattern: String,
    regex: Regex,
}

impl StringTrigger {
    /// Compile a trigger pattern. Errors are reported to the caller so it
    /// can substitute the default transition.
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let regex = full_match_regex(&pattern)?;
        Ok(Self { pattern, regex })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }
}

/// A trigger pattern paired with the value kind it applies to.
#[derive(Debug, Clone)]
pub enum TriggerValue {
    Int(IntTrigger),
    String(StringTrigger),
}

impl TriggerValue {
    /// The default numeric transition pair (0 -> 1).
    pub fn default_numeric_pair() -> (TriggerValue, TriggerValue) {
        (
            TriggerValue::Int(IntTrigger(FROM_VALUE_DEF_INT)),
            TriggerValue::Int(IntTrigger(TO_VALUE_DEF_INT)),
        )
    }

    /// The default string transition pair ("" -> ".+").
    pub fn default_string_pair() -> (TriggerValue, TriggerValue) {
        let from = StringTrigger::new(FROM_VALUE_DEF_STR).map(TriggerValue::String);
        let to = StringTrigger::new(TO_VALUE_DEF_STR).map(TriggerValue::String);
        match (from, to) {
            (Ok(from), Ok(to)) => (from, to),
            // The default patterns are statically valid; degrade to the
            // numeric pair rather than aborting if that ever changes.
            _ => Self::default_numeric_pair(),
        }
    }

    /// Whether the trigger matches an observed value.
    ///
    /// Integer triggers compare fixed-point values by their integer part and
    /// booleans as 0/1. Any pairing of a trigger with a value kind it does
    /// not cover is unequal.
    pub fn matches(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (TriggerValue::Int(t), OptionValue::Int(v)) => t.0 == *v,
            (TriggerValue::Int(t), OptionValue::Fixed(v)) => t.0 == v.as_int(),
            (TriggerValue::Int(t), OptionValue::Bool(v)) => t.0 == i32::from(*v),
            (TriggerValue::String(t), OptionValue::String(v)) => t.is_match(v),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
