//! Button layout
//!
//! Arranges a flat list of buttons into keyboard rows, either evenly
//! (N per row) or following an explicit per-row pattern.

#[cfg(test)]
mod proptests;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Buttons per row when no valid count is configured
pub const DEFAULT_BUTTONS_PER_ROW: usize = 4;

/// Upper bound for buttons per row
pub const MAX_BUTTONS_PER_ROW: usize = 8;

/// Separator between a button name and its counter
const COUNTER_SEP: &str = ": ";

/// Errors produced when a row pattern cannot hold the buttons
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("no buttons to organize")]
    NoButtons,
    #[error("pattern row {row} must hold at least one button")]
    EmptyRow { row: usize },
    #[error("can't fit {buttons} buttons in pattern {pattern:?}")]
    Overflow { buttons: usize, pattern: Vec<usize> },
}

/// A labeled control button with an optional counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "v")]
    pub counter: i64,
}

impl Button {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            counter: 0,
        }
    }

    /// Label shown to the user, `name` or `name: counter`.
    pub fn label(&self, show_counter: bool) -> String {
        if show_counter {
            format!("{}{COUNTER_SEP}{}", self.name, self.counter)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Button name: {}, value: {}>", self.name, self.counter)
    }
}

/// Clamps a requested per-row count into `1..=MAX_BUTTONS_PER_ROW`.
pub fn clamp_per_row(per_row: usize) -> usize {
    if per_row == 0 || per_row > MAX_BUTTONS_PER_ROW {
        DEFAULT_BUTTONS_PER_ROW
    } else {
        per_row
    }
}

/// Packs items into rows of `per_row`, the last row may be shorter.
pub fn pack_even<T>(items: Vec<T>, per_row: usize) -> Vec<Vec<T>> {
    let per_row = clamp_per_row(per_row);
    let mut rows = Vec::with_capacity(items.len().div_ceil(per_row));
    let mut row = Vec::with_capacity(per_row);
    for item in items {
        row.push(item);
        if row.len() == per_row {
            rows.push(std::mem::replace(&mut row, Vec::with_capacity(per_row)));
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

/// Checks pattern entries without looking at the buttons.
pub fn validate_pattern(pattern: &[usize]) -> Result<(), LayoutError> {
    match pattern.iter().position(|&n| n < 1) {
        Some(row) => Err(LayoutError::EmptyRow { row }),
        None => Ok(()),
    }
}

/// Packs items following `pattern`, each entry being the number of items on
/// that row. Trailing pattern rows that would be empty are omitted.
pub fn pack_pattern<T>(items: Vec<T>, pattern: &[usize]) -> Result<Vec<Vec<T>>, LayoutError> {
    if items.is_empty() {
        return Err(LayoutError::NoButtons);
    }
    validate_pattern(pattern)?;
    let capacity: usize = pattern.iter().sum();
    if capacity < items.len() {
        return Err(LayoutError::Overflow {
            buttons: items.len(),
            pattern: pattern.to_vec(),
        });
    }

    let mut rows: Vec<Vec<T>> = Vec::with_capacity(pattern.len());
    let mut items = items.into_iter().peekable();
    for &per_row in pattern {
        if items.peek().is_none() {
            break;
        }
        rows.push(items.by_ref().take(per_row).collect());
    }
    Ok(rows)
}

/// Derives the action token a channel uses to route a button press back to
/// the control that rendered it.
pub fn action_token(scope: &str, label: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update([0u8]);
    hasher.update(label.as_bytes());
    hasher
        .finalize()
        .iter()
        .take(16)
        .map(|b| format!("{b:02x}"))
        .collect()
}
