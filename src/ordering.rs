//! Changeset ordering
//!
//! Every document keeps its changesets in a list shaped
//! `[first...] [none...] [last...]`, each group in arrival order. `insert`
//! places one entry according to its run-order hint and preserves that shape
//! no matter how `first`, `none` and `last` arrivals interleave. Included
//! documents are folded into their parent through the same function, so the
//! shape holds for the fully assembled root as well.

use crate::error::{Error, Result};

/// Placement requested by a changeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOrder {
    First,
    Natural,
    Last,
}

impl RunOrder {
    /// Interpret a raw hint. Absent and `none` mean natural placement.
    pub fn from_hint(hint: Option<&str>) -> Result<Self> {
        match hint {
            None | Some("none") => Ok(RunOrder::Natural),
            Some("first") => Ok(RunOrder::First),
            Some("last") => Ok(RunOrder::Last),
            Some(other) => Err(Error::UnknownRunOrder {
                value: other.to_string(),
            }),
        }
    }
}

/// Anything carrying a run-order hint.
pub trait RunOrdered {
    fn run_order(&self) -> Option<&str>;
}

fn has_hint<T: RunOrdered>(entry: &T, hint: &str) -> bool {
    entry.run_order() == Some(hint)
}

/// Insert `entry` into `list` according to its hint.
///
/// An unrecognized hint is an error and leaves `list` untouched.
pub fn insert<T: RunOrdered>(list: &mut Vec<T>, entry: T) -> Result<()> {
    match RunOrder::from_hint(entry.run_order())? {
        RunOrder::Last => list.push(entry),
        RunOrder::First => {
            let idx = list
                .iter()
                .position(|existing| !has_hint(existing, "first"))
                .unwrap_or(list.len());
            list.insert(idx, entry);
        }
        RunOrder::Natural => {
            let idx = list
                .iter()
                .rposition(|existing| !has_hint(existing, "last"))
                .map(|idx| idx + 1)
                .unwrap_or(0);
            list.insert(idx, entry);
        }
    }
    Ok(())
}
