//! Slice selectors with inclusive bounds and post-hoc striding.
//!
//! Bounds follow the store's index convention: both ends inclusive, negative
//! values count from the tail. The step is applied client-side over whatever
//! the range command returned.

use crate::error::{Error, Result};

/// What a caller asked for when indexing into a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// A single position. Sorted sets reject this.
    Index(i64),
    /// `start..=stop` by `step`; `None` means 0, -1 and 1 respectively.
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
}

impl Selector {
    /// Every element, in order.
    pub fn all() -> Self {
        Selector::Slice {
            start: None,
            stop: None,
            step: None,
        }
    }

    /// `start..=stop` with unit step.
    pub fn range(start: i64, stop: i64) -> Self {
        Selector::Slice {
            start: Some(start),
            stop: Some(stop),
            step: None,
        }
    }

    /// `start..=stop` by `step`.
    pub fn stepped(start: i64, stop: i64, step: i64) -> Self {
        Selector::Slice {
            start: Some(start),
            stop: Some(stop),
            step: Some(step),
        }
    }
}

/// Resolved form of a slice: bounds, direction, and stride magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SliceSpec {
    pub start: i64,
    pub stop: i64,
    pub reverse: bool,
    pub stride: usize,
}

impl SliceSpec {
    pub(crate) fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Result<Self> {
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(Error::InvalidArgument("slice step cannot be zero".to_string()));
        }
        Ok(SliceSpec {
            start: start.unwrap_or(0),
            stop: stop.unwrap_or(-1),
            reverse: step < 0,
            stride: step.unsigned_abs() as usize,
        })
    }

    /// Keeps every `stride`-th item starting with the first.
    pub(crate) fn apply_stride<T>(&self, items: Vec<T>) -> Vec<T> {
        if self.stride == 1 {
            return items;
        }
        items.into_iter().step_by(self.stride).collect()
    }
}
