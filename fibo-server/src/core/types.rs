use super::error::FiboError;
use crate::cache::CacheState;
use serde::Serialize;

/// Inclusive index interval, always stored with `lo <= hi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    lo: i64,
    hi: i64,
}

impl Range {
    /// Build a range from two bounds given in either order
    pub fn new(a: i64, b: i64) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn lo(&self) -> i64 {
        self.lo
    }

    pub fn hi(&self) -> i64 {
        self.hi
    }

    /// Number of indices, `hi - lo + 1`. The full `i64` span holds 2^64.
    pub fn len(&self) -> u128 {
        u128::from(self.hi.abs_diff(self.lo)) + 1
    }

    /// A range always holds at least one index
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Partial-result outcome of a computation that hit its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutIndicator {
    pub returned: usize,
    pub requested: u128,
}

impl From<TimeoutIndicator> for FiboError {
    fn from(t: TimeoutIndicator) -> Self {
        FiboError::Timeout {
            returned: t.returned,
            requested: t.requested,
        }
    }
}

/// Ordered decimal terms for a range, plus the timeout indicator if cut short
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputationResult {
    pub values: Vec<String>,
    pub timeout: Option<TimeoutIndicator>,
    /// Cache health at the end of the computation
    pub cache: CacheState,
}

impl ComputationResult {
    pub fn complete(values: Vec<String>, cache: CacheState) -> Self {
        Self {
            values,
            timeout: None,
            cache,
        }
    }

    pub fn timed_out(values: Vec<String>, requested: u128, cache: CacheState) -> Self {
        let timeout = TimeoutIndicator {
            returned: values.len(),
            requested,
        };
        Self {
            values,
            timeout: Some(timeout),
            cache,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.timeout.is_none()
    }

    /// Caller-facing error, if any
    pub fn error(&self) -> Option<FiboError> {
        self.timeout.map(FiboError::from)
    }

    /// Split into the values and the error text carried on the wire
    pub fn into_parts(self) -> (Vec<String>, Option<String>) {
        let error = self.error().map(|e| e.to_string());
        (self.values, error)
    }
}
