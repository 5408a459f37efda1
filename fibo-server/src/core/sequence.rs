//! Fibonacci sequence extended to negative indices.
//!
//! `F(0) = 0`, `F(1) = 1` and for `n > 0`, `F(-n) = F(n) * (-1)^(n+1)`.
//! Terms are computed with two running big-integer accumulators, one addition
//! per step, polling the caller's deadline before every step.

use super::deadline::Deadline;
use num_bigint::BigInt;
use num_traits::{One, Zero};

/// Computes single terms of the bidirectional sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceEngine;

impl SequenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Term `n` of the sequence, or `None` if the deadline cut the loop short.
    pub fn nth(&self, n: i64, deadline: &Deadline) -> Option<BigInt> {
        let steps = n.unsigned_abs();

        let mut prev = BigInt::zero();
        let mut curr = BigInt::one();
        for _ in 0..steps {
            if deadline.is_expired() {
                return None;
            }
            let next = &prev + &curr;
            prev = std::mem::replace(&mut curr, next);
        }

        // prev holds F(|n|)
        if n < 0 && steps % 2 == 0 {
            prev = -prev;
        }
        Some(prev)
    }
}
