//! Banker's algorithm safety check
//!
//! Works on matrices rather than a graph: for `n` processes and `m` resource
//! types it holds the declared maximum demand, the current allocation, the
//! derived remaining need and the vector of available units.
//!
//! The safety search grants, in every round, *all* unfinished processes whose
//! need fits into the current work vector, in ascending index order. A round
//! that grants nobody means the state is unsafe.
//!
//! Inputs are taken as given. An allocation larger than the declared maximum
//! yields a negative need, which is not rejected and simply makes that process
//! look satisfiable. Rows beyond the shorter of the two matrices are ignored.

use crate::core::types::{ProcessId, SafeSequence};

/// Snapshot of a multi-instance system for the safety check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankerState {
    max_need: Vec<Vec<i64>>,
    allocation: Vec<Vec<i64>>,
    need: Vec<Vec<i64>>,
    available: Vec<i64>,
}

impl BankerState {
    /// Build a state and derive `need = max_need - allocation`
    ///
    /// # Arguments
    /// * `max_need` - `n` rows of `m` declared maximum demands
    /// * `allocation` - `n` rows of `m` currently held units
    /// * `available` - `m` free units per resource type
    pub fn new(max_need: Vec<Vec<i64>>, allocation: Vec<Vec<i64>>, available: Vec<i64>) -> Self {
        let need = max_need
            .iter()
            .zip(&allocation)
            .map(|(max, held)| max.iter().zip(held).map(|(m, h)| m - h).collect())
            .collect();

        BankerState {
            max_need,
            allocation,
            need,
            available,
        }
    }

    /// All-zero state with `n` processes and `m` resource types
    pub fn zeroed(n: usize, m: usize) -> Self {
        Self::new(vec![vec![0; m]; n], vec![vec![0; m]; n], vec![0; m])
    }

    /// Number of processes with both a maximum and an allocation row
    pub fn process_count(&self) -> usize {
        self.need.len()
    }

    pub fn resource_count(&self) -> usize {
        self.available.len()
    }

    pub fn max_need(&self) -> &[Vec<i64>] {
        &self.max_need
    }

    pub fn allocation(&self) -> &[Vec<i64>] {
        &self.allocation
    }

    /// Remaining demand per process and resource type
    pub fn need(&self) -> &[Vec<i64>] {
        &self.need
    }

    pub fn available(&self) -> &[i64] {
        &self.available
    }

    /// Run the safety algorithm
    ///
    /// # Returns
    /// * `Some(sequence)` - an order in which every process can finish
    /// * `None` - the state is unsafe
    ///
    /// With no processes or no resource types the state is vacuously safe and
    /// the sequence is empty.
    pub fn safe_sequence(&self) -> Option<SafeSequence> {
        let n = self.process_count();
        if n == 0 || self.resource_count() == 0 {
            return Some(Vec::new());
        }
        let mut work = self.available.clone();
        let mut finish = vec![false; n];
        let mut sequence = Vec::with_capacity(n);

        for _ in 0..n {
            if sequence.len() == n {
                break;
            }

            let mut granted = false;
            for p in 0..n {
                if finish[p] || !self.fits(p, &work) {
                    continue;
                }
                for (w, held) in work.iter_mut().zip(&self.allocation[p]) {
                    *w += held;
                }
                finish[p] = true;
                sequence.push(p);
                granted = true;
            }

            if !granted {
                return None;
            }
        }

        Some(sequence)
    }

    /// Whether process `p`'s remaining need fits into `work`
    fn fits(&self, p: ProcessId, work: &[i64]) -> bool {
        self.need[p].iter().zip(work).all(|(need, free)| need <= free)
    }
}

/// Check a state given as raw matrices
///
/// Shorthand for `BankerState::new(..).safe_sequence()`.
pub fn is_safe(
    max_need: &[Vec<i64>],
    allocation: &[Vec<i64>],
    available: &[i64],
) -> Option<SafeSequence> {
    BankerState::new(max_need.to_vec(), allocation.to_vec(), available.to_vec()).safe_sequence()
}
