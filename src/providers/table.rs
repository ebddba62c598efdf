//! A dense, row-major, multi-dimensional rate table with in-place slicing
//!
//! Grounded on `CStandardRateProvider` in the original engine: strides are
//! precomputed on every shape change, and `slice_into` reuses a sibling
//! table's pre-allocated buffer instead of allocating a fresh one per policy.

use crate::error::{ProjectionError, Result};
use crate::risk_factors::{RiskFactor, WILDCARD};

/// A dense rate table indexed on a fixed, ordered subset of risk factors
#[derive(Debug, Clone, PartialEq)]
pub struct TableProvider {
    risk_factors: Vec<RiskFactor>,
    shape: Vec<usize>,
    offsets: Vec<i64>,
    strides: Vec<usize>,
    values: Vec<f64>,
    /// Fixed at construction; `slice_into` never grows a target past this
    capacity: usize,
}

fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let dim = shape.len();
    let mut strides = vec![1usize; dim];
    for i in (0..dim.saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

impl TableProvider {
    /// Build a table with its own freshly sized capacity
    pub fn new(risk_factors: Vec<RiskFactor>, shape: Vec<usize>, offsets: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        let dim = risk_factors.len();
        if shape.len() != dim || offsets.len() != dim {
            return Err(ProjectionError::DimensionMismatch {
                expected: dim,
                actual: shape.len().max(offsets.len()),
                context: "table provider risk_factors/shape/offsets length".into(),
            });
        }
        let expected_len: usize = shape.iter().product();
        if values.len() != expected_len {
            return Err(ProjectionError::DimensionMismatch {
                expected: expected_len,
                actual: values.len(),
                context: "table provider values length vs shape product".into(),
            });
        }
        let strides = compute_strides(&shape);
        let capacity = values.len();
        Ok(TableProvider {
            risk_factors,
            shape,
            offsets,
            strides,
            values,
            capacity,
        })
    }

    /// An empty scratch table with room for at least `capacity` values
    ///
    /// Used as a worker's sliceing target: allocated once, reused across
    /// every policy a worker processes.
    pub fn with_capacity(capacity: usize) -> Self {
        TableProvider {
            risk_factors: Vec::new(),
            shape: vec![1],
            offsets: vec![0],
            strides: vec![1],
            values: vec![0.0; capacity.max(1)],
            capacity: capacity.max(1),
        }
    }

    pub fn risk_factors(&self) -> &[RiskFactor] {
        &self.risk_factors
    }

    pub fn dim(&self) -> usize {
        self.risk_factors.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn flat_index(&self, query: &[i64]) -> Result<usize> {
        if query.len() != self.dim() {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.dim(),
                actual: query.len(),
                context: "table provider rate query".into(),
            });
        }
        let mut flat = 0i64;
        for (axis, &q) in query.iter().enumerate() {
            let lo = self.offsets[axis];
            let hi = lo + self.shape[axis] as i64;
            if q < lo || q >= hi {
                return Err(ProjectionError::IndexOutOfRange {
                    axis,
                    index: q,
                    shape: self.shape[axis],
                    offset: lo,
                });
            }
            flat += self.strides[axis] as i64 * (q - lo);
        }
        Ok(flat as usize)
    }

    /// Look up a single rate; every axis of `query` must be fully fixed
    pub fn get_rate(&self, query: &[i64]) -> Result<f64> {
        let idx = self.flat_index(query)?;
        Ok(self.values[idx])
    }

    pub fn clone_deep(&self) -> TableProvider {
        self.clone()
    }

    /// Slice this table by `query` (one entry per own axis; `WILDCARD` keeps
    /// the axis, anything else fixes it), writing the result into `other`
    /// without growing its buffer past its existing capacity.
    pub fn slice_into(&self, query: &[i64], other: &mut TableProvider) -> Result<()> {
        if query.len() != self.dim() {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.dim(),
                actual: query.len(),
                context: "table provider slice query".into(),
            });
        }

        let free_axes: Vec<usize> = (0..self.dim()).filter(|&a| query[a] == WILDCARD).collect();
        let fixed_base: i64 = (0..self.dim())
            .filter(|&a| query[a] != WILDCARD)
            .map(|a| self.strides[a] as i64 * (query[a] - self.offsets[a]))
            .sum();

        let new_shape: Vec<usize> = if free_axes.is_empty() {
            vec![1]
        } else {
            free_axes.iter().map(|&a| self.shape[a]).collect()
        };
        let new_offsets: Vec<i64> = if free_axes.is_empty() {
            vec![0]
        } else {
            free_axes.iter().map(|&a| self.offsets[a]).collect()
        };
        let new_risk_factors: Vec<RiskFactor> = free_axes.iter().map(|&a| self.risk_factors[a]).collect();

        let required_size: usize = new_shape.iter().product();
        if required_size > other.capacity {
            return Err(ProjectionError::CapacityExceeded {
                required: required_size,
                available: other.capacity,
            });
        }

        // Bounds-check fixed axes up front (flat_index can't catch this for us
        // since we never call it with the fixed axes alone).
        for a in 0..self.dim() {
            if query[a] == WILDCARD {
                continue;
            }
            let lo = self.offsets[a];
            let hi = lo + self.shape[a] as i64;
            if query[a] < lo || query[a] >= hi {
                return Err(ProjectionError::IndexOutOfRange {
                    axis: a,
                    index: query[a],
                    shape: self.shape[a],
                    offset: lo,
                });
            }
        }

        other.values.resize(required_size, 0.0);

        // Enumerate every free-axis coordinate combination in lexicographic order.
        let mut counters = vec![0usize; free_axes.len()];
        for dest_flat in 0..required_size {
            let mut src_flat = fixed_base;
            for (k, &a) in free_axes.iter().enumerate() {
                src_flat += self.strides[a] as i64 * counters[k] as i64;
            }
            other.values[dest_flat] = self.values[src_flat as usize];

            // odometer increment, least-significant (last) free axis first
            for k in (0..free_axes.len()).rev() {
                counters[k] += 1;
                if counters[k] < new_shape[k] {
                    break;
                }
                counters[k] = 0;
            }
        }

        other.risk_factors = new_risk_factors;
        other.shape = new_shape;
        other.offsets = new_offsets;
        other.strides = compute_strides(&other.shape);
        // capacity is never changed by slicing

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk_factors::RiskFactor;

    fn sample() -> TableProvider {
        TableProvider::new(
            vec![RiskFactor::Age, RiskFactor::Gender],
            vec![2, 3],
            vec![0, 0],
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
        )
        .unwrap()
    }

    #[test]
    fn get_rate_reads_row_major() {
        let t = sample();
        assert_eq!(t.get_rate(&[0, 0]).unwrap(), 0.1);
        assert_eq!(t.get_rate(&[1, 2]).unwrap(), 0.6);
    }

    #[test]
    fn slice_into_row() {
        let t = sample();
        let mut scratch = TableProvider::with_capacity(6);
        t.slice_into(&[WILDCARD, 0], &mut scratch).unwrap();
        assert_eq!(scratch.get_rate(&[0]).unwrap(), 0.1);
        assert_eq!(scratch.get_rate(&[1]).unwrap(), 0.4);
    }

    #[test]
    fn slice_into_column() {
        let t = sample();
        let mut scratch = TableProvider::with_capacity(6);
        t.slice_into(&[0, WILDCARD], &mut scratch).unwrap();
        assert_eq!(scratch.get_rate(&[0]).unwrap(), 0.1);
        assert_eq!(scratch.get_rate(&[2]).unwrap(), 0.3);
    }

    #[test]
    fn slice_into_scalar() {
        let t = sample();
        let mut scratch = TableProvider::with_capacity(6);
        t.slice_into(&[1, 2], &mut scratch).unwrap();
        assert_eq!(scratch.dim(), 0);
        assert_eq!(scratch.get_rate(&[]).unwrap(), 0.6);
    }

    #[test]
    fn slice_into_rejects_insufficient_capacity() {
        let t = sample();
        let mut scratch = TableProvider::with_capacity(1);
        let err = t.slice_into(&[WILDCARD, WILDCARD], &mut scratch).unwrap_err();
        assert!(matches!(err, ProjectionError::CapacityExceeded { .. }));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let t = sample();
        let err = t.get_rate(&[5, 0]).unwrap_err();
        assert!(matches!(err, ProjectionError::IndexOutOfRange { .. }));
    }
}
