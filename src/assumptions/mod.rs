//! The assumption set: a square matrix of rate providers indexed by (from, to) state

pub mod loader;

use crate::error::{ProjectionError, Result};
use crate::providers::RateProvider;
use crate::risk_factors::{RiskFactorVector, NUM_RISK_FACTORS};

pub use loader::load_assumption_set_csv;

/// A square `n x n` grid of optional transition-rate providers
///
/// `providers[row * n + col]` holds the provider for the (row -> col)
/// transition; a `None` entry means "no flow between these states".
#[derive(Debug, Clone)]
pub struct AssumptionSet {
    n: usize,
    providers: Vec<Option<RateProvider>>,
}

fn project_indices(risk_factors: &[crate::risk_factors::RiskFactor], full: &RiskFactorVector) -> Vec<i64> {
    risk_factors.iter().map(|rf| full[rf.code()]).collect()
}

impl AssumptionSet {
    pub fn new(n: usize) -> Self {
        AssumptionSet {
            n,
            providers: vec![None; n * n],
        }
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.n || col >= self.n {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.n,
                actual: row.max(col) + 1,
                context: "assumption set (row, col) access".into(),
            });
        }
        Ok(row * self.n + col)
    }

    pub fn set_provider(&mut self, row: usize, col: usize, provider: RateProvider) -> Result<()> {
        let idx = self.index(row, col)?;
        self.providers[idx] = Some(provider);
        Ok(())
    }

    pub fn get_provider(&self, row: usize, col: usize) -> Option<&RateProvider> {
        let idx = row * self.n + col;
        self.providers.get(idx).and_then(|p| p.as_ref())
    }

    /// Deep-clone every non-null entry into `other` (which must share `n`)
    pub fn clone_into(&self, other: &mut AssumptionSet) -> Result<()> {
        if self.n != other.n {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.n,
                actual: other.n,
                context: "assumption set clone_into".into(),
            });
        }
        for (slot, src) in other.providers.iter_mut().zip(self.providers.iter()) {
            *slot = src.as_ref().map(RateProvider::clone_deep);
        }
        Ok(())
    }

    /// Project `indices` down to each provider's own risk factors and slice
    /// it into the matching cell of `other`, reusing `other`'s buffers.
    ///
    /// `other` must already share this set's shape (ordinarily produced by a
    /// prior [`clone_into`](Self::clone_into)) so every non-null cell here has
    /// a same-kind, adequately-capacitied counterpart to slice into.
    pub fn slice_into(&self, indices: &RiskFactorVector, other: &mut AssumptionSet) -> Result<()> {
        if self.n != other.n {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.n,
                actual: other.n,
                context: "assumption set slice_into".into(),
            });
        }
        for (src, dst) in self.providers.iter().zip(other.providers.iter_mut()) {
            if let Some(src_provider) = src {
                let dst_provider = dst.as_mut().ok_or_else(|| {
                    ProjectionError::InvalidConfiguration(
                        "slice_into target is missing a provider in a cell the source populates".into(),
                    )
                })?;
                let projected = project_indices(src_provider.risk_factors(), indices);
                src_provider.slice_into(&projected, dst_provider)?;
            }
        }
        Ok(())
    }

    /// Union of risk factors any non-null provider depends on
    pub fn relevant_risk_factors(&self) -> [bool; NUM_RISK_FACTORS] {
        let mut out = [false; NUM_RISK_FACTORS];
        for provider in self.providers.iter().flatten() {
            for rf in provider.risk_factors() {
                out[rf.code()] = true;
            }
        }
        out
    }

    /// Materialize the full `n x n` rate matrix at `indices` (row-major into `out`)
    pub fn get_rate_matrix(&self, indices: &RiskFactorVector, out: &mut [f64]) -> Result<()> {
        if out.len() != self.n * self.n {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.n * self.n,
                actual: out.len(),
                context: "get_rate_matrix output buffer".into(),
            });
        }
        for (idx, slot) in self.providers.iter().enumerate() {
            out[idx] = match slot {
                None => 0.0,
                Some(provider) => {
                    let projected = project_indices(provider.risk_factors(), indices);
                    provider.get_rate(&projected)?
                }
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk_factors::RiskFactor;

    #[test]
    fn get_rate_matrix_zero_fills_null_cells() {
        let mut set = AssumptionSet::new(2);
        set.set_provider(0, 1, RateProvider::constant(0.1)).unwrap();
        let mut out = [0.0; 4];
        set.get_rate_matrix(&[0, 0, 2024, 0, 0], &mut out).unwrap();
        assert_eq!(out, [0.0, 0.1, 0.0, 0.0]);
    }

    #[test]
    fn slice_into_restricts_to_policy_axes() {
        let mut set = AssumptionSet::new(2);
        let table = RateProvider::table(
            vec![RiskFactor::Age, RiskFactor::Gender],
            vec![2, 2],
            vec![50, 0],
            vec![0.01, 0.02, 0.03, 0.04],
        )
        .unwrap();
        set.set_provider(0, 1, table).unwrap();

        let mut scratch = AssumptionSet::new(2);
        set.clone_into(&mut scratch).unwrap();

        let mut record = AssumptionSet::new(2);
        scratch.clone_into(&mut record).unwrap();
        // fix gender=1, keep age free
        scratch
            .slice_into(&[-1, 1, -1, -1, -1], &mut record)
            .unwrap();

        let mut out = [0.0; 4];
        record.get_rate_matrix(&[51, -1, -1, -1, -1], &mut out).unwrap();
        assert_eq!(out[1], 0.04);
    }
}
