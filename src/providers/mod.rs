//! Rate providers: the leaves of an assumption set
//!
//! A provider is either a plain scalar or a dense risk-factor-indexed table.
//! The original engine models this as a class hierarchy under a common base;
//! here the two kinds are the variants of one small enum, which is both
//! shorter and lets `slice_into`'s borrow-checked in-place mutation stay a
//! single non-virtual match rather than a trait-object dance.

mod constant;
mod table;

pub use constant::ConstantProvider;
pub use table::TableProvider;

use crate::error::{ProjectionError, Result};
use crate::risk_factors::RiskFactor;

/// Re-exported so callers need only import from `providers`
pub use crate::risk_factors::WILDCARD;

#[derive(Debug, Clone, PartialEq)]
pub enum RateProvider {
    Constant(ConstantProvider),
    Table(TableProvider),
}

impl RateProvider {
    pub fn constant(rate: f64) -> Self {
        RateProvider::Constant(ConstantProvider::new(rate))
    }

    pub fn table(risk_factors: Vec<RiskFactor>, shape: Vec<usize>, offsets: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        Ok(RateProvider::Table(TableProvider::new(risk_factors, shape, offsets, values)?))
    }

    pub fn risk_factors(&self) -> &[RiskFactor] {
        match self {
            RateProvider::Constant(_) => &[],
            RateProvider::Table(t) => t.risk_factors(),
        }
    }

    /// `query` must already be projected down to this provider's own axes
    /// (see [`crate::assumptions::AssumptionSet::slice_into`]).
    pub fn get_rate(&self, query: &[i64]) -> Result<f64> {
        match self {
            RateProvider::Constant(c) => Ok(c.rate),
            RateProvider::Table(t) => t.get_rate(query),
        }
    }

    pub fn clone_deep(&self) -> RateProvider {
        self.clone()
    }

    /// Slice in place into `other`. `other` must already be of the same kind
    /// as `self` (a constant slices into a constant scratch slot, a table
    /// into a table scratch slot) — this mirrors the original engine, where
    /// an assumption set is built from providers of matching kind per cell
    /// and the worker's scratch clone preserves that shape.
    pub fn slice_into(&self, query: &[i64], other: &mut RateProvider) -> Result<()> {
        match (self, other) {
            (RateProvider::Constant(c), RateProvider::Constant(o)) => {
                o.rate = c.rate;
                Ok(())
            }
            (RateProvider::Table(t), RateProvider::Table(o)) => t.slice_into(query, o),
            _ => Err(ProjectionError::InvalidConfiguration(
                "slice_into target provider kind does not match source".into(),
            )),
        }
    }
}
