//! Actuarial projection engine: policy cash flows and state probabilities
//! projected forward in time under a multi-dimensional, sliceable table of
//! transition-rate assumptions.
//!
//! The core is the `projection` module: a per-policy state-vector advance
//! (`RecordProjector`) driven by a `TimeAxis`, a portfolio's policies sliced
//! against an `AssumptionSet` of `providers::RateProvider`s, and a
//! `MetaRunner` that partitions a portfolio across worker groups and
//! aggregates their `RunResult`s. CSV loading, the CLI, and logging setup
//! live alongside the core but are not part of its contract.

pub mod error;
pub mod risk_factors;
pub mod providers;
pub mod assumptions;
pub mod time;
pub mod policy;
pub mod payments;
pub mod projection;

pub use assumptions::AssumptionSet;
pub use error::{ProjectionError, Result};
pub use payments::AggregatePayments;
pub use policy::{Policy, Portfolio};
pub use projection::{MetaRunner, RunConfig, RunResult};
pub use time::{Granularity, TimeAxis};
