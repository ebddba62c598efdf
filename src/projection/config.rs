//! Run configuration: the engine's top-level input contract

use crate::assumptions::AssumptionSet;
use crate::error::{ProjectionError, Result};
use crate::time::Granularity;

/// Everything a run needs besides the portfolio and its payment streams
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub state_dimension: usize,
    pub granularity: Granularity,
    pub years_to_simulate: u32,
    pub num_cpus: usize,
    pub use_multicore: bool,
    /// Projection-age cap, in years
    pub max_age: u32,
    pub be_assumptions: AssumptionSet,
    /// Sliced identically to `be_assumptions`; reserved for non-best-estimate
    /// variants. Not yet consumed by the runner (see DESIGN.md).
    pub other_assumptions: Vec<AssumptionSet>,
}

impl RunConfig {
    pub fn new(
        state_dimension: usize,
        granularity: Granularity,
        years_to_simulate: u32,
        num_cpus: usize,
        use_multicore: bool,
        max_age: u32,
        be_assumptions: AssumptionSet,
        other_assumptions: Vec<AssumptionSet>,
    ) -> Result<Self> {
        if be_assumptions.dimension() != state_dimension {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "be_assumptions dimension {} does not match state_dimension {}",
                be_assumptions.dimension(),
                state_dimension
            )));
        }
        for (i, other) in other_assumptions.iter().enumerate() {
            if other.dimension() != state_dimension {
                return Err(ProjectionError::InvalidConfiguration(format!(
                    "other_assumptions[{i}] dimension {} does not match state_dimension {}",
                    other.dimension(),
                    state_dimension
                )));
            }
        }
        if state_dimension == 0 {
            return Err(ProjectionError::InvalidConfiguration("state_dimension must be positive".into()));
        }
        if years_to_simulate == 0 {
            return Err(ProjectionError::InvalidConfiguration("years_to_simulate must be positive".into()));
        }
        if num_cpus == 0 {
            return Err(ProjectionError::InvalidConfiguration("num_cpus must be positive".into()));
        }
        Ok(RunConfig {
            state_dimension,
            granularity,
            years_to_simulate,
            num_cpus,
            use_multicore,
            max_age,
            be_assumptions,
            other_assumptions,
        })
    }
}
