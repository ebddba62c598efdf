//! Partitioning, parallel dispatch, and aggregation across a portfolio

use super::config::RunConfig;
use super::record::RecordProjector;
use super::result::RunResult;
use crate::error::Result;
use crate::payments::AggregatePayments;
use crate::policy::{Policy, Portfolio};
use crate::time::TimeAxis;
use rayon::prelude::*;

/// Projects one sub-portfolio, strictly sequentially, into a private [`RunResult`]
pub struct Runner<'a> {
    #[allow(dead_code)]
    worker_index: usize,
    config: &'a RunConfig,
    sub_portfolio: &'a [Policy],
    time_axis: &'a TimeAxis,
    record_projector: RecordProjector,
    scratch: RunResult,
}

impl<'a> Runner<'a> {
    pub fn new(
        worker_index: usize,
        config: &'a RunConfig,
        sub_portfolio: &'a [Policy],
        time_axis: &'a TimeAxis,
        num_payment_types: usize,
    ) -> Result<Self> {
        let record_projector = RecordProjector::new(&config.be_assumptions)?;
        let scratch = RunResult::new(config.state_dimension, time_axis.len(), num_payment_types);
        Ok(Runner {
            worker_index,
            config,
            sub_portfolio,
            time_axis,
            record_projector,
            scratch,
        })
    }

    /// Project every policy in this worker's sub-portfolio, summing each
    /// record's scratch result into `run_result`.
    pub fn run(&mut self, run_result: &mut RunResult, sub_payments: &AggregatePayments) -> Result<()> {
        for (i, policy) in self.sub_portfolio.iter().enumerate() {
            self.scratch.reset();
            self.record_projector.project_policy(
                policy,
                self.time_axis,
                self.config.max_age,
                sub_payments.state_payments_for(i),
                sub_payments.transition_payments_for(i),
                &mut self.scratch,
            )?;
            run_result.add_result(&self.scratch)?;
        }
        Ok(())
    }
}

/// Splits a portfolio across worker groups, dispatches them (in parallel, if
/// configured), and aggregates results
pub struct MetaRunner;

impl MetaRunner {
    /// `min(cpu_count, portfolio_size / 4)`, clamped to at least 1; always 1
    /// when multicore is disabled.
    pub fn num_groups(use_multicore: bool, cpu_count: usize, portfolio_size: usize) -> usize {
        if !use_multicore {
            return 1;
        }
        cpu_count.min(portfolio_size / 4).max(1)
    }

    pub fn run(
        config: &RunConfig,
        portfolio: &Portfolio,
        time_axis: &TimeAxis,
        payments: &AggregatePayments,
    ) -> Result<RunResult> {
        let num_groups = Self::num_groups(config.use_multicore, config.num_cpus, portfolio.len());
        let policy_groups = portfolio.split_round_robin(num_groups);
        let payment_groups = payments.split_round_robin(num_groups);
        let num_payment_types = payments.num_payment_columns();

        let run_group = |index: usize, sub_portfolio: &[Policy], sub_payments: &AggregatePayments| -> Result<RunResult> {
            let mut runner = Runner::new(index, config, sub_portfolio, time_axis, num_payment_types)?;
            let mut result = RunResult::new(config.state_dimension, time_axis.len(), num_payment_types);
            runner.run(&mut result, sub_payments)?;
            Ok(result)
        };

        let group_results: Vec<Result<RunResult>> = if config.use_multicore {
            policy_groups
                .par_iter()
                .zip(payment_groups.par_iter())
                .enumerate()
                .map(|(i, (sub_portfolio, sub_payments))| run_group(i, sub_portfolio, sub_payments))
                .collect()
        } else {
            policy_groups
                .iter()
                .zip(payment_groups.iter())
                .enumerate()
                .map(|(i, (sub_portfolio, sub_payments))| run_group(i, sub_portfolio, sub_payments))
                .collect()
        };

        let mut aggregate = RunResult::new(config.state_dimension, time_axis.len(), num_payment_types);
        for result in group_results {
            aggregate.add_result(&result?)?;
        }
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::AssumptionSet;
    use crate::policy::{Gender, SmokerStatus};
    use crate::providers::RateProvider;
    use crate::time::Granularity;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn sample_config(use_multicore: bool, num_cpus: usize) -> RunConfig {
        let mut be = AssumptionSet::new(2);
        be.set_provider(0, 1, RateProvider::constant(0.1)).unwrap();
        RunConfig::new(2, Granularity::Monthly, 2, num_cpus, use_multicore, 120, be, Vec::new()).unwrap()
    }

    fn sample_portfolio(n: usize, portfolio_date: chrono::NaiveDate) -> Portfolio {
        let mut portfolio = Portfolio::new(portfolio_date, "TERM");
        for id in 0..n {
            portfolio.push(Policy::new(
                id as u64,
                NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(1960, 1, 1).unwrap(),
                None,
                Gender::Male,
                SmokerStatus::NonSmoker,
                100_000.0,
                0.03,
                "TERM",
                0,
            ));
        }
        portfolio
    }

    #[test]
    fn num_groups_respects_multicore_flag() {
        assert_eq!(MetaRunner::num_groups(false, 8, 100), 1);
        assert_eq!(MetaRunner::num_groups(true, 8, 100), 8);
        assert_eq!(MetaRunner::num_groups(true, 8, 4), 1);
        assert_eq!(MetaRunner::num_groups(true, 8, 0), 1);
    }

    #[test]
    fn single_group_and_multi_group_runs_agree() {
        let portfolio_date = NaiveDate::from_ymd_opt(2021, 12, 20).unwrap();
        let axis = TimeAxis::new(Granularity::Monthly, 2, portfolio_date);
        let portfolio = sample_portfolio(8, portfolio_date);
        let payments = AggregatePayments::empty(8, axis.len());

        let config_single = sample_config(false, 1);
        let result_single = MetaRunner::run(&config_single, &portfolio, &axis, &payments).unwrap();

        let config_multi = sample_config(true, 4);
        let result_multi = MetaRunner::run(&config_multi, &portfolio, &axis, &payments).unwrap();

        for t in 0..axis.len() {
            for s in 0..2 {
                assert_abs_diff_eq!(
                    result_single.state_probs[t][s],
                    result_multi.state_probs[t][s],
                    epsilon = 1e-12
                );
            }
        }
    }
}
