//! The per-policy state-vector advance (§4.4 of the design: "record projector")

use super::result::RunResult;
use crate::assumptions::AssumptionSet;
use crate::error::{ProjectionError, Result};
use crate::payments::ConditionalPayment;
use crate::policy::Policy;
use crate::risk_factors::{RiskFactor, RiskFactorVector, WILDCARD};
use crate::time::{months_between, TimeAxis};
use chrono::Datelike;
use std::collections::HashMap;

/// Per-worker scratch state reused across every policy a worker projects
///
/// Holds the worker's private deep clone of the best-estimate assumption set
/// plus a same-shaped scratch set that each policy's risk-factor selector is
/// sliced into in place, avoiding a fresh allocation per policy.
pub struct RecordProjector {
    base_assumptions: AssumptionSet,
    policy_assumptions: AssumptionSet,
}

impl RecordProjector {
    /// `source` is deep-cloned once; the worker never touches the caller's
    /// original assumption set again.
    pub fn new(source: &AssumptionSet) -> Result<Self> {
        let mut base_assumptions = AssumptionSet::new(source.dimension());
        source.clone_into(&mut base_assumptions)?;
        let mut policy_assumptions = AssumptionSet::new(source.dimension());
        base_assumptions.clone_into(&mut policy_assumptions)?;
        Ok(RecordProjector {
            base_assumptions,
            policy_assumptions,
        })
    }

    /// Project one policy's state vector over the whole time axis, writing
    /// into `result` (which the caller is responsible for resetting first).
    pub fn project_policy(
        &mut self,
        policy: &Policy,
        axis: &TimeAxis,
        max_age: u32,
        state_payments: &HashMap<usize, Vec<ConditionalPayment>>,
        transition_payments: &HashMap<(usize, usize), Vec<ConditionalPayment>>,
        result: &mut RunResult,
    ) -> Result<()> {
        let n = self.base_assumptions.dimension();
        if policy.initial_state >= n {
            return Err(ProjectionError::InvalidState {
                state: policy.initial_state,
                dimension: n,
            });
        }

        result.state_probs[0][policy.initial_state] = 1.0;
        result.state_vols[0][policy.initial_state] = policy.sum_insured;

        // Step 2: restrict every provider to the dynamic risk factors by
        // fixing the ones derivable from the policy itself.
        let mut selector: RiskFactorVector = [WILDCARD; crate::risk_factors::NUM_RISK_FACTORS];
        selector[RiskFactor::Gender.code()] = policy.gender.code();
        selector[RiskFactor::SmokerStatus.code()] = policy.smoker_status.code();
        self.base_assumptions.slice_into(&selector, &mut self.policy_assumptions)?;

        let relevant = self.policy_assumptions.relevant_risk_factors();

        let mut age_months = months_between(policy.date_of_birth, axis.portfolio_date);

        let mut a_yearly = vec![0.0f64; n * n];
        let mut a_step = vec![0.0f64; n * n];
        let mut last_query: Option<RiskFactorVector> = None;

        if axis.is_empty() {
            return Ok(());
        }

        for t in 1..axis.len() {
            if t > 1 && axis.period_lengths[t - 1] % 30 == 0 {
                age_months += axis.period_lengths[t - 1] / 30;
            } else {
                age_months = months_between(policy.date_of_birth, axis.start_dates[t]);
            }
            let age_years = age_months.div_euclid(12);

            let query: RiskFactorVector = [
                age_years,
                policy.gender.code(),
                axis.start_dates[t].year() as i64,
                policy.smoker_status.code(),
                0, // YearsDisabledIfDisabledAtStart: stubbed to 0, see DESIGN.md
            ];

            let query_changed = match &last_query {
                None => true,
                Some(prev) => (0..crate::risk_factors::NUM_RISK_FACTORS)
                    .any(|f| relevant[f] && prev[f] != query[f]),
            };

            if query_changed {
                self.policy_assumptions.get_rate_matrix(&query, &mut a_yearly)?;
                last_query = Some(query);
            }

            if query_changed || axis.period_lengths[t] != axis.period_lengths[t - 1] {
                let duration_factor = axis.period_lengths[t] as f64 / 360.0;
                for r in 0..n {
                    let mut row_sum = 0.0;
                    for c in 0..n {
                        if r != c {
                            let scaled = duration_factor * a_yearly[r * n + c];
                            a_step[r * n + c] = scaled;
                            row_sum += scaled;
                        }
                    }
                    a_step[r * n + r] = 1.0 - row_sum;
                }
            }

            // Begin-of-period state-conditional payments (§9 Open Question,
            // decided): against the mass standing in the state entering the step.
            for (&state, payments) in state_payments {
                for payment in payments {
                    let contribution = payment.amounts[t - 1] * result.state_probs[t - 1][state];
                    result.state_cond_payments[t - 1][payment.payment_type_index] += contribution;
                }
            }

            for r in 0..n {
                let prior_prob = result.state_probs[t - 1][r];
                if prior_prob == 0.0 {
                    continue;
                }
                for c in 0..n {
                    let mvm = a_step[r * n + c] * prior_prob;
                    result.state_probs[t][c] += mvm;
                    result.state_vols[t][c] += mvm * policy.sum_insured;
                    if r != c {
                        result.prob_movements[t][r * n + c] = mvm;
                        result.vol_movements[t][r * n + c] = mvm * policy.sum_insured;
                    }
                }
            }

            // End-of-period transition-conditional payments (§9 Open Question,
            // decided): against this step's own transition movement.
            for (&(from, to), payments) in transition_payments {
                let movement = result.prob_movements[t][from * n + to];
                for payment in payments {
                    result.state_cond_payments[t][payment.payment_type_index] += payment.amounts[t] * movement;
                }
            }

            if age_months >= max_age as i64 * 12 {
                trivial_runoff(result, t);
                break;
            }
        }

        Ok(())
    }
}

/// Copy the final state row forward over all remaining time indices, leaving
/// movements and payments zero for the copied-forward rows
fn trivial_runoff(result: &mut RunResult, from_index: usize) {
    let final_probs = result.state_probs[from_index].clone();
    let final_vols = result.state_vols[from_index].clone();
    for t in (from_index + 1)..result.num_timesteps {
        result.state_probs[t] = final_probs.clone();
        result.state_vols[t] = final_vols.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Gender, SmokerStatus};
    use crate::providers::RateProvider;
    use crate::time::Granularity;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn axis(years: u32) -> TimeAxis {
        TimeAxis::new(
            Granularity::Monthly,
            years,
            NaiveDate::from_ymd_opt(2021, 12, 20).unwrap(),
        )
    }

    fn policy(initial_state: usize, dob: chrono::NaiveDate) -> Policy {
        Policy::new(
            1,
            NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            dob,
            None,
            Gender::Male,
            SmokerStatus::NonSmoker,
            100_000.0,
            0.03,
            "TERM",
            initial_state,
        )
    }

    #[test]
    fn single_constant_rate_scales_by_duration_factor() {
        let mut be = AssumptionSet::new(2);
        be.set_provider(0, 1, RateProvider::constant(0.1)).unwrap();
        let axis = axis(2);
        let mut projector = RecordProjector::new(&be).unwrap();
        let mut result = RunResult::new(2, axis.len(), 0);
        let p = policy(0, NaiveDate::from_ymd_opt(1960, 1, 1).unwrap());
        projector
            .project_policy(&p, &axis, 120, &HashMap::new(), &HashMap::new(), &mut result)
            .unwrap();

        let expected_step1 = 1.0 - 0.1 * (axis.period_lengths[1] as f64 / 360.0);
        assert_abs_diff_eq!(result.state_probs[1][0], expected_step1, epsilon = 1e-9);
        assert_abs_diff_eq!(result.state_vols[1][0], 100_000.0 * expected_step1, epsilon = 1e-6);
    }

    #[test]
    fn volume_tracks_probability_times_sum_insured() {
        let mut be = AssumptionSet::new(2);
        be.set_provider(0, 1, RateProvider::constant(0.1)).unwrap();
        let axis = axis(2);
        let mut projector = RecordProjector::new(&be).unwrap();
        let mut result = RunResult::new(2, axis.len(), 0);
        let p = policy(0, NaiveDate::from_ymd_opt(1960, 1, 1).unwrap());
        projector
            .project_policy(&p, &axis, 120, &HashMap::new(), &HashMap::new(), &mut result)
            .unwrap();

        for t in 0..axis.len() {
            for s in 0..2 {
                assert_abs_diff_eq!(
                    result.state_vols[t][s],
                    p.sum_insured * result.state_probs[t][s],
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn absorbing_state_converges_to_one() {
        let mut be = AssumptionSet::new(2);
        be.set_provider(0, 1, RateProvider::constant(0.5)).unwrap();
        let axis = axis(5);
        let mut projector = RecordProjector::new(&be).unwrap();
        let mut result = RunResult::new(2, axis.len(), 0);
        let p = policy(0, NaiveDate::from_ymd_opt(1960, 1, 1).unwrap());
        projector
            .project_policy(&p, &axis, 120, &HashMap::new(), &HashMap::new(), &mut result)
            .unwrap();

        let last = axis.len() - 1;
        assert!(result.state_probs[last][1] > 0.99);
        assert!(result.state_probs[last][0] < 0.01);
    }

    #[test]
    fn max_age_cutoff_freezes_state_and_zeroes_movements() {
        let mut be = AssumptionSet::new(2);
        be.set_provider(0, 1, RateProvider::constant(0.1)).unwrap();
        let axis = axis(5);
        let mut projector = RecordProjector::new(&be).unwrap();
        let mut result = RunResult::new(2, axis.len(), 0);
        // dob chosen so the policy is already at age 70 at the portfolio date
        let p = policy(0, NaiveDate::from_ymd_opt(1951, 12, 20).unwrap());
        projector
            .project_policy(&p, &axis, 70, &HashMap::new(), &HashMap::new(), &mut result)
            .unwrap();

        let last = axis.len() - 1;
        assert_eq!(result.state_probs[1], result.state_probs[last]);
        assert_eq!(result.state_vols[1], result.state_vols[last]);
        assert!(result.prob_movements[last].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn invalid_initial_state_is_an_error() {
        let be = AssumptionSet::new(2);
        let axis = axis(1);
        let mut projector = RecordProjector::new(&be).unwrap();
        let mut result = RunResult::new(2, axis.len(), 0);
        let p = policy(7, NaiveDate::from_ymd_opt(1960, 1, 1).unwrap());
        let err = projector
            .project_policy(&p, &axis, 120, &HashMap::new(), &HashMap::new(), &mut result)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidState { .. }));
    }
}
