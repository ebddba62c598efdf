//! State- and transition-conditional payment streams attached to a portfolio
//!
//! Grounded on the original engine's `AggregatePayments`: a payment category
//! (state-conditional or transition-conditional) is injected one dense
//! `#policies x #timesteps` matrix at a time, keyed by a `payment_type_index`
//! that may be used at most once per category. Internally this is exploded
//! into one [`ConditionalPayment`] per (policy, state) or (policy, from, to)
//! cell so the record projector can look up "what do I owe this policy in
//! this state" without re-walking the injected matrices.

use crate::error::{ProjectionError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};

/// One payment stream: a payment type and its dense per-step amounts
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalPayment {
    pub payment_type_index: usize,
    /// Length must equal the run's time-axis length
    pub amounts: Vec<f64>,
}

/// All payment streams for a portfolio, indexed by policy position
#[derive(Debug, Clone)]
pub struct AggregatePayments {
    num_policies: usize,
    num_timesteps: usize,
    state_payments: Vec<HashMap<usize, Vec<ConditionalPayment>>>,
    transition_payments: Vec<HashMap<(usize, usize), Vec<ConditionalPayment>>>,
    payment_types: BTreeSet<usize>,
    seen_state_keys: HashSet<(usize, usize)>,
    seen_transition_keys: HashSet<(usize, usize, usize)>,
}

impl AggregatePayments {
    /// An empty payment set for a portfolio of `num_policies` policies
    /// projected over `num_timesteps` periods (including the t=0 row)
    pub fn empty(num_policies: usize, num_timesteps: usize) -> Self {
        AggregatePayments {
            num_policies,
            num_timesteps,
            state_payments: vec![HashMap::new(); num_policies],
            transition_payments: vec![HashMap::new(); num_policies],
            payment_types: BTreeSet::new(),
            seen_state_keys: HashSet::new(),
            seen_transition_keys: HashSet::new(),
        }
    }

    fn check_matrix_shape(&self, matrix: &[Vec<f64>]) -> Result<()> {
        if matrix.len() != self.num_policies {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.num_policies,
                actual: matrix.len(),
                context: "payment matrix row count vs portfolio size".into(),
            });
        }
        for row in matrix {
            if row.len() != self.num_timesteps {
                return Err(ProjectionError::DimensionMismatch {
                    expected: self.num_timesteps,
                    actual: row.len(),
                    context: "payment matrix column count vs time axis length".into(),
                });
            }
        }
        Ok(())
    }

    /// Inject a dense `#policies x #timesteps` matrix of amounts owed to
    /// policies standing in `state` under `payment_type`
    pub fn inject_state_payment(
        &mut self,
        state: usize,
        payment_type: usize,
        matrix: &[Vec<f64>],
    ) -> Result<()> {
        self.check_matrix_shape(matrix)?;
        if !self.seen_state_keys.insert((state, payment_type)) {
            return Err(ProjectionError::PaymentReinjection(payment_type));
        }
        for (policy_idx, amounts) in matrix.iter().enumerate() {
            self.state_payments[policy_idx]
                .entry(state)
                .or_default()
                .push(ConditionalPayment {
                    payment_type_index: payment_type,
                    amounts: amounts.clone(),
                });
        }
        self.payment_types.insert(payment_type);
        Ok(())
    }

    /// Inject a dense `#policies x #timesteps` matrix of amounts owed to
    /// policies making the (from -> to) transition under `payment_type`
    pub fn inject_transition_payment(
        &mut self,
        from: usize,
        to: usize,
        payment_type: usize,
        matrix: &[Vec<f64>],
    ) -> Result<()> {
        self.check_matrix_shape(matrix)?;
        if !self.seen_transition_keys.insert((from, to, payment_type)) {
            return Err(ProjectionError::PaymentReinjection(payment_type));
        }
        for (policy_idx, amounts) in matrix.iter().enumerate() {
            self.transition_payments[policy_idx]
                .entry((from, to))
                .or_default()
                .push(ConditionalPayment {
                    payment_type_index: payment_type,
                    amounts: amounts.clone(),
                });
        }
        self.payment_types.insert(payment_type);
        Ok(())
    }

    pub fn state_payments_for(&self, policy_index: usize) -> &HashMap<usize, Vec<ConditionalPayment>> {
        &self.state_payments[policy_index]
    }

    pub fn transition_payments_for(&self, policy_index: usize) -> &HashMap<(usize, usize), Vec<ConditionalPayment>> {
        &self.transition_payments[policy_index]
    }

    /// `K` in the result container: `1 + max(payment_type_index)` observed,
    /// or 0 if no payment type was ever injected
    pub fn num_payment_columns(&self) -> usize {
        self.payment_types.iter().next_back().map_or(0, |max| max + 1)
    }

    /// Split into `num_groups` sub-payment-sets, round-robin over policy
    /// position — the same order [`crate::policy::Portfolio::split_round_robin`]
    /// uses, so sub-portfolio position `i` pairs with sub-payments position `i`.
    pub fn split_round_robin(&self, num_groups: usize) -> Vec<AggregatePayments> {
        let num_groups = num_groups.max(1);
        let mut groups: Vec<AggregatePayments> = (0..num_groups)
            .map(|_| AggregatePayments {
                num_policies: 0,
                num_timesteps: self.num_timesteps,
                state_payments: Vec::new(),
                transition_payments: Vec::new(),
                payment_types: self.payment_types.clone(),
                seen_state_keys: self.seen_state_keys.clone(),
                seen_transition_keys: self.seen_transition_keys.clone(),
            })
            .collect();

        for policy_idx in 0..self.num_policies {
            let g = policy_idx % num_groups;
            groups[g].state_payments.push(self.state_payments[policy_idx].clone());
            groups[g].transition_payments.push(self.transition_payments[policy_idx].clone());
            groups[g].num_policies += 1;
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinjection_of_same_state_payment_type_is_an_error() {
        let mut payments = AggregatePayments::empty(2, 3);
        payments.inject_state_payment(0, 1, &[vec![0.0; 3], vec![0.0; 3]]).unwrap();
        let err = payments.inject_state_payment(0, 1, &[vec![0.0; 3], vec![0.0; 3]]).unwrap_err();
        assert!(matches!(err, ProjectionError::PaymentReinjection(1)));
    }

    #[test]
    fn num_payment_columns_tracks_max_observed_type() {
        let mut payments = AggregatePayments::empty(1, 2);
        assert_eq!(payments.num_payment_columns(), 0);
        payments.inject_state_payment(0, 3, &[vec![0.0, 0.0]]).unwrap();
        assert_eq!(payments.num_payment_columns(), 4);
        payments.inject_transition_payment(0, 1, 5, &[vec![0.0, 0.0]]).unwrap();
        assert_eq!(payments.num_payment_columns(), 6);
    }

    #[test]
    fn split_round_robin_preserves_per_policy_streams() {
        let mut payments = AggregatePayments::empty(4, 2);
        payments
            .inject_state_payment(0, 0, &[vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0], vec![4.0, 4.0]])
            .unwrap();
        let groups = payments.split_round_robin(2);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].state_payments_for(0)[&0][0].amounts, vec![1.0, 1.0]);
        assert_eq!(groups[0].state_payments_for(1)[&0][0].amounts, vec![3.0, 3.0]);
        assert_eq!(groups[1].state_payments_for(0)[&0][0].amounts, vec![2.0, 2.0]);
        assert_eq!(groups[1].state_payments_for(1)[&0][0].amounts, vec![4.0, 4.0]);
    }
}
