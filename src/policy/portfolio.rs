//! An ordered sequence of policies sharing one portfolio date and product code

use super::Policy;
use crate::time::PeriodDate;

/// A portfolio as presented to the engine: append-only during build, then
/// read-only for the duration of a run
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub portfolio_date: PeriodDate,
    pub product_code: String,
    pub policies: Vec<Policy>,
}

impl Portfolio {
    pub fn new(portfolio_date: PeriodDate, product_code: impl Into<String>) -> Self {
        Portfolio {
            portfolio_date,
            product_code: product_code.into(),
            policies: Vec::new(),
        }
    }

    pub fn push(&mut self, policy: Policy) {
        self.policies.push(policy);
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Split into `num_groups` sub-portfolios, round-robin over policy
    /// position in declaration order — deterministic regardless of group
    /// count, so aggregation order never depends on how the work was
    /// partitioned (see [`crate::projection::MetaRunner`]).
    pub fn split_round_robin(&self, num_groups: usize) -> Vec<Vec<Policy>> {
        let num_groups = num_groups.max(1);
        let mut groups: Vec<Vec<Policy>> = (0..num_groups).map(|_| Vec::new()).collect();
        for (idx, policy) in self.policies.iter().enumerate() {
            groups[idx % num_groups].push(policy.clone());
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Gender, SmokerStatus};
    use chrono::NaiveDate;

    fn sample_policy(id: u64) -> Policy {
        Policy::new(
            id,
            NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(1960, 1, 1).unwrap(),
            None,
            Gender::Male,
            SmokerStatus::NonSmoker,
            100_000.0,
            0.03,
            "TERM",
            0,
        )
    }

    #[test]
    fn round_robin_split_preserves_order_within_groups() {
        let mut portfolio = Portfolio::new(NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(), "TERM");
        for id in 0..7 {
            portfolio.push(sample_policy(id));
        }
        let groups = portfolio.split_round_robin(3);
        let ids: Vec<Vec<u64>> = groups
            .iter()
            .map(|g| g.iter().map(|p| p.cession_id).collect())
            .collect();
        assert_eq!(ids, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]);
    }

    #[test]
    fn single_group_contains_everything_in_order() {
        let mut portfolio = Portfolio::new(NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(), "TERM");
        for id in 0..5 {
            portfolio.push(sample_policy(id));
        }
        let groups = portfolio.split_round_robin(1);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 5);
    }
}
