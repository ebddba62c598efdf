//! Policy data structures

use crate::time::PeriodDate;

/// Gender risk-factor value, encoded per [`crate::risk_factors::RiskFactor::Gender`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn code(self) -> i64 {
        match self {
            Gender::Male => 0,
            Gender::Female => 1,
        }
    }
}

/// Smoker-status risk-factor value, encoded per
/// [`crate::risk_factors::RiskFactor::SmokerStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmokerStatus {
    NonSmoker,
    Smoker,
}

impl SmokerStatus {
    pub fn code(self) -> i64 {
        match self {
            SmokerStatus::NonSmoker => 0,
            SmokerStatus::Smoker => 1,
        }
    }
}

/// A single policy record, immutable once constructed
#[derive(Debug, Clone)]
pub struct Policy {
    pub cession_id: u64,
    pub issue_date: PeriodDate,
    pub date_of_birth: PeriodDate,
    pub disablement_date: Option<PeriodDate>,
    pub gender: Gender,
    pub smoker_status: SmokerStatus,
    pub sum_insured: f64,
    pub reserving_rate: f64,
    pub product_code: String,
    pub initial_state: usize,
}

impl Policy {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cession_id: u64,
        issue_date: PeriodDate,
        date_of_birth: PeriodDate,
        disablement_date: Option<PeriodDate>,
        gender: Gender,
        smoker_status: SmokerStatus,
        sum_insured: f64,
        reserving_rate: f64,
        product_code: impl Into<String>,
        initial_state: usize,
    ) -> Self {
        Policy {
            cession_id,
            issue_date,
            date_of_birth,
            disablement_date,
            gender,
            smoker_status,
            sum_insured,
            reserving_rate,
            product_code: product_code.into(),
            initial_state,
        }
    }
}
