//! CSV-backed loading of a portfolio
//!
//! Mirrors the teacher's `policy/loader.rs` row-per-policy `Reader::deserialize`
//! style. Columns follow the parallel-array contract the engine's external
//! portfolio-loader collaborator is expected to honor: a `*_yyyymmdd` date
//! column of `0` (or any non-positive value) means "absent".

use super::{Gender, Policy, Portfolio, SmokerStatus};
use crate::error::{ProjectionError, Result};
use crate::time::PeriodDate;
use chrono::NaiveDate;
use csv::Reader;
use std::path::Path;

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    cession_id: u64,
    dob_yyyymmdd: i64,
    issue_date_yyyymmdd: i64,
    disablement_date_yyyymmdd: i64,
    gender: String,
    smoker_status: String,
    sum_insured: f64,
    reserving_rate: f64,
    initial_state: usize,
}

fn parse_yyyymmdd(raw: i64, field: &str) -> Result<Option<PeriodDate>> {
    if raw <= 0 {
        return Ok(None);
    }
    let year = (raw / 10_000) as i32;
    let month = ((raw / 100) % 100) as u32;
    let day = (raw % 100) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(|| ProjectionError::InvalidConfiguration(format!("{field}: not a valid yyyymmdd date: {raw}")))
}

fn parse_gender(raw: &str) -> Result<Gender> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "M" | "MALE" => Ok(Gender::Male),
        "F" | "FEMALE" => Ok(Gender::Female),
        other => Err(ProjectionError::InvalidConfiguration(format!("unrecognized gender: {other}"))),
    }
}

fn parse_smoker_status(raw: &str) -> Result<SmokerStatus> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "N" | "NONSMOKER" | "NON-SMOKER" => Ok(SmokerStatus::NonSmoker),
        "S" | "SMOKER" => Ok(SmokerStatus::Smoker),
        other => Err(ProjectionError::InvalidConfiguration(format!("unrecognized smoker status: {other}"))),
    }
}

/// Load a portfolio from a CSV file; every row becomes one policy sharing
/// `portfolio_date` and `product_code`.
pub fn load_portfolio_csv<P: AsRef<Path>>(
    path: P,
    portfolio_date: PeriodDate,
    product_code: &str,
) -> Result<Portfolio> {
    let mut reader = Reader::from_path(path)?;
    let mut portfolio = Portfolio::new(portfolio_date, product_code);

    for row in reader.deserialize() {
        let row: CsvRow = row?;
        let dob = parse_yyyymmdd(row.dob_yyyymmdd, "dob_yyyymmdd")?
            .ok_or_else(|| ProjectionError::InvalidConfiguration("dob_yyyymmdd is required".into()))?;
        let issue_date = parse_yyyymmdd(row.issue_date_yyyymmdd, "issue_date_yyyymmdd")?
            .ok_or_else(|| ProjectionError::InvalidConfiguration("issue_date_yyyymmdd is required".into()))?;
        let disablement_date = parse_yyyymmdd(row.disablement_date_yyyymmdd, "disablement_date_yyyymmdd")?;

        portfolio.push(Policy::new(
            row.cession_id,
            issue_date,
            dob,
            disablement_date,
            parse_gender(&row.gender)?,
            parse_smoker_status(&row.smoker_status)?,
            row.sum_insured,
            row.reserving_rate,
            product_code,
            row.initial_state,
        ));
    }

    Ok(portfolio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yyyymmdd_zero_is_absent() {
        assert_eq!(parse_yyyymmdd(0, "x").unwrap(), None);
        assert_eq!(parse_yyyymmdd(-5, "x").unwrap(), None);
    }

    #[test]
    fn yyyymmdd_parses_valid_date() {
        let parsed = parse_yyyymmdd(20211220, "x").unwrap().unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2021, 12, 20).unwrap());
    }

    #[test]
    fn gender_accepts_letter_and_word_forms() {
        assert_eq!(parse_gender("M").unwrap(), Gender::Male);
        assert_eq!(parse_gender("female").unwrap(), Gender::Female);
        assert!(parse_gender("X").is_err());
    }
}
