//! The projection calendar: a sequence of (start, end, length-in-days) periods

use super::date::{days_30u_360, next_month_end, next_quarter_end, next_year_end, PeriodDate};
use chrono::{Datelike, Duration, NaiveDate};

/// The time scale on which a projection advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    fn advance(self, cursor: PeriodDate) -> PeriodDate {
        match self {
            Granularity::Monthly => next_month_end(cursor),
            Granularity::Quarterly => next_quarter_end(cursor),
            Granularity::Yearly => next_year_end(cursor),
        }
    }
}

/// A fixed, read-only calendar axis built once per run
///
/// `start[0] == end[0] == portfolio_date` with `period_length[0] == 0`; this
/// degenerate first row anchors the projection's t=0 state.
#[derive(Debug, Clone)]
pub struct TimeAxis {
    pub granularity: Granularity,
    pub portfolio_date: PeriodDate,
    pub start_dates: Vec<PeriodDate>,
    pub end_dates: Vec<PeriodDate>,
    /// 30U/360 day count of each period; `period_lengths[0] == 0`
    pub period_lengths: Vec<i64>,
}

impl TimeAxis {
    pub fn new(granularity: Granularity, years_to_simulate: u32, portfolio_date: PeriodDate) -> Self {
        let horizon = NaiveDate::from_ymd_opt(
            portfolio_date.year() + years_to_simulate as i32,
            portfolio_date.month(),
            portfolio_date.day(),
        )
        .unwrap_or_else(|| {
            // 29 Feb portfolio dates in a non-leap target year: fall back to 28 Feb
            NaiveDate::from_ymd_opt(
                portfolio_date.year() + years_to_simulate as i32,
                portfolio_date.month(),
                28,
            )
            .expect("28th of any month is always valid")
        });
        let horizon_end = if horizon.month() == 12 && horizon.day() == 31 {
            horizon
        } else {
            NaiveDate::from_ymd_opt(horizon.year(), 12, 31).expect("31-Dec exists")
        };

        let mut start_dates = vec![portfolio_date];
        let mut end_dates = vec![portfolio_date];
        let mut period_lengths = vec![0i64];

        let mut cursor = portfolio_date;
        while cursor < horizon_end {
            let period_start = cursor + Duration::days(1);
            let period_end = granularity.advance(cursor);
            let length = days_30u_360(period_start, period_end + Duration::days(1));
            start_dates.push(period_start);
            end_dates.push(period_end);
            period_lengths.push(length);
            cursor = period_end;
        }

        TimeAxis {
            granularity,
            portfolio_date,
            start_dates,
            end_dates,
            period_lengths,
        }
    }

    pub fn len(&self) -> usize {
        self.start_dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.start_dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_stub_period_then_month_lengths() {
        let axis = TimeAxis::new(
            Granularity::Monthly,
            2,
            NaiveDate::from_ymd_opt(2021, 12, 20).unwrap(),
        );
        assert_eq!(axis.start_dates[0], axis.end_dates[0]);
        assert_eq!(axis.period_lengths[0], 0);
        assert_eq!(axis.start_dates[1], NaiveDate::from_ymd_opt(2021, 12, 21).unwrap());
        assert_eq!(axis.end_dates[1], NaiveDate::from_ymd_opt(2021, 12, 31).unwrap());
        assert_eq!(axis.period_lengths[1], 10);
        assert_eq!(*axis.end_dates.last().unwrap(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn quarterly_axis() {
        let axis = TimeAxis::new(
            Granularity::Quarterly,
            1,
            NaiveDate::from_ymd_opt(2021, 12, 20).unwrap(),
        );
        assert_eq!(axis.end_dates[2], NaiveDate::from_ymd_opt(2022, 3, 31).unwrap());
        assert_eq!(axis.period_lengths[2], 90);
    }

    #[test]
    fn yearly_axis() {
        let axis = TimeAxis::new(
            Granularity::Yearly,
            1,
            NaiveDate::from_ymd_opt(2021, 12, 20).unwrap(),
        );
        assert_eq!(axis.end_dates[2], NaiveDate::from_ymd_opt(2022, 12, 31).unwrap());
        assert_eq!(axis.period_lengths[2], 360);
    }

    #[test]
    fn yearly_portfolio_date_already_year_end() {
        let axis = TimeAxis::new(
            Granularity::Yearly,
            3,
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
        );
        let expected_ends = [2021, 2022, 2023, 2024];
        for (row, year) in expected_ends.iter().enumerate() {
            assert_eq!(axis.end_dates[row].year(), *year);
        }
        assert_eq!(axis.period_lengths, vec![0, 360, 360, 360]);
    }
}
