//! Calendar arithmetic: period dates and the 30U/360 day-count convention

use chrono::{Datelike, NaiveDate};

/// A point on the projection calendar
///
/// `chrono::NaiveDate` already is the (year, month, day) value type the
/// engine needs; there is no reason to wrap it further.
pub type PeriodDate = NaiveDate;

/// Returns `true` if `date` is the last calendar day of its month
pub fn is_end_of_month(date: PeriodDate) -> bool {
    date.day() == days_in_month(date.year(), date.month())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid calendar month");
    next_month_first
        .pred_opt()
        .expect("day before a valid first-of-month")
        .day()
}

/// 30U/360 (US / NASD) day count between `a` and `b`, inclusive of `a`
///
/// Mirrors the original `getdays_30U_360` algorithm: both end-of-February
/// dates are coerced to day 30 before applying the standard 30/360 rules.
pub fn days_30u_360(a: PeriodDate, b: PeriodDate) -> i64 {
    assert!(a <= b, "30U/360 day count requires a <= b, got {a} > {b}");

    let mut a_day = a.day() as i64;
    let mut b_day = b.day() as i64;

    let a_is_eom_feb = a.month() == 2 && is_end_of_month(a);
    let b_is_eom_feb = b.month() == 2 && is_end_of_month(b);

    if a_is_eom_feb && b_is_eom_feb {
        b_day = 30;
    }
    if a_day == 31 || a_is_eom_feb {
        a_day = 30;
    }
    if a_day == 30 && b_day == 31 {
        b_day = 30;
    }

    360 * (b.year() as i64 - a.year() as i64) + 30 * (b.month() as i64 - a.month() as i64)
        + (b_day - a_day)
}

/// Advance `cursor` to the next month-end, quarter-end or year-end boundary
pub fn next_month_end(cursor: PeriodDate) -> PeriodDate {
    let (y, m) = if cursor.month() == 12 {
        (cursor.year() + 1, 1)
    } else {
        (cursor.year(), cursor.month() + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(y, m, 1).expect("valid year/month");
    let (y2, m2) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
    NaiveDate::from_ymd_opt(y2, m2, 1)
        .expect("valid year/month")
        .pred_opt()
        .unwrap_or(first_of_next)
}

pub fn next_quarter_end(cursor: PeriodDate) -> PeriodDate {
    let mut end = next_month_end(cursor);
    while ![3, 6, 9, 12].contains(&end.month()) {
        end = next_month_end(end + chrono::Duration::days(1));
    }
    end
}

pub fn next_year_end(cursor: PeriodDate) -> PeriodDate {
    NaiveDate::from_ymd_opt(cursor.year() + 1, 1, 1)
        .expect("valid year")
        .pred_opt()
        .expect("31-Dec exists")
}

/// Completed months between `dob` and `at`, or `-1` if `at` precedes `dob`
///
/// Grounded on the original's `get_age_at_date`: a birthday on day `d` of
/// month `m` is "reached" on the same day-of-month in a later month, with
/// the day-of-month boundary resolved the same way `chrono` resolves it.
pub fn months_between(dob: PeriodDate, at: PeriodDate) -> i64 {
    if at < dob {
        return -1;
    }
    let mut months = (at.year() as i64 - dob.year() as i64) * 12
        + (at.month() as i64 - dob.month() as i64);
    if at.day() < dob.day() {
        months -= 1;
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_count_simple_month() {
        let a = NaiveDate::from_ymd_opt(2021, 12, 21).unwrap();
        let b = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        assert_eq!(days_30u_360(a, b), 10);
    }

    #[test]
    fn day_count_full_year() {
        let a = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(days_30u_360(a, b), 360);
    }

    #[test]
    fn day_count_end_of_feb_both_sides() {
        let a = NaiveDate::from_ymd_opt(2023, 2, 28).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(days_30u_360(a, b), 360);
    }

    #[test]
    fn months_between_handles_day_of_month_boundary() {
        let dob = NaiveDate::from_ymd_opt(1960, 6, 15).unwrap();
        assert_eq!(
            months_between(dob, NaiveDate::from_ymd_opt(1960, 6, 14).unwrap()),
            -1
        );
        assert_eq!(
            months_between(dob, NaiveDate::from_ymd_opt(1960, 7, 14).unwrap()),
            0
        );
        assert_eq!(
            months_between(dob, NaiveDate::from_ymd_opt(1960, 7, 15).unwrap()),
            1
        );
    }

    #[test]
    fn not_yet_born_is_negative_one() {
        let dob = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(
            months_between(dob, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()),
            -1
        );
    }
}
