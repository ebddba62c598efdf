//! Calendar primitives: dates, the 30U/360 convention, and the projection axis

mod axis;
mod date;

pub use axis::{Granularity, TimeAxis};
pub use date::{days_30u_360, months_between, PeriodDate};
