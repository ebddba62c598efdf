//! CSV-backed loading of assumption sets
//!
//! Mirrors the teacher's per-field CSV loader style in
//! `assumptions/loader.rs`: plain functions returning owned data, propagating
//! I/O and parse failures through the crate's error type with `?`.

use crate::error::{ProjectionError, Result};
use crate::providers::RateProvider;
use crate::risk_factors::RiskFactor;
use crate::AssumptionSet;
use csv::Reader;
use std::collections::HashMap;
use std::path::Path;

/// One row of the manifest CSV that ties (from, to) cells to their source
#[derive(Debug, serde::Deserialize)]
struct ManifestRow {
    from_state: usize,
    to_state: usize,
    kind: String,
    source: String,
}

fn risk_factor_by_name(name: &str) -> Option<RiskFactor> {
    RiskFactor::ALL
        .into_iter()
        .find(|rf| format!("{rf:?}").eq_ignore_ascii_case(name))
}

/// Load one table-shaped provider from a long-format CSV
///
/// The header must contain one column per risk factor the table depends on
/// (named after the [`RiskFactor`] variant, e.g. `Age`, `Gender`) plus a
/// `rate` column. Every combination of the observed per-column value ranges
/// must be present exactly once (a dense integer grid); this is checked by
/// comparing the row count against the product of each axis's observed span.
fn load_table_csv(path: &Path) -> Result<RateProvider> {
    let mut reader = Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let rate_col = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("rate"))
        .ok_or_else(|| {
            ProjectionError::InvalidConfiguration(format!("{}: missing `rate` column", path.display()))
        })?;

    let mut axis_cols: Vec<(usize, RiskFactor)> = Vec::new();
    for (col, header) in headers.iter().enumerate() {
        if col == rate_col {
            continue;
        }
        if let Some(rf) = risk_factor_by_name(header) {
            axis_cols.push((col, rf));
        }
    }
    axis_cols.sort_by_key(|(_, rf)| rf.code());

    if axis_cols.is_empty() {
        // No risk-factor columns: a single-row constant table.
        let mut records = reader.records();
        let record = records.next().ok_or_else(|| {
            ProjectionError::InvalidConfiguration(format!("{}: expected exactly one data row", path.display()))
        })??;
        let rate: f64 = record[rate_col]
            .parse()
            .map_err(|_| ProjectionError::InvalidConfiguration(format!("{}: non-numeric rate", path.display())))?;
        return Ok(RateProvider::constant(rate));
    }

    let mut rows: Vec<(Vec<i64>, f64)> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let rate: f64 = record[rate_col]
            .parse()
            .map_err(|_| ProjectionError::InvalidConfiguration(format!("{}: non-numeric rate", path.display())))?;
        let mut key = Vec::with_capacity(axis_cols.len());
        for (col, _) in &axis_cols {
            let v: i64 = record[*col]
                .parse()
                .map_err(|_| ProjectionError::InvalidConfiguration(format!("{}: non-integer axis value", path.display())))?;
            key.push(v);
        }
        rows.push((key, rate));
    }

    let dim = axis_cols.len();
    let mut mins = vec![i64::MAX; dim];
    let mut maxs = vec![i64::MIN; dim];
    for (key, _) in &rows {
        for axis in 0..dim {
            mins[axis] = mins[axis].min(key[axis]);
            maxs[axis] = maxs[axis].max(key[axis]);
        }
    }
    let shape: Vec<usize> = (0..dim).map(|a| (maxs[a] - mins[a] + 1) as usize).collect();
    let expected_rows: usize = shape.iter().product();
    if expected_rows != rows.len() {
        return Err(ProjectionError::InvalidConfiguration(format!(
            "{}: {} rows does not cover the dense grid implied by the observed axis ranges ({} expected)",
            path.display(),
            rows.len(),
            expected_rows
        )));
    }

    let mut strides = vec![1usize; dim];
    for i in (0..dim.saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }

    let mut values = vec![0.0f64; expected_rows];
    let mut seen = vec![false; expected_rows];
    for (key, rate) in &rows {
        let flat: usize = (0..dim).map(|a| strides[a] * (key[a] - mins[a]) as usize).sum();
        if seen[flat] {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "{}: duplicate row for axis combination {:?}",
                path.display(),
                key
            )));
        }
        seen[flat] = true;
        values[flat] = *rate;
    }

    let risk_factors = axis_cols.into_iter().map(|(_, rf)| rf).collect();
    RateProvider::table(risk_factors, shape, mins, values)
}

/// Load a full assumption set from a manifest CSV plus its referenced table files
///
/// The manifest has columns `from_state,to_state,kind,source`. `kind` is
/// either `constant` (in which case `source` is the literal rate) or `table`
/// (in which case `source` is a path, resolved relative to the manifest's
/// parent directory, to a per-cell table CSV as read by [`load_table_csv`]).
pub fn load_assumption_set_csv<P: AsRef<Path>>(manifest_path: P, dimension: usize) -> Result<AssumptionSet> {
    let manifest_path = manifest_path.as_ref();
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut reader = Reader::from_path(manifest_path)?;
    let mut set = AssumptionSet::new(dimension);
    let mut seen_cells: HashMap<(usize, usize), ()> = HashMap::new();

    for row in reader.deserialize() {
        let row: ManifestRow = row?;
        if seen_cells.insert((row.from_state, row.to_state), ()).is_some() {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "manifest declares (from={}, to={}) more than once",
                row.from_state, row.to_state
            )));
        }

        let provider = match row.kind.as_str() {
            "constant" => {
                let rate: f64 = row.source.parse().map_err(|_| {
                    ProjectionError::InvalidConfiguration(format!(
                        "(from={}, to={}): `source` is not numeric for a constant provider",
                        row.from_state, row.to_state
                    ))
                })?;
                RateProvider::constant(rate)
            }
            "table" => load_table_csv(&base_dir.join(&row.source))?,
            other => {
                return Err(ProjectionError::InvalidConfiguration(format!(
                    "(from={}, to={}): unknown provider kind `{other}`",
                    row.from_state, row.to_state
                )))
            }
        };

        set.set_provider(row.from_state, row.to_state, provider)?;
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_factor_name_matching_is_case_insensitive() {
        assert_eq!(risk_factor_by_name("age"), Some(RiskFactor::Age));
        assert_eq!(risk_factor_by_name("CalendarYear"), Some(RiskFactor::CalendarYear));
        assert_eq!(risk_factor_by_name("nonsense"), None);
    }
}
