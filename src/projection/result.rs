//! The dense, time-indexed result matrix a run (or a single record) produces

use crate::error::{ProjectionError, Result};
use crate::time::TimeAxis;

/// Pre-allocated, zero-initialized numeric buffers for one record or one
/// aggregated run. Reset per record, summed across records.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub num_states: usize,
    pub num_timesteps: usize,
    /// `K`: `1 + max(payment_type_index)` observed across the whole run
    pub num_payment_types: usize,
    /// `[t][s]`
    pub state_probs: Vec<Vec<f64>>,
    /// `[t][s]`
    pub state_vols: Vec<Vec<f64>>,
    /// `[t][r * n + c]`
    pub prob_movements: Vec<Vec<f64>>,
    /// `[t][r * n + c]`
    pub vol_movements: Vec<Vec<f64>>,
    /// `[t][payment_type]`
    pub state_cond_payments: Vec<Vec<f64>>,
}

impl RunResult {
    pub fn new(num_states: usize, num_timesteps: usize, num_payment_types: usize) -> Self {
        RunResult {
            num_states,
            num_timesteps,
            num_payment_types,
            state_probs: vec![vec![0.0; num_states]; num_timesteps],
            state_vols: vec![vec![0.0; num_states]; num_timesteps],
            prob_movements: vec![vec![0.0; num_states * num_states]; num_timesteps],
            vol_movements: vec![vec![0.0; num_states * num_states]; num_timesteps],
            state_cond_payments: vec![vec![0.0; num_payment_types]; num_timesteps],
        }
    }

    /// Zero every buffer in place, keeping the same shape
    pub fn reset(&mut self) {
        for row in &mut self.state_probs {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
        for row in &mut self.state_vols {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
        for row in &mut self.prob_movements {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
        for row in &mut self.vol_movements {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
        for row in &mut self.state_cond_payments {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    fn check_shape(&self, other: &RunResult, context: &str) -> Result<()> {
        if self.num_states != other.num_states
            || self.num_timesteps != other.num_timesteps
            || self.num_payment_types != other.num_payment_types
        {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.num_states,
                actual: other.num_states,
                context: context.into(),
            });
        }
        Ok(())
    }

    /// Pointwise-add every buffer of `other` into `self`
    pub fn add_result(&mut self, other: &RunResult) -> Result<()> {
        self.check_shape(other, "RunResult::add_result")?;
        for t in 0..self.num_timesteps {
            for s in 0..self.num_states {
                self.state_probs[t][s] += other.state_probs[t][s];
                self.state_vols[t][s] += other.state_vols[t][s];
            }
            for idx in 0..self.num_states * self.num_states {
                self.prob_movements[t][idx] += other.prob_movements[t][idx];
                self.vol_movements[t][idx] += other.vol_movements[t][idx];
            }
            for p in 0..self.num_payment_types {
                self.state_cond_payments[t][p] += other.state_cond_payments[t][p];
            }
        }
        Ok(())
    }

    /// Column headers in materialized-matrix order
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            "period_start_year".to_string(),
            "period_start_month".to_string(),
            "period_start_day".to_string(),
            "period_end_year".to_string(),
            "period_end_month".to_string(),
            "period_end_day".to_string(),
            "period_days".to_string(),
        ];
        for s in 0..self.num_states {
            headers.push(format!("state_prob_{s}"));
        }
        for r in 0..self.num_states {
            for c in 0..self.num_states {
                headers.push(format!("prob_movement_{r}_{c}"));
            }
        }
        for s in 0..self.num_states {
            headers.push(format!("state_vol_{s}"));
        }
        for r in 0..self.num_states {
            for c in 0..self.num_states {
                headers.push(format!("vol_movement_{r}_{c}"));
            }
        }
        for p in 0..self.num_payment_types {
            headers.push(format!("payment_{p}"));
        }
        headers
    }

    /// Write the labeled matrix: one row per time step, columns per [`headers`](Self::headers)
    pub fn materialize(&self, axis: &TimeAxis) -> Result<Vec<Vec<f64>>> {
        use chrono::Datelike;

        if axis.len() != self.num_timesteps {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.num_timesteps,
                actual: axis.len(),
                context: "RunResult::materialize rows vs time axis length".into(),
            });
        }

        let mut rows = Vec::with_capacity(self.num_timesteps);
        for t in 0..self.num_timesteps {
            let mut row = vec![
                axis.start_dates[t].year() as f64,
                axis.start_dates[t].month() as f64,
                axis.start_dates[t].day() as f64,
                axis.end_dates[t].year() as f64,
                axis.end_dates[t].month() as f64,
                axis.end_dates[t].day() as f64,
                axis.period_lengths[t] as f64,
            ];
            row.extend_from_slice(&self.state_probs[t]);
            row.extend_from_slice(&self.prob_movements[t]);
            row.extend_from_slice(&self.state_vols[t]);
            row.extend_from_slice(&self.vol_movements[t]);
            row.extend_from_slice(&self.state_cond_payments[t]);
            rows.push(row);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_result_is_pointwise() {
        let mut a = RunResult::new(2, 3, 1);
        let mut b = RunResult::new(2, 3, 1);
        a.state_probs[1][0] = 0.5;
        b.state_probs[1][0] = 0.25;
        a.add_result(&b).unwrap();
        assert_eq!(a.state_probs[1][0], 0.75);
    }

    #[test]
    fn add_result_rejects_shape_mismatch() {
        let mut a = RunResult::new(2, 3, 1);
        let b = RunResult::new(3, 3, 1);
        assert!(a.add_result(&b).is_err());
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut r = RunResult::new(2, 2, 1);
        r.state_probs[0][0] = 1.0;
        r.prob_movements[1][2] = 0.3;
        r.reset();
        assert!(r.state_probs.iter().all(|row| row.iter().all(|&v| v == 0.0)));
        assert!(r.prob_movements.iter().all(|row| row.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn headers_len_matches_row_len() {
        let r = RunResult::new(2, 1, 3);
        assert_eq!(r.headers().len(), 7 + 2 + 4 + 2 + 4 + 3);
    }
}
