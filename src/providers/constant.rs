//! A rate provider that returns the same scalar regardless of risk factors

/// A provider with no risk-factor dependency at all
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantProvider {
    pub rate: f64,
}

impl ConstantProvider {
    pub fn new(rate: f64) -> Self {
        ConstantProvider { rate }
    }
}
