use crate::{SfError, SfResult};

pub fn ensure_finite(v: f64, what: &'static str) -> SfResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SfError::NonFinite { what, value: v })
    }
}

/// Check every entry of a slice, reporting the first non-finite value.
pub fn ensure_all_finite(values: &[f64], what: &'static str) -> SfResult<()> {
    for &v in values {
        ensure_finite(v, what)?;
    }
    Ok(())
}

/// Infinity norm (max absolute entry). NaN entries propagate as NaN.
pub fn inf_norm(values: &[f64]) -> f64 {
    let mut norm: f64 = 0.0;
    for &v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        norm = norm.max(v.abs());
    }
    norm
}
