use lcc_core::errors::{ErrorInfo, LccError};
use statrs::distribution::{ContinuousCDF, StudentsT};

fn standard_t(df: usize) -> Result<StudentsT, LccError> {
    if df == 0 {
        return Err(LccError::Stats(ErrorInfo::new(
            "lcc_stats.t_df",
            "student t quantile requires at least one degree of freedom",
        )));
    }
    StudentsT::new(0.0, 1.0, df as f64).map_err(|err| {
        LccError::Stats(
            ErrorInfo::new("lcc_stats.t_distribution", "invalid student t distribution")
                .with_context("df", df.to_string())
                .with_hint(err.to_string()),
        )
    })
}

/// Cumulative distribution function of the standard Student's t.
pub fn t_cdf(t: f64, df: usize) -> Result<f64, LccError> {
    Ok(standard_t(df)?.cdf(t))
}

/// Quantile function (inverse CDF) of the standard Student's t.
///
/// Returns the `t` such that `P(T <= t) = p` for `df` degrees of freedom.
///
/// # Errors
///
/// [`LccError::Stats`] when `df == 0` or `p` lies outside the open interval
/// `(0, 1)`.
pub fn t_quantile(p: f64, df: usize) -> Result<f64, LccError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(LccError::Stats(
            ErrorInfo::new("lcc_stats.t_probability", "probability must lie in (0, 1)")
                .with_context("p", p.to_string()),
        ));
    }
    Ok(standard_t(df)?.inverse_cdf(p))
}
