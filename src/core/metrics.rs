//! Performance metrics over equity curves

/// Maximum drawdown of an equity curve, as a fraction `<= 0`
///
/// Tracks the running peak and returns the most negative `(equity - peak) / peak`.
/// While the running peak is `<= 0` the ratio is undefined and contributes 0.
/// Non-finite points are skipped.
///
/// ```
/// use spread_paper::core::metrics::max_drawdown;
/// assert_eq!(max_drawdown([1000.0, 1200.0, 900.0]), -0.25);
/// ```
pub fn max_drawdown<I>(curve: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut peak = f64::NEG_INFINITY;
    let mut mdd = 0.0_f64;

    for equity in curve.into_iter().filter(|e| e.is_finite()) {
        peak = peak.max(equity);
        if peak > 0.0 {
            mdd = mdd.min((equity - peak) / peak);
        }
    }

    mdd
}
