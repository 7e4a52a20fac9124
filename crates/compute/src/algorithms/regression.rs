use riskpulse_core::{Result, RiskError};

/// Fewest points that determine a line.
pub const MIN_POINTS: usize = 2;

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; 1.0 when `y` has no variance.
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a least-squares line through `(x, y)` points.
///
/// Fails with `InsufficientHistory` for fewer than two points and with
/// `DegenerateInput` when all `x` are equal or a value is not finite.
pub fn fit_line(points: &[(f64, f64)]) -> Result<LinearFit> {
    if points.len() < MIN_POINTS {
        return Err(RiskError::InsufficientHistory {
            required: MIN_POINTS,
            actual: points.len(),
        });
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(RiskError::DegenerateInput(
            "history contains a non-finite value".to_string(),
        ));
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in points {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }

    if sxx <= f64::EPSILON * n {
        return Err(RiskError::DegenerateInput(
            "all time offsets are identical".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (x, y) in points {
        let residual = y - (intercept + slope * x);
        ss_res += residual * residual;
        ss_tot += (y - mean_y) * (y - mean_y);
    }
    let r_squared = if ss_tot <= f64::EPSILON {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}
