//! Natural cubic spline interpolation

/// Natural cubic spline through strictly increasing knots
#[derive(Debug, Clone)]
pub struct NaturalCubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots (zero at both ends)
    m: Vec<f64>,
}

impl NaturalCubicSpline {
    /// Build a spline; returns `None` for fewer than two knots or
    /// non-increasing abscissae.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Option<Self> {
        let n = x.len();
        if n < 2 || y.len() != n {
            return None;
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }

        let mut m = vec![0.0; n];
        if n > 2 {
            // Tridiagonal system for interior second derivatives (Thomas algorithm)
            let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
            let interior = n - 2;
            let mut diag = vec![0.0; interior];
            let mut upper = vec![0.0; interior];
            let mut rhs = vec![0.0; interior];

            for i in 0..interior {
                diag[i] = 2.0 * (h[i] + h[i + 1]);
                upper[i] = h[i + 1];
                rhs[i] = 6.0 * ((y[i + 2] - y[i + 1]) / h[i + 1] - (y[i + 1] - y[i]) / h[i]);
            }

            for i in 1..interior {
                let w = h[i] / diag[i - 1];
                diag[i] -= w * upper[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }

            m[interior] = rhs[interior - 1] / diag[interior - 1];
            for i in (0..interior - 1).rev() {
                m[i + 1] = (rhs[i] - upper[i] * m[i + 2]) / diag[i];
            }
        }

        Some(Self { x, y, m })
    }

    /// Evaluate inside the knot span; outside it the end values are held.
    pub fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();
        if t <= self.x[0] {
            return self.y[0];
        }
        if t >= self.x[n - 1] {
            return self.y[n - 1];
        }

        let hi = self.x.partition_point(|&xk| xk <= t).min(n - 1);
        let lo = hi - 1;
        let h = self.x[hi] - self.x[lo];
        let a = (self.x[hi] - t) / h;
        let b = (t - self.x[lo]) / h;

        a * self.y[lo]
            + b * self.y[hi]
            + ((a * a * a - a) * self.m[lo] + (b * b * b - b) * self.m[hi]) * h * h / 6.0
    }

    pub fn knots(&self) -> (&[f64], &[f64]) {
        (&self.x, &self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_passes_through_knots() {
        let x = vec![0.0, 1.0, 2.5, 4.0];
        let y = vec![1.0, -1.0, 0.5, 2.0];
        let spline = NaturalCubicSpline::new(x.clone(), y.clone()).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_abs_diff_eq!(spline.eval(*xi), *yi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_data_is_reproduced() {
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
        let spline = NaturalCubicSpline::new(x, y).unwrap();
        assert_abs_diff_eq!(spline.eval(2.3), 3.6, epsilon = 1e-12);
    }

    #[test]
    fn test_holds_end_values() {
        let spline = NaturalCubicSpline::new(vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 7.0]).unwrap();
        assert_eq!(spline.eval(-10.0), 4.0);
        assert_eq!(spline.eval(10.0), 7.0);
    }

    #[test]
    fn test_rejects_unsorted_knots() {
        assert!(NaturalCubicSpline::new(vec![0.0, 0.0, 1.0], vec![0.0; 3]).is_none());
        assert!(NaturalCubicSpline::new(vec![0.0], vec![0.0]).is_none());
    }
}
