//! Pegasus root finder for monotone one-dimensional relations.
//!
//! Modified regula falsi: after each step that keeps the same bracket end,
//! that end's function value is scaled by `f1 / (f1 + f2)`. This keeps the
//! superlinear convergence of the secant method while never losing the
//! bracket.

/// Iteration limits for [`pegasus`].
#[derive(Clone, Copy, Debug)]
pub struct PegasusConfig {
    /// Absolute tolerance on the function value.
    pub f_tol: f64,
    /// Absolute tolerance on the bracket width.
    pub x_tol: f64,
    /// Maximum number of iterations.
    pub max_iter: usize,
}

impl Default for PegasusConfig {
    fn default() -> Self {
        Self {
            f_tol: 1e-12,
            x_tol: 1e-12,
            max_iter: 100,
        }
    }
}

/// Find a root of `f` in `[x0, x1]`, where `f(x0)` and `f(x1)` have opposite signs.
///
/// Returns the best estimate after `max_iter` iterations if the tolerances are
/// not met earlier. If the bracket is not valid, the end with the smaller
/// absolute function value is returned.
pub fn pegasus<F>(f: F, mut x0: f64, mut x1: f64, config: PegasusConfig) -> f64
where
    F: Fn(f64) -> f64,
{
    let mut f0 = f(x0);
    let mut f1 = f(x1);
    if f0 == 0.0 {
        return x0;
    }
    if f1 == 0.0 {
        return x1;
    }
    if f0.signum() == f1.signum() {
        return if f0.abs() < f1.abs() { x0 } else { x1 };
    }

    for _ in 0..config.max_iter {
        let x2 = x1 - f1 * (x1 - x0) / (f1 - f0);
        let f2 = f(x2);

        if f2.abs() <= config.f_tol {
            return x2;
        }
        if f2.signum() == f1.signum() {
            f0 *= f1 / (f1 + f2);
        } else {
            x0 = x1;
            f0 = f1;
        }
        x1 = x2;
        f1 = f2;

        if (x1 - x0).abs() <= config.x_tol {
            break;
        }
    }
    x1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_root() {
        let root = pegasus(|x| x * x - 2.0, 0.0, 2.0, PegasusConfig::default());
        assert!((root - 2.0_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_cubic() {
        let root = pegasus(|x| x * x * x - 8.0, 0.0, 10.0, PegasusConfig::default());
        assert!((root - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_root_at_bracket_end() {
        assert_eq!(pegasus(|x| x - 1.0, 1.0, 3.0, PegasusConfig::default()), 1.0);
    }

    #[test]
    fn test_invalid_bracket() {
        let x = pegasus(|x| x + 10.0, 0.0, 1.0, PegasusConfig::default());
        assert_eq!(x, 0.0);
    }
}
