//! Fixed-step classical Runge-Kutta (RK4) integrator.
//!
//! The stepper owns its stage buffers, sized once at construction, so a
//! step performs no heap allocation. Inputs are held constant across the
//! four sub-stages (zero-order hold): controller action only changes at
//! step boundaries.

/// RK4 stepper with pre-allocated stage scratch.
///
/// Not internally shareable across threads; each owner gets its own
/// scratch. Global accuracy is O(dt⁴) for smooth right-hand sides.
#[derive(Debug, Clone)]
pub struct Rk4Stepper {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
}

impl Rk4Stepper {
    /// Create a stepper for a state vector of length `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            tmp: vec![0.0; dim],
        }
    }

    /// State dimension this stepper was sized for.
    pub fn dim(&self) -> usize {
        self.k1.len()
    }

    /// Advance `x` in place by one step of size `dt`.
    ///
    /// `f(t, x, u, dxdt)` evaluates the derivative into `dxdt`. `u` is
    /// passed through unchanged to every sub-stage. Identical inputs give
    /// bit-identical results on a given platform.
    pub fn step<F>(&mut self, t: f64, dt: f64, x: &mut [f64], u: &[f64], mut f: F)
    where
        F: FnMut(f64, &[f64], &[f64], &mut [f64]),
    {
        let n = x.len();
        debug_assert_eq!(n, self.dim());
        let half_dt = 0.5 * dt;

        f(t, x, u, &mut self.k1);

        for i in 0..n {
            self.tmp[i] = x[i] + half_dt * self.k1[i];
        }
        f(t + half_dt, &self.tmp, u, &mut self.k2);

        for i in 0..n {
            self.tmp[i] = x[i] + half_dt * self.k2[i];
        }
        f(t + half_dt, &self.tmp, u, &mut self.k3);

        for i in 0..n {
            self.tmp[i] = x[i] + dt * self.k3[i];
        }
        f(t + dt, &self.tmp, u, &mut self.k4);

        let dt_over_6 = dt / 6.0;
        for i in 0..n {
            x[i] += dt_over_6 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
