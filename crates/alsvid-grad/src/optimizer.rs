//! Classical optimizer drivers over the differentiators.
//!
//! Each driver minimizes an energy functional through caller-supplied
//! closures, so the same loop runs against any register realization or a
//! plain test function. A long-running optimization is cancellable between
//! iterations through a shared flag; non-finite energies terminate the
//! loop and return the best parameters seen so far with a flag set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alsvid_engine::SimResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    /// Lowest energy observed.
    pub best_energy: f64,
    /// Parameters at the lowest observed energy.
    pub best_params: Vec<f64>,
    /// Iterations executed.
    pub iterations: usize,
    /// True if the gradient (or energy) tolerance was met.
    pub converged: bool,
    /// True if a non-finite energy terminated the loop early.
    pub aborted_non_finite: bool,
    /// True if the cancel flag stopped the loop.
    pub cancelled: bool,
    /// Energy per iteration.
    pub energy_history: Vec<f64>,
}

impl OptimizeOutcome {
    fn new(initial: &[f64]) -> Self {
        Self {
            best_energy: f64::INFINITY,
            best_params: initial.to_vec(),
            iterations: 0,
            converged: false,
            aborted_non_finite: false,
            cancelled: false,
            energy_history: vec![],
        }
    }

    fn record(&mut self, energy: f64, params: &[f64]) {
        self.energy_history.push(energy);
        if energy < self.best_energy {
            self.best_energy = energy;
            self.best_params = params.to_vec();
        }
    }
}

fn is_cancelled(flag: Option<&Arc<AtomicBool>>) -> bool {
    flag.is_some_and(|f| f.load(Ordering::Relaxed))
}

/// Plain gradient descent: θ ← θ − η·∇E.
#[derive(Debug, Clone)]
pub struct GradientDescent {
    learning_rate: f64,
    max_iterations: usize,
    gradient_tolerance: f64,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self::new()
    }
}

impl GradientDescent {
    /// Defaults: η = 0.1, 100 iterations, gradient tolerance 1e-6.
    pub fn new() -> Self {
        Self {
            learning_rate: 0.1,
            max_iterations: 100,
            gradient_tolerance: 1e-6,
            cancel: None,
        }
    }

    /// Set the learning rate η.
    #[must_use]
    pub fn with_learning_rate(mut self, eta: f64) -> Self {
        self.learning_rate = eta;
        self
    }

    /// Set the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Converge when the largest gradient component drops below `tol`.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.gradient_tolerance = tol;
        self
    }

    /// Cooperative cancellation, checked at the top of each iteration.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Minimize `energy` using `gradient`, starting from `initial`.
    pub fn minimize<E, G>(
        &self,
        mut energy: E,
        mut gradient: G,
        initial: Vec<f64>,
    ) -> SimResult<OptimizeOutcome>
    where
        E: FnMut(&[f64]) -> SimResult<f64>,
        G: FnMut(&[f64]) -> SimResult<Vec<f64>>,
    {
        let mut theta = initial;
        let mut outcome = OptimizeOutcome::new(&theta);

        for iteration in 0..self.max_iterations {
            if is_cancelled(self.cancel.as_ref()) {
                outcome.cancelled = true;
                break;
            }
            outcome.iterations = iteration + 1;

            let e = energy(&theta)?;
            if !e.is_finite() {
                outcome.aborted_non_finite = true;
                break;
            }
            outcome.record(e, &theta);
            debug!(iteration, energy = e, "gradient-descent step");

            let g = gradient(&theta)?;
            let largest = g.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
            if largest < self.gradient_tolerance {
                outcome.converged = true;
                break;
            }
            for (t, gi) in theta.iter_mut().zip(g.iter()) {
                *t -= self.learning_rate * gi;
            }
        }
        Ok(outcome)
    }
}

/// Adam: first/second moment estimates with bias correction.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    max_iterations: usize,
    gradient_tolerance: f64,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for Adam {
    fn default() -> Self {
        Self::new()
    }
}

impl Adam {
    /// Defaults: η = 0.01, β₁ = 0.9, β₂ = 0.999, ε = 1e-8.
    pub fn new() -> Self {
        Self {
            learning_rate: 0.01,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            max_iterations: 100,
            gradient_tolerance: 1e-6,
            cancel: None,
        }
    }

    /// Set the learning rate η.
    #[must_use]
    pub fn with_learning_rate(mut self, eta: f64) -> Self {
        self.learning_rate = eta;
        self
    }

    /// Override the moment decay rates.
    #[must_use]
    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    /// Set the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Converge when the largest gradient component drops below `tol`.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.gradient_tolerance = tol;
        self
    }

    /// Cooperative cancellation, checked at the top of each iteration.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Minimize `energy` using `gradient`, starting from `initial`.
    pub fn minimize<E, G>(
        &self,
        mut energy: E,
        mut gradient: G,
        initial: Vec<f64>,
    ) -> SimResult<OptimizeOutcome>
    where
        E: FnMut(&[f64]) -> SimResult<f64>,
        G: FnMut(&[f64]) -> SimResult<Vec<f64>>,
    {
        let mut theta = initial;
        let mut outcome = OptimizeOutcome::new(&theta);
        let mut m = vec![0.0; theta.len()];
        let mut v = vec![0.0; theta.len()];

        for iteration in 0..self.max_iterations {
            if is_cancelled(self.cancel.as_ref()) {
                outcome.cancelled = true;
                break;
            }
            outcome.iterations = iteration + 1;

            let e = energy(&theta)?;
            if !e.is_finite() {
                outcome.aborted_non_finite = true;
                break;
            }
            outcome.record(e, &theta);
            debug!(iteration, energy = e, "adam step");

            let g = gradient(&theta)?;
            let largest = g.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
            if largest < self.gradient_tolerance {
                outcome.converged = true;
                break;
            }

            let t = (iteration + 1) as i32;
            let bias1 = 1.0 - self.beta1.powi(t);
            let bias2 = 1.0 - self.beta2.powi(t);
            for i in 0..theta.len() {
                m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g[i];
                v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g[i] * g[i];
                let m_hat = m[i] / bias1;
                let v_hat = v[i] / bias2;
                theta[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
        Ok(outcome)
    }
}

/// SPSA: simultaneous-perturbation stochastic approximation.
///
/// Two energy evaluations per iteration regardless of dimension, with gain
/// sequences aₖ = a/(k+1+A)^α and cₖ = c/(k+1)^γ and Bernoulli ±1
/// perturbation directions from a seeded RNG.
#[derive(Debug, Clone)]
pub struct Spsa {
    a: f64,
    c: f64,
    alpha: f64,
    gamma: f64,
    stability: f64,
    max_iterations: usize,
    energy_tolerance: f64,
    seed: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for Spsa {
    fn default() -> Self {
        Self::new()
    }
}

impl Spsa {
    /// Defaults: a = 0.1, c = 0.1, α = 0.602, γ = 0.101, A = 10.
    pub fn new() -> Self {
        Self {
            a: 0.1,
            c: 0.1,
            alpha: 0.602,
            gamma: 0.101,
            stability: 10.0,
            max_iterations: 200,
            energy_tolerance: 0.0,
            seed: 0,
            cancel: None,
        }
    }

    /// Set the step-size gain a.
    #[must_use]
    pub fn with_step_size(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    /// Set the perturbation gain c.
    #[must_use]
    pub fn with_perturbation(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Converge when the averaged two-point energy stops moving by more
    /// than `tol` between iterations. Zero disables the check.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.energy_tolerance = tol;
        self
    }

    /// Seed the perturbation RNG.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cooperative cancellation, checked at the top of each iteration.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Minimize `energy` starting from `initial`.
    pub fn minimize<E>(&self, mut energy: E, initial: Vec<f64>) -> SimResult<OptimizeOutcome>
    where
        E: FnMut(&[f64]) -> SimResult<f64>,
    {
        let mut theta = initial;
        let mut outcome = OptimizeOutcome::new(&theta);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut previous = f64::INFINITY;

        for k in 0..self.max_iterations {
            if is_cancelled(self.cancel.as_ref()) {
                outcome.cancelled = true;
                break;
            }
            outcome.iterations = k + 1;

            let ak = self.a / (k as f64 + 1.0 + self.stability).powf(self.alpha);
            let ck = self.c / (k as f64 + 1.0).powf(self.gamma);
            let delta: Vec<f64> = (0..theta.len())
                .map(|_| if rng.r#gen::<bool>() { 1.0 } else { -1.0 })
                .collect();

            let plus: Vec<f64> = theta.iter().zip(&delta).map(|(t, d)| t + ck * d).collect();
            let minus: Vec<f64> = theta.iter().zip(&delta).map(|(t, d)| t - ck * d).collect();
            let e_plus = energy(&plus)?;
            let e_minus = energy(&minus)?;
            if !e_plus.is_finite() || !e_minus.is_finite() {
                outcome.aborted_non_finite = true;
                break;
            }
            outcome.record(e_plus, &plus);
            outcome.record(e_minus, &minus);
            debug!(iteration = k, e_plus, e_minus, "spsa step");

            let slope = (e_plus - e_minus) / (2.0 * ck);
            for (t, d) in theta.iter_mut().zip(&delta) {
                *t -= ak * slope * d;
            }

            let midpoint = 0.5 * (e_plus + e_minus);
            if self.energy_tolerance > 0.0 && (midpoint - previous).abs() < self.energy_tolerance
            {
                outcome.converged = true;
                break;
            }
            previous = midpoint;
        }
        Ok(outcome)
    }
}
