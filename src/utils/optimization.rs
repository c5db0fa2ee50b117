//! Bounded Nelder-Mead minimization for smoothing-model parameters.
//!
//! SES and Holt-Winters estimate their smoothing coefficients and initial
//! states by minimizing the one-step-ahead SSE with this optimizer. Every
//! trial point is clamped into its box before evaluation, so the objective
//! never sees an out-of-range coefficient.

use std::time::Instant;

/// Outcome of a Nelder-Mead minimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    /// Iterations performed across all restarts.
    pub iterations: usize,
    /// Whether the last run met the convergence tolerance.
    pub converged: bool,
    /// Whether the deadline passed before the search finished.
    pub timed_out: bool,
}

/// Nelder-Mead settings.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Iteration cap per run.
    pub max_iter: usize,
    /// Spread of objective values, relative to the best, that counts as converged.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex edge, relative to each coordinate (default: 0.05).
    pub initial_step: f64,
    /// Fresh simplices built around the incumbent after a run ends (default: 1).
    pub restarts: usize,
    /// Give up and report `timed_out` once this instant has passed.
    pub deadline: Option<Instant>,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-10,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
            restarts: 1,
            deadline: None,
        }
    }
}

/// Minimize `objective` starting from `initial`.
///
/// Non-finite objective values rank as `+inf`, so the simplex walks away
/// from parameter regions where a recursion diverges. After each run a new
/// simplex is built around the best point; restarting stops once a run no
/// longer improves on it.
///
/// # Arguments
/// * `objective` - The objective function to minimize
/// * `initial` - Initial guess for the optimal point
/// * `bounds` - Optional `(min, max)` box for each coordinate
/// * `config` - Configuration parameters
///
/// # Example
/// ```
/// use restock_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
            timed_out: false,
        };
    }

    let finite_or_inf = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let mut best = minimize(&finite_or_inf, &clamp(initial, bounds), bounds, &config);
    let mut iterations = best.iterations;

    for _ in 0..config.restarts {
        if best.timed_out {
            break;
        }
        let run = minimize(&finite_or_inf, &best.optimal_point, bounds, &config);
        iterations += run.iterations;

        let improved = run.optimal_value < best.optimal_value;
        let timed_out = run.timed_out;
        if improved {
            best = run;
        } else {
            best.converged |= run.converged;
            best.timed_out = timed_out;
        }
        if timed_out || !improved {
            break;
        }
    }

    best.iterations = iterations;
    best
}

/// Simplex vertices with their cached objective values.
struct Simplex<'a, F> {
    vertices: Vec<Vec<f64>>,
    values: Vec<f64>,
    objective: &'a F,
    bounds: Option<&'a [(f64, f64)]>,
}

impl<'a, F> Simplex<'a, F>
where
    F: Fn(&[f64]) -> f64,
{
    /// One vertex at `start`, plus one offset along each axis. An offset
    /// that would leave the box is taken in the opposite direction.
    fn around(
        start: &[f64],
        step: f64,
        objective: &'a F,
        bounds: Option<&'a [(f64, f64)]>,
    ) -> Self {
        let mut vertices = vec![start.to_vec()];
        for (i, &x) in start.iter().enumerate() {
            let delta = if x.abs() > 1e-10 { step * x.abs() } else { step };
            let mut vertex = start.to_vec();
            vertex[i] = x + delta;
            let mut vertex = clamp(&vertex, bounds);
            if vertex[i] == x {
                vertex[i] = x - delta;
                vertex = clamp(&vertex, bounds);
            }
            vertices.push(vertex);
        }
        let values = vertices.iter().map(|v| objective(v)).collect();

        Self {
            vertices,
            values,
            objective,
            bounds,
        }
    }

    /// Indices of the best, second-worst and worst vertices.
    fn ranks(&self) -> (usize, usize, usize) {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]));
        let n = order.len() - 1;
        (order[0], order[n - 1], order[n])
    }

    /// Mean of every vertex except `skip`.
    fn centroid(&self, skip: usize) -> Vec<f64> {
        let dims = self.vertices[0].len();
        let count = (self.vertices.len() - 1) as f64;
        let mut centroid = vec![0.0; dims];
        for (_, vertex) in self.vertices.iter().enumerate().filter(|(i, _)| *i != skip) {
            for (c, x) in centroid.iter_mut().zip(vertex) {
                *c += x;
            }
        }
        centroid.iter_mut().for_each(|c| *c /= count);
        centroid
    }

    /// Evaluate the bounded point `from + t·(towards − from)`.
    fn probe(&self, from: &[f64], towards: &[f64], t: f64) -> (Vec<f64>, f64) {
        let point: Vec<f64> = from
            .iter()
            .zip(towards)
            .map(|(a, b)| a + t * (b - a))
            .collect();
        let point = clamp(&point, self.bounds);
        let value = (self.objective)(&point);
        (point, value)
    }

    fn replace(&mut self, index: usize, (point, value): (Vec<f64>, f64)) {
        self.vertices[index] = point;
        self.values[index] = value;
    }

    /// Pull every vertex towards `keep` by `sigma`.
    fn shrink(&mut self, keep: usize, sigma: f64) {
        let anchor = &self.vertices[keep];
        let shrunk: Vec<(usize, (Vec<f64>, f64))> = self
            .vertices
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != keep)
            .map(|(i, vertex)| (i, self.probe(anchor, vertex, sigma)))
            .collect();
        for (i, probed) in shrunk {
            self.replace(i, probed);
        }
    }

    /// Largest distance from any vertex to `centroid`.
    fn spread(&self, centroid: &[f64]) -> f64 {
        self.vertices
            .iter()
            .map(|v| {
                v.iter()
                    .zip(centroid)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max)
    }

    /// Best vertex; ties go to the lowest index.
    fn into_best(mut self) -> (Vec<f64>, f64) {
        let best = self
            .values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map_or(0, |(i, _)| i);
        let value = self.values[best];
        (self.vertices.swap_remove(best), value)
    }
}

/// A single Nelder-Mead run from `start`.
fn minimize<F>(
    objective: &F,
    start: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let mut simplex = Simplex::around(start, config.initial_step, objective, bounds);
    let mut iterations = 0;
    let mut converged = false;
    let mut timed_out = false;

    while iterations < config.max_iter {
        if config.deadline.is_some_and(|d| Instant::now() >= d) {
            timed_out = true;
            break;
        }
        iterations += 1;

        let (best, second_worst, worst) = simplex.ranks();
        let f_best = simplex.values[best];
        let f_second = simplex.values[second_worst];
        let f_worst = simplex.values[worst];

        if f_worst - f_best <= config.tolerance * (1.0 + f_best.abs()) {
            converged = true;
            break;
        }
        let centroid = simplex.centroid(worst);
        if simplex.spread(&centroid) < config.tolerance {
            converged = true;
            break;
        }

        let worst_point = simplex.vertices[worst].clone();
        let reflected = simplex.probe(&worst_point, &centroid, 1.0 + config.alpha);

        if reflected.1 < f_best {
            let expanded = simplex.probe(&centroid, &reflected.0, config.gamma);
            let keep = if expanded.1 < reflected.1 {
                expanded
            } else {
                reflected
            };
            simplex.replace(worst, keep);
            continue;
        }
        if reflected.1 < f_second {
            simplex.replace(worst, reflected);
            continue;
        }

        let contracted = if reflected.1 < f_worst {
            let outside = simplex.probe(&centroid, &reflected.0, config.rho);
            (outside.1 <= reflected.1).then_some(outside)
        } else {
            let inside = simplex.probe(&centroid, &worst_point, config.rho);
            (inside.1 < f_worst).then_some(inside)
        };
        match contracted {
            Some(point) => simplex.replace(worst, point),
            None => simplex.shrink(best, config.sigma),
        }
    }

    let (optimal_point, optimal_value) = simplex.into_best();
    NelderMeadResult {
        optimal_point,
        optimal_value,
        iterations,
        converged,
        timed_out,
    }
}

/// Clamp each coordinate into its `(min, max)` pair, if any.
fn clamp(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| b.get(i).map_or(x, |&(lo, hi)| x.clamp(lo, hi)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn ses_sse(data: &[f64], alpha: f64, level: f64) -> f64 {
        let mut level = level;
        let mut sse = 0.0;
        for &y in data {
            sse += (y - level).powi(2);
            level = alpha * y + (1.0 - alpha) * level;
        }
        sse
    }

    #[test]
    fn finds_interior_minimum() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert!(!result.timed_out);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_value, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn stops_at_active_bound() {
        // Unconstrained optimum of (x-5)^2 lies outside [0, 3].
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn start_on_upper_bound_steps_inward() {
        let result = nelder_mead(
            |x| (x[0] - 0.2).powi(2),
            &[1.0],
            Some(&[(0.0, 1.0)]),
            NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 0.2, epsilon = 1e-4);
    }

    #[test]
    fn estimates_smoothing_alpha_and_level() {
        let data = [10.0, 12.0, 11.0, 13.0, 14.0, 13.0, 15.0, 16.0];
        let result = nelder_mead(
            |p| ses_sse(&data, p[0], p[1]),
            &[0.5, 10.0],
            Some(&[(0.0001, 0.9999), (10.0, 16.0)]),
            NelderMeadConfig::default(),
        );

        assert!(result.optimal_point[0] > 0.0001 && result.optimal_point[0] < 0.9999);
        // Never worse than the starting guess.
        assert!(result.optimal_value <= ses_sse(&data, 0.5, 10.0));
    }

    #[test]
    fn non_finite_objective_is_avoided() {
        // Undefined for x < 0; minimum at x = 1.
        let result = nelder_mead(
            |x| {
                if x[0] < 0.0 {
                    f64::NAN
                } else {
                    (x[0] - 1.0).powi(2)
                }
            },
            &[0.5],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn past_deadline_reports_timeout() {
        let config = NelderMeadConfig {
            deadline: Some(Instant::now() - Duration::from_millis(1)),
            ..Default::default()
        };
        let result = nelder_mead(|x| x[0] * x[0], &[3.0], None, config);

        assert!(result.timed_out);
        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn iteration_cap_is_not_convergence() {
        let config = NelderMeadConfig {
            max_iter: 3,
            restarts: 0,
            ..Default::default()
        };
        let result = nelder_mead(|x| (x[0] - 40.0).powi(2), &[1.0], None, config);

        assert!(!result.converged);
        assert!(!result.timed_out);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let f = |x: &[f64]| (x[0] - 0.3).powi(2) + (x[1] + 1.2).powi(4) + x[0] * x[1];
        let a = nelder_mead(f, &[0.5, 0.5], None, NelderMeadConfig::default());
        let b = nelder_mead(f, &[0.5, 0.5], None, NelderMeadConfig::default());

        assert_eq!(a.optimal_point, b.optimal_point);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn empty_start_returns_nan() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());

        assert!(!result.converged);
        assert!(result.optimal_value.is_nan());
    }

    #[test]
    fn restarts_never_make_things_worse() {
        let f = |x: &[f64]| (x[0] - 1.0).powi(2) + 10.0 * (x[1] - x[0].powi(2)).powi(2);
        let once = nelder_mead(
            f,
            &[-1.0, 2.0],
            None,
            NelderMeadConfig {
                restarts: 0,
                ..Default::default()
            },
        );
        let twice = nelder_mead(
            f,
            &[-1.0, 2.0],
            None,
            NelderMeadConfig {
                restarts: 3,
                ..Default::default()
            },
        );

        assert!(twice.optimal_value <= once.optimal_value);
        assert!(twice.iterations >= once.iterations);
    }
}
