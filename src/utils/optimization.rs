//! Derivative-free minimisation used for ARIMA parameter estimation.

use std::cmp::Ordering;

/// Outcome of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the simplex collapsed below the tolerance.
    pub converged: bool,
}

/// Nelder-Mead tuning.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Stop once the spread of objective values (or of the simplex) falls below this.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Relative size of the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Simplex vertices with their objective values, clamped to optional box bounds.
struct Simplex<'a, F> {
    vertices: Vec<Vec<f64>>,
    values: Vec<f64>,
    bounds: Option<&'a [(f64, f64)]>,
    objective: F,
}

impl<'a, F> Simplex<'a, F>
where
    F: Fn(&[f64]) -> f64,
{
    fn around(initial: &[f64], step: f64, bounds: Option<&'a [(f64, f64)]>, objective: F) -> Self {
        let mut vertices = vec![clamp(initial.to_vec(), bounds)];
        for i in 0..initial.len() {
            let mut vertex = initial.to_vec();
            vertex[i] += if initial[i].abs() > 1e-10 {
                step * initial[i].abs()
            } else {
                step
            };
            vertices.push(clamp(vertex, bounds));
        }
        let values = vertices.iter().map(|v| objective(v)).collect();
        Self {
            vertices,
            values,
            bounds,
            objective,
        }
    }

    fn evaluate(&self, point: Vec<f64>) -> (Vec<f64>, f64) {
        let point = clamp(point, self.bounds);
        let value = (self.objective)(&point);
        (point, value)
    }

    fn replace(&mut self, index: usize, (point, value): (Vec<f64>, f64)) {
        self.vertices[index] = point;
        self.values[index] = value;
    }

    /// Indices ordered from best to worst.
    fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| {
            self.values[a]
                .partial_cmp(&self.values[b])
                .unwrap_or(Ordering::Equal)
        });
        order
    }

    fn centroid_without(&self, excluded: usize) -> Vec<f64> {
        let dims = self.vertices[0].len();
        let count = (self.vertices.len() - 1) as f64;
        let mut centroid = vec![0.0; dims];
        for (_, vertex) in self.vertices.iter().enumerate().filter(|(i, _)| *i != excluded) {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v / count;
            }
        }
        centroid
    }

    fn shrink_towards(&mut self, best: usize, sigma: f64) {
        let anchor = self.vertices[best].clone();
        for i in 0..self.vertices.len() {
            if i == best {
                continue;
            }
            let moved = along(&anchor, &self.vertices[i], sigma);
            let evaluated = self.evaluate(moved);
            self.replace(i, evaluated);
        }
    }
}

/// Minimise `objective` starting from `initial`, optionally inside box `bounds`.
///
/// # Example
/// ```
/// use avocado_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] + 1.0).abs() < 0.01);
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
        };
    }

    let mut simplex = Simplex::around(initial, config.initial_step, bounds, objective);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let order = simplex.ranking();
        let best = order[0];
        let worst = order[order.len() - 1];
        let second_worst = order[order.len() - 2];

        let centroid = simplex.centroid_without(worst);
        let spread = simplex.values[worst] - simplex.values[best];
        let radius = simplex
            .vertices
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max);
        if spread < config.tolerance || radius < config.tolerance {
            converged = true;
            break;
        }

        // reflect the worst vertex through the centroid
        let reflected = simplex.evaluate(along(&centroid, &simplex.vertices[worst], -config.alpha));

        if reflected.1 < simplex.values[best] {
            let expanded = simplex.evaluate(along(&centroid, &reflected.0, config.gamma));
            if expanded.1 < reflected.1 {
                simplex.replace(worst, expanded);
            } else {
                simplex.replace(worst, reflected);
            }
            continue;
        }

        if reflected.1 < simplex.values[second_worst] {
            simplex.replace(worst, reflected);
            continue;
        }

        let contracted = if reflected.1 < simplex.values[worst] {
            let outside = simplex.evaluate(along(&centroid, &reflected.0, config.rho));
            (outside.1 <= reflected.1).then_some(outside)
        } else {
            let inside = simplex.evaluate(along(&centroid, &simplex.vertices[worst], config.rho));
            (inside.1 < simplex.values[worst]).then_some(inside)
        };

        match contracted {
            Some(point) => simplex.replace(worst, point),
            None => simplex.shrink_towards(best, config.sigma),
        }
    }

    let best = simplex.ranking()[0];
    NelderMeadResult {
        optimal_point: simplex.vertices[best].clone(),
        optimal_value: simplex.values[best],
        iterations,
        converged,
    }
}

/// `origin + t * (towards - origin)`.
fn along(origin: &[f64], towards: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(towards)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn clamp(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn finds_quadratic_minimum() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn rosenbrock_valley() {
        let config = NelderMeadConfig {
            max_iter: 5000,
            tolerance: 1e-12,
            ..Default::default()
        };
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[-0.5, 0.5],
            None,
            config,
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn respects_bounds() {
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            NelderMeadConfig::default(),
        );
        assert_relative_eq!(result.optimal_point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn recovers_ar1_coefficient_by_least_squares() {
        let mut y = vec![1.0];
        for t in 1..200 {
            let shock = ((t * 7919) % 97) as f64 / 97.0 - 0.5;
            y.push(0.6 * y[t - 1] + shock);
        }
        let sse = |params: &[f64]| {
            (1..y.len())
                .map(|t| (y[t] - params[0] * y[t - 1]).powi(2))
                .sum::<f64>()
        };

        let result = nelder_mead(sse, &[0.1], Some(&[(-0.99, 0.99)]), Default::default());
        assert!(result.optimal_point[0] > 0.4 && result.optimal_point[0] < 0.8);
    }

    #[test]
    fn empty_start_point() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());
        assert!(!result.converged);
        assert!(result.optimal_value.is_nan());
    }
}
