//! Differencing and integration for the I part of ARIMA.

use crate::utils::stats::variance;

/// Difference `series` `d` times.
///
/// Each pass shortens the series by one value.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d` differences of a forecast made on the differenced scale.
///
/// `original` is the undifferenced history the forecast continues from;
/// each level is seeded with the last value of `original` differenced to
/// that level.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    (0..d).rev().fold(differenced.to_vec(), |current, level| {
        let seed = difference(original, level).last().copied().unwrap_or(0.0);
        current
            .iter()
            .scan(seed, |acc, &step| {
                *acc += step;
                Some(*acc)
            })
            .collect()
    })
}

/// Coefficients of `(1 - B)^d`, lowest power first.
pub(crate) fn difference_polynomial(d: usize) -> Vec<f64> {
    (0..d).fold(vec![1.0], |poly, _| multiply(&poly, &[1.0, -1.0]))
}

/// Product of two polynomials given lowest power first.
pub(crate) fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Suggest a differencing order (0, 1 or 2) with a variance-ratio test.
///
/// A difference is taken when it cuts the sample variance by at least 10%.
pub fn suggest_differencing(series: &[f64]) -> usize {
    if series.len() < 3 {
        return 0;
    }

    let var_0 = variance(series);
    let diff_1 = difference(series, 1);
    let var_1 = variance(&diff_1);
    if !(var_0 > 0.0 && var_1 / var_0 < 0.9) {
        return 0;
    }

    let diff_2 = difference(&diff_1, 1);
    if diff_2.len() >= 2 {
        let var_2 = variance(&diff_2);
        if var_2 / var_1 < 0.9 && var_2 < var_0 {
            return 2;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_orders() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 0), series);
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn integrate_continues_history() {
        let original = vec![1.0, 3.0, 6.0, 10.0, 15.0];

        // next first differences 6, 7 -> 21, 28
        let once = integrate(&[6.0, 7.0], &original, 1);
        assert_eq!(once, vec![21.0, 28.0]);

        // next second differences 1, 1 -> first differences 6, 7 -> 21, 28
        let twice = integrate(&[1.0, 1.0], &original, 2);
        assert_eq!(twice, vec![21.0, 28.0]);

        assert_eq!(integrate(&[4.0], &original, 0), vec![4.0]);
    }

    #[test]
    fn polynomial_of_second_difference() {
        assert_eq!(difference_polynomial(0), vec![1.0]);
        assert_eq!(difference_polynomial(2), vec![1.0, -2.0, 1.0]);
        let product = multiply(&[1.0, -0.5], &[1.0, -1.0]);
        assert_relative_eq!(product[1], -1.5);
        assert_relative_eq!(product[2], 0.5);
    }

    #[test]
    fn suggests_difference_for_random_walk_like_trend() {
        let trending: Vec<f64> = (0..60).map(|i| i as f64 + (i % 3) as f64 * 0.1).collect();
        assert!(suggest_differencing(&trending) >= 1);

        let white: Vec<f64> = (0..60)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        assert_eq!(suggest_differencing(&white), 0);
    }
}
