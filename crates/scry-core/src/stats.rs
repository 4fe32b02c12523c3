//! Shared statistics primitives
//!
//! Small, allocation-light helpers used across the correlation graph,
//! impurity scoring, and the trend worker:
//! - Shannon entropy over a probability distribution
//! - positive linear mapping + normalization (measure column -> distribution)
//! - bounded k-subset enumeration for cluster expansion
//! - 1-D ordinary least squares with a heuristic significance signal

use serde::Serialize;

/// Shift a series so every element is strictly positive. Series that are
/// already positive are returned unchanged.
pub fn linear_map_positive(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    if min <= 0.0 && min.is_finite() {
        values.iter().map(|v| v - min + 1.0).collect()
    } else {
        values.to_vec()
    }
}

/// Normalize a non-negative series into a probability distribution.
/// A zero-sum series normalizes to all zeros rather than NaN.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / sum).collect()
}

/// Shannon entropy (base 2) of a probability distribution.
/// Zero-probability entries contribute nothing.
pub fn entropy(probabilities: &[f64]) -> f64 {
    -probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.log2())
        .sum::<f64>()
}

/// The maximum possible entropy of a distribution over `n` outcomes.
pub fn max_entropy(n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        (n as f64).log2()
    }
}

/// Every combination of `items` with size in `[min_size, max_size]`.
///
/// Combinatorial in `items.len()`; callers bound the input via clustering
/// and keep `max_size` small.
pub fn combinations<T: Clone>(items: &[T], min_size: usize, max_size: usize) -> Vec<Vec<T>> {
    let max_size = max_size.min(items.len());
    let mut out: Vec<Vec<T>> = Vec::new();
    if min_size == 0 {
        out.push(Vec::new());
    }
    let mut current: Vec<T> = Vec::new();
    fn expand<T: Clone>(
        items: &[T],
        start: usize,
        min_size: usize,
        max_size: usize,
        current: &mut Vec<T>,
        out: &mut Vec<Vec<T>>,
    ) {
        if current.len() >= min_size.max(1) && !current.is_empty() {
            out.push(current.clone());
        }
        if current.len() == max_size {
            return;
        }
        for i in start..items.len() {
            current.push(items[i].clone());
            expand(items, i + 1, min_size, max_size, current, out);
            current.pop();
        }
    }
    expand(items, 0, min_size, max_size, &mut current, &mut out);
    out
}

/// Ordinary least-squares fit of `y` on `x`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearModel {
    /// Heuristic p-value from a logistic CDF over |slope|. This is a
    /// ranking signal, not a rigorous statistical test.
    pub fn p_value(&self) -> f64 {
        1.0 - logistic(self.slope.abs())
    }

    /// `R^2 * (1 - p_value)`.
    pub fn significance(&self) -> f64 {
        self.r_squared * (1.0 - self.p_value())
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Fit a line through paired samples. Returns `None` when there are fewer
/// than two points or `x` has no variance.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<LinearModel> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let xs = &xs[..n];
    let ys = &ys[..n];
    let x_bar = xs.iter().sum::<f64>() / n as f64;
    let y_bar = ys.iter().sum::<f64>() / n as f64;

    let sxx: f64 = xs.iter().map(|x| (x - x_bar).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - x_bar) * (y - y_bar))
        .sum();

    let slope = sxy / sxx;
    let intercept = y_bar - slope * x_bar;

    let sst: f64 = ys.iter().map(|y| (y - y_bar).powi(2)).sum();
    let r_squared = if sst == 0.0 {
        // constant y: no variance left to explain
        0.0
    } else {
        let ssr: f64 = xs
            .iter()
            .map(|x| {
                let predicted = slope * x + intercept;
                (predicted - y_bar).powi(2)
            })
            .sum();
        (ssr / sst).clamp(0.0, 1.0)
    };

    Some(LinearModel {
        slope,
        intercept,
        r_squared,
    })
}
