use serde::{Serialize, Deserialize};

use crate::error::NetError;
use crate::math::matrix::Matrix;

/// Selects which softmax loss implementation a caller wants.
///
/// - `Naive`      — explicit per-example / per-class loops.
/// - `Vectorized` — whole-matrix operations; the weight gradient is one
///   matrix product instead of an accumulation loop.
///
/// Both compute the same contract and the test suite holds them to mutual
/// agreement; the enum exists so harnesses can iterate over strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftmaxStrategy {
    Naive,
    Vectorized,
}

impl SoftmaxStrategy {
    /// Computes (loss, dW) with the selected implementation.
    pub fn loss(
        &self,
        w: &Matrix,
        x: &Matrix,
        y: &[usize],
        reg: f64,
    ) -> Result<(f64, Matrix), NetError> {
        match self {
            SoftmaxStrategy::Naive => softmax_loss_naive(w, x, y, reg),
            SoftmaxStrategy::Vectorized => softmax_loss_vectorized(w, x, y, reg),
        }
    }
}

/// Rejects inputs the softmax loss cannot give meaning to: W rows must match
/// X columns, one label per example, every label inside [0, C).
fn validate_inputs(w: &Matrix, x: &Matrix, y: &[usize]) -> Result<(), NetError> {
    if x.cols != w.rows {
        return Err(NetError::ShapeMismatch {
            context: "softmax_loss",
            expected: format!("X columns = W rows = {}", w.rows),
            found: format!("X {}, W {}", x.shape_str(), w.shape_str()),
        });
    }
    if y.len() != x.rows {
        return Err(NetError::ShapeMismatch {
            context: "softmax_loss",
            expected: format!("{} labels", x.rows),
            found: format!("{} labels", y.len()),
        });
    }
    validate_labels(y, w.cols)
}

fn validate_labels(y: &[usize], num_classes: usize) -> Result<(), NetError> {
    for (index, &label) in y.iter().enumerate() {
        if label >= num_classes {
            return Err(NetError::LabelOutOfRange { index, label, num_classes });
        }
    }
    Ok(())
}

/// Softmax classifier loss and weight gradient, loop-based implementation.
///
/// Inputs have dimension D, there are C classes, and the minibatch holds N
/// examples:
/// - `w`   — weights, shape (D × C)
/// - `x`   — minibatch, shape (N × D)
/// - `y`   — labels, `y[i] = c` means `x` row i has class c, 0 ≤ c < C
/// - `reg` — L2 regularization strength
///
/// Returns `(loss, dW)` where dW has the shape of `w`.
///
/// Each row's scores are shifted by their maximum before exponentiating;
/// softmax is invariant under a constant shift, and the subtraction keeps
/// `exp` from overflowing.
pub fn softmax_loss_naive(
    w: &Matrix,
    x: &Matrix,
    y: &[usize],
    reg: f64,
) -> Result<(f64, Matrix), NetError> {
    validate_inputs(w, x, y)?;

    let num_data = x.rows;
    let num_class = w.cols;
    let dim = w.rows;

    let mut loss = 0.0;
    let mut dw = Matrix::zeros(dim, num_class);

    for i in 0..num_data {
        // score = X[i] · W
        let mut score = vec![0.0; num_class];
        for j in 0..num_class {
            for k in 0..dim {
                score[j] += x.data[i][k] * w.data[k][j];
            }
        }

        let score_max = score.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for s in score.iter_mut() {
            *s -= score_max;
        }

        let norm: f64 = score.iter().map(|&s| s.exp()).sum();
        let prob: Vec<f64> = score.iter().map(|&s| s.exp() / norm).collect();

        // Cross-entropy in the log domain: ln(norm) − score[y[i]]. The
        // shifted norm lies in [1, C], so this stays finite even when the
        // true class's exp underflows to zero.
        loss += norm.ln() - score[y[i]];

        // dW[:,y[i]] -= X[i]; dW[:,j] += prob[j] * X[i] for every class j.
        // The j == y[i] contributions combine to (prob[y[i]] - 1) * X[i].
        for k in 0..dim {
            dw.data[k][y[i]] -= x.data[i][k];
        }
        for j in 0..num_class {
            for k in 0..dim {
                dw.data[k][j] += prob[j] * x.data[i][k];
            }
        }
    }

    loss /= num_data as f64;
    let dw = dw.map(|v| v / num_data as f64);

    // L2 regularization: reg/2 · ΣW² on the loss, reg · W on the gradient.
    let loss = loss + reg * w.sum_squares() / 2.0;
    let dw = dw + w.map(|v| reg * v);

    Ok((loss, dw))
}

/// Softmax classifier loss and weight gradient, vectorized implementation.
///
/// Inputs and outputs are the same as `softmax_loss_naive`. The gradient is
/// computed in one shot as Xᵀ·(P − Ind), where P holds the per-row softmax
/// probabilities and Ind is the one-hot label matrix.
pub fn softmax_loss_vectorized(
    w: &Matrix,
    x: &Matrix,
    y: &[usize],
    reg: f64,
) -> Result<(f64, Matrix), NetError> {
    validate_inputs(w, x, y)?;

    let num_data = x.rows;

    let scores = x.clone() * w.clone();
    let (prob, log_norms) = row_softmax(&scores);

    let loss: f64 = (0..num_data)
        .map(|i| log_norms[i] - scores.data[i][y[i]])
        .sum();

    let mut ind = Matrix::zeros(num_data, w.cols);
    for (i, &label) in y.iter().enumerate() {
        ind.data[i][label] = 1.0;
    }

    let dw = x.transpose() * (prob - ind);

    let loss = loss / num_data as f64 + reg * w.sum_squares() / 2.0;
    let dw = dw.map(|v| v / num_data as f64) + w.map(|v| reg * v);

    Ok((loss, dw))
}

/// Softmax data loss computed directly on a score matrix.
///
/// `scores` is (N × C); `y` holds one label per row. Returns the mean
/// cross-entropy loss and `dscores = (P − Ind) / N`, the gradient of the
/// loss with respect to the scores. Networks that produce scores through
/// several layers start their backward pass from `dscores`.
pub fn softmax_scores(scores: &Matrix, y: &[usize]) -> Result<(f64, Matrix), NetError> {
    if y.len() != scores.rows {
        return Err(NetError::ShapeMismatch {
            context: "softmax_scores",
            expected: format!("{} labels", scores.rows),
            found: format!("{} labels", y.len()),
        });
    }
    validate_labels(y, scores.cols)?;

    let num_data = scores.rows;
    let (prob, log_norms) = row_softmax(scores);

    let loss: f64 = (0..num_data)
        .map(|i| log_norms[i] - scores.data[i][y[i]])
        .sum::<f64>()
        / num_data as f64;

    let mut dscores = prob;
    for (i, &label) in y.iter().enumerate() {
        dscores.data[i][label] -= 1.0;
    }
    let dscores = dscores.map(|v| v / num_data as f64);

    Ok((loss, dscores))
}

/// Row-wise softmax with max-shift stabilization.
///
/// Also returns each row's log-sum-exp, max + ln Σ exp(s − max), so callers
/// can form cross-entropy terms as `log_norm − score[y]` in the log domain;
/// `−ln(prob)` would overflow to +inf once a true-class exp underflows.
fn row_softmax(scores: &Matrix) -> (Matrix, Vec<f64>) {
    let mut log_norms = Vec::with_capacity(scores.rows);
    let data = scores
        .data
        .iter()
        .map(|row| {
            let row_max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = row.iter().map(|&s| (s - row_max).exp()).collect();
            let norm: f64 = exps.iter().sum();
            log_norms.push(row_max + norm.ln());
            exps.into_iter().map(|e| e / norm).collect()
        })
        .collect();
    (Matrix::from_data(data), log_norms)
}
