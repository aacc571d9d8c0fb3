use crate::error::NetError;
use crate::math::matrix::Matrix;

/// Values the affine backward pass needs from its forward pass.
#[derive(Debug)]
pub struct AffineCache {
    x: Matrix,
    w: Matrix,
}

/// Affine (fully-connected) forward pass: out = X·W + b.
///
/// - `x` — input batch, shape (N × D)
/// - `w` — weights, shape (D × M)
/// - `b` — one bias per output unit, length M
pub fn affine_forward(
    x: &Matrix,
    w: &Matrix,
    b: &[f64],
) -> Result<(Matrix, AffineCache), NetError> {
    if x.cols != w.rows || b.len() != w.cols {
        return Err(NetError::ShapeMismatch {
            context: "affine_forward",
            expected: format!("x columns = {}, {} biases", w.rows, w.cols),
            found: format!("x {}, {} biases", x.shape_str(), b.len()),
        });
    }

    let mut out = x.clone() * w.clone();
    for row in out.data.iter_mut() {
        for (v, bias) in row.iter_mut().zip(b.iter()) {
            *v += bias;
        }
    }

    let cache = AffineCache { x: x.clone(), w: w.clone() };
    Ok((out, cache))
}

/// Affine backward pass.
///
/// Returns `(dx, dw, db)`: dx = dout·Wᵀ, dw = Xᵀ·dout, db sums dout over
/// the batch dimension.
pub fn affine_backward(dout: &Matrix, cache: AffineCache) -> (Matrix, Matrix, Vec<f64>) {
    let AffineCache { x, w } = cache;

    let dx = dout.clone() * w.transpose();
    let dw = x.transpose() * dout.clone();

    let mut db = vec![0.0; dout.cols];
    for row in &dout.data {
        for (acc, &v) in db.iter_mut().zip(row.iter()) {
            *acc += v;
        }
    }

    (dx, dw, db)
}
