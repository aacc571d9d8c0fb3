use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor4;

/// ReLU forward over a matrix: max(0, x) element-wise. The cache is the
/// pre-activation input; backward masks against it.
pub fn relu_forward(x: &Matrix) -> (Matrix, Matrix) {
    let out = x.map(|v| if v > 0.0 { v } else { 0.0 });
    (out, x.clone())
}

/// ReLU backward over a matrix: passes gradient where the input was positive.
pub fn relu_backward(dout: &Matrix, cache: Matrix) -> Matrix {
    let mask = cache.map(|v| if v > 0.0 { 1.0 } else { 0.0 });
    dout.hadamard(&mask)
}

/// ReLU forward over a 4-D tensor.
pub fn relu_forward_t(x: &Tensor4) -> (Tensor4, Tensor4) {
    let out = x.map(|v| if v > 0.0 { v } else { 0.0 });
    (out, x.clone())
}

/// ReLU backward over a 4-D tensor.
pub fn relu_backward_t(dout: &Tensor4, cache: Tensor4) -> Tensor4 {
    let mut dx = cache;
    for (g, d) in dx.data.iter_mut().zip(dout.data.iter()) {
        *g = if *g > 0.0 { *d } else { 0.0 };
    }
    dx
}
