use crate::error::NetError;
use crate::math::tensor::Tensor4;

/// Window shape and stride for a max-pooling stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolParams {
    pub height: usize,
    pub width: usize,
    pub stride: usize,
}

impl PoolParams {
    /// The standard 2×2 window with stride 2: halves both spatial sides.
    pub fn two_by_two() -> PoolParams {
        PoolParams { height: 2, width: 2, stride: 2 }
    }
}

/// Values the pooling backward pass needs from its forward pass.
#[derive(Debug)]
pub struct PoolCache {
    x: Tensor4,
    params: PoolParams,
}

fn out_side(input: usize, window: usize, stride: usize) -> Result<usize, NetError> {
    if input < window || (input - window) % stride != 0 {
        return Err(NetError::ShapeMismatch {
            context: "max_pool_forward",
            expected: format!("input side − window divisible by stride {stride}"),
            found: format!("input {input}, window {window}"),
        });
    }
    Ok(1 + (input - window) / stride)
}

/// Max-pooling forward pass over an (N, C, H, W) input.
///
/// Pooling windows must tile the input exactly; an odd input side under a
/// 2×2/stride-2 pool is rejected rather than silently truncated.
pub fn max_pool_forward(
    x: &Tensor4,
    params: &PoolParams,
) -> Result<(Tensor4, PoolCache), NetError> {
    let out_h = out_side(x.h, params.height, params.stride)?;
    let out_w = out_side(x.w, params.width, params.stride)?;

    let mut out = Tensor4::zeros(x.n, x.c, out_h, out_w);
    for n in 0..x.n {
        for c in 0..x.c {
            for i in 0..out_h {
                for j in 0..out_w {
                    let mut best = f64::NEG_INFINITY;
                    for ki in 0..params.height {
                        for kj in 0..params.width {
                            let v = x.get(n, c, i * params.stride + ki, j * params.stride + kj);
                            if v > best {
                                best = v;
                            }
                        }
                    }
                    out.set(n, c, i, j, best);
                }
            }
        }
    }

    let cache = PoolCache { x: x.clone(), params: *params };
    Ok((out, cache))
}

/// Max-pooling backward pass: each output gradient flows to the first
/// maximal entry of its window.
pub fn max_pool_backward(dout: &Tensor4, cache: PoolCache) -> Tensor4 {
    let PoolCache { x, params } = cache;

    let mut dx = Tensor4::zeros(x.n, x.c, x.h, x.w);
    for n in 0..dout.n {
        for c in 0..dout.c {
            for i in 0..dout.h {
                for j in 0..dout.w {
                    let mut best = f64::NEG_INFINITY;
                    let mut best_pos = (0, 0);
                    for ki in 0..params.height {
                        for kj in 0..params.width {
                            let hi = i * params.stride + ki;
                            let wi = j * params.stride + kj;
                            let v = x.get(n, c, hi, wi);
                            if v > best {
                                best = v;
                                best_pos = (hi, wi);
                            }
                        }
                    }
                    dx.add_at(n, c, best_pos.0, best_pos.1, dout.get(n, c, i, j));
                }
            }
        }
    }

    dx
}
