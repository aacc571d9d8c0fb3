use crate::error::NetError;
use crate::math::tensor::Tensor4;

/// Stride and zero-padding for a convolution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvParams {
    pub stride: usize,
    pub pad: usize,
}

impl ConvParams {
    /// "Same-size" convolution for an odd filter side: pad = (size − 1) / 2,
    /// stride 1.
    pub fn same(filter_size: usize) -> ConvParams {
        ConvParams { stride: 1, pad: (filter_size - 1) / 2 }
    }
}

/// Values the convolution backward pass needs from its forward pass.
#[derive(Debug)]
pub struct ConvCache {
    x: Tensor4,
    w: Tensor4,
    params: ConvParams,
}

fn out_side(input: usize, filter: usize, params: &ConvParams) -> Result<usize, NetError> {
    let padded = input + 2 * params.pad;
    if padded < filter || (padded - filter) % params.stride != 0 {
        return Err(NetError::ShapeMismatch {
            context: "conv_forward",
            expected: format!(
                "input side + 2·pad − filter side divisible by stride {}",
                params.stride
            ),
            found: format!("input {input}, filter {filter}, pad {}", params.pad),
        });
    }
    Ok(1 + (padded - filter) / params.stride)
}

/// Convolution forward pass.
///
/// - `x` — input batch, shape (N, C, H, W)
/// - `w` — filter bank, shape (F, C, HH, WW)
/// - `b` — one bias per filter, length F
///
/// Output shape is (N, F, H', W') with
/// H' = 1 + (H + 2·pad − HH) / stride and likewise for W'. Positions outside
/// the input are treated as zero.
pub fn conv_forward(
    x: &Tensor4,
    w: &Tensor4,
    b: &[f64],
    params: &ConvParams,
) -> Result<(Tensor4, ConvCache), NetError> {
    if x.c != w.c || b.len() != w.n {
        return Err(NetError::ShapeMismatch {
            context: "conv_forward",
            expected: format!("x channels = filter channels, {} biases", w.n),
            found: format!("x {}, w {}, {} biases", x.shape_str(), w.shape_str(), b.len()),
        });
    }
    let out_h = out_side(x.h, w.h, params)?;
    let out_w = out_side(x.w, w.w, params)?;

    let mut out = Tensor4::zeros(x.n, w.n, out_h, out_w);
    for n in 0..x.n {
        for f in 0..w.n {
            for i in 0..out_h {
                for j in 0..out_w {
                    let mut acc = b[f];
                    for c in 0..x.c {
                        for ki in 0..w.h {
                            for kj in 0..w.w {
                                let in_i = (i * params.stride + ki) as isize - params.pad as isize;
                                let in_j = (j * params.stride + kj) as isize - params.pad as isize;
                                if in_i >= 0
                                    && in_j >= 0
                                    && (in_i as usize) < x.h
                                    && (in_j as usize) < x.w
                                {
                                    acc += x.get(n, c, in_i as usize, in_j as usize)
                                        * w.get(f, c, ki, kj);
                                }
                            }
                        }
                    }
                    out.set(n, f, i, j, acc);
                }
            }
        }
    }

    let cache = ConvCache { x: x.clone(), w: w.clone(), params: *params };
    Ok((out, cache))
}

/// Convolution backward pass.
///
/// `dout` is the gradient of the loss with respect to the forward output.
/// Returns `(dx, dw, db)` matching the shapes of the forward inputs.
pub fn conv_backward(dout: &Tensor4, cache: ConvCache) -> (Tensor4, Tensor4, Vec<f64>) {
    let ConvCache { x, w, params } = cache;

    let mut dx = Tensor4::zeros(x.n, x.c, x.h, x.w);
    let mut dw = Tensor4::zeros(w.n, w.c, w.h, w.w);
    let mut db = vec![0.0; w.n];

    for n in 0..dout.n {
        for f in 0..dout.c {
            for i in 0..dout.h {
                for j in 0..dout.w {
                    let d = dout.get(n, f, i, j);
                    db[f] += d;
                    for c in 0..x.c {
                        for ki in 0..w.h {
                            for kj in 0..w.w {
                                let in_i = (i * params.stride + ki) as isize - params.pad as isize;
                                let in_j = (j * params.stride + kj) as isize - params.pad as isize;
                                if in_i >= 0
                                    && in_j >= 0
                                    && (in_i as usize) < x.h
                                    && (in_j as usize) < x.w
                                {
                                    let in_i = in_i as usize;
                                    let in_j = in_j as usize;
                                    dw.add_at(f, c, ki, kj, x.get(n, c, in_i, in_j) * d);
                                    dx.add_at(n, c, in_i, in_j, w.get(f, c, ki, kj) * d);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    (dx, dw, db)
}
