//! Fused stage helpers: the compositions the three-layer network is built
//! from, each again a forward/backward pair with a consumable cache.

use crate::error::NetError;
use crate::layers::affine::{affine_backward, affine_forward, AffineCache};
use crate::layers::conv::{conv_backward, conv_forward, ConvCache, ConvParams};
use crate::layers::pool::{max_pool_backward, max_pool_forward, PoolCache, PoolParams};
use crate::layers::relu::{relu_backward, relu_backward_t, relu_forward, relu_forward_t};
use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor4;

#[derive(Debug)]
pub struct ConvReluPoolCache {
    conv: ConvCache,
    relu: Tensor4,
    pool: PoolCache,
}

/// Convolution → ReLU → max-pool.
pub fn conv_relu_pool_forward(
    x: &Tensor4,
    w: &Tensor4,
    b: &[f64],
    conv_params: &ConvParams,
    pool_params: &PoolParams,
) -> Result<(Tensor4, ConvReluPoolCache), NetError> {
    let (conv_out, conv_cache) = conv_forward(x, w, b, conv_params)?;
    let (relu_out, relu_cache) = relu_forward_t(&conv_out);
    let (out, pool_cache) = max_pool_forward(&relu_out, pool_params)?;
    Ok((out, ConvReluPoolCache { conv: conv_cache, relu: relu_cache, pool: pool_cache }))
}

/// Backward through max-pool → ReLU → convolution.
pub fn conv_relu_pool_backward(
    dout: &Tensor4,
    cache: ConvReluPoolCache,
) -> (Tensor4, Tensor4, Vec<f64>) {
    let d_relu = max_pool_backward(dout, cache.pool);
    let d_conv = relu_backward_t(&d_relu, cache.relu);
    conv_backward(&d_conv, cache.conv)
}

#[derive(Debug)]
pub struct AffineReluCache {
    affine: AffineCache,
    relu: Matrix,
}

/// Affine → ReLU.
pub fn affine_relu_forward(
    x: &Matrix,
    w: &Matrix,
    b: &[f64],
) -> Result<(Matrix, AffineReluCache), NetError> {
    let (affine_out, affine_cache) = affine_forward(x, w, b)?;
    let (out, relu_cache) = relu_forward(&affine_out);
    Ok((out, AffineReluCache { affine: affine_cache, relu: relu_cache }))
}

/// Backward through ReLU → affine.
pub fn affine_relu_backward(
    dout: &Matrix,
    cache: AffineReluCache,
) -> (Matrix, Matrix, Vec<f64>) {
    let d_affine = relu_backward(dout, cache.relu);
    affine_backward(&d_affine, cache.affine)
}
