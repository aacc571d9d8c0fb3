use serde::{Serialize, Deserialize};

use crate::error::NetError;
use crate::layers::{
    affine_backward, affine_forward, affine_relu_backward, affine_relu_forward,
    conv_relu_pool_backward, conv_relu_pool_forward, AffineCache, AffineReluCache, ConvParams,
    ConvReluPoolCache, PoolParams,
};
use crate::loss::softmax_scores;
use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor4;
use crate::network::spec::{ConvNetSpec, Dtype};

/// Parameter names in the order external optimizers conventionally
/// iterate them.
pub const PARAM_NAMES: [&str; 6] = ["W1", "b1", "W2", "b2", "W3", "b3"];

/// The six parameter arrays of a three-layer convnet, as named fields.
///
/// - `w1`/`b1` — convolutional filters (F, C, fs, fs) and per-filter biases
/// - `w2`/`b2` — hidden affine weights (F·H/2·W/2 × hidden) and biases
/// - `w3`/`b3` — output affine weights (hidden × classes) and biases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    pub w1: Tensor4,
    pub b1: Vec<f64>,
    pub w2: Matrix,
    pub b2: Vec<f64>,
    pub w3: Matrix,
    pub b3: Vec<f64>,
}

/// A borrowed view of one parameter (or gradient) array, tagged by kind.
#[derive(Debug)]
pub enum ParamView<'a> {
    Filters(&'a Tensor4),
    Dense(&'a Matrix),
    Bias(&'a [f64]),
}

/// A mutable view of one parameter array, for external optimizers that
/// iterate parameters by name and apply updates in place between calls.
#[derive(Debug)]
pub enum ParamViewMut<'a> {
    Filters(&'a mut Tensor4),
    Dense(&'a mut Matrix),
    Bias(&'a mut [f64]),
}

impl Params {
    /// Name-keyed read access; names are those of `PARAM_NAMES`.
    pub fn get(&self, name: &str) -> Option<ParamView<'_>> {
        match name {
            "W1" => Some(ParamView::Filters(&self.w1)),
            "b1" => Some(ParamView::Bias(&self.b1)),
            "W2" => Some(ParamView::Dense(&self.w2)),
            "b2" => Some(ParamView::Bias(&self.b2)),
            "W3" => Some(ParamView::Dense(&self.w3)),
            "b3" => Some(ParamView::Bias(&self.b3)),
            _ => None,
        }
    }

    /// Name-keyed mutable access.
    pub fn get_mut(&mut self, name: &str) -> Option<ParamViewMut<'_>> {
        match name {
            "W1" => Some(ParamViewMut::Filters(&mut self.w1)),
            "b1" => Some(ParamViewMut::Bias(&mut self.b1)),
            "W2" => Some(ParamViewMut::Dense(&mut self.w2)),
            "b2" => Some(ParamViewMut::Bias(&mut self.b2)),
            "W3" => Some(ParamViewMut::Dense(&mut self.w3)),
            "b3" => Some(ParamViewMut::Bias(&mut self.b3)),
            _ => None,
        }
    }
}

/// One gradient per parameter, shaped identically to `Params`.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub w1: Tensor4,
    pub b1: Vec<f64>,
    pub w2: Matrix,
    pub b2: Vec<f64>,
    pub w3: Matrix,
    pub b3: Vec<f64>,
}

impl Gradients {
    /// Name-keyed read access; names are those of `PARAM_NAMES`.
    pub fn get(&self, name: &str) -> Option<ParamView<'_>> {
        match name {
            "W1" => Some(ParamView::Filters(&self.w1)),
            "b1" => Some(ParamView::Bias(&self.b1)),
            "W2" => Some(ParamView::Dense(&self.w2)),
            "b2" => Some(ParamView::Bias(&self.b2)),
            "W3" => Some(ParamView::Dense(&self.w3)),
            "b3" => Some(ParamView::Bias(&self.b3)),
            _ => None,
        }
    }
}

/// Everything a training-mode evaluation produces.
#[derive(Debug)]
pub struct TrainingOutput {
    pub loss: f64,
    pub scores: Matrix,
    pub grads: Gradients,
}

struct ForwardCaches {
    stage1: ConvReluPoolCache,
    stage2: AffineReluCache,
    stage3: AffineCache,
    // (c, h, w) of the pool output, for reshaping the affine input-gradient.
    pool_shape: (usize, usize, usize),
}

/// A three-layer convolutional network:
///
///   conv → ReLU → 2×2 max-pool → affine → ReLU → affine → softmax
///
/// The convolution preserves spatial size (stride 1, pad (fs − 1) / 2); the
/// pool halves it. Parameters live in `params` and are read-only during a
/// call; an external optimizer mutates them between calls using the
/// gradients this network returns.
#[derive(Debug, Clone)]
pub struct ThreeLayerConvNet {
    pub params: Params,
    pub reg: f64,
    dtype: Dtype,
    conv_params: ConvParams,
    pool_params: PoolParams,
    input_dim: (usize, usize, usize),
}

impl ThreeLayerConvNet {
    /// Builds a network from a spec, allocating and initializing all six
    /// parameter arrays: weights from N(0, weight_scale²), biases zero.
    ///
    /// Rejects configurations that can never produce valid shapes: an even
    /// filter size (non-integral same-size padding) or an odd input side
    /// (the 2×2/stride-2 pool could not halve it).
    pub fn new(spec: &ConvNetSpec) -> Result<ThreeLayerConvNet, NetError> {
        let (channels, height, width) = spec.input_dim;

        if spec.filter_size % 2 == 0 {
            return Err(NetError::BadConfig(format!(
                "filter size {} is even; same-size padding (filter_size - 1) / 2 requires odd",
                spec.filter_size
            )));
        }
        if height % 2 != 0 || width % 2 != 0 {
            return Err(NetError::BadConfig(format!(
                "input sides ({height}, {width}) must be even for the 2x2/stride-2 pool"
            )));
        }

        let pooled = spec.num_filters * (height / 2) * (width / 2);
        let mut params = Params {
            w1: Tensor4::gaussian(
                spec.num_filters,
                channels,
                spec.filter_size,
                spec.filter_size,
                spec.weight_scale,
            ),
            b1: vec![0.0; spec.num_filters],
            w2: Matrix::gaussian(pooled, spec.hidden_dim, spec.weight_scale),
            b2: vec![0.0; spec.hidden_dim],
            w3: Matrix::gaussian(spec.hidden_dim, spec.num_classes, spec.weight_scale),
            b3: vec![0.0; spec.num_classes],
        };

        if spec.dtype == Dtype::F32 {
            params.w1 = params.w1.map(|v| v as f32 as f64);
            params.w2 = params.w2.map(|v| v as f32 as f64);
            params.w3 = params.w3.map(|v| v as f32 as f64);
        }

        Ok(ThreeLayerConvNet {
            params,
            reg: spec.reg,
            dtype: spec.dtype,
            conv_params: ConvParams::same(spec.filter_size),
            pool_params: PoolParams::two_by_two(),
            input_dim: spec.input_dim,
        })
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Class scores for a batch, inference mode: no cache survives the call.
    pub fn scores(&self, x: &Tensor4) -> Result<Matrix, NetError> {
        let (scores, _caches) = self.forward(x)?;
        Ok(scores)
    }

    /// Loss and parameter gradients for a labeled batch.
    ///
    /// The data loss is the softmax cross-entropy over the scores; the
    /// regularization term reg/2 · (‖W1‖² + ‖W2‖² + ‖W3‖²) is added to the
    /// loss, and reg · Wk to each weight (not bias) gradient.
    pub fn loss(&self, x: &Tensor4, y: &[usize]) -> Result<TrainingOutput, NetError> {
        let (scores, caches) = self.forward(x)?;

        let (data_loss, dscores) = softmax_scores(&scores, y)?;
        let reg_loss = self.reg
            * (self.params.w1.sum_squares()
                + self.params.w2.sum_squares()
                + self.params.w3.sum_squares())
            / 2.0;
        let loss = data_loss + reg_loss;

        // Backward, in reverse stage order.
        let (d_hidden, dw3, db3) = affine_backward(&dscores, caches.stage3);
        let (d_flat, dw2, db2) = affine_relu_backward(&d_hidden, caches.stage2);
        let (pc, ph, pw) = caches.pool_shape;
        let d_pool = Tensor4::from_rows(&d_flat, pc, ph, pw)?;
        let (_dx, dw1, db1) = conv_relu_pool_backward(&d_pool, caches.stage1);

        let grads = Gradients {
            w1: add_reg_t(dw1, &self.params.w1, self.reg),
            b1: db1,
            w2: add_reg(dw2, &self.params.w2, self.reg),
            b2: db2,
            w3: add_reg(dw3, &self.params.w3, self.reg),
            b3: db3,
        };

        Ok(TrainingOutput { loss, scores, grads })
    }

    fn forward(&self, x: &Tensor4) -> Result<(Matrix, ForwardCaches), NetError> {
        let (channels, height, width) = self.input_dim;
        if (x.c, x.h, x.w) != (channels, height, width) {
            return Err(NetError::ShapeMismatch {
                context: "ThreeLayerConvNet",
                expected: format!("(N x {channels} x {height} x {width})"),
                found: x.shape_str(),
            });
        }

        let (pool_out, stage1) = conv_relu_pool_forward(
            x,
            &self.params.w1,
            &self.params.b1,
            &self.conv_params,
            &self.pool_params,
        )?;
        let pool_shape = (pool_out.c, pool_out.h, pool_out.w);

        let flat = pool_out.flatten_rows();
        let (hidden, stage2) = affine_relu_forward(&flat, &self.params.w2, &self.params.b2)?;
        let (scores, stage3) = affine_forward(&hidden, &self.params.w3, &self.params.b3)?;

        Ok((scores, ForwardCaches { stage1, stage2, stage3, pool_shape }))
    }
}

fn add_reg(dw: Matrix, w: &Matrix, reg: f64) -> Matrix {
    if reg == 0.0 {
        return dw;
    }
    dw + w.map(|v| reg * v)
}

fn add_reg_t(dw: Tensor4, w: &Tensor4, reg: f64) -> Tensor4 {
    if reg == 0.0 {
        return dw;
    }
    let mut out = dw;
    for (g, &wv) in out.data.iter_mut().zip(w.data.iter()) {
        *g += reg * wv;
    }
    out
}
