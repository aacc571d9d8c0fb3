use serde::{Serialize, Deserialize};

use crate::error::NetError;
use crate::math::matrix::Matrix;
use crate::math::sample_standard_normal;

/// Dense 4-D array with shape (n, c, h, w) and flat row-major storage.
///
/// Used both for image batches (N images, C channels, H×W pixels) and for
/// convolution filter banks (F filters, C channels, HH×WW taps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor4 {
    pub n: usize,
    pub c: usize,
    pub h: usize,
    pub w: usize,
    pub data: Vec<f64>,
}

impl Tensor4 {
    pub fn zeros(n: usize, c: usize, h: usize, w: usize) -> Tensor4 {
        Tensor4 { n, c, h, w, data: vec![0.0; n * c * h * w] }
    }

    /// Gaussian initialization: samples every entry from N(0, std_dev²).
    pub fn gaussian(n: usize, c: usize, h: usize, w: usize, std_dev: f64) -> Tensor4 {
        let mut rng = rand::thread_rng();
        let mut res = Tensor4::zeros(n, c, h, w);
        for v in res.data.iter_mut() {
            *v = sample_standard_normal(&mut rng) * std_dev;
        }
        res
    }

    #[inline]
    pub fn get(&self, n: usize, c: usize, h: usize, w: usize) -> f64 {
        self.data[((n * self.c + c) * self.h + h) * self.w + w]
    }

    #[inline]
    pub fn set(&mut self, n: usize, c: usize, h: usize, w: usize, value: f64) {
        self.data[((n * self.c + c) * self.h + h) * self.w + w] = value;
    }

    #[inline]
    pub fn add_at(&mut self, n: usize, c: usize, h: usize, w: usize, value: f64) {
        self.data[((n * self.c + c) * self.h + h) * self.w + w] += value;
    }

    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.n, self.c, self.h, self.w)
    }

    /// "(n x c x h x w)" — for error messages.
    pub fn shape_str(&self) -> String {
        format!("({} x {} x {} x {})", self.n, self.c, self.h, self.w)
    }

    pub fn map<F>(&self, functor: F) -> Tensor4
    where
        F: Fn(f64) -> f64,
    {
        Tensor4 {
            n: self.n,
            c: self.c,
            h: self.h,
            w: self.w,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Sum of squared entries, used by the L2 regularization terms.
    pub fn sum_squares(&self) -> f64 {
        self.data.iter().map(|&x| x * x).sum()
    }

    /// Flattens each of the n leading slices into one row, producing an
    /// (n × c·h·w) matrix. Feeds conv/pool activations into affine layers.
    pub fn flatten_rows(&self) -> Matrix {
        let row_len = self.c * self.h * self.w;
        let data = (0..self.n)
            .map(|i| self.data[i * row_len..(i + 1) * row_len].to_vec())
            .collect();
        Matrix::from_data(data)
    }

    /// Inverse of `flatten_rows`: reshapes an (n × c·h·w) matrix back into
    /// (n, c, h, w). Used to carry affine input-gradients back into the
    /// spatial stages.
    pub fn from_rows(m: &Matrix, c: usize, h: usize, w: usize) -> Result<Tensor4, NetError> {
        if m.cols != c * h * w {
            return Err(NetError::ShapeMismatch {
                context: "Tensor4::from_rows",
                expected: format!("({} x {})", m.rows, c * h * w),
                found: m.shape_str(),
            });
        }
        let mut data = Vec::with_capacity(m.rows * m.cols);
        for row in &m.data {
            data.extend_from_slice(row);
        }
        Ok(Tensor4 { n: m.rows, c, h, w, data })
    }
}
