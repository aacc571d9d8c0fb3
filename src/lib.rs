pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;

// Convenience re-exports
pub use error::NetError;
pub use loss::{softmax_loss_naive, softmax_loss_vectorized, SoftmaxStrategy};
pub use math::matrix::Matrix;
pub use math::tensor::Tensor4;
pub use network::{ConvNetSpec, Dtype, ThreeLayerConvNet};
