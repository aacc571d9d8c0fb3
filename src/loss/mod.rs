pub mod softmax;

pub use softmax::{softmax_loss_naive, softmax_loss_vectorized, softmax_scores, SoftmaxStrategy};
