//! Layer primitives, each a forward/backward pair.
//!
//! Every forward returns `(output, cache)`; the matching backward consumes
//! the cache by value and returns the input gradient plus any parameter
//! gradients. Consuming the cache enforces its lifetime: exactly one
//! backward per forward, never reused across calls.

pub mod affine;
pub mod compose;
pub mod conv;
pub mod pool;
pub mod relu;

pub use affine::{affine_backward, affine_forward, AffineCache};
pub use compose::{
    affine_relu_backward, affine_relu_forward, conv_relu_pool_backward, conv_relu_pool_forward,
    AffineReluCache, ConvReluPoolCache,
};
pub use conv::{conv_backward, conv_forward, ConvCache, ConvParams};
pub use pool::{max_pool_backward, max_pool_forward, PoolCache, PoolParams};
pub use relu::{relu_backward, relu_backward_t, relu_forward, relu_forward_t};
