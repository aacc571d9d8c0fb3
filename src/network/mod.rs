pub mod convnet;
pub mod spec;

pub use convnet::{
    Gradients, ParamView, ParamViewMut, Params, ThreeLayerConvNet, TrainingOutput, PARAM_NAMES,
};
pub use spec::{ConvNetSpec, Dtype};
