use serde::{Serialize, Deserialize};

/// Numeric precision for network parameters, fixed at construction.
///
/// Parameters are stored as f64 either way; `F32` rounds each initialized
/// value through single precision, matching callers that want f32-faithful
/// starting weights. Arithmetic always runs in f64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    F32,
    F64,
}

/// A fully serializable description of a three-layer convnet architecture.
///
/// `ConvNetSpec` can be saved to / loaded from JSON independently of any
/// initialized weights, making it possible to store architecture
/// configurations before a network is built.
///
/// Fields:
/// - `input_dim`    — (channels, height, width) of one input image
/// - `num_filters`  — filters in the convolutional layer
/// - `filter_size`  — side of each (square) filter; must be odd so the
///                    same-size padding (filter_size − 1) / 2 is integral
/// - `hidden_dim`   — units in the fully-connected hidden layer
/// - `num_classes`  — scores produced by the final affine layer
/// - `weight_scale` — standard deviation for Gaussian weight initialization
/// - `reg`          — L2 regularization strength
/// - `dtype`        — numeric precision for the parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvNetSpec {
    pub input_dim: (usize, usize, usize),
    pub num_filters: usize,
    pub filter_size: usize,
    pub hidden_dim: usize,
    pub num_classes: usize,
    pub weight_scale: f64,
    #[serde(default)]
    pub reg: f64,
    #[serde(default = "default_dtype")]
    pub dtype: Dtype,
}

fn default_dtype() -> Dtype {
    Dtype::F32
}

impl Default for ConvNetSpec {
    fn default() -> Self {
        ConvNetSpec {
            input_dim: (3, 32, 32),
            num_filters: 32,
            filter_size: 7,
            hidden_dim: 100,
            num_classes: 10,
            weight_scale: 1e-3,
            reg: 0.0,
            dtype: Dtype::F32,
        }
    }
}

impl ConvNetSpec {
    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a `ConvNetSpec` from a JSON file.
    pub fn load_json(path: &str) -> std::io::Result<ConvNetSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
