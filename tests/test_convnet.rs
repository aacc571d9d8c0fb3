// Tests for the three-layer convnet: construction, the scores/loss contract,
// gradient coverage, and an end-to-end numerical gradient check.

use approx::assert_abs_diff_eq;
use rand::prelude::*;

use slate_nn::network::{Gradients, ParamView, ParamViewMut, PARAM_NAMES};
use slate_nn::{ConvNetSpec, Dtype, NetError, Tensor4, ThreeLayerConvNet};

fn small_spec() -> ConvNetSpec {
    ConvNetSpec {
        input_dim: (3, 16, 16),
        num_filters: 4,
        filter_size: 3,
        hidden_dim: 8,
        num_classes: 3,
        weight_scale: 1e-2,
        reg: 0.0,
        dtype: Dtype::F64,
    }
}

fn random_batch(rng: &mut StdRng, n: usize, c: usize, h: usize, w: usize) -> Tensor4 {
    let mut x = Tensor4::zeros(n, c, h, w);
    for v in x.data.iter_mut() {
        *v = rng.gen::<f64>() - 0.5;
    }
    x
}

#[test]
fn construction_allocates_expected_shapes() {
    let net = ThreeLayerConvNet::new(&small_spec()).unwrap();

    assert_eq!(net.params.w1.shape(), (4, 3, 3, 3));
    assert_eq!(net.params.b1.len(), 4);
    // Pool halves 16x16 to 8x8, so the hidden affine sees 4·8·8 inputs.
    assert_eq!((net.params.w2.rows, net.params.w2.cols), (4 * 8 * 8, 8));
    assert_eq!(net.params.b2.len(), 8);
    assert_eq!((net.params.w3.rows, net.params.w3.cols), (8, 3));
    assert_eq!(net.params.b3.len(), 3);
    assert_eq!(net.dtype(), Dtype::F64);
}

#[test]
fn spec_json_round_trip() {
    let spec = small_spec();
    let path = std::env::temp_dir().join("slate_nn_spec_round_trip.json");
    let path = path.to_str().unwrap();

    spec.save_json(path).unwrap();
    let loaded = ConvNetSpec::load_json(path).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(loaded.input_dim, spec.input_dim);
    assert_eq!(loaded.num_filters, spec.num_filters);
    assert_eq!(loaded.filter_size, spec.filter_size);
    assert_eq!(loaded.hidden_dim, spec.hidden_dim);
    assert_eq!(loaded.num_classes, spec.num_classes);
    assert_eq!(loaded.weight_scale, spec.weight_scale);
    assert_eq!(loaded.reg, spec.reg);
    assert_eq!(loaded.dtype, spec.dtype);
}

#[test]
fn spec_json_defaults_optional_fields() {
    // reg and dtype may be omitted from stored configs.
    let json = r#"{
        "input_dim": [3, 16, 16],
        "num_filters": 4,
        "filter_size": 3,
        "hidden_dim": 8,
        "num_classes": 3,
        "weight_scale": 0.01
    }"#;
    let spec: ConvNetSpec = serde_json::from_str(json).unwrap();
    assert_eq!(spec.input_dim, (3, 16, 16));
    assert_eq!(spec.reg, 0.0);
    assert_eq!(spec.dtype, Dtype::F32);
}

#[test]
fn biases_start_at_zero() {
    let net = ThreeLayerConvNet::new(&small_spec()).unwrap();
    assert!(net.params.b1.iter().all(|&v| v == 0.0));
    assert!(net.params.b2.iter().all(|&v| v == 0.0));
    assert!(net.params.b3.iter().all(|&v| v == 0.0));
}

#[test]
fn rejects_even_filter_size() {
    let spec = ConvNetSpec { filter_size: 4, ..small_spec() };
    let err = ThreeLayerConvNet::new(&spec).unwrap_err();
    assert!(matches!(err, NetError::BadConfig(_)));
}

#[test]
fn rejects_odd_input_sides() {
    let spec = ConvNetSpec { input_dim: (3, 15, 16), ..small_spec() };
    let err = ThreeLayerConvNet::new(&spec).unwrap_err();
    assert!(matches!(err, NetError::BadConfig(_)));
}

#[test]
fn rejects_wrong_input_shape() {
    let net = ThreeLayerConvNet::new(&small_spec()).unwrap();
    let mut rng = StdRng::seed_from_u64(31);
    let x = random_batch(&mut rng, 2, 3, 8, 8);
    let err = net.scores(&x).unwrap_err();
    assert!(matches!(err, NetError::ShapeMismatch { .. }));
}

#[test]
fn rejects_out_of_range_labels() {
    let net = ThreeLayerConvNet::new(&small_spec()).unwrap();
    let mut rng = StdRng::seed_from_u64(32);
    let x = random_batch(&mut rng, 2, 3, 16, 16);
    let err = net.loss(&x, &[0, 5]).unwrap_err();
    assert!(matches!(err, NetError::LabelOutOfRange { .. }));
}

#[test]
fn inference_matches_training_scores() {
    let net = ThreeLayerConvNet::new(&small_spec()).unwrap();
    let mut rng = StdRng::seed_from_u64(33);
    let x = random_batch(&mut rng, 2, 3, 16, 16);

    let inference = net.scores(&x).unwrap();
    let training = net.loss(&x, &[0, 2]).unwrap();
    assert_eq!(inference.data, training.scores.data);
}

#[test]
fn grads_cover_every_parameter() {
    let net = ThreeLayerConvNet::new(&small_spec()).unwrap();
    let mut rng = StdRng::seed_from_u64(34);
    let x = random_batch(&mut rng, 2, 3, 16, 16);

    let out = net.loss(&x, &[1, 2]).unwrap();
    for name in PARAM_NAMES {
        let param = net.params.get(name).unwrap();
        let grad = out.grads.get(name).unwrap();
        match (param, grad) {
            (ParamView::Filters(p), ParamView::Filters(g)) => assert_eq!(p.shape(), g.shape()),
            (ParamView::Dense(p), ParamView::Dense(g)) => {
                assert_eq!((p.rows, p.cols), (g.rows, g.cols))
            }
            (ParamView::Bias(p), ParamView::Bias(g)) => assert_eq!(p.len(), g.len()),
            _ => panic!("parameter and gradient {name} disagree on kind"),
        }
    }
    assert!(net.params.get("W4").is_none());
    assert!(out.grads.get("gamma").is_none());
}

#[test]
fn initial_loss_sits_near_uniform() {
    // Small-scale random weights give near-uniform class probabilities, so
    // the loss of an untrained network should be close to ln(3).
    let net = ThreeLayerConvNet::new(&small_spec()).unwrap();
    let mut rng = StdRng::seed_from_u64(35);
    let x = random_batch(&mut rng, 2, 3, 16, 16);

    let out = net.loss(&x, &[0, 2]).unwrap();
    assert!(out.loss.is_finite());
    assert_abs_diff_eq!(out.loss, (3.0f64).ln(), epsilon = 0.1);
}

#[test]
fn loss_increases_with_reg() {
    let net = ThreeLayerConvNet::new(&small_spec()).unwrap();
    let mut regularized = net.clone();
    regularized.reg = 0.7;

    let mut rng = StdRng::seed_from_u64(36);
    let x = random_batch(&mut rng, 2, 3, 16, 16);
    let y = [0, 1];

    let plain = net.loss(&x, &y).unwrap().loss;
    let penalized = regularized.loss(&x, &y).unwrap().loss;
    assert!(penalized > plain);
}

// ---------------------------------------------------------------------------
// End-to-end numerical gradient check on a tiny network.
// ---------------------------------------------------------------------------

fn param_len(net: &ThreeLayerConvNet, name: &str) -> usize {
    match net.params.get(name).unwrap() {
        ParamView::Filters(t) => t.data.len(),
        ParamView::Dense(m) => m.rows * m.cols,
        ParamView::Bias(b) => b.len(),
    }
}

fn nudge(net: &mut ThreeLayerConvNet, name: &str, idx: usize, delta: f64) {
    match net.params.get_mut(name).unwrap() {
        ParamViewMut::Filters(t) => t.data[idx] += delta,
        ParamViewMut::Dense(m) => {
            let cols = m.cols;
            m.data[idx / cols][idx % cols] += delta;
        }
        ParamViewMut::Bias(b) => b[idx] += delta,
    }
}

fn grad_entry(grads: &Gradients, name: &str, idx: usize) -> f64 {
    match grads.get(name).unwrap() {
        ParamView::Filters(t) => t.data[idx],
        ParamView::Dense(m) => m.data[idx / m.cols][idx % m.cols],
        ParamView::Bias(b) => b[idx],
    }
}

fn rel_error(a: f64, b: f64) -> f64 {
    (a - b).abs() / (a.abs() + b.abs()).max(1e-6)
}

#[test]
fn analytic_gradients_match_numeric_end_to_end() {
    let spec = ConvNetSpec {
        input_dim: (1, 4, 4),
        num_filters: 2,
        filter_size: 3,
        hidden_dim: 5,
        num_classes: 3,
        weight_scale: 5e-2,
        reg: 0.1,
        dtype: Dtype::F64,
    };
    let mut net = ThreeLayerConvNet::new(&spec).unwrap();

    let mut rng = StdRng::seed_from_u64(37);
    let x = random_batch(&mut rng, 2, 1, 4, 4);
    let y = vec![0, 2];

    let analytic = net.loss(&x, &y).unwrap().grads;

    let h = 1e-5;
    for name in PARAM_NAMES {
        for idx in 0..param_len(&net, name) {
            nudge(&mut net, name, idx, h);
            let plus = net.loss(&x, &y).unwrap().loss;
            nudge(&mut net, name, idx, -2.0 * h);
            let minus = net.loss(&x, &y).unwrap().loss;
            nudge(&mut net, name, idx, h);

            let numeric = (plus - minus) / (2.0 * h);
            let a = grad_entry(&analytic, name, idx);
            assert!(
                rel_error(a, numeric) < 1e-3,
                "{name}[{idx}]: analytic {a}, numeric {numeric}"
            );
        }
    }
}
