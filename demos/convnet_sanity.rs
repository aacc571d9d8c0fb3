// Builds a small three-layer convnet, checks that the initial loss sits near
// ln(num_classes), then applies a few hand-rolled gradient descent steps from
// the outside — the library itself never updates parameters.

use rand::prelude::*;

use slate_nn::network::{ParamView, PARAM_NAMES};
use slate_nn::{ConvNetSpec, Dtype, Tensor4, ThreeLayerConvNet};

fn main() {
    let spec = ConvNetSpec {
        input_dim: (3, 16, 16),
        num_filters: 4,
        filter_size: 3,
        hidden_dim: 8,
        num_classes: 3,
        weight_scale: 1e-2,
        reg: 0.0,
        dtype: Dtype::F64,
    };
    let mut net = ThreeLayerConvNet::new(&spec).expect("valid configuration");

    let mut rng = StdRng::seed_from_u64(42);
    let mut x = Tensor4::zeros(4, 3, 16, 16);
    for v in x.data.iter_mut() {
        *v = rng.gen::<f64>() - 0.5;
    }
    let y = vec![0, 1, 2, 0];

    let out = net.loss(&x, &y).expect("valid batch");
    println!(
        "Initial loss = {:.6} (ln 3 = {:.6})",
        out.loss,
        (3.0f64).ln()
    );
    for name in PARAM_NAMES {
        let entries = match out.grads.get(name).unwrap() {
            ParamView::Filters(t) => t.data.len(),
            ParamView::Dense(m) => m.rows * m.cols,
            ParamView::Bias(b) => b.len(),
        };
        println!("  grad {name}: {entries} entries");
    }

    let learning_rate = 0.1;
    for step in 1..=20 {
        let out = net.loss(&x, &y).expect("valid batch");

        for (p, g) in net.params.w1.data.iter_mut().zip(out.grads.w1.data.iter()) {
            *p -= learning_rate * g;
        }
        for (p, g) in net.params.b1.iter_mut().zip(out.grads.b1.iter()) {
            *p -= learning_rate * g;
        }
        net.params.w2 = net.params.w2.clone() - out.grads.w2.map(|g| g * learning_rate);
        for (p, g) in net.params.b2.iter_mut().zip(out.grads.b2.iter()) {
            *p -= learning_rate * g;
        }
        net.params.w3 = net.params.w3.clone() - out.grads.w3.map(|g| g * learning_rate);
        for (p, g) in net.params.b3.iter_mut().zip(out.grads.b3.iter()) {
            *p -= learning_rate * g;
        }

        if step % 5 == 0 {
            println!("Step {step}: loss = {:.6}", out.loss);
        }
    }
}
