// Trains a linear softmax classifier on three synthetic Gaussian blobs.
// The update loop lives here, outside the library: it repeatedly asks for
// (loss, dW) and applies plain gradient descent to W.

use rand::prelude::*;

use slate_nn::{Matrix, SoftmaxStrategy};

fn main() {
    let mut rng = StdRng::seed_from_u64(7);

    // Three 4-d blobs, 50 points each, centered on scaled basis directions.
    let centers = [
        [2.0, 0.0, 0.0, -1.0],
        [-2.0, 1.0, 0.0, 1.0],
        [0.0, -2.0, 2.0, 0.0],
    ];
    let per_class = 50;

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (class, center) in centers.iter().enumerate() {
        for _ in 0..per_class {
            let row: Vec<f64> = center
                .iter()
                .map(|&c| c + rng.gen::<f64>() - 0.5)
                .collect();
            rows.push(row);
            labels.push(class);
        }
    }
    let x = Matrix::from_data(rows);

    let mut w = Matrix::gaussian(4, 3, 0.01);
    let strategy = SoftmaxStrategy::Vectorized;
    let learning_rate = 0.5;
    let reg = 1e-4;

    for step in 0..200 {
        let (loss, dw) = strategy
            .loss(&w, &x, &labels, reg)
            .expect("valid training inputs");
        w = w - dw.map(|g| g * learning_rate);
        if step % 20 == 0 {
            println!("Step {step}: loss = {loss:.6}");
        }
    }

    // Training accuracy from the final weights.
    let scores = x.clone() * w.clone();
    let mut correct = 0;
    for (row, &label) in scores.data.iter().zip(labels.iter()) {
        let pred = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        if pred == label {
            correct += 1;
        }
    }
    println!(
        "Train accuracy: {}/{} = {:.3}",
        correct,
        labels.len(),
        correct as f64 / labels.len() as f64
    );
}
