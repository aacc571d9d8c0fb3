// This binary crate is intentionally minimal.
// All loss and network logic lives in the library (src/lib.rs and its modules).
// Run demos with:
//   cargo run --example softmax_blobs
fn main() {
    println!("slate-nn: softmax loss and a three-layer convnet, from scratch.");
    println!("Run `cargo run --example softmax_blobs` or `cargo run --example convnet_sanity`.");
}
