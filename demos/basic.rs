//! Basic Example
//!
//! Builds a PredRNN++ model and predicts a few future frames from random
//! observations. No training involved.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use predicto::prelude::*;

fn main() {
    println!("=== Predicto Basic Example ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();

    let config = PredRnnConfig::new().with_hidden_channels(16).with_num_layers(3);
    let model = PredRnnPp::<Backend>::new(&config, &device);

    println!("Model created:");
    println!("  - Input channels:  {}", model.input_channels());
    println!("  - Hidden channels: {}", model.hidden_channels());
    println!("  - Layers:          {}", model.num_layers());
    println!("  - Highway:         {}", model.has_highway());
    println!();

    // [batch, seq_len, channels, height, width]
    let input = Tensor::<Backend, 5>::random(
        [2, 5, 1, 16, 16],
        Distribution::Uniform(0.0, 1.0),
        &device,
    );

    let (frames, state) = model.forward_with_state(input.clone(), 3);
    println!("Full rollout shape:  {:?}", frames.dims());
    println!("Memory shape:        {:?}", state.memory.dims());

    let future = model.forward(input, 3);
    println!("Predicted frames:    {:?}", future.dims());

    println!("\n=== Basic Example completed! ===");
}
