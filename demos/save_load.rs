//! Save and Load Example
//!
//! Writes a checkpoint, restores it into a fresh driver and checks that both
//! produce the same prediction.

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::tensor::{Distribution, Tensor};
use predicto::prelude::*;

type Backend = Autodiff<NdArray<f32>>;

fn main() -> Result<(), PredictoError> {
    println!("=== Model Save/Load Example ===\n");

    let config = PredRnnConfig::new().with_hidden_channels(8).with_num_layers(2);
    let predicto = Predicto::<Backend>::new(config, ComputeDevice::Cpu)?;

    let path = std::env::temp_dir().join("predicto_demo").join("model");
    predicto.save(&path)?;
    println!("Saved to {}.{{mpk,json}}", path.display());

    let restored = Predicto::<Backend>::from_checkpoint(&path, ComputeDevice::Cpu)?;
    println!("Restored architecture: {:?}", restored.model().config());

    let device = Default::default();
    let input = Tensor::<NdArray<f32>, 5>::random(
        [1, 4, 1, 16, 16],
        Distribution::Uniform(0.0, 1.0),
        &device,
    );
    let before = predicto.model().valid().forward(input.clone(), 2);
    let after = restored.model().valid().forward(input, 2);
    let diff: f32 = (before - after).abs().max().into_scalar();
    println!("Max difference after reload: {}", diff);

    println!("\n=== Save/Load Example completed! ===");
    Ok(())
}
