//! Training Demo - Moving Square
//!
//! Trains a small PredRNN++ on synthetic videos of a square drifting across
//! the frame, then reports MSE, SSIM and PSNR on held-out windows.
//!
//! Run with `RUST_LOG=info` to see per-epoch losses.

use burn::backend::{Autodiff, NdArray};
use ndarray::Array4;
use predicto::prelude::*;
use tracing_subscriber::EnvFilter;

type Backend = Autodiff<NdArray<f32>>;

/// `frames` of a 3x3 square moving `speed` pixels per frame on a 16x16 canvas
fn moving_square(frames: usize, speed: usize, row: usize) -> Array4<f32> {
    Array4::from_shape_fn((frames, 1, 16, 16), |(t, _, i, j)| {
        let left = (t * speed) % 13;
        if (row..row + 3).contains(&i) && (left..left + 3).contains(&j) {
            1.0
        } else {
            0.0
        }
    })
}

fn main() -> Result<(), PredictoError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Predicto Training Example ===\n");

    let config = PredRnnConfig::new().with_hidden_channels(8).with_num_layers(2);
    let training = TrainingConfig::new()
        .with_learning_rate(5e-3)
        .with_epochs(5)
        .with_pred_frames(3)
        .with_seed(1234);

    let mut predicto = Predicto::<Backend>::new(config, ComputeDevice::Accelerator(0))?
        .with_training_config(training);

    let device = predicto.device().clone();
    let train = SequenceWindows::new(vec![moving_square(30, 1, 2), moving_square(30, 2, 9)], 5, 3)
        .with_stride(2)
        .with_batch_size(4)
        .with_shuffle(7)
        .batches::<Backend>(&device);
    let test = SequenceWindows::new(vec![moving_square(20, 1, 6)], 5, 3)
        .with_batch_size(4)
        .batches::<Backend>(&device);

    println!("Training on {} batches...", train.len());
    let report = predicto.fit(&train)?;
    for (epoch, loss) in report.epoch_losses.iter().enumerate() {
        println!("  Epoch [{}/{}], Loss: {:.4}", epoch + 1, report.epoch_losses.len(), loss);
    }

    let scores = predicto.evaluate(&test, &Metric::ALL)?;
    println!();
    println!("Evaluation on {} samples:", scores.samples);
    println!("  Average MSE:  {:.4}", scores.mse.unwrap_or(f64::NAN));
    println!("  Average SSIM: {:.4}", scores.ssim.unwrap_or(f64::NAN));
    println!("  Average PSNR: {:.4}", scores.psnr.unwrap_or(f64::NAN));

    println!("\n=== Training Example completed! ===");
    Ok(())
}
