//! # Predicto - Video Frame Prediction (Rust)
//!
//! Recurrent convolutional frame predictors built on the Burn framework.
//!
//! ## Features
//!
//! - **PredRNN++**: stacked causal LSTM cells with a gradient highway unit
//! - **ConvLSTM**: the classic convolutional LSTM cell
//! - **Two-phase rollout**: encode observed frames, then predict autoregressively
//! - **Training**: Adam on MSE, one step per batch
//! - **Evaluation**: MSE, SSIM and PSNR
//! - **Checkpoints**: named parameter records plus a JSON architecture file
//!
//! ## Quick Start
//!
//! ```rust
//! use predicto::prelude::*;
//!
//! let config = PredRnnConfig::new()
//!     .with_hidden_channels(32)
//!     .with_num_layers(3);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.input_channels, 1);
//! ```
//!
//! ## Model-level Usage
//!
//! ```ignore
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use predicto::prelude::*;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let model = PredRnnPp::<Backend>::new(&PredRnnConfig::new(), &device);
//! let input = Tensor::<Backend, 5>::zeros([2, 5, 1, 16, 16], &device);
//! let future = model.forward(input, 3); // [2, 3, 1, 16, 16]
//! ```
//!
//! ## Training
//!
//! ```ignore
//! use burn::backend::{Autodiff, NdArray};
//! use predicto::prelude::*;
//!
//! type Backend = Autodiff<NdArray<f32>>;
//!
//! let mut predicto = Predicto::<Backend>::new(PredRnnConfig::new(), ComputeDevice::Cpu)?;
//! predicto.train(&train_batches, 1e-3, 10)?;
//! let report = predicto.evaluate(&test_batches, &Metric::ALL)?;
//! predicto.save("runs/model")?;
//! ```

pub mod cells;
pub mod config;
pub mod data;
pub mod device;
pub mod error;
pub mod metrics;
pub mod rnn;
pub mod trainer;

pub mod prelude {
    pub use crate::cells::{CausalLstmCell, ConvLstmCell, GradientHighway, HighwayState};
    pub use crate::config::{HighwaySource, PredRnnConfig, TrainingConfig};
    pub use crate::data::{FrameBatch, SequenceWindows};
    pub use crate::device::{ComputeDevice, DeviceProbe};
    pub use crate::error::PredictoError;
    pub use crate::metrics::Metric;
    pub use crate::rnn::{LayerState, PredRnnPp, RolloutState};
    pub use crate::trainer::{EvaluationReport, Predicto, TrainingReport};
}
