//! # Stacked Sequence Predictors
//!
//! Complete models that own the recurrent state and the time loop. **These are
//! the primary APIs most users should use.**
//!
//! ## Quick Start
//!
//! ```ignore
//! use predicto::prelude::*;
//! use burn::tensor::Tensor;
//!
//! let config = PredRnnConfig::new().with_hidden_channels(32);
//! let model = PredRnnPp::<Backend>::new(&config, &device);
//!
//! // 10 observed 64x64 grayscale frames per sample
//! let input: Tensor<Backend, 5> = Tensor::zeros([4, 10, 1, 64, 64], &device);
//! let future = model.forward(input, 5);
//! // future: [4, 5, 1, 64, 64]
//! ```
//!
//! ## Rollout
//!
//! ```text
//! INIT     h[i], c[i], m = 0; z = Absent
//! ENCODE   for each observed frame x_t:
//!            x' = input_conv(x_t)
//!            layer 0 <- x'
//!            layer 1 <- z = GHU(x', z)
//!            layer i <- h[i-1]           (i > 1)
//!            m threads through layers 0..N in order
//! PREDICT  for each future step:
//!            x' = input_conv(output_conv(h[N-1]))
//!            same per-step logic
//! PROJECT  output_conv on every recorded h[N-1]
//! ```
//!
//! `h`, `c` and `m` are never reset between ENCODE and PREDICT. The predict
//! phase sees only its own outputs, so errors compound over long horizons.
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | input | `[batch, seq_len, input_channels, height, width]` |
//! | `forward` output | `[batch, pred_frames, output_channels, height, width]` |
//! | `forward_full` output | `[batch, seq_len + pred_frames, output_channels, height, width]` |
//!
//! ## Highway Source
//!
//! [`HighwaySource`](crate::config::HighwaySource) picks what the gradient
//! highway reads: the projected frame (default) or the first layer's fresh
//! hidden state. Single-layer models have no highway at all.

pub mod predrnn_pp;

pub use predrnn_pp::{LayerState, PredRnnPp, RolloutState};
