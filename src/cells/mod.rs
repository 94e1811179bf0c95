//! # Recurrent Cell Implementations
//!
//! Single-timestep convolutional recurrent cells. They are composed by the
//! stacked predictor in [`crate::rnn`], which owns the per-layer state and the
//! time loop.
//!
//! ## Cell Types
//!
//! | Cell | Description | State |
//! |------|-------------|-------|
//! | [`ConvLstmCell`] | Convolutional LSTM | `(h, c)` |
//! | [`CausalLstmCell`] | Cascaded LSTM with cross-layer memory | `(h, c, m)` |
//! | [`GradientHighway`] | Gated shortcut between layers 1 and 2 | `z` |
//!
//! ## Tensor Shapes
//!
//! All cells work on 4D frames:
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | `input` | `[batch, in_channels, height, width]` |
//! | `h`, `c`, `m`, `z` | `[batch, hidden_channels, height, width]` |
//!
//! Convolutions use stride 1 and `kernel_size / 2` zero padding, so spatial
//! size is preserved for odd kernels. A channel count that disagrees with the
//! cell's configuration panics inside the convolution.
//!
//! ## Initialization
//!
//! Kernels are Xavier-uniform, biases are zero.

pub mod causal_lstm_cell;
pub mod conv_lstm_cell;
pub mod ghu;

pub use causal_lstm_cell::CausalLstmCell;
pub use conv_lstm_cell::ConvLstmCell;
pub use ghu::{GradientHighway, HighwayState};

use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Initializer, PaddingConfig2d};
use burn::tensor::backend::Backend;

/// Stride-1 convolution that keeps `H x W` for odd kernels
pub(crate) fn same_conv<B: Backend>(
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    device: &B::Device,
) -> Conv2d<B> {
    let padding = kernel_size / 2;
    let mut conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
        .with_bias(true)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device);
    // Burn draws the bias from the weight initializer
    conv.bias = Some(Initializer::Zeros.init::<B, 1, _>([out_channels], device));
    conv
}
