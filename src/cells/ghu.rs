//! Gradient Highway Unit
//!
//! A gated shortcut placed between the first and second layers of the stacked
//! predictor. Its output `z` is an adaptive mix of the raw input and a
//! transform of its own previous output, which gives deeper layers a short
//! gradient path back to the bottom of the stack:
//!
//! ```text
//! g = σ(W_g * [z_in, z_prev])
//! z = g ⊙ z_in + (1 - g) ⊙ (W_z * z_prev)
//! ```
//!
//! Input and output share one channel count, since `z_in` passes through the
//! gate unchanged.

use burn::module::Module;
use burn::nn::conv::Conv2d;
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::same_conv;

/// Previous output of a [`GradientHighway`]
///
/// At the first time step of a sequence there is no previous output. Callers
/// pass [`HighwayState::Absent`], which the unit treats as a zero tensor shaped
/// like its input.
#[derive(Debug, Clone)]
pub enum HighwayState<B: Backend> {
    /// No previous output (sequence start)
    Absent,
    /// Output of the previous time step
    Present(Tensor<B, 4>),
}

impl<B: Backend> HighwayState<B> {
    /// Whether a previous output is available
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// The previous output, or zeros shaped like `like`
    pub fn into_tensor_like(self, like: &Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Absent => like.zeros_like(),
            Self::Present(z) => z,
        }
    }
}

impl<B: Backend> Default for HighwayState<B> {
    fn default() -> Self {
        Self::Absent
    }
}

/// Gradient Highway Unit
#[derive(Module, Debug)]
pub struct GradientHighway<B: Backend> {
    channels: usize,
    conv_gate: Conv2d<B>,
    conv_z: Conv2d<B>,
}

impl<B: Backend> GradientHighway<B> {
    /// Create a new highway unit over `channels`-channel maps
    pub fn new(channels: usize, kernel_size: usize, device: &B::Device) -> Self {
        Self {
            channels,
            conv_gate: same_conv(2 * channels, channels, kernel_size, device),
            conv_z: same_conv(channels, channels, kernel_size, device),
        }
    }

    /// Get the channel count of input and output
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Compute the highway output for one time step
    pub fn forward(&self, input: Tensor<B, 4>, previous: HighwayState<B>) -> Tensor<B, 4> {
        let previous = previous.into_tensor_like(&input);

        let gate_input = Tensor::cat(vec![input.clone(), previous.clone()], 1);
        let gate = activation::sigmoid(self.conv_gate.forward(gate_input));
        let carried = self.conv_z.forward(previous);

        gate.clone() * input + (gate.ones_like() - gate) * carried
    }
}
