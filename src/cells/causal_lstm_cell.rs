//! Causal LSTM cell with a cross-layer spatiotemporal memory
//!
//! The causal LSTM extends the ConvLSTM with a second memory `m` that flows
//! upwards through the stacked layers within a time step and then on to the
//! first layer of the next time step. The temporal memory `c` is updated
//! first, and the spatiotemporal memory `m` is then updated conditioned on the
//! fresh `c`, which gives the cascaded ("causal") structure.
//!
//! ## Equations
//!
//! With `*` a same-padded convolution and `σ` the logistic sigmoid:
//!
//! ```text
//! [g_x, i_x, f_x, g'_x, i'_x, f'_x, o_x] = split7(W_x * x)
//! [g_h, i_h, f_h, o_h]                   = split4(W_h * h)
//! [g_c, i_c, f_c]                        = split3(W_c * c)
//!
//! c' = σ(f_x + f_h + f_c + 1) ⊙ c + σ(i_x + i_h + i_c) ⊙ tanh(g_x + g_h + g_c)
//!
//! [g_cm, i_cm, f_cm, o_c] = split4(W_cm * c')
//! [g_m, i_m, f_m]         = split3(W_m * m)
//!
//! m' = σ(f'_x + f_cm + f_m + 1) ⊙ tanh(g_m) + σ(i'_x + i_cm + i_m) ⊙ tanh(g'_x + g_cm)
//!
//! o  = tanh(o_x + o_h + o_c + W_om * m')
//! h' = o ⊙ tanh(W_1x1 * [c', m'])
//! ```
//!
//! Both forget gates carry a constant bias of `1.0`.

use burn::module::Module;
use burn::nn::conv::Conv2d;
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::same_conv;

const FORGET_BIAS: f32 = 1.0;

/// A causal LSTM cell
///
/// Processes a single time step of one layer. The hidden, cell and memory
/// tensors all share the shape `[batch, hidden_channels, height, width]`.
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct CausalLstmCell<B: Backend> {
    in_channels: usize,
    hidden_channels: usize,
    kernel_size: usize,
    conv_x: Conv2d<B>,
    conv_h: Conv2d<B>,
    conv_c: Conv2d<B>,
    conv_m: Conv2d<B>,
    conv_cm: Conv2d<B>,
    conv_om: Conv2d<B>,
    /// 1x1 fusion of `[c', m']`
    conv_cell: Conv2d<B>,
}

impl<B: Backend> CausalLstmCell<B> {
    /// Create a new causal LSTM cell
    ///
    /// # Arguments
    /// * `in_channels` - Channels of the lower input (projected frame, highway output or `h` of the layer below)
    /// * `hidden_channels` - Channels of `h`, `c` and `m`
    /// * `kernel_size` - Odd square kernel size
    /// * `device` - Device to create the module on
    pub fn new(
        in_channels: usize,
        hidden_channels: usize,
        kernel_size: usize,
        device: &B::Device,
    ) -> Self {
        let h = hidden_channels;
        Self {
            in_channels,
            hidden_channels,
            kernel_size,
            conv_x: same_conv(in_channels, 7 * h, kernel_size, device),
            conv_h: same_conv(h, 4 * h, kernel_size, device),
            conv_c: same_conv(h, 3 * h, kernel_size, device),
            conv_m: same_conv(h, 3 * h, kernel_size, device),
            conv_cm: same_conv(h, 4 * h, kernel_size, device),
            conv_om: same_conv(h, h, kernel_size, device),
            conv_cell: same_conv(2 * h, h, 1, device),
        }
    }

    /// Get the input channel count
    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    /// Get the hidden channel count
    pub fn hidden_channels(&self) -> usize {
        self.hidden_channels
    }

    /// Get the kernel size
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Perform one time step of this layer
    ///
    /// # Arguments
    /// * `input` - Lower input `[batch, in_channels, height, width]`
    /// * `hidden` - This layer's previous `h`
    /// * `cell` - This layer's previous `c`
    /// * `memory` - Incoming `m`, from the layer below in this time step or,
    ///   for the first layer, from the top layer of the previous step
    ///
    /// # Returns
    /// `(new_hidden, new_cell, new_memory)`, all shaped like `hidden`
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
        hidden: Tensor<B, 4>,
        cell: Tensor<B, 4>,
        memory: Tensor<B, 4>,
    ) -> (Tensor<B, 4>, Tensor<B, 4>, Tensor<B, 4>) {
        let x = self.conv_x.forward(input).chunk(7, 1);
        let h = self.conv_h.forward(hidden).chunk(4, 1);
        let c = self.conv_c.forward(cell.clone()).chunk(3, 1);

        // Temporal memory
        let i = activation::sigmoid(x[1].clone() + h[1].clone() + c[1].clone());
        let f = activation::sigmoid(x[2].clone() + h[2].clone() + c[2].clone() + FORGET_BIAS);
        let g = (x[0].clone() + h[0].clone() + c[0].clone()).tanh();
        let new_cell = f * cell + i * g;

        // Spatiotemporal memory, conditioned on the fresh cell state
        let cm = self.conv_cm.forward(new_cell.clone()).chunk(4, 1);
        let m = self.conv_m.forward(memory).chunk(3, 1);

        let ii = activation::sigmoid(x[4].clone() + cm[1].clone() + m[1].clone());
        let ff = activation::sigmoid(x[5].clone() + cm[2].clone() + m[2].clone() + FORGET_BIAS);
        let gg = (x[3].clone() + cm[0].clone()).tanh();
        let new_memory = ff * m[0].clone().tanh() + ii * gg;

        // Output
        let o = (x[6].clone() + h[3].clone() + cm[3].clone()
            + self.conv_om.forward(new_memory.clone()))
        .tanh();
        let fused = self
            .conv_cell
            .forward(Tensor::cat(vec![new_cell.clone(), new_memory.clone()], 1));
        let new_hidden = o * fused.tanh();

        (new_hidden, new_cell, new_memory)
    }
}
