use burn::module::Module;
use burn::nn::conv::Conv2d;
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::same_conv;

/// Convolutional LSTM cell
///
/// Implements the ConvLSTM equations, with `*` a same-padded convolution:
/// - [i, f, g, o] = split4(W_ih * x + b_ih + W_hh * h + b_hh)
/// - c' = σ(f) ⊙ c + σ(i) ⊙ tanh(g)
/// - h' = σ(o) ⊙ tanh(c')
#[derive(Module, Debug)]
pub struct ConvLstmCell<B: Backend> {
    in_channels: usize,
    hidden_channels: usize,
    kernel_size: usize,
    conv_ih: Conv2d<B>, // in_channels -> 4 * hidden_channels
    conv_hh: Conv2d<B>, // hidden_channels -> 4 * hidden_channels
}

impl<B: Backend> ConvLstmCell<B> {
    /// Create a new ConvLSTM cell
    ///
    /// # Arguments
    /// * `in_channels` - Channels of the input tensor
    /// * `hidden_channels` - Channels of the hidden and cell state
    /// * `kernel_size` - Odd square kernel size, padded to keep `H x W`
    /// * `device` - Device to create the module on
    pub fn new(
        in_channels: usize,
        hidden_channels: usize,
        kernel_size: usize,
        device: &B::Device,
    ) -> Self {
        Self {
            in_channels,
            hidden_channels,
            kernel_size,
            conv_ih: same_conv(in_channels, 4 * hidden_channels, kernel_size, device),
            conv_hh: same_conv(hidden_channels, 4 * hidden_channels, kernel_size, device),
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

    /// Zero `(h, c)` for a batch of `height x width` frames
    pub fn init_state(
        &self,
        batch_size: usize,
        height: usize,
        width: usize,
        device: &B::Device,
    ) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let shape = [batch_size, self.hidden_channels, height, width];
        (Tensor::zeros(shape, device), Tensor::zeros(shape, device))
    }

    /// Perform one time step
    ///
    /// # Arguments
    /// * `input` - Tensor of shape `[batch, in_channels, height, width]`
    /// * `states` - `(hidden, cell)`, each `[batch, hidden_channels, height, width]`
    ///
    /// # Returns
    /// `(new_hidden, new_cell)`
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
        states: (Tensor<B, 4>, Tensor<B, 4>),
    ) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let (hidden, cell) = states;

        let gates = self.conv_ih.forward(input) + self.conv_hh.forward(hidden);

        let chunks = gates.chunk(4, 1);
        let input_gate = activation::sigmoid(chunks[0].clone());
        let forget_gate = activation::sigmoid(chunks[1].clone());
        let candidate = chunks[2].clone().tanh();
        let output_gate = activation::sigmoid(chunks[3].clone());

        let new_cell = forget_gate * cell + input_gate * candidate;
        let new_hidden = output_gate * new_cell.clone().tanh();

        (new_hidden, new_cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_conv_lstm_creation() {
        let device = Default::default();
        let cell = ConvLstmCell::<TestBackend>::new(3, 8, 3, &device);

        assert_eq!(cell.in_channels(), 3);
        assert_eq!(cell.hidden_channels(), 8);
        assert_eq!(cell.kernel_size(), 3);
    }

    #[test]
    fn test_conv_lstm_forward_shapes() {
        let device = Default::default();
        let cell = ConvLstmCell::<TestBackend>::new(1, 8, 3, &device);

        let input = Tensor::<TestBackend, 4>::random([2, 1, 12, 10], Distribution::Default, &device);
        let (h, c) = cell.init_state(2, 12, 10, &device);
        let (new_h, new_c) = cell.forward(input, (h, c));

        assert_eq!(new_h.dims(), [2, 8, 12, 10]);
        assert_eq!(new_c.dims(), [2, 8, 12, 10]);
    }

    #[test]
    fn test_conv_lstm_zero_input_keeps_zero_state() {
        // Zero biases and zero input give candidate = 0, so c stays 0.
        let device = Default::default();
        let cell = ConvLstmCell::<TestBackend>::new(2, 4, 3, &device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 2, 6, 6], &device);
        let (h, c) = cell.init_state(1, 6, 6, &device);
        let (new_h, new_c) = cell.forward(input, (h, c));

        let h_abs: f32 = new_h.abs().sum().into_scalar();
        let c_abs: f32 = new_c.abs().sum().into_scalar();
        assert!(h_abs < 1e-6);
        assert!(c_abs < 1e-6);
    }

    #[test]
    fn test_conv_lstm_hidden_is_bounded() {
        let device = Default::default();
        let cell = ConvLstmCell::<TestBackend>::new(1, 4, 5, &device);

        let input = Tensor::<TestBackend, 4>::random(
            [1, 1, 8, 8],
            Distribution::Uniform(-10.0, 10.0),
            &device,
        );
        let (mut h, mut c) = cell.init_state(1, 8, 8, &device);
        for _ in 0..3 {
            (h, c) = cell.forward(input.clone(), (h, c));
        }

        let max_abs: f32 = h.abs().max().into_scalar();
        assert!(max_abs <= 1.0);
        let c_sum: f32 = c.abs().sum().into_scalar();
        assert!(c_sum > 0.0, "Cell state should evolve with non-zero input");
    }
}
