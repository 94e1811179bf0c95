//! PredRNN++ stacked predictor
//!
//! Full sequence-to-sequence model that owns the per-layer recurrent state and
//! runs the two-phase rollout: an encode phase over observed frames followed
//! by an autoregressive predict phase over the model's own outputs.

use burn::module::Module;
use burn::nn::conv::Conv2d;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::cells::{same_conv, CausalLstmCell, GradientHighway, HighwayState};
use crate::config::{HighwaySource, PredRnnConfig};

/// Recurrent state of one layer
#[derive(Debug, Clone)]
pub struct LayerState<B: Backend> {
    /// Short-term memory `h`
    pub hidden: Tensor<B, 4>,
    /// Long-term memory `c`
    pub cell: Tensor<B, 4>,
}

/// Everything a rollout carries from one time step to the next
///
/// Allocated once per forward call. `layers` is indexed by depth; `memory` is
/// the single spatiotemporal memory threaded through every layer of a step.
#[derive(Debug, Clone)]
pub struct RolloutState<B: Backend> {
    pub layers: Vec<LayerState<B>>,
    pub memory: Tensor<B, 4>,
    pub highway: HighwayState<B>,
}

impl<B: Backend> RolloutState<B> {
    /// Hidden state of the deepest layer
    pub fn top_hidden(&self) -> Tensor<B, 4> {
        // A model always has at least one layer
        self.layers[self.layers.len() - 1].hidden.clone()
    }
}

/// PredRNN++ model
///
/// `input_conv -> [causal cell x num_layers, GHU after layer 0] -> output_conv`
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct PredRnnPp<B: Backend> {
    /// Projects raw frames to `hidden_channels`
    input_conv: Conv2d<B>,
    cells: Vec<CausalLstmCell<B>>,
    /// Absent for single-layer models
    highway: Option<GradientHighway<B>>,
    /// Projects hidden states back to `output_channels`
    output_conv: Conv2d<B>,
    input_channels: usize,
    hidden_channels: usize,
    kernel_size: usize,
    num_layers: usize,
    output_channels: usize,
    highway_from_hidden: bool,
}

impl<B: Backend> PredRnnPp<B> {
    /// Create a new model
    ///
    /// # Panics
    /// If `config` fails [`PredRnnConfig::validate`].
    pub fn new(config: &PredRnnConfig, device: &B::Device) -> Self {
        if let Err(err) = config.validate() {
            panic!("{}", err);
        }

        let hidden = config.hidden_channels;
        let kernel = config.kernel_size;

        let cells = (0..config.num_layers)
            .map(|_| CausalLstmCell::new(hidden, hidden, kernel, device))
            .collect();

        let highway = if config.num_layers > 1 {
            Some(GradientHighway::new(hidden, kernel, device))
        } else {
            None
        };

        Self {
            input_conv: same_conv(config.input_channels, hidden, kernel, device),
            cells,
            highway,
            output_conv: same_conv(hidden, config.output_channels, kernel, device),
            input_channels: config.input_channels,
            hidden_channels: hidden,
            kernel_size: kernel,
            num_layers: config.num_layers,
            output_channels: config.output_channels,
            highway_from_hidden: config.highway_source == HighwaySource::FirstLayerHidden,
        }
    }

    /// Rebuild the config this model was created from
    pub fn config(&self) -> PredRnnConfig {
        let highway_source = if self.highway_from_hidden {
            HighwaySource::FirstLayerHidden
        } else {
            HighwaySource::ProjectedInput
        };
        PredRnnConfig {
            input_channels: self.input_channels,
            hidden_channels: self.hidden_channels,
            kernel_size: self.kernel_size,
            num_layers: self.num_layers,
            output_channels: self.output_channels,
            highway_source,
        }
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    pub fn hidden_channels(&self) -> usize {
        self.hidden_channels
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    /// Whether the model has a gradient highway (more than one layer)
    pub fn has_highway(&self) -> bool {
        self.highway.is_some()
    }

    /// Zero state for a batch of `height x width` frames
    pub fn init_state(
        &self,
        batch_size: usize,
        height: usize,
        width: usize,
        device: &B::Device,
    ) -> RolloutState<B> {
        let shape = [batch_size, self.hidden_channels, height, width];
        let layers = (0..self.num_layers)
            .map(|_| LayerState {
                hidden: Tensor::zeros(shape, device),
                cell: Tensor::zeros(shape, device),
            })
            .collect();

        RolloutState {
            layers,
            memory: Tensor::zeros(shape, device),
            highway: HighwayState::Absent,
        }
    }

    /// Advance every layer by one time step
    ///
    /// Layers run in increasing depth; each one reads and overwrites
    /// `state.memory` before the next. Returns the deepest hidden state.
    pub fn step(&self, projected: Tensor<B, 4>, state: &mut RolloutState<B>) -> Tensor<B, 4> {
        for (i, cell) in self.cells.iter().enumerate() {
            let lower = match i {
                0 => projected.clone(),
                1 => self.highway_step(&projected, state),
                _ => state.layers[i - 1].hidden.clone(),
            };

            let layer = &state.layers[i];
            let (hidden, cell_state, memory) = cell.forward(
                lower,
                layer.hidden.clone(),
                layer.cell.clone(),
                state.memory.clone(),
            );

            state.layers[i] = LayerState {
                hidden,
                cell: cell_state,
            };
            state.memory = memory;
        }

        state.top_hidden()
    }

    fn highway_step(&self, projected: &Tensor<B, 4>, state: &mut RolloutState<B>) -> Tensor<B, 4> {
        let Some(highway) = &self.highway else {
            return state.layers[0].hidden.clone();
        };

        let source = if self.highway_from_hidden {
            state.layers[0].hidden.clone()
        } else {
            projected.clone()
        };
        let previous = std::mem::take(&mut state.highway);
        let z = highway.forward(source, previous);
        state.highway = HighwayState::Present(z.clone());
        z
    }

    /// Run the full rollout and return every projected frame with the final state
    ///
    /// # Arguments
    /// * `input` - Observed frames `[batch, seq_len, input_channels, height, width]`
    /// * `pred_frames` - Number of frames to generate after the observed ones
    ///
    /// # Returns
    /// `([batch, seq_len + pred_frames, output_channels, height, width], state)`
    ///
    /// # Panics
    /// If `input` has no frames or its channel count differs from the model's.
    pub fn forward_with_state(
        &self,
        input: Tensor<B, 5>,
        pred_frames: usize,
    ) -> (Tensor<B, 5>, RolloutState<B>) {
        let device = input.device();
        let [batch_size, seq_len, channels, height, width] = input.dims();
        assert!(seq_len > 0, "input sequence must contain at least one frame");
        assert_eq!(
            channels, self.input_channels,
            "input has {} channels, model expects {}",
            channels, self.input_channels
        );

        tracing::debug!(batch_size, seq_len, pred_frames, height, width, "rollout");

        let mut state = self.init_state(batch_size, height, width, &device);
        let mut hidden_outputs = Vec::with_capacity(seq_len + pred_frames);

        // Encode observed frames
        for t in 0..seq_len {
            let frame = input.clone().narrow(1, t, 1).squeeze::<4>(1);
            let projected = self.input_conv.forward(frame);
            hidden_outputs.push(self.step(projected, &mut state));
        }

        // Predict from the model's own previous output
        for _ in 0..pred_frames {
            let frame = self.output_conv.forward(state.top_hidden());
            let projected = self.input_conv.forward(frame);
            hidden_outputs.push(self.step(projected, &mut state));
        }

        let frames: Vec<Tensor<B, 4>> = hidden_outputs
            .into_iter()
            .map(|hidden| self.output_conv.forward(hidden))
            .collect();

        (Tensor::stack(frames, 1), state)
    }

    /// All `seq_len + pred_frames` projected frames
    pub fn forward_full(&self, input: Tensor<B, 5>, pred_frames: usize) -> Tensor<B, 5> {
        self.forward_with_state(input, pred_frames).0
    }

    /// Predict `pred_frames` future frames
    ///
    /// # Returns
    /// `[batch, pred_frames, output_channels, height, width]`
    ///
    /// # Panics
    /// If `pred_frames` is zero, plus the conditions of [`Self::forward_with_state`].
    pub fn forward(&self, input: Tensor<B, 5>, pred_frames: usize) -> Tensor<B, 5> {
        assert!(pred_frames > 0, "pred_frames must be positive");
        let seq_len = input.dims()[1];
        self.forward_full(input, pred_frames)
            .narrow(1, seq_len, pred_frames)
    }
}
