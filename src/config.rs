//! Model and training configuration
//!
//! Both configs are plain serde structs built with `with_*` methods. The model
//! config is written next to every checkpoint so that [`crate::trainer::Predicto::load`]
//! can reject a record saved for a different architecture.

use serde::{Deserialize, Serialize};

use crate::error::{PredictoError, Result};

/// What the gradient highway reads at each time step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HighwaySource {
    /// The projected input frame `x_t'`
    #[default]
    ProjectedInput,
    /// The first layer's fresh hidden state `h[0]`
    FirstLayerHidden,
}

/// Architecture of a [`crate::rnn::PredRnnPp`] model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredRnnConfig {
    pub input_channels: usize,
    pub hidden_channels: usize,
    pub kernel_size: usize,
    pub num_layers: usize,
    pub output_channels: usize,
    #[serde(default)]
    pub highway_source: HighwaySource,
}

impl Default for PredRnnConfig {
    fn default() -> Self {
        Self {
            input_channels: 1,
            hidden_channels: 64,
            kernel_size: 3,
            num_layers: 4,
            output_channels: 1,
            highway_source: HighwaySource::ProjectedInput,
        }
    }
}

impl PredRnnConfig {
    /// Default architecture: 1 -> 64 hidden x 4 layers -> 1, 3x3 kernels
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_channels(mut self, input_channels: usize) -> Self {
        self.input_channels = input_channels;
        self
    }

    pub fn with_hidden_channels(mut self, hidden_channels: usize) -> Self {
        self.hidden_channels = hidden_channels;
        self
    }

    pub fn with_kernel_size(mut self, kernel_size: usize) -> Self {
        self.kernel_size = kernel_size;
        self
    }

    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    pub fn with_output_channels(mut self, output_channels: usize) -> Self {
        self.output_channels = output_channels;
        self
    }

    pub fn with_highway_source(mut self, highway_source: HighwaySource) -> Self {
        self.highway_source = highway_source;
        self
    }

    /// Check that the config describes a buildable model
    ///
    /// Kernels must be odd so that same padding preserves the frame size.
    /// Input and output channels must match, since predicted frames are fed
    /// back through the input convolution.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("input_channels", self.input_channels),
            ("hidden_channels", self.hidden_channels),
            ("num_layers", self.num_layers),
            ("output_channels", self.output_channels),
            ("kernel_size", self.kernel_size),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(PredictoError::InvalidConfig {
                detail: format!("{} must be positive", name),
            });
        }
        if self.kernel_size % 2 == 0 {
            return Err(PredictoError::InvalidConfig {
                detail: format!("kernel_size must be odd, got {}", self.kernel_size),
            });
        }
        if self.input_channels != self.output_channels {
            return Err(PredictoError::InvalidConfig {
                detail: format!(
                    "output_channels ({}) must equal input_channels ({})",
                    self.output_channels, self.input_channels
                ),
            });
        }
        Ok(())
    }

    /// First field that differs from `other`, if any
    pub(crate) fn first_difference(&self, other: &Self) -> Option<String> {
        let fields = [
            ("input_channels", self.input_channels, other.input_channels),
            ("hidden_channels", self.hidden_channels, other.hidden_channels),
            ("kernel_size", self.kernel_size, other.kernel_size),
            ("num_layers", self.num_layers, other.num_layers),
            ("output_channels", self.output_channels, other.output_channels),
        ];
        for (name, mine, theirs) in fields {
            if mine != theirs {
                return Some(format!("{}: model has {}, checkpoint has {}", name, mine, theirs));
            }
        }
        if self.highway_source != other.highway_source {
            return Some(format!(
                "highway_source: model has {:?}, checkpoint has {:?}",
                self.highway_source, other.highway_source
            ));
        }
        None
    }
}

/// Optimization settings used by [`crate::trainer::Predicto`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    /// Frames generated after the observed sequence
    pub pred_frames: usize,
    /// Seeds the backend RNG before training when set
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            epochs: 10,
            pred_frames: 10,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_pred_frames(mut self, pred_frames: usize) -> Self {
        self.pred_frames = pred_frames;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
