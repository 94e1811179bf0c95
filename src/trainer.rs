//! Training, evaluation and checkpoint driver
//!
//! [`Predicto`] wraps a [`PredRnnPp`] on an autodiff backend and provides the
//! user-facing workflow: `train`, `predict`, `evaluate`, `save` and `load`.
//! Everything runs sequentially on the device chosen at construction.
//!
//! ## Checkpoint Layout
//!
//! `save("runs/model")` writes two files:
//!
//! | File | Content |
//! |------|---------|
//! | `runs/model.mpk` | Named parameter record (`NamedMpkFileRecorder`, full precision) |
//! | `runs/model.json` | [`PredRnnConfig`] of the saved model |
//!
//! `load` compares the JSON config with the live model before reading any
//! tensors, so a checkpoint for another architecture is rejected with
//! [`PredictoError::ArchitectureMismatch`].

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::{AutodiffModule, Module};
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::record::{FileRecorder, FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};

use crate::config::{PredRnnConfig, TrainingConfig};
use crate::data::FrameBatch;
use crate::device::{resolve, ComputeDevice, DeviceProbe};
use crate::error::{PredictoError, Result};
use crate::metrics::{sample_scores, to_array, Metric};
use crate::rnn::PredRnnPp;

type CheckpointRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Loss recorded after every epoch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    /// Loss of the **last batch** of each epoch, not an epoch average
    pub epoch_losses: Vec<f64>,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

/// Mean scores over a test set; `None` for metrics that were not requested
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationReport {
    /// Mean of the per-batch mean squared errors
    pub mse: Option<f64>,
    /// Mean of the per-sample SSIM
    pub ssim: Option<f64>,
    /// Mean of the per-sample PSNR, in dB
    pub psnr: Option<f64>,
    /// Number of samples scored
    pub samples: usize,
}

/// Frame predictor with training, evaluation and persistence
///
/// # Type Parameters
/// * `B` - An autodiff backend, e.g. `Autodiff<NdArray<f32>>`
pub struct Predicto<B: AutodiffBackend> {
    model: PredRnnPp<B>,
    device: B::Device,
    training: TrainingConfig,
}

impl<B: AutodiffBackend + DeviceProbe> Predicto<B> {
    /// Build a fresh model on the requested device
    ///
    /// An unavailable accelerator falls back to the default device with a warning.
    pub fn new(config: PredRnnConfig, device: ComputeDevice) -> Result<Self> {
        config.validate()?;
        let device = resolve::<B>(device);
        let model = PredRnnPp::new(&config, &device);
        Ok(Self::from_model(model, device))
    }

    /// Build a model from a checkpoint written by [`Self::save`]
    pub fn from_checkpoint(path: impl AsRef<Path>, device: ComputeDevice) -> Result<Self> {
        let config = read_config(path.as_ref())?;
        let mut predicto = Self::new(config, device)?;
        predicto.load(path)?;
        Ok(predicto)
    }
}

impl<B: AutodiffBackend> Predicto<B> {
    /// Wrap an existing model
    pub fn from_model(model: PredRnnPp<B>, device: B::Device) -> Self {
        Self {
            model,
            device,
            training: TrainingConfig::default(),
        }
    }

    /// Replace the training settings
    pub fn with_training_config(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn model(&self) -> &PredRnnPp<B> {
        &self.model
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn training_config(&self) -> &TrainingConfig {
        &self.training
    }

    /// Frames generated per sample by `train`, `predict` and `evaluate`
    pub fn pred_frames(&self) -> usize {
        self.training.pred_frames
    }

    /// Train with the stored [`TrainingConfig`]
    pub fn fit(&mut self, batches: &[FrameBatch<B>]) -> Result<TrainingReport> {
        let (learning_rate, epochs) = (self.training.learning_rate, self.training.epochs);
        self.train(batches, learning_rate, epochs)
    }

    /// Minimize the MSE between predicted and target frames with Adam
    ///
    /// One optimizer step per batch. The loss logged and recorded for each
    /// epoch is the loss of its last batch.
    pub fn train(
        &mut self,
        batches: &[FrameBatch<B>],
        learning_rate: f64,
        epochs: usize,
    ) -> Result<TrainingReport> {
        if batches.is_empty() {
            return Err(PredictoError::EmptyData { operation: "train" });
        }
        for batch in batches {
            self.check_batch(&batch.inputs.dims(), &batch.targets.dims())?;
        }
        if let Some(seed) = self.training.seed {
            B::seed(seed);
        }

        let pred_frames = self.pred_frames();
        let mut optim = AdamConfig::new().init::<B, PredRnnPp<B>>();
        let mut report = TrainingReport::default();

        for epoch in 0..epochs {
            let mut last_loss = f64::NAN;
            for batch in batches {
                let output = self.model.forward(batch.inputs.clone(), pred_frames);
                let loss = MseLoss::new().forward(output, batch.targets.clone(), Reduction::Mean);
                last_loss = loss.clone().into_scalar().elem::<f64>();

                let grads = GradientsParams::from_grads(loss.backward(), &self.model);
                self.model = optim.step(learning_rate, self.model.clone(), grads);
            }

            tracing::info!(epoch = epoch + 1, epochs, loss = last_loss, "Epoch finished");
            report.epoch_losses.push(last_loss);
        }

        Ok(report)
    }

    /// Predict future frames for every batch
    ///
    /// Runs on the non-autodiff module and logs the mean loss against the
    /// batch targets.
    pub fn predict(
        &self,
        batches: &[FrameBatch<B>],
    ) -> Result<Vec<Tensor<B::InnerBackend, 5>>> {
        if batches.is_empty() {
            return Err(PredictoError::EmptyData { operation: "predict" });
        }

        let model = self.model.valid();
        let mut predictions = Vec::with_capacity(batches.len());
        let mut total_loss = 0.0;

        for batch in batches {
            self.check_batch(&batch.inputs.dims(), &batch.targets.dims())?;
            let output = model.forward(batch.inputs.clone().inner(), self.pred_frames());
            total_loss += batch_mse(output.clone(), batch.targets.clone().inner());
            predictions.push(output);
        }

        tracing::info!(
            batches = batches.len(),
            loss = total_loss / batches.len() as f64,
            "Test loss"
        );
        Ok(predictions)
    }

    /// Score predictions on a test set
    ///
    /// MSE is averaged over batches; SSIM and PSNR over samples, each sample
    /// using its own target's `max - min` as data range.
    pub fn evaluate(
        &self,
        batches: &[FrameBatch<B>],
        metrics: &[Metric],
    ) -> Result<EvaluationReport> {
        if batches.is_empty() {
            return Err(PredictoError::EmptyData {
                operation: "evaluate",
            });
        }

        let wants_mse = metrics.contains(&Metric::Mse);
        let wants_ssim = metrics.contains(&Metric::Ssim);
        let wants_psnr = metrics.contains(&Metric::Psnr);

        let model = self.model.valid();
        let mut total_mse = 0.0;
        let mut ssim_scores = Vec::new();
        let mut psnr_scores = Vec::new();
        let mut samples = 0;

        for batch in batches {
            self.check_batch(&batch.inputs.dims(), &batch.targets.dims())?;
            let output = model.forward(batch.inputs.clone().inner(), self.pred_frames());
            let targets = batch.targets.clone().inner();
            samples += batch.batch_size();

            if wants_mse {
                total_mse += batch_mse(output.clone(), targets.clone());
            }
            if wants_ssim || wants_psnr {
                let prediction = to_array(output)?;
                let truth = to_array(targets)?;
                if wants_ssim {
                    ssim_scores.extend(sample_scores(prediction.view(), truth.view(), Metric::Ssim)?);
                }
                if wants_psnr {
                    psnr_scores.extend(sample_scores(prediction.view(), truth.view(), Metric::Psnr)?);
                }
            }
        }

        let report = EvaluationReport {
            mse: wants_mse.then(|| total_mse / batches.len() as f64),
            ssim: wants_ssim.then(|| mean(&ssim_scores)),
            psnr: wants_psnr.then(|| mean(&psnr_scores)),
            samples,
        };
        tracing::info!(
            mse = ?report.mse,
            ssim = ?report.ssim,
            psnr = ?report.psnr,
            samples,
            "Evaluation finished"
        );
        Ok(report)
    }

    /// Write the parameter record and the model config
    ///
    /// Any extension on `path` is replaced; see the module docs for the layout.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        self.model
            .clone()
            .save_file(path.to_path_buf(), &CheckpointRecorder::new())?;
        let config = serde_json::to_string_pretty(&self.model.config())?;
        fs::write(config_file(path), config)?;

        tracing::info!(path = %record_file::<B>(path).display(), "Model saved");
        Ok(())
    }

    /// Replace the parameters with a checkpoint written by [`Self::save`]
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let record = record_file::<B>(path);
        if !record.exists() {
            return Err(PredictoError::MissingCheckpoint { path: record });
        }

        let saved = read_config(path)?;
        if let Some(detail) = self.model.config().first_difference(&saved) {
            return Err(PredictoError::ArchitectureMismatch { detail });
        }

        self.model = self
            .model
            .clone()
            .load_file(path.to_path_buf(), &CheckpointRecorder::new(), &self.device)?;

        tracing::info!(path = %record.display(), "Model loaded");
        Ok(())
    }

    fn check_batch(&self, inputs: &[usize; 5], targets: &[usize; 5]) -> Result<()> {
        let [batch, seq_len, channels, height, width] = *inputs;
        if seq_len == 0 || channels != self.model.input_channels() {
            return Err(PredictoError::ShapeMismatch {
                context: "inputs",
                expected: vec![batch, seq_len.max(1), self.model.input_channels(), height, width],
                actual: inputs.to_vec(),
            });
        }

        let expected = [
            batch,
            self.pred_frames(),
            self.model.output_channels(),
            height,
            width,
        ];
        if *targets != expected {
            return Err(PredictoError::ShapeMismatch {
                context: "targets",
                expected: expected.to_vec(),
                actual: targets.to_vec(),
            });
        }
        Ok(())
    }
}

fn batch_mse<B: Backend>(output: Tensor<B, 5>, targets: Tensor<B, 5>) -> f64 {
    MseLoss::new()
        .forward(output, targets, Reduction::Mean)
        .into_scalar()
        .elem::<f64>()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn record_file<B: Backend>(path: &Path) -> PathBuf {
    path.with_extension(<CheckpointRecorder as FileRecorder<B>>::file_extension())
}

fn config_file(path: &Path) -> PathBuf {
    path.with_extension("json")
}

fn read_config(path: &Path) -> Result<PredRnnConfig> {
    let file = config_file(path);
    if !file.exists() {
        return Err(PredictoError::MissingCheckpoint { path: file });
    }
    Ok(serde_json::from_str(&fs::read_to_string(file)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn tiny_predicto() -> Predicto<TestBackend> {
        let config = PredRnnConfig::new().with_hidden_channels(4).with_num_layers(2);
        Predicto::<TestBackend>::new(config, ComputeDevice::Cpu)
            .unwrap()
            .with_training_config(TrainingConfig::new().with_pred_frames(2))
    }

    fn batch(inputs: [usize; 5], targets: [usize; 5]) -> FrameBatch<TestBackend> {
        let device = Default::default();
        FrameBatch::new(Tensor::zeros(inputs, &device), Tensor::zeros(targets, &device))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = PredRnnConfig::new().with_kernel_size(2);
        assert!(matches!(
            Predicto::<TestBackend>::new(config, ComputeDevice::Cpu),
            Err(PredictoError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_new_rejects_unequal_channels() {
        let config = PredRnnConfig::new()
            .with_hidden_channels(4)
            .with_input_channels(2)
            .with_output_channels(1);
        assert!(matches!(
            Predicto::<TestBackend>::new(config, ComputeDevice::Cpu),
            Err(PredictoError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_check_batch_accepts_matching_shapes() {
        let predicto = tiny_predicto();
        let ok = batch([2, 3, 1, 8, 8], [2, 2, 1, 8, 8]);
        assert!(predicto
            .check_batch(&ok.inputs.dims(), &ok.targets.dims())
            .is_ok());
    }

    #[test]
    fn test_check_batch_rejects_wrong_targets() {
        let predicto = tiny_predicto();
        let bad = batch([2, 3, 1, 8, 8], [2, 5, 1, 8, 8]);
        let err = predicto
            .check_batch(&bad.inputs.dims(), &bad.targets.dims())
            .unwrap_err();
        assert!(matches!(err, PredictoError::ShapeMismatch { context: "targets", .. }));
    }

    #[test]
    fn test_check_batch_rejects_wrong_channels() {
        let predicto = tiny_predicto();
        let bad = batch([2, 3, 3, 8, 8], [2, 2, 1, 8, 8]);
        let err = predicto
            .check_batch(&bad.inputs.dims(), &bad.targets.dims())
            .unwrap_err();
        assert!(matches!(err, PredictoError::ShapeMismatch { context: "inputs", .. }));
    }

    #[test]
    fn test_empty_data_is_an_error() {
        let mut predicto = tiny_predicto();
        assert!(matches!(
            predicto.train(&[], 1e-3, 1),
            Err(PredictoError::EmptyData { operation: "train" })
        ));
        assert!(matches!(
            predicto.evaluate(&[], &Metric::ALL),
            Err(PredictoError::EmptyData { .. })
        ));
    }

    #[test]
    fn test_checkpoint_paths() {
        let path = Path::new("runs/model.pth");
        assert_eq!(record_file::<TestBackend>(path), PathBuf::from("runs/model.mpk"));
        assert_eq!(config_file(path), PathBuf::from("runs/model.json"));
    }

    #[test]
    fn test_mean_of_empty_is_nan() {
        assert!(mean(&[]).is_nan());
        assert_eq!(mean(&[1.0, 3.0]), 2.0);
    }
}
