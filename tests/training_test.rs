//! Training and evaluation through the driver

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::{Distribution, Tensor};
    use ndarray::Array4;
    use predicto::prelude::*;

    type Backend = Autodiff<NdArray<f32>>;

    fn create_predicto(pred_frames: usize) -> Predicto<Backend> {
        let config = PredRnnConfig::new().with_hidden_channels(4).with_num_layers(2);
        Predicto::<Backend>::new(config, ComputeDevice::Cpu)
            .unwrap()
            .with_training_config(TrainingConfig::new().with_pred_frames(pred_frames).with_seed(42))
    }

    fn constant_batch(value: f32) -> FrameBatch<Backend> {
        let device = Default::default();
        FrameBatch::new(
            Tensor::ones([2, 3, 1, 8, 8], &device) * value,
            Tensor::ones([2, 2, 1, 8, 8], &device) * value,
        )
    }

    /// Bright square drifting one pixel right per frame
    fn drifting_square(frames: usize) -> Array4<f32> {
        Array4::from_shape_fn((frames, 1, 8, 8), |(t, _, i, j)| {
            let left = t % 5;
            if (2..5).contains(&i) && (left..left + 3).contains(&j) {
                1.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut predicto = create_predicto(2);
        let batches = vec![constant_batch(0.5)];

        let report = predicto.train(&batches, 1e-2, 15).unwrap();

        assert_eq!(report.epoch_losses.len(), 15);
        let first = report.epoch_losses[0];
        let last = report.final_loss().unwrap();
        assert!(last.is_finite());
        assert!(last < first, "loss should drop: {} -> {}", first, last);
    }

    #[test]
    fn test_train_rejects_mismatched_targets() {
        let mut predicto = create_predicto(3);
        let err = predicto.train(&[constant_batch(0.5)], 1e-3, 1).unwrap_err();

        assert!(matches!(err, PredictoError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_fit_uses_training_config() {
        let config = PredRnnConfig::new().with_hidden_channels(4).with_num_layers(1);
        let mut predicto = Predicto::<Backend>::new(config, ComputeDevice::Cpu)
            .unwrap()
            .with_training_config(TrainingConfig::new().with_pred_frames(2).with_epochs(3));

        let report = predicto.fit(&[constant_batch(0.2)]).unwrap();
        assert_eq!(report.epoch_losses.len(), 3);
    }

    #[test]
    fn test_predict_returns_one_tensor_per_batch() {
        let predicto = create_predicto(2);
        let batches = vec![constant_batch(0.1), constant_batch(0.9)];

        let predictions = predicto.predict(&batches).unwrap();

        assert_eq!(predictions.len(), 2);
        for prediction in predictions {
            assert_eq!(prediction.dims(), [2, 2, 1, 8, 8]);
        }
    }

    #[test]
    fn test_evaluate_selected_metrics() {
        let predicto = create_predicto(2);
        let device = Default::default();
        let batches = SequenceWindows::new(vec![drifting_square(12)], 3, 2)
            .with_batch_size(4)
            .batches::<Backend>(&device);

        let only_mse = predicto.evaluate(&batches, &[Metric::Mse]).unwrap();
        assert!(only_mse.mse.unwrap() >= 0.0);
        assert!(only_mse.ssim.is_none());
        assert!(only_mse.psnr.is_none());
        assert_eq!(only_mse.samples, 8);

        let all = predicto.evaluate(&batches, &Metric::ALL).unwrap();
        let ssim = all.ssim.unwrap();
        assert!(ssim.is_finite() && ssim <= 1.0 && ssim >= -1.0);
        assert!(all.psnr.unwrap().is_finite());
        assert_eq!(all.mse, only_mse.mse);
    }

    #[test]
    fn test_evaluate_small_frames_fail_ssim() {
        let predicto = create_predicto(1);
        let device = Default::default();
        let batch = FrameBatch::<Backend>::new(
            Tensor::zeros([1, 2, 1, 4, 4], &device),
            Tensor::ones([1, 1, 1, 4, 4], &device),
        );

        let err = predicto.evaluate(&[batch], &[Metric::Ssim]).unwrap_err();
        assert!(matches!(err, PredictoError::Metric { .. }));
    }

    #[test]
    fn test_evaluate_psnr_only_on_small_frames() {
        let predicto = create_predicto(1);
        let device = Default::default();
        let batch = FrameBatch::<Backend>::new(
            Tensor::zeros([2, 2, 1, 4, 4], &device),
            Tensor::random([2, 1, 1, 4, 4], Distribution::Uniform(0.0, 1.0), &device),
        );

        let report = predicto.evaluate(&[batch], &[Metric::Psnr]).unwrap();
        assert!(report.psnr.unwrap().is_finite());
        assert!(report.ssim.is_none());
        assert!(report.mse.is_none());
        assert_eq!(report.samples, 2);
    }
}
