//! Save/load round trips through the driver

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use burn::module::{AutodiffModule, Module, ModuleVisitor, ParamId};
    use burn::tensor::{backend::Backend as BackendTrait, Distribution, Tensor};
    use predicto::prelude::*;

    type Backend = Autodiff<NdArray<f32>>;

    /// Flattens every float parameter in visit order
    #[derive(Default)]
    struct ParamValues(Vec<f32>);

    impl<B: BackendTrait> ModuleVisitor<B> for ParamValues {
        fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
            let values = tensor.to_data().convert::<f32>().to_vec::<f32>().unwrap();
            self.0.extend(values);
        }
    }

    fn param_values(predicto: &Predicto<Backend>) -> Vec<f32> {
        let mut values = ParamValues::default();
        predicto.model().visit(&mut values);
        values.0
    }

    fn small_config() -> PredRnnConfig {
        PredRnnConfig::new().with_hidden_channels(4).with_num_layers(2)
    }

    fn create_predicto(config: PredRnnConfig) -> Predicto<Backend> {
        Predicto::<Backend>::new(config, ComputeDevice::Cpu).unwrap()
    }

    #[test]
    fn test_save_load_roundtrip_preserves_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model");

        let original = create_predicto(small_config());
        original.save(&path).unwrap();
        assert!(path.with_extension("mpk").exists());
        assert!(path.with_extension("json").exists());

        let mut restored = create_predicto(small_config());
        restored.load(&path).unwrap();

        let device = Default::default();
        let input = Tensor::<NdArray<f32>, 5>::random(
            [2, 3, 1, 8, 8],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let before = original.model().valid().forward(input.clone(), 2);
        let after = restored.model().valid().forward(input, 2);

        let diff: f32 = (before - after).abs().max().into_scalar();
        assert_eq!(diff, 0.0);
    }

    #[test]
    fn test_load_restores_every_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model");

        let original = create_predicto(small_config());
        original.save(&path).unwrap();

        let mut restored = create_predicto(small_config());
        let fresh = param_values(&restored);
        restored.load(&path).unwrap();

        let saved = param_values(&original);
        assert!(!saved.is_empty());
        assert_ne!(fresh, saved, "two fresh models should not share weights");
        assert_eq!(param_values(&restored), saved);
    }

    #[test]
    fn test_from_checkpoint_rebuilds_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model");

        let config = small_config()
            .with_num_layers(3)
            .with_highway_source(HighwaySource::FirstLayerHidden);
        create_predicto(config.clone()).save(&path).unwrap();

        let restored = Predicto::<Backend>::from_checkpoint(&path, ComputeDevice::Cpu).unwrap();
        assert_eq!(restored.model().config(), config);
    }

    #[test]
    fn test_load_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut predicto = create_predicto(small_config());

        let err = predicto.load(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, PredictoError::MissingCheckpoint { .. }));
    }

    #[test]
    fn test_load_rejects_other_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model");
        create_predicto(small_config()).save(&path).unwrap();

        let mut wider = create_predicto(small_config().with_hidden_channels(6));
        let err = wider.load(&path).unwrap_err();

        match err {
            PredictoError::ArchitectureMismatch { detail } => {
                assert!(detail.contains("hidden_channels"))
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
