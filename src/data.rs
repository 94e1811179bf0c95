//! Frame batches and a sliding-window batcher
//!
//! The driver takes a slice of [`FrameBatch`]es, which training walks once per
//! epoch. [`SequenceWindows`]
//! is a small helper that cuts long host-side videos into
//! `(observed, future)` windows and stacks them into batches.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ndarray::{s, Array4};
use rand::prelude::*;

/// One batch of observed frames and the frames that follow them
///
/// Both tensors are `[batch, time, channels, height, width]`.
#[derive(Debug, Clone)]
pub struct FrameBatch<B: Backend> {
    pub inputs: Tensor<B, 5>,
    pub targets: Tensor<B, 5>,
}

impl<B: Backend> FrameBatch<B> {
    pub fn new(inputs: Tensor<B, 5>, targets: Tensor<B, 5>) -> Self {
        Self { inputs, targets }
    }

    pub fn batch_size(&self) -> usize {
        self.inputs.dims()[0]
    }

    /// Number of future frames in `targets`
    pub fn target_frames(&self) -> usize {
        self.targets.dims()[1]
    }
}

/// Sliding `(input_len, target_len)` windows over a set of videos
///
/// Each video is a host array `[time, channels, height, width]`; all videos
/// must share channels and frame size.
#[derive(Debug, Clone)]
pub struct SequenceWindows {
    videos: Vec<Array4<f32>>,
    input_len: usize,
    target_len: usize,
    stride: usize,
    batch_size: usize,
    shuffle_seed: Option<u64>,
}

impl SequenceWindows {
    /// Create a batcher with stride 1, batch size 1 and no shuffling
    ///
    /// # Panics
    /// If `input_len` or `target_len` is zero, or the videos disagree on
    /// channels or frame size.
    pub fn new(videos: Vec<Array4<f32>>, input_len: usize, target_len: usize) -> Self {
        if input_len == 0 || target_len == 0 {
            panic!(
                "Window lengths must be positive, got input {} and target {}",
                input_len, target_len
            );
        }
        if let Some(first) = videos.first() {
            let frame = &first.shape()[1..];
            if videos.iter().any(|video| &video.shape()[1..] != frame) {
                panic!("All videos must share channels and frame size");
            }
        }

        Self {
            videos,
            input_len,
            target_len,
            stride: 1,
            batch_size: 1,
            shuffle_seed: None,
        }
    }

    /// Set the distance between window starts (default: 1)
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Set the number of windows per batch (default: 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Shuffle window order with a fixed seed
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// `(video, start)` of every window, in batching order
    pub fn windows(&self) -> Vec<(usize, usize)> {
        let span = self.input_len + self.target_len;
        let mut windows: Vec<(usize, usize)> = self
            .videos
            .iter()
            .enumerate()
            .flat_map(|(v, video)| {
                let frames = video.shape()[0];
                let last = (frames + 1).saturating_sub(span);
                (0..last).step_by(self.stride).map(move |start| (v, start))
            })
            .collect();

        if let Some(seed) = self.shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            windows.shuffle(&mut rng);
        }
        windows
    }

    pub fn len(&self) -> usize {
        self.windows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stack the windows into batches on `device`
    ///
    /// The final batch is smaller when the window count is not a multiple of
    /// the batch size.
    pub fn batches<B: Backend>(&self, device: &B::Device) -> Vec<FrameBatch<B>> {
        let Some(first) = self.videos.first() else {
            return Vec::new();
        };
        let (channels, height, width) = (first.shape()[1], first.shape()[2], first.shape()[3]);

        self.windows()
            .chunks(self.batch_size)
            .map(|chunk| {
                let mut inputs = Vec::new();
                let mut targets = Vec::new();
                for &(v, start) in chunk {
                    let video = &self.videos[v];
                    let split = start + self.input_len;
                    inputs.extend(video.slice(s![start..split, .., .., ..]).iter().copied());
                    targets.extend(
                        video
                            .slice(s![split..split + self.target_len, .., .., ..])
                            .iter()
                            .copied(),
                    );
                }

                let n = chunk.len();
                let inputs = Tensor::<B, 1>::from_floats(inputs.as_slice(), device)
                    .reshape([n, self.input_len, channels, height, width]);
                let targets = Tensor::<B, 1>::from_floats(targets.as_slice(), device)
                    .reshape([n, self.target_len, channels, height, width]);
                FrameBatch::new(inputs, targets)
            })
            .collect()
    }
}
