//! Frame quality metrics
//!
//! Metrics are computed on host arrays (`ndarray`) after the prediction has
//! been pulled off the backend. SSIM and PSNR take an explicit `data_range`;
//! the evaluation driver recomputes it per sample as `max(target) - min(target)`.
//!
//! SSIM follows the usual Gaussian-free formulation: a 7x7 uniform window,
//! `K1 = 0.01`, `K2 = 0.03`, sample covariance, averaged over every window
//! that fits inside the frame. Multi-frame samples are scored frame by frame
//! and channel by channel and then averaged.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ndarray::{Array4, ArrayD, ArrayView2, ArrayView4, ArrayViewD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{PredictoError, Result};

/// Side of the SSIM window
pub const SSIM_WINDOW: usize = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Metrics understood by [`crate::trainer::Predicto::evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Mse,
    Ssim,
    Psnr,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Mse, Metric::Ssim, Metric::Psnr];
}

/// Copy a tensor to a host array of the same shape
pub fn to_array<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<ArrayD<f32>> {
    let dims = tensor.dims();
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|err| PredictoError::Metric {
            reason: format!("cannot read tensor data: {:?}", err),
        })?;
    ArrayD::from_shape_vec(IxDyn(&dims), values).map_err(|err| PredictoError::Metric {
        reason: err.to_string(),
    })
}

/// Mean squared error over all elements
pub fn mse(prediction: ArrayViewD<'_, f32>, target: ArrayViewD<'_, f32>) -> Result<f64> {
    check_same_shape(prediction.shape(), target.shape())?;
    if target.is_empty() {
        return Err(PredictoError::Metric {
            reason: "cannot score empty frames".to_string(),
        });
    }
    let total: f64 = prediction
        .iter()
        .zip(target.iter())
        .map(|(&p, &t)| {
            let diff = p as f64 - t as f64;
            diff * diff
        })
        .sum();
    Ok(total / target.len() as f64)
}

/// `max - min` of the ground truth
pub fn data_range(target: ArrayViewD<'_, f32>) -> f64 {
    let (min, max) = target.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        let v = v as f64;
        (lo.min(v), hi.max(v))
    });
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

/// Peak signal-to-noise ratio in dB
///
/// Identical inputs give `+inf`.
pub fn psnr(
    prediction: ArrayViewD<'_, f32>,
    target: ArrayViewD<'_, f32>,
    data_range: f64,
) -> Result<f64> {
    let err = mse(prediction, target)?;
    if err == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (data_range * data_range / err).log10())
}

/// Structural similarity of two single-channel frames
pub fn ssim_2d(
    prediction: ArrayView2<'_, f32>,
    target: ArrayView2<'_, f32>,
    data_range: f64,
) -> Result<f64> {
    check_same_shape(prediction.shape(), target.shape())?;
    let (height, width) = target.dim();
    if height < SSIM_WINDOW || width < SSIM_WINDOW {
        return Err(PredictoError::Metric {
            reason: format!(
                "SSIM needs frames of at least {0}x{0}, got {1}x{2}",
                SSIM_WINDOW, height, width
            ),
        });
    }

    let c1 = (K1 * data_range).powi(2);
    let c2 = (K2 * data_range).powi(2);
    let n = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = n / (n - 1.0);

    let window = (SSIM_WINDOW, SSIM_WINDOW);
    let mut total = 0.0;
    let mut count = 0usize;
    for (xw, yw) in prediction.windows(window).into_iter().zip(target.windows(window)) {
        let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (&x, &y) in xw.iter().zip(yw.iter()) {
            let (x, y) = (x as f64, y as f64);
            sx += x;
            sy += y;
            sxx += x * x;
            syy += y * y;
            sxy += x * y;
        }
        let (ux, uy) = (sx / n, sy / n);
        let vx = cov_norm * (sxx / n - ux * ux);
        let vy = cov_norm * (syy / n - uy * uy);
        let vxy = cov_norm * (sxy / n - ux * uy);

        let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
        let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
        total += numerator / denominator;
        count += 1;
    }

    Ok(total / count as f64)
}

/// Mean SSIM over a `[frames, channels, height, width]` sample
pub fn ssim(
    prediction: ArrayView4<'_, f32>,
    target: ArrayView4<'_, f32>,
    data_range: f64,
) -> Result<f64> {
    check_same_shape(prediction.shape(), target.shape())?;
    let mut scores = Vec::new();
    for (pred_frame, target_frame) in prediction.outer_iter().zip(target.outer_iter()) {
        for (p, t) in pred_frame.outer_iter().zip(target_frame.outer_iter()) {
            scores.push(ssim_2d(p, t, data_range)?);
        }
    }
    if scores.is_empty() {
        return Err(PredictoError::Metric {
            reason: "cannot score empty frames".to_string(),
        });
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Per-sample scores of one metric for a `[batch, frames, channels, height, width]` pair
///
/// SSIM and PSNR use each sample's own [`data_range`].
pub fn sample_scores(
    prediction: ArrayViewD<'_, f32>,
    target: ArrayViewD<'_, f32>,
    metric: Metric,
) -> Result<Vec<f64>> {
    check_same_shape(prediction.shape(), target.shape())?;
    if target.ndim() != 5 {
        return Err(PredictoError::Metric {
            reason: format!("expected 5D frame batches, got {}D", target.ndim()),
        });
    }

    let mut scores = Vec::with_capacity(target.len_of(Axis(0)));
    for (pred, truth) in prediction.outer_iter().zip(target.outer_iter()) {
        let score = match metric {
            Metric::Mse => mse(pred, truth)?,
            Metric::Psnr => psnr(pred, truth.view(), data_range(truth.view()))?,
            Metric::Ssim => {
                let range = data_range(truth.view());
                ssim(into_4d(pred)?.view(), into_4d(truth)?.view(), range)?
            }
        };
        scores.push(score);
    }
    Ok(scores)
}

fn into_4d(view: ArrayViewD<'_, f32>) -> Result<Array4<f32>> {
    view.to_owned()
        .into_dimensionality()
        .map_err(|err| PredictoError::Metric {
            reason: err.to_string(),
        })
}

fn check_same_shape(prediction: &[usize], target: &[usize]) -> Result<()> {
    if prediction != target {
        return Err(PredictoError::ShapeMismatch {
            context: "metric inputs",
            expected: target.to_vec(),
            actual: prediction.to_vec(),
        });
    }
    Ok(())
}
