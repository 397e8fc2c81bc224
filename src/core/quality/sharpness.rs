//! Laplacian-variance sharpness scoring.

use super::QualityScore;
use crate::core::decode::decode_image;
use crate::error::ComputeError;
use image::{DynamicImage, GrayImage};

/// Capability that rates how sharp a photo is
pub trait SharpnessScorer: Send + Sync {
    fn score(&self, bytes: &[u8]) -> Result<QualityScore, ComputeError>;
}

/// Scores sharpness from the variance of the Laplacian.
///
/// Sharp photos have well-defined edges and therefore a high variance
/// in the Laplacian response. The raw variance (0 to 10000+) is mapped
/// into [0, 1] with `v / (v + knee)`, so `knee` is the variance that
/// scores exactly 0.5.
pub struct LaplacianSharpnessScorer {
    /// Images are downscaled to fit this box before analysis
    analysis_size: u32,
    knee: f64,
}

impl Default for LaplacianSharpnessScorer {
    fn default() -> Self {
        Self {
            analysis_size: 512,
            knee: 500.0,
        }
    }
}

impl LaplacianSharpnessScorer {
    pub fn new(analysis_size: u32, knee: f64) -> Self {
        Self {
            analysis_size: analysis_size.max(3),
            knee: if knee > 0.0 { knee } else { 500.0 },
        }
    }

    /// Score an already decoded image
    pub fn score_image(&self, image: &DynamicImage) -> QualityScore {
        let resized = if image.width() > self.analysis_size || image.height() > self.analysis_size
        {
            image.resize(
                self.analysis_size,
                self.analysis_size,
                image::imageops::FilterType::Triangle,
            )
        } else {
            image.clone()
        };

        let variance = laplacian_variance(&resized.to_luma8());
        QualityScore::clamped(variance / (variance + self.knee))
    }
}

impl SharpnessScorer for LaplacianSharpnessScorer {
    fn score(&self, bytes: &[u8]) -> Result<QualityScore, ComputeError> {
        let image = decode_image(bytes)?;
        Ok(self.score_image(&image))
    }
}

/// Variance of the 4-neighbour Laplacian `[0, 1, 0; 1, -4, 1; 0, 1, 0]`
fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut count = 0.0;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = gray.get_pixel(x, y)[0] as f64;
            let top = gray.get_pixel(x, y - 1)[0] as f64;
            let bottom = gray.get_pixel(x, y + 1)[0] as f64;
            let left = gray.get_pixel(x - 1, y)[0] as f64;
            let right = gray.get_pixel(x + 1, y)[0] as f64;

            let laplacian = top + bottom + left + right - 4.0 * center;
            count += 1.0;
            sum += laplacian;
            sum_sq += laplacian * laplacian;
        }
    }

    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}
