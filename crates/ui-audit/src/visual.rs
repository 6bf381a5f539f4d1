//! Visual regression against baseline screenshots

use image::{GenericImageView, Pixel, RgbaImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{AuditError, AuditResult};
use crate::plan::AuditPlan;

/// Outcome of comparing one screenshot against its baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualDiffResult {
    /// `{viewport}-{page}` screenshot stem
    pub name: String,
    pub matches: bool,
    /// Percentage of pixels that differ
    pub diff_percent: f64,
    pub diff_pixels: u64,
    pub total_pixels: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_image_path: Option<PathBuf>,
    #[serde(default)]
    pub missing_baseline: bool,
    pub actual_hash: String,
    pub baseline_hash: String,
}

impl VisualDiffResult {
    fn missing(name: &str, actual_hash: String) -> Self {
        Self {
            name: name.to_string(),
            matches: false,
            diff_percent: 100.0,
            diff_pixels: 0,
            total_pixels: 0,
            diff_image_path: None,
            missing_baseline: true,
            actual_hash,
            baseline_hash: String::new(),
        }
    }
}

pub struct VisualComparator {
    baseline_dir: PathBuf,
    actual_dir: PathBuf,
    diff_dir: PathBuf,
    /// Allowed share of differing pixels (0.0 - 100.0 percent)
    threshold: f64,
}

impl VisualComparator {
    pub fn new(plan: &AuditPlan) -> AuditResult<Self> {
        let baseline_dir = plan.baseline_dir();
        let diff_dir = plan.diff_dir();
        std::fs::create_dir_all(&baseline_dir)?;
        std::fs::create_dir_all(&diff_dir)?;

        Ok(Self {
            baseline_dir,
            actual_dir: plan.output.screenshot_dir.clone(),
            diff_dir,
            threshold: plan.visual.threshold,
        })
    }

    fn actual_path(&self, name: &str) -> PathBuf {
        self.actual_dir.join(format!("{}.png", name))
    }

    fn baseline_path(&self, name: &str) -> PathBuf {
        self.baseline_dir.join(format!("{}.png", name))
    }

    /// Compare a screenshot against its baseline. A missing baseline is
    /// reported as a mismatch rather than an error.
    pub fn compare(&self, name: &str) -> AuditResult<VisualDiffResult> {
        let actual_path = self.actual_path(name);
        let baseline_path = self.baseline_path(name);

        if !actual_path.exists() {
            return Err(AuditError::VisualRegression(format!(
                "Actual screenshot not found: {}",
                actual_path.display()
            )));
        }

        let actual_hash = hash_file(&actual_path)?;
        if !baseline_path.exists() {
            warn!("No baseline for '{}' at {}", name, baseline_path.display());
            return Ok(VisualDiffResult::missing(name, actual_hash));
        }
        let baseline_hash = hash_file(&baseline_path)?;

        let actual_img = image::open(&actual_path)?;
        let (width, height) = actual_img.dimensions();
        let total_pixels = (width as u64) * (height as u64);

        if actual_hash == baseline_hash {
            debug!("Screenshot '{}' matches baseline exactly", name);
            return Ok(VisualDiffResult {
                name: name.to_string(),
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels,
                diff_image_path: None,
                missing_baseline: false,
                actual_hash,
                baseline_hash,
            });
        }

        let baseline_img = image::open(&baseline_path)?;
        if actual_img.dimensions() != baseline_img.dimensions() {
            warn!(
                "Screenshot '{}' dimensions differ: actual {:?} vs baseline {:?}",
                name,
                actual_img.dimensions(),
                baseline_img.dimensions()
            );
        }

        let actual_rgba = actual_img.to_rgba8();
        let baseline_rgba = baseline_img.to_rgba8();
        let (overlap_w, overlap_h) = (
            width.min(baseline_rgba.width()),
            height.min(baseline_rgba.height()),
        );

        // Pixels outside the overlapping region count as different.
        let mut diff_img = RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut diff_pixels = total_pixels - (overlap_w as u64) * (overlap_h as u64);

        for y in 0..overlap_h {
            for x in 0..overlap_w {
                let actual = actual_rgba.get_pixel(x, y);
                if pixels_differ(actual, baseline_rgba.get_pixel(x, y)) {
                    diff_pixels += 1;
                } else {
                    let c = actual.channels();
                    diff_img.put_pixel(x, y, image::Rgba([c[0] / 2, c[1] / 2, c[2] / 2, 128]));
                }
            }
        }

        let diff_percent = if total_pixels == 0 {
            0.0
        } else {
            (diff_pixels as f64 / total_pixels as f64) * 100.0
        };
        let matches = diff_percent <= self.threshold;

        let diff_image_path = if diff_pixels > 0 {
            let path = self.diff_dir.join(format!("{}-diff.png", name));
            diff_img.save(&path)?;
            Some(path)
        } else {
            None
        };

        if !matches {
            warn!(
                "Visual regression in '{}': {:.2}% pixels differ (threshold: {:.2}%)",
                name, diff_percent, self.threshold
            );
        }

        Ok(VisualDiffResult {
            name: name.to_string(),
            matches,
            diff_percent,
            diff_pixels,
            total_pixels,
            diff_image_path,
            missing_baseline: false,
            actual_hash,
            baseline_hash,
        })
    }

    /// Promote the current screenshot to be the baseline
    pub fn update_baseline(&self, name: &str) -> AuditResult<()> {
        let actual_path = self.actual_path(name);
        if !actual_path.exists() {
            return Err(AuditError::BaselineNotFound(format!(
                "cannot promote missing screenshot {}",
                actual_path.display()
            )));
        }

        std::fs::copy(&actual_path, self.baseline_path(name))?;
        info!("Updated baseline for '{}'", name);
        Ok(())
    }

    /// Stems of every baseline png, sorted
    pub fn list_baselines(&self) -> AuditResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.baseline_dir).max_depth(1) {
            let entry = entry.map_err(|e| AuditError::VisualRegression(e.to_string()))?;
            let path = entry.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove diff images left over from a previous run
    pub fn clean_diffs(&self) -> AuditResult<()> {
        for entry in WalkDir::new(&self.diff_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| AuditError::VisualRegression(e.to_string()))?;
            if entry.file_type().is_file() {
                std::fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// Channel-wise comparison with room for anti-aliasing noise
fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>) -> bool {
    const TOLERANCE: i32 = 5;
    a.channels()
        .iter()
        .zip(b.channels())
        .any(|(x, y)| (*x as i32 - *y as i32).abs() > TOLERANCE)
}

fn hash_file(path: &Path) -> AuditResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}
