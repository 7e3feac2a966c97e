//! Masking configuration.
//!
//! One immutable [`MaskConfig`] snapshot drives a whole document. It is
//! validated once at the boundary; nothing downstream re-checks ranges.

use crate::{MaskError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Korean particles (josa) recognised by surface form.
pub const DEFAULT_PARTICLES: &[&str] = &[
    "은", "는", "이", "가", "을", "를", "에", "에서", "에게", "께", "으로", "로", "으로서", "로서",
    "으로써", "로써", "에게서", "한테", "한테서", "까지", "부터", "처럼", "보다", "와", "과", "랑",
    "이랑", "이나", "나", "이나마", "마다", "조차", "마저", "밖에", "도", "만",
];

/// Tags treated as noun-like in addition to the `N*` family:
/// foreign-script runs and numerals.
pub const DEFAULT_NOUNISH_INCLUDE: &[&str] = &["SL", "SN"];

/// Destructive or non-destructive output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    /// Remove the content under each rectangle and cover it.
    #[default]
    Redact,
    /// Draw an outline; content stays extractable.
    Highlight,
}

/// Which span strategies run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// Only the word before a particle.
    JosaOnly,
    /// Only runs of noun-like tokens.
    NounsOnly,
    #[default]
    Both,
}

impl TargetMode {
    pub fn detects_particles(self) -> bool {
        matches!(self, TargetMode::JosaOnly | TargetMode::Both)
    }

    pub fn detects_noun_runs(self) -> bool {
        matches!(self, TargetMode::NounsOnly | TargetMode::Both)
    }
}

/// What to do with a page whose layout cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutErrorPolicy {
    /// Leave the page unmasked and continue with the next one.
    #[default]
    Skip,
    /// Fail the whole document.
    Abort,
}

/// RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const RED: Rgb = Rgb(1.0, 0.0, 0.0);

    fn is_valid(&self) -> bool {
        [self.0, self.1, self.2]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

/// Thresholds for joining rectangles on the same visual line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeTolerance {
    /// Largest horizontal gap (page units) between neighbours that still merge.
    pub x_gap: f32,
    /// Allowed difference of vertical centres, as a fraction of the average height.
    pub y_ratio: f32,
}

impl Default for MergeTolerance {
    fn default() -> Self {
        Self {
            x_gap: 0.5,
            y_ratio: 0.12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MaskConfig {
    pub mode: MaskMode,
    pub target_mode: TargetMode,
    /// Fraction of candidate rectangles actually masked.
    pub mask_ratio: f64,
    /// Shortest span, in characters, worth masking.
    pub min_mask_len: usize,
    /// Let the word before a particle extend over several noun tokens.
    pub allow_noun_span: bool,
    pub nounish_include: BTreeSet<String>,
    #[serde(alias = "josa_set")]
    pub particles: BTreeSet<String>,

    pub stroke_color: Rgb,
    pub stroke_width: f32,
    pub highlight_color: Rgb,
    pub line_width: f32,
    pub fill_color: Rgb,

    /// Sampler seed. A fresh one is drawn per invocation when absent.
    pub seed: Option<u64>,
    pub on_layout_error: LayoutErrorPolicy,
    pub merge: MergeTolerance,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            mode: MaskMode::default(),
            target_mode: TargetMode::default(),
            mask_ratio: 0.95,
            min_mask_len: 2,
            allow_noun_span: true,
            nounish_include: DEFAULT_NOUNISH_INCLUDE.iter().map(|s| s.to_string()).collect(),
            particles: DEFAULT_PARTICLES.iter().map(|s| s.to_string()).collect(),
            stroke_color: Rgb::BLACK,
            stroke_width: 1.8,
            highlight_color: Rgb::RED,
            line_width: 1.8,
            fill_color: Rgb::BLACK,
            seed: None,
            on_layout_error: LayoutErrorPolicy::default(),
            merge: MergeTolerance::default(),
        }
    }
}

impl MaskConfig {
    /// Parses and validates a JSON config. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: MaskConfig = serde_json::from_str(raw)
            .map_err(|e| MaskError::InvalidConfig(format!("json: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.mask_ratio) {
            return Err(MaskError::InvalidConfig(format!(
                "mask_ratio must be within [0, 1], got {}",
                self.mask_ratio
            )));
        }
        for (name, width) in [("stroke_width", self.stroke_width), ("line_width", self.line_width)] {
            if !width.is_finite() || width < 0.0 {
                return Err(MaskError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, width
                )));
            }
        }
        for (name, color) in [
            ("stroke_color", self.stroke_color),
            ("highlight_color", self.highlight_color),
            ("fill_color", self.fill_color),
        ] {
            if !color.is_valid() {
                return Err(MaskError::InvalidConfig(format!(
                    "{} components must be within [0, 1], got {:?}",
                    name, color
                )));
            }
        }
        let merge = self.merge;
        if !(merge.x_gap.is_finite() && merge.x_gap >= 0.0 && merge.y_ratio.is_finite() && merge.y_ratio >= 0.0) {
            return Err(MaskError::InvalidConfig(format!(
                "merge tolerances must be non-negative, got {:?}",
                merge
            )));
        }
        Ok(())
    }
}
