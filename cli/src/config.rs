use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use josamask_core::{LayoutErrorPolicy, MaskConfig, MaskMode, TargetMode};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Redact,
    Highlight,
}

impl From<ModeArg> for MaskMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Redact => MaskMode::Redact,
            ModeArg::Highlight => MaskMode::Highlight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
    JosaOnly,
    NounsOnly,
    Both,
}

impl From<TargetArg> for TargetMode {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::JosaOnly => TargetMode::JosaOnly,
            TargetArg::NounsOnly => TargetMode::NounsOnly,
            TargetArg::Both => TargetMode::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutErrorArg {
    Skip,
    Abort,
}

impl From<LayoutErrorArg> for LayoutErrorPolicy {
    fn from(arg: LayoutErrorArg) -> Self {
        match arg {
            LayoutErrorArg::Skip => LayoutErrorPolicy::Skip,
            LayoutErrorArg::Abort => LayoutErrorPolicy::Abort,
        }
    }
}

/// Config file plus per-field overrides, shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// JSON config file; missing fields take their defaults
    #[arg(long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    #[arg(long, value_enum)]
    pub target: Option<TargetArg>,

    /// Fraction of detected areas to mask, in [0, 1]
    #[arg(long, value_name = "RATIO")]
    pub ratio: Option<f64>,

    /// Shortest span worth masking, in characters
    #[arg(long, value_name = "CHARS")]
    pub min_len: Option<usize>,

    /// Before a particle, mask only the single preceding token instead of
    /// the whole noun run
    #[arg(long)]
    pub no_noun_span: bool,

    /// Seed for area sampling; random when absent
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum)]
    pub on_layout_error: Option<LayoutErrorArg>,
}

impl ConfigArgs {
    /// Effective configuration: file (or defaults), then flags, validated.
    pub fn resolve(&self) -> Result<MaskConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => MaskConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut MaskConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(target) = self.target {
            config.target_mode = target.into();
        }
        if let Some(ratio) = self.ratio {
            config.mask_ratio = ratio;
        }
        if let Some(min_len) = self.min_len {
            config.min_mask_len = min_len;
        }
        if self.no_noun_span {
            config.allow_noun_span = false;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(policy) = self.on_layout_error {
            config.on_layout_error = policy.into();
        }
    }
}

pub fn load_config(path: &Path) -> Result<MaskConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("cannot read config {}", path.display()))?;
    MaskConfig::from_json(&raw).with_context(|| format!("bad config {}", path.display()))
}

pub fn save_config(path: &Path, config: &MaskConfig) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    fs::write(path, raw).with_context(|| format!("cannot write config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.json");
        fs::write(&path, r#"{"mode": "highlight", "mask_ratio": 0.5, "seed": 1}"#).unwrap();

        let args = ConfigArgs {
            config: Some(path),
            ratio: Some(1.0),
            no_noun_span: true,
            ..ConfigArgs::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.mode, MaskMode::Highlight);
        assert_eq!(config.mask_ratio, 1.0);
        assert_eq!(config.seed, Some(1));
        assert!(!config.allow_noun_span);
        assert_eq!(config.min_mask_len, 2);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = ConfigArgs {
            ratio: Some(1.5),
            ..ConfigArgs::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let args = ConfigArgs {
            config: Some("/nonexistent/josamask.json".into()),
            ..ConfigArgs::default()
        };
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mask.json");
        let config = MaskConfig {
            mask_ratio: 0.25,
            target_mode: TargetMode::JosaOnly,
            ..MaskConfig::default()
        };
        save_config(&path, &config).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.mask_ratio, 0.25);
        assert_eq!(loaded.target_mode, TargetMode::JosaOnly);
        assert_eq!(loaded.particles, config.particles);
    }
}
