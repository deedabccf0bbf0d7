//! Runtime pipeline settings.
//!
//! Model-coupled constants live in [`moodlink_audio::mfcc::MfccConfig`] and
//! cannot be changed here. This file only carries what may differ between
//! deployments: the normalization target, the capture tolerance and memory
//! placement.
//!
//! ```yaml
//! target_db: -1.0
//! min_capture_ratio: 0.9
//! pool:
//!   preferred: external
//!   fallback: internal
//!   internal_budget: 262144
//! ```

use std::path::Path;

use moodlink_audio::pool::PoolPolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default normalization target, in dBFS.
pub const DEFAULT_TARGET_DB: f32 = -1.0;

/// Captures shorter than this fraction of the buffer are logged.
pub const DEFAULT_MIN_CAPTURE_RATIO: f32 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Peak level after normalization, dB relative to full scale.
    pub target_db: f32,
    /// Fraction of the sample buffer a capture should fill.
    pub min_capture_ratio: f32,
    /// Placement of long-lived buffers.
    pub pool: PoolPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_db: DEFAULT_TARGET_DB,
            min_capture_ratio: DEFAULT_MIN_CAPTURE_RATIO,
            pool: PoolPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a JSON or YAML file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        if ext != "json" && ext != "yaml" && ext != "yml" {
            return Err(ConfigError::UnsupportedFormat(ext.to_string()));
        }

        let data = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let cfg: Self = match ext {
            "json" => serde_json::from_slice(&data)?,
            _ => serde_yaml::from_slice(&data)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_db.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "target_db must be finite, got {}",
                self.target_db
            )));
        }
        if !(0.0..=1.0).contains(&self.min_capture_ratio) {
            return Err(ConfigError::Invalid(format!(
                "min_capture_ratio must be within [0, 1], got {}",
                self.min_capture_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use moodlink_audio::pool::MemoryPool;

    use super::*;

    fn write_temp(name: &str, body: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("moodlink-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(body.as_bytes())
            .unwrap();
        path
    }

    #[test]
    fn defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.target_db, -1.0);
        assert_eq!(cfg.min_capture_ratio, 0.9);
        assert_eq!(cfg.pool, PoolPolicy::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_yaml_with_partial_fields() {
        let path = write_temp(
            "partial.yaml",
            "target_db: -3.0\npool:\n  preferred: internal\n  fallback: null\n  internal_budget: 4096\n",
        );
        let cfg = PipelineConfig::load(&path).unwrap();
        assert_eq!(cfg.target_db, -3.0);
        assert_eq!(cfg.min_capture_ratio, DEFAULT_MIN_CAPTURE_RATIO);
        assert_eq!(cfg.pool.preferred, MemoryPool::Internal);
        assert_eq!(cfg.pool.fallback, None);
        assert_eq!(cfg.pool.internal_budget, Some(4096));
        assert_eq!(cfg.pool.external_budget, None);
    }

    #[test]
    fn load_json() {
        let path = write_temp("full.json", r#"{"target_db": -6.0, "min_capture_ratio": 0.5}"#);
        let cfg = PipelineConfig::load(&path).unwrap();
        assert_eq!(cfg.target_db, -6.0);
        assert_eq!(cfg.min_capture_ratio, 0.5);
    }

    #[test]
    fn rejects_unknown_extension_and_bad_values() {
        let path = write_temp("cfg.toml", "target_db = 1");
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"
        ));

        let path = write_temp("ratio.json", r#"{"min_capture_ratio": 1.5}"#);
        assert!(matches!(PipelineConfig::load(&path), Err(ConfigError::Invalid(_))));

        let path = write_temp("broken.yaml", "target_db: [\n");
        assert!(matches!(PipelineConfig::load(&path), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn missing_file() {
        let err = PipelineConfig::load(Path::new("/nonexistent/moodlink.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
