//! Preset (`.cgp`) persistence: the resolved run configuration serialized as
//! JSON, so a saved preset regenerates the identical image and frame
//! sequence.

use anyhow::{Context, Result};
use colorgrowth_core::GrowthConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to reproduce an invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    pub config: GrowthConfig,
    /// Number of images the invocation renders.
    pub image_count: u32,
}

pub fn save_preset(path: &Path, preset: &Preset) -> Result<()> {
    let body = serde_json::to_string_pretty(preset).context("failed to serialize preset")?;
    fs::write(path, body)
        .with_context(|| format!("failed to write preset {}", path.display()))?;
    Ok(())
}

pub fn load_preset(path: &Path) -> Result<Preset> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("failed to read preset {}", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("preset {} did not contain a valid configuration", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorgrowth_core::SeedCount;

    #[test]
    fn preset_round_trips_through_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.cgp");
        let preset = Preset {
            config: GrowthConfig {
                width: 640,
                height: 480,
                rshift: 12,
                color_mutation_base: Some([10, 200, 30]),
                seed_count: SeedCount::Fixed(7),
                rng_seed: Some(123_456_789),
                stop_fill_fraction: 0.5,
                reclaim_orphans: false,
                frame_interval: 10,
                ..GrowthConfig::default()
            },
            image_count: 3,
        };

        save_preset(&path, &preset).expect("save");
        let loaded = load_preset(&path).expect("load");
        assert_eq!(loaded, preset);
    }

    #[test]
    fn loading_garbage_reports_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.cgp");
        std::fs::write(&path, "not json").expect("write");
        let err = load_preset(&path).expect_err("must fail");
        assert!(err.to_string().contains("broken.cgp"));
    }
}
