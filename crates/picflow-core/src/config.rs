use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Startup configuration errors. Fatal: the CLI exits before any worker starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown handler '{0}' (expected \"local\" or \"forward\")")]
    UnknownHandler(String),

    #[error("handler \"forward\" requires forward_url")]
    MissingForwardUrl,
}

/// One album source and its persisted progress cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Tag shared by every album of this source.
    pub tag: String,
    /// Greatest album id completed so far (resume point).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_done: Option<String>,
}

/// Global configuration loaded from `~/.config/picflow/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PicflowConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Album queue capacity; defaults to `workers` when unset.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    /// Handler kind: "local" or "forward".
    pub handler: String,
    /// Root directory for the "local" handler.
    pub save_dir: PathBuf,
    /// Endpoint for the "forward" handler.
    #[serde(default)]
    pub forward_url: Option<String>,
    /// Failure journal file; defaults to `~/.local/state/picflow/fail.json`.
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
    /// Seconds between background failure-journal flushes.
    #[serde(default = "default_journal_flush_secs")]
    pub journal_flush_secs: u64,
    /// Known sources with their progress cursors.
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

fn default_journal_flush_secs() -> u64 {
    30
}

impl Default for PicflowConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: None,
            handler: "local".to_string(),
            save_dir: PathBuf::from("albums"),
            forward_url: None,
            journal_path: None,
            journal_flush_secs: default_journal_flush_secs(),
            targets: Vec::new(),
        }
    }
}

impl PicflowConfig {
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.workers).max(1)
    }

    /// (tag, last_done) pairs for seeding the progress registry.
    pub fn cursors(&self) -> impl Iterator<Item = (String, Option<String>)> + '_ {
        self.targets
            .iter()
            .map(|t| (t.tag.clone(), t.last_done.clone()))
    }

    /// Copy registry cursors back into `targets`, adding targets for new tags.
    pub fn apply_progress(&mut self, cursors: &BTreeMap<String, String>) {
        for (tag, id) in cursors {
            match self.targets.iter_mut().find(|t| &t.tag == tag) {
                Some(target) => target.last_done = Some(id.clone()),
                None => self.targets.push(TargetConfig {
                    tag: tag.clone(),
                    last_done: Some(id.clone()),
                }),
            }
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("picflow")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PicflowConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PicflowConfig::default();
        save_to_path(&default_cfg, &path)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<PicflowConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: PicflowConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

pub fn save_to_path(cfg: &PicflowConfig, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(cfg).context("serialize config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;
    }
    fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = PicflowConfig::default();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.queue_capacity(), 4);
        assert_eq!(cfg.handler, "local");
        assert_eq!(cfg.journal_flush_secs, 30);
        assert!(cfg.targets.is_empty());
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut cfg = PicflowConfig::default();
        cfg.targets.push(TargetConfig {
            tag: "forum".to_string(),
            last_done: Some("0100".to_string()),
        });
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: PicflowConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.workers, cfg.workers);
        assert_eq!(parsed.handler, cfg.handler);
        assert_eq!(parsed.save_dir, cfg.save_dir);
        assert_eq!(parsed.targets, cfg.targets);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            workers = 8
            queue_capacity = 32
            handler = "forward"
            save_dir = "/srv/albums"
            forward_url = "https://hook.example.com/albums"

            [[targets]]
            tag = "forum"
            last_done = "0042"

            [[targets]]
            tag = "gallery"
        "#;
        let cfg: PicflowConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.queue_capacity(), 32);
        assert_eq!(cfg.handler, "forward");
        assert_eq!(cfg.journal_flush_secs, 30);
        assert_eq!(cfg.targets.len(), 2);
        assert_eq!(cfg.targets[1].last_done, None);
        let cursors: Vec<_> = cfg.cursors().collect();
        assert_eq!(cursors[0], ("forum".to_string(), Some("0042".to_string())));
    }

    #[test]
    fn apply_progress_updates_and_adds_targets() {
        let mut cfg = PicflowConfig::default();
        cfg.targets.push(TargetConfig {
            tag: "forum".to_string(),
            last_done: Some("0001".to_string()),
        });
        let mut cursors = BTreeMap::new();
        cursors.insert("forum".to_string(), "0009".to_string());
        cursors.insert("new".to_string(), "a".to_string());
        cfg.apply_progress(&cursors);

        assert_eq!(cfg.targets.len(), 2);
        assert_eq!(cfg.targets[0].last_done.as_deref(), Some("0009"));
        assert_eq!(cfg.targets[1].tag, "new");
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = PicflowConfig::default();
        cfg.workers = 2;
        save_to_path(&cfg, &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded.workers, 2);
    }
}
