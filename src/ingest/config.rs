// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::providers::{BazaarEnvelope, ElectionEnvelope, EndedAuctionsEnvelope, Envelope};

pub const ENV_CONFIG_PATH: &str = "SNAPSHOT_CONFIG_PATH";
pub const ENV_PERIOD_SECS: &str = "SNAPSHOT_PERIOD_SECS";
pub const ENV_STORE_DIR: &str = "SNAPSHOT_STORE_DIR";
pub const ENV_METRICS_ADDR: &str = "SNAPSHOT_METRICS_ADDR";
pub const ENV_RUN_ONCE: &str = "SNAPSHOT_RUN_ONCE";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "SNAPSHOT_FETCH_TIMEOUT_SECS";

fn default_period_secs() -> u64 {
    20
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_feeds() -> Vec<FeedConfig> {
    [FeedKind::EndedAuctions, FeedKind::Bazaar, FeedKind::Election]
        .into_iter()
        .map(|kind| FeedConfig {
            kind,
            url: None,
            enabled: true,
        })
        .collect()
}
fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedKind {
    EndedAuctions,
    Bazaar,
    Election,
}

impl FeedKind {
    pub fn source_name(self) -> &'static str {
        match self {
            FeedKind::EndedAuctions => EndedAuctionsEnvelope::SOURCE,
            FeedKind::Bazaar => BazaarEnvelope::SOURCE,
            FeedKind::Election => ElectionEnvelope::SOURCE,
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            FeedKind::EndedAuctions => EndedAuctionsEnvelope::DEFAULT_URL,
            FeedKind::Bazaar => BazaarEnvelope::DEFAULT_URL,
            FeedKind::Election => ElectionEnvelope::DEFAULT_URL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    pub kind: FeedKind,
    /// Overrides the feed's default endpoint.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl FeedConfig {
    pub fn endpoint(&self) -> &str {
        self.url.as_deref().unwrap_or(self.kind.default_url())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
    /// Deadline for one fetch; falls back to `period_secs`.
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Serve Prometheus metrics here when set.
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
    /// Run a single cycle and exit.
    #[serde(default)]
    pub run_once: bool,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            period_secs: default_period_secs(),
            fetch_timeout_secs: None,
            store_dir: default_store_dir(),
            metrics_addr: None,
            run_once: false,
            feeds: default_feeds(),
        }
    }
}

impl IngestConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.unwrap_or(self.period_secs))
    }

    pub fn enabled_feeds(&self) -> impl Iterator<Item = &FeedConfig> {
        self.feeds.iter().filter(|f| f.enabled)
    }

    pub fn validate(&self) -> Result<()> {
        if self.period_secs == 0 {
            bail!("period_secs must be > 0");
        }
        if self.fetch_timeout_secs == Some(0) {
            bail!("fetch_timeout_secs must be > 0");
        }
        let mut seen = HashSet::new();
        for f in &self.feeds {
            if !seen.insert(f.kind) {
                bail!("feed {} configured more than once", f.kind.source_name());
            }
        }
        Ok(())
    }

    /// Apply SNAPSHOT_* environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|k| std::env::var(k).ok())
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = get(ENV_PERIOD_SECS) {
            self.period_secs = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PERIOD_SECS}={v:?} is not a number"))?;
        }
        if let Some(v) = get(ENV_FETCH_TIMEOUT_SECS) {
            self.fetch_timeout_secs = Some(
                v.trim()
                    .parse()
                    .with_context(|| format!("{ENV_FETCH_TIMEOUT_SECS}={v:?} is not a number"))?,
            );
        }
        if let Some(v) = get(ENV_STORE_DIR) {
            self.store_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_METRICS_ADDR) {
            let v = v.trim();
            self.metrics_addr = if v.is_empty() {
                None
            } else {
                Some(
                    v.parse()
                        .with_context(|| format!("{ENV_METRICS_ADDR}={v:?} is not host:port"))?,
                )
            };
        }
        if let Some(v) = get(ENV_RUN_ONCE) {
            self.run_once = matches!(v.trim(), "1" | "true" | "yes");
        }
        Ok(())
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<IngestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load config using env var + fallbacks, then apply env overrides:
/// 1) $SNAPSHOT_CONFIG_PATH
/// 2) config/snapshot.toml
/// 3) config/snapshot.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<IngestConfig> {
    let mut cfg = load_file_default()?;
    cfg.apply_env_overrides()?;
    cfg.validate()?;
    Ok(cfg)
}

fn load_file_default() -> Result<IngestConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/snapshot.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/snapshot.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(IngestConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<IngestConfig> {
    match hint_ext {
        "toml" => return Ok(toml::from_str(s)?),
        "json" => return Ok(serde_json::from_str(s)?),
        _ => {}
    }
    // Unknown extension: JSON documents start with '{'.
    if s.trim_start().starts_with('{') {
        Ok(serde_json::from_str(s)?)
    } else {
        Ok(toml::from_str(s)?)
    }
}
