use crate::storage::buffer::ReplacementPolicy;
use config::{Config, File, FileFormat};
use serde::Deserialize;

/// In-memory sizing knobs spec.md leaves to the caller of `init`: how many
/// frames a resource's buffer pool gets and which replacement policy it
/// runs. Loaded through the `config` crate's layered `Config` builder so a
/// deployment can override defaults from a file or environment variables
/// without touching any persisted page-file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    pub table_pool_frames: usize,
    pub index_pool_frames: usize,
    pub replacement_policy: PolicyName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyName {
    Fifo,
    Lru,
}

impl From<PolicyName> for ReplacementPolicy {
    fn from(name: PolicyName) -> Self {
        match name {
            PolicyName::Fifo => ReplacementPolicy::Fifo,
            PolicyName::Lru => ReplacementPolicy::Lru,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            table_pool_frames: 64,
            index_pool_frames: 32,
            replacement_policy: PolicyName::Lru,
        }
    }
}

impl EngineConfig {
    /// Builds an `EngineConfig` from the compiled-in defaults overlaid with
    /// an optional config file (TOML) and `RUSTYDB_*` environment
    /// variables, e.g. `RUSTYDB_TABLE_POOL_FRAMES=128`. Falls back silently
    /// to the defaults when no file or env var is present.
    pub fn load(config_path: Option<&str>) -> crate::common::Result<Self> {
        let defaults = EngineConfig::default();
        let mut builder = Config::builder()
            .set_default("table_pool_frames", defaults.table_pool_frames as i64)?
            .set_default("index_pool_frames", defaults.index_pool_frames as i64)?
            .set_default(
                "replacement_policy",
                match defaults.replacement_policy {
                    PolicyName::Fifo => "fifo",
                    PolicyName::Lru => "lru",
                },
            )?;
        if let Some(path) = config_path {
            builder = builder.add_source(File::new(path, FileFormat::Toml).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("RUSTYDB"));
        let settings = builder.build()?;
        settings
            .try_deserialize()
            .map_err(crate::common::Error::from)
    }

    pub fn table_policy(&self) -> ReplacementPolicy {
        self.replacement_policy.into()
    }

    pub fn index_policy(&self) -> ReplacementPolicy {
        self.replacement_policy.into()
    }
}
