//! Persisted configuration: the master switch, per-dialog feature flags,
//! and the rule tree, with a versioned one-directional upgrade path.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::rules::{FolderNode, RuleNode, TextEntryNode};

pub const CURRENT_CONFIG_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,

    /// Master switch; gates every hook policy uniformly.
    pub enabled: bool,

    pub desynth_dialog: bool,
    pub desynth_bulk_dialog: bool,
    pub materialize_dialog: bool,
    pub item_inspection_result: bool,
    pub retainer_task_ask: bool,
    pub retainer_task_result: bool,
    pub grand_company_supply_reward: bool,
    pub shop_card_dialog: bool,

    /// Locale-specific description substrings that mark a newly discovered
    /// item in the inspection result window. Configurable because the game
    /// text differs per locale.
    pub new_item_markers: Vec<String>,

    /// Root of the rule tree.
    pub root: FolderNode,

    /// Version 1 kept a flat entry list here; `upgrade` drains it into the
    /// root folder.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<TextEntryNode>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            enabled: true,
            desynth_dialog: false,
            desynth_bulk_dialog: false,
            materialize_dialog: false,
            item_inspection_result: false,
            retainer_task_ask: false,
            retainer_task_result: false,
            grand_company_supply_reward: false,
            shop_card_dialog: false,
            new_item_markers: default_new_item_markers(),
            root: FolderNode::default(),
            entries: Vec::new(),
        }
    }
}

fn default_new_item_markers() -> Vec<String> {
    // Observed game text; the French client words the notice differently.
    vec!["※".to_string(), "liées à Garde-la-Reine".to_string()]
}

impl Config {
    /// Migrate an older structure forward to the current version.
    ///
    /// One-directional, and a no-op when the structure is already current, so
    /// re-running it never changes anything. Returns whether a migration ran.
    pub fn upgrade(&mut self) -> bool {
        if self.version >= CURRENT_CONFIG_VERSION {
            return false;
        }

        if self.version < 2 {
            // v1 -> v2: the flat entry list moves under the root folder.
            let moved = self.entries.len();
            self.root
                .children
                .extend(self.entries.drain(..).map(RuleNode::TextEntry));
            debug!(moved, "migrated flat entry list into the rule tree");
        }

        self.version = CURRENT_CONFIG_VERSION;
        info!(version = self.version, "configuration upgraded");
        true
    }
}

/// Load/save surface of the host's configuration storage.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> anyhow::Result<Config>;
    fn save(&self, config: &Config) -> anyhow::Result<()>;
}

/// JSON file round-trip at a fixed path. A missing file loads as defaults.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> anyhow::Result<Config> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no configuration file, using defaults");
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(config)
    }

    fn save(&self, config: &Config) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}
