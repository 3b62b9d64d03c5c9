//! The user-authored rule tree and its evaluation.
//!
//! Rules form a tree of folders and text entries. Folders exist for
//! organization in the editor; evaluation flattens the tree depth-first in
//! declaration order and tries each enabled entry in turn, stopping at the
//! first match. An entry matches on the dialog text (literal substring or
//! regex) and, when zone-restricted, additionally on the resolved display
//! name of the player's current zone.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_true() -> bool {
    true
}

/// A node in the rule tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleNode {
    Folder(FolderNode),
    TextEntry(TextEntryNode),
}

/// A grouping node. Owns its children exclusively; nesting is arbitrary.
///
/// The `enabled` flag is display-side only: evaluation flattens through
/// folders regardless of their state, and only each entry's own flag gates
/// whether it is tried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderNode {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub children: Vec<RuleNode>,
}

/// A single matchable condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextEntryNode {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_regex: bool,
    #[serde(default)]
    pub zone_restricted: bool,
    #[serde(default)]
    pub zone_text: String,
    #[serde(default)]
    pub zone_is_regex: bool,

    // Compiled patterns, built on first use and dropped whenever the source
    // fields change. A failed compile is cached as None: the entry simply
    // never matches.
    #[serde(skip)]
    text_pattern: OnceCell<Option<Regex>>,
    #[serde(skip)]
    zone_pattern: OnceCell<Option<Regex>>,
}

impl TextEntryNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            enabled: true,
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn regex(text: impl Into<String>) -> Self {
        Self {
            enabled: true,
            text: text.into(),
            is_regex: true,
            ..Self::default()
        }
    }

    /// Display label; entries are labeled by their match text.
    pub fn name(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.text_pattern = OnceCell::new();
    }

    pub fn set_is_regex(&mut self, is_regex: bool) {
        self.is_regex = is_regex;
        self.text_pattern = OnceCell::new();
    }

    pub fn set_zone_text(&mut self, text: impl Into<String>) {
        self.zone_text = text.into();
        self.zone_pattern = OnceCell::new();
    }

    pub fn set_zone_is_regex(&mut self, is_regex: bool) {
        self.zone_is_regex = is_regex;
        self.zone_pattern = OnceCell::new();
    }

    fn text_regex(&self) -> Option<&Regex> {
        self.text_pattern
            .get_or_init(|| compile(&self.text))
            .as_ref()
    }

    fn zone_regex(&self) -> Option<&Regex> {
        self.zone_pattern
            .get_or_init(|| compile(&self.zone_text))
            .as_ref()
    }

    /// Case-sensitive match against the dialog text: regex "contains a match
    /// anywhere" or literal substring containment.
    pub fn matches_text(&self, text: &str) -> bool {
        if self.is_regex {
            self.text_regex().is_some_and(|re| re.is_match(text))
        } else {
            text.contains(&self.text)
        }
    }

    /// Same semantics against a zone display name.
    pub fn matches_zone(&self, zone_name: &str) -> bool {
        if self.zone_is_regex {
            self.zone_regex().is_some_and(|re| re.is_match(zone_name))
        } else {
            zone_name.contains(&self.zone_text)
        }
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            debug!(%pattern, %err, "pattern failed to compile, entry will never match");
            None
        }
    }
}

/// Result of walking the rule tree against one dialog.
#[derive(Debug)]
pub struct Evaluation<'a> {
    /// The first entry that matched, if any.
    pub matched: Option<&'a TextEntryNode>,
    /// A zone-restricted candidate was skipped because the current zone is
    /// not resolved yet. Reported once per evaluation, not once per entry.
    pub zone_unresolved: bool,
}

impl Evaluation<'_> {
    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }
}

impl FolderNode {
    /// All entries under this folder, depth-first in declaration order.
    /// Folders are transparent containers for ordering purposes.
    pub fn entries(&self) -> Vec<&TextEntryNode> {
        let mut out = Vec::new();
        collect_entries(self, &mut out);
        out
    }

    /// Walk the entries in order and report the first one whose text (and,
    /// when restricted, zone) condition holds.
    ///
    /// Entries that are disabled or have empty match text are skipped; an
    /// empty rule must not match everything. `zone_name` is the resolved
    /// display name of the current zone, or `None` while the zone table has
    /// no answer yet; zone-restricted entries cannot match in that state.
    pub fn evaluate<'a>(&'a self, dialog_text: &str, zone_name: Option<&str>) -> Evaluation<'a> {
        let mut zone_unresolved = false;

        for entry in self.entries() {
            if !entry.enabled || entry.text.is_empty() {
                continue;
            }
            if !entry.matches_text(dialog_text) {
                continue;
            }

            if entry.zone_restricted && !entry.zone_text.is_empty() {
                let Some(zone_name) = zone_name else {
                    zone_unresolved = true;
                    continue;
                };
                if !entry.matches_zone(zone_name) {
                    continue;
                }
                debug!(text = %entry.text, zone = %entry.zone_text, "matched zone-restricted entry");
                return Evaluation {
                    matched: Some(entry),
                    zone_unresolved,
                };
            }

            debug!(text = %entry.text, "matched entry");
            return Evaluation {
                matched: Some(entry),
                zone_unresolved,
            };
        }

        Evaluation {
            matched: None,
            zone_unresolved,
        }
    }
}

fn collect_entries<'a>(folder: &'a FolderNode, out: &mut Vec<&'a TextEntryNode>) {
    for child in &folder.children {
        match child {
            RuleNode::TextEntry(entry) => out.push(entry),
            RuleNode::Folder(nested) => collect_entries(nested, out),
        }
    }
}
