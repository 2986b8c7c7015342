//! The quest catalog: per-quest text, rewards and dialogue graphs.

use std::collections::HashSet;

use questline_core::error::DomainError;
use questline_inventory::domain::rewards::RewardBundle;
use questline_progression::domain::content::{QuestContent, QuestText};
use questline_progression::domain::rules::RuleBook;
use questline_progression::domain::vars::Vars;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Node a dialogue starts at when present.
pub const START_NODE: &str = "start";

/// The content document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub quests: Vec<CatalogQuest>,
}

/// Text, rewards and dialogue for one quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuest {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Description; may contain `{path}`.
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub rewards: RewardBundle,
    #[serde(default)]
    pub dialogue: Vec<DialogueNode>,
}

/// One node of a dialogue graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// Fallback transition when the chosen option names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Runs when the player picks any option on this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

/// A player option on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Side effect attached to a dialogue node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Merge variables into the player's variable document.
    SetVars {
        /// Assignments to merge.
        vars: Vars,
    },
    /// Complete the quest that owns the dialogue session.
    #[serde(rename_all = "camelCase")]
    CompleteQuest {
        /// Quest to activate once the owning quest is completed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
        /// Defer the completion until the player acknowledges the ceremony.
        #[serde(default)]
        requires_ceremony: bool,
    },
}

/// Problems found by [`Catalog::validate`]. None of them rejects a catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogIssue {
    #[error("quest {0} is declared more than once")]
    DuplicateQuest(String),

    #[error("quest {0} is not part of the campaign")]
    UnknownQuest(String),

    #[error("quest {quest}: node {node} is declared more than once")]
    DuplicateNode { quest: String, node: String },

    #[error("quest {quest}: node {node} points at missing node {target}")]
    DanglingNext {
        quest: String,
        node: String,
        target: String,
    },

    #[error("quest {quest}: node {node} activates unknown quest {target}")]
    UnknownFollowUp {
        quest: String,
        node: String,
        target: String,
    },
}

/// Serialization format of a raw catalog document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Yaml,
}

impl CatalogFormat {
    /// Picks the format from a file name or URL path.
    #[must_use]
    pub fn from_location(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        let path = lower.split(['?', '#']).next().unwrap_or_default();
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            Self::Yaml
        } else {
            Self::Json
        }
    }
}

impl Catalog {
    /// Parses a raw document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the document is malformed.
    pub fn parse(raw: &str, format: CatalogFormat) -> Result<Self, DomainError> {
        match format {
            CatalogFormat::Json => serde_json::from_str(raw)
                .map_err(|e| DomainError::Validation(format!("malformed catalog JSON: {e}"))),
            CatalogFormat::Yaml => serde_yaml::from_str(raw)
                .map_err(|e| DomainError::Validation(format!("malformed catalog YAML: {e}"))),
        }
    }

    /// Returns the entry for `quest_id`.
    #[must_use]
    pub fn quest(&self, quest_id: &str) -> Option<&CatalogQuest> {
        self.quests.iter().find(|q| q.id == quest_id)
    }

    /// Checks graph integrity against `book`.
    #[must_use]
    pub fn validate(&self, book: &RuleBook) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        let mut seen_quests = HashSet::new();
        for quest in &self.quests {
            if !seen_quests.insert(quest.id.as_str()) {
                issues.push(CatalogIssue::DuplicateQuest(quest.id.clone()));
            }
            if book.rule(&quest.id).is_none() {
                issues.push(CatalogIssue::UnknownQuest(quest.id.clone()));
            }
            quest.validate_graph(book, &mut issues);
        }
        issues
    }

    /// Projection of text and rewards for the progression engine.
    #[must_use]
    pub fn to_content(&self) -> QuestContent {
        QuestContent::new(
            self.quests
                .iter()
                .map(|q| QuestText {
                    id: q.id.clone(),
                    title: Some(q.title.clone()).filter(|t| !t.trim().is_empty()),
                    description: Some(q.desc.clone()).filter(|d| !d.trim().is_empty()),
                    rewards: q.rewards.clone(),
                })
                .collect(),
        )
    }
}

impl CatalogQuest {
    /// Entry node: `start` if present, otherwise the first node.
    #[must_use]
    pub fn entry_node(&self) -> Option<&DialogueNode> {
        self.node(START_NODE).or_else(|| self.dialogue.first())
    }

    /// Returns the node with `node_id`.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&DialogueNode> {
        self.dialogue.iter().find(|n| n.id == node_id)
    }

    fn validate_graph(&self, book: &RuleBook, issues: &mut Vec<CatalogIssue>) {
        let mut seen = HashSet::new();
        for node in &self.dialogue {
            if !seen.insert(node.id.as_str()) {
                issues.push(CatalogIssue::DuplicateNode {
                    quest: self.id.clone(),
                    node: node.id.clone(),
                });
            }
            let targets = node
                .choices
                .iter()
                .filter_map(|c| c.next.as_deref())
                .chain(node.next.as_deref());
            for target in targets {
                if self.node(target).is_none() {
                    issues.push(CatalogIssue::DanglingNext {
                        quest: self.id.clone(),
                        node: node.id.clone(),
                        target: target.to_owned(),
                    });
                }
            }
            if let Some(Action::CompleteQuest {
                next: Some(follow_up),
                ..
            }) = &node.action
                && book.rule(follow_up).is_none()
            {
                issues.push(CatalogIssue::UnknownFollowUp {
                    quest: self.id.clone(),
                    node: node.id.clone(),
                    target: follow_up.clone(),
                });
            }
        }
    }
}

/// Hex SHA-256 of a raw catalog document.
#[must_use]
pub fn fingerprint(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}
