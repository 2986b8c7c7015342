//! The rule book: which quests exist, what they require, what follows them.
//!
//! The whole prerequisite graph, built-in text and the priority ordering live
//! here as data. The sanitizer interprets it and nothing else in the engine
//! knows quest ids.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::QuestContent;
use super::vars::Vars;

/// Variable condition that completes a quest during rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Completion {
    /// The variable holds a truthy value.
    VarSet {
        /// Variable name.
        key: String,
    },
    /// The variable equals `value` exactly.
    VarEquals {
        /// Variable name.
        key: String,
        /// Expected value.
        value: Value,
    },
}

impl Completion {
    /// Returns `true` when `vars` satisfy the condition.
    #[must_use]
    pub fn is_met(&self, vars: &Vars) -> bool {
        match self {
            Self::VarSet { key } => vars.is_set(key),
            Self::VarEquals { key, value } => vars.get(key) == Some(value),
        }
    }
}

/// One ordering constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Quest governed by this rule.
    pub id: String,
    /// Built-in title.
    pub title: String,
    /// Built-in description template; `{path}` is substituted.
    pub description: String,
    /// Quests that must be completed first.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Successor unlocked on completion.
    #[serde(default)]
    pub next: Option<String>,
    /// Path the player must have chosen.
    #[serde(default)]
    pub path_gate: Option<String>,
    /// Variable condition that completes the quest.
    #[serde(default)]
    pub completes_when: Option<Completion>,
}

impl Rule {
    fn new(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_owned(),
            title: title.to_owned(),
            description: description.to_owned(),
            requires: Vec::new(),
            next: None,
            path_gate: None,
            completes_when: None,
        }
    }

    fn requires(mut self, quest_id: &str) -> Self {
        self.requires.push(quest_id.to_owned());
        self
    }

    fn next(mut self, quest_id: &str) -> Self {
        self.next = Some(quest_id.to_owned());
        self
    }

    fn gated(mut self, path: &str) -> Self {
        self.path_gate = Some(path.to_owned());
        self
    }

    fn completes_when(mut self, completion: Completion) -> Self {
        self.completes_when = Some(completion);
        self
    }

    /// Returns `true` when the path gate (if any) matches the chosen path.
    #[must_use]
    pub fn gate_open(&self, vars: &Vars) -> bool {
        match &self.path_gate {
            None => true,
            Some(gate) => vars.path().as_deref() == Some(gate.to_lowercase().as_str()),
        }
    }
}

/// Quest ids of the built-in campaign.
pub mod ids {
    /// Choosing the player's path.
    pub const CHOOSE_PATH: &str = "q_choose_path";
    /// Optional side quest opened by choosing a path.
    pub const GATHER_SUPPLIES: &str = "q_gather_supplies";
    /// Travelling to the chosen homeland.
    pub const TRAVEL_HOME: &str = "q_travel_home";
    /// First Dreadheim quest after arrival.
    pub const MEET_ELDER: &str = "q_meet_elder";
    /// Oath ceremony.
    pub const SIGN_OATH: &str = "q_sign_oath";
    /// Closing Dreadheim quest.
    pub const RAISE_BANNER: &str = "q_raise_banner";
}

/// Variable set by the oath ceremony.
pub const CEREMONY_SIGNED_VAR: &str = "ceremony_signed";

/// The complete, ordered rule table plus the play order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBook {
    /// Rules in declaration order; new quests are seeded in this order.
    pub rules: Vec<Rule>,
    /// Play order used to break ties between active quests and to pick the
    /// auto-advance target. Quests missing here are never auto-advanced.
    pub priority: Vec<String>,
    /// Quest completed by arriving at the travel destination.
    #[serde(default)]
    pub travel_quest: Option<String>,
}

impl RuleBook {
    /// The campaign shipped with the game.
    #[must_use]
    pub fn builtin() -> Self {
        use ids::{CHOOSE_PATH, GATHER_SUPPLIES, MEET_ELDER, RAISE_BANNER, SIGN_OATH, TRAVEL_HOME};

        let rules = vec![
            Rule::new(
                CHOOSE_PATH,
                "Choose Your Path",
                "Speak with the seer and decide where your allegiance lies.",
            )
            .next(TRAVEL_HOME)
            .completes_when(Completion::VarSet {
                key: super::vars::PATH_VAR.to_owned(),
            }),
            Rule::new(
                GATHER_SUPPLIES,
                "Gather Supplies",
                "Stock up on provisions before the long road to {path}.",
            )
            .requires(CHOOSE_PATH),
            Rule::new(
                TRAVEL_HOME,
                "Journey Home",
                "Travel to {path} and report to the longhouse.",
            )
            .requires(CHOOSE_PATH)
            .next(MEET_ELDER),
            Rule::new(
                MEET_ELDER,
                "Meet the Elder",
                "Seek an audience with the elder of {path}.",
            )
            .requires(TRAVEL_HOME)
            .next(SIGN_OATH)
            .gated("dreadheim"),
            Rule::new(
                SIGN_OATH,
                "Sign the Oath",
                "Swear the blood oath before the assembled clan.",
            )
            .requires(MEET_ELDER)
            .next(RAISE_BANNER)
            .gated("dreadheim")
            .completes_when(Completion::VarEquals {
                key: CEREMONY_SIGNED_VAR.to_owned(),
                value: Value::Bool(true),
            }),
            Rule::new(
                RAISE_BANNER,
                "Raise the Banner",
                "Raise the banner of {path} over the longhouse.",
            )
            .requires(SIGN_OATH)
            .gated("dreadheim"),
        ];

        Self {
            rules,
            priority: [TRAVEL_HOME, MEET_ELDER, SIGN_OATH, RAISE_BANNER]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            travel_quest: Some(TRAVEL_HOME.to_owned()),
        }
    }

    /// Returns the rule for `quest_id`.
    #[must_use]
    pub fn rule(&self, quest_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == quest_id)
    }

    /// Position in play order; quests outside the priority list sort after
    /// it, in rule declaration order.
    #[must_use]
    pub fn rank(&self, quest_id: &str) -> usize {
        if let Some(pos) = self.priority.iter().position(|id| id == quest_id) {
            return pos;
        }
        let declared = self
            .rules
            .iter()
            .position(|r| r.id == quest_id)
            .unwrap_or(self.rules.len());
        self.priority.len() + declared
    }

    /// Returns `true` if `quest_id` may be promoted by auto-advance.
    #[must_use]
    pub fn auto_advances(&self, quest_id: &str) -> bool {
        self.priority.iter().any(|id| id == quest_id)
    }

    /// Copy of the book with catalog titles and descriptions layered over
    /// the built-in text.
    #[must_use]
    pub fn with_content(&self, content: &QuestContent) -> Self {
        let mut book = self.clone();
        for rule in &mut book.rules {
            let Some(text) = content.get(&rule.id) else {
                continue;
            };
            if let Some(title) = text.title.as_ref().filter(|t| !t.trim().is_empty()) {
                rule.title.clone_from(title);
            }
            if let Some(desc) = text.description.as_ref().filter(|d| !d.trim().is_empty()) {
                rule.description.clone_from(desc);
            }
        }
        book
    }
}
