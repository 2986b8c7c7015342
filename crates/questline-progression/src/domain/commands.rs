//! Commands for the Progression context.

use questline_core::command::Command;
use uuid::Uuid;

use super::vars::Vars;

/// Make a quest the active one, demoting any other active quest.
#[derive(Debug, Clone)]
pub struct SetActive {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Quest to activate.
    pub quest_id: String,
}

impl SetActive {
    /// Creates the command with a fresh correlation id.
    #[must_use]
    pub fn new(quest_id: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            quest_id: quest_id.into(),
        }
    }
}

impl Command for SetActive {
    fn command_type(&self) -> &'static str {
        "progression.set_active"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Complete a quest, optionally activating a follow-up quest.
#[derive(Debug, Clone)]
pub struct CompleteQuest {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Quest to complete.
    pub quest_id: String,
    /// Quest to activate afterwards, if it is available then.
    pub next: Option<String>,
}

impl CompleteQuest {
    /// Creates the command with a fresh correlation id and no follow-up.
    #[must_use]
    pub fn new(quest_id: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            quest_id: quest_id.into(),
            next: None,
        }
    }

    /// Sets the follow-up quest.
    #[must_use]
    pub fn then_activate(mut self, next: Option<String>) -> Self {
        self.next = next;
        self
    }
}

impl Command for CompleteQuest {
    fn command_type(&self) -> &'static str {
        "progression.complete_quest"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Merge variables into the player's variable document.
#[derive(Debug, Clone)]
pub struct SetVars {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Variables to merge.
    pub vars: Vars,
}

impl SetVars {
    /// Creates the command with a fresh correlation id.
    #[must_use]
    pub fn new(vars: Vars) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            vars,
        }
    }
}

impl Command for SetVars {
    fn command_type(&self) -> &'static str {
        "progression.set_vars"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Update the display progress of a quest.
#[derive(Debug, Clone)]
pub struct SetProgress {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Quest to update.
    pub quest_id: String,
    /// Requested progress; clamped to 0–100.
    pub progress: i64,
}

impl Command for SetProgress {
    fn command_type(&self) -> &'static str {
        "progression.set_progress"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Re-run the rules against whatever the shared store holds now.
#[derive(Debug, Clone)]
pub struct Reconcile {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Reconcile {
    /// Creates the command with a fresh correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
        }
    }
}

impl Default for Reconcile {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for Reconcile {
    fn command_type(&self) -> &'static str {
        "progression.reconcile"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Start travelling to the chosen path's homeland.
#[derive(Debug, Clone)]
pub struct BeginTravel {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for BeginTravel {
    fn command_type(&self) -> &'static str {
        "progression.begin_travel"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// The destination scene finished loading.
#[derive(Debug, Clone)]
pub struct ArriveAtScene {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Scene the player arrived in.
    pub scene: String,
}

impl Command for ArriveAtScene {
    fn command_type(&self) -> &'static str {
        "progression.arrive_at_scene"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
