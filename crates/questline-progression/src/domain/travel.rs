//! Scene transition handoff written when the player sets off.

use serde::{Deserialize, Serialize};

/// One-shot handoff consumed by the destination scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransition {
    /// Destination scene (the chosen path, lowercase).
    pub destination: String,
    /// Quest completed on arrival.
    pub quest_id: String,
    /// Unique token so a replayed arrival is recognized.
    pub token: String,
}

impl PendingTransition {
    /// Returns `true` if arriving in `scene` finalizes this transition.
    #[must_use]
    pub fn matches(&self, scene: &str) -> bool {
        self.destination.eq_ignore_ascii_case(scene.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_ignores_case_and_whitespace() {
        let pending = PendingTransition {
            destination: "dreadheim".to_owned(),
            quest_id: "q_travel_home".to_owned(),
            token: "t".to_owned(),
        };

        assert!(pending.matches(" Dreadheim "));
        assert!(!pending.matches("skyreach"));
    }
}
