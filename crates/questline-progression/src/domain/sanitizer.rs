//! The sanitizer: derives a consistent quest log from the rule book, the
//! player variables and whatever the shared store currently holds.
//!
//! [`evaluate`] is a pure, idempotent pass. After it returns:
//!
//! 1. at most one quest is `Active`;
//! 2. every `Available`/`Active` quest has all prerequisites `Completed` and
//!    an open path gate;
//! 3. a `Locked` quest whose prerequisites are all met has been unlocked to
//!    `Available` (never straight to `Active`);
//! 4. if no quest is `Active`, the highest-priority `Available` quest from
//!    the play order has been promoted.

use std::collections::HashSet;

use super::quest::{Quest, QuestStatus, find};
use super::rules::{Rule, RuleBook};
use super::vars::Vars;

/// Runs the full rule evaluation and invariant repair over `current`.
#[must_use]
pub fn evaluate(book: &RuleBook, vars: &Vars, current: &[Quest]) -> Vec<Quest> {
    let mut quests = dedupe(current);
    seed_missing(book, vars, &mut quests);
    settle(book, vars, &mut quests);
    demote_violations(book, vars, &mut quests);
    enforce_single_active(book, &mut quests);
    auto_advance(book, &mut quests);
    render_text(book, vars, &mut quests);
    quests
}

/// Returns `true` when `rule`'s prerequisites are all completed in `quests`
/// and its path gate is open.
#[must_use]
pub fn prerequisites_met(rule: &Rule, vars: &Vars, quests: &[Quest]) -> bool {
    rule.gate_open(vars)
        && rule.requires.iter().all(|required| {
            find(quests, required).is_some_and(|q| q.status == QuestStatus::Completed)
        })
}

fn eligible(book: &RuleBook, vars: &Vars, quests: &[Quest], quest_id: &str) -> bool {
    // Quests unknown to the rule book declare no prerequisites.
    book.rule(quest_id)
        .is_none_or(|rule| prerequisites_met(rule, vars, quests))
}

/// Keeps the first record for each id; a corrupt document may repeat one.
fn dedupe(current: &[Quest]) -> Vec<Quest> {
    let mut seen = HashSet::new();
    current
        .iter()
        .filter(|q| seen.insert(q.id.clone()))
        .cloned()
        .collect()
}

fn seed_missing(book: &RuleBook, vars: &Vars, quests: &mut Vec<Quest>) {
    for rule in &book.rules {
        if find(quests, &rule.id).is_some() {
            continue;
        }
        let status = if prerequisites_met(rule, vars, quests) {
            QuestStatus::Available
        } else {
            QuestStatus::Locked
        };
        tracing::debug!(quest_id = %rule.id, ?status, "seeding quest");
        quests.push(Quest::new(
            rule.id.clone(),
            rule.title.clone(),
            vars.render(&rule.description),
            status,
        ));
    }
}

/// Applies variable-driven completions and unlocks until nothing changes.
/// Each round can only move quests forward, so the loop is bounded by the
/// number of rules.
fn settle(book: &RuleBook, vars: &Vars, quests: &mut [Quest]) {
    for _ in 0..=book.rules.len() {
        let mut changed = false;
        for rule in &book.rules {
            let met = prerequisites_met(rule, vars, quests);
            let Some(quest) = quests.iter_mut().find(|q| q.id == rule.id) else {
                continue;
            };
            if !met || quest.status == QuestStatus::Completed {
                continue;
            }
            if rule.completes_when.as_ref().is_some_and(|c| c.is_met(vars)) {
                tracing::debug!(quest_id = %quest.id, "completion condition met");
                quest.mark_completed();
                changed = true;
            } else if quest.status == QuestStatus::Locked {
                tracing::debug!(quest_id = %quest.id, "prerequisites met; unlocking");
                quest.status = QuestStatus::Available;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn demote_violations(book: &RuleBook, vars: &Vars, quests: &mut [Quest]) {
    let violating: Vec<String> = quests
        .iter()
        .filter(|q| q.status.is_open() && !eligible(book, vars, quests, &q.id))
        .map(|q| q.id.clone())
        .collect();
    for quest in quests.iter_mut().filter(|q| violating.contains(&q.id)) {
        tracing::info!(quest_id = %quest.id, from = ?quest.status, "relocking quest with unmet prerequisites");
        quest.relock();
    }
}

fn enforce_single_active(book: &RuleBook, quests: &mut [Quest]) {
    let keep = quests
        .iter()
        .filter(|q| q.status == QuestStatus::Active)
        .min_by_key(|q| book.rank(&q.id))
        .map(|q| q.id.clone());
    let Some(keep) = keep else {
        return;
    };
    for quest in quests
        .iter_mut()
        .filter(|q| q.status == QuestStatus::Active && q.id != keep)
    {
        tracing::info!(quest_id = %quest.id, kept = %keep, "demoting concurrent active quest");
        quest.status = QuestStatus::Available;
    }
}

fn auto_advance(book: &RuleBook, quests: &mut [Quest]) {
    if quests.iter().any(|q| q.status == QuestStatus::Active) {
        return;
    }
    let candidate = quests
        .iter_mut()
        .filter(|q| q.status == QuestStatus::Available && book.auto_advances(&q.id))
        .min_by_key(|q| book.rank(&q.id));
    if let Some(quest) = candidate {
        tracing::info!(quest_id = %quest.id, "auto-advancing to next quest");
        quest.status = QuestStatus::Active;
    }
}

fn render_text(book: &RuleBook, vars: &Vars, quests: &mut [Quest]) {
    for quest in quests.iter_mut() {
        if let Some(rule) = book.rule(&quest.id) {
            quest.title.clone_from(&rule.title);
            quest.description = vars.render(&rule.description);
        }
    }
}
