//! The unlock engine: pure functions over a student's progress and score
//! records plus the catalog. Holds no state of its own; the caller persists
//! the updated records as one unit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, GameId, GameNode};
use crate::error::Result;

/// Per-node unlock state. Once `unlocked` is true it never goes back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameProgress {
    pub unlocked: bool,
}

/// Per-student unlock map, keyed by game id.
pub type ProgressRecord = BTreeMap<GameId, GameProgress>;

/// Per-student last-achieved scores (0-100). Overwritten on replay, never
/// accumulated. A node counts as completed iff it has an entry here,
/// regardless of whether the score met the threshold.
pub type ScoreRecord = BTreeMap<GameId, u32>;

/// What a completed game did to the student's records.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub passed: bool,
    /// The threshold the score was measured against.
    pub min_score: u32,
    /// Nodes that flipped from locked to unlocked by this completion, in
    /// catalog edge order. Empty on a failed attempt or a replay.
    pub newly_unlocked: Vec<GameId>,
}

/// Applies a completed game's score and recomputes the unlock set.
///
/// The score is always recorded, pass or fail. On a pass, each node listed
/// in the completed game's `unlocks` is unlocked, except nodes that declare
/// `requires_all`: those only unlock once every required game has a recorded
/// score meeting its own threshold (evaluated against the scores including
/// the one just recorded). Unlocking is insert-only, so repeat completions
/// are idempotent and unlocks are monotonic.
///
/// Callers must validate the score range beforehand; the catalog is checked
/// up front so a malformed one fails before any record is touched.
pub fn evaluate_unlocks(
    catalog: &Catalog,
    completed_id: GameId,
    score: u32,
    progress: &mut ProgressRecord,
    scores: &mut ScoreRecord,
) -> Result<Evaluation> {
    let node = catalog.get(completed_id)?;

    // Resolve every id this evaluation could touch before mutating anything.
    for &next in &node.unlocks {
        let target = catalog.get(next)?;
        for &req in &target.requires_all {
            catalog.get(req)?;
        }
    }

    scores.insert(completed_id, score);
    let passed = score >= node.min_score;
    let mut newly_unlocked = Vec::new();

    if passed {
        for &next in &node.unlocks {
            let target = catalog.get(next)?;
            if !requirements_met(catalog, target, scores)? {
                continue;
            }
            let already = progress.get(&next).is_some_and(|p| p.unlocked);
            if !already {
                progress.insert(next, GameProgress { unlocked: true });
                newly_unlocked.push(next);
            }
        }
    }

    Ok(Evaluation {
        passed,
        min_score: node.min_score,
        newly_unlocked,
    })
}

/// True when every game in the node's `requires_all` list has a recorded
/// score meeting that game's own threshold. Trivially true for nodes
/// without requirements.
fn requirements_met(catalog: &Catalog, target: &GameNode, scores: &ScoreRecord) -> Result<bool> {
    for &req in &target.requires_all {
        let threshold = catalog.get(req)?.min_score;
        let met = scores.get(&req).is_some_and(|&s| s >= threshold);
        if !met {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ENTRY_GAME;
    use crate::error::PlatformError;

    fn fresh_records() -> (ProgressRecord, ScoreRecord) {
        let mut progress = ProgressRecord::new();
        progress.insert(ENTRY_GAME, GameProgress { unlocked: true });
        (progress, ScoreRecord::new())
    }

    #[test]
    fn passing_score_unlocks_downstream_node() {
        // Scenario A: fresh record, game 1 (min 50) completed with 55.
        let catalog = Catalog::builtin();
        let (mut progress, mut scores) = fresh_records();

        let eval = evaluate_unlocks(&catalog, 1, 55, &mut progress, &mut scores).unwrap();

        assert!(eval.passed);
        assert_eq!(eval.newly_unlocked, vec![2]);
        assert!(progress[&2].unlocked);
        assert_eq!(scores[&1], 55);
        assert_eq!(progress.len(), 2);
    }

    #[test]
    fn failing_score_is_recorded_but_unlocks_nothing() {
        // Scenario B: score 40 against min 50.
        let catalog = Catalog::builtin();
        let (mut progress, mut scores) = fresh_records();

        let eval = evaluate_unlocks(&catalog, 1, 40, &mut progress, &mut scores).unwrap();

        assert!(!eval.passed);
        assert!(eval.newly_unlocked.is_empty());
        assert_eq!(progress.len(), 1);
        assert_eq!(scores[&1], 40);
    }

    #[test]
    fn unlocks_are_monotonic_across_a_later_failure() {
        let catalog = Catalog::builtin();
        let (mut progress, mut scores) = fresh_records();

        evaluate_unlocks(&catalog, 1, 80, &mut progress, &mut scores).unwrap();
        assert!(progress[&2].unlocked);

        // Replaying game 1 with a failing score must not re-lock game 2.
        evaluate_unlocks(&catalog, 1, 40, &mut progress, &mut scores).unwrap();
        assert!(progress[&2].unlocked);
        assert_eq!(scores[&1], 40);
    }

    #[test]
    fn repeated_passing_completion_is_idempotent() {
        let catalog = Catalog::builtin();
        let (mut progress, mut scores) = fresh_records();

        evaluate_unlocks(&catalog, 1, 70, &mut progress, &mut scores).unwrap();
        let progress_once = progress.clone();
        let scores_once = scores.clone();

        let eval = evaluate_unlocks(&catalog, 1, 70, &mut progress, &mut scores).unwrap();

        assert!(eval.passed);
        assert!(eval.newly_unlocked.is_empty());
        assert_eq!(progress, progress_once);
        assert_eq!(scores, scores_once);
    }

    #[test]
    fn finale_stays_locked_with_only_one_path_passed() {
        let catalog = Catalog::builtin();
        let (mut progress, mut scores) = fresh_records();

        // Game 5 passes comfortably, but game 8 has no score yet.
        let eval = evaluate_unlocks(&catalog, 5, 85, &mut progress, &mut scores).unwrap();

        assert!(eval.passed);
        assert!(eval.newly_unlocked.is_empty());
        assert!(!progress.contains_key(&9));
    }

    #[test]
    fn finale_unlocks_once_both_paths_have_passed() {
        // Scenario C: game 5 already passed at exactly its threshold, then
        // game 8 passes. Only the second completion may unlock the finale.
        let catalog = Catalog::builtin();
        let mut progress = ProgressRecord::new();
        for id in 1..=8 {
            progress.insert(id, GameProgress { unlocked: true });
        }
        let mut scores = ScoreRecord::from([(5, 70)]);

        let eval = evaluate_unlocks(&catalog, 8, 75, &mut progress, &mut scores).unwrap();

        assert!(eval.passed);
        assert_eq!(eval.newly_unlocked, vec![9]);
        assert!(progress[&9].unlocked);
    }

    #[test]
    fn finale_requirement_sees_the_score_just_recorded() {
        // Game 8 passed earlier; completing game 5 now must count its own
        // fresh score when checking the finale's requirements.
        let catalog = Catalog::builtin();
        let mut progress = ProgressRecord::new();
        for id in 1..=8 {
            progress.insert(id, GameProgress { unlocked: true });
        }
        let mut scores = ScoreRecord::from([(8, 75)]);

        let eval = evaluate_unlocks(&catalog, 5, 70, &mut progress, &mut scores).unwrap();

        assert_eq!(eval.newly_unlocked, vec![9]);
    }

    #[test]
    fn failing_finale_requirement_score_does_not_count() {
        let catalog = Catalog::builtin();
        let mut progress = ProgressRecord::new();
        for id in 1..=8 {
            progress.insert(id, GameProgress { unlocked: true });
        }
        // Game 5 completed but below its threshold of 70.
        let mut scores = ScoreRecord::from([(5, 60)]);

        let eval = evaluate_unlocks(&catalog, 8, 75, &mut progress, &mut scores).unwrap();

        assert!(eval.passed);
        assert!(!progress.contains_key(&9));
    }

    #[test]
    fn unknown_game_fails_without_touching_records() {
        let catalog = Catalog::builtin();
        let (mut progress, mut scores) = fresh_records();
        let before = progress.clone();

        let err = evaluate_unlocks(&catalog, 42, 90, &mut progress, &mut scores).unwrap_err();

        assert!(matches!(err, PlatformError::Config(_)));
        assert_eq!(progress, before);
        assert!(scores.is_empty());
    }
}
