use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// Identifier of one game node in the skill tree.
pub type GameId = u32;

/// The node every fresh student record starts with.
pub const ENTRY_GAME: GameId = 1;

/// One mini-game's entry in the catalog: display name, passing threshold,
/// and the downstream nodes it proposes to unlock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameNode {
    pub name: String,
    /// Minimum score (0-100) needed to pass this game.
    pub min_score: u32,
    #[serde(default)]
    pub unlocks: Vec<GameId>,
    /// When non-empty, this node only unlocks once every listed game has a
    /// recorded score meeting its own threshold. Used for convergence nodes
    /// where multiple learning paths must all be passed first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_all: Vec<GameId>,
}

/// The full skill-tree catalog, keyed by game id. Loaded once at session
/// start and treated as immutable for the session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    nodes: BTreeMap<GameId, GameNode>,
}

impl Catalog {
    pub fn from_nodes(nodes: impl IntoIterator<Item = (GameId, GameNode)>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Look up a node. A missing id is a configuration bug, not a
    /// recoverable runtime condition.
    pub fn get(&self, id: GameId) -> Result<&GameNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| PlatformError::Config(format!("unknown game id {id}")))
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GameId, &GameNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rejects catalogs that reference unknown ids or contain a cycle in the
    /// unlock graph. Run whenever a stored catalog override is loaded, so a
    /// malformed catalog fails at session start instead of mid-progression.
    pub fn validate(&self) -> Result<()> {
        for (id, node) in &self.nodes {
            for &target in node.unlocks.iter().chain(node.requires_all.iter()) {
                if !self.nodes.contains_key(&target) {
                    return Err(PlatformError::Config(format!(
                        "game {id} references unknown game {target}"
                    )));
                }
            }
        }

        // DFS over unlock edges: 1 = on the current path, 2 = fully explored.
        let mut state: BTreeMap<GameId, u8> = BTreeMap::new();
        for &id in self.nodes.keys() {
            self.check_acyclic(id, &mut state)?;
        }
        Ok(())
    }

    fn check_acyclic(&self, id: GameId, state: &mut BTreeMap<GameId, u8>) -> Result<()> {
        match state.get(&id) {
            Some(1) => {
                return Err(PlatformError::Config(format!(
                    "unlock cycle involving game {id}"
                )))
            }
            Some(2) => return Ok(()),
            _ => {}
        }
        state.insert(id, 1);
        for &next in &self.nodes[&id].unlocks {
            self.check_acyclic(next, state)?;
        }
        state.insert(id, 2);
        Ok(())
    }

    /// The built-in nine-game physics tree, used when no stored catalog
    /// override exists. Two paths split after game 2 and converge on the
    /// finale, which requires both path endings (5 and 8) to be passed.
    pub fn builtin() -> Self {
        fn node(name: &str, min_score: u32, unlocks: &[GameId]) -> GameNode {
            GameNode {
                name: name.to_string(),
                min_score,
                unlocks: unlocks.to_vec(),
                requires_all: Vec::new(),
            }
        }

        let mut finale = node("Finale: Stunt Challenge", 90, &[]);
        finale.requires_all = vec![5, 8];

        Self::from_nodes([
            (1, node("Memory: Termen", 50, &[2])),
            (2, node("Termen Trainer", 60, &[3, 6])),
            (3, node("Krachtenspel", 70, &[4])),
            (4, node("Krachten Tekenen", 65, &[5])),
            (5, node("Hellingproef", 70, &[9])),
            (6, node("Helling Hero", 55, &[7])),
            (7, node("Speed Stunt", 70, &[8])),
            (8, node("Helling Challenge", 70, &[9])),
            (9, finale),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 9);
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.get(9).unwrap().requires_all, vec![5, 8]);
    }

    #[test]
    fn get_unknown_id_is_a_config_error() {
        let err = Catalog::builtin().get(42).unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }

    #[test]
    fn validate_rejects_unknown_unlock_target() {
        let catalog = Catalog::from_nodes([(
            1,
            GameNode {
                name: "A".into(),
                min_score: 50,
                unlocks: vec![7],
                requires_all: vec![],
            },
        )]);
        assert!(matches!(
            catalog.validate(),
            Err(PlatformError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_unlock_cycle() {
        let node = |unlocks: Vec<GameId>| GameNode {
            name: "X".into(),
            min_score: 50,
            unlocks,
            requires_all: vec![],
        };
        let catalog = Catalog::from_nodes([(1, node(vec![2])), (2, node(vec![1]))]);
        assert!(matches!(
            catalog.validate(),
            Err(PlatformError::Config(_))
        ));
    }

    #[test]
    fn round_trips_through_json_with_camel_case_keys() {
        let catalog = Catalog::builtin();
        let json = serde_json::to_string(&catalog).unwrap();
        assert!(json.contains("\"minScore\":50"));
        assert!(json.contains("\"requiresAll\":[5,8]"));
        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
