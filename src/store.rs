//! Local key-value persistence for student records, the roster index, the
//! catalog override, and the teacher password. One file per key under the
//! store root; records are replaced whole, never patched.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{Catalog, ENTRY_GAME};
use crate::error::Result;
use crate::progression::{GameProgress, ProgressRecord, ScoreRecord};

const DEFAULT_TEACHER_PASSWORD: &str = "admin123";

/// One student's complete persisted record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentData {
    pub id: String,
    pub name: String,
    pub class: String,
    pub progress: ProgressRecord,
    pub scores: ScoreRecord,
    pub last_active: DateTime<Utc>,
}

impl StudentData {
    /// Fresh record: only the entry game unlocked, no scores yet.
    pub fn new(id: String, name: String, class: String) -> Self {
        let mut progress = ProgressRecord::new();
        progress.insert(ENTRY_GAME, GameProgress { unlocked: true });
        Self {
            id,
            name,
            class,
            progress,
            scores: ScoreRecord::new(),
            last_active: Utc::now(),
        }
    }

    /// Games with a recorded score, pass or fail.
    pub fn completed_count(&self) -> usize {
        self.scores.len()
    }
}

/// Lightweight roster projection, appended the first time a student id is
/// saved and never updated afterwards. The id is the durable identity; the
/// name and class here are just the labels from that first save.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub class: String,
}

/// File-per-key store rooted at a directory. Each browser-profile-style key
/// maps to one file with the same name.
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open (and create if needed) a store at the given directory.
    pub fn open(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Default location under the user's home directory.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".leerpad"))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// The stored teacher password, or the default when none was ever set.
    pub fn teacher_password(&self) -> String {
        fs::read_to_string(self.key_path("teacherPassword"))
            .ok()
            .unwrap_or_else(|| DEFAULT_TEACHER_PASSWORD.to_string())
    }

    pub fn set_teacher_password(&self, password: &str) -> Result<()> {
        fs::write(self.key_path("teacherPassword"), password)?;
        debug!("[STORE] teacher password updated");
        Ok(())
    }

    /// Load the catalog override, falling back to the built-in tree when the
    /// key is absent or holds unreadable JSON. A parseable override that
    /// references unknown ids or contains a cycle is a hard error: better to
    /// stop at session start than to evaluate progression against it.
    pub fn load_catalog(&self) -> Result<Catalog> {
        let catalog = match fs::read_to_string(self.key_path("gamesConfig")) {
            Ok(content) => match serde_json::from_str::<Catalog>(&content) {
                Ok(catalog) => catalog,
                Err(err) => {
                    warn!("[STORE] corrupt gamesConfig, using builtin catalog: {err}");
                    Catalog::builtin()
                }
            },
            Err(_) => Catalog::builtin(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Persist a catalog override. Validated first so a bad catalog can
    /// never be written through this API.
    pub fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        catalog.validate()?;
        let json = serde_json::to_string_pretty(catalog)?;
        fs::write(self.key_path("gamesConfig"), json)?;
        debug!("[STORE] catalog override saved ({} games)", catalog.len());
        Ok(())
    }

    /// Load one student record. Absent or unreadable records come back as
    /// `None`; the caller creates a fresh record rather than crashing the
    /// session over a corrupt file.
    pub fn load_student(&self, id: &str) -> Option<StudentData> {
        let content = fs::read_to_string(self.key_path(&format!("student_{id}"))).ok()?;
        match serde_json::from_str(&content) {
            Ok(data) => Some(data),
            Err(err) => {
                warn!("[STORE] corrupt record for student {id}: {err}");
                None
            }
        }
    }

    /// Replace a student record and make sure the roster index knows the id.
    /// The roster entry is written once per id and left alone afterwards.
    pub fn save_student(&self, student: &StudentData) -> Result<()> {
        let json = serde_json::to_string_pretty(student)?;
        fs::write(self.key_path(&format!("student_{}", student.id)), json)?;

        let mut roster = self.roster();
        if !roster.iter().any(|entry| entry.id == student.id) {
            roster.push(RosterEntry {
                id: student.id.clone(),
                name: student.name.clone(),
                class: student.class.clone(),
            });
            fs::write(
                self.key_path("allStudents"),
                serde_json::to_string_pretty(&roster)?,
            )?;
            debug!("[STORE] roster entry added for {}", student.id);
        }
        Ok(())
    }

    /// All known students, in first-save order.
    pub fn roster(&self) -> Vec<RosterEntry> {
        fs::read_to_string(self.key_path("allStudents"))
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GameNode;
    use crate::error::PlatformError;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn teacher_password_defaults_until_set() {
        let (_dir, store) = temp_store();
        assert_eq!(store.teacher_password(), "admin123");

        store.set_teacher_password("geheim").unwrap();
        assert_eq!(store.teacher_password(), "geheim");
    }

    #[test]
    fn catalog_falls_back_to_builtin_when_absent() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load_catalog().unwrap(), Catalog::builtin());
    }

    #[test]
    fn catalog_override_round_trips() {
        let (_dir, store) = temp_store();
        let custom = Catalog::from_nodes([(
            1,
            GameNode {
                name: "Solo".into(),
                min_score: 80,
                unlocks: vec![],
                requires_all: vec![],
            },
        )]);
        store.save_catalog(&custom).unwrap();
        assert_eq!(store.load_catalog().unwrap(), custom);
    }

    #[test]
    fn unreadable_catalog_json_falls_back_to_builtin() {
        let (dir, store) = temp_store();
        fs::write(dir.path().join("gamesConfig"), "{not json").unwrap();
        assert_eq!(store.load_catalog().unwrap(), Catalog::builtin());
    }

    #[test]
    fn structurally_invalid_catalog_fails_at_load() {
        let (dir, store) = temp_store();
        // Valid JSON, but game 1 unlocks a node that doesn't exist.
        fs::write(
            dir.path().join("gamesConfig"),
            r#"{"1": {"name": "A", "minScore": 50, "unlocks": [99]}}"#,
        )
        .unwrap();
        assert!(matches!(
            store.load_catalog(),
            Err(PlatformError::Config(_))
        ));
    }

    #[test]
    fn student_record_round_trips() {
        let (_dir, store) = temp_store();
        let student = StudentData::new("jan_jansen_3a".into(), "Jan Jansen".into(), "3A".into());
        store.save_student(&student).unwrap();

        let loaded = store.load_student("jan_jansen_3a").unwrap();
        assert_eq!(loaded, student);
        assert!(loaded.progress[&ENTRY_GAME].unlocked);
        assert!(loaded.scores.is_empty());
    }

    #[test]
    fn corrupt_student_record_reads_as_absent() {
        let (dir, store) = temp_store();
        fs::write(dir.path().join("student_broken_1a"), "garbage").unwrap();
        assert!(store.load_student("broken_1a").is_none());
    }

    #[test]
    fn roster_gets_one_entry_per_student_id() {
        let (_dir, store) = temp_store();
        let mut student =
            StudentData::new("jan_jansen_3a".into(), "Jan Jansen".into(), "3A".into());
        store.save_student(&student).unwrap();

        // A later save with new scores must not append a duplicate.
        student.scores.insert(1, 55);
        store.save_student(&student).unwrap();

        let roster = store.roster();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, "jan_jansen_3a");
        assert_eq!(roster[0].name, "Jan Jansen");
    }
}
