//! The session controller: holds the logged-in identity, the catalog
//! snapshot, and the currently open game, and routes completed scores
//! through the unlock engine and back into the store.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::catalog::{Catalog, GameId, GameNode};
use crate::error::{PlatformError, Result};
use crate::minigame::GameSignal;
use crate::progression::{self, Evaluation};
use crate::store::{Store, StudentData};
use crate::util;

/// Who is logged in. Teachers carry no per-user state.
pub enum Identity {
    Student(StudentData),
    Teacher,
}

/// One row of the teacher dashboard.
#[derive(Clone, Debug, PartialEq)]
pub struct StudentSummary {
    pub name: String,
    pub class: String,
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
    pub last_active: DateTime<Utc>,
}

pub struct Session {
    store: Store,
    catalog: Catalog,
    identity: Option<Identity>,
    active_game: Option<GameId>,
}

impl Session {
    /// Start a session: loads the catalog once, up front. A structurally
    /// invalid catalog override aborts here rather than mid-progression.
    pub fn new(store: Store) -> Result<Self> {
        let catalog = store.load_catalog()?;
        Ok(Self {
            store,
            catalog,
            identity: None,
            active_game: None,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn student(&self) -> Option<&StudentData> {
        match self.identity.as_ref() {
            Some(Identity::Student(data)) => Some(data),
            _ => None,
        }
    }

    pub fn active_game(&self) -> Option<GameId> {
        self.active_game
    }

    /// Log a student in, creating their record on first login. The id is
    /// derived from name and class, so the same inputs always resolve to
    /// the same stored record.
    pub fn login_student(&mut self, name: &str, class: &str) -> Result<&StudentData> {
        let name = name.trim();
        let class = class.trim();
        if name.is_empty() || class.is_empty() {
            return Err(PlatformError::Validation(
                "name and class are both required".into(),
            ));
        }

        let id = util::student_id(name, class);
        let data = match self.store.load_student(&id) {
            Some(existing) => {
                info!("[LOGIN] returning student id:{id} completed:{}", existing.completed_count());
                existing
            }
            None => {
                let fresh = StudentData::new(id.clone(), name.to_string(), class.to_string());
                self.store.save_student(&fresh)?;
                info!("[LOGIN] new student id:{id} class:{class}");
                fresh
            }
        };

        self.identity = Some(Identity::Student(data));
        self.active_game = None;
        match self.identity.as_ref() {
            Some(Identity::Student(data)) => Ok(data),
            _ => unreachable!(),
        }
    }

    /// Teacher login is a plain comparison against the stored password.
    pub fn login_teacher(&mut self, password: &str) -> Result<()> {
        if password != self.store.teacher_password() {
            warn!("[LOGIN] teacher password mismatch");
            return Err(PlatformError::Auth);
        }
        self.identity = Some(Identity::Teacher);
        self.active_game = None;
        info!("[LOGIN] teacher logged in");
        Ok(())
    }

    /// Open an unlocked game for the logged-in student. Locked nodes are a
    /// user-facing rejection, not a state change.
    pub fn open_game(&mut self, id: GameId) -> Result<&GameNode> {
        let student = self.student().ok_or_else(|| {
            PlatformError::Validation("no student is logged in".into())
        })?;
        if self.active_game.is_some() {
            return Err(PlatformError::Validation(
                "another game is already open".into(),
            ));
        }
        // Unknown id here means the tree and the catalog disagree.
        self.catalog.get(id)?;

        let unlocked = student.progress.get(&id).is_some_and(|p| p.unlocked);
        if !unlocked {
            return Err(PlatformError::Locked(id));
        }

        self.active_game = Some(id);
        info!("[GAME] opened id:{id}");
        self.catalog.get(id)
    }

    /// Apply a completed game's score: validate the range centrally (the
    /// widget's own clamping is not trusted), run the unlock engine, stamp
    /// `lastActive`, and persist the record as one unit.
    pub fn complete_game(&mut self, score: u32) -> Result<Evaluation> {
        let id = self
            .active_game
            .ok_or_else(|| PlatformError::Validation("no game is open".into()))?;
        if score > 100 {
            return Err(PlatformError::Validation(format!(
                "score {score} is out of range 0-100"
            )));
        }
        let Some(Identity::Student(data)) = self.identity.as_mut() else {
            return Err(PlatformError::Validation("no student is logged in".into()));
        };

        let eval = progression::evaluate_unlocks(
            &self.catalog,
            id,
            score,
            &mut data.progress,
            &mut data.scores,
        )?;
        data.last_active = Utc::now();
        self.store.save_student(data)?;
        self.active_game = None;

        info!(
            "[GAME] completed id:{id} score:{score} passed:{} unlocked:{:?}",
            eval.passed, eval.newly_unlocked
        );
        Ok(eval)
    }

    /// Close the open game without a score.
    pub fn close_game(&mut self) {
        if let Some(id) = self.active_game.take() {
            info!("[GAME] closed id:{id} without score");
        }
    }

    /// Route a widget signal: a completion goes through the unlock engine,
    /// a close just tears the game view down.
    pub fn handle_signal(&mut self, signal: GameSignal) -> Result<Option<Evaluation>> {
        match signal {
            GameSignal::Completed(score) => self.complete_game(score).map(Some),
            GameSignal::Close => {
                self.close_game();
                Ok(None)
            }
        }
    }

    /// Per-student progress summaries for the teacher dashboard. Students
    /// whose record went missing since their roster entry are skipped.
    pub fn dashboard(&self) -> Result<Vec<StudentSummary>> {
        if !matches!(self.identity, Some(Identity::Teacher)) {
            return Err(PlatformError::Auth);
        }
        let total = self.catalog.len();
        let summaries = self
            .store
            .roster()
            .into_iter()
            .filter_map(|entry| self.store.load_student(&entry.id))
            .map(|data| {
                let completed = data.completed_count();
                let percent = (completed as f64 / total as f64 * 100.0).round() as u32;
                StudentSummary {
                    name: data.name,
                    class: data.class,
                    completed,
                    total,
                    percent,
                    last_active: data.last_active,
                }
            })
            .collect();
        Ok(summaries)
    }

    /// Teacher-only: replace the stored password.
    pub fn set_teacher_password(&mut self, password: &str) -> Result<()> {
        if !matches!(self.identity, Some(Identity::Teacher)) {
            return Err(PlatformError::Auth);
        }
        if password.trim().is_empty() {
            return Err(PlatformError::Validation("password may not be empty".into()));
        }
        self.store.set_teacher_password(password)
    }

    /// Teacher-only: persist a new catalog and adopt it for this session.
    pub fn update_catalog(&mut self, catalog: Catalog) -> Result<()> {
        if !matches!(self.identity, Some(Identity::Teacher)) {
            return Err(PlatformError::Auth);
        }
        self.store.save_catalog(&catalog)?;
        info!("[CATALOG] replaced ({} games)", catalog.len());
        self.catalog = catalog;
        Ok(())
    }

    /// Clear all in-memory state. No persistence side effect.
    pub fn logout(&mut self) {
        self.identity = None;
        self.active_game = None;
        info!("[LOGIN] logged out");
    }
}
