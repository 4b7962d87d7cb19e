use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::evaluation::{Evaluation, NewEvaluation, NotesUpdate, SaveRequest, SkillsUpdate};
use crate::month::Month;
use crate::rating::{PLACEHOLDER, format_average, format_average_value, format_rating};
use crate::skills::{Skill, SkillDraft};

/// What a player screen is showing: one player in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub player_id: u64,
    pub month: Month,
}

impl ViewKey {
    pub fn new(player_id: u64, month: Month) -> Self {
        Self { player_id, month }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Loading,
    NoEvaluation,
    Creating,
    Viewing,
    EditingSkills,
    EditingNotes,
}

impl Mode {
    pub fn is_editing(self) -> bool {
        matches!(self, Mode::Creating | Mode::EditingSkills | Mode::EditingNotes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("evaluation is still loading")]
    Loading,
    #[error("no evaluation exists for this month")]
    NoEvaluation,
    #[error("an evaluation already exists for this month")]
    AlreadyExists,
    #[error("finish or cancel the current edit first")]
    Busy,
    #[error("nothing is being edited")]
    NotEditing,
    #[error("a save is already in progress")]
    SaveInFlight,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationDraft {
    pub skills: SkillDraft,
    pub notes: String,
}

/// Rating state of one player screen.
///
/// The server-confirmed record and the local draft are kept apart: fetches
/// only ever replace the confirmed copy, and only a successful save moves
/// draft values into it.
#[derive(Debug, Clone)]
pub struct EvaluationView {
    key: ViewKey,
    mode: Mode,
    confirmed: Option<Evaluation>,
    draft: Option<EvaluationDraft>,
    saving: bool,
    error: Option<String>,
}

impl EvaluationView {
    pub fn new(key: ViewKey) -> Self {
        Self {
            key,
            mode: Mode::Loading,
            confirmed: None,
            draft: None,
            saving: false,
            error: None,
        }
    }

    pub fn key(&self) -> ViewKey {
        self.key
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn confirmed(&self) -> Option<&Evaluation> {
        self.confirmed.as_ref()
    }

    pub fn draft(&self) -> Option<&EvaluationDraft> {
        self.draft.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Navigates to another player or month. Anything in progress is dropped.
    pub fn set_key(&mut self, key: ViewKey) -> bool {
        if key == self.key {
            return false;
        }
        *self = Self::new(key);
        true
    }

    /// Applies a fetch result. Returns `false` when it belongs to a key this
    /// view has since navigated away from.
    pub fn apply_fetch(
        &mut self,
        key: ViewKey,
        result: Result<Option<Evaluation>, ApiError>,
    ) -> bool {
        if key != self.key {
            debug!(?key, current = ?self.key, "dropping stale evaluation fetch");
            return false;
        }
        match result {
            Ok(found) => {
                let exists = found.is_some();
                if exists && self.mode == Mode::Creating {
                    // Recorded elsewhere meanwhile; creating again would duplicate it.
                    self.error = Some(ViewError::AlreadyExists.to_string());
                }
                self.confirmed = found;
                self.mode = match self.mode {
                    Mode::Loading | Mode::Viewing | Mode::NoEvaluation if exists => Mode::Viewing,
                    Mode::Loading | Mode::Viewing | Mode::NoEvaluation => Mode::NoEvaluation,
                    editing => editing,
                };
                if !self.mode.is_editing() {
                    self.error = None;
                }
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        true
    }

    pub fn begin_create(&mut self) -> Result<(), ViewError> {
        match self.mode {
            Mode::NoEvaluation => {
                self.draft = Some(EvaluationDraft::default());
                self.mode = Mode::Creating;
                self.error = None;
                Ok(())
            }
            Mode::Loading => Err(ViewError::Loading),
            Mode::Viewing => Err(ViewError::AlreadyExists),
            _ => Err(ViewError::Busy),
        }
    }

    pub fn begin_edit_skills(&mut self) -> Result<(), ViewError> {
        self.begin_edit(Mode::EditingSkills)
    }

    pub fn begin_edit_notes(&mut self) -> Result<(), ViewError> {
        self.begin_edit(Mode::EditingNotes)
    }

    fn begin_edit(&mut self, mode: Mode) -> Result<(), ViewError> {
        let confirmed = self.confirmed_for_edit()?;
        let draft = EvaluationDraft {
            skills: SkillDraft::seeded_from(&confirmed.skills),
            notes: confirmed.notes.clone().unwrap_or_default(),
        };
        self.draft = Some(draft);
        self.mode = mode;
        self.error = None;
        Ok(())
    }

    fn confirmed_for_edit(&self) -> Result<&Evaluation, ViewError> {
        match self.mode {
            Mode::Viewing => self.confirmed.as_ref().ok_or(ViewError::NoEvaluation),
            Mode::Loading => Err(ViewError::Loading),
            Mode::NoEvaluation => Err(ViewError::NoEvaluation),
            _ => Err(ViewError::Busy),
        }
    }

    pub fn cancel(&mut self) -> Result<(), ViewError> {
        if self.saving {
            return Err(ViewError::SaveInFlight);
        }
        self.mode = match self.mode {
            Mode::Creating if self.confirmed.is_some() => Mode::Viewing,
            Mode::Creating => Mode::NoEvaluation,
            Mode::EditingSkills | Mode::EditingNotes => Mode::Viewing,
            _ => return Err(ViewError::NotEditing),
        };
        self.draft = None;
        self.error = None;
        Ok(())
    }

    pub fn set_skill(&mut self, skill: Skill, value: Option<f64>) -> Result<(), ViewError> {
        if self.saving {
            return Err(ViewError::SaveInFlight);
        }
        if !matches!(self.mode, Mode::Creating | Mode::EditingSkills) {
            return Err(ViewError::NotEditing);
        }
        let draft = self.draft.as_mut().ok_or(ViewError::NotEditing)?;
        draft.skills.set(skill, value);
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), ViewError> {
        if self.saving {
            return Err(ViewError::SaveInFlight);
        }
        if !matches!(self.mode, Mode::Creating | Mode::EditingNotes) {
            return Err(ViewError::NotEditing);
        }
        let draft = self.draft.as_mut().ok_or(ViewError::NotEditing)?;
        draft.notes = notes.into();
        Ok(())
    }

    /// Builds the clamped submission for the current edit and marks the view
    /// as saving. The draft stays in place until `finish_save` succeeds.
    pub fn prepare_save(&mut self) -> Result<SaveRequest, ViewError> {
        if self.saving {
            return Err(ViewError::SaveInFlight);
        }
        let draft = self.draft.as_ref().ok_or(ViewError::NotEditing)?;
        let request = match self.mode {
            Mode::Creating if self.confirmed.is_some() => return Err(ViewError::AlreadyExists),
            Mode::Creating => SaveRequest::Create(NewEvaluation {
                player: self.key.player_id,
                evaluated_at: self.key.month,
                skills: draft.skills.clamped(),
                notes: draft.notes.trim().to_string(),
            }),
            Mode::EditingSkills => {
                let confirmed = self.confirmed.as_ref().ok_or(ViewError::NoEvaluation)?;
                SaveRequest::UpdateSkills {
                    id: confirmed.id,
                    update: SkillsUpdate {
                        skills: draft.skills.clamped(),
                        notes: confirmed.notes_trimmed(),
                    },
                }
            }
            Mode::EditingNotes => {
                let confirmed = self.confirmed.as_ref().ok_or(ViewError::NoEvaluation)?;
                SaveRequest::UpdateNotes {
                    id: confirmed.id,
                    update: NotesUpdate {
                        notes: draft.notes.trim().to_string(),
                    },
                }
            }
            _ => return Err(ViewError::NotEditing),
        };
        self.saving = true;
        self.error = None;
        Ok(request)
    }

    /// Applies the outcome of a save. On failure the edit mode and draft are
    /// kept so the user can correct and resubmit.
    pub fn finish_save(&mut self, key: ViewKey, result: Result<Evaluation, ApiError>) -> bool {
        if key != self.key {
            debug!(?key, current = ?self.key, "dropping stale save result");
            return false;
        }
        self.saving = false;
        match result {
            Ok(saved) => {
                self.confirmed = Some(saved);
                self.draft = None;
                self.mode = Mode::Viewing;
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        true
    }

    /// Synchronous save round trip.
    pub fn save(&mut self, client: &ApiClient) -> Result<(), ApiError> {
        let request = self
            .prepare_save()
            .map_err(|err| ApiError::Validation(err.to_string()))?;
        let key = self.key;
        let result = client.submit_evaluation(&request);
        self.finish_save(key, result.clone());
        result.map(|_| ())
    }

    /// Value for a skill as currently shown: the draft while skills are being
    /// entered, the confirmed record otherwise.
    pub fn skill_value(&self, skill: Skill) -> Option<f64> {
        match (self.mode, self.draft.as_ref()) {
            (Mode::Creating | Mode::EditingSkills, Some(draft)) => draft.skills.get(skill),
            _ => self
                .confirmed
                .as_ref()
                .and_then(|e| e.skills.get(skill))
                .map(|r| f64::from(r.value())),
        }
    }

    /// `4 (Very Good)`, or the placeholder when unrated.
    pub fn skill_line(&self, skill: Skill) -> String {
        match self.skill_value(skill) {
            Some(value) => format!("{value} ({})", format_rating(Some(value))),
            None => PLACEHOLDER.to_string(),
        }
    }

    /// `Very Good (3.60)`
    pub fn average_label(&self) -> String {
        let average = self.confirmed.as_ref().and_then(|e| e.average_rating);
        format!(
            "{} ({})",
            format_average(average),
            format_average_value(average)
        )
    }
}
