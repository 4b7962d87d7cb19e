use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::month::Month;
use crate::skills::SkillRatings;

/// One monthly scored record for a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: u64,
    #[serde(default)]
    pub player: Option<u64>,
    #[serde(default)]
    pub evaluated_at: Option<Month>,
    #[serde(flatten)]
    pub skills: SkillRatings,
    /// Computed by the backend; never written by this client.
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Evaluation {
    pub fn notes_trimmed(&self) -> String {
        self.notes.as_deref().unwrap_or_default().trim().to_string()
    }
}

/// Body of `POST /api/evaluations/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEvaluation {
    pub player: u64,
    pub evaluated_at: Month,
    #[serde(flatten)]
    pub skills: SkillRatings,
    pub notes: String,
}

/// Body of `PATCH /api/evaluations/{id}/` after a skills edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillsUpdate {
    #[serde(flatten)]
    pub skills: SkillRatings,
    pub notes: String,
}

/// Body of `PATCH /api/evaluations/{id}/` after a notes edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotesUpdate {
    pub notes: String,
}

/// A fully clamped submission, ready for the network.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    Create(NewEvaluation),
    UpdateSkills { id: u64, update: SkillsUpdate },
    UpdateNotes { id: u64, update: NotesUpdate },
}

impl SaveRequest {
    pub fn describe(&self) -> &'static str {
        match self {
            SaveRequest::Create(_) => "create evaluation",
            SaveRequest::UpdateSkills { .. } => "save skills",
            SaveRequest::UpdateNotes { .. } => "save notes",
        }
    }
}

pub fn parse_evaluation_json(raw: &str) -> Result<Evaluation> {
    serde_json::from_str(raw.trim()).context("invalid evaluation json")
}

/// The list endpoint filters by player and month; the first entry is the record.
pub fn parse_evaluation_list_json(raw: &str) -> Result<Option<Evaluation>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let list: Vec<Evaluation> =
        serde_json::from_str(trimmed).context("invalid evaluation list json")?;
    Ok(list.into_iter().next())
}
