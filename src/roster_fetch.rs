use std::path::Path;

use serde_json::json;

use crate::api::{ApiClient, ApiError, FilePart, Method, RequestBody, decode_json, json_body};
use crate::evaluation::{Evaluation, SaveRequest, parse_evaluation_list_json};
use crate::evaluation_view::ViewKey;
use crate::month::Month;
use crate::roster::{Group, Me, Player, ResetOutcome, safe_photo_filename};

impl ApiClient {
    pub fn fetch_me(&self) -> Result<Me, ApiError> {
        self.request_json(Method::Get, "/api/auth/me/", RequestBody::Empty)
    }

    pub fn fetch_group(&self, group_id: u64) -> Result<Group, ApiError> {
        self.request_json(
            Method::Get,
            &format!("/api/groups/{group_id}/"),
            RequestBody::Empty,
        )
    }

    pub fn fetch_group_players(&self, group_id: u64) -> Result<Vec<Player>, ApiError> {
        self.request_json(
            Method::Get,
            &format!("/api/players/?group={group_id}"),
            RequestBody::Empty,
        )
    }

    pub fn fetch_all_players(&self) -> Result<Vec<Player>, ApiError> {
        self.request_json(Method::Get, "/api/players/", RequestBody::Empty)
    }

    pub fn rename_group(&self, group_id: u64, name: &str) -> Result<Group, ApiError> {
        self.request_json(
            Method::Patch,
            &format!("/api/groups/{group_id}/rename/"),
            RequestBody::Json(json!({ "name": name })),
        )
    }

    pub fn reset_group_evaluations(&self, group_id: u64) -> Result<ResetOutcome, ApiError> {
        let resp = self.request(
            Method::Post,
            &format!("/api/groups/{group_id}/reset-evaluations/"),
            RequestBody::Empty,
        )?;
        if resp.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ResetOutcome::default());
        }
        decode_json(&resp.body)
    }

    pub fn download_group_pdf(&self, group_id: u64) -> Result<Vec<u8>, ApiError> {
        self.request_bytes(&format!("/api/groups/{group_id}/report-pdf/"))
    }

    pub fn fetch_player(&self, key: ViewKey) -> Result<Player, ApiError> {
        self.request_json(
            Method::Get,
            &format!("/api/players/{}/?month={}", key.player_id, key.month),
            RequestBody::Empty,
        )
    }

    pub fn assign_player_group(&self, player_id: u64, group_id: u64) -> Result<Player, ApiError> {
        self.request_json(
            Method::Patch,
            &format!("/api/players/{player_id}/"),
            RequestBody::Json(json!({ "group": group_id })),
        )
    }

    pub fn delete_player(&self, player_id: u64) -> Result<(), ApiError> {
        self.request(
            Method::Delete,
            &format!("/api/players/{player_id}/"),
            RequestBody::Empty,
        )
        .map(|_| ())
    }

    pub fn upload_player_photo(
        &self,
        player_id: u64,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<Player, ApiError> {
        let part = FilePart {
            field: "photo".to_string(),
            filename: safe_photo_filename(filename),
            bytes,
        };
        self.request_json(
            Method::Patch,
            &format!("/api/players/{player_id}/"),
            RequestBody::Multipart(vec![part]),
        )
    }

    pub fn download_player_pdf(&self, player_id: u64, month: Month) -> Result<Vec<u8>, ApiError> {
        self.request_bytes(&format!(
            "/api/players/{player_id}/report-pdf/?month={month}"
        ))
    }

    /// The evaluation for `key`, if one was recorded.
    pub fn fetch_evaluation(&self, key: ViewKey) -> Result<Option<Evaluation>, ApiError> {
        let resp = self.request(
            Method::Get,
            &format!(
                "/api/evaluations/?player={}&month={}",
                key.player_id, key.month
            ),
            RequestBody::Empty,
        )?;
        let raw = String::from_utf8_lossy(&resp.body);
        parse_evaluation_list_json(&raw).map_err(|err| ApiError::Decode(format!("{err:#}")))
    }

    pub fn submit_evaluation(&self, request: &SaveRequest) -> Result<Evaluation, ApiError> {
        match request {
            SaveRequest::Create(payload) => {
                self.request_json(Method::Post, "/api/evaluations/", json_body(payload)?)
            }
            SaveRequest::UpdateSkills { id, update } => self.request_json(
                Method::Patch,
                &format!("/api/evaluations/{id}/"),
                json_body(update)?,
            ),
            SaveRequest::UpdateNotes { id, update } => self.request_json(
                Method::Patch,
                &format!("/api/evaluations/{id}/"),
                json_body(update)?,
            ),
        }
    }
}

pub fn group_pdf_name(group_id: u64) -> String {
    format!("group-{group_id}-report.pdf")
}

pub fn player_pdf_name(player_id: u64) -> String {
    format!("player-{player_id}-report.pdf")
}

/// Display name of an upload source, as sent to `safe_photo_filename`.
pub fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
