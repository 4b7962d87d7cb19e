use serde::{Deserialize, Serialize};

use crate::api::ApiError;

const MAX_PHOTO_BASE_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl UserInfo {
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() && self.last_name.is_empty() {
            return self.username.clone();
        }
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coach {
    pub id: u64,
    pub user: UserInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub coach: Option<Coach>,
}

impl Group {
    pub fn coach_display(&self) -> String {
        self.coach
            .as_ref()
            .map(|c| c.user.display_name())
            .unwrap_or_else(|| "Unassigned".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feet {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "B")]
    Both,
}

impl Feet {
    pub fn label(self) -> &'static str {
        match self {
            Feet::Left => "Left",
            Feet::Right => "Right",
            Feet::Both => "Both",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub group: Option<u64>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub tall: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub feet: Option<Feet>,
    /// Only present when fetched for a specific month.
    #[serde(default)]
    pub attendance_days: Option<u8>,
}

impl Player {
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|p| !p.is_empty())
    }

    /// `Age: 12 • Phone: 555 • Tall: 150 cm • Weight: 40 kg • Feet: Left`
    pub fn profile_line(&self) -> String {
        let mut out = format!("Age: {}", self.age);
        if let Some(phone) = self.phone() {
            out.push_str(&format!(" • Phone: {phone}"));
        }
        if let Some(tall) = self.tall {
            out.push_str(&format!(" • Tall: {tall} cm"));
        }
        if let Some(weight) = self.weight {
            out.push_str(&format!(" • Weight: {weight} kg"));
        }
        if let Some(feet) = self.feet {
            out.push_str(&format!(" • Feet: {}", feet.label()));
        }
        out
    }

    /// Row text for the group list.
    pub fn contact_line(&self) -> String {
        match self.phone() {
            Some(phone) => format!("{phone} • {} y/o", self.age),
            None => format!("{} y/o", self.age),
        }
    }

    /// Option text for the add-existing-player picker.
    pub fn option_label(&self) -> String {
        match self.phone() {
            Some(phone) => format!("{} ({} y/o, {phone})", self.name, self.age),
            None => format!("{} ({} y/o)", self.name, self.age),
        }
    }

    pub fn photo_url(&self, api_url: &str) -> Option<String> {
        let photo = self.photo.as_deref().filter(|p| !p.is_empty())?;
        if photo.starts_with("http") {
            Some(photo.to_string())
        } else {
            Some(format!("{}{photo}", api_url.trim_end_matches('/')))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Me {
    pub user: UserInfo,
    #[serde(default)]
    pub is_staff: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResetOutcome {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub updated: Option<u64>,
}

impl ResetOutcome {
    pub fn message(&self) -> String {
        self.detail
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "Evaluations reset for this group.".to_string())
    }
}

/// Upload name for a player photo: the base reduced to `[a-zA-Z0-9-_]` runs
/// joined by `-`, lowercased, capped at 80 chars; the extension is kept as is.
pub fn safe_photo_filename(original: &str) -> String {
    let original = if original.is_empty() { "photo" } else { original };
    let (base, ext) = match original.rfind('.') {
        Some(idx) if idx + 1 < original.len() => original.split_at(idx),
        _ => (original, ""),
    };
    let mut cleaned = String::with_capacity(base.len());
    for ch in base.chars() {
        let keep = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_';
        let ch = if keep { ch.to_ascii_lowercase() } else { '-' };
        if ch == '-' && cleaned.ends_with('-') {
            continue;
        }
        cleaned.push(ch);
    }
    if cleaned.is_empty() {
        cleaned.push_str("photo");
    }
    let capped: String = cleaned.chars().take(MAX_PHOTO_BASE_LEN).collect();
    format!("{capped}{ext}")
}

/// Local state of the group screen.
#[derive(Debug, Clone, Default)]
pub struct GroupView {
    pub group_id: u64,
    pub group: Option<Group>,
    pub players: Vec<Player>,
    pub all_players: Vec<Player>,
    pub loading: bool,
    pub error: Option<String>,
}

impl GroupView {
    pub fn new(group_id: u64) -> Self {
        Self {
            group_id,
            loading: true,
            ..Self::default()
        }
    }

    /// Players that could be moved into this group.
    pub fn candidates(&self) -> Vec<&Player> {
        self.all_players
            .iter()
            .filter(|p| p.group != Some(self.group_id))
            .collect()
    }

    pub fn validate_rename(&self, raw: &str) -> Result<String, ApiError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Group name cannot be empty.".to_string()));
        }
        Ok(name.to_string())
    }

    pub fn validate_selection(selected: Option<u64>) -> Result<u64, ApiError> {
        selected.ok_or_else(|| ApiError::Validation("Please select a player to add.".to_string()))
    }

    pub fn apply_group(&mut self, group: Group) {
        self.group = Some(group);
        self.loading = false;
        self.error = None;
    }

    pub fn apply_player_assigned(&mut self, player: Player) {
        if !self.players.iter().any(|p| p.id == player.id) {
            self.players.push(player.clone());
        }
        let group_id = self.group_id;
        for p in &mut self.all_players {
            if p.id == player.id {
                p.group = Some(group_id);
            }
        }
    }

    pub fn apply_player_deleted(&mut self, player_id: u64) {
        self.players.retain(|p| p.id != player_id);
        self.all_players.retain(|p| p.id != player_id);
    }
}
