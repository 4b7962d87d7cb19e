use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use crate::api::ApiError;
use crate::attendance::{AttendanceChannel, AttendanceUpdate};
use crate::evaluation::{Evaluation, SaveRequest};
use crate::evaluation_view::ViewKey;
use crate::player_view::PlayerView;
use crate::roster::{Group, GroupView, Me, Player, ResetOutcome};
use crate::skills::Skill;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Group,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPurpose {
    RenameGroup,
    CreateNotes,
    PhotoPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub purpose: InputPurpose,
    pub buffer: String,
}

impl TextInput {
    pub fn new(purpose: InputPurpose, seed: impl Into<String>) -> Self {
        Self {
            purpose,
            buffer: seed.into(),
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self.purpose {
            InputPurpose::RenameGroup => "Group name",
            InputPurpose::CreateNotes => "Notes (optional)",
            InputPurpose::PhotoPath => "Photo file",
        }
    }
}

pub struct AppState {
    pub screen: Screen,
    pub group: Option<GroupView>,
    pub group_selected: usize,
    pub picker: Option<usize>,
    pub tabs: Vec<PlayerView>,
    pub active_tab: usize,
    next_tab_id: u64,
    pub skill_cursor: usize,
    pub me: Option<Me>,
    pub input: Option<TextInput>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Group,
            group: None,
            group_selected: 0,
            picker: None,
            tabs: Vec::new(),
            active_tab: 0,
            next_tab_id: 1,
            skill_cursor: 0,
            me: None,
            input: None,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push_back(line.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn is_staff(&self) -> bool {
        self.me.as_ref().is_some_and(|m| m.is_staff)
    }

    pub fn active_player(&self) -> Option<&PlayerView> {
        self.tabs.get(self.active_tab)
    }

    pub fn active_player_mut(&mut self) -> Option<&mut PlayerView> {
        self.tabs.get_mut(self.active_tab)
    }

    pub fn selected_group_player(&self) -> Option<&Player> {
        self.group.as_ref()?.players.get(self.group_selected)
    }

    pub fn selected_skill(&self) -> Skill {
        Skill::ALL[self.skill_cursor.min(Skill::ALL.len() - 1)]
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Group => {
                if let Some(picker) = self.picker.as_mut() {
                    let len = self.group.as_ref().map_or(0, |g| g.candidates().len());
                    if *picker + 1 < len {
                        *picker += 1;
                    }
                    return;
                }
                let len = self.group.as_ref().map_or(0, |g| g.players.len());
                if self.group_selected + 1 < len {
                    self.group_selected += 1;
                }
            }
            Screen::Player => {
                if self.skill_cursor + 1 < Skill::ALL.len() {
                    self.skill_cursor += 1;
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Group => {
                if let Some(picker) = self.picker.as_mut() {
                    *picker = picker.saturating_sub(1);
                    return;
                }
                self.group_selected = self.group_selected.saturating_sub(1);
            }
            Screen::Player => self.skill_cursor = self.skill_cursor.saturating_sub(1),
        }
    }

    /// Index of an open tab showing `player_id`, if any.
    pub fn tab_for(&self, player_id: u64) -> Option<usize> {
        self.tabs.iter().position(|t| t.key().player_id == player_id)
    }

    /// Opens a new tab on `key` and subscribes it to attendance changes.
    /// Several tabs may show the same player and month.
    pub fn open_player_tab<C: AttendanceChannel + ?Sized>(
        &mut self,
        key: ViewKey,
        channel: &C,
        tx: &Sender<Delta>,
    ) -> u64 {
        let tab_id = self.next_tab_id;
        self.next_tab_id += 1;
        let mut view = PlayerView::new(key).with_tab_id(tab_id);
        watch_tab(&mut view, channel, tx);
        self.tabs.push(view);
        self.active_tab = self.tabs.len() - 1;
        self.skill_cursor = 0;
        self.screen = Screen::Player;
        tab_id
    }

    /// Brings an existing tab for `player_id` to the front.
    pub fn focus_player(&mut self, player_id: u64) -> bool {
        match self.tab_for(player_id) {
            Some(idx) => {
                self.active_tab = idx;
                self.screen = Screen::Player;
                true
            }
            None => false,
        }
    }

    /// Removes the active tab; its attendance subscription goes with it.
    pub fn close_active_tab(&mut self) -> Option<PlayerView> {
        if self.active_tab >= self.tabs.len() {
            return None;
        }
        let closed = self.tabs.remove(self.active_tab);
        if self.active_tab >= self.tabs.len() {
            self.active_tab = self.tabs.len().saturating_sub(1);
        }
        if self.tabs.is_empty() {
            self.screen = Screen::Group;
        }
        Some(closed)
    }

    pub fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active_tab = (self.active_tab + 1) % self.tabs.len();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetMe(Me),
    SetGroup {
        group_id: u64,
        result: Result<Group, ApiError>,
    },
    SetGroupPlayers {
        group_id: u64,
        players: Vec<Player>,
        all_players: Vec<Player>,
    },
    GroupRenamed {
        group_id: u64,
        result: Result<Group, ApiError>,
    },
    PlayerAssigned {
        group_id: u64,
        result: Result<Player, ApiError>,
    },
    PlayerDeleted {
        group_id: u64,
        player_id: u64,
        result: Result<(), ApiError>,
    },
    EvaluationsReset {
        group_id: u64,
        result: Result<ResetOutcome, ApiError>,
    },
    SetPlayer {
        tab_id: u64,
        key: ViewKey,
        result: Result<Player, ApiError>,
    },
    SetEvaluation {
        key: ViewKey,
        result: Result<Option<Evaluation>, ApiError>,
    },
    EvaluationSaved {
        key: ViewKey,
        result: Result<Evaluation, ApiError>,
    },
    PhotoUploaded {
        player_id: u64,
        result: Result<Player, ApiError>,
    },
    AttendanceChanged {
        tab_id: u64,
        update: AttendanceUpdate,
    },
    Downloaded {
        label: String,
        result: Result<PathBuf, String>,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchMe,
    FetchGroup { group_id: u64 },
    RenameGroup { group_id: u64, name: String },
    AssignPlayer { group_id: u64, player_id: u64 },
    DeletePlayer { group_id: u64, player_id: u64 },
    ResetEvaluations { group_id: u64 },
    DownloadGroupPdf { group_id: u64 },
    FetchPlayer { tab_id: u64, key: ViewKey },
    SaveEvaluation { key: ViewKey, request: SaveRequest },
    UploadPhoto { player_id: u64, path: PathBuf },
    DownloadPlayerPdf { key: ViewKey },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetMe(me) => state.me = Some(me),
        Delta::SetGroup { group_id, result } => {
            let Some(view) = current_group(state, group_id) else {
                return;
            };
            match result {
                Ok(group) => view.apply_group(group),
                Err(err) => {
                    view.loading = false;
                    view.error = Some(err.to_string());
                    let line = format!("[WARN] Group {group_id}: {err}");
                    state.push_log(line);
                }
            }
        }
        Delta::SetGroupPlayers {
            group_id,
            players,
            all_players,
        } => {
            let Some(view) = current_group(state, group_id) else {
                return;
            };
            view.players = players;
            view.all_players = all_players;
            let len = view.players.len();
            state.group_selected = state.group_selected.min(len.saturating_sub(1));
        }
        Delta::GroupRenamed { group_id, result } => {
            let Some(view) = current_group(state, group_id) else {
                return;
            };
            match result {
                Ok(group) => {
                    let name = group.name.clone();
                    view.apply_group(group);
                    state.push_log(format!("[INFO] Group renamed to {name}"));
                }
                Err(err) => state.push_log(format!("[WARN] Rename failed: {err}")),
            }
        }
        Delta::PlayerAssigned { group_id, result } => {
            let Some(view) = current_group(state, group_id) else {
                return;
            };
            match result {
                Ok(player) => {
                    let name = player.name.clone();
                    view.apply_player_assigned(player);
                    state.picker = None;
                    state.push_log(format!("[INFO] {name} added to group"));
                }
                Err(err) => state.push_log(format!("[WARN] Add player failed: {err}")),
            }
        }
        Delta::PlayerDeleted {
            group_id,
            player_id,
            result,
        } => {
            let Some(view) = current_group(state, group_id) else {
                return;
            };
            match result {
                Ok(()) => {
                    view.apply_player_deleted(player_id);
                    let len = view.players.len();
                    state.group_selected = state.group_selected.min(len.saturating_sub(1));
                    state.push_log(format!("[INFO] Player {player_id} deleted"));
                }
                Err(err) => state.push_log(format!("[WARN] Delete failed: {err}")),
            }
        }
        Delta::EvaluationsReset { group_id, result } => match result {
            Ok(outcome) => state.push_log(format!("[INFO] {}", outcome.message())),
            Err(err) => state.push_log(format!("[WARN] Reset for group {group_id} failed: {err}")),
        },
        Delta::SetPlayer {
            tab_id,
            key,
            result,
        } => {
            // Other tabs on the same key hear about attendance through the bus.
            let Some(tab) = state.tabs.iter_mut().find(|t| t.tab_id() == tab_id) else {
                return;
            };
            let failed = result.as_ref().err().map(ToString::to_string);
            if tab.apply_player(key, result) && let Some(err) = failed {
                state.push_log(format!("[WARN] Player {}: {err}", key.player_id));
            }
        }
        Delta::SetEvaluation { key, result } => {
            for tab in &mut state.tabs {
                tab.evaluation.apply_fetch(key, result.clone());
            }
        }
        Delta::EvaluationSaved { key, result } => {
            let message = match &result {
                Ok(_) => "[INFO] Evaluation saved".to_string(),
                Err(err) => format!("[WARN] Save failed: {err}"),
            };
            // Only the tab that issued the save is still waiting on it.
            let waiting = state
                .tabs
                .iter_mut()
                .find(|t| t.key() == key && t.evaluation.is_saving());
            match waiting {
                Some(tab) => {
                    tab.evaluation.finish_save(key, result.clone());
                }
                None => return,
            }
            if let Ok(saved) = result {
                // Other tabs on the same key only refresh their confirmed copy.
                for tab in state.tabs.iter_mut().filter(|t| t.key() == key) {
                    if !tab.evaluation.is_saving() && !tab.evaluation.mode().is_editing() {
                        tab.evaluation.apply_fetch(key, Ok(Some(saved.clone())));
                    }
                }
            }
            state.push_log(message);
        }
        Delta::PhotoUploaded { player_id, result } => {
            for tab in &mut state.tabs {
                tab.apply_photo(player_id, &result);
            }
            match result {
                Ok(_) => state.push_log(format!("[INFO] Photo updated for player {player_id}")),
                Err(err) => state.push_log(format!("[WARN] Photo upload failed: {err}")),
            }
        }
        Delta::AttendanceChanged { tab_id, update } => {
            if let Some(tab) = state.tabs.iter_mut().find(|t| t.tab_id() == tab_id) {
                tab.apply_attendance(&update);
            }
        }
        Delta::Downloaded { label, result } => match result {
            Ok(path) => state.push_log(format!("[INFO] {label} saved to {}", path.display())),
            Err(err) => state.push_log(format!("[WARN] {label} download failed: {err}")),
        },
        Delta::Log(line) => state.push_log(line),
    }
}

/// Subscribes `view` for its current key; matching updates come back as
/// `Delta::AttendanceChanged` addressed to that tab.
pub fn watch_tab<C: AttendanceChannel + ?Sized>(
    view: &mut PlayerView,
    channel: &C,
    tx: &Sender<Delta>,
) {
    let tx = tx.clone();
    let tab_id = view.tab_id();
    view.watch_attendance(channel, move |update| {
        let _ = tx.send(Delta::AttendanceChanged { tab_id, update });
    });
}

fn current_group(state: &mut AppState, group_id: u64) -> Option<&mut GroupView> {
    state.group.as_mut().filter(|g| g.group_id == group_id)
}
