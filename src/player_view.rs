use std::sync::Arc;

use tracing::debug;

use crate::api::ApiError;
use crate::attendance::{AttendanceChannel, AttendanceUpdate, Subscription, format_attendance};
use crate::evaluation_view::{EvaluationView, ViewKey};
use crate::month::Month;
use crate::roster::Player;

/// One open player screen: profile, monthly attendance and evaluation.
#[derive(Debug)]
pub struct PlayerView {
    tab_id: u64,
    key: ViewKey,
    pub player: Option<Player>,
    pub loading: bool,
    pub error: Option<String>,
    pub photo_uploading: bool,
    pub evaluation: EvaluationView,
    attendance_sub: Option<Subscription>,
}

impl PlayerView {
    pub fn new(key: ViewKey) -> Self {
        Self {
            tab_id: 0,
            key,
            player: None,
            loading: true,
            error: None,
            photo_uploading: false,
            evaluation: EvaluationView::new(key),
            attendance_sub: None,
        }
    }

    /// Same-key views are told apart by this id. `AppState` assigns it.
    pub fn with_tab_id(mut self, tab_id: u64) -> Self {
        self.tab_id = tab_id;
        self
    }

    pub fn tab_id(&self) -> u64 {
        self.tab_id
    }

    pub fn key(&self) -> ViewKey {
        self.key
    }

    /// Switches the displayed month. The attendance subscription is released;
    /// call `watch_attendance` again for the new month.
    pub fn set_month(&mut self, month: Month) -> bool {
        let key = ViewKey::new(self.key.player_id, month);
        if key == self.key {
            return false;
        }
        self.key = key;
        self.loading = true;
        self.error = None;
        self.evaluation.set_key(key);
        self.attendance_sub = None;
        true
    }

    /// Subscribes to attendance changes for this view's current key; only
    /// matching updates reach `sink`. Replaces any earlier subscription.
    pub fn watch_attendance<C, F>(&mut self, channel: &C, sink: F)
    where
        C: AttendanceChannel + ?Sized,
        F: Fn(AttendanceUpdate) + Send + Sync + 'static,
    {
        let key = self.key;
        self.attendance_sub = Some(channel.subscribe(Arc::new(move |update: &AttendanceUpdate| {
            if update.matches(&key) {
                sink(*update);
            }
        })));
    }

    pub fn is_watching(&self) -> bool {
        self.attendance_sub.as_ref().is_some_and(Subscription::is_active)
    }

    pub fn stop_watching(&mut self) {
        if let Some(sub) = self.attendance_sub.take() {
            sub.unsubscribe();
        }
    }

    pub fn apply_player(&mut self, key: ViewKey, result: Result<Player, ApiError>) -> bool {
        if key != self.key {
            debug!(?key, current = ?self.key, "dropping stale player fetch");
            return false;
        }
        self.loading = false;
        match result {
            Ok(player) => {
                self.player = Some(player);
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
        true
    }

    /// Photo uploads apply to every view of the player. The response carries
    /// no month, so the displayed attendance count is kept.
    pub fn apply_photo(&mut self, player_id: u64, result: &Result<Player, ApiError>) -> bool {
        if player_id != self.key.player_id {
            return false;
        }
        self.photo_uploading = false;
        if let Ok(updated) = result {
            let days = self.player.as_ref().and_then(|p| p.attendance_days);
            let mut updated = updated.clone();
            updated.attendance_days = days;
            self.player = Some(updated);
        }
        true
    }

    pub fn apply_attendance(&mut self, update: &AttendanceUpdate) -> bool {
        if !update.matches(&self.key) {
            return false;
        }
        match self.player.as_mut() {
            Some(player) => {
                player.attendance_days = Some(update.days);
                true
            }
            None => false,
        }
    }

    pub fn attendance_summary(&self) -> String {
        format_attendance(self.player.as_ref().and_then(|p| p.attendance_days))
    }

    pub fn title(&self) -> String {
        match self.player.as_ref() {
            Some(player) => format!("{} · {}", player.name, self.key.month),
            None => format!("Player {} · {}", self.key.player_id, self.key.month),
        }
    }
}
