use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::attendance::{AttendanceBus, AttendanceChannel};
use crate::roster_fetch::{group_pdf_name, player_pdf_name, upload_name};
use crate::state::{Delta, ProviderCommand};

/// Runs every network call off the UI thread. Commands are served in the
/// order they arrive; results go back as deltas tagged with the key they were
/// requested for, so the UI can drop the ones it no longer cares about.
pub fn spawn_provider(
    client: ApiClient,
    bus: AttendanceBus,
    download_dir: PathBuf,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) {
    thread::spawn(move || {
        info!("provider started");
        for cmd in cmd_rx {
            if !handle_command(&client, &bus, &download_dir, cmd, &tx) {
                break;
            }
        }
        info!("provider stopped");
    });
}

/// Executes one command. Returns `false` once the UI side has hung up.
pub fn handle_command(
    client: &ApiClient,
    bus: &AttendanceBus,
    download_dir: &Path,
    cmd: ProviderCommand,
    tx: &Sender<Delta>,
) -> bool {
    let deltas = match cmd {
        ProviderCommand::FetchMe => match client.fetch_me() {
            Ok(me) => vec![Delta::SetMe(me)],
            // Not signed in: staff-only actions simply stay hidden.
            Err(err) => vec![Delta::Log(format!("[INFO] Signed-in user unknown: {err}"))],
        },
        ProviderCommand::FetchGroup { group_id } => fetch_group(client, group_id),
        ProviderCommand::RenameGroup { group_id, name } => vec![Delta::GroupRenamed {
            group_id,
            result: client.rename_group(group_id, &name),
        }],
        ProviderCommand::AssignPlayer {
            group_id,
            player_id,
        } => vec![Delta::PlayerAssigned {
            group_id,
            result: client.assign_player_group(player_id, group_id),
        }],
        ProviderCommand::DeletePlayer {
            group_id,
            player_id,
        } => vec![Delta::PlayerDeleted {
            group_id,
            player_id,
            result: client.delete_player(player_id),
        }],
        ProviderCommand::ResetEvaluations { group_id } => vec![Delta::EvaluationsReset {
            group_id,
            result: client.reset_group_evaluations(group_id),
        }],
        ProviderCommand::DownloadGroupPdf { group_id } => {
            let path = download_dir.join(group_pdf_name(group_id));
            let result = client.download_group_pdf(group_id);
            vec![save_download("Group PDF", result, path)]
        }
        ProviderCommand::FetchPlayer { tab_id, key } => {
            let player = client.fetch_player(key);
            if let Ok(p) = player.as_ref()
                && let Some(days) = p.attendance_days
            {
                // Other tabs on this player and month pick the fresh count up.
                bus.publish(key.player_id, key.month, days);
            }
            let evaluation = client.fetch_evaluation(key);
            vec![
                Delta::SetPlayer {
                    tab_id,
                    key,
                    result: player,
                },
                Delta::SetEvaluation {
                    key,
                    result: evaluation,
                },
            ]
        }
        ProviderCommand::SaveEvaluation { key, request } => {
            info!(player_id = key.player_id, month = %key.month, action = request.describe(), "saving evaluation");
            vec![Delta::EvaluationSaved {
                key,
                result: client.submit_evaluation(&request),
            }]
        }
        ProviderCommand::UploadPhoto { player_id, path } => {
            let result = read_upload(&path)
                .map_err(|err| ApiError::Validation(format!("{err:#}")))
                .and_then(|bytes| client.upload_player_photo(player_id, &upload_name(&path), bytes));
            vec![Delta::PhotoUploaded { player_id, result }]
        }
        ProviderCommand::DownloadPlayerPdf { key } => {
            let path = download_dir.join(player_pdf_name(key.player_id));
            let result = client.download_player_pdf(key.player_id, key.month);
            vec![save_download("Player PDF", result, path)]
        }
    };
    deltas.into_iter().all(|delta| tx.send(delta).is_ok())
}

fn fetch_group(client: &ApiClient, group_id: u64) -> Vec<Delta> {
    let group = client.fetch_group(group_id);
    if group.is_err() {
        return vec![Delta::SetGroup {
            group_id,
            result: group,
        }];
    }
    let players = client.fetch_group_players(group_id);
    let all_players = client.fetch_all_players();
    match (players, all_players) {
        (Ok(players), Ok(all_players)) => vec![
            Delta::SetGroup {
                group_id,
                result: group,
            },
            Delta::SetGroupPlayers {
                group_id,
                players,
                all_players,
            },
        ],
        (Err(err), _) | (_, Err(err)) => vec![Delta::SetGroup {
            group_id,
            result: Err(err),
        }],
    }
}

fn read_upload(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed reading {}", path.display()))
}

fn save_download(label: &str, result: Result<Vec<u8>, ApiError>, path: PathBuf) -> Delta {
    let result = match result {
        Ok(bytes) => write_file(&path, &bytes)
            .map(|_| path)
            .map_err(|err| format!("{err:#}")),
        Err(err) => {
            warn!(label, error = ?err, "download failed");
            Err(err.to_string())
        }
    };
    Delta::Downloaded {
        label: label.to_string(),
        result,
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}
