use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;

use dexter_dl::types::Progress;
use dexter_events::{
    ApplyStage, ChannelSink, DexterEvent, EventSinkHandle, NullSink, RuntimeStage, UninstallStage,
    UpdateCheckStatus,
};
use indicatif::{HumanBytes, ProgressBar, ProgressState, ProgressStyle};

use crate::utils::progress_enabled;

const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

pub fn create_progress_bar() -> ProgressBar {
    let progress_bar = ProgressBar::new(0);
    if !progress_enabled() {
        progress_bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        return progress_bar;
    }
    progress_bar.set_style(get_progress_style());
    progress_bar
}

fn get_progress_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.cyan} {prefix} [{wide_bar:.green/dim}] {bytes_per_sec:>12} {computed_bytes:>22} ETA: {eta}",
    )
    .unwrap()
    .with_key("computed_bytes", format_bytes)
    .tick_chars(SPINNER_CHARS)
    .progress_chars("━━─")
}

pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();

    if !progress_enabled() {
        spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        return spinner;
    }

    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_chars(SPINNER_CHARS),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

fn format_bytes(state: &ProgressState, w: &mut dyn std::fmt::Write) {
    write!(
        w,
        "{}/{}",
        HumanBytes(state.pos()),
        HumanBytes(state.len().unwrap_or(state.pos()))
    )
    .unwrap();
}

/// Drives a progress bar from the three-variant download progress reported
/// by `dexter_dl`'s HTTP client.
pub fn handle_progress(state: Progress, progress_bar: &ProgressBar) {
    match state {
        Progress::Starting { total } => progress_bar.set_length(total),
        Progress::Chunk { current, .. } => progress_bar.set_position(current),
        Progress::Complete { .. } => progress_bar.finish(),
    }
}

/// Joins the background thread spawned by `spawn_event_handler`, ensuring
/// any buffered events are drained and printed before the process exits.
pub struct ProgressGuard {
    handle: Option<JoinHandle<()>>,
}

impl ProgressGuard {
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Renders one event as a single human-readable status line. JSON-mode
/// callers never use this: they consume command results directly instead
/// of the progress stream.
fn render_event(event: &DexterEvent) -> Option<String> {
    match event {
        DexterEvent::Runtime { action, stage, .. } => match stage {
            RuntimeStage::Starting => Some(format!("{action:?}: starting")),
            RuntimeStage::Progress { percent, message } => Some(format!(
                "{action:?}: {}{}",
                percent.map(|p| format!("{p:.0}% ")).unwrap_or_default(),
                message.clone().unwrap_or_default()
            )),
            RuntimeStage::Done => Some(format!("{action:?}: done")),
            RuntimeStage::Error { message } => Some(format!("{action:?}: error: {message}")),
        },
        DexterEvent::Uninstall { stage, .. } => match stage {
            UninstallStage::InvalidToken => Some("uninstall: confirmation token rejected".to_string()),
            UninstallStage::Running { step } => Some(format!("uninstall: running {step}")),
            UninstallStage::StepComplete { step } => Some(format!("uninstall: completed {step}")),
            UninstallStage::UnsafePath { path } => {
                Some(format!("uninstall: skipped unsafe path {path}"))
            }
            UninstallStage::Complete { performed, warnings } => Some(format!(
                "uninstall: complete ({} performed, {} warnings)",
                performed.len(),
                warnings.len()
            )),
        },
        DexterEvent::UpdateCheck { status } => match status {
            UpdateCheckStatus::Available { current_version, new_version } => Some(format!(
                "update check: {new_version} available (current {current_version})"
            )),
            UpdateCheckStatus::UpToDate { version } => {
                Some(format!("update check: up to date at {version}"))
            }
            UpdateCheckStatus::Blocked { code, reason } => {
                Some(format!("update check: blocked [{code}] {reason}"))
            }
        },
        DexterEvent::UpdateApply { stage, .. } => match stage {
            ApplyStage::Starting { mode } => Some(format!("update apply: starting ({mode})")),
            ApplyStage::HandedOff => Some("update apply: handed off".to_string()),
            ApplyStage::Failed { message } => Some(format!("update apply: failed: {message}")),
        },
        DexterEvent::PrivilegedCommandFailed { classification, .. } => {
            Some(format!("privileged command failed: {classification}"))
        }
        DexterEvent::Log { message, .. } => Some(message.clone()),
        _ => None,
    }
}

/// Spawns a background thread that prints a status line per event as it
/// arrives, so long-running operations (install, download, uninstall)
/// surface progress instead of going silent until the final result prints.
pub fn spawn_event_handler(receiver: Receiver<DexterEvent>) -> ProgressGuard {
    let handle = std::thread::spawn(move || {
        let spinner = create_spinner("working...");
        for event in receiver {
            if let Some(line) = render_event(&event) {
                spinner.set_message(line);
            }
        }
        spinner.finish_and_clear();
    });
    ProgressGuard { handle: Some(handle) }
}

/// Builds the event sink a command should emit through: a channel-backed
/// sink with a draining background thread when progress is enabled, a
/// no-op sink otherwise.
pub fn create_event_sink() -> (EventSinkHandle, Option<ProgressGuard>) {
    if progress_enabled() {
        let (sink, receiver) = ChannelSink::new();
        let events: EventSinkHandle = Arc::new(sink);
        let guard = spawn_event_handler(receiver);
        (events, Some(guard))
    } else {
        (Arc::new(NullSink), None)
    }
}
