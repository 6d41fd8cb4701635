use crate::OperationId;

/// All event types emitted by dexter's local operations core.
#[derive(Debug, Clone)]
pub enum DexterEvent {
    /// Runtime install/start/repair progress.
    Runtime {
        op_id: OperationId,
        action: RuntimeAction,
        stage: RuntimeStage,
    },
    /// Uninstall step progress.
    Uninstall {
        op_id: OperationId,
        stage: UninstallStage,
    },
    /// A privileged command was classified after failing.
    PrivilegedCommandFailed {
        op_id: OperationId,
        classification: String,
    },
    /// Permission policy scope changed.
    PermissionChanged {
        scope: String,
        mode: String,
    },
    /// Update lifecycle phase transition.
    UpdatePhase {
        from: UpdatePhase,
        to: UpdatePhase,
    },
    /// Manifest check against a provider.
    UpdateCheck { status: UpdateCheckStatus },
    /// Artifact download progress.
    UpdateDownloadProgress {
        op_id: OperationId,
        current: u64,
        total: u64,
    },
    /// Apply attempt stage.
    UpdateApply {
        op_id: OperationId,
        stage: ApplyStage,
    },
    /// Post-apply boot-health validation outcome.
    UpdateValidation { outcome: ValidationOutcome },
    /// Automatic rollback of a staged `.deb` apply.
    UpdateRollback { stage: RollbackStage },
    /// Audit record appended.
    Audit {
        level: LogLevel,
        code: String,
        family: String,
    },
    /// General log message.
    Log { level: LogLevel, message: String },
}

/// Which runtime orchestration action an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeAction {
    Install,
    Start,
    Repair,
}

/// Progress stages shared by install/start/repair.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeStage {
    /// Action is starting.
    Starting,
    /// Progress update with an optional percent parsed from helper output.
    Progress {
        percent: Option<f32>,
        message: Option<String>,
    },
    /// Action finished successfully.
    Done,
    /// Action failed.
    Error { message: String },
}

/// Uninstall orchestration stages.
#[derive(Debug, Clone, PartialEq)]
pub enum UninstallStage {
    /// Confirmation token was rejected.
    InvalidToken,
    /// A privileged teardown step is running.
    Running { step: String },
    /// A privileged teardown step finished.
    StepComplete { step: String },
    /// A cleanup path was rejected by the path-safety check.
    UnsafePath { path: String },
    /// Uninstall finished with a summary.
    Complete {
        performed: Vec<String>,
        warnings: Vec<String>,
    },
}

/// Update pipeline phases, mirroring the state machine's phase field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Checking,
    Available,
    Downloading,
    Staged,
    UpToDate,
    Error,
}

/// Result of a manifest check against a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCheckStatus {
    /// A newer compatible version is available.
    Available { current_version: String, new_version: String },
    /// Already up to date.
    UpToDate { version: String },
    /// Check failed or was blocked by a compatibility gate.
    Blocked { code: String, reason: String },
}

/// Apply-attempt stages.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyStage {
    /// Applier variant selected and relaunch/assisted-install started.
    Starting { mode: String },
    /// Applier finished handing off (process about to exit, or installer UI opened).
    HandedOff,
    /// Apply attempt failed before handoff.
    Failed { message: String },
}

/// Boot-health validation outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Host called back healthy within the stability window.
    Stable,
    /// Host never became healthy before the grace timer elapsed.
    BootFailed,
    /// Health probe timed out.
    HealthTimeout,
    /// No apply attempt was outstanding to validate.
    NotApplied,
    /// Running version didn't match the staged target version.
    UnexpectedVersion { expected: String, actual: String },
}

/// Automatic `.deb` rollback stages.
#[derive(Debug, Clone, PartialEq)]
pub enum RollbackStage {
    /// Rollback was scheduled because guard conditions held.
    Scheduled { artifact_path: String },
    /// Rollback install command is running.
    Running,
    /// Rollback completed.
    Complete,
    /// Rollback was skipped because a guard condition didn't hold.
    Skipped { reason: String },
}

/// Log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}
