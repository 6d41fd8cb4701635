pub mod orchestrator;
pub mod progress;
pub mod status;
pub mod uninstall;

pub use orchestrator::{RuntimeActionOutcome, RuntimeOrchestrator};
pub use status::RuntimeStatus;
pub use uninstall::{
    is_safe_cleanup_path, PackageMode, UninstallOrchestrator, UninstallReport, UninstallRequest,
    UNINSTALL_CONFIRMATION_TOKEN,
};
