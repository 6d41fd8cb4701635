pub mod apply_attempt;
pub mod applier;
pub mod checker;
pub mod compat;
pub mod downloader;
pub mod error;
pub mod post_apply;
pub mod state;

pub use apply_attempt::{ApplyMode, PackageType, UpdateApplyAttempt};
pub use applier::UpdateApplier;
pub use compat::CompatibilityGate;
pub use downloader::run_download;
pub use error::{Result, UpdateError};
pub use post_apply::{PostApplyConfig, PostApplyCoordinator};
pub use state::{Phase, UpdateState, UpdateStateMachine};

pub use dexter_config::update_policy::{Channel, UpdatePolicy};
