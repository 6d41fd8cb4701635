//! Runs a full check cycle: asks a `ManifestProvider` for a candidate on
//! the configured channel, then drives the state machine's compatibility
//! gate over the result.

use dexter_config::update_policy::{Channel as PolicyChannel, UpdatePolicy};
use dexter_dl::{Channel as ManifestChannel, ManifestProvider};

use crate::compat::CompatibilityGate;
use crate::error::UpdateError;
use crate::state::UpdateStateMachine;

fn to_manifest_channel(channel: PolicyChannel) -> ManifestChannel {
    match channel {
        PolicyChannel::Stable => ManifestChannel::Stable,
        PolicyChannel::Rc => ManifestChannel::Rc,
    }
}

/// Runs one check cycle against `provider`, consulting the persisted
/// update policy for which channel to check and folding the outcome
/// through `machine`. No-ops (returns `Ok(())` without touching anything)
/// when a staged update is already pending apply.
pub async fn run_check(
    machine: &mut UpdateStateMachine,
    provider: &ManifestProvider,
    gate: &CompatibilityGate,
    current_version: &str,
) -> Result<(), UpdateError> {
    if !machine.begin_check()? {
        return Ok(());
    }

    let policy = UpdatePolicy::load()?;
    let channel = to_manifest_channel(policy.channel);

    let outcome = provider
        .check(channel)
        .map_err(|err| UpdateError::CheckFailed(err.to_string()));

    machine.finish_check(outcome, gate, current_version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_mapping_is_consistent() {
        assert!(matches!(to_manifest_channel(PolicyChannel::Stable), ManifestChannel::Stable));
        assert!(matches!(to_manifest_channel(PolicyChannel::Rc), ManifestChannel::Rc));
    }
}
