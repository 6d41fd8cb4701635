use dexter_runtime::uninstall::{PackageMode, UninstallOrchestrator, UninstallRequest};
use nu_ansi_term::Color::{Green, Red};

use crate::cli::Commands;
use crate::error::{CliError, Result};
use crate::progress::create_event_sink;
use crate::utils::{print_result, Colored, Icons};

const APP_NAME: &str = "dexter";

fn parse_package_mode(value: &str) -> Result<PackageMode> {
    match value {
        "remove" => Ok(PackageMode::Remove),
        "purge" => Ok(PackageMode::Purge),
        other => Err(CliError::BadArgument(format!(
            "unknown package mode '{other}', expected remove or purge"
        ))),
    }
}

fn helper_path() -> Option<String> {
    std::env::var("DEXTER_HELPER_PATH").ok()
}

fn home_dir() -> Result<std::path::PathBuf> {
    std::env::var("HOME")
        .map(std::path::PathBuf::from)
        .map_err(|_| CliError::BadArgument("HOME is not set".to_string()))
}

pub async fn handle(command: Commands, json: bool) -> Result<()> {
    let Commands::Uninstall {
        package_mode,
        remove_user_data,
        remove_runtime_system,
        remove_runtime_user_data,
        token,
    } = command
    else {
        unreachable!("handle_uninstall called with a non-Uninstall command");
    };

    let package_mode = parse_package_mode(&package_mode)?;
    let home = home_dir()?;

    let (events, guard) = create_event_sink();
    let orchestrator = UninstallOrchestrator::new(events, helper_path(), APP_NAME, home);

    let request = UninstallRequest {
        package_mode,
        remove_user_data,
        remove_runtime_system,
        remove_runtime_user_data,
        confirmation_token: token,
    };

    let report = orchestrator.uninstall(request).await;

    print_result(json, &report, |report| {
        if report.error_code.is_some() {
            println!("{} uninstall was not performed", Colored(Red, Icons::CROSS));
        } else {
            println!("{} uninstall complete", Colored(Green, Icons::CHECK));
        }
        for step in &report.performed {
            println!("  {} {step}", Icons::CHECK);
        }
        for warning in &report.warnings {
            println!("  {} {warning}", Icons::WARNING);
        }
        for step in &report.next_steps {
            println!("  {} {step}", Icons::ARROW);
        }
    });

    if let Some(guard) = guard {
        guard.finish();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_mode_accepts_known_values() {
        assert!(matches!(parse_package_mode("remove"), Ok(PackageMode::Remove)));
        assert!(matches!(parse_package_mode("purge"), Ok(PackageMode::Purge)));
    }

    #[test]
    fn test_parse_package_mode_rejects_unknown_value() {
        assert!(parse_package_mode("nuke").is_err());
    }
}
