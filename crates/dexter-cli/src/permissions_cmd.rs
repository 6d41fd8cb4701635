use dexter_config::permissions::{check_scope, get_policy, set_scope, PermissionMode, PermissionScope};
use nu_ansi_term::Color::{Green, Red};

use crate::cli::PermissionsAction;
use crate::error::{CliError, Result};
use crate::utils::{print_result, Colored, Icons};

fn parse_mode(value: &str) -> Result<PermissionMode> {
    match value {
        "allow" => Ok(PermissionMode::Allow),
        "ask" => Ok(PermissionMode::Ask),
        "deny" => Ok(PermissionMode::Deny),
        other => Err(CliError::BadArgument(format!(
            "unknown permission mode '{other}', expected allow, ask, or deny"
        ))),
    }
}

pub fn handle(action: PermissionsAction, json: bool) -> Result<()> {
    match action {
        PermissionsAction::List => {
            let policy = get_policy();
            print_result(json, &policy, |policy| {
                for scope in PermissionScope::ALL {
                    println!("{:<24} {:?}", scope.as_str(), policy.mode(scope));
                }
            });
        }
        PermissionsAction::Set { scope, mode } => {
            let scope = PermissionScope::parse(&scope).map_err(|_| {
                CliError::BadArgument(format!("unknown permission scope '{scope}'"))
            })?;
            let mode = parse_mode(&mode)?;
            set_scope(scope, mode)?;
            println!(
                "{} {} set to {:?}",
                Colored(Green, Icons::CHECK),
                scope.as_str(),
                mode
            );
        }
        PermissionsAction::Check { scope, action } => {
            let decision = check_scope(&scope, &action);
            print_result(json, &decision, |decision| {
                let icon = if decision.allowed { Icons::CHECK } else { Icons::CROSS };
                let color = if decision.allowed { Green } else { Red };
                println!("{} {}", Colored(color, icon), decision.message);
                if decision.requires_prompt {
                    println!("  requires confirmation before proceeding");
                }
            });
        }
    }
    Ok(())
}
