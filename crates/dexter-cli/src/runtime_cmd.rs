use dexter_config::permissions::{check_scope, PermissionScope};
use dexter_runtime::RuntimeOrchestrator;
use nu_ansi_term::Color::{Green, Red};

use crate::cli::RuntimeAction;
use crate::error::Result;
use crate::progress::create_event_sink;
use crate::utils::{print_result, Colored, Icons};

const RUNTIME_BINARY: &str = "ollama";

fn helper_path() -> Option<String> {
    std::env::var("DEXTER_HELPER_PATH").ok()
}

pub async fn handle(action: RuntimeAction, json: bool) -> Result<()> {
    let (events, guard) = create_event_sink();
    let orchestrator = RuntimeOrchestrator::new(events, helper_path(), RUNTIME_BINARY);

    match action {
        RuntimeAction::Status { endpoint } => {
            let status = orchestrator.status(&endpoint).await;
            print_result(json, &status, |status| {
                println!(
                    "endpoint:   {} ({})",
                    status.endpoint,
                    if status.reachable { "reachable" } else { "unreachable" }
                );
                println!(
                    "binary:     {}",
                    status
                        .binary_path
                        .clone()
                        .unwrap_or_else(|| "not found".to_string())
                );
                println!("models:     {}", status.installed_model_count);
                for note in &status.notes {
                    println!("{} {note}", Colored(Red, Icons::NOTE));
                }
            });
        }
        RuntimeAction::Install { yes } => {
            let decision = check_scope(PermissionScope::RuntimeInstall.as_str(), "runtime.install");
            let approved = yes || decision.allowed;
            if !approved && decision.requires_prompt {
                println!(
                    "{} installing ollama requires confirmation; re-run with --yes to proceed",
                    Colored(Red, Icons::WARNING)
                );
                return Ok(());
            }

            let outcome = orchestrator.install(approved).await;
            print_outcome(json, outcome.ok, &outcome.notes, &outcome.next_steps);
        }
        RuntimeAction::Start { endpoint, is_local } => {
            let outcome = orchestrator.start(&endpoint, is_local).await;
            print_outcome(json, outcome.ok, &outcome.notes, &outcome.next_steps);
        }
        RuntimeAction::Repair { endpoint, is_local } => {
            let outcome = orchestrator.repair(&endpoint, is_local).await;
            print_outcome(json, outcome.ok, &outcome.notes, &outcome.next_steps);
        }
    }

    if let Some(guard) = guard {
        guard.finish();
    }
    Ok(())
}

fn print_outcome(json: bool, ok: bool, notes: &[String], next_steps: &[String]) {
    if json {
        let value = serde_json::json!({ "ok": ok, "notes": notes, "nextSteps": next_steps });
        println!("{}", serde_json::to_string_pretty(&value).unwrap());
        return;
    }

    if ok {
        println!("{} succeeded", Colored(Green, Icons::CHECK));
    } else {
        println!("{} failed", Colored(Red, Icons::CROSS));
    }
    for note in notes {
        println!("  {note}");
    }
    for step in next_steps {
        println!("  {} {step}", Icons::ARROW);
    }
}
