use chrono::Utc;
use dexter_audit::{AuditLog, ExportAggregator, ExportFormat, ExportWindow};
use dexter_config::update_policy::{Channel, UpdatePolicy};
use dexter_dl::manifest::PackageType;
use dexter_dl::{ManifestProvider, ManifestProviderConfig};
use dexter_update::{checker, run_download, CompatibilityGate, UpdateApplier, UpdateStateMachine};
use nu_ansi_term::Color::{Green, Red};

use crate::cli::{AuditAction, PolicyAction, UpdateAction};
use crate::error::{CliError, Result};
use crate::progress::create_event_sink;
use crate::utils::{print_result, Colored, Icons};

/// Current user-data schema version this build can bridge without a
/// registered migration.
const USER_DATA_SCHEMA_VERSION: u32 = 1;
const GITHUB_PROJECT: &str = "dexter-app/dexter";

fn provider() -> ManifestProvider {
    ManifestProvider::new(ManifestProviderConfig {
        project: GITHUB_PROJECT.to_string(),
        manifest_asset_name: "manifest.json".to_string(),
        signature_asset_name: Some("manifest.json.sig".to_string()),
        public_key_pem: std::env::var("DEXTER_UPDATE_PUBLIC_KEY").ok(),
        package_type_preference: vec![PackageType::Appimage, PackageType::Deb],
        platform: "linux".to_string(),
        arch: std::env::consts::ARCH.to_string(),
    })
}

fn parse_channel(value: &str) -> Result<Channel> {
    match value {
        "stable" => Ok(Channel::Stable),
        "rc" => Ok(Channel::Rc),
        other => Err(CliError::BadArgument(format!(
            "unknown channel '{other}', expected stable or rc"
        ))),
    }
}

fn parse_format(value: &str) -> Result<ExportFormat> {
    match value {
        "json" => Ok(ExportFormat::Json),
        "csv" => Ok(ExportFormat::Csv),
        other => Err(CliError::BadArgument(format!(
            "unknown format '{other}', expected json or csv"
        ))),
    }
}

fn parse_window(value: &str) -> Result<ExportWindow> {
    match value {
        "last-24h" => Ok(ExportWindow::Last24h),
        "last-7d" => Ok(ExportWindow::Last7d),
        "last-30d" => Ok(ExportWindow::Last30d),
        other => Err(CliError::BadArgument(format!(
            "unknown window '{other}', expected last-24h, last-7d, or last-30d"
        ))),
    }
}

pub async fn handle(action: UpdateAction, json: bool) -> Result<()> {
    match action {
        UpdateAction::State => {
            let (events, _guard) = create_event_sink();
            let machine = UpdateStateMachine::new(GITHUB_PROJECT, events)?;
            print_result(json, machine.state(), |state| {
                println!("phase:    {:?}", state.phase);
                println!("provider: {}", state.provider);
                if let Some(version) = &state.staged_version {
                    println!("staged:   {version}");
                }
                if let Some(err) = &state.last_error {
                    println!("{} {err}", Colored(Red, Icons::WARNING));
                }
            });
        }
        UpdateAction::Policy { action } => match action {
            PolicyAction::Get => {
                let policy = UpdatePolicy::load()?;
                print_result(json, &policy, |policy| {
                    println!("channel:    {:?}", policy.channel);
                    println!("auto_check: {}", policy.auto_check);
                });
            }
            PolicyAction::Set { channel, auto_check } => {
                let mut policy = UpdatePolicy::load()?;
                if let Some(channel) = channel {
                    policy.channel = parse_channel(&channel)?;
                }
                if let Some(auto_check) = auto_check {
                    policy.auto_check = auto_check;
                }
                policy.save(Utc::now())?;
                println!("{} update policy saved", Colored(Green, Icons::CHECK));
            }
        },
        UpdateAction::Check => {
            let (events, guard) = create_event_sink();
            let mut machine = UpdateStateMachine::new(GITHUB_PROJECT, events)?;
            let gate = CompatibilityGate::new(USER_DATA_SCHEMA_VERSION);
            let current_version = env!("CARGO_PKG_VERSION");
            checker::run_check(&mut machine, &provider(), &gate, current_version).await?;
            print_result(json, machine.state(), |state| {
                println!("phase: {:?}", state.phase);
            });
            if let Some(guard) = guard {
                guard.finish();
            }
        }
        UpdateAction::Download => {
            let (events, guard) = create_event_sink();
            let mut machine = UpdateStateMachine::new(GITHUB_PROJECT, events)?;
            let downloads_dir = dexter_config::paths::update_downloads_dir();
            let artifact_path = run_download(&mut machine, &downloads_dir)?;
            print_result(json, &artifact_path, |path| {
                println!("{} staged {}", Colored(Green, Icons::CHECK), path.display());
            });
            if let Some(guard) = guard {
                guard.finish();
            }
        }
        UpdateAction::RestartApply => {
            let (events, _guard) = create_event_sink();
            let machine = UpdateStateMachine::new(GITHUB_PROJECT, events.clone())?;
            let state = machine.state();
            let artifact_path = state
                .staged_artifact_path
                .clone()
                .ok_or(dexter_update::UpdateError::NoStagedUpdate)?;
            let target_version = state
                .staged_version
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            let previous_version = env!("CARGO_PKG_VERSION").to_string();

            let applier = UpdateApplier::new(events);
            applier
                .apply(&artifact_path, &target_version, &previous_version, true)
                .await?;
            println!(
                "{} handed off to {target_version}, exiting",
                Colored(Green, Icons::CHECK)
            );
            std::process::exit(0);
        }
        UpdateAction::Audit { action } => handle_audit(action, json)?,
    }
    Ok(())
}

fn handle_audit(action: AuditAction, json: bool) -> Result<()> {
    let log = AuditLog::new();
    let aggregator = ExportAggregator::new(&log);

    match action {
        AuditAction::Export { format, window } => {
            let format = parse_format(&format)?;
            let window = parse_window(&window)?;
            let export = aggregator.export_update_audit_trail(format, window, Utc::now())?;
            print_result(json, &export, |export| {
                println!(
                    "{} {} ({} bytes, sha256 {})",
                    Colored(Green, Icons::CHECK),
                    export.file_name,
                    export.content_bytes,
                    export.sha256
                );
            });
        }
        AuditAction::Count { window } => {
            let window = parse_window(&window)?;
            let (date_from, date_to) = window.resolve(Utc::now());
            let query = dexter_audit::AuditQuery {
                date_from,
                date_to,
                family: Some("update".to_string()),
                severity: None,
                code_only: false,
            };
            let count = log.count(&query)?;
            print_result(json, &count, |count| {
                println!("count:             {}", count.count);
                println!("estimated (json):  {} bytes", count.estimated_bytes_json);
                println!("estimated (csv):   {} bytes", count.estimated_bytes_csv);
            });
        }
    }
    Ok(())
}
