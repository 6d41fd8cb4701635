use chrono::Utc;
use dexter_audit::{AuditLog, ExportAggregator};
use nu_ansi_term::Color::Green;

use crate::error::Result;
use crate::utils::{print_result, Colored, Icons};

fn parse_format(value: &str) -> Result<dexter_audit::ExportFormat> {
    match value {
        "json" => Ok(dexter_audit::ExportFormat::Json),
        "csv" => Ok(dexter_audit::ExportFormat::Csv),
        other => Err(crate::error::CliError::BadArgument(format!(
            "unknown format '{other}', expected json or csv"
        ))),
    }
}

fn parse_window(value: &str) -> Result<dexter_audit::ExportWindow> {
    match value {
        "last-24h" => Ok(dexter_audit::ExportWindow::Last24h),
        "last-7d" => Ok(dexter_audit::ExportWindow::Last7d),
        "last-30d" => Ok(dexter_audit::ExportWindow::Last30d),
        other => Err(crate::error::CliError::BadArgument(format!(
            "unknown window '{other}', expected last-24h, last-7d, or last-30d"
        ))),
    }
}

pub fn handle(format: String, window: String, json: bool) -> Result<()> {
    let format = parse_format(&format)?;
    let window = parse_window(&window)?;

    let log = AuditLog::new();
    let aggregator = ExportAggregator::new(&log);
    let export = aggregator.export_logs(format, window, Utc::now())?;

    print_result(json, &export, |export| {
        println!(
            "{} {} ({} bytes, sha256 {})",
            Colored(Green, Icons::CHECK),
            export.file_name,
            export.content_bytes,
            export.sha256
        );
    });
    Ok(())
}
