use std::{env, io::Read};

use clap::Parser;
use cli::{Args, Commands};
use error::Result;
use logging::setup_logging;
use utils::{PROGRESS, COLOR};

mod cli;
mod config_cmd;
mod error;
mod logging;
mod logs_cmd;
mod permissions_cmd;
mod progress;
mod runtime_cmd;
mod uninstall_cmd;
mod update_cmd;
mod utils;

async fn handle_cli() -> Result<()> {
    let mut args = env::args().collect::<Vec<_>>();

    let mut i = 0;
    while i < args.len() {
        if args[i] == "-" {
            let mut stdin = std::io::stdin();
            let mut buffer = String::new();
            if stdin.read_to_string(&mut buffer).is_ok() {
                let stdin_args = buffer.split_whitespace().collect::<Vec<&str>>();
                args.remove(i);
                args.splice(i..i, stdin_args.into_iter().map(String::from));
            } else {
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    let args = Args::parse_from(args);

    setup_logging(&args);

    if args.no_color {
        let mut color = COLOR.write().unwrap();
        *color = false;
    }

    if args.no_progress {
        let mut progress = PROGRESS.write().unwrap();
        *progress = false;
    }

    dexter_config::config::init()?;

    let json = args.json;

    match args.command {
        Commands::Config { action } => config_cmd::handle(action, json)?,
        Commands::Runtime { action } => runtime_cmd::handle(action, json).await?,
        Commands::Permissions { action } => permissions_cmd::handle(action, json)?,
        Commands::Update { action } => update_cmd::handle(action, json).await?,
        Commands::Logs { format, window } => logs_cmd::handle(format, window, json)?,
        command @ Commands::Uninstall { .. } => uninstall_cmd::handle(command, json).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli().await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
