use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active model/endpoint/personality configuration
    Get,
    /// Set the active model
    #[command(arg_required_else_help = true)]
    SetModel {
        /// Model name to use for chat
        #[arg(required = true)]
        model: String,
    },
}

#[derive(Subcommand)]
pub enum RuntimeAction {
    /// Report reachability, version, and privileged-helper status
    Status {
        /// Runtime endpoint to probe
        #[arg(required = false, long, default_value = "http://127.0.0.1:11434")]
        endpoint: String,
    },
    /// Install the runtime binary, prompting for elevated privilege if needed
    Install {
        /// Skip the install confirmation prompt
        #[arg(required = false, short, long)]
        yes: bool,
    },
    /// Start the runtime service
    Start {
        #[arg(required = false, long, default_value = "http://127.0.0.1:11434")]
        endpoint: String,

        /// Whether the endpoint is the local loopback runtime
        #[arg(required = false, long, default_value_t = true)]
        is_local: bool,
    },
    /// Attempt to repair a runtime that failed to become reachable
    Repair {
        #[arg(required = false, long, default_value = "http://127.0.0.1:11434")]
        endpoint: String,

        #[arg(required = false, long, default_value_t = true)]
        is_local: bool,
    },
}

#[derive(Subcommand)]
pub enum PermissionsAction {
    /// List every scope and its current mode
    List,
    /// Set a scope's mode
    #[command(arg_required_else_help = true)]
    Set {
        /// Scope name, e.g. runtime.install
        #[arg(required = true)]
        scope: String,
        /// One of allow, ask, deny
        #[arg(required = true)]
        mode: String,
    },
    /// Check whether an action under a scope may proceed without prompting
    #[command(arg_required_else_help = true)]
    Check {
        #[arg(required = true)]
        scope: String,
        #[arg(required = true)]
        action: String,
    },
}

#[derive(Subcommand)]
pub enum PolicyAction {
    /// Print the current update policy
    Get,
    /// Set the update channel and/or auto-check flag
    Set {
        #[arg(required = false, long)]
        channel: Option<String>,

        #[arg(required = false, long)]
        auto_check: Option<bool>,
    },
}

#[derive(Subcommand)]
pub enum AuditAction {
    /// Export the update audit trail as a file
    Export {
        #[arg(required = false, long, default_value = "json")]
        format: String,

        #[arg(required = false, long, default_value = "last-7d")]
        window: String,
    },
    /// Count matching update audit records without exporting them
    Count {
        #[arg(required = false, long, default_value = "last-7d")]
        window: String,
    },
}

#[derive(Subcommand)]
pub enum UpdateAction {
    /// Print the persisted update state machine snapshot
    State,
    /// Read or change the update policy
    Policy {
        #[clap(subcommand)]
        action: PolicyAction,
    },
    /// Check the configured provider for a newer, compatible release
    Check,
    /// Download and stage the currently available release
    Download,
    /// Launch the staged artifact and exit so it can replace this process
    RestartApply,
    /// Inspect the update audit trail
    Audit {
        #[clap(subcommand)]
        action: AuditAction,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read or change local configuration
    #[command(arg_required_else_help = true)]
    Config {
        #[clap(subcommand)]
        action: ConfigAction,
    },

    /// Manage the local runtime binary
    #[command(arg_required_else_help = true)]
    Runtime {
        #[clap(subcommand)]
        action: RuntimeAction,
    },

    /// Read or change privileged-action permissions
    #[command(arg_required_else_help = true)]
    Permissions {
        #[clap(subcommand)]
        action: PermissionsAction,
    },

    /// Check self-update state and drive the self-update flow
    #[command(arg_required_else_help = true)]
    #[clap(name = "update", visible_alias = "u")]
    Update {
        #[clap(subcommand)]
        action: UpdateAction,
    },

    /// Export application logs
    Logs {
        #[arg(required = false, long, default_value = "json")]
        format: String,

        #[arg(required = false, long, default_value = "last-7d")]
        window: String,
    },

    /// Remove dexter and optionally the runtime and user data
    #[command(arg_required_else_help = true)]
    Uninstall {
        /// remove keeps user data, purge deletes it too
        #[arg(required = false, long, default_value = "remove")]
        package_mode: String,

        /// Also remove dexter's own user data directory
        #[arg(required = false, long)]
        remove_user_data: bool,

        /// Also uninstall the runtime's system package
        #[arg(required = false, long)]
        remove_runtime_system: bool,

        /// Also remove the runtime's user data directory
        #[arg(required = false, long)]
        remove_runtime_user_data: bool,

        /// Confirmation token, must equal UNINSTALL-DEXTER
        #[arg(required = true, long)]
        token: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_graph_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_update_alias_u_is_registered() {
        let args = Args::parse_from(["dexter", "u", "state"]);
        assert!(matches!(args.command, Commands::Update { action: UpdateAction::State }));
    }

    #[test]
    fn test_runtime_status_uses_default_endpoint() {
        let args = Args::parse_from(["dexter", "runtime", "status"]);
        let Commands::Runtime { action: RuntimeAction::Status { endpoint } } = args.command else {
            panic!("expected RuntimeAction::Status");
        };
        assert_eq!(endpoint, "http://127.0.0.1:11434");
    }
}
