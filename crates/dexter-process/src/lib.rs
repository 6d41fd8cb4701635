pub mod command;
pub mod probe;
pub mod sanitize;

pub use command::{CommandOutput, CommandRunner, EnvBuilder};
pub use probe::EnvironmentProbe;
