pub mod executor;
pub mod strategy;

pub use executor::{Action, ExecutionOutcome, PrivilegedExecutor};
pub use strategy::{select_strategy, Strategy, StrategyContext, StrategyFailure};
