//! # deployer-runner
//!
//! Deployment Runner: [`Runner::deploy`] reconciles the environment's remote
//! repo, then runs the external deploy command in the environment's working
//! directory, retrying failed runs with a fixed delay up to a bounded count.

pub mod command;
pub mod error;
pub mod runner;

pub use command::{CommandOutcome, CommandRunner, CommandSpec, OutputMode, ProcessRunner};
pub use error::{AttemptFailure, DeployError};
pub use runner::{DeployReport, Runner, Sleeper, ThreadSleeper};
