//! Mace build-orchestration engine.
//!
//! This crate is the part of mace that a build description links
//! against: the target graph, the incremental rebuild engine, the
//! bounded-concurrency process pool, and the command-line surface of
//! the binaries it produces. See [`run`] for the embedding contract.

#![warn(missing_docs)]

pub use self::{
    builder::*,
    cli::Config,
    error::{Error, Result},
    target::{Target, TargetKind, TargetSpec},
};

mod builder;
mod cli;
mod engine;
mod error;
mod graph;
mod path;
mod pool;
mod target;
mod token;

use std::process::ExitCode;

/// Run the mace engine.
///
/// This is what a build description's `fn main()` calls. It parses the
/// process's command-line arguments, invokes `configure` to collect the
/// user's targets, and then drives the build (or the `clean` action).
///
/// `configure` plays the role of the original C embedding's
/// user-implemented `int mace(int argc, char *argv[])`.
pub fn run<F>(configure: F) -> ExitCode
    where F: FnOnce(&mut Builder) -> anyhow::Result<()>
{
    cli::main(configure)
}
