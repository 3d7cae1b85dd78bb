//! Command-line entry point (C8): argument parsing, logging setup, and
//! dispatch into the build engine or the clean action.

use {
    crate::{
        builder::Builder,
        engine::{self, EngineConfig},
        error::Error,
    },
    clap::Parser,
    std::{path::PathBuf, process::ExitCode},
};

/// Reserved target name that builds every registered target.
pub const ALL: &str = "all";
/// Reserved target name that runs the clean action.
pub const CLEAN: &str = "clean";

/// Parsed command-line flags, before validation against the build
/// description's configuration.
#[derive(Parser, Debug)]
#[command(
    name = "mace", about = "Build orchestrator for C projects",
    version = env!("CARGO_PKG_VERSION"), disable_version_flag = true,
)]
struct RawArgs
{
    /// Print version information and exit.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    /// Treat every source as needing recompilation.
    #[arg(short = 'B', long = "always-make")]
    always_make: bool,

    /// Change to DIR before doing anything else.
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Override the compiler configured by the build description.
    #[arg(short = 'c', long = "cc", value_name = "CC")]
    cc: Option<String>,

    /// Enable debug-level logging, equivalent to RUST_LOG=debug.
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Maximum number of concurrent child processes.
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value_t = 1)]
    jobs: usize,

    /// Print what would be done without spawning any child process.
    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Mark a source as up to date, skipping it regardless of its hash.
    #[arg(short = 'o', long = "old-file", value_name = "NAME")]
    old_file: Vec<String>,

    /// Suppress the pre/post-build messages.
    #[arg(short = 's', long = "silent")]
    silent: bool,

    /// Build-description source file, consumed by the bootstrapper.
    #[arg(short = 'f', long = "file", value_name = "MACEFILE")]
    file: Option<PathBuf>,

    /// Target to build, `all`, or `clean`. Defaults to the build
    /// description's default target, or `all` if none was set.
    target: Option<String>,
}

/// Validated, engine-facing configuration lowered from [`RawArgs`].
///
/// Unlike `RawArgs`, every field here has already been resolved against
/// the build description (e.g. `compiler` falls back to the one set
/// via [`crate::Builder::set_compiler`] when `-c` was not given). The
/// engine's pure functions consume this, never `std::env` or `clap`
/// directly (Design Notes, "Derived state vs. user state").
#[derive(Clone, Debug)]
pub struct Config
{
    /// The compiler to invoke.
    pub compiler: String,
    /// The archiver to invoke for static libraries.
    pub archiver: String,
    /// Object directory.
    pub obj_dir: PathBuf,
    /// Build directory.
    pub build_dir: PathBuf,
    /// Token separator.
    pub separator: char,
    /// Treat every source as needing recompilation.
    pub always_make: bool,
    /// Report what would run without spawning any child process.
    pub dry_run: bool,
    /// Maximum concurrent child processes.
    pub jobs: usize,
    /// Sources to treat as up to date regardless of their hash.
    pub old_files: Vec<String>,
    /// Suppress pre/post-build messages.
    pub silent: bool,
    /// The resolved target selection: a specific name, `all`, or `clean`.
    pub selection: String,
}

/// Parse CLI arguments, run `configure`, and dispatch the build.
///
/// This is what [`crate::run`] calls.
pub fn main<F>(configure: F) -> ExitCode
    where F: FnOnce(&mut Builder) -> anyhow::Result<()>
{
    let raw = match RawArgs::try_parse() {
        Ok(raw) => raw,
        Err(err) => {
            use clap::error::ErrorKind;
            // `clap::Parser::parse` would call `std::process::exit` here
            // directly, bypassing `Error::exit_code` entirely. `--help`
            // and `--version` still exit successfully; every other parse
            // failure (unknown flag, bad value) is a Configuration error
            // per §6, not a bespoke clap-chosen status.
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    print!("{err}");
                    ExitCode::SUCCESS
                },
                _ => {
                    eprint!("{err}");
                    Error::Configuration(err.to_string()).exit_code()
                },
            };
        },
    };

    let log_level = if raw.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level),
    ).init();

    if let Some(dir) = &raw.directory {
        if let Err(err) = os_ext::chdir(dir) {
            eprintln!("mace: cannot change to {dir:?}: {err}");
            return Error::Filesystem{path: dir.clone(), source: err}.exit_code();
        }
    }

    let mut builder = Builder::new();
    if let Err(err) = configure(&mut builder) {
        eprintln!("mace: {err}");
        return Error::Configuration(err.to_string()).exit_code();
    }

    match run(builder, raw) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mace: {err}");
            err.exit_code()
        },
    }
}

fn run(builder: Builder, raw: RawArgs) -> crate::error::Result<()>
{
    let finished = builder.finish()?;

    let selection = raw.target
        .or(finished.default_target.clone())
        .unwrap_or_else(|| ALL.to_owned());

    let config = Config{
        compiler: raw.cc.unwrap_or(finished.compiler),
        archiver: finished.archiver,
        obj_dir: finished.obj_dir,
        build_dir: finished.build_dir,
        separator: finished.separator,
        always_make: raw.always_make,
        dry_run: raw.dry_run,
        jobs: raw.jobs.max(1),
        old_files: raw.old_file,
        silent: raw.silent,
        selection,
    };

    let mut graph = finished.graph;

    if config.selection == CLEAN {
        return engine::clean(&engine_config(&config));
    }

    let order = if config.selection == ALL {
        graph.build_order()?
    } else {
        let index = graph.index_of(&config.selection).ok_or_else(|| {
            Error::Configuration(format!("no such target {:?}", config.selection))
        })?;
        prune_to(&graph, index)?
    };

    engine::build_all(&mut graph, &order, &engine_config(&config))
}

/// Restrict a full build order down to one target and its transitive
/// link/dependency closure, preserving the order's relative ordering.
fn prune_to(graph: &crate::graph::Graph, index: usize) -> crate::error::Result<Vec<usize>>
{
    let full_order = graph.build_order()?;

    let mut needed = std::collections::HashSet::new();
    let mut stack = vec![index];
    while let Some(i) = stack.pop() {
        if !needed.insert(i) {
            continue;
        }
        for name in graph.targets()[i].link_refs.iter().chain(graph.targets()[i].dep_refs.iter()) {
            if let Some(j) = graph.index_of(name) {
                stack.push(j);
            }
        }
    }

    Ok(full_order.into_iter().filter(|i| needed.contains(i)).collect())
}

fn engine_config(config: &Config) -> EngineConfig
{
    EngineConfig{
        compiler: config.compiler.clone(),
        archiver: config.archiver.clone(),
        obj_dir: config.obj_dir.clone(),
        build_dir: config.build_dir.clone(),
        jobs: config.jobs,
        separator: config.separator,
        always_make: config.always_make,
        dry_run: config.dry_run,
        old_files: config.old_files.clone(),
        silent: config.silent,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{graph::Graph, target::{Target, TargetSpec}};

    fn target(name: &str, links: &str) -> Target
    {
        let spec = TargetSpec{name: name.into(), links: links.into(), ..Default::default()};
        Target::register(spec, 0, ' ').unwrap()
    }

    #[test]
    fn prune_to_includes_only_transitive_dependencies()
    {
        let targets = vec![
            target("app", "lib"),
            target("lib", ""),
            target("unrelated", ""),
        ];
        let graph = Graph::new(targets).unwrap();
        let index = graph.index_of("app").unwrap();
        let pruned = prune_to(&graph, index).unwrap();

        let names: Vec<&str> = pruned.iter().map(|&i| graph.targets()[i].spec.name.as_str()).collect();
        assert!(names.contains(&"app"));
        assert!(names.contains(&"lib"));
        assert!(!names.contains(&"unrelated"));
    }
}
