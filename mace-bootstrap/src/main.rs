//! Convenience executable: compiles a build description with `rustc`
//! and runs the resulting binary, forwarding the relevant flags.
//!
//! This is a literal translation of the original tool's "compile
//! macefile.c with CC, exec the result" bootstrap, substituting
//! `rustc` for the configured C compiler at this stage only -- the
//! target builds the resulting binary orchestrates still invoke the
//! user-configured C compiler/archiver.

use {
    clap::Parser,
    std::{
        ffi::CString,
        path::PathBuf,
        process::ExitCode,
    },
};

const DEFAULT_MACEFILE: &str = "macefile.rs";
const BUILDER: &str = "builder";

#[derive(Parser, Debug)]
#[command(
    name = "mace", about = "Compile and run a mace build description",
    version = env!("CARGO_PKG_VERSION"), disable_version_flag = true,
)]
struct Args
{
    /// Print version information and exit.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    #[arg(short = 'B', long = "always-make")]
    always_make: bool,

    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    directory: Option<PathBuf>,

    #[arg(short = 'c', long = "cc", value_name = "CC")]
    cc: Option<String>,

    #[arg(short = 'd', long = "debug")]
    debug: bool,

    #[arg(short = 'j', long = "jobs", value_name = "N")]
    jobs: Option<usize>,

    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Mark a source as up to date, skipping it regardless of its hash.
    #[arg(short = 'o', long = "old-file", value_name = "NAME")]
    old_file: Vec<String>,

    #[arg(short = 's', long = "silent")]
    silent: bool,

    /// Rust compiler used to build the macefile itself.
    #[arg(long = "rustc", default_value = "rustc")]
    rustc: String,

    #[arg(short = 'f', long = "file", value_name = "MACEFILE", default_value = DEFAULT_MACEFILE)]
    file: PathBuf,

    target: Option<String>,
}

fn main() -> ExitCode
{
    env_logger::init();
    let args = Args::parse();

    if let Some(dir) = &args.directory {
        if let Err(err) = os_ext::chdir(dir) {
            eprintln!("mace: cannot change to {dir:?}: {err}");
            return ExitCode::from(1);
        }
    }

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("mace: {err}");
            ExitCode::from(1)
        },
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode>
{
    log::info!("compiling {:?} with {}", args.file, args.rustc);

    let compile_argv = cstrings(&[
        &args.rustc,
        &args.file.to_string_lossy(),
        "-o",
        BUILDER,
    ])?;
    let pid = os_ext::spawn(&compile_argv)?;
    let status = os_ext::waitpid(pid)?;
    if !status.success() {
        anyhow::bail!("{} failed to compile {:?}", args.rustc, args.file);
    }

    let mut run_argv: Vec<String> = vec![format!("./{BUILDER}")];
    if args.always_make { run_argv.push("-B".into()); }
    if args.debug { run_argv.push("-d".into()); }
    if args.dry_run { run_argv.push("-n".into()); }
    if args.silent { run_argv.push("-s".into()); }
    if let Some(cc) = &args.cc {
        run_argv.push("-c".into());
        run_argv.push(cc.clone());
    }
    if let Some(jobs) = args.jobs {
        run_argv.push("-j".into());
        run_argv.push(jobs.to_string());
    }
    for old_file in &args.old_file {
        run_argv.push("-o".into());
        run_argv.push(old_file.clone());
    }
    if let Some(target) = &args.target {
        run_argv.push(target.clone());
    }

    log::info!("running {run_argv:?}");
    let run_argv_c = cstrings(&run_argv.iter().map(String::as_str).collect::<Vec<_>>())?;
    let pid = os_ext::spawn(&run_argv_c)?;
    let status = os_ext::waitpid(pid)?;

    Ok(ExitCode::from(status.code().unwrap_or(1).clamp(0, 255) as u8))
}

fn cstrings(args: &[&str]) -> anyhow::Result<Vec<CString>>
{
    args.iter().map(|s| Ok(CString::new(*s)?)).collect()
}
