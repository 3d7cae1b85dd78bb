//! The build engine: per-target source discovery, incremental rebuild
//! decisions, and the precompile/compile/link sequence (§4.7).

use {
    crate::{
        error::{Error, Result},
        graph::Graph,
        path,
        pool::{self, Job},
        target::{Target, TargetKind},
        token::split_commands,
    },
    std::{
        collections::HashMap,
        ffi::CString,
        fs,
        path::{Path, PathBuf},
    },
};

/// Process-wide engine configuration, lowered once from CLI flags.
///
/// This is the pure configuration record the engine actually consumes;
/// see the crate-level docs and [`crate::cli::Config`] for how it's
/// produced.
pub struct EngineConfig
{
    /// The C compiler to invoke, e.g. `"cc"`.
    pub compiler: String,
    /// The archiver to invoke for static libraries, e.g. `"ar"`.
    pub archiver: String,
    /// Directory for intermediate `.o`/`.d`/`.sha1` files.
    pub obj_dir: PathBuf,
    /// Directory for final linked artifacts.
    pub build_dir: PathBuf,
    /// Maximum number of child processes running at once.
    pub jobs: usize,
    /// Token separator for `includes`/`sources`/`links`/`deps`/`flags`.
    pub separator: char,
    /// Treat every source as needing recompilation, ignoring sidecars.
    pub always_make: bool,
    /// Report what would run without spawning any child process.
    pub dry_run: bool,
    /// Source basenames to treat as up to date regardless of their hash.
    pub old_files: Vec<String>,
    /// Suppress pre/post-build messages.
    pub silent: bool,
}

/// Remove the object and build directories recursively.
///
/// No other engine state is touched; this is the `clean` action (§4.7).
pub fn clean(config: &EngineConfig) -> Result<()>
{
    for dir in [&config.obj_dir, &config.build_dir] {
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(|source| Error::Filesystem{
                path: dir.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Build every target in `order` in sequence.
pub fn build_all(graph: &mut Graph, order: &[usize], config: &EngineConfig) -> Result<()>
{
    fs::create_dir_all(&config.obj_dir).map_err(|source| Error::Filesystem{
        path: config.obj_dir.clone(), source,
    })?;
    fs::create_dir_all(&config.build_dir).map_err(|source| Error::Filesystem{
        path: config.build_dir.clone(), source,
    })?;

    for &index in order {
        build_one(graph, index, config)?;
    }
    Ok(())
}

fn build_one(graph: &mut Graph, index: usize, config: &EngineConfig) -> Result<()>
{
    let name = graph.targets()[index].spec.name.clone();
    log::info!("building target {name:?}");

    run_hook_command(&graph.targets()[index].spec.pre_build_command, config)?;
    if !config.silent {
        if let Some(message) = &graph.targets()[index].spec.pre_build_message {
            println!("{message}");
        }
    }

    let original_cwd = os_ext::getcwd().map_err(|source| Error::Filesystem{
        path: PathBuf::from("."), source,
    })?;
    let base_dir = graph.targets()[index].base_dir();
    os_ext::chdir(&base_dir).map_err(|source| Error::Filesystem{
        path: base_dir.clone(), source,
    })?;

    // Restored on every exit path, including `?`-propagated errors, by
    // the same guard the teacher uses around process-wide mutable state.
    let restore_cwd = original_cwd.clone();
    scope_exit::scope_exit! {
        let _ = os_ext::chdir(&restore_cwd);
    }

    let build_result = (|| -> Result<()> {
        discover_sources(graph.target_mut(index), config)?;

        let recompile_count = graph.targets()[index].recompile.iter().filter(|&&r| r).count();
        log::debug!("target {name:?}: {recompile_count} source(s) need recompilation");

        precompile_phase(graph.targets()[index].as_ref_for_compile(), config)?;
        compile_phase(graph.targets()[index].as_ref_for_compile(), config)?;
        Ok(())
    })();

    os_ext::chdir(&original_cwd).map_err(|source| Error::Filesystem{
        path: original_cwd.clone(), source,
    })?;

    build_result?;

    link_phase(&graph.targets()[index], config)?;

    if !config.silent {
        if let Some(message) = &graph.targets()[index].spec.post_build_message {
            println!("{message}");
        }
    }
    run_hook_command(&graph.targets()[index].spec.post_build_command, config)?;

    Ok(())
}

fn run_hook_command(command: &Option<String>, config: &EngineConfig) -> Result<()>
{
    let Some(command) = command else { return Ok(()) };
    if config.dry_run {
        log::info!("dry-run: would execute hook {command:?}");
        return Ok(());
    }

    let mut queue = std::collections::VecDeque::new();
    for fragment in split_commands(command) {
        queue.push_back(shell_job(&fragment)?);
    }
    pool::run_bounded(queue, 1)
}

fn shell_job(fragment: &str) -> Result<Job>
{
    let argv = vec![
        CString::new("/bin/sh").unwrap(),
        CString::new("-c").unwrap(),
        CString::new(fragment).map_err(|_| Error::Configuration(format!(
            "hook command {fragment:?} contains a NUL byte"
        )))?,
    ];
    Ok(Job{program: "/bin/sh".into(), argv})
}

/// Discover a target's sources, derive their object paths, and decide
/// which need recompilation (§4.7 step 4).
fn discover_sources(target: &mut Target, config: &EngineConfig) -> Result<()>
{
    let excludes: Vec<PathBuf> = crate::token::tokenize_to_argv(
        &target.spec.excludes, config.separator, "", false,
    ).into_iter().map(|tok| path::canonicalize(Path::new(&tok))).collect();

    let mut sources = Vec::new();
    for token in crate::token::tokenize_to_argv(&target.spec.sources, config.separator, "", false) {
        let path = Path::new(&token);
        let matches = if path::is_wildcard(&token) {
            path::glob(&token)?
        } else if path::is_dir(path) {
            path::glob_dir(path)?
        } else if path::is_source(path) {
            vec![path.to_owned()]
        } else {
            return Err(Error::Filesystem{
                path: path.to_owned(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "source is neither a .c file, a folder, nor has a wildcard in it",
                ),
            });
        };
        sources.extend(matches);
    }

    let mut basename_counts = HashMap::new();
    for source in sources {
        if !path::is_source(&source) {
            if path::is_object(&source) {
                log::debug!("skipping stray object file {source:?} matched by source pattern");
            }
            continue;
        }

        let canonical = path::canonicalize(&source);
        if excludes.contains(&canonical) {
            continue;
        }

        let object = Target::object_path(&config.obj_dir, &canonical, &mut basename_counts)?;

        let is_old_file = canonical.file_name()
            .is_some_and(|n| config.old_files.iter().any(|old| old.as_str() == n));
        let recompile = !is_old_file
            && (config.always_make || needs_recompile(&canonical, &object)?);

        target.push_source(canonical, object);
        *target.recompile.last_mut().unwrap() = recompile;
    }

    Ok(())
}

fn needs_recompile(source: &Path, object: &Path) -> Result<bool>
{
    if !object.exists() {
        return Ok(true);
    }

    let sidecar = sidecar_path(object);
    let previous = mace_hash::read_sidecar(&sidecar)
        .map_err(|source| Error::from_hash_io(&sidecar, source))?;
    let current = mace_hash::hash_file(source)
        .map_err(|err| Error::from_hash_io(source, err))?;

    Ok(previous.map(|prev| prev.0 != current.0).unwrap_or(true))
}

fn sidecar_path(object: &Path) -> PathBuf
{
    object.with_extension("sha1")
}

/// View of a target's fields the compile phases need; kept narrow so
/// `build_one`'s closure can borrow immutably while `target_mut` is
/// still in scope for `discover_sources`.
struct CompileView<'a>
{
    name: &'a str,
    sources: &'a [PathBuf],
    objects: &'a [PathBuf],
    recompile: &'a [bool],
    argv_includes: &'a [String],
    argv_links: &'a [String],
    argv_flags: &'a [String],
}

impl Target
{
    fn as_ref_for_compile(&self) -> CompileView<'_>
    {
        CompileView{
            name: &self.spec.name,
            sources: &self.sources,
            objects: &self.objects,
            recompile: &self.recompile,
            argv_includes: &self.argv_includes,
            argv_links: &self.argv_links,
            argv_flags: &self.argv_flags,
        }
    }
}

fn precompile_phase(view: CompileView, config: &EngineConfig) -> Result<()>
{
    let mut queue = std::collections::VecDeque::new();
    for i in 0 .. view.sources.len() {
        if !view.recompile[i] {
            continue;
        }
        let dep_file = view.objects[i].with_extension("d");
        queue.push_back(compile_job(&view, i, &dep_file, config, &["-MM"])?);
    }
    run_or_log(queue, config, &format!("target {:?}: precompile", view.name))
}

fn compile_phase(view: CompileView, config: &EngineConfig) -> Result<()>
{
    let mut queue = std::collections::VecDeque::new();
    for i in 0 .. view.sources.len() {
        if !view.recompile[i] {
            continue;
        }
        queue.push_back(compile_job(&view, i, &view.objects[i], config, &["-c"])?);
    }
    run_or_log(queue, config, &format!("target {:?}: compile", view.name))?;

    for i in 0 .. view.sources.len() {
        if view.recompile[i] && !config.dry_run {
            let digest = mace_hash::hash_file(&view.sources[i])
                .map_err(|err| Error::from_hash_io(&view.sources[i], err))?;
            let sidecar = sidecar_path(&view.objects[i]);
            mace_hash::write_sidecar(&sidecar, &digest)
                .map_err(|source| Error::from_hash_io(&sidecar, source))?;
        }
    }
    Ok(())
}

/// Assemble the argument vector for a single source compile, in the
/// fixed layout of §4.4: `[CC][<source>][-o<object>][flags...][-I...]
/// [-l...][-Lbuild_dir][-MM or -c]`. The link/library flags are
/// unused by the compiler at this stage but kept in the fixed tail so
/// it is built once per target, not reassembled per phase.
fn compile_job(
    view: &CompileView,
    index: usize,
    output: &Path,
    config: &EngineConfig,
    extra: &[&str],
) -> Result<Job>
{
    let compiler = &config.compiler;
    let mut args = vec![compiler.clone(), view.sources[index].display().to_string()];
    args.push(format!("-o{}", output.display()));
    args.extend(view.argv_flags.iter().cloned());
    args.extend(view.argv_includes.iter().cloned());
    args.extend(view.argv_links.iter().cloned());
    args.push(format!("-L{}", config.build_dir.display()));
    args.extend(extra.iter().map(|s| s.to_string()));

    Ok(Job{program: compiler.clone(), argv: to_argv(&args)?})
}

fn link_phase(target: &Target, config: &EngineConfig) -> Result<()>
{
    let args: Vec<String> = match target.kind() {
        TargetKind::StaticLibrary => {
            let output = config.build_dir.join(format!("lib{}.a", target.spec.name));
            let mut args = vec![config.archiver.clone(), "-rcs".into(), output.display().to_string()];
            args.extend(target.objects.iter().map(|o| o.display().to_string()));
            args
        },
        TargetKind::Executable => {
            let output = config.build_dir.join(&target.spec.name);
            let mut args = vec![config.compiler.clone(), "-o".into(), output.display().to_string()];
            args.extend(target.objects.iter().map(|o| o.display().to_string()));
            args.extend(target.argv_flags.iter().cloned());
            args.extend(target.argv_links.iter().cloned());
            args.push(format!("-L{}", config.build_dir.display()));
            args
        },
        TargetKind::SharedLibrary => {
            let output = config.build_dir.join(format!("lib{}.so", target.spec.name));
            let mut args = vec![
                config.compiler.clone(), "-shared".into(), "-fPIC".into(),
                "-o".into(), output.display().to_string(),
            ];
            args.extend(target.objects.iter().map(|o| o.display().to_string()));
            args
        },
    };

    let program = args[0].clone();
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(Job{program, argv: to_argv(&args)?});
    run_or_log(queue, config, &format!("target {:?}: link", target.spec.name))
}

fn run_or_log(
    queue: std::collections::VecDeque<Job>,
    config: &EngineConfig,
    label: &str,
) -> Result<()>
{
    if queue.is_empty() {
        return Ok(());
    }
    if config.dry_run {
        for job in &queue {
            log::info!("dry-run: {label}: would run {:?}", job.program);
        }
        return Ok(());
    }
    pool::run_bounded(queue, config.jobs.max(1))
}

fn to_argv(args: &[String]) -> Result<Vec<CString>>
{
    args.iter().map(|s| CString::new(s.as_str()).map_err(|_| Error::Configuration(format!(
        "{s:?} contains a NUL byte"
    )))).collect()
}
