//! The target model: declarative configuration plus derived argument
//! vectors for a single build target.

use {
    crate::{
        error::{Error, Result},
        token::tokenize_to_argv,
    },
    mace_hash::hash_name,
    std::path::{Path, PathBuf},
};

/// Names no user target may use; `all` builds everything, `clean`
/// removes the object and build directories.
pub const RESERVED_NAMES: [&str; 2] = ["all", "clean"];

/// What kind of artifact a target produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetKind
{
    /// A linked executable.
    Executable,
    /// A `lib<name>.a` static archive.
    StaticLibrary,
    /// A `lib<name>.so` shared object (specified, not yet linked; see
    /// [`crate::Target`] docs).
    SharedLibrary,
}

/// Declarative, user-supplied configuration for one target.
///
/// Every field here is exactly what a build description sets; nothing
/// in this struct depends on filesystem state or engine configuration.
/// Everything derived from it ([`Target`]) is a pure function of these
/// fields plus the engine's own configuration (compiler, directories),
/// per the "derived state vs. user state" design note.
#[derive(Clone, Debug, Default)]
pub struct TargetSpec
{
    /// Target name. Must be unique and not one of [`RESERVED_NAMES`].
    pub name: String,
    /// What kind of artifact this target produces.
    pub kind: Option<TargetKind>,
    /// Separator-delimited include directories.
    pub includes: String,
    /// Separator-delimited source specifiers: files, directories, globs.
    pub sources: String,
    /// Separator-delimited source files to exclude from `sources`.
    pub excludes: String,
    /// Separator-delimited link references: target names or external
    /// library names, passed to the linker as `-l<name>`.
    pub links: String,
    /// Separator-delimited dependency-only target references: like
    /// `links`, but never passed to the linker.
    pub deps: String,
    /// Separator-delimited compiler flags, passed through verbatim.
    pub flags: String,
    /// Directory relative paths in `sources`/`includes` are rooted at.
    pub base_dir: Option<PathBuf>,
    /// Shell command run (split on `&&`) before the target builds.
    pub pre_build_command: Option<String>,
    /// Shell command run (split on `&&`) after the target builds.
    pub post_build_command: Option<String>,
    /// Message printed before the target builds.
    pub pre_build_message: Option<String>,
    /// Message printed after the target builds.
    pub post_build_message: Option<String>,
    /// Compile every source in one invocation instead of one each.
    ///
    /// Faster overall, but fails if two sources share a basename.
    pub all_at_once: bool,
}

impl TargetKind
{
    fn default_kind() -> Self
    {
        Self::Executable
    }
}

/// A registered target: declarative configuration plus everything
/// derived from it at registration time.
pub struct Target
{
    /// The declarative configuration this target was registered with.
    pub spec: TargetSpec,
    /// djb2 hash of [`TargetSpec::name`].
    pub name_hash: u64,
    /// Insertion order; a stable identifier through the whole build.
    pub order: usize,

    /// Names referenced by `links`, in declared order, deduplicated.
    pub link_refs: Vec<String>,
    /// Names referenced by `deps`, in declared order, deduplicated.
    pub dep_refs: Vec<String>,

    /// `-I<canonicalized absolute path>` for each include directory.
    pub argv_includes: Vec<String>,
    /// `-l<name>` for each entry in `links` (target or external library).
    pub argv_links: Vec<String>,
    /// User flags, passed through verbatim.
    pub argv_flags: Vec<String>,

    /// Canonicalized absolute paths of sources, discovered during build.
    pub sources: Vec<PathBuf>,
    /// `-o<path>` object path for each source in [`sources`][Self::sources].
    pub objects: Vec<PathBuf>,
    /// Parallel to `sources`: whether that source needs recompilation.
    pub recompile: Vec<bool>,
}

impl Target
{
    /// Register a target: validate its name, parse its link and
    /// dependency strings, and materialize the include/link/flag
    /// argument vectors. Sources are *not* discovered here; that
    /// happens during the build, once the target's base directory is
    /// current (§4.7 step 4).
    pub fn register(
        spec: TargetSpec,
        order: usize,
        separator: char,
    ) -> Result<Self>
    {
        if spec.name.is_empty() {
            return Err(Error::Configuration("target name is empty".into()));
        }

        if RESERVED_NAMES.contains(&spec.name.as_str()) {
            return Err(Error::Configuration(format!(
                "target name {:?} is reserved", spec.name
            )));
        }

        let name_hash = hash_name(&spec.name);

        let link_refs = dedup(tokenize_to_argv(&spec.links, separator, "", false));
        let dep_refs = dedup(tokenize_to_argv(&spec.deps, separator, "", false));

        let argv_includes = tokenize_to_argv(&spec.includes, separator, "-I", true);
        let argv_links = tokenize_to_argv(&spec.links, separator, "-l", false);
        let argv_flags = tokenize_to_argv(&spec.flags, separator, "", false);

        Ok(Self{
            spec,
            name_hash,
            order,
            link_refs,
            dep_refs,
            argv_includes,
            argv_links,
            argv_flags,
            sources: Vec::new(),
            objects: Vec::new(),
            recompile: Vec::new(),
        })
    }

    /// The target's kind, defaulting to [`TargetKind::Executable`].
    pub fn kind(&self) -> TargetKind
    {
        self.spec.kind.unwrap_or_else(TargetKind::default_kind)
    }

    /// The base directory sources and includes are rooted at.
    pub fn base_dir(&self) -> PathBuf
    {
        self.spec.base_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Compute the object-directory path for one of this target's
    /// sources, disambiguating same-basename sources by appending a
    /// digit before the extension.
    ///
    /// The first collision for a basename produces `name.1.o`; the
    /// ninth produces `name.9.o`. A tenth collision is a fatal
    /// configuration error (a true off-by-one fix relative to the
    /// original C implementation; see DESIGN.md).
    pub fn object_path(
        obj_dir: &Path,
        source: &Path,
        basename_counts: &mut std::collections::HashMap<String, u32>,
    ) -> Result<PathBuf>
    {
        let stem = source.file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Configuration(format!(
                "{source:?} has no valid file stem"
            )))?
            .to_owned();

        let count = basename_counts.entry(stem.clone()).or_insert(0);
        let disambiguated = if *count == 0 {
            stem.clone()
        } else {
            format!("{stem}.{count}")
        };

        if *count >= 10 {
            return Err(Error::Configuration(format!(
                "more than 9 sources share the basename {stem:?}"
            )));
        }
        *count += 1;

        Ok(obj_dir.join(format!("{disambiguated}.o")))
    }

    /// Canonicalize and register a discovered source, appending its
    /// object path and a placeholder `false` recompile flag.
    pub fn push_source(&mut self, source: PathBuf, object: PathBuf)
    {
        self.sources.push(source);
        self.objects.push(object);
        self.recompile.push(false);
    }
}

fn dedup(names: Vec<String>) -> Vec<String>
{
    let mut seen = std::collections::HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn spec(name: &str) -> TargetSpec
    {
        TargetSpec{name: name.into(), ..Default::default()}
    }

    #[test]
    fn rejects_reserved_names()
    {
        assert!(Target::register(spec("all"), 0, ' ').is_err());
        assert!(Target::register(spec("clean"), 0, ' ').is_err());
    }

    #[test]
    fn rejects_empty_name()
    {
        assert!(Target::register(spec(""), 0, ' ').is_err());
    }

    #[test]
    fn name_hash_is_deterministic()
    {
        let a = Target::register(spec("tnecs"), 0, ' ').unwrap();
        let b = Target::register(spec("tnecs"), 1, ' ').unwrap();
        assert_eq!(a.name_hash, b.name_hash);
    }

    #[test]
    fn dedups_link_refs()
    {
        let mut s = spec("app");
        s.links = "B B C".into();
        let t = Target::register(s, 0, ' ').unwrap();
        assert_eq!(t.link_refs, vec!["B", "C"]);
        assert_eq!(t.argv_links, vec!["-lB", "-lB", "-lC"]);
    }

    #[test]
    fn object_path_disambiguates_up_to_nine()
    {
        let mut counts = std::collections::HashMap::new();
        let obj_dir = Path::new("obj");
        let mut last = PathBuf::new();
        for i in 0 .. 10 {
            last = Target::object_path(obj_dir, Path::new("a/foo.c"), &mut counts).unwrap();
            if i == 0 {
                assert_eq!(last, Path::new("obj/foo.o"));
            }
        }
        assert_eq!(last, Path::new("obj/foo.9.o"));
        assert!(Target::object_path(obj_dir, Path::new("a/foo.c"), &mut counts).is_err());
    }

    #[test]
    fn object_path_is_idempotent_for_distinct_basenames()
    {
        let mut counts = std::collections::HashMap::new();
        let obj_dir = Path::new("obj");
        let a = Target::object_path(obj_dir, Path::new("x/a.c"), &mut counts).unwrap();
        let b = Target::object_path(obj_dir, Path::new("y/b.c"), &mut counts).unwrap();
        assert_eq!(a, Path::new("obj/a.o"));
        assert_eq!(b, Path::new("obj/b.o"));
    }
}
