//! The user-facing embedding surface: the `Builder` a build
//! description's `configure` function populates.

use {
    crate::{
        error::{Error, Result},
        graph::Graph,
        target::{Target, TargetSpec},
        token::validate_separator,
    },
    std::path::PathBuf,
};

/// Default directory for intermediate `.o`/`.d`/`.sha1` files.
pub const DEFAULT_OBJ_DIR: &str = "obj/";
/// Default directory for final linked artifacts.
pub const DEFAULT_BUILD_DIR: &str = "build/";
/// Default token separator.
pub const DEFAULT_SEPARATOR: char = ' ';

/// Collects a build description's targets and engine settings.
///
/// A user's `configure` function receives a `&mut Builder`, calls
/// [`Builder::set_compiler`] and [`Builder::target`] (at minimum), and
/// returns. [`crate::run`] then validates, finalizes, and drives the
/// resulting configuration; the user never calls [`Builder::finish`]
/// themselves.
#[derive(Default)]
pub struct Builder
{
    compiler: Option<String>,
    archiver: Option<String>,
    obj_dir: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    separator: Option<char>,
    default_target: Option<String>,
    specs: Vec<TargetSpec>,
}

impl Builder
{
    /// Start an empty builder.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Set the C compiler to invoke, e.g. `"cc"` or `"gcc"`.
    ///
    /// Mandatory: [`Builder::finish`] fails if this is never called.
    pub fn set_compiler(&mut self, compiler: impl Into<String>) -> &mut Self
    {
        self.compiler = Some(compiler.into());
        self
    }

    /// Set the archiver invoked to build static libraries. Defaults to `"ar"`.
    pub fn set_archiver(&mut self, archiver: impl Into<String>) -> &mut Self
    {
        self.archiver = Some(archiver.into());
        self
    }

    /// Override the object directory. Defaults to [`DEFAULT_OBJ_DIR`].
    pub fn set_obj_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self
    {
        self.obj_dir = Some(dir.into());
        self
    }

    /// Override the build directory. Defaults to [`DEFAULT_BUILD_DIR`].
    pub fn set_build_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self
    {
        self.build_dir = Some(dir.into());
        self
    }

    /// Override the token separator. Defaults to [`DEFAULT_SEPARATOR`].
    pub fn set_separator(&mut self, separator: char) -> &mut Self
    {
        self.separator = Some(separator);
        self
    }

    /// Set which target `mace` with no positional argument builds.
    ///
    /// If never called, a no-argument invocation builds every target
    /// (equivalent to the reserved `all` target).
    pub fn set_default_target(&mut self, name: impl Into<String>) -> &mut Self
    {
        self.default_target = Some(name.into());
        self
    }

    /// Register a target.
    pub fn target(&mut self, spec: TargetSpec) -> &mut Self
    {
        self.specs.push(spec);
        self
    }

    /// Validate and lower the builder into a resolved [`Graph`].
    ///
    /// Returns the graph, the effective archiver name, object
    /// directory, build directory, and token separator -- everything
    /// [`crate::cli`] needs to assemble an [`crate::engine::EngineConfig`].
    pub fn finish(self) -> Result<FinishedBuilder>
    {
        let compiler = self.compiler.ok_or_else(|| {
            Error::InvalidState("no compiler was configured".into())
        })?;

        if self.specs.is_empty() {
            return Err(Error::InvalidState("no targets were registered".into()));
        }

        let separator = self.separator.unwrap_or(DEFAULT_SEPARATOR);
        validate_separator(&separator.to_string())?;

        let targets = self.specs.into_iter().enumerate()
            .map(|(order, spec)| Target::register(spec, order, separator))
            .collect::<Result<Vec<_>>>()?;

        if let Some(default) = &self.default_target {
            if !targets.iter().any(|t| &t.spec.name == default) {
                return Err(Error::Configuration(format!(
                    "default target {default:?} was never registered"
                )));
            }
        }

        let graph = Graph::new(targets)?;

        Ok(FinishedBuilder{
            graph,
            compiler,
            archiver: self.archiver.unwrap_or_else(|| "ar".to_owned()),
            obj_dir: self.obj_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OBJ_DIR)),
            build_dir: self.build_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR)),
            separator,
            default_target: self.default_target,
        })
    }
}

/// The result of [`Builder::finish`]: a resolved graph plus everything
/// that came from the build description rather than the command line.
pub struct FinishedBuilder
{
    /// The resolved, cycle-checked target graph.
    pub graph: Graph,
    /// The compiler set via [`Builder::set_compiler`].
    pub compiler: String,
    /// The archiver, defaulting to `"ar"`.
    pub archiver: String,
    /// The object directory.
    pub obj_dir: PathBuf,
    /// The build directory.
    pub build_dir: PathBuf,
    /// The token separator.
    pub separator: char,
    /// The default target name, if one was set.
    pub default_target: Option<String>,
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn finish_requires_a_compiler()
    {
        let mut builder = Builder::new();
        builder.target(TargetSpec{name: "app".into(), ..Default::default()});
        assert!(matches!(builder.finish(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn finish_requires_at_least_one_target()
    {
        let mut builder = Builder::new();
        builder.set_compiler("cc");
        assert!(matches!(builder.finish(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn finish_rejects_unregistered_default_target()
    {
        let mut builder = Builder::new();
        builder.set_compiler("cc");
        builder.set_default_target("missing");
        builder.target(TargetSpec{name: "app".into(), ..Default::default()});
        assert!(matches!(builder.finish(), Err(Error::Configuration(_))));
    }

    #[test]
    fn finish_succeeds_with_compiler_and_target()
    {
        let mut builder = Builder::new();
        builder.set_compiler("cc");
        builder.target(TargetSpec{name: "app".into(), ..Default::default()});
        let finished = builder.finish().unwrap();
        assert_eq!(finished.compiler, "cc");
        assert_eq!(finished.archiver, "ar");
        assert_eq!(finished.graph.targets().len(), 1);
    }
}
