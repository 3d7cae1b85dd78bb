//! The engine's error hierarchy and its mapping onto process exit codes.

use std::{path::PathBuf, process::ExitCode};

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while configuring or running a build.
///
/// Every variant corresponds to a row of the error-handling table: its
/// [`exit_code`][`Error::exit_code`] reproduces the exit status that
/// table assigns to that kind of failure.
#[derive(Debug, thiserror::Error)]
pub enum Error
{
    /// A user-error configuration mistake: duplicate or reserved target
    /// name, a bad tokenizer separator, an unknown CLI flag, a missing
    /// target, or more than nine same-basename source collisions.
    #[error("{0}")]
    Configuration(String),

    /// The target graph has a circular dependency.
    #[error("circular dependency involving target {0:?}")]
    CircularDependency(String),

    /// No compiler was configured, or no targets were registered.
    #[error("{0}")]
    InvalidState(String),

    /// A filesystem operation failed (glob, chdir, create checksum file, ...).
    #[error("{path}: {source}")]
    Filesystem
    {
        /// Path the operation concerned.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A checksum sidecar is corrupt, or a collision was detected while
    /// hashing a source file.
    #[error(transparent)]
    Integrity(std::io::Error),

    /// A child process (compiler, archiver, hook command) exited with a
    /// non-zero status, or could not be exec'd at all.
    #[error("{program} exited with status {status}")]
    ChildFailed
    {
        /// The program that was run.
        program: String,
        /// Its reported exit status.
        status: i32,
    },

    /// The computed build order is empty.
    #[error("build order is empty")]
    EmptyBuildOrder,

    /// Something the engine asserts can never happen, happened anyway.
    ///
    /// This indicates a bug in the engine itself, not a user mistake.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl Error
{
    /// Classify an I/O failure from a `mace_hash` call: a genuine
    /// collision or sidecar-corruption report becomes [`Self::Integrity`];
    /// every other I/O failure (permission denied, vanished file, disk
    /// full) becomes [`Self::Filesystem`], since a blanket conversion
    /// would otherwise surface ordinary filesystem trouble as EIO.
    pub fn from_hash_io(path: &std::path::Path, source: std::io::Error) -> Self
    {
        let is_integrity = source.get_ref().is_some_and(|inner| {
            inner.is::<mace_hash::CollisionDetected>() || inner.is::<mace_hash::SidecarCorrupt>()
        });

        if is_integrity {
            Self::Integrity(source)
        } else {
            Self::Filesystem{path: path.to_owned(), source}
        }
    }

    /// The process exit code this error should produce, per §6/§7.
    pub fn exit_code(&self) -> ExitCode
    {
        // errno values, used as exit codes per the original C tool's
        // convention of surfacing configuration mistakes as errno.
        const EPERM: u8 = 1;
        const ENOENT: u8 = 2;
        const EIO: u8 = 5;
        const ENXIO: u8 = 6;
        const EDOM: u8 = 33;

        let code = match self {
            Self::Configuration(_)     => EPERM,
            Self::CircularDependency(_) => ENXIO,
            Self::InvalidState(_)     => ENXIO,
            Self::Filesystem{..}      => ENOENT,
            Self::Integrity(_)        => EIO,
            Self::ChildFailed{status, ..} =>
                (*status).clamp(1, 255) as u8,
            Self::EmptyBuildOrder     => EDOM,
            Self::Internal(_)         => 134, // SIGABRT-like, assert-and-abort
        };

        ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn configuration_errors_map_to_eperm()
    {
        let err = Error::Configuration("duplicate target name".into());
        assert_eq!(format!("{:?}", err.exit_code()), format!("{:?}", ExitCode::from(1)));
    }

    #[test]
    fn circular_dependency_maps_to_enxio()
    {
        let err = Error::CircularDependency("A".into());
        assert_eq!(format!("{:?}", err.exit_code()), format!("{:?}", ExitCode::from(6)));
    }

    #[test]
    fn empty_build_order_maps_to_edom()
    {
        let err = Error::EmptyBuildOrder;
        assert_eq!(format!("{:?}", err.exit_code()), format!("{:?}", ExitCode::from(33)));
    }
}
