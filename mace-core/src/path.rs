//! Path classification and glob expansion.

use {
    crate::error::{Error, Result},
    std::path::{Path, PathBuf},
};

/// True iff `p` has the `.c` extension.
pub fn is_source(p: &Path) -> bool
{
    p.extension().is_some_and(|ext| ext == "c")
}

/// True iff `p` has the `.o` extension.
pub fn is_object(p: &Path) -> bool
{
    p.extension().is_some_and(|ext| ext == "o")
}

/// True iff `p` is a directory on disk.
pub fn is_dir(p: &Path) -> bool
{
    p.is_dir()
}

/// True iff `s` contains a `*`, i.e. looks like a glob pattern.
pub fn is_wildcard(s: &str) -> bool
{
    s.contains('*')
}

/// Expand a glob pattern into the ordered list of paths it matches.
///
/// A pattern that matches nothing is itself a fatal error: an explicit
/// pattern in the user's build description that matches no files is
/// almost always a mistake, not an intentionally-empty set.
pub fn glob(pattern: &str) -> Result<Vec<PathBuf>>
{
    let paths = ::glob::glob(pattern).map_err(|err| {
        Error::Configuration(format!("bad glob pattern {pattern:?}: {err}"))
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            Error::Filesystem{path: err.path().to_owned(), source: err.into()}
        })?;
        matches.push(path);
    }

    if matches.is_empty() {
        return Err(Error::Configuration(
            format!("glob pattern {pattern:?} matched no files"),
        ));
    }

    Ok(matches)
}

/// Expand a directory into the glob of every `.c` source beneath it.
pub fn glob_dir(dir: &Path) -> Result<Vec<PathBuf>>
{
    let pattern = dir.join("**").join("*.c");
    let pattern = pattern.to_str().ok_or_else(|| {
        Error::Configuration(format!("{dir:?} is not valid UTF-8"))
    })?;
    glob(pattern)
}

/// Canonicalize a path to an absolute path.
///
/// On failure, returns the input path unchanged; callers that use this
/// for exclusion lists should warn rather than abort, since an
/// exclusion that cannot be canonicalized simply fails to exclude
/// anything rather than corrupting the build.
pub fn canonicalize(p: &Path) -> PathBuf
{
    std::fs::canonicalize(p).unwrap_or_else(|_| p.to_owned())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn classifies_sources_and_objects()
    {
        assert!(is_source(Path::new("foo.c")));
        assert!(!is_source(Path::new("foo.h")));
        assert!(is_object(Path::new("foo.o")));
        assert!(!is_object(Path::new("foo.c")));
    }

    #[test]
    fn detects_wildcards()
    {
        assert!(is_wildcard("src/*.c"));
        assert!(!is_wildcard("src/main.c"));
    }

    #[test]
    fn canonicalize_falls_back_on_failure()
    {
        let bogus = Path::new("/this/path/does/not/exist/anywhere");
        assert_eq!(canonicalize(bogus), bogus);
    }

    #[test]
    fn glob_finds_matches_in_a_temp_dir()
    {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.c"), "").unwrap();
        std::fs::write(dir.path().join("b.c"), "").unwrap();
        std::fs::write(dir.path().join("c.h"), "").unwrap();

        let pattern = dir.path().join("*.c");
        let matches = glob(pattern.to_str().unwrap()).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn glob_errors_on_no_match()
    {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("*.nonexistent");
        assert!(glob(pattern.to_str().unwrap()).is_err());
    }

    #[test]
    fn glob_dir_descends_recursively()
    {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("top.c"), "").unwrap();
        std::fs::write(dir.path().join("sub/nested.c"), "").unwrap();

        let matches = glob_dir(dir.path()).unwrap();
        assert_eq!(matches.len(), 2);
    }
}
