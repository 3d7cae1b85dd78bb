//! Splitting separator-delimited configuration strings into argument
//! vectors.

use crate::{error::{Error, Result}, path::canonicalize};
use std::path::Path;

/// The shell-fragment separator used to split hook commands.
///
/// Unlike the per-target token separator, this one is always `&&` and
/// is not user-configurable.
pub const COMMAND_SEPARATOR: &str = "&&";

/// Validate a user-supplied token separator.
///
/// The separator must be exactly one character. This rejects both the
/// empty string and multi-character strings, matching the spec's
/// "NULL or multi-character separators are a fatal configuration
/// error".
pub fn validate_separator(s: &str) -> Result<char>
{
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::Configuration(format!(
            "separator must be exactly one character, got {s:?}"
        ))),
    }
}

/// Split `s` on `separator` into an argument vector.
///
/// Each token becomes one output element equal to
/// `prefix ++ maybe_canonicalize(token)`. `prefix` is prepended
/// verbatim (e.g. `-I`, `-l`, `-o`, or the empty string). When
/// `path_expand` is set, each token is canonicalized to an absolute
/// path; canonicalization failures fall back to the raw token rather
/// than aborting (see [`canonicalize`]).
///
/// Empty tokens (from a leading/trailing/doubled separator) are
/// dropped; this ensures the round-trip property
/// `tokenize_to_argv(join(tokens, sep), sep, "", false) == tokens`
/// holds for any `tokens` that themselves contain no empty strings.
pub fn tokenize_to_argv(
    s: &str,
    separator: char,
    prefix: &str,
    path_expand: bool,
) -> Vec<String>
{
    s.split(separator)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let token = if path_expand {
                canonicalize(Path::new(token)).to_string_lossy().into_owned()
            } else {
                token.to_owned()
            };
            format!("{prefix}{token}")
        })
        .collect()
}

/// Split a hook's shell pipeline on [`COMMAND_SEPARATOR`] into
/// individual command fragments, trimming surrounding whitespace from
/// each fragment.
pub fn split_commands(s: &str) -> Vec<String>
{
    s.split(COMMAND_SEPARATOR)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn splits_on_separator()
    {
        let argv = tokenize_to_argv("a.c b.c c.c", ' ', "", false);
        assert_eq!(argv, vec!["a.c", "b.c", "c.c"]);
    }

    #[test]
    fn applies_prefix()
    {
        let argv = tokenize_to_argv("include lib", ' ', "-I", false);
        assert_eq!(argv, vec!["-Iinclude", "-Ilib"]);
    }

    #[test]
    fn round_trips_without_path_expansion()
    {
        let tokens = vec!["foo", "bar", "baz"];
        let joined = tokens.join(",");
        let argv = tokenize_to_argv(&joined, ',', "", false);
        assert_eq!(argv, tokens);
    }

    #[test]
    fn rejects_multi_char_separator_string()
    {
        assert!(validate_separator("::").is_err());
        assert!(validate_separator("").is_err());
        assert!(validate_separator(" ").is_ok());
    }

    #[test]
    fn splits_hook_commands_on_double_ampersand()
    {
        let commands = split_commands("echo a && echo b &&echo c");
        assert_eq!(commands, vec!["echo a", "echo b", "echo c"]);
    }
}
