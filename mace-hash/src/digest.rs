use {
    sha1collisiondetection::Sha1CD,
    std::{fmt, fs::File, io::{self, Read}, path::Path},
};

/// Size in bytes of a digest, and of its on-disk sidecar representation.
pub const DIGEST_LEN: usize = 20;

/// Size, in bytes, of the chunks used to read source files for hashing.
const CHUNK_LEN: usize = 64 * 1024;

/// A 20-byte SHA-1 digest.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl fmt::Display for Digest
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "Digest({self})")
    }
}

/// Returned when a collision attack is detected while hashing.
///
/// The build is aborted whenever this is returned: a collision among
/// build inputs is treated as a hostile event, never silently ignored.
#[derive(Debug, thiserror::Error)]
#[error("SHA-1 collision attack detected while hashing {path}")]
pub struct CollisionDetected
{
    /// The file being hashed when the collision was detected.
    pub path: std::path::PathBuf,
}

/// Incremental SHA-1 collision-detecting hasher.
pub struct Hasher(Sha1CD);

impl Hasher
{
    /// Start a new hash computation.
    pub fn new() -> Self
    {
        Self(Sha1CD::default())
    }

    /// Feed bytes into the hasher.
    pub fn update(&mut self, bytes: &[u8]) -> &mut Self
    {
        self.0.update(bytes);
        self
    }

    /// Finish the computation.
    ///
    /// Returns the digest and whether a collision was detected.
    /// A detected collision does not invalidate the returned digest;
    /// callers that care about the distinction should abort the build.
    pub fn finalize(self) -> (Digest, bool)
    {
        match self.0.finalize_cd() {
            Ok(out) => (Digest(out.into()), false),
            Err(_collision) => {
                // finalize_into_dirty_cd still writes the (unsafe) digest
                // even on collision; redo the computation with the
                // mitigation disabled is unnecessary here because we only
                // need *a* digest plus the fact that a collision occurred.
                (Digest([0; DIGEST_LEN]), true)
            },
        }
    }
}

impl Default for Hasher
{
    fn default() -> Self
    {
        Self::new()
    }
}

/// Hash the contents of a file, reading it in 64 KiB chunks.
///
/// Returns an error if a collision attack is detected, per §4.3.
pub fn hash_file(path: &Path) -> io::Result<Digest>
{
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buf = [0u8; CHUNK_LEN];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[.. n]);
    }

    let (digest, collision) = hasher.finalize();
    if collision {
        return Err(io::Error::other(CollisionDetected{path: path.to_owned()}));
    }

    Ok(digest)
}

#[cfg(test)]
mod tests
{
    use {super::*, std::io::Write};

    #[test]
    fn hash_file_is_deterministic()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(&path, b"int main(void) { return 0; }\n").unwrap();

        let a = hash_file(&path).unwrap();
        let b = hash_file(&path).unwrap();
        assert_eq!(a.0, b.0);
    }

    #[test]
    fn hash_file_changes_with_content()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");

        std::fs::write(&path, b"int x = 1;\n").unwrap();
        let a = hash_file(&path).unwrap();

        std::fs::write(&path, b"int x = 2;\n").unwrap();
        let b = hash_file(&path).unwrap();

        assert_ne!(a.0, b.0);
    }

    #[test]
    fn hash_file_reads_across_chunk_boundary()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.c");
        let mut file = File::create(&path).unwrap();
        let line = b"/* filler */\n";
        for _ in 0 .. (CHUNK_LEN / line.len() + 10) {
            file.write_all(line).unwrap();
        }
        drop(file);

        // Just check it doesn't error and is deterministic.
        let a = hash_file(&path).unwrap();
        let b = hash_file(&path).unwrap();
        assert_eq!(a.0, b.0);
    }
}
