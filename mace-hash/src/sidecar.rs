use {
    crate::{Digest, DIGEST_LEN},
    std::{fs, io, path::Path},
};

/// Error returned when a checksum sidecar file is corrupt.
///
/// A sidecar must be exactly [`DIGEST_LEN`] bytes; any other length
/// means the on-disk state is corrupted and the run must abort rather
/// than silently repair it (§7, Integrity errors).
#[derive(Debug, thiserror::Error)]
#[error("checksum sidecar {path} has length {len}, expected {DIGEST_LEN}")]
pub struct SidecarCorrupt
{
    /// Path to the offending sidecar file.
    pub path: std::path::PathBuf,
    /// The length actually found on disk.
    pub len: usize,
}

/// Read a checksum sidecar file.
///
/// Returns `Ok(None)` if the file does not exist, which the caller
/// should interpret as "changed". Returns an error if it exists but is
/// not exactly [`DIGEST_LEN`] bytes long.
pub fn read_sidecar(path: &Path) -> io::Result<Option<Digest>>
{
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    if bytes.len() != DIGEST_LEN {
        return Err(io::Error::other(SidecarCorrupt{
            path: path.to_owned(),
            len: bytes.len(),
        }));
    }

    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&bytes);
    Ok(Some(Digest(digest)))
}

/// Write a checksum sidecar file.
///
/// Always writes exactly [`DIGEST_LEN`] raw bytes, overwriting any
/// existing sidecar.
pub fn write_sidecar(path: &Path, digest: &Digest) -> io::Result<()>
{
    fs::write(path, digest.0)
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn tempfile(name: &str) -> std::path::PathBuf
    {
        let dir = std::env::temp_dir()
            .join(format!("mace-hash-sidecar-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn missing_sidecar_is_none()
    {
        let path = tempfile("missing.sha1");
        let _ = std::fs::remove_file(&path);
        assert!(read_sidecar(&path).unwrap().is_none());
    }

    #[test]
    fn round_trips_written_digest()
    {
        let path = tempfile("roundtrip.sha1");
        let digest = Digest([7; DIGEST_LEN]);
        write_sidecar(&path, &digest).unwrap();
        let read_back = read_sidecar(&path).unwrap().unwrap();
        assert_eq!(read_back.0, digest.0);
    }

    #[test]
    fn wrong_length_is_corrupt()
    {
        let path = tempfile("corrupt.sha1");
        std::fs::write(&path, b"too short").unwrap();
        let err = read_sidecar(&path).unwrap_err();
        assert!(err.to_string().contains("expected 20"));
    }
}
