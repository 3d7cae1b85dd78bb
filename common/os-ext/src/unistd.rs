use {
    crate::retry_on_eintr,
    std::{
        ffi::{CStr, CString},
        io,
        os::unix::ffi::OsStrExt,
        path::Path,
    },
};

/// Call chdir(2).
pub fn chdir(path: &Path) -> io::Result<()>
{
    let path = CString::new(path.as_os_str().as_bytes())?;

    retry_on_eintr(|| {
        // SAFETY: path is NUL-terminated.
        let result = unsafe { libc::chdir(path.as_ptr()) };

        if result == -1 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    })
}

/// Call getcwd(3), returning the current working directory.
pub fn getcwd() -> io::Result<std::path::PathBuf>
{
    use std::os::unix::ffi::OsStringExt;

    let mut buf: Vec<u8> = Vec::with_capacity(256);

    loop {
        // SAFETY: buf has the capacity reported to getcwd(3).
        let ptr = unsafe {
            libc::getcwd(buf.as_mut_ptr() as *mut libc::c_char, buf.capacity())
        };

        if !ptr.is_null() {
            // SAFETY: getcwd(3) wrote a NUL-terminated string within buf's capacity.
            let len = unsafe { CStr::from_ptr(buf.as_ptr() as *const libc::c_char) }.to_bytes().len();
            unsafe { buf.set_len(len); }
            return Ok(std::ffi::OsString::from_vec(buf).into());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ERANGE) {
            return Err(err);
        }
        buf.reserve(buf.capacity());
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn chdir_and_getcwd_roundtrip()
    {
        let original = getcwd().unwrap();
        let dir = std::env::temp_dir()
            .join(format!("os-ext-chdir-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        chdir(&dir).unwrap();
        let canonical_dir = std::fs::canonicalize(&dir).unwrap();
        assert_eq!(getcwd().unwrap(), canonical_dir);

        chdir(&original).unwrap();
    }
}
