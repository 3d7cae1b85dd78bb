//! Spawning and waiting for child processes.

use {
    crate::retry_on_eintr,
    std::{
        ffi::CString,
        io,
        os::unix::process::ExitStatusExt,
        process::ExitStatus,
        ptr::null,
    },
};

/// Identifies a running or exited child process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pid(libc::pid_t);

impl Pid
{
    /// The raw process ID, as returned by fork(2).
    pub fn as_raw(self) -> libc::pid_t
    {
        self.0
    }
}

/// Fork a child process that execs `argv[0]` with the given arguments.
///
/// `argv[0]` is searched for in `PATH` as execvp(3) does.
/// If the child's execvp(3) call fails, the child exits with status 127
/// rather than silently returning into the parent's code.
///
/// # Panics
///
/// Panics if `argv` is empty.
pub fn spawn(argv: &[CString]) -> io::Result<Pid>
{
    assert!(!argv.is_empty(), "argv must contain at least argv[0]");

    // Build the argv array the child will pass to execvp(3).
    // This must happen before forking: no allocation is allowed
    // on the child's side of the fork before it execs or exits.
    let mut c_argv: Vec<*const libc::c_char> =
        argv.iter().map(|a| a.as_ptr()).collect();
    c_argv.push(null());

    // SAFETY: fork(2) is always safe to call.
    let pid = unsafe { libc::fork() };

    if pid == 0 {
        // SAFETY: c_argv is a nul-terminated array of C strings,
        // matching what execvp(3) expects.
        unsafe { libc::execvp(c_argv[0], c_argv.as_ptr()) };

        // execvp(3) only returns on failure.
        // We're now past the point where unwinding into the parent's
        // frames would be safe, so terminate immediately.
        unsafe { libc::_exit(127) };
    }

    if pid == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(Pid(pid))
}

/// Wait for a specific child process to terminate.
///
/// Returns its [`ExitStatus`].
pub fn waitpid(pid: Pid) -> io::Result<ExitStatus>
{
    retry_on_eintr(|| {
        let mut wstatus = 0;

        // SAFETY: This is always safe.
        let result = unsafe { libc::waitpid(pid.0, &mut wstatus, 0) };

        if result == -1 {
            return Err(io::Error::last_os_error());
        }

        Ok(ExitStatus::from_raw(wstatus))
    })
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn spawn_and_wait_success()
    {
        let argv = [CString::new("true").unwrap()];
        let pid = spawn(&argv).unwrap();
        let status = waitpid(pid).unwrap();
        assert!(status.success());
    }

    #[test]
    fn spawn_and_wait_failure()
    {
        let argv = [CString::new("false").unwrap()];
        let pid = spawn(&argv).unwrap();
        let status = waitpid(pid).unwrap();
        assert!(!status.success());
    }

    #[test]
    fn spawn_exec_failure_exits_127()
    {
        let argv = [CString::new("this-program-does-not-exist-anywhere").unwrap()];
        let pid = spawn(&argv).unwrap();
        let status = waitpid(pid).unwrap();
        assert_eq!(status.code(), Some(127));
    }
}
