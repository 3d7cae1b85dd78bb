//! Bounded-concurrency process pool.
//!
//! The engine has many independent child processes to run (one compile
//! per source, archive or link steps, hook commands) and wants at most
//! `jobs` of them running at once. This pool does the forking and
//! reaping; it does not interpret what the processes do or decide which
//! ones depend on which other ones, that's [`crate::engine`]'s job.

use {
    crate::error::{Error, Result},
    os_ext::{self, Pid},
    std::{collections::VecDeque, ffi::CString},
};

/// One unit of work submitted to the pool: a program name (used only
/// for error messages) and the argv to exec.
pub struct Job
{
    /// Human-readable name, used in [`Error::ChildFailed`] on failure.
    pub program: String,
    /// Full argument vector, including `argv[0]`.
    pub argv: Vec<CString>,
}

/// Run a batch of jobs with at most `jobs` running concurrently.
///
/// Jobs are started in the order they appear in `queue`. This function
/// returns as soon as any job fails (after waiting for the jobs already
/// in flight, so no children are left behind); it does not start any
/// job queued after the failing one.
pub fn run_bounded(mut queue: VecDeque<Job>, jobs: usize) -> Result<()>
{
    assert!(jobs > 0, "pool size must be at least 1");

    let mut in_flight: VecDeque<(Pid, String)> = VecDeque::with_capacity(jobs);
    let mut failure: Option<Error> = None;

    while !queue.is_empty() || !in_flight.is_empty() {
        while failure.is_none() && !queue.is_empty() && in_flight.len() < jobs {
            let job = queue.pop_front().unwrap();
            let pid = os_ext::spawn(&job.argv).map_err(|source| Error::Filesystem{
                path: job.program.clone().into(),
                source,
            })?;
            in_flight.push_back((pid, job.program));
        }

        // The oldest outstanding child is waited on first, per the
        // FIFO pool described in §4.6.
        if let Some((pid, program)) = in_flight.pop_front() {
            let status = os_ext::waitpid(pid).map_err(|source| Error::Filesystem{
                path: program.clone().into(),
                source,
            })?;

            if !status.success() && failure.is_none() {
                failure = Some(Error::ChildFailed{
                    program,
                    status: status.code().unwrap_or(-1),
                });
                queue.clear();
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn job(program: &str) -> Job
    {
        Job{
            program: program.into(),
            argv: vec![CString::new(program).unwrap()],
        }
    }

    #[test]
    fn runs_all_jobs_to_completion()
    {
        let queue = VecDeque::from([job("true"), job("true"), job("true")]);
        assert!(run_bounded(queue, 2).is_ok());
    }

    #[test]
    fn reports_failure_of_any_job()
    {
        let queue = VecDeque::from([job("true"), job("false"), job("true")]);
        assert!(matches!(run_bounded(queue, 2), Err(Error::ChildFailed{..})));
    }

    #[test]
    fn runs_with_a_single_slot()
    {
        let queue = VecDeque::from([job("true"), job("true")]);
        assert!(run_bounded(queue, 1).is_ok());
    }
}
