//! The Reaper (spec §4.7): the `SIGCHLD` handler. Everything here runs
//! inside an asynchronous signal context, so it performs no allocation
//! and no stdout/stderr I/O, and it saves/restores `errno` around its
//! system calls — the teacher's job-control code instead reaps
//! synchronously from the main line (`job_control::wait_for_pid`), so
//! this module has no direct teacher counterpart; it is built from the
//! async-signal-safety constraints spec §4.7/§9 spell out directly.

use crate::jobs::{JobState, JobTable};

#[cfg(unix)]
static mut TABLE_PTR: *mut JobTable = std::ptr::null_mut();

/// Point the reaper at the process's one job table. Must be called once,
/// before the signal handler is installed, from the main line only.
#[cfg(unix)]
pub fn install(table: &mut JobTable) {
    unsafe {
        TABLE_PTR = table as *mut JobTable;
    }
}

#[cfg(target_os = "linux")]
unsafe fn errno_location() -> *mut libc::c_int {
    unsafe { libc::__errno_location() }
}

#[cfg(target_os = "macos")]
unsafe fn errno_location() -> *mut libc::c_int {
    unsafe { libc::__error() }
}

/// Installed as the process's `SIGCHLD` handler. Async-signal-safe: the
/// only state it touches is the fixed-size `JobTable` behind `TABLE_PTR`,
/// and every field it writes (`state`, `last_status`, `alive`,
/// `notified`) is a plain `Copy` value.
#[cfg(unix)]
pub extern "C" fn sigchld_handler(_signum: libc::c_int) {
    let saved_errno = unsafe { *errno_location() };

    let table = unsafe { TABLE_PTR.as_mut() };
    if let Some(table) = table {
        reap_all(table);
    }

    unsafe {
        *errno_location() = saved_errno;
    }
}

#[cfg(unix)]
fn reap_all(table: &mut JobTable) {
    loop {
        let mut raw_status: libc::c_int = 0;
        let pid = unsafe {
            libc::waitpid(
                -1,
                &mut raw_status,
                libc::WNOHANG | libc::WUNTRACED | libc::WCONTINUED,
            )
        };

        if pid <= 0 {
            break;
        }

        let Some(job) = table.by_pid_mut(pid) else {
            continue;
        };

        if unsafe { libc::WIFSTOPPED(raw_status) } {
            job.state = JobState::Stopped;
            job.notified = false;
        } else if unsafe { libc::WIFCONTINUED(raw_status) } {
            job.state = JobState::Running;
            job.notified = false;
        } else {
            // Exited or signaled: one fewer live process in this job.
            if pid == job.last_pid {
                job.last_status = raw_status;
                job.last_status_valid = true;
            }
            job.alive = job.alive.saturating_sub(1);
            if job.alive == 0 {
                job.state = JobState::Done;
                job.notified = false;
            }
        }
    }
}
