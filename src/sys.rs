//! Low-level POSIX process-group, terminal, and signal-mask wrappers
//! (spec §4.5, §5). Grounded in the teacher's `job_control.rs`: the same
//! `setpgid`/`tcsetpgrp`/`ForegroundTerminalGuard` shapes, extended with
//! the `SIGCHLD`-blocking helpers the reaper's race-prevention strategy
//! needs (spec §5 "Race prevention").

#![cfg(unix)]

use std::io;

/// Block `SIGCHLD` for the lifetime of the guard, restoring the previous
/// mask on drop. Brackets every critical section that mutates the job
/// table from the main line (spec §5: "all main-line mutation of the
/// table ... brackets the critical section by blocking and later
/// restoring the child-exit signal").
pub struct SigchldBlockGuard {
    previous: libc::sigset_t,
}

impl SigchldBlockGuard {
    pub fn acquire() -> Self {
        unsafe {
            let mut block: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut block);
            libc::sigaddset(&mut block, libc::SIGCHLD);

            let mut previous: libc::sigset_t = std::mem::zeroed();
            libc::sigprocmask(libc::SIG_BLOCK, &block, &mut previous);
            Self { previous }
        }
    }
}

impl Drop for SigchldBlockGuard {
    fn drop(&mut self) {
        unsafe {
            libc::sigprocmask(libc::SIG_SETMASK, &self.previous, std::ptr::null_mut());
        }
    }
}

/// Suspend the calling thread until a signal is delivered, with `SIGCHLD`
/// the only signal unblocked during the suspension. Used by the
/// foreground-wait loop so the only thing that can wake the shell is the
/// reaper having run (spec §5 "the foreground wait blocks on a
/// signal-suspend primitive that delivers only the child-exit signal").
pub fn sigsuspend_for_sigchld() {
    unsafe {
        let mut mask: libc::sigset_t = std::mem::zeroed();
        libc::sigprocmask(libc::SIG_SETMASK, std::ptr::null(), &mut mask);
        libc::sigdelset(&mut mask, libc::SIGCHLD);
        libc::sigsuspend(&mask);
    }
}

pub fn set_process_group(pid: libc::pid_t, pgid: libc::pid_t) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::setpgid(pid, pgid) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(code) if code == libc::EINTR => continue,
            // Already exec'd or gone; the racing setpgid on the other side
            // of fork already settled this — not a real failure.
            Some(code) if code == libc::EACCES || code == libc::ESRCH => return Ok(()),
            _ => return Err(err),
        }
    }
}

pub fn send_continue_to_group(pgid: libc::pid_t) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid process group id",
        ));
    }

    loop {
        let rc = unsafe { libc::kill(-pgid, libc::SIGCONT) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// Transfers terminal foreground control to `target_pgid` for its
/// lifetime, restoring the shell's own process group on drop — including
/// on every fatal-error early return, since `Drop` always runs.
pub struct ForegroundTerminalGuard {
    tty_fd: Option<libc::c_int>,
    shell_pgid: libc::pid_t,
}

impl ForegroundTerminalGuard {
    pub fn new(target_pgid: libc::pid_t) -> io::Result<Self> {
        let tty_fd = if unsafe { libc::isatty(libc::STDIN_FILENO) } == 1 {
            Some(libc::STDIN_FILENO)
        } else {
            None
        };

        let shell_pgid = unsafe { libc::getpgrp() };
        let guard = Self { tty_fd, shell_pgid };

        if let Some(fd) = guard.tty_fd {
            set_terminal_foreground(fd, target_pgid)?;
        }

        Ok(guard)
    }
}

impl Drop for ForegroundTerminalGuard {
    fn drop(&mut self) {
        if let Some(fd) = self.tty_fd {
            let _ = set_terminal_foreground(fd, self.shell_pgid);
        }
    }
}

struct SignalIgnoreGuard {
    signal: libc::c_int,
    previous: libc::sighandler_t,
}

impl SignalIgnoreGuard {
    fn ignore(signal: libc::c_int) -> io::Result<Self> {
        let previous = unsafe { libc::signal(signal, libc::SIG_IGN) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { signal, previous })
    }
}

impl Drop for SignalIgnoreGuard {
    fn drop(&mut self) {
        unsafe {
            libc::signal(self.signal, self.previous);
        }
    }
}

fn set_terminal_foreground(fd: libc::c_int, pgid: libc::pid_t) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid process group id",
        ));
    }

    // tcsetpgrp() delivers SIGTTOU to a background caller; the shell is
    // the one calling it here so that signal must be suppressed for the
    // duration or the shell would stop itself.
    let _sigttou = SignalIgnoreGuard::ignore(libc::SIGTTOU)?;
    loop {
        let rc = unsafe { libc::tcsetpgrp(fd, pgid) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// Reset the signal dispositions a forked child must not inherit from the
/// shell back to their defaults. Called from `pre_exec`, so this runs
/// after fork and before exec in the child only.
pub fn restore_child_signal_dispositions() -> io::Result<()> {
    let signals = [
        libc::SIGINT,
        libc::SIGQUIT,
        libc::SIGTSTP,
        libc::SIGTTIN,
        libc::SIGTTOU,
        libc::SIGPIPE,
        libc::SIGCHLD,
    ];
    for &sig in &signals {
        if unsafe { libc::signal(sig, libc::SIG_DFL) } == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Clear every signal out of the calling process's blocked set. A signal
/// *mask*, unlike a disposition, survives `execve`: a child forked while
/// the shell holds [`SigchldBlockGuard`] would otherwise start life with
/// `SIGCHLD` permanently blocked, which breaks any child that itself
/// forks and waits on its own children (a nested shell, `make -j`).
/// Called from `pre_exec` alongside `restore_child_signal_dispositions`.
pub fn unblock_all_signals() -> io::Result<()> {
    unsafe {
        let mut empty: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut empty);
        if libc::sigprocmask(libc::SIG_SETMASK, &empty, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
