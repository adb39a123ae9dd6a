//! Signal setup (spec §4.9 component table entry "Signal setup"):
//! installs the shell's own signal dispositions at startup. Grounded in
//! the teacher's `main.rs` `ctrlc::set_handler` call and `executor.rs`
//! `pre_exec` signal-reset list, but using raw `sigaction` instead of the
//! `ctrlc` crate: the teacher's naive `SIG_IGN`-style handling doesn't
//! give a blocking `read()` the `EINTR` this shell's main loop (§10)
//! relies on to abandon an in-progress line on Ctrl-C, since POSIX only
//! interrupts a blocking syscall for a signal with a real handler
//! installed, not one that is merely ignored.

#![cfg(unix)]

use std::io;
use std::mem::MaybeUninit;

use crate::reaper;

/// Install every disposition the interactive shell itself needs:
/// - `SIGCHLD`: the async reaper, with `SA_RESTART` so other blocking
///   calls the shell makes aren't spuriously interrupted by a child
///   status change.
/// - `SIGINT`: a handler that does nothing but exist — its only job is
///   to make a blocking `read()` return `EINTR` so the main loop can
///   abandon the current line and redraw the prompt. No `SA_RESTART`.
/// - `SIGQUIT`, `SIGTSTP`, `SIGTTIN`, `SIGTTOU`: ignored in the shell
///   itself; children restore these to default before exec (see
///   `sys::restore_child_signal_dispositions`) so terminal-generated
///   signals still reach foreground pipelines normally.
pub fn install(table: &mut crate::jobs::JobTable) -> io::Result<()> {
    reaper::install(table);
    install_sigchld_handler()?;
    install_noop_sigint_handler()?;
    for &sig in &[libc::SIGQUIT, libc::SIGTSTP, libc::SIGTTIN, libc::SIGTTOU] {
        ignore(sig)?;
    }
    Ok(())
}

fn install_sigchld_handler() -> io::Result<()> {
    unsafe {
        let mut action: libc::sigaction = MaybeUninit::zeroed().assume_init();
        action.sa_sigaction = reaper::sigchld_handler as usize;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = libc::SA_RESTART;

        if libc::sigaction(libc::SIGCHLD, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

extern "C" fn noop_sigint_handler(_signum: libc::c_int) {}

fn install_noop_sigint_handler() -> io::Result<()> {
    unsafe {
        let mut action: libc::sigaction = MaybeUninit::zeroed().assume_init();
        action.sa_sigaction = noop_sigint_handler as usize;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = 0;

        if libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn ignore(signal: libc::c_int) -> io::Result<()> {
    if unsafe { libc::signal(signal, libc::SIG_IGN) } == libc::SIG_ERR {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
