//! The redirection planner (spec §4.3): turns a stage's three redirection
//! slots into concrete fd overrides, applied on top of whatever pipe
//! connection the pipeline executor already lined up for that slot.
//!
//! `apply_in_child` runs from inside the `pre_exec` closure the executor
//! installs on each stage's `Command` — after fork, before exec, in the
//! child only. `std::process::Command` itself `dup2`s the pipe-provided
//! stdio onto fds 0/1/2 before running `pre_exec` closures, so by the time
//! this function runs those defaults are already in place and a redirect
//! target simply overrides them, matching "redirection always overrides
//! any pipe connection on the same slot" exactly.

use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::IntoRawFd;

use crate::ast::Redirections;

/// Open this stage's redirection targets and `dup2` them onto the
/// matching standard fd. Must run in the child, after fork and before
/// exec; any failure here is this child's own, not the pipeline's (spec
/// §7: "per-stage execution errors in a child terminate only that
/// child").
pub fn apply_in_child(redirections: &Redirections) -> io::Result<()> {
    if let Some(target) = &redirections.stdin {
        let file = std::fs::File::open(&target.path)?;
        dup_onto(file.into_raw_fd(), libc::STDIN_FILENO)?;
    }
    if let Some(target) = &redirections.stdout {
        let file = open_output(&target.path, target.append)?;
        dup_onto(file.into_raw_fd(), libc::STDOUT_FILENO)?;
    }
    if let Some(target) = &redirections.stderr {
        let file = open_output(&target.path, target.append)?;
        dup_onto(file.into_raw_fd(), libc::STDERR_FILENO)?;
    }
    Ok(())
}

/// Created files get a fixed `0644` regardless of the caller's umask
/// (spec §4.3 redirection table).
fn open_output(path: &str, append: bool) -> io::Result<std::fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(0o644);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options.open(path)
}

fn dup_onto(fd: libc::c_int, target: libc::c_int) -> io::Result<()> {
    let result = if fd == target {
        Ok(())
    } else if unsafe { libc::dup2(fd, target) } < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    };
    unsafe { libc::close(fd) };
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RedirectTarget;

    #[test]
    fn absent_slots_are_a_no_op() {
        let redirs = Redirections::default();
        assert!(apply_in_child(&redirs).is_ok());
    }

    #[test]
    fn stdout_redirection_creates_file_with_fixed_mode() {
        let dir = std::env::temp_dir().join(format!("jobsh-redirect-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.txt");

        // Exercised via `open_output` directly: `apply_in_child` dup2's
        // onto real fd 1/2, which would clobber the test harness's own
        // stdout/stderr if run here.
        let file = open_output(&path.to_string_lossy(), false).unwrap();
        drop(file);
        assert!(path.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o644);
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_stdin_file_is_an_io_error() {
        let mut redirs = Redirections::default();
        redirs.stdin = Some(RedirectTarget::new(
            "/nonexistent/definitely-not-here".to_string(),
            false,
        ));
        assert!(apply_in_child(&redirs).is_err());
    }
}
