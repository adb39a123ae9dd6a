//! The Pipeline executor (spec §4.5): forks every stage into a shared
//! process group, wires pipes and redirections, and hands the finished
//! pipeline to the job table. Grounded in the teacher's
//! `execute_pipeline`, generalized from the teacher's unbounded
//! here-string/chain-operator model down to this shell's plain
//! pipe-and-redirect grammar, and reworked around the fixed-size
//! [`crate::jobs::JobTable`] instead of a `HashMap` of live `Child`
//! handles, since job state here is shared with the async reaper.
//!
//! Path resolution and redirection application happen inside each
//! stage's `pre_exec` closure rather than in this parent-side loop (spec
//! §4.5 step 5(g)/(h), §7): a stage whose target can't be resolved or
//! whose redirection can't be opened exits with its own conventional
//! code (127/1) without the parent ever seeing an error, so sibling
//! stages fork and run normally — `nosuchcmd | wc -l` still runs `wc -l`
//! against an empty pipe.

use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use os_pipe::{PipeReader, pipe};

use crate::ast::Pipeline;
use crate::builtins;
use crate::diagnostics;
use crate::jobs::{JobState, JobTable, MAX_PROCS};
use crate::path;
use crate::redirect;
use crate::sys;

pub enum Outcome {
    Continue,
    Exit(i32),
}

/// Run one parsed pipeline to completion (or, for a background pipeline,
/// to registration). Returns the outcome for the main loop plus the new
/// `last_exit_code`.
pub fn execute(pipeline: &Pipeline, job_table: &mut JobTable, program_name: &str) -> (Outcome, i32) {
    notify_pending(job_table, program_name);

    if pipeline.commands.len() == 1
        && pipeline.commands[0].redirections.is_empty()
        && !pipeline.background
        && builtins::is_builtin(pipeline.commands[0].program())
    {
        return match builtins::dispatch(&pipeline.commands[0], job_table, program_name) {
            builtins::BuiltinOutcome::Continue(code) => (Outcome::Continue, code),
            builtins::BuiltinOutcome::Exit(code) => (Outcome::Exit(code), code),
        };
    }

    if pipeline.commands.len() > MAX_PROCS {
        diagnostics::report(program_name, None, "too many pipeline stages");
        return (Outcome::Continue, 1);
    }

    let code = launch(pipeline, job_table, program_name);
    (Outcome::Continue, code)
}

/// Print any Stopped/Done state changes the reaper has recorded since
/// the last pass, removing Done jobs once reported (spec §4.5 step 1).
pub fn notify_pending(job_table: &mut JobTable, _program_name: &str) {
    let _block = sys::SigchldBlockGuard::acquire();

    let pending = job_table.pending_notifications();
    for jid in pending {
        let Some(line) = job_table.notification_line(jid) else {
            continue;
        };
        println!("{line}");

        let done = job_table.by_jid(jid).map(|j| j.state) == Some(JobState::Done);
        if done {
            job_table.remove(jid);
        } else if let Some(job) = job_table.by_jid_mut(jid) {
            job.notified = true;
        }
    }
}

/// Wait for the foreground job `jid` to leave Running, transferring
/// terminal control to its process group for the duration and restoring
/// the shell's own group control unconditionally on return (spec §4.5
/// step 8, reused by the `fg` builtin).
pub fn wait_foreground(job_table: &mut JobTable, jid: usize, program_name: &str) -> i32 {
    let pgid = match job_table.by_jid(jid) {
        Some(job) => job.pgid,
        None => return 0,
    };

    let terminal_guard = match sys::ForegroundTerminalGuard::new(pgid) {
        Ok(guard) => Some(guard),
        Err(e) => {
            diagnostics::report_io(program_name, None, "failed to move terminal to job", &e);
            None
        }
    };

    loop {
        let state = match job_table.by_jid(jid) {
            Some(job) => job.state,
            None => break,
        };
        if state != JobState::Running {
            break;
        }
        sys::sigsuspend_for_sigchld();
    }

    drop(terminal_guard);

    let _block = sys::SigchldBlockGuard::acquire();
    let code = match job_table.by_jid(jid) {
        Some(job) if job.state == JobState::Done => {
            let code = job.exit_code();
            job_table.remove(jid);
            code
        }
        Some(_) => {
            if let Some(job) = job_table.by_jid_mut(jid) {
                job.notified = false;
            }
            0
        }
        None => 0,
    };
    drop(_block);

    notify_pending(job_table, program_name);
    code
}

fn launch(pipeline: &Pipeline, job_table: &mut JobTable, program_name: &str) -> i32 {
    let block = sys::SigchldBlockGuard::acquire();

    let mut pids: Vec<libc::pid_t> = Vec::with_capacity(pipeline.commands.len());
    let mut pgid: libc::pid_t = 0;
    let mut terminal_guard: Option<sys::ForegroundTerminalGuard> = None;
    let mut prev_reader: Option<PipeReader> = None;

    let stage_count = pipeline.commands.len();
    for (idx, command) in pipeline.commands.iter().enumerate() {
        let is_last = idx + 1 == stage_count;

        let stdin_default = match prev_reader.take() {
            Some(reader) => Stdio::from(reader),
            None => Stdio::inherit(),
        };

        let (stdout_default, next_reader) = if is_last {
            (Stdio::inherit(), None)
        } else {
            match pipe() {
                Ok((reader, writer)) => (Stdio::from(writer), Some(reader)),
                Err(e) => {
                    reap_unregistered(&pids);
                    diagnostics::report_io(program_name, None, "failed to create pipe", &e);
                    drop(block);
                    return 1;
                }
            }
        };

        // `command.program()` here is never actually exec'd by `Command`
        // itself — the `pre_exec` closure below always either self-execs
        // the resolved path or exits the child directly, so this value is
        // only a placeholder `Command` needs to be constructed at all.
        let mut process = Command::new(command.program());
        process.args(command.args());
        process.stdin(stdin_default);
        process.stdout(stdout_default);
        process.stderr(Stdio::inherit());

        let captured_pgid = if pgid == 0 { None } else { Some(pgid) };
        let redirections = command.redirections.clone();
        let argv = command.argv.clone();
        let program_name_owned = program_name.to_string();
        unsafe {
            process.pre_exec(move || {
                sys::restore_child_signal_dispositions()?;
                sys::unblock_all_signals()?;
                let target = captured_pgid.unwrap_or(0);
                if libc::setpgid(0, target) != 0 {
                    return Err(std::io::Error::last_os_error());
                }

                if let Err(e) = redirect::apply_in_child(&redirections) {
                    diagnostics::report_io(
                        &program_name_owned,
                        None,
                        &format!("{}: redirection failed", argv[0]),
                        &e,
                    );
                    std::process::exit(1);
                }

                match path::resolve(&argv[0]) {
                    Ok(resolved) => {
                        let err = Command::new(&resolved).args(&argv[1..]).exec();
                        diagnostics::report_io(
                            &program_name_owned,
                            None,
                            &format!("{}: failed to execute", argv[0]),
                            &err,
                        );
                        std::process::exit(126);
                    }
                    Err(_) => {
                        diagnostics::report(
                            &program_name_owned,
                            None,
                            &format!("{}: command not found", argv[0]),
                        );
                        std::process::exit(127);
                    }
                }
            });
        }

        let child = match process.spawn() {
            Ok(child) => child,
            Err(e) => {
                reap_unregistered(&pids);
                diagnostics::report_io(
                    program_name,
                    None,
                    &format!("{}: failed to fork", command.program()),
                    &e,
                );
                drop(block);
                return 1;
            }
        };

        let pid = child.id() as libc::pid_t;
        // The Child handle is intentionally dropped here: this shell's
        // child-exit notifications all flow through the async reaper's
        // waitpid(-1, ...), never through Child::wait/try_wait, so
        // retaining the handle would just invite a second, racing reaper.
        drop(child);

        if pgid == 0 {
            pgid = pid;
        }
        if let Err(e) = sys::set_process_group(pid, pgid) {
            diagnostics::report_io(program_name, None, "failed to join process group", &e);
        }

        if idx == 0 && !pipeline.background {
            terminal_guard = match sys::ForegroundTerminalGuard::new(pgid) {
                Ok(guard) => Some(guard),
                Err(e) => {
                    diagnostics::report_io(
                        program_name,
                        None,
                        "failed to move terminal to pipeline",
                        &e,
                    );
                    None
                }
            };
        }

        pids.push(pid);
        prev_reader = next_reader;
    }

    let last_pid = *pids.last().unwrap_or(&0);
    let jid = match job_table.add(pgid, &pids, last_pid, pipeline.printable()) {
        Ok(jid) => jid,
        Err(e) => {
            diagnostics::report_err(program_name, None, &e);
            drop(terminal_guard);
            drop(block);
            return 1;
        }
    };

    drop(block);

    if pipeline.background {
        drop(terminal_guard);
        println!("[{jid}] {pgid}");
        return 0;
    }

    wait_foreground(job_table, jid, program_name)
}

fn reap_unregistered(pids: &[libc::pid_t]) {
    for &pid in pids {
        let mut status: libc::c_int = 0;
        unsafe {
            libc::waitpid(pid, &mut status, 0);
        }
    }
}
