//! Builtins (spec §4.8): `cd`, `exit`, `jobs`, `fg`, `bg` — the parent-side
//! commands that read or mutate the shell's own state. Grounded in the
//! teacher's `builtins.rs` dispatch shape, narrowed to this shell's five
//! job-control-aware builtins (the teacher's `pwd`/`echo`/`export`/
//! `unset`/`type` have no counterpart here — ordinary external `pwd(1)`,
//! `echo(1)`, etc. cover that ground, and env-var export/interpolation is
//! an explicit non-goal).

use crate::ast::Command;
use crate::diagnostics;
use crate::error::ShellError;
use crate::executor;
use crate::jobs::{JobState, JobTable, parse_job_spec};
use crate::sys;

const BUILTINS: &[&str] = &["cd", "exit", "jobs", "fg", "bg"];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

pub enum BuiltinOutcome {
    Continue(i32),
    Exit(i32),
}

pub fn dispatch(command: &Command, job_table: &mut JobTable, program_name: &str) -> BuiltinOutcome {
    match command.program() {
        "cd" => BuiltinOutcome::Continue(builtin_cd(command.args(), program_name)),
        "exit" => builtin_exit(command.args(), program_name),
        "jobs" => BuiltinOutcome::Continue(builtin_jobs(job_table)),
        "fg" => BuiltinOutcome::Continue(builtin_fg(command.args(), job_table, program_name)),
        "bg" => BuiltinOutcome::Continue(builtin_bg(command.args(), job_table, program_name)),
        other => unreachable!("{other} is not a registered builtin"),
    }
}

fn builtin_cd(args: &[String], program_name: &str) -> i32 {
    if args.len() > 1 {
        diagnostics::report(program_name, Some("cd"), "too many arguments");
        return 1;
    }

    let echo_result = args.first().is_some_and(|a| a == "-");
    let target = match args.first() {
        None => match std::env::var("HOME") {
            Ok(home) => home,
            Err(_) => {
                diagnostics::report(program_name, Some("cd"), "HOME not set");
                return 1;
            }
        },
        Some(arg) if arg == "-" => match std::env::var("OLDPWD") {
            Ok(prev) => prev,
            Err(_) => {
                diagnostics::report(program_name, Some("cd"), "OLDPWD not set");
                return 1;
            }
        },
        Some(arg) => arg.clone(),
    };

    let path = std::path::Path::new(&target);
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => {
            diagnostics::report_io(program_name, Some("cd"), &target, &e);
            return 1;
        }
    };
    if !meta.is_dir() {
        diagnostics::report(program_name, Some("cd"), &format!("{target}: not a directory"));
        return 1;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            diagnostics::report(program_name, Some("cd"), &format!("{target}: not searchable"));
            return 1;
        }
    }

    let old_cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            diagnostics::report_io(program_name, Some("cd"), "getcwd", &e);
            return 1;
        }
    };

    if let Err(e) = std::env::set_current_dir(path) {
        diagnostics::report_io(program_name, Some("cd"), &target, &e);
        return 1;
    }

    // SAFETY: the shell is single-threaded except for the async SIGCHLD
    // handler, which never reads or writes environment variables.
    unsafe { std::env::set_var("OLDPWD", &old_cwd) };
    let new_cwd = std::env::current_dir().unwrap_or_else(|_| path.to_path_buf());
    unsafe { std::env::set_var("PWD", &new_cwd) };

    if echo_result {
        println!("{}", new_cwd.display());
    }

    0
}

fn builtin_exit(args: &[String], program_name: &str) -> BuiltinOutcome {
    if args.len() > 1 {
        diagnostics::report(program_name, Some("exit"), "too many arguments");
        return BuiltinOutcome::Continue(1);
    }

    match args.first() {
        None => BuiltinOutcome::Exit(0),
        Some(arg) => match arg.parse::<i64>() {
            Ok(value) => BuiltinOutcome::Exit(value.rem_euclid(256) as i32),
            Err(_) => {
                diagnostics::report(
                    program_name,
                    Some("exit"),
                    &format!("{arg}: numeric argument required"),
                );
                BuiltinOutcome::Exit(2)
            }
        },
    }
}

fn builtin_jobs(job_table: &JobTable) -> i32 {
    for job in job_table.iter_by_jid() {
        if let Some(line) = job_table.notification_line(job.jid) {
            println!("{line}");
        }
    }
    0
}

fn builtin_fg(args: &[String], job_table: &mut JobTable, program_name: &str) -> i32 {
    let jid = match resolve_target(args.first().map(String::as_str), job_table, program_name) {
        Some(jid) => jid,
        None => return 1,
    };

    let pgid = {
        let _block = sys::SigchldBlockGuard::acquire();
        job_table.set_current(jid);
        if let Some(job) = job_table.by_jid_mut(jid) {
            job.state = JobState::Running;
            job.notified = false;
        }
        job_table.by_jid(jid).map(|j| j.pgid).unwrap_or(0)
    };

    if let Err(e) = sys::send_continue_to_group(pgid) {
        diagnostics::report_io(program_name, Some("fg"), "failed to continue job", &e);
    }

    executor::wait_foreground(job_table, jid, program_name)
}

fn builtin_bg(args: &[String], job_table: &mut JobTable, program_name: &str) -> i32 {
    let jid = match resolve_target(args.first().map(String::as_str), job_table, program_name) {
        Some(jid) => jid,
        None => return 1,
    };

    let pgid = {
        let _block = sys::SigchldBlockGuard::acquire();
        job_table.set_current(jid);
        if let Some(job) = job_table.by_jid_mut(jid) {
            job.state = JobState::Running;
            job.notified = false;
        }
        job_table.by_jid(jid).map(|j| j.pgid).unwrap_or(0)
    };

    if let Err(e) = sys::send_continue_to_group(pgid) {
        diagnostics::report_io(program_name, Some("bg"), "failed to continue job", &e);
    }

    if let Some(line) = job_table.notification_line(jid) {
        println!("{line} &");
    }
    0
}

fn resolve_target(
    arg: Option<&str>,
    job_table: &JobTable,
    program_name: &str,
) -> Option<usize> {
    let spec = match parse_job_spec(arg) {
        Ok(spec) => spec,
        Err(e) => {
            report_job_error(program_name, &e);
            return None;
        }
    };
    match job_table.resolve_spec(spec) {
        Ok(jid) => Some(jid),
        Err(e) => {
            report_job_error(program_name, &e);
            None
        }
    }
}

fn report_job_error(program_name: &str, err: &ShellError) {
    diagnostics::report_err(program_name, None, err);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_are_recognized() {
        for name in BUILTINS {
            assert!(is_builtin(name));
        }
        assert!(!is_builtin("ls"));
    }
}
