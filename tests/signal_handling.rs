#[cfg(unix)]
use std::io::Write;
#[cfg(unix)]
use std::process::{Command, Stdio};
#[cfg(unix)]
use std::time::Duration;

#[cfg(unix)]
fn run_shell(lines: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_jobsh"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn jobsh");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            writeln!(stdin, "{line}").expect("write line");
        }
        writeln!(stdin, "exit").expect("write exit");
    }

    child.wait_with_output().expect("wait output")
}

#[cfg(unix)]
#[test]
fn pipeline_sigpipe_does_not_abort_shell() {
    // `yes` writes indefinitely; `head -1` exits after one line, closing
    // the read end. `yes` receives SIGPIPE (SIG_DFL in the child via
    // `pre_exec`) and terminates; the shell itself ignores SIGPIPE and
    // keeps running the next line (spec §5 "Children started by the
    // shell receive default signal dispositions").
    let output = run_shell(&["yes | head -1", "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(output.status.success(), "shell did not exit cleanly");
}

#[cfg(unix)]
#[test]
fn shell_ignores_sigtstp_at_prompt() {
    // Signal setup (spec §4.9) ignores SIGTSTP in the shell itself so a
    // terminal-generated stop only ever suspends a foreground job, never
    // the shell. Deliver it to the shell's own pid directly (there is no
    // `$$`-style self-reference in this grammar) and confirm the shell
    // keeps reading and executing commands afterward.
    let mut child = Command::new(env!("CARGO_BIN_EXE_jobsh"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn jobsh");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "echo before").expect("write line");
    }
    std::thread::sleep(Duration::from_millis(200));

    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTSTP);
    }
    std::thread::sleep(Duration::from_millis(200));

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "echo after").expect("write line");
        writeln!(stdin, "exit").expect("write exit");
    }

    let output = child.wait_with_output().expect("wait output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("before"), "stdout was: {stdout}");
    assert!(stdout.contains("after"), "stdout was: {stdout}");
}
