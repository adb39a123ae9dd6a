use std::io::Write;
use std::process::{Command, Stdio};

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
    }

    child.wait_with_output().expect("wait output")
}

#[cfg(unix)]
#[test]
fn foreground_signal_exit_is_128_plus_signal() {
    // spec §6 "Child killed by signal s -> 128 + s", observed through the
    // shell's own process exit code since a bare `exit` with no argument
    // re-reports `last_exit_code` (spec §4.8).
    let output = run_shell(&["sh -c 'kill -INT $$'", "exit"]);
    assert_eq!(output.status.code(), Some(128 + 2));
}

#[test]
fn background_pipeline_then_jobs_reports_running() {
    // spec §8 scenario 4.
    let output = run_shell(&["sleep 1 &", "jobs", "exit"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        stdout.lines().any(|l| l.starts_with("[1] ")),
        "missing background launch line, stdout was: {stdout}"
    );
    assert!(
        stdout.contains("[1]+  Running\tsleep 1 &"),
        "missing jobs notification, stdout was: {stdout}"
    );
}

#[cfg(unix)]
#[test]
fn bg_resumes_a_stopped_job() {
    let output = run_shell(&[
        "sh -c 'kill -STOP $$; sleep 2' &",
        "sleep 0.3",
        "jobs",
        "bg %1",
        "exit",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Stopped"), "stdout was: {stdout}");
    assert!(stdout.contains(" &"), "missing bg notification: {stdout}");
}

#[test]
fn false_sets_last_exit_code_shown_in_next_prompt() {
    // spec §8 scenario 5: after `false`, the next prompt shows `[1]-> `.
    let output = run_shell(&["false", "exit"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[1]-> "), "stdout was: {stdout}");
}
