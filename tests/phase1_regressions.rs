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
        writeln!(stdin, "exit").expect("write exit");
    }

    child.wait_with_output().expect("wait output")
}

#[test]
fn builtin_to_external_pipeline_outputs() {
    // cd is the only builtin that can head a pipeline; ordinary externals
    // chain through plain pipes (spec §8 scenario 2).
    let output = run_shell(&["echo hello | sort"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello"), "stdout was: {stdout}");
}

#[test]
fn stdin_redirection_is_applied_to_single_stage() {
    let temp_dir = std::env::temp_dir().join(format!("jobsh_stdin_redir_{}", std::process::id()));
    std::fs::create_dir_all(&temp_dir).unwrap();
    let input_path = temp_dir.join("input.txt");
    std::fs::write(&input_path, "ABC").unwrap();

    let cmd = format!("cat < {}", input_path.display());
    let output = run_shell(&[cmd.as_str()]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ABC"), "stdout was: {stdout}");

    let _ = std::fs::remove_dir_all(&temp_dir);
}

#[test]
fn stdout_redirection_writes_file_contents() {
    // spec §8 scenario 3: `cat < in.txt > out.txt`.
    let temp_dir = std::env::temp_dir().join(format!("jobsh_stdout_redir_{}", std::process::id()));
    std::fs::create_dir_all(&temp_dir).unwrap();
    let in_path = temp_dir.join("in.txt");
    let out_path = temp_dir.join("out.txt");
    std::fs::write(&in_path, "ABC").unwrap();

    let cmd = format!("cat < {} > {}", in_path.display(), out_path.display());
    run_shell(&[cmd.as_str()]);

    let contents = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(contents, "ABC");

    let _ = std::fs::remove_dir_all(&temp_dir);
}

#[cfg(unix)]
#[test]
fn stage_stderr_does_not_flow_through_the_pipe() {
    // `1>&2` here is parsed by the nested `sh -c`, not by this shell's own
    // grammar (which has no fd-duplication operator) — only the pipe
    // between the two jobsh stages is under test. stdout crosses the
    // pipe into `sort`; stderr, never redirected, stays on the shell's
    // own inherited stderr.
    let output = run_shell(&["sh -c 'echo out; echo err 1>&2' | sort"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.contains("out"), "stdout was: {stdout}");
    assert!(stderr.contains("err"), "stderr was: {stderr}");
}

#[test]
fn unknown_command_reports_not_found() {
    // spec §8 scenario 6.
    let output = run_shell(&["nosuchcmd-xyz"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("command not found"), "stderr was: {stderr}");
}

#[test]
fn unresolvable_stage_does_not_abort_the_rest_of_the_pipeline() {
    // spec §4.5 step 5(h), §7: a per-stage resolution failure terminates
    // only that child — the remainder of the pipeline still runs, here
    // against the unresolvable stage's now-empty pipe output.
    let output = run_shell(&["nosuchcmd-xyz | wc -l"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stdout.trim(), "0", "stdout was: {stdout}");
    assert!(stderr.contains("command not found"), "stderr was: {stderr}");
}

#[test]
fn pipeline_of_three_stages_counts_matching_lines() {
    // spec §8 scenario 2, adapted to a portable stand-in for `ls -la | grep ... | wc -l`.
    let output = run_shell(&["printf 'a\\nb\\na\\n' | grep a | wc -l"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.lines().any(|l| l.trim() == "2"),
        "stdout was: {stdout}"
    );
}
