//! Prompt formatting (SPEC_FULL.md §11 / spec §6): pure string
//! formatting, no I/O, so it is unit-testable without a terminal.

/// Render the two-line prompt exactly as spec §6 describes:
/// `\n<user>@<host>: <path>\n[<code>]-> `.
pub fn render(cwd: &str, last_exit_code: i32) -> String {
    let user = std::env::var("USER").unwrap_or_else(|_| "user".to_string());
    let host = hostname();
    let path = match std::env::var("HOME") {
        Ok(home) => home_relative(cwd, &home),
        Err(_) => cwd.to_string(),
    };
    format!("\n{user}@{host}: {path}\n[{last_exit_code}]-> ")
}

/// Replace a leading `home` prefix in `cwd` with `~`, only when the byte
/// right after the match is `/` or the string ends there.
pub fn home_relative(cwd: &str, home: &str) -> String {
    if home.is_empty() {
        return cwd.to_string();
    }
    match cwd.strip_prefix(home) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("~{rest}"),
        _ => cwd.to_string(),
    }
}

#[cfg(unix)]
fn hostname() -> String {
    let mut buf = [0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return "localhost".to_string();
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

#[cfg(not(unix))]
fn hostname() -> String {
    "localhost".to_string()
}
