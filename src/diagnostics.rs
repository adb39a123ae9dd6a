//! The single place that writes the shared diagnostic prefix (spec §7,
//! expanded in SPEC_FULL.md §12) to stderr. Every builtin and CORE
//! component routes user-visible errors through here so the format stays
//! uniform: `<program>: [<context>: ]<message>[: <os-error-text>]`.

use std::io::{self, Write};

/// Print `<program>: [<context>: ]<message>` to stderr.
pub fn report(program: &str, context: Option<&str>, message: &str) {
    let mut stderr = io::stderr();
    let _ = match context {
        Some(ctx) => writeln!(stderr, "{program}: {ctx}: {message}"),
        None => writeln!(stderr, "{program}: {message}"),
    };
}

/// Print `<program>: [<context>: ]<message>: <os-error-text>` to stderr.
pub fn report_io(program: &str, context: Option<&str>, message: &str, err: &io::Error) {
    let mut stderr = io::stderr();
    let _ = match context {
        Some(ctx) => writeln!(stderr, "{program}: {ctx}: {message}: {err}"),
        None => writeln!(stderr, "{program}: {message}: {err}"),
    };
}

/// Print a [`crate::error::ShellError`] using its `Display` text as the
/// `<message>` half of the shared format.
pub fn report_err(program: &str, context: Option<&str>, err: &crate::error::ShellError) {
    report(program, context, &err.to_string());
}
