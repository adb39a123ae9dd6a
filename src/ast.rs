//! The data model for one parsed input line (spec §3): [`Command`],
//! its [`Redirections`], and the owning [`Pipeline`].

/// A single redirection target: a file path plus whether output should be
/// appended rather than truncated. The append flag is meaningless for the
/// stdin slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub path: String,
    pub append: bool,
}

impl RedirectTarget {
    pub fn new(path: String, append: bool) -> Self {
        Self { path, append }
    }
}

/// The three redirection slots a [`Command`] carries. Each slot is set at
/// most once — the parser rejects a second redirection to the same slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirections {
    pub stdin: Option<RedirectTarget>,
    pub stdout: Option<RedirectTarget>,
    pub stderr: Option<RedirectTarget>,
}

impl Redirections {
    pub fn is_empty(&self) -> bool {
        self.stdin.is_none() && self.stdout.is_none() && self.stderr.is_none()
    }
}

/// One stage of a pipeline: an argument vector plus its redirections.
/// `argv` is always non-empty once a [`Pipeline`] has been successfully
/// parsed — the parser rejects empty stages.
#[derive(Debug, Clone)]
pub struct Command {
    pub argv: Vec<String>,
    pub redirections: Redirections,
}

impl Command {
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// A non-empty ordered sequence of [`Command`]s connected by pipes, with an
/// optional trailing background flag on the head.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub background: bool,
}

impl Pipeline {
    /// Reconstruct a printable command-line string for job-table display,
    /// bounded at 1024 chars with graceful truncation (spec §3 "printable
    /// command-line string").
    pub fn printable(&self) -> String {
        const MAX_LEN: usize = 1024;

        let mut out = String::new();
        for (idx, cmd) in self.commands.iter().enumerate() {
            if idx > 0 {
                out.push_str(" | ");
            }
            out.push_str(&cmd.argv.join(" "));
            if let Some(r) = &cmd.redirections.stdin {
                out.push_str(&format!(" < {}", r.path));
            }
            if let Some(r) = &cmd.redirections.stdout {
                out.push_str(if r.append { " >> " } else { " > " });
                out.push_str(&r.path);
            }
            if let Some(r) = &cmd.redirections.stderr {
                out.push_str(if r.append { " 2>> " } else { " 2> " });
                out.push_str(&r.path);
            }
        }
        if self.background {
            out.push_str(" &");
        }

        if out.chars().count() > MAX_LEN {
            let mut truncated: String = out.chars().take(MAX_LEN.saturating_sub(3)).collect();
            truncated.push_str("...");
            truncated
        } else {
            out
        }
    }
}
