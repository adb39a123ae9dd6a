//! The Job table (spec §4.6): tracks active pipelines in a fixed-size
//! array so the async-signal-safe reaper never has to allocate to record
//! a status change. Grounded in the teacher's `jobs.rs` `JobTable`
//! shape (add/remove/most-recent lookups), reworked from a `HashMap` of
//! live `Child` handles into plain `pid_t` bookkeeping, since job-control
//! state here is shared with a signal handler rather than owned
//! exclusively by the main line.

use crate::error::ShellError;

pub const MAX_JOBS: usize = 64;
pub const MAX_PROCS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
    Done,
}

impl JobState {
    fn label(self) -> &'static str {
        match self {
            JobState::Running => "Running",
            JobState::Stopped => "Stopped",
            JobState::Done => "Done",
        }
    }
}

/// One tracked pipeline. Everything the reaper touches (`state`,
/// `last_status`, `last_status_valid`, `alive`, `notified`) is a plain
/// `Copy` field so mutating it from the signal handler never allocates.
pub struct Job {
    pub jid: usize,
    pub seq: u64,
    pub pgid: libc::pid_t,
    pub pids: [libc::pid_t; MAX_PROCS],
    pub pid_count: usize,
    pub last_pid: libc::pid_t,
    pub last_status_valid: bool,
    pub last_status: libc::c_int,
    pub alive: usize,
    pub state: JobState,
    pub notified: bool,
    pub command_line: String,
}

impl Job {
    /// Exit code implied by `last_status`, per spec §4.5 foreground path:
    /// `WIFEXITED` → low 8 bits, `WIFSIGNALED` → `128 + signal`, else 0.
    pub fn exit_code(&self) -> i32 {
        if !self.last_status_valid {
            return 0;
        }
        crate::status::exit_code_from_wait_status(self.last_status).unwrap_or(0)
    }

    fn notification_mark(&self, current: usize, previous: usize) -> char {
        if self.jid == current {
            '+'
        } else if self.jid == previous {
            '-'
        } else {
            ' '
        }
    }

    fn notification_line(&self, current: usize, previous: usize) -> String {
        format!(
            "[{}]{}  {}\t{}",
            self.jid,
            self.notification_mark(current, previous),
            self.state.label(),
            self.command_line
        )
    }
}

pub struct JobTable {
    slots: [Option<Job>; MAX_JOBS],
    next_seq: u64,
    current: usize,
    previous: usize,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            slots: [const { None }; MAX_JOBS],
            next_seq: 1,
            current: 0,
            previous: 0,
        }
    }

    /// Register a freshly launched pipeline. Assigns the smallest free
    /// `jid` in `[1, MAX_JOBS]`.
    pub fn add(
        &mut self,
        pgid: libc::pid_t,
        pids: &[libc::pid_t],
        last_pid: libc::pid_t,
        command_line: String,
    ) -> Result<usize, ShellError> {
        if pids.len() > MAX_PROCS {
            return Err(ShellError::TableFull("pipeline too long".to_string()));
        }

        let slot = self
            .slots
            .iter()
            .position(|j| j.is_none())
            .ok_or_else(|| ShellError::TableFull("too many jobs".to_string()))?;
        let jid = slot + 1;

        let mut pid_array = [0 as libc::pid_t; MAX_PROCS];
        pid_array[..pids.len()].copy_from_slice(pids);

        let seq = self.next_seq;
        self.next_seq += 1;

        self.slots[slot] = Some(Job {
            jid,
            seq,
            pgid,
            pids: pid_array,
            pid_count: pids.len(),
            last_pid,
            last_status_valid: false,
            last_status: 0,
            alive: pids.len(),
            state: JobState::Running,
            notified: false,
            command_line,
        });

        self.recompute_current_previous();
        Ok(jid)
    }

    pub fn by_jid(&self, jid: usize) -> Option<&Job> {
        if jid == 0 || jid > MAX_JOBS {
            return None;
        }
        self.slots[jid - 1].as_ref()
    }

    pub fn by_jid_mut(&mut self, jid: usize) -> Option<&mut Job> {
        if jid == 0 || jid > MAX_JOBS {
            return None;
        }
        self.slots[jid - 1].as_mut()
    }

    pub fn by_pid_mut(&mut self, pid: libc::pid_t) -> Option<&mut Job> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|job| job.pids[..job.pid_count].contains(&pid))
    }

    pub fn remove(&mut self, jid: usize) {
        if jid == 0 || jid > MAX_JOBS {
            return;
        }
        self.slots[jid - 1] = None;
        if self.slots.iter().all(|j| j.is_none()) {
            self.current = 0;
            self.previous = 0;
            self.next_seq = 1;
        } else {
            self.recompute_current_previous();
        }
    }

    pub fn recompute_current_previous(&mut self) {
        let mut ordered: Vec<(usize, u64)> = self
            .slots
            .iter()
            .flatten()
            .map(|j| (j.jid, j.seq))
            .collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        self.current = ordered.first().map(|(jid, _)| *jid).unwrap_or(0);
        self.previous = ordered.get(1).map(|(jid, _)| *jid).unwrap_or(0);
    }

    pub fn set_current(&mut self, jid: usize) {
        if self.current != jid {
            self.previous = self.current;
            self.current = jid;
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn previous(&self) -> usize {
        self.previous
    }

    /// Jobs in `jid` order, for the `jobs` builtin.
    pub fn iter_by_jid(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().flatten()
    }

    pub fn notification_line(&self, jid: usize) -> Option<String> {
        self.by_jid(jid)
            .map(|job| job.notification_line(self.current, self.previous))
    }

    /// Jids with a pending, unreported state change.
    pub fn pending_notifications(&self) -> Vec<usize> {
        self.slots
            .iter()
            .flatten()
            .filter(|j| !j.notified && j.state != JobState::Running)
            .map(|j| j.jid)
            .collect()
    }
}

/// The dynamic forms a job-spec argument to `fg`/`bg` can take (spec
/// §4.6 "Job-spec parsing").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSpec {
    Current,
    Previous,
    Jid(usize),
}

pub fn parse_job_spec(arg: Option<&str>) -> Result<JobSpec, ShellError> {
    match arg {
        None | Some("%%") | Some("%+") => Ok(JobSpec::Current),
        Some("%-") => Ok(JobSpec::Previous),
        Some(raw) => {
            let digits = raw.strip_prefix('%').unwrap_or(raw);
            digits
                .parse::<usize>()
                .map(JobSpec::Jid)
                .map_err(|_| ShellError::JobRef(format!("{raw}: no such job")))
        }
    }
}

impl JobTable {
    pub fn resolve_spec(&self, spec: JobSpec) -> Result<usize, ShellError> {
        let jid = match spec {
            JobSpec::Current => self.current,
            JobSpec::Previous => self.previous,
            JobSpec::Jid(jid) => jid,
        };
        if jid != 0 && self.by_jid(jid).is_some() {
            Ok(jid)
        } else {
            Err(ShellError::JobRef("no such job".to_string()))
        }
    }
}
