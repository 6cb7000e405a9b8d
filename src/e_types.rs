use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// Exit code forwarded when a child is killed because its timeout elapsed.
///
/// Matches the convention of coreutils `timeout`.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// A command to run under the harness.
///
/// Built with [`crate::e_command_builder::InvocationBuilder`].
///
/// # Example
/// ```
/// use e_harness::e_command_builder::InvocationBuilder;
/// use std::time::Duration;
///
/// let inv = InvocationBuilder::new("python3")
///     .with_args(&["fix.py".to_string()])
///     .with_timeout(Some(Duration::from_secs(30)))
///     .build();
///
/// assert_eq!(inv.label, "python3");
/// assert_eq!(inv.command_line(), "python3 fix.py");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub stdin: Option<Vec<u8>>,
}

impl Invocation {
    /// The program and its arguments joined by spaces, for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A `Command` carrying the program, arguments and working directory.
    /// Stdio and timeout handling are left to the runner.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// How a single invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Passed,
    Failed(i32),
    TimedOut,
    /// Terminated by a signal; no exit code is available.
    Signalled,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASS",
            Outcome::Failed(_) => "FAIL",
            Outcome::TimedOut => "TIMEOUT",
            Outcome::Signalled => "KILLED",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Failed(code) => write!(f, "{} (exit {})", self.label(), code),
            other => f.write_str(other.label()),
        }
    }
}

/// Record of one finished child process.
///
/// Holds the command that ran, everything it wrote to stdout and stderr, and
/// how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub label: String,
    pub command: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl InvocationResult {
    pub fn outcome(&self) -> Outcome {
        if self.timed_out {
            return Outcome::TimedOut;
        }
        match self.exit_code {
            Some(0) => Outcome::Passed,
            Some(code) => Outcome::Failed(code),
            None => Outcome::Signalled,
        }
    }

    pub fn success(&self) -> bool {
        self.outcome().is_success()
    }

    /// Exit code the parent should use when it mirrors this child.
    pub fn exit_code_to_forward(&self) -> i32 {
        match self.outcome() {
            Outcome::Passed => 0,
            Outcome::Failed(code) => code,
            Outcome::TimedOut => TIMEOUT_EXIT_CODE,
            Outcome::Signalled => 1,
        }
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    /// Prints captured stdout to stdout and captured stderr to stderr, unmodified.
    pub fn print_verbatim(&self) {
        if !self.stdout.is_empty() {
            print!("{}", self.stdout);
        }
        if !self.stderr.is_empty() {
            eprint!("{}", self.stderr);
        }
    }
}
