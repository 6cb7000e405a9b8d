use crate::e_types::Invocation;
use std::path::PathBuf;
use std::time::Duration;

/// A builder that constructs an [`Invocation`] for the harness.
pub struct InvocationBuilder {
    label: Option<String>,
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    stdin: Option<Vec<u8>>,
}

impl InvocationBuilder {
    /// Creates a builder for `program` with no arguments and no timeout.
    pub fn new(program: impl Into<String>) -> Self {
        InvocationBuilder {
            label: None,
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout: None,
            stdin: None,
        }
    }

    /// Name shown in summaries. Defaults to the program name.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Appends arguments to the command.
    pub fn with_args(mut self, args: &[String]) -> Self {
        self.args.extend(args.iter().cloned());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Bytes written to the child's stdin before waiting on it.
    pub fn with_stdin(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    pub fn build(self) -> Invocation {
        Invocation {
            label: self.label.unwrap_or_else(|| self.program.clone()),
            program: self.program,
            args: self.args,
            current_dir: self.current_dir,
            timeout: self.timeout,
            stdin: self.stdin,
        }
    }
}
