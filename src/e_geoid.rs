//! Shape checks for geoids produced by an external embedding backend.
//!
//! The backend itself lives outside this crate. [`GeoidSource`] is the seam;
//! [`CommandGeoidSource`] reaches a backend by running it as a child process
//! through the harness, writing a JSON request to its stdin and reading the
//! geoid back as JSON from its stdout.

use crate::e_command_builder::InvocationBuilder;
use crate::e_config::GeoidConfig;
use crate::e_runner::run_invocation;
use crate::e_types::InvocationResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Semantic vector lengths produced by the known embedding backends.
pub const ACCEPTED_SEM_VEC_DIMS: [usize; 2] = [384, 512];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Geoid {
    pub raw: String,
    pub lang_axis: String,
    pub sem_vec: Vec<f32>,
}

/// Request sent to a command-backed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoidRequest<'a> {
    pub raw: &'a str,
    pub lang_axis: &'a str,
    pub context_layers: &'a [String],
}

pub trait GeoidSource {
    fn init_geoid(&self, raw: &str, lang_axis: &str, context_layers: &[String]) -> Result<Geoid>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemVecDim {
    D384,
    D512,
}

impl SemVecDim {
    pub fn dims(self) -> usize {
        match self {
            SemVecDim::D384 => 384,
            SemVecDim::D512 => 512,
        }
    }

    fn from_len(len: usize) -> Option<Self> {
        match len {
            384 => Some(SemVecDim::D384),
            512 => Some(SemVecDim::D512),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GeoidShapeError {
    #[error("raw text not echoed back: expected {expected:?}, got {actual:?}")]
    RawMismatch { expected: String, actual: String },
    #[error("language axis not echoed back: expected {expected:?}, got {actual:?}")]
    LangAxisMismatch { expected: String, actual: String },
    #[error("semantic vector has length {0}; expected 384 or 512")]
    BadDimension(usize),
    #[error("semantic vector contains a non-finite value at index {0}")]
    NonFinite(usize),
}

/// Checks that `geoid` echoes `raw` and `lang_axis` and carries a vector of an accepted length.
pub fn check_geoid_shape(
    geoid: &Geoid,
    raw: &str,
    lang_axis: &str,
) -> Result<SemVecDim, GeoidShapeError> {
    if geoid.raw != raw {
        return Err(GeoidShapeError::RawMismatch {
            expected: raw.to_string(),
            actual: geoid.raw.clone(),
        });
    }
    if geoid.lang_axis != lang_axis {
        return Err(GeoidShapeError::LangAxisMismatch {
            expected: lang_axis.to_string(),
            actual: geoid.lang_axis.clone(),
        });
    }
    let dim = SemVecDim::from_len(geoid.sem_vec.len())
        .ok_or(GeoidShapeError::BadDimension(geoid.sem_vec.len()))?;
    if let Some(idx) = geoid.sem_vec.iter().position(|v| !v.is_finite()) {
        return Err(GeoidShapeError::NonFinite(idx));
    }
    Ok(dim)
}

/// Builds a geoid through `source` and checks its shape.
pub fn check_geoid(
    source: &dyn GeoidSource,
    raw: &str,
    lang_axis: &str,
    context_layers: &[String],
) -> Result<SemVecDim> {
    let geoid = source.init_geoid(raw, lang_axis, context_layers)?;
    let dim = check_geoid_shape(&geoid, raw, lang_axis)?;
    log::info!("geoid for {:?} has {} dimensions", raw, dim.dims());
    Ok(dim)
}

/// A [`GeoidSource`] backed by an external program.
pub struct CommandGeoidSource {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl From<&GeoidConfig> for CommandGeoidSource {
    fn from(config: &GeoidConfig) -> Self {
        CommandGeoidSource {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Parses a geoid from backend stdout.
///
/// The whole output is tried first; failing that, the last non-empty line, so
/// a backend may print progress or warnings ahead of the JSON document.
pub fn parse_geoid_output(stdout: &str) -> serde_json::Result<Geoid> {
    let whole = stdout.trim();
    match serde_json::from_str::<Geoid>(whole) {
        Ok(geoid) => Ok(geoid),
        Err(e) => match whole.lines().map(str::trim).filter(|l| !l.is_empty()).last() {
            Some(last) if last != whole => serde_json::from_str(last),
            _ => Err(e),
        },
    }
}

fn echo_stderr(result: &InvocationResult) {
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
    }
}

impl CommandGeoidSource {
    fn fetch(
        &self,
        raw: &str,
        lang_axis: &str,
        context_layers: &[String],
    ) -> Result<(Geoid, InvocationResult)> {
        let request = serde_json::to_vec(&GeoidRequest {
            raw,
            lang_axis,
            context_layers,
        })?;
        let inv = InvocationBuilder::new(&self.program)
            .with_label("geoid")
            .with_args(&self.args)
            .with_timeout(self.timeout)
            .with_stdin(request)
            .build();
        let result = run_invocation(&inv)?;
        if !result.success() {
            result.print_verbatim();
            anyhow::bail!(
                "geoid backend `{}` failed: {}",
                result.command_line(),
                result.outcome()
            );
        }
        match parse_geoid_output(&result.stdout) {
            Ok(geoid) => Ok((geoid, result)),
            Err(e) => {
                echo_stderr(&result);
                Err(e).with_context(|| {
                    format!("geoid backend `{}` printed invalid JSON", result.command_line())
                })
            }
        }
    }

    /// Like [`check_geoid`], echoing the backend's stderr when the geoid
    /// fails the shape check.
    pub fn check(&self, raw: &str, lang_axis: &str, context_layers: &[String]) -> Result<SemVecDim> {
        let (geoid, result) = self.fetch(raw, lang_axis, context_layers)?;
        match check_geoid_shape(&geoid, raw, lang_axis) {
            Ok(dim) => {
                log::info!("geoid for {:?} has {} dimensions", raw, dim.dims());
                Ok(dim)
            }
            Err(e) => {
                echo_stderr(&result);
                Err(e.into())
            }
        }
    }
}

impl GeoidSource for CommandGeoidSource {
    fn init_geoid(&self, raw: &str, lang_axis: &str, context_layers: &[String]) -> Result<Geoid> {
        self.fetch(raw, lang_axis, context_layers)
            .map(|(geoid, _)| geoid)
    }
}
