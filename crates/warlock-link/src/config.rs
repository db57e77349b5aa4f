//! Link configuration and validation.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Default upper bound on one state document, in bytes.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1 << 20;

/// Smallest accepted response bound.
const MIN_RESPONSE_BYTES: usize = 1024;

/// How [`advance`](crate::SimulationLink::advance) drives the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StepMode {
    /// One `step` + `getComponents` per frame. Every intermediate state
    /// is observed, so events from every frame are reported and logged
    /// episodes record every frame.
    #[default]
    PerFrame,
    /// One `step(n)` + one `getComponents`. Intermediate frames are not
    /// observed. Ignored while the current episode is being logged.
    Batched,
}

/// Configuration for a link and, when spawning, its process.
#[derive(Clone, Debug)]
pub struct LinkConfig {
    /// Simulation executable.
    pub program: PathBuf,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Working directory of the process; inherits ours when `None`.
    pub working_dir: Option<PathBuf>,
    /// Upper bound on one state document. Default: 1 MiB.
    pub max_response_bytes: usize,
    /// Frame stepping strategy. Default: [`StepMode::PerFrame`].
    pub step_mode: StepMode,
}

impl LinkConfig {
    /// Config for `program` with defaults for everything else.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            step_mode: StepMode::default(),
        }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.program.as_os_str().is_empty() {
            return Err(ConfigError::EmptyProgram);
        }
        if self.max_response_bytes < MIN_RESPONSE_BYTES {
            return Err(ConfigError::ResponseLimitTooSmall {
                configured: self.max_response_bytes,
            });
        }
        Ok(())
    }
}

/// Errors detected by [`LinkConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No program configured.
    EmptyProgram,
    /// `max_response_bytes` below the 1 KiB minimum.
    ResponseLimitTooSmall {
        /// The configured value.
        configured: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyProgram => write!(f, "simulation program is empty"),
            Self::ResponseLimitTooSmall { configured } => write!(
                f,
                "max_response_bytes {configured} is below minimum of {MIN_RESPONSE_BYTES}"
            ),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = LinkConfig::new("bun").args(["run", "src/cli/index.ts"]);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.args, vec!["run", "src/cli/index.ts"]);
        assert_eq!(cfg.step_mode, StepMode::PerFrame);
    }

    #[test]
    fn empty_program_rejected() {
        assert_eq!(
            LinkConfig::new("").validate(),
            Err(ConfigError::EmptyProgram)
        );
    }

    #[test]
    fn tiny_response_limit_rejected() {
        let mut cfg = LinkConfig::new("sim");
        cfg.max_response_bytes = 16;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ResponseLimitTooSmall { configured: 16 })
        );
    }
}
