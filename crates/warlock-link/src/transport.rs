//! Byte transports between a link and its simulation.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::config::LinkConfig;
use crate::error::ProcessError;

/// A bidirectional byte pipe to one simulation instance.
///
/// The link writes newline-terminated commands with [`send`](Self::send)
/// and parses responses straight off [`receiver`](Self::receiver).
/// Responses carry no delimiter, so implementations must not buffer
/// ahead in a way that hides bytes from the returned reader.
pub trait Transport: Send {
    /// Write one encoded command and flush it.
    fn send(&mut self, line: &[u8]) -> io::Result<()>;

    /// The simulation's output stream.
    fn receiver(&mut self) -> &mut dyn BufRead;

    /// Exit status of the simulation if it has already terminated.
    fn exit_status(&mut self) -> Option<String>;

    /// Terminate the simulation and release its resources.
    ///
    /// Must be idempotent.
    fn shutdown(&mut self) -> io::Result<()>;
}

/// A simulation running as a child process with piped stdio.
///
/// Dropping the transport kills the child (if still running) and reaps
/// it, so a process is never left behind on any exit path.
#[derive(Debug)]
pub struct ChildTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    reaped: bool,
}

impl ChildTransport {
    /// Launch the configured program.
    ///
    /// Stderr is inherited so simulation diagnostics reach the terminal.
    pub fn spawn(config: &LinkConfig) -> Result<Self, ProcessError> {
        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let spawn_err = |source| ProcessError::Spawn {
            program: config.program.display().to_string(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_err)?;
        let missing = || io::Error::new(io::ErrorKind::BrokenPipe, "stdio pipe not captured");
        let stdin = child.stdin.take().ok_or_else(|| spawn_err(missing()))?;
        let stdout = child.stdout.take().ok_or_else(|| spawn_err(missing()))?;

        tracing::info!(
            program = %config.program.display(),
            pid = child.id(),
            "simulation process spawned"
        );
        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            reaped: false,
        })
    }

    /// OS process id of the child.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Transport for ChildTransport {
    fn send(&mut self, line: &[u8]) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))?;
        stdin.write_all(line)?;
        stdin.flush()
    }

    fn receiver(&mut self) -> &mut dyn BufRead {
        &mut self.stdout
    }

    fn exit_status(&mut self) -> Option<String> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(status.to_string()),
            _ => None,
        }
    }

    fn shutdown(&mut self) -> io::Result<()> {
        if self.reaped {
            return Ok(());
        }
        // Closing stdin first lets a well-behaved simulation exit on EOF.
        self.stdin.take();
        if self.child.try_wait()?.is_none() {
            if let Err(e) = self.child.kill() {
                // Already exited between try_wait and kill.
                if e.kind() != io::ErrorKind::InvalidInput {
                    return Err(e);
                }
            }
        }
        let status = self.child.wait()?;
        self.reaped = true;
        tracing::debug!(pid = self.child.id(), %status, "simulation process reaped");
        Ok(())
    }
}

impl Drop for ChildTransport {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(pid = self.child.id(), error = %e, "failed to reap simulation process");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn echo_process_round_trip() {
        let cfg = LinkConfig::new("cat");
        let mut transport = ChildTransport::spawn(&cfg).unwrap();
        transport.send(b"{\"ping\":1}\n").unwrap();
        let mut line = String::new();
        transport.receiver().read_line(&mut line).unwrap();
        assert_eq!(line, "{\"ping\":1}\n");
        transport.shutdown().unwrap();
        transport.shutdown().unwrap();
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let cfg = LinkConfig::new("/nonexistent/warlock-simulation");
        let err = ChildTransport::spawn(&cfg).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
