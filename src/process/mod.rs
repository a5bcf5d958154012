//! Line-oriented subprocess RPC for an external UCI engine.
//!
//! [`EngineProcess`] owns one engine's OS process and pipes. It exposes two
//! primitives: [`send`](EngineProcess::send) writes one newline-terminated
//! command, [`read`](EngineProcess::read) registers a consumer that is fed
//! output lines in arrival order until it signals completion. A single
//! background reader thread per process drains standard output; logical
//! request/response exchanges are serialized with a per-instance lock so
//! concurrent callers never see each other's response lines.

mod queue;

use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use queue::ConsumerQueue;
pub use queue::{LineConsumer, Ticket};

/// Default bound on one request/response exchange.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

// Readiness probe used to resynchronize the line stream after a timed-out
// exchange: everything up to the acknowledgement is a stale leftover.
const RESYNC_PROBE: &str = "isready";
const RESYNC_ACK: &str = "readyok";

/// Error type for engine process operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine executable could not be launched
    Spawn { program: String, message: String },
    /// `start` called on a process that is already running
    AlreadyRunning,
    /// Operation requires a started process
    NotRunning,
    /// Writing to the engine's input pipe failed (engine died)
    WriteFailed { message: String },
    /// The engine terminated while a consumer was still registered
    Terminated,
    /// A blocking exchange exceeded its bound
    Timeout { waited_ms: u64 },
    /// Operation on a disposed process
    Disposed,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Spawn { program, message } => {
                write!(f, "Failed to start engine '{program}': {message}")
            }
            EngineError::AlreadyRunning => write!(f, "Engine process is already running"),
            EngineError::NotRunning => write!(f, "Engine process has not been started"),
            EngineError::WriteFailed { message } => {
                write!(f, "Failed to write to engine input: {message}")
            }
            EngineError::Terminated => write!(f, "Engine process terminated unexpectedly"),
            EngineError::Timeout { waited_ms } => {
                write!(f, "Engine did not answer within {waited_ms} ms")
            }
            EngineError::Disposed => write!(f, "Engine process has been disposed"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Configuration for launching an engine process.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    program: String,
    args: Vec<String>,
    options: Vec<(String, String)>,
    exchange_timeout: Duration,
}

impl EngineConfig {
    /// Configure an engine launched from `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        EngineConfig {
            program: program.into(),
            args: Vec::new(),
            options: Vec::new(),
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    /// Append a command-line argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Record a UCI option to apply after the handshake.
    #[must_use]
    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((name.into(), value.into()));
        self
    }

    /// Bound every request/response exchange by `timeout`.
    #[must_use]
    pub fn exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    /// UCI options recorded with [`EngineConfig::option`].
    #[must_use]
    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    /// Launch the engine and start its reader thread.
    pub fn spawn(&self) -> Result<EngineProcess, EngineError> {
        let process = EngineProcess::new(self.clone());
        process.start()?;
        Ok(process)
    }
}

enum State {
    Idle,
    Running {
        child: Child,
        reader: Option<JoinHandle<()>>,
    },
    Disposed,
}

/// One external engine's OS process and pipes.
pub struct EngineProcess {
    config: EngineConfig,
    state: Mutex<State>,
    writer: Mutex<Option<ChildStdin>>,
    queue: Arc<ConsumerQueue>,
    // Serializes whole request/response exchanges, not single writes.
    exchange: Mutex<()>,
}

impl EngineProcess {
    /// Create a process handle in the idle state; nothing is launched yet.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        EngineProcess {
            config,
            state: Mutex::new(State::Idle),
            writer: Mutex::new(None),
            queue: ConsumerQueue::new(),
            exchange: Mutex::new(()),
        }
    }

    /// Spawn the engine executable and the background reader thread.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        match *state {
            State::Idle => {}
            State::Running { .. } => return Err(EngineError::AlreadyRunning),
            State::Disposed => return Err(EngineError::Disposed),
        }

        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Spawn {
                program: self.config.program.clone(),
                message: e.to_string(),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| EngineError::Spawn {
            program: self.config.program.clone(),
            message: "stdin pipe unavailable".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| EngineError::Spawn {
            program: self.config.program.clone(),
            message: "stdout pipe unavailable".to_string(),
        })?;

        *self.writer.lock() = Some(stdin);

        let queue = Arc::clone(&self.queue);
        let reader = thread::Builder::new()
            .name("engine-reader".to_string())
            .spawn(move || {
                let mut lines = BufReader::new(stdout);
                let mut buf = String::new();
                loop {
                    buf.clear();
                    match lines.read_line(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {
                            let line = buf.trim_end_matches(['\r', '\n']);
                            log::trace!("engine> {line}");
                            queue.dispatch_line(line);
                        }
                    }
                }
                log::warn!("engine output closed, failing pending consumers");
                queue.terminate();
            })
            .map_err(|e| EngineError::Spawn {
                program: self.config.program.clone(),
                message: format!("failed to spawn reader thread: {e}"),
            })?;

        log::info!("started engine '{}'", self.config.program);
        *state = State::Running {
            child,
            reader: Some(reader),
        };
        Ok(())
    }

    /// UCI options recorded on this process's configuration.
    #[must_use]
    pub fn configured_options(&self) -> &[(String, String)] {
        self.config.options()
    }

    /// Whether the process has been started and its output is still open.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), State::Running { .. }) && !self.queue.is_terminated()
    }

    /// Write one newline-terminated command line and flush.
    pub fn send(&self, command: &str) -> Result<(), EngineError> {
        if matches!(*self.state.lock(), State::Disposed) {
            return Err(EngineError::Disposed);
        }
        if self.queue.is_terminated() {
            return Err(EngineError::Terminated);
        }
        let mut writer = self.writer.lock();
        let stdin = writer.as_mut().ok_or(EngineError::NotRunning)?;
        log::trace!("engine< {command}");
        stdin
            .write_all(command.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush())
            .map_err(|e| EngineError::WriteFailed {
                message: e.to_string(),
            })
    }

    /// Register a consumer that receives output lines, in arrival order,
    /// until it returns `false`.
    ///
    /// The returned [`Ticket`] resolves when the consumer finishes, fails
    /// with [`EngineError::Terminated`] if the engine exits first, or with
    /// [`EngineError::Timeout`] if waited on past its bound.
    pub fn read<C>(&self, consumer: C) -> Result<Ticket, EngineError>
    where
        C: FnMut(&str) -> bool + Send + 'static,
    {
        if matches!(*self.state.lock(), State::Disposed) {
            return Err(EngineError::Disposed);
        }
        self.queue.register(Box::new(consumer))
    }

    /// Run one serialized request/response exchange: register `consumer`,
    /// send `command`, wait (bounded) for the consumer to finish.
    ///
    /// Exchanges on the same process never interleave; a consumer only ever
    /// observes lines produced after its own command. If an earlier exchange
    /// timed out, its late-arriving response lines are drained through a
    /// readiness barrier before `consumer` sees anything.
    pub fn exchange<C>(&self, command: &str, consumer: C) -> Result<(), EngineError>
    where
        C: FnMut(&str) -> bool + Send + 'static,
    {
        let _serialized = self.exchange.lock();
        if self.queue.is_desynced() {
            self.resync()?;
        }
        let ticket = self.read(consumer)?;
        if let Err(e) = self.send(command) {
            ticket.cancel();
            return Err(e);
        }
        ticket.wait(self.config.exchange_timeout)
    }

    /// Discard whatever the engine is still emitting for a timed-out
    /// exchange: probe readiness and drop every line up to the
    /// acknowledgement. Must be called with the exchange lock held.
    fn resync(&self) -> Result<(), EngineError> {
        log::debug!("resynchronizing engine output after a timed-out exchange");
        let ticket = self.read(|line| line != RESYNC_ACK)?;
        if let Err(e) = self.send(RESYNC_PROBE) {
            ticket.cancel();
            return Err(e);
        }
        // A timeout here leaves the queue flagged for the next attempt.
        ticket.wait(self.config.exchange_timeout)?;
        self.queue.mark_synced();
        Ok(())
    }

    /// Send a command that expects no response.
    ///
    /// Takes the exchange lock so the command cannot land in the middle of
    /// another caller's exchange.
    pub fn send_serialized(&self, command: &str) -> Result<(), EngineError> {
        let _serialized = self.exchange.lock();
        self.send(command)
    }

    /// Terminate the engine and release all resources. Idempotent; pending
    /// consumers fail with [`EngineError::Terminated`].
    pub fn close(&self) {
        let mut state = self.state.lock();
        let previous = std::mem::replace(&mut *state, State::Disposed);
        drop(state);

        *self.writer.lock() = None;
        self.queue.terminate();

        if let State::Running { mut child, reader } = previous {
            let _ = child.kill();
            let _ = child.wait();
            if let Some(handle) = reader {
                let _ = handle.join();
            }
            log::info!("closed engine '{}'", self.config.program);
        }
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for EngineProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.state.lock() {
            State::Idle => "idle",
            State::Running { .. } => "running",
            State::Disposed => "disposed",
        };
        f.debug_struct("EngineProcess")
            .field("program", &self.config.program)
            .field("state", &state)
            .finish()
    }
}
