//! The simulation link.

use std::io::{self, BufRead, Read};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde_json::error::Category;
use serde_json::value::RawValue;
use smallvec::SmallVec;

use warlock_core::{AbilityId, Command, EntityId, GameEvent, Order, RawState, SimulationState};
use warlock_replay::{EpisodeRecording, ReplaySink};

use crate::config::{LinkConfig, StepMode, DEFAULT_MAX_RESPONSE_BYTES};
use crate::error::{LinkError, ProcessError, ProtocolError};
use crate::transport::{ChildTransport, Transport};

/// Process-wide game counter; game IDs never repeat within a process.
static NEXT_GAME: AtomicU64 = AtomicU64::new(1);

/// Parameters of one `start` command.
#[derive(Clone, Debug, PartialEq)]
pub struct StartOptions {
    /// Number of players to spawn.
    pub player_count: u32,
    /// RNG seed; the simulation picks one when `None`.
    pub seed: Option<u64>,
    /// Seconds per frame; the simulation default applies when `None`.
    pub delta_time: Option<f64>,
    /// Gold per player in the first shop.
    pub start_gold: Option<f64>,
    /// Record every state of this game and persist it on
    /// [`SimulationLink::finish_episode`].
    pub log: bool,
}

impl StartOptions {
    /// Unlogged, unseeded game with `player_count` players.
    pub fn new(player_count: u32) -> Self {
        Self {
            player_count,
            seed: None,
            delta_time: None,
            start_gold: None,
            log: false,
        }
    }

    /// Set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set seconds per frame.
    pub fn delta_time(mut self, dt: f64) -> Self {
        self.delta_time = Some(dt);
        self
    }

    /// Set starting gold.
    pub fn start_gold(mut self, gold: f64) -> Self {
        self.start_gold = Some(gold);
        self
    }

    /// Enable or disable replay logging for this game.
    pub fn logged(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

/// Reader that stops after `remaining` bytes and counts what it served.
struct BoundedReader<'a> {
    inner: &'a mut dyn BufRead,
    remaining: usize,
    consumed: usize,
}

impl Read for BoundedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let max = buf.len().min(self.remaining);
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n;
        self.consumed += n;
        Ok(n)
    }
}

/// Synchronous driver for one simulation instance.
///
/// Owns its transport exclusively. Commands are written in call order and
/// each `getComponents` response is read completely before the call
/// returns, so responses are never interleaved. A [`ProcessError`] or
/// [`ProtocolError`] poisons the link: the transport is shut down at once
/// and every later call fails with [`LinkError::Closed`].
///
/// # Examples
///
/// ```no_run
/// use warlock_link::{LinkConfig, SimulationLink};
///
/// let config = LinkConfig::new("bun").args(["run", "src/cli/index.ts"]);
/// let mut link = SimulationLink::spawn(&config)?;
/// let state = link.start(Some(7), 2)?;
/// assert_eq!(state.player_ids().len(), 2);
/// let later = link.advance(6)?;
/// assert!(later.frame >= state.frame + 6);
/// link.close()?;
/// # Ok::<(), warlock_link::LinkError>(())
/// ```
pub struct SimulationLink<T: Transport = ChildTransport> {
    transport: Option<T>,
    max_response_bytes: usize,
    step_mode: StepMode,
    sink: Option<Box<dyn ReplaySink>>,
    recording: Option<EpisodeRecording>,
    last_frame: Option<u64>,
    started: bool,
}

impl SimulationLink<ChildTransport> {
    /// Validate `config`, spawn its program and wrap it in a link.
    pub fn spawn(config: &LinkConfig) -> Result<Self, LinkError> {
        config.validate()?;
        let transport = ChildTransport::spawn(config)?;
        Ok(Self::new(transport)
            .with_max_response_bytes(config.max_response_bytes)
            .with_step_mode(config.step_mode))
    }
}

impl<T: Transport> SimulationLink<T> {
    /// Wrap an existing transport with default settings.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            step_mode: StepMode::default(),
            sink: None,
            recording: None,
            last_frame: None,
            started: false,
        }
    }

    /// Set the upper bound on one state document.
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Set the frame stepping strategy.
    pub fn with_step_mode(mut self, mode: StepMode) -> Self {
        self.step_mode = mode;
        self
    }

    /// Attach the sink that receives logged episodes.
    pub fn with_replay_sink(mut self, sink: impl ReplaySink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Whether the transport is still alive.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Whether a game has been started on this link.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the current game is being recorded.
    pub fn is_logging(&self) -> bool {
        self.recording.is_some()
    }

    /// Frame of the most recently observed state.
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    /// Start a fresh game with `player_count` players.
    pub fn start(
        &mut self,
        seed: Option<u64>,
        player_count: u32,
    ) -> Result<SimulationState, LinkError> {
        let mut options = StartOptions::new(player_count);
        options.seed = seed;
        self.start_with(options)
    }

    /// Start a fresh game and return its initial state.
    ///
    /// Any pending recording of the previous game is persisted before the
    /// `start` command is written.
    pub fn start_with(&mut self, options: StartOptions) -> Result<SimulationState, LinkError> {
        self.transport()?;
        if options.log && self.sink.is_none() {
            return Err(LinkError::ReplayUnavailable);
        }
        self.finish_episode()?;

        let game_id = format!("game{:06}", NEXT_GAME.fetch_add(1, Ordering::Relaxed));
        self.send(&Command::Start {
            num_players: options.player_count,
            seed: options.seed,
            delta_time: options.delta_time,
            start_gold: options.start_gold,
        })?;
        self.started = true;
        self.last_frame = None;
        self.recording = options
            .log
            .then(|| EpisodeRecording::new(game_id.as_str(), options.seed));

        let state = self.query()?;
        tracing::debug!(
            game_id = %game_id,
            players = options.player_count,
            seed = ?options.seed,
            logged = options.log,
            frame = state.frame,
            "game started"
        );
        Ok(state)
    }

    /// Advance `frames` frames and return the resulting state.
    ///
    /// In [`StepMode::PerFrame`] (and always while logging) every
    /// intermediate state is fetched; the returned state carries the
    /// events of all advanced frames in order. `frames == 0` only
    /// re-reads the current state.
    pub fn advance(&mut self, frames: u32) -> Result<SimulationState, LinkError> {
        self.ensure_started()?;
        if frames == 0 {
            return self.query();
        }
        if self.step_mode == StepMode::Batched && self.recording.is_none() {
            self.send(&Command::Step { steps: frames })?;
            return self.query();
        }

        let mut events: SmallVec<[GameEvent; 2]> = SmallVec::new();
        let mut state = self.step_once()?;
        for _ in 1..frames {
            events.extend(std::mem::take(&mut state.events));
            state = self.step_once()?;
        }
        events.extend(std::mem::take(&mut state.events));
        state.events = events;
        Ok(state)
    }

    /// Read the current state without advancing.
    pub fn state(&mut self) -> Result<SimulationState, LinkError> {
        self.ensure_started()?;
        self.query()
    }

    /// Replace the pending order of `entity`; `None` clears it.
    pub fn set_order(&mut self, entity: EntityId, order: Option<Order>) -> Result<(), LinkError> {
        self.ensure_started()?;
        self.send(&Command::SetOrder {
            entity_id: entity,
            order,
        })
    }

    /// Set the shop ready flag of a player.
    pub fn set_ready(&mut self, entity: EntityId, ready: bool) -> Result<(), LinkError> {
        self.ensure_started()?;
        self.send(&Command::SetReady {
            entity_id: entity,
            ready,
        })
    }

    /// Queue an ability purchase for a player.
    pub fn buy_ability(&mut self, entity: EntityId, ability: AbilityId) -> Result<(), LinkError> {
        self.ensure_started()?;
        self.send(&Command::BuyAbility {
            entity_id: entity,
            ability_id: ability,
        })
    }

    /// Persist the current recording, if any.
    ///
    /// Returns whether a recording was handed to the sink. Idempotent: a
    /// second call in the same game finds nothing to flush.
    pub fn finish_episode(&mut self) -> Result<bool, LinkError> {
        let Some(recording) = self.recording.take() else {
            return Ok(false);
        };
        if recording.is_empty() {
            return Ok(false);
        }
        let sink = self.sink.as_mut().ok_or(LinkError::ReplayUnavailable)?;
        sink.persist(recording)?;
        Ok(true)
    }

    /// Terminate the simulation and wait for it.
    ///
    /// An unfinished recording is discarded. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), LinkError> {
        if let Some(recording) = self.recording.take() {
            tracing::debug!(
                game_id = recording.game_id(),
                states = recording.len(),
                "discarding unfinished recording"
            );
        }
        self.started = false;
        match self.transport.take() {
            Some(mut transport) => transport
                .shutdown()
                .map_err(|e| ProcessError::Shutdown(e).into()),
            None => Ok(()),
        }
    }

    // ── internals ──────────────────────────────────────────────

    fn transport(&mut self) -> Result<&mut T, LinkError> {
        self.transport.as_mut().ok_or(LinkError::Closed)
    }

    fn ensure_started(&mut self) -> Result<(), LinkError> {
        self.transport()?;
        if !self.started {
            return Err(LinkError::NotStarted);
        }
        Ok(())
    }

    /// Poison the link on fatal errors and pass the error through.
    fn fail(&mut self, err: LinkError) -> LinkError {
        if err.is_fatal() {
            if let Some(mut transport) = self.transport.take() {
                tracing::warn!(error = %err, "simulation link failed, closing");
                if let Err(e) = transport.shutdown() {
                    tracing::warn!(error = %e, "failed to terminate simulation");
                }
            }
            self.recording = None;
            self.started = false;
        }
        err
    }

    fn send(&mut self, command: &Command) -> Result<(), LinkError> {
        let line = match command.to_line() {
            Ok(line) => line,
            Err(e) => {
                let err = ProtocolError::Encode {
                    detail: e.to_string(),
                };
                return Err(self.fail(err.into()));
            }
        };
        let transport = self.transport()?;
        if let Err(source) = transport.send(line.as_bytes()) {
            let err = ProcessError::Write {
                command: command.kind(),
                source,
            };
            return Err(self.fail(err.into()));
        }
        tracing::trace!(command = command.kind(), "command sent");
        Ok(())
    }

    fn step_once(&mut self) -> Result<SimulationState, LinkError> {
        self.send(&Command::Step { steps: 1 })?;
        self.query()
    }

    /// Request, read, decode and validate one state document.
    fn query(&mut self) -> Result<SimulationState, LinkError> {
        self.send(&Command::GetComponents)?;
        let doc = self.read_document()?;
        let state = match decode(&doc) {
            Ok(state) => state,
            Err(e) => return Err(self.fail(e.into())),
        };
        if let Some(previous) = self.last_frame {
            if state.frame < previous {
                let err = ProtocolError::FrameRegression {
                    previous,
                    current: state.frame,
                };
                return Err(self.fail(err.into()));
            }
        }
        self.last_frame = Some(state.frame);
        if let Some(recording) = self.recording.as_mut() {
            recording.push(doc);
        }
        Ok(state)
    }

    /// Read exactly one JSON document off the transport.
    ///
    /// Responses are not newline-delimited, so the document is parsed
    /// directly from the stream, bounded by `max_response_bytes`.
    fn read_document(&mut self) -> Result<Box<RawValue>, LinkError> {
        let limit = self.max_response_bytes;
        let transport = self.transport()?;
        let mut bounded = BoundedReader {
            inner: transport.receiver(),
            remaining: limit,
            consumed: 0,
        };
        let parsed = {
            let mut de = serde_json::Deserializer::from_reader(&mut bounded);
            Box::<RawValue>::deserialize(&mut de)
        };
        let exhausted = bounded.remaining == 0;
        let consumed = bounded.consumed;

        let e = match parsed {
            Ok(doc) => return Ok(doc),
            Err(e) => e,
        };
        let err: LinkError = match e.classify() {
            Category::Io => ProcessError::Read(e.into()).into(),
            Category::Eof if exhausted => ProtocolError::ResponseTooLarge { limit }.into(),
            Category::Eof => {
                let status = self.transport.as_mut().and_then(|t| t.exit_status());
                if consumed == 0 {
                    ProcessError::Exited { status }.into()
                } else {
                    ProcessError::Truncated {
                        received: consumed,
                        status,
                    }
                    .into()
                }
            }
            Category::Syntax | Category::Data => ProtocolError::Malformed {
                detail: e.to_string(),
            }
            .into(),
        };
        Err(self.fail(err))
    }
}

impl<T: Transport> Drop for SimulationLink<T> {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.shutdown() {
                tracing::warn!(error = %e, "failed to terminate simulation on drop");
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for SimulationLink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationLink")
            .field("open", &self.is_open())
            .field("started", &self.started)
            .field("logging", &self.is_logging())
            .field("last_frame", &self.last_frame)
            .field("step_mode", &self.step_mode)
            .finish()
    }
}

fn decode(doc: &RawValue) -> Result<SimulationState, ProtocolError> {
    let raw: RawState = serde_json::from_str(doc.get()).map_err(|e| ProtocolError::Schema {
        detail: e.to_string(),
    })?;
    Ok(SimulationState::from_raw(&raw)?)
}
