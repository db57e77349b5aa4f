//! Episode replay persistence for the Warlock training bridge.
//!
//! The simulation link collects every state document of a logged
//! episode into an [`EpisodeRecording`] and hands it to a
//! [`ReplaySink`] exactly once, when the episode ends or before the
//! next episode starts on the same link.
//!
//! # Architecture
//!
//! - [`ReplaySink`] is the collaborator trait the link depends on
//! - [`DirectoryReplaySink`] writes one directory per episode containing
//!   `state_history.json`, the ordered array of raw state documents
//! - [`MemoryReplaySink`] keeps recordings in memory for tests and tools
//!
//! Documents are stored verbatim as received from the simulation, so a
//! replay viewer sees exactly what the training run saw.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod recording;
pub mod sink;

pub use error::ReplayError;
pub use recording::EpisodeRecording;
pub use sink::{DirectoryReplaySink, MemoryReplaySink, ReplaySink, STATE_HISTORY_FILE};
