//! Synchronous process link driving the Warlock simulation.
//!
//! A [`SimulationLink`] owns exactly one simulation process (through a
//! [`Transport`]) and speaks its line protocol: one JSON command per
//! line in, one JSON state document out per `getComponents`.
//!
//! # Ownership model
//!
//! Every operation takes `&mut self` and blocks until its response, if
//! any, has been read completely. A link is [`Send`] so it can move to a
//! rollout worker thread, but it is never shared: interleaving commands
//! from two callers would break the frame-ordering invariant.
//!
//! # Failure
//!
//! A dead process and a malformed response are both fatal and reported
//! as distinct [`LinkError`] variants. After either, the link kills its
//! process and refuses further calls with [`LinkError::Closed`]. Nothing
//! is retried.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod link;
pub mod transport;

pub use config::{ConfigError, LinkConfig, StepMode, DEFAULT_MAX_RESPONSE_BYTES};
pub use error::{LinkError, ProcessError, ProtocolError};
pub use link::{SimulationLink, StartOptions};
pub use transport::{ChildTransport, Transport};
