//! Participants arranged in a logical ring swap one integer with their
//! neighbors and report whether local ordering holds.
//!
//! [`launcher::launch`] runs one execution unit per participant. Each unit
//! owns a [`comm::Communicator`] and drives a [`participant::Participant`]
//! through its phases; values only ever cross between units as copies sent
//! over the communicator's links.

pub mod comm;
pub mod config;
pub mod console;
pub mod error;
pub mod launcher;
pub mod participant;
pub mod topology;

pub use config::{ExchangeMode, REQUIRED_GROUP_SIZE, RingConfig};
pub use console::Console;
pub use error::{RingError, RingResult};
pub use launcher::{RunOutcome, launch};
pub use participant::{ParticipantReport, Phase, Value};
pub use topology::{Neighbors, Rank};
