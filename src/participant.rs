//! One participant of the ring: check preconditions, learn its neighbors,
//! swap values with them and judge local ordering.

use tracing::{debug, info_span};

use crate::comm::Communicator;
use crate::config::{ExchangeMode, RingConfig};
use crate::console::Console;
use crate::error::{RingError, RingResult};
use crate::topology::{Neighbors, Rank};

pub type Value = i32;

/// Lifecycle of a participant. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Uninitialized,
    /// Group formed and value assigned
    Ready,
    /// Left neighbor's value known
    Exchanged,
    /// Ordering predicate evaluated
    Checked,
    Done,
}

/// What a participant learned by the time it finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantReport {
    pub rank: Rank,
    pub size: usize,
    pub value: Value,
    /// `None` when the run only announces ranks
    pub neighbors: Option<Neighbors>,
    pub received: Option<Value>,
    pub violation: bool,
    pub phase: Phase,
}

/// Parse a participant's argument the way C `atoi` does: leading ASCII whitespace,
/// an optional sign, then digits up to the first non-digit. No digits gives 0
/// and out-of-range input saturates.
pub fn parse_number(text: &str) -> Value {
    // C isspace also counts vertical tab, which is_ascii_whitespace does not
    let text = text.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let limit = i32::MAX as i64 + 1;
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| (acc * 10 + (b - b'0') as i64).min(limit));

    let signed = if negative { -magnitude } else { magnitude };
    signed.clamp(i32::MIN as i64, i32::MAX as i64) as Value
}

/// Local ordering predicate.
///
/// Rank 0 is exempt: the check reads the ring as a line starting at 0, so 0
/// has no predecessor to compare against. The exemption is kept as-is rather
/// than making the check circular.
pub fn out_of_order(rank: Rank, own: Value, received: Value) -> bool {
    rank != 0 && own < received
}

/// Even ranks send before receiving, odd ranks receive before sending. Any
/// chain of blocked senders ends at an odd rank that is receiving, so the
/// ring never waits on itself.
pub fn staggered_exchange(
    comm: &Communicator<Value>,
    value: Value,
    neighbors: Neighbors,
) -> RingResult<Value> {
    let rank = comm.rank();
    if neighbors.is_self(rank) {
        return Ok(value);
    }

    if rank % 2 == 0 {
        comm.send(value, neighbors.right)?;
        comm.recv(neighbors.left)
    } else {
        let received = comm.recv(neighbors.left)?;
        comm.send(value, neighbors.right)?;
        Ok(received)
    }
}

pub struct Participant<'a> {
    comm: Communicator<Value>,
    config: &'a RingConfig,
    console: &'a Console,
    phase: Phase,
}

impl<'a> Participant<'a> {
    pub fn new(comm: Communicator<Value>, config: &'a RingConfig, console: &'a Console) -> Self {
        Self {
            comm,
            config,
            console,
            phase: Phase::Uninitialized,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn say(&self, text: String) {
        self.console.emit(self.comm.rank(), text);
    }

    fn enter(&mut self, phase: Phase) {
        debug_assert!(phase > self.phase, "{:?} -> {:?}", self.phase, phase);
        debug!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Only rank 0 prints the diagnostic; every rank returns the error.
    fn check_preconditions(&self, values: &[String]) -> RingResult<()> {
        let required = self.config.group_size;
        let size = self.comm.size();

        if size != required {
            if self.comm.rank() == 0 {
                self.say(self.config.group_size_error());
            }
            return Err(RingError::WrongGroupSize {
                required,
                actual: size,
            });
        }

        if values.len() != required {
            if self.comm.rank() == 0 {
                self.say(self.config.usage());
            }
            return Err(RingError::WrongArgumentCount {
                required,
                actual: values.len(),
            });
        }

        Ok(())
    }

    /// Run to completion. `values` holds one argument per participant, not
    /// including the program name. The communicator is released when this
    /// returns, on every path.
    pub fn run(mut self, values: &[String]) -> RingResult<ParticipantReport> {
        let rank = self.comm.rank();
        let size = self.comm.size();
        let _span = info_span!("process", rank).entered();

        self.say(format!("process {} of {} is running", rank, size));
        self.check_preconditions(values)?;

        let value = parse_number(&values[rank]);
        self.enter(Phase::Ready);
        self.say(format!("process {} got number {}", rank, value));

        let mut report = ParticipantReport {
            rank,
            size,
            value,
            neighbors: None,
            received: None,
            violation: false,
            phase: self.phase,
        };

        if self.config.mode == ExchangeMode::Announce {
            return Ok(self.finish(report));
        }

        let neighbors = Neighbors::of(rank, size);
        report.neighbors = Some(neighbors);
        self.say(format!(
            "process {} has left neighbor {} and right neighbor {}",
            rank, neighbors.left, neighbors.right
        ));

        let received = match self.config.mode {
            ExchangeMode::Staggered => staggered_exchange(&self.comm, value, neighbors)?,
            _ => self.comm.sendrecv(value, neighbors.right, neighbors.left)?,
        };
        self.enter(Phase::Exchanged);
        report.received = Some(received);
        self.say(format!(
            "process {} received number {} from left neighbor {}",
            rank, received, neighbors.left
        ));

        report.violation = out_of_order(rank, value, received);
        self.enter(Phase::Checked);
        if report.violation {
            self.say(format!("process {} has at least one number out of order.", rank));
        }

        Ok(self.finish(report))
    }

    fn finish(&mut self, mut report: ParticipantReport) -> ParticipantReport {
        self.enter(Phase::Done);
        self.say(format!("process {} has now finished.", self.comm.rank()));
        report.phase = self.phase;
        report
    }
}
