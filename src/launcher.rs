//! Starts one execution unit per participant and folds their outcomes into a
//! single exit status.

use crossbeam_utils::thread;
use tracing::{debug, error, info, warn};

use crate::comm;
use crate::config::RingConfig;
use crate::console::Console;
use crate::error::{RingError, RingResult};
use crate::participant::{Participant, ParticipantReport, Value};

#[derive(Debug)]
pub struct RunOutcome {
    /// One entry per rank, in rank order
    pub results: Vec<RingResult<ParticipantReport>>,
    /// Communicators released by the end of the run
    pub finalized: usize,
}

impl RunOutcome {
    /// Any failing participant fails the whole group.
    pub fn success(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(Result::is_ok)
    }

    pub fn exit_code(&self) -> u8 {
        if self.success() { 0 } else { 1 }
    }

    /// Lowest-ranked failure, preferring precondition errors over the
    /// transport errors they cause on other ranks.
    pub fn first_error(&self) -> Option<&RingError> {
        let mut errors = self.results.iter().filter_map(|r| r.as_ref().err());
        let first = errors.clone().find(|e| e.is_precondition());
        first.or_else(|| errors.next())
    }

    pub fn reports(&self) -> Vec<&ParticipantReport> {
        self.results.iter().filter_map(|r| r.as_ref().ok()).collect()
    }
}

/// Launch `np` participants, each given its own copy of `values`.
///
/// Participants share nothing but the links of their world and the console.
/// The call returns once every participant has finished.
pub fn launch(np: usize, values: &[String], config: &RingConfig, console: &Console) -> RunOutcome {
    info!("Launching {} participants ({:?} mode)", np, config.mode);

    let cpu_count = num_cpus::get();
    if np > cpu_count {
        warn!("Oversubscribing: {} participants on {} CPUs", np, cpu_count);
    }

    let core_ids = if config.pin_cores {
        match core_affinity::get_core_ids() {
            Some(ids) if !ids.is_empty() => {
                info!("Detected {} CPU cores for affinity", ids.len());
                Some(ids)
            }
            _ => {
                info!("CPU affinity not supported on this platform, continuing without core pinning");
                None
            }
        }
    } else {
        None
    };

    let (comms, world) = comm::init::<Value>(np);

    let joined = thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let rank = comm.rank();
                let core = core_ids.as_ref().map(|ids| ids[rank % ids.len()]);
                let argv = values.to_vec();

                let handle = s.spawn(move |_| {
                    if let Some(core) = core {
                        if core_affinity::set_for_current(core) {
                            debug!("Process {} pinned to CPU core {}", rank, core.id);
                        } else {
                            debug!("Failed to set CPU affinity for process {}", rank);
                        }
                    }
                    Participant::new(comm, config, console).run(&argv)
                });
                (rank, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(RingError::Panicked { rank }))
            })
            .collect::<Vec<_>>()
    });

    let results = joined.unwrap_or_else(|_| {
        (0..np)
            .map(|rank| Err(RingError::Panicked { rank }))
            .collect()
    });

    for (rank, result) in results.iter().enumerate() {
        match result {
            Ok(report) => debug!("Process {} finished: {:?}", rank, report),
            Err(e) if e.is_precondition() => debug!("Process {} stopped: {}", rank, e),
            Err(e) if matches!(e, RingError::Panicked { .. }) => error!("{}", e),
            Err(e) => warn!("{}", e),
        }
    }

    let outcome = RunOutcome {
        results,
        finalized: world.finalized(),
    };

    if outcome.finalized != world.size() {
        error!(
            "{} of {} communicators released",
            outcome.finalized,
            world.size()
        );
    }

    match outcome.first_error() {
        None => info!("All {} participants finished", np),
        Some(e) => info!("Run failed: {}", e),
    }

    outcome
}
