//! Worker thread main loop (§4.H), grounded on `proc_enc_msg`.

use std::sync::Arc;
use std::time::Duration;

use crate::fifo::{wait_any, Event, Fifo};
use crate::job::Job;
use crate::result::JobResult;
use crate::strategy::Strategy;

/// Shared wait objects a running worker listens on, plus the one it signals at exit.
///
/// Together with the two FIFOs' own `job_available`/`result_available` events, this is the full
/// set of four wait objects in the encoder's resource model (§3 "Encoder state").
pub(crate) struct WorkerHandles {
    pub(crate) term_request: Arc<Event>,
    pub(crate) term_done: Arc<Event>,
}

/// Teardown timeout for `encoder_delete`-equivalent shutdown (§4.H).
pub(crate) const TERM_TIMEOUT: Duration = Duration::from_millis(5000);

/// Runs on the dedicated worker thread for the lifetime of the encoder.
///
/// Waits on `{term_request, job_available}`; on the term event, breaks. Otherwise clears
/// `job_available` before draining `jobs_in` one item at a time under the mutex, invoking
/// `strategy` for each, publishing every produced result, and signalling `result_available` once
/// per job (see the "Empty-job safety ack" / "Signal once" notes in SPEC_FULL §4.F, generalized
/// here to every strategy for a single, uniform signalling contract).
pub(crate) fn run(
    mut strategy: Box<dyn Strategy>,
    jobs_in: Arc<Fifo<Job>>,
    results_out: Arc<Fifo<JobResult>>,
    handles: WorkerHandles,
) {
    loop {
        wait_any(&[&handles.term_request, jobs_in.available_event()]);

        if handles.term_request.is_set() {
            break;
        }

        jobs_in.available_event().reset();

        while let Some(job) = jobs_in.pop() {
            let results = strategy.process(job);
            for result in results {
                results_out.push(result);
            }
        }
    }

    handles.term_done.set();
}
