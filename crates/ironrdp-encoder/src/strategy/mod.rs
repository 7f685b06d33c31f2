//! Codec strategies selected at encoder-construction time (§4.A) and run on the worker thread.

mod gfx;
mod h264;
mod jpeg;
mod rfx;

pub(crate) use gfx::GfxStrategy;
pub(crate) use h264::H264Strategy;
pub(crate) use jpeg::JpegStrategy;
pub(crate) use rfx::RfxStrategy;

use crate::job::Job;
use crate::result::JobResult;

/// A codec strategy consumes one job at a time and produces its full set of results.
///
/// Strategies run entirely on the worker thread and block it for the duration of each codec
/// call (§5's "Scheduling model"): this trait is intentionally synchronous, not `async`.
pub(crate) trait Strategy: Send {
    fn process(&mut self, job: Job) -> Vec<JobResult>;
}
