//! Legacy (non-GFX) H.264 strategy.
//!
//! Grounded on `process_enc_h264`, which the reference implementation leaves as a one-line stub
//! (`LOG_DEVEL(..., "process_enc_h264: dummy func"); return 0;`). Per the "H.264 legacy
//! strategy" design note, the slot is preserved but now explicitly reports "not implemented"
//! instead of silently succeeding; no known deployment reaches this path, since GFX-H264 is
//! always preferred over the legacy surface-fragment codec id when the client advertises it
//! (§4.A step 3 precedes step 4).

use crate::job::{Job, Rect};
use crate::result::{JobResult, ResultFlags};

pub(crate) struct H264Strategy;

impl super::Strategy for H264Strategy {
    fn process(&mut self, job: Job) -> Vec<JobResult> {
        warn!("legacy H.264 strategy invoked; this codec path is not implemented");
        vec![JobResult::empty_ack(job.id(), Rect::default(), ResultFlags::empty(), false)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobFlags, SurfaceCapture};
    use crate::strategy::Strategy as _;

    #[test]
    fn always_acks_without_implementing_the_codec() {
        let mut strategy = H264Strategy;
        let job = Job::Capture {
            id: 42,
            surface: SurfaceCapture {
                data: Vec::new(),
                left: 0,
                top: 0,
                width: 0,
                height: 0,
                stride: 0,
                drects: Vec::new(),
                crects: Vec::new(),
                frame_id: 0,
            },
            flags: JobFlags::empty(),
        };
        let results = strategy.process(job);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_id, 42);
        assert_eq!(results[0].comp_bytes, 0);
        assert!(results[0].last);
    }
}
