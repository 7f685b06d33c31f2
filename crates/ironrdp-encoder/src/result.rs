//! Result records published by the worker thread back to the session thread.
//!
//! Grounded on `xrdp_enc_data_done` in the reference implementation.

use bitflags::bitflags;

use crate::job::Rect;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResultFlags: u8 {
        /// Mirrors the originating job's `GFX` bit.
        const GFX = 0b0000_0001;
        /// Set only by the GFX `EndFrame` handler; `frame_id` carries a captured frame id.
        const GOT_FRAME_ID = 0b0000_0010;
    }
}

/// One unit of encoder output. A single [`Job`](crate::Job) may produce several of these
/// (e.g. RemoteFX fragmentation, or one per GFX command); exactly one carries `last = true`.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Back-reference to the originating job, grounded on `XRDP_ENC_DATA_DONE.enc`.
    pub job_id: u64,
    /// Padded buffer: `pad_bytes` reserved prefix (for the transport to splice a header into in
    /// place) followed by `comp_bytes` of meaningful payload.
    pub comp_pad_data: Vec<u8>,
    pub pad_bytes: usize,
    pub comp_bytes: usize,
    pub geometry: Rect,
    pub frame_id: Option<u32>,
    /// True when this is the final result for its job.
    pub last: bool,
    /// True for every non-first result of the same job.
    pub continuation: bool,
    pub flags: ResultFlags,
}

impl JobResult {
    /// A "nothing to send, but ack the frame" result: `comp_bytes == 0`, `last == true`.
    ///
    /// Emitted uniformly by every strategy on codec failure or job abort, so invariant 3 of the
    /// worker's safety contract (every dequeued job owes at least one acked result) always holds.
    pub fn empty_ack(job_id: u64, geometry: Rect, flags: ResultFlags, continuation: bool) -> Self {
        Self {
            job_id,
            comp_pad_data: Vec::new(),
            pad_bytes: 0,
            comp_bytes: 0,
            geometry,
            frame_id: None,
            last: true,
            continuation,
            flags,
        }
    }

    /// Payload bytes actually meaningful to the transport (excludes the reserved prefix).
    pub fn payload(&self) -> &[u8] {
        &self.comp_pad_data[self.pad_bytes..self.pad_bytes + self.comp_bytes]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ack_always_acks() {
        let result = JobResult::empty_ack(7, Rect::default(), ResultFlags::empty(), false);
        assert_eq!(result.job_id, 7);
        assert_eq!(result.comp_bytes, 0);
        assert!(result.last);
    }

    #[test]
    fn payload_excludes_prefix() {
        let result = JobResult {
            job_id: 1,
            comp_pad_data: vec![0xAA; 256 + 4],
            pad_bytes: 256,
            comp_bytes: 4,
            geometry: Rect::default(),
            frame_id: None,
            last: true,
            continuation: false,
            flags: ResultFlags::empty(),
        };
        assert_eq!(result.payload().len(), 4);
    }
}
