//! Error taxonomy for the encoder worker.
//!
//! Two tiers: structured [`thiserror`] errors for parse/codec failures that the worker must
//! react to (abort the job, emit a safety ack), and construction-time rejection surfaced as a
//! plain `Option`/`Err`, never a panic.

/// Raised while parsing a GFX command stream; always aborts the whole job.
#[derive(Debug, thiserror::Error)]
pub enum GfxParseError {
    #[error("truncated command header: {available} bytes available, need 8")]
    TruncatedHeader { available: usize },

    #[error("cmd_bytes {value} out of range [8, 32768]")]
    CmdBytesOutOfRange { value: u32 },

    #[error("{field} count {value} out of range [1, 16384]")]
    RectCountOutOfRange { field: &'static str, value: u32 },

    #[error("truncated rect array for {field}: {available} bytes available, need {needed}")]
    TruncatedRectArray {
        field: &'static str,
        available: usize,
        needed: usize,
    },

    #[error("monitor count {value} out of range [1, 16]")]
    MonitorCountOutOfRange { value: u32 },

    #[error("truncated body for cmd_id {cmd_id:#06x}: {available} bytes available, need {needed}")]
    TruncatedBody {
        cmd_id: u16,
        available: usize,
        needed: usize,
    },

    #[error("allocation or size budget exceeded: {0}")]
    AllocationFailed(&'static str),
}

/// Raised when no codec strategy applies to the client's capability descriptor (§4.A step 1),
/// or a per-monitor codec context fails to initialize.
#[derive(Debug, thiserror::Error)]
pub enum EncoderCreateError {
    #[error("no applicable codec strategy for the advertised client capabilities")]
    NoApplicableStrategy,

    #[error("failed to create codec context: {0}")]
    CodecContextCreation(&'static str),
}
