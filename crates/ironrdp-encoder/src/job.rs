//! Job records handed from the session thread to the worker thread.
//!
//! Grounded on `xrdp_enc_data` in the reference implementation: a single `union` tagged by the
//! `ENC_DONE_FLAGS_GFX_BIT` flag is replaced here by a first-class sum type, per the "Tagged
//! variant for Job" design note.

use bitflags::bitflags;

bitflags! {
    /// Flag bits carried alongside a job, mirrored onto every result it produces.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct JobFlags: u8 {
        /// Selects the graphics-command payload variant; propagated onto every result.
        const GFX = 0b0000_0001;
        /// Requests an intra-coded (key) frame for the next codec pass.
        const KEY_FRAME_REQUESTED = 0b0000_0010;
    }
}

/// A codec-aligned or screen-region rectangle: `x, y, w, h`, matching the wire's 16-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i16,
    pub y: i16,
    pub w: i16,
    pub h: i16,
}

impl Rect {
    pub const fn new(x: i16, y: i16, w: i16, h: i16) -> Self {
        Self { x, y, w, h }
    }
}

/// Raw pixel buffer captured for this frame, in the format agreed at encoder-construction time
/// (e.g. BGRA for JPEG/legacy RFX, NV12 for H.264/GFX strategies).
///
/// `left`/`top` are grounded on `xrdp_enc_data.u.sc.left`/`.top`: the capture's position on the
/// full virtual screen, distinct from `width`/`height` (the buffer's own dimensions).
#[derive(Debug, Clone)]
pub struct SurfaceCapture {
    pub data: Vec<u8>,
    pub left: i16,
    pub top: i16,
    pub width: u16,
    pub height: u16,
    pub stride: usize,
    /// Meaningful screen regions (not necessarily tile-aligned).
    pub drects: Vec<Rect>,
    /// Codec-tile-aligned regions to actually compress.
    pub crects: Vec<Rect>,
    pub frame_id: u32,
}

/// A job carries either a raw surface capture or an already-framed sequence of RDPGFX commands.
///
/// `id` is an opaque, caller-assigned identifier mirrored onto every [`JobResult`](crate::result::JobResult)
/// produced for this job, grounded on `XRDP_ENC_DATA_DONE.enc`'s back-reference to the originating
/// job record.
#[derive(Debug, Clone)]
pub enum Job {
    Capture { id: u64, surface: SurfaceCapture, flags: JobFlags },
    GraphicsCommand { id: u64, data: Vec<u8>, flags: JobFlags },
}

impl Job {
    pub fn id(&self) -> u64 {
        match self {
            Self::Capture { id, .. } | Self::GraphicsCommand { id, .. } => *id,
        }
    }

    pub fn flags(&self) -> JobFlags {
        match self {
            Self::Capture { flags, .. } | Self::GraphicsCommand { flags, .. } => *flags,
        }
    }

    pub fn is_gfx(&self) -> bool {
        self.flags().contains(JobFlags::GFX)
    }
}
