//! Encoder lifecycle (§4.A, §4.H, §6), grounded on `xrdp_encoder_create`/`xrdp_encoder_delete`.
//!
//! [`Encoder::new`] inspects the client's [`ClientCapabilities`] and picks exactly one codec
//! [`strategy`](crate::strategy), matching §4.A's ordered selection rules, then spawns the worker
//! thread that runs it. The public surface is two non-blocking calls — [`Encoder::enqueue`] and
//! [`Encoder::try_recv_result`] — plus [`Drop`], which performs the same cooperative-cancellation
//! teardown as `xrdp_encoder_delete`.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::capability::{ClientCapabilities, ConnectionClass};
use crate::config::EncoderConfig;
use crate::error::EncoderCreateError;
use crate::fifo::{Event, Fifo};
use crate::job::Job;
use crate::quant::QuantVector;
use crate::result::JobResult;
use crate::strategy::{GfxStrategy, H264Strategy, JpegStrategy, RfxStrategy, Strategy};
use crate::worker::{self, WorkerHandles, TERM_TIMEOUT};

/// Pixel layout the session thread must hand to [`Encoder::enqueue`] surface-capture jobs in,
/// fixed by the codec strategy chosen at construction time (§4.A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Bgra,
    Nv12,
    Nv12Bt709FullRange,
}

/// A running asynchronous screen-encoding worker for one RDP session.
///
/// Owns the jobs-in/results-out FIFO pair, the worker thread, and the two wait objects not
/// already carried by the FIFOs (`term_request`, `term_done`; `job_available`/`result_available`
/// live on the FIFOs themselves, per §3's "four wait objects").
pub struct Encoder {
    jobs_in: Arc<Fifo<Job>>,
    results_out: Arc<Fifo<JobResult>>,
    term_request: Arc<Event>,
    term_done: Arc<Event>,
    worker: Option<JoinHandle<()>>,
    capture_format: CaptureFormat,
    config: EncoderConfig,
}

impl Encoder {
    /// Implements §4.A's selection order, first match wins. Returns
    /// [`EncoderCreateError::NoApplicableStrategy`] if the client capability descriptor matches
    /// none of the rules (including the unconditional step-1 rejection).
    pub fn new(caps: &ClientCapabilities) -> Result<Self, EncoderCreateError> {
        if caps.is_rejected() {
            return Err(EncoderCreateError::NoApplicableStrategy);
        }

        let gfx_mode = caps.gfx_h264 || caps.gfx_rfx_pro;
        let config = if gfx_mode {
            EncoderConfig::from_env()
        } else {
            EncoderConfig::from_legacy_fragment_size(caps.max_fastpath_frag_bytes, caps.max_unacknowledged_frames)
        };

        let (strategy, capture_format): (Box<dyn Strategy>, CaptureFormat) =
            if let Some(quality) = caps.jpeg_codec_id.and(caps.jpeg_quality) {
                (Box::new(JpegStrategy { quality }), CaptureFormat::Bgra)
            } else if caps.gfx_h264 {
                let quant_uv = QuantVector::for_connection_class(caps.connection_class);
                (
                    Box::new(GfxStrategy::new(QuantVector::LUMA, quant_uv)),
                    CaptureFormat::Nv12Bt709FullRange,
                )
            } else if caps.legacy_h264_codec_id.is_some() {
                (Box::new(H264Strategy), CaptureFormat::Nv12)
            } else if caps.gfx_rfx_pro {
                let quant_uv = QuantVector::for_connection_class(caps.connection_class);
                (
                    Box::new(GfxStrategy::new(QuantVector::LUMA, quant_uv)),
                    CaptureFormat::Nv12Bt709FullRange,
                )
            } else if caps.legacy_rfx_codec_id.is_some() {
                let quant_uv = QuantVector::for_connection_class(caps.connection_class);
                (
                    Box::new(RfxStrategy {
                        quant_y: QuantVector::LUMA,
                        quant_uv,
                        max_compressed_bytes: config.max_compressed_bytes,
                    }),
                    CaptureFormat::Bgra,
                )
            } else {
                return Err(EncoderCreateError::NoApplicableStrategy);
            };

        info!(?capture_format, gfx_mode, ?config, "encoder constructed");
        Ok(Self::spawn(strategy, capture_format, config))
    }

    fn spawn(strategy: Box<dyn Strategy>, capture_format: CaptureFormat, config: EncoderConfig) -> Self {
        let jobs_in = Arc::new(Fifo::new());
        let results_out = Arc::new(Fifo::new());
        let term_request = Arc::new(Event::new());
        let term_done = Arc::new(Event::new());

        let handles = WorkerHandles {
            term_request: Arc::clone(&term_request),
            term_done: Arc::clone(&term_done),
        };
        let worker_jobs_in = Arc::clone(&jobs_in);
        let worker_results_out = Arc::clone(&results_out);

        let worker = std::thread::Builder::new()
            .name("ironrdp-encoder-worker".into())
            .spawn(move || worker::run(strategy, worker_jobs_in, worker_results_out, handles))
            .expect("failed to spawn encoder worker thread");

        Self {
            jobs_in,
            results_out,
            term_request,
            term_done,
            worker: Some(worker),
            capture_format,
            config,
        }
    }

    /// Capture pixel format the caller must supply for `Job::Capture` payloads.
    pub fn capture_format(&self) -> CaptureFormat {
        self.capture_format
    }

    pub fn config(&self) -> EncoderConfig {
        self.config
    }

    /// Enqueue contract (§6): pushes the job and sets `job_available`. Never blocks.
    pub fn enqueue(&self, job: Job) {
        self.jobs_in.push(job);
    }

    /// Dequeue contract (§6): pops one published result, if any, without blocking. Callers that
    /// want to block should wait on [`Encoder::result_available`] first.
    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.results_out.pop()
    }

    /// The wait object the session thread should block on before draining results.
    pub fn result_available(&self) -> &Event {
        self.results_out.available_event()
    }
}

impl Drop for Encoder {
    /// `xrdp_encoder_delete`-equivalent teardown (§4.H): signal `term_request`, wait up to
    /// [`TERM_TIMEOUT`] for `term_done`, log a warning rather than panicking if the worker missed
    /// the deadline, then let the FIFOs (and every job/result still queued in them) drop.
    fn drop(&mut self) {
        self.term_request.set();

        if !self.term_done.wait_timeout(TERM_TIMEOUT) {
            warn!("encoder worker did not report term_done within the teardown timeout");
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("encoder worker thread panicked during teardown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobFlags, Rect, SurfaceCapture};
    use std::time::Duration;

    fn lan_caps() -> ClientCapabilities {
        ClientCapabilities {
            bpp: 32,
            connection_class: ConnectionClass::Lan,
            jpeg_codec_id: None,
            jpeg_quality: None,
            legacy_h264_codec_id: None,
            legacy_rfx_codec_id: Some(3),
            gfx_h264: false,
            gfx_rfx_pro: false,
            max_unacknowledged_frames: 2,
            max_fastpath_frag_bytes: 16384,
            screen_width: 1024,
            screen_height: 768,
        }
    }

    #[test]
    fn low_bpp_is_rejected() {
        let mut caps = lan_caps();
        caps.bpp = 16;
        assert!(matches!(Encoder::new(&caps), Err(EncoderCreateError::NoApplicableStrategy)));
    }

    #[test]
    fn non_lan_without_gfx_is_rejected() {
        let mut caps = lan_caps();
        caps.connection_class = ConnectionClass::Wan;
        caps.legacy_rfx_codec_id = None;
        assert!(matches!(Encoder::new(&caps), Err(EncoderCreateError::NoApplicableStrategy)));
    }

    #[test]
    fn jpeg_codec_id_takes_priority() {
        let mut caps = lan_caps();
        caps.jpeg_codec_id = Some(1);
        caps.jpeg_quality = Some(80);
        let encoder = Encoder::new(&caps).expect("jpeg strategy should apply");
        assert_eq!(encoder.capture_format(), CaptureFormat::Bgra);
    }

    #[test]
    fn gfx_h264_flag_selects_gfx_interpreter() {
        let mut caps = lan_caps();
        caps.legacy_rfx_codec_id = None;
        caps.gfx_h264 = true;
        let encoder = Encoder::new(&caps).expect("gfx strategy should apply");
        assert_eq!(encoder.capture_format(), CaptureFormat::Nv12Bt709FullRange);
    }

    #[test]
    fn rfx_pro_quant_picks_ulq_for_modem() {
        let quant = QuantVector::for_connection_class(ConnectionClass::Modem);
        assert_eq!(quant, QuantVector::ULQ);
    }

    #[test]
    fn enqueue_then_recv_round_trips_a_job() {
        let encoder = Encoder::new(&lan_caps()).expect("legacy rfx strategy should apply");

        let surface = SurfaceCapture {
            data: vec![0u8; 64 * 64 * 4],
            left: 0,
            top: 0,
            width: 64,
            height: 64,
            stride: 64 * 4,
            drects: vec![Rect::new(0, 0, 64, 64)],
            crects: vec![Rect::new(0, 0, 64, 64)],
            frame_id: 1,
        };
        encoder.enqueue(Job::Capture {
            id: 1,
            surface,
            flags: JobFlags::empty(),
        });

        assert!(encoder.result_available().wait_timeout(Duration::from_secs(2)));
        let result = encoder.try_recv_result().expect("a result should be available");
        assert_eq!(result.job_id, 1);
        assert!(result.last);
    }

    #[test]
    fn teardown_completes_promptly_under_queued_load() {
        let encoder = Encoder::new(&lan_caps()).expect("legacy rfx strategy should apply");
        for frame_id in 0..8 {
            let surface = SurfaceCapture {
                data: vec![0u8; 64 * 64 * 4],
                left: 0,
                top: 0,
                width: 64,
                height: 64,
                stride: 64 * 4,
                drects: vec![Rect::new(0, 0, 64, 64)],
                crects: vec![Rect::new(0, 0, 64, 64)],
                frame_id,
            };
            encoder.enqueue(Job::Capture {
                id: u64::from(frame_id),
                surface,
                flags: JobFlags::empty(),
            });
        }
        drop(encoder);
    }
}
