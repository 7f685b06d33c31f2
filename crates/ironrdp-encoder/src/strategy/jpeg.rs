//! JPEG strategy (§4.E), grounded on `process_enc_jpg`.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::job::{Job, JobFlags, Rect};
use crate::result::{JobResult, ResultFlags};

/// Transport prefix reserved ahead of every compressed payload (`XRDP_SURCMD_PREFIX_BYTES`).
const PREFIX_BYTES: usize = 256;
/// Minimum per-rect output budget, regardless of rect size.
const MIN_BUDGET: usize = 8192;
/// Safety ceiling on a single rect's output budget.
const MAX_BUDGET: usize = 16 * 1024 * 1024;
/// Two codec sub-header bytes xrdp prepends ahead of the raw JPEG stream within the payload
/// region (bpp and a reserved byte); folded into `comp_bytes` alongside the compressor output.
const SUBHEADER_BYTES: usize = 2;

pub(crate) struct JpegStrategy {
    pub(crate) quality: u8,
}

impl super::Strategy for JpegStrategy {
    fn process(&mut self, job: Job) -> Vec<JobResult> {
        let id = job.id();
        let Job::Capture { surface, flags, .. } = job else {
            debug!("JPEG strategy received a graphics-command job; ignoring");
            return vec![JobResult::empty_ack(id, Rect::default(), ResultFlags::empty(), false)];
        };

        if surface.crects.is_empty() {
            return vec![JobResult::empty_ack(id, Rect::default(), ResultFlags::empty(), false)];
        }

        let result_flags = job_result_flags(flags);
        let num_rects = surface.crects.len();
        let mut results = Vec::with_capacity(num_rects);

        for (index, &rect) in surface.crects.iter().enumerate() {
            let continuation = index > 0;
            let is_last = index == num_rects - 1;

            if rect.w < 1 || rect.h < 1 {
                warn!(?rect, "JPEG strategy rejected a degenerate rect, aborting job");
                results.push(JobResult::empty_ack(id, rect, result_flags, continuation));
                return results;
            }

            match self.encode_rect(id, &surface, rect) {
                Ok(mut result) => {
                    result.last = is_last;
                    result.continuation = continuation;
                    result.flags = result_flags;
                    results.push(result);
                }
                Err(error) => {
                    warn!(%error, ?rect, "JPEG compression failed, aborting job with safety ack");
                    results.push(JobResult::empty_ack(id, rect, result_flags, continuation));
                    return results;
                }
            }
        }

        results
    }
}

impl JpegStrategy {
    fn encode_rect(&self, job_id: u64, surface: &crate::job::SurfaceCapture, rect: Rect) -> anyhow::Result<JobResult> {
        let w = usize::try_from(rect.w)?;
        let h = usize::try_from(rect.h)?;
        let budget = (w.saturating_add(4) * h * 4).max(MIN_BUDGET).min(MAX_BUDGET);

        let rgba = extract_rgba(surface, rect)?;

        let mut jpeg_bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut Cursor::new(&mut jpeg_bytes), self.quality).encode(
            &rgba,
            u32::try_from(w)?,
            u32::try_from(h)?,
            ExtendedColorType::Rgba8,
        )?;

        anyhow::ensure!(
            jpeg_bytes.len() <= budget,
            "JPEG output {} exceeds per-rect budget {budget}",
            jpeg_bytes.len()
        );

        let mut comp_pad_data = vec![0u8; PREFIX_BYTES + SUBHEADER_BYTES + jpeg_bytes.len()];
        comp_pad_data[PREFIX_BYTES] = 32; // bpp
        comp_pad_data[PREFIX_BYTES + 1] = 0; // reserved
        comp_pad_data[PREFIX_BYTES + SUBHEADER_BYTES..].copy_from_slice(&jpeg_bytes);

        Ok(JobResult {
            job_id,
            comp_bytes: SUBHEADER_BYTES + jpeg_bytes.len(),
            pad_bytes: PREFIX_BYTES,
            comp_pad_data,
            geometry: rect,
            frame_id: Some(surface.frame_id),
            last: true,
            continuation: false,
            flags: ResultFlags::empty(),
        })
    }
}

fn job_result_flags(job_flags: JobFlags) -> ResultFlags {
    let mut flags = ResultFlags::empty();
    flags.set(ResultFlags::GFX, job_flags.contains(JobFlags::GFX));
    flags
}

/// Pulls the BGRA sub-rectangle `rect` out of `surface` and swizzles it to RGBA for `image`.
fn extract_rgba(surface: &crate::job::SurfaceCapture, rect: Rect) -> anyhow::Result<Vec<u8>> {
    let x = usize::try_from(rect.x)?;
    let y = usize::try_from(rect.y)?;
    let w = usize::try_from(rect.w)?;
    let h = usize::try_from(rect.h)?;

    anyhow::ensure!(
        surface.stride >= (x + w) * 4 && surface.data.len() >= (y + h) * surface.stride,
        "crect {rect:?} exceeds surface bounds"
    );

    let mut rgba = vec![0u8; w * h * 4];
    for row in 0..h {
        let src_row = &surface.data[(y + row) * surface.stride + x * 4..][..w * 4];
        let dst_row = &mut rgba[row * w * 4..][..w * 4];
        for (src_px, dst_px) in src_row.chunks_exact(4).zip(dst_row.chunks_exact_mut(4)) {
            dst_px[0] = src_px[2];
            dst_px[1] = src_px[1];
            dst_px[2] = src_px[0];
            dst_px[3] = src_px[3];
        }
    }

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::SurfaceCapture;
    use crate::strategy::Strategy as _;

    fn solid_surface(w: i16, h: i16) -> SurfaceCapture {
        let width = usize::try_from(w).unwrap();
        let height = usize::try_from(h).unwrap();
        SurfaceCapture {
            data: vec![0, 0, 255, 255].repeat(width * height),
            left: 0,
            top: 0,
            width: w as u16,
            height: h as u16,
            stride: width * 4,
            drects: vec![Rect::new(0, 0, w, h)],
            crects: vec![Rect::new(0, 0, w, h)],
            frame_id: 1,
        }
    }

    #[test]
    fn single_rect_produces_one_acked_result() {
        let mut strategy = JpegStrategy { quality: 75 };
        let job = Job::Capture {
            id: 5,
            surface: solid_surface(64, 64),
            flags: JobFlags::empty(),
        };
        let results = strategy.process(job);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_id, 5);
        assert!(results[0].last);
        assert_eq!(results[0].pad_bytes, PREFIX_BYTES);
        assert!(results[0].comp_bytes >= 2);
        assert_eq!(results[0].geometry, Rect::new(0, 0, 64, 64));
    }

    #[test]
    fn empty_crects_still_acks() {
        let mut strategy = JpegStrategy { quality: 75 };
        let mut surface = solid_surface(16, 16);
        surface.crects.clear();
        let job = Job::Capture {
            id: 9,
            surface,
            flags: JobFlags::empty(),
        };
        let results = strategy.process(job);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_id, 9);
        assert_eq!(results[0].comp_bytes, 0);
        assert!(results[0].last);
    }

    #[test]
    fn degenerate_rect_aborts_with_safety_ack() {
        let mut strategy = JpegStrategy { quality: 75 };
        let mut surface = solid_surface(64, 64);
        surface.crects = vec![Rect::new(0, 0, 0, 0)];
        let job = Job::Capture {
            id: 3,
            surface,
            flags: JobFlags::empty(),
        };
        let results = strategy.process(job);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_id, 3);
        assert_eq!(results[0].comp_bytes, 0);
        assert!(results[0].last);
    }
}
