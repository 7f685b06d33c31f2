//! RemoteFX strategy (§4.F), grounded on `process_enc_rfx`.
//!
//! Per-tile compression composes primitives genuinely present in `ironrdp_graphics` (`dwt`,
//! `rlgr`, `color_conversion::to_64x64_ycbcr_tile`): the reference server crate this worker was
//! adapted from called a `rfx_encode_component` convenience function that does not exist in this
//! workspace's copy of `ironrdp-graphics`. Quantization — reducing each DWT subband's dynamic
//! range by right-shifting before entropy coding — is hand-written here directly against the
//! `dwt::encode` output layout, since that step lived inside the missing function.

use ironrdp_graphics::color_conversion::{to_64x64_ycbcr_tile, PixelFormat};
use ironrdp_graphics::dwt;
use ironrdp_graphics::rlgr::{self, RlgrError};

use crate::job::{Job, JobFlags, Rect};
use crate::quant::QuantVector;
use crate::result::{JobResult, ResultFlags};

const TILE_PIXELS: usize = 64 * 64;
/// Transport prefix reserved ahead of every compressed payload.
const PREFIX_BYTES: usize = 256;

pub(crate) struct RfxStrategy {
    pub(crate) quant_y: QuantVector,
    pub(crate) quant_uv: QuantVector,
    pub(crate) max_compressed_bytes: usize,
}

impl super::Strategy for RfxStrategy {
    fn process(&mut self, job: Job) -> Vec<JobResult> {
        let id = job.id();
        let Job::Capture { surface, flags, .. } = job else {
            debug!("RFX strategy received a graphics-command job; ignoring");
            return vec![JobResult::empty_ack(id, Rect::default(), ResultFlags::empty(), false)];
        };

        let result_flags = job_result_flags(flags);
        let num_crects = surface.crects.len();

        if num_crects == 0 || surface.drects.is_empty() {
            return vec![JobResult::empty_ack(id, Rect::default(), result_flags, false)];
        }

        let key_frame_requested = flags.contains(JobFlags::KEY_FRAME_REQUESTED);
        let full_surface = Rect::new(surface.left, surface.top, surface.width as i16, surface.height as i16);

        let mut results = Vec::new();
        let mut all_written = 0usize;
        let mut pass = 0usize;

        loop {
            let left = num_crects - all_written;
            if left == 0 {
                break;
            }

            let is_key_frame_pass = key_frame_requested && pass == 0;
            let mut pass_output = Vec::new();
            let mut tiles_written = 0usize;
            let mut codec_failed = false;

            // Tile DWT/quantize/RLGR compression is independent per tile; only the final
            // concatenation and budget accounting need to happen in crect order, so the CPU-bound
            // compression step itself is run across the rayon pool (see the "rayon" feature).
            let encoded: Vec<(Rect, Result<Vec<u8>, RlgrError>)> = {
                #[cfg(feature = "rayon")]
                {
                    use rayon::prelude::*;
                    surface.crects[all_written..]
                        .par_iter()
                        .enumerate()
                        .map(|(i, &crect)| (crect, self.encode_tile(&surface, crect, is_key_frame_pass && i == 0)))
                        .collect()
                }
                #[cfg(not(feature = "rayon"))]
                {
                    surface.crects[all_written..]
                        .iter()
                        .enumerate()
                        .map(|(i, &crect)| (crect, self.encode_tile(&surface, crect, is_key_frame_pass && i == 0)))
                        .collect()
                }
            };

            for (crect, outcome) in encoded {
                match outcome {
                    Ok(tile_bytes) => {
                        if pass_output.len() + tile_bytes.len() > self.max_compressed_bytes {
                            break;
                        }
                        pass_output.extend_from_slice(&tile_bytes);
                        tiles_written += 1;
                    }
                    Err(error) => {
                        warn!(%error, ?crect, "RFX tile compression failed");
                        codec_failed = true;
                        break;
                    }
                }
            }

            if codec_failed {
                results.push(JobResult::empty_ack(id, full_surface, result_flags, all_written > 0));
                return results;
            }

            if tiles_written == 0 {
                // Nothing fit this pass (e.g. `max_compressed_bytes` too small for even one
                // tile): stop rather than loop forever.
                results.push(JobResult::empty_ack(id, full_surface, result_flags, all_written > 0));
                return results;
            }

            let continuation = all_written > 0;
            all_written += tiles_written;
            let last = all_written == num_crects;

            let mut comp_pad_data = vec![0u8; PREFIX_BYTES + pass_output.len()];
            comp_pad_data[PREFIX_BYTES..].copy_from_slice(&pass_output);

            results.push(JobResult {
                job_id: id,
                comp_bytes: pass_output.len(),
                pad_bytes: PREFIX_BYTES,
                comp_pad_data,
                geometry: full_surface,
                frame_id: Some(surface.frame_id),
                last,
                continuation,
                flags: result_flags,
            });

            pass += 1;
        }

        results
    }
}

impl RfxStrategy {
    fn encode_tile(
        &self,
        surface: &crate::job::SurfaceCapture,
        rect: Rect,
        _key_frame: bool,
    ) -> Result<Vec<u8>, RlgrError> {
        let x = usize::try_from(rect.x).unwrap_or(0);
        let y = usize::try_from(rect.y).unwrap_or(0);
        let w = usize::try_from(rect.w).unwrap_or(0).min(64);
        let h = usize::try_from(rect.h).unwrap_or(0).min(64);

        let mut y_buf = [0i16; TILE_PIXELS];
        let mut cb_buf = [0i16; TILE_PIXELS];
        let mut cr_buf = [0i16; TILE_PIXELS];

        let input = if surface.stride * (y + h) <= surface.data.len() {
            &surface.data[y * surface.stride + x * 4..]
        } else {
            &surface.data[..]
        };

        to_64x64_ycbcr_tile(
            input,
            w,
            h,
            surface.stride,
            PixelFormat::BgrA32,
            &mut y_buf,
            &mut cb_buf,
            &mut cr_buf,
        );

        let y_data = rfx_encode_component(&mut y_buf, &self.quant_y)?;
        let cb_data = rfx_encode_component(&mut cb_buf, &self.quant_uv)?;
        let cr_data = rfx_encode_component(&mut cr_buf, &self.quant_uv)?;

        let mut out = Vec::with_capacity(8 + y_data.len() + cb_data.len() + cr_data.len());
        out.extend_from_slice(&(y_data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(cb_data.len() as u32).to_le_bytes());
        out.extend_from_slice(&y_data);
        out.extend_from_slice(&cb_data);
        out.extend_from_slice(&cr_data);
        Ok(out)
    }
}

/// DWT transform, per-subband quantization, and RLGR1 entropy coding of a single 64x64 channel
/// plane, in that order — the composition the missing `rfx_encode_component` performed.
fn rfx_encode_component(buffer: &mut [i16; TILE_PIXELS], quant: &QuantVector) -> Result<Vec<u8>, RlgrError> {
    let mut temp = [0i16; TILE_PIXELS];
    dwt::encode(buffer, &mut temp);
    quantize(buffer, quant);

    let mut tile = vec![0u8; TILE_PIXELS * 2];
    let len = rlgr::encode(ironrdp_pdu::codecs::rfx::EntropyAlgorithm::Rlgr1, buffer, &mut tile)?;
    tile.truncate(len);
    Ok(tile)
}

/// Right-shifts each DWT subband's coefficients by its quantization factor. Subband extents
/// follow the layout `dwt::encode` leaves in the buffer: level-1 bands (32x32) first, then the
/// level-2 decomposition of the level-1 LL band (16x16), then level-3 (8x8), with the final DC
/// band (LL3) in the last 64 elements.
fn quantize(buffer: &mut [i16; TILE_PIXELS], quant: &QuantVector) {
    const L1: usize = 32 * 32;
    const L2: usize = 16 * 16;
    const L3: usize = 8 * 8;

    shift_range(&mut buffer[0..L1], quant.hl1);
    shift_range(&mut buffer[L1..2 * L1], quant.lh1);
    shift_range(&mut buffer[2 * L1..3 * L1], quant.hh1);

    let level2_base = 3 * L1;
    shift_range(&mut buffer[level2_base..level2_base + L2], quant.hl2);
    shift_range(&mut buffer[level2_base + L2..level2_base + 2 * L2], quant.lh2);
    shift_range(&mut buffer[level2_base + 2 * L2..level2_base + 3 * L2], quant.hh2);

    let level3_base = level2_base + 3 * L2;
    shift_range(&mut buffer[level3_base..level3_base + L3], quant.hl3);
    shift_range(&mut buffer[level3_base + L3..level3_base + 2 * L3], quant.lh3);
    shift_range(&mut buffer[level3_base + 2 * L3..level3_base + 3 * L3], quant.hh3);
    shift_range(&mut buffer[level3_base + 3 * L3..], quant.ll3);
}

fn shift_range(values: &mut [i16], quant_factor: u8) {
    let shift = quant_factor.saturating_sub(6);
    if shift == 0 {
        return;
    }
    for value in values {
        *value >>= shift;
    }
}

fn job_result_flags(job_flags: JobFlags) -> ResultFlags {
    let mut flags = ResultFlags::empty();
    flags.set(ResultFlags::GFX, job_flags.contains(JobFlags::GFX));
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::SurfaceCapture;
    use crate::strategy::Strategy as _;

    fn surface(w: i16, h: i16, num_tiles: usize) -> SurfaceCapture {
        let width = usize::try_from(w).unwrap();
        let height = usize::try_from(h).unwrap();
        let crects = (0..num_tiles)
            .map(|i| {
                let i = i as i16;
                Rect::new((i % (w / 64).max(1)) * 64, (i / (w / 64).max(1)) * 64, 64, 64)
            })
            .collect();
        SurfaceCapture {
            data: vec![10u8; width * height * 4],
            left: 0,
            top: 0,
            width: w as u16,
            height: h as u16,
            stride: width * 4,
            drects: vec![Rect::new(0, 0, w, h)],
            crects,
            frame_id: 42,
        }
    }

    #[test]
    fn single_pass_covers_all_tiles() {
        let mut strategy = RfxStrategy {
            quant_y: QuantVector::STD,
            quant_uv: QuantVector::STD,
            max_compressed_bytes: 3 * 1024 * 1024,
        };
        let job = Job::Capture {
            id: 11,
            surface: surface(128, 128, 4),
            flags: JobFlags::empty(),
        };
        let results = strategy.process(job);
        assert!(!results.is_empty());
        assert!(results.iter().all(|result| result.job_id == 11));
        assert!(results.last().unwrap().last);
        for result in &results[..results.len() - 1] {
            assert!(!result.last);
        }
    }

    #[test]
    fn small_budget_forces_multiple_passes() {
        let mut strategy = RfxStrategy {
            quant_y: QuantVector::STD,
            quant_uv: QuantVector::STD,
            max_compressed_bytes: 256,
        };
        let job = Job::Capture {
            id: 22,
            surface: surface(256, 256, 16),
            flags: JobFlags::empty(),
        };
        let results = strategy.process(job);
        assert!(results.len() >= 2, "expected fragmentation across passes");
        assert!(results[0].continuation == false || results.len() == 1);
        for result in &results[1..] {
            assert!(result.continuation);
        }
        assert!(results.last().unwrap().last);
    }

    #[test]
    fn empty_crects_emits_single_ack() {
        let mut strategy = RfxStrategy {
            quant_y: QuantVector::STD,
            quant_uv: QuantVector::STD,
            max_compressed_bytes: 3 * 1024 * 1024,
        };
        let mut s = surface(64, 64, 1);
        s.crects.clear();
        let job = Job::Capture {
            id: 33,
            surface: s,
            flags: JobFlags::empty(),
        };
        let results = strategy.process(job);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_id, 33);
        assert_eq!(results[0].comp_bytes, 0);
        assert!(results[0].last);
    }
}
