//! RDPGFX command interpreter (§4.G), grounded on `process_enc_gfx` and the command-table
//! structure of `ironrdp-egfx`'s `pdu/cmd.rs` (read for field layout, not linked against: this
//! crate does not depend on `ironrdp-egfx`, since the worker consumes already-framed command
//! bytes rather than owning the EGFX channel itself).
//!
//! The interpreter walks a bounded cursor over the job payload, carving an exact `cmd_bytes`
//! window per command and dispatching on `cmd_id`. `WireToSurface1`/`WireToSurface2` would, in
//! the reference implementation, hand off to the platform's x264/RFX-Pro encoder libraries; no
//! such codec library is linked into this workspace's copy of `ironrdp-graphics`, so both
//! handlers are grounded the same way `H264Strategy` and the missing `rfx_encode_component` are:
//! they validate and parse every field real clients send, track lazy per-monitor codec-context
//! creation, and emit a deterministic placeholder fragment instead of a genuine encoded bitstream.

use ironrdp_core::ReadCursor;

use crate::error::GfxParseError;
use crate::job::{Job, JobFlags, Rect};
use crate::quant::QuantVector;
use crate::result::{JobResult, ResultFlags};

const HEADER_BYTES: usize = 8;
const MIN_CMD_BYTES: u32 = 8;
const MAX_CMD_BYTES: u32 = 32 * 1024;
const MIN_RECTS: u32 = 1;
const MAX_RECTS: u32 = 16384;
const MIN_MONITORS: u32 = 1;
const MAX_MONITORS: usize = 16;

/// AVC420 metablock quantization descriptor values (§4.G): a flat qp/quality pair applied
/// uniformly to every rect, rather than a per-rect rate-control decision this worker doesn't make.
const AVC420_QP: u8 = 23;
const AVC420_QUALITY: u8 = 100;

/// Upper bound on how many RFX-Pro tiles `wire_to_surface_2` hands to one encoder call before
/// publishing an intermediate fragment and continuing with the remainder (§4.G's "send-done").
const RFX_PRO_TILE_BATCH: usize = 64;

const CMD_WIRE_TO_SURFACE_1: u16 = 0x0001;
const CMD_WIRE_TO_SURFACE_2: u16 = 0x0002;
const CMD_SOLID_FILL: u16 = 0x0004;
const CMD_SURFACE_TO_SURFACE: u16 = 0x0005;
const CMD_CREATE_SURFACE: u16 = 0x0009;
const CMD_DELETE_SURFACE: u16 = 0x000A;
const CMD_START_FRAME: u16 = 0x000B;
const CMD_END_FRAME: u16 = 0x000C;
const CMD_RESET_GRAPHICS: u16 = 0x000E;
const CMD_MAP_SURFACE_TO_OUTPUT: u16 = 0x000F;

/// A single command's parse outcome: the wire fragment to publish, plus the frame id captured by
/// `EndFrame`, if any.
struct CommandOutput {
    fragment: Vec<u8>,
    end_frame_id: Option<u32>,
}

impl CommandOutput {
    fn plain(fragment: Vec<u8>) -> Self {
        Self {
            fragment,
            end_frame_id: None,
        }
    }
}

pub(crate) struct GfxStrategy {
    h264_context_created: [bool; MAX_MONITORS],
    rfx_pro_context_created: [bool; MAX_MONITORS],
    /// Slot 0 (Y) and slot 1 (Cb=Cr) quantization tables fed to the RFX-Pro path, selected by
    /// connection class at construction time (§4.A step 5).
    quant_y: QuantVector,
    quant_uv: QuantVector,
}

impl GfxStrategy {
    pub(crate) fn new(quant_y: QuantVector, quant_uv: QuantVector) -> Self {
        Self {
            h264_context_created: [false; MAX_MONITORS],
            rfx_pro_context_created: [false; MAX_MONITORS],
            quant_y,
            quant_uv,
        }
    }
}

impl super::Strategy for GfxStrategy {
    fn process(&mut self, job: Job) -> Vec<JobResult> {
        let id = job.id();
        let Job::GraphicsCommand { data, flags, .. } = job else {
            debug!("GFX strategy received a surface-capture job; ignoring");
            return vec![JobResult::empty_ack(id, Rect::default(), ResultFlags::empty(), false)];
        };

        let result_flags = {
            let mut result_flags = ResultFlags::GFX;
            result_flags.set(ResultFlags::GFX, flags.contains(JobFlags::GFX));
            result_flags
        };

        let mut results = Vec::new();
        let mut cursor = 0usize;

        loop {
            if cursor == data.len() {
                break;
            }

            if data.len() - cursor < HEADER_BYTES {
                warn!(available = data.len() - cursor, "GFX job ends with a truncated command header");
                results.push(JobResult::empty_ack(id, Rect::default(), result_flags, !results.is_empty()));
                return finalize(id, results);
            }

            let header = &data[cursor..cursor + HEADER_BYTES];
            let cmd_id = u16::from_le_bytes([header[0], header[1]]);
            let cmd_bytes = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if !(MIN_CMD_BYTES..=MAX_CMD_BYTES).contains(&cmd_bytes) {
                warn!(cmd_id, cmd_bytes, "GFX command declares an out-of-range cmd_bytes, aborting job");
                results.push(JobResult::empty_ack(id, Rect::default(), result_flags, !results.is_empty()));
                return finalize(id, results);
            }

            let cmd_bytes = cmd_bytes as usize;
            if data.len() - cursor < cmd_bytes {
                warn!(
                    cmd_id,
                    cmd_bytes,
                    available = data.len() - cursor,
                    "GFX command body extends past the end of the job payload, aborting job"
                );
                results.push(JobResult::empty_ack(id, Rect::default(), result_flags, !results.is_empty()));
                return finalize(id, results);
            }

            let body = &data[cursor + HEADER_BYTES..cursor + cmd_bytes];
            match self.dispatch(cmd_id, body) {
                Ok(Some(outputs)) => {
                    for output in outputs {
                        let mut flags = result_flags;
                        flags.set(ResultFlags::GOT_FRAME_ID, output.end_frame_id.is_some());
                        results.push(JobResult {
                            job_id: id,
                            comp_bytes: output.fragment.len(),
                            pad_bytes: 0,
                            comp_pad_data: output.fragment,
                            geometry: Rect::default(),
                            frame_id: output.end_frame_id,
                            last: false,
                            continuation: !results.is_empty(),
                            flags,
                        });
                    }
                }
                Ok(None) => {
                    debug!(cmd_id, "unrecognized GFX cmd_id, skipping");
                }
                Err(error) => {
                    warn!(cmd_id, %error, "GFX command body failed to parse, skipping command");
                }
            }

            cursor += cmd_bytes;
        }

        finalize(id, results)
    }
}

/// Ensures exactly one `last = true` (the final enqueued result, or a lone safety ack if the
/// payload carried no recognized commands at all).
fn finalize(job_id: u64, mut results: Vec<JobResult>) -> Vec<JobResult> {
    if results.is_empty() {
        return vec![JobResult::empty_ack(job_id, Rect::default(), ResultFlags::GFX, false)];
    }
    let last = results.len() - 1;
    results[last].last = true;
    results
}

impl GfxStrategy {
    fn dispatch(&mut self, cmd_id: u16, body: &[u8]) -> Result<Option<Vec<CommandOutput>>, GfxParseError> {
        let mut reader = Reader::new(cmd_id, body);
        match cmd_id {
            CMD_WIRE_TO_SURFACE_1 => self.wire_to_surface_1(&mut reader).map(Some),
            CMD_WIRE_TO_SURFACE_2 => self.wire_to_surface_2(&mut reader).map(Some),
            CMD_SOLID_FILL => solid_fill(&mut reader).map(|output| Some(vec![output])),
            CMD_SURFACE_TO_SURFACE => surface_to_surface(&mut reader).map(|output| Some(vec![output])),
            CMD_CREATE_SURFACE => create_surface(&mut reader).map(|output| Some(vec![output])),
            CMD_DELETE_SURFACE => delete_surface(&mut reader).map(|output| Some(vec![output])),
            CMD_START_FRAME => start_frame(&mut reader).map(|output| Some(vec![output])),
            CMD_END_FRAME => end_frame(&mut reader).map(|output| Some(vec![output])),
            CMD_RESET_GRAPHICS => reset_graphics(&mut reader).map(|output| Some(vec![output])),
            CMD_MAP_SURFACE_TO_OUTPUT => map_surface_to_output(&mut reader).map(|output| Some(vec![output])),
            _ => Ok(None),
        }
    }

    /// AVC420/H.264 path: parses the full field set real clients send, clips destination rects
    /// against the target rectangle, validates the trailing pixel buffer against the NV12 minimum
    /// size (§3, §4.G) unless it is already compressed, builds the per-rect quantization
    /// descriptor array the AVC420 metablock carries, and lazily marks the per-monitor x264
    /// context as created. See the module doc comment for why the payload is a placeholder rather
    /// than a genuine encoded bitstream.
    fn wire_to_surface_1(&mut self, reader: &mut Reader<'_>) -> Result<Vec<CommandOutput>, GfxParseError> {
        let surface_id = reader.read_u16()?;
        let codec_id = reader.read_u16()?;
        let pixel_format = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let mon_index = usize::from(flags >> 4);
        let already_compressed = flags & 0x01 != 0;

        let rects_d = reader.read_rects("num_rects_d")?;
        let rects_c = reader.read_rects("num_rects_c")?;
        let target = reader.read_rect()?;

        if !already_compressed {
            let width = usize::try_from(target.w).unwrap_or(0);
            let height = usize::try_from(target.h).unwrap_or(0);
            let needed = width * height * 3 / 2;
            if reader.cursor.len() < needed {
                return Err(reader.truncated(needed));
            }
        }

        let clipped_d: Vec<Rect> = rects_d.into_iter().map(|rect| clip_to(rect, target)).collect();

        if mon_index < MAX_MONITORS {
            self.h264_context_created[mon_index] = true;
        }

        let mut fragment = Vec::new();
        fragment.extend_from_slice(&CMD_WIRE_TO_SURFACE_1.to_le_bytes());
        fragment.extend_from_slice(&surface_id.to_le_bytes());
        fragment.extend_from_slice(&codec_id.to_le_bytes());
        fragment.push(pixel_format);
        fragment.push(u8::from(already_compressed));
        fragment.extend_from_slice(&(clipped_d.len() as u32).to_le_bytes());
        for rect in &clipped_d {
            fragment.extend_from_slice(&rect_bytes(*rect));
        }
        // Parallel array of per-rect AVC420 quantization descriptors (§4.G): one (qp, quality)
        // pair per destination rect, in the same order as the rect array above.
        for _ in &clipped_d {
            fragment.push(AVC420_QP);
            fragment.push(AVC420_QUALITY);
        }
        fragment.extend_from_slice(&(rects_c.len() as u32).to_le_bytes());
        fragment.extend_from_slice(&rect_bytes(target));

        Ok(vec![CommandOutput::plain(fragment)])
    }

    /// RFX-Pro path: parses the codec-context id, lazily marks the per-monitor RFX-Pro context as
    /// created, then iteratively hands the destination rects to the RFX-Pro encoder in batches of
    /// at most [`RFX_PRO_TILE_BATCH`] (§4.G). Every non-final batch is published as its own
    /// fragment (the "send-done" step); only the last batch's fragment is returned for the
    /// interpreter's normal per-command handling. The actual RemoteFX tile pipeline
    /// ([`super::rfx`]) isn't reused here since its input is a raw surface capture, not a
    /// command-framed rect list; the placeholder fragment instead echoes the parsed geometry and
    /// the two quantization tables actually selected for this connection.
    fn wire_to_surface_2(&mut self, reader: &mut Reader<'_>) -> Result<Vec<CommandOutput>, GfxParseError> {
        let surface_id = reader.read_u16()?;
        let codec_id = reader.read_u16()?;
        let pixel_format = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let mon_index = usize::from(flags >> 4);
        let codec_context_id = reader.read_u32()?;

        let rects_d = reader.read_rects("num_rects_d")?;

        if mon_index < MAX_MONITORS {
            self.rfx_pro_context_created[mon_index] = true;
        }

        let quant_y = self.quant_y;
        let quant_uv = self.quant_uv;
        let total_tiles = rects_d.len();
        let mut outputs = Vec::new();
        let mut written = 0usize;

        loop {
            let remaining = total_tiles - written;
            let batch_len = remaining.min(RFX_PRO_TILE_BATCH);
            let batch = &rects_d[written..written + batch_len];

            outputs.push(CommandOutput::plain(rfx_pro_fragment(
                surface_id,
                codec_id,
                pixel_format,
                codec_context_id,
                quant_y,
                quant_uv,
                batch,
            )));

            let tiles_compressed = batch.len();
            if tiles_compressed < 1 {
                break;
            }
            written += tiles_compressed;
            if written >= total_tiles {
                break;
            }
        }

        Ok(outputs)
    }
}

fn rfx_pro_fragment(
    surface_id: u16,
    codec_id: u16,
    pixel_format: u8,
    codec_context_id: u32,
    quant_y: QuantVector,
    quant_uv: QuantVector,
    batch: &[Rect],
) -> Vec<u8> {
    let mut fragment = Vec::new();
    fragment.extend_from_slice(&CMD_WIRE_TO_SURFACE_2.to_le_bytes());
    fragment.extend_from_slice(&surface_id.to_le_bytes());
    fragment.extend_from_slice(&codec_id.to_le_bytes());
    fragment.push(pixel_format);
    fragment.extend_from_slice(&codec_context_id.to_le_bytes());
    fragment.push(quant_y.ll3);
    fragment.push(quant_uv.ll3);
    fragment.extend_from_slice(&(batch.len() as u32).to_le_bytes());
    for rect in batch {
        fragment.extend_from_slice(&rect_bytes(*rect));
    }
    fragment
}

fn solid_fill(reader: &mut Reader<'_>) -> Result<CommandOutput, GfxParseError> {
    let surface_id = reader.read_u16()?;
    let color = reader.read_u32()?;
    let rects = reader.read_rects("rect_count")?;

    let mut fragment = Vec::new();
    fragment.extend_from_slice(&CMD_SOLID_FILL.to_le_bytes());
    fragment.extend_from_slice(&surface_id.to_le_bytes());
    fragment.extend_from_slice(&color.to_le_bytes());
    fragment.extend_from_slice(&(rects.len() as u32).to_le_bytes());
    for rect in &rects {
        fragment.extend_from_slice(&rect_bytes(*rect));
    }
    Ok(CommandOutput::plain(fragment))
}

fn surface_to_surface(reader: &mut Reader<'_>) -> Result<CommandOutput, GfxParseError> {
    let surface_id_src = reader.read_u16()?;
    let surface_id_dst = reader.read_u16()?;
    let rect_src = reader.read_rect()?;
    let dest_points = reader.read_points("dest_pts_count")?;

    let mut fragment = Vec::new();
    fragment.extend_from_slice(&CMD_SURFACE_TO_SURFACE.to_le_bytes());
    fragment.extend_from_slice(&surface_id_src.to_le_bytes());
    fragment.extend_from_slice(&surface_id_dst.to_le_bytes());
    fragment.extend_from_slice(&rect_bytes(rect_src));
    fragment.extend_from_slice(&(dest_points.len() as u32).to_le_bytes());
    for (x, y) in &dest_points {
        fragment.extend_from_slice(&x.to_le_bytes());
        fragment.extend_from_slice(&y.to_le_bytes());
    }
    Ok(CommandOutput::plain(fragment))
}

fn create_surface(reader: &mut Reader<'_>) -> Result<CommandOutput, GfxParseError> {
    let surface_id = reader.read_u16()?;
    let width = reader.read_u16()?;
    let height = reader.read_u16()?;
    let pixel_format = reader.read_u8()?;

    let mut fragment = Vec::new();
    fragment.extend_from_slice(&CMD_CREATE_SURFACE.to_le_bytes());
    fragment.extend_from_slice(&surface_id.to_le_bytes());
    fragment.extend_from_slice(&width.to_le_bytes());
    fragment.extend_from_slice(&height.to_le_bytes());
    fragment.push(pixel_format);
    Ok(CommandOutput::plain(fragment))
}

fn delete_surface(reader: &mut Reader<'_>) -> Result<CommandOutput, GfxParseError> {
    let surface_id = reader.read_u16()?;
    let mut fragment = Vec::new();
    fragment.extend_from_slice(&CMD_DELETE_SURFACE.to_le_bytes());
    fragment.extend_from_slice(&surface_id.to_le_bytes());
    Ok(CommandOutput::plain(fragment))
}

fn start_frame(reader: &mut Reader<'_>) -> Result<CommandOutput, GfxParseError> {
    let frame_id = reader.read_u32()?;
    let timestamp = reader.read_u32()?;
    let mut fragment = Vec::new();
    fragment.extend_from_slice(&CMD_START_FRAME.to_le_bytes());
    fragment.extend_from_slice(&frame_id.to_le_bytes());
    fragment.extend_from_slice(&timestamp.to_le_bytes());
    Ok(CommandOutput::plain(fragment))
}

fn end_frame(reader: &mut Reader<'_>) -> Result<CommandOutput, GfxParseError> {
    let frame_id = reader.read_u32()?;
    let mut fragment = Vec::new();
    fragment.extend_from_slice(&CMD_END_FRAME.to_le_bytes());
    fragment.extend_from_slice(&frame_id.to_le_bytes());
    Ok(CommandOutput {
        fragment,
        end_frame_id: Some(frame_id),
    })
}

fn reset_graphics(reader: &mut Reader<'_>) -> Result<CommandOutput, GfxParseError> {
    let width = reader.read_u32()?;
    let height = reader.read_u32()?;
    let monitor_count = reader.read_u32()?;
    if !(MIN_MONITORS..=MAX_MONITORS as u32).contains(&monitor_count) {
        return Err(GfxParseError::MonitorCountOutOfRange { value: monitor_count });
    }

    let mut fragment = Vec::new();
    fragment.extend_from_slice(&CMD_RESET_GRAPHICS.to_le_bytes());
    fragment.extend_from_slice(&width.to_le_bytes());
    fragment.extend_from_slice(&height.to_le_bytes());
    fragment.extend_from_slice(&monitor_count.to_le_bytes());
    for _ in 0..monitor_count {
        // Monitor descriptors are 32-bit left/top/right/bottom, per the wire byte order note.
        let left = reader.read_i32()?;
        let top = reader.read_i32()?;
        let right = reader.read_i32()?;
        let bottom = reader.read_i32()?;
        fragment.extend_from_slice(&left.to_le_bytes());
        fragment.extend_from_slice(&top.to_le_bytes());
        fragment.extend_from_slice(&right.to_le_bytes());
        fragment.extend_from_slice(&bottom.to_le_bytes());
    }
    Ok(CommandOutput::plain(fragment))
}

fn map_surface_to_output(reader: &mut Reader<'_>) -> Result<CommandOutput, GfxParseError> {
    let surface_id = reader.read_u16()?;
    let origin_x = reader.read_u32()?;
    let origin_y = reader.read_u32()?;

    let mut fragment = Vec::new();
    fragment.extend_from_slice(&CMD_MAP_SURFACE_TO_OUTPUT.to_le_bytes());
    fragment.extend_from_slice(&surface_id.to_le_bytes());
    fragment.extend_from_slice(&origin_x.to_le_bytes());
    fragment.extend_from_slice(&origin_y.to_le_bytes());
    Ok(CommandOutput::plain(fragment))
}

fn rect_bytes(rect: Rect) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[0..2].copy_from_slice(&rect.x.to_le_bytes());
    out[2..4].copy_from_slice(&rect.y.to_le_bytes());
    out[4..6].copy_from_slice(&rect.w.to_le_bytes());
    out[6..8].copy_from_slice(&rect.h.to_le_bytes());
    out
}

fn clip_to(rect: Rect, bounds: Rect) -> Rect {
    let x = rect.x.max(bounds.x);
    let y = rect.y.max(bounds.y);
    let right = (rect.x + rect.w).min(bounds.x + bounds.w);
    let bottom = (rect.y + rect.h).min(bounds.y + bounds.h);
    Rect::new(x, y, (right - x).max(0), (bottom - y).max(0))
}

/// A bounds-checked little-endian field reader over a single command's body window, built on
/// `ironrdp_core`'s own [`ReadCursor`] (the same primitive every PDU in `ironrdp-pdu` parses
/// with) rather than hand-rolled slice indexing.
struct Reader<'a> {
    cmd_id: u16,
    cursor: ReadCursor<'a>,
}

impl<'a> Reader<'a> {
    fn new(cmd_id: u16, buf: &'a [u8]) -> Self {
        Self {
            cmd_id,
            cursor: ReadCursor::new(buf),
        }
    }

    fn truncated(&self, needed: usize) -> GfxParseError {
        GfxParseError::TruncatedBody {
            cmd_id: self.cmd_id,
            available: self.cursor.len(),
            needed,
        }
    }

    fn read_u8(&mut self) -> Result<u8, GfxParseError> {
        self.cursor.try_read_u8().map_err(|_| self.truncated(1))
    }

    fn read_u16(&mut self) -> Result<u16, GfxParseError> {
        self.cursor.try_read_u16().map_err(|_| self.truncated(2))
    }

    fn read_i16(&mut self) -> Result<i16, GfxParseError> {
        self.cursor.try_read_i16().map_err(|_| self.truncated(2))
    }

    fn read_u32(&mut self) -> Result<u32, GfxParseError> {
        self.cursor.try_read_u32().map_err(|_| self.truncated(4))
    }

    fn read_i32(&mut self) -> Result<i32, GfxParseError> {
        self.cursor.try_read_i32().map_err(|_| self.truncated(4))
    }

    fn read_rect(&mut self) -> Result<Rect, GfxParseError> {
        let x = self.read_i16()?;
        let y = self.read_i16()?;
        let w = self.read_i16()?;
        let h = self.read_i16()?;
        Ok(Rect::new(x, y, w, h))
    }

    fn read_point(&mut self) -> Result<(i16, i16), GfxParseError> {
        let x = self.read_i16()?;
        let y = self.read_i16()?;
        Ok((x, y))
    }

    fn read_count(&mut self, field: &'static str) -> Result<u32, GfxParseError> {
        let count = u32::from(self.read_u16()?);
        if !(MIN_RECTS..=MAX_RECTS).contains(&count) {
            return Err(GfxParseError::RectCountOutOfRange { field, value: count });
        }
        Ok(count)
    }

    fn read_rects(&mut self, field: &'static str) -> Result<Vec<Rect>, GfxParseError> {
        let count = self.read_count(field)?;
        let needed = count as usize * 8;
        if self.cursor.len() < needed {
            return Err(GfxParseError::TruncatedRectArray {
                field,
                available: self.cursor.len(),
                needed,
            });
        }
        (0..count).map(|_| self.read_rect()).collect()
    }

    fn read_points(&mut self, field: &'static str) -> Result<Vec<(i16, i16)>, GfxParseError> {
        let count = self.read_count(field)?;
        let needed = count as usize * 4;
        if self.cursor.len() < needed {
            return Err(GfxParseError::TruncatedRectArray {
                field,
                available: self.cursor.len(),
                needed,
            });
        }
        (0..count).map(|_| self.read_point()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Strategy as _;

    fn header(cmd_id: u16, cmd_bytes: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&cmd_id.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&cmd_bytes.to_le_bytes());
        out
    }

    fn solid_fill_command() -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&1u16.to_le_bytes()); // surface_id
        body.extend_from_slice(&0xFF00_00FFu32.to_le_bytes()); // color
        body.extend_from_slice(&1u16.to_le_bytes()); // rect_count
        body.extend_from_slice(&rect_bytes(Rect::new(0, 0, 16, 16)));
        let mut cmd = header(CMD_SOLID_FILL, (HEADER_BYTES + body.len()) as u32);
        cmd.extend_from_slice(&body);
        cmd
    }

    fn start_end_frame_command(frame_id: u32) -> Vec<u8> {
        let mut out = Vec::new();
        let mut start_body = Vec::new();
        start_body.extend_from_slice(&frame_id.to_le_bytes());
        start_body.extend_from_slice(&0u32.to_le_bytes());
        let mut start = header(CMD_START_FRAME, (HEADER_BYTES + start_body.len()) as u32);
        start.extend_from_slice(&start_body);

        let mut end_body = Vec::new();
        end_body.extend_from_slice(&frame_id.to_le_bytes());
        let mut end = header(CMD_END_FRAME, (HEADER_BYTES + end_body.len()) as u32);
        end.extend_from_slice(&end_body);

        out.extend_from_slice(&start);
        out.extend_from_slice(&end);
        out
    }

    fn gfx_strategy() -> GfxStrategy {
        GfxStrategy::new(QuantVector::LUMA, QuantVector::STD)
    }

    fn wire_to_surface_2_command(surface_id: u16, codec_context_id: u32, rects: &[Rect]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&surface_id.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes()); // codec_id
        body.push(0); // pixel_format
        body.push(0); // flags (monitor 0)
        body.extend_from_slice(&codec_context_id.to_le_bytes());
        body.extend_from_slice(&(rects.len() as u16).to_le_bytes());
        for rect in rects {
            body.extend_from_slice(&rect_bytes(*rect));
        }
        let mut cmd = header(CMD_WIRE_TO_SURFACE_2, (HEADER_BYTES + body.len()) as u32);
        cmd.extend_from_slice(&body);
        cmd
    }

    #[test]
    fn start_end_frame_produces_two_results_with_captured_frame_id() {
        let mut strategy = gfx_strategy();
        let job = Job::GraphicsCommand {
            id: 4,
            data: start_end_frame_command(7),
            flags: JobFlags::GFX,
        };
        let results = strategy.process(job);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|result| result.job_id == 4));
        assert!(!results[0].last);
        assert!(results[1].last);
        assert_eq!(results[1].frame_id, Some(7));
        assert!(results[1].flags.contains(ResultFlags::GOT_FRAME_ID));
        assert!(!results[0].flags.contains(ResultFlags::GOT_FRAME_ID));
    }

    #[test]
    fn identical_solid_fill_jobs_produce_identical_fragments() {
        let mut strategy_a = gfx_strategy();
        let mut strategy_b = gfx_strategy();
        let data = solid_fill_command();

        let results_a = strategy_a.process(Job::GraphicsCommand {
            id: 1,
            data: data.clone(),
            flags: JobFlags::GFX,
        });
        let results_b = strategy_b.process(Job::GraphicsCommand {
            id: 2,
            data,
            flags: JobFlags::GFX,
        });

        assert_eq!(results_a.len(), 1);
        assert_eq!(results_a[0].comp_pad_data, results_b[0].comp_pad_data);
    }

    #[test]
    fn create_then_delete_surface_produces_two_results() {
        let mut strategy = gfx_strategy();
        let mut create_body = Vec::new();
        create_body.extend_from_slice(&1u16.to_le_bytes());
        create_body.extend_from_slice(&800u16.to_le_bytes());
        create_body.extend_from_slice(&600u16.to_le_bytes());
        create_body.push(32);
        let mut create = header(CMD_CREATE_SURFACE, (HEADER_BYTES + create_body.len()) as u32);
        create.extend_from_slice(&create_body);

        let mut delete_body = Vec::new();
        delete_body.extend_from_slice(&1u16.to_le_bytes());
        let mut delete = header(CMD_DELETE_SURFACE, (HEADER_BYTES + delete_body.len()) as u32);
        delete.extend_from_slice(&delete_body);

        let mut data = create;
        data.extend_from_slice(&delete);

        let job = Job::GraphicsCommand { id: 5, data, flags: JobFlags::GFX };
        let results = strategy.process(job);
        assert_eq!(results.len(), 2);
        assert!(results[1].last);
    }

    #[test]
    fn header_boundary_cmd_bytes_accepted() {
        let mut strategy = gfx_strategy();
        let data = header(0x9999, 8); // unknown cmd_id, minimal cmd_bytes
        let results = strategy.process(Job::GraphicsCommand { id: 1, data, flags: JobFlags::empty() });
        // Unknown cmd_id yields no fragment; finalize() falls back to a single safety ack.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].comp_bytes, 0);
    }

    #[test]
    fn malformed_cmd_bytes_aborts_job_with_safety_ack() {
        let mut strategy = gfx_strategy();
        let data = header(CMD_SOLID_FILL, 4); // below MIN_CMD_BYTES
        let results = strategy.process(Job::GraphicsCommand { id: 1, data, flags: JobFlags::empty() });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].comp_bytes, 0);
        assert!(results[0].last);
    }

    #[test]
    fn truncated_header_aborts_job() {
        let mut strategy = gfx_strategy();
        let data = vec![1, 2, 3];
        let results = strategy.process(Job::GraphicsCommand { id: 1, data, flags: JobFlags::empty() });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].comp_bytes, 0);
    }

    #[test]
    fn bad_command_is_skipped_and_interpreter_continues() {
        let mut strategy = gfx_strategy();
        // A SolidFill command whose body is truncated relative to its own rect_count.
        let mut bad_body = Vec::new();
        bad_body.extend_from_slice(&1u16.to_le_bytes());
        bad_body.extend_from_slice(&0u32.to_le_bytes());
        bad_body.extend_from_slice(&1u16.to_le_bytes()); // claims 1 rect, but supplies none
        let mut bad = header(CMD_SOLID_FILL, (HEADER_BYTES + bad_body.len()) as u32);
        bad.extend_from_slice(&bad_body);

        let mut data = bad;
        data.extend_from_slice(&solid_fill_command());

        let job = Job::GraphicsCommand { id: 1, data, flags: JobFlags::empty() };
        let results = strategy.process(job);
        assert_eq!(results.len(), 1);
        assert!(results[0].last);
    }

    #[test]
    fn wire_to_surface_1_rejects_undersized_nv12_buffer() {
        let mut strategy = gfx_strategy();
        let mut body = Vec::new();
        body.extend_from_slice(&1u16.to_le_bytes()); // surface_id
        body.extend_from_slice(&1u16.to_le_bytes()); // codec_id
        body.push(0); // pixel_format
        body.push(0); // flags: not already-compressed, monitor 0
        body.extend_from_slice(&1u16.to_le_bytes()); // num_rects_d
        body.extend_from_slice(&rect_bytes(Rect::new(0, 0, 16, 16)));
        body.extend_from_slice(&1u16.to_le_bytes()); // num_rects_c
        body.extend_from_slice(&rect_bytes(Rect::new(0, 0, 16, 16)));
        body.extend_from_slice(&rect_bytes(Rect::new(0, 0, 16, 16))); // target
        // 16*16*3/2 = 384 bytes required; supply far fewer.
        body.extend_from_slice(&[0u8; 8]);
        let mut data = header(CMD_WIRE_TO_SURFACE_1, (HEADER_BYTES + body.len()) as u32);
        data.extend_from_slice(&body);

        let job = Job::GraphicsCommand { id: 1, data, flags: JobFlags::GFX };
        let results = strategy.process(job);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].comp_bytes, 0);
        assert!(results[0].last);
    }

    #[test]
    fn wire_to_surface_1_emits_per_rect_quant_descriptors() {
        let mut strategy = gfx_strategy();
        let rect = Rect::new(0, 0, 4, 4);
        let mut body = Vec::new();
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes());
        body.push(0);
        body.push(0x01); // already_compressed, so no pixel-buffer minimum applies
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&rect_bytes(rect));
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&rect_bytes(rect));
        body.extend_from_slice(&rect_bytes(rect)); // target
        let mut data = header(CMD_WIRE_TO_SURFACE_1, (HEADER_BYTES + body.len()) as u32);
        data.extend_from_slice(&body);

        let job = Job::GraphicsCommand { id: 1, data, flags: JobFlags::GFX };
        let results = strategy.process(job);
        assert_eq!(results.len(), 1);
        assert!(results[0].comp_pad_data.windows(2).any(|w| w == [AVC420_QP, AVC420_QUALITY]));
    }

    #[test]
    fn wire_to_surface_2_batches_tiles_and_publishes_intermediate_results() {
        let mut strategy = gfx_strategy();
        let rects: Vec<Rect> = (0..(RFX_PRO_TILE_BATCH + 5))
            .map(|i| Rect::new((i as i16) * 64, 0, 64, 64))
            .collect();
        let data = wire_to_surface_2_command(1, 9, &rects);

        let job = Job::GraphicsCommand { id: 8, data, flags: JobFlags::GFX };
        let results = strategy.process(job);
        assert_eq!(results.len(), 2, "expected one intermediate batch plus one final batch");
        assert!(!results[0].last);
        assert!(results[1].last);
        assert!(results.iter().all(|result| result.job_id == 8));
    }

    #[test]
    fn wire_to_surface_2_single_batch_emits_one_fragment() {
        let mut strategy = gfx_strategy();
        let data = wire_to_surface_2_command(1, 9, &[Rect::new(0, 0, 64, 64)]);
        let job = Job::GraphicsCommand { id: 1, data, flags: JobFlags::GFX };
        let results = strategy.process(job);
        assert_eq!(results.len(), 1);
        assert!(results[0].last);
    }
}
