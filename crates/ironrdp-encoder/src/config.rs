//! Environment-driven configuration surface.
//!
//! Mirrors the reference implementation's `g_atoix` + range-check + log-and-discard pattern for
//! `frames_in_flight`/`max_compressed_bytes`; see `xrdp_encoder_create`.

pub const MIN_FRAMES_IN_FLIGHT: u8 = 1;
pub const MAX_FRAMES_IN_FLIGHT: u8 = 16;
pub const DEFAULT_FRAMES_IN_FLIGHT: u8 = 2;

pub const MIN_MAX_COMPRESSED_BYTES: usize = 64 * 1024;
pub const MAX_MAX_COMPRESSED_BYTES: usize = 256 * 1024 * 1024;
pub const DEFAULT_MAX_COMPRESSED_BYTES: usize = 3 * 1024 * 1024;

const ENV_FRAMES_IN_FLIGHT: &str = "XRDP_GFX_FRAMES_IN_FLIGHT";
const ENV_MAX_COMPRESSED_BYTES: &str = "XRDP_GFX_MAX_COMPRESSED_BYTES";

/// Per-encoder tunables, clamped to the ranges the worker relies on (invariant 2 of the data
/// model, invariant 4 of the testable properties).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub frames_in_flight: u8,
    pub max_compressed_bytes: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: DEFAULT_FRAMES_IN_FLIGHT,
            max_compressed_bytes: DEFAULT_MAX_COMPRESSED_BYTES,
        }
    }
}

impl EncoderConfig {
    /// Reads the two environment overrides, falling back to defaults on missing, unparseable,
    /// or out-of-range values (logging the rejection, never failing construction).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(value) = parse_env_u8(ENV_FRAMES_IN_FLIGHT, MIN_FRAMES_IN_FLIGHT, MAX_FRAMES_IN_FLIGHT) {
            config.frames_in_flight = value;
        }

        if let Some(value) = parse_env_usize(
            ENV_MAX_COMPRESSED_BYTES,
            MIN_MAX_COMPRESSED_BYTES,
            MAX_MAX_COMPRESSED_BYTES,
        ) {
            config.max_compressed_bytes = value;
        }

        config.clamp();
        config
    }

    /// Clamps `frames_in_flight` to at least 1, matching `MAX(self->frames_in_flight, 1)` in the
    /// reference constructor.
    pub fn clamp(&mut self) {
        self.frames_in_flight = self.frames_in_flight.max(MIN_FRAMES_IN_FLIGHT);
    }

    /// Legacy (non-GFX) mode derives `max_compressed_bytes` from the client's reported max
    /// fastpath fragment size, masked to a 16-byte boundary.
    pub fn from_legacy_fragment_size(max_fastpath_frag_bytes: usize, frames_in_flight: u8) -> Self {
        Self {
            frames_in_flight: frames_in_flight.max(MIN_FRAMES_IN_FLIGHT),
            max_compressed_bytes: max_fastpath_frag_bytes & !15,
        }
    }
}

fn parse_env_u8(name: &str, min: u8, max: u8) -> Option<u8> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<u8>() {
        Ok(value) if (min..=max).contains(&value) => Some(value),
        Ok(value) => {
            warn!(%name, value, min, max, "environment override out of range, ignoring");
            None
        }
        Err(_) => {
            warn!(%name, %raw, "environment override is not an integer, ignoring");
            None
        }
    }
}

fn parse_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<usize>() {
        Ok(value) if (min..=max).contains(&value) => Some(value),
        Ok(value) => {
            warn!(%name, value, min, max, "environment override out of range, ignoring");
            None
        }
        Err(_) => {
            warn!(%name, %raw, "environment override is not an integer, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_defaults() {
        let config = EncoderConfig::default();
        assert_eq!(config.frames_in_flight, 2);
        assert_eq!(config.max_compressed_bytes, 3 * 1024 * 1024);
    }

    #[test]
    fn clamp_never_drops_below_one() {
        let mut config = EncoderConfig {
            frames_in_flight: 0,
            max_compressed_bytes: DEFAULT_MAX_COMPRESSED_BYTES,
        };
        config.clamp();
        assert_eq!(config.frames_in_flight, 1);
    }

    #[test]
    fn legacy_fragment_size_is_masked_to_16_bytes() {
        let config = EncoderConfig::from_legacy_fragment_size(1031, 2);
        assert_eq!(config.max_compressed_bytes, 1024);
    }
}
