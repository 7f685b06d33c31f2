//! RemoteFX quantization vectors.
//!
//! Field order and the documented value range (6-15, higher = more compression, lower quality)
//! are grounded on `ironrdp_pdu::codecs::rfx::data_messages::Quant` (`TS_RFX_CODEC_QUANT`,
//! [MS-RDPRFX] 2.2.2.1.5).
//!
//! `LUMA` and the STD/LQ/ULQ presets are a byte-for-byte port of the reference implementation's
//! nibble-packed quantization tables (`g_rfx_quantization_values_std/lq/ulq`,
//! `examples/original_source/xrdp/xrdp_encoder.c:61-78`). Each table is 10 bytes, read as 5
//! nibble-pairs covering two channels' worth of subband values in the order
//! `LH3 LL3, HH3 HL3, HL2 LH2, LH1 HH2, HH1 HL1` (high nibble first): the first 5 bytes are the Y
//! channel and are identical across all three tiers, the last 5 are the Cb=Cr channel and are
//! what actually varies by connection class. `LUMA` captures the invariant first half; `STD`/`LQ`/
//! `ULQ` capture the per-tier second half, selected by `for_connection_class` per §4.A step 5.

/// A 10-value per-subband quantization table, one entry per DWT subband (see the GLOSSARY):
/// LL3, LH3, HL3, HH3, LH2, HL2, HH2, LH1, HL1, HH1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantVector {
    pub ll3: u8,
    pub lh3: u8,
    pub hl3: u8,
    pub hh3: u8,
    pub lh2: u8,
    pub hl2: u8,
    pub hh2: u8,
    pub lh1: u8,
    pub hl1: u8,
    pub hh1: u8,
}

impl QuantVector {
    /// The Y channel's table, invariant across connection classes in the reference byte tables.
    pub const LUMA: Self = Self {
        ll3: 6,
        lh3: 6,
        hl3: 6,
        hh3: 6,
        lh2: 7,
        hl2: 7,
        hh2: 7,
        lh1: 8,
        hl1: 8,
        hh1: 9,
    };

    pub const STD: Self = Self {
        ll3: 6,
        lh3: 7,
        hl3: 7,
        hh3: 7,
        lh2: 8,
        hl2: 8,
        hh2: 8,
        lh1: 9,
        hl1: 9,
        hh1: 9,
    };

    pub const LQ: Self = Self {
        ll3: 10,
        lh3: 10,
        hl3: 10,
        hh3: 10,
        lh2: 10,
        hl2: 10,
        hh2: 10,
        lh1: 10,
        hl1: 10,
        hh1: 10,
    };

    pub const ULQ: Self = Self {
        ll3: 11,
        lh3: 11,
        hl3: 11,
        hh3: 11,
        lh2: 11,
        hl2: 11,
        hh2: 11,
        lh1: 11,
        hl1: 11,
        hh1: 11,
    };

    /// Selects a table by connection class, per §4.A step 5: ULQ for modem/satellite/
    /// broadband-low, LQ for broadband-high/WAN, STD otherwise.
    pub fn for_connection_class(class: crate::capability::ConnectionClass) -> Self {
        use crate::capability::ConnectionClass as C;
        match class {
            C::Modem | C::Satellite | C::BroadbandLow => Self::ULQ,
            C::BroadbandHigh | C::Wan => Self::LQ,
            C::Lan | C::Autodetect => Self::STD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_stay_within_documented_range() {
        for preset in [QuantVector::LUMA, QuantVector::STD, QuantVector::LQ, QuantVector::ULQ] {
            let fields = [
                preset.ll3, preset.lh3, preset.hl3, preset.hh3, preset.lh2, preset.hl2, preset.hh2, preset.lh1,
                preset.hl1, preset.hh1,
            ];
            for shift in fields {
                assert!((6..=15).contains(&shift));
            }
        }
    }
}
