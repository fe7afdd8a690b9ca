//! Bit-level helpers for the packed telemetry frame.
//!
//! Bytes 23..=40 of the frame carry several sub-fields each, packed
//! LSB-first. Wide values are split across a 7-bit low byte plus high
//! (and sometimes super-high) bit segments.

/// Extracts `width` bits of `byte` starting at `offset` from the LSB.
pub fn seg(byte: u8, offset: u8, width: u8) -> u8 {
    debug_assert!(offset + width <= 8);
    (byte >> offset) & ((1u8 << width) - 1)
}

/// Sign-extends a `bits`-wide unsigned value.
pub fn to_signed(value: u32, bits: u32) -> i32 {
    let max = 1i64 << bits;
    let value = value as i64;
    if value >= max / 2 {
        (value - max) as i32
    } else {
        value as i32
    }
}

/// Combines a 7-bit low byte with a high segment shifted to bit 7.
/// The result is masked to the 20-bit range the frame format uses.
pub fn low_plus_high(low: u8, high: u8) -> u32 {
    (((low & 0x7f) as u32) | ((high as u32) << 7)) & 0xf_ffff
}

/// Three-part combination: 7 low bits, 7 high bits, super-high bits at
/// bit 14. Used by the hour counters.
pub fn low_plus_high_super(low: u8, high: u8, super_high: u8) -> u32 {
    (((low & 0x7f) as u32) | (((high & 0x7f) as u32) << 7) | ((super_high as u32) << 14))
        & 0xf_ffff
}

/// Barometric pressure: 4 LSB bits plus 5 MSB bits, offset by 700 hPa.
pub fn pressure(msb5: u8, lsb4: u8) -> u32 {
    ((lsb4 & 0x0f) as u32 | (((msb5 & 0x1f) as u32) << 4)) + 700
}
