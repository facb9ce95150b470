// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! Bit twiddling used by the immediate-encoding checks and the peephole
//! fusions.

#[must_use]
pub const fn is_int16(value: i32) -> bool {
    value >= i16::MIN as i32 && value <= i16::MAX as i32
}

#[must_use]
pub const fn is_uint16(value: i32) -> bool {
    value >= 0 && value <= u16::MAX as i32
}

#[must_use]
pub const fn is_uint5(value: i32) -> bool {
    value >= 0 && value <= 0x1f
}

#[must_use]
pub const fn is_power_of_two(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

/// The exponent of a power of two. Only meaningful when
/// [`is_power_of_two`] holds.
#[must_use]
pub const fn which_power_of_two(value: u32) -> u32 {
    value.trailing_zeros()
}

/// Whether the mask is a non-empty run of ones starting at bit 0.
#[must_use]
pub const fn is_low_contiguous_mask(mask: u32) -> bool {
    let width = mask.count_ones();
    width != 0 && mask.leading_zeros() + width == 32
}
