pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Floor division for layout arithmetic (rounds toward negative infinity).
pub(crate) fn floor_div(a: i64, b: i64) -> i64 {
    a.div_euclid(b)
}

/// Number of sample frames covering `ms` milliseconds at `sample_rate`.
pub(crate) fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    ((u128::from(ms) * u128::from(sample_rate)) / 1000) as usize
}

/// Whole milliseconds covered by `frames` sample frames at `sample_rate` (floored).
pub(crate) fn frames_to_ms(frames: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    ((frames as u128 * 1000) / u128::from(sample_rate)) as u64
}
