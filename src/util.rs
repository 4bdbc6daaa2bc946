/// Converts a relative gain in dB to the corresponding voltage ratio/scaling factor.
pub fn scale_from_gain(gain: f32) -> f32 {
    10.0_f32.powf(gain / 20.0)
}

/// Converts a duration in seconds to a whole number of frames, rounding to the nearest frame.
/// Negative and NaN durations yield zero frames.
pub fn frames_from_seconds(seconds: f64, sample_rate: u32) -> u64 {
    // `as` saturates, so negative values and NaN land on 0
    (seconds * sample_rate as f64).round() as u64
}
