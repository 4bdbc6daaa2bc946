use crate::{audio::buffer::AudioBufferMut, util::scale_from_gain};

/// Sums voices into a single output signal.
pub struct Mixer {
    /// The master gain factor applied to each input
    scale: f32,
}

impl Default for Mixer {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Mixer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the master gain in dB.
    pub fn set_gain(&mut self, gain: f32) {
        self.scale = scale_from_gain(gain);
    }

    /// Clears the output block before a new round of summation.
    pub fn begin(&self, audio_out: &mut [f32]) {
        audio_out.clear();
    }

    /// Adds one input block to the output block.
    pub fn add_input(&self, audio_in: &[f32], audio_out: &mut [f32]) {
        audio_out.add_scaled(audio_in, self.scale);
    }

    /// Limits the summed output to the full-scale range.
    pub fn finish(&self, audio_out: &mut [f32]) {
        audio_out.clip(-1.0, 1.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sums_inputs() {
        let mixer = Mixer::new();
        let mut out = [9.0; 3];
        mixer.begin(&mut out);
        mixer.add_input(&[0.25, 0.5, -0.25], &mut out);
        mixer.add_input(&[0.25, -0.5, -0.25], &mut out);
        mixer.finish(&mut out);
        assert_eq!(out, [0.5, 0.0, -0.5]);
    }

    #[test]
    fn test_gain() {
        let mut mixer = Mixer::new();
        mixer.set_gain(-20.0);
        let mut out = [0.0; 2];
        mixer.add_input(&[0.5, -0.5], &mut out);
        assert!((out[0] - 0.05).abs() < 1e-6);
        assert!((out[1] + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_finish_clips() {
        let mixer = Mixer::new();
        let mut out = [0.0; 2];
        mixer.add_input(&[0.8, -0.8], &mut out);
        mixer.add_input(&[0.8, -0.8], &mut out);
        mixer.finish(&mut out);
        assert_eq!(out, [1.0, -1.0]);
    }
}
