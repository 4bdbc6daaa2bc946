pub trait AudioBuffer<'a>: Sized {
    fn samples(self) -> &'a [f32];
}

pub trait AudioBufferMut<'a>: AudioBuffer<'a> {
    fn samples_mut(self) -> &'a mut [f32];

    /// Fills the audio buffer with silence.
    fn clear(self) {
        self.samples_mut().fill(0.0);
    }

    /// Clips the samples to within the range `min` to `max`.
    fn clip(self, min: f32, max: f32) {
        for sample in self.samples_mut().iter_mut() {
            *sample = sample.clamp(min, max);
        }
    }

    /// Adds the samples from `other` to the samples in this buffer, multiplied by `scale`.
    fn add_scaled<'b>(self, other: impl AudioBuffer<'b>, scale: f32) {
        self.combine(other, |_, s_out, s_in| s_out + scale * s_in)
    }

    /// Combines each sample of this buffer with the matching sample of `other`.
    /// Only the overlapping prefix of the two buffers is touched.
    fn combine<'b>(self, other: impl AudioBuffer<'b>, mut f: impl FnMut(usize, f32, f32) -> f32) {
        let samples_in = other.samples();
        let samples_out = self.samples_mut();
        for (idx, (s_out, s_in)) in samples_out.iter_mut().zip(samples_in.iter()).enumerate() {
            *s_out = (f)(idx, *s_out, *s_in);
        }
    }
}

impl<'a> AudioBuffer<'a> for &'a [f32] {
    fn samples(self) -> &'a [f32] {
        self
    }
}

impl<'a> AudioBuffer<'a> for &'a mut [f32] {
    fn samples(self) -> &'a [f32] {
        self
    }
}

impl<'a> AudioBufferMut<'a> for &'a mut [f32] {
    fn samples_mut(self) -> &'a mut [f32] {
        self
    }
}
