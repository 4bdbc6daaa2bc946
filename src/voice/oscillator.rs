use super::bend::Bend;
use crate::util::frames_from_seconds;

/// Peak amplitude of the square wave, leaving headroom for several voices to be summed.
pub const PEAK_AMPLITUDE: f32 = 0.8;

/// A finite-length square wave oscillator.
///
/// The phase of every frame is computed from the absolute elapsed time rather than accumulated,
/// so the output only depends on the frame index. Rendering the same frames in one call or in
/// many smaller calls yields identical samples.
#[derive(Clone, Copy, Debug)]
pub struct SquareOscillator {
    /// Sample rate in Hz, fixed for the lifetime of the oscillator.
    sample_rate: u32,
    /// Number of frames which produce sound.
    total_frames: u64,
    /// Index of the next frame to be rendered.
    current_frame: u64,
    /// Latched once `current_frame` reaches `total_frames`.
    finished: bool,
    /// Frequency used when there is no bend, in Hz.
    base_frequency: f64,
    /// Optional pitch bend overriding `base_frequency`.
    bend: Option<Bend>,
}

impl SquareOscillator {
    /// Creates an oscillator which sounds for `duration` seconds, rounded to the nearest frame.
    pub fn new(sample_rate: u32, duration: f64, base_frequency: f64, bend: Option<Bend>) -> Self {
        let total_frames = frames_from_seconds(duration, sample_rate);
        Self {
            sample_rate,
            total_frames,
            current_frame: 0,
            finished: total_frames == 0,
            base_frequency,
            bend,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Returns `true` once every sounding frame has been rendered.
    /// All further output is silence.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Gets the instantaneous frequency in Hz at `t` seconds into the voice.
    pub fn frequency_at(&self, t: f64) -> f64 {
        match &self.bend {
            Some(bend) => bend.frequency_at(t),
            None => self.base_frequency,
        }
    }

    /// Fills `out` with the next `out.len()` frames and advances the frame counter by that amount.
    /// Frames at or past the end of the voice are silent.
    ///
    /// This never allocates, blocks or performs I/O, and is safe to call from the audio thread.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.finished {
            out.fill(0.0);
        } else {
            let sample_rate = self.sample_rate as f64;
            for (frame, sample) in (self.current_frame..).zip(out.iter_mut()) {
                *sample = if frame < self.total_frames {
                    let t = frame as f64 / sample_rate;
                    square(t * self.frequency_at(t))
                } else {
                    0.0
                };
            }
        }

        self.current_frame = self.current_frame.saturating_add(out.len() as u64);
        if self.current_frame >= self.total_frames {
            self.finished = true;
        }
    }
}

/// A square wave with a 50% duty cycle, high for the first half of each cycle.
fn square(phase: f64) -> f32 {
    if phase % 1.0 < 0.5 {
        PEAK_AMPLITUDE
    } else {
        -PEAK_AMPLITUDE
    }
}
