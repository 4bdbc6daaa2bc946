use super::oscillator::SquareOscillator;
use crate::{
    convert::mono_to_channels,
    processor::{Processor, ProcessorData, ProcessorDescription},
};
use std::panic::{self, AssertUnwindSafe};

/// Feeds the output of one oscillator into the mix graph.
///
/// The mono signal is duplicated across every output channel. If rendering ever panics the
/// renderer latches into a faulted state and only produces silence from then on, so a broken
/// voice can never take down the audio thread.
pub struct Renderer {
    oscillator: SquareOscillator,
    channels: usize,
    faulted: bool,
}

impl Renderer {
    pub fn new(oscillator: SquareOscillator, channels: usize) -> Self {
        Self {
            oscillator,
            channels,
            faulted: false,
        }
    }

    pub fn oscillator(&self) -> &SquareOscillator {
        &self.oscillator
    }

    /// Returns `true` if rendering has failed and the renderer has been silenced.
    pub fn faulted(&self) -> bool {
        self.faulted
    }
}

impl Processor for Renderer {
    fn description(&self) -> ProcessorDescription {
        ProcessorDescription {
            num_audio_outs: self.channels,
        }
    }

    fn process(&mut self, data: ProcessorData) {
        let Some((first, rest)) = data.audio_out.split_first_mut() else {
            return;
        };
        let len = data.samples.min(first.len());

        if !self.faulted {
            let oscillator = &mut self.oscillator;
            let mono = &mut first[..len];
            if panic::catch_unwind(AssertUnwindSafe(move || oscillator.render(mono))).is_err() {
                self.faulted = true;
            }
        }
        if self.faulted {
            first[..len].fill(0.0);
        }

        mono_to_channels(&first[..len], rest);
    }
}
