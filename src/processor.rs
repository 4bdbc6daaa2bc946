pub use io::{AudioOutput, OutputError};
pub use mixer::Mixer;

mod io;
mod mixer;

pub struct ProcessorData<'a, 'b> {
    /// Number of samples in each audio block
    pub samples: usize,
    /// List of output audio blocks, one per channel
    pub audio_out: &'a mut [&'b mut [f32]],
}

#[derive(Copy, Clone, Debug)]
pub struct ProcessorDescription {
    pub num_audio_outs: usize,
}

/// A real-time audio source driven by the mix graph.
///
/// `process` is called on the audio thread. Implementations must not block, allocate,
/// perform I/O or panic out of the call. A panic that is caught inside `process` still runs the
/// process panic hook, see [`crate::engine::silence_panics_while_rendering`].
pub trait Processor: Send {
    /// Gets information about the processor.
    fn description(&self) -> ProcessorDescription;

    /// Overwrites every output block with the next `samples` frames of audio.
    fn process(&mut self, data: ProcessorData);
}
