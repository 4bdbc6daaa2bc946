//! The live mix graph.
//!
//! The graph is split in two halves. [`MixGraph`] lives on the audio thread and renders every
//! attached voice into the output stream. [`GraphController`] lives on the control thread and
//! changes the graph topology by sending commands through a lock-free queue. Commands are only
//! applied between audio blocks, so a renderer is never detached while it is being processed.
//!
//! Renderers travel to the audio thread inside [`basedrop::Owned`], so dropping a detached
//! renderer on the audio thread merely hands it back to the collector. Its memory is freed when
//! the control thread next calls [`basedrop::Collector::collect`].

use crate::{
    convert::{interleave, split_planar},
    processor::{Mixer, Processor, ProcessorData},
    voice::Renderer,
};
use basedrop::{Handle, Owned};
use cpal::{FromSample, Sample};
use ringbuf_basedrop as ringbuf;
use slotmap::{new_key_type, SecondaryMap};
use std::{
    cell::Cell,
    panic,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use thiserror::Error;

/// Largest number of frames rendered in one pass. Longer callbacks are split into blocks.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Largest supported number of output channels.
pub const MAX_CHANNELS: usize = 8;

thread_local! {
    static RENDERING: Cell<bool> = const { Cell::new(false) };
}

/// Returns `true` while the calling thread is inside [`MixGraph::process_interleaved`].
pub fn is_rendering() -> bool {
    RENDERING.with(|r| r.get())
}

/// Wraps the current panic hook so that it is skipped for panics raised while rendering.
///
/// Renderers catch their own panics, but the hook still runs first and the default hook writes
/// to stderr, which is not allowed on the audio thread. Call once at startup.
pub fn silence_panics_while_rendering() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if !is_rendering() {
            previous(info);
        }
    }));
}

new_key_type! {
    pub struct VoiceId;
}

#[derive(Copy, Clone, Debug)]
pub struct EngineOpts {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved output channels.
    pub channels: u16,
    /// Maximum number of voices attached at once.
    pub max_voices: usize,
    /// Master gain in dB.
    pub master_gain_db: f32,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            max_voices: 32,
            master_gain_db: 0.0,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("Mix graph is not running")]
    NotRunning,
    #[error("Voice limit of {0} reached")]
    VoiceLimit(usize),
    #[error("Mix graph command queue is full")]
    QueueFull,
    #[error("Voice is already attached")]
    AlreadyAttached,
    #[error("Voice is not attached")]
    UnknownVoice,
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u16),
}

/// Whether the audio thread is currently pulling audio from the graph.
#[derive(Default, Debug)]
pub struct GraphStatus {
    running: AtomicBool,
}

impl GraphStatus {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

enum Command {
    Attach(VoiceId, Owned<Renderer>),
    Detach(VoiceId),
}

/// The audio thread half of the mix graph.
pub struct MixGraph {
    commands: ringbuf::Consumer<Command>,
    status: Arc<GraphStatus>,
    /// Attached voices, in attach order
    voices: Vec<(VoiceId, Owned<Renderer>)>,
    max_voices: usize,
    mixer: Mixer,
    channels: usize,
    /// Planar scratch block for a single voice
    voice_buffer: Vec<f32>,
    /// Planar block holding the sum of all voices
    mix_buffer: Vec<f32>,
}

/// The control thread half of the mix graph.
pub struct GraphController {
    commands: ringbuf::Producer<Command>,
    status: Arc<GraphStatus>,
    handle: Handle,
    sample_rate: u32,
    channels: usize,
    max_voices: usize,
    /// Voices attached or about to be attached
    attached: SecondaryMap<VoiceId, ()>,
}

impl MixGraph {
    /// Creates a mix graph, returning the controller for the control thread and the graph to be
    /// moved onto the audio thread. The graph starts out stopped.
    pub fn new(opts: &EngineOpts, handle: &Handle) -> Result<(GraphController, MixGraph), GraphError> {
        let channels = opts.channels as usize;
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(GraphError::UnsupportedChannels(opts.channels));
        }
        let max_voices = opts.max_voices.max(1);

        // Every attached voice needs at most one attach and one detach in flight
        let (tx, rx) = ringbuf::RingBuffer::new(2 * max_voices + 16).split(handle);
        let status = Arc::new(GraphStatus::default());

        let mut mixer = Mixer::new();
        mixer.set_gain(opts.master_gain_db);

        let controller = GraphController {
            commands: tx,
            status: status.clone(),
            handle: handle.clone(),
            sample_rate: opts.sample_rate,
            channels,
            max_voices,
            attached: SecondaryMap::new(),
        };
        let graph = MixGraph {
            commands: rx,
            status,
            voices: Vec::with_capacity(max_voices),
            max_voices,
            mixer,
            channels,
            voice_buffer: vec![0.0; channels * MAX_BLOCK_SIZE],
            mix_buffer: vec![0.0; channels * MAX_BLOCK_SIZE],
        };
        Ok((controller, graph))
    }

    pub fn status(&self) -> Arc<GraphStatus> {
        self.status.clone()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Gets the number of voices the audio thread is currently rendering.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Fills an interleaved output buffer with the sum of all attached voices.
    ///
    /// Pending attach and detach commands are applied first. This never allocates, blocks or
    /// performs I/O.
    pub fn process_interleaved<T>(&mut self, data: &mut [T])
    where
        T: Sample + FromSample<f32>,
    {
        RENDERING.with(|r| r.set(true));
        self.apply_commands();

        let channels = self.channels;
        for chunk in data.chunks_mut(channels * MAX_BLOCK_SIZE) {
            let frames = chunk.len() / channels;
            self.render_block(frames);
            interleave(&self.mix_buffer[..channels * frames], frames, chunk, |s| T::from_sample(s));
            chunk[channels * frames..].fill(T::EQUILIBRIUM);
        }
        RENDERING.with(|r| r.set(false));
    }

    fn apply_commands(&mut self) {
        while let Some(command) = self.commands.pop() {
            match command {
                Command::Attach(id, renderer) => {
                    // The controller never lets more than `max_voices` through
                    if self.voices.len() < self.max_voices {
                        self.voices.push((id, renderer));
                    }
                }
                Command::Detach(id) => {
                    // Keep attach order so the summation order of the other voices is unchanged
                    if let Some(idx) = self.voices.iter().position(|(v, _)| *v == id) {
                        self.voices.remove(idx);
                    }
                }
            }
        }
    }

    fn render_block(&mut self, frames: usize) {
        let len = self.channels * frames;
        let mix = &mut self.mix_buffer[..len];
        self.mixer.begin(mix);
        if frames == 0 {
            return;
        }

        for (_, renderer) in self.voices.iter_mut() {
            let voice = &mut self.voice_buffer[..len];
            let mut audio_out: [&mut [f32]; MAX_CHANNELS] = split_planar(voice, frames);
            renderer.process(ProcessorData {
                samples: frames,
                audio_out: &mut audio_out[..self.channels],
            });
            self.mixer.add_input(&self.voice_buffer[..len], mix);
        }

        self.mixer.finish(mix);
    }
}

impl Drop for MixGraph {
    fn drop(&mut self) {
        self.status.set_running(false);
    }
}

impl GraphController {
    /// Gets the sample rate of the graph output in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Gets the number of voices attached and not yet detached.
    pub fn attached(&self) -> usize {
        self.attached.len()
    }

    pub fn status(&self) -> &GraphStatus {
        &self.status
    }

    /// Adds a renderer as an input of the mix output.
    /// The audio thread starts rendering it from the next audio block.
    pub fn attach(&mut self, id: VoiceId, renderer: Renderer) -> Result<(), GraphError> {
        if !self.status.is_running() {
            return Err(GraphError::NotRunning);
        }
        if self.attached.contains_key(id) {
            return Err(GraphError::AlreadyAttached);
        }
        if self.attached.len() >= self.max_voices {
            return Err(GraphError::VoiceLimit(self.max_voices));
        }

        let renderer = Owned::new(&self.handle, renderer);
        self.commands
            .push(Command::Attach(id, renderer))
            .map_err(|_| GraphError::QueueFull)?;
        self.attached.insert(id, ());
        Ok(())
    }

    /// Removes an input from the mix output.
    /// The audio thread stops rendering it before its next audio block.
    pub fn detach(&mut self, id: VoiceId) -> Result<(), GraphError> {
        if !self.attached.contains_key(id) {
            return Err(GraphError::UnknownVoice);
        }
        self.commands
            .push(Command::Detach(id))
            .map_err(|_| GraphError::QueueFull)?;
        self.attached.remove(id);
        Ok(())
    }
}
