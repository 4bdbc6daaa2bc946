use crate::engine::{EngineOpts, GraphController, GraphError, GraphStatus, MixGraph};
use basedrop::Handle;
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfig,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("No audio output device available")]
    NoDevice,
    #[error("Failed to get default output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("Failed to build audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("Failed to play audio stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("Unsupported sample format: {0:?}")]
    UnsupportedFormat(SampleFormat),
    #[error("Failed to create mix graph: {0}")]
    Graph(#[from] GraphError),
}

/// A cpal output stream driven by a [`MixGraph`].
///
/// The stream keeps playing for as long as this value is alive.
pub struct AudioOutput {
    stream: Stream,
    status: Arc<GraphStatus>,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    /// Opens the default output device of the default host.
    pub fn from_default_device(opts: EngineOpts, handle: &Handle) -> Result<(Self, GraphController), OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;
        let config = device.default_output_config()?;
        Self::from_cpal(device, config, opts, handle)
    }

    /// Builds and starts an output stream on `device`.
    /// The sample rate and channel count of `config` take precedence over those in `opts`.
    pub fn from_cpal(
        device: Device,
        config: SupportedStreamConfig,
        opts: EngineOpts,
        handle: &Handle,
    ) -> Result<(Self, GraphController), OutputError> {
        let opts = EngineOpts {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
            ..opts
        };
        let (controller, graph) = MixGraph::new(&opts, handle)?;
        let status = graph.status();

        let sample_format = config.sample_format();
        let config: StreamConfig = config.into();
        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, graph)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, graph)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, graph)?,
            format => return Err(OutputError::UnsupportedFormat(format)),
        };
        stream.play()?;
        status.set_running(true);

        info!(
            "Audio output started: {} Hz, {} channels, {:?}",
            opts.sample_rate, opts.channels, sample_format
        );

        Ok((
            Self {
                stream,
                status,
                sample_rate: opts.sample_rate,
                channels: opts.channels,
            },
            controller,
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Returns `false` once the output device has gone away.
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.status.set_running(false);
        if let Err(err) = self.stream.pause() {
            debug!("Failed to pause audio stream: {}", err);
        }
    }
}

fn build_stream<T>(device: &Device, config: &StreamConfig, mut graph: MixGraph) -> Result<Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let status = graph.status();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            graph.process_interleaved(data);
        },
        move |err| {
            error!("Audio stream error: {}", err);
            if let cpal::StreamError::DeviceNotAvailable = err {
                status.set_running(false);
            }
        },
        None,
    )
}
