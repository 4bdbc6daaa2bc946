//! Fire-and-forget playback of sound effects.
//!
//! [`SfxPlayer`] attaches one voice to the mix graph per trigger and schedules its teardown for
//! when the effect's nominal duration has elapsed. The oscillator silences itself on its own frame
//! counter, so teardown only reclaims resources and its timing never affects what is heard.

use crate::{
    engine::{GraphController, GraphError, VoiceId},
    preset::{Preset, PresetTable},
    voice::Renderer,
};
use basedrop::Collector;
use slotmap::SlotMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TriggerError {
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
    #[error("Unknown voice")]
    UnknownVoice,
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A voice that is attached to the mix graph.
struct ActiveVoice {
    /// Name of the preset being played
    preset: String,
    /// When the voice is due to be detached
    deadline: Instant,
}

pub struct SfxPlayer {
    graph: GraphController,
    collector: Collector,
    presets: PresetTable,
    voices: SlotMap<VoiceId, ActiveVoice>,
}

impl SfxPlayer {
    pub fn new(graph: GraphController, collector: Collector, presets: PresetTable) -> Self {
        Self {
            graph,
            collector,
            presets,
            voices: SlotMap::with_key(),
        }
    }

    pub fn presets(&self) -> &PresetTable {
        &self.presets
    }

    pub fn presets_mut(&mut self) -> &mut PresetTable {
        &mut self.presets
    }

    /// Gets the number of voices which have been triggered and not yet torn down.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Gets the earliest time at which a voice is due to be torn down.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.voices.values().map(|v| v.deadline).min()
    }

    /// Starts playing the preset with the given name.
    pub fn trigger(&mut self, name: &str) -> Result<VoiceId, TriggerError> {
        let preset = self
            .presets
            .get(name)
            .cloned()
            .ok_or_else(|| TriggerError::UnknownPreset(name.to_string()))?;
        self.trigger_preset(&preset)
    }

    /// Starts playing `preset` and returns immediately.
    /// On failure nothing is attached and no teardown is scheduled.
    pub fn trigger_preset(&mut self, preset: &Preset) -> Result<VoiceId, TriggerError> {
        let oscillator = preset.oscillator(self.graph.sample_rate());
        let renderer = Renderer::new(oscillator, self.graph.channels());

        // Durations that are negative or not finite get torn down at once
        let now = Instant::now();
        let lifetime = Duration::try_from_secs_f64(preset.duration).unwrap_or(Duration::ZERO);
        let deadline = now.checked_add(lifetime).unwrap_or(now);
        let id = self.voices.insert(ActiveVoice {
            preset: preset.name.clone(),
            deadline,
        });

        if let Err(err) = self.graph.attach(id, renderer) {
            self.voices.remove(id);
            warn!("Failed to play {}: {}", preset.name, err);
            return Err(err.into());
        }

        debug!("Playing {} for {}s", preset.name, preset.duration);
        Ok(id)
    }

    /// Stops a voice immediately, regardless of how much of it is left to play.
    pub fn cancel(&mut self, id: VoiceId) -> Result<(), TriggerError> {
        if !self.voices.contains_key(id) {
            return Err(TriggerError::UnknownVoice);
        }
        self.release(id)?;
        self.collector.collect();
        Ok(())
    }

    /// Stops every voice immediately.
    pub fn stop_all(&mut self) {
        let ids: Vec<VoiceId> = self.voices.keys().collect();
        for id in ids {
            if let Err(err) = self.release(id) {
                warn!("Failed to stop voice: {}", err);
            }
        }
        self.collector.collect();
    }

    /// Tears down every voice whose duration has elapsed by `now`, then frees the memory of
    /// voices the audio thread has let go of. Returns the number of voices torn down.
    pub fn update(&mut self, now: Instant) -> usize {
        let expired: Vec<VoiceId> = self
            .voices
            .iter()
            .filter(|(_, v)| v.deadline <= now)
            .map(|(id, _)| id)
            .collect();

        let mut released = 0;
        for id in expired {
            match self.release(id) {
                Ok(()) => released += 1,
                // Stays scheduled and is retried on the next update
                Err(err) => warn!("Failed to tear down voice: {}", err),
            }
        }

        self.collector.collect();
        released
    }

    fn release(&mut self, id: VoiceId) -> Result<(), GraphError> {
        self.graph.detach(id)?;
        if let Some(voice) = self.voices.remove(id) {
            debug!("Released {}", voice.preset);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        engine::{EngineOpts, MixGraph},
        voice::PEAK_AMPLITUDE,
    };

    fn player(opts: EngineOpts) -> (SfxPlayer, MixGraph) {
        let collector = Collector::new();
        let (controller, graph) = MixGraph::new(&opts, &collector.handle()).unwrap();
        graph.status().set_running(true);
        (SfxPlayer::new(controller, collector, PresetTable::builtin()), graph)
    }

    fn later(seconds: f64) -> Instant {
        Instant::now() + Duration::from_secs_f64(seconds)
    }

    #[test]
    fn test_trigger_plays_preset() {
        let (mut player, mut graph) = player(EngineOpts::default());
        player.trigger("attack").unwrap();
        assert_eq!(player.active_voices(), 1);

        let mut data = [0.0f32; 2 * 28];
        graph.process_interleaved(&mut data);
        assert_eq!(graph.voice_count(), 1);
        assert!(data.iter().all(|&s| s == PEAK_AMPLITUDE));
    }

    #[test]
    fn test_trigger_builtin_names() {
        let (mut player, mut graph) = player(EngineOpts::default());
        for name in ["Attack", "DoorOpen", "ButtonSelect"] {
            assert!(player.trigger(name).is_ok(), "{}", name);
        }
        graph.process_interleaved(&mut [0.0f32; 64]);
        assert_eq!(graph.voice_count(), 3);
    }

    #[test]
    fn test_unknown_preset() {
        let (mut player, _graph) = player(EngineOpts::default());
        assert_eq!(
            player.trigger("explosion"),
            Err(TriggerError::UnknownPreset("explosion".to_string()))
        );
        assert_eq!(player.active_voices(), 0);
    }

    #[test]
    fn test_attach_failure_schedules_nothing() {
        let (mut player, graph) = player(EngineOpts::default());
        graph.status().set_running(false);
        assert_eq!(
            player.trigger("attack"),
            Err(TriggerError::Graph(GraphError::NotRunning))
        );
        assert_eq!(player.active_voices(), 0);
        assert_eq!(player.next_deadline(), None);
    }

    #[test]
    fn test_teardown_after_duration() {
        let (mut player, mut graph) = player(EngineOpts::default());
        player.trigger("button_select").unwrap();
        player.trigger("door_open").unwrap();
        graph.process_interleaved(&mut [0.0f32; 128]);

        assert_eq!(player.update(Instant::now()), 0);
        assert!(player.next_deadline().unwrap() > Instant::now());

        // Only the button has finished
        assert_eq!(player.update(later(0.3)), 1);
        assert_eq!(player.active_voices(), 1);
        graph.process_interleaved(&mut [0.0f32; 128]);
        assert_eq!(graph.voice_count(), 1);

        assert_eq!(player.update(later(1.0)), 1);
        assert_eq!(player.active_voices(), 0);
        assert_eq!(player.next_deadline(), None);
        graph.process_interleaved(&mut [0.0f32; 128]);
        assert_eq!(graph.voice_count(), 0);
    }

    #[test]
    fn test_overlapping_voices_are_independent() {
        let (mut player, mut graph) = player(EngineOpts {
            channels: 1,
            ..Default::default()
        });
        let first = player.trigger("attack").unwrap();
        let mut data = [0.0f32; 100];
        graph.process_interleaved(&mut data);

        // Started 100 frames later, so the two voices are out of phase
        player.trigger("attack").unwrap();
        graph.process_interleaved(&mut data);
        assert_eq!(graph.voice_count(), 2);

        player.cancel(first).unwrap();
        graph.process_interleaved(&mut data);
        assert_eq!(graph.voice_count(), 1);

        let mut reference = Preset::attack().oscillator(48000);
        let mut expected = [0.0f32; 200];
        reference.render(&mut expected);
        assert_eq!(data[..], expected[100..]);
    }

    #[test]
    fn test_cancel_unknown_voice() {
        let (mut player, _graph) = player(EngineOpts::default());
        let id = player.trigger("attack").unwrap();
        player.cancel(id).unwrap();
        assert_eq!(player.cancel(id), Err(TriggerError::UnknownVoice));
    }

    #[test]
    fn test_stop_all() {
        let (mut player, mut graph) = player(EngineOpts::default());
        for name in ["attack", "door_open", "button_select"] {
            player.trigger(name).unwrap();
        }
        graph.process_interleaved(&mut [0.0f32; 64]);
        assert_eq!(graph.voice_count(), 3);

        player.stop_all();
        assert_eq!(player.active_voices(), 0);
        graph.process_interleaved(&mut [0.0f32; 64]);
        assert_eq!(graph.voice_count(), 0);
    }

    #[test]
    fn test_voice_limit_recovers_after_teardown() {
        let (mut player, mut graph) = player(EngineOpts {
            max_voices: 1,
            ..Default::default()
        });
        player.trigger("button_select").unwrap();
        assert_eq!(
            player.trigger("attack"),
            Err(TriggerError::Graph(GraphError::VoiceLimit(1)))
        );

        graph.process_interleaved(&mut [0.0f32; 64]);
        player.update(later(0.2));
        assert!(player.trigger("attack").is_ok());
    }

    #[test]
    fn test_custom_preset() {
        let (mut player, _graph) = player(EngineOpts::default());
        player.presets_mut().insert(Preset::new("coin", 0.15, 1760.0, None));
        assert!(player.trigger("coin").is_ok());
    }
}
