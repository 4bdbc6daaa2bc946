use crate::voice::{Bend, SquareOscillator};

/// A named sound effect.
#[derive(Clone, Debug)]
pub struct Preset {
    /// Name used to trigger the effect.
    pub name: String,
    /// Length of the effect in seconds.
    pub duration: f64,
    /// Frequency in Hz, used for the whole effect unless `bend` is set.
    pub base_frequency: f64,
    /// Optional pitch bend over the course of the effect.
    pub bend: Option<Bend>,
}

impl Preset {
    pub fn new(name: impl Into<String>, duration: f64, base_frequency: f64, bend: Option<Bend>) -> Self {
        Self {
            name: name.into(),
            duration,
            base_frequency,
            bend,
        }
    }

    /// A short, high blip.
    pub fn attack() -> Self {
        Self::new("Attack", 0.3, 880.0, None)
    }

    /// A low tone sliding up an octave over its first tenth of a second.
    pub fn door_open() -> Self {
        let bend = Bend::Glide {
            from: 110.0,
            to: 220.0,
            seconds: 0.1,
        };
        Self::new("DoorOpen", 0.6, 110.0, Some(bend))
    }

    /// A very short, very high click.
    pub fn button_select() -> Self {
        Self::new("ButtonSelect", 0.1, 1320.0, None)
    }

    /// Creates an oscillator which plays this effect at the given sample rate.
    pub fn oscillator(&self, sample_rate: u32) -> SquareOscillator {
        SquareOscillator::new(sample_rate, self.duration, self.base_frequency, self.bend)
    }
}

/// A collection of presets, looked up by name.
///
/// Lookups ignore ASCII case and any `_` or `-` separators, so `DoorOpen`, `door_open` and
/// `door-open` all name the same preset.
#[derive(Clone, Debug, Default)]
pub struct PresetTable {
    presets: Vec<Preset>,
}

impl PresetTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a table holding the built-in effects.
    pub fn builtin() -> Self {
        Self {
            presets: vec![Preset::attack(), Preset::door_open(), Preset::button_select()],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| same_name(&p.name, name))
    }

    /// Adds a preset, replacing any existing preset with the same name.
    pub fn insert(&mut self, preset: Preset) {
        match self.presets.iter_mut().find(|p| same_name(&p.name, &preset.name)) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    fn normalize(name: &str) -> impl Iterator<Item = char> + '_ {
        name.chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
    }
    normalize(a).eq(normalize(b))
}
