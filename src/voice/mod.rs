//! A single sound effect voice: the oscillator that synthesises it, the optional pitch bend
//! shaping its frequency, and the renderer that plugs it into the mix graph.

pub use bend::Bend;
pub use oscillator::{SquareOscillator, PEAK_AMPLITUDE};
pub use renderer::Renderer;

pub mod bend;
pub mod oscillator;
mod renderer;
