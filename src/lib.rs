pub mod audio;
pub mod convert;
pub mod engine;
pub mod player;
pub mod preset;
pub mod processor;
mod util;
pub mod voice;
