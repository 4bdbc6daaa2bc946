/// A pitch bend, mapping the time elapsed since a voice started to its instantaneous frequency.
#[derive(Clone, Copy, Debug)]
pub enum Bend {
    /// Slides linearly from `from` Hz to `to` Hz over the first `seconds`, then holds at `to`.
    Glide {
        /// Frequency at the start of the voice, in Hz.
        from: f64,
        /// Frequency held once the glide completes, in Hz.
        to: f64,
        /// Length of the glide in seconds.
        seconds: f64,
    },
    /// An arbitrary function of elapsed seconds returning Hz.
    /// Runs on the audio thread, so it must not block or allocate.
    Custom(fn(f64) -> f64),
}

impl Bend {
    /// Gets the frequency in Hz at `t` seconds after the voice started.
    pub fn frequency_at(&self, t: f64) -> f64 {
        match *self {
            Bend::Glide { from, to, seconds } => {
                if t >= seconds {
                    to
                } else {
                    from + (to - from) * (t / seconds)
                }
            }
            Bend::Custom(f) => f(t),
        }
    }
}
