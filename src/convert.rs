/// Interleaves a planar signal, where each channel occupies `frames` consecutive samples of `planar`,
/// into `output`, converting each sample with `convert`.
/// Trailing samples of `output` that do not form a whole frame are left untouched.
pub fn interleave<T>(planar: &[f32], frames: usize, output: &mut [T], mut convert: impl FnMut(f32) -> T) {
    if frames == 0 {
        return;
    }
    let channels = planar.len() / frames;
    if channels == 0 {
        return;
    }
    for (frame, out) in output.chunks_exact_mut(channels).take(frames).enumerate() {
        let channel_samples = planar.iter().skip(frame).step_by(frames);
        for (sample, &s) in out.iter_mut().zip(channel_samples) {
            *sample = convert(s);
        }
    }
}

/// Copies a mono signal into every channel of a multi-channel signal.
pub fn mono_to_channels(mono: &[f32], channels: &mut [&mut [f32]]) {
    for channel in channels.iter_mut() {
        for (out, &s) in channel.iter_mut().zip(mono.iter()) {
            *out = s;
        }
    }
}

/// Splits a planar buffer into per-channel slices of `frames` samples each.
/// Unused slots are left as empty slices.
pub fn split_planar<const N: usize>(planar: &mut [f32], frames: usize) -> [&mut [f32]; N] {
    let mut channels: [&mut [f32]; N] = std::array::from_fn(|_| Default::default());
    if frames == 0 {
        return channels;
    }
    for (slot, chunk) in channels.iter_mut().zip(planar.chunks_exact_mut(frames)) {
        *slot = chunk;
    }
    channels
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_interleave() {
        let planar = [1.0, 2.0, 3.0, -1.0, -2.0, -3.0];
        let mut output = [0.0; 6];
        interleave(&planar, 3, &mut output, |s| s);
        assert_eq!(output, [1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
    }

    #[test]
    fn test_interleave_converts() {
        let planar = [0.5, -0.5];
        let mut output = [0i32; 2];
        interleave(&planar, 2, &mut output, |s| (s * 10.0) as i32);
        assert_eq!(output, [5, -5]);
    }

    #[test]
    fn test_mono_to_channels() {
        let mono = [0.25, -0.25];
        let mut left = [0.0; 2];
        let mut right = [1.0; 2];
        mono_to_channels(&mono, &mut [&mut left[..], &mut right[..]]);
        assert_eq!(left, mono);
        assert_eq!(right, mono);
    }

    #[test]
    fn test_split_planar() {
        let mut planar = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let channels: [&mut [f32]; 4] = split_planar(&mut planar, 2);
        assert_eq!(channels[0], &[1.0, 2.0]);
        assert_eq!(channels[2], &[5.0, 6.0]);
        assert!(channels[3].is_empty());
    }
}
