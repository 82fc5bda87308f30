use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

/// Short decaying sine used as an attention cue when no speech synthesizer is
/// available.
pub struct ConfirmChime {
    freq: f32,
    sample_rate: u32,
    num_sample: usize,
    total_samples: usize,
}

impl ConfirmChime {
    pub fn new(freq: f32) -> Self {
        let sample_rate = 44100;
        Self {
            freq,
            sample_rate,
            num_sample: 0,
            total_samples: (0.4 * sample_rate as f32) as usize,
        }
    }
}

impl Iterator for ConfirmChime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        self.num_sample = self.num_sample.wrapping_add(1);

        let t = self.num_sample as f32 / self.sample_rate as f32;
        let decay = 1.0 - self.num_sample as f32 / self.total_samples as f32;

        Some((2.0 * PI * self.freq * t).sin() * 0.25 * decay)
    }
}

impl Source for ConfirmChime {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_samples as f32 / self.sample_rate as f32,
        ))
    }
}
