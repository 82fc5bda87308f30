use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

/// Two-tone emergency siren: alternates between a low and a high pitch a few
/// times a second, for a fixed number of seconds.
pub struct SirenTone {
    low_freq: f32,
    high_freq: f32,
    sample_rate: u32,
    num_sample: usize,
    total_samples: usize,
}

impl SirenTone {
    pub fn new(seconds: f32) -> Self {
        let sample_rate = 44100;
        Self {
            low_freq: 650.0,
            high_freq: 950.0,
            sample_rate,
            num_sample: 0,
            total_samples: (seconds * sample_rate as f32) as usize,
        }
    }
}

impl Iterator for SirenTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        self.num_sample = self.num_sample.wrapping_add(1);

        let t = self.num_sample as f32 / self.sample_rate as f32;

        // Switch pitch twice a second.
        let freq = if (t * 2.0) as usize % 2 == 0 {
            self.low_freq
        } else {
            self.high_freq
        };

        Some((2.0 * PI * freq * t).sin() * 0.2)
    }
}

impl Source for SirenTone {
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
