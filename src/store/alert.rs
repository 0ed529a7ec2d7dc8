use std::f32::consts::TAU;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("audio output unavailable: {0}")]
    Audio(String),

    #[error("popup could not be shown: {0}")]
    Popup(String),
}

/// Permission to raise system-level popups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupPermission {
    /// Not asked yet
    #[default]
    Default,
    Granted,
    Denied,
}

/// One sine tone within a chime
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub start: Duration,
    pub duration: Duration,
}

/// A short synthesized audible cue.
///
/// Each tone decays exponentially from `peak_gain` to `floor_gain` over its
/// duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Chime {
    pub tones: Vec<Tone>,
    pub peak_gain: f32,
    pub floor_gain: f32,
}

impl Chime {
    /// 800 Hz then 1000 Hz, 100 ms each, 150 ms apart
    pub fn two_tone() -> Self {
        Self {
            tones: vec![
                Tone {
                    frequency: 800.0,
                    start: Duration::ZERO,
                    duration: Duration::from_millis(100),
                },
                Tone {
                    frequency: 1000.0,
                    start: Duration::from_millis(150),
                    duration: Duration::from_millis(100),
                },
            ],
            peak_gain: 0.3,
            floor_gain: 0.01,
        }
    }

    pub fn duration(&self) -> Duration {
        self.tones
            .iter()
            .map(|tone| tone.start + tone.duration)
            .max()
            .unwrap_or_default()
    }

    /// Render mono samples in [-peak_gain, peak_gain]
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let rate = sample_rate as f32;
        let total = samples_in(self.duration(), sample_rate);
        let mut samples = vec![0.0f32; total];

        for tone in &self.tones {
            let offset = samples_in(tone.start, sample_rate);
            let len = samples_in(tone.duration, sample_rate);
            let secs = tone.duration.as_secs_f32();
            let ratio = self.floor_gain / self.peak_gain;

            for (i, sample) in samples.iter_mut().skip(offset).take(len).enumerate() {
                let t = i as f32 / rate;
                let gain = self.peak_gain * ratio.powf(t / secs);
                *sample += gain * (TAU * tone.frequency * t).sin();
            }
        }
        samples
    }
}

impl Default for Chime {
    fn default() -> Self {
        Self::two_tone()
    }
}

fn samples_in(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * f64::from(sample_rate)).round() as usize
}

/// Audible and visual side effects of a newly arrived notification
pub trait AlertSink: Send + Sync {
    fn play_chime(&self, chime: &Chime) -> Result<(), AlertError>;

    fn popup_permission(&self) -> PopupPermission;

    /// Ask for popup permission; only called outside notification delivery
    fn request_popup_permission(&self) -> PopupPermission;

    fn show_popup(&self, title: &str, message: &str) -> Result<(), AlertError>;
}

/// Default sink: renders chimes and reports both effects through `tracing`
pub struct LogAlertSink {
    sample_rate: u32,
    permission: Mutex<PopupPermission>,
}

impl LogAlertSink {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            permission: Mutex::new(PopupPermission::Default),
        }
    }
}

impl Default for LogAlertSink {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl AlertSink for LogAlertSink {
    fn play_chime(&self, chime: &Chime) -> Result<(), AlertError> {
        let samples = chime.render(self.sample_rate);
        tracing::info!(
            "Chime: {} tones, {} samples at {} Hz",
            chime.tones.len(),
            samples.len(),
            self.sample_rate
        );
        Ok(())
    }

    fn popup_permission(&self) -> PopupPermission {
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request_popup_permission(&self) -> PopupPermission {
        let mut permission = self.permission.lock().unwrap_or_else(PoisonError::into_inner);
        *permission = PopupPermission::Granted;
        *permission
    }

    fn show_popup(&self, title: &str, message: &str) -> Result<(), AlertError> {
        tracing::info!("Popup: {} - {}", title, message);
        Ok(())
    }
}
