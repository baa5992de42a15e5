//! Microphone recording via CPAL (Cross-Platform Audio Library)
//!
//! Wraps the default input device: lazy device acquisition, a background
//! input stream feeding a `RecordingSession`, and a hard auto-stop ceiling
//! so a recording always terminates even if the caller never stops it.

use super::CaptureError;
use super::session::RecordingSession;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Hard ceiling on recording length. Bounds memory and guarantees the
/// pipeline terminates even if stop() is never called.
pub const RECORDING_CEILING: Duration = Duration::from_secs(5);

/// Sample rate used for captured clips (matches the backend's expectations)
const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Audio recording device with configuration
pub struct AudioRecorder {
    host: cpal::Host,
    device: Option<Device>,
    config: Option<StreamConfig>,
    sample_rate: u32,
    session: Arc<Mutex<RecordingSession>>,
    stop_flag: Arc<AtomicBool>,
    stream: Option<cpal::Stream>,
}

/// Information about an available audio input device
#[derive(Debug)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub supported_sample_rates: Vec<u32>,
    pub supported_formats: Vec<SampleFormat>,
}

impl AudioRecorder {
    /// Create a recorder without touching the device; access is requested by
    /// `initialize` (or implicitly by `start`)
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
            device: None,
            config: None,
            sample_rate: TARGET_SAMPLE_RATE,
            session: Arc::new(Mutex::new(RecordingSession::new())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            stream: None,
        }
    }

    /// Request microphone access and pick a stream configuration.
    ///
    /// Platform-side processing (echo cancellation, noise suppression, auto
    /// gain) applies where the host enables it; cpal exposes no knobs for it.
    /// Idempotent once a device is held.
    pub fn initialize(&mut self) -> Result<(), CaptureError> {
        if self.device.is_some() {
            return Ok(());
        }

        let device = self
            .host
            .default_input_device()
            .ok_or(CaptureError::DeviceNotFound)?;
        let config = Self::optimal_config(&device, self.sample_rate)?;

        // The device may not support the target rate; the WAV header must
        // carry whatever rate the stream actually runs at
        self.sample_rate = config.sample_rate.0;
        self.device = Some(device);
        self.config = Some(config);
        Ok(())
    }

    /// Find the input configuration closest to the target sample rate.
    ///
    /// When the target falls outside the chosen range, the nearest rate the
    /// device supports is used instead.
    fn optimal_config(device: &Device, target_sample_rate: u32) -> Result<StreamConfig, CaptureError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| classify_device_error(&e.to_string()))?;

        let mut best_config = None;
        let mut best_diff = u32::MAX;

        for config in supported_configs {
            let diff = config.max_sample_rate().0.abs_diff(target_sample_rate);
            if diff < best_diff {
                best_diff = diff;
                best_config = Some(config);
            }
        }

        let config = best_config.ok_or_else(|| {
            CaptureError::CaptureUnavailable("no suitable audio configuration found".to_string())
        })?;

        let rate = nearest_supported_rate(
            target_sample_rate,
            config.min_sample_rate().0,
            config.max_sample_rate().0,
        );
        let config = config
            .try_with_sample_rate(cpal::SampleRate(rate))
            .ok_or_else(|| {
                CaptureError::CaptureUnavailable(format!(
                    "input device does not support a {}Hz sample rate",
                    rate
                ))
            })?;
        Ok(config.into())
    }

    /// Start recording into a fresh session.
    ///
    /// Initializes the device if needed and clears any previous buffer. The
    /// stream stops accepting data once `ceiling` (clamped to
    /// `RECORDING_CEILING`) has elapsed; callers poll `ceiling_reached` and
    /// then call `stop`.
    pub fn start(&mut self, ceiling: Duration) -> Result<(), CaptureError> {
        self.initialize()?;

        if self.is_recording() {
            return Err(CaptureError::CaptureUnavailable(
                "a recording is already in progress".to_string(),
            ));
        }

        let ceiling = ceiling.min(RECORDING_CEILING);
        self.stop_flag.store(false, Ordering::Release);
        if let Ok(mut session) = self.session.lock() {
            session.begin();
        }

        let session = Arc::clone(&self.session);
        let stop_flag = Arc::clone(&self.stop_flag);
        let error_flag = Arc::clone(&self.stop_flag);
        let started = Instant::now();

        let device = self
            .device
            .as_ref()
            .ok_or(CaptureError::DeviceNotFound)?;
        let config = self.config.clone().ok_or_else(|| {
            CaptureError::CaptureUnavailable("recorder not initialized".to_string())
        })?;

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if stop_flag.load(Ordering::Acquire) {
                        return;
                    }
                    if started.elapsed() >= ceiling {
                        stop_flag.store(true, Ordering::Release);
                        return;
                    }
                    let chunk: Vec<i16> = data
                        .iter()
                        .map(|&sample| (sample * i16::MAX as f32) as i16)
                        .collect();
                    if let Ok(mut session) = session.lock() {
                        session.push_chunk(chunk);
                    }
                },
                move |err| {
                    log::error!("audio stream error: {}", err);
                    error_flag.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(classify_build_error)?;

        stream
            .play()
            .map_err(|e| CaptureError::CaptureUnavailable(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    /// True once the auto-stop ceiling was hit (or the stream errored)
    pub fn ceiling_reached(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    pub fn is_recording(&self) -> bool {
        self.session
            .lock()
            .map(|session| session.is_recording())
            .unwrap_or(false)
    }

    /// Stop the current recording and finalize the session.
    ///
    /// Fails without side effects if nothing is recording. Returns the
    /// wall-clock duration from start to stop.
    pub fn stop(&mut self) -> Result<Duration, CaptureError> {
        self.stop_flag.store(true, Ordering::Release);

        let duration = {
            let mut session = self.session.lock().map_err(|_| {
                CaptureError::CaptureUnavailable("recording session lock poisoned".to_string())
            })?;
            if !session.finish() {
                return Err(CaptureError::CaptureUnavailable(
                    "no recording in progress".to_string(),
                ));
            }
            session.duration()
        };

        // Drop the stream after finalizing so no late chunk can land
        self.stream = None;
        Ok(duration)
    }

    /// Take the finalized buffer, or None if no audio was captured
    pub fn take_buffer(&mut self) -> Option<Vec<i16>> {
        self.session
            .lock()
            .ok()
            .and_then(|mut session| session.take_buffer())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Release the device handle. Idempotent, callable in any state.
    pub fn release(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
        self.stream = None;
        self.device = None;
        self.config = None;
    }

    /// Recorder holding an already-finalized buffer, for exercising the
    /// post-capture pipeline without a device
    #[cfg(test)]
    pub(crate) fn with_captured_buffer(buffer: Vec<i16>) -> Self {
        let recorder = Self::new();
        if let Ok(mut session) = recorder.session.lock() {
            session.begin();
            session.push_chunk(buffer);
            session.finish();
        }
        recorder
    }

    /// List all available audio input devices
    pub fn list_devices() -> anyhow::Result<Vec<AudioDeviceInfo>> {
        let host = cpal::default_host();
        let devices = host.input_devices()?;
        let default_device = host.default_input_device();

        let mut device_infos = Vec::new();

        for device in devices {
            let name = device.name().unwrap_or("Unknown Device".to_string());
            let is_default = default_device
                .as_ref()
                .map(|d| d.name().unwrap_or_default() == name)
                .unwrap_or(false);

            let supported_sample_rates = device
                .supported_input_configs()?
                .map(|c| c.max_sample_rate().0)
                .collect();

            let supported_formats = device
                .supported_input_configs()?
                .map(|c| c.sample_format())
                .collect();

            device_infos.push(AudioDeviceInfo {
                name,
                is_default,
                supported_sample_rates,
                supported_formats,
            });
        }

        Ok(device_infos)
    }
}

impl Default for AudioRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp the target rate into the supported range
fn nearest_supported_rate(target: u32, min: u32, max: u32) -> u32 {
    target.clamp(min, max)
}

fn classify_build_error(error: cpal::BuildStreamError) -> CaptureError {
    match error {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceNotFound,
        other => classify_device_error(&other.to_string()),
    }
}

/// Map a platform error message onto the capture taxonomy. Permission
/// failures surface differently per backend, so match on the message.
fn classify_device_error(message: &str) -> CaptureError {
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") {
        CaptureError::PermissionDenied
    } else if lowered.contains("not available") || lowered.contains("no device") {
        CaptureError::DeviceNotFound
    } else {
        CaptureError::CaptureUnavailable(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_device_error() {
        assert!(matches!(
            classify_device_error("Permission denied by the system"),
            CaptureError::PermissionDenied
        ));
        assert!(matches!(
            classify_device_error("device not available"),
            CaptureError::DeviceNotFound
        ));
        assert!(matches!(
            classify_device_error("ALSA function call failed"),
            CaptureError::CaptureUnavailable(_)
        ));
    }

    #[test]
    fn test_nearest_supported_rate_clamps_to_range() {
        // In range: keep the target
        assert_eq!(nearest_supported_rate(16_000, 8_000, 48_000), 16_000);
        // Devices that only offer 44.1k/48k record at their minimum
        assert_eq!(nearest_supported_rate(16_000, 44_100, 48_000), 44_100);
        // Target above the range clamps down to the maximum
        assert_eq!(nearest_supported_rate(16_000, 8_000, 11_025), 11_025);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut recorder = AudioRecorder::new();
        recorder.release();
        recorder.release();
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_stop_without_recording_fails() {
        let mut recorder = AudioRecorder::new();
        assert!(recorder.stop().is_err());
        assert!(recorder.take_buffer().is_none());
    }
}
