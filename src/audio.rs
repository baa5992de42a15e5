//! Microphone capture and audio packaging
//!
//! Recording is split in two: `RecordingSession` accumulates chunks and owns
//! the buffer lifecycle, `AudioRecorder` drives the CPAL device and enforces
//! the auto-stop ceiling. Finalized buffers are packaged as in-memory WAV
//! for upload.

mod recorder;
mod session;

pub use recorder::{AudioDeviceInfo, AudioRecorder, RECORDING_CEILING};
pub use session::{RecordingSession, SessionStatus};

use hound::{WavSpec, WavWriter};
use std::io::Cursor;
use thiserror::Error;

/// Capture error taxonomy
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Microphone access denied. Allow microphone access and try again")]
    PermissionDenied,
    #[error("No microphone found. Connect an input device and try again")]
    DeviceNotFound,
    #[error("Audio capture unavailable: {0}")]
    CaptureUnavailable(String),
    #[error("No audio was captured. Try recording again")]
    NoAudioCaptured,
}

/// Package an i16 sample buffer as a mono 16-bit PCM WAV file in memory
pub fn buffer_to_wav_bytes(buffer: &[i16], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)
        .map_err(|e| CaptureError::CaptureUnavailable(e.to_string()))?;
    for &sample in buffer {
        writer
            .write_sample(sample)
            .map_err(|e| CaptureError::CaptureUnavailable(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| CaptureError::CaptureUnavailable(e.to_string()))?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_bytes_header_and_length() {
        let samples: Vec<i16> = vec![0, 1000, -1000, 42];
        let bytes = buffer_to_wav_bytes(&samples, 16000).unwrap();

        // RIFF/WAVE header plus two bytes per sample
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(bytes.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn test_empty_buffer_still_valid_wav() {
        let bytes = buffer_to_wav_bytes(&[], 16000).unwrap();
        assert_eq!(bytes.len(), 44);
    }
}
