//! Recording session state and chunk accumulation
//!
//! A `RecordingSession` owns the audio captured between start and stop. The
//! cpal stream pushes chunks as they arrive; arrival order is preserved and
//! the buffer is only finalized once the session has stopped.

use std::time::{Duration, Instant};

/// Lifecycle of a single recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Recording,
    Stopped,
}

pub struct RecordingSession {
    status: SessionStatus,
    started_at: Option<Instant>,
    chunks: Vec<Vec<i16>>,
    duration: Duration,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            started_at: None,
            chunks: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Start a fresh recording, discarding any previous buffer
    pub fn begin(&mut self) {
        self.chunks.clear();
        self.duration = Duration::ZERO;
        self.started_at = Some(Instant::now());
        self.status = SessionStatus::Recording;
    }

    /// Append a chunk of samples; ignored unless the session is recording
    pub fn push_chunk(&mut self, chunk: Vec<i16>) {
        if self.status == SessionStatus::Recording && !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    /// Stop the recording, capturing the wall-clock duration.
    ///
    /// Returns false (and changes nothing) if the session was not recording.
    pub fn finish(&mut self) -> bool {
        if self.status != SessionStatus::Recording {
            return false;
        }
        self.duration = self
            .started_at
            .map(|started| started.elapsed())
            .unwrap_or_default();
        self.status = SessionStatus::Stopped;
        true
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_recording(&self) -> bool {
        self.status == SessionStatus::Recording
    }

    /// Wall-clock duration of the last finished recording
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time since the recording started, while it is still running
    pub fn elapsed(&self) -> Duration {
        match (self.status, self.started_at) {
            (SessionStatus::Recording, Some(started)) => started.elapsed(),
            _ => self.duration,
        }
    }

    /// Take the finalized buffer: all chunks concatenated in arrival order.
    ///
    /// Returns None if the session has not stopped or if no chunks arrived
    /// (stop before the first data callback). Callers treat None as a
    /// retryable no-audio condition.
    pub fn take_buffer(&mut self) -> Option<Vec<i16>> {
        if self.status != SessionStatus::Stopped || self.chunks.is_empty() {
            return None;
        }
        let total: usize = self.chunks.iter().map(Vec::len).sum();
        let mut buffer = Vec::with_capacity(total);
        for chunk in self.chunks.drain(..) {
            buffer.extend(chunk);
        }
        Some(buffer)
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}
