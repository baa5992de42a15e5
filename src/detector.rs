//! Detector flow controller
//!
//! The five-state controller behind the record/submit flow. State
//! transitions are a pure function so the machine can be reasoned about
//! (and tested) apart from the devices and network it drives.
//! `DetectorSession` owns the injected collaborators and guarantees every
//! run ends in a defined state, never stuck in Processing.

use crate::api::PredictionClient;
use crate::audio::{self, AudioRecorder, CaptureError};
use crate::cache::{HistoryEntry, RecordingHistory};
use crate::normalize::{self, Prediction};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::oneshot;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Home,
    Idle,
    Recording,
    Processing,
    Results,
}

impl DetectorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorState::Home => "Home",
            DetectorState::Idle => "Idle",
            DetectorState::Recording => "Recording",
            DetectorState::Processing => "Processing",
            DetectorState::Results => "Results",
        }
    }

    /// Pure transition function. Events that make no sense in the current
    /// state leave it unchanged.
    pub fn on_event(self, event: DetectorEvent) -> DetectorState {
        use DetectorEvent::*;
        use DetectorState::*;

        match (self, event) {
            (_, Back) => Home,
            (Home, OpenDetector) => Idle,
            (Idle, MicTapped) => Recording,
            (Recording, MicTapped | CeilingReached) => Processing,
            (Processing, AnalysisSucceeded) => Results,
            (Processing, AnalysisFailed) => Idle,
            (Results, TryAgain) => Idle,
            (state, _) => state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorEvent {
    OpenDetector,
    MicTapped,
    CeilingReached,
    AnalysisSucceeded,
    AnalysisFailed,
    TryAgain,
    Back,
}

/// Owns the capture session, upload client, and history cache, and drives
/// them through one detection cycle at a time
pub struct DetectorSession {
    state: DetectorState,
    recorder: AudioRecorder,
    client: PredictionClient,
    history: RecordingHistory,
}

impl DetectorSession {
    pub fn new(
        recorder: AudioRecorder,
        client: PredictionClient,
        history: RecordingHistory,
    ) -> Self {
        Self {
            state: DetectorState::Home,
            recorder,
            client,
            history,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    fn apply(&mut self, event: DetectorEvent) {
        let next = self.state.on_event(event);
        log::debug!(
            "detector: {} --{:?}--> {}",
            self.state.as_str(),
            event,
            next.as_str()
        );
        self.state = next;
    }

    /// Enter the detector screen
    pub fn open(&mut self) {
        self.apply(DetectorEvent::OpenDetector);
    }

    /// Return to the idle screen after viewing results
    pub fn try_again(&mut self) {
        self.apply(DetectorEvent::TryAgain);
    }

    /// Leave the detector, releasing the microphone
    pub fn go_home(&mut self) {
        self.recorder.release();
        self.apply(DetectorEvent::Back);
    }

    /// Run one full detection cycle: record until the stop signal fires or
    /// the ceiling is reached, then preprocess (best-effort) and analyze.
    ///
    /// Only one cycle runs at a time; calling while Recording or Processing
    /// fails without touching the in-flight cycle. On any failure the
    /// machine lands back in Idle with the error returned to the caller.
    pub async fn run_detection(
        &mut self,
        ceiling: Duration,
        stop_signal: oneshot::Receiver<()>,
    ) -> Result<Prediction> {
        match self.state {
            DetectorState::Recording | DetectorState::Processing => {
                anyhow::bail!("a detection is already in progress")
            }
            DetectorState::Home => self.open(),
            DetectorState::Results => self.try_again(),
            DetectorState::Idle => {}
        }

        let duration = self.record(ceiling, stop_signal).await?;
        println!(
            "Recording complete ({:.1}s), analyzing...",
            duration.as_secs_f32()
        );
        // State is Processing from here; every exit path below lands in
        // Results or Idle
        self.process(duration).await
    }

    async fn record(
        &mut self,
        ceiling: Duration,
        mut stop_signal: oneshot::Receiver<()>,
    ) -> Result<Duration> {
        if let Err(e) = self.recorder.start(ceiling) {
            // Permission/device errors abort the transition; stay in Idle
            return Err(e.into());
        }
        self.apply(DetectorEvent::MicTapped);
        println!(
            "Recording... press Enter to stop (auto-stops at {}s)",
            ceiling.min(audio::RECORDING_CEILING).as_secs()
        );

        loop {
            tokio::select! {
                _ = &mut stop_signal => {
                    self.apply(DetectorEvent::MicTapped);
                    break;
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {
                    if self.recorder.ceiling_reached() {
                        self.apply(DetectorEvent::CeilingReached);
                        break;
                    }
                }
            }
        }

        match self.recorder.stop() {
            Ok(duration) => Ok(duration),
            Err(e) => {
                self.apply(DetectorEvent::AnalysisFailed);
                Err(e.into())
            }
        }
    }

    async fn process(&mut self, duration: Duration) -> Result<Prediction> {
        let spinner = processing_spinner();

        let result = self.process_inner(duration).await;
        spinner.finish_and_clear();

        match result {
            Ok(prediction) => {
                self.apply(DetectorEvent::AnalysisSucceeded);
                Ok(prediction)
            }
            Err(e) => {
                self.apply(DetectorEvent::AnalysisFailed);
                Err(e)
            }
        }
    }

    async fn process_inner(&mut self, duration: Duration) -> Result<Prediction> {
        let buffer = self
            .recorder
            .take_buffer()
            .ok_or(CaptureError::NoAudioCaptured)?;

        let wav_bytes = audio::buffer_to_wav_bytes(&buffer, self.recorder.sample_rate())?;

        // History records every successful capture, before upload
        let entry = HistoryEntry::new(wav_bytes.len(), duration);
        if let Err(e) = self.history.record(entry) {
            log::warn!("failed to persist recording history: {}", e);
        }

        // Preprocess is best-effort; analysis proceeds either way
        match self.client.submit_for_preprocess(wav_bytes.clone()).await {
            Ok(summary) => log::info!(
                "preprocess: {} windows, {} segments",
                summary.get("num_windows").and_then(Value::as_u64).unwrap_or(0),
                summary.get("num_segments").and_then(Value::as_u64).unwrap_or(0),
            ),
            Err(e) => log::warn!("preprocess failed, continuing to analysis: {}", e),
        }

        let raw = self.client.submit_for_analysis(wav_bytes).await?;
        Ok(normalize::normalize(&raw))
    }

    pub fn history(&self) -> &RecordingHistory {
        &self.history
    }
}

fn processing_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message("Analyzing accent...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::DetectorEvent::*;
    use super::DetectorState::*;
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut state = Home;
        for (event, expected) in [
            (OpenDetector, Idle),
            (MicTapped, Recording),
            (MicTapped, Processing),
            (AnalysisSucceeded, Results),
            (TryAgain, Idle),
        ] {
            state = state.on_event(event);
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn test_ceiling_also_stops_recording() {
        assert_eq!(Recording.on_event(CeilingReached), Processing);
    }

    #[test]
    fn test_failure_returns_to_idle() {
        assert_eq!(Processing.on_event(AnalysisFailed), Idle);
    }

    #[test]
    fn test_back_from_any_state() {
        for state in [Home, Idle, Recording, Processing, Results] {
            assert_eq!(state.on_event(Back), Home);
        }
    }

    #[test]
    fn test_irrelevant_events_ignored() {
        assert_eq!(Home.on_event(MicTapped), Home);
        assert_eq!(Idle.on_event(AnalysisSucceeded), Idle);
        assert_eq!(Results.on_event(CeilingReached), Results);
        assert_eq!(Processing.on_event(MicTapped), Processing);
    }

    #[tokio::test]
    async fn test_session_rejects_concurrent_detection() {
        // A session mid-cycle must refuse a second run_detection call
        let recorder = AudioRecorder::new();
        let client = PredictionClient::new(Some("http://localhost:1"));
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::load_from(dir.path().join("history.json"));

        let mut session = DetectorSession::new(recorder, client, history);
        session.open();
        session.state = Processing;

        let (_tx, rx) = oneshot::channel();
        let err = session
            .run_detection(Duration::from_secs(1), rx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already in progress"));
        // The guard must not have disturbed the in-flight state
        assert_eq!(session.state(), Processing);
    }

    use crate::api::ApiError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Read one HTTP request off the socket, reply with the given status and
    /// JSON body, and return the request path
    async fn answer_request(socket: &mut TcpStream, status: &str, body: &str) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before a full request arrived");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let path = head.split_whitespace().nth(1).unwrap_or("").to_string();
        let content_length = head
            .lines()
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .next()
            .unwrap_or(0);

        let mut remaining = content_length.saturating_sub(buf.len() - header_end);
        while remaining > 0 {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-body");
            remaining = remaining.saturating_sub(n);
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_analysis_timeout_lands_in_idle() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Hold every connection open without answering
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                held.push(socket);
            }
        });

        let recorder = AudioRecorder::with_captured_buffer(vec![0i16; 1600]);
        let client = PredictionClient::new(Some(&format!("http://{}", addr)))
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(100));
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::load_from(dir.path().join("history.json"));

        let mut session = DetectorSession::new(recorder, client, history);
        session.state = Processing;

        let err = session.process(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::TimeoutExceeded(_))
        ));
        assert_eq!(session.state(), Idle);
    }

    #[tokio::test]
    async fn test_preprocess_failure_does_not_block_analysis() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let path = answer_request(
                &mut socket,
                "500 Internal Server Error",
                r#"{"detail":"preprocessing crashed"}"#,
            )
            .await;
            assert!(path.starts_with("/preprocess/"));

            let (mut socket, _) = listener.accept().await.unwrap();
            let path = answer_request(
                &mut socket,
                "200 OK",
                r#"{"state":"tamilnadu","confidence":0.87}"#,
            )
            .await;
            assert!(path.starts_with("/predict/"));
        });

        let recorder = AudioRecorder::with_captured_buffer(vec![0i16; 1600]);
        let client = PredictionClient::new(Some(&format!("http://{}", addr)));
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::load_from(dir.path().join("history.json"));

        let mut session = DetectorSession::new(recorder, client, history);
        session.state = Processing;

        let prediction = session.process(Duration::from_secs(2)).await.unwrap();
        assert_eq!(prediction.region, "Chennai");
        assert_eq!(session.state(), Results);
        server.await.unwrap();
    }

    #[test]
    fn test_go_home_releases_and_resets() {
        let recorder = AudioRecorder::new();
        let client = PredictionClient::new(Some("http://localhost:1"));
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::load_from(dir.path().join("history.json"));

        let mut session = DetectorSession::new(recorder, client, history);
        session.open();
        assert_eq!(session.state(), Idle);
        session.go_home();
        assert_eq!(session.state(), Home);
    }
}
