//! Video encoding engines and their one-time readiness gate.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use photoglow_common::error::{PhotoglowError, PhotoglowResult};

use crate::export::{ExportProgress, ExportStage, ProgressCallback};

/// Scratch file name of the still image inside the engine workspace.
pub const INPUT_IMAGE: &str = "input.png";
/// Scratch file name of the audio track inside the engine workspace.
pub const INPUT_AUDIO: &str = "input.mp3";
/// Scratch file name the engine writes the video to.
pub const OUTPUT_VIDEO: &str = "output.mp4";
/// Rounds both output dimensions down to even values.
pub const EVEN_SCALE_FILTER: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";

/// Inputs for a single encode.
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    /// PNG still that is looped for the whole clip.
    pub image_png: Vec<u8>,
    /// Encoded audio (any container the engine can demux).
    pub audio: Vec<u8>,
    /// Upper bound on the clip length.
    pub max_duration_secs: u32,
}

/// Turns a still image and an audio track into an MP4.
pub trait EncoderEngine: Send + Sync {
    /// Encode and return the finished MP4 bytes.
    fn encode(
        &self,
        request: &EncodeRequest,
        progress: Option<ProgressCallback>,
    ) -> PhotoglowResult<Vec<u8>>;

    /// Engine name.
    fn name(&self) -> &str;
}

/// ffmpeg argument list for a looped-still H.264 encode.
///
/// The clip runs for at most `max_duration_secs` and stops early when the
/// audio ends.
pub fn encode_args(max_duration_secs: u32) -> Vec<String> {
    let mut args: Vec<String> = [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.extend(
        [
            "-loop",
            "1",
            "-i",
            INPUT_IMAGE,
            "-i",
            INPUT_AUDIO,
            "-c:v",
            "libx264",
            "-t",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push(max_duration_secs.to_string());
    args.extend(
        [
            "-pix_fmt",
            "yuv420p",
            "-vf",
            EVEN_SCALE_FILTER,
            "-shortest",
            OUTPUT_VIDEO,
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args
}

/// Encoder backed by an external ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    binary: String,
}

impl FfmpegEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Locate the binary and make sure it ships an H.264 encoder.
    pub fn load(binary: impl Into<String>) -> PhotoglowResult<Self> {
        let engine = Self::new(binary);
        let started = std::time::Instant::now();

        let output = Command::new(&engine.binary)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                PhotoglowError::unsupported(format!("Failed to start {}: {e}", engine.binary))
            })?;
        if !output.status.success() {
            return Err(PhotoglowError::unsupported(format!(
                "{} -encoders exited with {}",
                engine.binary, output.status
            )));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        if !listing.contains("libx264") {
            return Err(PhotoglowError::unsupported(format!(
                "{} was built without libx264",
                engine.binary
            )));
        }

        tracing::info!(
            binary = %engine.binary,
            load_ms = started.elapsed().as_millis(),
            "Encoding engine loaded"
        );
        Ok(engine)
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn run_ffmpeg(
        &self,
        workdir: &Path,
        args: &[String],
        expected_duration_secs: f64,
        progress: Option<&ProgressCallback>,
    ) -> PhotoglowResult<()> {
        tracing::debug!(?args, "Running ffmpeg");
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| PhotoglowError::encode(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(pid = child.id(), "ffmpeg process started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PhotoglowError::encode("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| PhotoglowError::encode("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once the stderr pipe fills up.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut latest = ProgressState::default();
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| PhotoglowError::encode(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            if let Some((key, value)) = line.trim().split_once('=') {
                latest.update(key, value);
                if key == "progress" {
                    if let Some(cb) = progress {
                        cb(progress_report(
                            &latest,
                            expected_duration_secs,
                            start.elapsed().as_secs_f64(),
                        ));
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| PhotoglowError::encode(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(PhotoglowError::encode(format!(
                "ffmpeg exited with {status}: {}",
                stderr_output.trim()
            )));
        }

        tracing::debug!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            encoded_secs = latest.out_time_secs,
            "ffmpeg finished"
        );
        Ok(())
    }
}

impl EncoderEngine for FfmpegEngine {
    fn encode(
        &self,
        request: &EncodeRequest,
        progress: Option<ProgressCallback>,
    ) -> PhotoglowResult<Vec<u8>> {
        let scratch = tempfile::tempdir()?;
        std::fs::write(scratch.path().join(INPUT_IMAGE), &request.image_png)?;
        std::fs::write(scratch.path().join(INPUT_AUDIO), &request.audio)?;

        let args = encode_args(request.max_duration_secs);
        self.run_ffmpeg(
            scratch.path(),
            &args,
            request.max_duration_secs as f64,
            progress.as_ref(),
        )?;

        let video = match std::fs::read(scratch.path().join(OUTPUT_VIDEO)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PhotoglowError::encode("ffmpeg produced no output file"));
            }
            Err(e) => return Err(e.into()),
        };
        if video.is_empty() {
            return Err(PhotoglowError::encode("ffmpeg produced an empty output file"));
        }
        Ok(video)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Readiness of the encoding engine.
#[derive(Clone)]
pub enum EngineStatus {
    Loading,
    Ready(Arc<dyn EncoderEngine>),
    Failed(String),
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Debug for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("Loading"),
            Self::Ready(engine) => f.debug_tuple("Ready").field(&engine.name()).finish(),
            Self::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

/// Shared view of the engine's readiness.
///
/// The status starts at [`EngineStatus::Loading`] and moves to `Ready` or
/// `Failed` exactly once. Clones observe the same transition.
#[derive(Debug, Clone)]
pub struct EngineGate {
    rx: watch::Receiver<EngineStatus>,
}

/// The single writer of an [`EngineGate`]. Consumed on resolution.
#[derive(Debug)]
pub struct EngineResolver {
    tx: watch::Sender<EngineStatus>,
}

impl EngineGate {
    /// A gate that is still loading, plus the handle that resolves it.
    pub fn pending() -> (Self, EngineResolver) {
        let (tx, rx) = watch::channel(EngineStatus::Loading);
        (Self { rx }, EngineResolver { tx })
    }

    /// A gate that is already ready.
    pub fn ready(engine: Arc<dyn EncoderEngine>) -> Self {
        let (tx, rx) = watch::channel(EngineStatus::Ready(engine));
        drop(tx);
        Self { rx }
    }

    /// Start `loader` on the blocking pool and resolve the gate with its result.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_load<F>(loader: F) -> Self
    where
        F: FnOnce() -> PhotoglowResult<Arc<dyn EncoderEngine>> + Send + 'static,
    {
        let (gate, resolver) = Self::pending();
        tokio::task::spawn_blocking(move || {
            resolver.resolve(loader());
        });
        gate
    }

    pub fn status(&self) -> EngineStatus {
        self.rx.borrow().clone()
    }

    /// The engine, if it has finished loading.
    pub fn engine(&self) -> PhotoglowResult<Arc<dyn EncoderEngine>> {
        match &*self.rx.borrow() {
            EngineStatus::Ready(engine) => Ok(Arc::clone(engine)),
            EngineStatus::Loading => Err(PhotoglowError::engine_not_ready("loading")),
            EngineStatus::Failed(reason) => {
                Err(PhotoglowError::engine_not_ready(format!("failed: {reason}")))
            }
        }
    }

    /// Wait until loading has finished one way or the other.
    pub async fn wait(&self) -> EngineStatus {
        let mut rx = self.rx.clone();
        let status = match rx
            .wait_for(|status| !matches!(status, EngineStatus::Loading))
            .await
        {
            Ok(status) => status.clone(),
            Err(_) => EngineStatus::Failed("engine loader went away".to_string()),
        };
        status
    }

    /// Like [`EngineGate::wait`], giving up after `timeout`.
    pub async fn wait_timeout(&self, timeout: Duration) -> EngineStatus {
        tokio::time::timeout(timeout, self.wait())
            .await
            .unwrap_or(EngineStatus::Loading)
    }
}

impl EngineResolver {
    pub fn resolve(self, result: PhotoglowResult<Arc<dyn EncoderEngine>>) {
        let status = match result {
            Ok(engine) => {
                tracing::info!(engine = engine.name(), "Encoding engine ready");
                EngineStatus::Ready(engine)
            }
            Err(err) => {
                tracing::error!(error = %err, "Encoding engine failed to load");
                EngineStatus::Failed(err.to_string())
            }
        };
        self.tx.send_replace(status);
    }
}

/// Whether `binary` resolves to something runnable.
///
/// The name reaches the shell as a positional argument, never as script text.
pub fn command_exists(binary: &str) -> bool {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(binary).is_file();
    }
    Command::new("sh")
        .args(["-c", r#"command -v "$1" >/dev/null 2>&1"#, "sh"])
        .arg(binary)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Stream properties of an encoded file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaProbe {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

/// Read dimensions and duration of `path` with ffprobe.
pub fn probe_media(ffprobe: &str, path: &Path) -> Option<MediaProbe> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height:format=duration",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    parse_probe_output(&String::from_utf8(output.stdout).ok()?)
}

fn parse_probe_output(raw: &str) -> Option<MediaProbe> {
    let mut width = None;
    let mut height = None;
    let mut duration_secs = None;
    for line in raw.lines() {
        match line.trim().split_once('=') {
            Some(("width", v)) => width = v.parse::<u32>().ok(),
            Some(("height", v)) => height = v.parse::<u32>().ok(),
            Some(("duration", v)) => duration_secs = v.parse::<f64>().ok(),
            _ => {}
        }
    }

    let (width, height) = (width?, height?);
    if width == 0 || height == 0 {
        return None;
    }
    Some(MediaProbe {
        width,
        height,
        duration_secs: duration_secs?,
    })
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both names
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> ExportProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    ExportProgress {
        progress: if state.complete { 1.0 } else { progress },
        encoded_secs: state.out_time_secs,
        eta_secs,
        stage: ExportStage::Encoding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedEngine;

    impl EncoderEngine for NamedEngine {
        fn encode(
            &self,
            _request: &EncodeRequest,
            _progress: Option<ProgressCallback>,
        ) -> PhotoglowResult<Vec<u8>> {
            Ok(vec![0])
        }

        fn name(&self) -> &str {
            "named"
        }
    }

    #[test]
    fn test_encode_args_match_pipeline_contract() {
        let args = encode_args(15);
        let joined = args.join(" ");
        assert!(joined.contains(
            "-loop 1 -i input.png -i input.mp3 -c:v libx264 -t 15 -pix_fmt yuv420p \
             -vf scale=trunc(iw/2)*2:trunc(ih/2)*2 -shortest output.mp4"
        ));
        assert_eq!(args.last().map(String::as_str), Some(OUTPUT_VIDEO));
        assert!(args.iter().any(|a| a == "pipe:1"));
    }

    #[test]
    fn test_encode_args_respect_duration_cap() {
        let args = encode_args(9);
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "9");
    }

    #[test]
    fn test_progress_state_parses_microseconds() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "7500000");
        assert!((state.out_time_secs - 7.5).abs() < f64::EPSILON);
        state.update("out_time_ms", "3000000");
        assert!((state.out_time_secs - 3.0).abs() < f64::EPSILON);
        state.update("progress", "continue");
        assert!(!state.complete);
        state.update("progress", "end");
        assert!(state.complete);
    }

    #[test]
    fn test_progress_report_clamps_and_completes() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "30000000");
        let report = progress_report(&state, 15.0, 2.0);
        assert_eq!(report.progress, 1.0);

        let mut state = ProgressState::default();
        state.update("out_time_us", "1500000");
        state.update("progress", "end");
        let report = progress_report(&state, 15.0, 1.0);
        assert_eq!(report.progress, 1.0);
        assert_eq!(report.stage, ExportStage::Encoding);

        let report = progress_report(&ProgressState::default(), 0.0, 1.0);
        assert_eq!(report.progress, 0.0);
        assert_eq!(report.eta_secs, 0.0);
    }

    #[test]
    fn test_parse_probe_output() {
        let probe = parse_probe_output("width=640\nheight=480\nduration=3.000000\n").unwrap();
        assert_eq!(
            probe,
            MediaProbe {
                width: 640,
                height: 480,
                duration_secs: 3.0
            }
        );
        assert!(parse_probe_output("width=0\nheight=480\nduration=1\n").is_none());
        assert!(parse_probe_output("duration=1\n").is_none());
    }

    #[test]
    fn test_command_exists_handles_paths() {
        assert!(!command_exists("/definitely/not/a/real/ffmpeg"));
        assert!(!command_exists("photoglow-no-such-binary-xyz"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_exists_does_not_run_shell_text() {
        assert!(command_exists("sh"));

        let marker = "photoglow-command-exists-marker";
        assert!(!command_exists(&format!("sh; touch {marker}")));
        assert!(!command_exists(&format!("$(touch {marker})")));
        assert!(!std::path::Path::new(marker).exists());
    }

    #[tokio::test]
    async fn test_gate_starts_loading_and_resolves_once() {
        let (gate, resolver) = EngineGate::pending();
        assert!(matches!(gate.status(), EngineStatus::Loading));
        assert!(matches!(
            gate.engine(),
            Err(PhotoglowError::EngineNotReady { .. })
        ));

        let observer = gate.clone();
        resolver.resolve(Ok(Arc::new(NamedEngine)));

        assert!(observer.status().is_ready());
        assert_eq!(gate.engine().unwrap().name(), "named");
        assert!(gate.wait().await.is_ready());
    }

    #[tokio::test]
    async fn test_gate_failed_load_is_not_ready() {
        let (gate, resolver) = EngineGate::pending();
        resolver.resolve(Err(PhotoglowError::unsupported("no ffmpeg")));

        match gate.wait().await {
            EngineStatus::Failed(reason) => assert!(reason.contains("no ffmpeg")),
            other => panic!("unexpected status {other:?}"),
        }
        assert!(gate.engine().is_err());
    }

    #[tokio::test]
    async fn test_gate_dropped_resolver_stays_unready() {
        let (gate, resolver) = EngineGate::pending();
        drop(resolver);
        assert!(matches!(gate.wait().await, EngineStatus::Failed(_)));
        assert!(gate.engine().is_err());
    }

    #[tokio::test]
    async fn test_spawn_load_resolves_in_background() {
        let gate = EngineGate::spawn_load(|| Ok(Arc::new(NamedEngine) as Arc<dyn EncoderEngine>));
        let status = gate.wait_timeout(Duration::from_secs(5)).await;
        assert!(status.is_ready());
    }

    #[tokio::test]
    async fn test_wait_timeout_while_loading() {
        let (gate, _resolver) = EngineGate::pending();
        let status = gate.wait_timeout(Duration::from_millis(20)).await;
        assert!(matches!(status, EngineStatus::Loading));
    }
}
