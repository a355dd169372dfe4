//! Export pipeline: filtered still + selected track → `Status_<millis>.mp4`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use photoglow_common::clock::{export_file_name, unix_millis};
use photoglow_common::config::AppConfig;
use photoglow_common::error::{PhotoglowError, PhotoglowResult};
use photoglow_session_model::{EditSession, FilterParams, ImageAsset, Track};

use crate::engine::{command_exists, probe_media, EncodeRequest, EncoderEngine, EngineGate, MediaProbe};
use crate::fetch::AudioFetcher;
use crate::raster::{even_dimensions, rasterize};

/// Progress callback for exports.
pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0] within the stage.
    pub progress: f64,

    /// Seconds of video encoded so far.
    pub encoded_secs: f64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

impl ExportProgress {
    fn at(stage: ExportStage, progress: f64) -> Self {
        Self {
            progress,
            encoded_secs: 0.0,
            eta_secs: 0.0,
            stage,
        }
    }
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rasterizing,
    FetchingAudio,
    Encoding,
    Saving,
    Complete,
    Failed,
}

/// Where and how finished videos are written.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub max_duration_secs: u32,
    /// ffprobe used to report on the written file. `None` skips probing.
    pub ffprobe_path: Option<String>,
}

impl ExportSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            file_prefix: config.export.file_prefix.clone(),
            max_duration_secs: config.export.max_duration_secs,
            ffprobe_path: Some(config.export.ffprobe_path.clone()),
        }
    }
}

/// What an export works from, captured from the session up front.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub image: ImageAsset,
    pub filters: FilterParams,
    pub track: Track,
}

impl ExportJob {
    /// Capture the current image, filters, and track.
    pub fn from_session(session: &EditSession) -> PhotoglowResult<Self> {
        let image = session.current().cloned().ok_or(PhotoglowError::NoImage)?;
        let track = session
            .selected_track()
            .ok_or(PhotoglowError::NoTrackSelected)?;
        Ok(Self {
            image,
            filters: session.filters(),
            track,
        })
    }
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub track: Track,
    /// Frame size after rounding down to even values.
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    /// What ffprobe saw in the written file, when available.
    pub probe: Option<MediaProbe>,
    pub elapsed_ms: u128,
}

impl ExportOutcome {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

/// Runs exports against an engine gate and an audio source.
pub struct ExportPipeline {
    gate: EngineGate,
    fetcher: Arc<dyn AudioFetcher>,
    settings: ExportSettings,
}

impl ExportPipeline {
    pub fn new(gate: EngineGate, fetcher: Arc<dyn AudioFetcher>, settings: ExportSettings) -> Self {
        Self {
            gate,
            fetcher,
            settings,
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn gate(&self) -> &EngineGate {
        &self.gate
    }

    /// Check preconditions in order: image, track, engine.
    pub fn prepare(
        &self,
        session: &EditSession,
    ) -> PhotoglowResult<(ExportJob, Arc<dyn EncoderEngine>)> {
        let job = ExportJob::from_session(session)?;
        let engine = self.gate.engine()?;
        Ok((job, engine))
    }

    /// Export `session` to a new file in the output directory.
    ///
    /// Nothing is fetched or encoded unless every precondition holds, and no
    /// file appears in the output directory unless the export succeeds.
    pub async fn run(
        &self,
        session: &EditSession,
        progress: Option<ProgressCallback>,
    ) -> PhotoglowResult<ExportOutcome> {
        let (job, engine) = self.prepare(session)?;

        tracing::info!(
            track = job.track.id,
            title = job.track.title,
            engine = engine.name(),
            filters = %job.filters.css(),
            "Starting export"
        );

        let result = self.execute(job, engine, progress.clone()).await;
        match &result {
            Ok(outcome) => tracing::info!(
                path = %outcome.path.display(),
                size_bytes = outcome.size_bytes,
                elapsed_ms = outcome.elapsed_ms,
                "Export finished"
            ),
            Err(err) => {
                tracing::error!(error = %err, "Export failed");
                if let Some(cb) = &progress {
                    cb(ExportProgress::at(ExportStage::Failed, 0.0));
                }
            }
        }
        result
    }

    async fn execute(
        &self,
        job: ExportJob,
        engine: Arc<dyn EncoderEngine>,
        progress: Option<ProgressCallback>,
    ) -> PhotoglowResult<ExportOutcome> {
        let started = Instant::now();
        let report = |stage: ExportStage, value: f64| {
            if let Some(cb) = &progress {
                cb(ExportProgress::at(stage, value));
            }
        };

        report(ExportStage::Preparing, 0.0);
        std::fs::create_dir_all(&self.settings.output_dir)?;

        report(ExportStage::Rasterizing, 0.0);
        let image = job.image.clone();
        let filters = job.filters;
        let still = tokio::task::spawn_blocking(move || rasterize(&image, &filters))
            .await
            .map_err(|e| PhotoglowError::render(format!("Rasterizer task failed: {e}")))??;
        let (width, height) = even_dimensions(still.width, still.height);

        report(ExportStage::FetchingAudio, 0.0);
        let audio = self.fetcher.fetch(job.track.url).await?;

        report(ExportStage::Encoding, 0.0);
        let request = EncodeRequest {
            image_png: still.png,
            audio,
            max_duration_secs: self.settings.max_duration_secs,
        };
        let encode_progress = progress.clone();
        let video = tokio::task::spawn_blocking(move || engine.encode(&request, encode_progress))
            .await
            .map_err(|e| PhotoglowError::encode(format!("Encoder task failed: {e}")))??;

        report(ExportStage::Saving, 0.0);
        let file_name = export_file_name(&self.settings.file_prefix, unix_millis());
        let path = write_output(&self.settings.output_dir, &file_name, &video)?;

        let probe = match &self.settings.ffprobe_path {
            Some(ffprobe) if command_exists(ffprobe) => {
                let ffprobe = ffprobe.clone();
                let probe_path = path.clone();
                tokio::task::spawn_blocking(move || probe_media(&ffprobe, &probe_path))
                    .await
                    .ok()
                    .flatten()
            }
            _ => None,
        };
        if let Some(probe) = &probe {
            let cap = self.settings.max_duration_secs as f64;
            if probe.width % 2 != 0 || probe.height % 2 != 0 || probe.duration_secs > cap + 0.5 {
                tracing::warn!(?probe, cap, "Exported video does not match the expected shape");
            }
        }

        report(ExportStage::Complete, 1.0);
        Ok(ExportOutcome {
            path,
            track: job.track,
            width,
            height,
            size_bytes: video.len() as u64,
            probe,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}

/// Write `bytes` to `dir/file_name` without leaving a partial file behind.
pub fn write_output(dir: &Path, file_name: &str, bytes: &[u8]) -> PhotoglowResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);

    let mut staging = tempfile::Builder::new()
        .prefix(".photoglow-")
        .suffix(".part")
        .tempfile_in(dir)?;
    staging.write_all(bytes)?;
    staging.as_file().sync_all()?;
    staging.persist(&path).map_err(|e| PhotoglowError::Io(e.error))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote export");
    Ok(path)
}
