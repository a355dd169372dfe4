//! The studio controller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use photoglow_bg_removal::{BackgroundRemover, BgRemovalBridge, CommandRemover};
use photoglow_common::config::AppConfig;
use photoglow_common::error::{PhotoglowError, PhotoglowResult};
use photoglow_render_engine::{
    rasterize, write_output, AudioFetcher, EncoderEngine, EngineGate, EngineStatus,
    ExportOutcome, ExportPipeline, ExportSettings, FfmpegEngine, HttpAudioFetcher,
    ProgressCallback, RasterizedImage,
};
use photoglow_session_model::{
    CategoryFilter, EditSession, FilterParam, ImageAsset, PlaybackSink, SessionSnapshot,
    SessionStore, Track, TrackCatalog, TracingSink,
};

use crate::busy::{BusyFlag, Operation};
use crate::notice::{Notice, Notifier, AUTO_ENHANCED, EXPORT_SUCCEEDED, REMOVAL_SUCCEEDED};

/// Collaborators a studio is assembled from.
pub struct StudioParts {
    pub gate: EngineGate,
    pub fetcher: Arc<dyn AudioFetcher>,
    pub remover: Box<dyn BackgroundRemover>,
    pub sink: Arc<dyn PlaybackSink>,
    pub catalog: TrackCatalog,
}

/// Everything a front end needs: session state, track library, playback,
/// background removal, and export.
pub struct Studio {
    config: AppConfig,
    store: SessionStore,
    catalog: TrackCatalog,
    sink: Arc<dyn PlaybackSink>,
    remover: BgRemovalBridge,
    pipeline: ExportPipeline,
    busy: BusyFlag,
    notices: Notifier,
}

impl Studio {
    /// Production wiring: ffmpeg loads in the background, tracks come over
    /// HTTP, removal shells out to the configured tool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: AppConfig) -> PhotoglowResult<Self> {
        let ffmpeg = config.export.ffmpeg_path.clone();
        let gate = EngineGate::spawn_load(move || {
            FfmpegEngine::load(ffmpeg).map(|engine| Arc::new(engine) as Arc<dyn EncoderEngine>)
        });

        let parts = StudioParts {
            gate,
            fetcher: Arc::new(HttpAudioFetcher::new()?),
            remover: Box::new(CommandRemover),
            sink: Arc::new(TracingSink),
            catalog: TrackCatalog::builtin(),
        };
        Self::with_parts(config, parts)
    }

    pub fn with_parts(config: AppConfig, parts: StudioParts) -> PhotoglowResult<Self> {
        let remover = BgRemovalBridge::spawn(parts.remover)?;
        let pipeline = ExportPipeline::new(
            parts.gate,
            parts.fetcher,
            ExportSettings::from_config(&config),
        );

        tracing::info!(
            output_dir = %config.output_dir.display(),
            tracks = parts.catalog.len(),
            "Studio started"
        );

        Ok(Self {
            config,
            store: SessionStore::new(),
            catalog: parts.catalog,
            sink: parts.sink,
            remover,
            pipeline,
            busy: BusyFlag::new(),
            notices: Notifier::default(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionSnapshot> {
        self.store.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn engine_status(&self) -> EngineStatus {
        self.pipeline.gate().status()
    }

    /// Wait for the engine to finish loading, up to `timeout`.
    pub async fn wait_for_engine(&self, timeout: Duration) -> EngineStatus {
        self.pipeline.gate().wait_timeout(timeout).await
    }

    pub fn busy(&self) -> Option<Operation> {
        self.busy.current()
    }

    /// Install an upload. An undecodable file leaves the session as it was
    /// and raises no notice.
    pub fn load_image(&self, bytes: impl Into<Vec<u8>>) -> PhotoglowResult<()> {
        let asset = match ImageAsset::decode(bytes) {
            Ok(asset) => asset,
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring upload that is not a decodable image");
                return Err(err);
            }
        };
        self.store.update(|session| {
            session.install(asset);
            Ok(())
        })
    }

    pub fn load_image_file(&self, path: &Path) -> PhotoglowResult<()> {
        if !path.exists() {
            return Err(PhotoglowError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        self.load_image(std::fs::read(path)?)
    }

    pub fn set_filter(&self, param: FilterParam, value: i64) -> PhotoglowResult<()> {
        self.store.update(|session| session.set_filter(param, value))
    }

    /// `name` is `brightness`, `contrast`, `saturation` (or `saturate`), or `blur`.
    pub fn set_filter_by_name(&self, name: &str, value: i64) -> PhotoglowResult<()> {
        let param: FilterParam = name.parse()?;
        self.set_filter(param, value)
    }

    pub fn apply_preset(&self) {
        let committed = self.store.update(|session| {
            session.apply_preset();
            Ok(())
        });
        if committed.is_ok() {
            self.notices.publish(Notice::toast(AUTO_ENHANCED));
        }
    }

    /// Discard image, filters, and track selection.
    pub fn reset(&self) {
        let commands = self
            .store
            .update(|session| Ok(session.reset()))
            .unwrap_or_default();
        for command in &commands {
            self.sink.apply(command);
        }
    }

    /// Select (or toggle) a track by id.
    pub fn select_track(&self, id: u32) -> PhotoglowResult<Track> {
        let track = self.catalog.get(id)?;
        let commands = self.store.update(|session| Ok(session.select_track(track)))?;
        for command in &commands {
            self.sink.apply(command);
        }
        Ok(track)
    }

    pub fn search_tracks(&self, query: &str, filter: CategoryFilter) -> Vec<Track> {
        self.catalog.search(query, filter)
    }

    /// Record the length of the selected track once the player reports it.
    /// From then on looping playback wraps at the end.
    pub fn set_track_duration(&self, id: u32, duration: Duration) -> PhotoglowResult<()> {
        self.store.update(|session| {
            if session.selected_track().map(|track| track.id) != Some(id) {
                return Err(PhotoglowError::NoTrackSelected);
            }
            session.deck_mut().set_duration(duration);
            Ok(())
        })
    }

    /// Move the play head of the selected track forward.
    pub fn advance_playback(&self, elapsed: Duration) {
        let _ = self.store.update(|session| {
            session.deck_mut().advance(elapsed);
            Ok(())
        });
    }

    /// Cut the subject out of the uploaded image and make the cutout the
    /// working image. Filters and the original upload are kept.
    pub async fn remove_background(&self) -> PhotoglowResult<()> {
        let result = self.run_background_removal().await;
        match &result {
            Ok(()) => self.notices.publish(Notice::toast(REMOVAL_SUCCEEDED)),
            Err(err) => {
                tracing::warn!(error = %err, "Background removal failed");
                if let Some(notice) = Notice::for_removal_error(err) {
                    self.notices.publish(notice);
                }
            }
        }
        result
    }

    async fn run_background_removal(&self) -> PhotoglowResult<()> {
        let _token = self.busy.try_acquire(Operation::BackgroundRemoval)?;
        let original = self
            .store
            .read(|session| session.original().cloned())
            .ok_or(PhotoglowError::NoImage)?;

        tracing::info!(status = Operation::BackgroundRemoval.status_message(), "Working");
        let cutout = self
            .remover
            .remove(
                original.bytes().to_vec(),
                self.config.background_removal.clone(),
            )
            .await?;
        let cutout = ImageAsset::decode(cutout)?;

        self.store.update(|session| {
            let unchanged = session
                .original()
                .map(|current| current.shares_handle(&original))
                .unwrap_or(false);
            if !unchanged {
                return Err(PhotoglowError::background_removal(
                    "image was replaced while removing its background",
                ));
            }
            session.replace_current(cutout)
        })
    }

    /// Export the current session to `<output_dir>/Status_<millis>.mp4`.
    pub async fn export_video(
        &self,
        progress: Option<ProgressCallback>,
    ) -> PhotoglowResult<ExportOutcome> {
        let result = self.run_export(progress).await;
        match &result {
            Ok(outcome) => {
                tracing::info!(path = %outcome.path.display(), "Video exported");
                self.notices.publish(Notice::toast(EXPORT_SUCCEEDED));
            }
            Err(err) => {
                if let Some(notice) = Notice::for_export_error(err) {
                    self.notices.publish(notice);
                }
            }
        }
        result
    }

    async fn run_export(&self, progress: Option<ProgressCallback>) -> PhotoglowResult<ExportOutcome> {
        let _token = self.busy.try_acquire(Operation::Export)?;
        let session: EditSession = self.store.snapshot().session;
        self.pipeline.run(&session, progress).await
    }

    /// Write the filtered working image to `dest` as PNG.
    pub fn render_preview(&self, dest: &Path) -> PhotoglowResult<(PathBuf, RasterizedImage)> {
        let (image, filters) = self.store.read(|session| {
            (session.current().cloned(), session.filters())
        });
        let image = image.ok_or(PhotoglowError::NoImage)?;
        let still = rasterize(&image, &filters)?;

        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = dest
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| PhotoglowError::config(format!("Invalid preview path {}", dest.display())))?;
        let path = write_output(&dir, file_name, &still.png)?;
        Ok((path, still))
    }

    /// Current working image, encoded as stored.
    pub fn current_image(&self) -> Option<ImageAsset> {
        self.store.read(|session| session.current().cloned())
    }
}
