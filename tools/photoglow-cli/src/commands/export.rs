//! Export an edited photo as a music clip.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use photoglow_common::config::AppConfig;
use photoglow_render_engine::{EngineStatus, ExportProgress, ExportStage, ProgressCallback};
use photoglow_studio::Studio;

use super::{print_notices, EditArgs};

pub async fn run(
    config: AppConfig,
    image: PathBuf,
    track: u32,
    engine_timeout_secs: u64,
    edit: EditArgs,
) -> anyhow::Result<()> {
    println!("Exporting: {}", image.display());

    let studio = Studio::start(config)?;
    let mut notices = studio.subscribe_notices();

    studio.load_image_file(&image)?;
    let applied = edit.apply(&studio).await;
    print_notices(&mut notices);
    applied?;

    let track = studio.select_track(track)?;
    println!("  Track: {} - {}", track.title, track.artist);
    println!("  Filter: {}", studio.snapshot().session.filters().css());
    println!("  Output dir: {}", studio.config().output_dir.display());

    match studio
        .wait_for_engine(Duration::from_secs(engine_timeout_secs))
        .await
    {
        EngineStatus::Ready(engine) => tracing::debug!(engine = engine.name(), "Engine ready"),
        EngineStatus::Loading => tracing::warn!(engine_timeout_secs, "Engine still loading"),
        EngineStatus::Failed(reason) => eprintln!("  Video engine unavailable: {reason}"),
    }

    let progress: ProgressCallback = Arc::new(|p: ExportProgress| {
        let label = match p.stage {
            ExportStage::Preparing => "Preparing",
            ExportStage::Rasterizing => "Rendering image",
            ExportStage::FetchingAudio => "Downloading audio",
            ExportStage::Encoding => "Encoding",
            ExportStage::Saving => "Saving",
            ExportStage::Complete => "Done",
            ExportStage::Failed => "Failed",
        };
        if p.stage == ExportStage::Encoding && p.progress > 0.0 {
            print!(
                "\r  {label}: {:.1}% ({:.1}s, ETA: {:.0}s)      ",
                p.progress * 100.0,
                p.encoded_secs,
                p.eta_secs
            );
        } else {
            print!("\r  {label}...                              ");
        }
        let _ = std::io::stdout().flush();
    });

    let result = studio.export_video(Some(progress)).await;
    println!();
    print_notices(&mut notices);

    let outcome = result?;
    println!("Export complete: {}", outcome.path.display());
    println!("  Size: {}x{}, {} bytes", outcome.width, outcome.height, outcome.size_bytes);
    if let Some(probe) = outcome.probe {
        println!("  Duration: {:.2}s", probe.duration_secs);
    }
    Ok(())
}
