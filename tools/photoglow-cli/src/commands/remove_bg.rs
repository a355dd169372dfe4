//! Cut the subject out of a photo.

use std::path::PathBuf;

use photoglow_common::config::AppConfig;
use photoglow_studio::Studio;

use super::print_notices;

pub async fn run(config: AppConfig, image: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    println!("Removing background from: {}", image.display());
    println!(
        "  Tool: {} {}",
        config.background_removal.command,
        config.background_removal.resolved_args().join(" ")
    );

    let studio = Studio::start(config)?;
    let mut notices = studio.subscribe_notices();
    studio.load_image_file(&image)?;

    let removed = studio.remove_background().await;
    print_notices(&mut notices);
    removed?;

    let (path, still) = studio.render_preview(&output)?;
    println!("Cutout written: {} ({}x{})", path.display(), still.width, still.height);
    Ok(())
}
