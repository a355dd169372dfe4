//! Render the edited still without exporting.

use std::path::PathBuf;

use photoglow_common::config::AppConfig;
use photoglow_studio::Studio;

use super::{print_notices, EditArgs};

pub async fn run(
    config: AppConfig,
    image: PathBuf,
    output: PathBuf,
    edit: EditArgs,
) -> anyhow::Result<()> {
    let studio = Studio::start(config)?;
    let mut notices = studio.subscribe_notices();

    studio.load_image_file(&image)?;
    let applied = edit.apply(&studio).await;
    print_notices(&mut notices);
    applied?;

    let filters = studio.snapshot().session.filters();
    let (path, still) = studio.render_preview(&output)?;

    println!("Preview written: {}", path.display());
    println!("  Size: {}x{}", still.width, still.height);
    println!("  Filter: {}", filters.css());
    Ok(())
}
