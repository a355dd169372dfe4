//! Browse the music library.

use photoglow_session_model::{CategoryFilter, TrackCatalog};

pub fn run(search: &str, category: &str, json: bool) -> anyhow::Result<()> {
    let filter: CategoryFilter = category.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let catalog = TrackCatalog::builtin();
    let tracks = catalog.search(search, filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&tracks)?);
        return Ok(());
    }

    let chips: Vec<&str> = CategoryFilter::CHOICES.iter().map(|c| c.label()).collect();
    println!("Categories: {}", chips.join(" | "));
    println!("{}", "=".repeat(50));

    if tracks.is_empty() {
        println!("No tracks match.");
        return Ok(());
    }

    for track in &tracks {
        println!(
            "{:>3}  {:<14} {:<16} {}",
            track.id,
            track.title,
            track.artist,
            track.category.label()
        );
    }
    println!();
    println!("{} of {} tracks", tracks.len(), catalog.len());
    Ok(())
}
