//! Check external tools and directories.

use photoglow_common::config::AppConfig;
use photoglow_render_engine::{command_exists, FfmpegEngine};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("PhotoGlow System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;

    match FfmpegEngine::load(config.export.ffmpeg_path.clone()) {
        Ok(engine) => println!("[OK] Video engine: {} (libx264)", engine.binary()),
        Err(e) => {
            ready = false;
            println!("[FAIL] Video engine: {e}");
        }
    }

    if command_exists(&config.export.ffprobe_path) {
        println!("[OK] ffprobe: {}", config.export.ffprobe_path);
    } else {
        println!(
            "[WARN] ffprobe not found ({}): export durations will not be reported",
            config.export.ffprobe_path
        );
    }

    let removal = &config.background_removal;
    if command_exists(&removal.command) {
        println!(
            "[OK] Background removal: {} (model {})",
            removal.command, removal.model
        );
    } else {
        println!(
            "[WARN] Background removal tool not found: {} (remove-bg will fail)",
            removal.command
        );
    }

    match std::fs::create_dir_all(&config.output_dir) {
        Ok(()) => println!("[OK] Output directory: {}", config.output_dir.display()),
        Err(e) => {
            ready = false;
            println!(
                "[FAIL] Output directory {}: {e}",
                config.output_dir.display()
            );
        }
    }

    println!();
    if ready {
        println!("All required tools are available. PhotoGlow is ready.");
    } else {
        println!("Some required tools are missing. See above for fixes.");
    }
    Ok(())
}
