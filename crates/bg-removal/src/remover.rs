//! Background removers.
//!
//! The model itself is out of scope; we shell out to a segmentation tool
//! that reads an image on stdin and writes a PNG cutout on stdout
//! (`rembg i -m <model> - -` by default).

use std::io::Write;
use std::process::{Command, Stdio};

use photoglow_common::config::BackgroundRemovalConfig;
use photoglow_common::error::{PhotoglowError, PhotoglowResult};

/// Environment variable rembg reads its model directory from.
pub const MODEL_DIR_ENV: &str = "U2NET_HOME";

/// Something that can cut the subject out of an encoded image.
pub trait BackgroundRemover: Send {
    /// Return the cutout as encoded PNG bytes.
    fn remove(&self, image: &[u8], config: &BackgroundRemovalConfig) -> PhotoglowResult<Vec<u8>>;

    /// Remover name.
    fn name(&self) -> &str;
}

/// Runs the configured external tool once per request.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRemover;

impl BackgroundRemover for CommandRemover {
    fn remove(&self, image: &[u8], config: &BackgroundRemovalConfig) -> PhotoglowResult<Vec<u8>> {
        let args = config.resolved_args();
        tracing::debug!(command = %config.command, ?args, "Running background removal tool");

        let mut cmd = Command::new(&config.command);
        cmd.args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &config.model_dir {
            cmd.env(MODEL_DIR_ENV, dir);
        }

        let started = std::time::Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PhotoglowError::background_removal(format!("{} not found in PATH", config.command))
            } else {
                PhotoglowError::background_removal(format!("Failed to start {}: {e}", config.command))
            }
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PhotoglowError::background_removal("Failed to open tool stdin"))?;

        // stdin is fed on its own thread while stdout is drained here.
        let input = image.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child
            .wait_with_output()
            .map_err(|e| PhotoglowError::background_removal(format!("Failed to wait on tool: {e}")))?;

        match writer.join() {
            Ok(Ok(())) => {}
            // the tool may exit early and close stdin; its status tells the story
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => {
                return Err(PhotoglowError::background_removal(format!(
                    "Failed writing image to tool: {e}"
                )))
            }
            Err(_) => return Err(PhotoglowError::background_removal("stdin writer panicked")),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, stderr = %stderr.trim(), "Background removal tool failed");
            return Err(PhotoglowError::background_removal(format!(
                "{} exited with {}: {}",
                config.command,
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(PhotoglowError::background_removal(format!(
                "{} produced no image",
                config.command
            )));
        }

        tracing::info!(
            model = %config.model,
            input_bytes = image.len(),
            output_bytes = output.stdout.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Background removed"
        );
        Ok(output.stdout)
    }

    fn name(&self) -> &str {
        "command"
    }
}
