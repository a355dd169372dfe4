pub mod check;
pub mod config;
pub mod export;
pub mod preview;
pub mod remove_bg;
pub mod tracks;

use clap::Args;
use tokio::sync::broadcast;

use photoglow_session_model::FilterParam;
use photoglow_studio::{Notice, NoticeLevel, Studio};

/// Edits applied before rendering, in this order: preset, individual
/// filters, background removal.
#[derive(Args, Debug, Default)]
pub struct EditArgs {
    /// Start from the "Auto Enhance" preset (110/115/120/0)
    #[arg(long)]
    pub enhance: bool,

    /// Brightness in percent (0-200)
    #[arg(long)]
    pub brightness: Option<i64>,

    /// Contrast in percent (0-200)
    #[arg(long)]
    pub contrast: Option<i64>,

    /// Saturation in percent (0-200)
    #[arg(long)]
    pub saturation: Option<i64>,

    /// Blur radius in pixels (0-20)
    #[arg(long)]
    pub blur: Option<i64>,

    /// Remove the background with the configured tool first
    #[arg(long)]
    pub remove_bg: bool,
}

impl EditArgs {
    pub async fn apply(&self, studio: &Studio) -> anyhow::Result<()> {
        if self.enhance {
            studio.apply_preset();
        }

        let values = [
            (FilterParam::Brightness, self.brightness),
            (FilterParam::Contrast, self.contrast),
            (FilterParam::Saturation, self.saturation),
            (FilterParam::Blur, self.blur),
        ];
        for (param, value) in values {
            if let Some(value) = value {
                studio.set_filter(param, value)?;
            }
        }

        if self.remove_bg {
            println!("Removing background...");
            studio.remove_background().await?;
        }
        Ok(())
    }
}

/// Print whatever notices the studio raised since the last drain.
pub fn print_notices(rx: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = rx.try_recv() {
        match notice.level {
            NoticeLevel::Toast => println!("  {}", notice.message),
            NoticeLevel::Alert => eprintln!("  [ALERT] {}", notice.message),
        }
    }
}
