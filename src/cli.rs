//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;
use clap::builder::{PossibleValuesParser, TypedValueParser};

use tunedl_core::config::EngineConfig;
use tunedl_core::guard::AUDIO_EXTENSIONS;

/// Download the audio of a video or playlist and keep it in sync.
///
/// tunedl resolves the URL, remembers every track in a local database, and
/// downloads whatever has not finished yet. Re-running the same URL resumes
/// where the last run stopped instead of starting over.
#[derive(Parser, Debug)]
#[command(name = "tunedl")]
#[command(author, version, about)]
pub struct Args {
    /// Playlist or video URL to download
    pub url: String,

    /// Directory downloaded audio is written to
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Audio format to extract
    #[arg(short = 'f', long, value_parser = PossibleValuesParser::new(AUDIO_EXTENSIONS))]
    pub format: Option<String>,

    /// Target bitrate in kbit/s
    #[arg(short = 'b', long)]
    pub bitrate: Option<String>,

    /// Filename template; the track id is always appended
    #[arg(long, value_name = "TEMPLATE")]
    pub name_template: Option<String>,

    /// Cookies file forwarded to the extraction tool (for gated content);
    /// pass an empty string to clear a remembered path
    #[arg(long, value_name = "FILE", value_parser = clap::builder::OsStringValueParser::new().map(PathBuf::from))]
    pub cookies: Option<PathBuf>,

    /// SQLite database tracking playlists and download status
    #[arg(long, default_value = "downloads.db", value_name = "FILE")]
    pub database: PathBuf,

    /// Append a per-track CSV report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Path to the yt-dlp binary
    #[arg(long, value_name = "PATH")]
    pub ytdlp: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Overlays the explicit flags onto a configuration loaded from the
    /// settings store. Flags the user did not pass leave the remembered
    /// values alone.
    pub fn apply_to(&self, config: &mut EngineConfig) {
        if let Some(dir) = &self.output_dir {
            config.set_output_dir(dir);
        }
        if let Some(format) = &self.format {
            config.set_audio_format(format);
        }
        if let Some(bitrate) = &self.bitrate {
            config.set_bitrate(bitrate);
        }
        if let Some(template) = &self.name_template {
            config.set_name_template(template);
        }
        if let Some(cookies) = &self.cookies {
            let path = if cookies.as_os_str().is_empty() {
                None
            } else {
                Some(cookies.clone())
            };
            config.set_cookie_file(path);
        }
    }
}
