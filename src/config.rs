//! Engine configuration: where downloads land and how they are encoded.
//!
//! The configuration is a plain value merged from three layers: built-in
//! defaults, the settings table from a previous run, and explicit flags for
//! the current run. The merged result is persisted back so the next run
//! starts from the last-used options.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Filename template suffix that stamps the external id into every
/// downloaded file. The duplicate guard relies on this marker, so it is not
/// configurable.
const ID_SUFFIX: &str = " [%(id)s].%(ext)s";

const DEFAULT_OUTPUT_DIR: &str = "downloads";
const DEFAULT_AUDIO_FORMAT: &str = "mp3";
const DEFAULT_BITRATE: &str = "192";
const DEFAULT_NAME_TEMPLATE: &str = "%(title)s";

/// Settings-store keys for the persisted fields.
const KEY_OUTPUT_DIR: &str = "output_dir";
const KEY_AUDIO_FORMAT: &str = "audio_format";
const KEY_BITRATE: &str = "bitrate";
const KEY_NAME_TEMPLATE: &str = "name_template";
const KEY_COOKIE_FILE: &str = "cookie_file";

/// Options controlling output location, encoding, and authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    output_dir: PathBuf,
    audio_format: String,
    bitrate: String,
    name_template: String,
    cookie_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            audio_format: DEFAULT_AUDIO_FORMAT.to_string(),
            bitrate: DEFAULT_BITRATE.to_string(),
            name_template: DEFAULT_NAME_TEMPLATE.to_string(),
            cookie_file: None,
        }
    }
}

impl EngineConfig {
    /// Default configuration writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Directory downloaded audio is written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Target audio container, e.g. `mp3`.
    #[must_use]
    pub fn audio_format(&self) -> &str {
        &self.audio_format
    }

    /// Target bitrate in kbit/s, passed through to the extraction tool.
    #[must_use]
    pub fn bitrate(&self) -> &str {
        &self.bitrate
    }

    /// Filename template without the id suffix, e.g. `%(title)s`.
    #[must_use]
    pub fn name_template(&self) -> &str {
        &self.name_template
    }

    /// Cookies file forwarded to the extraction tool, if any.
    #[must_use]
    pub fn cookie_file(&self) -> Option<&Path> {
        self.cookie_file.as_deref()
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_dir = dir.into();
    }

    pub fn set_audio_format(&mut self, format: impl Into<String>) {
        self.audio_format = format.into();
    }

    pub fn set_bitrate(&mut self, bitrate: impl Into<String>) {
        self.bitrate = bitrate.into();
    }

    pub fn set_name_template(&mut self, template: impl Into<String>) {
        self.name_template = template.into();
    }

    pub fn set_cookie_file(&mut self, path: Option<PathBuf>) {
        self.cookie_file = path;
    }

    /// Full output template handed to the extraction tool: the output
    /// directory joined with the name template plus the id marker.
    #[must_use]
    pub fn output_template(&self) -> String {
        let file_part = format!("{}{ID_SUFFIX}", self.name_template);
        self.output_dir
            .join(file_part)
            .to_string_lossy()
            .into_owned()
    }

    /// Overlays values loaded from the settings store. Keys that are absent
    /// leave the current value alone; an empty cookie path clears it.
    pub fn apply_settings(&mut self, settings: &HashMap<String, String>) {
        if let Some(dir) = settings.get(KEY_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(format) = settings.get(KEY_AUDIO_FORMAT) {
            self.audio_format = format.clone();
        }
        if let Some(bitrate) = settings.get(KEY_BITRATE) {
            self.bitrate = bitrate.clone();
        }
        if let Some(template) = settings.get(KEY_NAME_TEMPLATE) {
            self.name_template = template.clone();
        }
        if let Some(cookie) = settings.get(KEY_COOKIE_FILE) {
            self.cookie_file = if cookie.is_empty() {
                None
            } else {
                Some(PathBuf::from(cookie))
            };
        }
    }

    /// Key/value pairs for persisting this configuration. A missing cookie
    /// path is stored as an empty string so [`Self::apply_settings`] can
    /// round-trip it.
    #[must_use]
    pub fn to_settings(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                KEY_OUTPUT_DIR,
                self.output_dir.to_string_lossy().into_owned(),
            ),
            (KEY_AUDIO_FORMAT, self.audio_format.clone()),
            (KEY_BITRATE, self.bitrate.clone()),
            (KEY_NAME_TEMPLATE, self.name_template.clone()),
            (
                KEY_COOKIE_FILE,
                self.cookie_file
                    .as_deref()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
        ]
    }
}
