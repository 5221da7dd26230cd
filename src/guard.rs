//! Duplicate detection for already-downloaded audio.
//!
//! Every file the downloader writes carries the track's external id in
//! square brackets (the output template appends ` [%(id)s]`), so a track can
//! be recognized on disk even when the database was swapped out or the same
//! folder is shared between machines. The scan is a linear pass over the
//! immediate entries of the output directory; it does not recurse. For a
//! playlist of n tracks against a folder of m files this costs n * m name
//! checks, which is fine at desktop scale.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extensions recognized as downloaded audio.
pub const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "m4a", "wav", "flac"];

/// Looks for an audio file in `dir` whose name carries `[external_id]`.
///
/// Returns the first match. A missing output directory is not an error; it
/// just means nothing has been downloaded yet.
///
/// # Errors
///
/// Returns any I/O error from reading the directory other than it not
/// existing.
pub fn find_existing_audio(dir: &Path, external_id: &str) -> io::Result<Option<PathBuf>> {
    if external_id.is_empty() {
        return Ok(None);
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error),
    };

    let marker = format!("[{external_id}]");
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(name) = path.file_name().and_then(OsStr::to_str) else {
            continue;
        };
        if name.contains(&marker) && has_audio_extension(&path) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// True if the path's extension is one of [`AUDIO_EXTENSIONS`].
/// The comparison ignores case, so `.MP3` rips count too.
fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
