//! URL resolution: from one user-supplied URL to a normalized track list.
//!
//! The metadata probe reports two shapes: a collection object carrying an
//! `entries` array, or a bare single item. Everything downstream works with
//! exactly one shape — a playlist title plus an ordered descriptor sequence —
//! and this module is the only place that knows about the difference.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::extractor::{Extractor, ExtractorError, ItemDescriptor, ProbeOptions};

/// Title used when the metadata carries none.
const DEFAULT_PLAYLIST_TITLE: &str = "Untitled";

/// One resolved source: display title plus its items in probe order.
///
/// A single video resolves to a one-entry playlist; the engine never
/// distinguishes the two cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlaylist {
    /// Display title for the playlist row.
    pub title: String,
    /// Item descriptors in the order the probe reported them.
    pub entries: Vec<ItemDescriptor>,
}

/// Errors raised while resolving a URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The extraction capability failed outright (bad URL, network, private
    /// source). Fatal for the run.
    #[error("could not resolve {url}: {source}")]
    Extraction {
        /// The URL being resolved.
        url: String,
        /// The capability's failure.
        #[source]
        source: ExtractorError,
    },

    /// The probe returned something that is neither an item nor a collection.
    #[error("metadata for {url} is neither an item nor a collection")]
    UnrecognizedShape {
        /// The URL being resolved.
        url: String,
    },
}

/// Builds a descriptor from one raw metadata value.
///
/// Null entries (deleted/private items in a flat playlist), non-object
/// values, and descriptors with no usable field at all are dropped here so
/// downstream code never sees them.
fn descriptor_from_value(value: &serde_json::Value) -> Option<ItemDescriptor> {
    if value.is_null() {
        return None;
    }
    let descriptor: ItemDescriptor = serde_json::from_value(value.clone()).ok()?;
    if descriptor.is_empty() {
        None
    } else {
        Some(descriptor)
    }
}

/// Normalizes raw probe metadata into the uniform playlist shape.
///
/// Returns `None` when the metadata is not a JSON object at all.
fn normalize_metadata(metadata: &serde_json::Value) -> Option<ResolvedPlaylist> {
    let object = metadata.as_object()?;

    let title = object
        .get("title")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(DEFAULT_PLAYLIST_TITLE)
        .to_string();

    let entries: Vec<ItemDescriptor> = if let Some(raw_entries) = object.get("entries") {
        // Collection shape. A malformed entries field yields an empty list
        // rather than misreading the collection as a single item.
        raw_entries
            .as_array()
            .map(|array| array.iter().filter_map(descriptor_from_value).collect())
            .unwrap_or_default()
    } else {
        // Single-item shape: the object itself is the one descriptor.
        descriptor_from_value(metadata).into_iter().collect()
    };

    Some(ResolvedPlaylist { title, entries })
}

/// Resolves user-supplied URLs through the extraction capability.
pub struct Resolver {
    source: Arc<dyn Extractor>,
    options: ProbeOptions,
}

impl Resolver {
    /// Creates a resolver over the given capability.
    #[must_use]
    pub fn new(source: Arc<dyn Extractor>, options: ProbeOptions) -> Self {
        Self { source, options }
    }

    /// Resolves a URL into a normalized playlist.
    ///
    /// Asks the capability for flat metadata only; no media is downloaded.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Extraction`] when the probe fails and
    /// [`ResolveError::UnrecognizedShape`] when its output has no usable
    /// shape. Both are fatal for the run.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn resolve(&self, url: &str) -> Result<ResolvedPlaylist, ResolveError> {
        let metadata =
            self.source
                .probe(url, &self.options)
                .await
                .map_err(|source| ResolveError::Extraction {
                    url: url.to_string(),
                    source,
                })?;

        let resolved = normalize_metadata(&metadata).ok_or_else(|| {
            ResolveError::UnrecognizedShape {
                url: url.to_string(),
            }
        })?;

        debug!(
            title = %resolved.title,
            entries = resolved.entries.len(),
            "resolved playlist"
        );
        Ok(resolved)
    }
}
