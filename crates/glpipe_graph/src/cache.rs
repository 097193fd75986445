// SPDX-License-Identifier: MIT OR Apache-2.0
//! Content-addressed caching for expensive derived data.
//!
//! Payloads are memoized under a deterministic key built from exactly
//! the inputs that affect the result. Invalidation is implicit: when
//! an input changes, the recomputed key differs and the next fetch
//! misses; no dependency tracking is needed.

use glpipe_property::{PropertyError, PropertyId, Value, ValueDelegate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors that can occur while computing cached payloads.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// File could not be read
    #[error("failed to read {path}: {message}")]
    Unreadable {
        /// Offending path
        path: String,
        /// IO diagnostic
        message: String,
    },
    /// File content could not be decoded
    #[error("failed to decode {path}: {message}")]
    Decode {
        /// Offending path
        path: String,
        /// Decoder diagnostic
        message: String,
    },
}

/// A producer of expensive derived data.
pub trait CacheSource {
    /// Payload type owned by the pool.
    type Data: Default;

    /// Deterministic key over exactly the inputs that affect the
    /// payload.
    fn cache_key(&self) -> String;

    /// Perform the expensive computation. Called at most once per
    /// unique key.
    fn create_cache_data(&self) -> Result<Self::Data, CacheError>;
}

/// How a fetch was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// An existing payload was reused
    Hit,
    /// The payload was computed and stored
    Loaded,
    /// The computation failed; the neutral empty payload was
    /// substituted and nothing was stored
    Failed(String),
}

/// Result of a pool fetch.
#[derive(Debug)]
pub struct CacheFetch<D> {
    /// The payload; the shared neutral value on failure
    pub data: Arc<D>,
    /// How the fetch was satisfied
    pub outcome: CacheOutcome,
    /// The key the fetch resolved
    pub key: String,
}

/// Pool of content-keyed payloads.
///
/// Two fetches with an identical key observe the same payload
/// instance until the key is explicitly evicted. Failures are never
/// cached: dependents receive a shared neutral payload and the next
/// fetch retries the computation.
#[derive(Debug)]
pub struct CachePool<D> {
    entries: HashMap<String, Arc<D>>,
    empty: Arc<D>,
    loads: u64,
}

impl<D: Default> CachePool<D> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            empty: Arc::new(D::default()),
            loads: 0,
        }
    }

    /// Resolve a source through the pool.
    pub fn fetch<S: CacheSource<Data = D>>(&mut self, source: &S) -> CacheFetch<D> {
        let key = source.cache_key();
        if let Some(data) = self.entries.get(&key) {
            tracing::debug!(%key, "cache hit");
            return CacheFetch {
                data: data.clone(),
                outcome: CacheOutcome::Hit,
                key,
            };
        }
        self.loads += 1;
        match source.create_cache_data() {
            Ok(data) => {
                tracing::debug!(%key, "cache load");
                let data = Arc::new(data);
                self.entries.insert(key.clone(), data.clone());
                CacheFetch {
                    data,
                    outcome: CacheOutcome::Loaded,
                    key,
                }
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "cache load failed");
                CacheFetch {
                    data: self.empty.clone(),
                    outcome: CacheOutcome::Failed(err.to_string()),
                    key,
                }
            }
        }
    }

    /// The shared neutral payload substituted on failure.
    pub fn empty(&self) -> Arc<D> {
        self.empty.clone()
    }

    /// Whether a key currently has a payload.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of underlying computations attempted so far.
    pub fn load_count(&self) -> u64 {
        self.loads
    }

    /// Evict one key, forcing recomputation on the next fetch.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Evict everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<D: Default> Default for CachePool<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// One cell of a texture atlas grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridCell {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Decoded image pixels plus derived atlas-grid metadata.
#[derive(Debug, Clone, Default)]
pub struct ImageData {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// RGBA8 pixel data, row major
    pub pixels: Vec<u8>,
    /// Grid columns the image was split into
    pub grid_cols: u32,
    /// Grid rows the image was split into
    pub grid_rows: u32,
    /// Cell rectangles, row major; remainder pixels are absorbed by
    /// the last cell of each row/column
    pub cells: Vec<GridCell>,
}

/// Source for decoded image data, keyed by file path and atlas grid
/// dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDataSource {
    /// Image file path
    pub path: PathBuf,
    /// Atlas grid columns (0 is treated as 1)
    pub grid_cols: u32,
    /// Atlas grid rows (0 is treated as 1)
    pub grid_rows: u32,
}

impl CacheSource for ImageDataSource {
    type Data = ImageData;

    fn cache_key(&self) -> String {
        format!(
            "ImageDataSource/{}@{}x{}",
            self.path.display(),
            self.grid_cols,
            self.grid_rows
        )
    }

    fn create_cache_data(&self) -> Result<ImageData, CacheError> {
        let path = self.path.display().to_string();
        let image = image::open(&self.path).map_err(|err| match err {
            image::ImageError::IoError(io) => CacheError::Unreadable {
                path: path.clone(),
                message: io.to_string(),
            },
            other => CacheError::Decode {
                path: path.clone(),
                message: other.to_string(),
            },
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let cols = self.grid_cols.max(1);
        let rows = self.grid_rows.max(1);
        let base_w = width / cols;
        let base_h = height / rows;
        let mut cells = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let last_col = col == cols - 1;
                let last_row = row == rows - 1;
                cells.push(GridCell {
                    x: col * base_w,
                    y: row * base_h,
                    width: if last_col { width - base_w * (cols - 1) } else { base_w },
                    height: if last_row { height - base_h * (rows - 1) } else { base_h },
                });
            }
        }
        Ok(ImageData {
            width,
            height,
            pixels: rgba.into_raw(),
            grid_cols: cols,
            grid_rows: rows,
            cells,
        })
    }
}

/// Which image dimension a delegated size property reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeAxis {
    /// Image width
    Width,
    /// Image height
    Height,
}

/// Delegate backing a texture block's computed size property with
/// cached image data.
#[derive(Debug)]
pub struct ImageSizeDelegate {
    data: Arc<ImageData>,
    axis: SizeAxis,
    seen: u32,
}

impl ImageSizeDelegate {
    /// Bind a size axis of decoded image data.
    pub fn new(data: Arc<ImageData>, axis: SizeAxis) -> Self {
        let seen = Self::read(&data, axis);
        Self { data, axis, seen }
    }

    fn read(data: &ImageData, axis: SizeAxis) -> u32 {
        match axis {
            SizeAxis::Width => data.width,
            SizeAxis::Height => data.height,
        }
    }
}

impl ValueDelegate for ImageSizeDelegate {
    fn get(&self) -> Value {
        Value::UInt(Self::read(&self.data, self.axis))
    }

    fn set(&mut self, _value: Value) -> Result<(), PropertyError> {
        Err(PropertyError::ReadOnly(PropertyId::new("image size")))
    }

    fn has_changed(&self) -> bool {
        Self::read(&self.data, self.axis) != self.seen
    }

    fn clear_changed(&mut self) {
        self.seen = Self::read(&self.data, self.axis);
    }
}
