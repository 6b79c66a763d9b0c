//! Dataset seam: a minimal columnar table and its storage codec.
//!
//! The tracker materializes step outputs through the [`FrameStore`] trait;
//! the bundled [`JsonlFrameStore`] persists a [`Frame`] as numbered
//! `part.N.jsonl` objects under the output location, the same part-file
//! convention the surrounding pipeline tooling expects. Reading is lazy: a
//! [`LazyFrame`] holds the location and only touches storage on
//! [`LazyFrame::collect`], which can be called repeatedly.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::store::{ObjectStore, StoreError};

/// Rows per part object. Writes are chunked so one giant output does not
/// become one giant object.
const PART_MAX_ROWS: usize = 50_000;

/// Failures of the dataset layer.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A part object exists but cannot be decoded.
    #[error("part object '{key}' is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A part object declares different columns than its siblings.
    #[error("part object '{key}' does not match the frame header")]
    HeaderMismatch { key: String },

    /// A row does not match the frame's column count.
    #[error("row has {got} values but the frame has {want} columns")]
    RowShape { want: usize, got: usize },
}

/// In-memory table: named columns and JSON-value rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), FrameError> {
        if row.len() != self.columns.len() {
            return Err(FrameError::RowShape {
                want: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Human-readable schema description: row/column counts plus a type
    /// inferred per column from the first rows. Diagnostics only.
    pub fn schema_summary(&self) -> String {
        let mut out = format!("{} columns, {} rows", self.columns.len(), self.rows.len());
        for (idx, column) in self.columns.iter().enumerate() {
            out.push_str(&format!("\n  {column}: {}", self.column_type(idx)));
        }
        out
    }

    fn column_type(&self, idx: usize) -> &'static str {
        let mut seen: Option<&'static str> = None;
        for row in self.rows.iter().take(100) {
            let name = match &row[idx] {
                Value::Null => continue,
                Value::Bool(_) => "bool",
                Value::Number(n) if n.is_i64() || n.is_u64() => "int",
                Value::Number(_) => "float",
                Value::String(_) => "str",
                Value::Array(_) => "list",
                Value::Object(_) => "object",
            };
            match seen {
                None => seen = Some(name),
                Some(prev) if prev == name => {}
                Some(_) => return "mixed",
            }
        }
        seen.unwrap_or("null")
    }
}

/// Deferred read of a stored frame. Holds no data; `collect` re-reads the
/// parts from storage every time, so the handle stays valid across
/// overwrites of the underlying location.
#[derive(Clone)]
pub struct LazyFrame {
    store: Arc<dyn ObjectStore>,
    location: String,
}

impl LazyFrame {
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Reads and decodes every part under the location into one frame.
    pub fn collect(&self) -> Result<Frame, FrameError> {
        let mut part_keys: Vec<(u64, String)> = self
            .store
            .list(&self.location)?
            .into_iter()
            .filter_map(|key| part_index(&key).map(|n| (n, key)))
            .collect();
        part_keys.sort();

        let mut frame: Option<Frame> = None;
        for (_, key) in part_keys {
            let bytes = self.store.get(&key)?;
            let text = String::from_utf8_lossy(&bytes);
            let mut lines = text.lines();

            let header = lines.next().unwrap_or("");
            let columns: Vec<String> =
                serde_json::from_str(header).map_err(|source| FrameError::Malformed {
                    key: key.clone(),
                    source,
                })?;

            let frame = frame.get_or_insert_with(|| Frame::new(columns.clone()));
            if frame.columns() != columns.as_slice() {
                return Err(FrameError::HeaderMismatch { key });
            }

            for line in lines {
                let row: Vec<Value> =
                    serde_json::from_str(line).map_err(|source| FrameError::Malformed {
                        key: key.clone(),
                        source,
                    })?;
                frame.push_row(row)?;
            }
        }

        Ok(frame.unwrap_or_else(|| Frame::new(Vec::<String>::new())))
    }
}

/// Reads and writes frames at object-store locations.
pub trait FrameStore: Send + Sync {
    /// Returns a lazy handle on the frame stored at `location`. Performs
    /// no I/O.
    fn read_frame(&self, location: &str) -> LazyFrame;

    /// Persists `frame` under `location` as part objects, replacing any
    /// parts already there.
    fn write_frame(&self, location: &str, frame: &Frame) -> Result<(), FrameError>;
}

/// Frame codec over JSON-lines part objects: the first line of each part
/// is the column header, every following line is one row.
pub struct JsonlFrameStore {
    store: Arc<dyn ObjectStore>,
}

impl JsonlFrameStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

impl FrameStore for JsonlFrameStore {
    fn read_frame(&self, location: &str) -> LazyFrame {
        LazyFrame {
            store: Arc::clone(&self.store),
            location: location.to_string(),
        }
    }

    fn write_frame(&self, location: &str, frame: &Frame) -> Result<(), FrameError> {
        // Clear stale parts so a smaller rewrite cannot leave orphans that
        // would be concatenated into the next read.
        self.store.delete_by_prefix(location)?;

        let header = serde_json::to_string(frame.columns()).map_err(|source| {
            FrameError::Malformed {
                key: location.to_string(),
                source,
            }
        })?;

        let rows = frame.rows();
        let chunks: Vec<&[Vec<Value>]> = if rows.is_empty() {
            vec![rows]
        } else {
            rows.chunks(PART_MAX_ROWS).collect()
        };

        for (index, chunk) in chunks.iter().enumerate() {
            let mut body = header.clone();
            for row in chunk.iter() {
                body.push('\n');
                let line =
                    serde_json::to_string(row).map_err(|source| FrameError::Malformed {
                        key: location.to_string(),
                        source,
                    })?;
                body.push_str(&line);
            }
            let key = format!("{location}/part.{index}.jsonl");
            self.store.put(&key, body.as_bytes())?;
        }
        debug!(location, rows = frame.len(), parts = chunks.len(), "frame written");
        Ok(())
    }
}

/// Parses `N` out of a `.../part.N.jsonl` key.
fn part_index(key: &str) -> Option<u64> {
    let file = key.rsplit('/').next()?;
    let rest = file.strip_prefix("part.")?;
    let digits = rest.strip_suffix(".jsonl")?;
    digits.parse().ok()
}
