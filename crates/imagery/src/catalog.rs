//! Directory-backed store of hourly imagery.
//!
//! The directory listing is the source of truth: the first and last files
//! bound the valid range and nothing is cached between calls.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use foundation::time::{HourStamp, TimeParseError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::key::ImageryKey;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Before the first or after the last file in the catalog.
    OutOfRange,
    /// Within the catalog's span, but that hour has no file.
    Missing,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::OutOfRange => f.write_str("outside the available range"),
            NotFoundReason::Missing => f.write_str("hour missing from the catalog"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageryError {
    #[error(transparent)]
    InvalidTimestamp(#[from] TimeParseError),
    #[error("no imagery for {hour}: {reason}")]
    NotFound { hour: HourStamp, reason: NotFoundReason },
    #[error("imagery directory {} is missing or unreadable", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no imagery files in {}", path.display())]
    Empty { path: PathBuf },
    #[error("imagery file {} is missing or unreadable", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ImageryError {
    /// Bad input or an absent hour: the client has nothing to show, but the
    /// store itself is healthy.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ImageryError::InvalidTimestamp(_) | ImageryError::NotFound { .. }
        )
    }
}

/// Span of the catalog as seen by the last listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub first: HourStamp,
    pub last: HourStamp,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct ImageryCatalog {
    root: PathBuf,
}

impl ImageryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All recognized imagery files, oldest first. Other entries are skipped.
    pub async fn keys(&self) -> Result<Vec<ImageryKey>, ImageryError> {
        let unreadable = |source| ImageryError::DirectoryUnreadable {
            path: self.root.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(unreadable)?;

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
            let name = entry.file_name();
            match name.to_str().and_then(ImageryKey::from_file_name) {
                Some(key) => keys.push(key),
                None => debug!(entry = ?name, "skipping non-imagery entry"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    pub async fn summary(&self) -> Result<CatalogSummary, ImageryError> {
        let keys = self.keys().await?;
        match (keys.first(), keys.last()) {
            (Some(first), Some(last)) => Ok(CatalogSummary {
                first: first.hour(),
                last: last.hour(),
                count: keys.len(),
            }),
            _ => Err(ImageryError::Empty {
                path: self.root.clone(),
            }),
        }
    }

    /// Resolve `stamp` (snapped to its hour) to the file that holds it.
    pub async fn locate(&self, stamp: HourStamp) -> Result<PathBuf, ImageryError> {
        let target = ImageryKey::for_hour(stamp);
        let keys = self.keys().await?;
        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            return Err(ImageryError::Empty {
                path: self.root.clone(),
            });
        };

        let hour = target.hour();
        if target.as_str() < first.as_str() || target.as_str() > last.as_str() {
            return Err(ImageryError::NotFound {
                hour,
                reason: NotFoundReason::OutOfRange,
            });
        }
        if keys.binary_search_by(|k| k.as_str().cmp(target.as_str())).is_err() {
            return Err(ImageryError::NotFound {
                hour,
                reason: NotFoundReason::Missing,
            });
        }
        Ok(self.root.join(target.as_str()))
    }

    /// PNG bytes for the hour containing `stamp`, unchanged.
    pub async fn read(&self, stamp: HourStamp) -> Result<Vec<u8>, ImageryError> {
        let path = self.locate(stamp).await?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(source) => {
                warn!("imagery read failed: {path:?} -> {source}");
                Err(ImageryError::FileUnreadable { path, source })
            }
        }
    }

    /// Like [`read`](Self::read), parsing the canonical `YYYY-MM-DDTHH:mm`
    /// text first.
    pub async fn read_datehour(&self, datehour: &str) -> Result<Vec<u8>, ImageryError> {
        let stamp = HourStamp::parse(datehour)?;
        self.read(stamp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn stamp(s: &str) -> HourStamp {
        HourStamp::parse(s).unwrap()
    }

    fn catalog_with(names: &[&str]) -> (TempDir, ImageryCatalog) {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }
        let catalog = ImageryCatalog::new(dir.path());
        (dir, catalog)
    }

    #[tokio::test]
    async fn reads_the_snapped_hour() {
        let (_dir, catalog) = catalog_with(&[
            "2012-10-22T00-00-00.png",
            "2012-10-22T01-00-00.png",
            "2012-10-22T02-00-00.png",
        ]);
        let bytes = catalog.read(stamp("2012-10-22T01:59")).await.unwrap();
        assert_eq!(bytes, b"2012-10-22T01-00-00.png".to_vec());
    }

    #[tokio::test]
    async fn distinguishes_out_of_range_from_missing() {
        let (_dir, catalog) = catalog_with(&[
            "2012-10-22T00-00-00.png",
            "2012-10-22T03-00-00.png",
            "notes.txt",
        ]);

        let err = catalog.read(stamp("2012-10-21T23:00")).await.unwrap_err();
        assert!(matches!(err, ImageryError::NotFound { reason: NotFoundReason::OutOfRange, .. }));
        let err = catalog.read(stamp("2012-10-22T04:00")).await.unwrap_err();
        assert!(matches!(err, ImageryError::NotFound { reason: NotFoundReason::OutOfRange, .. }));
        let err = catalog.read(stamp("2012-10-22T02:00")).await.unwrap_err();
        assert!(matches!(err, ImageryError::NotFound { reason: NotFoundReason::Missing, .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn storage_failures_are_not_recoverable() {
        let missing = ImageryCatalog::new("/definitely/not/a/catalog");
        let err = missing.read(stamp("2012-10-22T00:00")).await.unwrap_err();
        assert!(matches!(err, ImageryError::DirectoryUnreadable { .. }));
        assert!(!err.is_recoverable());

        let (_dir, empty) = catalog_with(&["readme.md"]);
        let err = empty.read(stamp("2012-10-22T00:00")).await.unwrap_err();
        assert!(matches!(err, ImageryError::Empty { .. }));
    }

    #[tokio::test]
    async fn unreadable_file_is_a_storage_error() {
        let (dir, catalog) = catalog_with(&["2012-10-22T00-00-00.png"]);
        // A directory with an imagery name lists fine but cannot be read as a file.
        std::fs::create_dir(dir.path().join("2012-10-22T01-00-00.png")).unwrap();
        let err = catalog.read(stamp("2012-10-22T01:00")).await.unwrap_err();
        assert!(matches!(err, ImageryError::FileUnreadable { .. }));
    }

    #[tokio::test]
    async fn parse_errors_surface_as_invalid_timestamp() {
        let (_dir, catalog) = catalog_with(&["2012-10-22T00-00-00.png"]);
        let err = catalog.read_datehour("2012-10-22").await.unwrap_err();
        assert!(matches!(err, ImageryError::InvalidTimestamp(_)));
        assert!(err.is_recoverable());
        assert!(catalog.read_datehour("2012-10-22T00:30").await.is_ok());
    }

    #[tokio::test]
    async fn summary_reports_bounds() {
        let (_dir, catalog) = catalog_with(&[
            "2012-10-31T12-00-00.png",
            "2012-10-22T00-00-00.png",
            "2012-10-25T00-00-00.png",
        ]);
        let summary = catalog.summary().await.unwrap();
        assert_eq!(
            summary,
            CatalogSummary {
                first: stamp("2012-10-22T00:00"),
                last: stamp("2012-10-31T12:00"),
                count: 3,
            }
        );
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({"first": "2012-10-22T00:00", "last": "2012-10-31T12:00", "count": 3})
        );
    }
}
