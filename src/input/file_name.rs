//! Code for deriving building and month labels from the names of meter export files.
use std::path::Path;

/// The label used when a file name doesn't provide a building or month
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Labels derived from an input file's name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTags {
    /// The building the file's readings belong to
    pub building: String,
    /// The month the file covers
    pub month: String,
}

/// A rule for turning a file name into [`FileTags`]
pub trait FileNameConvention {
    /// Derive tags from a file stem (the file name without its extension)
    fn tags(&self, stem: &str) -> FileTags;

    /// Derive tags from a path, using its stem
    fn tags_for_path(&self, path: &Path) -> FileTags {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        self.tags(&stem)
    }
}

/// The `<building>[_...]_<month>` naming convention.
///
/// The stem is split on underscores: the first token is the building and the last token is the
/// month. A stem with a single token has no month. Empty tokens count as absent.
///
/// | Stem                   | Building  | Month     |
/// |------------------------|-----------|-----------|
/// | `admin_block_2025-01`  | `admin`   | `2025-01` |
/// | `hostel_a_2025-01`     | `hostel`  | `2025-01` |
/// | `library`              | `library` | `Unknown` |
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderscoreConvention;

impl FileNameConvention for UnderscoreConvention {
    fn tags(&self, stem: &str) -> FileTags {
        let parts: Vec<&str> = stem.split('_').collect();
        let label = |token: Option<&&str>| match token {
            Some(token) if !token.is_empty() => (*token).to_string(),
            _ => UNKNOWN_LABEL.to_string(),
        };

        FileTags {
            building: label(parts.first()),
            month: if parts.len() > 1 {
                label(parts.last())
            } else {
                UNKNOWN_LABEL.to_string()
            },
        }
    }
}
