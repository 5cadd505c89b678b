use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::protocol::{Fold, PairLabel};

/// Numeric identifier of an image file.
pub type FileId = u32;

/// Landmark name → `[y, x]` coordinate.
pub type Landmarks = BTreeMap<String, [f64; 2]>;

// ---------------------------------------------------------------------------
// File – one image of the dataset
// ---------------------------------------------------------------------------

/// A single image of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    /// Person shown in the image.
    pub client_id: String,
    /// Relative path without extension, e.g. `Aaron_Eckhart/Aaron_Eckhart_0001`.
    pub path: String,
}

// ---------------------------------------------------------------------------
// Client / Model – derived groupings of files
// ---------------------------------------------------------------------------

/// A person of the dataset together with all of their images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: String,
    /// Sorted ids of the client's files.
    pub file_ids: Vec<FileId>,
}

/// An enrollment model: the files a verification template is built from.
///
/// Models are keyed by their enrollment file, so `id` is a [`FileId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Model {
    pub id: FileId,
    pub client_id: String,
    pub file_ids: Vec<FileId>,
}

// ---------------------------------------------------------------------------
// Membership / Pair / AnnotationRecord – raw catalog rows
// ---------------------------------------------------------------------------

/// Assignment of a person to a fold.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Membership {
    pub fold: Fold,
    pub client_id: String,
}

/// A predefined verification trial between two files of one fold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub fold: Fold,
    pub enrol_file: FileId,
    pub probe_file: FileId,
    pub is_match: bool,
}

impl Pair {
    pub fn label(&self) -> PairLabel {
        PairLabel::from_match(self.is_match)
    }
}

/// One landmark position of one annotation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub file_id: FileId,
    pub annotation_type: String,
    pub landmark: String,
    pub y: f64,
    pub x: f64,
}

// ---------------------------------------------------------------------------
// Catalog – the complete loaded record tables
// ---------------------------------------------------------------------------

/// All record tables of the dataset, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub files: Vec<File>,
    pub memberships: Vec<Membership>,
    pub pairs: Vec<Pair>,
    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
}

impl Catalog {
    /// Number of image files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the catalog holds no file.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
