use thiserror::Error;

use crate::data::model::FileId;
use crate::data::protocol::Fold;

/// Errors raised while interpreting query arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid {kind} '{value}'; expected one of: {expected}")]
    InvalidArgument {
        kind: &'static str,
        value: String,
        expected: String,
    },
}

impl QueryError {
    pub fn invalid(kind: &'static str, value: &str, expected: &[&str]) -> Self {
        QueryError::InvalidArgument {
            kind,
            value: value.to_string(),
            expected: expected.join(", "),
        }
    }
}

/// Structural problems in a loaded catalog.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("file id {0} appears more than once")]
    DuplicateFileId(FileId),

    #[error("file path '{0}' appears more than once")]
    DuplicatePath(String),

    #[error("client '{client_id}' is a member of both {first} and {second}")]
    ClientInSeveralFolds {
        client_id: String,
        first: Fold,
        second: Fold,
    },

    #[error("membership in {fold} names client '{client_id}' who owns no file")]
    UnknownMember { fold: Fold, client_id: String },

    #[error("pair in {fold} references unknown file {file_id}")]
    PairUnknownFile { fold: Fold, file_id: FileId },

    #[error("pair in {fold} references file {file_id} of client '{client_id}' who is not a member of that fold")]
    PairOutsideFold {
        fold: Fold,
        file_id: FileId,
        client_id: String,
    },

    #[error("annotation '{annotation_type}' references unknown file {file_id}")]
    AnnotationUnknownFile {
        file_id: FileId,
        annotation_type: String,
    },

    #[error("'{annotation_type}' annotation of file {file_id} lacks landmark '{landmark}'")]
    MissingLandmark {
        file_id: FileId,
        annotation_type: String,
        landmark: &'static str,
    },

    #[error("consistency check failed: {0}")]
    Inconsistent(String),
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;
