use std::path::PathBuf;

use thiserror::Error;

/// Why a start/end pair does not resolve to a slot range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("slot {label:?} is not part of the catalog")]
    UnknownSlot { label: String },
    #[error("start slot {start:?} comes after end slot {end:?}")]
    Reversed { start: String, end: String },
    #[error("slot catalog is empty")]
    EmptyCatalog,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("invalid range: {0}")]
    Range(#[from] RangeError),
    #[error("slot {slot:?} is outside the requested range")]
    SlotOutsideRange { slot: String },
    #[error("slot {slot:?} is confirmed more than once")]
    DuplicateSlot { slot: String },
}
