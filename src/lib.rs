//! Query API over the fold-based face verification benchmark catalog.
//!
//! The catalog lists every image (file) of the dataset, the people (clients)
//! shown in them, the assignment of people to folds, the predefined
//! verification pairs of each fold and facial landmark annotations.
//! [`Database`] loads it once and answers filtered lookups by protocol,
//! group, purpose, world type and subworld.

pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod database;
pub mod error;

pub use crate::data::filter::ObjectQuery;
pub use crate::data::model::{Catalog, Client, File, FileId, Landmarks, Model, Pair};
pub use crate::data::protocol::{Fold, Group, PairLabel, Protocol, Purpose, Subworld, WorldType};
pub use crate::database::Database;
pub use crate::error::{CatalogError, QueryError};
