//! Data layer: record types, catalog storage, indexing and filtering.
//!
//! Architecture:
//! ```text
//!  catalog.json  /  <dir>/{files,memberships,pairs,annotations}.{csv,parquet}
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse tables → Catalog
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  index    │  validate, precompute per-fold tables → CatalogIndex
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  ObjectQuery criteria, resolved by `Database`
//!   └──────────┘
//! ```

pub mod filter;
pub mod index;
pub mod loader;
pub mod model;
pub mod protocol;
pub mod synthetic;
pub mod table;
pub mod writer;
