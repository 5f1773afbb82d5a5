//! Catalog import: turns loosely-structured supplier price lists
//! (Excel/CSV uploads or remote delimited-text exports) into idempotent
//! upserts against the catalog.

pub mod header_map;
pub mod normalize;
pub mod reconciler;
pub mod source;

pub use reconciler::{ImportReport, ImportService};
pub use source::TabularSource;
