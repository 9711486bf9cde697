pub mod cache;
pub mod raw_table;
pub mod source;

pub use cache::{SourceCache, SOURCE_CACHE};
pub use raw_table::RawTable;
pub use source::{source_from_config, SalesSource};
