pub mod acquisition;
pub mod parser;
pub mod word_cache;

pub use acquisition::{AcquisitionService, BatchSource};
pub use parser::parse_candidates;
pub use word_cache::WordCache;
