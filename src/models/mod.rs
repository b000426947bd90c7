pub mod seeds;
pub mod word;

pub use seeds::seed_words;
pub use word::{
    category_allowed, WordCandidate, ALLOWED_CATEGORIES, DEFAULT_CATEGORY, EXAMPLE_PLACEHOLDER,
};
