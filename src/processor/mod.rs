pub mod cleaner;

pub use cleaner::{CleanOutcome, CommentCleaner, MIN_CLEANED_CHARS};
