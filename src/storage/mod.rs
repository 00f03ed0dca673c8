pub mod jsonl;

pub use jsonl::{CommentStore, ReadOutcome};
