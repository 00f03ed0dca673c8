pub mod provider;
pub mod claude;
pub mod openai;
pub mod prompts;
pub mod parser;

pub use provider::LLMProvider;
pub use claude::ClaudeProvider;
pub use openai::OpenAIProvider;
pub use prompts::{BatchPrompt, CompletionRequest};
