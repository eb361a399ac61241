//! Digest generation
//!
//! Collected titles are cleaned, batched and sent to a language-model
//! adapter in one call. The free-text reply is parsed line by line against
//! a strict format and padded with placeholders to exactly ten entries.

mod adapter;
mod clean;
mod generator;
mod item;
mod openai;
mod parse;

pub use adapter::{AdapterError, LlmAdapter};
pub use clean::{clean_title, prepare_batch};
pub use generator::SummaryGenerator;
pub use item::{Category, SummaryItem};
pub use openai::OpenAiAdapter;
pub use parse::{pad_summary, parse_summary, DIGEST_LEN};
