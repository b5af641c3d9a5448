//! Services for Textframe
//!
//! - **Gateway**: authenticates a search and drives the metered upstreams
//! - **Transcript**: caption retrieval for a video id
//! - **Generation**: structured LLM output with token accounting
//! - **Prompt**: the fixed search prompt

pub mod gateway;
pub mod generation;
pub mod prompt;
pub mod transcript;

pub use gateway::{CallState, Gateway, SearchRequest};
pub use generation::{GeminiClient, GenerationConfig, GenerationOutput, Generator};
pub use transcript::{ProxyConfig, TranscriptFetcher, TranscriptSegment, YouTubeTranscriptClient};
