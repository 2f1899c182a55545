// CV Processing Engine
// Implements: strategy analysis, structured extraction, conditional enhancement,
// post-hoc verification and progress streaming.
// All LLM calls go through llm_client — stages only see the `ChatModel` trait.

pub mod agents;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod verifier;
