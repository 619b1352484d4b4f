// Course generation engine.
// Implements: stage contracts, output validation, stage prompts and the pipeline orchestrator.
// All model calls go through llm_client::CompletionProvider.

pub mod contract;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod validator;
