// AI enhancement of CV content: summary rewrites, bullet rewrites, job adaptation.
// All model calls go through the injected LlmGateway.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod sanitize;
