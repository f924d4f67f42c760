//! OpenAI-compatible completion client used by the pull-request reviewer.
//!
//! - [`config`]: completion mode, model config, validated defaults
//! - [`services`]: the [`services::CompletionService`] seam and the OpenAI client
//! - [`error_handler`]: unified [`error_handler::AiLlmError`] and env helpers
//! - [`telemetry`]: `tracing-subscriber` layer shared by the workspace binary

pub mod config;
pub mod error_handler;
pub mod services;
pub mod telemetry;

pub use config::{
    completion_mode::CompletionMode, default_config::config_openai,
    llm_model_config::LlmModelConfig,
};
pub use error_handler::AiLlmError;
pub use services::{CompletionService, open_ai_service::OpenAiService};
