pub mod completion_mode;
pub mod default_config;
pub mod llm_model_config;
