// Provider wire clients

pub mod provider_handle;
pub mod provider_base;
pub mod claude;
pub mod ollama;
pub mod openai;
