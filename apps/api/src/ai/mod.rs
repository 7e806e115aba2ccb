// AI assist: invoice extraction, reminder emails, dashboard insights.
// All model calls go through llm_client::TextModel.

pub mod extract;
pub mod handlers;
pub mod insights;
pub mod prompts;
pub mod reminder;
