// AI career insights: prompt construction and the completion gateway with
// copy-paste fallback. All provider calls go through llm_client.

pub mod gateway;
pub mod handlers;
pub mod prompts;

pub use gateway::InsightGateway;
