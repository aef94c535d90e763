pub mod cache;
pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod rate_limit;
pub mod sanitize;
pub mod scoring;
