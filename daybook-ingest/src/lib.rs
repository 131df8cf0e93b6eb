//! daybook-ingest: turning free text into expense line items via an AI
//! extraction service (prompt in, JSON reply out).

pub mod prompt;
pub mod response;

pub use prompt::build_prompt;
pub use response::{parse_response, strip_fences};
