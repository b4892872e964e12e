//! These models represent the objects passed around by the agent
//!
//! There are two formats we need to interact with:
//! - anthropic messages/tools, sent from the agent to the LLM
//! - tool calls and results, exchanged between the agent and the local tools
//!
//! Wire formats are converted into these internal structs at the provider boundary,
//! so nothing past a provider ever sees raw API json except tool inputs.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
