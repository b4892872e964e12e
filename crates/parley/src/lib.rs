pub mod agent;
pub mod builtin;
pub mod conversation;
pub mod errors;
pub mod inference;
pub mod interface;
pub mod models;
pub mod providers;
pub mod schema;
pub mod tools;
