//! Tools shipped with the agent.

use std::path::Path;

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::errors::StartupError;
use crate::tools::ToolRegistry;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileInput {
    /// The relative path of a file in the working directory.
    pub path: String,
}

/// Read the contents of a file as text
pub async fn read_file(input: ReadFileInput) -> Result<String> {
    let path = Path::new(&input.path);
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Register every builtin tool
pub fn register_builtins(registry: &mut ToolRegistry) -> Result<(), StartupError> {
    registry.register_typed(
        "read_file",
        "Read the contents of a given relative file path. Use this when you want to see what's inside a file. Do not use this with directory names.",
        read_file,
    )
}
