use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a dotted configuration path,
/// e.g. `provider.api_key` -> `PARLEY_PROVIDER__API_KEY`.
pub fn to_env_var(field_path: &str) -> String {
    let path = field_path
        .split('.')
        .map(|part| part.to_uppercase())
        .collect::<Vec<_>>()
        .join("__");
    format!("PARLEY_{}", path)
}
