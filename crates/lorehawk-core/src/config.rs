use std::{fs, path::Path, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use lorehawk_provider::{ProviderConfig, ProviderType, SpeechConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(flatten)]
    pub provider: ProviderConfig,
    pub model: String,
}

fn default_bind() -> String {
    "127.0.0.1:8610".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/lorehawk.db")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LorehawkConfig {
    pub app: AppConfig,
    pub completion: CompletionConfig,
    #[serde(default)]
    pub transcription: SpeechConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Expand `${VAR}` placeholders; missing variables become empty strings.
pub fn resolve_env_var(raw: &str) -> String {
    let mut output = String::new();
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);

        let candidate = &rest[start + 2..];
        let Some(end) = candidate.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };

        let key = &candidate[..end];
        output.push_str(&std::env::var(key).unwrap_or_default());
        rest = &candidate[end + 1..];
    }

    output.push_str(rest);
    output
}

pub fn load_config(path: &Path) -> Result<LorehawkConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let mut config: LorehawkConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))?;

    resolve_config_env(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn resolve_config_env(config: &mut LorehawkConfig) {
    config.app.name = resolve_env_var(&config.app.name);
    config.app.env = resolve_env_var(&config.app.env);
    config.completion.model = resolve_env_var(&config.completion.model);
    if let Some(key) = &mut config.completion.provider.api_key {
        *key = resolve_env_var(key);
    }
    if let Some(base) = &mut config.completion.provider.api_base {
        *base = resolve_env_var(base);
    }
    if let Some(key) = &mut config.transcription.api_key {
        *key = resolve_env_var(key);
    }
    if let Some(base) = &mut config.transcription.api_base {
        *base = resolve_env_var(base);
    }
    config.transcription.model = resolve_env_var(&config.transcription.model);
    config.server.bind = resolve_env_var(&config.server.bind);
}

pub fn validate_config(config: &LorehawkConfig) -> Result<()> {
    if config.completion.model.trim().is_empty() {
        return Err(anyhow!("completion.model must not be empty"));
    }
    if config.completion.provider.provider_type == ProviderType::Custom
        && config
            .completion
            .provider
            .api_base
            .as_deref()
            .unwrap_or("")
            .trim()
            .is_empty()
    {
        return Err(anyhow!("custom completion provider requires api_base"));
    }
    if config.server.bind.trim().is_empty() {
        return Err(anyhow!("server.bind must not be empty"));
    }

    // Missing credentials are not fatal: the pipeline degrades to fallback
    // content or labeled errors, never an opaque crash.
    if config.completion.provider.provider_type != ProviderType::Stub
        && config
            .completion
            .provider
            .api_key
            .as_deref()
            .unwrap_or("")
            .trim()
            .is_empty()
        && config.completion.provider.provider_type != ProviderType::Custom
    {
        tracing::warn!("completion provider has no api key; hard stages will be unavailable");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_config_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/lorehawk.yaml")
    }

    #[test]
    fn load_config_from_workspace_fixture() {
        let config = load_config(&fixture_config_path()).unwrap();
        assert_eq!(config.app.name, "lorehawk");
        assert_eq!(config.completion.provider.provider_type, ProviderType::OpenAi);
        assert!(!config.completion.model.is_empty());
        assert_eq!(config.server.bind, "127.0.0.1:8610");
    }

    #[test]
    fn resolve_env_var_replaces_placeholder() {
        let expected = std::env::var("PATH").unwrap();
        assert_eq!(resolve_env_var("${PATH}"), expected);
    }

    #[test]
    fn resolve_env_var_passes_through_plain_values() {
        assert_eq!(resolve_env_var("plain-value"), "plain-value");
        assert_eq!(resolve_env_var(""), "");
    }

    #[test]
    fn resolve_env_var_unclosed_bracket_kept_verbatim() {
        assert_eq!(resolve_env_var("prefix_${UNCLOSED"), "prefix_${UNCLOSED");
    }

    #[test]
    fn resolve_env_var_missing_variable_becomes_empty() {
        assert_eq!(
            resolve_env_var("key=${LOREHAWK_NONEXISTENT_VAR_XYZ}"),
            "key="
        );
    }

    #[test]
    fn validate_rejects_empty_model() {
        let mut config = load_config(&fixture_config_path()).unwrap();
        config.completion.model = " ".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("completion.model"));
    }

    #[test]
    fn validate_rejects_custom_without_base() {
        let mut config = load_config(&fixture_config_path()).unwrap();
        config.completion.provider.provider_type = ProviderType::Custom;
        config.completion.provider.api_base = None;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("api_base"));
    }

    #[test]
    fn missing_api_key_is_not_fatal() {
        let mut config = load_config(&fixture_config_path()).unwrap();
        config.completion.provider.api_key = None;
        assert!(validate_config(&config).is_ok());
    }
}
