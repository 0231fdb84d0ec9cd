use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, warn};
use once_cell::sync::Lazy;
use serde_yaml::Value;

const ENV_PREFIX: &str = "TERRAFORM_INFRA_";

pub struct ConfigManager {
    base_defs: IndexMap<String, Value>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        ConfigManager {
            base_defs: IndexMap::new(),
        }
    }

    /// Process-wide configuration: built-in defaults plus environment overrides.
    pub fn instance() -> &'static ConfigManager {
        &CONFIG
    }

    pub fn init(&mut self) -> Result<()> {
        let config_map = self.read_config_yaml_file()?;
        self.base_defs.extend(config_map);
        Ok(())
    }

    /// Applies `TERRAFORM_INFRA_<KEY>` overrides for keys known from the defaults.
    pub fn apply_env_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if self.base_defs.contains_key(key) {
                debug!("Config {key} overridden from environment");
                self.base_defs.insert(key.to_string(), Value::String(value));
            } else {
                warn!("Ignoring unknown configuration variable {name}");
            }
        }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.base_defs.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn terraform_binary(&self) -> String {
        self.get_string("TERRAFORM_BINARY")
            .unwrap_or_else(|| "terraform".to_string())
    }

    pub fn openstack_binary(&self) -> String {
        self.get_string("OPENSTACK_BINARY")
            .unwrap_or_else(|| "openstack".to_string())
    }

    pub fn default_workspace(&self) -> String {
        self.get_string("DEFAULT_WORKSPACE")
            .unwrap_or_else(|| crate::terraform::DEFAULT_WORKSPACE.to_string())
    }

    pub fn inventory_output_key(&self) -> String {
        self.get_string("INVENTORY_OUTPUT_KEY")
            .unwrap_or_else(|| "cluster_hosts".to_string())
    }

    fn read_config_yaml_file(&self) -> Result<IndexMap<String, Value>> {
        let yaml_content = include_str!("base.yaml");
        let value: Value = serde_yaml::from_str(yaml_content)?;

        let config_map = value
            .as_mapping()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("YAML root is not a mapping"))?
            .into_iter()
            .map(|(key, value)| {
                let key_str = key
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("YAML key is not a string"))?
                    .to_string();
                Ok((key_str, value))
            })
            .collect::<Result<IndexMap<String, Value>>>()?;

        Ok(config_map)
    }
}

static CONFIG: Lazy<ConfigManager> = Lazy::new(|| {
    let mut config = ConfigManager::new();
    if let Err(e) = config.init() {
        warn!("Failed to load built-in configuration: {e}");
    }
    config.apply_env_overrides(std::env::vars());
    config
});

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> ConfigManager {
        let mut config = ConfigManager::new();
        config.init().unwrap();
        config
    }

    #[test]
    fn test_defaults() {
        let config = loaded();
        assert_eq!(config.terraform_binary(), "terraform");
        assert_eq!(config.openstack_binary(), "openstack");
        assert_eq!(config.default_workspace(), "default");
        assert_eq!(config.inventory_output_key(), "cluster_hosts");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = loaded();
        config.apply_env_overrides([
            (
                "TERRAFORM_INFRA_TERRAFORM_BINARY".to_string(),
                "/opt/tofu".to_string(),
            ),
            ("TERRAFORM_INFRA_UNKNOWN".to_string(), "x".to_string()),
            ("PATH".to_string(), "/bin".to_string()),
        ]);

        assert_eq!(config.terraform_binary(), "/opt/tofu");
        assert_eq!(config.get_string("UNKNOWN"), None);
        assert_eq!(config.get_string("PATH"), None);
    }

    #[test]
    fn test_fallbacks_without_init() {
        let config = ConfigManager::new();
        assert_eq!(config.terraform_binary(), "terraform");
        assert_eq!(config.default_workspace(), "default");
    }
}
