use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use vkbind_desc::ValidationRules;

/// Generator settings, read from an optional `bindings.toml`.
///
/// Every field has a default matching the Vulkan naming scheme, so an empty
/// file (or no file) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenConfig {
    /// Prefix of exported symbols: `vk` + `CreateInstance`.
    pub symbol_prefix: String,
    /// Prefix of native type names: `Vk` + `Instance`.
    pub native_type_prefix: String,
    /// Prefix stripped from extension names to form module names.
    pub extension_prefix: String,
    /// Path of the crate holding native declarations.
    pub native_crate: String,
    /// Path of the runtime support crate.
    pub runtime_crate: String,
    /// The only functions allowed (and required) to be `scope = "global"`.
    pub global_functions: Vec<String>,
    /// Emit compile-time layout assertions against `native_crate`.
    pub abi_checks: bool,
    pub structure_type_member: String,
    pub structure_type_enum: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            symbol_prefix: "vk".to_string(),
            native_type_prefix: "Vk".to_string(),
            extension_prefix: "VK_".to_string(),
            native_crate: "::vkbind_sys".to_string(),
            runtime_crate: "::vkbind_core".to_string(),
            global_functions: vec![
                "CreateInstance".to_string(),
                "EnumerateInstanceExtensionProperties".to_string(),
                "EnumerateInstanceLayerProperties".to_string(),
            ],
            abi_checks: true,
            structure_type_member: "sType".to_string(),
            structure_type_enum: "StructureType".to_string(),
        }
    }
}

impl GenConfig {
    pub fn from_toml_str(src: &str) -> anyhow::Result<Self> {
        toml::from_str(src).context("invalid generator configuration")
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&src).with_context(|| format!("in {}", path.display()))
    }

    /// Reads `path` if it exists, otherwise returns the defaults.
    pub fn from_optional_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_path(path)
        } else {
            log::debug!("no generator config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            global_functions: Some(self.global_functions.iter().cloned().collect::<BTreeSet<_>>()),
            structure_type_member: self.structure_type_member.clone(),
            structure_type_enum: self.structure_type_enum.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(GenConfig::from_toml_str("").unwrap(), GenConfig::default());
    }

    #[test]
    fn fields_override_individually() {
        let config = GenConfig::from_toml_str("abi_checks = false\nnative_crate = \"crate::sys\"\n").unwrap();
        assert!(!config.abi_checks);
        assert_eq!(config.native_crate, "crate::sys");
        assert_eq!(config.symbol_prefix, "vk");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(GenConfig::from_toml_str("symbol_prefx = \"vk\"").is_err());
    }

    #[test]
    fn missing_optional_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = GenConfig::from_optional_path(dir.path().join("bindings.toml")).unwrap();
        assert_eq!(config, GenConfig::default());
    }

    #[test]
    fn allow_list_feeds_validation() {
        let rules = GenConfig::default().validation_rules();
        let globals = rules.global_functions.unwrap();
        assert_eq!(globals.len(), 3);
        assert!(globals.contains("CreateInstance"));
    }
}
