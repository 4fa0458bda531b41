//! TOML binding configuration, the file form of the [`GeneratorBuilder`] API.
//!
//! ```toml
//! module = "vulkan_boost"
//!
//! [filter]
//! ignore_function_suffixes = ["KHR", "EXT"]
//!
//! [[handle]]
//! name = "VkPhysicalDevice"
//!
//! [[struct]]
//! name = "VkDeviceQueueCreateInfo"
//! vk_to_boost = false
//! arrays = [{ count = "queueCount", items = "pQueuePriorities" }]
//!
//! [[function]]
//! name = "vkGetPhysicalDeviceProperties"
//! outputs = ["pProperties"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::decl::{FunctionDecl, HandleDecl, StructDecl};
use crate::api::filter::Filter;
use crate::api::generator::GeneratorBuilder;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    #[serde(default)]
    pub module: Option<String>,
    /// Replaces the default `require` list when present
    #[serde(default)]
    pub requires: Option<Vec<String>>,
    #[serde(default)]
    pub function_prefix: Option<String>,
    #[serde(default)]
    pub filter: Filter,
    #[serde(default, rename = "handle")]
    pub handles: Vec<HandleDecl>,
    #[serde(default, rename = "struct")]
    pub structs: Vec<StructDecl>,
    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionDecl>,
}

impl BindingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_toml_str(&content)?;
        log::debug!(
            "{}: {} handles, {} structs, {} functions",
            path.display(),
            config.handles.len(),
            config.structs.len(),
            config.functions.len()
        );
        Ok(config)
    }

    pub fn into_generator_builder(self) -> GeneratorBuilder {
        let mut builder = GeneratorBuilder::new().filter(self.filter);
        if let Some(module) = self.module {
            builder = builder.module(module);
        }
        if let Some(requires) = self.requires {
            builder = builder.requires(requires);
        }
        if let Some(prefix) = self.function_prefix {
            builder = builder.function_prefix(prefix);
        }
        for handle in self.handles {
            builder = builder.handle(handle);
        }
        for structure in self.structs {
            builder = builder.structure(structure);
        }
        for function in self.functions {
            builder = builder.function(function);
        }
        builder
    }
}
