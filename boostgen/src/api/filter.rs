//! Whitelist / blacklist predicates deciding which header entities reach the generator.

use roxygen::roxygen;
use serde::{Deserialize, Serialize};

/// Builder for configuring Filter instances
///
/// # Example
///
/// ```
/// let filter = boostgen::Filter::builder()
///     .keep_function("vkCreateSwapchainKHR")
///     .ignore_function_suffix("KHR")
///     .ignore_type_substring("PFN_")
///     .ignore_field("VkDebugUtilsMessengerCreateInfoEXT", "pfnUserCallback")
///     .build();
///
/// assert!(filter.is_function_allowed("vkCreateSwapchainKHR", "VkResult ()"));
/// assert!(!filter.is_function_allowed("vkDestroySurfaceKHR", "void ()"));
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    filter: Filter,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always keep the named function, regardless of the ignore rules
    #[roxygen]
    pub fn keep_function<S: Into<String>>(
        mut self,
        /// Exact function name
        name: S,
    ) -> Self {
        self.filter.keep_functions.push(name.into());
        self
    }

    /// Drop the named function
    #[roxygen]
    pub fn ignore_function<S: Into<String>>(
        mut self,
        /// Exact function name
        name: S,
    ) -> Self {
        self.filter.ignore_functions.push(name.into());
        self
    }

    /// Drop functions whose name ends with `suffix` (vendor extensions like `NV`)
    #[roxygen]
    pub fn ignore_function_suffix<S: Into<String>>(
        mut self,
        /// Name suffix
        suffix: S,
    ) -> Self {
        self.filter.ignore_function_suffixes.push(suffix.into());
        self
    }

    /// Drop functions whose name contains `substring`
    #[roxygen]
    pub fn ignore_function_substring<S: Into<String>>(
        mut self,
        /// Name substring, e.g. `ProcAddress`
        substring: S,
    ) -> Self {
        self.filter.ignore_function_substrings.push(substring.into());
        self
    }

    /// Drop functions whose signature mentions `substring`
    #[roxygen]
    pub fn ignore_type_substring<S: Into<String>>(
        mut self,
        /// Signature substring, e.g. `PFN_`
        substring: S,
    ) -> Self {
        self.filter.ignore_type_substrings.push(substring.into());
        self
    }

    /// Drop a single struct field
    #[roxygen]
    pub fn ignore_field<S1: AsRef<str>, S2: AsRef<str>>(
        mut self,
        /// Struct name
        struct_name: S1,
        /// Field name
        field_name: S2,
    ) -> Self {
        self.filter.ignore_fields.push(format!(
            "{}.{}",
            struct_name.as_ref(),
            field_name.as_ref()
        ));
        self
    }

    /// Drop struct fields whose name starts with `prefix` (e.g. `pfn` callbacks)
    #[roxygen]
    pub fn ignore_field_prefix<S: Into<String>>(
        mut self,
        /// Field name prefix
        prefix: S,
    ) -> Self {
        self.filter.ignore_field_prefixes.push(prefix.into());
        self
    }

    pub fn build(self) -> Filter {
        self.filter
    }
}

/// Predicates applied to the header before generation.
///
/// An empty filter lets everything through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub keep_functions: Vec<String>,
    pub ignore_functions: Vec<String>,
    pub ignore_function_suffixes: Vec<String>,
    pub ignore_function_substrings: Vec<String>,
    pub ignore_type_substrings: Vec<String>,
    /// Entries of the form `Struct.field`
    pub ignore_fields: Vec<String>,
    pub ignore_field_prefixes: Vec<String>,
}

impl Filter {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn is_function_allowed(&self, name: &str, c_type: &str) -> bool {
        if self.keep_functions.iter().any(|k| k == name) {
            return true;
        }
        !(self.ignore_functions.iter().any(|i| i == name)
            || self
                .ignore_function_suffixes
                .iter()
                .any(|s| name.ends_with(s.as_str()))
            || self
                .ignore_function_substrings
                .iter()
                .any(|s| name.contains(s.as_str()))
            || self
                .ignore_type_substrings
                .iter()
                .any(|s| c_type.contains(s.as_str())))
    }

    pub fn is_field_allowed(&self, struct_name: &str, field_name: &str) -> bool {
        let ignored_exactly = self.ignore_fields.iter().any(|entry| {
            entry
                .split_once('.')
                .is_some_and(|(s, f)| s == struct_name && f == field_name)
        });
        !(ignored_exactly
            || self
                .ignore_field_prefixes
                .iter()
                .any(|p| field_name.starts_with(p.as_str())))
    }
}
