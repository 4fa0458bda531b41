//! Name mangling helpers shared by all generators. All functions are pure.

/// Prefixes of the bound API which are not repeated in wrapper names
const API_PREFIXES: &[&str] = &["Vk", "vk"];

/// Suffix of the placeholder structs behind handle typedefs (`VkDevice_T`)
pub const OPAQUE_SUFFIX: &str = "_T";

/// Convert a camel-case C name to snake case.
///
/// Underscores are inserted at lower-to-upper and letter-to-digit transitions; runs of
/// capitals stay together (`IDProperties` -> `id_properties`), and the `1D`..`4D`
/// dimension suffixes are kept as one word (`extent2D` -> `extent_2d`). Names without
/// capitals are returned unchanged, so the conversion is idempotent.
pub fn camel_to_snake(name: &str) -> String {
    if !name.chars().any(|c| c.is_ascii_uppercase()) {
        return name.to_string();
    }
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let boundary = if c.is_ascii_uppercase() {
                if prev.is_ascii_lowercase() {
                    true
                } else if prev.is_ascii_digit() {
                    !is_dimension_suffix(prev, c, next)
                } else if prev.is_ascii_uppercase() {
                    next.is_some_and(|n| n.is_ascii_lowercase())
                } else {
                    false
                }
            } else if c.is_ascii_digit() {
                prev.is_ascii_alphabetic()
            } else {
                false
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

fn is_dimension_suffix(digit: char, c: char, next: Option<char>) -> bool {
    ('1'..='4').contains(&digit) && c == 'D' && !next.is_some_and(|n| n.is_ascii_lowercase())
}

/// Strip the API prefix (`Vk`, `vk`) if it is followed by a capital letter
pub fn strip_api_prefix(name: &str) -> &str {
    for prefix in API_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
                return rest;
            }
        }
    }
    name
}

/// Strip the `p` / `pp` pointer marker of a C parameter name
pub fn strip_pointer_marker(name: &str) -> &str {
    for marker in ["pp", "p"] {
        if let Some(rest) = name.strip_prefix(marker) {
            if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
                return rest;
            }
        }
    }
    name
}

/// Wrapper-side variable / function name: `VkPhysicalDeviceFeatures2` ->
/// `physical_device_features_2`, `vkCreateDevice` -> `create_device`
pub fn wrapper_name(name: &str) -> String {
    camel_to_snake(strip_api_prefix(name))
}

/// Wrapper-side type name: `VkExtent2D` -> `Extent2D`
pub fn wrapper_type_name(name: &str) -> String {
    strip_api_prefix(name).to_string()
}

/// The `sType` value the native API expects for a struct:
/// `VkImageCreateInfo` -> `VK_STRUCTURE_TYPE_IMAGE_CREATE_INFO`
pub fn structure_type_value(struct_name: &str) -> String {
    format!(
        "VK_STRUCTURE_TYPE_{}",
        wrapper_name(struct_name).to_ascii_uppercase()
    )
}

/// Handle type name of an opaque placeholder: `VkDevice_T` -> `VkDevice`
pub fn handle_name(opaque_name: &str) -> &str {
    opaque_name.strip_suffix(OPAQUE_SUFFIX).unwrap_or(opaque_name)
}
