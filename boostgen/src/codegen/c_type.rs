//! Parsing of raw C type signatures as they appear in the header AST.

use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;

use crate::api::header::Header;

/// Maximum number of typedef substitutions before giving up on a cyclic table
const MAX_TYPEDEF_DEPTH: usize = 16;

fn fixed_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)\s*\[\s*(\d+)\s*\]$").unwrap())
}

fn qualifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(const|volatile|struct|enum|restrict)\b|\*").unwrap())
}

/// A parsed C type, e.g. `const struct VkDevice_T *const *` or `char [256]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CType {
    raw: String,
    unqual_name: String,
    pointer_depth: usize,
    fixed_array_size: Option<usize>,
    is_const: bool,
}

impl CType {
    pub fn parse(raw: &str) -> Self {
        let text = raw.split_whitespace().join(" ");
        let (element, fixed_array_size) = match fixed_array_regex().captures(&text) {
            Some(caps) => (
                caps[1].to_string(),
                caps[2].parse::<usize>().ok(),
            ),
            None => (text.clone(), None),
        };
        let pointer_depth = element.matches('*').count();
        let is_const = element.starts_with("const ");
        let unqual_name = qualifier_regex()
            .replace_all(&element, " ")
            .split_whitespace()
            .join(" ");
        Self {
            raw: text,
            unqual_name,
            pointer_depth,
            fixed_array_size,
            is_const,
        }
    }

    /// Parse `raw`, substituting typedef names which are not directly known to the
    /// header until a known name (or a builtin) is reached.
    pub fn resolve(raw: &str, header: &Header) -> Self {
        let mut c_type = Self::parse(raw);
        for _ in 0..MAX_TYPEDEF_DEPTH {
            if header.is_known_type(&c_type.unqual_name) {
                break;
            }
            let Some(target) = header.typedef(&c_type.unqual_name) else {
                break;
            };
            if scalar_typedef_is_final(&c_type.unqual_name) {
                break;
            }
            c_type = c_type.substitute(target);
        }
        c_type
    }

    /// Replace the unqualified name by `target`, keeping qualifiers, pointers and array
    /// suffix of this type
    fn substitute(&self, target: &str) -> Self {
        let pattern = format!(r"\b{}\b", regex::escape(&self.unqual_name));
        let substituted = match Regex::new(&pattern) {
            Ok(re) => re.replacen(&self.raw, 1, target.replace('$', "$$")).into_owned(),
            Err(_) => return self.clone(),
        };
        let mut resolved = Self::parse(&substituted);
        // `const VkDevice` with `VkDevice = struct VkDevice_T *` is a const pointer,
        // the pointee is not const
        resolved.is_const = self.is_const && self.pointer_depth > 0;
        resolved
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn unqual_name(&self) -> &str {
        &self.unqual_name
    }

    pub fn pointer_depth(&self) -> usize {
        self.pointer_depth
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    pub fn is_fixed_array(&self) -> bool {
        self.fixed_array_size.is_some()
    }

    pub fn fixed_array_size(&self) -> Option<usize> {
        self.fixed_array_size
    }

    /// The pointee (or the value itself for non-pointers) is `const`
    pub fn is_const(&self) -> bool {
        self.is_const
    }

    pub fn is_enum(&self, header: &Header) -> bool {
        header.is_enum(&self.unqual_name)
    }

    pub fn is_struct(&self, header: &Header) -> bool {
        header.is_struct(&self.unqual_name)
    }

    pub fn is_opaque_struct(&self, header: &Header) -> bool {
        header.is_opaque_struct(&self.unqual_name)
    }
}

impl std::fmt::Display for CType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Typedefs with a meaning of their own which must not be resolved to the underlying
/// integer (`VkBool32` is a `uint32_t` but is bound as `bool`)
fn scalar_typedef_is_final(name: &str) -> bool {
    name == "VkBool32"
}
