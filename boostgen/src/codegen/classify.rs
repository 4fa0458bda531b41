//! Classification of C parameters and struct fields into semantic kinds.
//!
//! Rules are tried in a fixed order and the first match wins. The order matters for
//! ambiguous inputs: `struct VkFoo_T *` is a handle even if `VkFoo_T` also appears in
//! the struct table, so the handle rules come before the struct rules.

use serde::{Deserialize, Serialize};

use crate::api::header::Header;
use crate::codegen::c_type::CType;
use crate::codegen::names::{handle_name, OPAQUE_SUFFIX};
use crate::error::{Error, Result};

/// Numeric types the generator knows how to marshal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Float,
    Int32,
    Uint8,
    Uint32,
    Uint64,
    /// `VkBool32`: a `uint32_t` on the native side, `bool` on the wrapper side
    Bool32,
}

impl ScalarType {
    pub fn from_c_name(name: &str) -> Option<Self> {
        Some(match name {
            "float" => ScalarType::Float,
            "int" | "int32_t" => ScalarType::Int32,
            "uint8_t" | "unsigned char" => ScalarType::Uint8,
            "unsigned int" | "uint32_t" => ScalarType::Uint32,
            "unsigned long" | "unsigned long long" | "uint64_t" | "size_t" => ScalarType::Uint64,
            "VkBool32" => ScalarType::Bool32,
            _ => return None,
        })
    }

    /// Type name on the wrapper side
    pub fn boost_type(self) -> &'static str {
        match self {
            ScalarType::Float => "float",
            ScalarType::Int32 => "int",
            ScalarType::Uint8 => "uint8",
            ScalarType::Uint32 => "uint",
            ScalarType::Uint64 => "uint64",
            ScalarType::Bool32 => "bool",
        }
    }

    /// Type name of the native value as seen from the wrapper language
    pub fn vk_type(self) -> &'static str {
        match self {
            ScalarType::Bool32 => "uint",
            other => other.boost_type(),
        }
    }
}

impl std::str::FromStr for ScalarType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "float" => Ok(ScalarType::Float),
            "int32" | "int" => Ok(ScalarType::Int32),
            "uint8" => Ok(ScalarType::Uint8),
            "uint32" | "uint" => Ok(ScalarType::Uint32),
            "uint64" => Ok(ScalarType::Uint64),
            "bool32" | "bool" => Ok(ScalarType::Bool32),
            other => Err(format!("unknown scalar type `{other}`")),
        }
    }
}

/// Semantic kind of a classified parameter or field.
///
/// `vk` members hold the native type name (`VkDevice`, `VkExtent2D`, `VkFormat`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// `const VkAllocationCallbacks *`, always passed as `null`
    Allocator,
    /// `sType` discriminator of an extensible struct
    ChainType,
    /// `pNext` extension chain pointer
    ChainNext,
    /// `struct VkDevice_T *`
    Handle { vk: String },
    /// `struct VkDevice_T **`
    HandlePtr { vk: String },
    Struct { vk: String },
    StructPtr { vk: String },
    Enum { vk: String },
    EnumPtr { vk: String },
    /// `const char *`
    String,
    /// `char [N]`
    FixedString { size: usize },
    /// `const char *const *`
    StringPtrArray,
    Scalar(ScalarType),
    ScalarPtr(ScalarType),
    /// `uint32_t [3]`
    FixedArray { scalar: ScalarType, size: usize },
}

/// Input of a classification rule
pub struct Candidate<'a> {
    pub name: &'a str,
    pub c_type: &'a CType,
    pub header: &'a Header,
}

type Rule = fn(&Candidate) -> Option<ParamKind>;

/// Classification rules in priority order
pub const RULES: &[(&str, Rule)] = &[
    ("allocator", allocator_rule),
    ("chain link", chain_link_rule),
    ("handle", handle_rule),
    ("handle pointer", handle_ptr_rule),
    ("struct", struct_rule),
    ("struct pointer", struct_ptr_rule),
    ("enum", enum_rule),
    ("enum pointer", enum_ptr_rule),
    ("string", string_rule),
    ("scalar", scalar_rule),
];

/// Classify a parameter or field. Pure function of its inputs.
///
/// Fails with [`Error::UnknownType`] if no rule matches.
pub fn classify(name: &str, c_type: &str, header: &Header) -> Result<ParamKind> {
    let resolved = CType::resolve(c_type, header);
    let candidate = Candidate {
        name,
        c_type: &resolved,
        header,
    };
    for (rule_name, rule) in RULES {
        if let Some(kind) = rule(&candidate) {
            log::trace!("`{name}: {c_type}` classified by {rule_name} rule as {kind:?}");
            return Ok(kind);
        }
    }
    Err(Error::UnknownType {
        name: name.to_string(),
        c_type: c_type.to_string(),
    })
}

fn is_plain(c_type: &CType, depth: usize) -> bool {
    c_type.pointer_depth() == depth && !c_type.is_fixed_array()
}

fn allocator_rule(c: &Candidate) -> Option<ParamKind> {
    (is_plain(c.c_type, 1) && c.c_type.unqual_name() == "VkAllocationCallbacks")
        .then_some(ParamKind::Allocator)
}

fn chain_link_rule(c: &Candidate) -> Option<ParamKind> {
    match c.name {
        "sType" if is_plain(c.c_type, 0) && c.c_type.unqual_name() == "VkStructureType" => {
            Some(ParamKind::ChainType)
        }
        "pNext" if is_plain(c.c_type, 1) && c.c_type.unqual_name() == "void" => {
            Some(ParamKind::ChainNext)
        }
        _ => None,
    }
}

/// Handle type name if `name` is (or is the typedef of) an opaque `_T` placeholder
fn opaque_handle(name: &str, header: &Header) -> Option<(String, bool)> {
    if name.ends_with(OPAQUE_SUFFIX) && header.is_opaque_struct(name) {
        return Some((handle_name(name).to_string(), true));
    }
    let placeholder = format!("{name}{OPAQUE_SUFFIX}");
    header
        .is_opaque_struct(&placeholder)
        .then(|| (name.to_string(), false))
}

fn handle_rule(c: &Candidate) -> Option<ParamKind> {
    let (vk, is_placeholder) = opaque_handle(c.c_type.unqual_name(), c.header)?;
    // `struct VkDevice_T *` or a bare, unresolved `VkDevice`
    let depth = if is_placeholder { 1 } else { 0 };
    is_plain(c.c_type, depth).then_some(ParamKind::Handle { vk })
}

fn handle_ptr_rule(c: &Candidate) -> Option<ParamKind> {
    let (vk, is_placeholder) = opaque_handle(c.c_type.unqual_name(), c.header)?;
    let depth = if is_placeholder { 2 } else { 1 };
    is_plain(c.c_type, depth).then_some(ParamKind::HandlePtr { vk })
}

fn struct_rule(c: &Candidate) -> Option<ParamKind> {
    (is_plain(c.c_type, 0) && c.c_type.is_struct(c.header)).then(|| ParamKind::Struct {
        vk: c.c_type.unqual_name().to_string(),
    })
}

fn struct_ptr_rule(c: &Candidate) -> Option<ParamKind> {
    (is_plain(c.c_type, 1) && c.c_type.is_struct(c.header)).then(|| ParamKind::StructPtr {
        vk: c.c_type.unqual_name().to_string(),
    })
}

fn enum_rule(c: &Candidate) -> Option<ParamKind> {
    (is_plain(c.c_type, 0) && c.c_type.is_enum(c.header)).then(|| ParamKind::Enum {
        vk: c.c_type.unqual_name().to_string(),
    })
}

fn enum_ptr_rule(c: &Candidate) -> Option<ParamKind> {
    (is_plain(c.c_type, 1) && c.c_type.is_enum(c.header)).then(|| ParamKind::EnumPtr {
        vk: c.c_type.unqual_name().to_string(),
    })
}

fn string_rule(c: &Candidate) -> Option<ParamKind> {
    if c.c_type.unqual_name() != "char" {
        return None;
    }
    match (c.c_type.pointer_depth(), c.c_type.fixed_array_size()) {
        (1, None) if c.c_type.is_const() => Some(ParamKind::String),
        (0, Some(size)) => Some(ParamKind::FixedString { size }),
        (2, None) if c.c_type.is_const() => Some(ParamKind::StringPtrArray),
        _ => None,
    }
}

fn scalar_rule(c: &Candidate) -> Option<ParamKind> {
    let scalar = ScalarType::from_c_name(c.c_type.unqual_name())?;
    match (c.c_type.pointer_depth(), c.c_type.fixed_array_size()) {
        (0, None) => Some(ParamKind::Scalar(scalar)),
        (1, None) => Some(ParamKind::ScalarPtr(scalar)),
        (0, Some(size)) => Some(ParamKind::FixedArray { scalar, size }),
        _ => None,
    }
}
