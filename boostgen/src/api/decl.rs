//! Declarations of what to generate: the configuration half of the two-phase
//! declare / generate lifecycle.
//!
//! Declarations only name things. They are checked against the header when the
//! [`crate::GeneratorBuilder`] is built.

use roxygen::roxygen;
use serde::{Deserialize, Serialize};

use crate::codegen::classify::ScalarType;

/// A dynamic array: an items pointer and the field or parameter holding its length.
///
/// # Example
///
/// ```
/// use boostgen::{ArrayDecl, ScalarType};
///
/// let indices = ArrayDecl::new("queueFamilyIndexCount", "pQueueFamilyIndices");
/// let code = ArrayDecl::new("codeSize", "pCode").force_item_type(ScalarType::Uint8);
/// let resolve = ArrayDecl::new("colorAttachmentCount", "pResolveAttachments").optional();
///
/// assert_eq!(indices.count.as_deref(), Some("queueFamilyIndexCount"));
/// assert_eq!(code.force_item_type, Some(ScalarType::Uint8));
/// assert!(resolve.optional);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayDecl {
    #[serde(default)]
    pub count: Option<String>,
    pub items: String,
    /// The array may be empty while its count is taken from a mandatory sibling
    #[serde(default)]
    pub optional: bool,
    /// Element type replacing the classified one (`uint8` byte buffers)
    #[serde(default)]
    pub force_item_type: Option<ScalarType>,
}

impl ArrayDecl {
    pub fn new<S1: Into<String>, S2: Into<String>>(count: S1, items: S2) -> Self {
        Self {
            count: Some(count.into()),
            items: items.into(),
            optional: false,
            force_item_type: None,
        }
    }

    /// An items pointer without a count field
    pub fn items<S: Into<String>>(items: S) -> Self {
        Self {
            count: None,
            items: items.into(),
            optional: false,
            force_item_type: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn force_item_type(mut self, scalar: ScalarType) -> Self {
        self.force_item_type = Some(scalar);
        self
    }
}

/// A native function to wrap, either standalone or as a handle lifecycle function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub arrays: Vec<ArrayDecl>,
    /// Parameters written by the native call and returned by the wrapper
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl FunctionDecl {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            arrays: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Associate a count parameter with an items parameter
    #[roxygen]
    pub fn declare_array<S1: Into<String>, S2: Into<String>>(
        mut self,
        /// Count parameter name
        count: S1,
        /// Items parameter name
        items: S2,
    ) -> Self {
        self.arrays.push(ArrayDecl::new(count, items));
        self
    }

    pub fn array(mut self, array: ArrayDecl) -> Self {
        self.arrays.push(array);
        self
    }

    /// Mark a pointer parameter as the value the wrapper returns
    #[roxygen]
    pub fn declare_output<S: Into<String>>(
        mut self,
        /// Parameter name, e.g. `pProperties`
        name: S,
    ) -> Self {
        self.outputs.push(name.into());
        self
    }
}

impl From<&str> for FunctionDecl {
    fn from(name: &str) -> Self {
        FunctionDecl::new(name)
    }
}

fn yes() -> bool {
    true
}

/// A native struct to mirror on the wrapper side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    /// Generate `vk_value_to_boost`
    #[serde(default = "yes")]
    pub vk_to_boost: bool,
    /// Generate `vk_view_create_unsafe` / `vk_view_destroy`
    #[serde(default = "yes")]
    pub boost_to_vk: bool,
    #[serde(default)]
    pub ignore_fields: Vec<String>,
    #[serde(default)]
    pub arrays: Vec<ArrayDecl>,
}

impl StructDecl {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            vk_to_boost: true,
            boost_to_vk: true,
            ignore_fields: Vec::new(),
            arrays: Vec::new(),
        }
    }

    pub fn vk_to_boost(mut self, enabled: bool) -> Self {
        self.vk_to_boost = enabled;
        self
    }

    pub fn boost_to_vk(mut self, enabled: bool) -> Self {
        self.boost_to_vk = enabled;
        self
    }

    /// Leave a field out of the wrapper struct. Ignored fields are zero in views.
    #[roxygen]
    pub fn ignore_field<S: Into<String>>(
        mut self,
        /// Field name
        name: S,
    ) -> Self {
        self.ignore_fields.push(name.into());
        self
    }

    /// Associate a count field with an items field
    #[roxygen]
    pub fn declare_array<S1: Into<String>, S2: Into<String>>(
        mut self,
        /// Count field name
        count: S1,
        /// Items field name
        items: S2,
    ) -> Self {
        self.arrays.push(ArrayDecl::new(count, items));
        self
    }

    pub fn array(mut self, array: ArrayDecl) -> Self {
        self.arrays.push(array);
        self
    }
}

/// A native handle type and its lifecycle functions.
///
/// Lifecycle functions which are not declared are looked up in the header by name, see
/// [`crate::GeneratorBuilder::function_prefix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleDecl {
    pub name: String,
    #[serde(default, rename = "ctor")]
    pub ctors: Vec<FunctionDecl>,
    #[serde(default)]
    pub dtor: Option<FunctionDecl>,
    #[serde(default)]
    pub enumerator: Option<FunctionDecl>,
}

impl HandleDecl {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ctors: Vec::new(),
            dtor: None,
            enumerator: None,
        }
    }

    /// Add a constructor. A handle may have several (`vkCreateGraphicsPipelines`,
    /// `vkCreateComputePipelines`).
    pub fn ctor<F: Into<FunctionDecl>>(mut self, ctor: F) -> Self {
        self.ctors.push(ctor.into());
        self
    }

    pub fn dtor<F: Into<FunctionDecl>>(mut self, dtor: F) -> Self {
        self.dtor = Some(dtor.into());
        self
    }

    pub fn enumerator<F: Into<FunctionDecl>>(mut self, enumerator: F) -> Self {
        self.enumerator = Some(enumerator.into());
        self
    }
}
