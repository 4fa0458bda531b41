//! Classified parameters and fields, and their conversions between the native and the
//! wrapper representation.

use crate::api::decl::ArrayDecl;
use crate::api::header::Header;
use crate::api::record::CField;
use crate::codegen::c_type::CType;
use crate::codegen::classify::{classify, ParamKind, ScalarType};
use crate::codegen::names::{camel_to_snake, strip_pointer_marker, wrapper_name, wrapper_type_name};
use crate::error::{Error, Result};

/// Conversions of a single value between the native and the wrapper representation.
///
/// Pointer kinds convert their pointee. Methods return `None` where a kind has no
/// representation (hidden kinds) or cannot be converted in that direction.
pub trait Convert {
    /// Wrapper-side type name
    fn boost_type(&self) -> Option<String>;
    /// Native type name as spelled in the wrapper language
    fn vk_type(&self) -> Option<String>;
    /// Expression converting native `expr` to the wrapper representation
    fn vk_to_boost(&self, expr: &str) -> Option<String>;
    /// Expression converting wrapper `expr` to the native representation. For kinds
    /// which need a view this creates the view and must be paired with
    /// [`Convert::view_destroy`].
    fn boost_to_vk(&self, expr: &str) -> Option<String>;
    /// Native conversion requires a scoped intermediate representation
    fn needs_view(&self) -> bool;
    /// Statement releasing the view created by [`Convert::boost_to_vk`]
    fn view_destroy(&self, expr: &str) -> Option<String>;
    /// Wrapper and native values share the memory layout, so arrays can be passed
    /// by address without an element-wise copy
    fn same_layout(&self) -> bool;
}

/// Attribute holding the native value inside a handle wrapper: `VkImageView` -> `image_view`
pub fn handle_attr(vk: &str) -> String {
    wrapper_name(vk)
}

impl Convert for ParamKind {
    fn boost_type(&self) -> Option<String> {
        match self {
            ParamKind::Allocator | ParamKind::ChainType | ParamKind::ChainNext => None,
            ParamKind::Handle { vk }
            | ParamKind::HandlePtr { vk }
            | ParamKind::Struct { vk }
            | ParamKind::StructPtr { vk } => Some(wrapper_type_name(vk)),
            ParamKind::Enum { vk } | ParamKind::EnumPtr { vk } => Some(vk.clone()),
            ParamKind::String | ParamKind::FixedString { .. } | ParamKind::StringPtrArray => {
                Some("string".to_string())
            }
            ParamKind::Scalar(s) | ParamKind::ScalarPtr(s) => Some(s.boost_type().to_string()),
            ParamKind::FixedArray { scalar, size } => {
                Some(format!("{}[{size}]", scalar.boost_type()))
            }
        }
    }

    fn vk_type(&self) -> Option<String> {
        match self {
            ParamKind::Allocator | ParamKind::ChainType | ParamKind::ChainNext => None,
            ParamKind::Handle { vk }
            | ParamKind::HandlePtr { vk }
            | ParamKind::Struct { vk }
            | ParamKind::StructPtr { vk }
            | ParamKind::Enum { vk }
            | ParamKind::EnumPtr { vk } => Some(vk.clone()),
            ParamKind::String | ParamKind::StringPtrArray => Some("string".to_string()),
            ParamKind::FixedString { size } => Some(format!("int8[{size}]")),
            ParamKind::Scalar(s) | ParamKind::ScalarPtr(s) => Some(s.vk_type().to_string()),
            ParamKind::FixedArray { scalar, size } => {
                Some(format!("{}[{size}]", scalar.vk_type()))
            }
        }
    }

    fn vk_to_boost(&self, expr: &str) -> Option<String> {
        match self {
            ParamKind::Allocator | ParamKind::ChainType | ParamKind::ChainNext => None,
            // `uint[N]` and `bool[N]` have no element-wise conversion expression
            ParamKind::FixedArray {
                scalar: ScalarType::Bool32,
                ..
            } => None,
            ParamKind::Handle { vk } | ParamKind::HandlePtr { vk } => Some(format!(
                "[[{} {}={expr}]]",
                wrapper_type_name(vk),
                handle_attr(vk)
            )),
            ParamKind::Struct { .. } | ParamKind::StructPtr { .. } => {
                Some(format!("{expr} |> vk_value_to_boost()"))
            }
            ParamKind::String | ParamKind::StringPtrArray => Some(format!("string({expr})")),
            ParamKind::FixedString { .. } => Some(format!("string(unsafe(addr({expr}[0])))")),
            ParamKind::Scalar(ScalarType::Bool32) | ParamKind::ScalarPtr(ScalarType::Bool32) => {
                Some(format!("{expr} != 0u"))
            }
            ParamKind::Enum { .. }
            | ParamKind::EnumPtr { .. }
            | ParamKind::Scalar(_)
            | ParamKind::ScalarPtr(_)
            | ParamKind::FixedArray { .. } => Some(expr.to_string()),
        }
    }

    fn boost_to_vk(&self, expr: &str) -> Option<String> {
        match self {
            ParamKind::Allocator | ParamKind::ChainType | ParamKind::ChainNext => None,
            ParamKind::FixedString { .. }
            | ParamKind::FixedArray {
                scalar: ScalarType::Bool32,
                ..
            } => None,
            ParamKind::Handle { vk } | ParamKind::HandlePtr { vk } => {
                Some(format!("{expr}.{}", handle_attr(vk)))
            }
            ParamKind::Struct { .. } | ParamKind::StructPtr { .. } => {
                Some(format!("{expr} |> vk_view_create_unsafe()"))
            }
            ParamKind::Scalar(ScalarType::Bool32) | ParamKind::ScalarPtr(ScalarType::Bool32) => {
                Some(format!("{expr} ? 1u : 0u"))
            }
            ParamKind::Enum { .. }
            | ParamKind::EnumPtr { .. }
            | ParamKind::String
            | ParamKind::StringPtrArray
            | ParamKind::Scalar(_)
            | ParamKind::ScalarPtr(_)
            | ParamKind::FixedArray { .. } => Some(expr.to_string()),
        }
    }

    fn needs_view(&self) -> bool {
        matches!(self, ParamKind::Struct { .. } | ParamKind::StructPtr { .. })
    }

    fn view_destroy(&self, expr: &str) -> Option<String> {
        self.needs_view()
            .then(|| format!("{expr} |> vk_view_destroy()"))
    }

    fn same_layout(&self) -> bool {
        !matches!(
            self,
            ParamKind::Handle { .. }
                | ParamKind::HandlePtr { .. }
                | ParamKind::Struct { .. }
                | ParamKind::StructPtr { .. }
                | ParamKind::Scalar(ScalarType::Bool32)
                | ParamKind::ScalarPtr(ScalarType::Bool32)
                | ParamKind::FixedArray {
                    scalar: ScalarType::Bool32,
                    ..
                }
        )
    }
}

/// Role of a parameter in a dynamic array relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayRole {
    /// Holds the length of the listed items parameters
    Count { items: Vec<String> },
    /// Points to the array elements
    Items {
        count: Option<String>,
        optional: bool,
        /// Element type forced by the declaration; the elements are passed as raw memory
        forced: Option<ScalarType>,
    },
}

/// A classified C parameter or struct field.
///
/// Created when a unit is sealed; array role and output flag are applied from the
/// unit's declarations before the unit becomes immutable.
#[derive(Debug, Clone)]
pub struct Param {
    pub c_name: String,
    pub c_type: CType,
    pub kind: ParamKind,
    pub array: Option<ArrayRole>,
    pub is_output: bool,
}

impl Param {
    pub fn classified(c_name: &str, c_type: &str, header: &Header) -> Result<Self> {
        Ok(Self {
            c_name: c_name.to_string(),
            c_type: CType::resolve(c_type, header),
            kind: classify(c_name, c_type, header)?,
            array: None,
            is_output: false,
        })
    }

    /// Items parameter whose element type is forced, bypassing classification
    pub fn forced(c_name: &str, c_type: &str, scalar: ScalarType, header: &Header) -> Self {
        Self {
            c_name: c_name.to_string(),
            c_type: CType::resolve(c_type, header),
            kind: ParamKind::ScalarPtr(scalar),
            array: None,
            is_output: false,
        }
    }

    /// Wrapper-side name. Pointer and array parameters drop their `p`/`pp` marker:
    /// `pQueueFamilyIndices` -> `queue_family_indices`.
    pub fn boost_name(&self) -> String {
        if self.c_type.is_pointer() || self.is_items() {
            camel_to_snake(strip_pointer_marker(&self.c_name))
        } else {
            camel_to_snake(&self.c_name)
        }
    }

    /// Name of the native temporary used while marshaling this parameter
    pub fn vk_name(&self) -> String {
        format!("vk_{}", self.boost_name())
    }

    pub fn is_hidden(&self) -> bool {
        matches!(
            self.kind,
            ParamKind::Allocator | ParamKind::ChainType | ParamKind::ChainNext
        )
    }

    pub fn is_count(&self) -> bool {
        matches!(self.array, Some(ArrayRole::Count { .. }))
    }

    pub fn is_items(&self) -> bool {
        matches!(self.array, Some(ArrayRole::Items { .. }))
    }

    pub fn count_items(&self) -> &[String] {
        match &self.array {
            Some(ArrayRole::Count { items }) => items,
            _ => &[],
        }
    }

    pub fn items_count(&self) -> Option<&str> {
        match &self.array {
            Some(ArrayRole::Items { count, .. }) => count.as_deref(),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.array, Some(ArrayRole::Items { optional: true, .. }))
    }

    pub fn forced_type(&self) -> Option<ScalarType> {
        match self.array {
            Some(ArrayRole::Items { forced, .. }) => forced,
            _ => None,
        }
    }

    /// Element type of an items parameter, `T` in `array<T>`
    pub fn elem_boost_type(&self) -> Option<String> {
        self.kind.boost_type()
    }

    /// Native pointer type of a forced items parameter, for the reinterpret cast:
    /// `const uint32_t *` -> `uint?`, `const void *` -> `void?`
    pub fn forced_vk_pointer_type(&self) -> String {
        let pointee = match ScalarType::from_c_name(self.c_type.unqual_name()) {
            Some(scalar) => scalar.vk_type().to_string(),
            None => self.c_type.unqual_name().to_string(),
        };
        format!("{pointee}?")
    }

    /// Native type of the count expression (`uint`, `uint64`)
    pub fn count_vk_type(&self) -> String {
        match &self.kind {
            ParamKind::Scalar(s) | ParamKind::ScalarPtr(s) => s.vk_type().to_string(),
            _ => "uint".to_string(),
        }
    }

    /// The unit this parameter's conversion relies on. `to_vk` selects the direction:
    /// wrapper values passed to native code need views, native values returned need
    /// `vk_value_to_boost`.
    pub fn requirement(&self, to_vk: bool) -> Option<Requirement> {
        match &self.kind {
            ParamKind::Struct { vk } | ParamKind::StructPtr { vk } if to_vk => {
                Some(Requirement::View(vk.clone()))
            }
            ParamKind::Struct { vk } | ParamKind::StructPtr { vk } => {
                Some(Requirement::ToBoost(vk.clone()))
            }
            ParamKind::Handle { vk } | ParamKind::HandlePtr { vk } => {
                Some(Requirement::Handle(vk.clone()))
            }
            _ => None,
        }
    }
}

/// A generated unit another unit depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Struct generated with `vk_view_create_unsafe`
    View(String),
    /// Struct generated with `vk_value_to_boost`
    ToBoost(String),
    /// Handle wrapper type
    Handle(String),
}

/// Classify the fields (or parameters) of a unit and apply its array declarations
pub fn build_params(
    unit: &str,
    fields: &[CField],
    arrays: &[ArrayDecl],
    header: &Header,
) -> Result<Vec<Param>> {
    let mut params = fields
        .iter()
        .map(|field| {
            let forced = arrays
                .iter()
                .find(|a| a.items == field.name)
                .and_then(|a| a.force_item_type);
            match forced {
                Some(scalar) => Ok(Param::forced(&field.name, &field.c_type, scalar, header)),
                None => Param::classified(&field.name, &field.c_type, header),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    for array in arrays {
        apply_array(unit, &mut params, array)?;
    }
    Ok(params)
}

fn position(unit: &str, params: &[Param], name: &str) -> Result<usize> {
    params
        .iter()
        .position(|p| p.c_name == name)
        .ok_or_else(|| Error::declaration(unit, format!("`{name}` is not a field or parameter")))
}

fn apply_array(unit: &str, params: &mut [Param], array: &ArrayDecl) -> Result<()> {
    let items_index = position(unit, params, &array.items)?;
    let items = &params[items_index];
    if items.array.is_some() {
        return Err(Error::declaration(
            unit,
            format!("`{}` is already declared as part of an array", items.c_name),
        ));
    }
    if !items.c_type.is_pointer() {
        return Err(Error::declaration(
            unit,
            format!("array items `{}` is not a pointer", items.c_name),
        ));
    }
    let elementwise = matches!(
        items.kind,
        ParamKind::HandlePtr { .. }
            | ParamKind::StructPtr { .. }
            | ParamKind::EnumPtr { .. }
            | ParamKind::ScalarPtr(_)
            | ParamKind::StringPtrArray
    );
    if !elementwise {
        return Err(Error::declaration(
            unit,
            format!("`{}` of kind {:?} cannot hold array items", items.c_name, items.kind),
        ));
    }

    if let Some(count) = &array.count {
        let count_index = position(unit, params, count)?;
        let count_param = &mut params[count_index];
        match &mut count_param.array {
            Some(ArrayRole::Count { items }) => {
                if !items.contains(&array.items) {
                    items.push(array.items.clone());
                }
            }
            Some(ArrayRole::Items { .. }) => {
                return Err(Error::declaration(
                    unit,
                    format!("`{count}` holds array items and cannot be a count"),
                ));
            }
            None => {
                let unsigned = matches!(
                    count_param.kind,
                    ParamKind::Scalar(ScalarType::Uint32 | ScalarType::Uint64)
                        | ParamKind::ScalarPtr(ScalarType::Uint32 | ScalarType::Uint64)
                );
                if !unsigned {
                    return Err(Error::declaration(
                        unit,
                        format!("count `{count}` is not an unsigned integer"),
                    ));
                }
                count_param.array = Some(ArrayRole::Count {
                    items: vec![array.items.clone()],
                });
            }
        }
    }

    params[items_index].array = Some(ArrayRole::Items {
        count: array.count.clone(),
        optional: array.optional,
        forced: array.force_item_type,
    });
    Ok(())
}

/// Flag the named parameters as outputs of the native call
pub fn mark_outputs(unit: &str, params: &mut [Param], outputs: &[String]) -> Result<()> {
    for name in outputs {
        let index = position(unit, params, name)?;
        let param = &mut params[index];
        let writable = param.is_items()
            || matches!(
                param.kind,
                ParamKind::HandlePtr { .. }
                    | ParamKind::StructPtr { .. }
                    | ParamKind::EnumPtr { .. }
                    | ParamKind::ScalarPtr(_)
            );
        if !writable || param.c_type.is_const() {
            return Err(Error::declaration(
                unit,
                format!("output `{name}` is not a writable pointer"),
            ));
        }
        param.is_output = true;
    }
    Ok(())
}
