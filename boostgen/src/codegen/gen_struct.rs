//! Wrapper structs and their conversions.
//!
//! A struct unit emits the wrapper layout and, depending on its direction flags,
//! `vk_value_to_boost` (native to wrapper) and the view pair `vk_view_create_unsafe` /
//! `vk_view_destroy` (wrapper to native). A view borrows the wrapper value: native
//! arrays and nested views are kept in hidden `_vk_view_p_<field>` members until the
//! view is destroyed. `_vk_view__active` guards against creating a second view of the
//! same value.

use itertools::Itertools;

use crate::api::decl::StructDecl;
use crate::api::header::Header;
use crate::api::record::CField;
use crate::codegen::call::overload_key;
use crate::codegen::classify::{ParamKind, ScalarType};
use crate::codegen::lines::Lines;
use crate::codegen::names::{structure_type_value, wrapper_type_name};
use crate::codegen::param::{build_params, Convert, Param, Requirement};
use crate::error::{Error, Result};

const ACTIVE_FLAG: &str = "_vk_view__active";
const STRUCTURE_TYPE_ENUM: &str = "VkStructureType";

/// A sealed struct unit
#[derive(Debug, Clone)]
pub struct GenStruct {
    name: String,
    fields: Vec<Param>,
    vk_to_boost: bool,
    boost_to_vk: bool,
    s_type: Option<String>,
}

impl GenStruct {
    pub(crate) fn new(decl: &StructDecl, header: &Header) -> Result<Self> {
        let name = decl.name.as_str();
        let fields = header.struct_fields(name).ok_or_else(|| Error::MissingEntity {
            kind: "struct",
            name: name.to_string(),
        })?;
        if let Some(unknown) = decl
            .ignore_fields
            .iter()
            .find(|ignored| !fields.iter().any(|f| &f.name == *ignored))
        {
            return Err(Error::declaration(
                name,
                format!("ignored field `{unknown}` is not a field"),
            ));
        }
        let kept = fields
            .iter()
            .filter(|f| !decl.ignore_fields.contains(&f.name))
            .cloned()
            .collect::<Vec<CField>>();
        let fields = build_params(name, &kept, &decl.arrays, header)?;

        let s_type = fields
            .iter()
            .any(|f| f.kind == ParamKind::ChainType)
            .then(|| structure_type_value(name));
        if let (Some(s_type), Some(values)) = (&s_type, header.enum_values(STRUCTURE_TYPE_ENUM)) {
            if !values.contains(s_type) {
                return Err(Error::declaration(
                    name,
                    format!("`{s_type}` is not a {STRUCTURE_TYPE_ENUM} value"),
                ));
            }
        }

        let generated = Self {
            name: name.to_string(),
            fields,
            vk_to_boost: decl.vk_to_boost,
            boost_to_vk: decl.boost_to_vk,
            s_type,
        };
        generated.validate()?;
        log::debug!(
            "struct `{name}`: {} fields, vk_to_boost: {}, boost_to_vk: {}",
            generated.fields.len(),
            generated.vk_to_boost,
            generated.boost_to_vk
        );
        Ok(generated)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Param] {
        &self.fields
    }

    pub fn boost_type(&self) -> String {
        wrapper_type_name(&self.name)
    }

    pub fn has_vk_to_boost(&self) -> bool {
        self.vk_to_boost
    }

    pub fn has_boost_to_vk(&self) -> bool {
        self.boost_to_vk
    }

    /// Overload keys of the emitted conversion functions
    pub fn definitions(&self) -> Vec<String> {
        let boost_type = self.boost_type();
        let mut keys = Vec::new();
        if self.vk_to_boost {
            keys.push(overload_key("vk_value_to_boost", &[format!("v : {}", self.name)]));
        }
        if self.boost_to_vk {
            let param = [format!("b : {boost_type}")];
            keys.push(overload_key("vk_view_create_unsafe", &param));
            keys.push(overload_key("vk_view_destroy", &param));
        }
        keys
    }

    pub fn requirements(&self) -> Vec<Requirement> {
        let mut requirements = Vec::new();
        for field in &self.fields {
            if self.boost_to_vk {
                requirements.extend(field.requirement(true));
            }
            if self.vk_to_boost {
                requirements.extend(field.requirement(false));
            }
        }
        requirements
    }

    fn visible_fields(&self) -> impl Iterator<Item = &Param> {
        self.fields.iter().filter(|f| !f.is_hidden() && !f.is_count())
    }

    fn validate(&self) -> Result<()> {
        for field in self.visible_fields() {
            let problems = [
                (self.boost_to_vk, view_problem(field), "vk_view_create_unsafe"),
                (self.vk_to_boost, to_boost_problem(field), "vk_value_to_boost"),
            ];
            for (enabled, problem, function) in problems {
                if let (true, Some(problem)) = (enabled, problem) {
                    return Err(Error::unsupported(
                        &self.name,
                        format!("{problem} `{}` in {function}", field.c_name),
                    ));
                }
            }
        }
        Ok(())
    }

    /// A hidden native array backs this items field while a view exists
    fn has_view_storage(field: &Param) -> bool {
        if field.is_items() {
            field.forced_type().is_none() && !field.kind.same_layout()
        } else {
            matches!(field.kind, ParamKind::StructPtr { .. })
        }
    }

    pub fn generate(&self) -> Result<Vec<String>> {
        let mut lines = Lines::new();
        self.emit_layout(&mut lines)?;
        if self.vk_to_boost {
            lines.blank();
            self.emit_vk_to_boost(&mut lines)?;
        }
        if self.boost_to_vk {
            lines.blank();
            self.emit_view_create(&mut lines)?;
            lines.blank();
            self.emit_view_destroy(&mut lines);
        }
        Ok(lines.into_vec())
    }

    fn emit_layout(&self, lines: &mut Lines) -> Result<()> {
        let mut members = Vec::new();
        for field in self.visible_fields() {
            let elem = field.elem_boost_type().ok_or_else(|| {
                Error::unsupported(&self.name, format!("`{}` has no wrapper type", field.c_name))
            })?;
            let boost_type = match &field.kind {
                _ if field.is_items() => format!("array<{elem}>"),
                ParamKind::StructPtr { .. } => format!("{elem}?"),
                _ => elem,
            };
            members.push(format!("{} : {boost_type}", field.boost_name()));
        }
        if self.boost_to_vk {
            members.push(format!("{ACTIVE_FLAG} : bool"));
            for field in self.visible_fields().filter(|f| Self::has_view_storage(f)) {
                let vk_type = field.kind.vk_type().unwrap_or_default();
                let storage = if field.is_items() {
                    format!("array<{vk_type}>")
                } else {
                    vk_type
                };
                members.push(format!("_vk_view_p_{} : {storage}", field.boost_name()));
            }
        }
        lines.block(format!("struct {}", self.boost_type()), |l| {
            for member in &members {
                l.push(member);
            }
        });
        Ok(())
    }

    fn emit_vk_to_boost(&self, lines: &mut Lines) -> Result<()> {
        lines.push(format!(
            "def vk_value_to_boost(vk_struct : {}) : {}",
            self.name,
            self.boost_type()
        ));
        let mut entries = Vec::new();
        for field in self.visible_fields() {
            let conv = |expr: &str| {
                field.kind.vk_to_boost(expr).ok_or_else(|| {
                    Error::unsupported(
                        &self.name,
                        format!("`{}` cannot be converted to a wrapper value", field.c_name),
                    )
                })
            };
            let value = match field.items_count() {
                Some(count) => {
                    let item = conv(&format!("unsafe(vk_struct.{}[i])", field.c_name))?;
                    format!("[{{for i in range(int(vk_struct.{count})); {item}}}]")
                }
                None => conv(&format!("vk_struct.{}", field.c_name))?,
            };
            entries.push(format!("{} = {value}", field.boost_name()));
        }
        let mut body = Lines::new();
        emit_literal(&mut body, &self.boost_type(), &entries);
        lines.append_indented(body);
        Ok(())
    }

    fn emit_view_create(&self, lines: &mut Lines) -> Result<()> {
        lines.push(format!(
            "def vk_view_create_unsafe(var boost_struct : {}) : {}",
            self.boost_type(),
            self.name
        ));
        let mut body = Lines::new();
        body.push(format!("assert(!boost_struct.{ACTIVE_FLAG})"));
        body.push(format!("boost_struct.{ACTIVE_FLAG} = true"));
        self.emit_length_asserts(&mut body);

        let mut entries = Vec::new();
        for field in &self.fields {
            let b = format!("boost_struct.{}", field.boost_name());
            let storage = format!("boost_struct._vk_view_p_{}", field.boost_name());
            let value = match &field.kind {
                ParamKind::ChainType => {
                    let s_type = self.s_type.as_deref().ok_or_else(|| {
                        Error::declaration(&self.name, "missing structure type value")
                    })?;
                    format!("VkStructureType {s_type}")
                }
                ParamKind::ChainNext | ParamKind::Allocator => "null".to_string(),
                _ if field.is_count() => {
                    let reference = self.count_inputs(field).first().map(|p| p.boost_name());
                    let reference = reference.ok_or_else(|| {
                        Error::declaration(
                            &self.name,
                            format!("count `{}` has no array", field.c_name),
                        )
                    })?;
                    format!("{}(length(boost_struct.{reference}))", field.count_vk_type())
                }
                _ if field.is_items() => {
                    if field.forced_type().is_some() {
                        format!(
                            "unsafe(reinterpret<{}> array_addr_unsafe({b}))",
                            field.forced_vk_pointer_type()
                        )
                    } else if field.kind.same_layout() {
                        format!("array_addr_unsafe({b})")
                    } else {
                        let conv = self.to_vk(field, "item")?;
                        body.push(format!("{storage} <- [{{for item in {b}; {conv}}}]"));
                        format!("array_addr_unsafe({storage})")
                    }
                }
                ParamKind::StructPtr { .. } => {
                    body.block(format!("if {b} != null"), |l| {
                        l.push(format!("{storage} <- (*{b}) |> vk_view_create_unsafe()"));
                    });
                    format!("{b} != null ? unsafe(addr({storage})) : null")
                }
                _ => self.to_vk(field, &b)?,
            };
            entries.push(format!("{} = {value}", field.c_name));
        }
        emit_literal(&mut body, &self.name, &entries);
        lines.append_indented(body);
        Ok(())
    }

    fn emit_view_destroy(&self, lines: &mut Lines) {
        lines.block(
            format!("def vk_view_destroy(var boost_struct : {})", self.boost_type()),
            |l| {
                for field in self.visible_fields() {
                    let b = format!("boost_struct.{}", field.boost_name());
                    let storage = format!("boost_struct._vk_view_p_{}", field.boost_name());
                    match &field.kind {
                        _ if field.is_items() => {
                            if !Self::has_view_storage(field) {
                                continue;
                            }
                            if let Some(destroy) = field.kind.view_destroy("item") {
                                l.block(format!("for item in {b}"), |l| l.push(destroy));
                            }
                            l.push(format!("delete {storage}"));
                        }
                        ParamKind::Struct { .. } => l.push(format!("{b} |> vk_view_destroy()")),
                        ParamKind::StructPtr { .. } => {
                            l.block(format!("if {b} != null"), |l| {
                                l.push(format!("(*{b}) |> vk_view_destroy()"));
                            });
                        }
                        _ => {}
                    }
                }
                l.push(format!("boost_struct.{ACTIVE_FLAG} = false"));
            },
        );
    }

    fn to_vk(&self, field: &Param, expr: &str) -> Result<String> {
        field.kind.boost_to_vk(expr).ok_or_else(|| {
            Error::unsupported(
                &self.name,
                format!("`{}` cannot be converted to a native value", field.c_name),
            )
        })
    }

    /// Items fields sharing `count`, mandatory ones first
    fn count_inputs(&self, count: &Param) -> Vec<&Param> {
        count
            .count_items()
            .iter()
            .filter_map(|name| self.fields.iter().find(|f| &f.c_name == name))
            .sorted_by_key(|f| f.is_optional())
            .collect()
    }

    fn emit_length_asserts(&self, body: &mut Lines) {
        for count in self.fields.iter().filter(|f| f.is_count()) {
            let inputs = self.count_inputs(count);
            let Some((reference, others)) = inputs.split_first() else {
                continue;
            };
            let reference = format!("boost_struct.{}", reference.boost_name());
            for other in others {
                let name = format!("boost_struct.{}", other.boost_name());
                if other.is_optional() {
                    body.push(format!(
                        "assert(length({name}) == 0 || length({name}) == length({reference}))"
                    ));
                } else {
                    body.push(format!("assert(length({name}) == length({reference}))"));
                }
            }
        }
    }
}

/// `return <- [[Type a = x, b = y]]`, one member per line
fn emit_literal(body: &mut Lines, type_name: &str, entries: &[String]) {
    if entries.is_empty() {
        body.push(format!("return <- [[{type_name}]]"));
    } else {
        body.list(&format!("return <- [[{type_name}"), entries, "]]");
    }
}

fn view_problem(field: &Param) -> Option<&'static str> {
    if field.is_items() {
        return None;
    }
    match field.kind {
        ParamKind::FixedString { .. } => Some("fixed string"),
        ParamKind::FixedArray {
            scalar: ScalarType::Bool32,
            ..
        } => Some("fixed VkBool32 array"),
        ParamKind::HandlePtr { .. } | ParamKind::EnumPtr { .. } | ParamKind::ScalarPtr(_) => {
            Some("single non-struct pointer")
        }
        ParamKind::StringPtrArray => Some("string array without a declared count"),
        _ => None,
    }
}

fn to_boost_problem(field: &Param) -> Option<&'static str> {
    if field.is_items() {
        return if field.items_count().is_none() {
            Some("array without a count")
        } else if field.forced_type().is_some() {
            Some("array with a forced item type")
        } else {
            None
        };
    }
    match field.kind {
        ParamKind::StructPtr { .. } => Some("single struct pointer"),
        ParamKind::FixedArray {
            scalar: ScalarType::Bool32,
            ..
        } => Some("fixed VkBool32 array"),
        ParamKind::HandlePtr { .. } | ParamKind::EnumPtr { .. } | ParamKind::ScalarPtr(_) => {
            Some("single non-struct pointer")
        }
        ParamKind::StringPtrArray => Some("string array without a declared count"),
        _ => None,
    }
}
