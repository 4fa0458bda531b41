//! Marshaling of wrapper arguments into a native call.
//!
//! Shared by the function generator and the handle lifecycle functions. A native call is
//! emitted as: length asserts, input temporaries (each view release deferred right after
//! its acquisition), output storage, then one or two invocations each followed by the
//! status check.

use itertools::Itertools;

use crate::codegen::classify::ParamKind;
use crate::codegen::lines::Lines;
use crate::codegen::param::{Convert, Param};
use crate::error::{Error, Result};

/// Native status type; functions returning it get the status parameter
pub const STATUS_TYPE: &str = "VkResult";

/// Trailing wrapper parameter receiving the native status
pub const STATUS_PARAM: &str = "var result : VkResult? = null";

/// Which invocation of a two-call enumeration is being emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Items pointers are `null`, only the count is written
    SizeQuery,
    Fill,
}

/// `def name(params) : ret`
pub fn signature(name: &str, params: &[String], return_type: Option<&str>) -> String {
    let params = params.join("; ");
    match return_type {
        Some(return_type) => format!("def {name}({params}) : {return_type}"),
        None => format!("def {name}({params})"),
    }
}

/// Overload identity of a wrapper, its name and parameter types: `name(T; U)`.
/// Two wrappers with the same key cannot live in one module.
pub fn overload_key(name: &str, params: &[String]) -> String {
    let types = params
        .iter()
        .map(|param| {
            let declaration = param.split_once(" = ").map_or(param.as_str(), |(d, _)| d);
            declaration
                .split_once(" : ")
                .map_or(declaration, |(_, ty)| ty)
                .trim()
        })
        .join("; ");
    format!("{name}({types})")
}

/// Statement leaving a wrapper function with the default value of its return type
pub fn early_return(return_type: Option<&str>) -> String {
    match return_type {
        Some(return_type) => format!("return <- [[{return_type}]]"),
        None => "return".to_string(),
    }
}

/// A native function call with its classified parameters
pub struct NativeCall<'a> {
    unit: &'a str,
    native: &'a str,
    params: &'a [Param],
    returns_status: bool,
}

impl<'a> NativeCall<'a> {
    pub fn new(unit: &'a str, native: &'a str, params: &'a [Param], returns_status: bool) -> Self {
        Self {
            unit,
            native,
            params,
            returns_status,
        }
    }

    pub fn param(&self, c_name: &str) -> Option<&'a Param> {
        self.params.iter().find(|p| p.c_name == c_name)
    }

    /// Parameters the caller supplies: everything except hidden, count and output
    /// parameters
    pub fn inputs(&self) -> impl Iterator<Item = &'a Param> {
        self.params
            .iter()
            .filter(|p| !p.is_hidden() && !p.is_count() && !p.is_output)
    }

    /// The count parameter of an items parameter
    pub fn count_of(&self, items: &Param) -> Option<&'a Param> {
        let count = items.items_count()?;
        self.param(count)
    }

    /// Input items sharing `count`, the first mandatory one first
    fn count_inputs(&self, count: &Param) -> Vec<&'a Param> {
        count
            .count_items()
            .iter()
            .filter_map(|name| self.param(name))
            .filter(|p| !p.is_output)
            .sorted_by_key(|p| p.is_optional())
            .collect()
    }

    /// Check the array and output shapes this call can marshal
    pub fn validate(&self) -> Result<()> {
        for count in self.params.iter().filter(|p| p.is_count()) {
            let has_input = !self.count_inputs(count).is_empty();
            if count.c_type.is_pointer() {
                if has_input {
                    return Err(Error::declaration(
                        self.unit,
                        format!("count pointer `{}` cannot size an input array", count.c_name),
                    ));
                }
            } else if !has_input {
                return Err(Error::declaration(
                    self.unit,
                    format!("count `{}` is not shared with an input array", count.c_name),
                ));
            }
        }
        for param in self.params.iter().filter(|p| p.is_items()) {
            if param.is_output && self.count_of(param).is_none() {
                return Err(Error::declaration(
                    self.unit,
                    format!("output array `{}` has no count", param.c_name),
                ));
            }
        }
        for param in self.inputs() {
            self.wrapper_param(param)?;
        }
        Ok(())
    }

    fn wrapper_param(&self, param: &Param) -> Result<String> {
        let name = param.boost_name();
        let elem = param.elem_boost_type().ok_or_else(|| {
            Error::unsupported(self.unit, format!("`{}` has no wrapper type", param.c_name))
        })?;
        if param.is_items() {
            return Ok(format!("var {name} : array<{elem}>"));
        }
        match &param.kind {
            ParamKind::StringPtrArray => Err(Error::unsupported(
                self.unit,
                format!("string array `{}` without a declared count", param.c_name),
            )),
            ParamKind::FixedString { .. } => Err(Error::unsupported(
                self.unit,
                format!("fixed string parameter `{}`", param.c_name),
            )),
            kind if kind.needs_view() => Ok(format!("var {name} : {elem}")),
            _ => Ok(format!("{name} : {elem}")),
        }
    }

    /// Wrapper parameter declarations, including the status parameter
    pub fn wrapper_params(&self) -> Result<Vec<String>> {
        let mut params = self
            .inputs()
            .map(|p| self.wrapper_param(p))
            .collect::<Result<Vec<_>>>()?;
        if self.returns_status {
            params.push(STATUS_PARAM.to_string());
        }
        Ok(params)
    }

    /// Argument names to forward the wrapper parameters to another wrapper
    pub fn wrapper_args(&self) -> Vec<String> {
        let mut args = self.inputs().map(Param::boost_name).collect_vec();
        if self.returns_status {
            args.push("result".to_string());
        }
        args
    }

    /// Mandatory arrays sharing a count must have equal lengths; optional ones may
    /// also be empty
    pub fn emit_length_asserts(&self, lines: &mut Lines) {
        for count in self.params.iter().filter(|p| p.is_count()) {
            let inputs = self.count_inputs(count);
            let Some((reference, others)) = inputs.split_first() else {
                continue;
            };
            let reference = reference.boost_name();
            for other in others {
                let other = if other.is_optional() {
                    let name = other.boost_name();
                    format!("length({name}) == 0 || length({name}) == length({reference})")
                } else {
                    format!("length({}) == length({reference})", other.boost_name())
                };
                lines.push(format!("assert({other})"));
            }
        }
    }

    /// Native representations of the inputs which cannot be passed directly
    pub fn emit_input_temporaries(&self, lines: &mut Lines) -> Result<()> {
        for param in self.inputs() {
            let name = param.boost_name();
            let vk = param.vk_name();
            if param.is_items() {
                if param.forced_type().is_some() || param.kind.same_layout() {
                    continue;
                }
                let conv = self.to_vk(param, "item")?;
                lines.push(format!("var {vk} <- [{{for item in {name}; {conv}}}]"));
                lines.block("defer() <|", |l| {
                    if let Some(destroy) = param.kind.view_destroy("item") {
                        l.block(format!("for item in {name}"), |l| l.push(destroy));
                    }
                    l.push(format!("delete {vk}"));
                });
                continue;
            }
            match &param.kind {
                kind if kind.needs_view() => {
                    lines.push(format!("var {vk} <- {name} |> vk_view_create_unsafe()"));
                    lines.block("defer() <|", |l| {
                        l.push(format!("{name} |> vk_view_destroy()"));
                    });
                }
                ParamKind::HandlePtr { .. } | ParamKind::EnumPtr { .. } | ParamKind::ScalarPtr(_) => {
                    let conv = self.to_vk(param, &name)?;
                    lines.push(format!("var {vk} = {conv}"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn to_vk(&self, param: &Param, expr: &str) -> Result<String> {
        param.kind.boost_to_vk(expr).ok_or_else(|| {
            Error::unsupported(
                self.unit,
                format!("`{}` cannot be converted to a native value", param.c_name),
            )
        })
    }

    /// Expression converting the native storage of `output` to its wrapper value
    pub fn output_conversion(&self, output: &Param) -> Result<String> {
        let vk = output.vk_name();
        let to_boost = |expr: &str| {
            output.kind.vk_to_boost(expr).ok_or_else(|| {
                Error::unsupported(
                    self.unit,
                    format!("`{}` cannot be converted to a wrapper value", output.c_name),
                )
            })
        };
        if output.is_items() {
            if output.kind.same_layout() {
                return Ok(vk);
            }
            let conv = to_boost("item")?;
            return Ok(format!("[{{for item in {vk}; {conv}}}]"));
        }
        to_boost(&vk)
    }

    /// Storage for an output and the invocations filling it.
    ///
    /// Arrays whose count is a pointer are sized by a first call with `null` items;
    /// arrays sharing a count with an input array take its length.
    pub fn emit_output(
        &self,
        lines: &mut Lines,
        output: &Param,
        s_type: Option<&str>,
        early_return: &str,
    ) -> Result<()> {
        let vk = output.vk_name();
        let vk_type = output.kind.vk_type().ok_or_else(|| {
            Error::unsupported(self.unit, format!("output `{}` has no native type", output.c_name))
        })?;
        if !output.is_items() {
            lines.push(format!("var {vk} : {vk_type}"));
            if let Some(s_type) = s_type {
                lines.push(format!("{vk}.sType = VkStructureType {s_type}"));
            }
            return self.emit_invoke(lines, Pass::Fill, None, early_return);
        }

        let count = self.count_of(output).ok_or_else(|| {
            Error::declaration(self.unit, format!("output array `{}` has no count", output.c_name))
        })?;
        let init_s_type = |lines: &mut Lines| {
            if let Some(s_type) = s_type {
                lines.block(format!("for item in {vk}"), |l| {
                    l.push(format!("item.sType = VkStructureType {s_type}"));
                });
            }
        };
        lines.push(format!("var {vk} : array<{vk_type}>"));
        if count.c_type.is_pointer() {
            let count_vk = count.vk_name();
            lines.push(format!("var {count_vk} : {}", count.count_vk_type()));
            self.emit_invoke(lines, Pass::SizeQuery, None, early_return)?;
            lines.push(format!("{vk} |> resize(int({count_vk}))"));
            init_s_type(lines);
            self.emit_invoke(lines, Pass::Fill, None, early_return)?;
            // the second call may report fewer items
            lines.push(format!("{vk} |> resize(int({count_vk}))"));
        } else {
            let reference = self.count_reference(count)?;
            lines.push(format!("{vk} |> resize(length({}))", reference.boost_name()));
            init_s_type(lines);
            self.emit_invoke(lines, Pass::Fill, None, early_return)?;
        }
        Ok(())
    }

    fn count_reference(&self, count: &Param) -> Result<&'a Param> {
        self.count_inputs(count).first().copied().ok_or_else(|| {
            Error::declaration(
                self.unit,
                format!("count `{}` is not shared with an input array", count.c_name),
            )
        })
    }

    /// Emit one invocation. With a status return the status is stored in `result` and a
    /// failure leaves the wrapper through `early_return`, or asserts if the caller did
    /// not ask for the status. Otherwise the return value is bound to `capture`.
    pub fn emit_invoke(
        &self,
        lines: &mut Lines,
        pass: Pass,
        capture: Option<&str>,
        early_return: &str,
    ) -> Result<()> {
        let args = self
            .params
            .iter()
            .map(|p| self.arg(p, pass))
            .collect::<Result<Vec<_>>>()?;
        let call = format!("{}({})", self.native, args.join(", "));
        if self.returns_status {
            let status = match pass {
                Pass::SizeQuery => "query_status",
                Pass::Fill => "status",
            };
            lines.push(format!("let {status} = {call}"));
            lines.block("if result != null", |l| l.push(format!("*result = {status}")));
            lines.block(format!("if {status} != {STATUS_TYPE} VK_SUCCESS"), |l| {
                l.push(format!("assert(result != null, \"{} failed\")", self.native));
                l.push(early_return);
            });
        } else if let Some(capture) = capture {
            lines.push(format!("let {capture} = {call}"));
        } else {
            lines.push(call);
        }
        Ok(())
    }

    fn arg(&self, param: &Param, pass: Pass) -> Result<String> {
        let name = param.boost_name();
        let vk = param.vk_name();
        Ok(match &param.kind {
            ParamKind::Allocator | ParamKind::ChainNext => "null".to_string(),
            _ if param.is_count() => {
                if param.c_type.is_pointer() {
                    format!("unsafe(addr({vk}))")
                } else {
                    let reference = self.count_reference(param)?;
                    format!("{}(length({}))", param.count_vk_type(), reference.boost_name())
                }
            }
            _ if param.is_items() => {
                if param.is_output {
                    match pass {
                        Pass::SizeQuery => "null".to_string(),
                        Pass::Fill => format!("array_addr_unsafe({vk})"),
                    }
                } else if param.forced_type().is_some() {
                    format!(
                        "unsafe(reinterpret<{}> array_addr_unsafe({name}))",
                        param.forced_vk_pointer_type()
                    )
                } else if param.kind.same_layout() {
                    format!("array_addr_unsafe({name})")
                } else {
                    format!("array_addr_unsafe({vk})")
                }
            }
            _ if param.is_output => format!("unsafe(addr({vk}))"),
            ParamKind::Struct { .. } => vk,
            ParamKind::StructPtr { .. }
            | ParamKind::HandlePtr { .. }
            | ParamKind::EnumPtr { .. }
            | ParamKind::ScalarPtr(_) => format!("unsafe(addr({vk}))"),
            _ => self.to_vk(param, &name)?,
        })
    }
}
