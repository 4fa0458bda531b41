//! Handle wrappers and their lifecycle functions.
//!
//! A handle wrapper holds the native value. With a destructor it also owns the
//! resource: `_needs_delete` is set by constructors only, and the handles the
//! destructor needs besides the destroyed one (`_device`) are captured at construction.
//! Handles obtained by enumeration are never owned.

use itertools::Itertools;

use crate::api::decl::{ArrayDecl, FunctionDecl, HandleDecl};
use crate::api::header::{Function, Header};
use crate::codegen::call::{early_return, overload_key, signature, NativeCall, STATUS_TYPE};
use crate::codegen::classify::{classify, ParamKind, ScalarType};
use crate::codegen::lines::Lines;
use crate::codegen::names::{strip_api_prefix, wrapper_name, wrapper_type_name, OPAQUE_SUFFIX};
use crate::codegen::param::{build_params, handle_attr, mark_outputs, Param, Requirement};
use crate::error::{Error, Result};

const OWNED_FLAG: &str = "_needs_delete";

/// A native lifecycle function bound to a handle
#[derive(Debug, Clone)]
struct Lifecycle {
    name: String,
    params: Vec<Param>,
    returns_status: bool,
}

impl Lifecycle {
    fn new(
        function: &Function,
        arrays: &[ArrayDecl],
        outputs: &[String],
        header: &Header,
    ) -> Result<Self> {
        let unit = function.name.as_str();
        let mut params = build_params(unit, &function.params, arrays, header)?;
        mark_outputs(unit, &mut params, outputs)?;
        let return_type = function.return_type()?;
        if return_type != STATUS_TYPE && return_type != "void" {
            return Err(Error::unsupported(
                unit,
                format!("lifecycle function returning `{return_type}`"),
            ));
        }
        Ok(Self {
            name: function.name.clone(),
            params,
            returns_status: return_type == STATUS_TYPE,
        })
    }

    fn call(&self) -> NativeCall<'_> {
        NativeCall::new(&self.name, &self.name, &self.params, self.returns_status)
    }

    fn output(&self) -> Option<&Param> {
        self.params.iter().find(|p| p.is_output)
    }

    fn boost_name(&self) -> String {
        wrapper_name(&self.name)
    }
}

/// A sealed handle unit
#[derive(Debug, Clone)]
pub struct GenHandle {
    name: String,
    ctors: Vec<Lifecycle>,
    dtor: Option<Lifecycle>,
    enumerator: Option<Lifecycle>,
    /// Handles the destructor needs besides the destroyed one: (wrapper name, native type)
    deps: Vec<(String, String)>,
}

fn lookup<'h>(header: &'h Header, name: &str) -> Result<&'h Function> {
    header.function(name).ok_or_else(|| Error::MissingEntity {
        kind: "function",
        name: name.to_string(),
    })
}

impl GenHandle {
    /// `claimed` lists native functions wrapped by function units; lifecycle functions
    /// are not discovered among them.
    pub(crate) fn new(
        decl: &HandleDecl,
        header: &Header,
        function_prefix: &str,
        claimed: &[&str],
    ) -> Result<Self> {
        let name = decl.name.as_str();
        if !header.is_opaque_struct(&format!("{name}{OPAQUE_SUFFIX}")) {
            return Err(Error::MissingEntity {
                kind: "handle",
                name: name.to_string(),
            });
        }
        let stem = strip_api_prefix(name);
        let discover = |verb: &str, suffix: &str| {
            let candidate = format!("{function_prefix}{verb}{stem}{suffix}");
            if claimed.contains(&candidate.as_str()) {
                log::debug!("handle `{name}`: `{candidate}` is wrapped as a function");
                return None;
            }
            header.function(&candidate).map(|_| {
                log::debug!("handle `{name}`: discovered `{candidate}`");
                FunctionDecl::new(candidate)
            })
        };
        let ctor_decls = if decl.ctors.is_empty() {
            discover("Create", "").into_iter().collect_vec()
        } else {
            decl.ctors.clone()
        };
        let dtor_decl = decl.dtor.clone().or_else(|| discover("Destroy", ""));
        let enumerator_decl = decl.enumerator.clone().or_else(|| discover("Enumerate", "s"));

        let dtor = dtor_decl
            .map(|d| Lifecycle::new(lookup(header, &d.name)?, &d.arrays, &d.outputs, header))
            .transpose()?;
        let deps = match &dtor {
            Some(dtor) => Self::destructor_deps(name, dtor)?,
            None => Vec::new(),
        };
        let ctors = ctor_decls
            .iter()
            .map(|d| Self::constructor(name, d, header))
            .collect::<Result<Vec<_>>>()?;
        let enumerator = enumerator_decl
            .map(|d| Self::enumeration(name, &d, header))
            .transpose()?;

        for ctor in &ctors {
            for (dep, vk) in &deps {
                let captured = ctor.call().inputs().any(|p| {
                    &p.boost_name() == dep && p.kind == ParamKind::Handle { vk: vk.clone() }
                });
                if !captured {
                    return Err(Error::declaration(
                        &ctor.name,
                        format!("no `{dep}` parameter to capture for the destructor"),
                    ));
                }
            }
        }

        let generated = Self {
            name: name.to_string(),
            ctors,
            dtor,
            enumerator,
            deps,
        };
        log::debug!(
            "handle `{name}`: {} ctors, dtor: {}, enumerator: {}",
            generated.ctors.len(),
            generated.dtor.is_some(),
            generated.enumerator.is_some()
        );
        Ok(generated)
    }

    fn constructor(name: &str, decl: &FunctionDecl, header: &Header) -> Result<Lifecycle> {
        let function = lookup(header, &decl.name)?;
        let outputs = if decl.outputs.is_empty() {
            // the last handle pointer of this type is the created handle
            let params = build_params(&decl.name, &function.params, &decl.arrays, header)?;
            params
                .iter()
                .rev()
                .find(|p| is_handle_ptr_of(p, name))
                .map(|p| vec![p.c_name.clone()])
                .unwrap_or_default()
        } else {
            decl.outputs.clone()
        };
        let ctor = Lifecycle::new(function, &decl.arrays, &outputs, header)?;
        let produced = ctor.params.iter().filter(|p| p.is_output).collect_vec();
        match produced.as_slice() {
            [output] if is_handle_ptr_of(output, name) => {}
            [] | [_] => {
                return Err(Error::declaration(
                    &decl.name,
                    format!("constructor does not produce a `{name}`"),
                ))
            }
            _ => {
                return Err(Error::MultipleOutputs {
                    function: decl.name.clone(),
                })
            }
        }
        ctor.call().validate()?;
        Ok(ctor)
    }

    fn enumeration(name: &str, decl: &FunctionDecl, header: &Header) -> Result<Lifecycle> {
        let function = lookup(header, &decl.name)?;
        let arrays = if decl.arrays.is_empty() {
            vec![infer_enumeration(name, function, header)?]
        } else {
            decl.arrays.clone()
        };
        let outputs = if decl.outputs.is_empty() {
            arrays.iter().map(|a| a.items.clone()).collect_vec()
        } else {
            decl.outputs.clone()
        };
        let enumerator = Lifecycle::new(function, &arrays, &outputs, header)?;
        let call = enumerator.call();
        let output = match enumerator.params.iter().filter(|p| p.is_output).collect_vec()[..] {
            [output] => output,
            [] => {
                return Err(Error::declaration(&decl.name, "enumerator has no output"));
            }
            _ => {
                return Err(Error::MultipleOutputs {
                    function: decl.name.clone(),
                })
            }
        };
        let two_call = call.count_of(output).is_some_and(|c| c.c_type.is_pointer());
        if !output.is_items() || !is_handle_ptr_of(output, name) || !two_call {
            return Err(Error::declaration(
                &decl.name,
                format!("enumerator must write `{name}` items with a count pointer"),
            ));
        }
        call.validate()?;
        Ok(enumerator)
    }

    fn destructor_deps(name: &str, dtor: &Lifecycle) -> Result<Vec<(String, String)>> {
        let mut primary = false;
        let mut deps = Vec::new();
        for param in &dtor.params {
            match &param.kind {
                ParamKind::Allocator => {}
                ParamKind::Handle { vk } if vk == name && !primary => primary = true,
                ParamKind::Handle { vk } => deps.push((param.boost_name(), vk.clone())),
                _ => {
                    return Err(Error::unsupported(
                        &dtor.name,
                        format!("destructor parameter `{}`", param.c_name),
                    ))
                }
            }
        }
        if !primary {
            return Err(Error::declaration(
                &dtor.name,
                format!("destructor takes no `{name}`"),
            ));
        }
        Ok(deps)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn boost_type(&self) -> String {
        wrapper_type_name(&self.name)
    }

    pub fn batch_type(&self) -> String {
        format!("{}_Batch", self.boost_type())
    }

    /// Attribute holding the native value
    fn attr(&self) -> String {
        handle_attr(&self.name)
    }

    /// Attribute holding the native values of a batch
    fn batch_attr(&self) -> String {
        format!("{}s", self.attr())
    }

    pub fn has_dtor(&self) -> bool {
        self.dtor.is_some()
    }

    fn is_batched(ctor: &Lifecycle) -> bool {
        ctor.output().is_some_and(Param::is_items)
    }

    fn has_batch(&self) -> bool {
        self.enumerator.is_some() || self.ctors.iter().any(Self::is_batched)
    }

    /// Overload keys of the emitted wrappers
    pub fn definitions(&self) -> Result<Vec<String>> {
        let boost_type = self.boost_type();
        let mut keys = vec![overload_key("boost_value_to_vk", &[format!("b : {boost_type}")])];
        for lifecycle in self.ctors.iter().chain(&self.enumerator) {
            let params = lifecycle.call().wrapper_params()?;
            keys.push(overload_key(&lifecycle.boost_name(), &params));
            if Self::is_batched(lifecycle) {
                keys.push(overload_key(&format!("{}_no_batch", lifecycle.boost_name()), &params));
            }
        }
        if self.dtor.is_some() {
            keys.push(overload_key("destroy", &[format!("h : {boost_type}")]));
            if self.has_batch() {
                keys.push(overload_key("destroy", &[format!("batch : {}", self.batch_type())]));
            }
        }
        Ok(keys)
    }

    pub fn requirements(&self) -> Vec<Requirement> {
        self.ctors
            .iter()
            .chain(&self.enumerator)
            .flat_map(|l| l.params.iter().filter_map(|p| p.requirement(!p.is_output)))
            .collect()
    }

    pub fn generate(&self) -> Result<Vec<String>> {
        let mut lines = Lines::new();
        self.emit_structs(&mut lines);
        lines.blank();
        lines.block(
            format!(
                "def boost_value_to_vk(b : {}) : {}",
                self.boost_type(),
                self.name
            ),
            |l| l.push(format!("return b.{}", self.attr())),
        );
        for ctor in &self.ctors {
            lines.blank();
            if Self::is_batched(ctor) {
                self.emit_batched_ctor(&mut lines, ctor)?;
            } else {
                self.emit_ctor(&mut lines, ctor)?;
            }
        }
        if let Some(enumerator) = &self.enumerator {
            lines.blank();
            self.emit_enumerator(&mut lines, enumerator)?;
        }
        if let Some(dtor) = &self.dtor {
            lines.blank();
            self.emit_dtor(&mut lines, dtor)?;
        }
        Ok(lines.into_vec())
    }

    fn ownership_members(&self) -> Vec<String> {
        if self.dtor.is_none() {
            return Vec::new();
        }
        std::iter::once(format!("{OWNED_FLAG} : bool"))
            .chain(self.deps.iter().map(|(dep, vk)| format!("_{dep} : {vk}")))
            .collect()
    }

    fn emit_structs(&self, lines: &mut Lines) {
        lines.block(format!("struct {}", self.boost_type()), |l| {
            l.push(format!("{} : {}", self.attr(), self.name));
            for member in self.ownership_members() {
                l.push(member);
            }
        });
        if self.has_batch() {
            lines.blank();
            lines.block(format!("struct {}", self.batch_type()), |l| {
                l.push(format!("{} : array<{}>", self.batch_attr(), self.name));
                for member in self.ownership_members() {
                    l.push(member);
                }
            });
        }
    }

    /// `_needs_delete = true` and the captured destructor dependencies
    fn owned_entries(&self) -> Vec<String> {
        if self.dtor.is_none() {
            return Vec::new();
        }
        std::iter::once(format!("{OWNED_FLAG} = true"))
            .chain(self.deps.iter().map(|(dep, vk)| {
                format!("_{dep} = {dep}.{}", handle_attr(vk))
            }))
            .collect()
    }

    fn emit_ctor(&self, lines: &mut Lines, ctor: &Lifecycle) -> Result<()> {
        let call = ctor.call();
        let output = ctor.output().ok_or_else(|| {
            Error::declaration(&ctor.name, format!("constructor does not produce a `{}`", self.name))
        })?;
        let boost_type = self.boost_type();
        lines.push(signature(
            &ctor.boost_name(),
            &call.wrapper_params()?,
            Some(boost_type.as_str()),
        ));
        let mut body = Lines::new();
        call.emit_length_asserts(&mut body);
        call.emit_input_temporaries(&mut body)?;
        call.emit_output(&mut body, output, None, &early_return(Some(boost_type.as_str())))?;
        let entries = std::iter::once(format!("{} = {}", self.attr(), output.vk_name()))
            .chain(self.owned_entries())
            .collect_vec();
        body.list(&format!("return <- [[{boost_type}"), &entries, "]]");
        lines.append_indented(body);
        Ok(())
    }

    fn emit_batched_ctor(&self, lines: &mut Lines, ctor: &Lifecycle) -> Result<()> {
        let call = ctor.call();
        let output = ctor.output().ok_or_else(|| {
            Error::declaration(&ctor.name, format!("constructor does not produce a `{}`", self.name))
        })?;
        let batch_type = self.batch_type();
        lines.push(signature(
            &ctor.boost_name(),
            &call.wrapper_params()?,
            Some(batch_type.as_str()),
        ));
        let mut body = Lines::new();
        call.emit_length_asserts(&mut body);
        call.emit_input_temporaries(&mut body)?;
        call.emit_output(&mut body, output, None, &early_return(Some(batch_type.as_str())))?;
        let entries = std::iter::once(format!("{} <- {}", self.batch_attr(), output.vk_name()))
            .chain(self.owned_entries())
            .collect_vec();
        body.list(&format!("return <- [[{batch_type}"), &entries, "]]");
        lines.append_indented(body);
        lines.blank();
        self.emit_no_batch(lines, &ctor.boost_name(), &call)
    }

    fn emit_enumerator(&self, lines: &mut Lines, enumerator: &Lifecycle) -> Result<()> {
        let call = enumerator.call();
        let output = enumerator.output().ok_or_else(|| {
            Error::declaration(&enumerator.name, "enumerator has no output")
        })?;
        let batch_type = self.batch_type();
        lines.push(signature(
            &enumerator.boost_name(),
            &call.wrapper_params()?,
            Some(batch_type.as_str()),
        ));
        let mut body = Lines::new();
        call.emit_input_temporaries(&mut body)?;
        call.emit_output(&mut body, output, None, &early_return(Some(batch_type.as_str())))?;
        body.push(format!(
            "return <- [[{batch_type} {} <- {}]]",
            self.batch_attr(),
            output.vk_name()
        ));
        lines.append_indented(body);
        lines.blank();
        self.emit_no_batch(lines, &enumerator.boost_name(), &call)
    }

    /// `<batched>_no_batch`: the batch flattened into individual wrappers which inherit
    /// the batch's ownership
    fn emit_no_batch(&self, lines: &mut Lines, batched: &str, call: &NativeCall) -> Result<()> {
        let flattened = format!("array<{}>", self.boost_type());
        lines.push(signature(
            &format!("{batched}_no_batch"),
            &call.wrapper_params()?,
            Some(flattened.as_str()),
        ));
        let mut members = vec![format!("{} = item", self.attr())];
        if self.dtor.is_some() {
            members.push(format!("{OWNED_FLAG} = batch.{OWNED_FLAG}"));
            members.extend(self.deps.iter().map(|(dep, _)| format!("_{dep} = batch._{dep}")));
        }
        lines.indented(|l| {
            l.push(format!(
                "var batch <- {batched}({})",
                call.wrapper_args().join(", ")
            ));
            l.push(format!(
                "return <- [{{for item in batch.{}; [[{} {}]]}}]",
                self.batch_attr(),
                self.boost_type(),
                members.join(", ")
            ));
        });
        Ok(())
    }

    fn emit_dtor(&self, lines: &mut Lines, dtor: &Lifecycle) -> Result<()> {
        let dtor_args = |owner: &str, item: &str| {
            let mut primary = false;
            dtor.params
                .iter()
                .map(|p| match &p.kind {
                    ParamKind::Handle { vk } if vk == &self.name && !primary => {
                        primary = true;
                        item.to_string()
                    }
                    ParamKind::Handle { .. } => format!("{owner}._{}", p.boost_name()),
                    _ => "null".to_string(),
                })
                .join(", ")
        };

        let attr = self.attr();
        let single = format!("{}({})", dtor.name, dtor_args(&attr, &format!("{attr}.{attr}")));
        lines.block(format!("def destroy(var {attr} : {})", self.boost_type()), |l| {
            l.block(format!("if {attr}.{OWNED_FLAG}"), |l| l.push(&single));
            l.push(format!("{attr}.{OWNED_FLAG} = false"));
        });

        if self.has_batch() {
            let batched = format!("{}({})", dtor.name, dtor_args("batch", "item"));
            lines.blank();
            lines.block(format!("def destroy(var batch : {})", self.batch_type()), |l| {
                l.block(format!("if batch.{OWNED_FLAG}"), |l| {
                    l.block(format!("for item in batch.{}", self.batch_attr()), |l| {
                        l.push(&batched);
                    });
                });
                l.push(format!("batch.{OWNED_FLAG} = false"));
                l.push(format!("delete batch.{}", self.batch_attr()));
            });
        }
        Ok(())
    }
}

fn is_handle_ptr_of(param: &Param, name: &str) -> bool {
    matches!(&param.kind, ParamKind::HandlePtr { vk } if vk == name)
}

/// The `(uint32_t *count, Handle *items)` pair of an enumeration function
fn infer_enumeration(name: &str, function: &Function, header: &Header) -> Result<ArrayDecl> {
    let kinds = function
        .params
        .iter()
        .map(|p| classify(&p.name, &p.c_type, header))
        .collect::<Result<Vec<_>>>()?;
    let items = kinds
        .iter()
        .rposition(|k| matches!(k, ParamKind::HandlePtr { vk } if vk == name));
    match items {
        Some(i) if i > 0 && kinds[i - 1] == ParamKind::ScalarPtr(ScalarType::Uint32) => Ok(
            ArrayDecl::new(&function.params[i - 1].name, &function.params[i].name),
        ),
        _ => Err(Error::declaration(
            &function.name,
            format!("no count and `{name}` items parameter pair to enumerate"),
        )),
    }
}
