//! Wrappers of standalone native functions.

use crate::api::decl::FunctionDecl;
use crate::api::header::{Function, Header};
use crate::codegen::call::{early_return, overload_key, signature, NativeCall, Pass, STATUS_TYPE};
use crate::codegen::classify::{classify, ParamKind};
use crate::codegen::lines::Lines;
use crate::codegen::names::{structure_type_value, wrapper_name};
use crate::codegen::param::{build_params, mark_outputs, Convert, Param, Requirement};
use crate::error::{Error, Result};

/// A sealed function unit
#[derive(Debug, Clone)]
pub struct GenFunction {
    name: String,
    params: Vec<Param>,
    returns_status: bool,
    /// Classified return value of functions not returning a status
    native_return: Option<ParamKind>,
    /// `sType` to preset in a chained output struct
    output_s_type: Option<String>,
}

/// `sType` value of a struct which carries a chain-link discriminator
pub(crate) fn chained_s_type(header: &Header, param: &Param) -> Option<String> {
    let (ParamKind::StructPtr { vk } | ParamKind::Struct { vk }) = &param.kind else {
        return None;
    };
    let fields = header.struct_fields(vk)?;
    fields
        .iter()
        .any(|f| f.name == "sType")
        .then(|| structure_type_value(vk))
}

impl GenFunction {
    pub(crate) fn new(function: &Function, decl: &FunctionDecl, header: &Header) -> Result<Self> {
        let unit = function.name.as_str();
        let mut params = build_params(unit, &function.params, &decl.arrays, header)?;
        mark_outputs(unit, &mut params, &decl.outputs)?;

        let return_type = function.return_type()?;
        let returns_status = return_type == STATUS_TYPE;
        let native_return = match return_type {
            STATUS_TYPE | "void" => None,
            other => Some(classify("return value", other, header)?),
        };

        let outputs = params.iter().filter(|p| p.is_output).count();
        if outputs + usize::from(native_return.is_some()) > 1 {
            return Err(Error::MultipleOutputs {
                function: function.name.clone(),
            });
        }
        let output_s_type = params
            .iter()
            .find(|p| p.is_output)
            .and_then(|p| chained_s_type(header, p));

        let generated = Self {
            name: function.name.clone(),
            params,
            returns_status,
            native_return,
            output_s_type,
        };
        generated.call().validate()?;
        log::debug!(
            "function `{}`: {} params, status: {}",
            generated.name,
            generated.params.len(),
            generated.returns_status
        );
        Ok(generated)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn boost_name(&self) -> String {
        wrapper_name(&self.name)
    }

    fn call(&self) -> NativeCall<'_> {
        NativeCall::new(&self.name, &self.name, &self.params, self.returns_status)
    }

    fn output(&self) -> Option<&Param> {
        self.params.iter().find(|p| p.is_output)
    }

    /// Wrapper return type, if the wrapper returns anything
    pub fn return_type(&self) -> Option<String> {
        if let Some(output) = self.output() {
            let elem = output.elem_boost_type()?;
            return Some(if output.is_items() {
                format!("array<{elem}>")
            } else {
                elem
            });
        }
        self.native_return.as_ref().and_then(|kind| kind.boost_type())
    }

    /// Overload keys of the emitted wrappers
    pub fn definitions(&self) -> Result<Vec<String>> {
        Ok(vec![overload_key(
            &self.boost_name(),
            &self.call().wrapper_params()?,
        )])
    }

    pub fn requirements(&self) -> Vec<Requirement> {
        let mut requirements = self
            .params
            .iter()
            .filter_map(|p| p.requirement(!p.is_output))
            .collect::<Vec<_>>();
        if let Some(ParamKind::Struct { vk } | ParamKind::StructPtr { vk }) = &self.native_return {
            requirements.push(Requirement::ToBoost(vk.clone()));
        }
        requirements
    }

    pub fn generate(&self) -> Result<Vec<String>> {
        let call = self.call();
        let return_type = self.return_type();
        let early = early_return(return_type.as_deref());

        let mut lines = Lines::new();
        lines.push(signature(
            &self.boost_name(),
            &call.wrapper_params()?,
            return_type.as_deref(),
        ));
        let mut body = Lines::new();
        call.emit_length_asserts(&mut body);
        call.emit_input_temporaries(&mut body)?;
        match (self.output(), &self.native_return) {
            (Some(output), _) => {
                call.emit_output(&mut body, output, self.output_s_type.as_deref(), &early)?;
                body.push(format!("return <- {}", call.output_conversion(output)?));
            }
            (None, Some(kind)) => {
                call.emit_invoke(&mut body, Pass::Fill, Some("vk_return"), &early)?;
                let conv = kind.vk_to_boost("vk_return").ok_or_else(|| {
                    Error::unsupported(&self.name, "return value has no wrapper conversion")
                })?;
                body.push(format!("return <- {conv}"));
            }
            (None, None) => {
                call.emit_invoke(&mut body, Pass::Fill, None, &early)?;
            }
        }
        lines.append_indented(body);
        Ok(lines.into_vec())
    }
}
