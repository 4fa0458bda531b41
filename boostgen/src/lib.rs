//! # boostgen
//!
//! Generates daScript "boost" bindings for a C API (Vulkan) from the parsed AST of its
//! header.
//!
//! ## Problem
//!
//! A raw binding of a C API exposes native structs with pointer and count fields,
//! opaque handles, `sType` / `pNext` extension chains and the two-call idiom for
//! queries of unknown size. Writing idiomatic wrappers for all of that by hand is
//! repetitive and easy to get wrong, especially the lifetime of the temporary native
//! representations passed into each call.
//!
//! ## Solution
//!
//! `boostgen` classifies every struct field and function parameter into a semantic
//! kind (handle, struct, string, array items with their count, ...) and synthesizes:
//!
//! - wrapper structs with `vk_value_to_boost` and scoped `vk_view_create_unsafe` /
//!   `vk_view_destroy` conversions,
//! - handle wrappers with constructors, ownership-gated destructors and batched
//!   enumeration,
//! - wrapper functions which marshal arguments, run the size-query pass when needed
//!   and check the native status.
//!
//! ## Usage example
//!
//! The header is read from a JSON-lines dump, one [`Record`] per line. What to generate
//! is declared with the [`GeneratorBuilder`] API or a TOML [`BindingConfig`]:
//!
//! ```rust,no_run
//! use boostgen::{BindingConfig, Destination, Header};
//!
//! fn main() -> boostgen::Result<()> {
//!     let header = Header::read_jsonl("vulkan_core.jsonl")?;
//!     let generator = BindingConfig::from_file("vulkan_boost.toml")?
//!         .into_generator_builder()
//!         .build(&header)?;
//!     let destination: Destination = generator.generate()?.into_iter().collect();
//!     destination.write("vulkan_boost.das")?;
//!     Ok(())
//! }
//! ```
//!
//! Declaring the same thing in code:
//!
//! ```rust,no_run
//! use boostgen::{ArrayDecl, Filter, FunctionDecl, Generator, HandleDecl, StructDecl};
//!
//! let builder = Generator::builder()
//!     .module("vulkan_boost")
//!     .filter(Filter::builder().ignore_function_suffix("KHR").build())
//!     .handle(HandleDecl::new("VkInstance"))
//!     .handle(HandleDecl::new("VkPhysicalDevice"))
//!     .structure(
//!         StructDecl::new("VkDeviceQueueCreateInfo")
//!             .vk_to_boost(false)
//!             .declare_array("queueCount", "pQueuePriorities"),
//!     )
//!     .structure(
//!         StructDecl::new("VkShaderModuleCreateInfo")
//!             .vk_to_boost(false)
//!             .array(ArrayDecl::new("codeSize", "pCode").force_item_type(boostgen::ScalarType::Uint8)),
//!     )
//!     .function(FunctionDecl::new("vkGetPhysicalDeviceProperties").declare_output("pProperties"));
//! ```

pub(crate) mod api;
pub(crate) mod codegen;
pub(crate) mod utils;

pub mod error;

pub use crate::api::config::BindingConfig;
pub use crate::api::decl::{ArrayDecl, FunctionDecl, HandleDecl, StructDecl};
pub use crate::api::destination::Destination;
pub use crate::api::filter::{Builder as FilterBuilder, Filter};
pub use crate::api::generator::{
    Generator, GeneratorBuilder, DEFAULT_FUNCTION_PREFIX, DEFAULT_REQUIRES, GENERATED_MARKER,
};
pub use crate::api::header::{Function, Header};
pub use crate::api::record::{CField, Record, RecordKind, SourceLocation};
pub use crate::codegen::c_type::CType;
pub use crate::codegen::classify::{classify, ParamKind, ScalarType};
pub use crate::codegen::gen_func::GenFunction;
pub use crate::codegen::gen_handle::GenHandle;
pub use crate::codegen::gen_struct::GenStruct;
pub use crate::codegen::names::{camel_to_snake, wrapper_name};
pub use crate::codegen::param::{ArrayRole, Convert, Param, Requirement};
pub use crate::error::{Error, Result};
pub use crate::utils::jsonl::{read_jsonl_file, write_jsonl_file};
