//! The top-level generator: declarations are sealed against a header by
//! [`GeneratorBuilder::build`], the resulting [`Generator`] emits the wrapper module.

use indexmap::{IndexMap, IndexSet};
use roxygen::roxygen;

use crate::api::decl::{FunctionDecl, HandleDecl, StructDecl};
use crate::api::filter::Filter;
use crate::api::header::Header;
use crate::codegen::gen_func::GenFunction;
use crate::codegen::gen_handle::GenHandle;
use crate::codegen::gen_struct::GenStruct;
use crate::codegen::param::Requirement;
use crate::error::{Error, Result};

/// Modules required by the generated code unless configured otherwise
pub const DEFAULT_REQUIRES: &[&str] = &["daslib/defer", "daslib/safe_addr", "vulkan"];

/// Prefix of the native lifecycle functions looked up for handles
pub const DEFAULT_FUNCTION_PREFIX: &str = "vk";

/// First line of every generated file
pub const GENERATED_MARKER: &str = "// generated by boostgen, do not edit";

/// Builder collecting the declarations of a wrapper module
///
/// # Example
///
/// ```
/// use boostgen::{FunctionDecl, Generator, HandleDecl, Header, Record, StructDecl};
///
/// let header: Header = [
///     Record::opaque("VkDevice_T"),
///     Record::structure("VkExtent2D", [("width", "uint32_t"), ("height", "uint32_t")]),
///     Record::function(
///         "vkGetRenderAreaGranularity",
///         "void (struct VkDevice_T *, struct VkExtent2D *)",
///         [("device", "struct VkDevice_T *"), ("pGranularity", "struct VkExtent2D *")],
///     ),
/// ]
/// .into_iter()
/// .collect();
///
/// let generator = Generator::builder()
///     .module("vulkan_boost")
///     .handle(HandleDecl::new("VkDevice"))
///     .structure(StructDecl::new("VkExtent2D"))
///     .function(FunctionDecl::new("vkGetRenderAreaGranularity").declare_output("pGranularity"))
///     .build(&header)
///     .unwrap();
///
/// let lines = generator.generate().unwrap();
/// assert!(lines.contains(&"def get_render_area_granularity(device : Device) : Extent2D".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct GeneratorBuilder {
    module: Option<String>,
    requires: Vec<String>,
    function_prefix: String,
    filter: Filter,
    handles: Vec<HandleDecl>,
    structs: Vec<StructDecl>,
    functions: Vec<FunctionDecl>,
}

impl Default for GeneratorBuilder {
    fn default() -> Self {
        Self {
            module: None,
            requires: DEFAULT_REQUIRES.iter().map(|r| r.to_string()).collect(),
            function_prefix: DEFAULT_FUNCTION_PREFIX.to_string(),
            filter: Filter::default(),
            handles: Vec::new(),
            structs: Vec::new(),
            functions: Vec::new(),
        }
    }
}

impl GeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the generated module
    #[roxygen]
    pub fn module<S: Into<String>>(
        mut self,
        /// Module name, emitted as `module <name>`
        name: S,
    ) -> Self {
        self.module = Some(name.into());
        self
    }

    /// Add a required module. The first call replaces the default list.
    #[roxygen]
    pub fn require<S: Into<String>>(
        mut self,
        /// Module path, e.g. `daslib/safe_addr`
        module: S,
    ) -> Self {
        if self.requires.iter().map(String::as_str).eq(DEFAULT_REQUIRES.iter().copied()) {
            self.requires.clear();
        }
        self.requires.push(module.into());
        self
    }

    /// Replace the required modules, an empty list emits no `require` lines
    pub fn requires<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = modules.into_iter().map(Into::into).collect();
        self
    }

    /// Prefix of the lifecycle functions discovered for handles
    #[roxygen]
    pub fn function_prefix<S: Into<String>>(
        mut self,
        /// Prefix, `vk` by default
        prefix: S,
    ) -> Self {
        self.function_prefix = prefix.into();
        self
    }

    /// Filter applied to the header before the declarations are sealed
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn handle(mut self, handle: HandleDecl) -> Self {
        self.handles.push(handle);
        self
    }

    pub fn structure(mut self, structure: StructDecl) -> Self {
        self.structs.push(structure);
        self
    }

    pub fn function<F: Into<FunctionDecl>>(mut self, function: F) -> Self {
        self.functions.push(function.into());
        self
    }

    /// Classify every declared unit against `header` and check that the units are
    /// consistent with each other.
    pub fn build(self, header: &Header) -> Result<Generator> {
        let header = header.filtered(&self.filter);
        check_unique("function", self.functions.iter().map(|d| d.name.as_str()))?;
        check_unique("struct", self.structs.iter().map(|d| d.name.as_str()))?;
        check_unique("handle", self.handles.iter().map(|d| d.name.as_str()))?;

        let functions = self
            .functions
            .iter()
            .map(|decl| {
                let function = header.function(&decl.name).ok_or_else(|| Error::MissingEntity {
                    kind: "function",
                    name: decl.name.clone(),
                })?;
                GenFunction::new(function, decl, &header)
            })
            .collect::<Result<Vec<_>>>()?;
        let structs = self
            .structs
            .iter()
            .map(|decl| GenStruct::new(decl, &header))
            .collect::<Result<Vec<_>>>()?;
        let claimed = self.functions.iter().map(|d| d.name.as_str()).collect::<Vec<_>>();
        let handles = self
            .handles
            .iter()
            .map(|decl| GenHandle::new(decl, &header, &self.function_prefix, &claimed))
            .collect::<Result<Vec<_>>>()?;

        let generator = Generator {
            module: self.module,
            requires: self.requires,
            functions,
            structs,
            handles,
        };
        generator.check_definitions()?;
        generator.check_requirements()?;
        log::debug!(
            "sealed {} functions, {} structs, {} handles",
            generator.functions.len(),
            generator.structs.len(),
            generator.handles.len()
        );
        Ok(generator)
    }
}

fn check_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = IndexSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::declaration(name, format!("{kind} declared twice")));
        }
    }
    Ok(())
}

/// Sealed, immutable set of generation units
#[derive(Debug, Clone)]
pub struct Generator {
    module: Option<String>,
    requires: Vec<String>,
    functions: Vec<GenFunction>,
    structs: Vec<GenStruct>,
    handles: Vec<GenHandle>,
}

impl Generator {
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::new()
    }

    pub fn functions(&self) -> &[GenFunction] {
        &self.functions
    }

    pub fn structs(&self) -> &[GenStruct] {
        &self.structs
    }

    pub fn handles(&self) -> &[GenHandle] {
        &self.handles
    }

    /// Every emitted wrapper must be distinguishable by name and parameter types
    fn check_definitions(&self) -> Result<()> {
        let mut units = Vec::new();
        for function in &self.functions {
            units.push((function.name(), function.definitions()?));
        }
        for structure in &self.structs {
            units.push((structure.name(), structure.definitions()));
        }
        for handle in &self.handles {
            units.push((handle.name(), handle.definitions()?));
        }
        let mut defined: IndexMap<String, &str> = IndexMap::new();
        for (unit, keys) in units {
            for key in keys {
                if let Some(other) = defined.insert(key.clone(), unit) {
                    return Err(Error::declaration(
                        unit,
                        format!("wrapper `{key}` is also generated for `{other}`"),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_requirements(&self) -> Result<()> {
        let structs: IndexMap<&str, &GenStruct> =
            self.structs.iter().map(|s| (s.name(), s)).collect();
        let handles: IndexSet<&str> = self.handles.iter().map(GenHandle::name).collect();
        let units = self
            .functions
            .iter()
            .map(|f| (f.name(), f.requirements()))
            .chain(self.structs.iter().map(|s| (s.name(), s.requirements())))
            .chain(self.handles.iter().map(|h| (h.name(), h.requirements())));
        for (unit, requirements) in units {
            for requirement in requirements {
                let missing = |dependency: &str, reason: &str| Error::MissingDependency {
                    unit: unit.to_string(),
                    dependency: dependency.to_string(),
                    reason: reason.to_string(),
                };
                match &requirement {
                    Requirement::View(name) => match structs.get(name.as_str()) {
                        Some(s) if s.has_boost_to_vk() => {}
                        Some(_) => return Err(missing(name, "struct is generated without boost_to_vk")),
                        None => return Err(missing(name, "struct is not declared")),
                    },
                    Requirement::ToBoost(name) => match structs.get(name.as_str()) {
                        Some(s) if s.has_vk_to_boost() => {}
                        Some(_) => return Err(missing(name, "struct is generated without vk_to_boost")),
                        None => return Err(missing(name, "struct is not declared")),
                    },
                    Requirement::Handle(name) => {
                        if !handles.contains(name.as_str()) {
                            return Err(missing(name, "handle is not declared"));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Options, module name and requires
    pub fn preamble(&self) -> Vec<String> {
        let mut lines = vec![
            GENERATED_MARKER.to_string(),
            String::new(),
            "options indenting = 4".to_string(),
            "options no_aot = true".to_string(),
            String::new(),
        ];
        if let Some(module) = &self.module {
            lines.push(format!("module {module}"));
            lines.push(String::new());
        }
        lines.extend(self.requires.iter().map(|r| format!("require {r}")));
        lines
    }

    /// The wrapper module: preamble, then all functions, structs and handles, each unit
    /// preceded by a blank line
    pub fn generate(&self) -> Result<Vec<String>> {
        let mut lines = self.preamble();
        let units = self
            .functions
            .iter()
            .map(GenFunction::generate)
            .chain(self.structs.iter().map(GenStruct::generate))
            .chain(self.handles.iter().map(GenHandle::generate));
        for unit in units {
            lines.push(String::new());
            lines.extend(unit?);
        }
        log::info!(
            "generated {} functions, {} structs, {} handles ({} lines)",
            self.functions.len(),
            self.structs.len(),
            self.handles.len(),
            lines.len()
        );
        Ok(lines)
    }
}
