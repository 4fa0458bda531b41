//! The parsed C header: the read-only context every classification is made against.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};

use crate::api::filter::Filter;
use crate::api::record::{CField, Record, RecordKind};
use crate::error::{Error, Result};
use crate::utils::jsonl::read_jsonl_file;

/// A C function prototype from the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    /// Full signature, `<ReturnType> (<params>)`
    pub c_type: String,
    pub params: Vec<CField>,
}

impl Function {
    /// The return type part of the signature, e.g. `VkResult`
    pub fn return_type(&self) -> Result<&str> {
        let invalid = || Error::InvalidSignature {
            function: self.name.clone(),
            signature: self.c_type.clone(),
        };
        let open = self.c_type.find('(').ok_or_else(invalid)?;
        if !self.c_type.trim_end().ends_with(')') {
            return Err(invalid());
        }
        let return_type = self.c_type[..open].trim();
        if return_type.is_empty() {
            return Err(invalid());
        }
        Ok(return_type)
    }

    pub fn param(&self, name: &str) -> Option<&CField> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Name-keyed tables of the entities found in a C header.
///
/// All tables keep the order in which the entities were declared.
///
/// # Example
///
/// ```
/// use boostgen::{Header, Record};
///
/// let header: Header = [
///     Record::opaque("VkDevice_T"),
///     Record::structure("VkExtent2D", [("width", "uint32_t"), ("height", "uint32_t")]),
/// ]
/// .into_iter()
/// .collect();
///
/// assert!(header.is_opaque_struct("VkDevice_T"));
/// assert_eq!(header.struct_fields("VkExtent2D").unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Header {
    enums: IndexMap<String, Vec<String>>,
    structs: IndexMap<String, Vec<CField>>,
    opaque_structs: IndexSet<String>,
    functions: IndexMap<String, Function>,
    typedefs: IndexMap<String, String>,
}

impl FromIterator<Record> for Header {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        let mut header = Header::default();
        for record in iter {
            header.insert(record);
        }
        header
    }
}

impl Header {
    /// Read a header dump in JSON-lines format
    pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Self> {
        let records = read_jsonl_file(&path)?;
        log::debug!(
            "read {} header records from {}",
            records.len(),
            path.as_ref().display()
        );
        Ok(records.into_iter().collect())
    }

    /// Add a record; a record with an already known name replaces the previous one
    pub fn insert(&mut self, record: Record) {
        let Record {
            kind,
            name,
            fields,
            params,
            values,
            c_type,
            source_location,
        } = record;
        let replaced = match kind {
            RecordKind::Struct => self.structs.insert(name.clone(), fields).is_some(),
            RecordKind::Enum => self.enums.insert(name.clone(), values).is_some(),
            RecordKind::Opaque => !self.opaque_structs.insert(name.clone()),
            RecordKind::Function => {
                let function = Function {
                    name: name.clone(),
                    c_type,
                    params,
                };
                self.functions.insert(name.clone(), function).is_some()
            }
            RecordKind::Typedef => self.typedefs.insert(name.clone(), c_type).is_some(),
        };
        if replaced {
            log::debug!("{kind} `{name}` redeclared at {source_location}, keeping the last one");
        }
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn is_struct(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    pub fn is_opaque_struct(&self, name: &str) -> bool {
        self.opaque_structs.contains(name)
    }

    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    pub fn struct_fields(&self, name: &str) -> Option<&[CField]> {
        self.structs.get(name).map(Vec::as_slice)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    pub fn typedef(&self, name: &str) -> Option<&str> {
        self.typedefs.get(name).map(String::as_str)
    }

    /// True if `name` is directly known to the classifier, so it must not be
    /// resolved through the typedef table.
    pub(crate) fn is_known_type(&self, name: &str) -> bool {
        self.is_enum(name) || self.is_struct(name) || self.is_opaque_struct(name)
    }

    /// A copy of the header with the functions and struct fields rejected by `filter`
    /// removed.
    pub fn filtered(&self, filter: &Filter) -> Header {
        let functions = self
            .functions
            .iter()
            .filter(|(name, function)| {
                let allowed = filter.is_function_allowed(name, &function.c_type);
                if !allowed {
                    log::trace!("function `{name}` filtered out");
                }
                allowed
            })
            .map(|(name, function)| (name.clone(), function.clone()))
            .collect();
        let structs = self
            .structs
            .iter()
            .map(|(name, fields)| {
                let fields = fields
                    .iter()
                    .filter(|field| filter.is_field_allowed(name, &field.name))
                    .cloned()
                    .collect();
                (name.clone(), fields)
            })
            .collect();
        Header {
            enums: self.enums.clone(),
            structs,
            opaque_structs: self.opaque_structs.clone(),
            functions,
            typedefs: self.typedefs.clone(),
        }
    }
}
