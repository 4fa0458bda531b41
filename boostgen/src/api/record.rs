use serde::{Deserialize, Serialize};

/// One entity of the parsed C header, as emitted by the AST provider.
///
/// Records are stored one per line in a JSON-lines file. Which of the optional members
/// are meaningful depends on [`RecordKind`]:
///
/// - `struct`: `fields` in declaration order
/// - `enum`: `values` (enumerator names)
/// - `opaque`: nothing beyond the name (`VkDevice_T`)
/// - `function`: `params` and `type` of the form `<ReturnType> (<params>)`
/// - `typedef`: `type` is the aliased C type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<CField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<CField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub c_type: String,
    #[serde(default)]
    pub source_location: SourceLocation,
}

/// A named, typed member: struct field or function parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CField {
    pub name: String,
    #[serde(rename = "type")]
    pub c_type: String,
}

impl CField {
    pub fn new(name: impl Into<String>, c_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            c_type: c_type.into(),
        }
    }
}

/// Source location information for tracking where a header entity was declared
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// The header file path
    pub file: String,
    /// The line number where the entity starts (1-based)
    pub line: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The kind of header record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A struct definition with named fields
    Struct,
    /// An enum with its enumerator names
    Enum,
    /// A struct which is only forward-declared, e.g. `VkDevice_T`
    Opaque,
    /// A function prototype
    Function,
    /// A type alias
    Typedef,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Struct => write!(f, "struct"),
            RecordKind::Enum => write!(f, "enum"),
            RecordKind::Opaque => write!(f, "opaque struct"),
            RecordKind::Function => write!(f, "function"),
            RecordKind::Typedef => write!(f, "typedef"),
        }
    }
}

impl Record {
    pub fn new(kind: RecordKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            fields: Vec::new(),
            params: Vec::new(),
            values: Vec::new(),
            c_type: String::new(),
            source_location: SourceLocation::default(),
        }
    }

    pub fn structure<'a>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut record = Self::new(RecordKind::Struct, name);
        record.fields = fields
            .into_iter()
            .map(|(name, c_type)| CField::new(name, c_type))
            .collect();
        record
    }

    pub fn enumeration<'a>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut record = Self::new(RecordKind::Enum, name);
        record.values = values.into_iter().map(str::to_string).collect();
        record
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self::new(RecordKind::Opaque, name)
    }

    pub fn function<'a>(
        name: impl Into<String>,
        c_type: impl Into<String>,
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut record = Self::new(RecordKind::Function, name);
        record.c_type = c_type.into();
        record.params = params
            .into_iter()
            .map(|(name, c_type)| CField::new(name, c_type))
            .collect();
        record
    }

    pub fn typedef(name: impl Into<String>, c_type: impl Into<String>) -> Self {
        let mut record = Self::new(RecordKind::Typedef, name);
        record.c_type = c_type.into();
        record
    }

    /// Serialize this record to a JSON-lines compatible string.
    pub fn to_jsonl_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
