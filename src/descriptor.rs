//! Read-only declaration model and descriptor-set loading.
//!
//! A descriptor set is the raw, file-grouped form handed over by the schema
//! provider. [`SchemaGraph::new`] stamps it into flat [`Declaration`] records
//! with computed fully-qualified names, source file paths, and top-level
//! flags, and rejects inconsistent input up front.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SpliceError;

/// Separator between package segments and nested declaration names.
pub const PACKAGE_SEPARATOR: char = '.';

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Raw serialized descriptor set: a collection of file descriptors.
pub struct DescriptorSet {
    /// File descriptors in provider order.
    pub files: Vec<FileDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One source file worth of declarations, as supplied by the schema provider.
pub struct FileDescriptor {
    /// Source file path (for example `acme/order_events.proto`).
    pub path: String,
    /// Package shared by every declaration in the file; may be empty.
    #[serde(default)]
    pub package: String,
    /// Top-level message declarations in declaration order.
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
    /// File-level option bag (name to raw value).
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Raw message declaration before full-name stamping.
pub struct MessageDescriptor {
    /// Simple name, unique among siblings.
    pub name: String,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Nested message declarations.
    #[serde(default)]
    pub nested: Vec<MessageDescriptor>,
    /// Message-level option bag (name to raw value).
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One field of a declaration.
pub struct FieldDescriptor {
    /// Simple field name.
    pub name: String,
    /// Value kind tag.
    #[serde(default)]
    pub kind: ValueKind,
    /// Fully-qualified name of the referenced declaration for
    /// message/enum-kinded fields.
    #[serde(default)]
    pub type_name: Option<String>,
    /// Field-level option bag (name to raw value).
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Value kind tag carried by every field.
pub enum ValueKind {
    /// Plain scalar value (numbers, strings, booleans, bytes).
    #[default]
    Scalar,
    /// Enum value; `type_name` names the enum declaration.
    Enum,
    /// Singular message value; `type_name` names the message declaration.
    Message,
    /// Repeated value of any element kind.
    Repeated,
    /// Map value.
    Map,
}

#[derive(Debug, Clone)]
/// One stamped declaration: immutable for the duration of a resolution run.
pub struct Declaration {
    /// Simple name (`Inner` for `pkg.Outer.Inner`).
    pub name: String,
    /// Fully-qualified name (`pkg.Outer.Inner`).
    pub full_name: String,
    /// Package of the containing file; may be empty.
    pub package: String,
    /// Path of the containing source file.
    pub file_path: String,
    /// Whether the declaration is top-level in its file (not nested).
    pub top_level: bool,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Declaration-level option bag.
    pub options: BTreeMap<String, String>,
}

impl Declaration {
    /// Looks up a direct field by simple name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the raw value of a declaration-level option, if present.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Simple name of the outermost declaration this one is generated into.
    ///
    /// Nested declarations share the generated-source file of their
    /// outermost enclosing type.
    pub fn outermost_name(&self) -> &str {
        let local = if self.package.is_empty() {
            self.full_name.as_str()
        } else {
            &self.full_name[self.package.len() + 1..]
        };
        local
            .split(PACKAGE_SEPARATOR)
            .next()
            .unwrap_or(local)
    }
}

#[derive(Debug, Clone)]
/// File entry retained for file-level option lookups.
pub struct FileDecl {
    /// Source file path.
    pub path: String,
    /// File package; may be empty.
    pub package: String,
    /// File-level option bag.
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
/// Indexed, immutable schema graph built from a [`DescriptorSet`].
pub struct SchemaGraph {
    files: Vec<FileDecl>,
    declarations: Vec<Declaration>,
    index: BTreeMap<String, usize>,
}

impl SchemaGraph {
    /// Stamps a raw descriptor set into an indexed graph.
    ///
    /// Computes fully-qualified names from each file's package and the
    /// nesting chain, stamps file paths and top-level flags, and rejects
    /// blank names and duplicate fully-qualified names.
    pub fn new(set: DescriptorSet) -> Result<Self, SpliceError> {
        let mut files = Vec::new();
        let mut declarations = Vec::new();
        let mut index = BTreeMap::new();

        for file in set.files {
            if file.path.trim().is_empty() {
                return Err(SpliceError::SchemaError(
                    "file descriptor with empty path".to_string(),
                ));
            }
            for message in &file.messages {
                stamp_declaration(
                    message,
                    &file.package,
                    &file.package,
                    &file.path,
                    true,
                    &mut declarations,
                    &mut index,
                )?;
            }
            files.push(FileDecl {
                path: file.path,
                package: file.package,
                options: file.options,
            });
        }

        Ok(Self {
            files,
            declarations,
            index,
        })
    }

    /// Loads a graph from a JSON-serialized descriptor set.
    pub fn from_json(input: &str) -> Result<Self, SpliceError> {
        let set: DescriptorSet = serde_json::from_str(input)
            .map_err(|e| SpliceError::SchemaError(format!("invalid descriptor set: {e}")))?;
        Self::new(set)
    }

    /// All declarations in file order, outer declarations before nested ones.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Looks up a declaration by fully-qualified name.
    pub fn find(&self, full_name: &str) -> Option<&Declaration> {
        self.index
            .get(full_name)
            .map(|&idx| &self.declarations[idx])
    }

    /// Returns the raw value of a file-level option, if present.
    pub fn file_option(&self, path: &str, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .and_then(|f| f.options.get(name))
            .map(String::as_str)
    }

    /// File entries in provider order.
    pub fn files(&self) -> &[FileDecl] {
        &self.files
    }
}

fn stamp_declaration(
    message: &MessageDescriptor,
    prefix: &str,
    package: &str,
    file_path: &str,
    top_level: bool,
    out: &mut Vec<Declaration>,
    index: &mut BTreeMap<String, usize>,
) -> Result<(), SpliceError> {
    if message.name.trim().is_empty() {
        return Err(SpliceError::SchemaError(format!(
            "declaration with empty name in file '{file_path}'"
        )));
    }

    let full_name = if prefix.is_empty() {
        message.name.clone()
    } else {
        format!("{prefix}{PACKAGE_SEPARATOR}{}", message.name)
    };

    if index.contains_key(&full_name) {
        return Err(SpliceError::SchemaError(format!(
            "duplicate declaration '{full_name}' in file '{file_path}'"
        )));
    }

    index.insert(full_name.clone(), out.len());
    out.push(Declaration {
        name: message.name.clone(),
        full_name: full_name.clone(),
        package: package.to_string(),
        file_path: file_path.to_string(),
        top_level,
        fields: message.fields.clone(),
        options: message.options.clone(),
    });

    for nested in &message.nested {
        stamp_declaration(nested, &full_name, package, file_path, false, out, index)?;
    }

    Ok(())
}
