use std::fmt;
use std::path::PathBuf;

use crate::model::FunctionScope;

/// Errors raised while loading or validating extension descriptors.
///
/// Every variant is an authoring error: the descriptor set cannot be turned
/// into bindings until it is fixed.
#[derive(Debug)]
pub enum DescriptorError {
    /// A descriptor file could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// A descriptor document is not valid TOML or does not match the schema.
    Parse { origin: String, source: toml::de::Error },
    /// `required_extensions` names an extension that is not in the set.
    UnknownExtension { extension: String, required: String },
    /// Two descriptors share the same extension name.
    DuplicateExtension(String),
    /// The dependency graph contains a cycle. `path` starts and ends with the
    /// same extension.
    Cycle { path: Vec<String> },
    /// A type reference does not resolve in the extension or its dependencies.
    UnresolvedType { extension: String, context: String, name: String },
    /// An array length names a constant that is not visible.
    UnresolvedConstant { extension: String, context: String, name: String },
    /// The same name is declared twice where it must be unique.
    DuplicateDeclaration { extension: String, name: String },
    /// A function's `scope` disagrees with the configured global allow-list.
    ScopeMismatch { extension: String, function: String, declared: FunctionScope },
    /// A `len` link that does not name a sibling member or parameter.
    InvalidLength { extension: String, context: String, len: String },
    /// A value that does not fit its declared representation.
    InvalidValue { extension: String, context: String, message: String },
    /// `enum_extensions` is used without an extension `number`.
    MissingExtensionNumber(String),
    /// An enum value reference (extension target or structure type) that
    /// does not exist.
    UnknownEnumValue { extension: String, enum_name: String, value: String },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read descriptor {}: {source}", path.display())
            }
            Self::Parse { origin, source } => write!(f, "invalid descriptor {origin}: {source}"),
            Self::UnknownExtension { extension, required } => {
                write!(f, "{extension}: required extension `{required}` is not declared")
            }
            Self::DuplicateExtension(name) => write!(f, "extension `{name}` is declared twice"),
            Self::Cycle { path } => {
                write!(f, "extension dependency cycle: {}", path.join(" -> "))
            }
            Self::UnresolvedType { extension, context, name } => {
                write!(f, "{extension}: {context} references unknown type `{name}`")
            }
            Self::UnresolvedConstant { extension, context, name } => {
                write!(f, "{extension}: {context} uses unknown constant `{name}`")
            }
            Self::DuplicateDeclaration { extension, name } => {
                write!(f, "{extension}: `{name}` is declared more than once")
            }
            Self::ScopeMismatch { extension, function, declared } => {
                let expected = match declared {
                    FunctionScope::Global => "context",
                    FunctionScope::Context => "global",
                };
                write!(
                    f,
                    "{extension}: function `{function}` is marked {} but the allow-list says {expected}",
                    match declared {
                        FunctionScope::Global => "global",
                        FunctionScope::Context => "context",
                    }
                )
            }
            Self::InvalidLength { extension, context, len } => {
                write!(f, "{extension}: {context} has len `{len}` which is not a sibling")
            }
            Self::InvalidValue { extension, context, message } => {
                write!(f, "{extension}: {context}: {message}")
            }
            Self::MissingExtensionNumber(name) => {
                write!(f, "{name}: enum_extensions require an extension number")
            }
            Self::UnknownEnumValue { extension, enum_name, value } => {
                write!(f, "{extension}: `{enum_name}` has no value `{value}`")
            }
        }
    }
}

impl std::error::Error for DescriptorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}
