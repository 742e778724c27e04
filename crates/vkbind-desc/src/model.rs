//! Serde model of an extension descriptor document.
//!
//! Every collection is optional in the TOML source and defaults to empty.
//! Type references are parsed into [`TypeExpr`] during deserialization, so a
//! malformed type surfaces as a load error rather than later in generation.

use serde::Deserialize;

use crate::types::TypeExpr;

/// One API extension (or the core API itself).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionDescriptor {
    /// Native extension name, e.g. `VK_KHR_surface`. The core API uses a
    /// plain name such as `vulkan`.
    pub name: String,
    /// Registry number, required when `enum_extensions` is non-empty.
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub required_extensions: Vec<String>,
    #[serde(default)]
    pub required_headers: Vec<String>,
    #[serde(default)]
    pub constants: Vec<ConstantDescriptor>,
    #[serde(default)]
    pub base_types: Vec<BaseTypeDescriptor>,
    #[serde(default)]
    pub enums: Vec<EnumDescriptor>,
    #[serde(default)]
    pub bitmasks: Vec<BitmaskDescriptor>,
    #[serde(default)]
    pub handles: Vec<HandleDescriptor>,
    #[serde(default)]
    pub function_pointers: Vec<FunctionPointerDescriptor>,
    #[serde(default)]
    pub structs: Vec<StructDescriptor>,
    #[serde(default)]
    pub enum_extensions: Vec<EnumExtensionDescriptor>,
    #[serde(default)]
    pub functions: Vec<FunctionDescriptor>,
}

impl ExtensionDescriptor {
    /// Names of every type this descriptor declares, with their kind.
    pub fn declared_types(&self) -> impl Iterator<Item = (&str, TypeKind)> {
        let base = self.base_types.iter().map(|t| (t.name.as_str(), TypeKind::BaseAlias));
        let enums = self.enums.iter().map(|t| (t.name.as_str(), TypeKind::Enum));
        let bitmasks = self.bitmasks.iter().map(|t| (t.name.as_str(), TypeKind::Bitmask));
        let handles = self.handles.iter().map(|t| {
            let kind = if t.dispatchable {
                TypeKind::DispatchableHandle
            } else {
                TypeKind::NonDispatchableHandle
            };
            (t.name.as_str(), kind)
        });
        let fnptrs = self
            .function_pointers
            .iter()
            .map(|t| (t.name.as_str(), TypeKind::FunctionPointer));
        let structs = self.structs.iter().map(|t| {
            let kind = if t.union { TypeKind::Union } else { TypeKind::Struct };
            (t.name.as_str(), kind)
        });

        base.chain(enums)
            .chain(bitmasks)
            .chain(handles)
            .chain(fnptrs)
            .chain(structs)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Functions of one classification, in declaration order.
    pub fn functions_in(&self, scope: FunctionScope) -> impl Iterator<Item = &FunctionDescriptor> {
        self.functions.iter().filter(move |f| f.scope == scope)
    }
}

/// Category of a declared type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TypeKind {
    BaseAlias,
    Enum,
    Bitmask,
    DispatchableHandle,
    NonDispatchableHandle,
    FunctionPointer,
    Struct,
    Union,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstantDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub value: i64,
}

/// `typedef <primitive> <name>;`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaseTypeDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDescriptor {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BitmaskDescriptor {
    pub name: String,
    /// Single-bit flags.
    #[serde(default)]
    pub bits: Vec<BitmaskBit>,
    /// Pre-combined named values (e.g. `FRONT_AND_BACK = 3`).
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BitmaskBit {
    pub name: String,
    pub bit: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandleDescriptor {
    pub name: String,
    /// `true` for pointer-identity handles, `false` for 64-bit tokens.
    pub dispatchable: bool,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionPointerDescriptor {
    pub name: String,
    #[serde(default = "void_type")]
    pub return_type: TypeExpr,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructDescriptor {
    pub name: String,
    #[serde(default)]
    pub union: bool,
    /// Value of the structure-type enum this struct is tagged with.
    #[serde(default)]
    pub structure_type: Option<String>,
    pub members: Vec<ParamDescriptor>,
}

/// A struct member or a function parameter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDescriptor {
    /// Native (camelCase) name.
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// Name of the sibling that holds this array's element count.
    #[serde(default)]
    pub len: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

/// A value added to an enum declared elsewhere.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumExtensionDescriptor {
    pub extends: String,
    pub name: String,
    pub offset: u32,
    #[serde(default)]
    pub negative: bool,
}

impl EnumExtensionDescriptor {
    /// `±(1_000_000_000 + (number - 1) * 1000 + offset)`.
    pub fn value(&self, extension_number: u32) -> i64 {
        let magnitude = 1_000_000_000i64
            + (i64::from(extension_number) - 1) * 1000
            + i64::from(self.offset);
        if self.negative { -magnitude } else { magnitude }
    }
}

/// Resolution scope of a function.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionScope {
    /// Resolvable before any context exists.
    Global,
    /// Resolvable once a context handle is bound.
    #[default]
    Context,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionDescriptor {
    /// PascalCase name without the API prefix, e.g. `CreateInstance`.
    pub name: String,
    #[serde(default)]
    pub scope: FunctionScope,
    #[serde(default = "void_type")]
    pub return_type: TypeExpr,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
}

fn void_type() -> TypeExpr {
    TypeExpr::Void
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_enum_values_follow_registry_formula() {
        let ext = EnumExtensionDescriptor {
            extends: "Result".into(),
            name: "ERROR_SURFACE_LOST_KHR".into(),
            offset: 0,
            negative: true,
        };
        assert_eq!(ext.value(1), -1_000_000_000);

        let ext = EnumExtensionDescriptor {
            extends: "StructureType".into(),
            name: "DEBUG_REPORT_CALLBACK_CREATE_INFO_EXT".into(),
            offset: 0,
            negative: false,
        };
        assert_eq!(ext.value(12), 1_000_011_000);
    }

    #[test]
    fn scope_defaults_to_context() {
        let f: FunctionDescriptor = toml::from_str(r#"name = "DestroyInstance""#).unwrap();
        assert_eq!(f.scope, FunctionScope::Context);
        assert!(f.return_type.is_void());
    }

    #[test]
    fn type_strings_deserialize_parsed() {
        let src = r#"
            name = "EnumeratePhysicalDevices"
            return_type = "Result"
            params = [
                { name = "instance", type = "Instance" },
                { name = "count", type = "*mut u32" },
            ]
        "#;
        let f: FunctionDescriptor = toml::from_str(src).unwrap();
        assert_eq!(f.return_type, TypeExpr::Named("Result".into()));
        assert_eq!(f.params[1].ty, TypeExpr::MutPtr(Box::new(TypeExpr::Primitive(crate::Primitive::U32))));
    }
}
