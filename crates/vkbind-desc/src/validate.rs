//! Load-time validation of a [`DescriptorSet`].
//!
//! Runs once before generation. The first authoring error found is returned;
//! nothing is generated from a set that fails here.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::DescriptorError;
use crate::model::{ExtensionDescriptor, FunctionScope, ParamDescriptor, TypeKind};
use crate::set::DescriptorSet;
use crate::types::TypeExpr;

/// Knobs that validation takes from the generator configuration.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    /// Functions that must be (and are the only ones) declared `global`.
    /// `None` trusts the per-function flag.
    pub global_functions: Option<BTreeSet<String>>,
    /// Member that carries the structure-type tag.
    pub structure_type_member: String,
    /// Enum whose values `structure_type` refers to.
    pub structure_type_enum: String,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            global_functions: None,
            structure_type_member: "sType".to_string(),
            structure_type_enum: "StructureType".to_string(),
        }
    }
}

impl DescriptorSet {
    pub fn validate(&self, rules: &ValidationRules) -> Result<(), DescriptorError> {
        let order = self.generation_order()?;
        check_unique_names(&order)?;

        for ext in &order {
            let deps = self.dependencies(&ext.name)?;
            let scope = Scope::new(ext, &deps);
            Checker { ext, scope: &scope, rules }.run()?;
        }

        log::debug!("validated {} descriptors", order.len());
        Ok(())
    }
}

// ── Uniqueness ────────────────────────────────────────────────────────────

fn check_unique_names(order: &[&ExtensionDescriptor]) -> Result<(), DescriptorError> {
    let mut types = HashSet::new();
    let mut constants = HashSet::new();
    let mut functions = HashSet::new();
    let mut extension_values = HashSet::new();

    for ext in order {
        let dup = |name: &str| DescriptorError::DuplicateDeclaration {
            extension: ext.name.clone(),
            name: name.to_string(),
        };
        for (name, _) in ext.declared_types() {
            if !types.insert(name) {
                return Err(dup(name));
            }
        }
        for c in &ext.constants {
            if !constants.insert(c.name.as_str()) {
                return Err(dup(&c.name));
            }
        }
        for f in &ext.functions {
            if !functions.insert(f.name.as_str()) {
                return Err(dup(&f.name));
            }
        }
        for x in &ext.enum_extensions {
            if !extension_values.insert((x.extends.as_str(), x.name.as_str())) {
                return Err(dup(&format!("{}::{}", x.extends, x.name)));
            }
        }
    }
    Ok(())
}

// ── Visibility ────────────────────────────────────────────────────────────

/// Everything one extension may refer to: its own declarations plus those
/// of its transitive dependencies.
struct Scope<'a> {
    types: HashMap<&'a str, TypeKind>,
    constants: HashSet<&'a str>,
    /// Value names declared with each enum.
    base_values: HashMap<&'a str, HashSet<&'a str>>,
    /// Base values plus extension values in scope.
    enum_values: HashMap<&'a str, HashSet<&'a str>>,
}

impl<'a> Scope<'a> {
    fn new(ext: &'a ExtensionDescriptor, deps: &[&'a ExtensionDescriptor]) -> Self {
        let mut scope = Self {
            types: HashMap::new(),
            constants: HashSet::new(),
            base_values: HashMap::new(),
            enum_values: HashMap::new(),
        };
        for e in deps.iter().copied().chain(std::iter::once(ext)) {
            scope.types.extend(e.declared_types());
            scope.constants.extend(e.constants.iter().map(|c| c.name.as_str()));
            for en in &e.enums {
                scope
                    .enum_values
                    .entry(en.name.as_str())
                    .or_default()
                    .extend(en.values.iter().map(|v| v.name.as_str()));
            }
        }
        scope.base_values = scope.enum_values.clone();
        for e in deps.iter().copied().chain(std::iter::once(ext)) {
            for x in &e.enum_extensions {
                scope.enum_values.entry(x.extends.as_str()).or_default().insert(x.name.as_str());
            }
        }
        scope
    }
}

// ── Per-extension checks ──────────────────────────────────────────────────

struct Checker<'a> {
    ext: &'a ExtensionDescriptor,
    scope: &'a Scope<'a>,
    rules: &'a ValidationRules,
}

impl Checker<'_> {
    fn run(&self) -> Result<(), DescriptorError> {
        self.check_constants()?;
        self.check_base_types()?;
        self.check_enums()?;
        self.check_bitmasks()?;
        self.check_handles()?;
        self.check_function_pointers()?;
        self.check_structs()?;
        self.check_enum_extensions()?;
        self.check_functions()
    }

    fn invalid(&self, context: impl Into<String>, message: impl Into<String>) -> DescriptorError {
        DescriptorError::InvalidValue {
            extension: self.ext.name.clone(),
            context: context.into(),
            message: message.into(),
        }
    }

    fn check_type(&self, context: &str, ty: &TypeExpr) -> Result<(), DescriptorError> {
        for name in ty.named_types() {
            if !self.scope.types.contains_key(name) {
                return Err(DescriptorError::UnresolvedType {
                    extension: self.ext.name.clone(),
                    context: context.to_string(),
                    name: name.to_string(),
                });
            }
        }
        for name in ty.length_constants() {
            if !self.scope.constants.contains(name) {
                return Err(DescriptorError::UnresolvedConstant {
                    extension: self.ext.name.clone(),
                    context: context.to_string(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Types, `len` links and name uniqueness of a member or parameter list.
    fn check_params(&self, owner: &str, params: &[ParamDescriptor]) -> Result<(), DescriptorError> {
        let mut seen = HashSet::new();
        for p in params {
            let context = format!("`{owner}.{}`", p.name);
            if !seen.insert(p.name.as_str()) {
                return Err(DescriptorError::DuplicateDeclaration {
                    extension: self.ext.name.clone(),
                    name: format!("{owner}.{}", p.name),
                });
            }
            if p.ty.is_void() {
                return Err(self.invalid(context, "members and parameters cannot be void"));
            }
            self.check_type(&context, &p.ty)?;
        }
        for p in params {
            if let Some(len) = &p.len {
                let sibling = params.iter().any(|q| q.name == *len && q.name != p.name);
                if !sibling {
                    return Err(DescriptorError::InvalidLength {
                        extension: self.ext.name.clone(),
                        context: format!("`{owner}.{}`", p.name),
                        len: len.clone(),
                    });
                }
                if !p.ty.is_pointer() {
                    return Err(self.invalid(format!("`{owner}.{}`", p.name), "len is only valid on pointers"));
                }
            }
        }
        Ok(())
    }

    fn check_constants(&self) -> Result<(), DescriptorError> {
        for c in &self.ext.constants {
            let context = format!("constant `{}`", c.name);
            let TypeExpr::Primitive(p) = c.ty else {
                return Err(self.invalid(context, "constants must have a primitive type"));
            };
            let Some((lo, hi)) = p.integer_range() else {
                return Err(self.invalid(context, "constants must be integers"));
            };
            if !(lo..=hi).contains(&i128::from(c.value)) {
                return Err(self.invalid(context, format!("{} does not fit {}", c.value, c.ty)));
            }
        }
        Ok(())
    }

    fn check_base_types(&self) -> Result<(), DescriptorError> {
        for b in &self.ext.base_types {
            if !matches!(b.ty, TypeExpr::Primitive(_)) {
                return Err(self.invalid(format!("base type `{}`", b.name), "base types alias a primitive"));
            }
        }
        Ok(())
    }

    fn check_enums(&self) -> Result<(), DescriptorError> {
        for e in &self.ext.enums {
            let mut seen = HashSet::new();
            for v in &e.values {
                if !seen.insert(v.name.as_str()) {
                    return Err(DescriptorError::DuplicateDeclaration {
                        extension: self.ext.name.clone(),
                        name: format!("{}::{}", e.name, v.name),
                    });
                }
                if i32::try_from(v.value).is_err() {
                    return Err(self.invalid(format!("`{}::{}`", e.name, v.name), "value does not fit i32"));
                }
            }
        }
        Ok(())
    }

    fn check_bitmasks(&self) -> Result<(), DescriptorError> {
        for b in &self.ext.bitmasks {
            let mut seen = HashSet::new();
            let names = b.bits.iter().map(|x| x.name.as_str()).chain(b.values.iter().map(|x| x.name.as_str()));
            for name in names {
                if !seen.insert(name) {
                    return Err(DescriptorError::DuplicateDeclaration {
                        extension: self.ext.name.clone(),
                        name: format!("{}::{name}", b.name),
                    });
                }
            }
            for bit in &b.bits {
                if bit.bit >= 32 {
                    return Err(self.invalid(format!("`{}::{}`", b.name, bit.name), "bit position must be below 32"));
                }
            }
            for v in &b.values {
                if !(i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&v.value) {
                    return Err(self.invalid(format!("`{}::{}`", b.name, v.name), "value does not fit 32 bits"));
                }
            }
        }
        Ok(())
    }

    fn check_handles(&self) -> Result<(), DescriptorError> {
        for h in &self.ext.handles {
            if let Some(parent) = &h.parent {
                let kind = self.scope.types.get(parent.as_str());
                if !matches!(kind, Some(TypeKind::DispatchableHandle | TypeKind::NonDispatchableHandle)) {
                    return Err(DescriptorError::UnresolvedType {
                        extension: self.ext.name.clone(),
                        context: format!("parent of handle `{}`", h.name),
                        name: parent.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_function_pointers(&self) -> Result<(), DescriptorError> {
        for f in &self.ext.function_pointers {
            if !f.name.starts_with("PFN_") {
                return Err(self.invalid(format!("function pointer `{}`", f.name), "name must start with PFN_"));
            }
            self.check_type(&format!("return type of `{}`", f.name), &f.return_type)?;
            self.check_params(&f.name, &f.params)?;
        }
        Ok(())
    }

    fn check_structs(&self) -> Result<(), DescriptorError> {
        for s in &self.ext.structs {
            if s.members.is_empty() {
                return Err(self.invalid(format!("struct `{}`", s.name), "at least one member is required"));
            }
            self.check_params(&s.name, &s.members)?;

            if let Some(value) = &s.structure_type {
                if s.union {
                    return Err(self.invalid(format!("union `{}`", s.name), "unions cannot carry a structure type"));
                }
                let tagged = s.members.first().is_some_and(|m| m.name == self.rules.structure_type_member);
                if !tagged {
                    return Err(self.invalid(
                        format!("struct `{}`", s.name),
                        format!("structure_type requires `{}` as the first member", self.rules.structure_type_member),
                    ));
                }
                let known = self
                    .scope
                    .enum_values
                    .get(self.rules.structure_type_enum.as_str())
                    .is_some_and(|values| values.contains(value.as_str()));
                if !known {
                    return Err(DescriptorError::UnknownEnumValue {
                        extension: self.ext.name.clone(),
                        enum_name: self.rules.structure_type_enum.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_enum_extensions(&self) -> Result<(), DescriptorError> {
        if self.ext.enum_extensions.is_empty() {
            return Ok(());
        }
        let number = self
            .ext
            .number
            .ok_or_else(|| DescriptorError::MissingExtensionNumber(self.ext.name.clone()))?;
        if number == 0 {
            return Err(self.invalid("extension number", "numbers start at 1"));
        }

        for x in &self.ext.enum_extensions {
            if self.scope.types.get(x.extends.as_str()) != Some(&TypeKind::Enum) {
                return Err(DescriptorError::UnresolvedType {
                    extension: self.ext.name.clone(),
                    context: format!("enum extension `{}`", x.name),
                    name: x.extends.clone(),
                });
            }
            let base = self.scope.base_values.get(x.extends.as_str());
            if base.is_some_and(|values| values.contains(x.name.as_str())) {
                return Err(DescriptorError::DuplicateDeclaration {
                    extension: self.ext.name.clone(),
                    name: format!("{}::{}", x.extends, x.name),
                });
            }
            if i32::try_from(x.value(number)).is_err() {
                return Err(self.invalid(format!("`{}::{}`", x.extends, x.name), "value does not fit i32"));
            }
        }
        Ok(())
    }

    fn check_functions(&self) -> Result<(), DescriptorError> {
        for f in &self.ext.functions {
            self.check_type(&format!("return type of `{}`", f.name), &f.return_type)?;
            self.check_params(&f.name, &f.params)?;

            if let Some(globals) = &self.rules.global_functions {
                let listed = globals.contains(&f.name);
                let mismatch = match f.scope {
                    FunctionScope::Global => !listed,
                    FunctionScope::Context => listed,
                };
                if mismatch {
                    return Err(DescriptorError::ScopeMismatch {
                        extension: self.ext.name.clone(),
                        function: f.name.clone(),
                        declared: f.scope,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::parse_descriptor;

    const CORE: &str = r#"
        name = "vulkan"

        [[constants]]
        name = "MAX_EXTENSION_NAME_SIZE"
        type = "u32"
        value = 256

        [[base_types]]
        name = "Bool32"
        type = "u32"

        [[enums]]
        name = "Result"
        values = [{ name = "SUCCESS", value = 0 }, { name = "ERROR_EXTENSION_NOT_PRESENT", value = -7 }]

        [[enums]]
        name = "StructureType"
        values = [{ name = "APPLICATION_INFO", value = 0 }, { name = "INSTANCE_CREATE_INFO", value = 1 }]

        [[handles]]
        name = "Instance"
        dispatchable = true

        [[structs]]
        name = "ExtensionProperties"
        members = [
            { name = "extensionName", type = "[c_char; MAX_EXTENSION_NAME_SIZE]" },
            { name = "specVersion", type = "u32" },
        ]

        [[structs]]
        name = "InstanceCreateInfo"
        structure_type = "INSTANCE_CREATE_INFO"
        members = [
            { name = "sType", type = "StructureType" },
            { name = "pNext", type = "*const c_void" },
            { name = "enabledExtensionCount", type = "u32" },
            { name = "ppEnabledExtensionNames", type = "*const *const c_char", len = "enabledExtensionCount" },
        ]

        [[functions]]
        name = "CreateInstance"
        scope = "global"
        return_type = "Result"
        params = [
            { name = "pCreateInfo", type = "*const InstanceCreateInfo" },
            { name = "pInstance", type = "*mut Instance" },
        ]

        [[functions]]
        name = "DestroyInstance"
        params = [{ name = "instance", type = "Instance" }]
    "#;

    fn set_with(extra: &[&str]) -> DescriptorSet {
        let mut set = DescriptorSet::new();
        set.insert(parse_descriptor(CORE, "core").unwrap()).unwrap();
        for (i, src) in extra.iter().enumerate() {
            set.insert(parse_descriptor(src, &format!("extra{i}")).unwrap()).unwrap();
        }
        set
    }

    fn allow_list() -> ValidationRules {
        ValidationRules {
            global_functions: Some(BTreeSet::from(["CreateInstance".to_string()])),
            ..ValidationRules::default()
        }
    }

    #[test]
    fn core_descriptor_is_valid() {
        set_with(&[]).validate(&allow_list()).unwrap();
    }

    #[test]
    fn extension_sees_types_of_required_extensions() {
        let surface = r#"
            name = "VK_KHR_surface"
            number = 1
            required_extensions = ["vulkan"]
            handles = [{ name = "SurfaceKHR", dispatchable = false, parent = "Instance" }]
            enum_extensions = [{ extends = "Result", name = "ERROR_SURFACE_LOST_KHR", offset = 0, negative = true }]

            [[functions]]
            name = "DestroySurfaceKHR"
            params = [{ name = "instance", type = "Instance" }, { name = "surface", type = "SurfaceKHR" }]
        "#;
        set_with(&[surface]).validate(&allow_list()).unwrap();
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn undeclared_dependency_types_are_unresolved() {
        let surface = r#"
            name = "VK_KHR_surface"
            [[functions]]
            name = "DestroySurfaceKHR"
            params = [{ name = "instance", type = "Instance" }]
        "#;
        let err = set_with(&[surface]).validate(&allow_list()).unwrap_err();
        match err {
            DescriptorError::UnresolvedType { extension, name, .. } => {
                assert_eq!(extension, "VK_KHR_surface");
                assert_eq!(name, "Instance");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scope_must_match_the_allow_list() {
        let ext = r#"
            name = "VK_EXT_broken"
            required_extensions = ["vulkan"]
            [[functions]]
            name = "EnumerateInstanceVersion"
            scope = "global"
            params = [{ name = "pApiVersion", type = "*mut u32" }]
        "#;
        let set = set_with(&[ext]);
        assert!(matches!(
            set.validate(&allow_list()),
            Err(DescriptorError::ScopeMismatch { declared: FunctionScope::Global, .. })
        ));
        set.validate(&ValidationRules::default()).unwrap();
    }

    #[test]
    fn len_must_name_a_sibling() {
        let ext = r#"
            name = "VK_EXT_broken"
            required_extensions = ["vulkan"]
            [[functions]]
            name = "Broken"
            params = [{ name = "pValues", type = "*const u32", len = "valueCount" }]
        "#;
        assert!(matches!(
            set_with(&[ext]).validate(&allow_list()),
            Err(DescriptorError::InvalidLength { .. })
        ));
    }

    #[test]
    fn structure_type_must_exist() {
        let ext = r#"
            name = "VK_EXT_broken"
            required_extensions = ["vulkan"]
            [[structs]]
            name = "BrokenInfo"
            structure_type = "BROKEN_INFO"
            members = [{ name = "sType", type = "StructureType" }]
        "#;
        assert!(matches!(
            set_with(&[ext]).validate(&allow_list()),
            Err(DescriptorError::UnknownEnumValue { .. })
        ));
    }

    #[test]
    fn structure_type_may_come_from_an_enum_extension() {
        let ext = r#"
            name = "VK_EXT_debug_report"
            number = 12
            required_extensions = ["vulkan"]
            enum_extensions = [{ extends = "StructureType", name = "DEBUG_REPORT_CALLBACK_CREATE_INFO_EXT", offset = 0 }]
            [[structs]]
            name = "DebugReportCallbackCreateInfoEXT"
            structure_type = "DEBUG_REPORT_CALLBACK_CREATE_INFO_EXT"
            members = [{ name = "sType", type = "StructureType" }, { name = "pNext", type = "*const c_void" }]
        "#;
        set_with(&[ext]).validate(&allow_list()).unwrap();
    }

    #[test]
    fn enum_extensions_need_a_number() {
        let ext = r#"
            name = "VK_EXT_broken"
            required_extensions = ["vulkan"]
            enum_extensions = [{ extends = "Result", name = "ERROR_BROKEN", offset = 1, negative = true }]
        "#;
        assert!(matches!(
            set_with(&[ext]).validate(&allow_list()),
            Err(DescriptorError::MissingExtensionNumber(_))
        ));
    }

    #[test]
    fn types_are_unique_across_the_set() {
        let ext = r#"
            name = "VK_EXT_broken"
            required_extensions = ["vulkan"]
            handles = [{ name = "Instance", dispatchable = true }]
        "#;
        assert!(matches!(
            set_with(&[ext]).validate(&allow_list()),
            Err(DescriptorError::DuplicateDeclaration { .. })
        ));
    }

    #[test]
    fn unknown_array_length_constant() {
        let ext = r#"
            name = "VK_EXT_broken"
            required_extensions = ["vulkan"]
            [[structs]]
            name = "Broken"
            members = [{ name = "data", type = "[u8; MAX_BROKEN_SIZE]" }]
        "#;
        assert!(matches!(
            set_with(&[ext]).validate(&allow_list()),
            Err(DescriptorError::UnresolvedConstant { .. })
        ));
    }

    #[test]
    fn enum_values_must_fit_i32() {
        let ext = r#"
            name = "VK_EXT_broken"
            [[enums]]
            name = "Broken"
            values = [{ name = "TOO_BIG", value = 4294967296 }]
        "#;
        assert!(matches!(
            set_with(&[ext]).validate(&allow_list()),
            Err(DescriptorError::InvalidValue { .. })
        ));
    }
}
