//! Source emission.
//!
//! The output is one Rust file holding a module per extension, in dependency
//! order. Each module imports the modules of its transitive dependencies and
//! is re-exported flat from the parent, so the file is meant to be
//! `include!`d inside a module of its own.

mod abi;
mod loader;
mod rust_type;
mod types;

use std::collections::HashMap;

use vkbind_desc::{names, DescriptorError, DescriptorSet, ExtensionDescriptor};

use crate::config::GenConfig;
use crate::writer::SourceWriter;

/// Validates `set` and renders the bindings for every extension in it.
pub fn generate(set: &DescriptorSet, config: &GenConfig) -> Result<String, DescriptorError> {
    set.validate(&config.validation_rules())?;
    let order = set.generation_order()?;
    let emitter = Emitter::new(config, &order);

    let mut w = SourceWriter::new();
    w.line("// @generated by vkbind-gen. Do not edit.");
    let listed: Vec<&str> = order.iter().map(|e| e.name.as_str()).collect();
    w.line(format!("// Extensions: {}", listed.join(", ")));

    for ext in &order {
        let deps = set.dependencies(&ext.name)?;
        w.blank();
        emitter.module(&mut w, ext, &deps);
        log::debug!(
            "generated {} ({} functions, {} dependencies)",
            ext.name,
            ext.functions.len(),
            deps.len()
        );
    }

    Ok(w.finish())
}

pub(crate) struct Emitter<'a> {
    config: &'a GenConfig,
    /// Extension values per extended enum, across the whole set.
    extension_values: HashMap<&'a str, Vec<(&'a str, i64)>>,
}

impl<'a> Emitter<'a> {
    fn new(config: &'a GenConfig, order: &[&'a ExtensionDescriptor]) -> Self {
        let mut extension_values: HashMap<&str, Vec<(&str, i64)>> = HashMap::new();
        for ext in order {
            // Validation guarantees a number when there are extension values.
            let Some(number) = ext.number else { continue };
            for x in &ext.enum_extensions {
                extension_values
                    .entry(x.extends.as_str())
                    .or_default()
                    .push((x.name.as_str(), x.value(number)));
            }
        }
        Self { config, extension_values }
    }

    /// Runtime support crate path, e.g. `::vkbind_core`.
    fn rt(&self) -> &str {
        &self.config.runtime_crate
    }

    /// Fully qualified native type for a declared type name.
    fn native_type(&self, name: &str) -> String {
        format!(
            "{}::{}",
            self.config.native_crate,
            names::native_type_name(name, &self.config.native_type_prefix, &self.config.symbol_prefix)
        )
    }

    fn module(&self, w: &mut SourceWriter, ext: &ExtensionDescriptor, deps: &[&ExtensionDescriptor]) {
        let module = names::module_name(&ext.name, &self.config.extension_prefix);

        match ext.number {
            Some(n) => w.line(format!("/// Bindings for `{}` (extension {n}).", ext.name)),
            None => w.line(format!("/// Bindings for `{}`.", ext.name)),
        }
        if !ext.required_headers.is_empty() {
            w.line("///");
            w.line(format!("/// Native headers: {}.", ext.required_headers.join(", ")));
        }
        w.line("#[allow(non_snake_case, non_camel_case_types, non_upper_case_globals, dead_code, clippy::all)]");
        w.open(format!("pub mod {module} {{"));

        for dep in deps {
            let dep_module = names::module_name(&dep.name, &self.config.extension_prefix);
            w.line("#[allow(unused_imports)]");
            w.line(format!("use super::{dep_module}::*;"));
        }

        self.constants(w, ext);
        for b in &ext.base_types {
            self.base_type(w, b);
        }
        for e in &ext.enums {
            self.enumeration(w, e);
        }
        for b in &ext.bitmasks {
            self.bitmask(w, b);
        }
        for h in &ext.handles {
            self.handle(w, h);
        }
        for f in &ext.function_pointers {
            self.function_pointer(w, f);
        }
        for s in &ext.structs {
            self.structure(w, s);
        }
        self.enum_extensions(w, ext);
        self.loader(w, ext);
        if self.config.abi_checks {
            self.abi_checks(w, ext);
        }

        w.close("}");
        w.line(format!("pub use self::{module}::*;"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkbind_desc::parse_descriptor;

    pub(super) const CORE: &str = r#"
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
        values = [
            { name = "SUCCESS", value = 0 },
            { name = "INCOMPLETE", value = 5 },
            { name = "ERROR_EXTENSION_NOT_PRESENT", value = -7 },
        ]

        [[enums]]
        name = "StructureType"
        values = [{ name = "APPLICATION_INFO", value = 0 }, { name = "INSTANCE_CREATE_INFO", value = 1 }]

        [[bitmasks]]
        name = "QueueFlags"
        bits = [{ name = "GRAPHICS", bit = 0 }, { name = "COMPUTE", bit = 1 }]

        [[bitmasks]]
        name = "CullModeFlags"
        bits = [{ name = "FRONT", bit = 0 }, { name = "BACK", bit = 1 }]
        values = [{ name = "NONE", value = 0 }, { name = "FRONT_AND_BACK", value = 3 }]

        [[handles]]
        name = "Instance"
        dispatchable = true

        [[handles]]
        name = "Fence"
        dispatchable = false

        [[function_pointers]]
        name = "PFN_VoidFunction"

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

        [[structs]]
        name = "ClearColorValue"
        union = true
        members = [{ name = "float32", type = "[f32; 4]" }, { name = "uint32", type = "[u32; 4]" }]

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

    pub(super) const SURFACE: &str = r#"
        name = "VK_KHR_surface"
        number = 1
        required_extensions = ["vulkan"]
        handles = [{ name = "SurfaceKHR", dispatchable = false, parent = "Instance" }]
        enum_extensions = [{ extends = "Result", name = "ERROR_SURFACE_LOST_KHR", offset = 0, negative = true }]

        [[functions]]
        name = "DestroySurfaceKHR"
        params = [{ name = "instance", type = "Instance" }, { name = "surface", type = "SurfaceKHR" }]
    "#;

    pub(super) fn sample_set() -> DescriptorSet {
        let mut set = DescriptorSet::new();
        set.insert(parse_descriptor(CORE, "vulkan").unwrap()).unwrap();
        set.insert(parse_descriptor(SURFACE, "surface").unwrap()).unwrap();
        set
    }

    pub(super) fn generated() -> String {
        generate(&sample_set(), &GenConfig::default()).unwrap()
    }

    #[test]
    fn modules_follow_dependency_order() {
        let out = generated();
        let core = out.find("pub mod vulkan {").unwrap();
        let surface = out.find("pub mod khr_surface {").unwrap();
        assert!(core < surface);
        assert!(out.contains("pub use self::vulkan::*;"));
        assert!(out.contains("/// Bindings for `VK_KHR_surface` (extension 1)."));
    }

    #[test]
    fn extension_modules_import_their_dependencies() {
        let out = generated();
        let surface = &out[out.find("pub mod khr_surface {").unwrap()..];
        assert!(surface.contains("use super::vulkan::*;"));
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(generated(), generated());
    }

    #[test]
    fn invalid_sets_do_not_generate() {
        let mut set = DescriptorSet::new();
        set.insert(parse_descriptor(SURFACE, "surface").unwrap()).unwrap();
        assert!(matches!(
            generate(&set, &GenConfig::default()),
            Err(DescriptorError::UnknownExtension { .. })
        ));
    }

    #[test]
    fn abi_checks_can_be_disabled() {
        let config = GenConfig { abi_checks: false, ..GenConfig::default() };
        let out = generate(&sample_set(), &config).unwrap();
        assert!(!out.contains("layout_matches"));
    }
}
