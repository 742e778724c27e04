use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::DescriptorError;
use crate::model::{ExtensionDescriptor, TypeKind};

/// Parses one descriptor document. `origin` names the source in errors.
pub fn parse_descriptor(src: &str, origin: &str) -> Result<ExtensionDescriptor, DescriptorError> {
    toml::from_str(src).map_err(|source| DescriptorError::Parse { origin: origin.to_string(), source })
}

/// All descriptors taking part in one generation run, keyed by extension name.
#[derive(Debug, Default, Clone)]
pub struct DescriptorSet {
    extensions: BTreeMap<String, ExtensionDescriptor>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.toml` file directly inside `dir`, in file-name order.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let dir = dir.as_ref();
        let io_err = |source| DescriptorError::Io { path: dir.to_path_buf(), source };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut set = Self::new();
        for path in paths {
            set.load_file(&path)?;
        }
        log::debug!("loaded {} descriptors from {}", set.len(), dir.display());
        Ok(set)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), DescriptorError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path)
            .map_err(|source| DescriptorError::Io { path: path.to_path_buf(), source })?;
        let descriptor = parse_descriptor(&src, &path.display().to_string())?;
        log::trace!("parsed {} from {}", descriptor.name, path.display());
        self.insert(descriptor)
    }

    pub fn insert(&mut self, descriptor: ExtensionDescriptor) -> Result<(), DescriptorError> {
        if self.extensions.contains_key(&descriptor.name) {
            return Err(DescriptorError::DuplicateExtension(descriptor.name));
        }
        self.extensions.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionDescriptor> {
        self.extensions.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.extensions.values()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    // ── Dependency graph ──────────────────────────────────────────────────

    /// Every extension, ordered so that each one follows all of its
    /// dependencies. Ties are broken by name, so the order is stable.
    pub fn generation_order(&self) -> Result<Vec<&ExtensionDescriptor>, DescriptorError> {
        let mut marks = HashMap::new();
        let mut order = Vec::with_capacity(self.extensions.len());
        for name in self.extensions.keys() {
            self.visit(name, &mut marks, &mut Vec::new(), &mut order)?;
        }
        Ok(order)
    }

    /// Transitive dependencies of `name` in generation order, excluding
    /// `name` itself.
    pub fn dependencies(&self, name: &str) -> Result<Vec<&ExtensionDescriptor>, DescriptorError> {
        let Some((key, _)) = self.extensions.get_key_value(name) else {
            return Err(DescriptorError::UnknownExtension {
                extension: name.to_string(),
                required: name.to_string(),
            });
        };
        let mut marks = HashMap::new();
        let mut order = Vec::new();
        self.visit(key, &mut marks, &mut Vec::new(), &mut order)?;
        order.pop();
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        order: &mut Vec<&'a ExtensionDescriptor>,
    ) -> Result<(), DescriptorError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Active) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut path: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
                path.push(name.to_string());
                return Err(DescriptorError::Cycle { path });
            }
            None => {}
        }

        let Some(descriptor) = self.extensions.get(name) else {
            let extension = stack.last().copied().unwrap_or(name);
            return Err(DescriptorError::UnknownExtension {
                extension: extension.to_string(),
                required: name.to_string(),
            });
        };

        marks.insert(name, Mark::Active);
        stack.push(name);
        let mut required: Vec<&str> = descriptor.required_extensions.iter().map(String::as_str).collect();
        required.sort_unstable();
        for dep in required {
            self.visit(dep, marks, stack, order)?;
        }
        stack.pop();
        marks.insert(name, Mark::Done);
        order.push(descriptor);
        Ok(())
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    /// Kind of a declared type, searched across the whole set.
    pub fn type_kind(&self, name: &str) -> Option<TypeKind> {
        self.iter()
            .flat_map(|e| e.declared_types())
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| kind)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Mark {
    Active,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext(name: &str, requires: &[&str]) -> ExtensionDescriptor {
        let deps = requires.iter().map(|r| format!("\"{r}\"")).collect::<Vec<_>>().join(", ");
        parse_descriptor(&format!("name = \"{name}\"\nrequired_extensions = [{deps}]\n"), name).unwrap()
    }

    fn set_of(exts: Vec<ExtensionDescriptor>) -> DescriptorSet {
        let mut set = DescriptorSet::new();
        for e in exts {
            set.insert(e).unwrap();
        }
        set
    }

    fn names(v: &[&ExtensionDescriptor]) -> Vec<String> {
        v.iter().map(|e| e.name.clone()).collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn dependencies_come_first() {
        let set = set_of(vec![
            ext("VK_KHR_swapchain", &["VK_KHR_surface", "vulkan"]),
            ext("VK_KHR_surface", &["vulkan"]),
            ext("vulkan", &[]),
        ]);
        let order = set.generation_order().unwrap();
        assert_eq!(names(&order), ["vulkan", "VK_KHR_surface", "VK_KHR_swapchain"]);
    }

    #[test]
    fn dependencies_are_transitive() {
        let set = set_of(vec![
            ext("VK_KHR_swapchain", &["VK_KHR_surface"]),
            ext("VK_KHR_surface", &["vulkan"]),
            ext("vulkan", &[]),
        ]);
        let deps = set.dependencies("VK_KHR_swapchain").unwrap();
        assert_eq!(names(&deps), ["vulkan", "VK_KHR_surface"]);
        assert!(set.dependencies("vulkan").unwrap().is_empty());
    }

    #[test]
    fn cycles_are_reported_with_their_path() {
        let set = set_of(vec![ext("a", &["b"]), ext("b", &["c"]), ext("c", &["a"])]);
        match set.generation_order() {
            Err(DescriptorError::Cycle { path }) => assert_eq!(path, ["a", "b", "c", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn unknown_dependency_names_the_requirer() {
        let set = set_of(vec![ext("VK_KHR_surface", &["vulkan"])]);
        match set.generation_order() {
            Err(DescriptorError::UnknownExtension { extension, required }) => {
                assert_eq!(extension, "VK_KHR_surface");
                assert_eq!(required, "vulkan");
            }
            other => panic!("expected unknown extension, got {other:?}"),
        }
    }

    // ── loading ───────────────────────────────────────────────────────────

    #[test]
    fn duplicate_extension_is_rejected() {
        let mut set = set_of(vec![ext("vulkan", &[])]);
        assert!(matches!(set.insert(ext("vulkan", &[])), Err(DescriptorError::DuplicateExtension(_))));
    }

    #[test]
    fn load_dir_reads_only_toml_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vulkan.toml"), "name = \"vulkan\"\n").unwrap();
        fs::write(
            dir.path().join("khr_surface.toml"),
            "name = \"VK_KHR_surface\"\nnumber = 1\nrequired_extensions = [\"vulkan\"]\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "not a descriptor").unwrap();

        let set = DescriptorSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("VK_KHR_surface").and_then(|e| e.number), Some(1));
    }

    #[test]
    fn unknown_fields_are_parse_errors() {
        let err = parse_descriptor("name = \"vulkan\"\nfuncs = []\n", "inline").unwrap_err();
        assert!(matches!(err, DescriptorError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid descriptor inline"));
    }

    #[test]
    fn bad_type_syntax_is_a_parse_error() {
        let src = r#"
            name = "vulkan"
            [[functions]]
            name = "Broken"
            return_type = "Result*"
        "#;
        let err = parse_descriptor(src, "inline").unwrap_err();
        assert!(matches!(err, DescriptorError::Parse { .. }));
        let message = err.to_string();
        assert!(message.contains("invalid type `Result*`: unrecognized type syntax"), "{message}");
    }

    #[test]
    fn bad_array_length_names_the_length() {
        let src = r#"
            name = "vulkan"
            [[structs]]
            name = "Broken"
            members = [{ name = "data", type = "[u8; 4x]" }]
        "#;
        let message = parse_descriptor(src, "inline").unwrap_err().to_string();
        assert!(message.contains("invalid array length `4x`"), "{message}");
    }
}
