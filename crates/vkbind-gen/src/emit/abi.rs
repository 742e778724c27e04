use vkbind_desc::{names, ExtensionDescriptor};

use super::Emitter;
use crate::writer::SourceWriter;

impl Emitter<'_> {
    /// Compile-time proof that every typed declaration has the layout of its
    /// native counterpart.
    ///
    /// Size and alignment are compared for every type and field offsets for
    /// every struct. Union members all sit at offset zero, so unions only get
    /// the size check. Base aliases must name the very same type.
    pub(super) fn abi_checks(&self, w: &mut SourceWriter, ext: &ExtensionDescriptor) {
        let rt = self.rt();
        let mut layout_types: Vec<&str> = Vec::new();
        layout_types.extend(ext.enums.iter().map(|e| e.name.as_str()));
        layout_types.extend(ext.bitmasks.iter().map(|b| b.name.as_str()));
        layout_types.extend(ext.handles.iter().map(|h| h.name.as_str()));
        layout_types.extend(ext.function_pointers.iter().map(|f| f.name.as_str()));
        layout_types.extend(ext.structs.iter().map(|s| s.name.as_str()));

        let has_offsets = ext.structs.iter().any(|s| !s.union);
        if layout_types.is_empty() && ext.base_types.is_empty() {
            return;
        }

        w.blank();
        if !layout_types.is_empty() {
            w.open("const _: () = {");
            w.line(format!("use {rt}::abi::layout_matches;"));
            for name in &layout_types {
                let native = self.native_type(name);
                w.line(format!(
                    "assert!(layout_matches::<{name}, {native}>(), \"{name} does not match the native layout\");"
                ));
            }

            if has_offsets {
                w.blank();
                w.line("use ::core::mem::offset_of;");
                for s in ext.structs.iter().filter(|s| !s.union) {
                    let native = self.native_type(&s.name);
                    for m in &s.members {
                        let field = names::member_ident(&m.name);
                        let native_field = names::rust_ident(&m.name);
                        w.line(format!(
                            "assert!(offset_of!({}, {field}) == offset_of!({native}, {native_field}), \"{}.{} is misplaced\");",
                            s.name, s.name, m.name
                        ));
                    }
                }
            }
            w.close("};");
        }

        if !ext.base_types.is_empty() {
            w.blank();
            w.open("const _: fn() = || {");
            for b in &ext.base_types {
                let native = self.native_type(&b.name);
                w.line(format!(
                    "let _: ::core::marker::PhantomData<{}> = ::core::marker::PhantomData::<{native}>;",
                    b.name
                ));
            }
            w.close("};");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::generated;

    #[test]
    fn every_type_gets_a_layout_assertion() {
        let out = generated();
        for (typed, native) in [
            ("Result", "VkResult"),
            ("QueueFlags", "VkQueueFlags"),
            ("Instance", "VkInstance"),
            ("Fence", "VkFence"),
            ("InstanceCreateInfo", "VkInstanceCreateInfo"),
            ("ClearColorValue", "VkClearColorValue"),
            ("SurfaceKHR", "VkSurfaceKHR"),
        ] {
            let line = format!("assert!(layout_matches::<{typed}, ::vkbind_sys::{native}>()");
            assert!(out.contains(&line), "missing {line}");
        }
        assert!(out.contains("assert!(layout_matches::<PFN_VoidFunction, ::vkbind_sys::PFN_vkVoidFunction>()"));
    }

    #[test]
    fn struct_fields_compare_offsets_against_native_names() {
        let out = generated();
        assert!(out.contains(
            "assert!(offset_of!(InstanceCreateInfo, pp_enabled_extension_names) == offset_of!(::vkbind_sys::VkInstanceCreateInfo, ppEnabledExtensionNames), \"InstanceCreateInfo.ppEnabledExtensionNames is misplaced\");"
        ));
        assert!(!out.contains("offset_of!(ClearColorValue"));
    }

    #[test]
    fn base_aliases_must_be_identical() {
        let out = generated();
        assert!(out.contains(
            "let _: ::core::marker::PhantomData<Bool32> = ::core::marker::PhantomData::<::vkbind_sys::VkBool32>;"
        ));
    }
}
