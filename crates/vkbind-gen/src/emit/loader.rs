use vkbind_desc::{names, ExtensionDescriptor, FunctionDescriptor, FunctionScope};

use super::rust_type::{return_suffix, rust_type};
use super::Emitter;
use crate::writer::SourceWriter;

fn pfn_field(function: &str) -> String {
    format!("pfn_{}", names::snake_case(function))
}

impl Emitter<'_> {
    /// The wrapper struct: one pointer per function, typed call methods and
    /// the `FunctionLoader` impl that fills the pointers in.
    pub(super) fn loader(&self, w: &mut SourceWriter, ext: &ExtensionDescriptor) {
        let loader = names::loader_name(&ext.name, &self.config.extension_prefix);
        let rt = self.rt();
        let fnptr = format!("{rt}::loader::UntypedFnptr");

        w.blank();
        w.line(format!("/// Entry points of `{}`.", ext.name));
        w.line("#[derive(Clone, Debug)]");
        if ext.functions.is_empty() {
            w.line(format!("pub struct {loader} {{}}"));
        } else {
            w.open(format!("pub struct {loader} {{"));
            for f in &ext.functions {
                w.line(format!("{}: {fnptr},", pfn_field(&f.name)));
            }
            w.close("}");
        }
        w.blank();

        w.open(format!("impl {loader} {{"));
        w.line("/// A wrapper with every pointer null.");
        w.open("pub const fn new() -> Self {");
        w.open("Self {");
        for f in &ext.functions {
            w.line(format!("{}: ::core::option::Option::None,", pfn_field(&f.name)));
        }
        w.close("}");
        w.close("}");
        for f in &ext.functions {
            self.call_method(w, f);
        }
        w.close("}");
        w.blank();

        w.open(format!("impl ::core::default::Default for {loader} {{"));
        w.line("fn default() -> Self { Self::new() }");
        w.close("}");
        w.blank();

        self.function_loader_impl(w, ext, &loader);
    }

    fn call_method(&self, w: &mut SourceWriter, f: &FunctionDescriptor) {
        let rt = self.rt();
        let symbol = names::symbol_name(&f.name, &self.config.symbol_prefix);
        let native_pfn = format!(
            "{}::{}",
            self.config.native_crate,
            names::command_pfn_name(&f.name, &self.config.symbol_prefix)
        );

        let params: Vec<(String, String)> = f
            .params
            .iter()
            .map(|p| (names::member_ident(&p.name), rust_type(&p.ty)))
            .collect();
        let signature: Vec<String> = std::iter::once("&self".to_string())
            .chain(params.iter().map(|(n, t)| format!("{n}: {t}")))
            .collect();
        let args: Vec<String> = params.iter().map(|(n, _)| format!("{rt}::abi::force_cast({n})")).collect();

        w.blank();
        w.line(format!("/// `{symbol}`"));
        w.line("///");
        w.line("/// # Safety");
        w.line("///");
        w.line("/// The pointer must be resolved and the arguments must satisfy the native");
        w.line("/// contract of the entry point.");
        w.line("#[inline]");
        w.open(format!(
            "pub unsafe fn {}({}){} {{",
            f.name,
            signature.join(", "),
            return_suffix(&f.return_type)
        ));
        w.open("unsafe {");
        w.line(format!(
            "let native_fn = {rt}::abi::cast_fnptr::<{native_pfn}>(self.{});",
            pfn_field(&f.name)
        ));
        let call = format!("native_fn({})", args.join(", "));
        if f.return_type.is_void() {
            w.line(format!("{call};"));
        } else {
            w.line(format!("{rt}::abi::force_cast({call})"));
        }
        w.close("}");
        w.close("}");
    }

    fn function_loader_impl(&self, w: &mut SourceWriter, ext: &ExtensionDescriptor, loader: &str) {
        let rt = self.rt();
        let scope_path = |scope: FunctionScope| match scope {
            FunctionScope::Global => format!("{rt}::loader::Scope::Global"),
            FunctionScope::Context => format!("{rt}::loader::Scope::Context"),
        };
        let symbol = |f: &FunctionDescriptor| names::symbol_name(&f.name, &self.config.symbol_prefix);

        w.open(format!("impl {rt}::loader::FunctionLoader for {loader} {{"));
        w.line(format!("const EXTENSION: &'static str = \"{}\";", ext.name));
        w.blank();
        w.open(format!("const FUNCTIONS: &'static [{rt}::loader::FunctionInfo] = &["));
        for f in &ext.functions {
            w.line(format!(
                "{rt}::loader::FunctionInfo {{ name: \"{}\", symbol: c\"{}\", scope: {} }},",
                f.name,
                symbol(f),
                scope_path(f.scope)
            ));
        }
        w.close("];");

        for (method, scope, lookup) in [
            ("load_global_functions", FunctionScope::Global, "global_function"),
            ("load_context_functions", FunctionScope::Context, "context_function"),
        ] {
            let functions: Vec<&FunctionDescriptor> = ext.functions_in(scope).collect();
            let source = if functions.is_empty() { "_source" } else { "source" };
            w.blank();
            w.open(format!("fn {method}(&mut self, {source}: &mut dyn {rt}::loader::FunctionSource) {{"));
            for f in functions {
                w.line(format!("self.{} = source.{lookup}(c\"{}\");", pfn_field(&f.name), symbol(f)));
            }
            w.close("}");
        }

        w.blank();
        w.open(format!("fn function_pointer(&self, name: &str) -> {rt}::loader::UntypedFnptr {{"));
        w.open("match name {");
        for f in &ext.functions {
            w.line(format!("\"{}\" => self.{},", f.name, pfn_field(&f.name)));
        }
        w.line("_ => ::core::option::Option::None,");
        w.close("}");
        w.close("}");
        w.close("}");
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::generated;

    #[test]
    fn wrapper_holds_one_pointer_per_function() {
        let out = generated();
        assert!(out.contains("pub struct VulkanLoader {"));
        assert!(out.contains("pfn_create_instance: ::vkbind_core::loader::UntypedFnptr,"));
        assert!(out.contains("pfn_destroy_instance: ::vkbind_core::loader::UntypedFnptr,"));
        assert!(out.contains("pub struct KhrSurfaceLoader {"));
    }

    #[test]
    fn methods_keep_the_descriptor_name_and_cast_through_native() {
        let out = generated();
        assert!(out.contains(
            "pub unsafe fn CreateInstance(&self, p_create_info: *const InstanceCreateInfo, p_instance: *mut Instance) -> Result {"
        ));
        assert!(out.contains(
            "let native_fn = ::vkbind_core::abi::cast_fnptr::<::vkbind_sys::PFN_vkCreateInstance>(self.pfn_create_instance);"
        ));
        assert!(out.contains(
            "::vkbind_core::abi::force_cast(native_fn(::vkbind_core::abi::force_cast(p_create_info), ::vkbind_core::abi::force_cast(p_instance)))"
        ));
    }

    #[test]
    fn void_functions_skip_the_return_cast() {
        let out = generated();
        assert!(out.contains("pub unsafe fn DestroyInstance(&self, instance: Instance) {"));
        assert!(out.contains("native_fn(::vkbind_core::abi::force_cast(instance));"));
    }

    #[test]
    fn resolution_is_split_by_scope() {
        let out = generated();
        assert!(out.contains("self.pfn_create_instance = source.global_function(c\"vkCreateInstance\");"));
        assert!(out.contains("self.pfn_destroy_instance = source.context_function(c\"vkDestroyInstance\");"));
        assert!(out.contains("fn load_global_functions(&mut self, _source: &mut dyn ::vkbind_core::loader::FunctionSource) {"));
        assert!(out.contains(
            "::vkbind_core::loader::FunctionInfo { name: \"CreateInstance\", symbol: c\"vkCreateInstance\", scope: ::vkbind_core::loader::Scope::Global },"
        ));
    }

    #[test]
    fn function_pointer_lookup_by_name() {
        let out = generated();
        assert!(out.contains("\"DestroySurfaceKHR\" => self.pfn_destroy_surface_khr,"));
        assert!(out.contains("const EXTENSION: &'static str = \"VK_KHR_surface\";"));
    }
}
