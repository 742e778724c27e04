use std::collections::HashSet;

use vkbind_desc::{
    names, BaseTypeDescriptor, BitmaskDescriptor, EnumDescriptor, ExtensionDescriptor,
    FunctionPointerDescriptor, HandleDescriptor, StructDescriptor,
};

use super::rust_type::{return_suffix, rust_type};
use super::Emitter;
use crate::writer::SourceWriter;

/// An `i32` literal, written in hex for flags. Values with the sign bit set
/// are spelled through `u32` so the literal never overflows.
fn flag_literal(value: i64) -> String {
    let raw = value as u32;
    if raw & 0x8000_0000 != 0 {
        format!("{raw:#x}u32 as i32")
    } else {
        format!("{raw:#x}")
    }
}

impl Emitter<'_> {
    pub(super) fn constants(&self, w: &mut SourceWriter, ext: &ExtensionDescriptor) {
        if ext.constants.is_empty() {
            return;
        }
        w.blank();
        for c in &ext.constants {
            w.line(format!("pub const {}: {} = {};", c.name, rust_type(&c.ty), c.value));
        }
    }

    pub(super) fn base_type(&self, w: &mut SourceWriter, b: &BaseTypeDescriptor) {
        w.blank();
        w.line(format!("pub type {} = {};", b.name, rust_type(&b.ty)));
    }

    // ── Enums ─────────────────────────────────────────────────────────────

    pub(super) fn enumeration(&self, w: &mut SourceWriter, e: &EnumDescriptor) {
        let name = &e.name;
        w.blank();
        w.line("#[repr(transparent)]");
        w.line("#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, ::bytemuck::Pod, ::bytemuck::Zeroable)]");
        w.line(format!("pub struct {name}(i32);"));
        w.blank();

        w.open(format!("impl {name} {{"));
        for v in &e.values {
            w.line(format!("pub const {}: Self = Self({});", v.name, v.value));
        }
        w.blank();
        w.line("#[inline]");
        w.line("pub const fn from_raw(value: i32) -> Self { Self(value) }");
        w.blank();
        w.line("#[inline]");
        w.line("pub const fn as_raw(self) -> i32 { self.0 }");
        w.close("}");
        w.blank();

        // Debug prints the first name declared for each value.
        let extra = self.extension_values.get(name.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        let all = e.values.iter().map(|v| (v.name.as_str(), v.value)).chain(extra.iter().copied());
        let mut seen = HashSet::new();

        w.open(format!("impl ::core::fmt::Debug for {name} {{"));
        w.open("fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {");
        w.open("let name = match self.0 {");
        for (value_name, value) in all {
            if seen.insert(value) {
                w.line(format!("{value} => \"{value_name}\","));
            }
        }
        w.line(format!("other => return f.write_fmt(format_args!(\"{name}({{}})\", other)),"));
        w.close("};");
        w.line("f.write_str(name)");
        w.close("}");
        w.close("}");
    }

    pub(super) fn enum_extensions(&self, w: &mut SourceWriter, ext: &ExtensionDescriptor) {
        let Some(number) = ext.number else { return };
        let mut seen = HashSet::new();
        let extended = ext.enum_extensions.iter().map(|x| x.extends.as_str()).filter(|t| seen.insert(*t));

        for target in extended.collect::<Vec<_>>() {
            w.blank();
            w.open(format!("impl {target} {{"));
            for x in ext.enum_extensions.iter().filter(|x| x.extends == target) {
                w.line(format!("pub const {}: Self = Self::from_raw({});", x.name, x.value(number)));
            }
            w.close("}");
        }
    }

    // ── Bitmasks ──────────────────────────────────────────────────────────

    pub(super) fn bitmask(&self, w: &mut SourceWriter, b: &BitmaskDescriptor) {
        let name = &b.name;
        let rt = self.rt();
        let masked = format!("{rt}::bitmask::Masked<{name}>");
        let bound = format!("{rt}::bitmask::IntoBitmask<{name}>");

        let named: Vec<(&str, String)> = b
            .bits
            .iter()
            .map(|bit| (bit.name.as_str(), flag_literal(1i64 << bit.bit)))
            .chain(b.values.iter().map(|v| (v.name.as_str(), flag_literal(v.value))))
            .collect();

        w.blank();
        w.line("#[repr(transparent)]");
        w.line("#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, ::bytemuck::Pod, ::bytemuck::Zeroable)]");
        w.line(format!("pub struct {name}(i32);"));
        w.blank();

        w.open(format!("impl {name} {{"));
        for (flag, literal) in &named {
            w.line(format!("pub const {flag}: Self = Self({literal});"));
        }
        w.blank();
        w.line("#[inline]");
        w.line("pub const fn empty() -> Self { Self(0) }");
        w.blank();
        w.line("#[inline]");
        w.line("pub const fn from_raw(value: i32) -> Self { Self(value) }");
        w.blank();
        w.line("#[inline]");
        w.line("pub const fn as_raw(self) -> i32 { self.0 }");
        w.blank();
        w.line("#[inline]");
        w.line("pub const fn is_empty(self) -> bool { self.0 == 0 }");
        w.blank();
        w.line("/// Every bit of `other` is set in `self`.");
        w.line("#[inline]");
        w.line("pub const fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }");
        w.close("}");
        w.blank();

        w.open(format!("impl {rt}::bitmask::Bitmask for {name} {{"));
        w.line("#[inline]");
        w.line("fn bits(self) -> i32 { self.0 }");
        w.line("#[inline]");
        w.line("fn from_bits(bits: i32) -> Self { Self(bits) }");
        w.close("}");

        for (op, method, func) in [("BitOr", "bitor", "or"), ("BitAnd", "bitand", "and"), ("BitXor", "bitxor", "xor")] {
            w.blank();
            w.open(format!("impl<R: {bound}> ::core::ops::{op}<R> for {name} {{"));
            w.line(format!("type Output = {masked};"));
            w.line("#[inline]");
            w.line(format!("fn {method}(self, rhs: R) -> {masked} {{ {rt}::bitmask::{func}(self, rhs) }}"));
            w.close("}");
            w.blank();
            w.open(format!("impl<R: {bound}> ::core::ops::{op}Assign<R> for {name} {{"));
            w.line("#[inline]");
            w.line(format!(
                "fn {method}_assign(&mut self, rhs: R) {{ *self = {rt}::bitmask::{func}(*self, rhs).get(); }}"
            ));
            w.close("}");
        }

        w.blank();
        w.open(format!("impl ::core::ops::Not for {name} {{"));
        w.line(format!("type Output = {masked};"));
        w.line("#[inline]");
        w.line(format!("fn not(self) -> {masked} {{ {rt}::bitmask::not(self) }}"));
        w.close("}");
        w.blank();
        w.open(format!("impl ::core::convert::From<{masked}> for {name} {{"));
        w.line("#[inline]");
        w.line(format!("fn from(value: {masked}) -> Self {{ value.get() }}"));
        w.close("}");
        w.blank();
        w.open(format!("impl ::core::cmp::PartialEq<{masked}> for {name} {{"));
        w.line(format!("fn eq(&self, other: &{masked}) -> bool {{ *self == other.get() }}"));
        w.close("}");
        w.blank();

        let names_table: Vec<String> = named.iter().map(|(n, l)| format!("(\"{n}\", {l})")).collect();
        w.open(format!("impl ::core::fmt::Debug for {name} {{"));
        w.open("fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {");
        w.line(format!("{rt}::bitmask::fmt_bits(f, self.0, &[{}])", names_table.join(", ")));
        w.close("}");
        w.close("}");
    }

    // ── Handles ───────────────────────────────────────────────────────────

    pub(super) fn handle(&self, w: &mut SourceWriter, h: &HandleDescriptor) {
        let name = &h.name;
        w.blank();
        match &h.parent {
            Some(parent) => w.line(format!("/// Handle owned by [`{parent}`].")),
            None => w.line("/// Root handle."),
        }
        w.line("#[repr(transparent)]");

        if h.dispatchable {
            w.line("#[derive(Copy, Clone, PartialEq, Eq, Hash)]");
            w.line(format!("pub struct {name}(*mut ::core::ffi::c_void);"));
            w.blank();
            w.open(format!("impl {name} {{"));
            w.line("#[inline]");
            w.line("pub const fn null() -> Self { Self(::core::ptr::null_mut()) }");
            w.line("#[inline]");
            w.line("pub fn is_null(self) -> bool { self.0.is_null() }");
            w.line("#[inline]");
            w.line("pub const fn from_raw(raw: *mut ::core::ffi::c_void) -> Self { Self(raw) }");
            w.line("#[inline]");
            w.line("pub const fn as_raw(self) -> *mut ::core::ffi::c_void { self.0 }");
            w.close("}");
            w.blank();
            w.line(format!("unsafe impl ::core::marker::Send for {name} {{}}"));
            w.line(format!("unsafe impl ::core::marker::Sync for {name} {{}}"));
            w.blank();
            w.open(format!("impl ::core::default::Default for {name} {{"));
            w.line("fn default() -> Self { Self::null() }");
            w.close("}");
            w.blank();
            w.open(format!("impl ::core::fmt::Debug for {name} {{"));
            w.open("fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {");
            w.line(format!("f.write_fmt(format_args!(\"{name}({{:p}})\", self.0))"));
            w.close("}");
            w.close("}");
        } else {
            w.line("#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, ::bytemuck::Pod, ::bytemuck::Zeroable)]");
            w.line(format!("pub struct {name}(u64);"));
            w.blank();
            w.open(format!("impl {name} {{"));
            w.line("#[inline]");
            w.line("pub const fn null() -> Self { Self(0) }");
            w.line("#[inline]");
            w.line("pub const fn is_null(self) -> bool { self.0 == 0 }");
            w.line("#[inline]");
            w.line("pub const fn from_raw(raw: u64) -> Self { Self(raw) }");
            w.line("#[inline]");
            w.line("pub const fn as_raw(self) -> u64 { self.0 }");
            w.close("}");
            w.blank();
            w.open(format!("impl ::core::fmt::Debug for {name} {{"));
            w.open("fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {");
            w.line(format!("f.write_fmt(format_args!(\"{name}({{:#x}})\", self.0))"));
            w.close("}");
            w.close("}");
        }
    }

    pub(super) fn function_pointer(&self, w: &mut SourceWriter, f: &FunctionPointerDescriptor) {
        let params: Vec<String> = f
            .params
            .iter()
            .map(|p| format!("{}: {}", names::member_ident(&p.name), rust_type(&p.ty)))
            .collect();
        w.blank();
        w.line(format!(
            "pub type {} = ::core::option::Option<unsafe extern \"system\" fn({}){}>;",
            f.name,
            params.join(", "),
            return_suffix(&f.return_type)
        ));
    }

    // ── Structs ───────────────────────────────────────────────────────────

    pub(super) fn structure(&self, w: &mut SourceWriter, s: &StructDescriptor) {
        let name = &s.name;
        let keyword = if s.union { "union" } else { "struct" };

        w.blank();
        w.line("#[repr(C)]");
        if s.union {
            w.line("#[derive(Copy, Clone)]");
        } else {
            w.line("#[derive(Copy, Clone, Debug)]");
        }
        w.open(format!("pub {keyword} {name} {{"));
        for m in &s.members {
            match &m.len {
                Some(len) => w.line(format!("/// Length in `{}`.", names::member_ident(len))),
                None if m.optional => w.line("/// Optional."),
                None => {}
            }
            w.line(format!("pub {}: {},", names::member_ident(&m.name), rust_type(&m.ty)));
        }
        w.close("}");
        w.blank();

        w.line(format!("unsafe impl ::bytemuck::Zeroable for {name} {{}}"));
        w.blank();

        w.open(format!("impl ::core::default::Default for {name} {{"));
        w.open("fn default() -> Self {");
        match &s.structure_type {
            Some(value) => {
                let member = names::member_ident(&self.config.structure_type_member);
                let enum_name = &self.config.structure_type_enum;
                w.line(format!("Self {{ {member}: {enum_name}::{value}, ..::bytemuck::Zeroable::zeroed() }}"));
            }
            None => w.line("::bytemuck::Zeroable::zeroed()"),
        }
        w.close("}");
        w.close("}");

        if s.union {
            w.blank();
            w.open(format!("impl ::core::fmt::Debug for {name} {{"));
            w.open("fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {");
            w.line(format!("f.write_str(\"{name} {{ .. }}\")"));
            w.close("}");
            w.close("}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::generate;
    use super::super::tests::generated;
    use super::*;
    use crate::config::GenConfig;
    use vkbind_desc::{parse_descriptor, DescriptorSet};

    #[test]
    fn flag_literals_avoid_overflow() {
        assert_eq!(flag_literal(1), "0x1");
        assert_eq!(flag_literal(1 << 31), "0x80000000u32 as i32");
        assert_eq!(flag_literal(0xFFFF_FFFF), "0xffffffffu32 as i32");
    }

    #[test]
    fn enums_are_transparent_newtypes() {
        let out = generated();
        assert!(out.contains("pub struct Result(i32);"));
        assert!(out.contains("pub const ERROR_EXTENSION_NOT_PRESENT: Self = Self(-7);"));
        assert!(out.contains("pub const fn from_raw(value: i32) -> Self { Self(value) }"));
    }

    #[test]
    fn enum_debug_includes_extension_values() {
        let out = generated();
        assert!(out.contains("-1000000000 => \"ERROR_SURFACE_LOST_KHR\","));
        assert!(out.contains("pub const ERROR_SURFACE_LOST_KHR: Self = Self::from_raw(-1000000000);"));
    }

    #[test]
    fn enum_debug_skips_aliased_values() {
        let src = r#"
            name = "vulkan"
            [[enums]]
            name = "PresentModeKHR"
            values = [{ name = "FIFO", value = 2 }, { name = "FIFO_ALIAS", value = 2 }]
        "#;
        let mut set = DescriptorSet::new();
        set.insert(parse_descriptor(src, "alias").unwrap()).unwrap();
        let out = generate(&set, &GenConfig::default()).unwrap();

        let arms: Vec<&str> = out.lines().map(str::trim).filter(|l| l.starts_with("2 => ")).collect();
        assert_eq!(arms, ["2 => \"FIFO\","]);
        assert!(out.contains("pub const FIFO_ALIAS: Self = Self(2);"));
    }

    #[test]
    fn bitmask_operators_delegate_to_runtime() {
        let out = generated();
        assert!(out.contains("pub const COMPUTE: Self = Self(0x2);"));
        assert!(out.contains("pub const FRONT_AND_BACK: Self = Self(0x3);"));
        assert!(out.contains(
            "impl<R: ::vkbind_core::bitmask::IntoBitmask<QueueFlags>> ::core::ops::BitOr<R> for QueueFlags {"
        ));
        assert!(out.contains("fn bitor(self, rhs: R) -> ::vkbind_core::bitmask::Masked<QueueFlags> { ::vkbind_core::bitmask::or(self, rhs) }"));
        assert!(out.contains("impl ::core::ops::Not for QueueFlags {"));
    }

    #[test]
    fn handles_match_their_dispatch_kind() {
        let out = generated();
        assert!(out.contains("pub struct Instance(*mut ::core::ffi::c_void);"));
        assert!(out.contains("pub struct Fence(u64);"));
        assert!(out.contains("/// Handle owned by [`Instance`]."));
    }

    #[test]
    fn structs_get_snake_case_fields_and_tagged_defaults() {
        let out = generated();
        assert!(out.contains("pub pp_enabled_extension_names: *const *const ::core::ffi::c_char,"));
        assert!(out.contains("/// Length in `enabled_extension_count`."));
        assert!(out.contains(
            "Self { s_type: StructureType::INSTANCE_CREATE_INFO, ..::bytemuck::Zeroable::zeroed() }"
        ));
        assert!(out.contains("pub extension_name: [::core::ffi::c_char; MAX_EXTENSION_NAME_SIZE as usize],"));
    }

    #[test]
    fn unions_get_a_manual_debug() {
        let out = generated();
        assert!(out.contains("pub union ClearColorValue {"));
        assert!(out.contains("f.write_str(\"ClearColorValue { .. }\")"));
    }

    #[test]
    fn callbacks_are_optional_system_fns() {
        let out = generated();
        assert!(out.contains("pub type PFN_VoidFunction = ::core::option::Option<unsafe extern \"system\" fn()>;"));
    }
}
