//! Naming rules shared by the validator and the generator.
//!
//! Descriptors use the native spelling of things (PascalCase types and
//! functions, camelCase members). Generated Rust uses snake_case for members,
//! parameters and module names and keeps type and function names as written.

/// Converts a camelCase or PascalCase identifier to snake_case.
///
/// An underscore is inserted before an uppercase letter that follows a
/// lowercase letter or digit, and before the last capital of an acronym that
/// is followed by a lowercase letter (`sType` → `s_type`, `HTTPServer` →
/// `http_server`, `deviceID` → `device_id`).
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower);
            if boundary && prev != '_' {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type", "unsafe", "use",
    "where", "while", "yield", "abstract", "become", "do", "final", "macro", "override", "priv",
    "typeof", "unsized", "virtual",
];

/// Makes `name` usable as a Rust identifier.
pub fn rust_ident(name: &str) -> String {
    match name {
        // Cannot be raw identifiers.
        "self" | "Self" | "super" | "crate" | "_" => format!("{name}_"),
        _ if KEYWORDS.contains(&name) => format!("r#{name}"),
        _ => name.to_string(),
    }
}

/// snake_case field or parameter name for a native member name.
pub fn member_ident(name: &str) -> String {
    rust_ident(&snake_case(name))
}

/// Generated module name for an extension: `VK_KHR_surface` → `khr_surface`.
pub fn module_name(extension: &str, extension_prefix: &str) -> String {
    let stripped = extension.strip_prefix(extension_prefix).unwrap_or(extension);
    rust_ident(&stripped.to_ascii_lowercase())
}

/// Wrapper type name for an extension: `VK_KHR_surface` → `KhrSurfaceLoader`.
pub fn loader_name(extension: &str, extension_prefix: &str) -> String {
    let stripped = extension.strip_prefix(extension_prefix).unwrap_or(extension);
    let mut out = String::new();
    for part in stripped.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }
    out.push_str("Loader");
    out
}

/// Exported symbol for a function: `CreateInstance` → `vkCreateInstance`.
pub fn symbol_name(function: &str, symbol_prefix: &str) -> String {
    format!("{symbol_prefix}{function}")
}

/// Native function-pointer type of a command: `PFN_vkCreateInstance`.
pub fn command_pfn_name(function: &str, symbol_prefix: &str) -> String {
    format!("PFN_{}", symbol_name(function, symbol_prefix))
}

/// Native spelling of a declared type.
///
/// Types get the native prefix (`Instance` → `VkInstance`); function pointer
/// typedefs keep their `PFN_` marker in front (`PFN_DebugReportCallbackEXT` →
/// `PFN_vkDebugReportCallbackEXT`).
pub fn native_type_name(name: &str, native_type_prefix: &str, symbol_prefix: &str) -> String {
    match name.strip_prefix("PFN_") {
        Some(rest) => format!("PFN_{symbol_prefix}{rest}"),
        None => format!("{native_type_prefix}{name}"),
    }
}
