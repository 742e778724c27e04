use vkbind_desc::{ArrayLen, TypeExpr};

/// Spelling of a descriptor type inside a generated module.
///
/// Declared names resolve through the module's own items and its `use`
/// imports, so they are emitted bare.
pub fn rust_type(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Void => "::core::ffi::c_void".to_string(),
        TypeExpr::Primitive(p) => p.rust_name().to_string(),
        TypeExpr::Named(name) => name.clone(),
        TypeExpr::ConstPtr(inner) => format!("*const {}", rust_type(inner)),
        TypeExpr::MutPtr(inner) => format!("*mut {}", rust_type(inner)),
        TypeExpr::Array(inner, ArrayLen::Literal(n)) => format!("[{}; {n}]", rust_type(inner)),
        TypeExpr::Array(inner, ArrayLen::Constant(c)) => {
            format!("[{}; {c} as usize]", rust_type(inner))
        }
    }
}

/// ` -> T` for a return type, empty for `void`.
pub fn return_suffix(ty: &TypeExpr) -> String {
    if ty.is_void() {
        String::new()
    } else {
        format!(" -> {}", rust_type(ty))
    }
}
