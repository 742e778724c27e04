use std::fmt;

use serde::Deserialize;

// ── Primitive ─────────────────────────────────────────────────────────────

/// Built-in scalar types a descriptor may name directly.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Usize,
    Isize,
    CChar,
    CVoid,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "f32" => Self::F32,
            "f64" => Self::F64,
            "usize" | "size_t" => Self::Usize,
            "isize" => Self::Isize,
            "c_char" | "char" => Self::CChar,
            "c_void" => Self::CVoid,
            _ => return None,
        })
    }

    /// Rust spelling, fully qualified for the FFI types.
    pub fn rust_name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Usize => "usize",
            Self::Isize => "isize",
            Self::CChar => "::core::ffi::c_char",
            Self::CVoid => "::core::ffi::c_void",
        }
    }

    /// Whether the type can carry a constant value.
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64 | Self::CVoid)
    }

    /// Inclusive value range for integer primitives.
    pub fn integer_range(self) -> Option<(i128, i128)> {
        Some(match self {
            Self::U8 => (0, u8::MAX as i128),
            Self::U16 => (0, u16::MAX as i128),
            Self::U32 => (0, u32::MAX as i128),
            Self::U64 | Self::Usize => (0, u64::MAX as i128),
            Self::I8 | Self::CChar => (i8::MIN as i128, i8::MAX as i128),
            Self::I16 => (i16::MIN as i128, i16::MAX as i128),
            Self::I32 => (i32::MIN as i128, i32::MAX as i128),
            Self::I64 | Self::Isize => (i64::MIN as i128, i64::MAX as i128),
            Self::F32 | Self::F64 | Self::CVoid => return None,
        })
    }
}

// ── Type expressions ──────────────────────────────────────────────────────

/// Length of a fixed-size array.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ArrayLen {
    Literal(usize),
    /// Name of a declared constant.
    Constant(String),
}

/// A parsed type reference as written in a descriptor.
///
/// Grammar: `void`, a primitive, a declared name, `*const T`, `*mut T`,
/// `[T; N]`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum TypeExpr {
    Void,
    Primitive(Primitive),
    Named(String),
    ConstPtr(Box<TypeExpr>),
    MutPtr(Box<TypeExpr>),
    Array(Box<TypeExpr>, ArrayLen),
}

impl TypeExpr {
    pub fn parse(src: &str) -> Result<Self, TypeExprError> {
        let s = src.trim();
        if s.is_empty() {
            return Err(TypeExprError::new(src, "empty type"));
        }

        if let Some(rest) = s.strip_prefix("*const ") {
            return Ok(Self::ConstPtr(Box::new(Self::parse(rest)?)));
        }
        if let Some(rest) = s.strip_prefix("*mut ") {
            return Ok(Self::MutPtr(Box::new(Self::parse(rest)?)));
        }

        if let Some(inner) = s.strip_prefix('[') {
            let inner = inner
                .strip_suffix(']')
                .ok_or_else(|| TypeExprError::new(src, "unterminated array type"))?;
            let (elem, len) = inner
                .rsplit_once(';')
                .ok_or_else(|| TypeExprError::new(src, "array type needs `; N`"))?;
            let elem = Self::parse(elem)?;
            if elem == Self::Void {
                return Err(TypeExprError::new(src, "array of void"));
            }
            let len = len.trim();
            let len = if let Ok(n) = len.parse::<usize>() {
                ArrayLen::Literal(n)
            } else if is_identifier(len) {
                ArrayLen::Constant(len.to_string())
            } else {
                return Err(TypeExprError::new(src, format!("invalid array length `{len}`")));
            };
            return Ok(Self::Array(Box::new(elem), len));
        }

        if s == "void" {
            return Ok(Self::Void);
        }
        if let Some(p) = Primitive::from_name(s) {
            return Ok(Self::Primitive(p));
        }
        if is_identifier(s) {
            return Ok(Self::Named(s.to_string()));
        }

        Err(TypeExprError::new(src, "unrecognized type syntax"))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::ConstPtr(_) | Self::MutPtr(_))
    }

    /// Declared type names referenced anywhere in the expression.
    pub fn named_types(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Named(n) => out.push(n),
            Self::ConstPtr(t) | Self::MutPtr(t) | Self::Array(t, _) => t.collect_names(out),
            Self::Void | Self::Primitive(_) => {}
        }
    }

    /// Constant names used as array lengths.
    pub fn length_constants(&self) -> Vec<&str> {
        match self {
            Self::Array(t, ArrayLen::Constant(c)) => {
                let mut v = t.length_constants();
                v.push(c);
                v
            }
            Self::Array(t, ArrayLen::Literal(_)) | Self::ConstPtr(t) | Self::MutPtr(t) => {
                t.length_constants()
            }
            Self::Void | Self::Primitive(_) | Self::Named(_) => Vec::new(),
        }
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = TypeExprError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Primitive(p) => f.write_str(p.rust_name().trim_start_matches("::core::ffi::")),
            Self::Named(n) => f.write_str(n),
            Self::ConstPtr(t) => write!(f, "*const {t}"),
            Self::MutPtr(t) => write!(f, "*mut {t}"),
            Self::Array(t, ArrayLen::Literal(n)) => write!(f, "[{t}; {n}]"),
            Self::Array(t, ArrayLen::Constant(c)) => write!(f, "[{t}; {c}]"),
        }
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ── Error ─────────────────────────────────────────────────────────────────

/// A type expression that does not follow the descriptor grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExprError {
    pub source: String,
    pub message: String,
}

impl TypeExprError {
    fn new(source: &str, message: impl Into<String>) -> Self {
        Self { source: source.to_string(), message: message.into() }
    }
}

impl fmt::Display for TypeExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid type `{}`: {}", self.source, self.message)
    }
}

impl std::error::Error for TypeExprError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(n: &str) -> TypeExpr { TypeExpr::Named(n.to_string()) }

    #[test]
    fn parses_primitives_and_void() {
        assert_eq!(TypeExpr::parse("u32").unwrap(), TypeExpr::Primitive(Primitive::U32));
        assert_eq!(TypeExpr::parse("size_t").unwrap(), TypeExpr::Primitive(Primitive::Usize));
        assert_eq!(TypeExpr::parse(" void ").unwrap(), TypeExpr::Void);
    }

    #[test]
    fn parses_nested_pointers() {
        let t = TypeExpr::parse("*const *const c_char").unwrap();
        assert_eq!(
            t,
            TypeExpr::ConstPtr(Box::new(TypeExpr::ConstPtr(Box::new(TypeExpr::Primitive(
                Primitive::CChar
            )))))
        );
        assert_eq!(TypeExpr::parse("*mut Instance").unwrap(), TypeExpr::MutPtr(Box::new(named("Instance"))));
    }

    #[test]
    fn parses_arrays_with_constant_length() {
        let t = TypeExpr::parse("[c_char; MAX_EXTENSION_NAME_SIZE]").unwrap();
        assert_eq!(t.length_constants(), vec!["MAX_EXTENSION_NAME_SIZE"]);
        let t = TypeExpr::parse("[MemoryType; 32]").unwrap();
        assert_eq!(t, TypeExpr::Array(Box::new(named("MemoryType")), ArrayLen::Literal(32)));
        assert_eq!(t.named_types(), vec!["MemoryType"]);
    }

    #[test]
    fn display_round_trips_the_grammar() {
        for src in ["*const ApplicationInfo", "[f32; 4]", "*mut *mut c_void", "void"] {
            assert_eq!(TypeExpr::parse(src).unwrap().to_string(), src);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(TypeExpr::parse("").is_err());
        assert!(TypeExpr::parse("[u32; 4").is_err());
        assert!(TypeExpr::parse("[u32]").is_err());
        assert!(TypeExpr::parse("[void; 2]").is_err());
        assert!(TypeExpr::parse("const Foo*").is_err());
        assert!(TypeExpr::parse("[u8; 4x]").is_err());
    }
}
