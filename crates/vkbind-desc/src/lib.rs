//! # vkbind-desc
//!
//! Declarative descriptions of API extensions and the rules they must obey
//! before bindings can be generated from them.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |---|---|
//! | `model` | Serde structs for one descriptor document |
//! | `types` | The type-expression grammar (`*const T`, `[T; N]`, ...) |
//! | `set` | [`DescriptorSet`]: loading and dependency ordering |
//! | `validate` | Reference, scope and value checks |
//! | `names` | Native and Rust naming rules |
//!
//! ## Example
//!
//! ```
//! use vkbind_desc::{parse_descriptor, DescriptorSet, ValidationRules};
//!
//! let mut set = DescriptorSet::new();
//! set.insert(parse_descriptor(r#"
//!     name = "vulkan"
//!     handles = [{ name = "Instance", dispatchable = true }]
//!
//!     [[functions]]
//!     name = "DestroyInstance"
//!     params = [{ name = "instance", type = "Instance" }]
//! "#, "vulkan.toml").unwrap()).unwrap();
//!
//! set.validate(&ValidationRules::default()).unwrap();
//! ```

mod error;
mod model;
pub mod names;
mod set;
mod types;
mod validate;

pub use error::DescriptorError;
pub use model::{
    BaseTypeDescriptor, BitmaskBit, BitmaskDescriptor, ConstantDescriptor, EnumDescriptor,
    EnumExtensionDescriptor, EnumValue, ExtensionDescriptor, FunctionDescriptor,
    FunctionPointerDescriptor, FunctionScope, HandleDescriptor, ParamDescriptor, StructDescriptor,
    TypeKind,
};
pub use set::{parse_descriptor, DescriptorSet};
pub use types::{ArrayLen, Primitive, TypeExpr, TypeExprError};
pub use validate::ValidationRules;
