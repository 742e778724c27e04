//! # vkbind-core
//!
//! Runtime support shared by every generated binding.
//!
//! | Module | Contents |
//! |---|---|
//! | [`loader`] | Resolver callback, wrapper traits, [`LoaderManager`](loader::LoaderManager) |
//! | [`bitmask`] | [`Bitmask`](bitmask::Bitmask) trait and [`Masked`](bitmask::Masked) flag expressions |
//! | [`abi`] | Layout assertions and casts between typed and native values |
//! | [`extensions`] | Required/optional extension negotiation |
//! | [`logging`] | `env_logger` setup |

pub mod abi;
pub mod bitmask;
mod error;
pub mod extensions;
pub mod loader;
pub mod logging;

pub use error::LoaderError;
