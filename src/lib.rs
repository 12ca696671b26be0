//! A lightweight pair of convenience utilities for Rust: POSIX path strings
//! and flexible nested maps. Thin ergonomic layers over the standard
//! library, ideal for configuration trees, scripting-style path juggling,
//! test fixtures, and more.
//!
//! ### Overview
//!
//! `flex-kit` provides two independent types:
//! - `FlexPath` is an immutable, lexically normalized POSIX path with pathlib-style pure operations and direct delegation to the host filesystem.
//! - `FlexMap` is a string-keyed map where attribute-style reads of missing keys create nested maps on the fly, so deep structures need no pre-declaration.
//!
//! **Key ideas**:
//! - **Convenience**: Build `config.attr("database")?.set_attr("port", 5432)?` without declaring intermediate levels.
//! - **Strictness where it counts**: Bracket-style access keeps the ordinary map contract; only attribute access vivifies.
//! - **Interop**: `FlexMap::to_plain()` bridges to any serializer; `FlexPath` converts to `std::path::Path` for free.
//! - **POSIX only**: Path semantics follow UNIX-like systems; Windows is intentionally unsupported.
//! - **Clarity**: Detailed error messages and up-to-date documentation.

mod core;
mod map;
mod path;

pub use crate::core::Result;
pub use crate::map::{FlexMap, Value};
pub use crate::path::FlexPath;
