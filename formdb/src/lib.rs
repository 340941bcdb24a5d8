//! Schema-driven form storage.
//!
//! A [`Document`] describes one business document type as a tree of typed
//! fields. The [`compiler`] turns it into the relational tables that hold
//! submitted instances, and the [`registry`] keeps the schema revisions
//! those tables are generated from.

pub mod blueprint;
pub mod compiler;
pub mod config;
pub mod ddl;
pub mod error;
pub mod naming;
pub mod registry;
pub mod schema;

pub use compiler::{compile, Compiler, Decomposition};
pub use config::CompilerConfig;
pub use error::{FormDbError, Result};
pub use registry::SchemaRegistry;
pub use schema::{Document, Item};
