//! relalg - An in-memory relational-algebra engine in Rust
//!
//! This crate provides:
//! - Typed relations, attributes and tuples with name lookup
//! - A predicate parser/evaluator for selection
//! - Relational operators (select, project, rename, set operations, joins, aggregation)
//! - Flat-file schema and data loading
//! - Fixed-width table rendering and operator timing

pub mod algebra;
pub mod config;
pub mod error;
pub mod logging;
pub mod perf;
pub mod storage;
