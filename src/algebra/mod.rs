//! Relational algebra
//!
//! This module provides:
//! - `types`: attribute data types and runtime values
//! - `schema`: attributes, tuples and relations
//! - `parser`: selection predicate lexer, parser and evaluator
//! - `executor`: one executor per relational operator
//! - `engine`: timed operator facade
//! - `render`: fixed-width table rendering

pub mod engine;
pub mod executor;
pub mod parser;
pub mod render;
pub mod schema;
pub mod types;
