//! `lmt_core` is the engine behind the `lmt` literate markdown tangler. It
//! extracts source code from the fenced blocks of a markdown document, merges
//! blocks that share a name, and expands `⦅name⦆` references to named blocks
//! recursively.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown document
//!   → Include resolver (splices `! include [desc](path)` files, recursively)
//!   → Conditional processor (applies `! if`/`! elsif`/`! else`/`! end`, runs extension blocks)
//!   → Block assembler (groups fenced blocks by name, applies `=` replacement)
//!   → Extension parse hook (may inject or override blocks)
//!   → Macro expander (substitutes `⦅name | filter⦆` references into the root block)
//!   → Unescaper (turns `\⦅` and `\⦆` back into literal delimiters)
//! ```
//!
//! ## Document Syntax
//!
//! ````markdown
//! ```rust
//! fn main() {
//!   ⦅body⦆
//! }
//! ```
//!
//! ```rust body
//! println!("⦅greeting | ruby_escape⦆");
//! ```
//!
//! ```rust =body
//! println!("replaces the fragment above");
//! ```
//! ````
//!
//! The unnamed block is the output. A fence with `=` before the name
//! discards every earlier fragment of that block; other fragments append.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lmt_core::TangleOptions;
//! use lmt_core::Tangler;
//! use std::path::Path;
//!
//! let mut tangler = Tangler::new("program.rs.lmd", TangleOptions::default());
//! let written = tangler.write(Path::new("program.rs")).unwrap();
//! if !written {
//!     eprintln!("no root block, nothing written");
//! }
//! ```

pub use assembler::*;
pub use conditional::*;
pub use config::*;
pub use error::*;
pub use expander::*;
pub use extension::*;
pub use filters::*;
pub use include::*;
pub use line::Line;
pub use self_test::*;
pub use tangle::*;

mod assembler;
mod conditional;
pub mod config;
#[allow(unused_assignments)]
mod error;
mod expander;
mod extension;
mod filters;
mod include;
pub mod lexer;
pub mod line;
mod self_test;
pub mod syntax;
mod tangle;

#[cfg(test)]
mod __fixtures;
