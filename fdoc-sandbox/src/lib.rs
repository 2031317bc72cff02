//! fdoc Sandbox - run a snippet, get back what it logged
//!
//! A snippet of TypeScript or JavaScript is stripped of its types and run
//! in a fresh, isolated JavaScript runtime process, with the project's
//! configured mocks injected as globals. The arguments of the last
//! `console.log`/`console.error` call are returned as JSON values.
//!
//! ```no_run
//! use fdoc_core::{JsonConfigSource, LocalStorage};
//! use fdoc_sandbox::{comment_block, format_values, Sandbox};
//! use std::sync::Arc;
//!
//! # async fn run() -> fdoc_sandbox::Result<()> {
//! let root = std::path::PathBuf::from("/work/shop");
//! let sandbox = Sandbox::new(&root, Arc::new(LocalStorage), Arc::new(JsonConfigSource::for_project(&root)));
//!
//! let values = sandbox.run_code("console.log([1, 2].map((n: number) => n * 2))").await?;
//! println!("{}", comment_block(&format_values(&values)));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fixtures;
pub mod format;
pub mod mocks;
mod outcome;
mod runner;
pub mod strip;

pub use error::{Result, SandboxError};
pub use fixtures::write_fixture;
pub use format::{comment_block, find_doc_comments, format_values, remove_comment};
pub use mocks::{load_mocks, MockBinding, MockKind};
pub use outcome::SandboxOutcome;
pub use runner::Sandbox;
pub use strip::{strip_types, StripError};
