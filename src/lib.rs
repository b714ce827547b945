//! thinktank-wrapper: the library
//!
//! This is the library version of the CLI tool `thinktank-wrapper`. The tool
//! is implemented with this library, but the purpose of the project is to
//! deliver the CLI tool, instead of focusing on the library interface first
//! and foremost. **For this reason, semver guarantees do _not_ apply to this
//! library.** Please use exact version matching, as this API may break even
//! between patch point releases.

#![deny(unsafe_code)]

#[macro_use]
extern crate clap;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod cli;
pub mod command_builder;
pub mod config;
pub mod context_finder;
pub mod error;
pub mod executor;
pub mod gitignore;
mod pathop;
pub mod run;
pub mod template_loader;
pub mod tokenizer;

pub use crate::run::run;
