//! # Bootforge Autoinstall
//!
//! Turns blended configurations into rendered OS-installer answer files
//! (kickstart, preseed, AutoYaST).
//!
//! The templating language itself is a collaborator behind the
//! [`TemplateEngine`](bootforge_types::TemplateEngine) contract; this
//! crate ships [`VariableTemplateEngine`], a minimal `$variable`
//! substitution engine, and the [`AutoinstallGenerator`] pipeline that
//! feeds it: blend, hoist metadata, synthesize repo stanzas, render,
//! and post-process XML-flavored answer files.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod autoyast;
mod generator;
mod template;

pub use generator::{answer_file_url, breed_answer_option, AutoinstallGenerator};
pub use template::VariableTemplateEngine;
