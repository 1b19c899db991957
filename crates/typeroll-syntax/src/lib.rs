//! Lexical and syntactic building blocks for the typeroll declaration bundler.
//!
//! This crate provides:
//! - The token escape codec that keeps declaration text safe inside fake-JS
//!   string literals.
//! - The fixed regex rule set used for type-only erasure and tokenisation.
//! - A thin Oxc parser wrapper that owns the arena allocator.
//! - Purely syntactic helpers over top-level statements (no semantic
//!   analysis): import/export classification, name extraction, export-prefix
//!   stripping, and leading-comment capture.

mod comments;
mod escape;
mod frontend;
mod rules;
mod stmt;

pub use comments::leading_comments;
pub use escape::{escape, unescape, NEWLINE_MARK, TAB_MARK};
pub use frontend::ModuleParser;
pub use rules::{
    is_identifier_like, strip_bundle_extension, CAPITAL_LETTER, IMPORT_EXPORT_NAMES,
    IMPORT_EXPORT_WITH_DEFAULT, IMPORT_TYPE_PREFIX, EXPORT_TYPE_PREFIX, MODULE_EXTENSION,
    NODE_MODULES, SYNTHETIC_NAMESPACE, TOKENIZE, TYPE_WORD,
};
pub use stmt::{
    declaration_name, declared_name, has_default_export_modifier, has_export_modifier,
    is_default_re_export, is_export_all, is_import, is_re_export, is_side_effect_import,
    is_unnamed_default_export, jsify_import_export, module_export_name, name_unnamed_default,
    strip_export_prefix,
};
