//! Bundling of fake-JS declaration modules.
//!
//! The driver talks to the bundler through two hooks: a [`Resolver`] that
//! maps import specifiers to module ids (or marks them external) and a
//! [`Loader`] that produces fake-JS text for a module id. The in-tree
//! [`GraphBundler`] links the resulting module graph the way the reverse
//! transform expects a host bundler to: topological concatenation per entry,
//! collision renames with numeric suffixes, namespace synthesis through
//! `exports_*` locals and `__export(id, { k: () => v })` calls, dead-code
//! elimination over identifier tokens, and optional code splitting into a
//! shared chunk.

use std::path::{Path, PathBuf};

use thiserror::Error;

mod emit;
mod graph;
mod link;

use graph::ModuleGraph;

/// Result of resolving one import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// First-party module; the loader will be asked for its fake-JS.
    Internal(PathBuf),
    /// Leave the import in place with this specifier.
    External(String),
}

/// Resolve hook: maps `(specifier, importer)` to a module id.
pub trait Resolver {
    fn resolve(&self, specifier: &str, importer: Option<&Path>) -> Result<Resolution, BundleError>;
}

/// Load hook: produces fake-JS text for a module id. Invocations are
/// independent of each other; the bundler may call them in any order.
pub trait Loader {
    fn load(&self, id: &Path) -> Result<String, BundleError>;
}

/// Options forwarded by the driver.
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    /// Allow modules shared between entries to be emitted as one chunk.
    pub splitting: bool,
    /// Output naming pattern; `[dir]`, `[name]` and `[ext]` are substituted.
    pub naming: Option<String>,
}

/// Whether an output is a user entry or a shared chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    EntryPoint,
    Chunk,
}

/// One bundled output.
#[derive(Debug, Clone)]
pub struct BundleOutput {
    pub kind: OutputKind,
    /// Output file name with its runtime extension, e.g. `index.js`.
    pub filename: String,
    pub code: String,
}

/// All outputs of one bundle invocation.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    pub outputs: Vec<BundleOutput>,
}

/// Fatal bundling failures.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("cannot resolve \"{specifier}\" from {importer}")]
    Resolve { specifier: String, importer: String },
    #[error("failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },
    #[error("failed to parse module {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Links fake-JS modules produced by the forward transform.
pub struct GraphBundler<'a> {
    resolver: &'a dyn Resolver,
    loader: &'a dyn Loader,
    options: BundleOptions,
}

impl<'a> GraphBundler<'a> {
    pub fn new(resolver: &'a dyn Resolver, loader: &'a dyn Loader, options: BundleOptions) -> Self {
        Self {
            resolver,
            loader,
            options,
        }
    }

    /// Bundle the given entry modules into one output per entry, plus a
    /// shared chunk when splitting is enabled and entries overlap.
    pub fn bundle(&self, entries: &[PathBuf]) -> Result<Bundle, BundleError> {
        let graph = ModuleGraph::load(entries, self.resolver, self.loader)?;
        tracing::debug!(modules = graph.modules.len(), "module graph loaded");
        emit::emit_bundle(&graph, entries, &self.options)
    }
}
