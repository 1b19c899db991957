use std::path::PathBuf;

use thiserror::Error;
use typeroll_bundler::BundleError;

/// Fatal failures of one `generate_dts` call.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no entrypoint resolved to a TypeScript source file")]
    NoEntrypoints,

    #[error(
        "infer_types requires a project config; expected {}.\n\
         Create a tsconfig.json or point preferred_tsconfig at one.",
        expected.display()
    )]
    MissingTsConfig { expected: PathBuf },

    #[error("declaration checker failed:\n{log}")]
    Checker { log: String },

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error("declaration output for {path} failed to re-emit: {message}")]
    EmptyOutput { path: String, message: String },

    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// A per-file declaration-emission diagnostic. Collected, never thrown:
/// files with diagnostics still participate in the bundle with whatever
/// partial declaration text was produced.
#[derive(Debug, Clone)]
pub struct EmitDiagnostic {
    pub file: PathBuf,
    pub message: String,
}
