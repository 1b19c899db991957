//! Declaration pre-production.
//!
//! Two sources are supported. The isolated-declarations transformer is
//! per-file and fast: parse, transform, print, collecting diagnostics as
//! data. The whole-program checker shells out to `tsc` (or the native
//! preview binary under `tsgo`) once, emitting a shadow declaration tree
//! into a scoped temp directory that is removed on every exit path.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_isolated_declarations::{IsolatedDeclarations, IsolatedDeclarationsOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::error::{EmitDiagnostic, GenerateError};

/// Declaration text plus the diagnostics its production raised.
#[derive(Debug, Default)]
pub struct EmitOutput {
    pub text: String,
    pub diagnostics: Vec<EmitDiagnostic>,
}

/// Where declaration text for a source file comes from.
pub enum DeclarationSource {
    /// Per-file isolated declarations; no cross-file inference.
    Isolated,
    /// Pre-emitted shadow tree from a whole-program checker run.
    Checker(CheckerTree),
}

impl DeclarationSource {
    pub fn declaration_for(&self, path: &Path) -> Result<EmitOutput, GenerateError> {
        match self {
            DeclarationSource::Isolated => {
                let source = fs::read_to_string(path).map_err(|e| GenerateError::Io {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(isolated_declaration(path, &source))
            }
            DeclarationSource::Checker(tree) => Ok(EmitOutput {
                text: tree.declaration_for(path).unwrap_or_default(),
                diagnostics: Vec::new(),
            }),
        }
    }
}

/// Run the isolated-declarations transform over one source file.
/// Diagnostics never abort: whatever declaration text was produced is
/// still bundled, and a file producing none participates as an empty
/// module.
pub fn isolated_declaration(path: &Path, source: &str) -> EmitOutput {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let ret = Parser::new(&allocator, source, source_type).parse();

    let mut diagnostics: Vec<EmitDiagnostic> = ret
        .errors
        .iter()
        .map(|error| EmitDiagnostic {
            file: path.to_path_buf(),
            message: error.to_string(),
        })
        .collect();
    if ret.panicked {
        return EmitOutput {
            text: String::new(),
            diagnostics,
        };
    }

    let transform = IsolatedDeclarations::new(
        &allocator,
        IsolatedDeclarationsOptions {
            strip_internal: false,
        },
    );
    let result = transform.build(&ret.program);
    diagnostics.extend(result.errors.iter().map(|error| EmitDiagnostic {
        file: path.to_path_buf(),
        message: error.to_string(),
    }));

    let code = Codegen::new().build(&result.program).code;
    EmitOutput {
        text: code,
        diagnostics,
    }
}

/// Final per-output pass: re-run isolated declarations over reconstructed
/// declaration text, which tree-shakes anything unreachable from the
/// output's export set and normalises the syntax.
///
/// `Ok(None)` means the output contained only transitively unreferenced
/// types and should be dropped; `Err` carries the messages when the pass
/// produced errors and no code at all.
pub fn treeshake_declaration(text: &str) -> Result<Option<String>, String> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, text, SourceType::d_ts()).parse();
    if ret.panicked {
        return Err(ret
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "parser panicked".to_string()));
    }

    let transform = IsolatedDeclarations::new(
        &allocator,
        IsolatedDeclarationsOptions {
            strip_internal: false,
        },
    );
    let result = transform.build(&ret.program);
    let code = Codegen::new().build(&result.program).code;

    if code.trim().is_empty() {
        if result.errors.is_empty() {
            return Ok(None);
        }
        return Err(result
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n"));
    }
    Ok(Some(code))
}

/// Shadow declaration tree produced by one checker run. Owns its temp
/// directory; dropping the tree removes it.
pub struct CheckerTree {
    root: PathBuf,
    out_dir: tempfile::TempDir,
}

impl CheckerTree {
    /// Run the checker over the project and collect the emitted tree.
    pub fn emit(cwd: &Path, tsconfig: &Path, tsgo: bool) -> Result<Self, GenerateError> {
        let out_dir = tempfile::tempdir().map_err(|e| GenerateError::Io {
            path: cwd.to_path_buf(),
            message: e.to_string(),
        })?;

        let executable = if tsgo { "tsgo" } else { "tsc" };
        tracing::debug!(%executable, tsconfig = %tsconfig.display(), "running declaration checker");
        let output = Command::new(executable)
            .arg("-p")
            .arg(tsconfig)
            .args(["--declaration", "--emitDeclarationOnly"])
            .arg("--outDir")
            .arg(out_dir.path())
            .current_dir(cwd)
            .output()
            .map_err(|e| GenerateError::Checker {
                log: format!("failed to spawn {executable}: {e}"),
            })?;

        if !output.status.success() {
            let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
            log.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(GenerateError::Checker { log });
        }

        Ok(Self {
            root: cwd.to_path_buf(),
            out_dir,
        })
    }

    /// Look up the pre-emitted declaration for a source file: first at the
    /// mirrored relative path, then anywhere in the tree by file name.
    pub fn declaration_for(&self, source: &Path) -> Option<String> {
        let declaration_name = declaration_file_name(source)?;
        if let Ok(relative) = source.strip_prefix(&self.root) {
            let mirrored = self
                .out_dir
                .path()
                .join(relative)
                .with_file_name(&declaration_name);
            if let Ok(text) = fs::read_to_string(&mirrored) {
                return Some(text);
            }
        }
        let found = find_by_name(self.out_dir.path(), &declaration_name)?;
        fs::read_to_string(found).ok()
    }
}

fn declaration_file_name(source: &Path) -> Option<String> {
    let stem = source.file_stem()?.to_str()?;
    let extension = source.extension()?.to_str()?;
    let declaration_ext = match extension {
        "mts" => "d.mts",
        "cts" => "d.cts",
        _ => "d.ts",
    };
    Some(format!("{stem}.{declaration_ext}"))
}

fn find_by_name(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().and_then(|n| n.to_str()) == Some(name) {
            return Some(path);
        }
    }
    subdirs.into_iter().find_map(|sub| find_by_name(&sub, name))
}
