//! Bundled type-declaration generation.
//!
//! For every entry source file, `generate_dts` produces one declaration
//! file (plus shared chunk declarations when splitting is enabled) in which
//! all transitively referenced types from first-party source, third-party
//! packages and builtin platform modules are inlined, deduplicated and
//! tree-shaken to what the entries actually export.
//!
//! The pipeline: declaration text is produced per file (isolated
//! declarations, or a checker-emitted shadow tree), encoded as fake-JS by
//! the forward transform inside the bundler's load hook, linked and shaken
//! by the bundler, decoded per output by the reverse transform, then passed
//! once more through the isolated-declarations transformer as a final
//! tree-shake. Minification is an optional post-pass.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

mod emitter;
mod error;
mod minify;
mod resolve;

pub use emitter::{isolated_declaration, treeshake_declaration, CheckerTree, DeclarationSource, EmitOutput};
pub use error::{EmitDiagnostic, GenerateError};
pub use minify::minify_declaration;
pub use resolve::{FsResolver, ResolvePolicy};
pub use typeroll_bundler::OutputKind;

use typeroll_bundler::{BundleError, BundleOptions, GraphBundler, Loader};
use typeroll_syntax::NODE_MODULES;
use typeroll_transform::{bundled_to_declaration, declaration_to_fake_js};

/// Options for one `generate_dts` call.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Project root; defaults to the process working directory.
    pub cwd: Option<PathBuf>,
    /// Alternative project configuration for the checker.
    pub preferred_tsconfig: Option<PathBuf>,
    /// Which external package declarations are inlined.
    pub resolve: ResolvePolicy,
    /// Produce declarations with the whole-program checker instead of the
    /// per-file isolated transformer.
    pub infer_types: bool,
    /// Use the native-preview checker binary.
    pub tsgo: bool,
    /// Allow shared chunks between entries.
    pub splitting: bool,
    /// Rename user-visible identifiers to short ones and strip whitespace.
    pub minify: bool,
    /// Output naming pattern forwarded to the bundler.
    pub naming: Option<String>,
}

/// One generated declaration file.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub kind: OutputKind,
    /// The bundled declaration text.
    pub text: String,
    /// Output path, e.g. `index.d.ts`.
    pub path: PathBuf,
    /// File name without extension.
    pub filename: String,
    /// Declaration extension derived from the chunk's JS extension.
    pub extension: String,
}

/// Outputs plus the per-file diagnostics collected along the way.
#[derive(Debug, Default)]
pub struct GenerateResult {
    pub files: Vec<OutputFile>,
    pub errors: Vec<EmitDiagnostic>,
}

/// Generate bundled declarations for the given entrypoints. Entries may be
/// paths or glob patterns relative to `cwd`.
pub fn generate_dts(
    entrypoints: &[String],
    options: &GenerateOptions,
) -> Result<GenerateResult, GenerateError> {
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().map_err(|e| GenerateError::Io {
            path: PathBuf::from("."),
            message: e.to_string(),
        })?,
    };
    let entries = expand_entrypoints(entrypoints, &cwd)?;
    tracing::debug!(entries = entries.len(), "resolved entrypoints");

    let source = if options.infer_types {
        let tsconfig = options
            .preferred_tsconfig
            .clone()
            .map(|p| if p.is_absolute() { p } else { cwd.join(p) })
            .unwrap_or_else(|| cwd.join("tsconfig.json"));
        if !tsconfig.is_file() {
            return Err(GenerateError::MissingTsConfig { expected: tsconfig });
        }
        DeclarationSource::Checker(CheckerTree::emit(&cwd, &tsconfig, options.tsgo)?)
    } else {
        DeclarationSource::Isolated
    };

    let loader = DtsLoader {
        source: &source,
        diagnostics: RefCell::new(Vec::new()),
    };
    let resolver = FsResolver::new(cwd.clone(), options.resolve.clone());
    let bundler = GraphBundler::new(
        &resolver,
        &loader,
        BundleOptions {
            splitting: options.splitting,
            naming: options.naming.clone(),
        },
    );
    let bundle = bundler.bundle(&entries)?;

    let mut files = Vec::new();
    for output in bundle.outputs {
        let declaration =
            bundled_to_declaration(&output.code).map_err(|e| GenerateError::EmptyOutput {
                path: output.filename.clone(),
                message: e.to_string(),
            })?;
        let text = match treeshake_declaration(&declaration) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(file = %output.filename, "no reachable types, output dropped");
                continue;
            }
            Err(message) => {
                return Err(GenerateError::EmptyOutput {
                    path: output.filename,
                    message,
                })
            }
        };
        let text = if options.minify {
            minify_declaration(&text)
        } else {
            text
        };
        let (path, filename, extension) = declaration_paths(&output.filename);
        files.push(OutputFile {
            kind: output.kind,
            text,
            path,
            filename,
            extension,
        });
    }

    Ok(GenerateResult {
        files,
        errors: loader.diagnostics.into_inner(),
    })
}

/// The bundler load hook: source files go through declaration
/// pre-production and the forward transform; files under `node_modules`
/// contribute their declaration text verbatim so third-party declarations
/// survive bundling unmodified. Each invocation is an isolated unit.
struct DtsLoader<'a> {
    source: &'a DeclarationSource,
    diagnostics: RefCell<Vec<EmitDiagnostic>>,
}

impl Loader for DtsLoader<'_> {
    fn load(&self, id: &Path) -> Result<String, BundleError> {
        let is_third_party = id
            .to_str()
            .is_some_and(|path| NODE_MODULES.is_match(path));
        let declaration = if is_third_party {
            fs::read_to_string(id).map_err(|e| BundleError::Load {
                path: id.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            let out = self
                .source
                .declaration_for(id)
                .map_err(|e| BundleError::Load {
                    path: id.to_path_buf(),
                    message: e.to_string(),
                })?;
            self.diagnostics.borrow_mut().extend(out.diagnostics);
            out.text
        };
        declaration_to_fake_js(&declaration).map_err(|e| BundleError::Load {
            path: id.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn expand_entrypoints(patterns: &[String], cwd: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let mut entries: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let absolute = if Path::new(pattern).is_absolute() {
            pattern.clone()
        } else {
            cwd.join(pattern).display().to_string()
        };
        if pattern.contains(['*', '?', '[']) {
            if let Ok(matches) = glob::glob(&absolute) {
                for path in matches.flatten() {
                    if is_ts_source(&path) {
                        entries.push(path);
                    }
                }
            }
        } else {
            let path = PathBuf::from(absolute);
            if is_ts_source(&path) && path.is_file() {
                entries.push(path);
            }
        }
    }
    entries.dedup();
    if entries.is_empty() {
        return Err(GenerateError::NoEntrypoints);
    }
    Ok(entries)
}

fn is_ts_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
        return false;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "tsx" | "mts" | "cts")
    )
}

/// `types/index.js` → (`types/index.d.ts`, `index`, `.d.ts`); the
/// declaration extension follows the chunk's JS extension.
fn declaration_paths(js_filename: &str) -> (PathBuf, String, String) {
    let (stem_path, extension) = if let Some(stem) = js_filename.strip_suffix(".mjs") {
        (stem, ".d.mts")
    } else if let Some(stem) = js_filename.strip_suffix(".cjs") {
        (stem, ".d.cts")
    } else if let Some(stem) = js_filename.strip_suffix(".js") {
        (stem, ".d.ts")
    } else {
        (js_filename, ".d.ts")
    };
    let path = PathBuf::from(format!("{stem_path}{extension}"));
    let filename = Path::new(stem_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(stem_path)
        .to_string();
    (path, filename, extension.to_string())
}
