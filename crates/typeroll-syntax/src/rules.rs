//! The fixed lexical rule set.
//!
//! Everything here is a module-level read-only regex; no rule carries state.
//! The rules deliberately stay shallow: real structure is read off the Oxc
//! AST, and these patterns only handle the textual rewrites (type-only
//! erasure, tokenisation, extension stripping) that operate on statement
//! slices rather than on nodes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading `import type ` on an import statement.
pub static IMPORT_TYPE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^import\s+type\s").unwrap());

/// Leading `export type ` on a re-export statement.
pub static EXPORT_TYPE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^export\s+type\s").unwrap());

/// The keyword plus the named-specifier braces of an import/export.
pub static IMPORT_EXPORT_NAMES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^((?:import|export)[^{]*)\{(.*?)\}").unwrap());

/// Same as [`IMPORT_EXPORT_NAMES`] but with a preceding default specifier.
pub static IMPORT_EXPORT_WITH_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(import\s+[A-Za-z_$][\w$]*\s*,\s*)\{(.*?)\}").unwrap()
});

/// The `type ` modifier inside a specifier list.
pub static TYPE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btype\s+").unwrap());

/// One lexical unit of declaration text. Alternatives are ordered so the
/// longest unit wins: a dynamic type-import expression (with its access
/// chain), a JSDoc/block comment, a line comment, a quoted string, a
/// template literal, an identifier-like word, then any single punctuation
/// character.
pub static TOKENIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        import\s*\(\s*[^)]*\)(?:\s*\.\s*[A-Za-z_$][\w$]*|\s*\[[^\]]*\])*
        | /\*[\s\S]*?\*/
        | //[^\n]*
        | "(?:[^"\\\n]|\\.)*"
        | '(?:[^'\\\n]|\\.)*'
        | `(?:[^`\\]|\\.)*`
        | [A-Za-z_$][\w$]*
        | [^\sA-Za-z_$]
        "#,
    )
    .unwrap()
});

/// Heuristic for a word that is probably a type identifier: starts with a
/// letter, underscore or `$` and contains at least one capital letter.
/// Only used as a fallback for references that escape the per-file
/// referenced-names set, such as globals and namespace members.
pub static CAPITAL_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Z][\w$]*|[a-z_$][\w$]*[A-Z][\w$]*)$").unwrap());

/// Third-party importer detection.
pub static NODE_MODULES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/\\]node_modules[/\\]").unwrap());

/// Bundler-synthesised namespace locals.
pub static SYNTHETIC_NAMESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^exports_").unwrap());

/// Runtime extension on a bundled import specifier. The dot is escaped; the
/// unescaped variant would also strip arbitrary-prefix extensions.
pub static MODULE_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(mjs|cjs|js)$").unwrap());

/// Whether a word is syntactically usable as a bare identifier.
pub fn is_identifier_like(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Strip one `.js`/`.mjs`/`.cjs` runtime extension from a module specifier.
/// Applying this twice equals applying it once.
pub fn strip_bundle_extension(specifier: &str) -> String {
    MODULE_EXTENSION.replace(specifier, "").into_owned()
}
