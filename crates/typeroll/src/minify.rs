//! Declaration minification.
//!
//! Top-level user-visible names are renamed to short identifiers and
//! insignificant whitespace is collapsed. External names are preserved
//! exactly: every export specifier is rewritten to `short as original`, so
//! the module surface is unchanged.

use std::collections::{HashMap, HashSet};

use oxc_ast::ast as oxc;
use oxc_span::GetSpan;

use typeroll_syntax::{declared_name, module_export_name, ModuleParser, TOKENIZE};

const RESERVED: &[&str] = &[
    "as", "any", "boolean", "class", "const", "declare", "default", "do", "else", "enum",
    "export", "extends", "from", "function", "if", "import", "in", "interface", "is", "keyof",
    "let", "module", "namespace", "never", "new", "number", "of", "readonly", "string", "this",
    "type", "typeof", "undefined", "unknown", "var", "void",
];

/// Minify one declaration output.
pub fn minify_declaration(text: &str) -> String {
    let parser = ModuleParser::new();
    let ret = parser.parse_dts(text);
    if ret.panicked {
        return text.to_string();
    }

    let taken: HashSet<String> = TOKENIZE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    let mut names = ShortNames::new(taken);

    let mut renames: HashMap<String, String> = HashMap::new();
    for stmt in &ret.program.body {
        if let Some(name) = declared_name(stmt) {
            if !renames.contains_key(&name) {
                let short = names.next_for();
                renames.insert(name, short);
            }
        }
    }

    let mut pieces: Vec<String> = Vec::new();
    for stmt in &ret.program.body {
        let span = stmt.span();
        let slice = &text[span.start as usize..span.end as usize];
        match stmt {
            // Export specifiers keep the external name on the right-hand
            // side: `export { a as User };`.
            oxc::Statement::ExportNamedDeclaration(decl)
                if decl.declaration.is_none() && decl.source.is_none() =>
            {
                let specs: Vec<String> = decl
                    .specifiers
                    .iter()
                    .map(|spec| {
                        let local = module_export_name(&spec.local);
                        let exported = module_export_name(&spec.exported);
                        let short = renames.get(&local).cloned().unwrap_or(local);
                        if short == exported {
                            short
                        } else {
                            format!("{short} as {exported}")
                        }
                    })
                    .collect();
                pieces.push(format!("export {{ {} }};", specs.join(", ")));
            }
            // Specifiers of `export … from` name bindings of the other
            // module and must not be renamed.
            oxc::Statement::ExportNamedDeclaration(decl) if decl.declaration.is_none() => {
                pieces.push(rewrite_tokens(slice, &HashMap::new()));
            }
            oxc::Statement::ImportDeclaration(_) | oxc::Statement::ExportAllDeclaration(_) => {
                pieces.push(rewrite_tokens(slice, &HashMap::new()));
            }
            _ => pieces.push(rewrite_tokens(slice, &renames)),
        }
    }
    let mut out = pieces.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Apply the rename map to identifier tokens and collapse whitespace runs
/// outside strings and comments to one space.
fn rewrite_tokens(slice: &str, renames: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(slice.len());
    let mut last = 0usize;
    let mut pending_newline = false;
    for m in TOKENIZE.find_iter(slice) {
        let gap = &slice[last..m.start()];
        if !gap.is_empty() && !out.is_empty() {
            out.push(if pending_newline { '\n' } else { ' ' });
        }
        pending_newline = false;
        last = m.end();
        let unit = m.as_str();
        if unit.starts_with("//") {
            // A line comment must keep its terminating newline.
            pending_newline = true;
            out.push_str(unit);
        } else if let Some(short) = renames.get(unit) {
            out.push_str(short);
        } else {
            out.push_str(unit);
        }
    }
    if pending_newline {
        out.push('\n');
    }
    out.push_str(slice[last..].trim());
    out
}

struct ShortNames {
    taken: HashSet<String>,
    counter: usize,
}

impl ShortNames {
    fn new(taken: HashSet<String>) -> Self {
        Self { taken, counter: 0 }
    }

    fn next_for(&mut self) -> String {
        loop {
            let candidate = spell(self.counter);
            self.counter += 1;
            if RESERVED.contains(&candidate.as_str()) || self.taken.contains(&candidate) {
                continue;
            }
            self.taken.insert(candidate.clone());
            return candidate;
        }
    }
}

/// 0 → a, 25 → z, 26 → aa, …
fn spell(mut index: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'a' + (index % 26) as u8) as char);
        index /= 26;
        if index == 0 {
            return name;
        }
        index -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_locals_but_preserves_export_names() {
        let out = minify_declaration(
            "interface User {\n  id: number;\n}\ntype Id = User;\nexport { User, Id };\n",
        );
        assert!(out.contains("interface a"));
        assert!(out.contains("type b = a ;") || out.contains("type b = a;"));
        assert!(out.contains("a as User"));
        assert!(out.contains("b as Id"));
        assert!(!out.contains("export { User"));
    }

    #[test]
    fn collapses_whitespace() {
        let out = minify_declaration("interface User {\n    id:   number;\n}\nexport { User };\n");
        assert!(!out.contains("    "));
    }

    #[test]
    fn default_export_name_is_preserved() {
        let out = minify_declaration(
            "declare function run(): void;\nexport { run as default };\n",
        );
        assert!(out.contains("as default"));
    }

    #[test]
    fn short_name_spelling() {
        assert_eq!(spell(0), "a");
        assert_eq!(spell(25), "z");
        assert_eq!(spell(26), "aa");
        assert_eq!(spell(27), "ab");
    }

    #[test]
    fn avoids_capturing_existing_words() {
        // `a` already appears, so the first short name must skip it.
        let out = minify_declaration(
            "interface Thing {\n  a: number;\n}\nexport { Thing };\n",
        );
        assert!(out.contains("interface b"));
    }
}
