//! Forward transform: one declaration file to one fake-JS module.
//!
//! The output mirrors the module's public surface: imports/exports stay real
//! module syntax (with type-only modifiers erased), every other statement
//! becomes `var name = [ …tokens… ];`, and default exports are normalised to
//! a named local plus `export { name as default };` so the bundler always
//! has a binding to resolve and shake.

use std::collections::HashSet;

use oxc_ast::ast as oxc;
use oxc_span::GetSpan;

use typeroll_syntax::{
    declared_name, escape, is_identifier_like, jsify_import_export, leading_comments,
    module_export_name, name_unnamed_default, strip_export_prefix, CAPITAL_LETTER,
    ModuleParser, TOKENIZE,
};

use crate::dynamic_import::{DynamicImportExpander, SuffixStrategy};
use crate::error::TransformError;

/// Options for the forward transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardOptions {
    /// How dynamic-import aliases are disambiguated.
    pub suffix: SuffixStrategy,
}

/// Transform declaration text into fake-JS with default options.
pub fn declaration_to_fake_js(source: &str) -> Result<String, TransformError> {
    declaration_to_fake_js_with(source, ForwardOptions::default())
}

/// Transform declaration text into fake-JS.
pub fn declaration_to_fake_js_with(
    source: &str,
    options: ForwardOptions,
) -> Result<String, TransformError> {
    let parser = ModuleParser::new();
    let ret = parser.parse_dts(source);
    if ret.panicked {
        return Err(TransformError::Parse {
            context: "declaration file",
            message: ret
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "parser panicked".to_string()),
        });
    }

    let mut state = Forward {
        source,
        referenced: imported_locals(&ret.program),
        exported: HashSet::new(),
        expander: DynamicImportExpander::new(options.suffix),
        out: String::new(),
    };

    let mut prev_end = 0usize;
    for (index, stmt) in ret.program.body.iter().enumerate() {
        let span = stmt.span();
        let start = span.start as usize;
        let end = span.end as usize;
        let gap = &source[prev_end..start.max(prev_end)];
        prev_end = end;
        state.statement(stmt, index, gap)?;
    }
    Ok(state.out)
}

struct Forward<'a> {
    source: &'a str,
    referenced: HashSet<String>,
    exported: HashSet<String>,
    expander: DynamicImportExpander,
    out: String,
}

enum Token {
    Str(String),
    Ident(String),
}

impl<'a> Forward<'a> {
    fn statement(
        &mut self,
        stmt: &oxc::Statement<'_>,
        index: usize,
        gap: &str,
    ) -> Result<(), TransformError> {
        let span = stmt.span();
        let text = &self.source[span.start as usize..span.end as usize];

        match stmt {
            oxc::Statement::ImportDeclaration(decl) => {
                // Declarations have no runtime side effects; a bare import
                // contributes nothing to the public surface.
                let is_side_effect = decl
                    .specifiers
                    .as_ref()
                    .map_or(true, |specs| specs.is_empty());
                if !is_side_effect {
                    self.out.push_str(&jsify_import_export(text));
                    self.out.push('\n');
                }
            }
            oxc::Statement::ExportAllDeclaration(_) => {
                self.out.push_str(&jsify_import_export(text));
                self.out.push('\n');
            }
            oxc::Statement::ExportNamedDeclaration(decl) if decl.declaration.is_none() => {
                for spec in &decl.specifiers {
                    self.exported.insert(module_export_name(&spec.exported));
                }
                self.out.push_str(&jsify_import_export(text));
                self.out.push('\n');
            }
            oxc::Statement::ExportDefaultDeclaration(decl) => {
                self.default_export(decl, text, index, gap)?;
            }
            oxc::Statement::TSExportAssignment(assign) => {
                // `export = X` survives as the default binding when X is a
                // plain identifier; other shapes carry no tokenisable name.
                if let oxc::Expression::Identifier(id) = &assign.expression {
                    self.out
                        .push_str(&format!("export {{ {} as default }};\n", id.name));
                }
            }
            _ => {
                let name = declared_name(stmt).unwrap_or_else(|| format!("var{index}"));
                self.referenced.insert(name.clone());
                let exported = matches!(stmt, oxc::Statement::ExportNamedDeclaration(_));
                let body = if exported {
                    strip_export_prefix(text)
                } else {
                    text
                };
                self.emit_tokenised(&name, body, gap)?;
                if exported && !self.exported.contains(&name) {
                    self.out.push_str(&format!("export {{ {name} }};\n"));
                    self.exported.insert(name);
                }
            }
        }
        Ok(())
    }

    fn default_export(
        &mut self,
        decl: &oxc::ExportDefaultDeclaration<'_>,
        text: &str,
        index: usize,
        gap: &str,
    ) -> Result<(), TransformError> {
        // `export default Foo;` is a pure re-export of an existing binding.
        if let oxc::ExportDefaultDeclarationKind::Identifier(id) = &decl.declaration {
            self.out
                .push_str(&format!("export {{ {} as default }};\n", id.name));
            return Ok(());
        }

        let (name, unnamed) = match &decl.declaration {
            oxc::ExportDefaultDeclarationKind::FunctionDeclaration(func) => (
                func.id.as_ref().map(|id| id.name.to_string()),
                func.id.is_none(),
            ),
            oxc::ExportDefaultDeclarationKind::ClassDeclaration(class) => (
                class.id.as_ref().map(|id| id.name.to_string()),
                class.id.is_none(),
            ),
            oxc::ExportDefaultDeclarationKind::TSInterfaceDeclaration(iface) => {
                (Some(iface.id.name.to_string()), false)
            }
            _ => (None, false),
        };
        let name = name.unwrap_or_else(|| format!("var{index}"));
        self.referenced.insert(name.clone());

        let body = strip_export_prefix(text);
        let body = if unnamed {
            name_unnamed_default(body, &name)
        } else {
            body.to_string()
        };
        self.emit_tokenised(&name, &body, gap)?;
        self.out
            .push_str(&format!("export {{ {name} as default }};\n"));
        self.exported.insert(name);
        Ok(())
    }

    /// Tokenise a prepared statement body and emit `var name = [ … ];`,
    /// preceded by any statements the dynamic-import expander injected.
    fn emit_tokenised(&mut self, name: &str, body: &str, gap: &str) -> Result<(), TransformError> {
        let comments = leading_comments(gap);
        let prepared = if comments.is_empty() {
            body.to_string()
        } else {
            format!("{}\n{body}", comments.join("\n"))
        };

        let tokens = self.tokenize(&prepared)?;
        for injected in self.expander.take_injected() {
            self.out.push_str(&injected);
            self.out.push('\n');
        }

        let rendered: Vec<String> = tokens
            .iter()
            .map(|token| match token {
                Token::Ident(name) => name.clone(),
                Token::Str(text) => quote_string(text),
            })
            .collect();
        self.out
            .push_str(&format!("var {name} = [{}];\n", rendered.join(", ")));
        Ok(())
    }

    fn tokenize(&mut self, text: &str) -> Result<Vec<Token>, TransformError> {
        let mut tokens = Vec::new();
        let mut acc = String::new();
        let mut last = 0usize;

        let matches: Vec<(usize, usize)> = TOKENIZE
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();
        for (start, end) in matches {
            acc.push_str(&text[last..start]);
            last = end;
            let unit = &text[start..end];

            if unit.starts_with("import") && unit.contains('(') {
                let ident = self.expander.expand(unit)?;
                flush(&mut tokens, &mut acc);
                tokens.push(Token::Ident(ident));
            } else if is_identifier_like(unit)
                && (self.referenced.contains(unit) || CAPITAL_LETTER.is_match(unit))
            {
                flush(&mut tokens, &mut acc);
                tokens.push(Token::Ident(unit.to_string()));
            } else {
                acc.push_str(unit);
            }
        }
        acc.push_str(&text[last..]);
        flush(&mut tokens, &mut acc);
        Ok(tokens)
    }
}

fn flush(tokens: &mut Vec<Token>, acc: &mut String) {
    if !acc.is_empty() {
        tokens.push(Token::Str(std::mem::take(acc)));
    }
}

fn quote_string(text: &str) -> String {
    let escaped = escape(&text.replace('\\', "\\\\").replace('"', "\\\""));
    format!("\"{escaped}\"")
}

/// Locals bound by import statements: default, named and namespace
/// specifiers all count as referenced names.
fn imported_locals(program: &oxc::Program<'_>) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in &program.body {
        if let oxc::Statement::ImportDeclaration(decl) = stmt {
            if let Some(specs) = &decl.specifiers {
                for spec in specs {
                    let local = match spec {
                        oxc::ImportDeclarationSpecifier::ImportSpecifier(s) => &s.local,
                        oxc::ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => &s.local,
                        oxc::ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => &s.local,
                    };
                    names.insert(local.name.to_string());
                }
            }
        }
    }
    names
}
