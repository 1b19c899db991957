//! Syntactic predicates and small textual rewrites over top-level statements.
//!
//! Nothing here resolves anything: the helpers only classify statement
//! shapes, pull out the single obvious declared name, and rewrite statement
//! text at the `export` boundary.

use oxc_ast::ast as oxc;

use crate::rules::{
    EXPORT_TYPE_PREFIX, IMPORT_EXPORT_NAMES, IMPORT_EXPORT_WITH_DEFAULT, IMPORT_TYPE_PREFIX,
    TYPE_WORD,
};

/// `import …` of any shape.
pub fn is_import(stmt: &oxc::Statement<'_>) -> bool {
    matches!(stmt, oxc::Statement::ImportDeclaration(_))
}

/// `import "module";`, an import with no specifiers.
pub fn is_side_effect_import(stmt: &oxc::Statement<'_>) -> bool {
    match stmt {
        oxc::Statement::ImportDeclaration(decl) => decl
            .specifiers
            .as_ref()
            .map_or(true, |specs| specs.is_empty()),
        _ => false,
    }
}

/// `export * from "module";`
pub fn is_export_all(stmt: &oxc::Statement<'_>) -> bool {
    matches!(stmt, oxc::Statement::ExportAllDeclaration(_))
}

/// `export { … }` with no local declaration (optionally `from "module"`).
pub fn is_re_export(stmt: &oxc::Statement<'_>) -> bool {
    match stmt {
        oxc::Statement::ExportNamedDeclaration(decl) => decl.declaration.is_none(),
        _ => false,
    }
}

/// `export <declaration>`, a named export carrying its declaration.
pub fn has_export_modifier(stmt: &oxc::Statement<'_>) -> bool {
    match stmt {
        oxc::Statement::ExportNamedDeclaration(decl) => decl.declaration.is_some(),
        _ => false,
    }
}

/// `export default …` of any shape.
pub fn has_default_export_modifier(stmt: &oxc::Statement<'_>) -> bool {
    matches!(stmt, oxc::Statement::ExportDefaultDeclaration(_))
}

/// `export default function/class` without an identifier.
pub fn is_unnamed_default_export(stmt: &oxc::Statement<'_>) -> bool {
    match stmt {
        oxc::Statement::ExportDefaultDeclaration(decl) => match &decl.declaration {
            oxc::ExportDefaultDeclarationKind::FunctionDeclaration(func) => func.id.is_none(),
            oxc::ExportDefaultDeclarationKind::ClassDeclaration(class) => class.id.is_none(),
            _ => false,
        },
        _ => false,
    }
}

/// `export default Name;`, a default export of a plain identifier.
pub fn is_default_re_export(stmt: &oxc::Statement<'_>) -> bool {
    match stmt {
        oxc::Statement::ExportDefaultDeclaration(decl) => matches!(
            &decl.declaration,
            oxc::ExportDefaultDeclarationKind::Identifier(_)
        ),
        _ => false,
    }
}

/// The single declared identifier of a statement, when there is one obvious
/// name. Variable declarations qualify only with exactly one declarator
/// binding a plain identifier.
pub fn declared_name(stmt: &oxc::Statement<'_>) -> Option<String> {
    match stmt {
        oxc::Statement::TSInterfaceDeclaration(decl) => Some(decl.id.name.to_string()),
        oxc::Statement::TSTypeAliasDeclaration(decl) => Some(decl.id.name.to_string()),
        oxc::Statement::TSEnumDeclaration(decl) => Some(decl.id.name.to_string()),
        oxc::Statement::ClassDeclaration(decl) => decl.id.as_ref().map(|id| id.name.to_string()),
        oxc::Statement::FunctionDeclaration(decl) => {
            decl.id.as_ref().map(|id| id.name.to_string())
        }
        oxc::Statement::TSModuleDeclaration(decl) => match &decl.id {
            oxc::TSModuleDeclarationName::Identifier(id) => Some(id.name.to_string()),
            oxc::TSModuleDeclarationName::StringLiteral(_) => None,
        },
        oxc::Statement::VariableDeclaration(decl) => single_var_name(decl),
        oxc::Statement::ExportNamedDeclaration(export) => {
            export.declaration.as_ref().and_then(declaration_name)
        }
        oxc::Statement::ExportDefaultDeclaration(export) => match &export.declaration {
            oxc::ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                func.id.as_ref().map(|id| id.name.to_string())
            }
            oxc::ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                class.id.as_ref().map(|id| id.name.to_string())
            }
            oxc::ExportDefaultDeclarationKind::TSInterfaceDeclaration(decl) => {
                Some(decl.id.name.to_string())
            }
            _ => None,
        },
        _ => None,
    }
}

/// Like [`declared_name`] for the inner declaration of a named export.
pub fn declaration_name(decl: &oxc::Declaration<'_>) -> Option<String> {
    match decl {
        oxc::Declaration::TSInterfaceDeclaration(d) => Some(d.id.name.to_string()),
        oxc::Declaration::TSTypeAliasDeclaration(d) => Some(d.id.name.to_string()),
        oxc::Declaration::TSEnumDeclaration(d) => Some(d.id.name.to_string()),
        oxc::Declaration::ClassDeclaration(d) => d.id.as_ref().map(|id| id.name.to_string()),
        oxc::Declaration::FunctionDeclaration(d) => d.id.as_ref().map(|id| id.name.to_string()),
        oxc::Declaration::TSModuleDeclaration(d) => match &d.id {
            oxc::TSModuleDeclarationName::Identifier(id) => Some(id.name.to_string()),
            oxc::TSModuleDeclarationName::StringLiteral(_) => None,
        },
        oxc::Declaration::VariableDeclaration(d) => single_var_name(d),
        _ => None,
    }
}

fn single_var_name(decl: &oxc::VariableDeclaration<'_>) -> Option<String> {
    if decl.declarations.len() != 1 {
        return None;
    }
    match &decl.declarations[0].id.kind {
        oxc::BindingPatternKind::BindingIdentifier(id) => Some(id.name.to_string()),
        _ => None,
    }
}

/// Render a module export name (`a`, `default`, `"string name"`) as text.
pub fn module_export_name(name: &oxc::ModuleExportName<'_>) -> String {
    match name {
        oxc::ModuleExportName::IdentifierName(id) => id.name.to_string(),
        oxc::ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        oxc::ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Strip a leading `export ` or `export default ` from statement text.
pub fn strip_export_prefix(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("export") else {
        return text;
    };
    let rest = rest.trim_start();
    if let Some(after_default) = rest.strip_prefix("default") {
        // Only treat it as the modifier when a declaration follows.
        let after_default = after_default.trim_start();
        if !after_default.is_empty() {
            return after_default;
        }
    }
    rest
}

/// Insert a synthesised name into an unnamed default function/class
/// declaration text (already stripped of its `export default ` prefix).
pub fn name_unnamed_default(text: &str, name: &str) -> String {
    for keyword in ["declare function", "declare class", "function", "class"] {
        if let Some(rest) = text.strip_prefix(keyword) {
            return format!("{keyword} {name}{rest}");
        }
    }
    text.to_string()
}

/// Erase type-only syntax from an import/export statement slice so it reads
/// as a plain runtime import/export: `import type` / `export type` become
/// `import` / `export`, and per-specifier `type ` modifiers are dropped.
pub fn jsify_import_export(text: &str) -> String {
    let no_import_type = IMPORT_TYPE_PREFIX.replace(text, "import ");
    let no_type = EXPORT_TYPE_PREFIX.replace(&no_import_type, "export ");
    let text: &str = &no_type;
    let strip_specifier_types = |head: &str, names: &str| {
        format!("{head}{{{}}}", TYPE_WORD.replace_all(names, ""))
    };
    if let Some(caps) = IMPORT_EXPORT_WITH_DEFAULT.captures(text) {
        let rewritten = strip_specifier_types(&caps[1], &caps[2]);
        return format!("{rewritten}{}", &text[caps.get(0).unwrap().end()..]);
    }
    if let Some(caps) = IMPORT_EXPORT_NAMES.captures(text) {
        let rewritten = strip_specifier_types(&caps[1], &caps[2]);
        return format!("{rewritten}{}", &text[caps.get(0).unwrap().end()..]);
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ModuleParser;

    fn first_stmt_check(source: &str, check: impl Fn(&oxc::Statement<'_>)) {
        let parser = ModuleParser::new();
        let ret = parser.parse_dts(source);
        assert!(ret.errors.is_empty(), "parse failed: {:?}", ret.errors);
        check(ret.program.body.first().expect("one statement"));
    }

    #[test]
    fn classifies_side_effect_import() {
        first_stmt_check("import \"./polyfill\";", |stmt| {
            assert!(is_import(stmt));
            assert!(is_side_effect_import(stmt));
        });
        first_stmt_check("import { A } from \"./a\";", |stmt| {
            assert!(!is_side_effect_import(stmt));
        });
    }

    #[test]
    fn classifies_re_export_and_export_all() {
        first_stmt_check("export { A } from \"./a\";", |stmt| {
            assert!(is_re_export(stmt));
        });
        first_stmt_check("export * from \"./a\";", |stmt| {
            assert!(is_export_all(stmt));
        });
    }

    #[test]
    fn finds_declared_names() {
        first_stmt_check("export interface User { id: number }", |stmt| {
            assert!(has_export_modifier(stmt));
            assert_eq!(declared_name(stmt).as_deref(), Some("User"));
        });
        first_stmt_check("declare function greet(name: string): void;", |stmt| {
            assert_eq!(declared_name(stmt).as_deref(), Some("greet"));
        });
        first_stmt_check("declare const a: number, b: number;", |stmt| {
            assert_eq!(declared_name(stmt), None);
        });
    }

    #[test]
    fn detects_unnamed_default() {
        first_stmt_check("export default function(): number;", |stmt| {
            assert!(has_default_export_modifier(stmt));
            assert!(is_unnamed_default_export(stmt));
        });
        first_stmt_check("export default class Named {}", |stmt| {
            assert!(!is_unnamed_default_export(stmt));
        });
    }

    #[test]
    fn strips_export_prefixes() {
        assert_eq!(
            strip_export_prefix("export interface A {}"),
            "interface A {}"
        );
        assert_eq!(
            strip_export_prefix("export default function(): void;"),
            "function(): void;"
        );
        assert_eq!(strip_export_prefix("interface A {}"), "interface A {}");
    }

    #[test]
    fn names_unnamed_defaults() {
        assert_eq!(
            name_unnamed_default("function(): number;", "var0"),
            "function var0(): number;"
        );
        assert_eq!(
            name_unnamed_default("class { x: number }", "var3"),
            "class var3 { x: number }"
        );
    }

    #[test]
    fn jsifies_type_only_imports() {
        assert_eq!(
            jsify_import_export("import type { User } from \"./m\";"),
            "import { User } from \"./m\";"
        );
        assert_eq!(
            jsify_import_export("import { type A, B } from \"./m\";"),
            "import { A, B } from \"./m\";"
        );
        assert_eq!(
            jsify_import_export("import Def, { type A } from \"./m\";"),
            "import Def, { A } from \"./m\";"
        );
        assert_eq!(
            jsify_import_export("export type { T } from \"./m\";"),
            "export { T } from \"./m\";"
        );
    }
}
