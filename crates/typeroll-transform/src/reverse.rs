//! Reverse transform: one bundled fake-JS module back to declaration text.
//!
//! The bundler may have renamed identifiers to resolve collisions,
//! synthesised namespace objects (`exports_*` locals populated through a
//! helper call), and re-exported those objects under user-facing names. The
//! alias map is recovered first so every later fragment can print the name
//! the consumer expects.

use indexmap::IndexMap;
use oxc_ast::ast as oxc;
use oxc_span::GetSpan;

use typeroll_syntax::{
    module_export_name, strip_bundle_extension, unescape, ModuleParser, SYNTHETIC_NAMESPACE,
};

use crate::error::TransformError;

/// Convert one bundled fake-JS module into declaration text.
pub fn bundled_to_declaration(source: &str) -> Result<String, TransformError> {
    let parser = ModuleParser::new();
    let ret = parser.parse_module(source);
    if ret.panicked {
        return Err(TransformError::Parse {
            context: "bundled module",
            message: ret
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "parser panicked".to_string()),
        });
    }

    let aliases = namespace_aliases(&ret.program);
    let mut fragments: Vec<String> = Vec::new();

    for stmt in &ret.program.body {
        match stmt {
            oxc::Statement::ImportDeclaration(decl) => {
                fragments.push(splice_specifier(source, stmt.span(), &decl.source));
            }
            oxc::Statement::ExportAllDeclaration(decl) => {
                fragments.push(splice_specifier(source, stmt.span(), &decl.source));
            }
            oxc::Statement::ExportNamedDeclaration(decl) if decl.declaration.is_none() => {
                if let Some(fragment) = re_export(decl, &aliases) {
                    fragments.push(fragment);
                }
            }
            oxc::Statement::ExpressionStatement(expr_stmt) => {
                if let oxc::Expression::CallExpression(call) = &expr_stmt.expression {
                    if let Some(fragment) = namespace_block(call, &aliases) {
                        fragments.push(fragment);
                    }
                }
            }
            oxc::Statement::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    if let Some(fragment) = declarator_fragment(source, declarator, &aliases) {
                        fragments.push(fragment);
                    }
                }
            }
            _ => {}
        }
    }

    if fragments.is_empty() {
        return Ok(String::new());
    }
    let mut out = fragments.join("\n");
    out.push('\n');
    Ok(out)
}

/// Map from bundler-synthesised namespace locals to the user-facing names.
/// Namespace imports map to themselves; `export { exports_X as Y }` maps the
/// synthetic local to `Y`.
fn namespace_aliases(program: &oxc::Program<'_>) -> IndexMap<String, String> {
    let mut aliases = IndexMap::new();
    for stmt in &program.body {
        if let oxc::Statement::ImportDeclaration(decl) = stmt {
            if let Some(specs) = &decl.specifiers {
                for spec in specs {
                    if let oxc::ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns) = spec {
                        aliases.insert(ns.local.name.to_string(), ns.local.name.to_string());
                    }
                }
            }
        }
    }
    for stmt in &program.body {
        if let oxc::Statement::ExportNamedDeclaration(decl) = stmt {
            if decl.declaration.is_none() && decl.source.is_none() {
                for spec in &decl.specifiers {
                    let local = module_export_name(&spec.local);
                    if SYNTHETIC_NAMESPACE.is_match(&local) {
                        aliases.insert(local, module_export_name(&spec.exported));
                    }
                }
            }
        }
    }
    aliases
}

fn remap<'m>(name: &'m str, aliases: &'m IndexMap<String, String>) -> &'m str {
    aliases.get(name).map(String::as_str).unwrap_or(name)
}

/// Re-emit a statement verbatim with the runtime extension stripped from its
/// module specifier.
fn splice_specifier(source: &str, span: oxc_span::Span, lit: &oxc::StringLiteral<'_>) -> String {
    let text = &source[span.start as usize..span.end as usize];
    let rel_start = (lit.span.start - span.start) as usize;
    let rel_end = (lit.span.end - span.start) as usize;
    let stripped = strip_bundle_extension(lit.value.as_str());
    format!(
        "{}{stripped}{}",
        &text[..rel_start + 1],
        &text[rel_end - 1..]
    )
}

/// Rebuild `export { … }` with synthetic namespace locals rewritten to their
/// user-visible names.
fn re_export(
    decl: &oxc::ExportNamedDeclaration<'_>,
    aliases: &IndexMap<String, String>,
) -> Option<String> {
    if decl.specifiers.is_empty() {
        return None;
    }
    let specs: Vec<String> = decl
        .specifiers
        .iter()
        .map(|spec| {
            let local = module_export_name(&spec.local);
            let exported = module_export_name(&spec.exported);
            let visible = remap(&local, aliases);
            if visible == exported {
                exported
            } else {
                format!("{visible} as {exported}")
            }
        })
        .collect();
    let list = specs.join(", ");
    match &decl.source {
        Some(source) => {
            let stripped = strip_bundle_extension(source.value.as_str());
            Some(format!("export {{ {list} }} from \"{stripped}\";"))
        }
        None => Some(format!("export {{ {list} }};")),
    }
}

/// Recognise a namespace-synthesis call `NS(id, { k: () => v, … })` and
/// lower it to a `declare namespace` block.
fn namespace_block(
    call: &oxc::CallExpression<'_>,
    aliases: &IndexMap<String, String>,
) -> Option<String> {
    if call.arguments.len() != 2 {
        return None;
    }
    let oxc::Argument::Identifier(target) = &call.arguments[0] else {
        return None;
    };
    let oxc::Argument::ObjectExpression(object) = &call.arguments[1] else {
        return None;
    };

    let mut specs = Vec::new();
    for prop in &object.properties {
        let oxc::ObjectPropertyKind::ObjectProperty(prop) = prop else {
            continue;
        };
        let key = match &prop.key {
            oxc::PropertyKey::StaticIdentifier(id) => id.name.to_string(),
            oxc::PropertyKey::StringLiteral(lit) => lit.value.to_string(),
            _ => continue,
        };
        let oxc::Expression::ArrowFunctionExpression(arrow) = &prop.value else {
            continue;
        };
        let Some(value) = arrow_body_identifier(arrow) else {
            continue;
        };
        let value = remap(value, aliases);
        if value == key {
            specs.push(key);
        } else {
            specs.push(format!("{value} as {key}"));
        }
    }
    if specs.is_empty() {
        return None;
    }

    let name = remap(target.name.as_str(), aliases);
    Some(format!(
        "declare namespace {name} {{\n  export {{ {} }};\n}}",
        specs.join(", ")
    ))
}

fn arrow_body_identifier<'a>(arrow: &'a oxc::ArrowFunctionExpression<'a>) -> Option<&'a str> {
    if !arrow.expression {
        return None;
    }
    match arrow.body.statements.first()? {
        oxc::Statement::ExpressionStatement(stmt) => match &stmt.expression {
            oxc::Expression::Identifier(id) => Some(id.name.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// Lower one variable declarator back to declaration text.
fn declarator_fragment(
    source: &str,
    declarator: &oxc::VariableDeclarator<'_>,
    aliases: &IndexMap<String, String>,
) -> Option<String> {
    let oxc::BindingPatternKind::BindingIdentifier(id) = &declarator.id.kind else {
        return None;
    };
    let name = remap(id.name.as_str(), aliases);

    match declarator.init.as_ref()? {
        oxc::Expression::ArrayExpression(array) => {
            let mut text = String::new();
            for element in &array.elements {
                match element {
                    oxc::ArrayExpressionElement::StringLiteral(lit) => {
                        text.push_str(&unescape(lit.value.as_str()));
                    }
                    oxc::ArrayExpressionElement::Identifier(ident) => {
                        text.push_str(remap(ident.name.as_str(), aliases));
                    }
                    oxc::ArrayExpressionElement::TemplateLiteral(template) => {
                        text.push_str(&template_text(template, aliases));
                    }
                    _ => {}
                }
            }
            Some(text)
        }
        // `var X = Y;` is a rename edge the bundler created for an aliased
        // type reference.
        oxc::Expression::Identifier(target) => Some(format!(
            "type {name} = {};",
            remap(target.name.as_str(), aliases)
        )),
        oxc::Expression::StaticMemberExpression(_)
        | oxc::Expression::ComputedMemberExpression(_) => {
            let (root, path) = flatten_member(declarator.init.as_ref()?)?;
            let accesses: String = path.iter().map(|p| format!("['{p}']")).collect();
            Some(format!("type {name} = {}{accesses};", remap(&root, aliases)))
        }
        oxc::Expression::CallExpression(call) => {
            let callee = callee_text(&call.callee, aliases)?;
            let args: Vec<String> = call
                .arguments
                .iter()
                .filter_map(|arg| argument_text(source, arg, aliases))
                .collect();
            Some(format!("type {name} = {callee}({});", args.join(", ")))
        }
        _ => None,
    }
}

fn template_text(
    template: &oxc::TemplateLiteral<'_>,
    aliases: &IndexMap<String, String>,
) -> String {
    let mut text = String::new();
    for (i, quasi) in template.quasis.iter().enumerate() {
        let cooked = quasi
            .value
            .cooked
            .as_ref()
            .map(|c| c.as_str())
            .unwrap_or_else(|| quasi.value.raw.as_str());
        text.push_str(&unescape(cooked));
        if let Some(expr) = template.expressions.get(i) {
            if let oxc::Expression::Identifier(id) = expr {
                text.push_str(remap(id.name.as_str(), aliases));
            }
        }
    }
    text
}

/// Flatten `A.B["c"]…` into a root identifier plus access names.
fn flatten_member(expr: &oxc::Expression<'_>) -> Option<(String, Vec<String>)> {
    match expr {
        oxc::Expression::Identifier(id) => Some((id.name.to_string(), Vec::new())),
        oxc::Expression::StaticMemberExpression(member) => {
            let (root, mut path) = flatten_member(&member.object)?;
            path.push(member.property.name.to_string());
            Some((root, path))
        }
        oxc::Expression::ComputedMemberExpression(member) => {
            let (root, mut path) = flatten_member(&member.object)?;
            match &member.expression {
                oxc::Expression::StringLiteral(lit) => path.push(lit.value.to_string()),
                _ => return None,
            }
            Some((root, path))
        }
        _ => None,
    }
}

fn callee_text(expr: &oxc::Expression<'_>, aliases: &IndexMap<String, String>) -> Option<String> {
    match expr {
        oxc::Expression::Identifier(id) => Some(remap(id.name.as_str(), aliases).to_string()),
        oxc::Expression::StaticMemberExpression(_) | oxc::Expression::ComputedMemberExpression(_) => {
            let (root, path) = flatten_member(expr)?;
            Some(dotted(&root, &path, aliases))
        }
        _ => None,
    }
}

fn dotted(root: &str, path: &[String], aliases: &IndexMap<String, String>) -> String {
    let mut text = remap(root, aliases).to_string();
    for part in path {
        text.push('.');
        text.push_str(part);
    }
    text
}

fn argument_text(
    source: &str,
    arg: &oxc::Argument<'_>,
    aliases: &IndexMap<String, String>,
) -> Option<String> {
    match arg {
        oxc::Argument::Identifier(id) => Some(remap(id.name.as_str(), aliases).to_string()),
        oxc::Argument::StringLiteral(lit) => Some(format!("\"{}\"", lit.value)),
        oxc::Argument::NumericLiteral(num) => {
            Some(source[num.span.start as usize..num.span.end as usize].to_string())
        }
        oxc::Argument::StaticMemberExpression(member) => {
            let (root, mut path) = flatten_member(&member.object)?;
            path.push(member.property.name.to_string());
            Some(dotted(&root, &path, aliases))
        }
        oxc::Argument::ComputedMemberExpression(member) => {
            let (root, mut path) = flatten_member(&member.object)?;
            match &member.expression {
                oxc::Expression::StringLiteral(lit) => path.push(lit.value.to_string()),
                _ => return None,
            }
            Some(dotted(&root, &path, aliases))
        }
        _ => None,
    }
}
