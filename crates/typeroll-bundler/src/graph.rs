//! Module graph construction.
//!
//! Each fake-JS module is parsed once and reduced to the tables the linker
//! needs: import bindings, token-array declarations, an export map, and
//! export-all edges. Ordering between files does not matter; the graph is
//! walked breadth-first from the entries and cycles are tolerated.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use oxc_ast::ast as oxc;
use oxc_span::GetSpan;
use typeroll_syntax::{module_export_name, ModuleParser};

use crate::{BundleError, Loader, Resolution, Resolver};

/// One element of a token-array declaration.
#[derive(Debug, Clone)]
pub(crate) enum Token {
    Str(String),
    Ident(String),
}

/// Where an import edge leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Edge {
    Internal(PathBuf),
    External(String),
}

/// What an import binding or re-export pulls from its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Imported {
    Named(String),
    Default,
    Namespace,
}

#[derive(Debug)]
pub(crate) struct ImportBinding {
    pub edge: Edge,
    pub imported: Imported,
}

/// Initialiser shapes the forward transform can produce.
#[derive(Debug)]
pub(crate) enum DeclInit {
    /// `var X = [ …tokens… ];`
    Array(Vec<Token>),
    /// `var X = Y;`
    Alias(String),
    /// `var X = Root.a["b"];` as root identifier plus the raw access tail.
    Member { root: String, tail: String },
    /// Anything else is carried through untouched.
    Opaque(String),
}

#[derive(Debug)]
pub(crate) struct Decl {
    pub init: DeclInit,
}

impl Decl {
    /// Identifier references this declaration makes within its module.
    pub fn refs(&self) -> Vec<&str> {
        match &self.init {
            DeclInit::Array(tokens) => tokens
                .iter()
                .filter_map(|t| match t {
                    Token::Ident(name) => Some(name.as_str()),
                    Token::Str(_) => None,
                })
                .collect(),
            DeclInit::Alias(name) => vec![name.as_str()],
            DeclInit::Member { root, .. } => vec![root.as_str()],
            DeclInit::Opaque(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ExportTarget {
    Local(String),
    Reexport { edge: Edge, imported: Imported },
}

#[derive(Debug)]
pub(crate) struct Module {
    pub id: PathBuf,
    /// Import bindings keyed by local name.
    pub bindings: IndexMap<String, ImportBinding>,
    /// Token-array declarations keyed by declared name.
    pub decls: IndexMap<String, Decl>,
    /// Export map keyed by exported name.
    pub exports: IndexMap<String, ExportTarget>,
    /// `export * from …` edges without an alias.
    pub export_alls: Vec<Edge>,
}

#[derive(Debug, Default)]
pub(crate) struct ModuleGraph {
    pub modules: IndexMap<PathBuf, Module>,
}

impl ModuleGraph {
    pub fn load(
        entries: &[PathBuf],
        resolver: &dyn Resolver,
        loader: &dyn Loader,
    ) -> Result<Self, BundleError> {
        let mut graph = ModuleGraph::default();
        let mut queue: VecDeque<PathBuf> = entries.iter().cloned().collect();
        let mut seen: HashSet<PathBuf> = queue.iter().cloned().collect();

        while let Some(id) = queue.pop_front() {
            let source = loader.load(&id)?;
            let module = parse_module(&id, &source, resolver)?;
            for edge in module.edges() {
                if let Edge::Internal(path) = edge {
                    if seen.insert(path.clone()) {
                        queue.push_back(path.clone());
                    }
                }
            }
            graph.modules.insert(id, module);
        }
        Ok(graph)
    }

    pub fn index_of(&self, path: &Path) -> Option<usize> {
        self.modules.get_index_of(path)
    }

    pub fn module(&self, index: usize) -> &Module {
        self.modules.get_index(index).expect("module index").1
    }

    /// Post-order traversal over internal edges starting at `start`;
    /// dependencies come before dependents, cycles are cut at the back edge.
    pub fn reachable(&self, start: usize) -> Vec<usize> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        self.post_order(start, &mut visited, &mut order);
        order
    }

    fn post_order(&self, index: usize, visited: &mut HashSet<usize>, order: &mut Vec<usize>) {
        if !visited.insert(index) {
            return;
        }
        for edge in self.module(index).edges() {
            if let Edge::Internal(path) = edge {
                if let Some(dep) = self.index_of(path) {
                    self.post_order(dep, visited, order);
                }
            }
        }
        order.push(index);
    }
}

impl Module {
    fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.bindings
            .values()
            .map(|b| &b.edge)
            .chain(self.exports.values().filter_map(|e| match e {
                ExportTarget::Reexport { edge, .. } => Some(edge),
                ExportTarget::Local(_) => None,
            }))
            .chain(self.export_alls.iter())
    }
}

fn resolve_edge(
    resolver: &dyn Resolver,
    specifier: &str,
    importer: &Path,
) -> Result<Edge, BundleError> {
    Ok(match resolver.resolve(specifier, Some(importer))? {
        Resolution::Internal(path) => Edge::Internal(path),
        Resolution::External(spec) => Edge::External(spec),
    })
}

fn parse_module(
    id: &Path,
    source: &str,
    resolver: &dyn Resolver,
) -> Result<Module, BundleError> {
    let parser = ModuleParser::new();
    let ret = parser.parse_module(source);
    if ret.panicked {
        return Err(BundleError::Parse {
            path: id.to_path_buf(),
            message: ret
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "parser panicked".to_string()),
        });
    }

    let mut module = Module {
        id: id.to_path_buf(),
        bindings: IndexMap::new(),
        decls: IndexMap::new(),
        exports: IndexMap::new(),
        export_alls: Vec::new(),
    };

    for stmt in &ret.program.body {
        match stmt {
            oxc::Statement::ImportDeclaration(decl) => {
                let edge = resolve_edge(resolver, decl.source.value.as_str(), id)?;
                let Some(specs) = &decl.specifiers else {
                    continue;
                };
                for spec in specs {
                    let (local, imported) = match spec {
                        oxc::ImportDeclarationSpecifier::ImportSpecifier(s) => (
                            s.local.name.to_string(),
                            Imported::Named(module_export_name(&s.imported)),
                        ),
                        oxc::ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                            (s.local.name.to_string(), Imported::Default)
                        }
                        oxc::ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                            (s.local.name.to_string(), Imported::Namespace)
                        }
                    };
                    module.bindings.insert(
                        local,
                        ImportBinding {
                            edge: edge.clone(),
                            imported,
                        },
                    );
                }
            }
            oxc::Statement::ExportAllDeclaration(decl) => {
                let edge = resolve_edge(resolver, decl.source.value.as_str(), id)?;
                match &decl.exported {
                    Some(name) => {
                        module.exports.insert(
                            module_export_name(name),
                            ExportTarget::Reexport {
                                edge,
                                imported: Imported::Namespace,
                            },
                        );
                    }
                    None => module.export_alls.push(edge),
                }
            }
            oxc::Statement::ExportNamedDeclaration(decl) if decl.declaration.is_none() => {
                match &decl.source {
                    Some(source) => {
                        let edge = resolve_edge(resolver, source.value.as_str(), id)?;
                        for spec in &decl.specifiers {
                            let local = module_export_name(&spec.local);
                            let imported = if local == "default" {
                                Imported::Default
                            } else {
                                Imported::Named(local)
                            };
                            module.exports.insert(
                                module_export_name(&spec.exported),
                                ExportTarget::Reexport {
                                    edge: edge.clone(),
                                    imported,
                                },
                            );
                        }
                    }
                    None => {
                        for spec in &decl.specifiers {
                            module.exports.insert(
                                module_export_name(&spec.exported),
                                ExportTarget::Local(module_export_name(&spec.local)),
                            );
                        }
                    }
                }
            }
            oxc::Statement::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    let oxc::BindingPatternKind::BindingIdentifier(binding) = &declarator.id.kind
                    else {
                        continue;
                    };
                    let init = declarator_init(source, declarator);
                    module
                        .decls
                        .insert(binding.name.to_string(), Decl { init });
                }
            }
            _ => {}
        }
    }
    Ok(module)
}

fn declarator_init(source: &str, declarator: &oxc::VariableDeclarator<'_>) -> DeclInit {
    let Some(init) = &declarator.init else {
        return DeclInit::Opaque(String::new());
    };
    match init {
        oxc::Expression::ArrayExpression(array) => {
            let mut tokens = Vec::new();
            for element in &array.elements {
                match element {
                    oxc::ArrayExpressionElement::StringLiteral(lit) => {
                        tokens.push(Token::Str(lit.value.to_string()));
                    }
                    oxc::ArrayExpressionElement::Identifier(ident) => {
                        tokens.push(Token::Ident(ident.name.to_string()));
                    }
                    oxc::ArrayExpressionElement::TemplateLiteral(template) => {
                        for (i, quasi) in template.quasis.iter().enumerate() {
                            let cooked = quasi
                                .value
                                .cooked
                                .as_ref()
                                .map(|c| c.as_str())
                                .unwrap_or_else(|| quasi.value.raw.as_str());
                            if !cooked.is_empty() {
                                tokens.push(Token::Str(cooked.to_string()));
                            }
                            if let Some(oxc::Expression::Identifier(id)) =
                                template.expressions.get(i)
                            {
                                tokens.push(Token::Ident(id.name.to_string()));
                            }
                        }
                    }
                    _ => {}
                }
            }
            DeclInit::Array(tokens)
        }
        oxc::Expression::Identifier(id) => DeclInit::Alias(id.name.to_string()),
        oxc::Expression::StaticMemberExpression(_) | oxc::Expression::ComputedMemberExpression(_) => {
            member_init(source, init)
        }
        other => {
            let span = other.span();
            DeclInit::Opaque(source[span.start as usize..span.end as usize].to_string())
        }
    }
}

fn member_init(source: &str, expr: &oxc::Expression<'_>) -> DeclInit {
    // Walk to the innermost object identifier; the access tail is reused
    // verbatim.
    let mut object = expr;
    loop {
        object = match object {
            oxc::Expression::StaticMemberExpression(member) => &member.object,
            oxc::Expression::ComputedMemberExpression(member) => &member.object,
            _ => break,
        };
    }
    let oxc::Expression::Identifier(root) = object else {
        let span = expr.span();
        return DeclInit::Opaque(source[span.start as usize..span.end as usize].to_string());
    };
    let expr_span = expr.span();
    let root_end = root.span.end as usize;
    DeclInit::Member {
        root: root.name.to_string(),
        tail: source[root_end..expr_span.end as usize].to_string(),
    }
}
