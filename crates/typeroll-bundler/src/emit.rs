//! Output emission: per-entry concatenation, namespace synthesis, external
//! import merging, code splitting, and output naming.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};

use crate::graph::{DeclInit, Edge, Imported, ModuleGraph, Token};
use crate::link::{Linker, Target};
use crate::{Bundle, BundleError, BundleOptions, BundleOutput, OutputKind};

pub(crate) fn emit_bundle(
    graph: &ModuleGraph,
    entries: &[PathBuf],
    options: &BundleOptions,
) -> Result<Bundle, BundleError> {
    let mut linker = Linker::new(graph);

    let entry_indices: Vec<usize> = entries
        .iter()
        .filter_map(|entry| graph.index_of(entry))
        .collect();

    let surfaces: Vec<Vec<(String, Target)>> = entry_indices
        .iter()
        .map(|&entry| linker.export_surface(entry))
        .collect();
    linker.prepare_ns_names(surfaces.iter().flatten());

    let includes: Vec<Vec<usize>> = entry_indices
        .iter()
        .map(|&entry| graph.reachable(entry))
        .collect();
    let marks: Vec<HashSet<Target>> = surfaces
        .iter()
        .map(|surface| linker.mark(surface.iter().map(|(_, t)| t.clone())))
        .collect();

    // Modules reachable from more than one entry move to a shared chunk.
    let mut shared: IndexSet<usize> = IndexSet::new();
    if options.splitting && entry_indices.len() > 1 {
        let mut counts: IndexMap<usize, usize> = IndexMap::new();
        for include in &includes {
            for &module in include {
                *counts.entry(module).or_default() += 1;
            }
        }
        for (&module, &count) in &counts {
            if count >= 2 && !entry_indices.contains(&module) {
                shared.insert(module);
            }
        }
    }

    let mut outputs = Vec::new();
    let mut filenames: HashSet<String> = HashSet::new();

    let chunk = if shared.is_empty() {
        None
    } else {
        let chunk_modules: Vec<usize> = {
            // deterministic order: global graph order restricted to shared
            (0..graph.modules.len())
                .filter(|index| shared.contains(index))
                .collect()
        };
        let chunk_marks: HashSet<Target> = marks
            .iter()
            .flatten()
            .filter(|target| in_modules(target, &shared))
            .cloned()
            .collect();
        // Everything marked in a shared module is exported from the chunk
        // under its final name; entries import what they use.
        let chunk_exports: Vec<(String, Target)> = chunk_marks
            .iter()
            .filter_map(|target| linker.target_text(target).map(|name| (name, target.clone())))
            .collect::<IndexMap<String, Target>>()
            .into_iter()
            .collect();
        let mut sorted_exports = chunk_exports;
        sorted_exports.sort_by(|a, b| a.0.cmp(&b.0));

        let filename = unique_filename(
            &mut filenames,
            &apply_naming(options.naming.as_deref(), &chunk_stem(graph, &chunk_modules)),
        );
        let code = render_output(
            &linker,
            &OutputSpec {
                modules: chunk_modules,
                marks: &chunk_marks,
                exports: sorted_exports.clone(),
                external_export_alls: Vec::new(),
                chunk_import: None,
            },
        );
        outputs.push(BundleOutput {
            kind: OutputKind::Chunk,
            filename: filename.clone(),
            code,
        });
        Some((filename, chunk_marks, sorted_exports))
    };

    for (position, &entry) in entry_indices.iter().enumerate() {
        let entry_module = graph.module(entry);
        let stem = Path::new(&entry_module.id)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index")
            .to_string();
        let filename = unique_filename(
            &mut filenames,
            &apply_naming(options.naming.as_deref(), &stem),
        );

        let modules: Vec<usize> = includes[position]
            .iter()
            .copied()
            .filter(|module| !shared.contains(module))
            .collect();

        let chunk_import = chunk.as_ref().and_then(|(chunk_file, chunk_marks, _)| {
            let needed: Vec<String> = marks[position]
                .iter()
                .filter(|target| chunk_marks.contains(*target))
                .filter_map(|target| linker.target_text(target))
                .collect::<IndexSet<String>>()
                .into_iter()
                .collect();
            if needed.is_empty() {
                None
            } else {
                let mut needed = needed;
                needed.sort();
                Some((format!("./{chunk_file}"), needed))
            }
        });

        let external_export_alls: Vec<String> = entry_module
            .export_alls
            .iter()
            .filter_map(|edge| match edge {
                Edge::External(spec) => Some(spec.clone()),
                Edge::Internal(_) => None,
            })
            .collect();

        let code = render_output(
            &linker,
            &OutputSpec {
                modules,
                marks: &marks[position],
                exports: surfaces[position].clone(),
                external_export_alls,
                chunk_import,
            },
        );
        outputs.push(BundleOutput {
            kind: OutputKind::EntryPoint,
            filename,
            code,
        });
    }

    // Entries come first in the result, in input order.
    outputs.sort_by_key(|output| matches!(output.kind, OutputKind::Chunk));
    Ok(Bundle { outputs })
}

struct OutputSpec<'s> {
    modules: Vec<usize>,
    marks: &'s HashSet<Target>,
    exports: Vec<(String, Target)>,
    external_export_alls: Vec<String>,
    chunk_import: Option<(String, Vec<String>)>,
}

fn in_modules(target: &Target, modules: &IndexSet<usize>) -> bool {
    match target {
        Target::Symbol(index, _) | Target::Ns(index) => modules.contains(index),
        _ => false,
    }
}

fn render_output(linker: &Linker<'_>, spec: &OutputSpec<'_>) -> String {
    let mut out = String::new();
    let module_set: HashSet<usize> = spec.modules.iter().copied().collect();

    // External imports actually referenced by statements emitted here.
    let needed_externals = used_externals(linker, spec, &module_set);
    let mut by_source: IndexMap<String, Vec<(Imported, String)>> = IndexMap::new();
    for ((source, imported), local) in &linker.externals {
        if !needed_externals.contains(&(source.clone(), imported.clone())) {
            continue;
        }
        by_source
            .entry(source.clone())
            .or_default()
            .push((imported.clone(), local.clone()));
    }
    for (source, uses) in &by_source {
        let mut named: Vec<String> = Vec::new();
        for (imported, local) in uses {
            match imported {
                Imported::Named(name) => {
                    if name == local {
                        named.push(name.clone());
                    } else {
                        named.push(format!("{name} as {local}"));
                    }
                }
                Imported::Default => out.push_str(&format!("import {local} from \"{source}\";\n")),
                Imported::Namespace => {
                    out.push_str(&format!("import * as {local} from \"{source}\";\n"));
                }
            }
        }
        if !named.is_empty() {
            out.push_str(&format!("import {{ {} }} from \"{source}\";\n", named.join(", ")));
        }
    }

    if let Some((specifier, names)) = &spec.chunk_import {
        out.push_str(&format!(
            "import {{ {} }} from \"{specifier}\";\n",
            names.join(", ")
        ));
    }

    for &module_index in &spec.modules {
        let module = linker.graph.module(module_index);
        for (local, decl) in &module.decls {
            let symbol = Target::Symbol(module_index, local.clone());
            if !spec.marks.contains(&symbol) {
                continue;
            }
            let final_name = linker
                .final_name(module_index, local)
                .unwrap_or(local)
                .to_string();
            match &decl.init {
                DeclInit::Array(tokens) => {
                    let rendered: Vec<String> = tokens
                        .iter()
                        .map(|token| match token {
                            Token::Str(text) => quote(text),
                            Token::Ident(name) => linker.map_ident(module_index, name),
                        })
                        .collect();
                    out.push_str(&format!("var {final_name} = [{}];\n", rendered.join(", ")));
                }
                DeclInit::Alias(name) => {
                    out.push_str(&format!(
                        "var {final_name} = {};\n",
                        linker.map_ident(module_index, name)
                    ));
                }
                DeclInit::Member { root, tail } => {
                    out.push_str(&format!(
                        "var {final_name} = {}{tail};\n",
                        linker.map_ident(module_index, root)
                    ));
                }
                DeclInit::Opaque(text) => {
                    if !text.is_empty() {
                        out.push_str(&format!("var {final_name} = {text};\n"));
                    }
                }
            }
        }

        // Namespace synthesis for this module, placed after its statements.
        if spec.marks.contains(&Target::Ns(module_index)) {
            if let Some(ns_name) = linker.ns_name(module_index) {
                let mut properties: Vec<String> = Vec::new();
                for (exported, target) in linker.export_surface(module_index) {
                    if let Some(text) = linker.target_text(&target) {
                        properties.push(format!("{exported}: () => {text}"));
                    }
                }
                out.push_str(&format!("var {ns_name} = {{}};\n"));
                if !properties.is_empty() {
                    out.push_str(&format!(
                        "__export({ns_name}, {{ {} }});\n",
                        properties.join(", ")
                    ));
                }
            }
        }
    }

    // Export statements last, preserving user-facing names.
    let mut export_specs: Vec<String> = Vec::new();
    for (exported, target) in &spec.exports {
        match target {
            Target::Symbol(..) | Target::Ns(_) => {
                if let Some(text) = linker.target_text(target) {
                    if &text == exported {
                        export_specs.push(text);
                    } else {
                        export_specs.push(format!("{text} as {exported}"));
                    }
                }
            }
            Target::External(source, imported) => match imported {
                Imported::Namespace => {
                    out.push_str(&format!("export * as {exported} from \"{source}\";\n"));
                }
                Imported::Default => {
                    out.push_str(&format!("export {{ default as {exported} }} from \"{source}\";\n"));
                }
                Imported::Named(name) => {
                    if name == exported {
                        out.push_str(&format!("export {{ {name} }} from \"{source}\";\n"));
                    } else {
                        out.push_str(&format!(
                            "export {{ {name} as {exported} }} from \"{source}\";\n"
                        ));
                    }
                }
            },
            Target::Missing(_) => {}
        }
    }
    if !export_specs.is_empty() {
        out.push_str(&format!("export {{ {} }};\n", export_specs.join(", ")));
    }
    for source in &spec.external_export_alls {
        out.push_str(&format!("export * from \"{source}\";\n"));
    }

    out
}

/// Externals referenced by statements or namespace objects emitted in this
/// output.
fn used_externals(
    linker: &Linker<'_>,
    spec: &OutputSpec<'_>,
    module_set: &HashSet<usize>,
) -> HashSet<(String, Imported)> {
    let mut used = HashSet::new();
    for target in spec.marks {
        match target {
            Target::Symbol(index, local) if module_set.contains(index) => {
                if let Some(decl) = linker.graph.module(*index).decls.get(local) {
                    for name in decl.refs() {
                        if let Some(Target::External(source, imported)) =
                            linker.binding_target(*index, name)
                        {
                            used.insert((source.clone(), imported.clone()));
                        }
                    }
                }
            }
            Target::Ns(index) if module_set.contains(index) => {
                for (_, target) in linker.export_surface(*index) {
                    if let Target::External(source, imported) = target {
                        used.insert((source, imported));
                    }
                }
            }
            _ => {}
        }
    }
    used
}

fn quote(text: &str) -> String {
    format!(
        "\"{}\"",
        text.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

fn apply_naming(pattern: Option<&str>, name: &str) -> String {
    let pattern = pattern.unwrap_or("[name].[ext]");
    let applied = pattern
        .replace("[dir]", "")
        .replace("[name]", name)
        .replace("[ext]", "js");
    applied.trim_start_matches('/').to_string()
}

fn unique_filename(taken: &mut HashSet<String>, candidate: &str) -> String {
    if taken.insert(candidate.to_string()) {
        return candidate.to_string();
    }
    let (stem, ext) = candidate
        .rsplit_once('.')
        .map(|(s, e)| (s.to_string(), format!(".{e}")))
        .unwrap_or_else(|| (candidate.to_string(), String::new()));
    let mut n = 2usize;
    loop {
        let next = format!("{stem}{n}{ext}");
        if taken.insert(next.clone()) {
            return next;
        }
        n += 1;
    }
}

fn chunk_stem(graph: &ModuleGraph, modules: &[usize]) -> String {
    let mut hasher = DefaultHasher::new();
    for &index in modules {
        graph.module(index).id.hash(&mut hasher);
    }
    format!("chunk-{:08x}", hasher.finish() as u32)
}
