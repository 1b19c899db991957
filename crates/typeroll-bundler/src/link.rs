//! Linking: bundle-wide name assignment, export resolution, and the
//! mark-and-sweep pass over identifier tokens.
//!
//! Final names are assigned once for the whole invocation so a symbol keeps
//! one identity across every output; collisions take a numeric suffix
//! (`User`, `User2`, `User3`, …), the scheme the reverse transform and its
//! consumers rely on.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::graph::{Decl, Edge, ExportTarget, Imported, ModuleGraph};

/// Resolution of one name to a bundle-level thing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Target {
    /// Declaration `local` of module `index`.
    Symbol(usize, String),
    /// The synthesised namespace object of module `index`.
    Ns(usize),
    /// A binding left external.
    External(String, Imported),
    /// Unresolvable; the name passes through untouched.
    Missing(String),
}

pub(crate) struct Linker<'g> {
    pub graph: &'g ModuleGraph,
    used: HashSet<String>,
    finals: HashMap<(usize, String), String>,
    ns_names: IndexMap<usize, String>,
    pub externals: IndexMap<(String, Imported), String>,
    binding_targets: HashMap<(usize, String), Target>,
}

impl<'g> Linker<'g> {
    pub fn new(graph: &'g ModuleGraph) -> Self {
        let mut linker = Self {
            graph,
            used: HashSet::new(),
            finals: HashMap::new(),
            ns_names: IndexMap::new(),
            externals: IndexMap::new(),
            binding_targets: HashMap::new(),
        };
        linker.assign_decl_names();
        linker.resolve_bindings();
        linker
    }

    fn assign_decl_names(&mut self) {
        for (index, module) in self.graph.modules.values().enumerate() {
            for name in module.decls.keys() {
                let unique = self.unique(name);
                self.finals.insert((index, name.clone()), unique);
            }
        }
    }

    fn resolve_bindings(&mut self) {
        for index in 0..self.graph.modules.len() {
            let module = self.graph.module(index);
            let bindings: Vec<(String, Edge, Imported)> = module
                .bindings
                .iter()
                .map(|(local, b)| (local.clone(), b.edge.clone(), b.imported.clone()))
                .collect();
            for (local, edge, imported) in bindings {
                let target = self.resolve_edge(&edge, &imported, &mut HashSet::new());
                match &target {
                    Target::External(spec, imported) => {
                        let key = (spec.clone(), imported.clone());
                        if !self.externals.contains_key(&key) {
                            let unique = self.unique(&local);
                            self.externals.insert(key, unique);
                        }
                    }
                    Target::Ns(module_index) => {
                        self.ensure_ns_name(*module_index, &local);
                    }
                    _ => {}
                }
                self.binding_targets.insert((index, local), target);
            }
        }
    }

    /// Make sure every namespace target that appears on an export surface
    /// has a synthetic object name, preferring the user-facing export name.
    pub fn prepare_ns_names<'a>(&mut self, surface: impl Iterator<Item = &'a (String, Target)>) {
        let wanted: Vec<(String, usize)> = surface
            .filter_map(|(name, target)| match target {
                Target::Ns(index) => Some((name.clone(), *index)),
                _ => None,
            })
            .collect();
        for (name, index) in wanted {
            self.ensure_ns_name(index, &name);
        }
    }

    fn ensure_ns_name(&mut self, module_index: usize, preferred_local: &str) -> String {
        if let Some(name) = self.ns_names.get(&module_index) {
            return name.clone();
        }
        let unique = self.unique(&format!("exports_{preferred_local}"));
        self.ns_names.insert(module_index, unique.clone());
        unique
    }

    fn unique(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base}{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn final_name(&self, module_index: usize, local: &str) -> Option<&str> {
        self.finals
            .get(&(module_index, local.to_string()))
            .map(String::as_str)
    }

    pub fn ns_name(&self, module_index: usize) -> Option<&str> {
        self.ns_names.get(&module_index).map(String::as_str)
    }

    pub fn external_local(&self, spec: &str, imported: &Imported) -> Option<&str> {
        self.externals
            .get(&(spec.to_string(), imported.clone()))
            .map(String::as_str)
    }

    /// The text an identifier reference in `module_index` renders to.
    pub fn map_ident(&self, module_index: usize, name: &str) -> String {
        if let Some(final_name) = self.final_name(module_index, name) {
            return final_name.to_string();
        }
        if let Some(target) = self.binding_targets.get(&(module_index, name.to_string())) {
            if let Some(text) = self.target_text(target) {
                return text;
            }
        }
        name.to_string()
    }

    /// The final identifier a target renders to, when it has one.
    pub fn target_text(&self, target: &Target) -> Option<String> {
        match target {
            Target::Symbol(index, local) => self.final_name(*index, local).map(str::to_string),
            Target::Ns(index) => self.ns_name(*index).map(str::to_string),
            Target::External(spec, imported) => {
                self.external_local(spec, imported).map(str::to_string)
            }
            Target::Missing(name) => Some(name.clone()),
        }
    }

    pub fn binding_target(&self, module_index: usize, local: &str) -> Option<&Target> {
        self.binding_targets.get(&(module_index, local.to_string()))
    }

    fn resolve_edge(
        &self,
        edge: &Edge,
        imported: &Imported,
        seen: &mut HashSet<(usize, String)>,
    ) -> Target {
        match edge {
            Edge::External(spec) => Target::External(spec.clone(), imported.clone()),
            Edge::Internal(path) => match self.graph.index_of(path) {
                None => Target::Missing(display_name(imported)),
                Some(index) => match imported {
                    Imported::Namespace => Target::Ns(index),
                    Imported::Default => self.resolve_export(index, "default", seen),
                    Imported::Named(name) => self.resolve_export(index, name, seen),
                },
            },
        }
    }

    /// Resolve `name` in the export map of module `index`, following
    /// re-export chains and `export *` edges.
    pub fn resolve_export(
        &self,
        index: usize,
        name: &str,
        seen: &mut HashSet<(usize, String)>,
    ) -> Target {
        if !seen.insert((index, name.to_string())) {
            return Target::Missing(name.to_string());
        }
        let module = self.graph.module(index);
        match module.exports.get(name) {
            Some(ExportTarget::Local(local)) => self.resolve_local(index, local, seen),
            Some(ExportTarget::Reexport { edge, imported }) => {
                self.resolve_edge(edge, imported, seen)
            }
            None => {
                for edge in &module.export_alls {
                    if let Edge::Internal(path) = edge {
                        if let Some(dep) = self.graph.index_of(path) {
                            let target = self.resolve_export(dep, name, seen);
                            if !matches!(target, Target::Missing(_)) {
                                return target;
                            }
                        }
                    }
                }
                Target::Missing(name.to_string())
            }
        }
    }

    fn resolve_local(
        &self,
        index: usize,
        local: &str,
        seen: &mut HashSet<(usize, String)>,
    ) -> Target {
        let module = self.graph.module(index);
        if module.decls.contains_key(local) {
            return Target::Symbol(index, local.to_string());
        }
        if let Some(binding) = module.bindings.get(local) {
            return self.resolve_edge(&binding.edge, &binding.imported, seen);
        }
        Target::Missing(local.to_string())
    }

    /// The full export surface of a module: own exports plus `export *`
    /// expansion, resolved to targets. `default` does not propagate through
    /// `export *`.
    pub fn export_surface(&self, index: usize) -> Vec<(String, Target)> {
        let mut surface: IndexMap<String, Target> = IndexMap::new();
        let mut visited = HashSet::new();
        self.collect_surface(index, true, &mut surface, &mut visited);
        surface.into_iter().collect()
    }

    fn collect_surface(
        &self,
        index: usize,
        include_default: bool,
        surface: &mut IndexMap<String, Target>,
        visited: &mut HashSet<usize>,
    ) {
        if !visited.insert(index) {
            return;
        }
        let module = self.graph.module(index);
        for name in module.exports.keys() {
            if !include_default && name == "default" {
                continue;
            }
            if !surface.contains_key(name) {
                let target = self.resolve_export(index, name, &mut HashSet::new());
                surface.insert(name.clone(), target);
            }
        }
        for edge in &module.export_alls {
            if let Edge::Internal(path) = edge {
                if let Some(dep) = self.graph.index_of(path) {
                    self.collect_surface(dep, false, surface, visited);
                }
            }
        }
    }

    /// Mark-and-sweep from the given roots; returns every target that must
    /// survive in an output.
    pub fn mark(&self, roots: impl IntoIterator<Item = Target>) -> HashSet<Target> {
        let mut marked: HashSet<Target> = HashSet::new();
        let mut worklist: Vec<Target> = roots.into_iter().collect();
        while let Some(target) = worklist.pop() {
            if matches!(target, Target::Missing(_)) || !marked.insert(target.clone()) {
                continue;
            }
            match &target {
                Target::Symbol(index, local) => {
                    if let Some(decl) = self.graph.module(*index).decls.get(local) {
                        self.push_refs(*index, decl, &mut worklist);
                    }
                }
                Target::Ns(index) => {
                    for (_, t) in self.export_surface(*index) {
                        worklist.push(t);
                    }
                }
                Target::External(..) | Target::Missing(_) => {}
            }
        }
        marked
    }

    fn push_refs(&self, module_index: usize, decl: &Decl, worklist: &mut Vec<Target>) {
        for name in decl.refs() {
            if self.graph.module(module_index).decls.contains_key(name) {
                worklist.push(Target::Symbol(module_index, name.to_string()));
            } else if let Some(target) = self.binding_target(module_index, name) {
                worklist.push(target.clone());
            }
        }
    }
}

fn display_name(imported: &Imported) -> String {
    match imported {
        Imported::Named(name) => name.clone(),
        Imported::Default => "default".to_string(),
        Imported::Namespace => "namespace".to_string(),
    }
}
