//! Expansion of dynamic type imports into static imports plus aliased
//! locals.
//!
//! `import('M').X` cannot survive tokenisation as a string: the module edge
//! to `M` would be invisible to the bundler. Each occurrence is rewritten
//! into one or two real statements injected ahead of the declaration that
//! used it, and the declaration's token stream references the injected
//! local instead.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use typeroll_syntax::is_identifier_like;

use crate::error::TransformError;

/// How injected identifiers are made collision-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuffixStrategy {
    /// Suffix derived from a content hash of the module specifier and
    /// property name. Repeated imports of the same type collapse onto one
    /// injected import statement.
    #[default]
    Stable,
    /// Fresh pseudo-random suffix per occurrence.
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Access {
    Prop(String),
    Computed(String),
}

/// Rewrites dynamic type-import expressions, deduplicating injected
/// statements within one file.
#[derive(Debug, Default)]
pub struct DynamicImportExpander {
    strategy: SuffixStrategy,
    imports: HashMap<(String, String), String>,
    locals: HashMap<String, String>,
    injected: Vec<String>,
    counter: u64,
}

impl DynamicImportExpander {
    pub fn new(strategy: SuffixStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Statements synthesised since the last call, in injection order.
    pub fn take_injected(&mut self) -> Vec<String> {
        std::mem::take(&mut self.injected)
    }

    /// Expand one `import("M")…` surface and return the identifier the
    /// token stream should reference.
    pub fn expand(&mut self, expr: &str) -> Result<String, TransformError> {
        if let Some(known) = self.locals.get(expr) {
            return Ok(known.clone());
        }
        let (specifier, accesses) = parse_surface(expr)
            .ok_or_else(|| TransformError::InvalidDynamicImport(expr.to_string()))?;

        let ident = match accesses.split_first() {
            None => self.namespace_import(&specifier),
            Some((first, rest)) => {
                let first_name = match first {
                    Access::Prop(name) => Some(name.clone()),
                    Access::Computed(text) if is_identifier_like(text) => Some(text.clone()),
                    Access::Computed(_) => None,
                };
                match first_name {
                    Some(prop) => {
                        let alias = self.named_import(&specifier, &prop);
                        if rest.is_empty() {
                            alias
                        } else {
                            self.chained_local(expr, &alias, rest)
                        }
                    }
                    None => {
                        let ns = self.namespace_import(&specifier);
                        self.chained_local(expr, &ns, &accesses)
                    }
                }
            }
        };
        self.locals.insert(expr.to_string(), ident.clone());
        Ok(ident)
    }

    fn namespace_import(&mut self, specifier: &str) -> String {
        let key = (specifier.to_string(), "*".to_string());
        if let Some(alias) = self.imports.get(&key) {
            return alias.clone();
        }
        let base = sanitize(module_basename(specifier));
        let alias = format!("{base}_{}", self.suffix(specifier, "*"));
        self.injected
            .push(format!("import * as {alias} from \"{specifier}\";"));
        self.imports.insert(key, alias.clone());
        alias
    }

    fn named_import(&mut self, specifier: &str, prop: &str) -> String {
        let key = (specifier.to_string(), prop.to_string());
        if let Some(alias) = self.imports.get(&key) {
            return alias.clone();
        }
        let alias = format!("{}_{}", sanitize(prop), self.suffix(specifier, prop));
        self.injected
            .push(format!("import {{ {prop} as {alias} }} from \"{specifier}\";"));
        self.imports.insert(key, alias.clone());
        alias
    }

    fn chained_local(&mut self, expr: &str, root: &str, accesses: &[Access]) -> String {
        let last = accesses
            .last()
            .map(|a| match a {
                Access::Prop(p) => p.as_str(),
                Access::Computed(c) => c.as_str(),
            })
            .unwrap_or("value");
        let local = format!("{}_{}", sanitize(last), self.suffix(expr, "chain"));
        let chain: String = accesses.iter().map(render_access).collect();
        self.injected.push(format!("var {local} = {root}{chain};"));
        local
    }

    fn suffix(&mut self, a: &str, b: &str) -> String {
        let mut hasher = DefaultHasher::new();
        a.hash(&mut hasher);
        b.hash(&mut hasher);
        if self.strategy == SuffixStrategy::Random {
            self.counter += 1;
            self.counter.hash(&mut hasher);
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_nanos())
                .unwrap_or_default()
                .hash(&mut hasher);
        }
        format!("{:08x}", hasher.finish() as u32)
    }
}

fn render_access(access: &Access) -> String {
    match access {
        Access::Prop(p) => format!(".{p}"),
        Access::Computed(c) => format!("[\"{}\"]", c.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}

/// Parse `import ( QUOTE SPEC QUOTE ) ACCESS*`; `None` means the surface is
/// outside the accepted grammar.
fn parse_surface(expr: &str) -> Option<(String, Vec<Access>)> {
    let rest = expr.strip_prefix("import")?.trim_start();
    let rest = rest.strip_prefix('(')?;
    let close = rest.find(')')?;
    let inner = rest[..close].trim();
    let mut rest = &rest[close + 1..];

    let quote = inner.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let body = &inner[1..];
    if !body.ends_with(quote) {
        return None;
    }
    let specifier = &body[..body.len() - quote.len_utf8()];
    if specifier.contains(quote) || specifier.is_empty() {
        return None;
    }

    let mut accesses = Vec::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if let Some(after_dot) = rest.strip_prefix('.') {
            let after_dot = after_dot.trim_start();
            let end = after_dot
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
                .unwrap_or(after_dot.len());
            if end == 0 {
                return None;
            }
            let name = &after_dot[..end];
            if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                return None;
            }
            accesses.push(Access::Prop(name.to_string()));
            rest = &after_dot[end..];
        } else if let Some(after_bracket) = rest.strip_prefix('[') {
            let close = after_bracket.find(']')?;
            let inner = after_bracket[..close].trim();
            let quote = inner.chars().next()?;
            if (quote != '"' && quote != '\'')
                || !inner.ends_with(quote)
                || inner.len() < 2
            {
                return None;
            }
            accesses.push(Access::Computed(inner[1..inner.len() - 1].to_string()));
            rest = &after_bracket[close + 1..];
        } else {
            return None;
        }
    }
    Some((specifier.to_string(), accesses))
}

fn module_basename(specifier: &str) -> &str {
    let tail = specifier.rsplit('/').next().unwrap_or(specifier);
    tail.split('.').next().unwrap_or(tail)
}

fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, 'm');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_import_becomes_namespace() {
        let mut expander = DynamicImportExpander::new(SuffixStrategy::Stable);
        let ident = expander.expand("import('./m')").unwrap();
        let injected = expander.take_injected();
        assert_eq!(injected.len(), 1);
        assert_eq!(injected[0], format!("import * as {ident} from \"./m\";"));
    }

    #[test]
    fn named_access_becomes_named_import() {
        let mut expander = DynamicImportExpander::new(SuffixStrategy::Stable);
        let ident = expander.expand("import('node:buffer').Buffer").unwrap();
        assert!(ident.starts_with("Buffer_"));
        let injected = expander.take_injected();
        assert_eq!(
            injected[0],
            format!("import {{ Buffer as {ident} }} from \"node:buffer\";")
        );
    }

    #[test]
    fn repeated_imports_collapse() {
        let mut expander = DynamicImportExpander::new(SuffixStrategy::Stable);
        let a = expander.expand("import('./m').User").unwrap();
        let b = expander.expand("import('./m').User").unwrap();
        assert_eq!(a, b);
        assert_eq!(expander.take_injected().len(), 1);
    }

    #[test]
    fn access_chain_adds_aliased_local() {
        let mut expander = DynamicImportExpander::new(SuffixStrategy::Stable);
        let ident = expander.expand("import('./m').a.b[\"c\"]").unwrap();
        let injected = expander.take_injected();
        assert_eq!(injected.len(), 2);
        assert!(injected[0].starts_with("import { a as a_"));
        assert!(injected[1].starts_with(&format!("var {ident} = a_")));
        assert!(injected[1].ends_with(".b[\"c\"];"));
    }

    #[test]
    fn computed_non_identifier_uses_namespace_root() {
        let mut expander = DynamicImportExpander::new(SuffixStrategy::Stable);
        let ident = expander.expand("import('./m')[\"a-b\"]").unwrap();
        let injected = expander.take_injected();
        assert_eq!(injected.len(), 2);
        assert!(injected[0].starts_with("import * as m_"));
        assert!(injected[1].contains("[\"a-b\"]"));
        assert!(injected[1].starts_with(&format!("var {ident} = ")));
    }

    #[test]
    fn quoted_bracket_identifier_counts_as_named() {
        let mut expander = DynamicImportExpander::new(SuffixStrategy::Stable);
        let ident = expander.expand("import('./m')[\"User\"]").unwrap();
        assert!(ident.starts_with("User_"));
        let injected = expander.take_injected();
        assert_eq!(injected.len(), 1);
        assert!(injected[0].starts_with("import { User as User_"));
    }

    #[test]
    fn malformed_surface_is_rejected() {
        let mut expander = DynamicImportExpander::new(SuffixStrategy::Stable);
        assert!(expander.expand("import(foo)").is_err());
        assert!(expander.expand("import('m'").is_err());
        assert!(expander.expand("import('m').123").is_err());
        assert!(expander.expand("import('m')[Symbol.iterator]").is_err());
    }

    #[test]
    fn stable_suffix_is_deterministic() {
        let mut first = DynamicImportExpander::new(SuffixStrategy::Stable);
        let mut second = DynamicImportExpander::new(SuffixStrategy::Stable);
        assert_eq!(
            first.expand("import('./m').User").unwrap(),
            second.expand("import('./m').User").unwrap()
        );
    }
}
