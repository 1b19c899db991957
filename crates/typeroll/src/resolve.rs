//! Module resolution for the bundler's resolve hook.
//!
//! Relative specifiers are probed against the TypeScript extension set,
//! package specifiers walk `node_modules` up from the importer and honour
//! the package.json `types`/`typings` field. Which packages are inlined is
//! a policy decision owned by the caller; builtins are always external.

use std::fs;
use std::path::{Path, PathBuf};

use typeroll_bundler::{BundleError, Resolution, Resolver};

/// Which external package specifiers get their declarations inlined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// Leave every package external.
    #[default]
    None,
    /// Inline every package whose declarations can be found.
    All,
    /// Inline only the listed packages.
    Packages(Vec<String>),
}

impl ResolvePolicy {
    fn wants(&self, package: &str) -> bool {
        match self {
            ResolvePolicy::None => false,
            ResolvePolicy::All => true,
            ResolvePolicy::Packages(list) => list.iter().any(|p| p == package),
        }
    }
}

/// Filesystem resolver rooted at the project directory.
pub struct FsResolver {
    cwd: PathBuf,
    policy: ResolvePolicy,
}

impl FsResolver {
    pub fn new(cwd: PathBuf, policy: ResolvePolicy) -> Self {
        Self { cwd, policy }
    }
}

impl Resolver for FsResolver {
    fn resolve(&self, specifier: &str, importer: Option<&Path>) -> Result<Resolution, BundleError> {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            let base = importer
                .and_then(|p| p.parent())
                .unwrap_or(&self.cwd)
                .to_path_buf();
            return resolve_with_extensions(&base.join(specifier)).map(Resolution::Internal).ok_or_else(|| {
                BundleError::Resolve {
                    specifier: specifier.to_string(),
                    importer: importer
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| self.cwd.display().to_string()),
                }
            });
        }

        if is_builtin(specifier) {
            return Ok(Resolution::External(specifier.to_string()));
        }

        let package = package_name(specifier);
        if self.policy.wants(package) {
            if let Some(path) = self.resolve_package(specifier, importer) {
                return Ok(Resolution::Internal(path));
            }
        }
        Ok(Resolution::External(specifier.to_string()))
    }
}

impl FsResolver {
    /// Walk `node_modules` directories up from the importer, then from the
    /// project root.
    fn resolve_package(&self, specifier: &str, importer: Option<&Path>) -> Option<PathBuf> {
        let mut search = importer.and_then(|p| p.parent());
        while let Some(dir) = search {
            let node_modules = dir.join("node_modules");
            if node_modules.is_dir() {
                if let Some(found) = resolve_in_node_modules(&node_modules, specifier) {
                    return Some(found);
                }
            }
            search = dir.parent();
        }
        let node_modules = self.cwd.join("node_modules");
        if node_modules.is_dir() {
            return resolve_in_node_modules(&node_modules, specifier);
        }
        None
    }
}

fn is_builtin(specifier: &str) -> bool {
    specifier.starts_with("node:") || specifier.starts_with("bun:")
}

/// The package portion of a specifier: one segment, or two for scopes.
fn package_name(specifier: &str) -> &str {
    let mut segments = specifier.splitn(3, '/');
    let first = segments.next().unwrap_or(specifier);
    if first.starts_with('@') {
        let end = first.len() + 1 + segments.next().map_or(0, str::len);
        &specifier[..end.min(specifier.len())]
    } else {
        first
    }
}

/// Probe a path against the declaration extension set.
fn resolve_with_extensions(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    let as_str = path.to_str()?;
    for extension in [".ts", ".tsx", ".d.ts", ".mts", ".cts", ".d.mts", ".d.cts"] {
        let candidate = PathBuf::from(format!("{as_str}{extension}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    for index in ["index.ts", "index.tsx", "index.d.ts"] {
        let candidate = path.join(index);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn resolve_in_node_modules(node_modules: &Path, specifier: &str) -> Option<PathBuf> {
    let package = package_name(specifier);
    let package_dir = node_modules.join(package);
    if !package_dir.is_dir() {
        return None;
    }

    // Sub-path import: probe the file inside the package.
    if specifier.len() > package.len() {
        let sub = &specifier[package.len() + 1..];
        return resolve_with_extensions(&package_dir.join(sub));
    }

    if let Some(types) = read_types_field(&package_dir.join("package.json")) {
        let candidate = package_dir.join(types);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    let index = package_dir.join("index.d.ts");
    index.is_file().then_some(index)
}

/// The `types`/`typings` field of a package manifest, without bringing a
/// JSON parser into the hot path.
fn read_types_field(manifest: &Path) -> Option<String> {
    let content = fs::read_to_string(manifest).ok()?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("\"types\"") || trimmed.starts_with("\"typings\"") {
            let value = trimmed.split(':').nth(1)?;
            let value = value.trim().trim_end_matches(',');
            return Some(value.trim_matches('"').to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_names() {
        assert_eq!(package_name("react"), "react");
        assert_eq!(package_name("react/jsx-runtime"), "react");
        assert_eq!(package_name("@types/node"), "@types/node");
        assert_eq!(package_name("@scope/pkg/sub"), "@scope/pkg");
    }

    #[test]
    fn builtins_are_external() {
        let resolver = FsResolver::new(PathBuf::from("/proj"), ResolvePolicy::All);
        let resolution = resolver.resolve("node:buffer", None).unwrap();
        assert_eq!(resolution, Resolution::External("node:buffer".to_string()));
    }

    #[test]
    fn policy_gates_package_inlining() {
        assert!(ResolvePolicy::All.wants("react"));
        assert!(!ResolvePolicy::None.wants("react"));
        assert!(ResolvePolicy::Packages(vec!["react".into()]).wants("react"));
        assert!(!ResolvePolicy::Packages(vec!["react".into()]).wants("vue"));
    }

    #[test]
    fn relative_resolution_probes_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("dep.ts"), "export type A = 1;").unwrap();
        fs::write(src.join("main.ts"), "").unwrap();

        let resolver = FsResolver::new(dir.path().to_path_buf(), ResolvePolicy::None);
        let resolution = resolver
            .resolve("./dep", Some(&src.join("main.ts")))
            .unwrap();
        assert_eq!(resolution, Resolution::Internal(src.join("dep.ts")));
    }

    #[test]
    fn node_modules_types_field_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/somepkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.json"),
            "{\n  \"name\": \"somepkg\",\n  \"types\": \"lib/main.d.ts\"\n}\n",
        )
        .unwrap();
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(pkg.join("lib/main.d.ts"), "export type T = 1;").unwrap();
        fs::write(dir.path().join("app.ts"), "").unwrap();

        let resolver = FsResolver::new(dir.path().to_path_buf(), ResolvePolicy::All);
        let resolution = resolver
            .resolve("somepkg", Some(&dir.path().join("app.ts")))
            .unwrap();
        assert_eq!(resolution, Resolution::Internal(pkg.join("lib/main.d.ts")));
    }
}
