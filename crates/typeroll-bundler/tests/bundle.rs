//! Linker behaviour over in-memory module maps: collision renames,
//! namespace synthesis, dead-code elimination, external passthrough, and
//! code splitting.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use typeroll_bundler::{
    Bundle, BundleError, BundleOptions, GraphBundler, Loader, OutputKind, Resolution, Resolver,
};

struct MapResolver;

impl Resolver for MapResolver {
    fn resolve(&self, specifier: &str, importer: Option<&Path>) -> Result<Resolution, BundleError> {
        if let Some(relative) = specifier.strip_prefix("./") {
            let dir = importer
                .and_then(|p| p.parent())
                .unwrap_or_else(|| Path::new("/"));
            let mut path = dir.join(relative);
            if path.extension().is_none() {
                path.set_extension("js");
            }
            Ok(Resolution::Internal(path))
        } else {
            Ok(Resolution::External(specifier.to_string()))
        }
    }
}

struct MapLoader(HashMap<PathBuf, &'static str>);

impl Loader for MapLoader {
    fn load(&self, id: &Path) -> Result<String, BundleError> {
        self.0
            .get(id)
            .map(|s| s.to_string())
            .ok_or_else(|| BundleError::Load {
                path: id.to_path_buf(),
                message: "not in fixture".to_string(),
            })
    }
}

fn fixture(files: &[(&str, &'static str)]) -> MapLoader {
    MapLoader(
        files
            .iter()
            .map(|(path, text)| (PathBuf::from(path), *text))
            .collect(),
    )
}

fn bundle_one(files: &[(&str, &'static str)], entry: &str) -> String {
    let bundle = bundle(files, &[entry], BundleOptions::default());
    assert_eq!(bundle.outputs.len(), 1);
    bundle.outputs[0].code.clone()
}

fn bundle(files: &[(&str, &'static str)], entries: &[&str], options: BundleOptions) -> Bundle {
    let loader = fixture(files);
    let entries: Vec<PathBuf> = entries.iter().map(PathBuf::from).collect();
    GraphBundler::new(&MapResolver, &loader, options)
        .bundle(&entries)
        .expect("bundle")
}

#[test]
fn inlines_imported_module_in_dependency_order() {
    let code = bundle_one(
        &[
            (
                "/src/index.js",
                "import { User } from \"./user\";\nvar Box = [\"interface \", Box, \" { value: \", User, \" }\"];\nexport { Box };\n",
            ),
            (
                "/src/user.js",
                "var User = [\"interface \", User, \" { id: number }\"];\nexport { User };\n",
            ),
        ],
        "/src/index.js",
    );
    let user_pos = code.find("var User = [").expect("user decl");
    let box_pos = code.find("var Box = [").expect("box decl");
    assert!(user_pos < box_pos);
    assert!(code.contains("export { Box };"));
    assert!(!code.contains("import { User }"));
}

#[test]
fn renames_colliding_declarations_with_numeric_suffix() {
    let code = bundle_one(
        &[
            (
                "/src/index.js",
                "import { User as BaseUser } from \"./user\";\nvar User = [\"interface \", User, \" extends \", BaseUser, \" {}\"];\nexport { User };\n",
            ),
            (
                "/src/user.js",
                "var User = [\"interface \", User, \" { id: number }\"];\nexport { User };\n",
            ),
        ],
        "/src/index.js",
    );
    assert!(code.contains("var User2 = [\"interface \", User2, \" { id: number }\"];"));
    assert!(code.contains("\" extends \", User2"));
    assert!(code.contains("export { User };"));
}

#[test]
fn drops_declarations_unreachable_from_entry_exports() {
    let code = bundle_one(
        &[
            (
                "/src/index.js",
                "import { User } from \"./user\";\nvar Keep = [\"type \", Keep, \" = \", User, \";\"];\nexport { Keep };\n",
            ),
            (
                "/src/user.js",
                "var User = [\"interface \", User, \" {}\"];\nexport { User };\nvar Hidden = [\"interface \", Hidden, \" {}\"];\n",
            ),
        ],
        "/src/index.js",
    );
    assert!(code.contains("var User = ["));
    assert!(!code.contains("Hidden"));
}

#[test]
fn synthesises_namespace_objects_for_namespace_imports() {
    let code = bundle_one(
        &[
            (
                "/src/index.js",
                "import * as schema from \"./schema\";\nvar Wrap = [\"type \", Wrap, \" = typeof \", schema, \";\"];\nexport { Wrap };\nexport { schema };\n",
            ),
            (
                "/src/schema.js",
                "var User = [\"interface \", User, \" {}\"];\nexport { User };\n",
            ),
        ],
        "/src/index.js",
    );
    assert!(code.contains("var exports_schema = {};"));
    assert!(code.contains("__export(exports_schema, { User: () => User });"));
    assert!(code.contains("typeof \", exports_schema"));
    assert!(code.contains("exports_schema as schema"));
}

#[test]
fn keeps_external_imports_verbatim() {
    let code = bundle_one(
        &[(
            "/src/index.js",
            "import { Buffer as Buffer_4fe1 } from \"node:buffer\";\nvar B = [\"type \", B, \" = \", Buffer_4fe1, \";\"];\nexport { B };\n",
        )],
        "/src/index.js",
    );
    assert!(code.contains("import { Buffer as Buffer_4fe1 } from \"node:buffer\";"));
    assert!(code.contains("var B = ["));
}

#[test]
fn follows_re_export_chains() {
    let code = bundle_one(
        &[
            (
                "/src/index.js",
                "export { User } from \"./middle\";\n",
            ),
            ("/src/middle.js", "export { User } from \"./user\";\n"),
            (
                "/src/user.js",
                "var User = [\"interface \", User, \" {}\"];\nexport { User };\n",
            ),
        ],
        "/src/index.js",
    );
    assert!(code.contains("var User = ["));
    assert!(code.contains("export { User };"));
}

#[test]
fn export_all_expands_to_named_exports() {
    let code = bundle_one(
        &[
            ("/src/index.js", "export * from \"./a\";\n"),
            (
                "/src/a.js",
                "var A = [\"interface \", A, \" {}\"];\nexport { A };\nvar B = [\"interface \", B, \" {}\"];\nexport { B };\n",
            ),
        ],
        "/src/index.js",
    );
    assert!(code.contains("var A = ["));
    assert!(code.contains("var B = ["));
    assert!(code.contains("export { A, B };"));
}

#[test]
fn splitting_hoists_shared_modules_into_chunk() {
    let files = [
        (
            "/src/a.js",
            "import { Shared } from \"./shared\";\nvar A = [\"type \", A, \" = \", Shared, \";\"];\nexport { A };\n",
        ),
        (
            "/src/b.js",
            "import { Shared } from \"./shared\";\nvar B = [\"type \", B, \" = \", Shared, \";\"];\nexport { B };\n",
        ),
        (
            "/src/shared.js",
            "var Shared = [\"interface \", Shared, \" {}\"];\nexport { Shared };\nvar Unused = [\"interface \", Unused, \" {}\"];\n",
        ),
    ];
    let bundle = bundle(
        &files,
        &["/src/a.js", "/src/b.js"],
        BundleOptions {
            splitting: true,
            naming: None,
        },
    );
    assert_eq!(bundle.outputs.len(), 3);

    let entries: Vec<_> = bundle
        .outputs
        .iter()
        .filter(|o| o.kind == OutputKind::EntryPoint)
        .collect();
    let chunks: Vec<_> = bundle
        .outputs
        .iter()
        .filter(|o| o.kind == OutputKind::Chunk)
        .collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(chunks.len(), 1);

    let chunk = chunks[0];
    assert!(chunk.filename.starts_with("chunk-"));
    assert!(chunk.code.contains("var Shared = ["));
    assert!(chunk.code.contains("export { Shared };"));
    assert!(!chunk.code.contains("Unused"));

    for entry in entries {
        assert!(entry.code.contains(&format!("from \"./{}\";", chunk.filename)));
        assert!(entry.code.contains("import { Shared }"));
        assert!(!entry.code.contains("var Shared"));
    }
}

#[test]
fn without_splitting_shared_modules_are_duplicated() {
    let files = [
        (
            "/src/a.js",
            "import { Shared } from \"./shared\";\nvar A = [\"type \", A, \" = \", Shared, \";\"];\nexport { A };\n",
        ),
        (
            "/src/b.js",
            "import { Shared } from \"./shared\";\nvar B = [\"type \", B, \" = \", Shared, \";\"];\nexport { B };\n",
        ),
        (
            "/src/shared.js",
            "var Shared = [\"interface \", Shared, \" {}\"];\nexport { Shared };\n",
        ),
    ];
    let bundle = bundle(&files, &["/src/a.js", "/src/b.js"], BundleOptions::default());
    assert_eq!(bundle.outputs.len(), 2);
    for output in &bundle.outputs {
        assert_eq!(output.kind, OutputKind::EntryPoint);
        assert!(output.code.contains("var Shared = ["));
    }
}

#[test]
fn naming_pattern_controls_output_filenames() {
    let files = [(
        "/src/index.js",
        "var A = [\"type \", A, \" = 1;\"];\nexport { A };\n",
    )];
    let bundle = bundle(
        &files,
        &["/src/index.js"],
        BundleOptions {
            splitting: false,
            naming: Some("types/[name].[ext]".to_string()),
        },
    );
    assert_eq!(bundle.outputs[0].filename, "types/index.js");
}
