//! Forward/reverse identity on canonical declaration files.
//!
//! Without a bundler in between, reversing the forward transform's output
//! must reproduce the input modulo type-only-modifier erasure and
//! one-newline statement separation.

use typeroll_transform::{bundled_to_declaration, declaration_to_fake_js};

#[test]
fn canonical_module_round_trips() {
    let input = "\
import { Base } from \"./base\";

/** A user. */
export interface User extends Base {
  id: number;
  name: string;
}

export type Id = User[\"id\"];
";
    let fake = declaration_to_fake_js(input).unwrap();
    let output = bundled_to_declaration(&fake).unwrap();

    assert!(output.contains("import { Base } from \"./base\";"));
    assert!(output.contains("/** A user. */\ninterface User extends Base {\n  id: number;\n  name: string;\n}"));
    assert!(output.contains("export { User };"));
    assert!(output.contains("type Id = User[\"id\"];"));
    assert!(output.contains("export { Id };"));
}

#[test]
fn type_only_modifiers_are_erased_by_the_round_trip() {
    let input = "import type { Opts } from \"./opts\";\nexport type A = Opts;\n";
    let fake = declaration_to_fake_js(input).unwrap();
    let output = bundled_to_declaration(&fake).unwrap();

    assert!(output.contains("import { Opts } from \"./opts\";"));
    assert!(!output.contains("import type"));
    assert!(output.contains("type A = Opts;"));
}

#[test]
fn default_export_normalisation_survives() {
    let input = "export default function(): number;\n";
    let fake = declaration_to_fake_js(input).unwrap();
    let output = bundled_to_declaration(&fake).unwrap();

    assert!(output.contains("function var0(): number;"));
    assert!(output.contains("export { var0 as default };"));
    assert!(!output.contains("export default"));
}

#[test]
fn escaped_content_is_restored_exactly() {
    let input = "export interface Weird {\n\t\"key with spaces\": string;\n}\n";
    let fake = declaration_to_fake_js(input).unwrap();
    assert!(!fake.lines().any(|line| line.starts_with('\t')));
    let output = bundled_to_declaration(&fake).unwrap();
    assert!(output.contains("\t\"key with spaces\": string;"));
}

#[test]
fn side_effect_imports_vanish() {
    let input = "import \"./polyfill\";\nexport type T = 1;\n";
    let fake = declaration_to_fake_js(input).unwrap();
    let output = bundled_to_declaration(&fake).unwrap();
    assert!(!output.contains("polyfill"));
    assert!(output.contains("type T = 1;"));
}
