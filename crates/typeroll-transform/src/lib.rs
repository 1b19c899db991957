//! The two text transforms at the core of typeroll.
//!
//! A declaration file is encoded as a syntactically legal, semantically
//! inert JavaScript module (`forward`): every declaration becomes a
//! `var name = [ …tokens… ];` statement whose array preserves
//! cross-reference edges as bare identifiers, while imports and exports are
//! emitted as real module syntax so a bundler can resolve, tree-shake and
//! split over them. After bundling, `reverse` parses the output and
//! reconstructs declaration text, including `declare namespace` blocks for
//! the bundler's namespace synthesis and repairs for its collision renames.
//!
//! Both transforms are pure functions of one text input; per-invocation
//! state (referenced-name and exported-name sets, the namespace alias map)
//! never crosses files.

mod dynamic_import;
mod error;
mod forward;
mod reverse;

pub use dynamic_import::{DynamicImportExpander, SuffixStrategy};
pub use error::TransformError;
pub use forward::{declaration_to_fake_js, declaration_to_fake_js_with, ForwardOptions};
pub use reverse::bundled_to_declaration;
