//! Oxc-backed parser wrapper.
//!
//! Owns the arena allocator so lifetimes stay valid while callers inspect
//! the parsed program. Declaration inputs parse as `.d.ts`; bundled fake-JS
//! parses as an ES module.

use oxc_allocator::Allocator;
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType;

/// Thin wrapper owning the Oxc allocator for one parse session.
#[derive(Default)]
pub struct ModuleParser {
    allocator: Allocator,
}

impl ModuleParser {
    pub fn new() -> Self {
        Self {
            allocator: Allocator::default(),
        }
    }

    /// Parse declaration-file text; returns Oxc's AST plus accumulated errors.
    pub fn parse_dts<'a>(&'a self, source: &'a str) -> ParserReturn<'a> {
        Parser::new(&self.allocator, source, SourceType::d_ts()).parse()
    }

    /// Parse ES-module text (fake-JS or bundled fake-JS).
    pub fn parse_module<'a>(&'a self, source: &'a str) -> ParserReturn<'a> {
        Parser::new(&self.allocator, source, SourceType::mjs()).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_ast::ast::Statement;

    #[test]
    fn parses_simple_interface() {
        let parser = ModuleParser::new();
        let ret = parser.parse_dts("export interface Foo { bar: string; }");
        assert!(ret.errors.is_empty());
        assert_eq!(ret.program.body.len(), 1);
    }

    #[test]
    fn parses_fake_js_var_array() {
        let parser = ModuleParser::new();
        let ret = parser.parse_module("var Foo = [\"interface \", Foo, \" {}\"];\nexport { Foo };\n");
        assert!(ret.errors.is_empty());
        assert!(matches!(
            ret.program.body.first(),
            Some(Statement::VariableDeclaration(_))
        ));
    }
}
