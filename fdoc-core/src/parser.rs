//! Parser module - import declarations out of script text.
//!
//! This wraps Tree-sitter's TypeScript grammar (which also accepts plain
//! JavaScript) and turns the top-level `import` statements of a module
//! into [`ImportDeclaration`] values. Nested statements are never
//! visited: imports can only appear at the top level of a module.

use crate::error::{CoreError, Result};
use tree_sitter::{Node, Tree};

/// A name bound by an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpecifier {
    /// `import Foo from '...'`
    Default { local: String },
    /// `import { bar as baz } from '...'`
    Named { imported: String, local: String },
    /// `import * as ns from '...'`
    Namespace { local: String },
}

impl ImportSpecifier {
    /// The identifier bound in the importing file.
    pub fn local(&self) -> &str {
        match self {
            Self::Default { local } | Self::Named { local, .. } | Self::Namespace { local } => {
                local
            }
        }
    }
}

/// One top-level `import ... from '...'` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    /// The module specifier, without quotes.
    pub source: String,
    pub specifiers: Vec<ImportSpecifier>,
    /// `import type { ... }`
    pub type_only: bool,
    /// 1-indexed line of the statement.
    pub line: u32,
}

/// Parses script text with the TypeScript grammar.
///
/// Fails when the text contains syntax errors; the error names the first
/// offending position.
pub fn parse_script(source: &str) -> Result<Tree> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_typescript::language_typescript())
        .map_err(|e| CoreError::Parser(format!("Failed to set language: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| CoreError::Parser("Tree-sitter returned no tree".into()))?;

    if tree.root_node().has_error() {
        let position = first_error(&tree.root_node())
            .map(|node| {
                let point = node.start_position();
                format!("line {}, column {}", point.row + 1, point.column + 1)
            })
            .unwrap_or_else(|| "unknown position".to_string());
        return Err(CoreError::Parser(format!("syntax error at {}", position)));
    }

    Ok(tree)
}

/// Finds the first ERROR or MISSING node in document order.
pub fn first_error<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }
    if !node.has_error() {
        return None;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if let Some(found) = first_error(&child) {
                return Some(found);
            }
        }
    }
    None
}

/// Extracts the top-level import declarations of a module.
pub fn parse_imports(source: &str) -> Result<Vec<ImportDeclaration>> {
    let tree = parse_script(source)?;
    let root = tree.root_node();
    let mut imports = Vec::new();

    for i in 0..root.named_child_count() {
        if let Some(statement) = root.named_child(i) {
            if statement.kind() == "import_statement" {
                if let Some(decl) = extract_import(&statement, source) {
                    imports.push(decl);
                }
            }
        }
    }

    Ok(imports)
}

fn extract_import(node: &Node, source: &str) -> Option<ImportDeclaration> {
    let source_node = node.child_by_field_name("source")?;
    let module = get_text(&source_node, source)
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    let mut specifiers = Vec::new();
    let mut type_only = false;

    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        match child.kind() {
            "type" => type_only = true,
            "import_clause" => collect_clause(&child, source, &mut specifiers),
            _ => {}
        }
    }

    Some(ImportDeclaration {
        source: module,
        specifiers,
        type_only,
        line: node.start_position().row as u32 + 1,
    })
}

fn collect_clause(clause: &Node, source: &str, specifiers: &mut Vec<ImportSpecifier>) {
    for i in 0..clause.named_child_count() {
        let Some(child) = clause.named_child(i) else { continue };
        match child.kind() {
            "identifier" => specifiers.push(ImportSpecifier::Default {
                local: get_text(&child, source),
            }),
            "namespace_import" => {
                if let Some(name) = find_named_child(&child, "identifier") {
                    specifiers.push(ImportSpecifier::Namespace {
                        local: get_text(&name, source),
                    });
                }
            }
            "named_imports" => {
                for j in 0..child.named_child_count() {
                    let Some(spec) = child.named_child(j) else { continue };
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let Some(name) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let imported = get_text(&name, source)
                        .trim_matches(|c| c == '"' || c == '\'')
                        .to_string();
                    let local = spec
                        .child_by_field_name("alias")
                        .map(|alias| get_text(&alias, source))
                        .unwrap_or_else(|| imported.clone());
                    specifiers.push(ImportSpecifier::Named { imported, local });
                }
            }
            _ => {}
        }
    }
}

fn find_named_child<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .find(|child| child.kind() == kind)
}

/// Gets text content of a node.
pub(crate) fn get_text(node: &Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}
