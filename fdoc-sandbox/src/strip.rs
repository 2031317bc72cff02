//! TypeScript to JavaScript.
//!
//! Snippets are run by a plain JavaScript runtime, so their TypeScript
//! syntax is erased first. Erasure is subtractive: every removed byte
//! becomes a space (newlines are kept), so line and column numbers in
//! runtime errors still point at the original snippet.
//!
//! A few constructs carry runtime meaning and are lowered instead:
//! parameter properties become `this.x = x;` assignments at the top of
//! the constructor, enums and namespaces become the usual
//! `(function (E) { ... })(E || (E = {}))` objects. Generated code is
//! written on the line of the construct it replaces.
//!
//! Value `import`s have nothing to bind to inside the sandbox and are
//! rejected.

use fdoc_core::parse_script;
use std::fmt;
use std::ops::Range;
use tree_sitter::Node;

/// Why a snippet could not be turned into JavaScript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripError {
    Syntax(String),
    Unsupported { construct: &'static str, line: usize },
}

impl fmt::Display for StripError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(message) => write!(f, "{}", message),
            Self::Unsupported { construct, line } => {
                write!(f, "{} are not supported in snippets (line {})", construct, line)
            }
        }
    }
}

impl std::error::Error for StripError {}

/// Text written at `range.start`; the rest of `range` is blanked.
#[derive(Debug)]
struct Edit {
    range: Range<usize>,
    text: String,
}

impl Edit {
    fn remove(range: Range<usize>) -> Self {
        Self {
            range,
            text: String::new(),
        }
    }

    fn insert(at: usize, text: String) -> Self {
        Self { range: at..at, text }
    }

    fn replace(range: Range<usize>, text: String) -> Self {
        Self { range, text }
    }
}

/// Turns `source` into plain JavaScript.
pub fn strip_types(source: &str) -> Result<String, StripError> {
    let tree = parse_script(source).map_err(|e| StripError::Syntax(e.to_string()))?;
    let mut edits = Vec::new();
    visit(&tree.root_node(), source, &mut edits)?;
    Ok(apply_edits(source, edits))
}

fn unsupported(node: &Node, construct: &'static str) -> StripError {
    StripError::Unsupported {
        construct,
        line: line_of(node),
    }
}

fn line_of(node: &Node) -> usize {
    node.start_position().row + 1
}

fn text<'s>(node: &Node, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

fn visit(node: &Node, source: &str, edits: &mut Vec<Edit>) -> Result<(), StripError> {
    match node.kind() {
        // Whole nodes that are types only.
        "type_annotation"
        | "type_predicate_annotation"
        | "asserts_annotation"
        | "opting_type_annotation"
        | "type_parameters"
        | "type_arguments"
        | "interface_declaration"
        | "type_alias_declaration"
        | "ambient_declaration"
        | "implements_clause"
        | "accessibility_modifier"
        | "override_modifier"
        | "function_signature"
        | "method_signature"
        | "abstract_method_signature"
        | "index_signature" => {
            edits.push(Edit::remove(node.byte_range()));
            return Ok(());
        }

        "enum_declaration" => {
            edits.push(Edit::replace(node.byte_range(), lower_enum(node, source)?));
            return Ok(());
        }

        "internal_module" | "module" => lower_namespace(node, source, edits)?,

        "import_statement" => {
            if has_token(node, "type") {
                edits.push(Edit::remove(node.byte_range()));
                return Ok(());
            }
            return Err(unsupported(node, "Imports"));
        }

        "export_statement" => {
            let body = node
                .child_by_field_name("declaration")
                .or_else(|| node.child_by_field_name("value"));
            match body {
                Some(body) => edits.push(Edit::remove(node.start_byte()..body.start_byte())),
                None => {
                    edits.push(Edit::remove(node.byte_range()));
                    return Ok(());
                }
            }
        }

        // `x as T`, `x satisfies T`: keep the expression.
        "as_expression" | "satisfies_expression" => {
            if let Some(expression) = node.named_child(0) {
                edits.push(Edit::remove(expression.end_byte()..node.end_byte()));
                return visit(&expression, source, edits);
            }
        }

        // `x!`
        "non_null_expression" => {
            edits.push(Edit::remove(node.end_byte() - 1..node.end_byte()));
        }

        "public_field_definition" => {
            if has_token(node, "declare") || has_token(node, "abstract") {
                edits.push(Edit::remove(node.byte_range()));
                return Ok(());
            }
            remove_tokens(node, &["readonly", "?", "!"], edits);
        }

        "formal_parameters" => remove_this_parameter(node, edits),

        "required_parameter" | "optional_parameter" => {
            remove_tokens(node, &["?", "readonly"], edits);
        }

        "method_definition" => {
            remove_tokens(node, &["?"], edits);
            assign_parameter_properties(node, source, edits);
        }

        "variable_declarator" => remove_tokens(node, &["!"], edits),
        "abstract_class_declaration" => remove_tokens(node, &["abstract"], edits),

        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        visit(&child, source, edits)?;
    }
    Ok(())
}

/// True when `node` has a direct anonymous child token `kind`.
fn has_token(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == kind);
    found
}

fn remove_tokens(node: &Node, kinds: &[&str], edits: &mut Vec<Edit>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.is_named() && kinds.contains(&child.kind()) {
            edits.push(Edit::remove(child.byte_range()));
        }
    }
}

/// Drops a `this: T` parameter together with the comma after it.
fn remove_this_parameter(parameters: &Node, edits: &mut Vec<Edit>) {
    let mut cursor = parameters.walk();
    let children: Vec<Node> = parameters.children(&mut cursor).collect();
    for (i, child) in children.iter().enumerate() {
        let is_this = matches!(child.kind(), "required_parameter" | "optional_parameter")
            && child
                .child_by_field_name("pattern")
                .map_or(false, |pattern| pattern.kind() == "this");
        if !is_this {
            continue;
        }
        let end = match children.get(i + 1) {
            Some(next) if next.kind() == "," => next.end_byte(),
            _ => child.end_byte(),
        };
        edits.push(Edit::remove(child.start_byte()..end));
    }
}

/// Names declared as constructor parameter properties
/// (`constructor(private x: number)`).
fn parameter_properties<'s>(parameters: &Node, source: &'s str) -> Vec<&'s str> {
    let mut cursor = parameters.walk();
    let names = parameters
        .named_children(&mut cursor)
        .filter(|parameter| {
            let mut inner = parameter.walk();
            let is_property = parameter.children(&mut inner).any(|child| {
                matches!(
                    child.kind(),
                    "accessibility_modifier" | "override_modifier" | "readonly"
                )
            });
            is_property
        })
        .filter_map(|parameter| parameter.child_by_field_name("pattern"))
        .filter(|pattern| pattern.kind() == "identifier")
        .map(|pattern| text(&pattern, source))
        .collect();
    names
}

/// Adds `this.x = x;` for each parameter property, after the `super(...)`
/// call when the constructor has one.
fn assign_parameter_properties(method: &Node, source: &str, edits: &mut Vec<Edit>) {
    let is_constructor = method
        .child_by_field_name("name")
        .map_or(false, |name| text(&name, source) == "constructor");
    if !is_constructor {
        return;
    }
    let (Some(parameters), Some(body)) = (
        method.child_by_field_name("parameters"),
        method.child_by_field_name("body"),
    ) else {
        return;
    };

    let names = parameter_properties(&parameters, source);
    if names.is_empty() {
        return;
    }

    let mut cursor = body.walk();
    let super_call = body.named_children(&mut cursor).find(|statement| {
        statement.kind() == "expression_statement"
            && statement
                .named_child(0)
                .filter(|call| call.kind() == "call_expression")
                .and_then(|call| call.child_by_field_name("function"))
                .map_or(false, |function| function.kind() == "super")
    });
    let (at, separator) = match super_call {
        Some(statement) => (statement.end_byte(), separator_after(&statement, source)),
        None => (body.start_byte() + 1, ""),
    };

    let assignments: String = names
        .iter()
        .map(|name| format!(" this.{0} = {0};", name))
        .collect();
    edits.push(Edit::insert(at, format!("{}{}", separator, assignments)));
}

/// `enum E { A, B = 5 }` as the object TypeScript emits, with reverse
/// mappings for numeric members.
fn lower_enum(node: &Node, source: &str) -> Result<String, StripError> {
    enum Next {
        Value(i64),
        After(String),
        Unknown,
    }

    let (Some(name), Some(body)) = (
        node.child_by_field_name("name"),
        node.child_by_field_name("body"),
    ) else {
        return Err(unsupported(node, "Enums without a name"));
    };
    let name = text(&name, source);

    let mut members = String::new();
    let mut next = Next::Value(0);
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        let (key_node, value) = if member.kind() == "enum_assignment" {
            (
                member.child_by_field_name("name"),
                member.child_by_field_name("value"),
            )
        } else {
            (Some(member), None)
        };
        let Some(key_node) = key_node else { continue };
        let key = match key_node.kind() {
            "string" => text(&key_node, source).to_string(),
            _ => format!("\"{}\"", text(&key_node, source)),
        };

        let member_text = match value {
            Some(value) if matches!(value.kind(), "string" | "template_string") => {
                next = Next::Unknown;
                format!(" {}[{}] = {};", name, key, text(&value, source))
            }
            Some(value) => {
                let raw = text(&value, source);
                match parse_integer(raw) {
                    Some(n) => {
                        next = Next::Value(n + 1);
                        format!(" {0}[{0}[{1}] = {2}] = {1};", name, key, n)
                    }
                    None => {
                        next = Next::After(key.clone());
                        format!(" {0}[{0}[{1}] = ({2})] = {1};", name, key, raw)
                    }
                }
            }
            None => match &next {
                Next::Value(n) => {
                    let n = *n;
                    next = Next::Value(n + 1);
                    format!(" {0}[{0}[{1}] = {2}] = {1};", name, key, n)
                }
                Next::After(previous) => {
                    let line = format!(" {0}[{0}[{1}] = {0}[{2}] + 1] = {1};", name, key, previous);
                    next = Next::After(key.clone());
                    line
                }
                Next::Unknown => {
                    return Err(StripError::Syntax(format!(
                        "enum member {} needs an initializer (line {})",
                        key,
                        line_of(&member)
                    )))
                }
            },
        };
        members.push_str(&member_text);
    }

    Ok(format!(
        "var {0}; (function ({0}) {{{1} }})({0} || ({0} = {{}}));",
        name, members
    ))
}

fn parse_integer(raw: &str) -> Option<i64> {
    let raw = raw.replace('_', "");
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    raw.parse().ok()
}

/// Wraps a namespace body in nested IIFEs (one per name segment) and
/// copies each exported declaration onto the namespace object.
fn lower_namespace(node: &Node, source: &str, edits: &mut Vec<Edit>) -> Result<(), StripError> {
    let Some(name) = node.child_by_field_name("name") else {
        return Err(unsupported(node, "Namespaces without a name"));
    };
    if name.kind() == "string" {
        return Err(unsupported(node, "Ambient module declarations"));
    }
    let Some(body) = node.child_by_field_name("body") else {
        edits.push(Edit::remove(node.byte_range()));
        return Ok(());
    };

    let parts: Vec<&str> = text(&name, source).split('.').map(str::trim).collect();
    let Some(inner) = parts.last().copied() else {
        return Err(unsupported(node, "Namespaces without a name"));
    };

    let mut header = Vec::new();
    let mut footer = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let keyword = if i == 0 { "var" } else { "let" };
        header.push(format!("{0} {1}; (function ({1}) {{", keyword, part));
        footer.push(match i {
            0 => format!("}})({0} || ({0} = {{}}));", part),
            _ => format!(
                "}})({1} = {0}.{1} || ({0}.{1} = {{}}));",
                parts[i - 1],
                part
            ),
        });
    }
    footer.reverse();

    edits.push(Edit::replace(node.start_byte()..body.start_byte() + 1, header.join(" ")));
    edits.push(Edit::replace(body.end_byte() - 1..body.end_byte(), footer.join(" ")));

    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        if statement.kind() != "export_statement" {
            continue;
        }
        let Some(declaration) = statement.child_by_field_name("declaration") else {
            continue;
        };
        let copies: String = declared_names(&declaration, source)
            .into_iter()
            .map(|exported| format!(" {0}.{1} = {1};", inner, exported))
            .collect();
        if !copies.is_empty() {
            let separator = separator_after(&statement, source);
            edits.push(Edit::insert(statement.end_byte(), format!("{}{}", separator, copies)));
        }
    }
    Ok(())
}

/// `;` when code appended after `statement` on the same line would
/// otherwise continue it.
fn separator_after(statement: &Node, source: &str) -> &'static str {
    let statement = text(statement, source).trim_end();
    if statement.ends_with(';') || statement.ends_with('}') {
        ""
    } else {
        ";"
    }
}

/// Value names bound by a declaration; types bind none.
fn declared_names<'s>(declaration: &Node, source: &'s str) -> Vec<&'s str> {
    match declaration.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = declaration.walk();
            let names = declaration
                .named_children(&mut cursor)
                .filter(|declarator| declarator.kind() == "variable_declarator")
                .filter_map(|declarator| declarator.child_by_field_name("name"))
                .filter(|name| name.kind() == "identifier")
                .map(|name| text(&name, source))
                .collect();
            names
        }
        "function_declaration"
        | "generator_function_declaration"
        | "class_declaration"
        | "abstract_class_declaration"
        | "enum_declaration"
        | "internal_module"
        | "module" => declaration
            .child_by_field_name("name")
            .filter(|name| name.kind() == "identifier")
            .map(|name| vec![text(&name, source)])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Writes each edit's text at its start and blanks the rest of its range,
/// keeping line breaks.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.range.start);
    let mut out = String::with_capacity(source.len());
    let mut edits = edits.into_iter().peekable();
    let mut blank_until = 0;

    for (i, c) in source.char_indices() {
        while let Some(edit) = edits.next_if(|edit| edit.range.start <= i) {
            out.push_str(&edit.text);
            blank_until = blank_until.max(edit.range.end);
        }
        if i < blank_until && c != '\n' && c != '\r' {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    for edit in edits {
        out.push_str(&edit.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(js: &str) -> String {
        js.split_whitespace().collect()
    }

    #[test]
    fn test_plain_javascript_is_unchanged() {
        let source = "const a = [1, 2].map((x) => x * 2);\nconsole.log(a);";
        assert_eq!(strip_types(source).unwrap(), source);
    }

    #[test]
    fn test_annotations_and_generics() {
        let js = strip_types(
            "function add<T extends number>(a: T, b?: number): number { return a + (b ?? 0); }\n\
             const count = ref<number>(0);\n\
             const items: Array<string> = [];",
        )
        .unwrap();
        assert_eq!(
            compact(&js),
            "functionadd(a,b){returna+(b??0);}constcount=ref(0);constitems=[];"
        );
        assert_eq!(js.lines().count(), 3);
    }

    #[test]
    fn test_declarations_are_dropped() {
        let js = strip_types(
            "interface User { id: number }\n\
             type Id = string | number;\n\
             declare const env: string;\n\
             import type { Props } from './props';\n\
             const user = { id: 1 };",
        )
        .unwrap();
        assert_eq!(compact(&js), "constuser={id:1};");
        assert_eq!(js.lines().count(), 5);
    }

    #[test]
    fn test_expression_assertions() {
        let js = strip_types("const el = document as any;\nconst v = el!.value satisfies string;").unwrap();
        assert_eq!(compact(&js), "constel=document;constv=el.value;");
    }

    #[test]
    fn test_class_members() {
        let js = strip_types(
            "abstract class Base implements Shape {\n\
               private readonly size: number = 2;\n\
               declare tag: string;\n\
               abstract area(): number;\n\
               public scaled(by: number): number { return this.size * by; }\n\
             }",
        )
        .unwrap();
        let js = compact(&js);
        for erased in ["abstract", "implements", "private", "readonly", "declare", "tag", "area", "public", ":"] {
            assert!(!js.contains(erased), "{} left in {}", erased, js);
        }
        assert!(js.starts_with("classBase{size=2;"));
        assert!(js.contains("scaled(by){returnthis.size*by;}"));
    }

    #[test]
    fn test_exports_are_unwrapped() {
        let js = strip_types("export const x: number = 1;\nexport { x as y };").unwrap();
        assert_eq!(compact(&js), "constx=1;");
    }

    #[test]
    fn test_value_imports_are_rejected() {
        assert!(matches!(
            strip_types("\nimport { ref } from 'vue'"),
            Err(StripError::Unsupported { construct: "Imports", line: 2 })
        ));
    }

    #[test]
    fn test_this_parameter_is_dropped() {
        let js = strip_types(
            "function f(this: Window, x: number) { return x }\n\
             function g(this: any) { return 1 }",
        )
        .unwrap();
        assert_eq!(compact(&js), "functionf(x){returnx}functiong(){return1}");
    }

    #[test]
    fn test_parameter_properties_are_assigned() {
        let js = strip_types(
            "class A { constructor(public x: number, readonly y = 2, z: string) { this.z = z; } }",
        )
        .unwrap();
        assert_eq!(
            compact(&js),
            "classA{constructor(x,y=2,z){this.x=x;this.y=y;this.z=z;}}"
        );
    }

    #[test]
    fn test_parameter_properties_follow_super_call() {
        let js = strip_types(
            "class B extends A { constructor(private n: number) { super(n)\n log(); } }",
        )
        .unwrap();
        assert_eq!(
            compact(&js),
            "classBextendsA{constructor(n){super(n);this.n=n;log();}}"
        );
        assert_eq!(js.lines().count(), 2);
    }

    #[test]
    fn test_enum_becomes_object() {
        let js = strip_types(
            "enum Color {\n  Red,\n  Green = 5,\n  Blue,\n  Hex = 0x10,\n  Name = \"n\",\n}",
        )
        .unwrap();
        assert_eq!(
            compact(&js),
            r#"varColor;(function(Color){Color[Color["Red"]=0]="Red";Color[Color["Green"]=5]="Green";Color[Color["Blue"]=6]="Blue";Color[Color["Hex"]=16]="Hex";Color["Name"]="n";})(Color||(Color={}));"#
        );
        assert_eq!(js.lines().count(), 7);
    }

    #[test]
    fn test_enum_member_after_string_needs_initializer() {
        let err = strip_types("enum E { A = 'a', B }").unwrap_err();
        assert!(matches!(err, StripError::Syntax(ref m) if m.contains("initializer")));
    }

    #[test]
    fn test_exported_enum_and_computed_members() {
        let js = strip_types("export const enum Flag { A = 1 << 1, B }").unwrap();
        assert_eq!(
            compact(&js),
            r#"varFlag;(function(Flag){Flag[Flag["A"]=(1<<1)]="A";Flag[Flag["B"]=Flag["A"]+1]="B";})(Flag||(Flag={}));"#
        );
    }

    #[test]
    fn test_namespace_becomes_object() {
        let js = strip_types(
            "namespace Shapes {\n\
               export const unit = 1;\n\
               export function area(r: number) { return r * r * unit; }\n\
               const hidden = 2;\n\
             }\n\
             console.log(Shapes.area(2));",
        )
        .unwrap();
        assert_eq!(
            compact(&js),
            "varShapes;(function(Shapes){constunit=1;Shapes.unit=unit;\
             functionarea(r){returnr*r*unit;}Shapes.area=area;consthidden=2;\
             })(Shapes||(Shapes={}));console.log(Shapes.area(2));"
        );
        assert_eq!(js.lines().count(), 6);
    }

    #[test]
    fn test_dotted_namespace() {
        let js = strip_types("namespace A.B { export const c = 1 }").unwrap();
        assert_eq!(
            compact(&js),
            "varA;(function(A){letB;(function(B){constc=1;B.c=c;})(B=A.B||(A.B={}));})(A||(A={}));"
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = strip_types("const = ;").unwrap_err();
        assert!(matches!(err, StripError::Syntax(ref m) if m.contains("syntax error")));
    }
}
