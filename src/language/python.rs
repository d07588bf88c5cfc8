//! Python symbol extraction.
//!
//! Covers classes (bases, decorators), functions and methods (async,
//! return annotations), parameters (`*args`/`**kwargs` markers),
//! lambdas, assignments and walrus bindings, attribute accesses,
//! calls with argument capture, imports with alias clues, iteration
//! and exception bindings, match-case captures, and comment/string
//! word splitting with f-string interpolation recursion.

use std::sync::OnceLock;

use anyhow::Result;
use tree_sitter::Node;

use crate::extract::{node_line, node_location, node_text, strip_comment_markers};
use crate::language::{enclosing_named, name_of, Emitter, Language, ParsedSource};
use crate::models::{SymbolContext, SymbolRecord};

pub struct PythonLanguage;

pub static PYTHON: PythonLanguage = PythonLanguage;

static KEYWORDS: &str = include_str!("../../data/python_keywords.txt");

impl Language for PythonLanguage {
    fn id(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn keyword_list(&self) -> &'static str {
        KEYWORDS
    }

    fn ignore_globs(&self) -> &'static [&'static str] {
        &[
            "**/__pycache__/**",
            "**/.venv/**",
            "**/venv/**",
            "**/.tox/**",
            "**/site-packages/**",
            "**/*.egg-info/**",
        ]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn extract(&self, file: &ParsedSource, out: &mut Emitter<'_>) -> Result<()> {
        let kinds = kinds(&self.grammar());
        let namespace = module_path(file);

        let mut walker = Walker {
            kinds,
            src: file.bytes(),
            out,
            namespace,
        };
        walker.walk(file.tree.root_node());
        Ok(())
    }
}

/// Dotted module path of a file: directory components plus the stem.
fn module_path(file: &ParsedSource) -> String {
    let mut path = String::new();
    for part in file.directory.split('/').filter(|p| !p.is_empty()) {
        path.push_str(part);
        path.push('.');
    }
    path.push_str(&file.stem);
    path
}

/// Interned node-kind ids for the Python grammar.
struct Kinds {
    class_definition: u16,
    function_definition: u16,
    decorated_definition: u16,
    decorator: u16,
    lambda: u16,
    assignment: u16,
    augmented_assignment: u16,
    named_expression: u16,
    call: u16,
    attribute: u16,
    keyword_argument: u16,
    import_statement: u16,
    import_from_statement: u16,
    aliased_import: u16,
    identifier: u16,
    comment: u16,
    string: u16,
    string_content: u16,
    interpolation: u16,
    for_statement: u16,
    for_in_clause: u16,
    except_clause: u16,
    as_pattern: u16,
    case_clause: u16,
    global_statement: u16,
    nonlocal_statement: u16,
    yield_expression: u16,
    typed_parameter: u16,
    default_parameter: u16,
    typed_default_parameter: u16,
    list_splat_pattern: u16,
    dictionary_splat_pattern: u16,
    tuple_pattern: u16,
    list_pattern: u16,
    pattern_list: u16,
    block: u16,
}

fn kinds(grammar: &tree_sitter::Language) -> &'static Kinds {
    static KINDS: OnceLock<Kinds> = OnceLock::new();
    KINDS.get_or_init(|| {
        let named = |kind: &str| grammar.id_for_node_kind(kind, true);
        Kinds {
            class_definition: named("class_definition"),
            function_definition: named("function_definition"),
            decorated_definition: named("decorated_definition"),
            decorator: named("decorator"),
            lambda: named("lambda"),
            assignment: named("assignment"),
            augmented_assignment: named("augmented_assignment"),
            named_expression: named("named_expression"),
            call: named("call"),
            attribute: named("attribute"),
            keyword_argument: named("keyword_argument"),
            import_statement: named("import_statement"),
            import_from_statement: named("import_from_statement"),
            aliased_import: named("aliased_import"),
            identifier: named("identifier"),
            comment: named("comment"),
            string: named("string"),
            string_content: named("string_content"),
            interpolation: named("interpolation"),
            for_statement: named("for_statement"),
            for_in_clause: named("for_in_clause"),
            except_clause: named("except_clause"),
            as_pattern: named("as_pattern"),
            case_clause: named("case_clause"),
            global_statement: named("global_statement"),
            nonlocal_statement: named("nonlocal_statement"),
            yield_expression: named("yield"),
            typed_parameter: named("typed_parameter"),
            default_parameter: named("default_parameter"),
            typed_default_parameter: named("typed_default_parameter"),
            list_splat_pattern: named("list_splat_pattern"),
            dictionary_splat_pattern: named("dictionary_splat_pattern"),
            tuple_pattern: named("tuple_pattern"),
            list_pattern: named("list_pattern"),
            pattern_list: named("pattern_list"),
            block: named("block"),
        }
    })
}

struct Walker<'s, 'e, 'f> {
    kinds: &'static Kinds,
    src: &'s [u8],
    out: &'e mut Emitter<'f>,
    namespace: String,
}

impl Walker<'_, '_, '_> {
    fn text(&self, node: Node) -> &str {
        node_text(node, self.src)
    }

    fn structural(&mut self, record: SymbolRecord) {
        let namespace = self.namespace.clone();
        self.out.push(record.with_namespace(namespace));
    }

    fn filtered(&mut self, record: SymbolRecord) {
        let namespace = self.namespace.clone();
        self.out.push_filtered(record.with_namespace(namespace));
    }

    /// Name of the closest enclosing class or function, used as the
    /// `parent` of nested emissions.
    fn enclosing_parent(&self, node: Node) -> String {
        let kinds = [self.kinds.class_definition, self.kinds.function_definition];
        enclosing_named(node, &kinds)
            .and_then(|ancestor| name_of(ancestor, self.src))
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn walk_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn walk(&mut self, node: Node) {
        let k = self.kinds;
        let id = node.kind_id();

        if id == k.decorated_definition {
            self.handle_decorated(node);
        } else if id == k.class_definition {
            self.handle_class(node, String::new());
        } else if id == k.function_definition {
            self.handle_function(node, String::new());
        } else if id == k.lambda {
            self.handle_lambda(node);
        } else if id == k.assignment || id == k.augmented_assignment {
            self.handle_assignment(node);
        } else if id == k.named_expression {
            self.handle_walrus(node);
        } else if id == k.call {
            self.handle_call(node);
        } else if id == k.attribute {
            self.handle_attribute(node);
        } else if id == k.import_statement {
            self.handle_import(node);
        } else if id == k.import_from_statement {
            self.handle_import_from(node);
        } else if id == k.comment {
            let text = strip_comment_markers(self.text(node));
            let namespace = self.namespace.clone();
            self.out
                .push_words(&text, node_line(node), SymbolContext::Comment, "", &namespace);
        } else if id == k.string {
            self.handle_string(node);
        } else if id == k.for_statement || id == k.for_in_clause {
            self.handle_for(node);
        } else if id == k.except_clause {
            self.handle_except(node);
        } else if id == k.case_clause {
            self.handle_case(node);
        } else if id == k.global_statement || id == k.nonlocal_statement {
            self.handle_scope_statement(node);
        } else if id == k.yield_expression {
            self.handle_yield(node);
        } else {
            self.walk_children(node);
        }
    }

    /// Decorated definitions carry the decorator list as the clue of
    /// the wrapped class or function.
    fn handle_decorated(&mut self, node: Node) {
        let mut decorators: Vec<String> = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind_id() == self.kinds.decorator {
                let text = self.text(child);
                let name = text
                    .trim_start_matches('@')
                    .split('(')
                    .next()
                    .unwrap_or("")
                    .trim();
                if !name.is_empty() {
                    decorators.push(name.to_string());
                }
            }
        }
        let clue = decorators.join(",");

        if let Some(definition) = node.child_by_field_name("definition") {
            let id = definition.kind_id();
            if id == self.kinds.class_definition {
                self.handle_class(definition, clue);
            } else if id == self.kinds.function_definition {
                self.handle_function(definition, clue);
            } else {
                self.walk(definition);
            }
        }
    }

    fn handle_class(&mut self, node: Node, clue: String) {
        let Some(name) = name_of(node, self.src) else {
            self.walk_children(node);
            return;
        };

        let parent = self.enclosing_parent(node);
        // Definition name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name, SymbolContext::Class)
                .with_parent(parent)
                .with_clue(clue)
                .with_definition(node_location(node)),
        );

        if let Some(bases) = node.child_by_field_name("superclasses") {
            let class_name = name_of(node, self.src).unwrap_or_default().to_string();
            let mut cursor = bases.walk();
            for base in bases.named_children(&mut cursor) {
                if base.kind_id() == self.kinds.identifier
                    || base.kind_id() == self.kinds.attribute
                {
                    let base_text = self.text(base).to_string();
                    self.filtered(
                        SymbolRecord::new(node_line(base), base_text, SymbolContext::Type)
                            .with_parent(class_name.clone()),
                    );
                } else {
                    self.walk(base);
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_function(&mut self, node: Node, clue: String) {
        let Some(name) = name_of(node, self.src) else {
            self.walk_children(node);
            return;
        };

        let is_async = node
            .child(0)
            .map(|first| first.kind() == "async")
            .unwrap_or(false);
        let return_type = node
            .child_by_field_name("return_type")
            .map(|t| self.text(t).to_string())
            .unwrap_or_default();
        let parent = self.enclosing_parent(node);

        // Definition name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name.clone(), SymbolContext::Function)
                .with_parent(parent)
                .with_modifier(if is_async { "async" } else { "" })
                .with_type(return_type)
                .with_clue(clue)
                .with_definition(node_location(node)),
        );

        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.handle_parameters(parameters, &name);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    /// Each parameter is its own definition. Both `parent` and `clue`
    /// carry the owning function's name; splat markers replace the
    /// clue.
    fn handle_parameters(&mut self, parameters: Node, owner: &str) {
        let k = self.kinds;
        let mut cursor = parameters.walk();
        for param in parameters.named_children(&mut cursor) {
            let id = param.kind_id();

            let (name_node, type_text, splat) = if id == k.identifier {
                (Some(param), String::new(), "")
            } else if id == k.typed_parameter {
                let annotation = param
                    .child_by_field_name("type")
                    .map(|t| self.text(t).to_string())
                    .unwrap_or_default();
                (param.named_child(0), annotation, "")
            } else if id == k.default_parameter || id == k.typed_default_parameter {
                let annotation = param
                    .child_by_field_name("type")
                    .map(|t| self.text(t).to_string())
                    .unwrap_or_default();
                if let Some(value) = param.child_by_field_name("value") {
                    self.walk(value);
                }
                (param.child_by_field_name("name"), annotation, "")
            } else if id == k.list_splat_pattern {
                (param.named_child(0), String::new(), "*args")
            } else if id == k.dictionary_splat_pattern {
                (param.named_child(0), String::new(), "**kwargs")
            } else {
                self.walk(param);
                continue;
            };

            let Some(name_node) = name_node else { continue };
            if name_node.kind_id() != k.identifier {
                continue;
            }

            let clue = if splat.is_empty() { owner } else { splat };
            let name = self.text(name_node).to_string();
            // Parameter definition; bypasses the filter.
            self.structural(
                SymbolRecord::new(node_line(name_node), name, SymbolContext::Argument)
                    .with_parent(owner)
                    .with_clue(clue)
                    .with_type(type_text)
                    .with_definition(node_location(name_node)),
            );
        }
    }

    fn handle_lambda(&mut self, node: Node) {
        self.structural(
            SymbolRecord::new(node_line(node), "<lambda>", SymbolContext::Lambda)
                .with_clue("lambda")
                .with_definition(node_location(node)),
        );

        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.handle_parameters(parameters, "lambda");
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_assignment(&mut self, node: Node) {
        let annotation = node
            .child_by_field_name("type")
            .map(|t| self.text(t).to_string())
            .unwrap_or_default();

        if let Some(left) = node.child_by_field_name("left") {
            self.emit_targets(left, &annotation, "");
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(right);
        }
    }

    /// Assignment targets: identifiers become variables, attribute
    /// targets become properties of their object expression, nested
    /// patterns recurse.
    fn emit_targets(&mut self, target: Node, annotation: &str, clue: &str) {
        let k = self.kinds;
        let id = target.kind_id();

        if id == k.identifier {
            let parent = self.enclosing_parent(target);
            let name = self.text(target).to_string();
            self.filtered(
                SymbolRecord::new(node_line(target), name, SymbolContext::Variable)
                    .with_parent(parent)
                    .with_type(annotation)
                    .with_clue(clue),
            );
        } else if id == k.attribute {
            let object = target
                .child_by_field_name("object")
                .map(|o| self.text(o).to_string())
                .unwrap_or_default();
            if let Some(attribute) = target.child_by_field_name("attribute") {
                let name = self.text(attribute).to_string();
                self.filtered(
                    SymbolRecord::new(node_line(attribute), name, SymbolContext::Property)
                        .with_parent(object)
                        .with_type(annotation)
                        .with_clue(clue),
                );
            }
            if let Some(object_node) = target.child_by_field_name("object") {
                self.walk(object_node);
            }
        } else if id == k.tuple_pattern || id == k.list_pattern || id == k.pattern_list {
            let mut cursor = target.walk();
            for child in target.named_children(&mut cursor) {
                self.emit_targets(child, annotation, clue);
            }
        } else {
            self.walk(target);
        }
    }

    fn handle_walrus(&mut self, node: Node) {
        if let Some(name) = node.child_by_field_name("name") {
            if name.kind_id() == self.kinds.identifier {
                let parent = self.enclosing_parent(name);
                let text = self.text(name).to_string();
                self.filtered(
                    SymbolRecord::new(node_line(name), text, SymbolContext::Variable)
                        .with_parent(parent)
                        .with_clue(":="),
                );
            }
        }
        if let Some(value) = node.child_by_field_name("value") {
            self.walk(value);
        }
    }

    fn handle_call(&mut self, node: Node) {
        let k = self.kinds;
        let mut call_name = String::new();

        if let Some(function) = node.child_by_field_name("function") {
            let id = function.kind_id();
            if id == k.identifier {
                call_name = self.text(function).to_string();
                self.filtered(SymbolRecord::new(
                    node_line(function),
                    call_name.clone(),
                    SymbolContext::Call,
                ));
            } else if id == k.attribute {
                let object = function
                    .child_by_field_name("object")
                    .map(|o| self.text(o).to_string())
                    .unwrap_or_default();
                if let Some(attribute) = function.child_by_field_name("attribute") {
                    call_name = self.text(attribute).to_string();
                    self.filtered(
                        SymbolRecord::new(
                            node_line(attribute),
                            call_name.clone(),
                            SymbolContext::Call,
                        )
                        .with_parent(object),
                    );
                }
                if let Some(object_node) = function.child_by_field_name("object") {
                    self.walk(object_node);
                }
            } else {
                self.walk(function);
            }
        }

        if let Some(arguments) = node.child_by_field_name("arguments") {
            let mut cursor = arguments.walk();
            for argument in arguments.named_children(&mut cursor) {
                let id = argument.kind_id();
                if id == k.identifier {
                    // Call-site arguments are deliberately not run
                    // through the filter: keywords can be real names
                    // in other languages.
                    let name = self.text(argument).to_string();
                    self.structural(
                        SymbolRecord::new(node_line(argument), name, SymbolContext::Argument)
                            .with_clue(call_name.clone()),
                    );
                } else if id == k.keyword_argument {
                    if let Some(value) = argument.child_by_field_name("value") {
                        if value.kind_id() == k.identifier {
                            let name = self.text(value).to_string();
                            self.structural(
                                SymbolRecord::new(node_line(value), name, SymbolContext::Argument)
                                    .with_clue(call_name.clone()),
                            );
                        } else {
                            self.walk(value);
                        }
                    }
                } else {
                    self.walk(argument);
                }
            }
        }
    }

    fn handle_attribute(&mut self, node: Node) {
        let object = node
            .child_by_field_name("object")
            .map(|o| self.text(o).to_string())
            .unwrap_or_default();
        if let Some(attribute) = node.child_by_field_name("attribute") {
            let name = self.text(attribute).to_string();
            self.filtered(
                SymbolRecord::new(node_line(attribute), name, SymbolContext::Property)
                    .with_parent(object),
            );
        }
        if let Some(object_node) = node.child_by_field_name("object") {
            self.walk(object_node);
        }
    }

    fn handle_import(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind_id() == k.aliased_import {
                self.emit_aliased_import(child, "");
            } else {
                // Imported names are declarations; they bypass the
                // filter so short module names stay searchable.
                let name = self.text(child).to_string();
                self.structural(SymbolRecord::new(
                    node_line(child),
                    name,
                    SymbolContext::Import,
                ));
            }
        }
    }

    fn handle_import_from(&mut self, node: Node) {
        let k = self.kinds;
        let module = node
            .child_by_field_name("module_name")
            .map(|m| self.text(m).to_string())
            .unwrap_or_default();

        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            if name.kind_id() == k.aliased_import {
                self.emit_aliased_import(name, &module);
            } else {
                let text = self.text(name).to_string();
                self.structural(
                    SymbolRecord::new(node_line(name), text, SymbolContext::Import)
                        .with_clue(module.clone()),
                );
            }
        }
    }

    /// Aliased imports index the alias; the original name goes in the
    /// clue.
    fn emit_aliased_import(&mut self, node: Node, _module: &str) {
        let original = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        if let Some(alias) = node.child_by_field_name("alias") {
            let name = self.text(alias).to_string();
            self.structural(
                SymbolRecord::new(node_line(alias), name, SymbolContext::Import)
                    .with_clue(original),
            );
        }
    }

    /// Strings split into words; f-string interpolations recurse as
    /// expressions instead.
    fn handle_string(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let id = child.kind_id();
            if id == k.string_content {
                let text = self.text(child).to_string();
                let namespace = self.namespace.clone();
                self.out.push_words(
                    &text,
                    node_line(child),
                    SymbolContext::String,
                    "",
                    &namespace,
                );
            } else if id == k.interpolation {
                self.walk_children(child);
            }
        }
    }

    fn handle_for(&mut self, node: Node) {
        if let Some(left) = node.child_by_field_name("left") {
            self.emit_targets(left, "", "");
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(right);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    /// `except SomeError as e:` yields the type as an exception record,
    /// the binding a variable.
    fn handle_except(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let id = child.kind_id();
            if id == k.block {
                self.walk(child);
            } else if id == k.as_pattern {
                if let Some(type_node) = child.named_child(0) {
                    self.emit_exception_types(type_node);
                }
                if let Some(alias) = child.child_by_field_name("alias") {
                    let binding = alias.named_child(0).unwrap_or(alias);
                    let name = self.text(binding).to_string();
                    self.filtered(SymbolRecord::new(
                        node_line(binding),
                        name,
                        SymbolContext::Variable,
                    ));
                }
            } else {
                self.emit_exception_types(child);
            }
        }
    }

    fn emit_exception_types(&mut self, node: Node) {
        let k = self.kinds;
        let id = node.kind_id();
        if id == k.identifier || id == k.attribute {
            let name = self.text(node).to_string();
            self.filtered(SymbolRecord::new(
                node_line(node),
                name,
                SymbolContext::Exception,
            ));
        } else {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                self.emit_exception_types(child);
            }
        }
    }

    /// Capture names in `match` arms surface as variables.
    fn handle_case(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind_id() == k.block {
                self.walk(child);
            } else {
                self.emit_case_captures(child);
            }
        }
    }

    fn emit_case_captures(&mut self, node: Node) {
        if node.kind_id() == self.kinds.identifier {
            let name = self.text(node).to_string();
            self.filtered(SymbolRecord::new(
                node_line(node),
                name,
                SymbolContext::Variable,
            ));
            return;
        }
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.emit_case_captures(child);
        }
    }

    fn handle_scope_statement(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind_id() == self.kinds.identifier {
                let name = self.text(child).to_string();
                self.filtered(SymbolRecord::new(
                    node_line(child),
                    name,
                    SymbolContext::Variable,
                ));
            }
        }
    }

    fn handle_yield(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind_id() == self.kinds.identifier {
                let name = self.text(child).to_string();
                self.filtered(
                    SymbolRecord::new(node_line(child), name, SymbolContext::Variable)
                        .with_clue("yield"),
                );
            } else {
                self.walk(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SymbolFilter;
    use crate::language::parse_source;
    use crate::models::SymbolContext;

    fn extract(source: &str) -> Vec<SymbolRecord> {
        let parsed =
            parse_source(&PYTHON, source.to_string(), "", "sample.py").expect("parsed");
        let filter = SymbolFilter::new(&[PYTHON.keyword_list()]).expect("filter");
        let mut emitter = Emitter::new(&filter);
        PYTHON.extract(&parsed, &mut emitter).expect("extract");
        emitter.into_records()
    }

    fn find<'a>(
        records: &'a [SymbolRecord],
        symbol: &str,
        context: SymbolContext,
    ) -> &'a SymbolRecord {
        records
            .iter()
            .find(|r| r.symbol == symbol && r.context == context)
            .unwrap_or_else(|| panic!("missing {symbol:?} as {context:?}"))
    }

    #[test]
    fn function_definition_emits_name_and_arguments() {
        let source = "\
def validateUser(username, password):
    return username
";
        let records = extract(source);

        let function = find(&records, "validateuser", SymbolContext::Function);
        assert!(function.is_definition);
        assert_eq!(function.full_symbol, "validateUser");
        let location = function.source_location.expect("location");
        assert_eq!(location.start_line, 1);
        assert_eq!(location.end_line, 2);

        let argument = find(&records, "username", SymbolContext::Argument);
        assert!(argument.is_definition);
        assert_eq!(argument.parent, "validateUser");
        assert_eq!(argument.clue, "validateUser");

        find(&records, "password", SymbolContext::Argument);
    }

    #[test]
    fn class_with_bases_methods_and_properties() {
        let source = "\
class TokenStore(BaseStore):
    def __init__(self, cache_size):
        self.cache_size = cache_size
";
        let records = extract(source);

        let class = find(&records, "tokenstore", SymbolContext::Class);
        assert!(class.is_definition);

        let base = find(&records, "basestore", SymbolContext::Type);
        assert_eq!(base.parent, "TokenStore");

        let method = find(&records, "__init__", SymbolContext::Function);
        assert_eq!(method.parent, "TokenStore");

        let property = find(&records, "cache_size", SymbolContext::Property);
        assert_eq!(property.parent, "self");
    }

    #[test]
    fn splat_parameters_carry_marker_clues() {
        let records = extract("def spread(*args, **kwargs):\n    pass\n");

        let args = find(&records, "args", SymbolContext::Argument);
        assert_eq!(args.clue, "*args");
        let kwargs = find(&records, "kwargs", SymbolContext::Argument);
        assert_eq!(kwargs.clue, "**kwargs");
    }

    #[test]
    fn walrus_bindings_get_their_clue() {
        let records = extract("if (result := compute_total()):\n    pass\n");

        let binding = find(&records, "result", SymbolContext::Variable);
        assert_eq!(binding.clue, ":=");
        find(&records, "compute_total", SymbolContext::Call);
    }

    #[test]
    fn method_calls_record_receiver_and_arguments() {
        let records = extract("client.send_request(payload, retries)\n");

        let call = find(&records, "send_request", SymbolContext::Call);
        assert_eq!(call.parent, "client");

        let payload = find(&records, "payload", SymbolContext::Argument);
        assert_eq!(payload.clue, "send_request");
        find(&records, "retries", SymbolContext::Argument);
    }

    #[test]
    fn aliased_imports_index_the_alias() {
        let records = extract("import numpy as np\nfrom os.path import join\n");

        let alias = find(&records, "np", SymbolContext::Import);
        assert_eq!(alias.clue, "numpy");

        let join = find(&records, "join", SymbolContext::Import);
        assert_eq!(join.clue, "os.path");
    }

    #[test]
    fn except_clause_splits_type_and_binding() {
        let source = "\
try:
    risky_operation()
except ValueError as err:
    raise
";
        let records = extract(source);

        find(&records, "valueerror", SymbolContext::Exception);
        find(&records, "err", SymbolContext::Variable);
        find(&records, "risky_operation", SymbolContext::Call);
    }

    #[test]
    fn lambda_emits_synthetic_definition() {
        let records = extract("handler = lambda request: request\n");

        let lambda = find(&records, "<lambda>", SymbolContext::Lambda);
        assert!(lambda.is_definition);
        assert_eq!(lambda.clue, "lambda");

        let parameter = find(&records, "request", SymbolContext::Argument);
        assert_eq!(parameter.parent, "lambda");

        find(&records, "handler", SymbolContext::Variable);
    }

    #[test]
    fn comment_and_string_words_are_filtered() {
        let source = "\
# Validate the session token
message = \"session expired\"
";
        let records = extract(source);

        find(&records, "validate", SymbolContext::Comment);
        find(&records, "session", SymbolContext::Comment);
        find(&records, "token", SymbolContext::Comment);
        // "the" is a stopword and never lands in the index.
        assert!(!records
            .iter()
            .any(|r| r.symbol == "the" && r.context == SymbolContext::Comment));

        find(&records, "expired", SymbolContext::String);
    }

    #[test]
    fn fstring_interpolations_recurse_as_expressions() {
        let records = extract("label = f\"user {account.display_name} logged\"\n");

        let property = find(&records, "display_name", SymbolContext::Property);
        assert_eq!(property.parent, "account");
        find(&records, "logged", SymbolContext::String);
    }

    #[test]
    fn decorators_become_the_definition_clue() {
        let source = "\
@app.route
@cached
def dashboard():
    pass
";
        let records = extract(source);
        let function = find(&records, "dashboard", SymbolContext::Function);
        assert_eq!(function.clue, "app.route,cached");
    }

    #[test]
    fn namespace_is_the_dotted_module_path() {
        let parsed = parse_source(
            &PYTHON,
            "def ping():\n    pass\n".to_string(),
            "src/net/",
            "client.py",
        )
        .expect("parsed");
        let filter = SymbolFilter::new(&[PYTHON.keyword_list()]).expect("filter");
        let mut emitter = Emitter::new(&filter);
        PYTHON.extract(&parsed, &mut emitter).expect("extract");

        let records = emitter.into_records();
        let function = records
            .iter()
            .find(|r| r.symbol == "ping")
            .expect("ping record");
        assert_eq!(function.namespace, "src.net.client");
    }

    #[test]
    fn for_loops_expose_iteration_variables() {
        let records = extract("for entry in entries:\n    entry.process()\n");
        find(&records, "entry", SymbolContext::Variable);
        let call = find(&records, "process", SymbolContext::Call);
        assert_eq!(call.parent, "entry");
    }

    #[test]
    fn comprehension_targets_are_variables() {
        let records = extract("totals = [item.price for item in basket]\n");
        find(&records, "item", SymbolContext::Variable);
        let price = find(&records, "price", SymbolContext::Property);
        assert_eq!(price.parent, "item");
    }
}
