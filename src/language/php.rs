//! PHP symbol extraction.
//!
//! PHP is the language with the widest structural surface here:
//! namespaces declared as *siblings* of the code they cover, visibility
//! and abstract/final/static modifiers, constructor property promotion,
//! scoped (`::`) calls and constant accesses, heredoc/nowdoc literals,
//! and `goto`/labels.

use std::sync::OnceLock;

use anyhow::Result;
use tree_sitter::Node;

use crate::extract::{node_line, node_location, node_text, strip_comment_markers};
use crate::language::{enclosing_named, name_of, Emitter, Language, ParsedSource};
use crate::models::{SymbolContext, SymbolRecord};

pub struct PhpLanguage;

pub static PHP: PhpLanguage = PhpLanguage;

static KEYWORDS: &str = include_str!("../../data/php_keywords.txt");

impl Language for PhpLanguage {
    fn id(&self) -> &'static str {
        "php"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["php", "phtml"]
    }

    fn keyword_list(&self) -> &'static str {
        KEYWORDS
    }

    fn ignore_globs(&self) -> &'static [&'static str] {
        &["**/vendor/**", "**/node_modules/**"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_php::LANGUAGE_PHP.into()
    }

    fn extract(&self, file: &ParsedSource, out: &mut Emitter<'_>) -> Result<()> {
        let kinds = kinds(&self.grammar());
        let mut walker = Walker {
            kinds,
            src: file.bytes(),
            out,
            namespace: String::new(),
        };
        walker.walk(file.tree.root_node());
        Ok(())
    }
}

/// Interned node-kind ids for the PHP grammar. Kind names absent from
/// the loaded grammar intern to 0 and never match.
struct Kinds {
    namespace_definition: u16,
    class_declaration: u16,
    interface_declaration: u16,
    trait_declaration: u16,
    enum_declaration: u16,
    enum_case: u16,
    base_clause: u16,
    class_interface_clause: u16,
    method_declaration: u16,
    function_definition: u16,
    simple_parameter: u16,
    variadic_parameter: u16,
    property_promotion_parameter: u16,
    property_declaration: u16,
    property_element: u16,
    const_declaration: u16,
    const_element: u16,
    visibility_modifier: u16,
    static_modifier: u16,
    abstract_modifier: u16,
    final_modifier: u16,
    readonly_modifier: u16,
    function_call_expression: u16,
    member_call_expression: u16,
    nullsafe_member_call_expression: u16,
    scoped_call_expression: u16,
    member_access_expression: u16,
    nullsafe_member_access_expression: u16,
    scoped_property_access_expression: u16,
    class_constant_access_expression: u16,
    object_creation_expression: u16,
    assignment_expression: u16,
    augmented_assignment_expression: u16,
    variable_name: u16,
    name: u16,
    qualified_name: u16,
    argument: u16,
    anonymous_function: u16,
    anonymous_function_creation_expression: u16,
    anonymous_function_use_clause: u16,
    arrow_function: u16,
    namespace_use_declaration: u16,
    namespace_use_clause: u16,
    namespace_aliasing_clause: u16,
    comment: u16,
    string: u16,
    string_content: u16,
    encapsed_string: u16,
    heredoc: u16,
    heredoc_body: u16,
    nowdoc: u16,
    nowdoc_body: u16,
    goto_statement: u16,
    named_label_statement: u16,
    foreach_statement: u16,
    catch_clause: u16,
    global_declaration: u16,
    list_literal: u16,
}

fn kinds(grammar: &tree_sitter::Language) -> &'static Kinds {
    static KINDS: OnceLock<Kinds> = OnceLock::new();
    KINDS.get_or_init(|| {
        let named = |kind: &str| grammar.id_for_node_kind(kind, true);
        Kinds {
            namespace_definition: named("namespace_definition"),
            class_declaration: named("class_declaration"),
            interface_declaration: named("interface_declaration"),
            trait_declaration: named("trait_declaration"),
            enum_declaration: named("enum_declaration"),
            enum_case: named("enum_case"),
            base_clause: named("base_clause"),
            class_interface_clause: named("class_interface_clause"),
            method_declaration: named("method_declaration"),
            function_definition: named("function_definition"),
            simple_parameter: named("simple_parameter"),
            variadic_parameter: named("variadic_parameter"),
            property_promotion_parameter: named("property_promotion_parameter"),
            property_declaration: named("property_declaration"),
            property_element: named("property_element"),
            const_declaration: named("const_declaration"),
            const_element: named("const_element"),
            visibility_modifier: named("visibility_modifier"),
            static_modifier: named("static_modifier"),
            abstract_modifier: named("abstract_modifier"),
            final_modifier: named("final_modifier"),
            readonly_modifier: named("readonly_modifier"),
            function_call_expression: named("function_call_expression"),
            member_call_expression: named("member_call_expression"),
            nullsafe_member_call_expression: named("nullsafe_member_call_expression"),
            scoped_call_expression: named("scoped_call_expression"),
            member_access_expression: named("member_access_expression"),
            nullsafe_member_access_expression: named("nullsafe_member_access_expression"),
            scoped_property_access_expression: named("scoped_property_access_expression"),
            class_constant_access_expression: named("class_constant_access_expression"),
            object_creation_expression: named("object_creation_expression"),
            assignment_expression: named("assignment_expression"),
            augmented_assignment_expression: named("augmented_assignment_expression"),
            variable_name: named("variable_name"),
            name: named("name"),
            qualified_name: named("qualified_name"),
            argument: named("argument"),
            anonymous_function: named("anonymous_function"),
            anonymous_function_creation_expression: named("anonymous_function_creation_expression"),
            anonymous_function_use_clause: named("anonymous_function_use_clause"),
            arrow_function: named("arrow_function"),
            namespace_use_declaration: named("namespace_use_declaration"),
            namespace_use_clause: named("namespace_use_clause"),
            namespace_aliasing_clause: named("namespace_aliasing_clause"),
            comment: named("comment"),
            string: named("string"),
            string_content: named("string_content"),
            encapsed_string: named("encapsed_string"),
            heredoc: named("heredoc"),
            heredoc_body: named("heredoc_body"),
            nowdoc: named("nowdoc"),
            nowdoc_body: named("nowdoc_body"),
            goto_statement: named("goto_statement"),
            named_label_statement: named("named_label_statement"),
            foreach_statement: named("foreach_statement"),
            catch_clause: named("catch_clause"),
            global_declaration: named("global_declaration"),
            list_literal: named("list_literal"),
        }
    })
}

struct Walker<'s, 'e, 'f> {
    kinds: &'static Kinds,
    src: &'s [u8],
    out: &'e mut Emitter<'f>,
    /// Set by the most recent `namespace X;` declaration; brace-less
    /// namespaces apply to every following sibling, which falls out of
    /// updating this during the in-order walk.
    namespace: String,
}

impl Walker<'_, '_, '_> {
    fn text(&self, node: Node) -> &str {
        node_text(node, self.src)
    }

    /// Text of a `$variable`, without the sigil.
    fn variable_text(&self, node: Node) -> String {
        self.text(node).trim_start_matches('$').to_string()
    }

    fn structural(&mut self, record: SymbolRecord) {
        let namespace = self.namespace.clone();
        self.out.push(record.with_namespace(namespace));
    }

    fn filtered(&mut self, record: SymbolRecord) {
        let namespace = self.namespace.clone();
        self.out.push_filtered(record.with_namespace(namespace));
    }

    fn words(&mut self, text: &str, line: u32, context: SymbolContext, clue: &str) {
        let namespace = self.namespace.clone();
        self.out.push_words(text, line, context, clue, &namespace);
    }

    fn class_kinds(&self) -> [u16; 4] {
        [
            self.kinds.class_declaration,
            self.kinds.interface_declaration,
            self.kinds.trait_declaration,
            self.kinds.enum_declaration,
        ]
    }

    fn enclosing_class(&self, node: Node) -> String {
        enclosing_named(node, &self.class_kinds())
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

        if id == k.namespace_definition {
            self.handle_namespace(node);
        } else if id == k.class_declaration {
            self.handle_class_like(node, SymbolContext::Class);
        } else if id == k.interface_declaration {
            self.handle_class_like(node, SymbolContext::Interface);
        } else if id == k.trait_declaration {
            self.handle_class_like(node, SymbolContext::Trait);
        } else if id == k.enum_declaration {
            self.handle_class_like(node, SymbolContext::Enum);
        } else if id == k.enum_case {
            self.handle_enum_case(node);
        } else if id == k.method_declaration || id == k.function_definition {
            self.handle_function(node);
        } else if id == k.property_declaration {
            self.handle_property_declaration(node);
        } else if id == k.const_declaration {
            self.handle_const_declaration(node);
        } else if id == k.function_call_expression {
            self.handle_plain_call(node);
        } else if id == k.member_call_expression || id == k.nullsafe_member_call_expression {
            self.handle_member_call(node);
        } else if id == k.scoped_call_expression {
            self.handle_scoped_call(node);
        } else if id == k.member_access_expression || id == k.nullsafe_member_access_expression {
            self.handle_member_access(node);
        } else if id == k.scoped_property_access_expression {
            self.handle_scoped_property(node);
        } else if id == k.class_constant_access_expression {
            self.handle_class_constant(node);
        } else if id == k.object_creation_expression {
            self.handle_new(node);
        } else if id == k.assignment_expression || id == k.augmented_assignment_expression {
            self.handle_assignment(node);
        } else if id == k.anonymous_function
            || id == k.anonymous_function_creation_expression
        {
            self.handle_closure(node, "lambda");
        } else if id == k.arrow_function {
            self.handle_closure(node, "arrow");
        } else if id == k.namespace_use_declaration {
            self.handle_use(node);
        } else if id == k.comment {
            let text = strip_comment_markers(self.text(node));
            self.words(&text, node_line(node), SymbolContext::Comment, "");
        } else if id == k.string {
            self.handle_plain_string(node);
        } else if id == k.encapsed_string {
            self.handle_encapsed(node, "");
        } else if id == k.heredoc {
            self.handle_heredoc(node, k.heredoc_body, "heredoc");
        } else if id == k.nowdoc {
            self.handle_heredoc(node, k.nowdoc_body, "nowdoc");
        } else if id == k.goto_statement {
            self.handle_goto(node);
        } else if id == k.named_label_statement {
            self.handle_label(node);
        } else if id == k.foreach_statement {
            self.handle_foreach(node);
        } else if id == k.catch_clause {
            self.handle_catch(node);
        } else if id == k.global_declaration {
            self.handle_global(node);
        } else {
            self.walk_children(node);
        }
    }

    /// `namespace A\B;` applies to following siblings; `namespace X {}`
    /// is restored after its body.
    fn handle_namespace(&mut self, node: Node) {
        let name = name_of(node, self.src).unwrap_or_default().to_string();
        if !name.is_empty() {
            // Structural declaration; bypasses the filter.
            self.structural(
                SymbolRecord::new(node_line(node), name.clone(), SymbolContext::Namespace)
                    .with_definition(node_location(node)),
            );
        }

        let previous = std::mem::replace(&mut self.namespace, name);
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
            self.namespace = previous;
        }
    }

    /// Gather abstract/final/static/readonly child modifiers with the
    /// abstract > final > static priority, plus the visibility.
    fn modifiers_of(&self, node: Node) -> (String, String) {
        let k = self.kinds;
        let mut scope = String::new();
        let mut is_abstract = false;
        let mut is_final = false;
        let mut is_static = false;
        let mut is_readonly = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let id = child.kind_id();
            if id == k.visibility_modifier {
                scope = self.text(child).to_string();
            } else if id == k.abstract_modifier {
                is_abstract = true;
            } else if id == k.final_modifier {
                is_final = true;
            } else if id == k.static_modifier {
                is_static = true;
            } else if id == k.readonly_modifier {
                is_readonly = true;
            }
        }

        let modifier = if is_abstract {
            "abstract"
        } else if is_final {
            "final"
        } else if is_static {
            "static"
        } else if is_readonly {
            "readonly"
        } else {
            ""
        };

        (scope, modifier.to_string())
    }

    fn handle_class_like(&mut self, node: Node, context: SymbolContext) {
        let Some(class_name) = name_of(node, self.src).map(str::to_string) else {
            self.walk_children(node);
            return;
        };

        let (_, modifier) = self.modifiers_of(node);
        // Declaration name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), class_name.clone(), context)
                .with_modifier(modifier)
                .with_definition(node_location(node)),
        );

        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let id = child.kind_id();
            if id == k.base_clause {
                self.emit_heritage(child, &class_name, "");
            } else if id == k.class_interface_clause {
                self.emit_heritage(child, &class_name, "implements");
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn emit_heritage(&mut self, clause: Node, class_name: &str, clue: &str) {
        let k = self.kinds;
        let mut cursor = clause.walk();
        for child in clause.named_children(&mut cursor) {
            if child.kind_id() == k.name || child.kind_id() == k.qualified_name {
                let name = self.text(child).to_string();
                self.filtered(
                    SymbolRecord::new(node_line(child), name, SymbolContext::Type)
                        .with_parent(class_name)
                        .with_clue(clue),
                );
            }
        }
    }

    fn handle_enum_case(&mut self, node: Node) {
        if let Some(name) = name_of(node, self.src) {
            let parent = self.enclosing_class(node);
            // Case name; bypasses the filter.
            self.structural(
                SymbolRecord::new(node_line(node), name, SymbolContext::Case)
                    .with_parent(parent)
                    .with_definition(node_location(node)),
            );
        }
        if let Some(value) = node.child_by_field_name("value") {
            self.walk(value);
        }
    }

    fn handle_function(&mut self, node: Node) {
        let Some(name) = name_of(node, self.src).map(str::to_string) else {
            self.walk_children(node);
            return;
        };

        let (scope, modifier) = self.modifiers_of(node);
        let return_type = self.return_type_text(node);
        let parent = self.enclosing_class(node);

        // Declaration name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name.clone(), SymbolContext::Function)
                .with_parent(parent)
                .with_scope(scope)
                .with_modifier(modifier)
                .with_type(return_type)
                .with_definition(node_location(node)),
        );

        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.handle_parameters(parameters, &name);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    /// Return-type text without the leading `:`. The grammar spreads
    /// the `return_type` field across the separator and the type
    /// itself, so gather every carrier of the field.
    fn return_type_text(&self, node: Node) -> String {
        let mut cursor = node.walk();
        let mut text = String::new();
        for part in node.children_by_field_name("return_type", &mut cursor) {
            text.push_str(self.text(part));
        }
        text.trim_start_matches(':').trim().to_string()
    }

    fn handle_parameters(&mut self, parameters: Node, owner: &str) {
        let k = self.kinds;
        let mut cursor = parameters.walk();
        for param in parameters.named_children(&mut cursor) {
            let id = param.kind_id();
            if id != k.simple_parameter
                && id != k.variadic_parameter
                && id != k.property_promotion_parameter
            {
                self.walk(param);
                continue;
            }

            let Some(name_node) = param.child_by_field_name("name") else {
                continue;
            };
            let name = self.variable_text(name_node);
            let annotation = param
                .child_by_field_name("type")
                .map(|t| self.text(t).to_string())
                .unwrap_or_default();
            let (visibility, _) = self.modifiers_of(param);
            let promoted = id == k.property_promotion_parameter || !visibility.is_empty();
            let clue = if id == k.variadic_parameter {
                "..."
            } else {
                owner
            };

            // Parameter definition; bypasses the filter.
            self.structural(
                SymbolRecord::new(node_line(name_node), name.clone(), SymbolContext::Argument)
                    .with_parent(owner)
                    .with_clue(clue)
                    .with_type(annotation.clone())
                    .with_definition(node_location(name_node)),
            );

            // Promoted constructor parameters are also properties of
            // the class.
            if promoted {
                let class_name = self.enclosing_class(param);
                self.structural(
                    SymbolRecord::new(node_line(name_node), name, SymbolContext::Property)
                        .with_parent(class_name)
                        .with_scope(visibility)
                        .with_type(annotation)
                        .with_definition(node_location(name_node)),
                );
            }

            if let Some(default) = param.child_by_field_name("default_value") {
                self.walk(default);
            }
        }
    }

    fn handle_property_declaration(&mut self, node: Node) {
        let k = self.kinds;
        let (scope, modifier) = self.modifiers_of(node);
        let annotation = node
            .child_by_field_name("type")
            .map(|t| self.text(t).to_string())
            .unwrap_or_default();
        let parent = self.enclosing_class(node);

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind_id() != k.property_element {
                continue;
            }
            let name_node = child
                .child_by_field_name("name")
                .or_else(|| child.named_child(0));
            if let Some(name_node) = name_node {
                let name = self.variable_text(name_node);
                // Property name; bypasses the filter.
                self.structural(
                    SymbolRecord::new(node_line(name_node), name, SymbolContext::Property)
                        .with_parent(parent.clone())
                        .with_scope(scope.clone())
                        .with_modifier(modifier.clone())
                        .with_type(annotation.clone())
                        .with_definition(node_location(name_node)),
                );
            }
            // Default values can hold calls and strings.
            let mut inner = child.walk();
            for value in child.named_children(&mut inner) {
                if value.kind_id() != k.variable_name && value.kind_id() != k.name {
                    self.walk(value);
                }
            }
        }
    }

    fn handle_const_declaration(&mut self, node: Node) {
        let k = self.kinds;
        let parent = self.enclosing_class(node);
        let (scope, _) = self.modifiers_of(node);

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind_id() != k.const_element {
                continue;
            }
            if let Some(name_node) = child.named_child(0) {
                let name = self.text(name_node).to_string();
                // Constant name; bypasses the filter.
                self.structural(
                    SymbolRecord::new(node_line(name_node), name, SymbolContext::Variable)
                        .with_parent(parent.clone())
                        .with_scope(scope.clone())
                        .with_modifier("const")
                        .with_definition(node_location(name_node)),
                );
            }
            if let Some(value) = child.named_child(1) {
                self.walk(value);
            }
        }
    }

    fn handle_plain_call(&mut self, node: Node) {
        let mut call_name = String::new();
        if let Some(function) = node.child_by_field_name("function") {
            let id = function.kind_id();
            if id == self.kinds.name || id == self.kinds.qualified_name {
                call_name = self.text(function).to_string();
                self.filtered(SymbolRecord::new(
                    node_line(function),
                    call_name.clone(),
                    SymbolContext::Call,
                ));
            } else if id == self.kinds.variable_name {
                call_name = self.variable_text(function);
                self.filtered(SymbolRecord::new(
                    node_line(function),
                    call_name.clone(),
                    SymbolContext::Call,
                ));
            } else {
                self.walk(function);
            }
        }
        self.handle_arguments(node, &call_name);
    }

    fn handle_member_call(&mut self, node: Node) {
        let object = node
            .child_by_field_name("object")
            .map(|o| self.text(o).to_string())
            .unwrap_or_default();
        let mut call_name = String::new();
        if let Some(name_node) = node.child_by_field_name("name") {
            call_name = self.text(name_node).to_string();
            self.filtered(
                SymbolRecord::new(node_line(name_node), call_name.clone(), SymbolContext::Call)
                    .with_parent(object),
            );
        }
        if let Some(object_node) = node.child_by_field_name("object") {
            self.walk(object_node);
        }
        self.handle_arguments(node, &call_name);
    }

    /// `Cls::method()`: parent is the scope expression, modifier is
    /// `static`.
    fn handle_scoped_call(&mut self, node: Node) {
        let scope = node
            .child_by_field_name("scope")
            .map(|s| self.text(s).to_string())
            .unwrap_or_default();
        let mut call_name = String::new();
        if let Some(name_node) = node.child_by_field_name("name") {
            call_name = self.text(name_node).to_string();
            self.filtered(
                SymbolRecord::new(node_line(name_node), call_name.clone(), SymbolContext::Call)
                    .with_parent(scope)
                    .with_modifier("static"),
            );
        }
        if let Some(scope_node) = node.child_by_field_name("scope") {
            if scope_node.kind_id() != self.kinds.name
                && scope_node.kind_id() != self.kinds.qualified_name
            {
                self.walk(scope_node);
            }
        }
        self.handle_arguments(node, &call_name);
    }

    fn handle_arguments(&mut self, call: Node, call_name: &str) {
        let mut cursor = call.walk();
        let arguments = call.child_by_field_name("arguments").or_else(|| {
            call.named_children(&mut cursor)
                .find(|child| child.kind() == "arguments")
        });
        let Some(arguments) = arguments else {
            return;
        };
        self.handle_argument_list(arguments, call_name);
    }

    fn handle_argument_list(&mut self, arguments: Node, call_name: &str) {
        let k = self.kinds;
        let mut cursor = arguments.walk();
        for argument in arguments.named_children(&mut cursor) {
            let value = if argument.kind_id() == k.argument {
                match argument.named_child(argument.named_child_count().saturating_sub(1)) {
                    Some(value) => value,
                    None => continue,
                }
            } else {
                argument
            };

            let id = value.kind_id();
            if id == k.variable_name {
                // Call-site arguments are deliberately not filtered.
                let name = self.variable_text(value);
                self.structural(
                    SymbolRecord::new(node_line(value), name, SymbolContext::Argument)
                        .with_clue(call_name),
                );
            } else if id == k.name {
                let name = self.text(value).to_string();
                self.structural(
                    SymbolRecord::new(node_line(value), name, SymbolContext::Argument)
                        .with_clue(call_name),
                );
            } else {
                self.walk(value);
            }
        }
    }

    fn handle_member_access(&mut self, node: Node) {
        let object = node
            .child_by_field_name("object")
            .map(|o| self.text(o).to_string())
            .unwrap_or_default();
        if let Some(name_node) = node.child_by_field_name("name") {
            let name = if name_node.kind_id() == self.kinds.variable_name {
                self.variable_text(name_node)
            } else {
                self.text(name_node).to_string()
            };
            self.filtered(
                SymbolRecord::new(node_line(name_node), name, SymbolContext::Property)
                    .with_parent(object),
            );
        }
        if let Some(object_node) = node.child_by_field_name("object") {
            self.walk(object_node);
        }
    }

    fn handle_scoped_property(&mut self, node: Node) {
        let scope = node
            .child_by_field_name("scope")
            .map(|s| self.text(s).to_string())
            .unwrap_or_default();
        if let Some(name_node) = node.child_by_field_name("name") {
            let name = self.variable_text(name_node);
            self.filtered(
                SymbolRecord::new(node_line(name_node), name, SymbolContext::Property)
                    .with_parent(scope)
                    .with_modifier("static"),
            );
        }
    }

    /// `Cls::CONST` is a constant usage scoped to its class.
    fn handle_class_constant(&mut self, node: Node) {
        let count = node.named_child_count();
        if count < 2 {
            self.walk_children(node);
            return;
        }
        let scope = node
            .named_child(0)
            .map(|s| self.text(s).to_string())
            .unwrap_or_default();
        if let Some(name_node) = node.named_child(count - 1) {
            let name = self.text(name_node).to_string();
            self.filtered(
                SymbolRecord::new(node_line(name_node), name, SymbolContext::Variable)
                    .with_parent(scope)
                    .with_modifier("const"),
            );
        }
    }

    fn handle_new(&mut self, node: Node) {
        let k = self.kinds;
        let mut call_name = String::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let id = child.kind_id();
            if (id == k.name || id == k.qualified_name) && call_name.is_empty() {
                call_name = self.text(child).to_string();
                self.filtered(SymbolRecord::new(
                    node_line(child),
                    call_name.clone(),
                    SymbolContext::Call,
                ));
            }
        }
        self.handle_arguments(node, &call_name);
    }

    fn handle_assignment(&mut self, node: Node) {
        let k = self.kinds;
        if let Some(left) = node.child_by_field_name("left") {
            let id = left.kind_id();
            if id == k.variable_name {
                let name = self.variable_text(left);
                let parent = self.enclosing_class(left);
                self.filtered(
                    SymbolRecord::new(node_line(left), name, SymbolContext::Variable)
                        .with_parent(parent),
                );
            } else if id == k.list_literal {
                let mut cursor = left.walk();
                for element in left.named_children(&mut cursor) {
                    if element.kind_id() == k.variable_name {
                        let name = self.variable_text(element);
                        self.filtered(SymbolRecord::new(
                            node_line(element),
                            name,
                            SymbolContext::Variable,
                        ));
                    }
                }
            } else {
                // Member and scoped targets already emit property
                // records through their own handlers.
                self.walk(left);
            }
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(right);
        }
    }

    fn handle_closure(&mut self, node: Node, marker: &str) {
        self.structural(
            SymbolRecord::new(node_line(node), "<lambda>", SymbolContext::Lambda)
                .with_clue(marker)
                .with_definition(node_location(node)),
        );

        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.handle_parameters(parameters, "lambda");
        }

        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind_id() == k.anonymous_function_use_clause {
                let mut inner = child.walk();
                for captured in child.named_children(&mut inner) {
                    if captured.kind_id() == k.variable_name {
                        let name = self.variable_text(captured);
                        self.filtered(
                            SymbolRecord::new(node_line(captured), name, SymbolContext::Variable)
                                .with_parent("lambda"),
                        );
                    }
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    /// `use A\B\C;` indexes `C`; `use A\B as D;` indexes `D` with the
    /// original name as the clue.
    fn handle_use(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for clause in node.named_children(&mut cursor) {
            if clause.kind_id() != k.namespace_use_clause {
                continue;
            }

            let mut original = String::new();
            let mut alias = String::new();
            let mut inner = clause.walk();
            for child in clause.named_children(&mut inner) {
                let id = child.kind_id();
                if id == k.qualified_name || id == k.name {
                    original = self.text(child).to_string();
                } else if id == k.namespace_aliasing_clause {
                    if let Some(alias_node) = child.named_child(0) {
                        alias = self.text(alias_node).to_string();
                    }
                }
            }

            if original.is_empty() {
                continue;
            }

            let (symbol, clue) = if alias.is_empty() {
                let last = original.rsplit('\\').next().unwrap_or(&original).to_string();
                let clue = if last == original {
                    String::new()
                } else {
                    original.clone()
                };
                (last, clue)
            } else {
                (alias, original.clone())
            };

            // Imported names are declarations; they bypass the filter.
            self.structural(
                SymbolRecord::new(node_line(clause), symbol, SymbolContext::Import)
                    .with_clue(clue),
            );
        }
    }

    fn handle_plain_string(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind_id() == k.string_content {
                let text = self.text(child).to_string();
                self.words(&text, node_line(child), SymbolContext::String, "");
            }
        }
    }

    /// Double-quoted strings: static parts split into words,
    /// interpolated variables recurse as expressions.
    fn handle_encapsed(&mut self, node: Node, clue: &str) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let id = child.kind_id();
            if id == k.string_content {
                let text = self.text(child).to_string();
                self.words(&text, node_line(child), SymbolContext::String, clue);
            } else if id == k.variable_name {
                let name = self.variable_text(child);
                self.filtered(SymbolRecord::new(
                    node_line(child),
                    name,
                    SymbolContext::Variable,
                ));
            } else if child.is_named() {
                self.walk(child);
            }
        }
    }

    fn handle_heredoc(&mut self, node: Node, body_kind: u16, clue: &str) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind_id() == body_kind {
                self.handle_encapsed(child, clue);
            }
        }
    }

    fn handle_goto(&mut self, node: Node) {
        if let Some(target) = node.named_child(0) {
            let name = self.text(target).to_string();
            self.filtered(SymbolRecord::new(
                node_line(target),
                name,
                SymbolContext::Goto,
            ));
        }
    }

    fn handle_label(&mut self, node: Node) {
        if let Some(label) = node.named_child(0) {
            let name = self.text(label).to_string();
            self.filtered(SymbolRecord::new(
                node_line(label),
                name,
                SymbolContext::Label,
            ));
        }
    }

    fn handle_foreach(&mut self, node: Node) {
        let k = self.kinds;
        let mut after_as = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if !child.is_named() {
                if child.kind() == "as" {
                    after_as = true;
                }
                continue;
            }
            if after_as && child.kind_id() == k.variable_name {
                let name = self.variable_text(child);
                self.filtered(SymbolRecord::new(
                    node_line(child),
                    name,
                    SymbolContext::Variable,
                ));
                after_as = false;
            } else if after_as && child.kind() == "pair" {
                let mut inner = child.walk();
                for part in child.named_children(&mut inner) {
                    if part.kind_id() == k.variable_name {
                        let name = self.variable_text(part);
                        self.filtered(SymbolRecord::new(
                            node_line(part),
                            name,
                            SymbolContext::Variable,
                        ));
                    }
                }
                after_as = false;
            } else {
                self.walk(child);
            }
        }
    }

    /// `catch (NotFound | Timeout $e)`: each type is an exception
    /// record, the binding a variable.
    fn handle_catch(&mut self, node: Node) {
        if let Some(types) = node.child_by_field_name("type") {
            let k = self.kinds;
            if types.kind_id() == k.name || types.kind_id() == k.qualified_name {
                let name = self.text(types).to_string();
                self.filtered(SymbolRecord::new(
                    node_line(types),
                    name,
                    SymbolContext::Exception,
                ));
            } else {
                let mut cursor = types.walk();
                for child in types.named_children(&mut cursor) {
                    if child.kind_id() == k.name || child.kind_id() == k.qualified_name {
                        let name = self.text(child).to_string();
                        self.filtered(SymbolRecord::new(
                            node_line(child),
                            name,
                            SymbolContext::Exception,
                        ));
                    }
                }
            }
        }
        if let Some(binding) = node.child_by_field_name("name") {
            let name = self.variable_text(binding);
            self.filtered(SymbolRecord::new(
                node_line(binding),
                name,
                SymbolContext::Variable,
            ));
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_global(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind_id() == k.variable_name {
                let name = self.variable_text(child);
                self.filtered(SymbolRecord::new(
                    node_line(child),
                    name,
                    SymbolContext::Variable,
                ));
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
        let parsed = parse_source(&PHP, source.to_string(), "", "sample.php").expect("parsed");
        let filter = SymbolFilter::new(&[PHP.keyword_list()]).expect("filter");
        let mut emitter = Emitter::new(&filter);
        PHP.extract(&parsed, &mut emitter).expect("extract");
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
    fn class_with_namespace_methods_and_properties() {
        let source = "\
<?php
namespace App\\Auth;

class SessionManager implements Restartable {
    private string $token;

    public function refresh(string $token): bool {
        $this->token = $token;
        return true;
    }
}
";
        let records = extract(source);

        let namespace = find(&records, "app\\auth", SymbolContext::Namespace);
        assert!(namespace.is_definition);

        let class = find(&records, "sessionmanager", SymbolContext::Class);
        assert!(class.is_definition);
        assert_eq!(class.namespace, "App\\Auth");

        let implemented = find(&records, "restartable", SymbolContext::Type);
        assert_eq!(implemented.clue, "implements");
        assert_eq!(implemented.parent, "SessionManager");

        let method = find(&records, "refresh", SymbolContext::Function);
        assert_eq!(method.parent, "SessionManager");
        assert_eq!(method.scope, "public");
        assert_eq!(method.type_annotation, "bool");

        let parameter = find(&records, "token", SymbolContext::Argument);
        assert_eq!(parameter.parent, "refresh");
        assert!(parameter.is_definition);

        // $this->token assignment target.
        let assigned = records
            .iter()
            .find(|r| r.context == SymbolContext::Property && r.parent == "$this")
            .expect("property write through $this");
        assert_eq!(assigned.symbol, "token");
    }

    #[test]
    fn declared_properties_carry_scope_and_type() {
        let source = "\
<?php
class Widget {
    private static int $counter;
}
";
        let records = extract(source);
        let property = find(&records, "counter", SymbolContext::Property);
        assert_eq!(property.parent, "Widget");
        assert_eq!(property.scope, "private");
        assert_eq!(property.modifier, "static");
        assert!(property.is_definition);
    }

    #[test]
    fn promoted_constructor_parameters_emit_property_records() {
        let source = "\
<?php
class Account {
    public function __construct(private string $owner) {}
}
";
        let records = extract(source);

        let argument = find(&records, "owner", SymbolContext::Argument);
        assert_eq!(argument.parent, "__construct");

        let property = find(&records, "owner", SymbolContext::Property);
        assert_eq!(property.parent, "Account");
        assert_eq!(property.scope, "private");
    }

    #[test]
    fn scoped_calls_are_static_with_scope_parent() {
        let records = extract("<?php\nLogger::record($event);\n");

        let call = find(&records, "record", SymbolContext::Call);
        assert_eq!(call.parent, "Logger");
        assert_eq!(call.modifier, "static");

        let argument = find(&records, "event", SymbolContext::Argument);
        assert_eq!(argument.clue, "record");
    }

    #[test]
    fn member_calls_record_their_receiver() {
        let records = extract("<?php\n$mailer->deliver($message);\n");

        let call = find(&records, "deliver", SymbolContext::Call);
        assert_eq!(call.parent, "$mailer");
        find(&records, "message", SymbolContext::Argument);
    }

    #[test]
    fn heredoc_and_nowdoc_words_carry_their_clue() {
        let source = "\
<?php
$greeting = <<<EOT
welcome aboard
EOT;
$raw = <<<'EOT'
plain nowdoc payload
EOT;
";
        let records = extract(source);

        let welcome = find(&records, "welcome", SymbolContext::String);
        assert_eq!(welcome.clue, "heredoc");

        let payload = find(&records, "payload", SymbolContext::String);
        assert_eq!(payload.clue, "nowdoc");
    }

    #[test]
    fn goto_and_labels_use_their_own_contexts() {
        let source = "\
<?php
retry_point:
$attempts = $attempts + 1;
goto retry_point;
";
        let records = extract(source);
        find(&records, "retry_point", SymbolContext::Label);
        find(&records, "retry_point", SymbolContext::Goto);
    }

    #[test]
    fn use_declarations_index_alias_over_original() {
        let source = "\
<?php
use App\\Services\\Mailer;
use App\\Queue\\Dispatcher as JobRunner;
";
        let records = extract(source);

        let mailer = find(&records, "mailer", SymbolContext::Import);
        assert_eq!(mailer.clue, "App\\Services\\Mailer");

        let alias = find(&records, "jobrunner", SymbolContext::Import);
        assert_eq!(alias.clue, "App\\Queue\\Dispatcher");
    }

    #[test]
    fn catch_clause_emits_exception_types_and_binding() {
        let source = "\
<?php
try {
    risky();
} catch (TimeoutException $failure) {
    retry();
}
";
        let records = extract(source);
        find(&records, "timeoutexception", SymbolContext::Exception);
        find(&records, "failure", SymbolContext::Variable);
        find(&records, "risky", SymbolContext::Call);
        find(&records, "retry", SymbolContext::Call);
    }

    #[test]
    fn enum_cases_attach_to_their_enum() {
        let source = "\
<?php
enum Status {
    case Active;
    case Suspended;
}
";
        let records = extract(source);

        let status = find(&records, "status", SymbolContext::Enum);
        assert!(status.is_definition);

        let active = find(&records, "active", SymbolContext::Case);
        assert_eq!(active.parent, "Status");
        find(&records, "suspended", SymbolContext::Case);
    }

    #[test]
    fn abstract_beats_final_and_static_in_modifier_priority() {
        let source = "\
<?php
abstract class Task {
    abstract public static function execute(): void;
}
";
        let records = extract(source);
        let method = find(&records, "execute", SymbolContext::Function);
        assert_eq!(method.modifier, "abstract");
    }

    #[test]
    fn interpolated_strings_recurse_into_variables() {
        let records = extract("<?php\n$note = \"balance $amount remaining\";\n");
        find(&records, "balance", SymbolContext::String);
        find(&records, "remaining", SymbolContext::String);
        find(&records, "amount", SymbolContext::Variable);
    }
}
