//! TypeScript symbol extraction (TSX included via the dialect
//! grammar).
//!
//! On top of the JavaScript surface this adds interfaces, type
//! aliases, enums, `implements` lists, accessibility modifiers,
//! decorators, parameter properties, and verbatim union/intersection
//! type annotations.

use std::sync::OnceLock;

use anyhow::Result;
use tree_sitter::Node;

use crate::extract::{node_line, node_location, node_text, strip_comment_markers};
use crate::language::{enclosing_named, name_of, Emitter, Language, ParsedSource};
use crate::models::{SymbolContext, SymbolRecord};

pub struct TypeScriptLanguage;

pub static TYPESCRIPT: TypeScriptLanguage = TypeScriptLanguage;

static KEYWORDS: &str = include_str!("../../data/typescript_keywords.txt");

impl Language for TypeScriptLanguage {
    fn id(&self) -> &'static str {
        "typescript"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "mts", "cts"]
    }

    fn keyword_list(&self) -> &'static str {
        KEYWORDS
    }

    fn ignore_globs(&self) -> &'static [&'static str] {
        &[
            "**/node_modules/**",
            "**/dist/**",
            "**/build/**",
            "**/.next/**",
            "**/coverage/**",
        ]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn grammar_for(&self, filename: &str) -> tree_sitter::Language {
        if filename.to_ascii_lowercase().ends_with(".tsx") {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        } else {
            self.grammar()
        }
    }

    fn extract(&self, file: &ParsedSource, out: &mut Emitter<'_>) -> Result<()> {
        let grammar = self.grammar_for(&file.filename);
        let is_tsx = file.filename.to_ascii_lowercase().ends_with(".tsx");
        let kinds = if is_tsx {
            tsx_kinds(&grammar)
        } else {
            ts_kinds(&grammar)
        };

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

/// Interned node-kind ids. The TS and TSX dialect grammars assign
/// different ids to the same kind names, so each keeps its own table.
pub(crate) struct Kinds {
    pub class_declaration: u16,
    pub abstract_class_declaration: u16,
    pub interface_declaration: u16,
    pub type_alias_declaration: u16,
    pub enum_declaration: u16,
    pub enum_assignment: u16,
    pub function_declaration: u16,
    pub generator_function_declaration: u16,
    pub function_expression: u16,
    pub method_definition: u16,
    pub method_signature: u16,
    pub abstract_method_signature: u16,
    pub public_field_definition: u16,
    pub field_definition: u16,
    pub property_signature: u16,
    pub arrow_function: u16,
    pub variable_declarator: u16,
    pub lexical_declaration: u16,
    pub call_expression: u16,
    pub member_expression: u16,
    pub new_expression: u16,
    pub assignment_expression: u16,
    pub augmented_assignment_expression: u16,
    pub identifier: u16,
    pub property_identifier: u16,
    pub private_property_identifier: u16,
    pub type_identifier: u16,
    pub shorthand_property_identifier_pattern: u16,
    pub import_statement: u16,
    pub import_clause: u16,
    pub named_imports: u16,
    pub import_specifier: u16,
    pub namespace_import: u16,
    pub export_statement: u16,
    pub export_clause: u16,
    pub export_specifier: u16,
    pub internal_module: u16,
    pub comment: u16,
    pub string: u16,
    pub string_fragment: u16,
    pub template_string: u16,
    pub template_substitution: u16,
    pub labeled_statement: u16,
    pub catch_clause: u16,
    pub throw_statement: u16,
    pub for_in_statement: u16,
    pub implements_clause: u16,
    pub extends_clause: u16,
    pub class_heritage: u16,
    pub required_parameter: u16,
    pub optional_parameter: u16,
    pub rest_pattern: u16,
    pub accessibility_modifier: u16,
    pub decorator: u16,
    pub pair_pattern: u16,
}

pub(crate) fn intern_kinds(grammar: &tree_sitter::Language) -> Kinds {
    let named = |kind: &str| grammar.id_for_node_kind(kind, true);
    Kinds {
        class_declaration: named("class_declaration"),
        abstract_class_declaration: named("abstract_class_declaration"),
        interface_declaration: named("interface_declaration"),
        type_alias_declaration: named("type_alias_declaration"),
        enum_declaration: named("enum_declaration"),
        enum_assignment: named("enum_assignment"),
        function_declaration: named("function_declaration"),
        generator_function_declaration: named("generator_function_declaration"),
        function_expression: named("function_expression"),
        method_definition: named("method_definition"),
        method_signature: named("method_signature"),
        abstract_method_signature: named("abstract_method_signature"),
        public_field_definition: named("public_field_definition"),
        field_definition: named("field_definition"),
        property_signature: named("property_signature"),
        arrow_function: named("arrow_function"),
        variable_declarator: named("variable_declarator"),
        lexical_declaration: named("lexical_declaration"),
        call_expression: named("call_expression"),
        member_expression: named("member_expression"),
        new_expression: named("new_expression"),
        assignment_expression: named("assignment_expression"),
        augmented_assignment_expression: named("augmented_assignment_expression"),
        identifier: named("identifier"),
        property_identifier: named("property_identifier"),
        private_property_identifier: named("private_property_identifier"),
        type_identifier: named("type_identifier"),
        shorthand_property_identifier_pattern: named("shorthand_property_identifier_pattern"),
        import_statement: named("import_statement"),
        import_clause: named("import_clause"),
        named_imports: named("named_imports"),
        import_specifier: named("import_specifier"),
        namespace_import: named("namespace_import"),
        export_statement: named("export_statement"),
        export_clause: named("export_clause"),
        export_specifier: named("export_specifier"),
        internal_module: named("internal_module"),
        comment: named("comment"),
        string: named("string"),
        string_fragment: named("string_fragment"),
        template_string: named("template_string"),
        template_substitution: named("template_substitution"),
        labeled_statement: named("labeled_statement"),
        catch_clause: named("catch_clause"),
        throw_statement: named("throw_statement"),
        for_in_statement: named("for_in_statement"),
        implements_clause: named("implements_clause"),
        extends_clause: named("extends_clause"),
        class_heritage: named("class_heritage"),
        required_parameter: named("required_parameter"),
        optional_parameter: named("optional_parameter"),
        rest_pattern: named("rest_pattern"),
        accessibility_modifier: named("accessibility_modifier"),
        decorator: named("decorator"),
        pair_pattern: named("pair_pattern"),
    }
}

fn ts_kinds(grammar: &tree_sitter::Language) -> &'static Kinds {
    static KINDS: OnceLock<Kinds> = OnceLock::new();
    KINDS.get_or_init(|| intern_kinds(grammar))
}

fn tsx_kinds(grammar: &tree_sitter::Language) -> &'static Kinds {
    static KINDS: OnceLock<Kinds> = OnceLock::new();
    KINDS.get_or_init(|| intern_kinds(grammar))
}

pub(crate) struct Walker<'s, 'e, 'f> {
    pub kinds: &'static Kinds,
    pub src: &'s [u8],
    pub out: &'e mut Emitter<'f>,
    /// Dot-joined chain of enclosing `namespace` declarations.
    pub namespace: String,
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

    fn words(&mut self, text: &str, line: u32, context: SymbolContext, clue: &str) {
        let namespace = self.namespace.clone();
        self.out.push_words(text, line, context, clue, &namespace);
    }

    fn class_kinds(&self) -> [u16; 4] {
        [
            self.kinds.class_declaration,
            self.kinds.abstract_class_declaration,
            self.kinds.interface_declaration,
            self.kinds.enum_declaration,
        ]
    }

    fn enclosing_class(&self, node: Node) -> String {
        enclosing_named(node, &self.class_kinds())
            .and_then(|ancestor| name_of(ancestor, self.src))
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Type annotation text without the leading `:`.
    fn annotation_text(&self, node: Node) -> String {
        node.child_by_field_name("type")
            .or_else(|| node.child_by_field_name("return_type"))
            .map(|t| self.text(t).trim_start_matches(':').trim().to_string())
            .unwrap_or_default()
    }

    /// Decorator names attached directly to a declaration node.
    fn decorator_clue(&self, node: Node) -> String {
        let mut names: Vec<String> = Vec::new();
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
                    names.push(name.to_string());
                }
            }
        }
        names.join(",")
    }

    /// Anonymous modifier tokens on class members, with the
    /// abstract-first priority.
    fn member_modifier(&self, node: Node) -> String {
        let mut is_abstract = false;
        let mut is_static = false;
        let mut is_readonly = false;
        let mut is_async = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "abstract" => is_abstract = true,
                "static" => is_static = true,
                "readonly" => is_readonly = true,
                "async" => is_async = true,
                _ => {}
            }
        }

        if is_abstract {
            "abstract"
        } else if is_static {
            "static"
        } else if is_readonly {
            "readonly"
        } else if is_async {
            "async"
        } else {
            ""
        }
        .to_string()
    }

    fn accessibility(&self, node: Node) -> String {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind_id() == self.kinds.accessibility_modifier {
                return self.text(child).to_string();
            }
            if child.kind_id() == self.kinds.private_property_identifier {
                return "private".to_string();
            }
        }
        String::new()
    }

    pub fn walk_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    pub fn walk(&mut self, node: Node) {
        let k = self.kinds;
        let id = node.kind_id();

        if id == k.class_declaration || id == k.abstract_class_declaration {
            self.handle_class(node);
        } else if id == k.interface_declaration {
            self.handle_interface(node);
        } else if id == k.type_alias_declaration {
            self.handle_type_alias(node);
        } else if id == k.enum_declaration {
            self.handle_enum(node);
        } else if id == k.function_declaration || id == k.generator_function_declaration {
            self.handle_function(node);
        } else if id == k.method_definition
            || id == k.method_signature
            || id == k.abstract_method_signature
        {
            self.handle_method(node);
        } else if id == k.public_field_definition || id == k.field_definition {
            self.handle_field(node);
        } else if id == k.property_signature {
            self.handle_property_signature(node);
        } else if id == k.function_expression {
            self.handle_function_expression(node);
        } else if id == k.arrow_function {
            self.handle_arrow(node);
        } else if id == k.variable_declarator {
            self.handle_variable_declarator(node);
        } else if id == k.assignment_expression || id == k.augmented_assignment_expression {
            self.handle_assignment(node);
        } else if id == k.call_expression {
            self.handle_call(node);
        } else if id == k.new_expression {
            self.handle_new(node, SymbolContext::Call);
        } else if id == k.member_expression {
            self.handle_member(node);
        } else if id == k.import_statement {
            self.handle_import(node);
        } else if id == k.export_statement {
            self.handle_export(node);
        } else if id == k.internal_module {
            self.handle_namespace(node);
        } else if id == k.comment {
            let text = strip_comment_markers(self.text(node));
            self.words(&text, node_line(node), SymbolContext::Comment, "");
        } else if id == k.string {
            self.handle_string(node);
        } else if id == k.template_string {
            self.handle_template(node);
        } else if id == k.labeled_statement {
            self.handle_label(node);
        } else if id == k.catch_clause {
            self.handle_catch(node);
        } else if id == k.throw_statement {
            self.handle_throw(node);
        } else if id == k.for_in_statement {
            self.handle_for_in(node);
        } else {
            self.walk_children(node);
        }
    }

    fn handle_class(&mut self, node: Node) {
        let Some(name) = name_of(node, self.src).map(str::to_string) else {
            self.walk_children(node);
            return;
        };

        let modifier = if node.kind_id() == self.kinds.abstract_class_declaration {
            "abstract"
        } else {
            ""
        };

        // Declaration name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name.clone(), SymbolContext::Class)
                .with_modifier(modifier)
                .with_clue(self.decorator_clue(node))
                .with_definition(node_location(node)),
        );

        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind_id() != k.class_heritage {
                continue;
            }
            let mut inner = child.walk();
            for clause in child.children(&mut inner) {
                if clause.kind_id() == k.extends_clause {
                    self.emit_heritage(clause, &name, "");
                } else if clause.kind_id() == k.implements_clause {
                    self.emit_heritage(clause, &name, "implements");
                }
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
            let id = child.kind_id();
            if id == k.identifier || id == k.type_identifier || id == k.member_expression {
                let name = self.text(child).to_string();
                self.filtered(
                    SymbolRecord::new(node_line(child), name, SymbolContext::Type)
                        .with_parent(class_name)
                        .with_clue(clue),
                );
            } else {
                self.walk(child);
            }
        }
    }

    fn handle_interface(&mut self, node: Node) {
        let Some(name) = name_of(node, self.src).map(str::to_string) else {
            self.walk_children(node);
            return;
        };

        // Declaration name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name, SymbolContext::Interface)
                .with_definition(node_location(node)),
        );

        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_type_alias(&mut self, node: Node) {
        if let Some(name) = name_of(node, self.src) {
            // Declaration name; bypasses the filter.
            self.structural(
                SymbolRecord::new(node_line(node), name, SymbolContext::Type)
                    .with_definition(node_location(node)),
            );
        }
    }

    fn handle_enum(&mut self, node: Node) {
        let Some(name) = name_of(node, self.src).map(str::to_string) else {
            self.walk_children(node);
            return;
        };

        // Declaration name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name.clone(), SymbolContext::Enum)
                .with_definition(node_location(node)),
        );

        let k = self.kinds;
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                let id = member.kind_id();
                if id == k.property_identifier {
                    let case = self.text(member).to_string();
                    self.structural(
                        SymbolRecord::new(node_line(member), case, SymbolContext::Case)
                            .with_parent(name.clone())
                            .with_definition(node_location(member)),
                    );
                } else if id == k.enum_assignment {
                    if let Some(case_name) = name_of(member, self.src) {
                        self.structural(
                            SymbolRecord::new(node_line(member), case_name, SymbolContext::Case)
                                .with_parent(name.clone())
                                .with_definition(node_location(member)),
                        );
                    }
                    if let Some(value) = member.child_by_field_name("value") {
                        self.walk(value);
                    }
                }
            }
        }
    }

    fn handle_function(&mut self, node: Node) {
        let Some(name) = name_of(node, self.src).map(str::to_string) else {
            self.walk_children(node);
            return;
        };

        // Declaration name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name.clone(), SymbolContext::Function)
                .with_modifier(self.member_modifier(node))
                .with_type(self.annotation_text(node))
                .with_definition(node_location(node)),
        );

        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.handle_parameters(parameters, &name);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_method(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else {
            self.walk_children(node);
            return;
        };
        let name = self.text(name_node).trim_start_matches('#').to_string();
        let parent = self.enclosing_class(node);

        // Declaration name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name.clone(), SymbolContext::Function)
                .with_parent(parent)
                .with_scope(self.accessibility(node))
                .with_modifier(self.member_modifier(node))
                .with_type(self.annotation_text(node))
                .with_clue(self.decorator_clue(node))
                .with_definition(node_location(node)),
        );

        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.handle_parameters(parameters, &name);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_field(&mut self, node: Node) {
        let name_node = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("property"));
        let Some(name_node) = name_node else {
            self.walk_children(node);
            return;
        };

        let name = self.text(name_node).trim_start_matches('#').to_string();
        let parent = self.enclosing_class(node);

        // Declaration name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name, SymbolContext::Property)
                .with_parent(parent)
                .with_scope(self.accessibility(node))
                .with_modifier(self.member_modifier(node))
                .with_type(self.annotation_text(node))
                .with_definition(node_location(node)),
        );

        if let Some(value) = node.child_by_field_name("value") {
            self.walk(value);
        }
    }

    fn handle_property_signature(&mut self, node: Node) {
        if let Some(name_node) = node.child_by_field_name("name") {
            let name = self.text(name_node).to_string();
            let parent = self.enclosing_class(node);
            // Declaration name; bypasses the filter.
            self.structural(
                SymbolRecord::new(node_line(node), name, SymbolContext::Property)
                    .with_parent(parent)
                    .with_modifier(self.member_modifier(node))
                    .with_type(self.annotation_text(node))
                    .with_definition(node_location(node)),
            );
        }
    }

    fn handle_function_expression(&mut self, node: Node) {
        if let Some(name) = name_of(node, self.src).map(str::to_string) {
            self.structural(
                SymbolRecord::new(node_line(node), name.clone(), SymbolContext::Function)
                    .with_modifier(self.member_modifier(node))
                    .with_definition(node_location(node)),
            );
            if let Some(parameters) = node.child_by_field_name("parameters") {
                self.handle_parameters(parameters, &name);
            }
        } else {
            self.structural(
                SymbolRecord::new(node_line(node), "<lambda>", SymbolContext::Lambda)
                    .with_clue("lambda")
                    .with_definition(node_location(node)),
            );
            if let Some(parameters) = node.child_by_field_name("parameters") {
                self.handle_parameters(parameters, "lambda");
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_arrow(&mut self, node: Node) {
        self.structural(
            SymbolRecord::new(node_line(node), "<lambda>", SymbolContext::Lambda)
                .with_clue("arrow")
                .with_definition(node_location(node)),
        );

        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.handle_parameters(parameters, "lambda");
        } else if let Some(parameter) = node.child_by_field_name("parameter") {
            // Single bare-identifier parameter form: `x => ...`
            if parameter.kind_id() == self.kinds.identifier {
                let name = self.text(parameter).to_string();
                self.structural(
                    SymbolRecord::new(node_line(parameter), name, SymbolContext::Argument)
                        .with_parent("lambda")
                        .with_clue("lambda")
                        .with_definition(node_location(parameter)),
                );
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_parameters(&mut self, parameters: Node, owner: &str) {
        let k = self.kinds;
        let mut cursor = parameters.walk();
        for param in parameters.named_children(&mut cursor) {
            let id = param.kind_id();
            if id != k.required_parameter && id != k.optional_parameter {
                if id == k.identifier {
                    let name = self.text(param).to_string();
                    // Parameter definition; bypasses the filter.
                    self.structural(
                        SymbolRecord::new(node_line(param), name, SymbolContext::Argument)
                            .with_parent(owner)
                            .with_clue(owner)
                            .with_definition(node_location(param)),
                    );
                } else {
                    self.walk(param);
                }
                continue;
            }

            let annotation = self.annotation_text(param);
            let accessibility = self.accessibility(param);
            let Some(pattern) = param.child_by_field_name("pattern") else {
                continue;
            };

            if pattern.kind_id() == k.identifier {
                let name = self.text(pattern).to_string();
                // Parameter definition; bypasses the filter.
                self.structural(
                    SymbolRecord::new(node_line(pattern), name.clone(), SymbolContext::Argument)
                        .with_parent(owner)
                        .with_clue(owner)
                        .with_type(annotation.clone())
                        .with_definition(node_location(pattern)),
                );

                // Parameter properties (constructor(private x)) are
                // also properties of the class.
                if !accessibility.is_empty() {
                    let class_name = self.enclosing_class(param);
                    self.structural(
                        SymbolRecord::new(node_line(pattern), name, SymbolContext::Property)
                            .with_parent(class_name)
                            .with_scope(accessibility)
                            .with_type(annotation)
                            .with_definition(node_location(pattern)),
                    );
                }
            } else if pattern.kind_id() == k.rest_pattern {
                if let Some(inner) = pattern.named_child(0) {
                    if inner.kind_id() == k.identifier {
                        let name = self.text(inner).to_string();
                        self.structural(
                            SymbolRecord::new(node_line(inner), name, SymbolContext::Argument)
                                .with_parent(owner)
                                .with_clue("...")
                                .with_type(annotation)
                                .with_definition(node_location(inner)),
                        );
                    }
                }
            } else {
                self.emit_pattern_bindings(pattern, owner);
            }

            if let Some(value) = param.child_by_field_name("value") {
                self.walk(value);
            }
        }
    }

    /// Destructured parameter/variable patterns: every bound name is
    /// its own record.
    fn emit_pattern_bindings(&mut self, pattern: Node, owner: &str) {
        let k = self.kinds;
        let id = pattern.kind_id();
        if id == k.identifier || id == k.shorthand_property_identifier_pattern {
            let name = self.text(pattern).to_string();
            self.filtered(
                SymbolRecord::new(node_line(pattern), name, SymbolContext::Variable)
                    .with_parent(owner),
            );
            return;
        }
        if id == k.pair_pattern {
            if let Some(value) = pattern.child_by_field_name("value") {
                self.emit_pattern_bindings(value, owner);
            }
            return;
        }
        let mut cursor = pattern.walk();
        for child in pattern.named_children(&mut cursor) {
            self.emit_pattern_bindings(child, owner);
        }
    }

    fn handle_variable_declarator(&mut self, node: Node) {
        let k = self.kinds;
        let modifier = node
            .parent()
            .filter(|parent| parent.kind_id() == k.lexical_declaration)
            .and_then(|parent| parent.child(0))
            .map(|token| self.text(token).to_string())
            .filter(|token| token == "const")
            .unwrap_or_default();

        if let Some(name_node) = node.child_by_field_name("name") {
            if name_node.kind_id() == k.identifier {
                let name = self.text(name_node).to_string();
                self.filtered(
                    SymbolRecord::new(node_line(name_node), name, SymbolContext::Variable)
                        .with_modifier(modifier)
                        .with_type(self.annotation_text(node)),
                );
            } else {
                self.emit_pattern_bindings(name_node, "");
            }
        }

        if let Some(value) = node.child_by_field_name("value") {
            self.walk(value);
        }
    }

    fn handle_assignment(&mut self, node: Node) {
        let k = self.kinds;
        if let Some(left) = node.child_by_field_name("left") {
            if left.kind_id() == k.identifier {
                let name = self.text(left).to_string();
                self.filtered(SymbolRecord::new(
                    node_line(left),
                    name,
                    SymbolContext::Variable,
                ));
            } else {
                // Member targets emit property records through the
                // member handler.
                self.walk(left);
            }
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(right);
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
            } else if id == k.member_expression {
                let object = function
                    .child_by_field_name("object")
                    .map(|o| self.text(o).to_string())
                    .unwrap_or_default();
                if let Some(property) = function.child_by_field_name("property") {
                    call_name = self.text(property).trim_start_matches('#').to_string();
                    self.filtered(
                        SymbolRecord::new(
                            node_line(property),
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
                if argument.kind_id() == k.identifier {
                    // Call-site arguments are deliberately not
                    // filtered.
                    let name = self.text(argument).to_string();
                    self.structural(
                        SymbolRecord::new(node_line(argument), name, SymbolContext::Argument)
                            .with_clue(call_name.clone()),
                    );
                } else {
                    self.walk(argument);
                }
            }
        }
    }

    /// `new X(...)` is a call; inside `throw` the constructor is an
    /// exception type instead.
    fn handle_new(&mut self, node: Node, context: SymbolContext) {
        let k = self.kinds;
        let mut call_name = String::new();

        if let Some(constructor) = node.child_by_field_name("constructor") {
            let id = constructor.kind_id();
            if id == k.identifier || id == k.member_expression {
                call_name = self.text(constructor).to_string();
                self.filtered(SymbolRecord::new(
                    node_line(constructor),
                    call_name.clone(),
                    context,
                ));
            } else {
                self.walk(constructor);
            }
        }

        if let Some(arguments) = node.child_by_field_name("arguments") {
            let mut cursor = arguments.walk();
            for argument in arguments.named_children(&mut cursor) {
                if argument.kind_id() == k.identifier {
                    let name = self.text(argument).to_string();
                    self.structural(
                        SymbolRecord::new(node_line(argument), name, SymbolContext::Argument)
                            .with_clue(call_name.clone()),
                    );
                } else {
                    self.walk(argument);
                }
            }
        }
    }

    fn handle_member(&mut self, node: Node) {
        let object = node
            .child_by_field_name("object")
            .map(|o| self.text(o).to_string())
            .unwrap_or_default();
        if let Some(property) = node.child_by_field_name("property") {
            let name = self.text(property).trim_start_matches('#').to_string();
            self.filtered(
                SymbolRecord::new(node_line(property), name, SymbolContext::Property)
                    .with_parent(object),
            );
        }
        if let Some(object_node) = node.child_by_field_name("object") {
            self.walk(object_node);
        }
    }

    fn handle_import(&mut self, node: Node) {
        let k = self.kinds;
        let module = node
            .child_by_field_name("source")
            .map(|s| self.text(s).trim_matches(|c| c == '"' || c == '\'').to_string())
            .unwrap_or_default();

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind_id() != k.import_clause {
                continue;
            }
            let mut inner = child.walk();
            for clause in child.named_children(&mut inner) {
                let id = clause.kind_id();
                if id == k.identifier {
                    // Default import. Imported names are declarations
                    // and bypass the filter.
                    let name = self.text(clause).to_string();
                    self.structural(
                        SymbolRecord::new(node_line(clause), name, SymbolContext::Import)
                            .with_clue(module.clone()),
                    );
                } else if id == k.namespace_import {
                    if let Some(alias) = clause.named_child(0) {
                        let name = self.text(alias).to_string();
                        self.structural(
                            SymbolRecord::new(node_line(alias), name, SymbolContext::Import)
                                .with_clue(module.clone()),
                        );
                    }
                } else if id == k.named_imports {
                    let mut specifiers = clause.walk();
                    for specifier in clause.named_children(&mut specifiers) {
                        if specifier.kind_id() != k.import_specifier {
                            continue;
                        }
                        let original = specifier
                            .child_by_field_name("name")
                            .map(|n| self.text(n).to_string())
                            .unwrap_or_default();
                        if let Some(alias) = specifier.child_by_field_name("alias") {
                            let name = self.text(alias).to_string();
                            self.structural(
                                SymbolRecord::new(node_line(alias), name, SymbolContext::Import)
                                    .with_clue(original),
                            );
                        } else if !original.is_empty() {
                            self.structural(
                                SymbolRecord::new(
                                    node_line(specifier),
                                    original,
                                    SymbolContext::Import,
                                )
                                .with_clue(module.clone()),
                            );
                        }
                    }
                }
            }
        }
    }

    fn handle_export(&mut self, node: Node) {
        let k = self.kinds;

        if let Some(declaration) = node.child_by_field_name("declaration") {
            self.walk(declaration);
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let id = child.kind_id();
            if id == k.export_clause {
                let mut specifiers = child.walk();
                for specifier in child.named_children(&mut specifiers) {
                    if specifier.kind_id() != k.export_specifier {
                        continue;
                    }
                    let exported = specifier
                        .child_by_field_name("alias")
                        .or_else(|| specifier.child_by_field_name("name"));
                    if let Some(exported) = exported {
                        // Exported names are declarations; bypass.
                        let name = self.text(exported).to_string();
                        self.structural(SymbolRecord::new(
                            node_line(exported),
                            name,
                            SymbolContext::Export,
                        ));
                    }
                }
            } else if id == k.identifier {
                // `export default someName;`
                let name = self.text(child).to_string();
                self.structural(SymbolRecord::new(
                    node_line(child),
                    name,
                    SymbolContext::Export,
                ));
            }
        }
    }

    /// `namespace A { ... }`: the chain of enclosing namespaces forms
    /// the namespace column for nested emissions.
    fn handle_namespace(&mut self, node: Node) {
        let Some(name) = name_of(node, self.src).map(str::to_string) else {
            self.walk_children(node);
            return;
        };

        // Declaration name; bypasses the filter.
        self.structural(
            SymbolRecord::new(node_line(node), name.clone(), SymbolContext::Namespace)
                .with_definition(node_location(node)),
        );

        let previous = self.namespace.clone();
        if self.namespace.is_empty() {
            self.namespace = name;
        } else {
            self.namespace = format!("{previous}.{name}");
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
        self.namespace = previous;
    }

    fn handle_string(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind_id() == k.string_fragment {
                let text = self.text(child).to_string();
                self.words(&text, node_line(child), SymbolContext::String, "");
            }
        }
    }

    /// Template strings: static fragments split into words,
    /// substitutions recurse as expressions.
    fn handle_template(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let id = child.kind_id();
            if id == k.string_fragment {
                let text = self.text(child).to_string();
                self.words(&text, node_line(child), SymbolContext::String, "");
            } else if id == k.template_substitution {
                self.walk_children(child);
            }
        }
    }

    fn handle_label(&mut self, node: Node) {
        if let Some(label) = node.child_by_field_name("label") {
            let name = self.text(label).to_string();
            self.filtered(SymbolRecord::new(
                node_line(label),
                name,
                SymbolContext::Label,
            ));
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_catch(&mut self, node: Node) {
        if let Some(parameter) = node.child_by_field_name("parameter") {
            if parameter.kind_id() == self.kinds.identifier {
                let name = self.text(parameter).to_string();
                self.filtered(SymbolRecord::new(
                    node_line(parameter),
                    name,
                    SymbolContext::Variable,
                ));
            } else {
                self.emit_pattern_bindings(parameter, "");
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn handle_throw(&mut self, node: Node) {
        let k = self.kinds;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind_id() == k.new_expression {
                self.handle_new(child, SymbolContext::Exception);
            } else {
                self.walk(child);
            }
        }
    }

    fn handle_for_in(&mut self, node: Node) {
        let k = self.kinds;
        if let Some(left) = node.child_by_field_name("left") {
            if left.kind_id() == k.identifier {
                let name = self.text(left).to_string();
                self.filtered(SymbolRecord::new(
                    node_line(left),
                    name,
                    SymbolContext::Variable,
                ));
            } else {
                self.emit_pattern_bindings(left, "");
            }
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.walk(right);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body);
        }
    }
}
