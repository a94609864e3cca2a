use super::{AbstractSyntaxTree, Listing, SemanticAnalyser};
use super::super::ast::{
    symbol_table::{SymbolClass, SymbolTable, WORD_SIZE},
    DeclKind, ExpKind, ExpType, NodeKind, ParamKind, StmtKind, TreeNode,
};

/// Function currently being analysed; return statements and trace headers
/// are checked against it.
struct CurrentFunction {
    name: String,
    exp_type: ExpType,
    lineno: i32,
}

/// CMinusSemanticAnalyser is a concrete SemanticAnalyser.
///
/// It runs two passes over the top level declaration chain. Pass A walks
/// the tree in preorder building the scoped symbol table, assigning every
/// symbol its memory location and annotating identifier-using nodes. Pass B
/// walks in postorder computing expression types and checking every type,
/// argument and program-structure rule. Both passes keep reporting after an
/// error; the listing's flag suppresses the later stages.
pub struct CMinusSemanticAnalyser {
    symbol_table: SymbolTable,

    // Pass state. A function declaration primes its body compound to reuse
    // the parameter scope instead of opening its own.
    function_just_declared: bool,
    // Depth of call argument lists being walked; a bare array identifier is
    // only a legal expression while this is non zero.
    call_arguments: usize,
    current_function: Option<CurrentFunction>,
    function_returned: bool,
    // Most negative frame offset reached inside the current function.
    lowest_location: i32,

    trace: bool,
}

impl CMinusSemanticAnalyser {
    /// Pass A entry: build the symbol table by preorder traversal.
    fn build_symbol_table(&mut self, root: &mut TreeNode, listing: &mut Listing) {
        self.insert_node(root, listing);
        if self.trace {
            listing.blank_line();
            listing.write_line("** Symbol table for global scope");
            self.symbol_table.print(listing);
        }
    }

    /// Inserts a node and its whole sibling chain into the symbol table.
    fn insert_node(&mut self, node: &mut TreeNode, listing: &mut Listing) {
        let mut current = Some(node);
        while let Some(node) = current {
            self.insert_single(node, listing);
            current = node.sibling.as_deref_mut();
        }
    }

    fn insert_single(&mut self, node: &mut TreeNode, listing: &mut Listing) {
        match node.kind {
            NodeKind::STMT(kind) => self.insert_stmt(kind, node, listing),
            NodeKind::EXP(kind) => self.insert_exp(kind, node, listing),
            NodeKind::DECL(kind) => self.insert_decl(kind, node, listing),
            NodeKind::TYPE => {}
            NodeKind::PARAM(kind) => self.insert_param(kind, node, listing),
        }
    }

    fn insert_stmt(&mut self, kind: StmtKind, node: &mut TreeNode, listing: &mut Listing) {
        match kind {
            StmtKind::COMPOUND => {
                let function_scope = self.function_just_declared;
                self.function_just_declared = false;
                if !function_scope {
                    self.symbol_table.enter_scope();
                }

                let lineno = node.lineno;
                if let Some(declarations) = node.child_mut(0) {
                    self.insert_node(declarations, listing);
                }
                if let Some(statements) = node.child_mut(1) {
                    self.insert_node(statements, listing);
                }

                if self.trace {
                    self.print_scope_header(function_scope, lineno, listing);
                    self.symbol_table.print(listing);
                }
                if !function_scope {
                    self.symbol_table.leave_scope();
                }
            }
            StmtKind::SELECTION | StmtKind::ITERATION | StmtKind::RETURN => {
                for index in 0..node.children.len() {
                    if let Some(child) = node.child_mut(index) {
                        self.insert_node(child, listing);
                    }
                }
            }
        }
    }

    fn insert_exp(&mut self, kind: ExpKind, node: &mut TreeNode, listing: &mut Listing) {
        match kind {
            ExpKind::ASSIGN => {
                // Only a bare identifier is exempt from the array-as-scalar
                // check; inside a larger expression the exemption ends.
                let in_arguments = std::mem::replace(&mut self.call_arguments, 0);
                if let Some(rhs) = node.child_mut(1) {
                    self.insert_node(rhs, listing);
                }
                if let Some(lhs) = node.child_mut(0) {
                    self.insert_node(lhs, listing);
                }
                self.call_arguments = in_arguments;
            }
            ExpKind::OP => {
                let in_arguments = std::mem::replace(&mut self.call_arguments, 0);
                for index in 0..2 {
                    if let Some(child) = node.child_mut(index) {
                        self.insert_node(child, listing);
                    }
                }
                self.call_arguments = in_arguments;
            }
            ExpKind::CONST => {}
            ExpKind::VAR => {
                if let Some(id) = self.symbol_table.lookup(node, listing) {
                    let symbol = self.symbol_table.symbol(id);
                    if symbol.class() == SymbolClass::FUNCTION {
                        listing.type_error(node.lineno, "used a function like a variable");
                    } else if symbol.is_array() && self.call_arguments == 0 {
                        listing.type_error(node.lineno, "used an array like a variable");
                    }
                }
            }
            ExpKind::ARR => {
                if let Some(id) = self.symbol_table.lookup(node, listing) {
                    if !self.symbol_table.symbol(id).is_array() {
                        listing.type_error(node.lineno, "used a non-array like an array");
                    }
                }
                let in_arguments = std::mem::replace(&mut self.call_arguments, 0);
                if let Some(index) = node.child_mut(0) {
                    self.insert_node(index, listing);
                }
                self.call_arguments = in_arguments;
            }
            ExpKind::CALL => {
                if let Some(id) = self.symbol_table.lookup(node, listing) {
                    if self.symbol_table.symbol(id).class() != SymbolClass::FUNCTION {
                        listing.type_error(node.lineno, "used a non-function like a function");
                    }
                }
                self.call_arguments += 1;
                if let Some(arguments) = node.child_mut(0) {
                    self.insert_node(arguments, listing);
                }
                self.call_arguments -= 1;
            }
        }
    }

    fn insert_decl(&mut self, kind: DeclKind, node: &mut TreeNode, listing: &mut Listing) {
        let class = if self.symbol_table.is_global() {
            SymbolClass::GLOBAL
        } else {
            SymbolClass::LOCAL
        };
        let declared_type = node.child(0).map(|t| t.exp_type).unwrap_or(ExpType::VOID);

        match kind {
            DeclKind::VAR_DECL => {
                self.symbol_table.register(node, class, false, declared_type, listing);
                self.track_frame_growth(class);
            }
            DeclKind::ARR_DECL => {
                self.symbol_table.register(node, class, true, declared_type, listing);
                self.track_frame_growth(class);
            }
            DeclKind::FUN_DECL => {
                self.current_function = Some(CurrentFunction {
                    name: String::from(node.name().unwrap_or("")),
                    exp_type: declared_type,
                    lineno: node.lineno,
                });
                let id = self.symbol_table.register(
                    node,
                    SymbolClass::FUNCTION,
                    false,
                    declared_type,
                    listing,
                );

                self.symbol_table.enter_scope();
                self.symbol_table.set_offset_cursor(0);
                if let Some(params) = node.child_mut(1) {
                    self.insert_node(params, listing);
                }
                self.symbol_table.set_offset_cursor(-WORD_SIZE);
                self.lowest_location = -WORD_SIZE;

                self.function_just_declared = true;
                if let Some(body) = node.child_mut(2) {
                    self.insert_node(body, listing);
                }
                self.function_just_declared = false;
                self.symbol_table.leave_scope();

                // The lowest offset reached is the frame the function needs.
                if let Some(id) = id {
                    self.symbol_table
                        .set_function_memloc(id, self.lowest_location + WORD_SIZE);
                }
                self.current_function = None;
            }
        }
    }

    fn insert_param(&mut self, kind: ParamKind, node: &mut TreeNode, listing: &mut Listing) {
        let declared_type = node.child(0).map(|t| t.exp_type).unwrap_or(ExpType::VOID);
        match kind {
            ParamKind::VAR_PARAM => {
                self.symbol_table
                    .register(node, SymbolClass::PARAMETER, false, declared_type, listing);
            }
            ParamKind::ARR_PARAM => {
                self.symbol_table
                    .register(node, SymbolClass::PARAMETER, true, declared_type, listing);
            }
            ParamKind::VOID_PARAM => {}
        }
    }

    fn track_frame_growth(&mut self, class: SymbolClass) {
        if class == SymbolClass::LOCAL {
            self.lowest_location = self.lowest_location.min(self.symbol_table.offset_cursor());
        }
    }

    fn print_scope_header(&self, function_scope: bool, lineno: i32, listing: &mut Listing) {
        let function = match &self.current_function {
            Some(function) => function,
            None => return,
        };
        listing.blank_line();
        if function_scope {
            listing.write_line(&format!(
                "** Symbol table for scope of function {} declared at line {}",
                function.name, function.lineno
            ));
        } else {
            listing.write_line(&format!(
                "** Symbol table for nested scope in function {} closed at line {}",
                function.name, lineno
            ));
        }
    }

    /// Pass B entry: type check by postorder traversal.
    fn type_check(&mut self, node: &mut TreeNode, listing: &mut Listing) {
        let mut current = Some(node);
        while let Some(node) = current {
            self.check_single(node, listing);
            current = node.sibling.as_deref_mut();
        }
    }

    fn check_single(&mut self, node: &mut TreeNode, listing: &mut Listing) {
        match node.kind {
            NodeKind::STMT(kind) => self.check_stmt(kind, node, listing),
            NodeKind::EXP(kind) => self.check_exp(kind, node, listing),
            NodeKind::DECL(kind) => self.check_decl(kind, node, listing),
            NodeKind::TYPE => {}
            NodeKind::PARAM(kind) => self.check_param(kind, node, listing),
        }
    }

    fn check_children(&mut self, node: &mut TreeNode, listing: &mut Listing) {
        for index in 0..node.children.len() {
            if let Some(child) = node.child_mut(index) {
                self.type_check(child, listing);
            }
        }
    }

    fn check_stmt(&mut self, kind: StmtKind, node: &mut TreeNode, listing: &mut Listing) {
        self.check_children(node, listing);
        match kind {
            StmtKind::COMPOUND => {}
            StmtKind::SELECTION => {
                let condition = node.child(0).unwrap();
                if condition.exp_type != ExpType::INTEGER {
                    listing.type_error(condition.lineno, "If-condition is not int");
                }
            }
            StmtKind::ITERATION => {
                let condition = node.child(0).unwrap();
                if condition.exp_type != ExpType::INTEGER {
                    listing.type_error(condition.lineno, "While-condition is not int");
                }
            }
            StmtKind::RETURN => {
                let returned_type =
                    node.child(0).map(|e| e.exp_type).unwrap_or(ExpType::VOID);
                let lineno = node.child(0).map(|e| e.lineno).unwrap_or(node.lineno);
                if let Some(function) = &self.current_function {
                    if returned_type != function.exp_type {
                        listing.type_error(lineno, "Return value does not match function type");
                    }
                }
                self.function_returned = true;
            }
        }
    }

    fn check_exp(&mut self, kind: ExpKind, node: &mut TreeNode, listing: &mut Listing) {
        match kind {
            ExpKind::ASSIGN => {
                self.check_children(node, listing);
                let lhs_type = node.child(0).map(|c| c.exp_type).unwrap_or(ExpType::VOID);
                let rhs = node.child(1).unwrap();
                if lhs_type != rhs.exp_type {
                    listing.type_error(rhs.lineno, "Assign type does not match");
                }
                node.exp_type = lhs_type;
            }
            ExpKind::OP => {
                self.check_children(node, listing);
                let lhs_type = node.child(0).map(|c| c.exp_type).unwrap_or(ExpType::VOID);
                let rhs_type = node.child(1).map(|c| c.exp_type).unwrap_or(ExpType::VOID);
                if lhs_type != ExpType::INTEGER || rhs_type != ExpType::INTEGER {
                    listing.type_error(node.lineno, "Op applied to non-integer");
                }
                node.exp_type = ExpType::INTEGER;
            }
            ExpKind::CONST => {
                node.exp_type = ExpType::INTEGER;
            }
            ExpKind::VAR => {
                if let Some(id) = node.symbol {
                    node.exp_type = self.symbol_table.symbol(id).exp_type();
                }
            }
            ExpKind::ARR => {
                self.check_children(node, listing);
                let index = node.child(0).unwrap();
                if index.exp_type != ExpType::INTEGER {
                    listing.type_error(node.lineno, "Array index is not integer");
                }
                if let Some(id) = node.symbol {
                    node.exp_type = self.symbol_table.symbol(id).exp_type();
                }
            }
            ExpKind::CALL => {
                self.check_children(node, listing);
                if let Some(id) = node.symbol {
                    node.exp_type = self.symbol_table.symbol(id).exp_type();
                }
                self.check_arguments(node, listing);
            }
        }
    }

    fn check_decl(&mut self, kind: DeclKind, node: &mut TreeNode, listing: &mut Listing) {
        match kind {
            DeclKind::VAR_DECL => {
                if node.exp_type == ExpType::VOID {
                    listing.type_error(node.lineno, "Invalid variable declaration of type void");
                }
            }
            DeclKind::ARR_DECL => {
                if node.exp_type == ExpType::VOID {
                    listing.type_error(node.lineno, "Invalid array declaration of type void");
                }
            }
            DeclKind::FUN_DECL => {
                self.current_function = Some(CurrentFunction {
                    name: String::from(node.name().unwrap_or("")),
                    exp_type: node.exp_type,
                    lineno: node.lineno,
                });
                self.function_returned = false;
                self.check_children(node, listing);
                if node.exp_type == ExpType::INTEGER && !self.function_returned {
                    listing.semantic_error(
                        node.lineno,
                        &format!(
                            "Integer function '{}' missing return statement.",
                            node.name().unwrap_or("")
                        ),
                    );
                }
                self.current_function = None;
            }
        }
    }

    fn check_param(&mut self, kind: ParamKind, node: &mut TreeNode, listing: &mut Listing) {
        match kind {
            ParamKind::VAR_PARAM => {
                if node.exp_type == ExpType::VOID {
                    listing.type_error(node.lineno, "Invalid parameter of type void");
                }
            }
            ParamKind::ARR_PARAM => {
                if node.exp_type == ExpType::VOID {
                    listing.type_error(node.lineno, "Invalid array parameter of type void");
                }
            }
            ParamKind::VOID_PARAM => {}
        }
    }

    /// Checks a call's arguments against the called function's parameter
    /// list, walking both in lockstep.
    fn check_arguments(&mut self, call: &TreeNode, listing: &mut Listing) {
        let symbol = match call.symbol {
            Some(id) => self.symbol_table.symbol(id),
            None => return,
        };
        if symbol.class() != SymbolClass::FUNCTION {
            return;
        }
        let function_name = String::from(symbol.name());
        let param_kinds = symbol.param_kinds().to_vec();

        let arguments: Vec<&TreeNode> = match call.child(0) {
            Some(first) => first.siblings().collect(),
            None => Vec::new(),
        };

        if param_kinds == [ParamKind::VOID_PARAM] {
            if let Some(first) = arguments.first() {
                listing.argument_error(
                    &function_name,
                    first.lineno,
                    "This function does not take arguments.",
                );
            }
            return;
        }

        for (index, (kind, argument)) in
            param_kinds.iter().zip(arguments.iter()).enumerate()
        {
            let counter = index + 1;
            match kind {
                ParamKind::VAR_PARAM => match argument.kind {
                    NodeKind::EXP(ExpKind::VAR) => {
                        if let Some(id) = argument.symbol {
                            if self.symbol_table.symbol(id).is_array() {
                                listing.argument_error(
                                    &function_name,
                                    argument.lineno,
                                    &format!(
                                        "Expected integer for argument {}, but received array.",
                                        counter
                                    ),
                                );
                                return;
                            }
                        }
                    }
                    NodeKind::EXP(ExpKind::CALL) => {
                        if let Some(id) = argument.symbol {
                            if self.symbol_table.symbol(id).exp_type() == ExpType::VOID {
                                listing.argument_error(
                                    &function_name,
                                    argument.lineno,
                                    &format!(
                                        "Expected integer for argument {}, but received void function call.",
                                        counter
                                    ),
                                );
                                return;
                            }
                        }
                    }
                    _ => {}
                },
                ParamKind::ARR_PARAM => match argument.kind {
                    NodeKind::EXP(ExpKind::VAR) => {
                        if let Some(id) = argument.symbol {
                            if !self.symbol_table.symbol(id).is_array() {
                                listing.argument_error(
                                    &function_name,
                                    argument.lineno,
                                    &format!(
                                        "Expected array for argument {}, but received variable.",
                                        counter
                                    ),
                                );
                                return;
                            }
                        }
                    }
                    _ => {
                        listing.argument_error(
                            &function_name,
                            argument.lineno,
                            &format!(
                                "Expected array for argument {}, but received something else.",
                                counter
                            ),
                        );
                        return;
                    }
                },
                ParamKind::VOID_PARAM => {}
            }
        }

        if arguments.len() != param_kinds.len() {
            let message = if arguments.len() > param_kinds.len() {
                format!(
                    "Too many arguments. {} expected, {} given.",
                    param_kinds.len(),
                    arguments.len()
                )
            } else {
                format!(
                    "Too few arguments. {} expected, {} given.",
                    param_kinds.len(),
                    arguments.len()
                )
            };
            listing.argument_error(&function_name, call.lineno, &message);
        }
    }

    /// Asserts the program ends in a well formed `void main(void)` with no
    /// global definitions after it.
    fn main_check(&self, root: &TreeNode, listing: &mut Listing) {
        for node in root.siblings() {
            if node.name() != Some("main") {
                continue;
            }
            if node.exp_type != ExpType::VOID {
                listing.semantic_error(
                    node.lineno,
                    "Return type of function 'main' must be void.",
                );
            } else if node.child(1).map(|p| p.kind) != Some(NodeKind::PARAM(ParamKind::VOID_PARAM))
            {
                listing.semantic_error(node.lineno, "Parameter of function 'main' must be void.");
            } else if node.sibling.is_some() {
                listing.semantic_error(
                    node.lineno,
                    "Illegal global definition after function 'main'.",
                );
            }
            return;
        }

        let last_lineno = root.siblings().last().map(|n| n.lineno).unwrap_or(0);
        listing.semantic_error(last_lineno, "Reached EOF before finding function 'main'.");
    }
}

/// SemanticAnalyser Trait Concrete Implementation
impl SemanticAnalyser for CMinusSemanticAnalyser {
    fn default() -> Self {
        Self {
            symbol_table: SymbolTable::new(),
            function_just_declared: false,
            call_arguments: 0,
            current_function: None,
            function_returned: false,
            lowest_location: -WORD_SIZE,
            trace: false,
        }
    }

    fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Runs Pass A then, when it succeeded, Pass B and the main check.
    /// The annotated tree is returned either way so callers can inspect it;
    /// the listing's error flag says whether it is fit for generation.
    fn analyse(mut self, root: TreeNode, listing: &mut Listing) -> AbstractSyntaxTree {
        let mut root = root;
        self.build_symbol_table(&mut root, listing);
        if !listing.had_error() {
            self.type_check(&mut root, listing);
            self.main_check(&root, listing);
        }
        AbstractSyntaxTree::new(root, self.symbol_table.into_arena())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::{AstParser, PestCMinusParser};

    fn analyse(source: &str) -> (AbstractSyntaxTree, Listing) {
        let root = PestCMinusParser::default().parse(source).unwrap();
        let mut listing = Listing::new();
        let tree = CMinusSemanticAnalyser::default().analyse(root, &mut listing);
        (tree, listing)
    }

    /// Every VAR, ARR and CALL node of an accepted program carries a symbol.
    fn assert_annotated(tree: &AbstractSyntaxTree, node: &TreeNode) {
        for node in node.siblings() {
            match node.kind {
                NodeKind::EXP(ExpKind::VAR)
                | NodeKind::EXP(ExpKind::ARR)
                | NodeKind::EXP(ExpKind::CALL) => {
                    assert!(node.symbol.is_some(), "unannotated node {:?}", node.kind);
                }
                _ => {}
            }
            for child in node.children.iter().flatten() {
                assert_annotated(tree, child);
            }
        }
    }

    #[test]
    fn test_accepted_program_has_all_symbol_slots_populated() {
        let (tree, listing) = analyse(
            "int g;\n\
             int sum(int a, int b) { return a + b; }\n\
             void main(void) { g = sum(1, 2); output(g); }",
        );
        assert!(!listing.had_error(), "listing: {}", listing);
        assert_annotated(&tree, tree.root());
    }

    #[test]
    fn test_frame_size_covers_locals_and_is_word_aligned() {
        let (tree, listing) = analyse(
            "int f(void) { int a; int b; int c; return a + b + c; }\n\
             void main(void) { output(f()); }",
        );
        assert!(!listing.had_error(), "listing: {}", listing);

        let function = tree.root();
        let symbol = tree.symbol(function.symbol.unwrap());
        assert_eq!(symbol.memloc(), -12);
        assert_eq!(symbol.frame_size(), 12);
        assert_eq!(symbol.frame_size() % WORD_SIZE, 0);
    }

    #[test]
    fn test_local_array_grows_frame_by_its_length() {
        let (tree, listing) = analyse(
            "void main(void) { int x[5]; int i; i = 0; x[0] = i; }",
        );
        assert!(!listing.had_error(), "listing: {}", listing);
        let symbol = tree.symbol(tree.root().symbol.unwrap());
        assert_eq!(symbol.frame_size(), 24);
    }

    #[test]
    fn test_sibling_blocks_reuse_frame_slots() {
        let (tree, listing) = analyse(
            "void main(void) {\n\
               int a;\n\
               { int b; b = 1; a = b; }\n\
               { int c; c = 2; a = c; }\n\
             }",
        );
        assert!(!listing.had_error(), "listing: {}", listing);
        // One outer local plus one word shared by the two block locals.
        assert_eq!(tree.symbol(tree.root().symbol.unwrap()).frame_size(), 8);
    }

    #[test]
    fn test_undeclared_use_is_scope_error() {
        let (_, listing) = analyse("void main(void) { y = 3; }");
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Variable y used without declaration"));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let (_, listing) = analyse("void main(void) { int x; int x; }");
        assert!(listing.had_error());
        assert!(listing.to_string().contains("already declared."));
    }

    #[test]
    fn test_shadowing_in_nested_block_is_legal() {
        let (_, listing) = analyse(
            "void main(void) { int x; x = 1; { int x; x = 2; output(x); } output(x); }",
        );
        assert!(!listing.had_error(), "listing: {}", listing);
    }

    #[test]
    fn test_assigning_void_call_is_type_error() {
        let (_, listing) = analyse("void main(void) { int v; v = output(1); }");
        assert!(listing.had_error());
        assert!(listing.to_string().contains("Assign type does not match"));
    }

    #[test]
    fn test_void_variable_declaration_is_type_error() {
        let (_, listing) = analyse("void main(void) { void x; }");
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Invalid variable declaration of type void"));
    }

    #[test]
    fn test_array_used_like_scalar_is_type_error() {
        let (_, listing) = analyse("void main(void) { int a[3]; output(a + 1); }");
        assert!(listing.had_error());
        assert!(listing.to_string().contains("used an array like a variable"));
    }

    #[test]
    fn test_bare_array_as_call_argument_is_legal() {
        let (_, listing) = analyse(
            "int first(int a[]) { return a[0]; }\n\
             void main(void) { int x[4]; x[0] = 7; output(first(x)); }",
        );
        assert!(!listing.had_error(), "listing: {}", listing);
    }

    #[test]
    fn test_condition_must_be_integer() {
        let (_, listing) = analyse("void main(void) { if (output(1)) output(2); }");
        assert!(listing.had_error());
        assert!(listing.to_string().contains("If-condition is not int"));
    }

    #[test]
    fn test_integer_function_without_return_is_semantic_error() {
        let (_, listing) = analyse("int f(void) { } void main(void) { output(f()); }");
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Integer function 'f' missing return statement."));
    }

    #[test]
    fn test_main_must_return_void() {
        let (_, listing) = analyse("int main(void) { return 0; }");
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Return type of function 'main' must be void."));
    }

    #[test]
    fn test_no_globals_after_main() {
        let (_, listing) = analyse("void main(void) { ; } int late;");
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Illegal global definition after function 'main'."));
    }

    #[test]
    fn test_missing_main_is_semantic_error() {
        let (_, listing) = analyse("int f(void) { return 1; }");
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Reached EOF before finding function 'main'."));
    }

    #[test]
    fn test_arity_mismatch_reports_counts() {
        let (_, listing) = analyse(
            "int add(int a, int b) { return a + b; }\n\
             void main(void) { output(add(1)); }",
        );
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Too few arguments. 2 expected, 1 given."));
    }

    #[test]
    fn test_array_argument_where_integer_expected() {
        let (_, listing) = analyse(
            "int twice(int n) { return n + n; }\n\
             void main(void) { int a[4]; output(twice(a)); }",
        );
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Expected integer for argument 1, but received array."));
    }

    #[test]
    fn test_scalar_argument_where_array_expected() {
        let (_, listing) = analyse(
            "int first(int a[]) { return a[0]; }\n\
             void main(void) { int x; x = 1; output(first(x)); }",
        );
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Expected array for argument 1, but received variable."));
    }

    #[test]
    fn test_builtin_output_rejects_extra_arguments() {
        let (_, listing) = analyse("void main(void) { output(1, 2); }");
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Too many arguments. 1 expected, 2 given."));
    }

    #[test]
    fn test_trace_dumps_symbol_tables() {
        let root = PestCMinusParser::default()
            .parse("void main(void) { int x; x = 3; { int y; y = x; } }")
            .unwrap();
        let mut listing = Listing::new();
        let mut analyser = CMinusSemanticAnalyser::default();
        analyser.set_trace(true);
        analyser.analyse(root, &mut listing);

        let text = listing.to_string();
        assert!(text.contains("** Symbol table for scope of function main declared at line 1"));
        assert!(text.contains("** Symbol table for nested scope in function main"));
        assert!(text.contains("** Symbol table for global scope"));
        assert!(text.contains("Symbol Name  Scope  Offset"));
    }
}
