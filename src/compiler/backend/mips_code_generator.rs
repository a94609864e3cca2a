use super::assembly_emitter::{Address, AssemblyEmitter, Label, Register, Section};
use super::{AssemblyCode, BackEndGenerator};
use super::super::ast::{
    symbol_table::{SymbolArena, SymbolClass, ARGUMENT_REGISTERS, WORD_SIZE},
    AbstractSyntaxTree, DeclKind, ExpKind, NodeAttr, NodeKind, Operator, StmtKind, TreeNode,
};

/// MipsCodeGenerator is a Backend for the SPIM machine.
/// It generates textual MIPS assembly from an annotated abstract syntax
/// tree by recursive tree walk. Expression values are returned in `$v0`;
/// intermediate values of binary evaluations live on a shadow stack below
/// `$sp`.
///
/// # Stack Frame Structure
///     $fp + 4j : stacked parameter j (parameter index 4 + j)
///     $fp - 4  : first local, down to $fp - frameSize
///     $fp - frameSize - 4  : unused pad word
///     $fp - frameSize - 8  : saved $ra
///     $fp - frameSize - 12 : saved caller $fp (control link)
///
/// # Key
///     + frameSize is the negated most negative local offset the analyser
///       recorded on the function symbol; frameSize plus one pad word is
///       reserved on entry so the shadow stack cannot overwrite locals.
///     + The first four parameters never touch the frame; they stay in
///       `$a0..$a3` and the caller saves its own live argument registers
///       around every call.
///     + `main` has no caller: its prologue is just `$fp := $sp` plus the
///       local reservation, and it leaves through the exit syscall.
pub struct MipsCodeGenerator {
    emitter: AssemblyEmitter,
    symbols: SymbolArena,

    // Per function state
    return_label: Option<Label>,
    live_argument_registers: i32,

    trace: bool,
}

impl BackEndGenerator for MipsCodeGenerator {
    /// Creates a default configuration of MipsCodeGenerator
    fn default() -> Self {
        Self {
            emitter: AssemblyEmitter::new(),
            symbols: SymbolArena::default(),
            return_label: None,
            live_argument_registers: 0,
            trace: false,
        }
    }

    fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Generates the full SPIM program: the IO string data block, every
    /// global declaration, and the exit routine `main` falls through into.
    fn generate(mut self, tree: AbstractSyntaxTree) -> AssemblyCode {
        let (root, symbols) = tree.into_parts();
        self.symbols = symbols;

        self.emitter.emit_comment("C-Minus compilation to SPIM code");
        self.generate_io_strings();
        self.generate_global(&root);

        self.emitter.emit_comment("end of execution");
        self.emitter.emit_reg_imm("li", Register::V0, 10);
        self.emitter.emit_code("syscall");

        let code = self.emitter.finalize();
        if self.trace {
            code.decorated()
        } else {
            code
        }
    }
}

/// Declaration level generation.
impl MipsCodeGenerator {
    /// Strings reserved for the IO builtins, emitted once at program start.
    fn generate_io_strings(&mut self) {
        self.emitter.emit_comment("strings reserved for IO");
        self.emitter.section(Section::DATA);
        self.emitter.emit_code("_inputStr:  .asciiz \"input: \"");
        self.emitter.emit_code("_outputStr: .asciiz \"output: \"");
        self.emitter.emit_code("_newline:   .asciiz \"\\n\"");
        self.emitter.emit_blank();
    }

    /// Walks the top level declaration chain.
    fn generate_global(&mut self, root: &TreeNode) {
        for node in root.siblings() {
            match node.kind {
                NodeKind::DECL(DeclKind::VAR_DECL) => {
                    self.generate_global_variable(node.name().unwrap(), WORD_SIZE);
                }
                NodeKind::DECL(DeclKind::ARR_DECL) => {
                    let length = node.child(1).and_then(|c| c.value()).unwrap_or(0);
                    self.generate_global_variable(node.name().unwrap(), length * WORD_SIZE);
                }
                NodeKind::DECL(DeclKind::FUN_DECL) => {
                    self.generate_function(node);
                }
                _ => panic!("Malformed AST! Node {:?} at global scope.", node.kind),
            }
        }
    }

    /// Global variables live in the data section and address by name.
    fn generate_global_variable(&mut self, name: &str, bytes: i32) {
        let comment = format!("global variable {}", name);
        self.emitter.emit_comment(&comment);
        self.emitter.section(Section::DATA);
        self.emitter.emit_code(".align 2");
        self.emitter.emit_code(&format!("{}: .space {}", name, bytes));
        self.emitter.emit_blank();
    }

    fn generate_function(&mut self, node: &TreeNode) {
        let name = String::from(node.name().unwrap());
        let symbol = self.symbols.get(node.symbol.unwrap());
        let frame_size = symbol.frame_size();
        self.live_argument_registers = symbol.size().min(ARGUMENT_REGISTERS);

        self.emitter
            .emit_comment(&format!("procedure for function '{}'", name));
        self.emitter.section(Section::TEXT);

        let return_label = self.emitter.create_label();
        self.return_label = Some(return_label);

        if name == "main" {
            self.emitter.emit_code(".globl main");
            self.emitter.emit_symbol_decl("main");
            self.emitter.emit_reg_reg("move", Register::FP, Register::SP);
            if frame_size > 0 {
                self.emitter.emit_reg_reg_imm(
                    "subu",
                    Register::SP,
                    Register::SP,
                    frame_size + WORD_SIZE,
                );
            }
            if let Some(body) = node.child(2) {
                self.generate_node(body);
            }
            self.emitter.emit_label_decl(return_label);
        } else {
            self.emitter.emit_symbol_decl(&name);
            // Local area first, saved registers below it, frame anchor at
            // the spill slot base just above the caller's stack top.
            self.emitter.emit_reg_reg_imm(
                "subu",
                Register::SP,
                Register::SP,
                frame_size + WORD_SIZE,
            );
            self.generate_push(Register::RA);
            self.generate_push(Register::FP);
            self.emitter.emit_reg_reg_imm(
                "addu",
                Register::FP,
                Register::SP,
                frame_size + 4 * WORD_SIZE,
            );

            if let Some(body) = node.child(2) {
                self.generate_node(body);
            }

            // Integer functions jump here from every return; void functions
            // may also just fall through.
            self.emitter.emit_label_decl(return_label);
            self.emitter.emit_reg_reg_imm(
                "subu",
                Register::SP,
                Register::FP,
                frame_size + 4 * WORD_SIZE,
            );
            self.generate_pop(Register::FP);
            self.generate_pop(Register::RA);
            self.emitter.emit_reg_reg_imm(
                "addu",
                Register::SP,
                Register::SP,
                frame_size + WORD_SIZE,
            );
            self.emitter.emit_reg("jr", Register::RA);
        }

        self.emitter
            .emit_comment(&format!("end of function '{}'", name));
        self.emitter.emit_blank();
        self.return_label = None;
    }
}

/// Statement and expression generation. Every expression leaves its value
/// in `$v0` and the stack pointer exactly where it found it.
impl MipsCodeGenerator {
    fn generate_node(&mut self, node: &TreeNode) {
        match node.kind {
            NodeKind::STMT(kind) => self.generate_statement(kind, node),
            NodeKind::EXP(_) => self.generate_expression(node),
            // Declarations produce no code; their offsets are already set.
            NodeKind::DECL(_) | NodeKind::TYPE | NodeKind::PARAM(_) => {}
        }
    }

    fn generate_chain(&mut self, node: &TreeNode) {
        for node in node.siblings() {
            self.generate_node(node);
        }
    }

    fn generate_statement(&mut self, kind: StmtKind, node: &TreeNode) {
        match kind {
            StmtKind::COMPOUND => {
                if let Some(statements) = node.child(1) {
                    self.generate_chain(statements);
                }
            }
            StmtKind::SELECTION => self.generate_selection(node),
            StmtKind::ITERATION => self.generate_iteration(node),
            StmtKind::RETURN => self.generate_return(node),
        }
    }

    fn generate_selection(&mut self, node: &TreeNode) {
        let following_label = self.emitter.create_label();
        self.emitter.emit_comment("->selection");
        self.generate_expression(node.child(0).unwrap());

        if let Some(else_branch) = node.child(2) {
            let else_label = self.emitter.create_label();
            self.emitter.emit_reg_label("beqz", Register::V0, else_label);
            if let Some(then_branch) = node.child(1) {
                self.generate_node(then_branch);
            }
            self.emitter.emit_label("b", following_label);
            self.emitter.emit_label_decl(else_label);
            self.generate_node(else_branch);
        } else {
            self.emitter
                .emit_reg_label("beqz", Register::V0, following_label);
            if let Some(then_branch) = node.child(1) {
                self.generate_node(then_branch);
            }
        }
        self.emitter.emit_label_decl(following_label);
        self.emitter.emit_comment("<-selection");
    }

    fn generate_iteration(&mut self, node: &TreeNode) {
        let condition_label = self.emitter.create_label();
        let following_label = self.emitter.create_label();

        self.emitter.emit_comment("->iteration");
        self.emitter.emit_label_decl(condition_label);
        self.generate_expression(node.child(0).unwrap());
        self.emitter
            .emit_reg_label("beqz", Register::V0, following_label);
        if let Some(body) = node.child(1) {
            self.generate_node(body);
        }
        self.emitter.emit_label("b", condition_label);
        self.emitter.emit_label_decl(following_label);
        self.emitter.emit_comment("<-iteration");
    }

    fn generate_return(&mut self, node: &TreeNode) {
        if let Some(expression) = node.child(0) {
            self.generate_expression(expression);
        }
        self.emitter.emit_label("b", self.return_label.unwrap());
    }

    fn generate_expression(&mut self, node: &TreeNode) {
        match node.kind {
            NodeKind::EXP(ExpKind::CONST) => {
                self.emitter.emit_comment("->Const");
                self.emitter
                    .emit_reg_imm("li", Register::V0, node.value().unwrap());
                self.emitter.emit_comment("<-Const");
            }
            NodeKind::EXP(ExpKind::OP) => self.generate_op(node),
            NodeKind::EXP(ExpKind::VAR) => self.generate_var(node),
            NodeKind::EXP(ExpKind::ARR) => self.generate_subscript(node),
            NodeKind::EXP(ExpKind::ASSIGN) => self.generate_assignment(node),
            NodeKind::EXP(ExpKind::CALL) => self.generate_call(node),
            _ => panic!("Malformed AST! Node {:?} is not an expression.", node.kind),
        }
    }

    /// Binary operator: both operands into `$v0` in turn, the left parked
    /// on the shadow stack meanwhile.
    fn generate_op(&mut self, node: &TreeNode) {
        let op = match node.attr {
            NodeAttr::OP(op) => op,
            _ => panic!("Malformed AST! OP node without operator."),
        };

        let comment = format!("->operator {}", op.token());
        self.emitter.emit_comment(&comment);

        self.generate_expression(node.child(0).unwrap());
        self.generate_push(Register::V0);
        self.generate_expression(node.child(1).unwrap());
        self.emitter.emit_reg_reg("move", Register::T1, Register::V0);
        self.generate_pop(Register::T0);

        match op {
            Operator::OVER => {
                // Quotient comes out of LO; preserve it around the divide.
                self.emitter.emit_reg("mflo", Register::T3);
                self.emitter.emit_reg_reg("div", Register::T0, Register::T1);
                self.emitter.emit_reg("mflo", Register::V0);
                self.emitter.emit_reg("mtlo", Register::T3);
            }
            _ => {
                self.emitter
                    .emit_reg_reg_reg(op.opcode(), Register::V0, Register::T0, Register::T1);
            }
        }

        let comment = format!("<-operator {}", op.token());
        self.emitter.emit_comment(&comment);
    }

    /// A scalar variable loads its value; a bare array name evaluates to
    /// the array's base address.
    fn generate_var(&mut self, node: &TreeNode) {
        let symbol = self.symbols.get(node.symbol.unwrap());
        let (class, memloc, is_array, registered) = (
            symbol.class(),
            symbol.memloc(),
            symbol.is_array(),
            symbol.is_registered_argument(),
        );

        if is_array {
            self.generate_array_address(node);
            return;
        }

        match class {
            SymbolClass::GLOBAL => {
                self.emitter
                    .emit_reg_addr("lw", Register::V0, Address::symbol(node.name().unwrap()));
            }
            SymbolClass::LOCAL => {
                self.emitter
                    .emit_reg_reg_imm("addu", Register::T0, Register::FP, memloc);
                self.emitter
                    .emit_reg_addr("lw", Register::V0, Address::register(Register::T0));
            }
            SymbolClass::PARAMETER => {
                if registered {
                    self.emitter
                        .emit_reg_reg("move", Register::V0, Register::argument(memloc));
                } else {
                    self.emitter
                        .emit_reg_reg_imm("addu", Register::T0, Register::FP, memloc);
                    self.emitter
                        .emit_reg_addr("lw", Register::V0, Address::register(Register::T0));
                }
            }
            SymbolClass::FUNCTION => {
                panic!("Malformed AST! Function name in expression position.")
            }
        }
    }

    /// Base address of an array into `$v0`. A parameter array holds an
    /// already computed address and is never copied.
    fn generate_array_address(&mut self, node: &TreeNode) {
        let symbol = self.symbols.get(node.symbol.unwrap());
        let (class, memloc, registered) = (
            symbol.class(),
            symbol.memloc(),
            symbol.is_registered_argument(),
        );

        match class {
            SymbolClass::GLOBAL => {
                self.emitter
                    .emit_reg_addr("la", Register::V0, Address::symbol(node.name().unwrap()));
            }
            SymbolClass::LOCAL => {
                self.emitter
                    .emit_reg_reg_imm("addu", Register::V0, Register::FP, memloc);
            }
            SymbolClass::PARAMETER => {
                if registered {
                    self.emitter
                        .emit_reg_reg("move", Register::V0, Register::argument(memloc));
                } else {
                    self.emitter
                        .emit_reg_addr("lw", Register::V0, Address::indexed(memloc, Register::FP));
                }
            }
            SymbolClass::FUNCTION => {
                panic!("Malformed AST! Function name used as an array.")
            }
        }
    }

    /// Indexed array read: base and index meet through the shadow stack,
    /// the element address is `base + index * WORD_SIZE`.
    fn generate_subscript(&mut self, node: &TreeNode) {
        self.emitter.emit_comment("->subscript");
        self.generate_array_address(node);
        self.generate_push(Register::V0);
        self.generate_expression(node.child(0).unwrap());
        self.generate_pop(Register::T0);
        self.emitter
            .emit_reg_reg_imm("mul", Register::T1, Register::V0, WORD_SIZE);
        self.emitter
            .emit_reg_reg_reg("addu", Register::T0, Register::T0, Register::T1);
        self.emitter
            .emit_reg_addr("lw", Register::V0, Address::register(Register::T0));
        self.emitter.emit_comment("<-subscript");
    }

    /// Address of an assignable target into `$t0`. Registered parameters
    /// have no address and are handled by the assignment itself.
    fn generate_target_address(&mut self, node: &TreeNode) {
        let symbol = self.symbols.get(node.symbol.unwrap());
        let (class, memloc) = (symbol.class(), symbol.memloc());

        match node.kind {
            NodeKind::EXP(ExpKind::VAR) => match class {
                SymbolClass::GLOBAL => {
                    self.emitter
                        .emit_reg_addr("la", Register::T0, Address::symbol(node.name().unwrap()));
                }
                SymbolClass::LOCAL | SymbolClass::PARAMETER => {
                    self.emitter
                        .emit_reg_reg_imm("addu", Register::T0, Register::FP, memloc);
                }
                SymbolClass::FUNCTION => {
                    panic!("Malformed AST! Function name as assignment target.")
                }
            },
            NodeKind::EXP(ExpKind::ARR) => {
                self.generate_array_address(node);
                self.generate_push(Register::V0);
                self.generate_expression(node.child(0).unwrap());
                self.generate_pop(Register::T0);
                self.emitter
                    .emit_reg_reg_imm("mul", Register::T1, Register::V0, WORD_SIZE);
                self.emitter
                    .emit_reg_reg_reg("addu", Register::T0, Register::T0, Register::T1);
            }
            _ => panic!("Malformed AST! Node {:?} as assignment target.", node.kind),
        }
    }

    /// Assignment stores the right hand side and leaves it in `$v0` as the
    /// expression's value.
    fn generate_assignment(&mut self, node: &TreeNode) {
        self.emitter.emit_comment("->assign");
        let target = node.child(0).unwrap();
        let expression = node.child(1).unwrap();

        let target_symbol = self.symbols.get(target.symbol.unwrap());
        let registered_scalar = target.kind == NodeKind::EXP(ExpKind::VAR)
            && target_symbol.class() == SymbolClass::PARAMETER
            && target_symbol.is_registered_argument();
        let register_index = target_symbol.memloc();

        if registered_scalar {
            self.generate_expression(expression);
            self.emitter.emit_reg_reg(
                "move",
                Register::argument(register_index),
                Register::V0,
            );
        } else {
            self.generate_expression(expression);
            self.generate_push(Register::V0);
            self.generate_target_address(target);
            self.generate_pop(Register::T1);
            self.emitter
                .emit_reg_addr("sw", Register::T1, Address::register(Register::T0));
            self.emitter.emit_reg_reg("move", Register::V0, Register::T1);
        }
        self.emitter.emit_comment("<-assign");
    }

    fn generate_call(&mut self, node: &TreeNode) {
        match node.name() {
            Some("input") => self.generate_input_call(),
            Some("output") => self.generate_output_call(node),
            _ => self.generate_general_call(node),
        }
    }

    /// Generates code to print the null-terminated ascii string at a label.
    fn generate_string(&mut self, label: &str) {
        self.emitter.emit_reg_imm("li", Register::V0, 4);
        self.emitter
            .emit_reg_addr("la", Register::A0, Address::symbol(label));
        self.emitter.emit_code("syscall");
    }

    /// Builtin `input`: prompt, then read an integer into `$v0`.
    fn generate_input_call(&mut self) {
        self.emitter.emit_comment("->input call");
        self.generate_push(Register::A0);
        self.generate_string("_inputStr");
        self.emitter.emit_reg_imm("li", Register::V0, 5);
        self.emitter.emit_code("syscall");
        self.generate_pop(Register::A0);
        self.emitter.emit_comment("<-input call");
    }

    /// Builtin `output`: prompt, print the argument, newline. The caller's
    /// `$a0` is preserved around the print sequence.
    fn generate_output_call(&mut self, node: &TreeNode) {
        self.emitter.emit_comment("->output call");
        self.generate_push(Register::A0);
        self.generate_expression(node.child(0).unwrap());
        self.generate_push(Register::V0);
        self.generate_string("_outputStr");
        self.generate_pop(Register::A0);
        self.emitter.emit_reg_imm("li", Register::V0, 1);
        self.emitter.emit_code("syscall");
        self.generate_string("_newline");
        self.generate_pop(Register::A0);
        self.emitter.emit_comment("<-output call");
    }

    /// General calling sequence: save the live argument registers, reserve
    /// spill slots for the fifth and later arguments, evaluate arguments in
    /// order, load the first four into `$a0..$a3` and jump. The callee
    /// builds and tears down the rest of the frame.
    fn generate_general_call(&mut self, node: &TreeNode) {
        let name = node.name().unwrap();
        let comment = format!("->call {}", name);
        self.emitter.emit_comment(&comment);

        let arguments: Vec<&TreeNode> = match node.child(0) {
            Some(first) => first.siblings().collect(),
            None => Vec::new(),
        };
        let total = arguments.len() as i32;
        let registered = total.min(ARGUMENT_REGISTERS);
        let spilled = total - registered;

        let live = self.live_argument_registers;
        for index in 0..live {
            self.generate_push(Register::argument(index));
        }

        if spilled > 0 {
            self.emitter
                .emit_reg_reg_imm("subu", Register::SP, Register::SP, spilled * WORD_SIZE);
        }

        for (index, argument) in arguments.iter().copied().enumerate() {
            let comment = format!("call argument {}", index);
            self.emitter.emit_comment(&comment);
            self.generate_expression(argument);
            let index = index as i32;
            if index < ARGUMENT_REGISTERS {
                self.generate_push(Register::V0);
            } else {
                // Slot j sits just above the argument pushes: four words of
                // registered arguments plus the push displacement.
                let offset = registered * WORD_SIZE + WORD_SIZE + (index - ARGUMENT_REGISTERS) * WORD_SIZE;
                self.emitter
                    .emit_reg_addr("sw", Register::V0, Address::indexed(offset, Register::SP));
            }
        }

        for index in (0..registered).rev() {
            self.generate_pop(Register::argument(index));
        }

        self.emitter.emit_code(&format!("jal {}", name));

        if spilled > 0 {
            self.emitter
                .emit_reg_reg_imm("addu", Register::SP, Register::SP, spilled * WORD_SIZE);
        }
        for index in (0..live).rev() {
            self.generate_pop(Register::argument(index));
        }

        let comment = format!("<-call {}", name);
        self.emitter.emit_comment(&comment);
    }

    /// Push the register onto the shadow stack.
    fn generate_push(&mut self, reg: Register) {
        self.emitter
            .emit_reg_addr("sw", reg, Address::register(Register::SP));
        self.emitter
            .emit_reg_reg_imm("subu", Register::SP, Register::SP, WORD_SIZE);
    }

    /// Pop the top of the shadow stack into the register.
    fn generate_pop(&mut self, reg: Register) {
        self.emitter
            .emit_reg_reg_imm("addu", Register::SP, Register::SP, WORD_SIZE);
        self.emitter
            .emit_reg_addr("lw", reg, Address::register(Register::SP));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::listing::Listing;
    use crate::compiler::parser::{AstParser, PestCMinusParser};
    use crate::compiler::semantic_analyser::{CMinusSemanticAnalyser, SemanticAnalyser};

    fn generate(source: &str) -> String {
        let root = PestCMinusParser::default().parse(source).unwrap();
        let mut listing = Listing::new();
        let tree = CMinusSemanticAnalyser::default().analyse(root, &mut listing);
        assert!(!listing.had_error(), "listing: {}", listing);
        let generator = MipsCodeGenerator::default();
        generator.generate(tree).to_string()
    }

    #[test]
    fn test_minimal_program_emits_io_data_and_exit() {
        let code = generate("void main(void) { output(42); }");

        assert!(code.contains(".data"));
        assert!(code.contains("_inputStr:  .asciiz \"input: \""));
        assert!(code.contains("_outputStr: .asciiz \"output: \""));
        assert!(code.contains(".globl main"));
        assert!(code.contains("main:"));
        assert!(code.contains("li $v0, 42"));
        // Print-int then exit syscalls
        assert!(code.contains("li $v0, 1"));
        assert!(code.contains("li $v0, 10"));
        assert!(code.trim_end().ends_with("syscall"));
    }

    #[test]
    fn test_sections_alternate_without_duplicates() {
        let code = generate("int g; void main(void) { g = 1; }");
        // One .data block (IO strings + global g emitted together), one .text
        assert_eq!(code.matches(".data").count(), 1);
        assert_eq!(code.matches(".text").count(), 1);
        assert!(code.contains(".align 2"));
        assert!(code.contains("g: .space 4"));
    }

    #[test]
    fn test_global_array_reserves_length_words() {
        let code = generate("int buffer[10]; void main(void) { buffer[0] = 1; }");
        assert!(code.contains("buffer: .space 40"));
    }

    #[test]
    fn test_expression_emission_is_stack_neutral() {
        // Every shadow stack push has a matching pop, so a complete
        // expression leaves $sp where it found it.
        let code = generate("void main(void) { output((1+2)*3); }");
        assert!(code.matches("subu $sp, $sp, 4").count() > 0);
        assert_eq!(
            code.matches("subu $sp, $sp, 4").count(),
            code.matches("addu $sp, $sp, 4").count()
        );
    }

    #[test]
    fn test_operator_table() {
        let code = generate(
            "void main(void) { int a; a = 1; output(a+a); output(a-a); \
             output(a*a); output(a/a); output(a<a); output(a<=a); \
             output(a>a); output(a>=a); output(a==a); output(a!=a); }",
        );
        for opcode in ["add", "sub", "mul", "slt", "sle", "sgt", "sge", "seq", "sne"] {
            assert!(
                code.contains(&format!("{} $v0, $t0, $t1", opcode)),
                "missing {}",
                opcode
            );
        }
        // Division reads its quotient out of LO and restores it.
        assert!(code.contains("div $t0, $t1"));
        assert!(code.contains("mflo $v0"));
        assert!(code.contains("mtlo $t3"));
    }

    #[test]
    fn test_while_loop_shape() {
        let code = generate("void main(void) { int i; i = 0; while (i < 3) i = i + 1; }");
        // Condition label, exit branch, back branch, exit label in order.
        let cond = code.find("L1:").unwrap();
        let exit_branch = code.find("beqz $v0, L2").unwrap();
        let back_branch = code.find("b L1").unwrap();
        let exit = code.find("L2:").unwrap();
        assert!(cond < exit_branch && exit_branch < back_branch && back_branch < exit);
    }

    #[test]
    fn test_selection_with_else_branches() {
        let code = generate(
            "void main(void) { int x; x = input(); if (x) output(1); else output(2); }",
        );
        assert!(code.contains("beqz $v0, L2"));
        assert!(code.contains("b L1"));
        assert!(code.contains("L2:"));
        assert!(code.contains("L1:"));
    }

    #[test]
    fn test_non_main_function_prologue_and_epilogue() {
        let code = generate(
            "int half(int n) { return n / 2; }\n\
             void main(void) { output(half(8)); }",
        );
        assert!(code.contains("half:"));
        // No locals: prologue reserves the pad word, saves $ra and $fp and
        // anchors the frame.
        assert!(code.contains("subu $sp, $sp, 4"));
        assert!(code.contains("sw $ra, ($sp)"));
        assert!(code.contains("sw $fp, ($sp)"));
        assert!(code.contains("addu $fp, $sp, 16"));
        assert!(code.contains("subu $sp, $fp, 16"));
        assert!(code.contains("jr $ra"));
        // Registered parameter read straight from its argument register.
        assert!(code.contains("move $v0, $a0"));
        assert!(code.contains("jal half"));
    }

    #[test]
    fn test_frame_reservation_for_locals() {
        let code = generate(
            "int f(void) { int a; int b; a = 1; b = 2; return a + b; }\n\
             void main(void) { output(f()); }",
        );
        assert!(code.contains("subu $sp, $sp, 12"));
        assert!(code.contains("addu $fp, $sp, 24"));
        assert!(code.contains("subu $sp, $fp, 24"));
        assert!(code.contains("addu $sp, $sp, 12"));
    }

    #[test]
    fn test_call_preserves_live_argument_registers() {
        let code = generate(
            "int add(int a, int b) { return a + b; }\n\
             int apply(int x) { return add(x, 1); }\n\
             void main(void) { output(apply(4)); }",
        );
        // apply holds one live argument register across its call to add.
        assert!(code.contains("sw $a0, ($sp)"));
        assert!(code.contains("lw $a0, ($sp)"));
        // Two arguments popped into registers in reverse order.
        let a1 = code.find("lw $a1, ($sp)").unwrap();
        let a0 = code.rfind("lw $a0, ($sp)").unwrap();
        assert!(a1 < a0);
    }

    #[test]
    fn test_fifth_argument_spills_to_stack_slot() {
        let code = generate(
            "int pick(int a, int b, int c, int d, int e) { return e; }\n\
             void main(void) { output(pick(1, 2, 3, 4, 5)); }",
        );
        // One spill slot reserved and written above the argument pushes.
        assert!(code.contains("sw $v0, 20($sp)"));
        assert!(code.contains("jal pick"));
        // The callee reads the spilled argument from the frame base.
        assert!(code.contains("lw $v0, ($fp)") || code.contains("addu $t0, $fp, 0"));
    }

    #[test]
    fn test_array_parameter_passes_base_address() {
        let code = generate(
            "int first(int a[]) { return a[0]; }\n\
             void main(void) { int x[3]; x[0] = 9; output(first(x)); }",
        );
        // Caller takes the local array's address rather than loading it.
        assert!(code.contains("addu $v0, $fp, -12"));
        // Callee indexes off the passed base address in $a0.
        assert!(code.contains("move $v0, $a0"));
        assert!(code.contains("mul $t1, $v0, 4"));
    }

    #[test]
    fn test_global_variable_access_by_name() {
        let code = generate("int g; void main(void) { g = 3; output(g); }");
        assert!(code.contains("la $t0, g"));
        assert!(code.contains("lw $v0, g"));
    }

    #[test]
    fn test_comments_only_with_trace() {
        let source = "void main(void) { output(7); }";
        let plain = generate(source);
        assert!(!plain.contains("->output call"));

        let root = PestCMinusParser::default().parse(source).unwrap();
        let mut listing = Listing::new();
        let tree = CMinusSemanticAnalyser::default().analyse(root, &mut listing);
        let mut generator = MipsCodeGenerator::default();
        generator.set_trace(true);
        let decorated = generator.generate(tree).to_string();
        assert!(decorated.contains("# ->output call"));
        assert!(decorated.contains("# procedure for function 'main'"));
    }
}
