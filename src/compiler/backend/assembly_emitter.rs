use std::fmt;

use strum_macros::Display;

/// Registers of the SPIM target the generator works with. `$v0` is the
/// designated expression result register, `$t0..$t3` are scratch,
/// `$a0..$a3` carry the first four arguments of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[allow(non_camel_case_types)]
pub enum Register {
    #[strum(serialize = "$v0")]
    V0,
    #[strum(serialize = "$t0")]
    T0,
    #[strum(serialize = "$t1")]
    T1,
    #[strum(serialize = "$t2")]
    T2,
    #[strum(serialize = "$t3")]
    T3,
    #[strum(serialize = "$a0")]
    A0,
    #[strum(serialize = "$a1")]
    A1,
    #[strum(serialize = "$a2")]
    A2,
    #[strum(serialize = "$a3")]
    A3,
    #[strum(serialize = "$fp")]
    FP,
    #[strum(serialize = "$sp")]
    SP,
    #[strum(serialize = "$ra")]
    RA,
}

impl Register {
    /// The argument register with the given index.
    pub fn argument(index: i32) -> Register {
        match index {
            0 => Register::A0,
            1 => Register::A1,
            2 => Register::A2,
            3 => Register::A3,
            _ => panic!("No argument register with index {}", index),
        }
    }
}

/// Internal branch label, rendered `L<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(u64);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Memory operand of a load or store. Renders as one of
/// `(reg)`, `imm`, `imm(reg)`, `symbol`, `symbol+imm`, `symbol+imm(reg)`
/// depending on which parts are present; a zero immediate counts as absent.
#[derive(Debug, Clone)]
pub struct Address {
    symbol: Option<String>,
    imm: i32,
    reg: Option<Register>,
}

impl Address {
    /// `(reg)`
    pub fn register(reg: Register) -> Self {
        Address {
            symbol: None,
            imm: 0,
            reg: Some(reg),
        }
    }

    /// `imm(reg)`, or `(reg)` when the offset is zero
    pub fn indexed(imm: i32, reg: Register) -> Self {
        Address {
            symbol: None,
            imm,
            reg: Some(reg),
        }
    }

    /// `symbol`
    pub fn symbol(name: &str) -> Self {
        Address {
            symbol: Some(String::from(name)),
            imm: 0,
            reg: None,
        }
    }

    /// `symbol+imm`
    pub fn symbol_offset(name: &str, imm: i32) -> Self {
        Address {
            symbol: Some(String::from(name)),
            imm,
            reg: None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.symbol, self.imm, &self.reg) {
            (None, 0, Some(reg)) => write!(f, "({})", reg),
            (None, imm, None) => write!(f, "{}", imm),
            (None, imm, Some(reg)) => write!(f, "{}({})", imm, reg),
            (Some(symbol), 0, None) => write!(f, "{}", symbol),
            (Some(symbol), imm, None) => write!(f, "{}+{}", symbol, imm),
            (Some(symbol), imm, Some(reg)) => write!(f, "{}+{}({})", symbol, imm, reg),
        }
    }
}

/// Assembler sections the emitter can sit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Section {
    DATA,
    TEXT,
}

/// One emitted line. Comments are stored separately so rendering can leave
/// them out unless tracing was requested.
enum AssemblyItem {
    Comment(String),
    Line(String),
}

/// The finished textual assembly program. Rendered through `Display`; the
/// `.tm` file is exactly this rendering.
pub struct AssemblyCode {
    items: Vec<AssemblyItem>,
    render_comments: bool,
}

impl AssemblyCode {
    /// Replaces self with a version that renders comment decorations.
    pub fn decorated(mut self) -> Self {
        self.render_comments = true;
        self
    }
}

impl fmt::Display for AssemblyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            match item {
                AssemblyItem::Comment(comment) => {
                    if self.render_comments {
                        writeln!(f, "# {}", comment)?;
                    }
                }
                AssemblyItem::Line(line) => {
                    writeln!(f, "{}", line)?;
                }
            }
        }
        Ok(())
    }
}

/// AssemblyEmitter is a builder for AssemblyCode. It exposes one strongly
/// typed method per instruction shape so the generator never formats
/// operands by hand, keeps the `.data`/`.text` mode latch so section
/// directives are only emitted on transitions, and allocates the unique
/// `L<n>` branch labels.
pub struct AssemblyEmitter {
    items: Vec<AssemblyItem>,
    label_count: u64,
    section: Option<Section>,
}

impl AssemblyEmitter {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            label_count: 0,
            section: None,
        }
    }

    fn push_line(&mut self, line: String) {
        self.items.push(AssemblyItem::Line(line));
    }

    /// Comment decorates the output; it is only rendered when the code is
    /// finalized as decorated.
    pub fn emit_comment(&mut self, comment: &str) {
        self.items.push(AssemblyItem::Comment(String::from(comment)));
    }

    /// Emit a raw mnemonic or directive line.
    pub fn emit_code(&mut self, code: &str) {
        self.push_line(String::from(code));
    }

    pub fn emit_blank(&mut self) {
        self.push_line(String::new());
    }

    pub fn emit_reg(&mut self, op: &str, reg: Register) {
        self.push_line(format!("{} {}", op, reg));
    }

    pub fn emit_reg_reg(&mut self, op: &str, reg1: Register, reg2: Register) {
        self.push_line(format!("{} {}, {}", op, reg1, reg2));
    }

    pub fn emit_reg_reg_reg(&mut self, op: &str, reg1: Register, reg2: Register, reg3: Register) {
        self.push_line(format!("{} {}, {}, {}", op, reg1, reg2, reg3));
    }

    pub fn emit_reg_imm(&mut self, op: &str, reg: Register, imm: i32) {
        self.push_line(format!("{} {}, {}", op, reg, imm));
    }

    pub fn emit_reg_reg_imm(&mut self, op: &str, reg1: Register, reg2: Register, imm: i32) {
        self.push_line(format!("{} {}, {}, {}", op, reg1, reg2, imm));
    }

    pub fn emit_reg_addr(&mut self, op: &str, reg: Register, addr: Address) {
        self.push_line(format!("{} {}, {}", op, reg, addr));
    }

    pub fn emit_label(&mut self, op: &str, label: Label) {
        self.push_line(format!("{} {}", op, label));
    }

    pub fn emit_reg_label(&mut self, op: &str, reg: Register, label: Label) {
        self.push_line(format!("{} {}, {}", op, reg, label));
    }

    /// `L<n>:`
    pub fn emit_label_decl(&mut self, label: Label) {
        self.push_line(format!("{}:", label));
    }

    /// `name:`
    pub fn emit_symbol_decl(&mut self, name: &str) {
        self.push_line(format!("{}:", name));
    }

    /// Allocates a fresh unique branch label.
    pub fn create_label(&mut self) -> Label {
        let label = Label(self.label_count);
        self.label_count += 1;
        label
    }

    /// Switches the assembler section, emitting the directive only when the
    /// section actually changes.
    pub fn section(&mut self, section: Section) {
        if self.section != Some(section) {
            self.section = Some(section);
            match section {
                Section::DATA => self.emit_code(".data"),
                Section::TEXT => self.emit_code(".text"),
            }
        }
    }

    /// Resolves the emitter into AssemblyCode, consuming self.
    pub fn finalize(self) -> AssemblyCode {
        AssemblyCode {
            items: self.items,
            render_comments: false,
        }
    }
}

impl Default for AssemblyEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addressing_operand_formats() {
        assert_eq!(Address::register(Register::SP).to_string(), "($sp)");
        assert_eq!(Address::indexed(0, Register::SP).to_string(), "($sp)");
        assert_eq!(Address::indexed(-8, Register::FP).to_string(), "-8($fp)");
        assert_eq!(Address::symbol("x").to_string(), "x");
        assert_eq!(Address::symbol_offset("x", 8).to_string(), "x+8");
        assert_eq!(
            Address {
                symbol: Some(String::from("x")),
                imm: 4,
                reg: Some(Register::T0),
            }
            .to_string(),
            "x+4($t0)"
        );
    }

    #[test]
    fn test_section_latch_only_emits_on_transition() {
        let mut emitter = AssemblyEmitter::new();
        emitter.section(Section::DATA);
        emitter.emit_code("x: .space 4");
        emitter.section(Section::DATA);
        emitter.emit_code("y: .space 4");
        emitter.section(Section::TEXT);
        emitter.section(Section::TEXT);
        emitter.emit_code("syscall");

        let text = emitter.finalize().to_string();
        assert_eq!(text.matches(".data").count(), 1);
        assert_eq!(text.matches(".text").count(), 1);
    }

    #[test]
    fn test_labels_are_unique_and_formatted() {
        let mut emitter = AssemblyEmitter::new();
        let first = emitter.create_label();
        let second = emitter.create_label();
        assert_ne!(first, second);

        emitter.emit_reg_label("beqz", Register::T0, first);
        emitter.emit_label("b", second);
        emitter.emit_label_decl(first);

        let text = emitter.finalize().to_string();
        assert!(text.contains("beqz $t0, L0"));
        assert!(text.contains("b L1"));
        assert!(text.contains("L0:"));
    }

    #[test]
    fn test_comments_suppressed_unless_decorated() {
        let mut emitter = AssemblyEmitter::new();
        emitter.emit_comment("->selection");
        emitter.emit_reg_imm("li", Register::V0, 10);
        let plain = emitter.finalize().to_string();
        assert!(!plain.contains("->selection"));
        assert!(plain.contains("li $v0, 10"));

        let mut emitter = AssemblyEmitter::new();
        emitter.emit_comment("->selection");
        emitter.emit_reg_imm("li", Register::V0, 10);
        let decorated = emitter.finalize().decorated().to_string();
        assert!(decorated.contains("# ->selection"));
    }
}
