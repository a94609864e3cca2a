mod assembly_emitter;
mod mips_code_generator;

use super::ast::AbstractSyntaxTree;

// Abstract Definitions

/// BackEndGenerator takes an annotated AbstractSyntaxTree and generates a
/// textual assembly program for the target machine.
pub trait BackEndGenerator {
    /// Generate default generator configuration
    fn default() -> Self;

    /// Enable comment decorations in the generated assembly
    fn set_trace(&mut self, trace: bool);

    /// Generate assembly from an abstract syntax tree
    fn generate(self, tree: AbstractSyntaxTree) -> AssemblyCode;
}

// Concrete Definition Export
pub use self::assembly_emitter::{
    Address, AssemblyCode, AssemblyEmitter, Label, Register, Section,
};
pub use self::mips_code_generator::MipsCodeGenerator;
