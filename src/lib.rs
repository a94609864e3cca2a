// Internal Modules
mod compiler;

#[cfg(test)]
mod test;

pub use compiler::ast;
pub use compiler::{
    AssemblyCode, CMinusSemanticAnalyser, Compiler, Listing, MipsCodeGenerator, PestCMinusParser,
};
pub use compiler::backend::BackEndGenerator;
pub use compiler::parser::AstParser;
pub use compiler::semantic_analyser::SemanticAnalyser;
