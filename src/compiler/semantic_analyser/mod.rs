use super::ast::{AbstractSyntaxTree, TreeNode};
use super::listing::Listing;
pub mod cminus_semantic_analyser;

/// SemanticAnalyser consumes the parser's raw tree and produces the
/// annotated tree the back end generates from: every identifier-using node
/// gains its resolved symbol, every symbol its memory location, and the
/// whole program is type and argument checked. Errors are reported to the
/// listing, whose error flag gates code generation.
pub trait SemanticAnalyser {
    /// Creates a default configuration of a SemanticAnalyser
    fn default() -> Self;

    /// Enable symbol table dumps into the listing as scopes close
    fn set_trace(&mut self, trace: bool);

    /// Analyse a syntax tree into an annotated abstract syntax tree
    fn analyse(self, root: TreeNode, listing: &mut Listing) -> AbstractSyntaxTree;
}

// Concrete Definition Export
pub use self::cminus_semantic_analyser::CMinusSemanticAnalyser;
