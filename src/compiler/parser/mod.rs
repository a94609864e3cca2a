use simple_error::SimpleError;

use super::ast::TreeNode;
pub mod pest_cminus_parser;

/// Parser handles interpretation of source text into the intermediate
/// representation. Put another way the parser turns a C-Minus source string
/// into an abstract syntax tree.
pub trait AstParser {
    /// Creates a default configuration of an AstParser
    fn default() -> Self;

    /// Parse a source string into an abstract syntax tree. The returned
    /// node heads the sibling chain of top level declarations.
    fn parse(self, source: &str) -> Result<TreeNode, SimpleError>;
}

// Concrete Definition Export
pub use self::pest_cminus_parser::PestCMinusParser;
