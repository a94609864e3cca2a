mod exp_type;
mod operators;
pub mod symbol_table;
mod tree_node;

pub use self::exp_type::ExpType;
pub use self::operators::Operator;
pub use self::symbol_table::{Symbol, SymbolArena, SymbolClass, SymbolId, SymbolTable, WORD_SIZE};
pub use self::tree_node::{
    DeclKind, ExpKind, NodeAttr, NodeKind, ParamKind, SiblingIter, StmtKind, TreeNode,
};

/// Intermediate representation of the compiler model after semantic
/// analysis: the syntax tree with every identifier-using node annotated
/// with its resolved symbol, plus the arena those annotations point into.
pub struct AbstractSyntaxTree {
    root: TreeNode,
    symbols: SymbolArena,
}

impl AbstractSyntaxTree {
    pub fn new(root: TreeNode, symbols: SymbolArena) -> Self {
        Self { root, symbols }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        self.symbols.get(id)
    }

    /// Split the tree into its root and symbol arena.
    pub fn into_parts(self) -> (TreeNode, SymbolArena) {
        (self.root, self.symbols)
    }
}
