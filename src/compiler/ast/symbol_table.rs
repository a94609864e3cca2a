use std::fmt::Write;

use super::exp_type::ExpType;
use super::tree_node::{DeclKind, ExpKind, NodeKind, ParamKind, TreeNode};
use crate::compiler::listing::Listing;

/// Machine word size of the SPIM target in bytes.
pub const WORD_SIZE: i32 = 4;

/// Number of buckets in each per-scope hash table.
const HASHTABLE_SIZE: usize = 211;
const HASH_SHIFT: u32 = 4;

/// The first four parameters of a function travel in `$a0..$a3`.
pub const ARGUMENT_REGISTERS: i32 = 4;

/// Handle into the symbol arena. Tree nodes store these instead of
/// references so that symbols can outlive the scope tables they were
/// declared in without any back edges into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum SymbolClass {
    GLOBAL,
    LOCAL,
    PARAMETER,
    FUNCTION,
}

impl SymbolClass {
    /// Class column of the symbol table dump. Globals and locals both read
    /// as plain variables there.
    const fn to_str(&self) -> &'static str {
        match self {
            SymbolClass::GLOBAL | SymbolClass::LOCAL => "Variable",
            SymbolClass::PARAMETER => "Parameter",
            SymbolClass::FUNCTION => "Function",
        }
    }
}

/// The resolved entity behind a name: one record per declaration.
///
/// `memloc` is overloaded by class: globals address by name and leave it 0,
/// locals hold their negative frame offset, stacked parameters their
/// positive frame offset, registered parameters their argument register
/// index, and functions the most negative local offset their body reached
/// (the negated frame size).
#[derive(Debug, Clone)]
pub struct Symbol {
    name: String,
    class: SymbolClass,
    exp_type: ExpType,
    is_array: bool,
    size: i32,
    memloc: i32,
    is_registered_argument: bool,
    lines: Vec<i32>,
    param_kinds: Vec<ParamKind>,
}

impl Symbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> SymbolClass {
        self.class
    }

    pub fn exp_type(&self) -> ExpType {
        self.exp_type
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Element count for arrays, parameter count for functions.
    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn memloc(&self) -> i32 {
        self.memloc
    }

    pub fn is_registered_argument(&self) -> bool {
        self.is_registered_argument
    }

    pub fn lines(&self) -> &[i32] {
        &self.lines
    }

    /// Parameter kinds of a function symbol in declaration order. A sole
    /// VOID_PARAM entry denotes an empty parameter list.
    pub fn param_kinds(&self) -> &[ParamKind] {
        &self.param_kinds
    }

    /// Frame size in bytes of a function symbol.
    pub fn frame_size(&self) -> i32 {
        -self.memloc
    }
}

/// Owns every symbol created during a compilation. Scope tables are freed
/// as scopes close but their symbols stay here, referenced from the tree.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(symbol);
        id
    }
}

/// One lexical scope: an open hash table of 211 chained buckets plus the
/// running memory offset cursor for the frame slots handed out within it.
struct SymbolScope {
    depth: usize,
    buckets: Vec<Vec<SymbolId>>,
    location: i32,
}

impl SymbolScope {
    fn new(depth: usize, location: i32) -> Self {
        SymbolScope {
            depth,
            buckets: vec![Vec::new(); HASHTABLE_SIZE],
            location,
        }
    }

    fn find(&self, arena: &SymbolArena, name: &str) -> Option<SymbolId> {
        self.buckets[hash(name)]
            .iter()
            .copied()
            .find(|&id| arena.get(id).name() == name)
    }

    fn insert(&mut self, name: &str, id: SymbolId) {
        self.buckets[hash(name)].push(id);
    }
}

fn hash(key: &str) -> usize {
    let mut temp: usize = 0;
    for byte in key.bytes() {
        temp = ((temp << HASH_SHIFT) + byte as usize) % HASHTABLE_SIZE;
    }
    temp
}

/// Scope-stacked symbol table. Index 0 of the stack is the global scope;
/// lookup walks from the innermost scope outwards and returns the first
/// match, so inner declarations shadow outer ones.
pub struct SymbolTable {
    arena: SymbolArena,
    scopes: Vec<SymbolScope>,
}

impl SymbolTable {
    /// Creates the global scope and seeds it with the two builtin
    /// functions `int input(void)` and `void output(int num)`.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            arena: SymbolArena::default(),
            scopes: vec![SymbolScope::new(0, 0)],
        };

        let input = table.arena.alloc(Symbol {
            name: String::from("input"),
            class: SymbolClass::FUNCTION,
            exp_type: ExpType::INTEGER,
            is_array: false,
            size: 0,
            memloc: 0,
            is_registered_argument: false,
            lines: vec![-1],
            param_kinds: vec![ParamKind::VOID_PARAM],
        });
        table.scopes[0].insert("input", input);

        let output = table.arena.alloc(Symbol {
            name: String::from("output"),
            class: SymbolClass::FUNCTION,
            exp_type: ExpType::VOID,
            is_array: false,
            size: 1,
            memloc: 0,
            is_registered_argument: false,
            lines: vec![-1],
            param_kinds: vec![ParamKind::VAR_PARAM],
        });
        table.scopes[0].insert("output", output);

        table
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        self.arena.get(id)
    }

    /// True iff the innermost open scope is the global scope.
    pub fn is_global(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Push a new scope. The memory cursor is inherited from the parent so
    /// nested compound blocks continue allocating below their enclosing
    /// block; function scopes overwrite it through `set_offset_cursor`.
    pub fn enter_scope(&mut self) {
        let depth = self.scopes.len();
        let location = self.scopes.last().unwrap().location;
        self.scopes.push(SymbolScope::new(depth, location));
    }

    /// Pop and discard the innermost scope table. Symbols registered in it
    /// stay alive in the arena.
    pub fn leave_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn set_offset_cursor(&mut self, location: i32) {
        self.scopes.last_mut().unwrap().location = location;
    }

    pub fn offset_cursor(&self) -> i32 {
        self.scopes.last().unwrap().location
    }

    /// Inserts a new symbol for a declaration node into the innermost
    /// scope, assigns its memory location per the layout contract and
    /// annotates the node. Redeclaration within the same scope is a scope
    /// error and leaves the table unchanged.
    pub fn register(
        &mut self,
        node: &mut TreeNode,
        class: SymbolClass,
        is_array: bool,
        exp_type: ExpType,
        listing: &mut Listing,
    ) -> Option<SymbolId> {
        let name = match node.name() {
            Some(name) => String::from(name),
            None => return None,
        };

        if self.scopes.last().unwrap().find(&self.arena, &name).is_some() {
            listing.scope_error(node.lineno, declared_kind(node), &name, "already declared.");
            return None;
        }

        let mut memloc = 0;
        let mut size = 0;
        let mut is_registered_argument = false;
        let mut param_kinds = Vec::new();

        match class {
            SymbolClass::PARAMETER => {
                let index = self.offset_cursor() / WORD_SIZE;
                if index < ARGUMENT_REGISTERS {
                    memloc = index;
                    is_registered_argument = true;
                } else {
                    memloc = (index - ARGUMENT_REGISTERS) * WORD_SIZE;
                }
                self.set_offset_cursor((index + 1) * WORD_SIZE);
            }
            SymbolClass::GLOBAL => {
                if is_array {
                    size = node.child(1).and_then(|c| c.value()).unwrap_or(0);
                }
            }
            SymbolClass::LOCAL => {
                let cursor = self.offset_cursor();
                if is_array {
                    size = node.child(1).and_then(|c| c.value()).unwrap_or(0);
                    memloc = cursor - (size - 1) * WORD_SIZE;
                    self.set_offset_cursor(cursor - size * WORD_SIZE);
                } else {
                    memloc = cursor;
                    self.set_offset_cursor(cursor - WORD_SIZE);
                }
            }
            SymbolClass::FUNCTION => {
                param_kinds = node
                    .child(1)
                    .map(|p| p.siblings().filter_map(param_kind).collect())
                    .unwrap_or_default();
                size = param_kinds
                    .iter()
                    .filter(|&&kind| kind != ParamKind::VOID_PARAM)
                    .count() as i32;
            }
        }

        let id = self.arena.alloc(Symbol {
            name,
            class,
            exp_type,
            is_array,
            size,
            memloc,
            is_registered_argument,
            lines: vec![node.lineno],
            param_kinds,
        });
        self.scopes.last_mut().unwrap().insert(self.arena.get(id).name(), id);

        node.symbol = Some(id);
        node.exp_type = exp_type;
        Some(id)
    }

    /// Searches from the innermost scope down to the global scope,
    /// records the referencing line on a hit and annotates the node.
    /// A miss reports `used without declaration`.
    pub fn lookup(&mut self, node: &mut TreeNode, listing: &mut Listing) -> Option<SymbolId> {
        let name = node.name()?;

        for scope in self.scopes.iter().rev() {
            if let Some(id) = scope.find(&self.arena, name) {
                let symbol = self.arena.get_mut(id);
                if !symbol.lines.contains(&node.lineno) {
                    symbol.lines.push(node.lineno);
                }
                node.symbol = Some(id);
                return Some(id);
            }
        }

        listing.scope_error(
            node.lineno,
            referenced_kind(node),
            node.name().unwrap_or(""),
            "used without declaration",
        );
        None
    }

    /// Stores the frame bookkeeping result on a function symbol once its
    /// body has been walked.
    pub fn set_function_memloc(&mut self, id: SymbolId, memloc: i32) {
        self.arena.get_mut(id).memloc = memloc;
    }

    /// Writes a formatted dump of the innermost scope's table into the
    /// listing.
    pub fn print(&self, listing: &mut Listing) {
        listing.write_line(
            "Symbol Name  Scope  Offset  Stack  Class     Array  Param.  Type  Line Numbers",
        );
        listing.write_line(
            "------------------------------------------------------------------------------",
        );

        let scope = self.scopes.last().unwrap();
        for chain in &scope.buckets {
            for &id in chain {
                let symbol = self.arena.get(id);
                let mut line = String::new();

                write!(line, "{:<12} ", symbol.name).unwrap();
                write!(line, "{:>5}  ", scope.depth).unwrap();
                if self.is_global() {
                    write!(line, "{:>6}  ", '-').unwrap();
                } else if symbol.is_registered_argument {
                    write!(line, "$a{}     ", symbol.memloc).unwrap();
                } else {
                    write!(line, "{:>6}  ", symbol.memloc).unwrap();
                }
                if symbol.class == SymbolClass::FUNCTION {
                    write!(line, "{:>5}  ", symbol.memloc).unwrap();
                } else {
                    write!(line, "{:>5}  ", '-').unwrap();
                }
                write!(line, "{:<9} ", symbol.class.to_str()).unwrap();
                if symbol.is_array {
                    write!(line, "{:>5}  ", symbol.size).unwrap();
                } else {
                    write!(line, "{:>5}  ", '-').unwrap();
                }
                if symbol.class == SymbolClass::FUNCTION {
                    write!(line, "{:>6}  ", symbol.size).unwrap();
                } else {
                    write!(line, "{:>6}  ", '-').unwrap();
                }
                write!(line, "{:<5} ", symbol.exp_type.to_str()).unwrap();
                for lineno in &symbol.lines {
                    write!(line, "{:>4} ", lineno).unwrap();
                }

                listing.write_line(&line);
            }
        }
        listing.blank_line();
    }

    /// Consumes the table, keeping only the arena for the later passes.
    pub fn into_arena(self) -> SymbolArena {
        self.arena
    }
}

fn param_kind(node: &TreeNode) -> Option<ParamKind> {
    match node.kind {
        NodeKind::PARAM(kind) => Some(kind),
        _ => None,
    }
}

/// Kind column of a scope error for a declaring node.
fn declared_kind(node: &TreeNode) -> &'static str {
    match node.kind {
        NodeKind::DECL(DeclKind::VAR_DECL) => "Variable",
        NodeKind::DECL(DeclKind::ARR_DECL) => "Array",
        NodeKind::DECL(DeclKind::FUN_DECL) => "Function",
        NodeKind::PARAM(ParamKind::VAR_PARAM) => "Variable Parameter",
        NodeKind::PARAM(ParamKind::ARR_PARAM) => "Array Parameter",
        _ => "",
    }
}

/// Kind column of a scope error for a referencing node.
fn referenced_kind(node: &TreeNode) -> &'static str {
    match node.kind {
        NodeKind::EXP(ExpKind::VAR) => "Variable",
        NodeKind::EXP(ExpKind::ARR) => "Array",
        NodeKind::EXP(ExpKind::CALL) => "Function",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::tree_node::{DeclKind, ExpKind, NodeAttr, TreeNode};

    fn var_decl(name: &str, lineno: i32) -> TreeNode {
        let mut node = TreeNode::decl(DeclKind::VAR_DECL, lineno);
        node.attr = NodeAttr::NAME(String::from(name));
        node.children[0] = Some(Box::new(TreeNode::type_node(ExpType::INTEGER, lineno)));
        node
    }

    fn var_ref(name: &str, lineno: i32) -> TreeNode {
        let mut node = TreeNode::exp(ExpKind::VAR, lineno);
        node.attr = NodeAttr::NAME(String::from(name));
        node
    }

    #[test]
    fn test_builtins_are_seeded() {
        let mut table = SymbolTable::new();
        let mut listing = Listing::new();

        let mut call = TreeNode::exp(ExpKind::CALL, 2);
        call.attr = NodeAttr::NAME(String::from("input"));
        let id = table.lookup(&mut call, &mut listing).unwrap();
        assert_eq!(table.symbol(id).class(), SymbolClass::FUNCTION);
        assert_eq!(table.symbol(id).exp_type(), ExpType::INTEGER);
        assert_eq!(table.symbol(id).size(), 0);

        let mut call = TreeNode::exp(ExpKind::CALL, 3);
        call.attr = NodeAttr::NAME(String::from("output"));
        let id = table.lookup(&mut call, &mut listing).unwrap();
        assert_eq!(table.symbol(id).exp_type(), ExpType::VOID);
        assert_eq!(table.symbol(id).size(), 1);
        assert!(!listing.had_error());
    }

    #[test]
    fn test_duplicate_declaration_is_a_scope_error() {
        let mut table = SymbolTable::new();
        let mut listing = Listing::new();

        let mut first = var_decl("x", 1);
        let mut second = var_decl("x", 2);
        assert!(table
            .register(&mut first, SymbolClass::GLOBAL, false, ExpType::INTEGER, &mut listing)
            .is_some());
        assert!(table
            .register(&mut second, SymbolClass::GLOBAL, false, ExpType::INTEGER, &mut listing)
            .is_none());
        assert!(listing.had_error());
        assert!(listing.to_string().contains("already declared."));
    }

    #[test]
    fn test_lookup_resolves_innermost_shadowing_declaration() {
        let mut table = SymbolTable::new();
        let mut listing = Listing::new();

        let mut outer = var_decl("x", 1);
        table
            .register(&mut outer, SymbolClass::GLOBAL, false, ExpType::INTEGER, &mut listing)
            .unwrap();

        table.enter_scope();
        table.set_offset_cursor(-WORD_SIZE);
        let mut inner = var_decl("x", 3);
        let inner_id = table
            .register(&mut inner, SymbolClass::LOCAL, false, ExpType::INTEGER, &mut listing)
            .unwrap();

        let mut reference = var_ref("x", 4);
        assert_eq!(table.lookup(&mut reference, &mut listing), Some(inner_id));

        table.leave_scope();
        let mut reference = var_ref("x", 6);
        assert_eq!(table.lookup(&mut reference, &mut listing), outer.symbol);
        assert!(!listing.had_error());
    }

    #[test]
    fn test_lookup_miss_reports_scope_error() {
        let mut table = SymbolTable::new();
        let mut listing = Listing::new();

        let mut reference = var_ref("y", 5);
        assert!(table.lookup(&mut reference, &mut listing).is_none());
        assert!(listing.had_error());
        assert!(listing
            .to_string()
            .contains("Scope Error at line 5: Variable y used without declaration"));
    }

    #[test]
    fn test_parameter_offsets_split_registers_and_stack() {
        let mut table = SymbolTable::new();
        let mut listing = Listing::new();

        table.enter_scope();
        table.set_offset_cursor(0);
        for (i, name) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            let mut param = TreeNode::param(ParamKind::VAR_PARAM, 1);
            param.attr = NodeAttr::NAME(String::from(*name));
            param.children[0] = Some(Box::new(TreeNode::type_node(ExpType::INTEGER, 1)));
            let id = table
                .register(&mut param, SymbolClass::PARAMETER, false, ExpType::INTEGER, &mut listing)
                .unwrap();

            let symbol = table.symbol(id);
            if i < 4 {
                assert!(symbol.is_registered_argument());
                assert_eq!(symbol.memloc(), i as i32);
            } else {
                assert!(!symbol.is_registered_argument());
                assert_eq!(symbol.memloc(), (i as i32 - 4) * WORD_SIZE);
            }
        }
    }

    #[test]
    fn test_local_array_allocation_descends_by_length() {
        let mut table = SymbolTable::new();
        let mut listing = Listing::new();

        table.enter_scope();
        table.set_offset_cursor(-WORD_SIZE);

        let mut array = TreeNode::decl(DeclKind::ARR_DECL, 2);
        array.attr = NodeAttr::NAME(String::from("x"));
        array.children[0] = Some(Box::new(TreeNode::type_node(ExpType::INTEGER, 2)));
        let mut len = TreeNode::exp(ExpKind::CONST, 2);
        len.attr = NodeAttr::VALUE(5);
        array.children[1] = Some(Box::new(len));

        let id = table
            .register(&mut array, SymbolClass::LOCAL, true, ExpType::INTEGER, &mut listing)
            .unwrap();
        // Five words below the frame pointer, base at the lowest address.
        assert_eq!(table.symbol(id).memloc(), -20);
        assert_eq!(table.symbol(id).size(), 5);
        assert_eq!(table.offset_cursor(), -24);
    }
}
