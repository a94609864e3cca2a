use enum_assoc::Assoc;

/// Binary operators of the C-Minus expression grammar. Each operator is
/// associated with the SPIM mnemonic that computes it; comparison operators
/// map onto the set-on-condition pseudo instructions so that their result is
/// the usual zero/non-zero integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Assoc)]
#[func(pub const fn opcode(&self) -> &'static str)]
#[allow(non_camel_case_types)]
pub enum Operator {
    #[assoc(opcode = "add")]
    PLUS,           // <lhs> + <rhs>
    #[assoc(opcode = "sub")]
    MINUS,          // <lhs> - <rhs>
    #[assoc(opcode = "mul")]
    TIMES,          // <lhs> * <rhs>
    #[assoc(opcode = "div")]
    OVER,           // <lhs> / <rhs>

    #[assoc(opcode = "slt")]
    LESS_THAN,      // <lhs> <  <rhs>
    #[assoc(opcode = "sle")]
    LESS_EQUAL,     // <lhs> <= <rhs>
    #[assoc(opcode = "sgt")]
    GREATER_THAN,   // <lhs> >  <rhs>
    #[assoc(opcode = "sge")]
    GREATER_EQUAL,  // <lhs> >= <rhs>
    #[assoc(opcode = "seq")]
    EQUAL,          // <lhs> == <rhs>
    #[assoc(opcode = "sne")]
    NOT_EQUAL,      // <lhs> != <rhs>
}

impl Operator {
    /// Source form of the operator, used in trace comments.
    pub const fn token(&self) -> &'static str {
        match self {
            Operator::PLUS => "+",
            Operator::MINUS => "-",
            Operator::TIMES => "*",
            Operator::OVER => "/",
            Operator::LESS_THAN => "<",
            Operator::LESS_EQUAL => "<=",
            Operator::GREATER_THAN => ">",
            Operator::GREATER_EQUAL => ">=",
            Operator::EQUAL => "==",
            Operator::NOT_EQUAL => "!=",
        }
    }
}
