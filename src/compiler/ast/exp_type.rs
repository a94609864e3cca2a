/// Expression types of C-Minus. There are exactly two: every expression is
/// an integer and VOID exists only as a function return type and in the
/// degenerate parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum ExpType {
    VOID,
    INTEGER,
}

impl ExpType {
    /// Convert a type-specifier token to an expression type
    pub fn parse(type_specifier: &str) -> Option<ExpType> {
        Some(match type_specifier.trim() {
            "void" => Self::VOID,
            "int" => Self::INTEGER,
            _ => return None,
        })
    }

    pub const fn to_str(&self) -> &'static str {
        match self {
            ExpType::VOID => "void",
            ExpType::INTEGER => "int",
        }
    }
}
