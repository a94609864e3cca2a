use std::fmt;
use std::fmt::Write;

/// Listing collects everything the compiler reports about a translation
/// unit: scope/type/argument/semantic error lines and, when tracing is
/// enabled, the symbol table dumps. It also carries the error flag that
/// gates each subsequent pass; any reported error raises it and code
/// generation is suppressed for the whole run.
///
/// The listing is rendered through `Display`, so callers decide where it
/// ends up (stdout for the CLI, a string in tests).
pub struct Listing {
    out: String,
    error: bool,
}

impl Listing {
    pub fn new() -> Self {
        Listing {
            out: String::new(),
            error: false,
        }
    }

    /// True once any error has been reported.
    pub fn had_error(&self) -> bool {
        self.error
    }

    pub fn write_line(&mut self, line: &str) {
        writeln!(self.out, "{}", line).unwrap();
    }

    pub fn blank_line(&mut self) {
        self.out.push('\n');
    }

    pub fn syntax_error(&mut self, message: &str) {
        writeln!(self.out, "Syntax error: {}", message).unwrap();
        self.error = true;
    }

    pub fn scope_error(&mut self, lineno: i32, kind: &str, name: &str, message: &str) {
        writeln!(
            self.out,
            "Scope Error at line {}: {} {} {}",
            lineno, kind, name, message
        )
        .unwrap();
        self.error = true;
    }

    pub fn type_error(&mut self, lineno: i32, message: &str) {
        writeln!(self.out, "Type error at line {}: {}", lineno, message).unwrap();
        self.error = true;
    }

    pub fn argument_error(&mut self, function_name: &str, lineno: i32, message: &str) {
        writeln!(
            self.out,
            "Argument error for function {} at line {}: {}",
            function_name, lineno, message
        )
        .unwrap();
        self.error = true;
    }

    pub fn semantic_error(&mut self, lineno: i32, message: &str) {
        writeln!(self.out, "Semantic error at line {}: {}", lineno, message).unwrap();
        self.error = true;
    }
}

impl Default for Listing {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.out)
    }
}
