pub mod ast;
pub mod backend;
pub mod listing;
pub mod parser;
pub mod semantic_analyser;

use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

// Interface Definitions
use self::backend::BackEndGenerator;
use self::parser::AstParser;
use self::semantic_analyser::SemanticAnalyser;

// Concrete Definitions Re-Export
pub use self::backend::{AssemblyCode, MipsCodeGenerator};
pub use self::listing::Listing;
pub use self::parser::PestCMinusParser;
pub use self::semantic_analyser::CMinusSemanticAnalyser;

/// Compiler is a simple class that holds the configuration of a compilation
/// configuration. Compiler takes three typed parameters defining:
///  the AstParser being used,
///  the SemanticAnalyser being used,
///  and the BackEndGenerator being used.
///
/// # Compilation Diagram
/// cminus_code -> AstParser -> TreeNode -> SemanticAnalyser ->
/// Annotated AbstractSyntaxTree -> BackEndGenerator -> AssemblyCode
///
/// The listing passed through the compile methods collects every analyser
/// diagnostic; when its error flag is raised code emission is suppressed
/// and the compile methods return no assembly.
pub struct Compiler<P: AstParser, A: SemanticAnalyser, G: BackEndGenerator> {
    parser: P,
    semantic_analyser: A,
    generator: G,
}

#[allow(dead_code)] // Many of the functions on compiler act as a library interface and are not used
impl<P: AstParser, A: SemanticAnalyser, G: BackEndGenerator> Compiler<P, A, G> {
    /// Default generates a default compiler configuration. Default
    /// configuration is determined by the default methods of the parser,
    /// analyser and generator.
    pub fn default() -> Self {
        Compiler {
            parser: P::default(),
            semantic_analyser: A::default(),
            generator: G::default(),
        }
    }

    /// Create new compiler using preconfigured components.
    pub fn new(parser: P, semantic_analyser: A, generator: G) -> Self {
        Compiler {
            parser,
            semantic_analyser,
            generator,
        }
    }

    /// Enable symbol table dumps in the listing.
    pub fn set_trace_analysis(mut self, trace: bool) -> Self {
        self.semantic_analyser.set_trace(trace);
        return self;
    }

    /// Enable comment decorations in the generated assembly.
    pub fn set_trace_code(mut self, trace: bool) -> Self {
        self.generator.set_trace(trace);
        return self;
    }

    /// Compiles a source string into assembly. Returns None when a compile
    /// error was reported; the listing then holds the diagnostics.
    pub fn compile_str(self, source: &str, listing: &mut Listing) -> Option<AssemblyCode> {
        let root = match self.parser.parse(source) {
            Ok(root) => root,
            Err(error) => {
                listing.syntax_error(&error.to_string());
                return None;
            }
        };

        let tree = self.semantic_analyser.analyse(root, listing);
        if listing.had_error() {
            return None;
        }

        Some(self.generator.generate(tree))
    }

    /// Compiles a program file into assembly.
    /// @return: assembly if the program compiled, otherwise None. An IO
    /// error from a failed read is passed through.
    pub fn compile(
        self,
        source_filename: &Path,
        listing: &mut Listing,
    ) -> Result<Option<AssemblyCode>, Box<dyn Error>> {
        let source_str = fs::read_to_string(source_filename)?;

        Ok(self.compile_str(source_str.as_str(), listing))
    }

    /// Compiles a program file and writes the assembly into the destination
    /// file path.
    /// @return: true when assembly was written, false when compile errors
    /// suppressed it. IO errors from a failed read/write are passed through.
    pub fn compile_and_save(
        self,
        source_filename: &Path,
        dest_filename: &Path,
        listing: &mut Listing,
    ) -> Result<bool, Box<dyn Error>> {
        let compiled_program = match self.compile(source_filename, listing)? {
            Some(code) => code,
            None => return Ok(false),
        };

        let program_str = format!("{}", compiled_program);
        let mut file = File::create(dest_filename)?;
        file.write_all(program_str.as_bytes())?;

        Ok(true)
    }
}
