// Standard Imports
use clap::Parser;

use cminus_compiler::{
    CMinusSemanticAnalyser, Compiler, Listing, MipsCodeGenerator, PestCMinusParser,
};

// Basic Compiler Configuration
type PARSER = PestCMinusParser;
type ANALYSER = CMinusSemanticAnalyser;
type GENERATOR = MipsCodeGenerator;

/// Command Line interface struct
/// Describes possible arguments using the clap library
#[derive(Parser)]
struct CompilerCLIOptions {
    /// Path of file to compile. C-Minus source files end in .c
    #[clap(parse(from_os_str))]
    path: std::path::PathBuf,

    /// Path to output file, default is <basename>.tm in the current directory
    #[clap(short, long, parse(from_os_str))]
    output: Option<std::path::PathBuf>,

    // Flags

    /// Write the assembly to stdout instead of the output file
    #[clap(long, action)]
    stdout: bool,

    /// Generates code with comment decorations
    #[clap(long, action)]
    debug: bool,

    /// Print the symbol table of each scope to the listing as it closes
    #[clap(long, action)]
    trace: bool,
}

impl CompilerCLIOptions {
    /// Derives default values for empty arguments that cannot be set to
    /// constants. For instance output is derived from the input file path.
    /// @return: Returns CompilerCLIOptions with modified empty arguments
    fn derive_defaults(mut self) -> Self {
        // An input without an extension refers to a .c file
        if self.path.extension().is_none() {
            self.path.set_extension("c");
        }

        // Derive output file path from input file name if not set
        if self.output.is_none() {
            let stem = self.path.file_stem().unwrap_or_default();
            self.output = Some(std::path::PathBuf::from(stem).with_extension("tm"));
        }

        return self;
    }
}

fn main() {
    // Parse Command line arguments
    let cli_args = CompilerCLIOptions::parse().derive_defaults();

    let compiler: Compiler<PARSER, ANALYSER, GENERATOR> = Compiler::default()
        .set_trace_analysis(cli_args.trace)
        .set_trace_code(cli_args.debug);

    let mut listing = Listing::new();
    let result = compiler.compile(cli_args.path.as_path(), &mut listing);

    // The listing always goes to stdout, error lines included. Compile
    // errors do not fail the process; only IO failures do.
    print!("{}", listing);

    match result {
        Ok(Some(code)) => {
            if cli_args.stdout {
                print!("{}", code);
            } else {
                let dest_path = cli_args.output.unwrap(); // Can unwrap as output will always be derived
                if let Err(why) = std::fs::write(&dest_path, code.to_string()) {
                    eprintln!("Couldn't write to {}: {}", dest_path.display(), why);
                    std::process::exit(1);
                }
            }
            std::process::exit(exitcode::OK);
        }
        Ok(None) => {
            // Errors already reported through the listing
            std::process::exit(exitcode::OK);
        }
        Err(why) => {
            eprintln!("Couldn't read {}: {}", cli_args.path.display(), why);
            std::process::exit(1);
        }
    }
}
