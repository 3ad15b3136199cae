use std::env;
use std::path::PathBuf;
use std::process::exit;

#[derive(Default)]
pub struct Args {
    /// Stop after lexing and print the token stream.
    pub lex: bool,
    /// Stop after parsing and print the tree.
    pub parse: bool,
    /// Stop after semantic analysis and print the symbol table.
    pub analyze: bool,
    /// Stop after TAC emission and print both listings.
    pub tac: bool,
    /// Print the assembly listings and statistics (default).
    pub codegen: bool,
    pub input: PathBuf,
}

impl Args {
    pub fn parse() -> Self {
        let mut args = Self::default();
        let mut input_file = None;

        for arg in env::args().skip(1) {
            match arg.as_str() {
                "--lex" => args.lex = true,
                "--parse" => args.parse = true,
                "--analyze" => args.analyze = true,
                "--tac" => args.tac = true,
                "--codegen" => args.codegen = true,
                "-h" | "--help" => Self::usage(),
                _ => {
                    if input_file.is_some() {
                        Self::usage();
                    }
                    input_file = Some(PathBuf::from(arg));
                }
            }
        }
        args.input = input_file.unwrap_or_else(|| Self::usage());
        args
    }

    fn usage() -> ! {
        let cmd0 = env::args().next().unwrap_or_else(|| "driver".to_owned());
        print!(
            "C pipeline inspector\n\n\
             Usage: {cmd0} [OPTIONS] FILE\n\n\
             Options:\n\
             \x20 -h, --help       Show this message\n\
             \x20     --lex        Stop after lexing and print the tokens\n\
             \x20     --parse      Stop after parsing and print the tree\n\
             \x20     --analyze    Stop after analysis and print the symbol table\n\
             \x20     --tac        Stop after TAC emission and print both listings\n\
             \x20     --codegen    Print assembly, machine encoding and statistics\n"
        );
        exit(0)
    }
}
