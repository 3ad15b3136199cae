mod args;
mod driver_error;

use args::Args;
use ccpipe::semantic_analysis::Severity;
use ccpipe::{analyze, generate, lex, parse};
use driver_error::{DriverError, Result};

use std::fs;
use std::process::exit;

fn tokenize(source: &str, args: &Args) -> Vec<ccpipe::lexer::Token> {
    let tokens = lex(source);
    if args.lex {
        for token in &tokens {
            println!(
                "{:>4}:{:<3} {:<13} {}",
                token.line,
                token.column,
                format!("{:?}", token.kind),
                token.value
            );
        }
        exit(0);
    }
    tokens
}

fn parse_tokens(tokens: &[ccpipe::lexer::Token], args: &Args) -> Result<ccpipe::ast::Program> {
    let parsed = parse(tokens);
    for error in &parsed.errors {
        eprintln!("{error}");
    }
    if args.parse {
        println!("{:#?}", parsed.program);
        exit(i32::from(!parsed.errors.is_empty()));
    }
    if !parsed.errors.is_empty() {
        return Err(DriverError::SyntaxErrors(parsed.errors.len()));
    }
    Ok(parsed.program)
}

fn analyze_program(
    program: &ccpipe::ast::Program,
    source: &str,
    args: &Args,
) -> Result<ccpipe::semantic_analysis::SymbolTable> {
    let analysis = analyze(program, source);
    for error in &analysis.errors {
        eprintln!("{error}");
    }
    let blocking = analysis
        .errors
        .iter()
        .filter(|e| e.severity() == Severity::Error)
        .count();
    if args.analyze {
        print!("{}", analysis.symbols);
        exit(i32::from(blocking > 0));
    }
    if blocking > 0 {
        return Err(DriverError::SemanticErrors(blocking));
    }
    Ok(analysis.symbols)
}

fn generate_code(
    program: &ccpipe::ast::Program,
    symbols: &ccpipe::semantic_analysis::SymbolTable,
    args: &Args,
) {
    let generated = generate(program, symbols);
    for error in &generated.errors {
        eprintln!("{error}");
    }

    if args.tac {
        println!("--- three-address code ---");
        print!("{}", generated.intermediate_code);
        println!("--- optimized ---");
        print!("{}", generated.optimized_code);
        exit(0);
    }

    println!("--- assembly ---");
    print!("{}", generated.assembly_code);
    println!("--- optimized assembly ---");
    print!("{}", generated.optimized_assembly_code);
    if args.codegen {
        println!("--- machine encoding (illustrative) ---");
        print!("{}", generated.machine_code);
    }

    let stats = &generated.statistics;
    println!("--- statistics ---");
    println!("instructions:           {}", stats.instruction_count);
    println!("optimized instructions: {}", stats.optimized_instruction_count);
    println!("temporaries:            {}", stats.temp_variables);
    println!("labels:                 {}", stats.labels);
    println!("optimization passes:    {}", stats.optimization_passes);
    if !stats.included_headers.is_empty() {
        println!("included headers:       {}", stats.included_headers.join(", "));
    }
}

fn run(args: &Args) -> Result<()> {
    let source = fs::read_to_string(&args.input).map_err(DriverError::from)?;

    let tokens = tokenize(&source, args);
    let program = parse_tokens(&tokens, args)?;
    let symbols = analyze_program(&program, &source, args)?;
    generate_code(&program, &symbols, args);

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    run(&args)?;
    Ok(())
}
