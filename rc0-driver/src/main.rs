//! rc0 compiler driver
//!
//! Runs the pipeline over one source file: lex, parse, analyze, and on
//! request CFG formation, SSA emission and execution on the toy VM.
//! Diagnostics print one per line as `file:line:col: message`.

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use log::debug;
use rc0_frontend::ast::NodeKind;
use rc0_frontend::Frontend;
use rc0_ir::{form_cfg, Ssa, Vm};
use std::fs;
use std::path::PathBuf;

#[derive(ClapParser, Debug)]
#[command(name = "rc0", version, about = "C0 compiler front- and mid-end")]
struct Args {
    /// Input C0 source file
    input: PathBuf,

    /// Print the token stream and stop
    #[arg(long)]
    tokens: bool,

    /// Print each top-level AST node after parsing
    #[arg(long)]
    ast: bool,

    /// Print the dot graph of the named function's CFG
    #[arg(long, value_name = "FUNC")]
    dot: Option<String>,

    /// Print the IR of every function definition
    #[arg(long)]
    ir: bool,

    /// Build and run the named function on the toy VM, printing its
    /// returned value
    #[arg(long, value_name = "FUNC")]
    run: Option<String>,

    /// Verbose logging (also honors RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    if let Err(err) = drive(&args) {
        eprintln!("rc0: {:#}", err);
        std::process::exit(1);
    }
}

fn drive(args: &Args) -> Result<()> {
    let file = args.input.display().to_string();
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", file))?;

    if args.tokens {
        let (mut toks, errs) = Frontend::tokenize_source(&file, &source);
        while let Some(tok) = toks.pop() {
            println!("[{}] {}", tok.span, tok);
        }
        if !errs.is_empty() {
            for err in &errs {
                eprintln!("{}", err);
            }
            bail!("{} lexical error(s)", errs.len());
        }
        return Ok(());
    }

    let unit = match Frontend::analyze_source(&file, &source) {
        Ok(unit) => unit,
        Err(errs) => {
            for err in &errs {
                eprintln!("{}", err);
            }
            bail!("{} error(s)", errs.len());
        }
    };
    debug!("analyzed {} top-level node(s)", unit.nodes.len());

    if args.ast {
        for node in &unit.nodes {
            println!("{}", node);
        }
    }

    if let Some(func) = &args.dot {
        let fundef = find_function(&unit.nodes, func)?;
        print!("{}", form_cfg(fundef).dot());
    }

    if args.ir {
        for node in &unit.nodes {
            if let NodeKind::FunDef { decl, .. } = &node.kind {
                let ssa = Ssa::from_cfg(&form_cfg(node));
                report_ssa_errors(&decl.name, &ssa)?;
                println!("{}:", decl.name);
                print!("{}", ssa);
            }
        }
    }

    if let Some(func) = &args.run {
        let fundef = find_function(&unit.nodes, func)?;
        let cfg = form_cfg(fundef);
        let ssa = Ssa::from_cfg(&cfg);
        report_ssa_errors(func, &ssa)?;
        let mut vm = Vm::new();
        vm.insert(func, ssa.instructions);
        match vm.run() {
            Some(ret) => println!("{}", ret),
            None => bail!("{} finished without returning a value", func),
        }
    }

    Ok(())
}

fn find_function<'a>(
    nodes: &'a [rc0_frontend::Node],
    name: &str,
) -> Result<&'a rc0_frontend::Node> {
    nodes
        .iter()
        .find(|n| matches!(&n.kind, NodeKind::FunDef { decl, .. } if decl.name == name))
        .with_context(|| format!("no function definition named {:?}", name))
}

fn report_ssa_errors(name: &str, ssa: &Ssa) -> Result<()> {
    if ssa.errors.is_empty() {
        return Ok(());
    }
    for err in &ssa.errors {
        eprintln!("{}: {}", name, err);
    }
    bail!("lowering {:?} failed", name)
}
