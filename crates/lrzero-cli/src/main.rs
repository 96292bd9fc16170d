use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lrzero::{driver, grammar::Grammar};
use std::{io, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of grammar definition file.
    grammar: PathBuf,

    /// The string to parse. Read from standard input if omitted.
    #[arg(long)]
    input: Option<String>,

    /// How the input string is split into symbols.
    #[arg(long, value_enum, default_value_t = Split::Chars)]
    split: Split,

    /// Abort if the parse table has conflicts.
    #[arg(long)]
    strict: bool,

    /// Print only the parse trace.
    #[arg(long)]
    quiet: bool,

    /// Give up the parse after this many steps.
    #[arg(long, default_value_t = 100_000)]
    max_steps: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Split {
    /// Every non-whitespace character is a symbol.
    Chars,
    /// Symbols are separated by whitespace.
    Whitespace,
}

impl Split {
    fn apply(self, input: &str) -> Vec<String> {
        match self {
            Split::Chars => input
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(String::from)
                .collect(),
            Split::Whitespace => input.split_whitespace().map(str::to_owned).collect(),
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let grammar = Grammar::from_file(&args.grammar)
        .with_context(|| format!("failed to load grammar from {}", args.grammar.display()))?;

    let (automaton, table) = lrzero::compute(&grammar);

    if !args.quiet {
        println!("## grammar\n{}", grammar);
        println!("## automaton\n{}", automaton.display(&grammar));
        println!("## table\n{}", table.display(&grammar));
    }

    for conflict in &table.conflicts {
        println!("[warning] {}", conflict.display(&grammar));
    }
    if !table.conflicts.is_empty() {
        let suffix = if table.conflicts.len() == 1 { "" } else { "s" };
        println!(
            "[warning] The grammar is not LR(0): the table has {} conflict{}.",
            table.conflicts.len(),
            suffix
        );
        if args.strict {
            anyhow::bail!("conflicts in the parse table (--strict)");
        }
    }

    let input = match args.input {
        Some(input) => input,
        None => {
            let mut line = String::new();
            io::stdin()
                .read_line(&mut line)
                .context("failed to read the input string from stdin")?;
            line
        }
    };
    let symbols = args.split.apply(input.trim_end_matches(['\r', '\n']));

    let result = driver::parse_with_limit(&grammar, &table, &symbols, Some(args.max_steps))
        .context("failed to parse the input string")?;
    print!("{}", result.display(&grammar));

    Ok(if result.is_accepted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
