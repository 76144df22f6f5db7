use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lrzero::{
    automaton::Automaton,
    grammar::{normalize_and_validate, RawGrammar, Symbol},
    simulate::{Configuration, StepOutcome},
    table::ParseTable,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize and validate a grammar, then print its automaton and
    /// ACTION/GOTO table.
    Analyze {
        /// The path of the grammar file (`.json` or the line-based text
        /// format).
        input: PathBuf,
    },

    /// Simulate a shift-reduce parse of a sentence.
    Run {
        /// The path of the grammar file.
        input: PathBuf,

        /// The input sentence. Split into one-character terminals unless
        /// `--tokens` is set.
        sentence: String,

        /// Split the sentence on whitespace instead of per character.
        #[arg(long)]
        tokens: bool,

        /// Stop after this many steps instead of running to completion.
        #[arg(long)]
        steps: Option<usize>,

        /// The defensive ceiling for `run to completion`.
        #[arg(long, default_value_t = 10_000)]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    match args.command {
        Command::Analyze { input } => analyze(&input),
        Command::Run {
            input,
            sentence,
            tokens,
            steps,
            limit,
        } => run(&input, &sentence, tokens, steps, limit),
    }
}

fn load_grammar(input: &Path) -> anyhow::Result<lrzero::grammar::StandardGrammar> {
    let raw = RawGrammar::from_file(input)
        .with_context(|| format!("failed to read the grammar from {}", input.display()))?;

    let (grammar, errors) = normalize_and_validate(&raw)?;
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("[error] {}", error);
        }
        anyhow::bail!("the grammar has {} validation error(s)", errors.len());
    }

    Ok(grammar)
}

fn analyze(input: &Path) -> anyhow::Result<()> {
    let grammar = load_grammar(input)?;
    println!("{}", grammar);

    let automaton = Automaton::build(grammar)?;
    println!("{}", automaton);

    let table = ParseTable::derive(&automaton);
    if table.has_conflicts() {
        println!("[warning] the table has conflicting cells; the grammar is not LR(0)");
    }
    println!();
    println!("{}", table);

    Ok(())
}

fn run(
    input: &Path,
    sentence: &str,
    tokens: bool,
    steps: Option<usize>,
    limit: usize,
) -> anyhow::Result<()> {
    let grammar = load_grammar(input)?;
    let automaton = Automaton::build(grammar)?;

    let mut config = if tokens {
        Configuration::from_tokens(sentence.split_whitespace().map(Symbol::from))
    } else {
        Configuration::from_sentence(sentence)
    };
    println!("{}", config);

    let mut applied = 0;
    let outcome = loop {
        let (next, outcome) = config.step(&automaton);
        // Conflict and Stuck hand the configuration back unchanged.
        config = next;
        if !outcome.is_continue() {
            if outcome == StepOutcome::Accept {
                println!("{}", config);
            }
            break outcome;
        }
        applied += 1;
        println!("{}", config);

        if steps.is_some_and(|steps| applied >= steps) {
            break StepOutcome::Continue;
        }
        if applied >= limit {
            tracing::warn!("step ceiling of {} reached", limit);
            break StepOutcome::Continue;
        }
    };

    match outcome {
        StepOutcome::Accept => println!("=> accepted ({} steps)", config.step_index()),
        StepOutcome::Conflict(reason) => {
            println!("=> {}: the grammar is not LR(0) for this input", reason)
        }
        StepOutcome::Stuck(reason) => println!("=> {}", reason),
        StepOutcome::Continue => println!("=> paused after {} steps", applied),
    }

    Ok(())
}
