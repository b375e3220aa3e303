//! `squill` — lex or parse a SQL SELECT statement from the command line.
//!
//! Exit status: 0 on success, 1 on any lex/parse failure, 2 on usage or
//! configuration errors.

use std::fs;
use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand};
use serde::Deserialize;
use squill_lexer::{AutomatonChoice, Lexer};
use squill_parser::{Parser, ParserChoice};
use tracing::debug;

const EXIT_FAILURE: i32 = 1;
const EXIT_USAGE: i32 = 2;

#[derive(Debug, ClapParser)]
#[command(name = "squill", version, about = "SQL SELECT lexing and parsing toolchain")]
struct Cli {
    /// Path to a JSON config file with optional keys
    /// {"sql", "automaton", "parser", "log_level"}; flags win over config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "squill_parser=trace" (overrides RUST_LOG).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Tokenize a statement and print one token per line.
    Lex {
        /// The SQL text to tokenize.
        #[arg(long)]
        sql: Option<String>,

        /// Automaton implementation: nfa or dfa.
        #[arg(long)]
        automaton: Option<String>,
    },
    /// Parse a statement and print the tree.
    Parse {
        /// The SQL text to parse.
        #[arg(long)]
        sql: Option<String>,

        /// Automaton implementation for the lexing stage: nfa or dfa.
        #[arg(long)]
        automaton: Option<String>,

        /// Parsing strategy: nfa (backtracking) or ll (predictive).
        #[arg(long)]
        parser: Option<String>,
    },
}

/// Optional file-based configuration; every key may also come from a flag.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    sql: Option<String>,
    automaton: Option<String>,
    parser: Option<String>,
    log_level: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = run(cli);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: Cli) -> i32 {
    let file_config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(message) => {
                eprintln!("error: {message}");
                return EXIT_USAGE;
            }
        },
        None => FileConfig::default(),
    };

    init_tracing(cli.log_level.as_deref().or(file_config.log_level.as_deref()));

    match cli.command {
        Command::Lex { sql, automaton } => {
            let sql = match require_sql(sql.or(file_config.sql)) {
                Ok(sql) => sql,
                Err(code) => return code,
            };
            let automaton =
                match parse_choice::<AutomatonChoice>(automaton.or(file_config.automaton), "nfa") {
                    Ok(choice) => choice,
                    Err(code) => return code,
                };
            lex_command(&sql, automaton)
        }
        Command::Parse {
            sql,
            automaton,
            parser,
        } => {
            let sql = match require_sql(sql.or(file_config.sql)) {
                Ok(sql) => sql,
                Err(code) => return code,
            };
            let automaton =
                match parse_choice::<AutomatonChoice>(automaton.or(file_config.automaton), "nfa") {
                    Ok(choice) => choice,
                    Err(code) => return code,
                };
            let parser = match parse_choice::<ParserChoice>(parser.or(file_config.parser), "ll") {
                Ok(choice) => choice,
                Err(code) => return code,
            };
            parse_command(&sql, automaton, parser)
        }
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfig, String> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("cannot read config {}: {err}", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|err| format!("cannot parse config {}: {err}", path.display()))
}

fn require_sql(sql: Option<String>) -> Result<String, i32> {
    match sql {
        Some(sql) => Ok(sql),
        None => {
            eprintln!("error: no SQL given; pass --sql or set \"sql\" in the config file");
            Err(EXIT_USAGE)
        }
    }
}

fn parse_choice<T>(value: Option<String>, default: &str) -> Result<T, i32>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .as_deref()
        .unwrap_or(default)
        .parse()
        .map_err(|message: String| {
            eprintln!("error: {message}");
            EXIT_USAGE
        })
}

fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn lex_command(sql: &str, automaton: AutomatonChoice) -> i32 {
    debug!(%automaton, "lexing");
    let tokens = Lexer::from_choice(automaton).lex(sql);

    let mut failed = false;
    for token in &tokens {
        println!("{token}");
        failed |= token.is_error();
    }

    if failed {
        eprintln!("error: input contains unrecognized lexemes");
        return EXIT_FAILURE;
    }
    0
}

fn parse_command(sql: &str, automaton: AutomatonChoice, strategy: ParserChoice) -> i32 {
    debug!(%automaton, parser = %strategy, "parsing");
    let tokens = Lexer::from_choice(automaton).lex(sql);

    let errors: Vec<_> = tokens.iter().filter(|t| t.is_error()).collect();
    if !errors.is_empty() {
        for token in errors {
            eprintln!("error: unrecognized lexeme {token}");
        }
        return EXIT_FAILURE;
    }

    match Parser::new(tokens, strategy).parse() {
        Ok(tree) => {
            print!("{tree}");
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let config: FileConfig =
            serde_json::from_str(r#"{"sql": "select a from t", "automaton": "dfa"}"#)
                .expect("valid config");
        assert_eq!(config.sql.as_deref(), Some("select a from t"));
        assert_eq!(config.automaton.as_deref(), Some("dfa"));
        assert!(config.parser.is_none());
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        let result: Result<FileConfig, _> = serde_json::from_str(r#"{"sq": "typo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_choice_resolution() {
        let automaton: AutomatonChoice =
            parse_choice(Some("dfa".to_owned()), "nfa").expect("valid choice");
        assert_eq!(automaton, AutomatonChoice::Dfa);

        let fallback: AutomatonChoice = parse_choice(None, "nfa").expect("default applies");
        assert_eq!(fallback, AutomatonChoice::Nfa);

        let invalid = parse_choice::<ParserChoice>(Some("lalr".to_owned()), "ll");
        assert_eq!(invalid.unwrap_err(), EXIT_USAGE);
    }

    #[test]
    fn test_lex_command_exit_codes() {
        assert_eq!(lex_command("select a from t", AutomatonChoice::Nfa), 0);
        assert_eq!(
            lex_command("select @ from t", AutomatonChoice::Dfa),
            EXIT_FAILURE
        );
    }

    #[test]
    fn test_parse_command_exit_codes() {
        assert_eq!(
            parse_command("select a from t;", AutomatonChoice::Nfa, ParserChoice::Ll),
            0
        );
        assert_eq!(
            parse_command("select 1 1 from t", AutomatonChoice::Dfa, ParserChoice::Nfa),
            EXIT_FAILURE
        );
    }
}
