//! Flint command-line driver
//!
//! Lowers one of the built-in demo programs and prints its IR, runs it, or
//! emits it as a native object file.

mod commands;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use flint_engine::{Demo, OptLevel};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "flint")]
#[command(about = "Flint IR lowering and code generation", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lower and verify a demo, then print its IR
    Print {
        /// Demo program (arith, if-then, if-else)
        demo: Demo,
    },

    /// Lower, verify and execute a demo
    Run {
        /// Demo program (arith, if-then, if-else)
        demo: Demo,
        /// Execute native code through the JIT instead of the interpreter
        #[arg(long)]
        jit: bool,
    },

    /// Lower, verify and write a demo as an object file
    Emit {
        /// Demo program (arith, if-then, if-else)
        demo: Demo,
        /// Output object file
        #[arg(short, long)]
        output: PathBuf,
        /// Target triple (defaults to the host)
        #[arg(long)]
        triple: Option<String>,
        /// CPU name (`native`, `generic`, or a preset)
        #[arg(long)]
        cpu: Option<String>,
        /// Comma-separated feature toggles, e.g. `+avx2,-sse4.1`
        #[arg(long, default_value = "")]
        features: String,
        /// Optimization level
        #[arg(long, value_enum, default_value_t = OptArg::Speed)]
        opt_level: OptArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OptArg {
    None,
    Speed,
    SpeedAndSize,
}

impl From<OptArg> for OptLevel {
    fn from(arg: OptArg) -> Self {
        match arg {
            OptArg::None => OptLevel::None,
            OptArg::Speed => OptLevel::Speed,
            OptArg::SpeedAndSize => OptLevel::SpeedAndSize,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Print { demo } => commands::print(demo),
        Commands::Run { demo, jit } => commands::run(demo, jit),
        Commands::Emit {
            demo,
            output,
            triple,
            cpu,
            features,
            opt_level,
        } => commands::emit(commands::EmitArgs {
            demo,
            output,
            triple,
            cpu,
            features,
            opt_level: opt_level.into(),
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_print() {
        let cli = Cli::try_parse_from(["flint", "print", "arith"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(matches!(cli.command, Commands::Print { demo: Demo::Arith }));
    }

    #[test]
    fn test_parse_run_jit_verbose() {
        let cli = Cli::try_parse_from(["flint", "-vv", "run", "if-else", "--jit"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Run {
                demo: Demo::IfElse,
                jit: true
            }
        ));
    }

    #[test]
    fn test_parse_emit() {
        let cli = Cli::try_parse_from([
            "flint",
            "emit",
            "if-then",
            "-o",
            "out.o",
            "--triple",
            "aarch64-apple-darwin",
            "--features",
            "+lse",
            "--opt-level",
            "speed-and-size",
        ])
        .unwrap();
        match cli.command {
            Commands::Emit {
                demo,
                output,
                triple,
                cpu,
                features,
                opt_level,
            } => {
                assert_eq!(demo, Demo::IfThen);
                assert_eq!(output, PathBuf::from("out.o"));
                assert_eq!(triple.as_deref(), Some("aarch64-apple-darwin"));
                assert_eq!(cpu, None);
                assert_eq!(features, "+lse");
                assert_eq!(OptLevel::from(opt_level), OptLevel::SpeedAndSize);
            }
            other => panic!("expected emit, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_demo_and_missing_output() {
        assert!(Cli::try_parse_from(["flint", "print", "loop"]).is_err());
        assert!(Cli::try_parse_from(["flint", "emit", "arith"]).is_err());
    }
}
