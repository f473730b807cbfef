use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pj_ast::{FrontendKind, Mode, PjOptions};
use pj_transpile::{emit_js, Transpiled, Transpiler};
use tracing_subscriber::EnvFilter;

const DEFAULT_JS_OUTPUT: &str = "output.js";
const DEFAULT_AST_OUTPUT: &str = "ast.json";

#[derive(Parser)]
#[command(name = "pj", about = "Transpile a PHP subset to JavaScript")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Statement front-end.
    #[arg(long, value_enum, default_value_t = FrontendArg::Pattern, global = true)]
    frontend: FrontendArg,
    /// Stop at the first unrecognized statement instead of skipping it.
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FrontendArg {
    Pattern,
    TreeSitter,
}

impl EngineArgs {
    fn options(&self) -> PjOptions {
        PjOptions {
            frontend: match self.frontend {
                FrontendArg::Pattern => FrontendKind::Pattern,
                FrontendArg::TreeSitter => FrontendKind::TreeSitter,
            },
            mode: if self.strict { Mode::Strict } else { Mode::Lenient },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Transpile and print JavaScript.
    Transpile {
        /// Input .php file.
        input: PathBuf,
        /// Output file.
        #[arg(short, long, default_value = DEFAULT_JS_OUTPUT)]
        output: PathBuf,
        /// Also write `<output>.map`.
        #[arg(long)]
        source_map: bool,
    },
    /// Transpile and dump the ESTree AST as JSON.
    Ast {
        input: PathBuf,
        #[arg(short, long, default_value = DEFAULT_AST_OUTPUT)]
        output: PathBuf,
    },
    /// Report statements that would be skipped.
    Check { input: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let transpiler = Transpiler::new(cli.engine.options());

    match cli.command {
        Commands::Transpile {
            input,
            output,
            source_map,
        } => {
            let transpiled = run(&transpiler, &input)?;
            let emitted = emit_js(&transpiled, &input.display().to_string(), source_map)?;

            std::fs::write(&output, &emitted.code)
                .with_context(|| format!("failed to write {}", output.display()))?;

            if let Some(srcmap) = emitted.source_map {
                let map_path = format!("{}.map", output.display());
                std::fs::write(&map_path, srcmap)
                    .with_context(|| format!("failed to write {map_path}"))?;
                eprintln!("Source map written to {map_path}");
            }
        }
        Commands::Ast { input, output } => {
            let transpiled = run(&transpiler, &input)?;
            let json = serde_json::to_string_pretty(&transpiled.program)?;
            std::fs::write(&output, json)
                .with_context(|| format!("failed to write {}", output.display()))?;
        }
        Commands::Check { input } => {
            let transpiled = run(&transpiler, &input)?;
            let filename = input.display();
            for diagnostic in &transpiled.diagnostics {
                eprintln!("{filename}: {diagnostic}");
            }
            if !transpiled.diagnostics.is_empty() {
                bail!(
                    "{filename}: {} statement(s) skipped",
                    transpiled.diagnostics.len()
                );
            }
            eprintln!("OK: {filename}");
        }
    }

    Ok(())
}

fn run(transpiler: &Transpiler, input: &Path) -> Result<Transpiled> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    transpiler
        .transpile(&source)
        .with_context(|| format!("failed to transpile {}", input.display()))
}
