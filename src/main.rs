//! Scene Stage entry point
//!
//! Native: load a scene file (or compile a source file remotely), step it
//! headlessly and print where the named bodies end up. The browser build uses
//! the `web` module instead.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::cell::RefCell;
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};
    use scene_stage::{CompileClient, CompileOutcome, LoadReport, Result, Stage, StageConfig, StageError};

    #[derive(Parser)]
    #[command(name = "scene-stage", version, about = "Load a scene and run it headlessly")]
    pub struct Cli {
        /// JSON stage config
        #[arg(long, global = true)]
        config: Option<PathBuf>,

        /// Simulation steps to run after loading
        #[arg(long, default_value_t = 120, global = true)]
        steps: u32,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Load a scene description JSON file
        Load { scene: PathBuf },
        /// Send a source file to the scene compiler and load the result
        Compile {
            source: PathBuf,
            /// Compiler endpoint (absolute URL); overrides `compile_url` from the config
            #[arg(long)]
            url: Option<String>,
        },
    }

    fn print_report(report: &LoadReport) {
        println!(
            "Loaded {} bodies ({} named, {} dropped, {} discarded, {} diagnostics)",
            report.committed,
            report.bound_names,
            report.dropped_specs,
            report.discarded_bodies,
            report.compiler_errors
        );
    }

    /// Endpoint for the native client, which has no page origin to resolve
    /// a relative URL against
    pub fn compile_endpoint(config: &StageConfig, url: Option<String>) -> Result<String> {
        let endpoint = url.unwrap_or_else(|| config.compile_url.clone());
        if reqwest::Url::parse(&endpoint).is_err() {
            return Err(StageError::Config(format!(
                "compile url '{}' is not absolute; pass --url http://host/compile or set compile_url in --config",
                endpoint
            )));
        }
        Ok(endpoint)
    }

    pub async fn run(cli: Cli) -> Result<()> {
        let mut config = match &cli.config {
            Some(path) => StageConfig::load_from_path(path)?,
            None => StageConfig::load(),
        };

        let stage = match cli.command {
            Command::Load { scene } => {
                let json = std::fs::read_to_string(&scene)?;
                let mut stage = Stage::new(config);
                let report = stage.load_json(&json)?;
                print_report(&report);
                stage
            }
            Command::Compile { source, url } => {
                config.compile_url = compile_endpoint(&config, url)?;
                let source = std::fs::read_to_string(&source)?;
                let client = CompileClient::from_config(&config)?;
                let stage = RefCell::new(Stage::new(config));
                stage.borrow_mut().ready()?;
                match client.compile(&source, &stage).await {
                    CompileOutcome::Loaded(report) => print_report(&report),
                    CompileOutcome::Failed(e) => return Err(e),
                    CompileOutcome::Discarded => return Ok(()),
                }
                stage.into_inner()
            }
        };

        simulate(stage, cli.steps)
    }

    fn simulate(mut stage: Stage, steps: u32) -> Result<()> {
        stage.start()?;
        for _ in 0..steps {
            stage.tick()?;
        }
        log::info!("Ran {} steps", steps);

        let mut named: Vec<_> = stage.variables().iter().collect();
        named.sort_by_key(|(name, _)| *name);
        for (name, body) in named {
            let pos = body.position();
            println!("{:>12}  ({:8.2}, {:8.2})", name, pos.x, pos.y);
        }

        stage.dispose();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    use clap::Parser;

    env_logger::init();
    log::info!("Scene stage (native) starting...");

    match cli::run(cli::Cli::parse()).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::wasm_start, this is just to satisfy the compiler
}
