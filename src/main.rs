//! wavconv - WAV File Converter

use std::path::PathBuf;
use std::process;
use anyhow::{bail, Context};
use clap::Parser;
use wavconv::{init_logging, Args, BatchConverter, BatchInput, Command, Config};

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    match &args.command {
        Command::InitConfig { path } => {
            Config::create_default_config(path)
                .with_context(|| format!("Cannot create config file {}", path.display()))?;
            println!("Default config written to {}", path.display());
            Ok(())
        }
        Command::Convert { files, .. } => {
            let config = load_config(&args)?;
            run_convert(&config, files)
        }
        Command::Serve { .. } => {
            let config = load_config(&args)?;
            run_serve(config)
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config = Config::from_args_and_config(args).context("Invalid configuration")?;
    init_logging(config.verbose());
    if config.verbose() {
        println!("{}", wavconv::get_library_info());
        println!();
    }
    Ok(config)
}

fn run_convert(config: &Config, files: &[PathBuf]) -> anyhow::Result<()> {
    let inputs: Vec<BatchInput> = files.iter().map(BatchInput::from_path).collect();
    let report = BatchConverter::from_config(config).convert_all(&inputs)?;

    println!("{}", report.render());
    println!("Output: {}", config.output.dir.display());
    if config.verbose() {
        println!("Time: {:.3}s", report.processing_time_seconds);
    }

    if !report.all_succeeded() {
        bail!(
            "{} of {} files failed to convert",
            report.len() - report.success_count(),
            report.len()
        );
    }
    Ok(())
}

fn run_serve(config: Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Cannot start async runtime")?;

    runtime.block_on(wavconv::server::serve(config))?;
    Ok(())
}
