//! vcprep - Voice Conversion Preprocessor

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use vcprep::config::{PreprocessArgs, SynthesizeArgs};
use vcprep::{init_logging, Args, Command, Config};

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.verbose {
        println!("{}", vcprep::get_library_info());
        println!();
    }

    let config = Config::load(args.config_file.as_deref()).context("Failed to load configuration")?;
    match args.command {
        Command::Preprocess(preprocess_args) => run_preprocess(config, &preprocess_args),
        Command::Synthesize(synthesize_args) => run_synthesize(config, &synthesize_args),
    }
}

fn run_preprocess(mut config: Config, args: &PreprocessArgs) -> Result<()> {
    config.apply_preprocess_args(args).context("Invalid preprocessing options")?;

    println!("=== Corpus Preprocessing ===");
    match &config.preprocess.metadata_dir {
        Some(dir) => println!("Metadata: {}", dir.join(vcprep::processing::pairing::METADATA_FILE).display()),
        None => println!("Corpus: {}", config.preprocess.base_dir.display()),
    }
    println!("Output: {}", config.preprocess.output_dir().display());
    println!("Workers: {}", config.preprocess.num_workers);
    println!("============================\n");

    let result = vcprep::preprocess(&config).context("Preprocessing failed")?;

    println!("{}", result.summary);
    println!("Time: {:.2}s", result.processing_time_secs);
    Ok(())
}

#[cfg(feature = "onnx")]
fn run_synthesize(config: Config, args: &SynthesizeArgs) -> Result<()> {
    use vcprep::synthesis::{OnnxAcousticModel, Synthesizer};

    config.validate()?;
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let mut synthesizer = Synthesizer::<OnnxAcousticModel>::load(&args.checkpoint, &args.model_name, &config)
        .with_context(|| format!("Failed to load checkpoint {}", args.checkpoint.display()))?;
    let wav = synthesizer
        .synthesize(&args.input)
        .with_context(|| format!("Failed to synthesize {}", args.input.display()))?;

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&args.output, &wav)?;
    println!("Wrote {} ({} bytes)", args.output.display(), wav.len());
    Ok(())
}

#[cfg(not(feature = "onnx"))]
fn run_synthesize(_config: Config, _args: &SynthesizeArgs) -> Result<()> {
    anyhow::bail!("vcprep was built without ONNX Runtime support; rebuild with `--features onnx`")
}
