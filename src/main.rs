use anyhow::{anyhow, Context, Result};
use bulk_resizer::{
    parse_color, quality_preset, size_preset, BatchArgs, BatchProcessor, Cli, Commands,
    JobConfig, NamingOptions, TargetSize, QUALITY_PRESETS, SIZE_PRESETS,
};
use clap::Parser;
use log::LevelFilter;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Batch(args) => process_batch(args),
        Commands::Presets => {
            print_presets();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn process_batch(args: BatchArgs) -> Result<ExitCode> {
    let config = build_config(&args)?;

    let processor = BatchProcessor::new(config, args.threads)
        .context("Invalid batch settings")?
        .with_progress(!args.no_progress);

    let report = processor
        .process_directory(&args.input)
        .with_context(|| format!("Batch over {} could not start", args.input.display()))?;

    println!("{}", report);
    println!(
        "Output folder: {}",
        processor.config().output_dir_for(&args.input).display()
    );

    if report.failed() > 0 || report.aborted.is_some() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn build_config(args: &BatchArgs) -> Result<JobConfig> {
    let target = match &args.preset {
        Some(name) => {
            let (width, height) =
                size_preset(name).ok_or_else(|| anyhow!("Unknown preset: {}", name))?;
            TargetSize::exact(width, height)
        }
        None => TargetSize::new(args.width, args.height),
    };

    let quality = match args.quality.parse::<u8>() {
        Ok(quality) => quality,
        Err(_) => quality_preset(&args.quality)
            .ok_or_else(|| anyhow!("Quality must be 1-100 or a preset name: {}", args.quality))?,
    };

    Ok(JobConfig {
        target,
        mode: args.mode.into(),
        output_format: args.format.map(Into::into),
        quality,
        output_folder: args.output.clone(),
        naming: NamingOptions {
            prefix: args.prefix.clone(),
            suffix: args.suffix.clone(),
            keep_original_name: !args.drop_name,
            sequential: args.sequential,
            start_index: args.start_index,
        },
        recursive: args.recursive,
        overwrite: args.overwrite_policy(),
        preserve_metadata: !args.strip_metadata,
        pad_color: parse_color(&args.pad_color).context("Invalid --pad-color")?,
        background: parse_color(&args.background).context("Invalid --background")?,
        algorithm: args.algorithm.into(),
        max_dimension: args.max_dimension,
        optimize_png: !args.no_optimize,
    })
}

fn print_presets() {
    println!("=== Size presets ===");
    for (name, width, height) in SIZE_PRESETS {
        println!("  {:<10} {}x{}", name, width, height);
    }
    println!("\n=== Quality presets ===");
    for (name, quality) in QUALITY_PRESETS {
        println!("  {:<10} {}", name, quality);
    }
}
