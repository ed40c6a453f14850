//! Bias benchmark evaluation CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bias_eval::{
    analysis::Granularity,
    config::{Config, Language},
    reporting::{print_console_report, JsonSummary, OocRecord, OocSink, TsvOocLog, TsvWriter},
    runner::{extract_file, results_table_path, Evaluator},
};

/// Aggregation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Mode {
    /// Compute each group directly over its rows
    Quick,
    /// Compute per template, then average across templates
    Full,
}

impl From<Mode> for Granularity {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Quick => Granularity::Quick,
            Mode::Full => Granularity::Full,
        }
    }
}

#[derive(Parser)]
#[command(name = "bias-eval")]
#[command(about = "Answer extraction and bias metrics for multiple-choice bias benchmarks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract choices from raw model output and join them onto the samples
    Extract {
        /// TSV with `guid` and `raw` columns
        #[arg(short, long)]
        predictions: PathBuf,

        /// Preprocessed samples TSV (`sample_id`, `A`, `B`, `C`, ...)
        #[arg(short, long)]
        samples: PathBuf,

        /// Evaluation TSV to write
        #[arg(short, long)]
        output: PathBuf,

        /// Out-of-choice audit log
        #[arg(long)]
        ooc_log: Option<PathBuf>,
    },

    /// Compute the bias metrics table for one or more models
    Evaluate {
        /// Directory holding `<topic>_<prompt_id>_<model>.tsv` files
        /// (default: `output.results_dir`)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Benchmark topic used in file names
        #[arg(short, long)]
        topic: String,

        /// Prompt variant (1-5)
        #[arg(long)]
        prompt_id: Option<usize>,

        /// Comma-separated model names
        #[arg(short, long)]
        models: String,

        /// Results TSV to write
        /// (default: `<results_dir>/<topic>_<prompt_id>.tsv`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Aggregation mode (default: from config)
        #[arg(long, value_enum)]
        mode: Option<Mode>,

        /// Samples are in English
        #[arg(long)]
        english: bool,

        /// Add one row per template
        #[arg(long)]
        by_template: bool,

        /// Also write a JSON summary
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/eval.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("bias_eval=debug,info")
    } else {
        EnvFilter::new("bias_eval=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Commands::Extract {
            predictions,
            samples,
            output,
            ooc_log,
        } => {
            run_extract(&config, predictions, samples, output, ooc_log)?;
        }

        Commands::Evaluate {
            input_dir,
            topic,
            prompt_id,
            models,
            output,
            mode,
            english,
            by_template,
            json,
        } => {
            let mut config = config;
            if let Some(prompt_id) = prompt_id {
                config.evaluation.prompt_id = prompt_id;
            }
            if let Some(mode) = mode {
                config.evaluation.granularity = mode.into();
            }
            if english {
                config.evaluation.language = Language::English;
            }
            if by_template {
                config.evaluation.group_by_template = true;
            }
            config.validate()?;

            let results_dir = PathBuf::from(&config.output.results_dir);
            let output = output.unwrap_or_else(|| {
                results_table_path(&results_dir, &topic, config.evaluation.prompt_id)
            });
            let input_dir = input_dir.unwrap_or(results_dir);

            let models: Vec<String> = models
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            run_evaluate(&config, input_dir, &topic, &models, output, json)?;
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

fn run_extract(
    config: &Config,
    predictions: PathBuf,
    samples: PathBuf,
    output: PathBuf,
    ooc_log: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ooc_path = ooc_log.or_else(|| config.output.ooc_log.as_ref().map(PathBuf::from));

    let mut file_sink;
    let mut memory_sink: Vec<OocRecord> = Vec::new();
    let sink: &mut dyn OocSink = match &ooc_path {
        Some(path) => {
            file_sink = TsvOocLog::create(path)?;
            &mut file_sink
        }
        None => &mut memory_sink,
    };

    let report = extract_file(&predictions, &samples, &output, sink)?;

    println!("=== Answer Extraction ===");
    println!("Predictions:       {}", report.len());
    println!("Out-of-choice:     {}", report.ooc_count);
    println!("Out-of-choice (%): {:.2}", report.ooc_ratio() * 100.0);
    if let Some(path) = ooc_path {
        println!("Audit log:         {}", path.display());
    }
    println!("Output:            {}", output.display());
    Ok(())
}

fn run_evaluate(
    config: &Config,
    input_dir: PathBuf,
    topic: &str,
    models: &[String],
    output: PathBuf,
    json: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let eval = &config.evaluation;
    println!("=== Bias Evaluation ===");
    println!("Topic:    {}_{}", topic, eval.prompt_id);
    println!("Mode:     {}", eval.granularity);
    println!("Language: {}", eval.language);
    println!("Unknown:  {}", config.unknown_answer()?);
    println!("Models:   {}", models.join(", "));

    let evaluator = Evaluator::from_config(config)?;
    let results = evaluator.evaluate_models(&input_dir, topic, eval.prompt_id, models)?;

    TsvWriter::write_results(&output, &results)?;
    println!("\nResults written to: {}", output.display());

    let json_path = json.or_else(|| {
        config
            .output
            .write_json
            .then(|| output.with_extension("json"))
    });
    if let Some(path) = json_path {
        let summary = JsonSummary::from_results(topic, eval.prompt_id, eval.granularity, &results);
        summary.write_to_file(&path)?;
        println!("Summary written to: {}", path.display());
    }

    print_console_report(&results);
    Ok(())
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
