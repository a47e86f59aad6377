use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use toronto_rent_features::{
    dataset::read_raw_csv, load_raw_csv, train_test_split, Coordinates, FeatureManifest,
    FeatureTable, InferencePipeline, ListingForm, PipelineConfig, RegressionMetrics,
    TrainingPipeline,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "toronto-rent",
    version,
    about = "Feature pipeline for Toronto rental price estimation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Builds the training feature table from the raw listings CSV.
    Prepare {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also write the train/test split.
        #[arg(long)]
        split: bool,
    },
    /// Builds the feature row for one listing form (JSON).
    Featurize {
        #[arg(long)]
        form: PathBuf,
        /// Manifest written by `prepare`; the row is checked against it.
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Skip geocoding and use these coordinates.
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write CSV here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Splits a saved feature table into train and test sets.
    Split {
        #[arg(long)]
        table: PathBuf,
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Scores price predictions (R², mean relative error).
    Evaluate {
        #[arg(long)]
        predictions: PathBuf,
        #[arg(long, default_value = "Price($)")]
        actual_column: String,
        #[arg(long, default_value = "prediction")]
        predicted_column: String,
    },
    /// Prints the serving form fields as JSON.
    Schema {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Prepare {
            input,
            output_dir,
            config,
            split,
        } => prepare(&input, &output_dir, config.as_deref(), split),
        Commands::Featurize {
            form,
            manifest,
            latitude,
            longitude,
            config,
            output,
        } => {
            let fixed = latitude
                .zip(longitude)
                .map(|(lat, lon)| Coordinates::new(lat, lon));
            featurize(
                &form,
                manifest.as_deref(),
                fixed,
                config.as_deref(),
                output.as_deref(),
            )
        }
        Commands::Split {
            table,
            output_dir,
            config,
        } => split_table(&table, &output_dir, config.as_deref()),
        Commands::Evaluate {
            predictions,
            actual_column,
            predicted_column,
        } => evaluate(&predictions, &actual_column, &predicted_column),
        Commands::Schema { config } => {
            let config = load_config(config.as_deref())?;
            let fields = config.schema.serving_fields();
            println!("{}", serde_json::to_string_pretty(&fields)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    PipelineConfig::load(path).with_context(|| match path {
        Some(path) => format!("loading config {}", path.display()),
        None => "loading default config".to_string(),
    })
}

fn prepare(input: &Path, output_dir: &Path, config: Option<&Path>, split: bool) -> Result<()> {
    let config = load_config(config)?;
    let raw = load_raw_csv(input).with_context(|| format!("reading {}", input.display()))?;
    let pipeline = TrainingPipeline::new(Arc::new(config.schema.clone()))?;
    let table = pipeline.run(raw).context("building training features")?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    write_table(&table, output_dir, "features")?;
    FeatureManifest::from_schema(&config.schema).save_json(output_dir.join("manifest.json"))?;

    if split {
        write_split(&table, output_dir, &config)?;
    }
    info!(output_dir = %output_dir.display(), rows = table.n_rows(), "prepared features");
    Ok(())
}

fn featurize(
    form_path: &Path,
    manifest: Option<&Path>,
    fixed: Option<Coordinates>,
    config: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let form = ListingForm::from_json_file(form_path)
        .with_context(|| format!("reading form {}", form_path.display()))?;

    let mut pipeline = InferencePipeline::from_config(&config, fixed)?;
    if let Some(path) = manifest {
        let manifest = FeatureManifest::load_json(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        pipeline = pipeline.with_manifest(manifest);
    }
    let table = pipeline.run(&form).context("building serving features")?;

    match output {
        Some(path) => table.write_csv_file(path)?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            table.write_csv(&mut handle)?;
            handle.flush()?;
        }
    }
    Ok(())
}

fn split_table(path: &Path, output_dir: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let table = FeatureTable::load_from_file(path)
        .with_context(|| format!("reading table {}", path.display()))?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    write_split(&table, output_dir, &config)
}

fn write_split(table: &FeatureTable, output_dir: &Path, config: &PipelineConfig) -> Result<()> {
    let (train, test) = train_test_split(table, config.split.test_size, config.split.seed)?;
    write_table(&train, output_dir, "train")?;
    write_table(&test, output_dir, "test")?;
    info!(
        train = train.n_rows(),
        test = test.n_rows(),
        seed = config.split.seed,
        "wrote split"
    );
    Ok(())
}

fn write_table(table: &FeatureTable, dir: &Path, stem: &str) -> Result<()> {
    let csv_path = dir.join(format!("{}.csv", stem));
    table
        .write_csv_file(&csv_path)
        .with_context(|| format!("writing {}", csv_path.display()))?;
    let bin_path = dir.join(format!("{}.bin", stem));
    table
        .save_to_file(&bin_path)
        .with_context(|| format!("writing {}", bin_path.display()))?;
    Ok(())
}

fn evaluate(path: &Path, actual: &str, predicted: &str) -> Result<()> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut frame = read_raw_csv(file)?;
    frame.coerce_numeric(actual)?;
    frame.coerce_numeric(predicted)?;

    let y_true = frame.numeric(actual)?;
    let y_pred = frame.numeric(predicted)?;
    if y_true.iter().chain(y_pred).any(|v| v.is_nan()) {
        bail!("{} contains missing values", path.display());
    }

    let metrics = RegressionMetrics::compute(y_true, y_pred)?;
    println!("R²: {:.4}", metrics.r2);
    println!("Mean relative error: {:.4}", metrics.mean_relative_error);
    println!("Accuracy: {:.2}%", metrics.accuracy() * 100.0);
    Ok(())
}
