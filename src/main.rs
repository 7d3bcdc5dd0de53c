use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use findoutlie::{NameList, OutlierConfig, OutlierMap, Pipeline};

/// Find outlier volumes in every subject series under a data directory.
#[derive(Parser)]
#[command(name = "findoutlie")]
#[command(version)]
#[command(about = "Find outlier volumes in imaging time series", long_about = None)]
struct Cli {
    /// Directory containing data
    data_directory: PathBuf,

    /// Metric(s) summarising each volume: vol_means, dvars, spm_global or all
    #[arg(short, long, num_args = 1..)]
    metric: Option<Vec<String>>,

    /// Outlier detector(s): std, iqr or all
    #[arg(short, long, num_args = 1..)]
    detector: Option<Vec<String>>,

    /// Standard deviation threshold for the 'std' detector
    #[arg(short = 's', long)]
    n_stds: Option<f64>,

    /// Interquartile proportion for the 'iqr' detector
    #[arg(short = 'q', long = "iqr-prop")]
    iqr_proportion: Option<f64>,

    /// How to join masks from several metrics or detectors: or, and
    #[arg(short = 'j', long)]
    mask_join: Option<String>,

    /// JSON file with default options; flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report unreadable files and continue with the rest
    #[arg(short, long)]
    keep_going: bool,
}

impl Cli {
    fn outlier_config(&self) -> anyhow::Result<OutlierConfig> {
        let mut config = match &self.config {
            Some(path) => OutlierConfig::from_json_file(path)?,
            None => OutlierConfig::default(),
        };
        if let Some(metric) = &self.metric {
            config.metric = NameList::from(metric.clone());
        }
        if let Some(detector) = &self.detector {
            config.detector = NameList::from(detector.clone());
        }
        if let Some(n_stds) = self.n_stds {
            config.n_stds = n_stds;
        }
        if let Some(iqr_proportion) = self.iqr_proportion {
            config.iqr_proportion = iqr_proportion;
        }
        if let Some(mask_join) = &self.mask_join {
            config.mask_join = mask_join.clone();
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(&cli.outlier_config()?)?;
    log::info!(
        "metrics: {:?}, detectors: {:?}, join: {}",
        pipeline.metrics().collect::<Vec<_>>(),
        pipeline.detectors().collect::<Vec<_>>(),
        pipeline.join()
    );

    if !cli.keep_going {
        let outliers = pipeline.scan(&cli.data_directory)?;
        print_outliers(&outliers);
        return Ok(ExitCode::SUCCESS);
    }

    let report = pipeline.scan_keep_going(&cli.data_directory)?;
    print_outliers(&report.outliers);
    for (path, err) in &report.failures {
        eprintln!("{}: {}", path.display(), error_chain(err));
    }
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_outliers(outliers: &OutlierMap) {
    for (path, found) in outliers {
        if found.is_reportable() {
            println!("{}", outlier_line(path, &found.to_string()));
        }
    }
}

fn outlier_line(path: &Path, indices: &str) -> String {
    format!("{}, {indices}", path.display())
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}
