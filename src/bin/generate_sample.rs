use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Float64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use findoutlie::data::loader::{SHAPE_METADATA_KEY, VOXELS_COLUMN};
use findoutlie::integrity::{HashAlgorithm, DEFAULT_MANIFEST};
use parquet::arrow::ArrowWriter;

/// Write synthetic subject series with injected spike volumes.
#[derive(Parser)]
#[command(name = "generate-sample")]
struct Cli {
    /// Output data directory
    #[arg(default_value = "sample_data")]
    output: PathBuf,

    /// Number of subjects to generate
    #[arg(short, long, default_value_t = 3)]
    subjects: usize,

    /// Volumes per series
    #[arg(short = 't', long, default_value_t = 60)]
    n_trs: usize,
}

const VOLUME_SHAPE: [usize; 3] = [8, 8, 4];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A brain-like blob in dark background, noisy over time, with a few volumes
/// scaled up to mimic scanner spikes.
fn generate_series(n_trs: usize, spikes: &[usize], rng: &mut SimpleRng) -> Vec<Vec<f64>> {
    let [nx, ny, nz] = VOLUME_SHAPE;
    let (cx, cy) = (nx as f64 / 2.0, ny as f64 / 2.0);

    let template: Vec<f64> = (0..nz)
        .flat_map(|_| (0..ny).flat_map(move |y| (0..nx).map(move |x| (x, y))))
        .map(|(x, y)| {
            let r2 = (x as f64 + 0.5 - cx).powi(2) + (y as f64 + 0.5 - cy).powi(2);
            if r2 < (nx as f64 / 2.5).powi(2) { 1000.0 } else { 20.0 }
        })
        .collect();

    (0..n_trs)
        .map(|t| {
            let gain = if spikes.contains(&t) { 1.25 } else { 1.0 };
            template
                .iter()
                .map(|&v| (v * gain + rng.gauss(0.0, 10.0)).max(0.0))
                .collect()
        })
        .collect()
}

fn write_parquet(path: &Path, volumes: &[Vec<f64>]) -> anyhow::Result<()> {
    let mut voxels = ListBuilder::new(Float64Builder::new());
    for volume in volumes {
        voxels.values().append_slice(volume);
        voxels.append(true);
    }

    let metadata = HashMap::from([(
        SHAPE_METADATA_KEY.to_string(),
        serde_json::to_string(&VOLUME_SHAPE)?,
    )]);
    let schema = Arc::new(
        Schema::new(vec![Field::new(
            VOXELS_COLUMN,
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        )])
        .with_metadata(metadata),
    );

    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(voxels.finish())])
        .context("building record batch")?;

    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut rng = SimpleRng::new(42);
    let mut manifest = String::new();

    for subject in 1..=cli.subjects {
        let name = format!("sub-{subject:02}");
        let relative = PathBuf::from(&name)
            .join("func")
            .join(format!("{name}_task-rest_bold.parquet"));
        let path = cli.output.join(&relative);
        fs::create_dir_all(path.parent().unwrap_or(&cli.output))?;

        let spikes: Vec<usize> = [cli.n_trs / 4 + subject, cli.n_trs * 2 / 3]
            .into_iter()
            .filter(|&t| t < cli.n_trs)
            .collect();
        let volumes = generate_series(cli.n_trs, &spikes, &mut rng);
        write_parquet(&path, &volumes)?;

        let digest = HashAlgorithm::Sha1.hex_digest(&fs::read(&path)?);
        manifest.push_str(&format!("{digest} {}\n", relative.display()));
        log::info!("wrote {} (spikes at {spikes:?})", path.display());
    }

    let manifest_path = cli.output.join(DEFAULT_MANIFEST);
    fs::create_dir_all(manifest_path.parent().unwrap_or(&cli.output))?;
    fs::write(&manifest_path, manifest)?;

    println!(
        "Wrote {} series ({} volumes of {:?} each) to {}",
        cli.subjects,
        cli.n_trs,
        VOLUME_SHAPE,
        cli.output.display()
    );
    Ok(())
}
