use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use name_trends::data::sample::Xoshiro256;
use parquet::arrow::ArrowWriter;

/// Write a synthetic INSEE-shaped name table (`sexe,preusuel,annais,nombre`).
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Cli {
    /// Output file; `.parquet` writes Parquet, anything else CSV.
    #[arg(default_value = "sample_names.csv")]
    output: PathBuf,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 1900)]
    first_year: u32,
    #[arg(long, default_value_t = 2022)]
    last_year: u32,
}

/// Popularity curve of one name: a gaussian bump over the years.
struct Profile {
    label: &'static str,
    sex: u8,
    peak_year: f64,
    spread: f64,
    peak_births: f64,
}

const PROFILES: &[Profile] = &[
    Profile { label: "MARIE", sex: 2, peak_year: 1910.0, spread: 40.0, peak_births: 50_000.0 },
    Profile { label: "JEAN", sex: 1, peak_year: 1925.0, spread: 30.0, peak_births: 30_000.0 },
    Profile { label: "NATHALIE", sex: 2, peak_year: 1967.0, spread: 8.0, peak_births: 20_000.0 },
    Profile { label: "THOMAS", sex: 1, peak_year: 1988.0, spread: 10.0, peak_births: 15_000.0 },
    Profile { label: "CAMILLE", sex: 2, peak_year: 1997.0, spread: 12.0, peak_births: 9_000.0 },
    Profile { label: "CAMILLE", sex: 1, peak_year: 1975.0, spread: 10.0, peak_births: 1_500.0 },
    Profile { label: "LÉA", sex: 2, peak_year: 2002.0, spread: 9.0, peak_births: 13_000.0 },
    Profile { label: "GABRIEL", sex: 1, peak_year: 2030.0, spread: 15.0, peak_births: 6_000.0 },
    Profile { label: "JADE", sex: 2, peak_year: 2025.0, spread: 10.0, peak_births: 5_000.0 },
    Profile { label: "NOÉ", sex: 1, peak_year: 2040.0, spread: 12.0, peak_births: 4_000.0 },
    Profile { label: "CÔME", sex: 1, peak_year: 2035.0, spread: 10.0, peak_births: 900.0 },
    Profile { label: "ZÉLIE", sex: 2, peak_year: 1905.0, spread: 20.0, peak_births: 400.0 },
];

struct Row {
    sex: u8,
    label: String,
    year: String,
    count: i64,
}

fn expected_births(p: &Profile, year: u32) -> f64 {
    p.peak_births * (-(f64::from(year) - p.peak_year).powi(2) / (2.0 * p.spread.powi(2))).exp()
}

fn generate(cli: &Cli) -> Vec<Row> {
    let mut rng = Xoshiro256::seeded(cli.seed);
    let mut rows = Vec::new();

    for p in PROFILES {
        let mut unknown_year = 0i64;
        for year in cli.first_year..=cli.last_year {
            let mean = expected_births(p, year);
            let births = (mean + rng.gauss(0.0, mean.sqrt().max(1.0))).round() as i64;
            // INSEE does not publish counts below 3 for a given year.
            if births < 3 {
                unknown_year += births.max(0);
                continue;
            }
            rows.push(Row {
                sex: p.sex,
                label: p.label.to_string(),
                year: year.to_string(),
                count: births,
            });
            // Occasionally re-report a lower figure for the same key.
            if rng.next_f64() < 0.01 {
                rows.push(Row {
                    sex: p.sex,
                    label: p.label.to_string(),
                    year: year.to_string(),
                    count: births / 2,
                });
            }
        }
        if unknown_year > 0 {
            rows.push(Row {
                sex: p.sex,
                label: p.label.to_string(),
                year: "XXXX".to_string(),
                count: unknown_year,
            });
        }
    }

    for year in cli.first_year..=cli.last_year {
        for sex in [1u8, 2] {
            rows.push(Row {
                sex,
                label: "_PRENOMS_RARES".to_string(),
                year: year.to_string(),
                count: 20_000 + (rng.next_f64() * 5_000.0) as i64,
            });
        }
    }

    rows
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record(["sexe", "preusuel", "annais", "nombre"])?;
    for row in rows {
        writer.write_record([
            row.sex.to_string(),
            row.label.clone(),
            row.year.clone(),
            row.count.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("sexe", DataType::Int64, false),
        Field::new("preusuel", DataType::Utf8, false),
        Field::new("annais", DataType::Utf8, false),
        Field::new("nombre", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| i64::from(r.sex)))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.label.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.year.as_str()))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.count))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    if cli.first_year > cli.last_year {
        bail!("first year {} is after last year {}", cli.first_year, cli.last_year);
    }

    let rows = generate(&cli);
    let is_parquet = cli
        .output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet") || e.eq_ignore_ascii_case("pq"));

    if is_parquet {
        write_parquet(&cli.output, &rows)?;
    } else {
        write_csv(&cli.output, &rows)?;
    }

    println!(
        "Wrote {} rows ({} name profiles, {}–{}) to {}",
        rows.len(),
        PROFILES.len(),
        cli.first_year,
        cli.last_year,
        cli.output.display()
    );
    Ok(())
}
