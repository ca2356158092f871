//! The module responsible for writing output data to disk.
//!
//! Results files are written to a temporary file first and then moved into place, so a failed
//! batch never leaves a partial file behind.
use crate::comparison::ComparisonEntry;
use crate::simulation::SimulationResult;
use anyhow::{Context, Result, ensure};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The root folder in which dataset-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "solarinvest_results";

/// The output file name for the results of stored simulation requests
pub const SIMULATIONS_FILE_NAME: &str = "simulations.csv";

/// Get the default output directory for the dataset at `data_dir`
pub fn get_output_dir(data_dir: &Path) -> Result<PathBuf> {
    // Get the dataset name from the dir path
    let data_dir = data_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to data directory")?;

    let dataset_name = data_dir
        .file_name()
        .context("Data directory cannot be in root folder")?
        .to_str()
        .context("Invalid chars in data directory name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, dataset_name].iter().collect())
}

/// Create a new output directory.
///
/// If the directory already exists and is not empty, it will only be replaced if
/// `allow_overwrite` is true.
///
/// # Returns
///
/// True if an existing directory was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass the \
            --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir).context("Could not delete folder")?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Identifies a row in a results file
#[derive(Serialize, Debug, PartialEq)]
struct SimulationRow {
    simulation_id: usize,
}

/// Identifies a row in a comparison file, along with the scenario's parameter
#[derive(Serialize, Debug, PartialEq)]
struct ComparisonRow {
    simulation_id: usize,
    parameter: Decimal,
}

/// Write `rows` to a CSV file at `file_path`, replacing any existing file only once every row has
/// been written
fn write_csv_atomic<I, R>(file_path: &Path, rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: Serialize,
{
    let dir = file_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut temp_file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Could not create temporary file in {}", dir.display()))?;

    {
        let mut writer = csv::Writer::from_writer(temp_file.as_file_mut());
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }

    temp_file
        .persist(file_path)
        .with_context(|| format!("Could not write {}", file_path.display()))?;

    Ok(())
}

/// Write the results of a batch of simulations to `simulations.csv` in `output_dir`.
///
/// # Arguments
///
/// * `output_dir` - Folder where the file will be saved
/// * `results` - The results to write
/// * `decimal_places` - Number of decimal places to round values to
///
/// # Returns
///
/// The path to the new file
pub fn write_simulations(
    output_dir: &Path,
    results: &[SimulationResult],
    decimal_places: u32,
) -> Result<PathBuf> {
    let file_path = output_dir.join(SIMULATIONS_FILE_NAME);
    let rows = results.iter().enumerate().map(|(idx, result)| {
        (
            SimulationRow {
                simulation_id: idx + 1,
            },
            result.rounded(decimal_places),
        )
    });
    write_csv_atomic(&file_path, rows)?;

    Ok(file_path)
}

/// Write the results of a comparison to `file_path`.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `entries` - The comparison entries, in order
/// * `decimal_places` - Number of decimal places to round values to
pub fn write_comparison(
    file_path: &Path,
    entries: &[ComparisonEntry],
    decimal_places: u32,
) -> Result<()> {
    let rows = entries.iter().enumerate().map(|(idx, entry)| {
        (
            ComparisonRow {
                simulation_id: idx + 1,
                parameter: entry.parameter,
            },
            entry.simulation.rounded(decimal_places),
        )
    });

    write_csv_atomic(file_path, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::result;
    use crate::simulation::SimulationType;
    use itertools::Itertools;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    /// Read a CSV file back as a header row followed by data rows
    fn read_back(file_path: &Path) -> (csv::StringRecord, Vec<csv::StringRecord>) {
        let mut reader = csv::Reader::from_path(file_path).unwrap();
        let header = reader.headers().unwrap().clone();
        let records = reader.records().try_collect().unwrap();
        (header, records)
    }

    #[rstest]
    fn test_write_simulations(result: SimulationResult) {
        let dir = tempdir().unwrap();
        let results = [result.clone(), result];
        let file_path = write_simulations(dir.path(), &results, 2).unwrap();
        assert_eq!(file_path, dir.path().join(SIMULATIONS_FILE_NAME));

        let (header, records) = read_back(&file_path);
        assert_eq!(&header[0], "simulation_id");
        assert_eq!(&header[1], "simulation_type");
        assert_eq!(records.len(), 2);

        let column = |name| header.iter().position(|field| field == name).unwrap();
        assert_eq!(
            records.iter().map(|r| &r[0]).collect_vec(),
            ["1", "2"]
        );
        assert_eq!(&records[0][column("simulation_type")], "coverage");
        assert_eq!(&records[0][column("number_of_panels")], "3");
        assert_eq!(&records[0][column("monthly_savings_ars")], "23316.56");
        assert_eq!(&records[0][column("installed_power_kw")], "1.65");
        assert_eq!(&records[0][column("investment_amount_usd")], "");
        assert_eq!(&records[0][column("savings_model")], "generation_fixed_price");

        // Only the temporary file has been replaced
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[rstest]
    fn test_write_comparison(result: SimulationResult) {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("comparison.csv");
        let entries = [ComparisonEntry {
            kind: SimulationType::Coverage,
            parameter: dec!(50),
            simulation: result,
        }];
        write_comparison(&file_path, &entries, 0).unwrap();

        let (header, records) = read_back(&file_path);
        assert_eq!(&header[0], "simulation_id");
        assert_eq!(&header[1], "parameter");
        assert_eq!(&records[0][1], "50");
        let column = header.iter().position(|f| f == "monthly_savings_ars").unwrap();
        assert_eq!(&records[0][column], "23317");
    }

    #[rstest]
    fn test_write_replaces_existing_file(result: SimulationResult) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SIMULATIONS_FILE_NAME), "stale").unwrap();
        let file_path = write_simulations(dir.path(), &[result], 2).unwrap();

        let (_, records) = read_back(&file_path);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("missing");
        assert!(write_simulations(&output_dir, &[], 2).is_err());
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        // New directory
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // Existing but empty
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Existing and not empty
        fs::write(output_dir.join("file.txt"), "contents").unwrap();
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert_eq!(fs::read_dir(&output_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_get_output_dir() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("simple");
        fs::create_dir(&data_dir).unwrap();
        assert_eq!(
            get_output_dir(&data_dir).unwrap(),
            PathBuf::from("solarinvest_results/simple")
        );
    }
}
