//! The command line interface for the calculator.
use crate::calculator::InvestmentCalculator;
use crate::comparison::{ComparisonEntry, ComparisonRequest, ComparisonSummary, compare, summarise};
use crate::dataset::Dataset;
use crate::exchange_rate::RateProvider;
use crate::input::simulation::SIMULATIONS_FILE_NAME;
use crate::log;
use crate::output::{create_output_directory, get_output_dir, write_comparison, write_simulations};
use crate::settings::Settings;
use crate::project::ProjectID;
use crate::simulation::{Demand, SimulationMode, SimulationRequest, SimulationResult};
use crate::units::{Capacity, Dimensionless, Usd};
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the calculator.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Which customer and installation to simulate
#[derive(Args)]
pub struct CustomerOpts {
    /// ID of the project to invest in
    #[arg(long)]
    pub project: String,
    /// ID of the customer's tariff category
    #[arg(long)]
    pub tariff: String,
    /// The customer's monthly demand
    #[command(flatten)]
    pub demand: DemandOpts,
}

/// What coverage is measured against
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct DemandOpts {
    /// The customer's monthly electricity bill in ARS
    #[arg(long)]
    pub bill: Option<Decimal>,
    /// The customer's monthly electricity consumption in kWh
    #[arg(long)]
    pub consumption: Option<Decimal>,
}

impl DemandOpts {
    /// Convert to a [`Demand`], checking it is valid
    pub fn demand(&self) -> Result<Demand> {
        Demand::from_fields(self.bill, self.consumption)
    }
}

/// What to size a single simulation against
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct ModeOpts {
    /// Percentage of the monthly bill or consumption to cover
    #[arg(long)]
    pub coverage: Option<Decimal>,
    /// Number of panels to buy
    #[arg(long)]
    pub panels: Option<u32>,
    /// Amount to invest in USD
    #[arg(long)]
    pub investment: Option<Decimal>,
}

/// Options for the simulate command
#[derive(Args)]
pub struct SimulateOpts {
    /// The customer
    #[command(flatten)]
    pub customer: CustomerOpts,
    /// The simulation target
    #[command(flatten)]
    pub mode: ModeOpts,
    /// The customer's email address
    #[arg(long)]
    pub email: Option<String>,
}

/// Options for the compare command
#[derive(Args)]
pub struct CompareOpts {
    /// The customer
    #[command(flatten)]
    pub customer: CustomerOpts,
    /// Percentages of the monthly bill or consumption to cover (may be repeated)
    #[arg(long)]
    pub coverage: Vec<Decimal>,
    /// Numbers of panels to buy (may be repeated)
    #[arg(long)]
    pub panels: Vec<u32>,
    /// Amounts to invest in USD (may be repeated)
    #[arg(long)]
    pub investment: Vec<Decimal>,
    /// CSV file to write results to. If omitted, results are printed to the console.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation.
    Simulate {
        /// Path to the data directory.
        data_dir: PathBuf,
        /// Simulation options
        #[command(flatten)]
        opts: SimulateOpts,
    },
    /// Compare several scenarios for one customer.
    Compare {
        /// Path to the data directory.
        data_dir: PathBuf,
        /// Comparison options
        #[command(flatten)]
        opts: CompareOpts,
    },
    /// Run the simulation requests stored in a data directory.
    Run {
        /// Path to the data directory.
        data_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a data directory.
    Validate {
        /// Path to the data directory.
        data_dir: PathBuf,
    },
    /// Show the exchange rate simulations will use.
    ExchangeRate {
        /// Path to the data directory.
        data_dir: PathBuf,
    },
    /// Manage example datasets.
    Example {
        /// The available subcommands for managing example datasets.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Simulate { data_dir, opts } => handle_simulate_command(&data_dir, &opts, None),
            Self::Compare { data_dir, opts } => handle_compare_command(&data_dir, &opts, None),
            Self::Run { data_dir, opts } => handle_run_command(&data_dir, &opts, None),
            Self::Validate { data_dir } => handle_validate_command(&data_dir, None),
            Self::ExchangeRate { data_dir } => handle_exchange_rate_command(&data_dir, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ solarinvest --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Initialise the program logger without log files
fn init_console_logging(settings: &Settings) -> Result<()> {
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")
}

/// Log a warning if the project can't supply the power a result needs
fn check_capacity(dataset: &Dataset, result: &SimulationResult) -> Result<()> {
    let calculator = dataset.calculator(&result.project_id.0, &result.tariff_id.0)?;
    let report = calculator.capacity_check(result.installed_power_kw);
    if report.has_capacity {
        info!(
            "Project {} has capacity for {} kW ({}% of the {} kW available)",
            result.project_id,
            report.required_power_kw,
            report.utilization_pct.value().round_dp(1),
            report.available_power_kw
        );
    } else {
        warn!(
            "Project {} only has {} kW available but {} kW is required",
            result.project_id, report.available_power_kw, report.required_power_kw
        );
    }

    Ok(())
}

/// Handle the `simulate` command.
pub fn handle_simulate_command(
    data_path: &Path,
    opts: &SimulateOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    init_console_logging(&settings)?;

    let dataset = Dataset::from_path(data_path).context("Failed to load dataset.")?;
    let result = simulate(&dataset, opts)?;
    check_capacity(&dataset, &result)?;
    print!("{}", simulation_toml(&result, settings.decimal_places)?);

    Ok(())
}

/// Run the single simulation described by `opts`
pub fn simulate(dataset: &Dataset, opts: &SimulateOpts) -> Result<SimulationResult> {
    let customer = &opts.customer;
    let request = SimulationRequest {
        project_id: customer.project.as_str().into(),
        tariff_id: customer.tariff.as_str().into(),
        demand: customer.demand.demand()?,
        mode: SimulationMode::from_fields(
            opts.mode.coverage,
            opts.mode.panels,
            opts.mode.investment,
        )?,
        user_email: opts.email.clone(),
    };

    dataset
        .calculator(&customer.project, &customer.tariff)?
        .simulate_request(&request)
}

/// Render a result as TOML for the console
pub fn simulation_toml(result: &SimulationResult, decimal_places: u32) -> Result<String> {
    toml::to_string(&result.rounded(decimal_places)).context("Could not convert result to TOML")
}

/// The project a comparison was run against
#[derive(Serialize)]
struct ProjectSummary<'a> {
    id: &'a ProjectID,
    name: &'a str,
    available_power_kw: Capacity,
}

/// One scenario of a comparison, with the parameter it was run for
#[derive(Serialize)]
struct ComparisonRecord {
    parameter: Decimal,
    #[serde(flatten)]
    simulation: SimulationResult,
}

/// Results of the `compare` command when printed to the console
#[derive(Serialize)]
struct ComparisonOutput<'a> {
    project: ProjectSummary<'a>,
    summary: ComparisonSummary,
    simulations: Vec<ComparisonRecord>,
}

/// Render a comparison as TOML for the console.
///
/// Each simulation carries its type and parameter so it can be told apart from the others.
pub fn comparison_toml(
    calculator: &InvestmentCalculator,
    entries: &[ComparisonEntry],
    decimal_places: u32,
) -> Result<String> {
    let project = calculator.project();
    let output = ComparisonOutput {
        project: ProjectSummary {
            id: &project.id,
            name: &project.name,
            available_power_kw: project.available_power_kw,
        },
        summary: summarise(entries),
        simulations: entries
            .iter()
            .map(|entry| ComparisonRecord {
                parameter: entry.parameter,
                simulation: entry.simulation.rounded(decimal_places),
            })
            .collect(),
    };

    toml::to_string(&output).context("Could not convert comparison to TOML")
}

/// Handle the `compare` command.
pub fn handle_compare_command(
    data_path: &Path,
    opts: &CompareOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    init_console_logging(&settings)?;

    let dataset = Dataset::from_path(data_path).context("Failed to load dataset.")?;
    let customer = &opts.customer;
    let calculator = dataset.calculator(&customer.project, &customer.tariff)?;
    let request = ComparisonRequest {
        coverage_percentages: opts.coverage.iter().copied().map(Dimensionless).collect(),
        panel_quantities: opts.panels.clone(),
        investment_amounts: opts.investment.iter().copied().map(Usd).collect(),
    };

    let entries = compare(&calculator, customer.demand.demand()?, &request)?;
    let summary = summarise(&entries);
    let dp = settings.decimal_places;
    info!(
        "Compared {} scenarios: average investment {} USD, average payback {} years, average ROI \
        {}%",
        summary.count,
        summary.average_investment_usd.round_dp(dp),
        summary.average_payback_years.round_dp(dp),
        summary.average_roi_annual.value().round_dp(dp)
    );

    if let Some(output) = &opts.output {
        write_comparison(output, &entries, dp)?;
        info!("Comparison written to {}", output.display());
    } else {
        print!("{}", comparison_toml(&calculator, &entries, dp)?);
    }

    Ok(())
}

/// Handle the `run` command.
pub fn handle_run_command(
    data_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(data_path)?;
        &pathbuf
    };

    let overwrite = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(Some(&settings.log_level), Some(output_path))
        .context("Failed to initialise logging.")?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let dataset = Dataset::from_path(data_path).context("Failed to load dataset.")?;
    info!("Output folder: {}", output_path.display());
    info!("Using an exchange rate of {} ARS/USD", dataset.latest_exchange_rate());

    let requests = dataset.read_simulation_requests()?;
    let results = dataset.simulate_requests(&requests)?;
    for result in &results {
        check_capacity(&dataset, result)?;
    }

    let file_path = write_simulations(output_path, &results, settings.decimal_places)?;
    info!(
        "{} simulations complete! Results written to {}",
        results.len(),
        file_path.display()
    );

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(data_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // We won't save log files when running the validate command
    init_console_logging(&settings)?;

    let dataset = Dataset::from_path(data_path).context("Failed to validate dataset.")?;
    if data_path.join(SIMULATIONS_FILE_NAME).is_file() {
        let requests = dataset
            .read_simulation_requests()
            .context("Failed to validate simulation requests.")?;
        info!("Found {} valid simulation requests", requests.len());
    }
    info!("Dataset validation successful!");

    Ok(())
}

/// Handle the `exchange-rate` command.
pub fn handle_exchange_rate_command(data_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;
    init_console_logging(&settings)?;

    let dataset = Dataset::from_path(data_path).context("Failed to load dataset.")?;
    println!("{}", exchange_rate_message(&dataset));

    Ok(())
}

/// Describe the exchange rate a dataset's simulations will use, and where it came from
pub fn exchange_rate_message(dataset: &Dataset) -> String {
    match dataset.exchange_rates.iter().next() {
        Some(quote) => format!("{} ARS/USD ({}, {})", quote.rate, quote.source, quote.date),
        None => format!("{} ARS/USD (default)", dataset.exchange_rates.latest_rate()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{parameters, project, tariff};
    use crate::parameters::EngineParameters;
    use crate::project::Project;
    use crate::tariff::TariffCategory;
    use crate::units::{Ars, ArsPerUsd, Energy};
    use itertools::Itertools;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    /// Parse the options for a `simulate` command line
    fn parse_simulate(args: &[&str]) -> Result<SimulateOpts, clap::Error> {
        let cli = Cli::try_parse_from(
            ["solarinvest", "simulate", "data", "--project", "mendoza_norte"]
                .iter()
                .chain(args),
        )?;
        match cli.command {
            Some(Commands::Simulate { opts, .. }) => Ok(opts),
            _ => panic!("Expected simulate command"),
        }
    }

    #[test]
    fn test_simulate_demand_args() {
        let opts = parse_simulate(&["--tariff", "RES", "--bill", "50000", "--panels", "3"]).unwrap();
        assert_eq!(
            opts.customer.demand.demand().unwrap(),
            Demand::Bill(Ars(dec!(50000)))
        );

        let opts =
            parse_simulate(&["--tariff", "RES", "--consumption", "350", "--coverage", "50"])
                .unwrap();
        assert_eq!(
            opts.customer.demand.demand().unwrap(),
            Demand::Consumption(Energy(dec!(350)))
        );

        // Exactly one of the two is needed
        assert!(
            parse_simulate(&[
                "--tariff",
                "RES",
                "--bill",
                "50000",
                "--consumption",
                "350",
                "--panels",
                "3"
            ])
            .is_err()
        );
        assert!(parse_simulate(&["--tariff", "RES", "--panels", "3"]).is_err());
    }

    #[rstest]
    fn test_comparison_toml(project: Project, tariff: TariffCategory, parameters: EngineParameters) {
        let calc = InvestmentCalculator::new(&project, &tariff, &parameters, &ArsPerUsd(dec!(1330)));
        let request = ComparisonRequest {
            coverage_percentages: vec![Dimensionless(dec!(50))],
            panel_quantities: vec![12],
            investment_amounts: vec![Usd(dec!(5000))],
        };
        let entries = compare(&calc, Ars(dec!(50000)), &request).unwrap();
        let output: toml::Table =
            toml::from_str(&comparison_toml(&calc, &entries, 2).unwrap()).unwrap();

        let project_table = output["project"].as_table().unwrap();
        assert_eq!(project_table["id"].as_str(), Some("mendoza_norte"));
        assert_eq!(
            project_table["name"].as_str(),
            Some("Parque Solar Mendoza Norte")
        );
        assert_eq!(project_table["available_power_kw"].as_str(), Some("400"));
        assert_eq!(output["summary"]["count"].as_integer(), Some(3));

        let simulations = output["simulations"].as_array().unwrap();
        assert_eq!(
            simulations
                .iter()
                .map(|sim| (
                    sim["simulation_type"].as_str().unwrap(),
                    sim["parameter"].as_str().unwrap()
                ))
                .collect_vec(),
            [("coverage", "50"), ("panels", "12"), ("investment", "5000")]
        );
        assert_eq!(simulations[0]["number_of_panels"].as_integer(), Some(3));
    }

    #[rstest]
    fn test_simulation_toml(project: Project, tariff: TariffCategory, parameters: EngineParameters) {
        let calc = InvestmentCalculator::new(&project, &tariff, &parameters, &ArsPerUsd(dec!(1330)));
        let result = calc
            .simulate_by_bill_coverage(Energy(dec!(350)), Dimensionless(dec!(50)))
            .unwrap();
        let output: toml::Table = toml::from_str(&simulation_toml(&result, 2).unwrap()).unwrap();

        assert_eq!(output["monthly_consumption_kwh"].as_str(), Some("350"));
        assert!(!output.contains_key("monthly_bill_ars"));
        assert_eq!(output["coverage_achieved"].as_str(), Some("50.09"));
    }
}
