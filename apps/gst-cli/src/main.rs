//! gst - Global Stocktake plot plans
//!
//! Reads a country x year dataset (a CSV in the common format, or the
//! configured PRIMAP-hist / World Bank files) and writes the plan for one
//! of the standard figures as JSON under `<output>/plots`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gst_core::{
    DataType, Dataset, GstConfig, GstError, PlotKind, Stocktake, DEFAULT_GAS, DEFAULT_SCENARIO,
    DEFAULT_SECTOR,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gst", version, about = "Plot plans for Global Stocktake data")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output folder; plans are written to its `plots` subfolder
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Distribution across countries in one year
    Histogram {
        #[command(flatten)]
        input: InputArgs,
        /// Year to plot
        #[arg(long)]
        year: Option<i32>,
    },
    /// Percentage change since a baseline year
    Change {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        year: Option<i32>,
        /// Baseline year
        #[arg(long)]
        since: Option<i32>,
    },
    /// Rolling average of annual percentage change
    Trend {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        year: Option<i32>,
        /// Number of years averaged
        #[arg(long)]
        window: Option<usize>,
    },
    /// Year in which each country peaked
    Peaking {
        #[command(flatten)]
        input: InputArgs,
        /// First year considered
        #[arg(long)]
        since: Option<i32>,
    },
    /// One line plot per country
    Facet {
        #[command(flatten)]
        input: InputArgs,
        /// Name used in the output file name; defaults to the dataset's
        #[arg(long)]
        plot_name: Option<String>,
    },
    /// Gas by sector overview of NDC coverage
    Ndc {
        /// Count "no information" as not covered
        #[arg(long)]
        pessimistic: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// CSV file in the common format; the configured dataset is used if omitted
    file: Option<PathBuf>,

    /// PRIMAP-hist gas, e.g. "CO2"
    #[arg(long, conflicts_with = "file")]
    gas: Option<String>,

    /// PRIMAP-hist sector code, e.g. "1.A"
    #[arg(long, conflicts_with = "file")]
    sector: Option<String>,

    /// Plot absolute values or intensities
    #[arg(long, value_enum)]
    data_type: Option<DataTypeArg>,

    /// Variable name for titles; defaults to the dataset's
    #[arg(short, long)]
    variable: Option<String>,

    /// Remove outliers outside Tukey's fences before binning
    #[arg(long)]
    remove_outliers: bool,

    /// Country code to highlight
    #[arg(long)]
    highlight: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DataTypeArg {
    Absolute,
    PerCapita,
    PerUsd,
}

impl From<DataTypeArg> for DataType {
    fn from(arg: DataTypeArg) -> Self {
        match arg {
            DataTypeArg::Absolute => DataType::Absolute,
            DataTypeArg::PerCapita => DataType::PerCapita,
            DataTypeArg::PerUsd => DataType::PerUsd,
        }
    }
}

impl InputArgs {
    fn apply(&self, config: &mut GstConfig) {
        if let Some(file) = &self.file {
            config.dataset = Dataset::Table { path: file.clone() };
        } else if self.gas.is_some() || self.sector.is_some() {
            let (scenario, gas, sector) = match &config.dataset {
                Dataset::Primap {
                    scenario,
                    gas,
                    sector,
                } => (scenario.clone(), gas.clone(), sector.clone()),
                _ => (
                    Some(DEFAULT_SCENARIO.to_string()),
                    DEFAULT_GAS.to_string(),
                    DEFAULT_SECTOR.to_string(),
                ),
            };
            config.dataset = Dataset::Primap {
                scenario,
                gas: self.gas.clone().unwrap_or(gas),
                sector: self.sector.clone().unwrap_or(sector),
            };
        }

        if let Some(data_type) = self.data_type {
            config.analysis.data_type = data_type.into();
        }
        if self.remove_outliers {
            config.histogram.remove_outliers = true;
        }
        if let Some(country) = &self.highlight {
            config.analysis.country_to_highlight = Some(country.clone());
        }
    }
}

/// What a command did
#[derive(Debug, PartialEq)]
enum Outcome {
    /// A plan was written
    Written(PathBuf),
    /// Nothing was written; the reason is shown to the user
    Skipped(String),
    /// Output went to stdout
    Printed,
}

fn load_config(cli: &Cli) -> Result<GstConfig, GstError> {
    let mut config = match &cli.config {
        Some(path) => GstConfig::from_file(path)?,
        None => GstConfig::default(),
    };
    if let Some(output) = &cli.output {
        config.data.output_folder = output.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<Outcome, GstError> {
    let mut config = load_config(&cli)?;

    let (input, kind) = match &cli.command {
        Command::Histogram { input, year } => {
            if let Some(year) = year {
                config.analysis.year_of_interest = *year;
            }
            (input, Some(PlotKind::Distribution))
        }
        Command::Change { input, year, since } => {
            if let Some(year) = year {
                config.analysis.year_of_interest = *year;
            }
            if let Some(since) = since {
                config.analysis.baseline_year = *since;
            }
            (input, Some(PlotKind::ChangeSinceBaseline))
        }
        Command::Trend {
            input,
            year,
            window,
        } => {
            if let Some(year) = year {
                config.analysis.year_of_interest = *year;
            }
            if let Some(window) = window {
                config.analysis.trend_years = *window;
            }
            (input, Some(PlotKind::Trend))
        }
        Command::Peaking { input, since } => {
            if let Some(since) = since {
                config.analysis.peaking_start_year = *since;
            }
            (input, Some(PlotKind::Peaking))
        }
        Command::Facet { input, .. } => (input, None),
        Command::Ndc { pessimistic } => {
            let stocktake = Stocktake::new(config)?;
            let plan = stocktake.ndc_plan(!pessimistic)?;
            return stocktake.export(&plan).map(Outcome::Written);
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            return Ok(Outcome::Printed);
        }
    };
    input.apply(&mut config);

    let stocktake = Stocktake::new(config)?;
    let loaded = stocktake.load()?;
    let variable = input
        .variable
        .clone()
        .unwrap_or_else(|| loaded.variable.clone());

    let written = match kind {
        Some(kind) => stocktake.run(kind, &loaded.table, &variable),
        None => {
            let plot_name = match &cli.command {
                Command::Facet {
                    plot_name: Some(name),
                    ..
                } => name.as_str(),
                _ => loaded.plot_name.as_str(),
            };
            stocktake.export(&stocktake.facet_plan(&loaded.table, &variable, plot_name))
        }
    };

    match written {
        Ok(path) => Ok(Outcome::Written(path)),
        Err(e) if e.is_degenerate() => {
            tracing::warn!("{}", e);
            Ok(Outcome::Skipped(e.to_string()))
        }
        Err(e) => Err(e),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // warnings are shown unless RUST_LOG asks for something else
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse())? {
        Outcome::Written(path) => println!("{}", path.display()),
        Outcome::Skipped(reason) => eprintln!("No plot written: {}", reason),
        Outcome::Printed => {}
    }
    Ok(())
}
