use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use weatherdash::form::{DataMode, InputMode, form_error};
use weatherdash::validation::{
    validate_date_inputs, validate_location_input, validate_recent_days,
};
use weatherdash::{
    Collaborators, Dashboard, DashboardConfig, DashboardReport, FormEvent, FormState,
    OpenMeteoClient, Submission, WeatherDashError, logging, render, web,
};

/// Weather dashboard: Open-Meteo forecasts, recent days and historical ranges,
/// summarized per day
#[derive(Parser, Debug)]
#[command(name = "weatherdash", version, about)]
struct Cli {
    /// Config file (TOML). Defaults to the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and geocode a city name
    Search { query: String },
    /// Hourly forecast summarized per day
    Forecast {
        #[command(flatten)]
        location: LocationArgs,
    },
    /// The last few days up to now
    Recent {
        #[command(flatten)]
        location: LocationArgs,
        /// Days to look back (defaults to the configured value)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Historical archive for a date range
    History {
        #[command(flatten)]
        location: LocationArgs,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: String,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = true)]
struct LocationArgs {
    /// City name to geocode
    #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
    location: Option<String>,

    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<String>,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<String>,
}

impl LocationArgs {
    fn events(&self) -> Vec<FormEvent> {
        match (&self.location, &self.lat, &self.lon) {
            (Some(query), _, _) => vec![FormEvent::QueryChanged(query.clone())],
            (None, lat, lon) => vec![
                FormEvent::InputModeSelected(InputMode::Coordinates),
                FormEvent::LatitudeChanged(lat.clone().unwrap_or_default()),
                FormEvent::LongitudeChanged(lon.clone().unwrap_or_default()),
            ],
        }
    }
}

/// Checks that need no network, run before any client is built
fn precheck(form: &FormState, today: NaiveDate) -> Result<()> {
    match form.input_mode {
        InputMode::CitySearch => validate_location_input(&form.query)
            .map_err(WeatherDashError::from)?,
        InputMode::Coordinates => {
            let checked = form.clone().accept_coordinates();
            if let Some(message) = checked.error {
                return Err(WeatherDashError::validation(message).into());
            }
        }
    }

    if form.data_mode == DataMode::Historical {
        validate_date_inputs(&form.start_date, &form.end_date, today)
            .map_err(WeatherDashError::from)?;
    }
    Ok(())
}

fn collaborators(config: &DashboardConfig) -> Result<Collaborators> {
    let client = OpenMeteoClient::from_config(config)?;
    Ok(Collaborators::open_meteo(client))
}

/// Resolve the form into a submission, printing the search confirmation
async fn resolve(
    form: FormState,
    collaborators: &Collaborators,
    today: NaiveDate,
    json: bool,
) -> Result<Submission> {
    let (form, submission) = form
        .submit_resolved(collaborators.geocoder.as_ref(), today)
        .await;

    match submission {
        Some(submission) => {
            if let (Some(confirmation), false) = (&form.confirmation, json) {
                println!("{confirmation}");
            }
            Ok(submission)
        }
        None => {
            let message = form
                .error
                .unwrap_or_else(|| "Location could not be resolved".to_string());
            Err(form_error(&message).into())
        }
    }
}

fn print_report(report: &DashboardReport, json: bool) -> Result<()> {
    if json {
        println!("{}", render::format_json(report)?);
    } else {
        print!("{}", render::format_table(report));
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = DashboardConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;
    debug!("Configuration: {:?}", config);

    let today = Local::now().date_naive();

    match cli.command {
        Command::Search { query } => {
            let form = FormState::new().apply(FormEvent::QueryChanged(query));
            precheck(&form, today)?;

            let collaborators = collaborators(&config)?;
            let form = form.search(collaborators.geocoder.as_ref()).await;
            if let Some(message) = &form.error {
                return Err(form_error(message).into());
            }
            if let Some(accepted) = &form.accepted {
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(accepted)?);
                } else if let Some(confirmation) = &form.confirmation {
                    println!("{confirmation}");
                }
            }
        }
        Command::Forecast { location } => {
            let form = FormState::new().apply_all(location.events());
            precheck(&form, today)?;

            let collaborators = collaborators(&config)?;
            let submission = resolve(form, &collaborators, today, cli.json).await?;
            let dashboard = Dashboard::new(collaborators.weather, config.defaults.forecast_days);
            print_report(&dashboard.load(&submission).await?, cli.json)?;
        }
        Command::Recent { location, days } => {
            let days = validate_recent_days(days.unwrap_or(config.defaults.past_days))
                .map_err(WeatherDashError::from)?;
            let form = FormState::new().apply_all(location.events());
            precheck(&form, today)?;

            let collaborators = collaborators(&config)?;
            let submission = resolve(form, &collaborators, today, cli.json).await?;
            let dashboard = Dashboard::new(collaborators.weather, config.defaults.forecast_days);
            print_report(&dashboard.load_recent(&submission, days).await?, cli.json)?;
        }
        Command::History {
            location,
            start,
            end,
        } => {
            let mut events = location.events();
            events.extend([
                FormEvent::DataModeSelected(DataMode::Historical),
                FormEvent::StartDateChanged(start),
                FormEvent::EndDateChanged(end),
            ]);
            let form = FormState::new().apply_all(events);
            precheck(&form, today)?;

            let collaborators = collaborators(&config)?;
            let submission = resolve(form, &collaborators, today, cli.json).await?;
            let dashboard = Dashboard::new(collaborators.weather, config.defaults.forecast_days);
            print_report(&dashboard.load(&submission).await?, cli.json)?;
        }
        Command::Serve { port } => {
            let collaborators = collaborators(&config)?;
            let port = port.unwrap_or(config.server.port);
            web::run(&config, collaborators, port).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<WeatherDashError>() {
            Some(known) => {
                eprintln!("Error: {}", known.user_message());
                // 2 for input the user can correct
                if known.is_user_error() {
                    ExitCode::from(2)
                } else {
                    ExitCode::FAILURE
                }
            }
            None => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}
