use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use skycast_core::{AppError, Config};
use skycast_state::{App, RefreshSummary, SettingField};
use skycast_weather::{AnalyticsSeries, WeatherSnapshot};

#[derive(Parser)]
#[command(name = "skycast")]
#[command(author, version, about = "Track weather for multiple cities", long_about = None)]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch favourites plus the given cities and show current conditions
    Fetch {
        /// City names, as typed
        cities: Vec<String>,
    },

    /// Star or unstar a city
    Favourite {
        city: String,
    },

    /// List starred cities
    Favourites,

    /// Change a preference (temperature_unit, wind_speed_unit, theme)
    Set {
        field: SettingField,
        value: String,
    },

    /// Show current preferences
    Settings,

    /// Show the 24-hour analytics view
    Analytics {
        /// Cities to fetch in addition to favourites
        cities: Vec<String>,

        /// City to analyse; defaults to the first favourite
        #[arg(long)]
        city: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let cli = Cli::parse();

    let app = match bootstrap() {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            bail!("{}", e.user_message());
        }
    };

    match cli.command {
        Commands::Fetch { cities } => {
            let summary = fetch(&app, &cities).await;
            if cli.json {
                let cities = app.all_cities();
                let snapshots: Vec<&WeatherSnapshot> = cities.iter().map(|s| s.as_ref()).collect();
                println!("{}", serde_json::to_string_pretty(&snapshots)?);
            } else {
                for snapshot in app.all_cities().iter() {
                    print_card(&app, snapshot);
                }
                print_failures(&summary);
            }
        }
        Commands::Favourite { city } => {
            if app.toggle_favourite(&city) {
                println!("★ {} added to favourites", city);
            } else {
                println!("☆ {} removed from favourites", city);
            }
        }
        Commands::Favourites => {
            let favourites = app.favourites();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&*favourites)?);
            } else if favourites.is_empty() {
                println!("No favourites yet. Star one with `skycast favourite <CITY>`.");
            } else {
                for city in favourites.iter() {
                    println!("★ {}", city);
                }
            }
        }
        Commands::Set { field, value } => {
            if !app.set_setting(field, &value) {
                bail!("'{}' is not a valid value for {}", value, field);
            }
            println!("{} = {}", field, app.settings().value_of(field));
        }
        Commands::Settings => {
            let settings = app.settings();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                for field in SettingField::ALL {
                    println!("{:<18}{}", field, settings.value_of(field));
                }
                println!("{:<18}{}", "unit_symbol", app.unit_symbol());
            }
        }
        Commands::Analytics { cities, city } => {
            let summary = fetch(&app, &cities).await;
            app.select_analytics_city(city.as_deref());

            match app.analytics() {
                Some(series) if cli.json => {
                    println!("{}", serde_json::to_string_pretty(&*series)?);
                }
                Some(series) => print_analytics(&app, &series),
                None => {
                    println!(
                        "Fetch a city first to see analytics, e.g. `skycast analytics London`."
                    );
                }
            }
            if !cli.json {
                print_failures(&summary);
            }
        }
    }

    Ok(())
}

/// Load configuration and open the application state.
fn bootstrap() -> Result<App, AppError> {
    let (config, _validation) = Config::load_validated()?;
    App::open(config)
}

/// Fetch favourites that are not cached plus `cities`, all-settled.
async fn fetch(app: &App, cities: &[String]) -> RefreshSummary {
    let mut summary = app.sync_favourites().await;
    summary.outcomes.extend(app.fetch_cities(cities).await.outcomes);
    summary
}

fn print_card(app: &App, snapshot: &WeatherSnapshot) {
    let unit = snapshot.units.symbol();
    let star = if app.is_favourite(&snapshot.city) { "★" } else { " " };
    let current = &snapshot.current;

    println!("{} {}, {}", star, snapshot.city, snapshot.country);
    println!(
        "    {:.1}{} (feels like {:.1}{}), {}",
        current.temp, unit, current.feels_like, unit, current.description
    );
    println!(
        "    humidity {}%  wind {}  clouds {}%  uv {}",
        current.humidity,
        app.wind_speed_display(current.wind_speed_kph),
        current.clouds,
        current.uv_index
    );

    for day in &snapshot.daily {
        let date = chrono::DateTime::from_timestamp(day.epoch_seconds, 0)
            .map(|d| d.format("%a %d %b").to_string())
            .unwrap_or_default();
        println!(
            "    {:<12}{:>6.1}{} / {:>6.1}{}  {:>3}% rain  {}",
            date, day.temp_max, unit, day.temp_min, unit, day.precipitation_chance, day.description
        );
    }
    println!();
}

fn print_analytics(app: &App, series: &AnalyticsSeries) {
    let unit = series.units.symbol();
    let summary = &series.summary;

    println!("24-hour analysis for {}", series.city);
    println!(
        "  avg {:.1}{}  max {:.1}{}  min {:.1}{}",
        summary.avg_temp, unit, summary.max_temp, unit, summary.min_temp, unit
    );
    println!(
        "  humidity {}% ({})",
        summary.avg_humidity,
        summary.humidity_level().as_str()
    );
    println!(
        "  wind at noon {}  peak {}",
        app.wind_speed_display(series.midday_wind()),
        app.wind_speed_display(series.peak_wind())
    );
    println!();

    for point in &series.points {
        println!(
            "  {:>6}  {:>6.1}{}  {:>3}%  {}",
            point.time_label,
            point.temp,
            unit,
            point.humidity,
            app.wind_speed_display(point.wind_speed_kph)
        );
    }
}

fn print_failures(summary: &RefreshSummary) {
    for (city, message) in summary.failures() {
        eprintln!("✗ {}: {}", city, message);
    }
}
