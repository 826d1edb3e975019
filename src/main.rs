//! UnicalRent command line client
//!
//! Browse vehicles, check availability, quote and book, list and cancel
//! bookings against the rental API.

use anyhow::{bail, Context};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unicalrent::{
    api::RentalApi,
    config::AppConfig,
    models::{BookingDraft, BookingFilter},
    services::{availability::AvailabilityState, bookings::SubmitOutcome, pricing},
    Session,
};

#[derive(Parser)]
#[command(name = "unicalrent", version, about = "UnicalRent vehicle booking client")]
struct Cli {
    /// Bearer token from the identity provider
    #[arg(long, env = "UNICALRENT_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List active vehicles
    Vehicles,
    /// Show the available and occupied dates of a vehicle
    Availability { vehicle_id: i64 },
    /// Price a booking without submitting it
    Quote {
        vehicle_id: i64,
        /// Start, YYYY-MM-DDTHH:MM
        start: String,
        /// End, YYYY-MM-DDTHH:MM
        end: String,
    },
    /// Book a vehicle
    Book {
        vehicle_id: i64,
        start: String,
        end: String,
    },
    /// List your bookings
    Bookings {
        /// all, active, completed or cancelled
        #[arg(long, default_value = "all")]
        filter: BookingFilter,
    },
    /// Cancel one of your bookings
    Cancel {
        booking_id: i64,
        /// Confirm without asking, penalty included
        #[arg(long)]
        yes: bool,
    },
    /// Forget the stored token
    Logout,
}

fn parse_instant(raw: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .with_context(|| format!("Invalid date-time '{}', expected YYYY-MM-DDTHH:MM", raw))
}

/// Fill a draft field by field, as a form would
fn fill_draft(
    vehicle_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
    now: NaiveDateTime,
) -> anyhow::Result<BookingDraft> {
    let mut draft = BookingDraft::for_vehicle(vehicle_id);
    draft.set_start_date(start.date(), now)?;
    draft.set_start_time(start.time(), now)?;
    draft.set_end_date(end.date(), now)?;
    draft.set_end_time(end.time(), now)?;
    Ok(draft)
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("unicalrent={}", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if cli.token.is_some() {
        config.auth.token = cli.token.clone();
    }

    init_tracing(&config);
    tracing::debug!("unicalrent v{}", env!("CARGO_PKG_VERSION"));

    let session = Session::connect(config)?;
    let now = Local::now().naive_local();

    match cli.command {
        Command::Vehicles => {
            for v in session.api.list_vehicles().await? {
                println!(
                    "{:>4}  {:<32} {:<8} €{}/h",
                    v.id,
                    v.label(),
                    v.kind.to_string(),
                    v.hourly_rate
                );
            }
        }
        Command::Availability { vehicle_id } => {
            match session.services.availability.select_vehicle(Some(vehicle_id)).await {
                AvailabilityState::Ready(window) => {
                    for date in window.available() {
                        println!("{}  available", date);
                    }
                    for date in window.occupied() {
                        println!("{}  occupied", date);
                    }
                }
                _ => bail!("Availability of vehicle {} could not be loaded", vehicle_id),
            }
        }
        Command::Quote {
            vehicle_id,
            start,
            end,
        } => {
            let draft = fill_draft(vehicle_id, parse_instant(&start)?, parse_instant(&end)?, now)?;
            let vehicle = session.api.get_vehicle(vehicle_id).await?;
            println!(
                "{}: €{}",
                vehicle.label(),
                pricing::draft_total(Some(&vehicle), &draft)
            );
        }
        Command::Book {
            vehicle_id,
            start,
            end,
        } => {
            let mut draft =
                fill_draft(vehicle_id, parse_instant(&start)?, parse_instant(&end)?, now)?;

            let bookings = &session.services.bookings;
            bookings.begin_flow().await;
            let availability = session
                .services
                .availability
                .select_vehicle(Some(vehicle_id))
                .await;

            let outcome = bookings.submit(&mut draft, availability.window(), now).await;
            if let Some(notice) = outcome.notice() {
                println!("{}", notice);
            }
            match outcome {
                SubmitOutcome::Created {
                    booking: Some(booking),
                    ..
                } => {
                    println!(
                        "Booking #{}: {} → {}, €{}",
                        booking.id, booking.start, booking.end, booking.total_cost
                    );
                }
                SubmitOutcome::Created { booking: None, .. } => {
                    println!("See `unicalrent bookings` for the details");
                }
                SubmitOutcome::PaymentMethodRequired { .. } => {
                    bail!("Add a credit card to your profile before booking")
                }
                SubmitOutcome::Invalid(e) => bail!("{}", e),
                SubmitOutcome::Rejected(_) => bail!("Booking not created"),
            }
        }
        Command::Bookings { filter } => {
            for b in session.services.bookings.list_bookings(filter).await? {
                let vehicle = b
                    .vehicle
                    .as_ref()
                    .map(|v| v.label())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{:<5} {:<10} {} → {} ({})  {}  €{}",
                    b.id,
                    b.status.to_string(),
                    b.start,
                    b.end,
                    b.duration_label(),
                    vehicle,
                    b.total_cost
                );
            }
        }
        Command::Cancel { booking_id, yes } => {
            let mut booking = session
                .services
                .bookings
                .list_bookings(BookingFilter::All)
                .await?
                .into_iter()
                .find(|b| b.id == booking_id)
                .with_context(|| format!("Booking {} not found", booking_id))?;

            let cancellations = &session.services.cancellations;
            let quote = cancellations.prepare(&booking, now)?;
            println!("{}", quote.confirmation_prompt());
            if !yes {
                bail!("Re-run with --yes to confirm");
            }

            let outcome = cancellations.confirm(&mut booking, &quote).await?;
            println!("{}", outcome.notice);
        }
        Command::Logout => {
            session.logout()?;
            println!("Signed out");
        }
    }

    Ok(())
}
