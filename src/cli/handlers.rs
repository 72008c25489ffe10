use anyhow::{Context, Result, bail};
use log::info;
use rusqlite::Connection;
use std::sync::Arc;

use crate::cli::args::GeoCommands;
use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::geo::{
    City, Country, GeoUpstream, ProxyGeoClient, State, cities_path, countries_path, decode_list,
    states_path,
};
use crate::models::DailyTimings;
use crate::notify::{AMBER, BOLD, DIM, GOLD, GREEN, TerminalNotifier, println_colored};
use crate::prayer_times::{AladhanClient, NextPrayer};
use crate::session::{Command, Event, Session};
use crate::utils::format::{format_duration_secs, format_time, pad_label};

pub fn build_session(conn: Connection, config: &AppConfig) -> Arc<Session> {
    Session::new(
        conn,
        Arc::new(SystemClock),
        Arc::new(AladhanClient::new(&config.api.prayer_base_url)),
        Arc::new(TerminalNotifier),
    )
}

// ─── Companion ───────────────────────────────────────────────────────────────

pub async fn handle_run(session: Arc<Session>) -> Result<()> {
    session.start().await?;
    println_colored!(DIM, "  vsadhkar is running. Press Ctrl+C to stop.");
    if let Some(status) = session.status_text().await {
        println_colored!(AMBER, "  Next: {}", status);
    }

    tokio::signal::ctrl_c()
        .await
        .context("Listening for Ctrl+C")?;
    session.shutdown().await;
    println!();
    Ok(())
}

// ─── Dispatched commands ─────────────────────────────────────────────────────

pub async fn handle_message(session: &Arc<Session>, name: &str, args: &[&str]) -> Result<()> {
    let command = Command::from_name(name, args)?;
    info!("Running {}", command.name());

    match session.dispatch(command).await {
        // the notifier has already shown the text
        Event::DhikrShown { .. } => {}
        Event::Times { timings, next } => print_times(session, &timings, next.as_ref()),
        Event::Refreshed(timings) => {
            println_colored!(
                GREEN,
                "  ✓ Prayer times updated for {} ({})",
                timings.location,
                timings.method.authority()
            );
            print_times(session, &timings, session.next_prayer().await.as_ref());
        }
        Event::Superseded => {
            println_colored!(DIM, "  A newer request replaced this one.");
        }
        Event::SettingSaved(setting) => {
            println_colored!(GREEN, "  ✓ Saved {}", setting);
        }
        Event::Failed(reason) => bail!("{} did not complete: {}", name, reason),
    }
    Ok(())
}

fn print_times(session: &Session, timings: &DailyTimings, next: Option<&NextPrayer>) {
    let now = session.now().time();

    println!();
    println_colored!(
        GOLD,
        "  Prayer Times · {} ({}, {} AH)",
        timings.location,
        timings.date.format("%Y-%m-%d"),
        timings.hijri
    );
    println!();

    for (prayer, time) in timings.times.entries() {
        let line = format!("{}  {}", pad_label(prayer.display_name(), 10), format_time(*time));
        if *time <= now {
            println_colored!(DIM, "  {}", line);
        } else {
            println_colored!(BOLD, "  {}", line);
        }
    }

    if let Some(next) = next {
        println!();
        println_colored!(
            AMBER,
            "  Next: {} in {}",
            next.prayer,
            format_duration_secs(next.remaining.num_seconds())
        );
    }
    println!();
}

// ─── Settings ────────────────────────────────────────────────────────────────

pub fn handle_settings(session: &Session) -> Result<()> {
    let settings = session.settings()?;

    println!();
    println_colored!(GOLD, "  Settings");
    println!();
    if settings.location.is_complete() {
        println!("  Location       {}", settings.location);
    } else {
        println_colored!(AMBER, "  Location       not set");
    }
    println!(
        "  Method         {} ({})",
        settings.method.id(),
        settings.method.authority()
    );
    println!("  Reminders      every {}", settings.interval.as_str());
    if settings.notification_lead == 0 {
        println!("  Prayer notice  off");
    } else {
        println!(
            "  Prayer notice  {} min before",
            settings.notification_lead
        );
    }
    println!("  Language       {}", settings.language.as_str());
    println!();
    Ok(())
}

// ─── Geo lookup ──────────────────────────────────────────────────────────────

pub async fn handle_geo(config: &AppConfig, action: &GeoCommands) -> Result<()> {
    let proxy = ProxyGeoClient::new(&config.api.proxy_url);
    let unreachable = || format!("Querying the geo proxy at {}", config.api.proxy_url);

    println!();
    match action {
        GeoCommands::Countries => {
            let value = proxy.fetch(&countries_path()).await.with_context(unreachable)?;
            for country in decode_list::<Country>("countries", value)? {
                println!("  {}  {}", pad_label(&country.iso2, 3), country.name);
            }
        }
        GeoCommands::States { country } => {
            let value = proxy
                .fetch(&states_path(country)?)
                .await
                .with_context(unreachable)?;
            for state in decode_list::<State>("states", value)? {
                println!("  {}  {}", pad_label(&state.iso2, 3), state.name);
            }
        }
        GeoCommands::Cities { country, state } => {
            let value = proxy
                .fetch(&cities_path(country, state)?)
                .await
                .with_context(unreachable)?;
            let cities = decode_list::<City>("cities", value)?;
            if cities.is_empty() {
                println_colored!(DIM, "  No cities listed for {}/{}", country, state);
            }
            for city in cities {
                println!("  {}", city.name);
            }
        }
    }
    println!();
    Ok(())
}
