use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use dawaai_lib::adherence;
use dawaai_lib::config;
use dawaai_lib::db::repository::{
    doses_taken_on, fetch_intake_history, fetch_medicines, find_medicine_by_name, insert_medicine,
    record_dose,
};
use dawaai_lib::db::sqlite::open_database;
use dawaai_lib::models::{Medicine, ReminderKind, StockUnit};
use dawaai_lib::scan::{ScanOutcome, ScanService};
use dawaai_lib::schedule;

#[derive(Parser)]
#[command(name = "dawaai", version, about = "Local medication companion: scan, remind, track")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve scanned package text (from a file, or stdin when omitted)
    Scan {
        /// Text file holding the OCR output
        file: Option<PathBuf>,
        /// Dictionary JSON to use instead of the bundled seed
        #[arg(long)]
        dictionary: Option<PathBuf>,
    },
    /// Add a medication to the local list
    Add {
        name: String,
        #[arg(long)]
        dosage: String,
        #[arg(long, default_value = "Once a day")]
        frequency: String,
        /// Dose slot like "8:00 AM"; repeat for several doses a day
        #[arg(long = "slot", required = true)]
        slots: Vec<String>,
        #[arg(long, default_value_t = 0)]
        stock: i64,
        #[arg(long, default_value = "tablets")]
        unit: String,
    },
    /// List medications with today's dose status
    List,
    /// Record a dose as taken now
    Take { name: String, slot: String },
    /// Show today's upcoming reminders
    Due,
    /// Show schedule-drift hints from recent intake history
    Adherence,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scan { file, dictionary } => cmd_scan(file, dictionary),
        Command::Add {
            name,
            dosage,
            frequency,
            slots,
            stock,
            unit,
        } => cmd_add(name, dosage, frequency, slots, stock, unit),
        Command::List => cmd_list(),
        Command::Take { name, slot } => cmd_take(name, slot),
        Command::Due => cmd_due(),
        Command::Adherence => cmd_adherence(),
    }
}

fn open_app_database() -> anyhow::Result<Connection> {
    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;
    Ok(open_database(&config::database_path())?)
}

fn cmd_scan(file: Option<PathBuf>, dictionary: Option<PathBuf>) -> anyhow::Result<()> {
    let service = match dictionary {
        Some(path) => ScanService::from_file(&path)?,
        None => ScanService::bundled()?,
    };

    let raw_text = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };

    match service.scan_text(&raw_text) {
        ScanOutcome::Identified { prefill } => {
            println!("Identified: {} {}", prefill.name, prefill.dosage);
        }
        ScanOutcome::Unrecognized => {
            println!("Could not identify a medicine. Please enter it manually.");
        }
    }
    Ok(())
}

fn cmd_add(
    name: String,
    dosage: String,
    frequency: String,
    slots: Vec<String>,
    stock: i64,
    unit: String,
) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        bail!("medication name is required");
    }
    for slot in &slots {
        schedule::parse_slot(slot).with_context(|| format!("slot {slot:?}"))?;
    }
    let stock_unit = StockUnit::from_str(&unit)?;

    let conn = open_app_database()?;
    let med = Medicine::new(
        name.trim(),
        dosage.trim(),
        frequency.trim(),
        slots,
        stock,
        stock_unit,
        Local::now().naive_local(),
    );
    insert_medicine(&conn, &med)?;

    let reminders = schedule::reminder_plan(&med);
    println!(
        "Added {} ({}) — {} reminder(s) per day",
        med.name,
        med.dosage,
        reminders
            .iter()
            .filter(|r| r.kind == ReminderKind::Main)
            .count()
    );
    Ok(())
}

fn cmd_list() -> anyhow::Result<()> {
    let conn = open_app_database()?;
    let medicines = fetch_medicines(&conn)?;
    if medicines.is_empty() {
        println!("No medications yet. Add one with `dawaai add`.");
        return Ok(());
    }

    let today = Local::now().date_naive();
    for med in medicines {
        let taken = doses_taken_on(&conn, &med.id, today)?;
        let summary = adherence::daily_summary(&med, &taken);
        println!(
            "{} {} — {} {}, today {}/{}",
            med.name,
            med.dosage,
            med.stock,
            med.stock_unit.as_str(),
            summary.taken,
            summary.expected
        );
        for slot in &med.time_slots {
            let mark = if taken.contains(slot) { "x" } else { " " };
            println!("  [{mark}] {slot}");
        }
    }
    Ok(())
}

fn cmd_take(name: String, slot: String) -> anyhow::Result<()> {
    let conn = open_app_database()?;
    let Some(med) = find_medicine_by_name(&conn, &name)? else {
        bail!("no medication named {name:?}");
    };

    let record = record_dose(&conn, &med, &slot, Local::now().naive_local())?;
    if record.offset_minutes.abs() <= 5 {
        println!("Recorded {} at {} — on time.", med.name, record.slot);
    } else if record.offset_minutes > 0 {
        println!(
            "Recorded {} at {} — {} minutes late.",
            med.name, record.slot, record.offset_minutes
        );
    } else {
        println!(
            "Recorded {} at {} — {} minutes early.",
            med.name,
            record.slot,
            -record.offset_minutes
        );
    }
    Ok(())
}

fn cmd_due() -> anyhow::Result<()> {
    let conn = open_app_database()?;
    let now = Local::now().naive_local();
    let today = now.date();

    let mut upcoming = Vec::new();
    for med in fetch_medicines(&conn)? {
        let taken = doses_taken_on(&conn, &med.id, today)?;
        for reminder in schedule::reminder_plan(&med) {
            if reminder.kind != ReminderKind::Main || taken.contains(&reminder.slot) {
                continue;
            }
            upcoming.push((schedule::next_occurrence(reminder.time, now), reminder));
        }
    }
    upcoming.sort_by_key(|(at, _)| *at);

    if upcoming.is_empty() {
        println!("Nothing due — all doses confirmed.");
        return Ok(());
    }
    for (at, reminder) in upcoming {
        println!("{} — {}", at.format("%a %H:%M"), reminder.title);
    }
    Ok(())
}

fn cmd_adherence() -> anyhow::Result<()> {
    let conn = open_app_database()?;

    let mut quiet = true;
    for med in fetch_medicines(&conn)? {
        let history = fetch_intake_history(&conn, &med.id, 30)?;
        if let Some(hint) = adherence::check_adherence(&history) {
            println!("{}: {}", med.name, hint.message());
            quiet = false;
        }
    }
    if quiet {
        println!("No schedule drift detected.");
    }
    Ok(())
}
