//! Train the booking completion model and write its artifacts.
//!
//! Reads `customer_booking.csv` from the working directory (or the path in
//! `booking-forecast.toml`) and writes `airline_model.json`, `scaler.json` and `encoders.json`.

use booking_forecast::config::TrainingConfig;
use booking_forecast::logging;
use booking_forecast::pipeline::{TrainingReport, run_training};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    if let Some(arg) = std::env::args().nth(1) {
        return match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                Ok(())
            }
            unknown => Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        };
    }
    logging::init("train");

    let config = TrainingConfig::load_or_default().map_err(|err| err.to_string())?;
    let report = run_training(&config).map_err(|err| {
        tracing::error!("Training failed: {err}");
        err.to_string()
    })?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &TrainingReport) {
    println!(
        "rows: {} (train {}, test {})",
        report.rows, report.train_rows, report.test_rows
    );
    println!("test accuracy: {:.4}", report.accuracy);
    for stats in &report.per_class {
        println!(
            "{:>14}  precision={:.3}  recall={:.3}  f1={:.3}  support={}",
            stats.class, stats.precision, stats.recall, stats.f1, stats.support
        );
    }
    println!("confusion matrix (rows=true, cols=pred):");
    for row in report.confusion.counts {
        println!("{:8}{:8}", row[0], row[1]);
    }
    println!("run id: {}", report.metadata.run_id);
    for path in report.paths.iter() {
        println!("wrote {}", path.display());
    }
}

fn help_text() -> String {
    [
        "booking-train",
        "",
        "Fits a random forest on customer_booking.csv and writes the model, scaler and",
        "encoder artifacts. Settings can be overridden in ./booking-forecast.toml.",
        "",
        "Usage:",
        "  booking-train",
    ]
    .join("\n")
}
