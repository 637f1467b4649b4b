//! Developer utility to score one booking with the trained artifacts.

use std::io::Read;
use std::path::PathBuf;

use booking_forecast::booking::{BookingRecord, CategoricalColumn};
use booking_forecast::config::TrainingConfig;
use booking_forecast::logging;
use booking_forecast::pipeline::{InferenceError, Prediction, Predictor};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    logging::init("predict");

    let artifact_dir = match options.artifact_dir {
        Some(dir) => dir,
        None => {
            TrainingConfig::load_or_default()
                .map_err(|err| err.to_string())?
                .artifact_dir
        }
    };
    let predictor = Predictor::load(&artifact_dir).map_err(|err| report_failure(&err))?;

    match options.mode {
        Mode::Vocabulary => print_vocabulary(&predictor),
        Mode::Predict(source) => {
            let record = read_record(&source)?;
            let prediction = predictor
                .predict(&record)
                .map_err(|err| report_failure(&err))?;
            print_prediction(&prediction)?;
        }
    }
    Ok(())
}

fn report_failure(err: &InferenceError) -> String {
    tracing::error!("{err}");
    err.operator_message()
}

fn print_prediction(prediction: &Prediction) -> Result<(), String> {
    if prediction.booking_complete() {
        println!("Prediction: booking complete");
    } else {
        println!("Prediction: booking not completed");
    }
    println!(
        "Probability the customer completes the booking: {:.1}%",
        prediction.probability * 100.0
    );
    let json = serde_json::to_string(prediction).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

fn print_vocabulary(predictor: &Predictor) {
    for column in CategoricalColumn::ALL {
        println!("{column}: {}", predictor.vocabulary(column).join(", "));
    }
    println!("flight_day: {}", predictor.day_names().join(", "));
}

fn read_record(source: &RecordSource) -> Result<BookingRecord, String> {
    let text = match source {
        RecordSource::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("Failed to read record from stdin: {err}"))?;
            text
        }
        RecordSource::File(path) => std::fs::read_to_string(path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?,
    };
    serde_json::from_str(&text).map_err(|err| format!("Invalid booking record: {err}"))
}

#[derive(Debug, Clone)]
enum RecordSource {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum Mode {
    Predict(RecordSource),
    Vocabulary,
}

#[derive(Debug, Clone)]
struct CliOptions {
    mode: Mode,
    artifact_dir: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut source = RecordSource::Stdin;
    let mut vocabulary = false;
    let mut artifact_dir: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--record" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--record requires a value".to_string())?;
                source = if value == "-" {
                    RecordSource::Stdin
                } else {
                    RecordSource::File(PathBuf::from(value))
                };
            }
            "--artifacts" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--artifacts requires a value".to_string())?;
                artifact_dir = Some(PathBuf::from(value));
            }
            "--vocab" => vocabulary = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let mode = if vocabulary {
        Mode::Vocabulary
    } else {
        Mode::Predict(source)
    };
    Ok(CliOptions { mode, artifact_dir })
}

fn help_text() -> String {
    [
        "booking-predict",
        "",
        "Scores one booking record (JSON) with the trained model artifacts.",
        "",
        "Usage:",
        "  booking-predict [--record <file>|-] [--artifacts <dir>]",
        "  booking-predict --vocab [--artifacts <dir>]",
        "",
        "Options:",
        "  --record <file>    JSON booking record; '-' or omitted reads stdin.",
        "  --artifacts <dir>  Directory holding the artifacts (default: from config, else '.').",
        "  --vocab            List the accepted categorical values instead of predicting.",
    ]
    .join("\n")
}
