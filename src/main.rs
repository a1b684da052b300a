use chrono::Local;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use substitute_cover::config::{parse_port, AppConfig};
use substitute_cover::display::{print_commit_summary, print_counts, print_history, print_proposal};
use substitute_cover::ledger::{commit, Confirmation, WorkloadLedger};
use substitute_cover::parser::load_schedules_csv;
use substitute_cover::schedule::{plan_absence, AbsenceRequest};
use substitute_cover::store::{DataStore, FileLedger};
use substitute_cover::web;

const USAGE: &str = "\
Usage:
  substitute-cover web [port]
  substitute-cover import <schedules.csv>
  substitute-cover propose <absent> <day> <from|full-day> [to]
  substitute-cover assign <absent> <day> <from|full-day> [to] <date>
  substitute-cover counts
  substitute-cover history";

/// Builds the absence from `<absent> <day> <from> [to]`, expanding `full-day`.
/// Returns the request and the number of arguments consumed.
fn absence_from_args(args: &[String], config: &AppConfig) -> Result<(AbsenceRequest, usize), String> {
    let absent = args.first().ok_or("missing absent teacher")?;
    let day = args.get(1).ok_or("missing day")?;
    let from = args.get(2).ok_or("missing start slot")?;

    if !config.is_working_day(day) {
        return Err(format!("unknown day {:?}, expected one of {}", day, config.days.join(", ")));
    }

    if from == "full-day" {
        let (first, last) = config.catalog.full_day().ok_or("no slots configured")?;
        return Ok((AbsenceRequest::new(absent.as_str(), day.as_str(), first, last), 3));
    }
    let to = args.get(3).ok_or("missing end slot")?;
    Ok((AbsenceRequest::new(absent.as_str(), day.as_str(), from.as_str(), to.as_str()), 4))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = AppConfig::from_env()?;
    let store = DataStore::new(&config.data_dir);

    match args.get(1).map(String::as_str) {
        Some("web") => {
            if let Some(port) = args.get(2) {
                config.port = parse_port(port)?;
            }
            println!("Starting web server on port {}...", config.port);
            println!("Access the API at http://localhost:{}/api/catalog", config.port);
            web::start_server(config).await?;
        }
        Some("import") => {
            let path = args.get(2).ok_or(USAGE)?;
            println!("Loading schedules from CSV...");
            let schedules = load_schedules_csv(path)?;
            if schedules.is_empty() {
                warn!(path = %path, "no schedules found in file");
                return Err(format!("no schedules found in {}", path).into());
            }
            store.save_schedules(&schedules)?;
            println!("Imported {} teacher schedules into {}", schedules.len(), store.dir().display());
        }
        Some("propose") => {
            let (request, _) = absence_from_args(&args[2..], &config)?;
            let schedules = store.schedules_or_empty();
            let counters = store.counters_or_empty();
            let result = plan_absence(&schedules, &request, &config.catalog, &counters);
            print_proposal(&request, &result, &counters);
        }
        Some("assign") => {
            let (request, used) = absence_from_args(&args[2..], &config)?;
            let date = args.get(2 + used).ok_or("missing date")?;
            let schedules = store.schedules_or_empty();
            let mut ledger = FileLedger::open(store.clone())?;

            let result = plan_absence(&schedules, &request, &config.catalog, ledger.counters());
            print_proposal(&request, &result, ledger.counters());

            match Confirmation::accept(&result) {
                Some(confirmation) => {
                    let summary = commit(
                        &mut ledger,
                        &request,
                        date,
                        &confirmation,
                        &config.catalog,
                        Local::now().naive_local(),
                    )?;
                    ledger.flush()?;
                    print_commit_summary(&summary);
                }
                None => println!("Nothing to assign."),
            }
        }
        Some("counts") => print_counts(&store.counters_or_empty()),
        Some("history") => print_history(&store.load_history()?),
        _ => {
            println!("{}", USAGE);
        }
    }

    Ok(())
}
