use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use handle_avail::check::{CheckOptions, Checker, Event};
use handle_avail::filter::SelectionFilter;
use handle_avail::http::Client;
use handle_avail::registry::registry;
use handle_avail::report::CheckResult;
use handle_avail::service::Descriptor;

#[derive(Parser)]
#[command(
    name = "handle-avail",
    version,
    about = "Check whether a handle is available across online services",
    after_help = "Category and service values are matched ignoring case and punctuation. \
                  Prefix a value with `:` to exclude it instead, e.g. `-c :mail`.\n\n\
                  Exits 0 only when the name is available on every checked service."
)]
struct Cli {
    /// Name to check
    name: Option<String>,

    /// Filter services by category (repeatable)
    #[arg(short, long = "category", value_name = "NAME")]
    categories: Vec<String>,

    /// Filter services by title (repeatable)
    #[arg(short, long = "service", value_name = "TITLE")]
    services: Vec<String>,

    /// Timeout for each service check, in milliseconds
    #[arg(short, long, value_name = "MS", env = "HANDLE_AVAIL_TIMEOUT")]
    timeout: Option<u64>,

    /// List the selected services instead of checking a name
    #[arg(short, long)]
    list: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Log each request to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "handle_avail=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn status_label(result: &CheckResult) -> String {
    match (result.error(), result.available()) {
        (Some(e), _) => format!("error: {e}"),
        (None, Some(true)) => "available".to_owned(),
        (None, Some(false)) => "taken".to_owned(),
        (None, None) => "unknown".to_owned(),
    }
}

fn list(selection: Option<SelectionFilter>) -> ExitCode {
    let selection = selection.map(|s| move |d: &Descriptor| s.matches(d));
    let filter = selection.as_ref().map(|f| f as &dyn Fn(&Descriptor) -> bool);
    let listed = registry()
        .get(filter)
        .and_then(|services| Ok((services, registry().categories(filter)?)));
    let (services, categories) = match listed {
        Ok(listed) => listed,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };
    if services.is_empty() {
        eprintln!("error: No services found");
        return ExitCode::from(1);
    }
    for service in &services {
        let descriptor = service.descriptor();
        println!("{}\t{}", descriptor.category, descriptor.title);
    }
    eprintln!(
        "{} services found within {} categories!",
        services.len(),
        categories.len()
    );
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let selection = SelectionFilter::new(&cli.categories, &cli.services);

    if cli.list {
        return list(selection);
    }

    let Some(name) = cli.name else {
        eprintln!("error: no name provided");
        eprintln!("usage: handle-avail [OPTIONS] <NAME>");
        return ExitCode::from(2);
    };

    let mut options = CheckOptions::new().selection(selection);
    if let Some(ms) = cli.timeout {
        options = options.timeout(Duration::from_millis(ms));
    }

    let client = Client::new();
    let checker = Checker::new(registry(), &client);
    let json = cli.json;
    let mut print_progress = |event: Event<'_>| {
        if json {
            return;
        }
        match event {
            Event::CheckStarted { name, services } => {
                println!("Checking `{name}` on {} services", services.len());
            }
            Event::Result(result) => {
                let descriptor = result.descriptor();
                println!(
                    "{}\t{}\t{}",
                    descriptor.category,
                    descriptor.title,
                    status_label(result)
                );
            }
            Event::Checking { .. } | Event::ReportCompleted(_) => {}
        }
    };

    let report = match checker.check(&name, &options, &mut print_progress) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(1);
            }
        }
    } else {
        let stats = report.stats();
        let verdict = match report.unique() {
            Some(true) => "available everywhere",
            Some(false) => "unavailable somewhere",
            None => "unknown (some checks failed)",
        };
        println!(
            "{}: {verdict} ({} available, {} unavailable, {} failed of {})",
            report.name(),
            stats.available,
            stats.unavailable,
            stats.failed,
            stats.total
        );
    }

    if report.unique() == Some(true) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
