//! ride-query: run catalog queries with filters from the command line.
//!
//! Usage:
//!   ride-query --catalog ola_sql_queries.sql --db ola_ride.db list
//!   ride-query --csv data/ola_clean.csv run "Top customers" --vehicle Auto --ratings
//!   ride-query --config ride.json serve

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ride_analytics_core::{
    config::{AppConfig, BackendConfig},
    filters::{CancelSource, DateRange, FilterSelection, RatingFilter, RatingRange},
    types::QueryResult,
    Explorer, QueryCatalog,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ride-query", version, about = "Run saved SQL queries with filters")]
struct Cli {
    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<String>,

    /// Query catalog file.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long, conflicts_with = "csv")]
    db: Option<PathBuf>,

    /// CSV export, loaded into memory per query.
    #[arg(long)]
    csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List query names in catalog order.
    List,
    /// Print base SQL, final SQL and parameters without running.
    Show {
        name: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Run a query and print the result table.
    Run {
        name: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print dropdown values for a filter column.
    Values { column: String },
    /// Print every choice the filter panel offers.
    Options,
    /// JSON-lines request loop on stdin/stdout.
    Serve,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long = "status")]
    statuses: Vec<String>,
    #[arg(long = "vehicle")]
    vehicles: Vec<String>,
    #[arg(long = "payment")]
    payments: Vec<String>,
    /// Customer or Driver.
    #[arg(long = "cancelled-by")]
    cancelled_by: Vec<String>,
    /// Enable the ratings filter.
    #[arg(long)]
    ratings: bool,
    /// Keep rows with blank ratings when the ratings filter is on.
    #[arg(long)]
    keep_blank_ratings: bool,
    #[arg(long, default_value_t = 0.0)]
    driver_min: f64,
    #[arg(long, default_value_t = 5.0)]
    driver_max: f64,
    #[arg(long, default_value_t = 0.0)]
    cust_min: f64,
    #[arg(long, default_value_t = 5.0)]
    cust_max: f64,
    /// YYYY-MM-DD; the date filter applies when both ends are given.
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

impl FilterArgs {
    fn to_selection(&self) -> Result<FilterSelection> {
        let cancelled_by = self
            .cancelled_by
            .iter()
            .map(|s| s.parse::<CancelSource>())
            .collect::<Result<Vec<_>, _>>()?;
        let ratings = self.ratings.then(|| RatingFilter {
            exclude_blank: !self.keep_blank_ratings,
            driver: RatingRange::new(self.driver_min, self.driver_max),
            customer: RatingRange::new(self.cust_min, self.cust_max),
        });
        let dates = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            (None, None) => None,
            _ => bail!("--start-date and --end-date must be given together"),
        };
        Ok(FilterSelection {
            statuses: self.statuses.clone(),
            vehicles: self.vehicles.clone(),
            payments: self.payments.clone(),
            cancelled_by,
            ratings,
            dates,
        })
    }
}

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    ListQueries,
    FilterOptions,
    Values {
        column: String,
    },
    Preview {
        query: String,
        #[serde(default)]
        filters: FilterSelection,
    },
    Run {
        query: String,
        #[serde(default)]
        filters: FilterSelection,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(catalog) = &cli.catalog {
        config.catalog_path = catalog.clone();
    }
    if let Some(db) = &cli.db {
        config.backend = BackendConfig::Sqlite { path: db.clone() };
    }
    if let Some(csv) = &cli.csv {
        config.backend = BackendConfig::Csv { path: csv.clone(), table: None };
    }

    let catalog = QueryCatalog::load(&config.catalog_path)?;
    let explorer = Explorer::new(catalog, config.build_backend(), config.build_value_cache());

    match cli.command {
        Command::List => {
            for name in explorer.catalog().names() {
                println!("{name}");
            }
        }
        Command::Show { name, filters } => {
            let base = explorer.catalog().get(&name)?;
            let query = explorer.prepare(&name, &filters.to_selection()?)?;
            println!("-- base");
            println!("{}", base.sql);
            println!();
            println!("-- final");
            println!("{}", query.sql);
            println!();
            println!("-- params");
            for (key, value) in &query.params {
                println!("  :{key} = {value}");
            }
        }
        Command::Run { name, filters } => {
            let result = explorer.run(&name, &filters.to_selection()?)?;
            println!("Returned {} rows", result.len());
            print_table(&result);
        }
        Command::Values { column } => {
            for value in explorer.dropdown_values(&column)? {
                println!("{value}");
            }
        }
        Command::Options => {
            let options = explorer.filter_options()?;
            println!("statuses:       {}", options.statuses.join(", "));
            println!("vehicles:       {}", options.vehicles.join(", "));
            println!("payments:       {}", options.payments.join(", "));
            println!("cancelled by:   {}", options.cancel_sources.join(", "));
        }
        Command::Serve => run_ipc_loop(&explorer)?,
    }

    Ok(())
}

fn run_ipc_loop(explorer: &Explorer) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::ListQueries => Ok(serde_json::json!({
                "queries": explorer.catalog().iter().collect::<Vec<_>>(),
            })),
            IpcCommand::FilterOptions => explorer
                .filter_options()
                .map(|options| serde_json::json!({ "options": options })),
            IpcCommand::Values { column } => explorer
                .dropdown_values(&column)
                .map(|values| serde_json::json!({ "column": column, "values": values })),
            IpcCommand::Preview { query, filters } => explorer
                .prepare(&query, &filters)
                .map(|q| serde_json::json!({ "sql": q.sql, "params": q.params })),
            IpcCommand::Run { query, filters } => explorer
                .run(&query, &filters)
                .map(|r| serde_json::json!({ "row_count": r.len(), "columns": r.columns, "rows": r.rows })),
        };

        let line = match reply {
            Ok(value) => value,
            Err(e) => {
                log::warn!("request failed: {e}");
                serde_json::json!({ "error": e.to_string() })
            }
        };
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_table(result: &QueryResult) {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.to_display_string()).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    println!("{}", render_row(&result.columns, &widths));
    println!("{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    for row in &cells {
        println!("{}", render_row(row, &widths));
    }
}

fn render_row(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{v:<width$}", width = *w))
        .collect::<Vec<_>>()
        .join(" | ")
}
