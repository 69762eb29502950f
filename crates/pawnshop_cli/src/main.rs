//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `pawnshop_core` linkage when run without arguments.
//! - Given a store path (`.json`, `.yaml`/`.yml`, `.db`/`.sqlite`), print the
//!   client count and the first page of summaries.
//! - Given a store path and a query, print matching clients.
//! - Write rolling logs under `PAWNSHOP_LOG_DIR` when it is set.

use log::info;
use pawnshop_core::{default_log_level, init_logging, open_repository_at, ClientService};
use std::process::ExitCode;

const PAGE_SIZE: usize = 20;
const LOG_DIR_ENV: &str = "PAWNSHOP_LOG_DIR";

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        println!("pawnshop_core ping={}", pawnshop_core::ping());
        println!("pawnshop_core version={}", pawnshop_core::core_version());
        return ExitCode::SUCCESS;
    };
    let query = args.next();

    if let Some(log_dir) = std::env::var_os(LOG_DIR_ENV) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run(&path, query.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str, query: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let service = ClientService::new(open_repository_at(path)?);
    info!("event=cli_run module=cli status=start query={}", query.is_some());

    if let Some(query) = query {
        let found = service.find(query)?;
        println!("matches={}", found.len());
        for client in &found {
            println!("{}", client.full_info());
        }
        return Ok(());
    }

    let page = service.page(0, Some(PAGE_SIZE))?;
    println!("clients={}", page.total);
    for summary in &page.items {
        let full_name = format!(
            "{} {} {}",
            summary.last_name,
            summary.first_name,
            summary.patronymic.as_deref().unwrap_or("")
        );
        println!(
            "{:>5}  {:<40}  {} {}  {}",
            summary.id,
            full_name.trim(),
            summary.passport_series,
            summary.passport_number,
            summary.phone_number
        );
    }
    Ok(())
}
