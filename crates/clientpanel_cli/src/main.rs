//! Client panel CLI probe.
//!
//! # Responsibility
//! - Open the configured client store, provision the admin seed and print
//!   dashboard counters.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `clientpanel_cli [config.json]`

use clientpanel_core::db::open_db;
use clientpanel_core::{
    init_from_config, seed_admin, Argon2PasswordHasher, ClientPanelConfig, ClientService,
    PageRequest, SqliteClientRepository, SystemClock,
};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={}", err);
            eprintln!("clientpanel_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ClientPanelConfig::load(config_path.as_deref())?;
    init_from_config(&config)?;

    println!("clientpanel_core ping={}", clientpanel_core::ping());
    println!("clientpanel_core version={}", clientpanel_core::core_version());

    let conn = open_db(&config.db_path)?;
    let repo = SqliteClientRepository::try_new(&conn)?;
    let seeded = seed_admin(&repo, &Argon2PasswordHasher::new(), &SystemClock, &config.admin)?;
    println!("admin_seeded={seeded}");

    let service = ClientService::new(repo);
    let stats = service.dashboard_stats()?;
    println!(
        "clients active={} inactive={} total={}",
        stats.active_users, stats.inactive_users, stats.total_users
    );

    let first_page = service.get_all_users(PageRequest::new(0, config.page_size))?;
    for client in &first_page.items {
        println!("{} {} {}", client.client_id, client.role.as_str(), client.status);
    }
    println!(
        "page 1/{} ({} records)",
        first_page.total_pages().max(1),
        first_page.total_count
    );
    Ok(())
}
