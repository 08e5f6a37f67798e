// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;

use bmi_tracker::AppConfig;

fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the alternate screen
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let config = AppConfig::default();
    run_ui_mode(&config)
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    use bmi_tracker::open_store;

    println!("🖥️  Loading {}...\n", config.window_title);

    // Open and schema failures are shown in the UI instead of aborting
    let (store, startup_error) = open_store(&config.db_path);

    println!("Starting UI... (Press Esc to quit)\n");

    let mut app = ui::App::new(store, config.clone());
    if let Some(err) = startup_error {
        app.show_error(err.to_string());
    }
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
