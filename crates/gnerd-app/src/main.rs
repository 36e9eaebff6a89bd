// gNERD entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file; stdout carries the report)
// 2. Load config, copying defaults on first run
// 3. Load pitcher, team and schedule inputs
// 4. Score, rank and describe the slate
// 5. Print the rendered report

use gnerd_app::config;
use gnerd_app::data;
use gnerd_app::pipeline;

use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("gNERD starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        mode = ?config.descriptions.mode,
        limit = config.descriptions.limit,
        format = ?config.output.format,
        "config loaded"
    );

    // 3. Load inputs
    let base_dir = std::env::current_dir().context("failed to read working directory")?;
    let paths = config.data_paths.resolve(&base_dir);
    let inputs = data::load_all(&paths).context("failed to load slate inputs")?;

    // 4. Score, rank, describe
    let describer = pipeline::llm_describer(&config);
    let rendered = pipeline::run(&config, &inputs, &describer).await?;

    // 5. Output
    println!("{rendered}");
    info!("gNERD finished");
    Ok(())
}

/// Initialize tracing to log to a file so stdout stays machine-readable.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("gnerd.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gnerd=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
