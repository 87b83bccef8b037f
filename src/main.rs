use clap::Parser;
use std::path::PathBuf;
use stream_search_pom::{ChromeDriver, ConnectionMode, DeviceProfile, ScenarioConfig, SearchScenario};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the mobile search flow against a streaming site", long_about = None)]
struct Args {
    /// JSON scenario config; command-line flags override its values
    #[arg(short, long, env = "STREAM_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Home page to start from
    #[arg(long, env = "STREAM_SEARCH_BASE_URL")]
    base_url: Option<String>,

    /// Search query to type
    #[arg(short, long)]
    query: Option<String>,

    /// Text the first suggestion must show
    #[arg(long)]
    expected_suggestion: Option<String>,

    /// Where to write the final screenshot
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Device to emulate
    #[arg(long, default_value = "iPhone 14 Pro Max")]
    device: String,

    /// Chrome executable to launch
    #[arg(long, env = "CHROME_PATH")]
    chrome_path: Option<String>,

    /// Run Chrome without a window
    #[arg(long)]
    headless: bool,

    /// Pass --no-sandbox to Chrome
    #[arg(long)]
    no_sandbox: bool,

    /// Attach to a running Chrome on this debug port instead of launching one
    #[arg(long)]
    debug_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ScenarioConfig::from_file(path).await?,
        None => ScenarioConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(query) = args.query {
        config.query = query;
    }
    if let Some(expected) = args.expected_suggestion {
        config.expected_suggestion = expected;
    }
    if let Some(path) = args.screenshot {
        config.screenshot_path = path;
    }
    config.validate()?;

    let device = DeviceProfile::by_name(&args.device)
        .ok_or_else(|| anyhow::anyhow!("Unknown device profile: {}", args.device))?;

    let driver = match args.debug_port {
        Some(port) => {
            log::info!("Connecting to Chrome on port {} ({})...", port, device.name);
            ChromeDriver::connect_debug_port(port, Some(device)).await?
        }
        None => {
            log::info!("Launching Chrome ({})...", device.name);
            let mode = ConnectionMode::Sandboxed {
                chrome_path: args.chrome_path,
                no_sandbox: args.no_sandbox,
                headless: args.headless,
            };
            ChromeDriver::with_device(mode, Some(device)).await?
        }
    };

    let scenario = SearchScenario::new(config);
    let outcome = scenario.run(&driver).await;

    // The session is released whether or not the scenario passed
    if let Err(e) = driver.close().await {
        log::warn!("Failed to close Chrome: {}", e);
    }

    match outcome {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            log::error!("Search scenario failed: {}", e);
            Err(e.into())
        }
    }
}
