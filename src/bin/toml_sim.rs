use alliance_seats::adapters::read_gesture_script;
use alliance_seats::config::toml_config::TomlConfig;
use alliance_seats::core::{ConfigProvider, SessionReport};
use alliance_seats::domain::ports::Storage;
use alliance_seats::utils::error::{ErrorSeverity, SeatError};
use alliance_seats::utils::{logger, validation::Validate};
use alliance_seats::{FileSessionSource, LocalStorage, SessionEngine};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-sim")]
#[command(about = "Alliance seat simulation driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sim-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the gesture script from config
    #[arg(long)]
    gestures: Option<String>,

    /// Dry run - check inputs without simulating or writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based simulation");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(gestures) = &args.gestures {
        config.interaction.gestures = Some(gestures.clone());
        tracing::info!("🔧 Gesture script overridden to: {}", gestures);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No simulation will run");
        perform_dry_run(&config).await;
        return Ok(());
    }

    match run(&config).await {
        Ok(report) => {
            tracing::info!("✅ Simulation completed successfully!");
            println!(
                "✅ {} alliances, {} seats, cycle {}",
                report.snapshot.cycle.alliances.len(),
                report.snapshot.total_seats,
                report.snapshot.cycle.generation
            );
            println!("📁 Snapshot saved to: {}/{}", config.output_path(), report.output_file);
        }
        Err(e) => {
            tracing::error!(
                "❌ Simulation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(config: &TomlConfig) -> Result<SessionReport, SeatError> {
    let gestures = match config.gesture_script() {
        Some(path) => read_gesture_script(&LocalStorage::new(".".to_string()), path).await?,
        None => Vec::new(),
    };

    let source = FileSessionSource::with_files(
        LocalStorage::new(config.data_dir().to_string()),
        config.data_files().clone(),
    );
    let output = LocalStorage::new(config.output_path().to_string());

    SessionEngine::new(source, output)
        .with_output_file(config.output_filename())
        .run(config, &gestures)
        .await
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let canvas = config.canvas();

    println!("📋 Configuration Summary:");
    println!("  Data: {}", config.data_dir());
    println!("  Output: {}/{}", config.output_path(), config.output_filename());
    println!("  Canvas: {}x{} (padding {})", canvas.width, canvas.height, canvas.padding);
    match canvas.columns {
        Some(columns) => println!("  Layout: grid, {} columns", columns),
        None => println!("  Layout: single row"),
    }
    println!("  Tie break: {:?}", config.tie_break());
    println!("  Overlap rule: {:?}", config.overlap_rule());

    if let Some(gestures) = config.gesture_script() {
        println!("  Gestures: {}", gestures);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    let storage = LocalStorage::new(config.data_dir().to_string());
    let files = config.data_files();

    println!("📂 Input Files:");
    for (file, required) in [
        (&files.votes, true),
        (&files.seats, true),
        (&files.alliances, true),
        (&files.parties, false),
    ] {
        let status = match (storage.exists(file).await, required) {
            (true, _) => "✅ found",
            (false, true) => "❌ missing",
            (false, false) => "➖ optional, not present",
        };
        println!("  {}: {}", file, status);
    }

    if let Some(gestures) = config.gesture_script() {
        println!();
        println!("🖱️ Gesture Script:");
        match read_gesture_script(&LocalStorage::new(".".to_string()), gestures).await {
            Ok(events) => println!("  {} events in {}", events.len(), gestures),
            Err(e) => println!("  ❌ {}", e.user_friendly_message()),
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
