use alliance_seats::adapters::read_gesture_script;
use alliance_seats::core::{ConfigProvider, Cycle, SessionReport};
use alliance_seats::utils::error::{ErrorSeverity, SeatError};
use alliance_seats::utils::{logger, validation::Validate};
use alliance_seats::{CliConfig, FileSessionSource, LocalStorage, SessionEngine};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("🚀 Starting alliance-seats");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(&e));
    }

    match run(&config).await {
        Ok(report) => {
            print_seat_table(&report.snapshot.cycle);
            tracing::info!("✅ Simulation completed successfully!");
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

            let code = exit_code(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

async fn run(config: &CliConfig) -> Result<SessionReport, SeatError> {
    let gestures = match config.gesture_script() {
        Some(path) => read_gesture_script(&LocalStorage::new(".".to_string()), path).await?,
        None => Vec::new(),
    };

    let source = FileSessionSource::new(LocalStorage::new(config.data_dir().to_string()));
    let output = LocalStorage::new(config.output_path().to_string());

    SessionEngine::new(source, output).run(config, &gestures).await
}

// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &SeatError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn print_seat_table(cycle: &Cycle) {
    println!("📊 Seats after cycle {}:", cycle.generation);
    for (alliance, summary) in &cycle.alliances {
        let members = cycle
            .membership
            .iter()
            .find(|(id, _)| id == alliance)
            .map(|(_, parties)| {
                parties
                    .iter()
                    .map(|party| party.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!(
            "  {:<24} {:>4} seats {:>12} votes  [{}]",
            alliance.as_str(),
            summary.seats_won,
            summary.total_votes,
            members
        );
    }

    let unassigned: u32 = cycle.regions.iter().map(|region| region.unassigned).sum();
    if unassigned > 0 {
        println!("  ⚠️  {} seats left unassigned (regions without votes)", unassigned);
    }
}
