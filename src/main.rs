use anyhow::Context;
use clap::Parser;
use commander_deck_validator::app::report;
use commander_deck_validator::config::cli::{Command, ValidateArgs};
use commander_deck_validator::utils::error::ErrorSeverity;
use commander_deck_validator::utils::{logger, validation::Validate};
use commander_deck_validator::{
    CliConfig, DeckSubmission, DeckValidator, DiscordWebhook, LocalStorage, LogReport,
    LookupSettings, RunOutcome, ScryfallClient, SendOutcome, TomlConfig, ValidationSession,
    ValidatorError,
};
use std::path::Path;

type Session = ValidationSession<ScryfallClient, LocalStorage, DiscordWebhook>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => TomlConfig::from_file(path),
        None => Ok(TomlConfig::default()),
    };

    // 初始化日誌
    let json_logs = cli.json_logs || config.as_ref().map(|c| c.logging.json).unwrap_or(false);
    if json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting deck-validator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    let config = match config.and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let session = match build_session(&config) {
        Ok(session) => session,
        Err(e) => exit_with(e),
    };

    match cli.command {
        Command::Validate(args) => run_validate(&session, args).await?,
        Command::Send => {
            if let Err(e) = send(&session).await {
                exit_with(e);
            }
        }
        Command::Clear => {
            if let Err(e) = session.inputs_changed().await {
                exit_with(e);
            }
            println!("🧹 Cached validation cleared");
        }
    }

    Ok(())
}

fn build_session(config: &TomlConfig) -> commander_deck_validator::Result<Session> {
    let catalog = ScryfallClient::from_config(config)?;
    let validator = DeckValidator::new(catalog, LookupSettings::from_config(config));
    let storage = LocalStorage::new(config.storage.cache_dir.clone());
    let sink = config.webhook_url().ok().map(DiscordWebhook::new);

    Ok(ValidationSession::new(
        validator,
        storage,
        sink,
        config.webhook.clone(),
    ))
}

async fn read_deck(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read decklist {}", path.display())),
        None => Ok(String::new()),
    }
}

async fn run_validate(session: &Session, args: ValidateArgs) -> anyhow::Result<()> {
    let player1 = DeckSubmission::new(args.p1_commander, read_deck(args.p1_deck.as_deref()).await?);
    let player2 = DeckSubmission::new(args.p2_commander, read_deck(args.p2_deck.as_deref()).await?);

    let (log, passed) = match session.validate(&player1, &player2).await {
        RunOutcome::Busy => return Ok(()),
        RunOutcome::Passed(pair) => (report::render_log(&pair), true),
        RunOutcome::Rejected(pair) => (report::render_log(&pair), false),
        RunOutcome::Failed(message) => {
            print_log(&LogReport::critical(&message));
            std::process::exit(3);
        }
    };
    print_log(&log);

    if !passed {
        std::process::exit(1);
    }

    if args.send {
        if let Err(e) = send(session).await {
            exit_with(e);
        }
    }
    Ok(())
}

async fn send(session: &Session) -> commander_deck_validator::Result<()> {
    match session.send_report().await? {
        SendOutcome::Sent => println!("📨 Report sent to webhook"),
        SendOutcome::Busy => println!("⏳ A report is already being sent"),
    }
    Ok(())
}

fn print_log(log: &LogReport) {
    let marker = if log.success { "✅" } else { "❌" };
    println!("{} {}", marker, log.title);
    for line in &log.lines {
        println!("{}", line);
    }
}

fn exit_with(e: ValidatorError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
