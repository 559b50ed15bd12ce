use cardreg::config::cli::Command;
use cardreg::core::validator;
use cardreg::utils::error::ErrorCategory;
use cardreg::utils::logger;
use cardreg::{CancelFlag, CliConfig, Credentials, RegistrationClient, RegistrationError, ReqwestTransport};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting cardreg CLI");

    if let Err(e) = run(cli).await {
        let Some(error) = e.downcast_ref::<RegistrationError>() else {
            tracing::error!("❌ {:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        };

        tracing::error!(
            "❌ {} (Category: {:?}, Code: {})",
            error,
            error.category(),
            error.result_code().unwrap_or("-")
        );
        eprintln!(
            "❌ {} {}",
            error.result_code().unwrap_or("-"),
            error.result_message()
        );
        eprintln!("💡 {}", error.recovery_suggestion());

        let exit_code = match error.category() {
            ErrorCategory::Validation => 2,
            ErrorCategory::Configuration => 3,
            ErrorCategory::Cancelled => 130,
            ErrorCategory::Transport | ErrorCategory::Processor | ErrorCategory::Api => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: CliConfig) -> anyhow::Result<()> {
    // Local checks need no credentials.
    if let Command::Validate(card) = &cli.command {
        validator::validate(&card.to_card_data()).map_err(RegistrationError::from)?;
        println!("✅ Card data is valid");
        return Ok(());
    }

    let config = cli.client_config()?;
    tracing::debug!("Client config: {:?}", config);

    let credentials = Credentials::new(&config.api.client_id, &config.api.client_secret);
    let transport = ReqwestTransport::new(&config.transport, credentials)?;
    let client = RegistrationClient::new(transport, config.api.clone());

    let cancel = CancelFlag::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current request");
            ctrl_c.cancel();
        }
    });

    match &cli.command {
        Command::Validate(_) => {}
        Command::Register { currency, card } => {
            let registration = client
                .register_card(currency, &card.to_card_data(), &cancel)
                .await?;
            println!("{}", serde_json::to_string_pretty(&registration)?);
        }
        Command::Cards => {
            let cards = client.list_cards(&cancel).await?;
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        Command::Deactivate { card_id } => {
            let card = client.deactivate_card(card_id, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
    }

    Ok(())
}
