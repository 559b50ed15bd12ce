use crate::config::{ApiConfig, ClientConfig, TransportConfig};
use crate::config::toml_config::{DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_TAG};
use crate::domain::model::{CardData, CardType};
use crate::utils::error::Result;
use crate::utils::validation::{validate_required_field, Validate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cardreg")]
#[command(about = "Validate payment cards and register them with the payment API")]
pub struct CliConfig {
    /// TOML configuration file; flags below override its values.
    #[arg(long, env = "CARDREG_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "CARDREG_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, env = "CARDREG_API_VERSION")]
    pub api_version: Option<String>,

    #[arg(long, env = "CARDREG_CLIENT_ID")]
    pub client_id: Option<String>,

    #[arg(long, env = "CARDREG_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    #[arg(long, env = "CARDREG_USER_ID")]
    pub user_id: Option<String>,

    #[arg(long)]
    pub tag: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the client-side card checks only; nothing is sent.
    Validate(CardArgs),
    /// Validate, tokenize and register a card.
    Register {
        #[arg(long)]
        currency: String,
        #[command(flatten)]
        card: CardArgs,
    },
    /// List the cards registered for the user.
    Cards,
    /// Deactivate a registered card.
    Deactivate { card_id: String },
}

#[derive(Args)]
pub struct CardArgs {
    #[arg(long)]
    pub card_number: String,

    #[arg(long, default_value = "CB_VISA_MASTERCARD")]
    pub card_type: String,

    /// Expiration date as MMYY.
    #[arg(long)]
    pub expiry: String,

    #[arg(long, default_value = "")]
    pub cvx: String,
}

impl CardArgs {
    pub fn to_card_data(&self) -> CardData {
        let card_type: CardType = self.card_type.clone().into();
        CardData::new(&self.card_number, card_type, &self.expiry, &self.cvx)
    }
}

impl CliConfig {
    /// Builds the client configuration from the config file and flags.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig {
                api: ApiConfig {
                    base_url: DEFAULT_BASE_URL.to_string(),
                    version: DEFAULT_API_VERSION.to_string(),
                    client_id: validate_required_field("client_id", &self.client_id)?.clone(),
                    client_secret: validate_required_field("client_secret", &self.client_secret)?
                        .clone(),
                    user_id: validate_required_field("user_id", &self.user_id)?.clone(),
                    tag: DEFAULT_TAG.to_string(),
                },
                transport: TransportConfig::default(),
            },
        };

        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(version) = &self.api_version {
            config.api.version = version.clone();
        }
        if let Some(client_id) = &self.client_id {
            config.api.client_id = client_id.clone();
        }
        if let Some(client_secret) = &self.client_secret {
            config.api.client_secret = client_secret.clone();
        }
        if let Some(user_id) = &self.user_id {
            config.api.user_id = user_id.clone();
        }
        if let Some(tag) = &self.tag {
            config.api.tag = tag.clone();
        }
        if let Some(timeout) = self.timeout_seconds {
            config.transport.timeout_seconds = timeout;
        }

        config.validate()?;
        Ok(config)
    }
}
