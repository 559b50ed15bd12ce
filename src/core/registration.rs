//! Card registration protocol.
//!
//! ```text
//! INIT --pre_register--> PRE_REGISTERED --tokenize--> TOKENIZED --finalize--> DONE
//! ```
//!
//! Every step is a single attempt. A failure ends the attempt; nothing is
//! retried or rolled back, and an already issued token is left to expire.

use crate::core::cancel::CancelFlag;
use crate::core::validator;
use crate::domain::model::{
    Card, CardData, CardRegistration, CardType, PreRegistration, PreRegistrationRequest,
    ProcessorToken, RegistrationStage, TokenizedRegistration,
};
use crate::domain::ports::{ConfigProvider, HttpMethod, HttpResponse, Transport};
use crate::utils::error::{
    RegistrationError, Result, API_ERROR_CODE, SUCCESS_RESULT_CODE, TOKEN_PROCESSING_ERROR_CODE,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

/// Prefix the processor puts on a response body when it refuses a card.
const PROCESSOR_ERROR_MARKER: &str = "errorCode=";

const CARD_REGISTRATION_CONTEXT: &str = "CardRegistration";
const CARD_CONTEXT: &str = "Card";

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

/// Caller-owned client for the payment API and its card-data processor.
///
/// Holds no per-attempt state, so one instance can serve concurrent attempts.
pub struct RegistrationClient<T: Transport, C: ConfigProvider> {
    transport: T,
    config: C,
}

impl<T: Transport, C: ConfigProvider> RegistrationClient<T, C> {
    pub fn new(transport: T, config: C) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Appends each segment to `{base}/{version}/{clientId}`, percent-encoded,
    /// so an id can never change the resource path.
    fn api_url(&self, segments: &[&str]) -> Result<String> {
        let base_url = self.config.base_url();
        let invalid_base = |reason: String| RegistrationError::InvalidConfigValueError {
            field: "api.base_url".to_string(),
            value: base_url.to_string(),
            reason,
        };

        let mut url = Url::parse(base_url).map_err(|e| invalid_base(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid_base("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(self.config.api_version())
            .push(self.config.client_id())
            .extend(segments);

        Ok(url.into())
    }

    pub fn card_registrations_url(&self) -> Result<String> {
        self.api_url(&["cardregistrations"])
    }

    pub fn card_registration_url(&self, registration_id: &str) -> Result<String> {
        self.api_url(&["cardregistrations", registration_id])
    }

    /// Validates the card and runs the whole registration protocol.
    pub async fn register_card(
        &self,
        currency: &str,
        card: &CardData,
        cancel: &CancelFlag,
    ) -> Result<CardRegistration> {
        tracing::info!(
            "💳 Registering {} card {} ({})",
            card.card_type,
            card.masked_number(),
            currency
        );

        if let Err(e) = validator::validate(card) {
            tracing::warn!(stage = %RegistrationStage::Init, "Card rejected locally: {}", e);
            return Err(e.into());
        }

        let pre_registration = self.pre_register(currency, &card.card_type, cancel).await?;
        let tokenized = self.tokenize(pre_registration, card, cancel).await?;
        self.finalize(&tokenized.registration_id, tokenized.token, cancel)
            .await
    }

    /// INIT -> PRE_REGISTERED
    pub async fn pre_register(
        &self,
        currency: &str,
        card_type: &CardType,
        cancel: &CancelFlag,
    ) -> Result<PreRegistration> {
        cancel.check()?;

        let request = PreRegistrationRequest {
            tag: self.config.tag().to_string(),
            user_id: self.config.user_id().to_string(),
            currency: currency.to_string(),
            card_type: card_type.clone(),
        };
        let body = serde_json::to_value(&request).map_err(|e| RegistrationError::ConfigError {
            message: format!("Cannot encode pre-registration request: {}", e),
        })?;

        let url = self.card_registrations_url()?;
        tracing::debug!("📡 Requesting pre-registration: POST {}", url);
        let response = self
            .transport
            .authenticated(HttpMethod::Post, &url, Some(&body))
            .await?;
        tracing::debug!("📡 Pre-registration response status: {}", response.status);

        if !response.is_success() {
            let error = api_error(&response, "CardRegistration error");
            tracing::error!("❌ Pre-registration failed: {}", error);
            return Err(error);
        }

        let pre_registration: PreRegistration =
            parse_body(&response, CARD_REGISTRATION_CONTEXT)?;
        tracing::info!(
            stage = %RegistrationStage::PreRegistered,
            "✅ Card registration {} created",
            pre_registration.id
        );
        Ok(pre_registration)
    }

    /// PRE_REGISTERED -> TOKENIZED
    ///
    /// Sends the card to the processor. The card type is not part of the
    /// processor request. Refusals come back as a 2xx body starting with
    /// `errorCode=`, so the body is inspected before the status.
    pub async fn tokenize(
        &self,
        pre_registration: PreRegistration,
        card: &CardData,
        cancel: &CancelFlag,
    ) -> Result<TokenizedRegistration> {
        cancel.check()?;

        // Processor expects exactly these form fields; the card type stays out
        let form = [
            ("data", pre_registration.preregistration_data.as_str()),
            ("accessKeyRef", pre_registration.access_key.as_str()),
            ("cardNumber", card.number.as_str()),
            ("cardExpirationDate", card.expiration_date.as_str()),
            ("cardCvx", card.cvx.as_str()),
        ];

        tracing::debug!(
            "📡 Tokenizing card for registration {}: POST {}",
            pre_registration.id,
            pre_registration.card_registration_url
        );
        let response = self
            .transport
            .unauthenticated(
                HttpMethod::Post,
                &pre_registration.card_registration_url,
                &form,
            )
            .await?;
        tracing::debug!("📡 Processor response status: {}", response.status);

        // Marker first, then empty body, then status
        let token = processor_token(&response)?;
        tracing::info!(
            stage = %RegistrationStage::Tokenized,
            "✅ Processor token received for registration {}",
            pre_registration.id
        );

        // Hand the id on with the token; the rest of the pre-registration is dropped here
        Ok(TokenizedRegistration {
            registration_id: pre_registration.id,
            token,
        })
    }

    /// TOKENIZED -> DONE
    pub async fn finalize(
        &self,
        registration_id: &str,
        token: ProcessorToken,
        cancel: &CancelFlag,
    ) -> Result<CardRegistration> {
        cancel.check()?;

        let body = serde_json::json!({ "RegistrationData": token.as_str() });
        let url = self.card_registration_url(registration_id)?;
        tracing::debug!("📡 Finalizing registration: PUT {}", url);
        let response = self
            .transport
            .authenticated(HttpMethod::Put, &url, Some(&body))
            .await?;
        tracing::debug!("📡 Finalize response status: {}", response.status);

        if !response.is_success() {
            let error = api_error(&response, "CardRegistration error");
            tracing::error!("❌ Finalizing registration {} failed: {}", registration_id, error);
            return Err(error);
        }

        let registration: CardRegistration = parse_body(&response, CARD_REGISTRATION_CONTEXT)?;

        match registration.result_code.as_deref() {
            Some(SUCCESS_RESULT_CODE) => {
                tracing::info!(
                    stage = %RegistrationStage::Done,
                    "✅ Registration {} completed, card {}",
                    registration.id,
                    registration.card_id.as_deref().unwrap_or("-")
                );
                Ok(registration)
            }
            code => {
                let error = RegistrationError::Api {
                    code: code.unwrap_or(API_ERROR_CODE).to_string(),
                    message: registration
                        .result_message
                        .clone()
                        .unwrap_or_else(|| "CardRegistration error".to_string()),
                };
                tracing::error!("❌ Registration {} refused: {}", registration.id, error);
                Err(error)
            }
        }
    }

    /// Cards registered for the configured user.
    pub async fn list_cards(&self, cancel: &CancelFlag) -> Result<Vec<Card>> {
        cancel.check()?;

        let url = self.api_url(&["users", self.config.user_id(), "cards"])?;
        tracing::debug!("📡 Listing cards: GET {}", url);
        let response = self
            .transport
            .authenticated(HttpMethod::Get, &url, None)
            .await?;

        if !response.is_success() {
            return Err(api_error(&response, "Card error"));
        }

        let cards: Vec<Card> = parse_body(&response, CARD_CONTEXT)?;
        tracing::info!("📇 Found {} cards", cards.len());
        Ok(cards)
    }

    /// Deactivates a card. The payment API does not allow reactivation.
    pub async fn deactivate_card(&self, card_id: &str, cancel: &CancelFlag) -> Result<Card> {
        cancel.check()?;

        let url = self.api_url(&["cards", card_id])?;
        let body = serde_json::json!({ "Active": false });
        tracing::debug!("📡 Deactivating card: PUT {}", url);
        let response = self
            .transport
            .authenticated(HttpMethod::Put, &url, Some(&body))
            .await?;

        if !response.is_success() {
            return Err(api_error(&response, "Card error"));
        }

        let card: Card = parse_body(&response, CARD_CONTEXT)?;
        tracing::info!("🗑️ Card {} deactivated", card.id);
        Ok(card)
    }
}

fn processor_token(response: &HttpResponse) -> Result<ProcessorToken> {
    let body = response.body_str();

    if let Some(code) = body.strip_prefix(PROCESSOR_ERROR_MARKER) {
        tracing::error!("❌ Processor refused the card with code {}", code.trim());
        return Err(RegistrationError::token_processing(code.trim()));
    }

    if body.is_empty() {
        tracing::error!("❌ Processor returned an empty response");
        return Err(RegistrationError::token_processing(
            TOKEN_PROCESSING_ERROR_CODE,
        ));
    }

    if !response.is_success() {
        tracing::error!("❌ Processor answered with status {}", response.status);
        return Err(RegistrationError::token_processing(
            TOKEN_PROCESSING_ERROR_CODE,
        ));
    }

    Ok(ProcessorToken::new(body))
}

fn api_error(response: &HttpResponse, fallback: &str) -> RegistrationError {
    let message = serde_json::from_str::<ApiErrorBody>(response.body_str())
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string());

    RegistrationError::Api {
        code: API_ERROR_CODE.to_string(),
        message,
    }
}

fn parse_body<D: DeserializeOwned>(response: &HttpResponse, context: &'static str) -> Result<D> {
    serde_json::from_str(response.body_str()).map_err(|e| {
        tracing::error!("❌ {} response is not valid JSON: {}", context, e);
        RegistrationError::MalformedResponse {
            context,
            detail: e.to_string(),
        }
    })
}
