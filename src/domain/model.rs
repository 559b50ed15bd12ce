use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Card schemes the registration flow knows about.
///
/// Anything else is kept verbatim in `Other` so the validator can reject it
/// with the CVV check instead of failing at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardType {
    CbVisaMastercard,
    Amex,
    Maestro,
    Bcmc,
    Other(String),
}

impl CardType {
    pub fn as_str(&self) -> &str {
        match self {
            CardType::CbVisaMastercard => "CB_VISA_MASTERCARD",
            CardType::Amex => "AMEX",
            CardType::Maestro => "MAESTRO",
            CardType::Bcmc => "BCMC",
            CardType::Other(raw) => raw,
        }
    }

    /// Maestro and Bancontact cards carry no CVX in this flow.
    pub fn skips_cvx(&self) -> bool {
        matches!(self, CardType::Maestro | CardType::Bcmc)
    }
}

impl FromStr for CardType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let card_type = match s.trim() {
            "CB_VISA_MASTERCARD" => CardType::CbVisaMastercard,
            "AMEX" => CardType::Amex,
            "MAESTRO" => CardType::Maestro,
            "BCMC" => CardType::Bcmc,
            other => CardType::Other(other.to_string()),
        };
        Ok(card_type)
    }
}

impl From<String> for CardType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(card_type) => card_type,
            Err(never) => match never {},
        }
    }
}

impl From<CardType> for String {
    fn from(value: CardType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw card details for one registration attempt.
///
/// Wiped from memory on drop and never printed in full.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CardData {
    pub number: String,
    #[zeroize(skip)]
    pub card_type: CardType,
    /// MMYY
    pub expiration_date: String,
    pub cvx: String,
}

impl CardData {
    pub fn new(
        number: impl Into<String>,
        card_type: CardType,
        expiration_date: impl Into<String>,
        cvx: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            card_type,
            expiration_date: expiration_date.into(),
            cvx: cvx.into(),
        }
    }

    /// Card number with everything but the last four digits masked.
    pub fn masked_number(&self) -> String {
        let digits: Vec<char> = self.number.trim().chars().collect();
        let visible = digits.len().saturating_sub(4);
        digits
            .iter()
            .enumerate()
            .map(|(i, c)| if i < visible { '*' } else { *c })
            .collect()
    }
}

impl fmt::Debug for CardData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardData")
            .field("number", &self.masked_number())
            .field("card_type", &self.card_type)
            .field("expiration_date", &"****")
            .field("cvx", &"***")
            .finish()
    }
}

/// Body of the pre-registration request sent to the payment API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreRegistrationRequest {
    pub tag: String,
    pub user_id: String,
    pub currency: String,
    pub card_type: CardType,
}

/// Registration context issued by the payment API.
///
/// Moved into the tokenize step, so it can only be used once.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreRegistration {
    pub id: String,
    #[serde(rename = "CardRegistrationURL")]
    pub card_registration_url: String,
    pub preregistration_data: String,
    pub access_key: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl fmt::Debug for PreRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreRegistration")
            .field("id", &self.id)
            .field("card_registration_url", &self.card_registration_url)
            .field("preregistration_data", &"<redacted>")
            .field("access_key", &"<redacted>")
            .field("status", &self.status)
            .finish()
    }
}

/// Opaque token handed out by the card-data processor.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ProcessorToken(String);

impl ProcessorToken {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProcessorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProcessorToken(<redacted>)")
    }
}

/// Output of the tokenize step: everything finalize needs.
#[derive(Debug)]
pub struct TokenizedRegistration {
    pub registration_id: String,
    pub token: ProcessorToken,
}

/// Card registration resource as returned by the payment API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CardRegistration {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Card {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Protocol position of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    Init,
    PreRegistered,
    Tokenized,
    Done,
}

impl fmt::Display for RegistrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistrationStage::Init => "INIT",
            RegistrationStage::PreRegistered => "PRE_REGISTERED",
            RegistrationStage::Tokenized => "TOKENIZED",
            RegistrationStage::Done => "DONE",
        };
        f.write_str(name)
    }
}
