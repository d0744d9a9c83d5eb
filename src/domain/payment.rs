use crate::domain::pricing::round_money;
use crate::error::VerificationError;
use rand::Rng;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use url::Url;

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12}$").expect("reference pattern is valid"));

/// A bank transaction reference the customer claims to have paid with.
///
/// Always exactly 12 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceCode(String);

impl ReferenceCode {
    pub fn parse(input: &str) -> Result<Self, VerificationError> {
        if REFERENCE_PATTERN.is_match(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(VerificationError::InvalidReference)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ReferenceCode {
    type Error = VerificationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReferenceCode> for String {
    fn from(code: ReferenceCode) -> Self {
        code.0
    }
}

impl fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who gets paid, and how payment links are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub payee_id: String,
    pub payee_name: String,
    pub currency: String,
    pub scheme: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            payee_id: "printdesk@upi".to_string(),
            payee_name: "PRINTDESK".to_string(),
            currency: "INR".to_string(),
            scheme: "upi".to_string(),
        }
    }
}

/// A request for payment, ready to be rendered as a scannable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentDescriptor {
    pub payee_id: String,
    pub payee_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub note: String,
    scheme: String,
}

impl PaymentDescriptor {
    /// Renders the descriptor as `scheme://pay?payee=..&amount=..&currency=..&note=..`.
    pub fn to_uri(&self) -> String {
        let amount = format!("{:.2}", round_money(self.amount));
        let base = format!("{}://pay", self.scheme);
        let params = [
            ("payee", self.payee_id.as_str()),
            ("amount", amount.as_str()),
            ("currency", self.currency.as_str()),
            ("note", self.note.as_str()),
        ];
        match Url::parse_with_params(&base, params) {
            Ok(url) => url.to_string(),
            // only reachable with a malformed scheme in configuration
            Err(_) => {
                let query: String = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params)
                    .finish();
                format!("{base}?{query}")
            }
        }
    }
}

/// Produces payment descriptors for the verification process.
pub trait PaymentRequestFactory: Send + Sync {
    fn create(&self, amount: Decimal) -> PaymentDescriptor;
}

/// Builds descriptors from a [`PaymentConfig`], tagging each with a fresh
/// random order note.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredPaymentRequests {
    config: PaymentConfig,
}

impl ConfiguredPaymentRequests {
    pub fn new(config: PaymentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }
}

impl PaymentRequestFactory for ConfiguredPaymentRequests {
    fn create(&self, amount: Decimal) -> PaymentDescriptor {
        let tag: u32 = rand::thread_rng().gen_range(0..10_000);
        PaymentDescriptor {
            payee_id: self.config.payee_id.clone(),
            payee_name: self.config.payee_name.clone(),
            amount,
            currency: self.config.currency.clone(),
            note: format!("Order_{tag}"),
            scheme: self.config.scheme.clone(),
        }
    }
}
