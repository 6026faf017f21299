use entity::validate;
use platform_api::ApiResult;
use platform_client::BackendClient;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub const VALIDATE_FUNCTION: &str = "validate-sms";
pub const SEND_FUNCTION: &str = "send-sms";
pub const MAX_BODY_CHARS: usize = 1_600;

#[derive(Serialize)]
struct ValidateRequest<'a> {
    phone_number: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    body: &'a str,
}

/// Carrier lookup result for a phone number.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NumberValidation {
    pub valid: bool,
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub line_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SmsReceipt {
    pub message_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SmsService {
    client: BackendClient,
}

impl SmsService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    #[instrument(name = "crm.sms.validate_number", skip(self))]
    pub async fn validate_number(&self, number: &str) -> ApiResult<NumberValidation> {
        validate::phone("phone_number", number)?;
        self.client
            .invoke(VALIDATE_FUNCTION, &ValidateRequest { phone_number: number })
            .await
    }

    #[instrument(name = "crm.sms.send", skip(self, body), fields(chars = body.chars().count()))]
    pub async fn send(&self, to: &str, body: &str) -> ApiResult<SmsReceipt> {
        validate::phone("to", to)?;
        validate::required("body", body)?;
        validate::max_length("body", body, MAX_BODY_CHARS)?;
        let receipt: SmsReceipt = self
            .client
            .invoke(SEND_FUNCTION, &SendRequest { to, body })
            .await?;
        info!(message_id = %receipt.message_id, "sms queued");
        Ok(receipt)
    }
}
