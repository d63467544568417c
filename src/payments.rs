//! Thin client over the Stripe REST API.
//!
//! Constructed once at startup and carried in `AppState`; each call is a
//! single synchronous round trip from the handler's point of view, with no
//! retry policy. Failures surface immediately as `PaymentError`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("stripe request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("stripe returned {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub invoice_settings: Option<InvoiceSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceSettings {
    pub default_payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    /// Card details passed through to clients verbatim.
    pub card: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethodList {
    pub data: Vec<PaymentMethod>,
}

#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
            base_url: STRIPE_API_BASE.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, PaymentError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PaymentError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(&self.secret_key, None::<&str>)
            .query(query)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PaymentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body["error"]["message"]
            .as_str()
            .unwrap_or("unknown error")
            .to_string();
        Err(PaymentError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Creates a payment intent for `amount_cents`, tagged with metadata for
    /// later reconciliation.
    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        metadata: &[(&str, String)],
    ) -> Result<PaymentIntent, PaymentError> {
        let mut form = vec![
            ("amount".to_string(), amount_cents.to_string()),
            ("currency".to_string(), "usd".to_string()),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }
        self.post("/payment_intents", &form).await
    }

    /// Full refund against a stored payment intent.
    pub async fn refund_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Refund, PaymentError> {
        let form = vec![(
            "payment_intent".to_string(),
            payment_intent_id.to_string(),
        )];
        self.post("/refunds", &form).await
    }

    pub async fn create_customer(&self, email: &str) -> Result<Customer, PaymentError> {
        let form = vec![("email".to_string(), email.to_string())];
        self.post("/customers", &form).await
    }

    pub async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer, PaymentError> {
        self.get(&format!("/customers/{customer_id}"), &[]).await
    }

    pub async fn list_card_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<PaymentMethodList, PaymentError> {
        self.get(
            "/payment_methods",
            &[("customer", customer_id), ("type", "card")],
        )
        .await
    }

    pub async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        let form = vec![("customer".to_string(), customer_id.to_string())];
        self.post(&format!("/payment_methods/{payment_method_id}/attach"), &form)
            .await
    }

    pub async fn detach_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        self.post(&format!("/payment_methods/{payment_method_id}/detach"), &[])
            .await
    }

    pub async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<Customer, PaymentError> {
        let form = vec![(
            "invoice_settings[default_payment_method]".to_string(),
            payment_method_id.to_string(),
        )];
        self.post(&format!("/customers/{customer_id}"), &form).await
    }
}
