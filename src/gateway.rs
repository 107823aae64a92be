//! Typed client for the remote gateway.
//!
//! `HealthGateway` is the seam the orchestration state machines depend
//! on. `GatewayClient` is the real reqwest implementation; `MockGateway`
//! is a deterministic double for unit tests (configurable responses,
//! per-endpoint failure toggles, call counters).

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config;
use crate::error::GatewayError;
use crate::models::{
    ContactsEnvelope, DietPlan, EmergencyContact, HistoryEnvelope, LocationFix,
    PredictRequest, PredictionResult, SkinScan, SymptomCatalogEnvelope, SymptomScan,
};

/// Operations the gateway exposes to this core.
///
/// All calls ride the ambient session credential; a non-2xx status or
/// body-shape mismatch is uniformly a request failure.
#[allow(async_fn_in_trait)] // static dispatch only; orchestrators are generic over G
pub trait HealthGateway {
    async fn fetch_symptom_history(&self) -> Result<Vec<SymptomScan>, GatewayError>;
    async fn fetch_diet_history(&self) -> Result<Vec<DietPlan>, GatewayError>;
    async fn fetch_skin_history(&self) -> Result<Vec<SkinScan>, GatewayError>;
    async fn delete_symptom_record(&self, id: i64) -> Result<(), GatewayError>;
    async fn delete_diet_record(&self, id: i64) -> Result<(), GatewayError>;
    async fn fetch_contacts(&self) -> Result<Vec<EmergencyContact>, GatewayError>;
    async fn send_sos(&self, fix: LocationFix) -> Result<(), GatewayError>;
    async fn predict(&self, symptoms: &[String]) -> Result<PredictionResult, GatewayError>;
    async fn fetch_symptom_catalog(&self) -> Result<Vec<String>, GatewayError>;
}

// ═══════════════════════════════════════════════════════════
// GatewayClient — reqwest implementation
// ═══════════════════════════════════════════════════════════

/// HTTP client for the gateway.
///
/// The cookie store carries the session credential set at login, so
/// every request is authenticated without token plumbing in this core.
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(config::CONNECT_TIMEOUT)
            .timeout(config::REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Client for the default development gateway.
    pub fn default_local() -> Self {
        Self::new(config::DEFAULT_GATEWAY_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check status, then parse the typed body. Fails closed: a 2xx
    /// with an unexpected shape is still a request failure.
    async fn parse<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::ResponseParsing(e.to_string()))
    }

    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(GatewayError::from_transport)?;
        Self::parse(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .map_err(GatewayError::from_transport)?;
        Self::check_status(response).await.map(|_| ())
    }
}

impl HealthGateway for GatewayClient {
    async fn fetch_symptom_history(&self) -> Result<Vec<SymptomScan>, GatewayError> {
        let envelope: HistoryEnvelope<SymptomScan> = self.get_json("/history").await?;
        Ok(envelope.history)
    }

    async fn fetch_diet_history(&self) -> Result<Vec<DietPlan>, GatewayError> {
        let envelope: HistoryEnvelope<DietPlan> = self.get_json("/diet-history").await?;
        Ok(envelope.history)
    }

    async fn fetch_skin_history(&self) -> Result<Vec<SkinScan>, GatewayError> {
        let envelope: HistoryEnvelope<SkinScan> = self.get_json("/skin-history").await?;
        Ok(envelope.history)
    }

    async fn delete_symptom_record(&self, id: i64) -> Result<(), GatewayError> {
        self.delete(&format!("/history/{id}")).await
    }

    async fn delete_diet_record(&self, id: i64) -> Result<(), GatewayError> {
        self.delete(&format!("/diet-history/{id}")).await
    }

    async fn fetch_contacts(&self) -> Result<Vec<EmergencyContact>, GatewayError> {
        let envelope: ContactsEnvelope = self.get_json("/contacts").await?;
        Ok(envelope.contacts)
    }

    async fn send_sos(&self, fix: LocationFix) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url("/sos"))
            .json(&fix)
            .send()
            .await
            .map_err(GatewayError::from_transport)?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn predict(&self, symptoms: &[String]) -> Result<PredictionResult, GatewayError> {
        let response = self
            .client
            .post(self.url("/predict"))
            .json(&PredictRequest { symptoms })
            .send()
            .await
            .map_err(GatewayError::from_transport)?;
        Self::parse(response).await
    }

    async fn fetch_symptom_catalog(&self) -> Result<Vec<String>, GatewayError> {
        let envelope: SymptomCatalogEnvelope = self.get_json("/symptoms").await?;
        Ok(envelope.symptoms)
    }
}

// ═══════════════════════════════════════════════════════════
// MockGateway — deterministic test double
// ═══════════════════════════════════════════════════════════

/// Endpoint identifiers for failure toggles on [`MockGateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    SymptomHistory,
    DietHistory,
    SkinHistory,
    DeleteSymptom,
    DeleteDiet,
    Contacts,
    Sos,
    Predict,
    Catalog,
}

/// In-memory gateway double.
///
/// Every call optionally sleeps (`with_delay`) so cancellation paths
/// can be exercised, bumps a counter, then answers with the configured
/// data or a synthetic 500 if the endpoint is toggled to fail.
#[derive(Default)]
pub struct MockGateway {
    delay: Option<Duration>,
    failing: Mutex<HashSet<MockOp>>,
    symptom_history: Mutex<Vec<SymptomScan>>,
    diet_history: Mutex<Vec<DietPlan>>,
    skin_history: Mutex<Vec<SkinScan>>,
    contacts: Mutex<Vec<EmergencyContact>>,
    catalog: Mutex<Vec<String>>,
    prediction: Mutex<Option<PredictionResult>>,
    predicted_sets: Mutex<Vec<Vec<String>>>,
    sent_fixes: Mutex<Vec<LocationFix>>,
    sos_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    predict_calls: AtomicUsize,
    contact_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_symptom_history(self, records: Vec<SymptomScan>) -> Self {
        *self.symptom_history.lock().unwrap() = records;
        self
    }

    pub fn with_diet_history(self, records: Vec<DietPlan>) -> Self {
        *self.diet_history.lock().unwrap() = records;
        self
    }

    pub fn with_skin_history(self, records: Vec<SkinScan>) -> Self {
        *self.skin_history.lock().unwrap() = records;
        self
    }

    pub fn with_contacts(self, contacts: Vec<EmergencyContact>) -> Self {
        *self.contacts.lock().unwrap() = contacts;
        self
    }

    pub fn with_catalog(self, symptoms: Vec<String>) -> Self {
        *self.catalog.lock().unwrap() = symptoms;
        self
    }

    pub fn with_prediction(self, result: PredictionResult) -> Self {
        *self.prediction.lock().unwrap() = Some(result);
        self
    }

    pub fn with_failing(self, op: MockOp) -> Self {
        self.failing.lock().unwrap().insert(op);
        self
    }

    /// Flip an endpoint between failing and healthy mid-test.
    pub fn set_failing(&self, op: MockOp, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(op);
        } else {
            set.remove(&op);
        }
    }

    pub fn sos_calls(&self) -> usize {
        self.sos_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    pub fn contact_calls(&self) -> usize {
        self.contact_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    /// Every `{latitude, longitude}` body received by the sos endpoint.
    pub fn sent_fixes(&self) -> Vec<LocationFix> {
        self.sent_fixes.lock().unwrap().clone()
    }

    /// Every symptom set received by the predict endpoint.
    pub fn predicted_sets(&self) -> Vec<Vec<String>> {
        self.predicted_sets.lock().unwrap().clone()
    }

    async fn answer(&self, op: MockOp) -> Result<(), GatewayError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&op) {
            return Err(GatewayError::Server {
                status: 500,
                body: "mock failure".into(),
            });
        }
        Ok(())
    }
}

impl HealthGateway for MockGateway {
    async fn fetch_symptom_history(&self) -> Result<Vec<SymptomScan>, GatewayError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(MockOp::SymptomHistory).await?;
        Ok(self.symptom_history.lock().unwrap().clone())
    }

    async fn fetch_diet_history(&self) -> Result<Vec<DietPlan>, GatewayError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(MockOp::DietHistory).await?;
        Ok(self.diet_history.lock().unwrap().clone())
    }

    async fn fetch_skin_history(&self) -> Result<Vec<SkinScan>, GatewayError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(MockOp::SkinHistory).await?;
        Ok(self.skin_history.lock().unwrap().clone())
    }

    async fn delete_symptom_record(&self, id: i64) -> Result<(), GatewayError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(MockOp::DeleteSymptom).await?;
        self.symptom_history.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn delete_diet_record(&self, id: i64) -> Result<(), GatewayError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(MockOp::DeleteDiet).await?;
        self.diet_history.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn fetch_contacts(&self) -> Result<Vec<EmergencyContact>, GatewayError> {
        self.contact_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(MockOp::Contacts).await?;
        Ok(self.contacts.lock().unwrap().clone())
    }

    async fn send_sos(&self, fix: LocationFix) -> Result<(), GatewayError> {
        self.sos_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(MockOp::Sos).await?;
        self.sent_fixes.lock().unwrap().push(fix);
        Ok(())
    }

    async fn predict(&self, symptoms: &[String]) -> Result<PredictionResult, GatewayError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(MockOp::Predict).await?;
        self.predicted_sets.lock().unwrap().push(symptoms.to_vec());
        self.prediction
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GatewayError::ResponseParsing("no prediction configured".into()))
    }

    async fn fetch_symptom_catalog(&self) -> Result<Vec<String>, GatewayError> {
        self.answer(MockOp::Catalog).await?;
        Ok(self.catalog.lock().unwrap().clone())
    }
}
