//! Client for the login, registration and bus-route endpoints.
//!
//! The backend behind these calls is not part of this crate. [`AuthFlow`]
//! wraps any [`BackendApi`] with validation, a submit guard and session
//! persistence.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::{DeskError, Result};
use crate::models::{Role, SessionRole};
use crate::session::SessionGuard;
use crate::validation::InputValidator;

const CONNECTION_ERROR: &str = "Connection error. Please check your internet connection.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub student_id: String,
    pub bus_id: String,
    pub password: String,
}

/// Registration form as typed, including the password confirmation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub student_id: String,
    pub bus_id: String,
    pub password: String,
    pub confirm_password: String,
}

/// A selectable route from `GET /buses`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BusRoute {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub bus_number: String,
    pub route: String,
}

impl BusRoute {
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.bus_number, self.route)
    }
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Deserialize)]
struct BusList {
    #[serde(default)]
    buses: Vec<BusRoute>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;
    async fn register(&self, request: &RegisterRequest) -> Result<()>;
    async fn list_buses(&self) -> Result<Vec<BusRoute>>;
}

/// [`BackendApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    /// Error for a non-success response: the body's `error` field, or `fallback`.
    async fn failure(response: reqwest::Response, fallback: &str) -> DeskError {
        let status = response.status();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| fallback.to_string());
        warn!(%status, %message, "backend rejected request");
        DeskError::Network(message)
    }

    fn unreachable(err: &reqwest::Error) -> DeskError {
        warn!(error = %err, "backend unreachable");
        DeskError::Network(CONNECTION_ERROR.to_string())
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await
            .map_err(|e| Self::unreachable(&e))?;
        if !response.status().is_success() {
            return Err(Self::failure(response, "Login failed. Please try again.").await);
        }
        Ok(response.json().await?)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(request)
            .send()
            .await
            .map_err(|e| Self::unreachable(&e))?;
        if !response.status().is_success() {
            return Err(Self::failure(response, "Registration failed. Please try again.").await);
        }
        Ok(())
    }

    async fn list_buses(&self) -> Result<Vec<BusRoute>> {
        let response = self
            .client
            .get(self.url("/buses"))
            .send()
            .await
            .map_err(|e| Self::unreachable(&e))?;
        if !response.status().is_success() {
            return Err(Self::failure(response, "Could not load bus routes").await);
        }
        Ok(response.json::<BusList>().await?.buses)
    }
}

/// Rejects a second submission while one is in flight.
#[derive(Debug, Default)]
pub struct SubmitGuard {
    in_flight: AtomicBool,
}

/// Held for the duration of one submission
#[derive(Debug)]
pub struct SubmitTicket<'a> {
    flag: &'a AtomicBool,
}

impl SubmitGuard {
    pub fn begin(&self) -> Result<SubmitTicket<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DeskError::SubmitInFlight)?;
        Ok(SubmitTicket { flag: &self.in_flight })
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for SubmitTicket<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Login and registration as the landing pages drive them.
pub struct AuthFlow<A> {
    api: A,
    session: SessionGuard,
    login_gate: SubmitGuard,
    register_gate: SubmitGuard,
}

impl<A: BackendApi> AuthFlow<A> {
    pub fn new(api: A, session: SessionGuard) -> Self {
        Self {
            api,
            session,
            login_gate: SubmitGuard::default(),
            register_gate: SubmitGuard::default(),
        }
    }

    /// Log in and persist the session; returns the dashboard page to open.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<&'static str> {
        let _ticket = self.login_gate.begin()?;
        InputValidator::validate_email(email)?;
        if password.is_empty() {
            return Err(DeskError::validation("password", "Password is required"));
        }

        let response = self
            .api
            .login(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
                role,
            })
            .await?;
        self.session.persist(&SessionRole {
            role,
            token: response.token,
            user: response.user,
        })?;
        info!(role = %role, "logged in");
        Ok(role.dashboard_page())
    }

    /// Register a student account; returns the page to go to afterwards.
    pub async fn register(&self, form: &RegistrationForm) -> Result<&str> {
        let _ticket = self.register_gate.begin()?;
        InputValidator::validate_password(&form.password, &form.confirm_password)?;
        InputValidator::validate_name(&form.name)?;
        InputValidator::validate_email(&form.email)?;
        InputValidator::validate_phone(&form.phone)?;

        self.api
            .register(&RegisterRequest {
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
                phone: form.phone.trim().to_string(),
                student_id: form.student_id.trim().to_string(),
                bus_id: form.bus_id.clone(),
                password: form.password.clone(),
            })
            .await?;
        info!(email = %form.email.trim(), "registration accepted");
        Ok(self.session.landing_page())
    }

    /// Routes for the registration select; an unreachable backend yields none.
    pub async fn bus_routes(&self) -> Vec<BusRoute> {
        match self.api.list_buses().await {
            Ok(routes) => routes,
            Err(e) => {
                warn!(error = %e, "error loading bus routes");
                Vec::new()
            }
        }
    }

    /// Dashboard of an already authenticated session
    pub fn resume(&self) -> Result<Option<&'static str>> {
        self.session.resume()
    }
}
