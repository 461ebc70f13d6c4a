//! Common test utilities for the API integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use eventdesk_api::{ApiContext, auth::TokenVerifier};
use eventdesk_core::EventDeskError;
use eventdesk_core::auth::{Group, Principal};
use eventdesk_core::models::{Configuration, FormField, Resource, User};
use eventdesk_core::services::{
    EmailSender, IdentityProvider, InMemoryStore, Item, Key, MediaStorage, OutgoingEmail,
    Repository, Store, WriteOp,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Accepts tokens of the form `<user id>|<group>,<group>`
pub struct StaticTokens;

impl TokenVerifier for StaticTokens {
    fn verify(&self, token: &str) -> Result<Principal, String> {
        let (user_id, groups) = token.split_once('|').unwrap_or((token, ""));
        if user_id.is_empty() {
            return Err("empty token".to_string());
        }
        let groups = groups
            .split(',')
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Principal::new(user_id, email_of(user_id), groups))
    }
}

pub fn email_of(user_id: &str) -> String {
    format!("{}@example.com", user_id)
}

pub fn token(user_id: &str, groups: &[Group]) -> String {
    let groups: Vec<&str> = groups.iter().map(Group::as_str).collect();
    format!("{}|{}", user_id, groups.join(","))
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EventDeskError> {
        if self.fail {
            return Err(EventDeskError::Email("SES unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(format!("msg-{}", uuid::Uuid::new_v4()))
    }
}

/// Signs fake URLs and records the deleted objects
#[derive(Default)]
pub struct RecordingMedia {
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaStorage for RecordingMedia {
    async fn upload_url(&self, key: &str, _content_type: &str) -> Result<String, EventDeskError> {
        Ok(format!("https://upload.test/{}", key))
    }

    async fn download_url(&self, key: &str) -> Result<String, EventDeskError> {
        Ok(format!("https://download.test/{}", key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://cdn.test/{}", key)
    }

    async fn delete(&self, key: &str) -> Result<(), EventDeskError> {
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingIdentity {
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl IdentityProvider for RecordingIdentity {
    async fn delete_user(&self, user_id: &str) -> Result<(), EventDeskError> {
        self.calls.lock().unwrap().push(format!("delete:{}", user_id));
        Ok(())
    }

    async fn add_user_to_group(&self, user_id: &str, group: Group) -> Result<(), EventDeskError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("add:{}:{}", user_id, group));
        Ok(())
    }

    async fn remove_user_from_group(
        &self,
        user_id: &str,
        group: Group,
    ) -> Result<(), EventDeskError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("remove:{}:{}", user_id, group));
        Ok(())
    }
}

/// In-memory store committing queued transactions right before the next
/// write, the way a concurrent request lands between a handler's reads and
/// its own write
#[derive(Default)]
pub struct InterleavingStore {
    inner: InMemoryStore,
    queued: Mutex<Vec<Vec<WriteOp>>>,
}

impl InterleavingStore {
    pub fn queue(&self, transaction: Vec<WriteOp>) {
        self.queued.lock().unwrap().push(transaction);
    }

    async fn commit_queued(&self) {
        let queued = std::mem::take(&mut *self.queued.lock().unwrap());
        for transaction in queued {
            self.inner.transact_write(transaction).await.unwrap();
        }
    }
}

#[async_trait]
impl Store for InterleavingStore {
    async fn get(&self, table: &str, key: &Key) -> Result<Option<Item>, EventDeskError> {
        self.inner.get(table, key).await
    }

    async fn write(&self, op: WriteOp) -> Result<(), EventDeskError> {
        self.commit_queued().await;
        self.inner.write(op).await
    }

    async fn scan(&self, table: &str) -> Result<Vec<Item>, EventDeskError> {
        self.inner.scan(table).await
    }

    async fn query(
        &self,
        table: &str,
        index: Option<&str>,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<Item>, EventDeskError> {
        self.inner.query(table, index, attribute, value).await
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), EventDeskError> {
        self.commit_queued().await;
        self.inner.transact_write(ops).await
    }

    async fn ping(&self) -> Result<(), EventDeskError> {
        self.inner.ping().await
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: Repository,
    pub mailer: Arc<RecordingMailer>,
    pub media: Arc<RecordingMedia>,
    pub identity: Arc<RecordingIdentity>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::default())
    }

    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        Self::build(Arc::new(InMemoryStore::new()), mailer)
    }

    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self::build(store, RecordingMailer::default())
    }

    fn build(store: Arc<dyn Store>, mailer: RecordingMailer) -> Self {
        let repo = Repository::new(store, "test");
        let mailer = Arc::new(mailer);
        let media = Arc::new(RecordingMedia::default());
        let identity = Arc::new(RecordingIdentity::default());

        let ctx = ApiContext::builder()
            .repo(repo.clone())
            .media(media.clone())
            .mailer(mailer.clone())
            .identity(identity.clone())
            .tokens(Arc::new(StaticTokens))
            .app_url("https://app.example.com")
            .build();

        Self {
            router: eventdesk_api::router(Arc::new(ctx)),
            repo,
            mailer,
            media,
            identity,
        }
    }

    /// Sends a request and returns the status with the JSON body (`Null` when empty)
    pub async fn call(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn seed<T: Resource>(&self, resource: &T) {
        self.repo.upsert(resource).await.unwrap();
    }

    /// Stores a configuration with open registrations, one spot type and two countries
    pub async fn seed_configuration(&self, leaders_can_assign: bool) -> Configuration {
        let configuration = Configuration {
            is_registration_open: true,
            can_country_leaders_assign_spots: leaders_can_assign,
            registration_form_def: vec![FormField {
                name: "diet".to_string(),
                label: "Diet".to_string(),
                required: true,
            }],
            spot_types: vec!["Participant".to_string()],
            section_countries: vec!["Belgium".to_string(), "France".to_string()],
            ..Configuration::default()
        };
        self.seed(&configuration).await;
        configuration
    }

    /// Stores a registered user of the given country
    pub async fn seed_user(&self, user_id: &str, country: Option<&str>) -> User {
        let user = User {
            user_id: user_id.to_string(),
            email: email_of(user_id),
            first_name: "First".to_string(),
            last_name: user_id.to_string(),
            section_country: country.map(str::to_string),
            registration_at: Some("2026-01-01T00:00:00+00:00".to_string()),
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            ..User::default()
        };
        self.seed(&user).await;
        user
    }

    pub async fn load_user(&self, user_id: &str) -> User {
        self.repo.load(&User::key_for(user_id)).await.unwrap()
    }
}
