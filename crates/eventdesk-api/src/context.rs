/// API Context - shared state for all API handlers
use crate::auth::{JwksVerifier, TokenVerifier};
use eventdesk_core::services::{
    AppConfig, CognitoIdentityProvider, DynamoDbStore, EmailSender, IdentityProvider,
    MediaStorage, OutgoingEmail, Repository, S3MediaStorage, SesEmailSender,
};
use lambda_http::Error;
use std::sync::Arc;
use typed_builder::TypedBuilder;

/// API Context contains shared resources for API handlers
#[derive(Clone, TypedBuilder)]
pub struct ApiContext {
    /// Typed access to the DynamoDB tables
    pub repo: Repository,

    /// Images and proofs of payment
    pub media: Arc<dyn MediaStorage>,

    /// Notification emails
    pub mailer: Arc<dyn EmailSender>,

    /// User pool administration
    pub identity: Arc<dyn IdentityProvider>,

    /// Bearer token verification
    pub tokens: Arc<dyn TokenVerifier>,

    /// Front-end URL linked from notifications
    #[builder(default, setter(strip_option, into))]
    pub app_url: Option<String>,
}

impl ApiContext {
    /// Create a new API context from the environment
    pub async fn new() -> Result<Arc<Self>, Error> {
        let config = AppConfig::from_env()?;

        // Load AWS config
        let aws_config = aws_config::load_from_env().await;

        let dynamodb_client = aws_sdk_dynamodb::Client::new(&aws_config);
        let s3_client = aws_sdk_s3::Client::new(&aws_config);
        let ses_client = aws_sdk_ses::Client::new(&aws_config);
        let cognito_client = aws_sdk_cognitoidentityprovider::Client::new(&aws_config);

        let jwks_json =
            std::env::var("JWKS_JSON").map_err(|_| "JWKS_JSON environment variable not set")?;
        let jwt_issuer =
            std::env::var("JWT_ISSUER").map_err(|_| "JWT_ISSUER environment variable not set")?;
        let tokens = Arc::new(JwksVerifier::new(&jwks_json, jwt_issuer)?);

        let repo = Repository::new(
            Arc::new(DynamoDbStore::new(dynamodb_client)),
            config.table_prefix.clone(),
        );

        let media = Arc::new(S3MediaStorage::new(
            s3_client,
            config.media_bucket.clone(),
            config.media_base_url.clone(),
            config.signed_url_expiration,
        ));

        Ok(Arc::new(Self {
            repo,
            media,
            mailer: Arc::new(SesEmailSender::new(ses_client, config.sender_email.clone())),
            identity: Arc::new(CognitoIdentityProvider::new(
                cognito_client,
                config.user_pool_id.clone(),
            )),
            tokens,
            app_url: config.app_url,
        }))
    }

    /// Sends a notification; a failure is logged and never fails the caller
    pub async fn notify(&self, email: OutgoingEmail) {
        if let Err(e) = self.mailer.send(&email).await {
            tracing::warn!(
                error = %e,
                subject = %email.subject,
                "Failed to send notification"
            );
        }
    }

    /// Deletes an uploaded object that nothing references anymore; failures are only logged
    pub async fn discard_media(&self, key: &str) {
        if let Err(e) = self.media.delete(key).await {
            tracing::warn!(error = %e, key = %key, "Failed to delete media object");
        }
    }
}
