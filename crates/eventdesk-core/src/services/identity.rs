/// Identity provider administration (Cognito user pool)
use crate::auth::Group;
use crate::error::EventDeskError;
use async_trait::async_trait;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn delete_user(&self, user_id: &str) -> Result<(), EventDeskError>;
    async fn add_user_to_group(&self, user_id: &str, group: Group) -> Result<(), EventDeskError>;
    async fn remove_user_from_group(
        &self,
        user_id: &str,
        group: Group,
    ) -> Result<(), EventDeskError>;
}

pub struct CognitoIdentityProvider {
    client: aws_sdk_cognitoidentityprovider::Client,
    user_pool_id: String,
}

impl CognitoIdentityProvider {
    pub fn new(
        client: aws_sdk_cognitoidentityprovider::Client,
        user_pool_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn delete_user(&self, user_id: &str) -> Result<(), EventDeskError> {
        self.client
            .admin_delete_user()
            .user_pool_id(&self.user_pool_id)
            .username(user_id)
            .send()
            .await
            .map_err(|e| EventDeskError::Identity(format!("Cognito delete user failed: {}", e)))?;

        tracing::info!(user_id = %user_id, "Deleted identity");
        Ok(())
    }

    async fn add_user_to_group(&self, user_id: &str, group: Group) -> Result<(), EventDeskError> {
        self.client
            .admin_add_user_to_group()
            .user_pool_id(&self.user_pool_id)
            .username(user_id)
            .group_name(group.as_str())
            .send()
            .await
            .map_err(|e| {
                EventDeskError::Identity(format!("Cognito add user to group failed: {}", e))
            })?;

        tracing::info!(user_id = %user_id, group = %group, "Added user to group");
        Ok(())
    }

    async fn remove_user_from_group(
        &self,
        user_id: &str,
        group: Group,
    ) -> Result<(), EventDeskError> {
        self.client
            .admin_remove_user_from_group()
            .user_pool_id(&self.user_pool_id)
            .username(user_id)
            .group_name(group.as_str())
            .send()
            .await
            .map_err(|e| {
                EventDeskError::Identity(format!("Cognito remove user from group failed: {}", e))
            })?;

        tracing::info!(user_id = %user_id, group = %group, "Removed user from group");
        Ok(())
    }
}
