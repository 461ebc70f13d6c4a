/// Service modules: persistence and the AWS service wrappers
pub mod config;
pub mod dynamodb;
pub mod email;
pub mod identity;
pub mod media;
pub mod repository;
pub mod store;

pub use config::AppConfig;
pub use dynamodb::DynamoDbStore;
pub use email::{EmailSender, OutgoingEmail, SesEmailSender};
pub use identity::{CognitoIdentityProvider, IdentityProvider};
pub use media::{MediaStorage, S3MediaStorage};
pub use repository::Repository;
pub use store::{Condition, Counter, InMemoryStore, Item, Key, Store, WriteOp};
