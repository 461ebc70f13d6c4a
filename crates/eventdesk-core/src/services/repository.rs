/// Typed access to the resource tables
use crate::error::EventDeskError;
use crate::models::{Resource, Table, to_item};
use crate::services::store::{Condition, Counter, Item, Key, Store, WriteOp};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn Store>,
    table_prefix: String,
}

impl Repository {
    pub fn new(store: Arc<dyn Store>, table_prefix: impl Into<String>) -> Self {
        Self {
            store,
            table_prefix: table_prefix.into(),
        }
    }

    pub fn table_name(&self, table: Table) -> String {
        format!("{}_{}", self.table_prefix, table.suffix())
    }

    pub async fn get<T: Resource>(&self, key: &Key) -> Result<Option<T>, EventDeskError> {
        self.store
            .get(&self.table_name(T::TABLE), key)
            .await?
            .map(from_item)
            .transpose()
    }

    /// Like `get`, failing with `NotFound` when the item is absent
    pub async fn load<T: Resource>(&self, key: &Key) -> Result<T, EventDeskError> {
        self.get(key).await?.ok_or_else(|| {
            EventDeskError::NotFound(format!("{} {} not found", T::NAME, key.partition.1))
        })
    }

    /// Stores a new resource; fails with `Conflict` when the key is taken
    pub async fn create<T: Resource>(&self, resource: &T) -> Result<(), EventDeskError> {
        self.store
            .write(self.put_op(resource, Condition::NotExists)?)
            .await
            .map_err(|e| match e {
                EventDeskError::Conflict(_) => {
                    EventDeskError::Conflict(format!("{} already exists", T::NAME))
                }
                other => other,
            })
    }

    /// Replaces an existing resource; fails with `NotFound` when it vanished
    pub async fn save<T: Resource>(&self, resource: &T) -> Result<(), EventDeskError> {
        self.store
            .write(self.put_op(resource, Condition::Exists)?)
            .await
            .map_err(|e| not_found_on_conflict::<T>(e, &resource.key()))
    }

    /// Replaces an existing resource provided `condition` still holds on it
    pub async fn save_if<T: Resource>(
        &self,
        resource: &T,
        condition: Condition,
    ) -> Result<(), EventDeskError> {
        let key = resource.key();
        self.store
            .write(self.put_op(resource, condition.and_exists())?)
            .await
            .map_err(|e| match e {
                EventDeskError::Conflict(_) => EventDeskError::Conflict(format!(
                    "{} {} changed meanwhile",
                    T::NAME,
                    key.partition.1
                )),
                other => other,
            })
    }

    /// Stores a resource whether or not it exists
    pub async fn upsert<T: Resource>(&self, resource: &T) -> Result<(), EventDeskError> {
        self.store
            .write(self.put_op(resource, Condition::None)?)
            .await
    }

    pub async fn remove<T: Resource>(&self, key: &Key) -> Result<(), EventDeskError> {
        self.store
            .write(self.delete_op::<T>(key.clone(), Condition::Exists))
            .await
            .map_err(|e| not_found_on_conflict::<T>(e, key))?;
        debug!(resource = T::NAME, id = %key.partition.1, "Deleted resource");
        Ok(())
    }

    pub async fn list<T: Resource>(&self) -> Result<Vec<T>, EventDeskError> {
        self.store
            .scan(&self.table_name(T::TABLE))
            .await?
            .into_iter()
            .map(from_item)
            .collect()
    }

    /// Resources whose `attribute` equals `value`, by partition key or through `index`
    pub async fn query<T: Resource>(
        &self,
        index: Option<&str>,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<T>, EventDeskError> {
        self.store
            .query(&self.table_name(T::TABLE), index, attribute, value)
            .await?
            .into_iter()
            .map(from_item)
            .collect()
    }

    /// Applies all the writes atomically
    pub async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), EventDeskError> {
        self.store.transact_write(ops).await
    }

    pub async fn ping(&self) -> Result<(), EventDeskError> {
        self.store.ping().await
    }

    pub fn put_op<T: Resource>(
        &self,
        resource: &T,
        condition: Condition,
    ) -> Result<WriteOp, EventDeskError> {
        Ok(WriteOp::Put {
            table: self.table_name(T::TABLE),
            key: resource.key(),
            item: to_item(resource)?,
            condition,
        })
    }

    pub fn delete_op<T: Resource>(&self, key: Key, condition: Condition) -> WriteOp {
        WriteOp::Delete {
            table: self.table_name(T::TABLE),
            key,
            condition,
        }
    }

    /// Partial write of an existing resource; null fields are removed
    pub fn update_op<T: Resource>(&self, key: Key, fields: Item, condition: Condition) -> WriteOp {
        WriteOp::Update {
            table: self.table_name(T::TABLE),
            key,
            fields,
            condition: condition.and_exists(),
        }
    }

    pub fn increment_op<T: Resource>(
        &self,
        key: Key,
        counter: Counter,
        delta: i64,
        condition: Condition,
    ) -> WriteOp {
        WriteOp::Increment {
            table: self.table_name(T::TABLE),
            key,
            counter,
            delta,
            condition,
        }
    }
}

fn from_item<T: Resource>(item: Item) -> Result<T, EventDeskError> {
    serde_json::from_value(serde_json::Value::Object(item)).map_err(|e| {
        EventDeskError::Storage(format!("Malformed {} item: {}", T::NAME, e))
    })
}

fn not_found_on_conflict<T: Resource>(err: EventDeskError, key: &Key) -> EventDeskError {
    match err {
        EventDeskError::Conflict(_) => {
            EventDeskError::NotFound(format!("{} {} not found", T::NAME, key.partition.1))
        }
        other => other,
    }
}
