/// Document store abstraction over DynamoDB
use crate::error::EventDeskError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

/// A stored document: attribute name to JSON value
pub type Item = serde_json::Map<String, Value>;

/// Primary key of an item: a string partition key and an optional string sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub partition: (String, String),
    pub sort: Option<(String, String)>,
}

impl Key {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            partition: (name.into(), value.into()),
            sort: None,
        }
    }

    pub fn with_sort(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.sort = Some((name.into(), value.into()));
        self
    }

    /// Key attributes as (name, value) pairs
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once(&self.partition)
            .chain(self.sort.as_ref())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn storage_id(&self) -> String {
        match &self.sort {
            Some((_, sort)) => format!("{}#{}", self.partition.1, sort),
            None => self.partition.1.clone(),
        }
    }
}

/// Condition evaluated against the current version of the item before a write
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    None,
    Exists,
    NotExists,
    /// The item lacks `attribute`, or there is no item at all
    Absent { attribute: String },
    /// `attribute = value`
    Equals { attribute: String, value: Value },
    /// `attribute < bound`, both numeric attributes of the same item
    LessThan { attribute: String, bound: String },
    /// Every condition holds
    All(Vec<Condition>),
}

impl Condition {
    pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn less_than(attribute: impl Into<String>, bound: impl Into<String>) -> Self {
        Self::LessThan {
            attribute: attribute.into(),
            bound: bound.into(),
        }
    }

    pub fn absent(attribute: impl Into<String>) -> Self {
        Self::Absent {
            attribute: attribute.into(),
        }
    }

    /// `attribute` still holds what was read: equal to `value`, or absent for `None`
    pub fn unchanged<T: Serialize>(
        attribute: impl Into<String>,
        value: Option<&T>,
    ) -> Result<Self, EventDeskError> {
        Ok(match value {
            Some(value) => Self::equals(attribute, serde_json::to_value(value)?),
            None => Self::absent(attribute),
        })
    }

    /// The item exists and `self` holds on it
    pub fn and_exists(self) -> Self {
        match self {
            Self::None | Self::Exists => Self::Exists,
            other => Self::All(vec![Self::Exists, other]),
        }
    }

    /// Evaluates the condition with DynamoDB semantics: comparisons on a
    /// missing item or a missing attribute are false
    pub fn holds(&self, current: Option<&Item>) -> bool {
        match self {
            Self::None => true,
            Self::Exists => current.is_some(),
            Self::NotExists => current.is_none(),
            Self::Absent { attribute } => {
                current.is_none_or(|item| !item.contains_key(attribute))
            }
            Self::Equals { attribute, value } => {
                current.and_then(|item| item.get(attribute)) == Some(value)
            }
            Self::LessThan { attribute, bound } => current
                .and_then(|item| {
                    let value = item.get(attribute)?.as_f64()?;
                    let bound = item.get(bound)?.as_f64()?;
                    Some(value < bound)
                })
                .unwrap_or(false),
            Self::All(conditions) => conditions.iter().all(|c| c.holds(current)),
        }
    }
}

/// Numeric attribute, or element of a numeric list attribute, to increment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pub attribute: String,
    pub index: Option<usize>,
}

impl Counter {
    pub fn attribute(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            index: None,
        }
    }

    pub fn element(attribute: impl Into<String>, index: usize) -> Self {
        Self {
            attribute: attribute.into(),
            index: Some(index),
        }
    }
}

/// A single conditional write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put {
        table: String,
        key: Key,
        item: Item,
        condition: Condition,
    },
    Delete {
        table: String,
        key: Key,
        condition: Condition,
    },
    Increment {
        table: String,
        key: Key,
        counter: Counter,
        delta: i64,
        condition: Condition,
    },
    /// Sets the given attributes and leaves the others alone; a null value
    /// removes the attribute
    Update {
        table: String,
        key: Key,
        fields: Item,
        condition: Condition,
    },
}

impl WriteOp {
    pub fn table(&self) -> &str {
        match self {
            Self::Put { table, .. }
            | Self::Delete { table, .. }
            | Self::Increment { table, .. }
            | Self::Update { table, .. } => table,
        }
    }

    pub fn key(&self) -> &Key {
        match self {
            Self::Put { key, .. }
            | Self::Delete { key, .. }
            | Self::Increment { key, .. }
            | Self::Update { key, .. } => key,
        }
    }

    pub fn condition(&self) -> &Condition {
        match self {
            Self::Put { condition, .. }
            | Self::Delete { condition, .. }
            | Self::Increment { condition, .. }
            | Self::Update { condition, .. } => condition,
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, table: &str, key: &Key) -> Result<Option<Item>, EventDeskError>;

    /// Applies one conditional write; a failed condition yields `Conflict`
    async fn write(&self, op: WriteOp) -> Result<(), EventDeskError>;

    async fn scan(&self, table: &str) -> Result<Vec<Item>, EventDeskError>;

    /// Items whose `attribute` equals `value`, through the table's partition key
    /// or through the named secondary index
    async fn query(
        &self,
        table: &str,
        index: Option<&str>,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<Item>, EventDeskError>;

    /// Applies every write or none of them; a failed condition yields `Conflict`
    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), EventDeskError>;

    async fn ping(&self) -> Result<(), EventDeskError>;
}

/// In-memory store for testing
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, BTreeMap<String, Item>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
        }
    }

    fn apply(
        tables: &mut HashMap<String, BTreeMap<String, Item>>,
        op: WriteOp,
    ) -> Result<(), EventDeskError> {
        match op {
            WriteOp::Put {
                table, key, item, ..
            } => {
                tables
                    .entry(table)
                    .or_default()
                    .insert(key.storage_id(), item);
            }
            WriteOp::Delete { table, key, .. } => {
                if let Some(items) = tables.get_mut(&table) {
                    items.remove(&key.storage_id());
                }
            }
            WriteOp::Increment {
                table,
                key,
                counter,
                delta,
                ..
            } => {
                let item = Self::entry(tables, table, &key);

                let slot = match counter.index {
                    None => item.entry(counter.attribute.clone()).or_insert(Value::from(0)),
                    Some(index) => item
                        .get_mut(&counter.attribute)
                        .and_then(Value::as_array_mut)
                        .and_then(|list| list.get_mut(index))
                        .ok_or_else(|| {
                            EventDeskError::Storage(format!(
                                "Invalid document path: {}[{}]",
                                counter.attribute, index
                            ))
                        })?,
                };

                let current = slot.as_i64().ok_or_else(|| {
                    EventDeskError::Storage(format!(
                        "Attribute {} is not a number",
                        counter.attribute
                    ))
                })?;
                *slot = Value::from(current + delta);
            }
            WriteOp::Update {
                table, key, fields, ..
            } => {
                let item = Self::entry(tables, table, &key);
                for (name, value) in fields {
                    if value.is_null() {
                        item.remove(&name);
                    } else {
                        item.insert(name, value);
                    }
                }
            }
        }
        Ok(())
    }

    /// The stored item, created with only its key attributes when missing
    fn entry<'a>(
        tables: &'a mut HashMap<String, BTreeMap<String, Item>>,
        table: String,
        key: &Key,
    ) -> &'a mut Item {
        tables
            .entry(table)
            .or_default()
            .entry(key.storage_id())
            .or_insert_with(|| {
                key.attributes()
                    .map(|(name, value)| (name.to_string(), Value::from(value)))
                    .collect()
            })
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, table: &str, key: &Key) -> Result<Option<Item>, EventDeskError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .and_then(|items| items.get(&key.storage_id()))
            .cloned())
    }

    async fn write(&self, op: WriteOp) -> Result<(), EventDeskError> {
        self.transact_write(vec![op]).await
    }

    async fn scan(&self, table: &str) -> Result<Vec<Item>, EventDeskError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn query(
        &self,
        table: &str,
        _index: Option<&str>,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<Item>, EventDeskError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .map(|items| {
                items
                    .values()
                    .filter(|item| item.get(attribute).and_then(Value::as_str) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), EventDeskError> {
        let mut tables = self.tables.lock().await;

        for op in &ops {
            let current = tables
                .get(op.table())
                .and_then(|items| items.get(&op.key().storage_id()));
            if !op.condition().holds(current) {
                return Err(EventDeskError::Conflict(format!(
                    "Condition failed on {}",
                    op.table()
                )));
            }
        }

        // Work on a copy so that a failing write leaves no partial state
        let mut staged = tables.clone();
        for op in ops {
            Self::apply(&mut staged, op)?;
        }
        *tables = staged;

        Ok(())
    }

    async fn ping(&self) -> Result<(), EventDeskError> {
        Ok(())
    }
}
