/// DynamoDB-backed document store
use crate::error::EventDeskError;
use crate::services::store::{Condition, Counter, Item, Key, Store, WriteOp};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, TransactWriteItem, Update};
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::debug;

type AttributeMap = HashMap<String, AttributeValue>;

pub struct DynamoDbStore {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoDbStore {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Key,
        expression: Expression,
    ) -> Result<(), EventDeskError> {
        self.client
            .update_item()
            .table_name(table)
            .set_key(Some(key_map(key)))
            .set_update_expression(expression.update.clone())
            .set_condition_expression(expression.condition.clone())
            .set_expression_attribute_names(expression.names())
            .set_expression_attribute_values(expression.values())
            .send()
            .await
            .map_err(|e| map_update_error(e, table))?;
        Ok(())
    }
}

/// Condition and update expressions with their placeholders
#[derive(Debug, Default)]
struct Expression {
    condition: Option<String>,
    update: Option<String>,
    names: HashMap<String, String>,
    values: AttributeMap,
}

impl Expression {
    fn with_condition(key: &Key, condition: &Condition) -> Result<Self, EventDeskError> {
        let mut expression = Self::default();
        expression.condition = expression.render(key, condition)?;
        Ok(expression)
    }

    fn with_increment(
        key: &Key,
        counter: &Counter,
        delta: i64,
        condition: &Condition,
    ) -> Result<Self, EventDeskError> {
        let mut expression = Self::with_condition(key, condition)?;
        let name = expression.name(&counter.attribute);
        let delta = expression.value(AttributeValue::N(delta.to_string()));

        let path = match counter.index {
            Some(index) => format!("{}[{}]", name, index),
            None => name,
        };
        expression.update = Some(match counter.index {
            Some(_) => format!("SET {path} = {path} + {delta}"),
            None => {
                let zero = expression.value(AttributeValue::N("0".to_string()));
                format!("SET {path} = if_not_exists({path}, {zero}) + {delta}")
            }
        });

        Ok(expression)
    }

    fn with_update(key: &Key, fields: &Item, condition: &Condition) -> Result<Self, EventDeskError> {
        let mut expression = Self::with_condition(key, condition)?;
        let mut set = Vec::new();
        let mut remove = Vec::new();

        for (attribute, value) in fields {
            let name = expression.name(attribute);
            if value.is_null() {
                remove.push(name);
            } else {
                let value = expression.value(to_attribute_value(value)?);
                set.push(format!("{} = {}", name, value));
            }
        }

        let mut clauses = Vec::new();
        if !set.is_empty() {
            clauses.push(format!("SET {}", set.join(", ")));
        }
        if !remove.is_empty() {
            clauses.push(format!("REMOVE {}", remove.join(", ")));
        }
        if clauses.is_empty() {
            return Err(EventDeskError::Storage("Nothing to update".to_string()));
        }
        expression.update = Some(clauses.join(" "));

        Ok(expression)
    }

    fn name(&mut self, attribute: &str) -> String {
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    fn value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn render(&mut self, key: &Key, condition: &Condition) -> Result<Option<String>, EventDeskError> {
        let rendered = match condition {
            Condition::None => None,
            Condition::Exists => Some(format!("attribute_exists({})", self.name(&key.partition.0))),
            Condition::NotExists => Some(format!(
                "attribute_not_exists({})",
                self.name(&key.partition.0)
            )),
            Condition::Absent { attribute } => {
                Some(format!("attribute_not_exists({})", self.name(attribute)))
            }
            Condition::Equals { attribute, value } => {
                let name = self.name(attribute);
                let value = self.value(to_attribute_value(value)?);
                Some(format!("{} = {}", name, value))
            }
            Condition::LessThan { attribute, bound } => {
                let attribute = self.name(attribute);
                let bound = self.name(bound);
                Some(format!("{} < {}", attribute, bound))
            }
            Condition::All(conditions) => {
                let mut parts = Vec::new();
                for condition in conditions {
                    if let Some(part) = self.render(key, condition)? {
                        parts.push(format!("({})", part));
                    }
                }
                (!parts.is_empty()).then(|| parts.join(" AND "))
            }
        };
        Ok(rendered)
    }

    fn names(&self) -> Option<HashMap<String, String>> {
        (!self.names.is_empty()).then(|| self.names.clone())
    }

    fn values(&self) -> Option<AttributeMap> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }
}

fn to_attribute_value(value: &serde_json::Value) -> Result<AttributeValue, EventDeskError> {
    serde_dynamo::to_attribute_value(value)
        .map_err(|e| EventDeskError::Storage(format!("Invalid attribute value: {}", e)))
}

fn to_attribute_map(item: &Item) -> Result<AttributeMap, EventDeskError> {
    serde_dynamo::to_item(item)
        .map_err(|e| EventDeskError::Storage(format!("Failed to encode item: {}", e)))
}

fn from_attribute_map(item: AttributeMap) -> Result<Item, EventDeskError> {
    serde_dynamo::from_item(item)
        .map_err(|e| EventDeskError::Storage(format!("Failed to decode item: {}", e)))
}

fn key_map(key: &Key) -> AttributeMap {
    key.attributes()
        .map(|(name, value)| (name.to_string(), AttributeValue::S(value.to_string())))
        .collect()
}

fn build_error(err: impl std::fmt::Display) -> EventDeskError {
    EventDeskError::Storage(format!("Failed to build request: {}", err))
}

fn map_put_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table: &str,
) -> EventDeskError {
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => {
            EventDeskError::Conflict(format!("Condition failed on {}", table))
        }
        err => EventDeskError::Storage(format!("PutItem failed: {}", err)),
    }
}

fn map_delete_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    table: &str,
) -> EventDeskError {
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => {
            EventDeskError::Conflict(format!("Condition failed on {}", table))
        }
        err => EventDeskError::Storage(format!("DeleteItem failed: {}", err)),
    }
}

fn map_update_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    table: &str,
) -> EventDeskError {
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => {
            EventDeskError::Conflict(format!("Condition failed on {}", table))
        }
        err => EventDeskError::Storage(format!("UpdateItem failed: {}", err)),
    }
}

fn map_transaction_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
) -> EventDeskError {
    match err.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(cancelled) => {
            let condition_failed = cancelled.cancellation_reasons().iter().any(|reason| {
                matches!(
                    reason.code(),
                    Some("ConditionalCheckFailed") | Some("TransactionConflict")
                )
            });
            if condition_failed {
                EventDeskError::Conflict("Transaction condition failed".to_string())
            } else {
                EventDeskError::Storage(format!("Transaction cancelled: {}", cancelled))
            }
        }
        err => EventDeskError::Storage(format!("TransactWriteItems failed: {}", err)),
    }
}

fn transact_item(op: &WriteOp) -> Result<TransactWriteItem, EventDeskError> {
    let item = match op {
        WriteOp::Put {
            table,
            key,
            item,
            condition,
        } => {
            let expression = Expression::with_condition(key, condition)?;
            let put = Put::builder()
                .table_name(table)
                .set_item(Some(to_attribute_map(item)?))
                .set_condition_expression(expression.condition.clone())
                .set_expression_attribute_names(expression.names())
                .set_expression_attribute_values(expression.values())
                .build()
                .map_err(build_error)?;
            TransactWriteItem::builder().put(put).build()
        }
        WriteOp::Delete {
            table,
            key,
            condition,
        } => {
            let expression = Expression::with_condition(key, condition)?;
            let delete = Delete::builder()
                .table_name(table)
                .set_key(Some(key_map(key)))
                .set_condition_expression(expression.condition.clone())
                .set_expression_attribute_names(expression.names())
                .set_expression_attribute_values(expression.values())
                .build()
                .map_err(build_error)?;
            TransactWriteItem::builder().delete(delete).build()
        }
        WriteOp::Increment {
            table,
            key,
            counter,
            delta,
            condition,
        } => {
            let expression = Expression::with_increment(key, counter, *delta, condition)?;
            let update = Update::builder()
                .table_name(table)
                .set_key(Some(key_map(key)))
                .set_update_expression(expression.update.clone())
                .set_condition_expression(expression.condition.clone())
                .set_expression_attribute_names(expression.names())
                .set_expression_attribute_values(expression.values())
                .build()
                .map_err(build_error)?;
            TransactWriteItem::builder().update(update).build()
        }
        WriteOp::Update {
            table,
            key,
            fields,
            condition,
        } => {
            let expression = Expression::with_update(key, fields, condition)?;
            let update = Update::builder()
                .table_name(table)
                .set_key(Some(key_map(key)))
                .set_update_expression(expression.update.clone())
                .set_condition_expression(expression.condition.clone())
                .set_expression_attribute_names(expression.names())
                .set_expression_attribute_values(expression.values())
                .build()
                .map_err(build_error)?;
            TransactWriteItem::builder().update(update).build()
        }
    };
    Ok(item)
}

#[async_trait]
impl Store for DynamoDbStore {
    async fn get(&self, table: &str, key: &Key) -> Result<Option<Item>, EventDeskError> {
        let result = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key_map(key)))
            .send()
            .await
            .map_err(|e| EventDeskError::Storage(format!("GetItem failed: {}", e)))?;

        result.item.map(from_attribute_map).transpose()
    }

    async fn write(&self, op: WriteOp) -> Result<(), EventDeskError> {
        match op {
            WriteOp::Put {
                table,
                key,
                item,
                condition,
            } => {
                let expression = Expression::with_condition(&key, &condition)?;
                self.client
                    .put_item()
                    .table_name(&table)
                    .set_item(Some(to_attribute_map(&item)?))
                    .set_condition_expression(expression.condition.clone())
                    .set_expression_attribute_names(expression.names())
                    .set_expression_attribute_values(expression.values())
                    .send()
                    .await
                    .map_err(|e| map_put_error(e, &table))?;
            }
            WriteOp::Delete {
                table,
                key,
                condition,
            } => {
                let expression = Expression::with_condition(&key, &condition)?;
                self.client
                    .delete_item()
                    .table_name(&table)
                    .set_key(Some(key_map(&key)))
                    .set_condition_expression(expression.condition.clone())
                    .set_expression_attribute_names(expression.names())
                    .set_expression_attribute_values(expression.values())
                    .send()
                    .await
                    .map_err(|e| map_delete_error(e, &table))?;
            }
            WriteOp::Increment {
                table,
                key,
                counter,
                delta,
                condition,
            } => {
                let expression = Expression::with_increment(&key, &counter, delta, &condition)?;
                self.update_item(&table, &key, expression).await?;
            }
            WriteOp::Update {
                table,
                key,
                fields,
                condition,
            } => {
                let expression = Expression::with_update(&key, &fields, &condition)?;
                self.update_item(&table, &key, expression).await?;
            }
        }
        Ok(())
    }

    async fn scan(&self, table: &str) -> Result<Vec<Item>, EventDeskError> {
        let mut items = Vec::new();
        let mut start_key: Option<AttributeMap> = None;

        loop {
            let result = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| EventDeskError::Storage(format!("Scan failed: {}", e)))?;

            for item in result.items.unwrap_or_default() {
                items.push(from_attribute_map(item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!(table = table, count = items.len(), "Scanned table");
        Ok(items)
    }

    async fn query(
        &self,
        table: &str,
        index: Option<&str>,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<Item>, EventDeskError> {
        let mut items = Vec::new();
        let mut start_key: Option<AttributeMap> = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(table)
                .set_index_name(index.map(str::to_string))
                .key_condition_expression("#k = :v")
                .expression_attribute_names("#k", attribute)
                .expression_attribute_values(":v", AttributeValue::S(value.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| EventDeskError::Storage(format!("Query failed: {}", e)))?;

            for item in result.items.unwrap_or_default() {
                items.push(from_attribute_map(item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), EventDeskError> {
        let items = ops
            .iter()
            .map(transact_item)
            .collect::<Result<Vec<_>, _>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(map_transaction_error)?;

        debug!(operations = ops.len(), "Committed transaction");
        Ok(())
    }

    async fn ping(&self) -> Result<(), EventDeskError> {
        self.client
            .list_tables()
            .limit(1)
            .send()
            .await
            .map_err(|e| EventDeskError::Storage(format!("ListTables failed: {}", e)))?;
        Ok(())
    }
}
