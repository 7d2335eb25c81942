//! The Movies table on DynamoDB (or DynamoDB Local).

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType, PutRequest,
    ReturnValue, ScalarAttributeType, WriteRequest,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::record::{Item, MovieKey, PARTITION_KEY, SORT_KEY};
use crate::store::attribute::{
    AttributeMap, from_attribute_map, key_attributes, key_from_attributes, to_attribute_map,
    to_attribute_value,
};
use crate::store::expression::Expression;
use crate::store::{Page, ScanRequest, TableCreation, TableStore, UpdateCondition};

/// Most put requests accepted by one BatchWriteItem call.
pub const BATCH_WRITE_LIMIT: usize = 25;

/// Rounds of resubmitting `UnprocessedItems` before giving up.
pub const MAX_UNPROCESSED_ROUNDS: usize = 8;

/// Wait before the first resubmission. Doubles each round.
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Longest wait between resubmissions.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Backoff before resubmission number `retry` (0-based).
fn retry_delay(retry: usize) -> Duration {
    let factor = u32::try_from(retry)
        .ok()
        .and_then(|shift| 1u32.checked_shl(shift))
        .unwrap_or(u32::MAX);
    INITIAL_RETRY_DELAY
        .saturating_mul(factor)
        .min(MAX_RETRY_DELAY)
}

/// A `TableStore` backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    /// Build an SDK client from `config`. No request is sent.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        if config.local_credentials {
            loader = loader.credentials_provider(Credentials::new(
                "local",
                "local",
                None,
                None,
                "movietable-local",
            ));
        }
        let sdk_config = loader.load().await;

        info!(
            table = %config.table_name,
            endpoint = config.endpoint_url.as_deref().unwrap_or("aws"),
            region = %config.region,
            "dynamodb client configured"
        );
        Ok(Self::from_client(Client::new(&sdk_config), &config.table_name))
    }

    /// Wrap an existing SDK client.
    pub fn from_client(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    async fn write_batch(&self, mut requests: Vec<WriteRequest>) -> Result<()> {
        for round in 1..=MAX_UNPROCESSED_ROUNDS {
            let output = self
                .client
                .batch_write_item()
                .request_items(self.table.clone(), requests)
                .send()
                .await
                .map_err(|e| ClientError::service("BatchWriteItem", e))?;

            requests = output
                .unprocessed_items
                .and_then(|mut pending| pending.remove(&self.table))
                .unwrap_or_default();
            if requests.is_empty() {
                return Ok(());
            }
            if round == MAX_UNPROCESSED_ROUNDS {
                break;
            }
            let delay = retry_delay(round - 1);
            warn!(
                table = %self.table,
                remaining = requests.len(),
                round,
                delay_ms = delay.as_millis() as u64,
                "resubmitting unprocessed batch items"
            );
            tokio::time::sleep(delay).await;
        }
        Err(ClientError::Service {
            operation: "BatchWriteItem",
            message: format!(
                "{} items still unprocessed after {MAX_UNPROCESSED_ROUNDS} rounds",
                requests.len()
            ),
        })
    }
}

fn page_from(items: Option<Vec<AttributeMap>>, last_key: Option<AttributeMap>) -> Result<Page> {
    let items = items
        .unwrap_or_default()
        .iter()
        .map(from_attribute_map)
        .collect::<Result<Vec<_>>>()?;
    let last_evaluated_key = match last_key {
        Some(key) if !key.is_empty() => Some(key_from_attributes(&key)?),
        _ => None,
    };
    Ok(Page {
        items,
        last_evaluated_key,
    })
}

#[async_trait]
impl TableStore for DynamoStore {
    async fn create_table(&self) -> Result<TableCreation> {
        let key_attr = |name: &str, attr_type: ScalarAttributeType| {
            AttributeDefinition::builder()
                .attribute_name(name)
                .attribute_type(attr_type)
                .build()
        };
        let key_elem = |name: &str, key_type: KeyType| {
            KeySchemaElement::builder()
                .attribute_name(name)
                .key_type(key_type)
                .build()
        };
        let build_err = |e: aws_sdk_dynamodb::error::BuildError| ClientError::Service {
            operation: "CreateTable",
            message: e.to_string(),
        };

        let result = self
            .client
            .create_table()
            .table_name(&self.table)
            .key_schema(key_elem(PARTITION_KEY, KeyType::Hash).map_err(build_err)?)
            .key_schema(key_elem(SORT_KEY, KeyType::Range).map_err(build_err)?)
            .attribute_definitions(key_attr(PARTITION_KEY, ScalarAttributeType::N).map_err(build_err)?)
            .attribute_definitions(key_attr(SORT_KEY, ScalarAttributeType::S).map_err(build_err)?)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(table = %self.table, "table created");
                Ok(TableCreation::Created)
            }
            Err(err)
                if matches!(
                    err.as_service_error(),
                    Some(CreateTableError::ResourceInUseException(_))
                ) =>
            {
                info!(table = %self.table, "table already exists");
                Ok(TableCreation::AlreadyExists)
            }
            Err(err) => Err(ClientError::service("CreateTable", err)),
        }
    }

    async fn batch_put(&self, items: Vec<Item>) -> Result<()> {
        let requests = items
            .iter()
            .map(|item| {
                let put = PutRequest::builder()
                    .set_item(Some(to_attribute_map(item)))
                    .build()
                    .map_err(|e| ClientError::InvalidRecord(e.to_string()))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>>>()?;

        for chunk in requests.chunks(BATCH_WRITE_LIMIT) {
            debug!(table = %self.table, items = chunk.len(), "batch write");
            self.write_batch(chunk.to_vec()).await?;
        }
        Ok(())
    }

    async fn put(&self, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_attribute_map(&item)))
            .send()
            .await
            .map_err(|e| ClientError::service("PutItem", e))?;
        Ok(())
    }

    async fn get(&self, key: &MovieKey) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .set_key(Some(key_attributes(key)))
            .send()
            .await
            .map_err(|e| ClientError::service("GetItem", e))?;
        output.item.as_ref().map(from_attribute_map).transpose()
    }

    async fn update(
        &self,
        key: &MovieKey,
        assignments: &[(String, Value)],
        condition: UpdateCondition,
    ) -> Result<Item> {
        let mut expr = Expression::new();
        let mut sets = Vec::with_capacity(assignments.len());
        for (path, value) in assignments {
            let path = expr.path(path);
            let value = expr.value(to_attribute_value(value));
            sets.push(format!("{path} = {value}"));
        }
        let condition_expression = match condition {
            UpdateCondition::Upsert => None,
            UpdateCondition::MustExist => {
                Some(format!("attribute_exists({})", expr.name(PARTITION_KEY)))
            }
        };
        let (names, values) = expr.into_parts();

        let result = self
            .client
            .update_item()
            .table_name(&self.table)
            .set_key(Some(key_attributes(key)))
            .update_expression(format!("SET {}", sets.join(", ")))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await;

        match result {
            Ok(output) => from_attribute_map(&output.attributes.unwrap_or_default()),
            Err(err)
                if matches!(
                    err.as_service_error(),
                    Some(UpdateItemError::ConditionalCheckFailedException(_))
                ) =>
            {
                Err(ClientError::NotFound(key.clone()))
            }
            Err(err) => Err(ClientError::service("UpdateItem", err)),
        }
    }

    async fn scan(&self, request: &ScanRequest) -> Result<Page> {
        let mut expr = Expression::new();
        let filter = expr.between(PARTITION_KEY, request.range);
        let projection = expr.projection(&request.projection);
        let (names, values) = expr.into_parts();

        let output = self
            .client
            .scan()
            .table_name(&self.table)
            .filter_expression(filter)
            .set_projection_expression(projection)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .set_limit(
                request
                    .limit
                    .map(|n| i32::try_from(n).unwrap_or(i32::MAX)),
            )
            .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(key_attributes))
            .send()
            .await
            .map_err(|e| ClientError::service("Scan", e))?;

        debug!(
            table = %self.table,
            count = output.count,
            scanned = output.scanned_count,
            "scan response"
        );
        page_from(output.items, output.last_evaluated_key)
    }

    async fn query(&self, year: i64) -> Result<Page> {
        let mut expr = Expression::new();
        let name = expr.name(PARTITION_KEY);
        let value = expr.value(AttributeValue::N(year.to_string()));
        let (names, values) = expr.into_parts();

        let output = self
            .client
            .query()
            .table_name(&self.table)
            .key_condition_expression(format!("{name} = {value}"))
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .send()
            .await
            .map_err(|e| ClientError::service("Query", e))?;

        page_from(output.items, output.last_evaluated_key)
    }
}
