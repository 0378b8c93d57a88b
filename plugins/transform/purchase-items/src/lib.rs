//! Expands a JSON-encoded purchase item list into a typed array, optionally
//! merging items that share an `item_id`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use smt_api::ConfigParams;
use smt_api::config::{ConfigParam, ConfigValues};
use smt_api::dispatch::{Dispatcher, FieldMutation, Path};
use smt_api::error::PluginError;
use smt_api::evolve::Edit;
use smt_api::operand::Operand;
use smt_api::schema::{Field, FieldType, ScalarType, Schema};
use smt_api::transform::{Transform, TransformDescriptor};
use smt_api::value::{Struct, Value};
use smt_api::view::OrderedFields;

/// One purchased item as carried in the embedded JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: i32,
    pub name: String,
    pub price: i32,
}

impl Item {
    fn to_struct(&self, schema: &Arc<Schema>) -> Result<Struct, PluginError> {
        Struct::new(schema.clone())
            .with("item_id", self.item_id)?
            .with("name", self.name.as_str())?
            .with("price", self.price)
    }

    fn to_map(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("item_id".to_string(), Value::Int32(self.item_id));
        map.insert("name".to_string(), Value::from(self.name.as_str()));
        map.insert("price".to_string(), Value::Int32(self.price));
        Value::Map(map)
    }
}

/// Struct schema of one item.
pub fn item_schema() -> Schema {
    Schema::named(
        "items",
        vec![
            Field::scalar("item_id", ScalarType::Int32),
            Field::scalar("name", ScalarType::String),
            Field::scalar("price", ScalarType::Int32),
        ],
    )
}

/// `array<struct<items>>`, the type the target field is rewritten to.
pub fn items_type() -> FieldType {
    FieldType::array_of(FieldType::struct_of(item_schema()))
}

/// Collapse items sharing an `item_id` into one, summing prices.
///
/// Groups keep first-seen order; `item_id` and `name` come from the first
/// member. Sums saturate at the `i32` bounds.
pub fn merge_by_key(items: Vec<Item>) -> Vec<Item> {
    let mut merged: Vec<Item> = Vec::with_capacity(items.len());
    let mut index: HashMap<i32, usize> = HashMap::with_capacity(items.len());
    for item in items {
        match index.get(&item.item_id) {
            Some(&i) => {
                let group = &mut merged[i];
                group.price = match group.price.checked_add(item.price) {
                    Some(sum) => sum,
                    None => {
                        tracing::warn!(
                            item_id = group.item_id,
                            "merged price out of i32 range, saturating"
                        );
                        group.price.saturating_add(item.price)
                    }
                };
            }
            None => {
                index.insert(item.item_id, merged.len());
                merged.push(item);
            }
        }
    }
    merged
}

#[derive(Debug, Default, ConfigParams)]
pub struct PurchaseItemsConfig {
    #[param(
        required,
        importance = "high",
        description = "Field holding the JSON-encoded item array"
    )]
    pub field: String,
}

/// Replaces a JSON string field with the item array it encodes.
#[derive(Debug, Clone)]
pub struct JsonExpander {
    field: String,
    merge: bool,
}

impl JsonExpander {
    pub fn new(field: impl Into<String>, merge: bool) -> Self {
        Self {
            field: field.into(),
            merge,
        }
    }

    fn parse(&self, fields: &OrderedFields) -> Result<Vec<Item>, PluginError> {
        match fields.value(&self.field) {
            None | Some(Value::Null) => Err(PluginError::format(format!(
                "field '{}' is absent or null",
                self.field
            ))),
            Some(Value::String(text)) => Ok(serde_json::from_str(text)?),
            Some(other) => Err(PluginError::type_mismatch(format!(
                "field '{}' must be a JSON string, found: {}",
                self.field,
                other.type_name()
            ))),
        }
    }
}

impl FieldMutation for JsonExpander {
    fn purpose(&self) -> &str {
        if self.merge {
            "format and merge json object"
        } else {
            "format json object"
        }
    }

    fn edits(&self, schema: &Schema) -> Result<Vec<Edit>, PluginError> {
        // A record whose schema lacks the field has nothing to expand.
        if schema.field(&self.field).is_none() {
            return Err(PluginError::format(format!(
                "field '{}' is absent from the schema",
                self.field
            )));
        }
        Ok(vec![Edit::Retype {
            name: self.field.clone(),
            field_type: items_type(),
        }])
    }

    fn mutate(&self, fields: &mut OrderedFields, path: Path) -> Result<(), PluginError> {
        let mut items = self.parse(fields)?;
        if self.merge {
            items = merge_by_key(items);
        }
        match path {
            Path::SchemaPresent => {
                let schema = Arc::new(item_schema());
                let values = items
                    .iter()
                    .map(|item| item.to_struct(&schema).map(Value::Struct))
                    .collect::<Result<Vec<_>, _>>()?;
                fields.replace(&self.field, Value::Array(values), Some(items_type()))
            }
            Path::Schemaless => {
                let values = items.iter().map(Item::to_map).collect();
                fields.replace(&self.field, Value::Array(values), None)
            }
        }
    }
}

pub fn config_params() -> Vec<ConfigParam> {
    PurchaseItemsConfig::config_params()
}

pub fn configure(
    config: &ConfigValues,
    operand: Operand,
    merge: bool,
) -> Result<Dispatcher<JsonExpander>, PluginError> {
    let config = PurchaseItemsConfig::from_config(config)?;
    if config.field.is_empty() {
        return Err(PluginError::config("parameter 'field' must not be empty"));
    }
    Ok(Dispatcher::new(operand, JsonExpander::new(config.field, merge)))
}

fn create(config: &ConfigValues, operand: Operand) -> Result<Box<dyn Transform>, PluginError> {
    Ok(Box::new(configure(config, operand, false)?))
}

fn create_merged(config: &ConfigValues, operand: Operand) -> Result<Box<dyn Transform>, PluginError> {
    Ok(Box::new(configure(config, operand, true)?))
}

pub fn descriptor() -> TransformDescriptor {
    TransformDescriptor {
        alias: "purchase-items",
        description: "Expand a JSON item list into an array of item structs",
        config_params,
        create,
    }
}

pub fn merged_descriptor() -> TransformDescriptor {
    TransformDescriptor {
        alias: "purchase-items-merged",
        description: "Expand a JSON item list and merge items by item_id",
        config_params,
        create: create_merged,
    }
}
