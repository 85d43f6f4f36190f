//! Built-in content served when the live store cannot answer.
//!
//! The dataset is a fixed, versioned JSON document compiled into the binary.
//! Queries run against it as a pure function: filters, sorting and
//! pagination are evaluated on the raw records, `populate` and `fields` are
//! ignored since every record is already complete.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::content::query::{FieldPath, Filter, FilterOperator, FilterValue, Query, SortDirection};
use crate::content::source::{Collection, ContentSource, Page, PageInfo, PageMeta};
use crate::store_client::StoreError;

const BUILT_IN_DATASET: &str = include_str!("fallback.json");

#[derive(Deserialize)]
struct DatasetFile {
    version: u32,
    #[serde(default)]
    articles: Vec<Value>,
    #[serde(default)]
    events: Vec<Value>,
    #[serde(default)]
    rankings: Vec<Value>,
    #[serde(default)]
    categories: Vec<Value>,
    #[serde(default)]
    people: Vec<Value>,
    #[serde(default)]
    tags: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct StaticDataset {
    version: u32,
    collections: HashMap<Collection, Vec<Value>>,
}

impl StaticDataset {
    pub fn load() -> Result<StaticDataset, serde_json::Error> {
        Self::from_json(BUILT_IN_DATASET)
    }

    pub fn from_json(json: &str) -> Result<StaticDataset, serde_json::Error> {
        let file: DatasetFile = serde_json::from_str(json)?;
        let collections = HashMap::from([
            (Collection::Articles, file.articles),
            (Collection::Events, file.events),
            (Collection::Rankings, file.rankings),
            (Collection::Categories, file.categories),
            (Collection::People, file.people),
            (Collection::Tags, file.tags),
        ]);

        Ok(StaticDataset {
            version: file.version,
            collections,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn query<T: DeserializeOwned>(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Page<T>, StoreError> {
        let records = self
            .collections
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut selected: Vec<&Value> = records
            .iter()
            .filter(|record| query.filters().iter().all(|filter| matches(record, filter)))
            .collect();

        selected.sort_by(|left, right| {
            query
                .sorting()
                .iter()
                .map(|sort| {
                    let ordering = compare_fields(lookup(left, &sort.field), lookup(right, &sort.field));
                    match sort.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let pagination = query.pagination();
        let total = selected.len() as u64;
        let page_size = u64::from(pagination.page_size);
        let page_count = ((total + page_size - 1) / page_size) as u32;
        let offset = (u64::from(pagination.page) - 1) * page_size;

        let data = selected
            .into_iter()
            .skip(offset as usize)
            .take(page_size as usize)
            .map(|record| serde_json::from_value(record.clone()))
            .collect::<Result<Vec<T>, _>>()
            .map_err(StoreError::Decode)?;

        Ok(Page {
            data,
            meta: PageMeta {
                pagination: Some(PageInfo {
                    page: pagination.page,
                    page_size: pagination.page_size,
                    page_count,
                    total,
                }),
            },
        })
    }
}

impl ContentSource for StaticDataset {
    async fn find_many<T>(&self, collection: Collection, query: &Query) -> Result<Page<T>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        self.query(collection, query)
    }
}

fn lookup<'a>(record: &'a Value, field: &FieldPath) -> Option<&'a Value> {
    field
        .segments()
        .iter()
        .try_fold(record, |value, segment| value.get(segment))
        .filter(|value| !value.is_null())
}

fn matches(record: &Value, filter: &Filter) -> bool {
    let value = lookup(record, &filter.field);

    match filter.operator {
        FilterOperator::Eq => value.map_or(false, |value| equals(value, &filter.value)),
        FilterOperator::Ne => value.map_or(true, |value| !equals(value, &filter.value)),
        FilterOperator::Contains => match (value, &filter.value) {
            (Some(Value::String(text)), FilterValue::Text(needle)) => text.contains(needle.as_str()),
            _ => false,
        },
        FilterOperator::Gte => value
            .and_then(|value| compare_to(value, &filter.value))
            .map_or(false, |ordering| ordering != Ordering::Less),
        FilterOperator::Lte => value
            .and_then(|value| compare_to(value, &filter.value))
            .map_or(false, |ordering| ordering != Ordering::Greater),
    }
}

fn equals(value: &Value, expected: &FilterValue) -> bool {
    match (value, expected) {
        (Value::String(text), FilterValue::Text(expected)) => text == expected,
        (Value::Bool(flag), FilterValue::Bool(expected)) => flag == expected,
        (Value::Number(number), FilterValue::Integer(expected)) => number.as_i64() == Some(*expected),
        // The store coerces query-string values, so "3" matches 3
        (Value::Number(number), FilterValue::Text(expected)) => number.to_string() == *expected,
        _ => false,
    }
}

fn compare_to(value: &Value, expected: &FilterValue) -> Option<Ordering> {
    match (value, expected) {
        (Value::String(text), FilterValue::Text(expected)) => Some(compare_text(text, expected)),
        (Value::Number(number), FilterValue::Integer(expected)) => {
            number.as_f64()?.partial_cmp(&(*expected as f64))
        }
        _ => None,
    }
}

// Timestamps in different offsets or precisions compare chronologically.
fn compare_text(left: &str, right: &str) -> Ordering {
    match (
        DateTime::parse_from_rfc3339(left),
        DateTime::parse_from_rfc3339(right),
    ) {
        (Ok(left), Ok(right)) => left.with_timezone(&Utc).cmp(&right.with_timezone(&Utc)),
        _ => left.cmp(right),
    }
}

// Records missing the field sort last.
fn compare_fields(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(left)), Some(Value::String(right))) => compare_text(left, right),
        (Some(Value::Bool(left)), Some(Value::Bool(right))) => left.cmp(right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
