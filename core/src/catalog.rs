use crate::config::CatalogSchema;
use crate::ItemId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One raw catalog row: column name to cell value.
pub type RawRecord = serde_json::Map<String, Value>;

/// Attributes that feed the feature blob, in composition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Genre,
    Director,
    LeadStar,
    Plot,
}

impl Attribute {
    pub const ALL: [Attribute; 4] =
        [Attribute::Genre, Attribute::Director, Attribute::LeadStar, Attribute::Plot];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Dense position in the catalog, equal to the matrix row.
    pub id: ItemId,
    pub title: String,
    /// Always holds every `Attribute`; missing cells are "".
    pub attributes: BTreeMap<Attribute, String>,
    /// Display-only columns that were present and non-empty.
    pub display: BTreeMap<String, String>,
}

impl Item {
    pub fn attribute(&self, attribute: Attribute) -> &str {
        self.attributes.get(&attribute).map(String::as_str).unwrap_or("")
    }

    pub fn display(&self, column: &str) -> Option<&str> {
        self.display.get(column).map(String::as_str)
    }
}

/// The item collection for one session. Immutable once loaded.
///
/// Titles are lookup keys, but duplicates are kept: only the first occurrence of a
/// title is addressable by exact lookup, later ones stay listed for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    items: Vec<Item>,
    by_title: HashMap<String, ItemId>,
    /// First-occurrence ids in catalog order.
    canonical: Vec<ItemId>,
}

impl Catalog {
    pub fn load<I>(rows: I, schema: &CatalogSchema) -> Self
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut catalog = Catalog::default();
        for (row, record) in rows.into_iter().enumerate() {
            let title = match cell_text(record.get(&schema.title_column)) {
                Some(t) => t,
                None => {
                    tracing::warn!(row, column = %schema.title_column, "dropping catalog row without a title");
                    continue;
                }
            };

            let mut attributes = BTreeMap::new();
            for attribute in Attribute::ALL {
                let value = schema
                    .columns_for(attribute)
                    .iter()
                    .find_map(|col| cell_text(record.get(col)))
                    .unwrap_or_default();
                attributes.insert(attribute, value);
            }

            let display = schema
                .display
                .iter()
                .filter_map(|col| cell_text(record.get(col)).map(|v| (col.clone(), v)))
                .collect();

            let id = catalog.items.len() as ItemId;
            if !catalog.by_title.contains_key(&title) {
                catalog.by_title.insert(title.clone(), id);
                catalog.canonical.push(id);
            } else {
                tracing::debug!(row, %title, "duplicate title; only the first occurrence is addressable");
            }
            catalog.items.push(Item { id, title, attributes, display });
        }
        tracing::info!(items = catalog.items.len(), titles = catalog.canonical.len(), "catalog loaded");
        catalog
    }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn items(&self) -> &[Item] { &self.items }

    pub fn get(&self, id: ItemId) -> Option<&Item> { self.items.get(id as usize) }

    /// Case-sensitive exact lookup; resolves to the first item carrying `title`.
    pub fn find_exact(&self, title: &str) -> Option<&Item> {
        self.by_title.get(title).and_then(|id| self.get(*id))
    }

    /// Addressable titles in catalog order.
    pub fn canonical_titles(&self) -> impl Iterator<Item = &str> + '_ {
        self.canonical.iter().map(move |id| self.items[*id as usize].title.as_str())
    }

    pub fn canonical_ids(&self) -> &[ItemId] { &self.canonical }
}

/// Render a cell as text. Missing, null, blank and NaN cells yield `None`.
fn cell_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(values) => values
            .iter()
            .filter_map(|v| cell_text(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => return None,
    };
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(text)
    }
}

/// Read raw records from a JSON array, a single JSON object, or a JSONL file.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening catalog {}", path.display()))?;
    let reader = BufReader::new(file);

    if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        let mut records = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let record: RawRecord = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}: expected a JSON object", path.display(), lineno + 1))?;
            records.push(record);
        }
        return Ok(records);
    }

    let json: Value = serde_json::from_reader(reader).with_context(|| format!("parsing catalog {}", path.display()))?;
    let records = match json {
        Value::Array(values) => values
            .into_iter()
            .enumerate()
            .filter_map(|(row, v)| match v {
                Value::Object(record) => Some(record),
                _ => {
                    tracing::warn!(row, "skipping non-object catalog entry");
                    None
                }
            })
            .collect(),
        Value::Object(record) => vec![record],
        _ => anyhow::bail!("catalog {} must hold a JSON array or object", path.display()),
    };
    Ok(records)
}

#[cfg(test)]
pub(crate) fn record(pairs: &[(&str, Value)]) -> RawRecord {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}
