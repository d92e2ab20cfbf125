// Order table: which insect orders to crawl, their numeric site id and the
// directory their images land in.

use crate::error::{Result, TrawlError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDescriptor {
    /// Order name as used in site URLs, e.g. `Insect-Plecoptera`.
    #[serde(alias = "orders", alias = "name")]
    pub order: String,
    /// Numeric order id in `/hatch/<id>/...` URLs.
    #[serde(alias = "tn_nums", alias = "id")]
    pub tn_num: u32,
    /// Output directory under the data root.
    pub directory: String,
}

/// Column-oriented form, keyed by row index, as written by a dataframe.
#[derive(Debug, Deserialize)]
struct ColumnTable {
    orders: BTreeMap<String, String>,
    tn_nums: BTreeMap<String, u32>,
    directory: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTable {
    Records(Vec<OrderDescriptor>),
    Columns(ColumnTable),
}

#[derive(Debug, Clone)]
pub struct OrderTable {
    rows: Vec<OrderDescriptor>,
    directories: HashMap<String, usize>,
}

impl OrderTable {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            TrawlError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let table = Self::from_json(&text)?;
        debug!("Loaded {} orders from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawTable = serde_json::from_str(text).map_err(|e| {
            TrawlError::Config(format!(
                "expected a list of orders or an orders/tn_nums/directory table: {}",
                e
            ))
        })?;

        let rows = match raw {
            RawTable::Records(rows) => rows,
            RawTable::Columns(columns) => columns_to_rows(columns)?,
        };
        Self::from_rows(rows)
    }

    pub fn from_rows(rows: Vec<OrderDescriptor>) -> Result<Self> {
        if rows.is_empty() {
            return Err(TrawlError::Config("order table is empty".to_string()));
        }

        let mut directories = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            if directories.insert(row.order.clone(), idx).is_some() {
                return Err(TrawlError::Config(format!("order '{}' listed twice", row.order)));
            }
        }

        Ok(Self { rows, directories })
    }

    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.order.as_str()).collect()
    }

    pub fn site_ids(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.tn_num).collect()
    }

    pub fn directory_for(&self, order: &str) -> Option<&str> {
        self.directories
            .get(order)
            .map(|&idx| self.rows[idx].directory.as_str())
    }

    pub fn row(&self, index: usize) -> Option<&OrderDescriptor> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderDescriptor> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn columns_to_rows(columns: ColumnTable) -> Result<Vec<OrderDescriptor>> {
    let ColumnTable {
        orders,
        tn_nums,
        directory,
    } = columns;

    let mut keyed = Vec::with_capacity(orders.len());
    for (key, order) in orders {
        let index: usize = key
            .parse()
            .map_err(|_| TrawlError::Config(format!("row key '{}' is not a number", key)))?;
        let tn_num = *tn_nums
            .get(&key)
            .ok_or_else(|| TrawlError::Config(format!("row {} has no tn_nums entry", key)))?;
        let dir = directory
            .get(&key)
            .ok_or_else(|| TrawlError::Config(format!("row {} has no directory entry", key)))?;
        keyed.push((
            index,
            OrderDescriptor {
                order,
                tn_num,
                directory: dir.clone(),
            },
        ));
    }

    if keyed.len() != tn_nums.len() || keyed.len() != directory.len() {
        return Err(TrawlError::Config(
            "orders, tn_nums and directory columns have different rows".to_string(),
        ));
    }

    keyed.sort_by_key(|(index, _)| *index);
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}
