//! Record mapper over one JSON file per table.
//!
//! The file holds a single object, store key → record object. It is read
//! once on first access and cached for the mapper's lifetime; every save or
//! delete rewrites the whole file. Nothing guards against another process
//! writing the same file.

use super::filter::{check_order, Direction, Filter, Filters, Order};
use super::record::{Model, Record};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::json::{read_json_file, write_json_file};
use crate::value::DbValue;
use indexmap::IndexMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

type Store = IndexMap<String, IndexMap<String, DbValue>>;

/// CRUD over a JSON file store, typed by its [`Model`]
#[derive(Debug)]
pub struct JsonFileMapper<M> {
    path: PathBuf,
    store: Mutex<Option<Store>>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> JsonFileMapper<M> {
    /// Mapper over the file at `path`; nothing is read yet
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: Mutex::new(None),
            _model: PhantomData,
        }
    }

    /// Mapper over `<application.root_path><json.dir_path><file>`
    ///
    /// # Errors
    ///
    /// `Error::Config` if either section is malformed.
    pub fn from_config(config: &Config, file: &str) -> Result<Self> {
        let root = config.application()?.root_path;
        let dir = config.json_store()?.dir_path;
        Ok(Self::new(format!("{root}{dir}{file}")))
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn lock(&self) -> Result<MutexGuard<'_, Option<Store>>> {
        let mut guard = self.store.lock().await;
        if guard.is_none() {
            let store: Store = read_json_file(&self.path).await?.unwrap_or_default();
            debug!(path = %self.path.display(), records = store.len(), "Loaded JSON store");
            *guard = Some(store);
        }
        Ok(guard)
    }

    fn hydrate(key: &str, row: &IndexMap<String, DbValue>) -> Result<M> {
        let mut model = M::hydrate(row.iter().map(|(k, v)| (k, v.clone())))?;
        model.record_mut().set_store_key(key);
        Ok(model)
    }

    /// Record stored under `key`, if any
    ///
    /// # Errors
    ///
    /// Read failures, or `UnknownColumn` when the stored object carries an
    /// undeclared column.
    pub async fn instantiate(&self, key: &str) -> Result<Option<M>> {
        let mut guard = self.lock().await?;
        let store = guard.get_or_insert_with(Store::new);
        store.get(key).map(|row| Self::hydrate(key, row)).transpose()
    }

    /// Every store key, in file order
    ///
    /// # Errors
    ///
    /// Read failures.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut guard = self.lock().await?;
        Ok(guard.get_or_insert_with(Store::new).keys().cloned().collect())
    }

    /// Records matching every filter, sorted and paginated
    ///
    /// Pagination applies only when `limit` is given; `offset` defaults to 0.
    ///
    /// # Errors
    ///
    /// `UnsupportedFilter` for raw SQL fragments, `UnknownColumn` for
    /// undeclared filter or order columns.
    pub async fn list(
        &self,
        filters: &Filters,
        order: &[Order],
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Vec<M>> {
        let table = M::table();
        if let Some(raw) = filters.iter().find(|f| matches!(f, Filter::Raw(_))) {
            return Err(Error::UnsupportedFilter {
                table: table.qualified_name(),
                filter: raw.to_string(),
            });
        }
        filters.check_columns(table)?;
        check_order(order, table)?;

        let mut records = {
            let mut guard = self.lock().await?;
            guard
                .get_or_insert_with(Store::new)
                .iter()
                .map(|(key, row)| Self::hydrate(key, row))
                .collect::<Result<Vec<M>>>()?
        };

        for filter in filters.iter() {
            let Some(index) = filter.column().and_then(|c| table.index_of(c)) else {
                continue;
            };
            records.retain(|m| filter.accepts(m.record().value(index)));
        }

        for entry in order.iter().rev() {
            let Some(index) = table.index_of(&entry.column) else {
                continue;
            };
            records.sort_by(|a, b| {
                let ordering = a.record().value(index).sort_cmp(b.record().value(index));
                match entry.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = limit {
            let offset = usize::try_from(offset.unwrap_or(0)).unwrap_or(usize::MAX);
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            records = records.into_iter().skip(offset).take(limit).collect();
        }
        Ok(records)
    }

    /// First record matching every filter, if any
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub async fn first(&self, filters: &Filters, order: &[Order]) -> Result<Option<M>> {
        Ok(self
            .list(filters, order, Some(0), Some(1))
            .await?
            .into_iter()
            .next())
    }

    /// Number of records matching every filter
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub async fn count(&self, filters: &Filters) -> Result<u64> {
        let records = self.list(filters, &[], None, None).await?;
        Ok(records.len() as u64)
    }

    /// Store the record under its key, assigning one first if needed
    ///
    /// Key assignment: a single non-null primary-key value becomes the key;
    /// otherwise the key is one above the largest integer key (1 for an empty
    /// store) and is copied into the auto-increment column, if the table has
    /// one.
    ///
    /// # Errors
    ///
    /// Read or write failures.
    pub async fn save(&self, model: &mut M) -> Result<()> {
        let mut guard = self.lock().await?;
        let store = guard.get_or_insert_with(Store::new);

        // Work on copies, the cache and the record change only once written
        let mut record = model.record().clone();
        let key = match record.store_key() {
            Some(key) => key.to_string(),
            None => {
                let key = match single_primary_key(&record) {
                    Some(key) => key,
                    None => {
                        let next = next_key(&self.path, store)?;
                        if let Some(column) = M::table().auto_increment_column() {
                            record.set(&column.name, next)?;
                        }
                        next.to_string()
                    }
                };
                record.set_store_key(key.clone());
                key
            }
        };

        let mut updated = store.clone();
        updated.insert(key.clone(), record.to_map());
        write_json_file(&self.path, &updated).await?;

        *store = updated;
        *model.record_mut() = record;
        debug!(path = %self.path.display(), key = %key, "Saved JSON record");
        Ok(())
    }

    /// Remove the record from the store
    ///
    /// A record without a key, or whose key is absent, is left alone. Returns
    /// whether anything was removed.
    ///
    /// # Errors
    ///
    /// Read or write failures.
    pub async fn delete(&self, model: &M) -> Result<bool> {
        let Some(key) = model.record().store_key() else {
            return Ok(false);
        };

        let mut guard = self.lock().await?;
        let store = guard.get_or_insert_with(Store::new);
        if !store.contains_key(key) {
            return Ok(false);
        }

        let mut updated = store.clone();
        updated.shift_remove(key);
        write_json_file(&self.path, &updated).await?;

        *store = updated;
        debug!(path = %self.path.display(), key = %key, "Deleted JSON record");
        Ok(true)
    }
}

fn single_primary_key(record: &Record) -> Option<String> {
    let mut keys = record.iter().filter(|(column, _)| column.primary);
    match (keys.next(), keys.next()) {
        (Some((_, value)), None) => value.as_key(),
        _ => None,
    }
}

fn next_key(path: &Path, store: &Store) -> Result<i64> {
    let Some(last) = store.keys().filter_map(|k| k.parse::<i64>().ok()).max() else {
        return Ok(1);
    };
    last.checked_add(1).ok_or_else(|| Error::KeyOverflow {
        store: path.display().to_string(),
        last,
    })
}
