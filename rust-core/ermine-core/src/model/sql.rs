//! SQL-backed record mapper.
//!
//! Filters become a `WHERE` conjunction: scalar values are bound as `?`
//! parameters, nulls and booleans are rendered inline, membership lists are
//! rendered with literal quoting. Raw fragments go in verbatim.

use super::column::TableDescriptor;
use super::filter::{check_order, Filter, Filters, Order};
use super::record::Model;
use crate::database::{Database, Dialect};
use crate::error::{Error, Result};
use crate::validation::validate_record;
use crate::value::DbValue;
use std::fmt::Write;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// CRUD over one SQL table, typed by its [`Model`]
///
/// ```ignore
/// let users = SqlMapper::<User>::new(&db);
/// let ada = users.first(&Filters::new().eq("id", 1), &[]).await?;
/// ```
#[derive(Debug)]
pub struct SqlMapper<'db, M> {
    db: &'db Database,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for SqlMapper<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for SqlMapper<'_, M> {}

impl<'db, M: Model> SqlMapper<'db, M> {
    /// Mapper over the handle's connection
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self {
            db,
            _model: PhantomData,
        }
    }

    fn dialect(&self) -> Dialect {
        self.db.dialect()
    }

    fn table() -> &'static TableDescriptor {
        M::table()
    }

    fn table_sql(&self) -> String {
        let table = Self::table();
        self.dialect().qualified_table(&table.schema, &table.name)
    }

    fn column_list(&self) -> String {
        let dialect = self.dialect();
        Self::table()
            .columns
            .iter()
            .map(|c| dialect.quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn where_clause(&self, filters: &Filters, binds: &mut Vec<DbValue>) -> Result<String> {
        let table = Self::table();
        filters.check_columns(table)?;

        let dialect = self.dialect();
        let mut predicates = Vec::new();
        for filter in filters.iter() {
            let predicate = match filter {
                Filter::Raw(fragment) => {
                    warn!(
                        table = %table.qualified_name(),
                        fragment = %fragment,
                        "Rendering unchecked raw SQL filter"
                    );
                    format!("({fragment})")
                }
                Filter::Value { column, value } => {
                    let column = dialect.quote_ident(column);
                    match value {
                        DbValue::Null => format!("{column} IS NULL"),
                        DbValue::Bool(b) => format!("{column} = {b}"),
                        other => {
                            binds.push(other.clone());
                            format!("{column} = ?")
                        }
                    }
                }
                Filter::In { values, .. } if values.is_empty() => "1 = 0".to_string(),
                Filter::In { column, values } => {
                    let column = dialect.quote_ident(column);
                    // `IN (NULL)` never holds, nulls become an `IS NULL` alternative
                    let list: Vec<String> = values
                        .iter()
                        .filter(|v| !v.is_null())
                        .map(|v| dialect.quote(v))
                        .collect();
                    let with_null = list.len() < values.len();
                    match (list.is_empty(), with_null) {
                        (true, _) => format!("{column} IS NULL"),
                        (false, false) => format!("{column} IN ({})", list.join(", ")),
                        (false, true) => {
                            format!("({column} IN ({}) OR {column} IS NULL)", list.join(", "))
                        }
                    }
                }
            };
            predicates.push(predicate);
        }

        if predicates.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" WHERE {}", predicates.join(" AND ")))
        }
    }

    /// Render the `SELECT` for [`list`](Self::list) with its binds
    pub(crate) fn select_sql(
        &self,
        filters: &Filters,
        order: &[Order],
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<(String, Vec<DbValue>)> {
        let table = Self::table();
        check_order(order, table)?;

        let mut binds = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", self.column_list(), self.table_sql());
        sql.push_str(&self.where_clause(filters, &mut binds)?);

        if !order.is_empty() {
            let dialect = self.dialect();
            let entries: Vec<String> = order
                .iter()
                .map(|o| format!("{} {}", dialect.quote_ident(&o.column), o.direction.as_sql()))
                .collect();
            let _ = write!(sql, " ORDER BY {}", entries.join(", "));
        }

        if let Some(limit) = limit {
            let _ = write!(sql, " LIMIT {limit} OFFSET {}", offset.unwrap_or(0));
        }

        Ok((sql, binds))
    }

    /// Rows matching every filter, sorted and paginated
    ///
    /// Pagination applies only when `limit` is given; `offset` defaults to 0.
    ///
    /// # Errors
    ///
    /// `UnknownColumn` for undeclared filter or order columns, `Query` when the
    /// statement fails.
    pub async fn list(
        &self,
        filters: &Filters,
        order: &[Order],
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Vec<M>> {
        let (sql, binds) = self.select_sql(filters, order, offset, limit)?;
        let rows = self.db.fetch_all(&sql, &binds).await?;
        rows.into_iter().map(M::hydrate).collect()
    }

    /// First row matching every filter, if any
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub async fn first(&self, filters: &Filters, order: &[Order]) -> Result<Option<M>> {
        let mut rows = self.list(filters, order, Some(0), Some(1)).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Number of rows matching every filter
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub async fn count(&self, filters: &Filters) -> Result<u64> {
        let mut binds = Vec::new();
        let mut sql = format!("SELECT COUNT(*) AS total FROM {}", self.table_sql());
        sql.push_str(&self.where_clause(filters, &mut binds)?);

        let total = self
            .db
            .fetch_optional(&sql, &binds)
            .await?
            .and_then(|row| row.get("total").cloned())
            .unwrap_or(DbValue::Null);
        match &total {
            DbValue::Int(n) => u64::try_from(*n).ok(),
            DbValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| Error::Database {
            message: format!("COUNT(*) on {} returned {total:?}", self.table_sql()),
        })
    }

    /// Update when every primary-key column is set, insert otherwise
    ///
    /// A table without a primary key always inserts.
    ///
    /// # Errors
    ///
    /// `Query` when the statement fails.
    pub async fn save(&self, model: &mut M) -> Result<()> {
        if model.record().has_primary_key() {
            self.update(model).await.map(|_| ())
        } else {
            self.insert(model).await
        }
    }

    /// [`save`](Self::save) after checking required columns and value types
    ///
    /// # Errors
    ///
    /// `Validation` with every failing column, or the errors of `save`.
    pub async fn save_validated(&self, model: &mut M) -> Result<()> {
        validate_record(model.record()).map_err(Error::Validation)?;
        self.save(model).await
    }

    /// Insert every column, then pick up the generated identifier
    ///
    /// # Errors
    ///
    /// `Query` when the statement fails.
    pub async fn insert(&self, model: &mut M) -> Result<()> {
        let record = model.record();
        let placeholders = vec!["?"; record.table().columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.table_sql(),
            self.column_list()
        );
        let binds: Vec<DbValue> = record.iter().map(|(_, value)| value.clone()).collect();

        let outcome = self.db.execute(&sql, &binds).await?;

        let table = Self::table();
        if let (Some(column), Some(id)) = (table.auto_increment_column(), outcome.last_insert_id) {
            if id != 0 {
                debug!(table = %table.qualified_name(), id, "Assigned auto-increment id");
                model.record_mut().set(&column.name, id)?;
            }
        }
        Ok(())
    }

    fn key_clause(&self, model: &M, binds: &mut Vec<DbValue>) -> Result<String> {
        let table = Self::table();
        let dialect = self.dialect();
        let mut predicates = Vec::new();
        for (column, value) in model.record().iter() {
            if column.primary {
                predicates.push(format!("{} = ?", dialect.quote_ident(&column.name)));
                binds.push(value.clone());
            }
        }
        if predicates.is_empty() {
            return Err(Error::MissingPrimaryKey {
                table: table.qualified_name(),
            });
        }
        Ok(predicates.join(" AND "))
    }

    /// Write every non-key column of the row identified by the primary key
    ///
    /// Returns the number of rows touched.
    ///
    /// # Errors
    ///
    /// `MissingPrimaryKey` for tables without one, `Query` when the statement
    /// fails.
    pub async fn update(&self, model: &M) -> Result<u64> {
        let dialect = self.dialect();
        let mut assignments = Vec::new();
        let mut binds = Vec::new();
        for (column, value) in model.record().iter() {
            if !column.primary {
                assignments.push(format!("{} = ?", dialect.quote_ident(&column.name)));
                binds.push(value.clone());
            }
        }
        let key = self.key_clause(model, &mut binds)?;
        if assignments.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {key}",
            self.table_sql(),
            assignments.join(", ")
        );
        Ok(self.db.execute(&sql, &binds).await?.rows_affected)
    }

    /// Remove the row identified by the primary key
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// `MissingPrimaryKey` for tables without one, `Query` when the statement
    /// fails.
    pub async fn delete(&self, model: &M) -> Result<u64> {
        let mut binds = Vec::new();
        let key = self.key_clause(model, &mut binds)?;
        let sql = format!("DELETE FROM {} WHERE {key}", self.table_sql());
        Ok(self.db.execute(&sql, &binds).await?.rows_affected)
    }

    /// Connection-level literal quoting
    #[must_use]
    pub fn quote(&self, value: &DbValue) -> String {
        self.db.quote(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabasePool;
    use crate::model::column::ColumnDescriptor;
    use crate::model::record::fixtures::User;
    use crate::model::record::Record;
    use std::sync::OnceLock;

    async fn users_db() -> Database {
        let pool = DatabasePool::connect_sqlite("sqlite::memory:", Some(1))
            .await
            .unwrap();
        pool.execute(
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name VARCHAR NOT NULL DEFAULT '', email VARCHAR)",
            &[],
        )
        .await
        .unwrap();
        Database::from_pool(pool)
    }

    async fn seed(users: &SqlMapper<'_, User>, names: &[&str]) {
        for name in names {
            let mut user = User::named(name, &format!("{}@x.io", name.to_lowercase()));
            users.save(&mut user).await.unwrap();
        }
    }

    fn log_table() -> &'static TableDescriptor {
        static LOG: OnceLock<TableDescriptor> = OnceLock::new();
        LOG.get_or_init(|| TableDescriptor {
            schema: "main".into(),
            name: "log".into(),
            columns: vec![ColumnDescriptor::new("message", "text")].into(),
        })
    }

    struct LogLine(Record);

    impl Model for LogLine {
        fn table() -> &'static TableDescriptor {
            log_table()
        }
        fn from_record(record: Record) -> Self {
            Self(record)
        }
        fn record(&self) -> &Record {
            &self.0
        }
        fn record_mut(&mut self) -> &mut Record {
            &mut self.0
        }
        fn into_record(self) -> Record {
            self.0
        }
    }

    #[test]
    fn test_select_sql_rendering() {
        let db = Database::new("mysql://root@localhost/app", None).unwrap();
        let users = SqlMapper::<User>::new(&db);
        let filters = Filters::new()
            .eq("name", "Ada")
            .is_null("email")
            .is_in("id", [1, 2]);

        let (sql, binds) = users
            .select_sql(&filters, &[Order::desc("id")], Some(10), Some(5))
            .unwrap();

        assert_eq!(
            sql,
            "SELECT `id`, `name`, `email` FROM `main`.`users` WHERE `name` = ? AND `email` IS NULL AND `id` IN (1, 2) ORDER BY `id` DESC LIMIT 5 OFFSET 10"
        );
        assert_eq!(binds, vec![DbValue::from("Ada")]);
    }

    #[test]
    fn test_select_sql_special_filters() {
        let db = Database::new("mysql://root@localhost/app", None).unwrap();
        let users = SqlMapper::<User>::new(&db);
        let filters = Filters::new()
            .raw_unchecked("id > 3")
            .is_in("name", ["O'Hara", "Bo"])
            .is_in("email", Vec::<String>::new());

        let (sql, binds) = users.select_sql(&filters, &[], Some(4), None).unwrap();

        assert!(sql.ends_with(
            "WHERE (id > 3) AND `name` IN ('O''Hara', 'Bo') AND 1 = 0"
        ));
        assert!(binds.is_empty());
    }

    #[test]
    fn test_in_list_with_null() {
        let db = Database::new("sqlite::memory:", None).unwrap();
        let users = SqlMapper::<User>::new(&db);

        let mixed = Filters::new().is_in("email", [DbValue::from("a@x.io"), DbValue::Null]);
        let (sql, _) = users.select_sql(&mixed, &[], None, None).unwrap();
        assert!(sql.ends_with(r#"WHERE ("email" IN ('a@x.io') OR "email" IS NULL)"#));

        let only_null = Filters::new().is_in("email", [DbValue::Null]);
        let (sql, _) = users.select_sql(&only_null, &[], None, None).unwrap();
        assert!(sql.ends_with(r#"WHERE "email" IS NULL"#));
    }

    #[test]
    fn test_unknown_columns_are_rejected() {
        let db = Database::new("sqlite::memory:", None).unwrap();
        let users = SqlMapper::<User>::new(&db);
        assert!(matches!(
            users.select_sql(&Filters::new().eq("nickname", "x"), &[], None, None),
            Err(Error::UnknownColumn { .. })
        ));
        assert!(matches!(
            users.select_sql(&Filters::new(), &[Order::asc("age")], None, None),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_assigns_auto_increment_id() {
        let db = users_db().await;
        let users = SqlMapper::<User>::new(&db);

        let mut ada = User::named("Ada", "a@x.io");
        users.save(&mut ada).await.unwrap();
        assert_eq!(ada.id(), Some(1));

        let found = users
            .first(&Filters::new().eq("id", 1), &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name(), Some("Ada"));
        assert_eq!(found.record().get("email").unwrap(), &DbValue::from("a@x.io"));
    }

    #[tokio::test]
    async fn test_save_with_primary_key_updates() {
        let db = users_db().await;
        let users = SqlMapper::<User>::new(&db);
        seed(&users, &["Ada"]).await;

        let mut ada = users
            .first(&Filters::new().eq("name", "Ada"), &[])
            .await
            .unwrap()
            .unwrap();
        ada.record_mut().set("name", "Ada Lovelace").unwrap();
        users.save(&mut ada).await.unwrap();

        assert_eq!(users.count(&Filters::new()).await.unwrap(), 1);
        let reloaded = users
            .first(&Filters::new().eq("id", 1), &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.name(), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_list_filters_order_and_pagination() {
        let db = users_db().await;
        let users = SqlMapper::<User>::new(&db);
        seed(&users, &["Ada", "Bob", "Cy", "Di"]).await;

        let page = users
            .list(&Filters::new(), &[Order::desc("name")], Some(1), Some(2))
            .await
            .unwrap();
        let names: Vec<_> = page.iter().filter_map(User::name).collect();
        assert_eq!(names, vec!["Cy", "Bob"]);

        let forward = Filters::new().is_in("id", [1, 2, 3]).eq("name", "Bob");
        let backward = Filters::new().eq("name", "Bob").is_in("id", [1, 2, 3]);
        let a = users.list(&forward, &[], None, None).await.unwrap();
        let b = users.list(&backward, &[], None, None).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a, b);

        let none = users
            .list(&Filters::new().is_in("id", Vec::<i64>::new()), &[], None, None)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_null_filter_and_count() {
        let db = users_db().await;
        let users = SqlMapper::<User>::new(&db);
        seed(&users, &["Ada", "Bob"]).await;

        let mut anonymous = User::new();
        anonymous.record_mut().set("name", "Anon").unwrap();
        users.save(&mut anonymous).await.unwrap();

        assert_eq!(users.count(&Filters::new().is_null("email")).await.unwrap(), 1);
        assert_eq!(users.count(&Filters::new()).await.unwrap(), 3);
        assert!(users
            .first(&Filters::new().eq("name", "Zed"), &[])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let db = users_db().await;
        let users = SqlMapper::<User>::new(&db);
        seed(&users, &["Ada", "Bob"]).await;

        let bob = users
            .first(&Filters::new().eq("name", "Bob"), &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(users.delete(&bob).await.unwrap(), 1);
        assert_eq!(users.count(&Filters::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_table_without_primary_key() {
        let db = users_db().await;
        db.execute("CREATE TABLE log (message TEXT)", &[]).await.unwrap();
        let log = SqlMapper::<LogLine>::new(&db);

        let mut line = LogLine::new();
        line.record_mut().set("message", "started").unwrap();
        log.save(&mut line).await.unwrap();
        log.save(&mut line).await.unwrap();

        assert_eq!(log.count(&Filters::new()).await.unwrap(), 2);
        assert!(matches!(
            log.delete(&line).await,
            Err(Error::MissingPrimaryKey { .. })
        ));
    }

    fn pairs_table() -> &'static TableDescriptor {
        static PAIRS: OnceLock<TableDescriptor> = OnceLock::new();
        PAIRS.get_or_init(|| TableDescriptor {
            schema: "main".into(),
            name: "pairs".into(),
            columns: vec![
                ColumnDescriptor::new("a", "int").primary(),
                ColumnDescriptor::new("b", "int").primary(),
                ColumnDescriptor::new("v", "varchar"),
            ]
            .into(),
        })
    }

    struct Pair(Record);

    impl Model for Pair {
        fn table() -> &'static TableDescriptor {
            pairs_table()
        }
        fn from_record(record: Record) -> Self {
            Self(record)
        }
        fn record(&self) -> &Record {
            &self.0
        }
        fn record_mut(&mut self) -> &mut Record {
            &mut self.0
        }
        fn into_record(self) -> Record {
            self.0
        }
    }

    fn pair(a: Option<i64>, b: i64, v: &str) -> Pair {
        let mut pair = Pair::new();
        pair.record_mut().set("a", a).unwrap();
        pair.record_mut().set("b", b).unwrap();
        pair.record_mut().set("v", v).unwrap();
        pair
    }

    #[tokio::test]
    async fn test_composite_primary_key() {
        let db = users_db().await;
        db.execute("CREATE TABLE pairs (a INTEGER, b INTEGER, v TEXT)", &[])
            .await
            .unwrap();
        db.execute("INSERT INTO pairs VALUES (1, 1, 'x'), (1, 2, 'x'), (2, 1, 'x')", &[])
            .await
            .unwrap();
        let pairs = SqlMapper::<Pair>::new(&db);

        // both key columns set: update only the (1, 2) row
        let mut target = pair(Some(1), 2, "y");
        pairs.save(&mut target).await.unwrap();
        assert_eq!(pairs.count(&Filters::new()).await.unwrap(), 3);
        assert_eq!(pairs.count(&Filters::new().eq("v", "y")).await.unwrap(), 1);
        let updated = pairs
            .first(&Filters::new().eq("v", "y"), &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.record().get("a").unwrap(), &DbValue::Int(1));
        assert_eq!(updated.record().get("b").unwrap(), &DbValue::Int(2));

        // one key column null: insert
        let mut partial = pair(None, 2, "z");
        pairs.save(&mut partial).await.unwrap();
        assert_eq!(pairs.count(&Filters::new()).await.unwrap(), 4);
        assert_eq!(pairs.count(&Filters::new().is_null("a")).await.unwrap(), 1);

        assert_eq!(pairs.delete(&pair(Some(1), 1, "x")).await.unwrap(), 1);
        assert_eq!(pairs.count(&Filters::new().eq("a", 1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_count_with_in_list_containing_null() {
        let db = users_db().await;
        let users = SqlMapper::<User>::new(&db);
        seed(&users, &["Ada", "Bob"]).await;
        let mut anonymous = User::new();
        anonymous.record_mut().set("name", "Anon").unwrap();
        users.save(&mut anonymous).await.unwrap();

        let filters = Filters::new().is_in("email", [DbValue::from("ada@x.io"), DbValue::Null]);
        assert_eq!(users.count(&filters).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_save_validated_rejects_null_required_column() {
        let db = users_db().await;
        let users = SqlMapper::<User>::new(&db);

        let mut user = User::new();
        user.record_mut().set("name", DbValue::Null).unwrap();
        let err = users.save_validated(&mut user).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(users.count(&Filters::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_statement_failure_is_query_error() {
        let db = Database::from_pool(
            DatabasePool::connect_sqlite("sqlite::memory:", Some(1))
                .await
                .unwrap(),
        );
        let users = SqlMapper::<User>::new(&db);
        let err = users.list(&Filters::new(), &[], None, None).await.unwrap_err();
        assert!(matches!(err, Error::Query { .. }));
    }

    #[test]
    fn test_quote() {
        let db = Database::new("sqlite::memory:", None).unwrap();
        let users = SqlMapper::<User>::new(&db);
        assert_eq!(users.quote(&DbValue::from("it's")), "'it''s'");
    }
}
