use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::column::{Column, ColumnKey};
use crate::database::Database;
use crate::error::SimpleDbError;
use crate::query::Query;
use crate::results::{Row, Rows};
use crate::types::FieldValue;

/// Equality-only conjunctive filter. Keys are column names; iteration is name-ordered,
/// which keeps the compiled `WHERE` clause and the bound values aligned.
pub type Criteria = BTreeMap<String, FieldValue>;

/// Build a [`Criteria`] map from column/value pairs.
pub fn criteria<I, K, V>(pairs: I) -> Criteria
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A table within a [`Database`].
///
/// Columns are introspected on first use and cached for the life of this handle.
#[derive(Clone)]
pub struct Table {
    db: Database,
    name: String,
    columns: Arc<OnceCell<Vec<Column>>>,
}

impl Table {
    pub(crate) fn new(db: Database, name: &str) -> Self {
        Self {
            db,
            name: name.to_string(),
            columns: Arc::new(OnceCell::new()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every column of this table, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if introspection fails, or `SimpleDbError::ExecutionError`
    /// if the table does not exist.
    pub async fn columns(&self) -> Result<&[Column], SimpleDbError> {
        let columns = self
            .columns
            .get_or_try_init(|| introspect(&self.db, &self.name))
            .await?;
        Ok(columns.as_slice())
    }

    /// A single column by name.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if introspection fails.
    pub async fn column(&self, name: &str) -> Result<Option<&Column>, SimpleDbError> {
        Ok(self.columns().await?.iter().find(|c| c.name == name))
    }

    /// PRIMARY and UNIQUE columns.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if introspection fails.
    pub async fn unique_columns(&self) -> Result<Vec<&Column>, SimpleDbError> {
        self.filter_columns(Column::is_unique).await
    }

    /// PRIMARY columns.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if introspection fails.
    pub async fn primary_columns(&self) -> Result<Vec<&Column>, SimpleDbError> {
        self.filter_columns(Column::is_primary).await
    }

    /// Columns that are neither PRIMARY nor UNIQUE.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if introspection fails.
    pub async fn non_unique_columns(&self) -> Result<Vec<&Column>, SimpleDbError> {
        self.filter_columns(|c| !c.is_unique()).await
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if introspection fails.
    pub async fn nullable_columns(&self) -> Result<Vec<&Column>, SimpleDbError> {
        self.filter_columns(|c| c.nullable).await
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if introspection fails.
    pub async fn non_nullable_columns(&self) -> Result<Vec<&Column>, SimpleDbError> {
        self.filter_columns(|c| !c.nullable).await
    }

    /// The auto-incrementing column, if the table has one.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if introspection fails.
    pub async fn incrementing_column(&self) -> Result<Option<&Column>, SimpleDbError> {
        Ok(self.columns().await?.iter().find(|c| c.increments))
    }

    async fn filter_columns<F>(&self, keep: F) -> Result<Vec<&Column>, SimpleDbError>
    where
        F: Fn(&Column) -> bool,
    {
        Ok(self.columns().await?.iter().filter(|c| keep(c)).collect())
    }

    /// Find a row by its primary key values, given in primary column order.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::ExecutionError` if the table has no primary key or the
    /// number of values does not match it.
    pub async fn find(&self, primary: &[FieldValue]) -> Result<Option<Row>, SimpleDbError> {
        let keys: Vec<String> = self
            .primary_columns()
            .await?
            .into_iter()
            .map(|c| c.name.clone())
            .collect();
        if keys.is_empty() {
            return Err(SimpleDbError::ExecutionError(format!(
                "table {} has no primary key",
                self.name
            )));
        }
        if keys.len() != primary.len() {
            return Err(SimpleDbError::ExecutionError(format!(
                "table {} has {} primary key column(s), got {} value(s)",
                self.name,
                keys.len(),
                primary.len()
            )));
        }
        let sql = Query::select(&self.name).where_eq(&keys).limit(1).compile();
        self.db.one(&sql, primary).await
    }

    /// First row matching the criteria.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails.
    pub async fn one_where(&self, criteria: &Criteria) -> Result<Option<Row>, SimpleDbError> {
        let sql = Query::select(&self.name)
            .where_eq(criteria.keys())
            .limit(1)
            .compile();
        self.db.one(&sql, &values(criteria)).await
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails.
    pub async fn all(&self) -> Result<Rows, SimpleDbError> {
        self.db.all(&Query::select(&self.name).compile(), &[]).await
    }

    /// Every row matching the criteria.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails.
    pub async fn all_where(&self, criteria: &Criteria) -> Result<Rows, SimpleDbError> {
        let sql = Query::select(&self.name).where_eq(criteria.keys()).compile();
        self.db.all(&sql, &values(criteria)).await
    }

    /// Count rows, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails.
    pub async fn count(&self, criteria: &Criteria) -> Result<i64, SimpleDbError> {
        let sql = Query::select_fields(&self.name, ["COUNT(*)"])
            .where_eq(criteria.keys())
            .compile();
        Ok(self
            .db
            .prop(&sql, &values(criteria))
            .await?
            .and_then(|v| v.as_int())
            .unwrap_or(0))
    }

    /// Delete matching rows; empty criteria deletes everything. Returns rows affected.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the statement fails.
    pub async fn delete(&self, criteria: &Criteria) -> Result<usize, SimpleDbError> {
        let sql = Query::delete(&self.name).where_eq(criteria.keys()).compile();
        self.db.query(&sql, &values(criteria)).await
    }

    /// Insert a row. A non-empty `update` list turns the insert into an upsert that
    /// rewrites those columns when any uniqueness constraint conflicts.
    ///
    /// Returns the value of the auto-incrementing column of the inserted or updated row
    /// when the table has one.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::ExecutionError` for empty `data`, or `SimpleDbError` if the
    /// statement or introspection fails.
    pub async fn insert<U: AsRef<str>>(
        &self,
        data: &Criteria,
        update: &[U],
    ) -> Result<Option<i64>, SimpleDbError> {
        if data.is_empty() {
            return Err(SimpleDbError::ExecutionError(format!(
                "nothing to insert into {}",
                self.name
            )));
        }
        let columns: Vec<&str> = data.keys().map(String::as_str).collect();
        let no_target: [&str; 0] = [];
        let query = Query::insert_on_conflict(&self.name, &columns, &no_target, update);
        let params: Vec<(&str, FieldValue)> = data
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();

        // last_insert_rowid() is not refreshed when the upsert takes its update branch.
        let Some(increments) = self.incrementing_column().await? else {
            self.db.query_named(&query.compile(), &params).await?;
            return Ok(None);
        };
        let sql = query
            .literal(&format!("RETURNING {}", increments.name))
            .compile();
        let returned = self.db.all_named(&sql, &params).await?;
        Ok(returned
            .first()
            .and_then(|row| row.get_by_index(0))
            .and_then(FieldValue::as_int))
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("columns", &self.columns.get())
            .finish()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn values(criteria: &Criteria) -> Vec<FieldValue> {
    criteria.values().cloned().collect()
}

async fn introspect(db: &Database, table: &str) -> Result<Vec<Column>, SimpleDbError> {
    let info = db.all(&Query::table_info(table).compile(), &[]).await?;
    let mut columns: Vec<Column> = info.iter().filter_map(Column::from_table_info_row).collect();
    if columns.is_empty() {
        return Err(SimpleDbError::ExecutionError(format!(
            "table {table} does not exist"
        )));
    }

    let indexes = db
        .all(&format!("PRAGMA index_list({table})"), &[])
        .await?;
    for index in &indexes {
        let Some(index_name) = index.get("name").and_then(FieldValue::as_text) else {
            continue;
        };
        let unique = index.get("unique").and_then(FieldValue::as_int) == Some(1);
        let members = db
            .all(&format!("PRAGMA index_info(\"{index_name}\")"), &[])
            .await?;
        let names: Vec<&str> = members
            .iter()
            .filter_map(|m| m.get("name").and_then(FieldValue::as_text))
            .collect();
        let key = if unique && names.len() == 1 {
            ColumnKey::Unique
        } else {
            ColumnKey::Index
        };
        for column in columns.iter_mut().filter(|c| names.contains(&c.name.as_str())) {
            if column.key.is_none() || (key == ColumnKey::Unique && column.key == Some(ColumnKey::Index)) {
                column.key = Some(key);
            }
        }
    }

    // A lone INTEGER PRIMARY KEY aliases the rowid.
    let primary: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_primary())
        .map(|(i, _)| i)
        .collect();
    if let [only] = primary.as_slice()
        && columns[*only].column_type.eq_ignore_ascii_case("integer")
    {
        columns[*only].increments = true;
    }

    Ok(columns)
}
