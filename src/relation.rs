use crate::database::Database;
use crate::error::SimpleDbError;
use crate::model::Model;
use crate::query::Query;
use crate::table::criteria;
use crate::types::FieldValue;

/// How one model reaches related records of another.
///
/// The related model type is chosen at fetch time:
/// ```rust,no_run
/// use simple_db::prelude::*;
///
/// # #[derive(Debug, Clone)]
/// # struct User {
/// #     fields: Fields,
/// # }
/// # impl Model for User {
/// #     fn table() -> &'static str {
/// #         "users"
/// #     }
/// #     fn schema() -> &'static [(&'static str, FieldType)] {
/// #         &[("id", FieldType::Int), ("parent_id", FieldType::Int)]
/// #     }
/// #     fn from_fields(fields: Fields) -> Self {
/// #         Self { fields }
/// #     }
/// #     fn fields(&self) -> &Fields {
/// #         &self.fields
/// #     }
/// #     fn fields_mut(&mut self) -> &mut Fields {
/// #         &mut self.fields
/// #     }
/// # }
/// # async fn demo(db: &Database, user: &User) -> Result<(), SimpleDbError> {
/// let parent: Option<User> = Relation::one("parent_id", "id").fetch_one(db, user).await?;
/// let children: Vec<User> = Relation::many("parent_id", "id").fetch_many(db, user).await?;
/// # let _ = (parent, children);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// The owner's `local` field points at one foreign record whose `foreign` column
    /// matches. Without a `foreign` column the foreign table's first primary key is used.
    One {
        local: String,
        foreign: Option<String>,
    },
    /// Foreign records whose `foreign` column matches the owner's `local` field.
    Many { foreign: String, local: String },
    /// Foreign records linked to the owner through a junction table.
    Via {
        junction_table: String,
        junction_local: String,
        junction_foreign: String,
        local: String,
        foreign: String,
    },
}

/// Records produced by [`Relation::fetch`].
#[derive(Debug, Clone)]
pub enum Related<M> {
    One(Option<M>),
    Many(Vec<M>),
}

impl<M> Related<M> {
    /// The single record, or the first of many.
    #[must_use]
    pub fn into_one(self) -> Option<M> {
        match self {
            Related::One(record) => record,
            Related::Many(records) => records.into_iter().next(),
        }
    }

    #[must_use]
    pub fn into_many(self) -> Vec<M> {
        match self {
            Related::One(record) => record.into_iter().collect(),
            Related::Many(records) => records,
        }
    }
}

impl Relation {
    /// `local` on the owner matches `foreign` on the related table.
    #[must_use]
    pub fn one(local: &str, foreign: &str) -> Self {
        Relation::One {
            local: local.to_string(),
            foreign: Some(foreign.to_string()),
        }
    }

    /// `local` on the owner matches the related table's first primary key.
    #[must_use]
    pub fn has_one(local: &str) -> Self {
        Relation::One {
            local: local.to_string(),
            foreign: None,
        }
    }

    /// `foreign` on the related table points back at the owner's `local` field.
    #[must_use]
    pub fn many(foreign: &str, local: &str) -> Self {
        Relation::Many {
            foreign: foreign.to_string(),
            local: local.to_string(),
        }
    }

    /// Records joined through `junction_table`, whose `junction_local` column holds the
    /// owner's `local` value and whose `junction_foreign` column holds the related
    /// record's `foreign` value.
    #[must_use]
    pub fn via(
        junction_table: &str,
        junction_local: &str,
        junction_foreign: &str,
        local: &str,
        foreign: &str,
    ) -> Self {
        Relation::Via {
            junction_table: junction_table.to_string(),
            junction_local: junction_local.to_string(),
            junction_foreign: junction_foreign.to_string(),
            local: local.to_string(),
            foreign: foreign.to_string(),
        }
    }

    fn local(&self) -> &str {
        match self {
            Relation::One { local, .. }
            | Relation::Many { local, .. }
            | Relation::Via { local, .. } => local,
        }
    }

    /// Fetch the records of `M` related to `owner`. An owner whose local field is
    /// `NULL` has no related records.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::UnknownField` if the owner lacks the local field,
    /// `SimpleDbError::RelationError` if a default foreign key cannot be resolved, or any
    /// query error.
    pub async fn fetch<M, O>(&self, db: &Database, owner: &O) -> Result<Related<M>, SimpleDbError>
    where
        M: Model,
        O: Model,
    {
        let key = match owner.fields().get_primitive(self.local())? {
            Some(key) => FieldValue::Text(key.to_string()),
            None => {
                tracing::debug!(table = O::table(), field = self.local(), "simple_db.relation_null_key");
                return Ok(match self {
                    Relation::One { .. } => Related::One(None),
                    Relation::Many { .. } | Relation::Via { .. } => Related::Many(Vec::new()),
                });
            }
        };

        let foreign_table = db.table(M::table());
        match self {
            Relation::One { foreign, .. } => {
                let foreign = match foreign {
                    Some(foreign) => foreign.clone(),
                    None => foreign_table
                        .primary_columns()
                        .await?
                        .first()
                        .map(|column| column.name.clone())
                        .ok_or_else(|| {
                            SimpleDbError::RelationError(format!(
                                "table {} has no primary key to relate to",
                                M::table()
                            ))
                        })?,
                };
                let row = foreign_table.one_where(&criteria([(foreign, key)])).await?;
                Ok(Related::One(row.map(|row| M::from_row(&row)).transpose()?))
            }
            Relation::Many { foreign, .. } => {
                let rows = foreign_table
                    .all_where(&criteria([(foreign.clone(), key)]))
                    .await?;
                Ok(Related::Many(rows.populate()?))
            }
            Relation::Via {
                junction_table,
                junction_local,
                junction_foreign,
                foreign,
                ..
            } => {
                let target = M::table();
                let sql = Query::select_fields(junction_table, [format!("{target}.*")])
                    .inner_join(
                        target,
                        &format!("{target}.{foreign}"),
                        &format!("{junction_table}.{junction_foreign}"),
                    )
                    .where_eq([format!("{junction_table}.{junction_local}")])
                    .compile();
                let rows = db.all(&sql, &[key]).await?;
                Ok(Related::Many(rows.populate()?))
            }
        }
    }

    /// [`Relation::fetch`] collapsed to at most one record.
    ///
    /// # Errors
    ///
    /// See [`Relation::fetch`].
    pub async fn fetch_one<M, O>(&self, db: &Database, owner: &O) -> Result<Option<M>, SimpleDbError>
    where
        M: Model,
        O: Model,
    {
        Ok(self.fetch(db, owner).await?.into_one())
    }

    /// [`Relation::fetch`] as a list.
    ///
    /// # Errors
    ///
    /// See [`Relation::fetch`].
    pub async fn fetch_many<M, O>(&self, db: &Database, owner: &O) -> Result<Vec<M>, SimpleDbError>
    where
        M: Model,
        O: Model,
    {
        Ok(self.fetch(db, owner).await?.into_many())
    }
}
