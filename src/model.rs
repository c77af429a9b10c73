//! Typed models over table rows.
//!
//! A model declares its table and an ordered schema of `(field, FieldType)` pairs. Values
//! live in a [`Fields`] registry as primitives, exactly as the driver stores them, and
//! are refined on read.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::database::Database;
use crate::error::SimpleDbError;
use crate::field;
use crate::results::Row;
use crate::table::Criteria;
use crate::types::{FieldType, FieldValue};

#[derive(Debug, Clone)]
struct FieldSlot {
    name: String,
    field_type: FieldType,
    primitive: Option<String>,
    // Set once a value (including NULL) has been given explicitly or loaded from a row.
    assigned: bool,
}

impl PartialEq for FieldSlot {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.field_type == other.field_type
            && self.primitive == other.primitive
    }
}

impl Eq for FieldSlot {}

/// Ordered registry of field name to declared type and current primitive value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    slots: Vec<FieldSlot>,
}

impl Fields {
    /// A registry with every field unset (`NULL`).
    #[must_use]
    pub fn new(schema: &[(&str, FieldType)]) -> Self {
        Self {
            slots: schema
                .iter()
                .map(|(name, field_type)| FieldSlot {
                    name: (*name).to_string(),
                    field_type: *field_type,
                    primitive: None,
                    assigned: false,
                })
                .collect(),
        }
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slot(name).is_ok()
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError::UnknownField` if the field is not declared.
    pub fn field_type(&self, name: &str) -> Result<FieldType, SimpleDbError> {
        Ok(self.slot(name)?.field_type)
    }

    /// The stored primitive of a field.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::UnknownField` if the field is not declared.
    pub fn get_primitive(&self, name: &str) -> Result<Option<&str>, SimpleDbError> {
        Ok(self.slot(name)?.primitive.as_deref())
    }

    /// Store a primitive as-is, bypassing conversion.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::UnknownField` if the field is not declared.
    pub fn set_primitive(&mut self, name: &str, primitive: Option<String>) -> Result<(), SimpleDbError> {
        let slot = self.slot_mut(name)?;
        slot.primitive = primitive;
        slot.assigned = true;
        Ok(())
    }

    /// The refined value of a field.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::UnknownField` for undeclared fields, or the conversion error
    /// if the stored primitive cannot be refined.
    pub fn get(&self, name: &str) -> Result<FieldValue, SimpleDbError> {
        let slot = self.slot(name)?;
        refine(slot)
    }

    /// Convert `value` to the field's primitive and store it.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::UnknownField` for undeclared fields, or the conversion error
    /// if `value` cannot be made primitive.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), SimpleDbError> {
        let slot = self.slot_mut(name)?;
        slot.primitive = field::to_primitive(&value.into(), slot.field_type)?;
        slot.assigned = true;
        Ok(())
    }

    /// Set several fields at once. Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Fields::set`].
    pub fn fill<I, K, V>(&mut self, data: I) -> Result<(), SimpleDbError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        for (name, value) in data {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Field name and primitive pairs in declaration order.
    #[must_use]
    pub fn primitive_data(&self) -> Vec<(String, Option<String>)> {
        self.slots
            .iter()
            .map(|slot| (slot.name.clone(), slot.primitive.clone()))
            .collect()
    }

    /// Like [`Fields::primitive_data`], limited to fields that were set or loaded. Fields
    /// never touched are left to the column default on insert.
    #[must_use]
    pub fn assigned_data(&self) -> Vec<(String, Option<String>)> {
        self.slots
            .iter()
            .filter(|slot| slot.assigned)
            .map(|slot| (slot.name.clone(), slot.primitive.clone()))
            .collect()
    }

    #[must_use]
    pub fn is_assigned(&self, name: &str) -> bool {
        self.slot(name).is_ok_and(|slot| slot.assigned)
    }

    /// Field name and refined value pairs in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the first refinement error.
    pub fn refined_data(&self) -> Result<Vec<(String, FieldValue)>, SimpleDbError> {
        self.slots
            .iter()
            .map(|slot| Ok((slot.name.clone(), refine(slot)?)))
            .collect()
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if the field is unknown or cannot be refined.
    pub fn get_int(&self, name: &str) -> Result<Option<i64>, SimpleDbError> {
        Ok(self.get_as(name, FieldType::Int)?.as_int())
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if the field is unknown or cannot be refined.
    pub fn get_float(&self, name: &str) -> Result<Option<f64>, SimpleDbError> {
        Ok(self.get_as(name, FieldType::Float)?.as_float())
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError::UnknownField` if the field is not declared.
    pub fn get_str(&self, name: &str) -> Result<Option<&str>, SimpleDbError> {
        self.get_primitive(name)
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if the field is unknown or cannot be refined.
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, SimpleDbError> {
        Ok(self.get_as(name, FieldType::Bool)?.as_bool())
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if the field is unknown or cannot be refined.
    pub fn get_datetime(&self, name: &str) -> Result<Option<NaiveDateTime>, SimpleDbError> {
        Ok(self.get_as(name, FieldType::DateTime)?.as_datetime())
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if the field is unknown or cannot be refined.
    pub fn get_json(&self, name: &str) -> Result<Option<JsonValue>, SimpleDbError> {
        Ok(match self.get_as(name, FieldType::Json)? {
            FieldValue::Null => None,
            FieldValue::Json(json) => Some(json),
            other => other.to_primitive_text().map(JsonValue::String),
        })
    }

    // Typed getters read the stored primitive through the requested type.
    fn get_as(&self, name: &str, field_type: FieldType) -> Result<FieldValue, SimpleDbError> {
        let slot = self.slot(name)?;
        field::to_refined(&primitive_value(slot), field_type)
    }

    fn slot(&self, name: &str) -> Result<&FieldSlot, SimpleDbError> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .ok_or_else(|| SimpleDbError::UnknownField(name.to_string()))
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut FieldSlot, SimpleDbError> {
        self.slots
            .iter_mut()
            .find(|slot| slot.name == name)
            .ok_or_else(|| SimpleDbError::UnknownField(name.to_string()))
    }
}

fn primitive_value(slot: &FieldSlot) -> FieldValue {
    slot.primitive.clone().map_or(FieldValue::Null, FieldValue::Text)
}

fn refine(slot: &FieldSlot) -> Result<FieldValue, SimpleDbError> {
    field::to_refined(&primitive_value(slot), slot.field_type)
}

/// A typed record stored in one table.
///
/// Implementors supply the table name, the schema and access to their [`Fields`];
/// everything else is provided.
/// ```rust
/// use simple_db::prelude::*;
///
/// #[derive(Debug, Clone)]
/// struct User {
///     fields: Fields,
/// }
///
/// impl Model for User {
///     fn table() -> &'static str {
///         "users"
///     }
///     fn schema() -> &'static [(&'static str, FieldType)] {
///         &[("id", FieldType::Int), ("name", FieldType::String)]
///     }
///     fn from_fields(fields: Fields) -> Self {
///         Self { fields }
///     }
///     fn fields(&self) -> &Fields {
///         &self.fields
///     }
///     fn fields_mut(&mut self) -> &mut Fields {
///         &mut self.fields
///     }
/// }
///
/// let user = User::with([("name", "Ada")]).unwrap();
/// assert_eq!(user.fields().get_str("name").unwrap(), Some("Ada"));
/// ```
#[async_trait]
pub trait Model: Sized + Send + Sync {
    fn table() -> &'static str;

    /// Declared fields in order.
    fn schema() -> &'static [(&'static str, FieldType)];

    /// Fields identifying a record.
    fn primary_fields() -> &'static [&'static str] {
        &["id"]
    }

    fn from_fields(fields: Fields) -> Self;

    fn fields(&self) -> &Fields;

    fn fields_mut(&mut self) -> &mut Fields;

    /// A model with every field `NULL`.
    fn new() -> Self {
        Self::from_fields(Fields::new(Self::schema()))
    }

    /// A model filled from refined or primitive values.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Fields::set`].
    fn with<I, K, V>(data: I) -> Result<Self, SimpleDbError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut model = Self::new();
        model.fields_mut().fill(data)?;
        Ok(model)
    }

    /// A model filled from a driver row. Row values are already primitives and are stored
    /// verbatim; columns the schema does not declare are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if a value cannot be stored.
    fn from_row(row: &Row) -> Result<Self, SimpleDbError> {
        let mut fields = Fields::new(Self::schema());
        for (column, value) in row.data() {
            if fields.contains(column) {
                fields.set_primitive(column, value.to_primitive_text())?;
            } else {
                tracing::trace!(table = Self::table(), column, "simple_db.skip_column");
            }
        }
        Ok(Self::from_fields(fields))
    }

    /// Schema fields that are not primary fields; the columns an upsert rewrites.
    fn non_primary_fields() -> Vec<&'static str> {
        Self::schema()
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| !Self::primary_fields().contains(name))
            .collect()
    }

    /// # Errors
    ///
    /// See [`Fields::get`].
    fn get(&self, name: &str) -> Result<FieldValue, SimpleDbError> {
        self.fields().get(name)
    }

    /// # Errors
    ///
    /// See [`Fields::set`].
    fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), SimpleDbError> {
        self.fields_mut().set(name, value)
    }

    fn primitive_data(&self) -> Vec<(String, Option<String>)> {
        self.fields().primitive_data()
    }

    /// # Errors
    ///
    /// See [`Fields::refined_data`].
    fn refined_data(&self) -> Result<Vec<(String, FieldValue)>, SimpleDbError> {
        self.fields().refined_data()
    }

    /// Same table and same stored primitives.
    fn equal_to(&self, other: &Self) -> bool {
        self.fields() == other.fields()
    }

    /// Criteria matching this record by its primary fields.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::ExecutionError` if any primary field is `NULL`.
    fn primary_criteria(&self) -> Result<Criteria, SimpleDbError> {
        let mut criteria = Criteria::new();
        for name in Self::primary_fields() {
            let value = self.fields().get_primitive(name)?.ok_or_else(|| {
                SimpleDbError::ExecutionError(format!(
                    "{} record has no value for primary field {name}",
                    Self::table()
                ))
            })?;
            criteria.insert((*name).to_string(), FieldValue::Text(value.to_string()));
        }
        Ok(criteria)
    }

    /// Find a record by its primary key values.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails or a row cannot be stored.
    async fn find(db: &Database, primary: &[FieldValue]) -> Result<Option<Self>, SimpleDbError> {
        db.table(Self::table())
            .find(primary)
            .await?
            .map(|row| Self::from_row(&row))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails or a row cannot be stored.
    async fn one_where(db: &Database, criteria: &Criteria) -> Result<Option<Self>, SimpleDbError> {
        db.table(Self::table())
            .one_where(criteria)
            .await?
            .map(|row| Self::from_row(&row))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails or a row cannot be stored.
    async fn all_where(db: &Database, criteria: &Criteria) -> Result<Vec<Self>, SimpleDbError> {
        db.table(Self::table())
            .all_where(criteria)
            .await?
            .populate()
    }

    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails or a row cannot be stored.
    async fn all(db: &Database) -> Result<Vec<Self>, SimpleDbError> {
        db.table(Self::table()).all().await?.populate()
    }

    /// Insert this record, updating its assigned non-primary fields if it already
    /// exists. Unassigned fields are left out so their column defaults apply. The id of
    /// the written row is stored in the first primary field when that is unset.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if nothing is assigned or the statement fails.
    async fn save(&mut self, db: &Database) -> Result<(), SimpleDbError> {
        let data: Criteria = self
            .fields()
            .assigned_data()
            .into_iter()
            .map(|(name, primitive)| (name, FieldValue::from(primitive)))
            .collect();
        let update: Vec<&str> = Self::non_primary_fields()
            .into_iter()
            .filter(|name| self.fields().is_assigned(name))
            .collect();
        let written_id = db.table(Self::table()).insert(&data, &update).await?;

        if let (Some(id), Some(first)) = (written_id, Self::primary_fields().first())
            && self.fields().get_primitive(first)?.is_none()
        {
            self.fields_mut().set_primitive(first, Some(id.to_string()))?;
        }
        Ok(())
    }

    /// Delete this record by its primary fields. Returns rows affected.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if a primary field is unset or the statement fails.
    async fn delete(&self, db: &Database) -> Result<usize, SimpleDbError> {
        let criteria = self.primary_criteria()?;
        db.table(Self::table()).delete(&criteria).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone)]
    struct User {
        fields: Fields,
    }

    impl Model for User {
        fn table() -> &'static str {
            "users"
        }

        fn schema() -> &'static [(&'static str, FieldType)] {
            &[
                ("id", FieldType::Int),
                ("name", FieldType::String),
                ("email", FieldType::String),
                ("created", FieldType::DateTime),
                ("attributes", FieldType::Json),
            ]
        }

        fn from_fields(fields: Fields) -> Self {
            Self { fields }
        }

        fn fields(&self) -> &Fields {
            &self.fields
        }

        fn fields_mut(&mut self) -> &mut Fields {
            &mut self.fields
        }
    }

    fn names(data: &[(String, Option<String>)]) -> Vec<&str> {
        data.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn new_model_is_all_null() {
        let user = User::new();
        let primitive = user.primitive_data();
        assert_eq!(names(&primitive), vec!["id", "name", "email", "created", "attributes"]);
        assert!(primitive.iter().all(|(_, v)| v.is_none()));
        assert!(
            user.refined_data()
                .unwrap()
                .iter()
                .all(|(_, v)| *v == FieldValue::Null)
        );
        assert_eq!(User::non_primary_fields(), vec!["name", "email", "created", "attributes"]);
    }

    #[test]
    fn set_and_fill() {
        let mut user = User::new();
        user.set("email", "test@test.com").unwrap();
        assert_eq!(user.fields().get_primitive("email").unwrap(), Some("test@test.com"));
        assert_eq!(user.get("email").unwrap(), FieldValue::Text("test@test.com".into()));

        user.fields_mut()
            .fill([("name", "John Smith"), ("email", "john.smith@test.com")])
            .unwrap();
        assert_eq!(
            user.primitive_data(),
            vec![
                ("id".to_string(), None),
                ("name".to_string(), Some("John Smith".to_string())),
                ("email".to_string(), Some("john.smith@test.com".to_string())),
                ("created".to_string(), None),
                ("attributes".to_string(), None),
            ]
        );
        assert!(matches!(
            user.set("nickname", "JS"),
            Err(SimpleDbError::UnknownField(_))
        ));
    }

    #[test]
    fn assigned_data_tracks_explicit_values() {
        let mut user = User::with([("name", "Ada")]).unwrap();
        user.set("email", FieldValue::Null).unwrap();
        assert_eq!(
            user.fields().assigned_data(),
            vec![("name".to_string(), Some("Ada".to_string())), ("email".to_string(), None)]
        );
        assert!(user.fields().is_assigned("email"));
        assert!(!user.fields().is_assigned("created"));
        assert!(!user.fields().is_assigned("missing"));

        let untouched = User::with([("name", "Ada")]).unwrap();
        let mut nulled = untouched.clone();
        nulled.set("email", FieldValue::Null).unwrap();
        assert!(untouched.equal_to(&nulled));
    }

    #[test]
    fn datetime_field() {
        let user = User::with([("created", "2017-01-01")]).unwrap();
        assert_eq!(
            user.fields().get_primitive("created").unwrap(),
            Some("2017-01-01 00:00:00")
        );
        let created = user.fields().get_datetime("created").unwrap().unwrap();
        assert_eq!(created.format("%Y-%m-%d").to_string(), "2017-01-01");
    }

    #[test]
    fn json_field() {
        let mut user = User::new();
        user.set(
            "attributes",
            json!({"test": 5, "example": {"value": "example"}}),
        )
        .unwrap();
        assert_eq!(
            user.fields().get_primitive("attributes").unwrap(),
            Some(r#"{"example":{"value":"example"},"test":5}"#)
        );
        assert_eq!(
            user.fields().get_json("attributes").unwrap(),
            Some(json!({"test": 5, "example": {"value": "example"}}))
        );
    }

    #[test]
    fn typed_getters_refine_primitives() {
        let user = User::with([("id", FieldValue::Text("0832".into()))]).unwrap();
        assert_eq!(user.fields().get_int("id").unwrap(), Some(832));
        assert_eq!(user.fields().get_int("name").unwrap(), None);
        assert!(user.fields().get_int("missing").is_err());
    }

    #[test]
    fn equality_and_primary_criteria() {
        let a = User::with([("id", 1)]).unwrap();
        let b = User::with([("id", 1)]).unwrap();
        let c = User::with([("id", 2)]).unwrap();
        assert!(a.equal_to(&b));
        assert!(!a.equal_to(&c));
        assert_eq!(
            a.primary_criteria().unwrap().get("id"),
            Some(&FieldValue::Text("1".into()))
        );
        assert!(User::new().primary_criteria().is_err());
    }
}
