//! Structured equality filters over entity properties.
//!
//! Queries are written against property names and translated to column
//! names through the entity's cached `PropertyMap`.

use crate::model::entity::EntityKey;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::mapper::{optional_uuid_value, uuid_value, EntityMapper};
use rusqlite::types::Value;

#[derive(Debug, Clone, PartialEq)]
struct Predicate {
    property: &'static str,
    value: Value,
}

/// Conjunction of property equality predicates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    predicates: Vec<Predicate>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_key_eq(self, property: &'static str, key: EntityKey) -> Self {
        self.where_value_eq(property, uuid_value(key))
    }

    /// `None` matches rows whose column is `NULL`.
    pub fn where_optional_key_eq(self, property: &'static str, key: Option<EntityKey>) -> Self {
        self.where_value_eq(property, optional_uuid_value(key))
    }

    pub fn where_text_eq(self, property: &'static str, text: impl Into<String>) -> Self {
        self.where_value_eq(property, Value::Text(text.into()))
    }

    pub fn where_value_eq(mut self, property: &'static str, value: Value) -> Self {
        self.predicates.push(Predicate { property, value });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// SQL `WHERE` fragment plus positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    pub where_sql: String,
    pub bind_values: Vec<Value>,
}

/// Translates property predicates into a column-level `WHERE` clause.
pub fn translate<M: EntityMapper>(query: &Query) -> RepoResult<TranslatedQuery> {
    let property_map = M::property_map();
    let mut where_sql = String::from("1 = 1");
    let mut bind_values = Vec::with_capacity(query.predicates.len());

    for predicate in &query.predicates {
        let column = property_map
            .column_for(predicate.property)
            .ok_or_else(|| RepoError::UnknownProperty {
                table: property_map.table(),
                property: predicate.property.to_string(),
            })?;

        if predicate.value == Value::Null {
            where_sql.push_str(&format!(" AND {column} IS NULL"));
        } else {
            where_sql.push_str(&format!(" AND {column} = ?"));
            bind_values.push(predicate.value.clone());
        }
    }

    Ok(TranslatedQuery {
        where_sql,
        bind_values,
    })
}

#[cfg(test)]
mod tests {
    use super::{translate, Query};
    use crate::repo::error::RepoError;
    use crate::repo::ship_country_repo::ShipCountryMapper;
    use crate::repo::ship_zone_repo::ShipZoneMapper;
    use rusqlite::types::Value;
    use uuid::Uuid;

    #[test]
    fn translates_properties_to_columns() {
        let catalog = Uuid::new_v4();
        let query = Query::new()
            .where_key_eq("catalog_key", catalog)
            .where_text_eq("name", "West");

        let translated = translate::<ShipZoneMapper>(&query).expect("known properties");
        assert_eq!(
            translated.where_sql,
            "1 = 1 AND catalog_key = ? AND name = ?"
        );
        assert_eq!(
            translated.bind_values,
            vec![
                Value::Text(catalog.to_string()),
                Value::Text("West".to_string())
            ]
        );
    }

    #[test]
    fn property_and_column_names_can_differ() {
        let query = Query::new().where_optional_key_eq("zone_key", None);
        let translated = translate::<ShipCountryMapper>(&query).expect("zone_key is mapped");
        assert_eq!(translated.where_sql, "1 = 1 AND ship_zone_key IS NULL");
        assert!(translated.bind_values.is_empty());
    }

    #[test]
    fn unknown_property_is_rejected() {
        let query = Query::new().where_text_eq("colour", "red");
        let err = translate::<ShipZoneMapper>(&query).expect_err("unmapped property");
        assert!(matches!(
            err,
            RepoError::UnknownProperty { table: "ship_zones", ref property } if property == "colour"
        ));
    }
}
