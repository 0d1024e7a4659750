//! Result rows.

use crate::error::{DbError, DbResult};
use crate::value::Value;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One result row: column names mapped to decoded values, in select order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row from parallel column and value lists.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Decode every column of a driver row.
    pub fn from_pg(row: &tokio_postgres::Row) -> DbResult<Self> {
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (idx, column) in row.columns().iter().enumerate() {
            let value = row
                .try_get::<_, Value>(idx)
                .map_err(|e| DbError::decode(column.name(), e.to_string()))?;
            columns.push(column.name().to_string());
            values.push(value);
        }
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the first column called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Convert the value of column `name` into `T` through its JSON form.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> DbResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| DbError::decode(name, "no such column"))?;
        let json = serde_json::to_value(value)?;
        serde_json::from_value(json).map_err(|e| DbError::decode(name, e.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// The row as a JSON object. Later duplicate column names win.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(name, value)| {
                let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                (name.to_string(), json)
            })
            .collect();
        serde_json::Value::Object(map)
    }

    /// Deserialize the whole row into `T`, matching fields by column name.
    pub fn deserialize<T: DeserializeOwned>(&self) -> DbResult<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn row() -> Row {
        Row::new(
            vec!["id".into(), "name".into(), "active".into()],
            vec![Value::Int(7), Value::from("alice"), Value::Bool(true)],
        )
    }

    #[test]
    fn lookup_by_name_and_index() {
        let row = row();
        assert_eq!(row.get("name"), Some(&Value::from("alice")));
        assert_eq!(row.get_index(0), Some(&Value::Int(7)));
        assert!(row.get("missing").is_none());
        assert!(row.get_index(3).is_none());
    }

    #[test]
    fn columns_keep_select_order() {
        let row = row();
        let names: Vec<&str> = row.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "name", "active"]);
    }

    #[test]
    fn typed_access_goes_through_json() {
        let row = row();
        assert_eq!(row.get_as::<i64>("id").unwrap(), 7);
        assert!(row.get_as::<bool>("active").unwrap());
        assert!(matches!(
            row.get_as::<i64>("name").unwrap_err(),
            DbError::Decode { .. }
        ));
        assert!(row.get_as::<i64>("missing").is_err());
    }

    #[test]
    fn deserializes_into_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: i64,
            name: String,
        }

        let user: User = row().deserialize().unwrap();
        assert_eq!(
            user,
            User {
                id: 7,
                name: "alice".into()
            }
        );
    }

    #[test]
    fn serializes_as_object() {
        assert_eq!(
            serde_json::to_string(&row()).unwrap(),
            r#"{"id":7,"name":"alice","active":true}"#
        );
    }
}
