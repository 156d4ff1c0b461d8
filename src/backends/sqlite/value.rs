//! Conversions between [`DatabaseValue`] and SQLite storage classes

use crate::core::value::DatabaseValue;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};

impl ToSql for DatabaseValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            DatabaseValue::Null => ToSqlOutput::Owned(Value::Null),
            DatabaseValue::Bool(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            DatabaseValue::Int(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            DatabaseValue::Long(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            DatabaseValue::Float(v) => ToSqlOutput::Owned(Value::Real(f64::from(*v))),
            DatabaseValue::Double(v) => ToSqlOutput::Owned(Value::Real(*v)),
            DatabaseValue::String(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            DatabaseValue::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            DatabaseValue::Timestamp(v) => ToSqlOutput::Owned(Value::Integer(*v)),
        })
    }
}

impl From<ValueRef<'_>> for DatabaseValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => DatabaseValue::Null,
            ValueRef::Integer(v) => DatabaseValue::Long(v),
            ValueRef::Real(v) => DatabaseValue::Double(v),
            ValueRef::Text(v) => DatabaseValue::String(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => DatabaseValue::Bytes(v.to_vec()),
        }
    }
}
