use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FwError, FwResult};

/// A single state or flow field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A 64-bit signed integer value.
    Integer(i64),
    /// A 64-bit floating-point value. May be infinite.
    ///
    /// Non-finite values serialize as the strings `"inf"`, `"-inf"` and
    /// `"nan"`, so a text field holding exactly one of those reads back as a
    /// float.
    Float(#[serde(with = "float_repr")] f64),
    /// A boolean value.
    Boolean(bool),
    /// A text value, e.g. a mode name.
    Text(String),
    /// An ordered list of values, e.g. a trajectory vector.
    List(Vec<FieldValue>),
}

/// Serde codec for floats that keeps non-finite values representable in JSON.
mod float_repr {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const INF: &str = "inf";
    const NEG_INF: &str = "-inf";
    const NAN: &str = "nan";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if value.is_sign_positive() {
            serializer.serialize_str(INF)
        } else {
            serializer.serialize_str(NEG_INF)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(text) => match text.as_str() {
                INF => Ok(f64::INFINITY),
                NEG_INF => Ok(f64::NEG_INFINITY),
                NAN => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("not a float: {other}"))),
            },
        }
    }
}

impl FieldValue {
    /// Name of the stored variant, used in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    /// Numeric view of the value. Integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Boolean view of the value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Text view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether `other` may be stored in a slot currently holding `self`.
    ///
    /// Integers are accepted into float slots; every other variant must match.
    fn accepts(&self, other: &FieldValue) -> bool {
        matches!(
            (self, other),
            (Self::Float(_), Self::Float(_) | Self::Integer(_))
                | (Self::Integer(_), Self::Integer(_))
                | (Self::Boolean(_), Self::Boolean(_))
                | (Self::Text(_), Self::Text(_))
                | (Self::List(_), Self::List(_))
        )
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(n) => write!(f, "{n}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        Self::List(v.into_iter().map(Self::Float).collect())
    }
}

/// An ordered map of declared field names to values.
///
/// The set of names is fixed when the map is handed to a block or flow;
/// afterwards [`Fields::set`] only updates existing entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields {
    values: IndexMap<String, FieldValue>,
}

impl Fields {
    /// An empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, builder style. Redeclaring a name overwrites its value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.declare(name, value);
        self
    }

    /// Declare a field in place.
    pub fn declare(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Look up a field, reporting `owner` in the error if it is undeclared.
    pub fn require(&self, owner: &str, name: &str) -> FwResult<&FieldValue> {
        self.values.get(name).ok_or_else(|| FwError::UnknownField {
            owner: owner.to_string(),
            field: name.to_string(),
        })
    }

    /// Read a numeric field.
    pub fn get_f64(&self, owner: &str, name: &str) -> FwResult<f64> {
        let value = self.require(owner, name)?;
        value.as_f64().ok_or_else(|| FwError::FieldType {
            owner: owner.to_string(),
            field: name.to_string(),
            expected: "float",
            found: value.type_name(),
        })
    }

    /// Read a text field.
    pub fn get_str(&self, owner: &str, name: &str) -> FwResult<&str> {
        let value = self.require(owner, name)?;
        value.as_str().ok_or_else(|| FwError::FieldType {
            owner: owner.to_string(),
            field: name.to_string(),
            expected: "text",
            found: value.type_name(),
        })
    }

    /// Overwrite a declared field.
    ///
    /// Fails if `name` was never declared or the new value has a different
    /// type than the stored one (integers may be written into float fields).
    pub fn set(&mut self, owner: &str, name: &str, value: impl Into<FieldValue>) -> FwResult<()> {
        let value = value.into();
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| FwError::UnknownField {
                owner: owner.to_string(),
                field: name.to_string(),
            })?;
        if !slot.accepts(&value) {
            return Err(FwError::FieldType {
                owner: owner.to_string(),
                field: name.to_string(),
                expected: slot.type_name(),
                found: value.type_name(),
            });
        }
        let widen = matches!(slot, FieldValue::Float(_));
        *slot = match value {
            FieldValue::Integer(n) if widen => FieldValue::Float(n as f64),
            v => v,
        };
        Ok(())
    }

    /// Whether a field with this name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Name/value pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.declare(k, v);
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_undeclared_field() {
        let mut fields = Fields::new().with("soc", 2000.0);
        let err = fields.set("StoreEE", "charge", 1.0).unwrap_err();
        assert_eq!(
            err,
            FwError::UnknownField {
                owner: "StoreEE".into(),
                field: "charge".into()
            }
        );
    }

    #[test]
    fn set_widens_integer_into_float_slot() {
        let mut fields = Fields::new().with("rate", 1.0);
        fields.set("EE", "rate", 3_i64).unwrap();
        assert_eq!(fields.get("rate"), Some(&FieldValue::Float(3.0)));
    }

    #[test]
    fn set_rejects_type_change() {
        let mut fields = Fields::new().with("mode", "taxi");
        let err = fields.set("Planpath", "mode", 2.0).unwrap_err();
        assert!(matches!(
            err,
            FwError::FieldType {
                expected: "text",
                found: "float",
                ..
            }
        ));
    }

    #[test]
    fn numeric_read_coerces_integer() {
        let fields = Fields::new().with("pt", 1_i64);
        assert!((fields.get_f64("Planpath", "pt").unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn numeric_read_of_text_is_type_error() {
        let fields = Fields::new().with("mode", "taxi");
        assert!(fields.get_f64("Planpath", "mode").is_err());
        assert_eq!(fields.get_str("Planpath", "mode").unwrap(), "taxi");
    }

    #[test]
    fn declaration_order_is_preserved() {
        let fields: Fields = [("z", 0.0), ("a", 1.0), ("m", 2.0)].into_iter().collect();
        assert_eq!(fields.names().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn display_list_value() {
        let v = FieldValue::from(vec![0.0, 1.5]);
        assert_eq!(v.to_string(), "[0, 1.5]");
    }

    #[test]
    fn serializes_as_plain_map() {
        let fields = Fields::new().with("value", 1.0).with("ok", true);
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"value":1.0,"ok":true}"#);
    }

    #[test]
    fn non_finite_floats_survive_json() {
        let fields = Fields::new()
            .with("EEtr", f64::INFINITY)
            .with("floor", f64::NEG_INFINITY)
            .with("mode", "taxi");
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"EEtr":"inf","floor":"-inf","mode":"taxi"}"#);

        let back: Fields = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fields);
        let nan: Fields = serde_json::from_str(r#"{"x":"nan"}"#).unwrap();
        assert!(nan.get_f64("x", "x").unwrap().is_nan());
    }

    #[test]
    fn integers_and_floats_keep_their_variant() {
        let back: Fields = serde_json::from_str(r#"{"n":3,"v":3.0}"#).unwrap();
        assert_eq!(back.get("n"), Some(&FieldValue::Integer(3)));
        assert_eq!(back.get("v"), Some(&FieldValue::Float(3.0)));
    }
}
