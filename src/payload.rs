// 📥 Raw Payloads - what the two extraction pipelines hand us
//
// Field names match the pipelines' JSON exactly. Every field is optional and
// every field is coerced leniently: a wrong JSON type degrades to "absent"
// instead of failing the whole payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// PNID PAYLOAD
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPnidPayload {
    #[serde(default, deserialize_with = "lenient::records")]
    pub equipment: Vec<RawEquipment>,

    #[serde(default, deserialize_with = "lenient::records")]
    pub instruments: Vec<RawInstrument>,

    #[serde(default, deserialize_with = "lenient::records")]
    pub lines: Vec<RawLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEquipment {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInstrument {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub instrument_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Nominal size in inches, when the pipeline already resolved it
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub size_in: Option<f64>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    /// Piping spec ("CS-40-150"), used when material is missing
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    #[serde(rename = "type", default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

// ============================================================================
// ISO PAYLOAD
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIsoPayload {
    #[serde(default, deserialize_with = "lenient::records")]
    pub rows: Vec<RawIsoRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIsoRow {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    /// Line this row was drawn for; a candidate key into the PNID lines
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub line_number: Option<String>,
}

// ============================================================================
// CONSTRUCTION FROM ARBITRARY JSON
// ============================================================================

impl RawPnidPayload {
    /// Best-effort read of any JSON value; non-objects give an empty payload
    pub fn from_value(value: &Value) -> Self {
        from_value_or_default(value, "PNID")
    }
}

impl RawIsoPayload {
    /// Best-effort read of any JSON value; non-objects give an empty payload
    pub fn from_value(value: &Value) -> Self {
        from_value_or_default(value, "ISO")
    }
}

fn from_value_or_default<T>(value: &Value, label: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    if !value.is_object() {
        if !value.is_null() {
            tracing::warn!(payload = label, "payload is not a JSON object, treating as empty");
        }
        return T::default();
    }

    serde_json::from_value(value.clone()).unwrap_or_else(|err| {
        tracing::warn!(payload = label, error = %err, "unreadable payload, treating as empty");
        T::default()
    })
}

// ============================================================================
// LENIENT FIELD COERCION
// ============================================================================

mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings pass through, numbers are stringified, anything else is absent
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Numbers and numeric strings; anything else is absent
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        })
    }

    /// An array of records. A non-array is an empty sequence; a non-object
    /// item becomes a record with every field absent.
    pub fn records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        let items = match value {
            Value::Array(items) => items,
            Value::Null => return Ok(Vec::new()),
            other => {
                tracing::warn!(kind = json_kind(&other), "expected an array of records");
                return Ok(Vec::new());
            }
        };

        Ok(items
            .into_iter()
            .map(|item| {
                if item.is_object() {
                    serde_json::from_value(item).unwrap_or_default()
                } else {
                    T::default()
                }
            })
            .collect())
    }

    fn json_kind(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
