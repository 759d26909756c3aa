use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// ============================================================================
// Field descriptors produced by extraction
// ============================================================================

/// Kind of a fillable control. Unknown native input types are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Checkbox,
    Radio,
    Date,
    Time,
    Native(String),
}

impl FieldKind {
    /// Kind from tag name and browser-style input type. `select` and
    /// `textarea` tags win over whatever the type says.
    pub fn from_control(tag: &str, input_type: &str) -> Self {
        match tag {
            "select" => FieldKind::Select,
            "textarea" => FieldKind::Textarea,
            _ => FieldKind::from(input_type.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Radio => "radio",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::Native(t) => t,
        }
    }

    pub fn is_toggle(&self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Radio)
    }
}

impl From<String> for FieldKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => FieldKind::Text,
            "textarea" => FieldKind::Textarea,
            "select" => FieldKind::Select,
            "checkbox" => FieldKind::Checkbox,
            "radio" => FieldKind::Radio,
            "date" => FieldKind::Date,
            "time" => FieldKind::Time,
            _ => FieldKind::Native(s),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// Normalized description of one fillable control, as sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    pub tag_name: String,
    #[serde(default)]
    pub placeholder: String,
    pub current_value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_select2: bool,
}

// ============================================================================
// Fill instructions returned by the backend
// ============================================================================

/// Loosely-typed scalar the backend returns for a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FillValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

/// Tokens that mean "no information" rather than "clear this field".
pub const BLANK_TOKENS: &[&str] = &["", "null", "None"];

impl FillValue {
    /// Text to write, or `None` when the value carries no information.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            FillValue::Null => return None,
            FillValue::Bool(b) => b.to_string(),
            // `1.0` is written as `1`, like a browser would.
            FillValue::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() => f.to_string(),
                _ => n.to_string(),
            },
            FillValue::Text(s) => s.clone(),
        };
        (!is_blank(&text)).then_some(text)
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }

    fn to_json(&self) -> Value {
        match self {
            FillValue::Null => Value::Null,
            FillValue::Bool(b) => Value::Bool(*b),
            FillValue::Number(n) => Value::Number(n.clone()),
            FillValue::Text(s) => Value::String(s.clone()),
        }
    }
}

pub fn is_blank(text: &str) -> bool {
    BLANK_TOKENS.contains(&text)
}

impl From<Value> for FillValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FillValue::Null,
            Value::Bool(b) => FillValue::Bool(b),
            Value::Number(n) => FillValue::Number(n),
            Value::String(s) => FillValue::Text(s),
            other => FillValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for FillValue {
    fn from(s: &str) -> Self {
        FillValue::Text(s.to_string())
    }
}

impl From<String> for FillValue {
    fn from(s: String) -> Self {
        FillValue::Text(s)
    }
}

impl From<bool> for FillValue {
    fn from(b: bool) -> Self {
        FillValue::Bool(b)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillInstruction {
    pub field_id: String,
    pub value: FillValue,
}

/// Ordered field-id → value mapping. Order is the order the backend sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillMapping {
    entries: Vec<FillInstruction>,
}

impl FillMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FillValue>,
    {
        let mut mapping = Self::new();
        for (k, v) in pairs {
            mapping.insert(k, v);
        }
        mapping
    }

    /// Insert or replace; a replaced entry keeps its original position.
    pub fn insert(&mut self, field_id: impl Into<String>, value: impl Into<FillValue>) {
        let field_id = field_id.into();
        let value = value.into();
        match self.entries.iter_mut().find(|e| e.field_id == field_id) {
            Some(entry) => entry.value = value,
            None => self.entries.push(FillInstruction { field_id, value }),
        }
    }

    pub fn get(&self, field_id: &str) -> Option<&FillValue> {
        self.entries
            .iter()
            .find(|e| e.field_id == field_id)
            .map(|e| &e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FillInstruction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for FillMapping {
    type Item = FillInstruction;
    type IntoIter = std::vec::IntoIter<FillInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for FillMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|e| (e.field_id.clone(), e.value.to_json()))
            .collect();
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FillMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A backend reporting failure may send `null` instead of an object.
        let map = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(FillMapping::from_pairs(
            map.into_iter().map(|(k, v)| (k, FillValue::from(v))),
        ))
    }
}
