use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// In-schema custom type override.
pub const TYPE_ANNOTATION: &str = "x-mcpgen-type";
/// Marks a property as tri-state (absent / null / value).
pub const OMITTABLE_ANNOTATION: &str = "x-mcpgen-omittable";
/// Prefix of references into the document's `components.schemas` table.
pub const LOCAL_REF_PREFIX: &str = "#/components/schemas/";

/// `type` is either a single name or a list of names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// A JSON Schema node.
///
/// Keywords the generator does not interpret (`minimum`, `default`, `examples`, extensions...)
/// are kept in [`Schema::extra`] in document order so embedded copies stay faithful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(rename = "anyOf", default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(rename = "oneOf", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(rename = "allOf", default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(
        rename = "patternProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pattern_properties: Option<IndexMap<String, Schema>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    DateTime,
    Integer,
    Number,
    Boolean,
}

/// What a schema node declares, with the nullability idioms already unwrapped.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// `$ref` to another schema.
    Reference(String),
    /// `T or null`: a two-branch union with one null branch, or a `type` list with `null`.
    Nullable(Box<Schema>),
    /// Any other union. `nullable` is set when one of the branches is null.
    Union { nullable: bool },
    /// String enum; values in declaration order.
    Enum(Vec<String>),
    Array(Option<Box<Schema>>),
    /// Object with properties or a title: becomes a named record.
    Object,
    /// Object whose only shape is an `additionalProperties` schema.
    Map(Box<Schema>),
    /// Object with no declared shape.
    OpenObject,
    Primitive(Primitive),
    Null,
    /// No type information at all.
    Dynamic,
}

impl Schema {
    pub fn with_type(name: &str) -> Self {
        Schema {
            schema_type: Some(SchemaType::Single(name.to_string())),
            ..Default::default()
        }
    }

    pub fn reference_to(reference: impl Into<String>) -> Self {
        Schema {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }

    /// Declared type names, in order.
    pub fn type_names(&self) -> Vec<&str> {
        match &self.schema_type {
            Some(SchemaType::Single(t)) => vec![t.as_str()],
            Some(SchemaType::Multiple(ts)) => ts.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    fn is_null_marker(&self) -> bool {
        self.type_names() == ["null"] && self.reference.is_none()
    }

    pub fn has_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }

    /// Value of the custom type annotation, if any.
    pub fn type_override(&self) -> Option<&str> {
        self.extra
            .get(TYPE_ANNOTATION)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_omittable(&self) -> bool {
        self.extra
            .get(OMITTABLE_ANNOTATION)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Remove every `x-` extension key, recursively.
    pub fn strip_extensions(&mut self) {
        self.extra.retain(|k, _| !k.starts_with("x-"));
        self.for_each_child_mut(Schema::strip_extensions);
    }

    pub(crate) fn for_each_child_mut(&mut self, mut f: impl FnMut(&mut Schema)) {
        if let Some(props) = &mut self.properties {
            props.values_mut().for_each(&mut f);
        }
        if let Some(items) = &mut self.items {
            f(items);
        }
        for branches in [&mut self.any_of, &mut self.one_of, &mut self.all_of]
            .into_iter()
            .flatten()
        {
            branches.iter_mut().for_each(&mut f);
        }
        if let Some(not) = &mut self.not {
            f(not);
        }
        if let Some(AdditionalProperties::Schema(s)) = &mut self.additional_properties {
            f(s);
        }
        if let Some(pattern) = &mut self.pattern_properties {
            pattern.values_mut().for_each(&mut f);
        }
    }

    /// Classify this node.
    pub fn kind(&self) -> SchemaKind {
        if let Some(reference) = &self.reference {
            return SchemaKind::Reference(reference.clone());
        }

        for branches in [&self.any_of, &self.one_of].into_iter().flatten() {
            if branches.is_empty() {
                continue;
            }
            let nulls = branches.iter().filter(|b| b.is_null_marker()).count();
            let non_null: Vec<&Schema> = branches.iter().filter(|b| !b.is_null_marker()).collect();
            if branches.len() == 2 && nulls == 1 {
                return SchemaKind::Nullable(Box::new(non_null[0].clone()));
            }
            if non_null.len() == 1 && nulls == 0 {
                return non_null[0].kind();
            }
            return SchemaKind::Union { nullable: nulls > 0 };
        }

        if let Some(all) = &self.all_of {
            match all.as_slice() {
                [] => {}
                [only] => return only.kind(),
                _ => return SchemaKind::Dynamic,
            }
        }

        let types = self.type_names();
        if types.len() > 1 {
            let non_null: Vec<&str> = types.iter().copied().filter(|t| *t != "null").collect();
            let nullable = non_null.len() < types.len();
            return match non_null.as_slice() {
                [] => SchemaKind::Null,
                [only] if nullable => {
                    let mut inner = self.clone();
                    inner.schema_type = Some(SchemaType::Single((*only).to_string()));
                    SchemaKind::Nullable(Box::new(inner))
                }
                [only] => {
                    let mut inner = self.clone();
                    inner.schema_type = Some(SchemaType::Single((*only).to_string()));
                    inner.kind()
                }
                _ => SchemaKind::Union { nullable },
            };
        }

        let declared = types.first().copied();
        if let Some(values) = &self.enum_values {
            let strings: Option<Vec<String>> = values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect();
            match (declared, strings) {
                (Some("string") | None, Some(strings)) if !strings.is_empty() => {
                    return SchemaKind::Enum(strings)
                }
                (None, _) => return SchemaKind::Dynamic,
                // Non-string enums keep their primitive base type.
                _ => {}
            }
        }

        match declared {
            Some("string") if self.format.as_deref() == Some("date-time") => {
                SchemaKind::Primitive(Primitive::DateTime)
            }
            Some("string") => SchemaKind::Primitive(Primitive::String),
            Some("integer") => SchemaKind::Primitive(Primitive::Integer),
            Some("number") => SchemaKind::Primitive(Primitive::Number),
            Some("boolean") => SchemaKind::Primitive(Primitive::Boolean),
            Some("null") => SchemaKind::Null,
            Some("array") => SchemaKind::Array(self.items.clone()),
            // A title alone still makes a record.
            Some("object") | None if self.has_properties() || self.title.is_some() => {
                SchemaKind::Object
            }
            Some("object") => match &self.additional_properties {
                Some(AdditionalProperties::Schema(s)) => SchemaKind::Map(s.clone()),
                _ => SchemaKind::OpenObject,
            },
            _ if self.items.is_some() => SchemaKind::Array(self.items.clone()),
            _ => SchemaKind::Dynamic,
        }
    }
}
