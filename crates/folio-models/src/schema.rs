use std::collections::BTreeMap;

use folio_store::Value;

/// Declare a lazily built, process-wide schema.
///
/// ```ignore
/// fn schema() -> &'static Schema {
///     static_schema!("User", pk = "id", { "id": FieldType::Text, "name": FieldType::Text })
/// }
/// ```
macro_rules! static_schema {
    ($name:literal, pk = $pk:literal, { $($field:literal : $ty:expr),+ $(,)? }) => {{
        static SCHEMA: std::sync::OnceLock<folio_store::Schema> = std::sync::OnceLock::new();
        SCHEMA.get_or_init(|| {
            folio_store::Schema::builder($name)
                $(.field($field, $ty))+
                .primary_key($pk)
                .build()
                .expect(concat!("schema ", $name, " is well formed"))
        })
    }};
}

pub(crate) use static_schema;

/// A string-keyed map as a structured field value.
pub(crate) fn map_value<V>(map: &BTreeMap<String, V>) -> Value
where
    V: Clone + Into<serde_json::Value>,
{
    Value::Structured(serde_json::Value::Object(
        map.iter().map(|(k, v)| (k.clone(), v.clone().into())).collect(),
    ))
}
