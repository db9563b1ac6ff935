//! # Component Templates
//!
//! Registry of component definitions loaded from a JSON document:
//!
//! ```json
//! { "components": [
//!     { "type": 1, "name": "StaticModel", "id": "static-model", "category": "Models",
//!       "description": "...",
//!       "properties": [ { "name": "Position", "type": "vec3", "value": [0, 0, 0] } ] }
//! ] }
//! ```
//!
//! A property's key is its index in `properties`. Recognised property types are
//! `bool`, `int`, `float`, `string`, `vec2`, `vec3`, `vec4` and `stringMap`; a
//! `stringMap` value is an object of `name -> { "type", "value" }`.
//!
//! Templates are configuration, not wire protocol: unknown or malformed entries are
//! skipped with a warning unless [`TemplateConfig::strict`] is set.

use crate::config::TemplateConfig;
use crate::core::keys::{ComponentId, ComponentType, PropertyKey};
use crate::error::{ReplicationError, Result};
use crate::store::PropertyStore;
use crate::value::{ReplicatedValue, StringMap, Vector2, Vector3, Vector4};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Default value and name of one templated property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTemplate {
    pub key: PropertyKey,
    pub name: String,
    pub default: ReplicatedValue,
}

/// One component definition
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTemplate {
    pub component_type: ComponentType,
    pub name: String,
    pub id: String,
    pub category: String,
    pub description: String,
    pub properties: Vec<PropertyTemplate>,
}

impl ComponentTemplate {
    /// Key of the property called `name`
    pub fn key_of(&self, name: &str) -> Option<PropertyKey> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| property.key)
    }
}

/// All known component definitions, keyed by component type
#[derive(Debug, Clone, Default)]
pub struct ComponentTemplates {
    templates: BTreeMap<ComponentType, ComponentTemplate>,
}

/// Either logs and skips, or fails when strict
struct Skipper {
    strict: bool,
}

impl Skipper {
    fn skip(&self, message: String) -> Result<()> {
        if self.strict {
            Err(ReplicationError::TemplateError(message))
        } else {
            warn!(reason = %message, "Skipping template entry");
            Ok(())
        }
    }
}

impl ComponentTemplates {
    /// Parse a template document with lenient defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        Self::from_json_with_config(content, &TemplateConfig::default())
    }

    /// Load and parse a template document from disk.
    pub fn from_file<P: AsRef<Path>>(path: P, config: &TemplateConfig) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ReplicationError::TemplateError(format!(
                "Failed to read template file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json_with_config(&content, config)
    }

    /// Load the document named by [`TemplateConfig::path`]. With no path
    /// configured the registry is empty.
    pub fn from_config(config: &TemplateConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::from_file(path, config),
            None => Ok(Self::default()),
        }
    }

    /// Parse a template document.
    ///
    /// # Errors
    /// `TemplateError` if the document is not JSON or lacks a `components` array,
    /// or (in strict mode) if any entry would have been skipped.
    pub fn from_json_with_config(content: &str, config: &TemplateConfig) -> Result<Self> {
        let root: Value = serde_json::from_str(content)
            .map_err(|e| ReplicationError::TemplateError(format!("Invalid JSON: {e}")))?;

        let components = root
            .get("components")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ReplicationError::TemplateError("Missing 'components' array".to_string())
            })?;

        let skipper = Skipper {
            strict: config.strict,
        };
        let mut templates = BTreeMap::new();

        for (index, component) in components.iter().enumerate() {
            let Some(template) = parse_component(component, index, &skipper)? else {
                continue;
            };
            if templates.contains_key(&template.component_type) {
                skipper.skip(format!(
                    "component #{index}: duplicate type {}",
                    template.component_type
                ))?;
                continue;
            }
            debug!(
                component_type = template.component_type.0,
                name = %template.name,
                properties = template.properties.len(),
                "Loaded component template"
            );
            templates.insert(template.component_type, template);
        }

        Ok(Self { templates })
    }

    pub fn get(&self, component_type: ComponentType) -> Option<&ComponentTemplate> {
        self.templates.get(&component_type)
    }

    pub fn by_name(&self, name: &str) -> Option<&ComponentTemplate> {
        self.templates.values().find(|template| template.name == name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentTemplate> {
        self.templates.values()
    }

    /// Build a store holding the template's full default property set.
    ///
    /// # Errors
    /// `TemplateError` if no template exists for `component_type`.
    pub fn instantiate(
        &self,
        component_type: ComponentType,
        component_id: ComponentId,
    ) -> Result<PropertyStore> {
        let template = self.get(component_type).ok_or_else(|| {
            ReplicationError::TemplateError(format!("No template for component type {component_type}"))
        })?;

        PropertyStore::new(
            component_id,
            component_type,
            template
                .properties
                .iter()
                .map(|property| (property.key, property.default.clone())),
        )
    }
}

fn string_field(object: &Map<String, Value>, field: &str) -> String {
    object
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_component(
    component: &Value,
    index: usize,
    skipper: &Skipper,
) -> Result<Option<ComponentTemplate>> {
    let Some(object) = component.as_object() else {
        skipper.skip(format!("component #{index}: not an object"))?;
        return Ok(None);
    };

    let Some(component_type) = object.get("type").and_then(Value::as_u64) else {
        skipper.skip(format!("component #{index}: missing or non-integer 'type'"))?;
        return Ok(None);
    };

    let name = string_field(object, "name");
    let mut properties = Vec::new();

    if let Some(entries) = object.get("properties").and_then(Value::as_array) {
        for (position, entry) in entries.iter().enumerate() {
            let Ok(key) = PropertyKey::try_from(position) else {
                skipper.skip(format!("component '{name}': too many properties"))?;
                break;
            };
            let context = format!("component '{name}' property #{position}");
            if let Some(property) = parse_property(entry, key, &context, skipper)? {
                properties.push(property);
            }
        }
    } else {
        skipper.skip(format!("component '{name}': missing 'properties' array"))?;
    }

    Ok(Some(ComponentTemplate {
        component_type: ComponentType(component_type),
        id: string_field(object, "id"),
        category: string_field(object, "category"),
        description: string_field(object, "description"),
        name,
        properties,
    }))
}

fn parse_property(
    entry: &Value,
    key: PropertyKey,
    context: &str,
    skipper: &Skipper,
) -> Result<Option<PropertyTemplate>> {
    let Some(name) = entry.get("name").and_then(Value::as_str) else {
        skipper.skip(format!("{context}: missing 'name'"))?;
        return Ok(None);
    };
    let Some(default) = parse_typed_value(entry, &format!("{context} '{name}'"), skipper)? else {
        return Ok(None);
    };

    Ok(Some(PropertyTemplate {
        key,
        name: name.to_string(),
        default,
    }))
}

/// Parse an object of the form `{ "type": ..., "value": ... }`.
fn parse_typed_value(
    entry: &Value,
    context: &str,
    skipper: &Skipper,
) -> Result<Option<ReplicatedValue>> {
    let Some(type_name) = entry.get("type").and_then(Value::as_str) else {
        skipper.skip(format!("{context}: missing 'type'"))?;
        return Ok(None);
    };
    let Some(value) = entry.get("value") else {
        skipper.skip(format!("{context}: missing 'value'"))?;
        return Ok(None);
    };

    let parsed = match type_name {
        "bool" => value.as_bool().map(ReplicatedValue::Bool),
        "int" => value.as_i64().map(ReplicatedValue::Integer),
        "float" => value.as_f64().map(|v| ReplicatedValue::Float(v as f32)),
        "string" => value.as_str().map(ReplicatedValue::from),
        "vec2" => float_components::<2>(value).map(|c| Vector2::from(c).into()),
        "vec3" => float_components::<3>(value).map(|c| Vector3::from(c).into()),
        "vec4" => float_components::<4>(value).map(|c| Vector4::from(c).into()),
        "stringMap" => match value.as_object() {
            Some(object) => {
                let mut map = StringMap::new();
                for (entry_name, entry_value) in object {
                    let entry_context = format!("{context}.{entry_name}");
                    if let Some(parsed) = parse_typed_value(entry_value, &entry_context, skipper)? {
                        map.insert(entry_name.clone(), parsed);
                    }
                }
                Some(ReplicatedValue::StringMap(map))
            }
            None => None,
        },
        unknown => {
            skipper.skip(format!("{context}: unknown type '{unknown}'"))?;
            return Ok(None);
        }
    };

    if parsed.is_none() {
        skipper.skip(format!("{context}: value does not match type '{type_name}'"))?;
    }
    Ok(parsed)
}

fn float_components<const N: usize>(value: &Value) -> Option<[f32; N]> {
    let items = value.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut components = [0.0_f32; N];
    for (slot, item) in components.iter_mut().zip(items) {
        *slot = item.as_f64()? as f32;
    }
    Some(components)
}
