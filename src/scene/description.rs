//! Scene description data model
//!
//! Decoded from the JSON a scene compiler produces. Decoding is permissive:
//! only `shape` and `position` have to be well typed. Entries where either is
//! unusable are kept as `Malformed` and dropped at load time instead of
//! failing the whole scene; every other field is taken as loosely as it can be.

use glam::Vec2;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::registry::ShapeOverrides;
use crate::error::Result;
use crate::physics::BodyProperties;

/// A complete scene: bounds, bodies, compiler diagnostics, per-scene shapes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDescription {
    #[serde(default)]
    pub world: Option<WorldSize>,
    #[serde(default)]
    pub bodies: Option<Vec<BodyEntry>>,
    #[serde(default)]
    pub errors: Option<Vec<ErrorRecord>>,
    #[serde(default)]
    pub shape_overrides: Option<ShapeOverrides>,
}

impl SceneDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_world(mut self, width: f32, height: f32) -> Self {
        self.world = Some(WorldSize {
            width: Some(width),
            height: Some(height),
        });
        self
    }

    /// Append a body; turns a missing body list into a present one
    pub fn with_body(mut self, spec: BodySpec) -> Self {
        self.bodies
            .get_or_insert_with(Vec::new)
            .push(BodyEntry::Spec(spec));
        self
    }

    pub fn with_overrides(mut self, overrides: ShapeOverrides) -> Self {
        self.shape_overrides = Some(overrides);
        self
    }

    /// Compiler diagnostics (empty when absent)
    pub fn errors(&self) -> &[ErrorRecord] {
        self.errors.as_deref().unwrap_or(&[])
    }

    /// Scene-scoped shape overrides
    pub fn overrides(&self) -> Option<&ShapeOverrides> {
        self.shape_overrides.as_ref()
    }
}

/// World extent used to frame the camera
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldSize {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// One entry of the `bodies` list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BodyEntry {
    Spec(BodySpec),
    /// Entry whose shape or position is unusable; never loaded
    Malformed(Value),
}

impl BodyEntry {
    /// The spec, if it has everything needed to construct a body
    pub fn valid_spec(&self) -> Option<(&BodySpec, &str, Position)> {
        match self {
            BodyEntry::Spec(spec) => {
                let shape = spec.shape.as_deref().filter(|s| !s.is_empty())?;
                Some((spec, shape, spec.position?))
            }
            BodyEntry::Malformed(_) => None,
        }
    }
}

/// Placement of a body
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl From<Position> for Vec2 {
    fn from(p: Position) -> Self {
        Vec2::new(p.x, p.y)
    }
}

/// One body in a scene
///
/// Valid only when both `shape` and `position` are present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BodySpec {
    pub shape: Option<String>,
    pub position: Option<Position>,
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub options: ShapeOptions,
}

impl BodySpec {
    pub fn new(shape: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            shape: Some(shape.into()),
            position: Some(Position { x, y }),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_options(mut self, options: ShapeOptions) -> Self {
        self.options = options;
        self
    }
}

/// Variable name of a body, taken the way a script would use it as a key
///
/// Non-empty strings, non-zero numbers and `true` bind; anything else means
/// the body stays anonymous.
pub fn name_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            let v = n.as_f64()?;
            if v == 0.0 || v.is_nan() {
                None
            } else if v.fract() == 0.0 && v.abs() < 1e15 {
                Some(format!("{}", v as i64))
            } else {
                Some(n.to_string())
            }
        }
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(name_from_value(&Value::deserialize(deserializer)?))
}

/// Shape sizing plus pass-through physical properties
///
/// A zero size counts as absent, so it falls back to the shape default.
/// Sizes that are not numbers are left in `properties` untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeOptions {
    pub radius: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub properties: BodyProperties,
}

/// Take `key` out of `map` if it holds a number; drop it if null
fn take_size(map: &mut Map<String, Value>, key: &str) -> Option<f32> {
    match map.get(key) {
        Some(Value::Number(n)) => {
            let v = n.as_f64().map(|v| v as f32);
            map.remove(key);
            v
        }
        Some(Value::Null) => {
            map.remove(key);
            None
        }
        _ => None,
    }
}

impl<'de> Deserialize<'de> for ShapeOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(ShapeOptions {
            radius: take_size(&mut map, "radius"),
            width: take_size(&mut map, "width"),
            height: take_size(&mut map, "height"),
            properties: BodyProperties(map),
        })
    }
}

fn set(value: Option<f32>) -> Option<f32> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

impl ShapeOptions {
    pub fn radius(&self) -> Option<f32> {
        set(self.radius)
    }

    pub fn width(&self) -> Option<f32> {
        set(self.width)
    }

    pub fn height(&self) -> Option<f32> {
        set(self.height)
    }

    /// Fill unset sizes and properties from `defaults`
    pub fn with_defaults(&self, defaults: &ShapeOptions) -> ShapeOptions {
        let mut properties = self.properties.clone();
        properties.merge_defaults(&defaults.properties);
        ShapeOptions {
            radius: self.radius().or(defaults.radius()),
            width: self.width().or(defaults.width()),
            height: self.height().or(defaults.height()),
            properties,
        }
    }
}

/// A compiler diagnostic, kept opaque
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ErrorRecord(pub Value);

impl ErrorRecord {
    pub fn message(&self) -> Option<&str> {
        match &self.0 {
            Value::String(s) => Some(s),
            Value::Object(map) => map.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_scene() {
        let scene = SceneDescription::from_value(json!({
            "world": { "width": 800, "height": 400 },
            "bodies": [
                { "shape": "circle", "position": { "x": 10, "y": 20 }, "name": "ball",
                  "radius": 12, "restitution": 0.8, "render": { "fillStyle": "red" } }
            ],
            "errors": [ { "message": "unused variable" } ]
        }))
        .unwrap();

        assert_eq!(scene.world.unwrap().width, Some(800.0));
        let bodies = scene.bodies.as_ref().unwrap();
        let (spec, shape, position) = bodies[0].valid_spec().unwrap();
        assert_eq!(shape, "circle");
        assert_eq!(position, Position { x: 10.0, y: 20.0 });
        assert_eq!(spec.name.as_deref(), Some("ball"));
        assert_eq!(spec.options.radius(), Some(12.0));
        assert_eq!(spec.options.properties.get_f32("restitution"), Some(0.8));
        assert!(spec.options.properties.get("render").is_some());
        assert!(spec.options.properties.get("radius").is_none());
        assert!(spec.options.properties.get("shape").is_none());
        assert_eq!(scene.errors()[0].message(), Some("unused variable"));
    }

    #[test]
    fn test_wrong_types_become_malformed() {
        let scene = SceneDescription::from_value(json!({
            "bodies": [
                { "shape": "circle", "position": { "x": "left", "y": 0 } },
                42,
                { "shape": "circle", "position": { "x": 1, "y": 2 } }
            ]
        }))
        .unwrap();

        let bodies = scene.bodies.unwrap();
        assert!(matches!(bodies[0], BodyEntry::Malformed(_)));
        assert!(matches!(bodies[1], BodyEntry::Malformed(_)));
        assert!(bodies[2].valid_spec().is_some());
    }

    #[test]
    fn test_loose_options_and_names_keep_the_body() {
        let scene = SceneDescription::from_value(json!({
            "bodies": [
                { "shape": "circle", "position": { "x": 1, "y": 2 }, "name": "a", "radius": "10" },
                { "shape": "rectangle", "position": { "x": 1, "y": 2 }, "name": "b", "width": null },
                { "shape": "circle", "position": { "x": 1, "y": 2 }, "name": 7 },
                { "shape": "circle", "position": { "x": 1, "y": 2 }, "name": [1] }
            ]
        }))
        .unwrap();

        let bodies = scene.bodies.unwrap();
        let specs: Vec<_> = bodies.iter().map(|b| b.valid_spec().unwrap().0).collect();
        assert_eq!(specs[0].options.radius(), None);
        assert_eq!(specs[0].options.properties.get("radius"), Some(&json!("10")));
        assert_eq!(specs[1].options.width(), None);
        assert!(specs[1].options.properties.get("width").is_none());
        assert_eq!(specs[2].name.as_deref(), Some("7"));
        assert_eq!(specs[3].name, None);
    }

    #[test]
    fn test_name_truthiness() {
        assert_eq!(name_from_value(&json!("")), None);
        assert_eq!(name_from_value(&json!(0)), None);
        assert_eq!(name_from_value(&json!(false)), None);
        assert_eq!(name_from_value(&json!(null)), None);
        assert_eq!(name_from_value(&json!(2.5)).as_deref(), Some("2.5"));
        assert_eq!(name_from_value(&json!(3.0)).as_deref(), Some("3"));
        assert_eq!(name_from_value(&json!(true)).as_deref(), Some("true"));
    }

    #[test]
    fn test_numeric_sizes_leave_properties() {
        let options: ShapeOptions = serde_json::from_value(json!({ "width": 4, "friction": 0.2 })).unwrap();
        assert_eq!(options.width(), Some(4.0));
        assert_eq!(options.properties.get_f32("friction"), Some(0.2));
        assert!(options.properties.get("width").is_none());
    }

    #[test]
    fn test_missing_shape_or_position_is_invalid() {
        let scene = SceneDescription::from_value(json!({
            "bodies": [
                { "position": { "x": 1, "y": 2 } },
                { "shape": "circle" },
                { "shape": "", "position": { "x": 1, "y": 2 } }
            ]
        }))
        .unwrap();

        for entry in scene.bodies.unwrap() {
            assert!(entry.valid_spec().is_none());
        }
    }

    #[test]
    fn test_absent_and_null_sections() {
        let scene = SceneDescription::from_value(json!({ "world": null, "errors": null })).unwrap();
        assert!(scene.world.is_none());
        assert!(scene.bodies.is_none());
        assert!(scene.errors().is_empty());
        assert!(scene.overrides().is_none());
    }

    #[test]
    fn test_zero_sizes_count_as_absent() {
        let options = ShapeOptions {
            radius: Some(0.0),
            width: Some(0.0),
            height: Some(f32::NAN),
            ..Default::default()
        };
        assert_eq!(options.radius(), None);
        assert_eq!(options.width(), None);
        assert_eq!(options.height(), None);
    }

    #[test]
    fn test_with_defaults_prefers_own_values() {
        let own = ShapeOptions {
            radius: Some(5.0),
            ..Default::default()
        };
        let defaults = ShapeOptions {
            radius: Some(50.0),
            height: Some(30.0),
            ..Default::default()
        };
        let merged = own.with_defaults(&defaults);
        assert_eq!(merged.radius, Some(5.0));
        assert_eq!(merged.height, Some(30.0));
        assert_eq!(merged.width, None);
    }
}
