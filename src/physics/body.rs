//! Body handles and their physical description

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Engine-assigned body identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Collision geometry of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BodyShape {
    Circle { radius: f32 },
    Rectangle { width: f32, height: f32 },
}

/// Free-form physical properties forwarded to the engine untouched
/// (`friction`, `restitution`, `isStatic`, render hints, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyProperties(pub Map<String, Value>);

impl BodyProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric property, if present and numeric
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.0.get(key).and_then(Value::as_f64).map(|v| v as f32)
    }

    /// Static bodies are never moved by the integrator
    pub fn is_static(&self) -> bool {
        self.0.get("isStatic").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Velocity damping per step (0 = none)
    pub fn friction_air(&self) -> f32 {
        self.get_f32("frictionAir").unwrap_or(0.0).clamp(0.0, 1.0)
    }

    /// Fill keys missing from `self` with values from `defaults`
    pub fn merge_defaults(&mut self, defaults: &BodyProperties) {
        for (key, value) in &defaults.0 {
            self.0.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

/// A physical object as the engine sees it
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// `None` when construction did not produce an engine identity
    pub id: Option<BodyId>,
    pub shape: BodyShape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub properties: BodyProperties,
}

impl Body {
    pub fn new(id: Option<BodyId>, shape: BodyShape, position: Vec2, properties: BodyProperties) -> Self {
        Self {
            id,
            shape,
            position,
            velocity: Vec2::ZERO,
            properties,
        }
    }
}

/// Shared handle to a body
///
/// Clones refer to the same body; the engine, the variable table and the
/// caller all observe the same position as the simulation advances.
#[derive(Debug, Clone)]
pub struct BodyHandle(Rc<RefCell<Body>>);

impl BodyHandle {
    pub fn new(body: Body) -> Self {
        Self(Rc::new(RefCell::new(body)))
    }

    /// Engine identity, if construction succeeded
    pub fn id(&self) -> Option<BodyId> {
        self.0.borrow().id
    }

    pub fn shape(&self) -> BodyShape {
        self.0.borrow().shape
    }

    pub fn position(&self) -> Vec2 {
        self.0.borrow().position
    }

    pub fn velocity(&self) -> Vec2 {
        self.0.borrow().velocity
    }

    pub fn body(&self) -> Ref<'_, Body> {
        self.0.borrow()
    }

    pub fn update(&self, f: impl FnOnce(&mut Body)) {
        f(&mut *self.0.borrow_mut());
    }

    /// True if both handles refer to the same body
    pub fn same_body(&self, other: &BodyHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn snapshot(&self) -> BodySnapshot {
        let body = self.0.borrow();
        BodySnapshot {
            id: body.id,
            shape: body.shape,
            position: body.position,
            properties: body.properties.clone(),
        }
    }
}

/// Serializable view of a body for an external renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub id: Option<BodyId>,
    pub shape: BodyShape,
    pub position: Vec2,
    pub properties: BodyProperties,
}
