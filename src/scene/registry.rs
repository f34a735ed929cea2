//! Shape factory registry
//!
//! A shape factory is two-stage: `build` binds shape options and returns a
//! placement, and the placement constructs a body at `(x, y, index)`.
//!
//! Resolution order for a shape name:
//! 1. The scene's own `shapeOverrides`
//! 2. Factories registered on the registry (built-ins included)
//! 3. The `unknown` factory, which behaves like `circle`
//!
//! Resolution never fails.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::description::ShapeOptions;
use crate::consts::*;
use crate::physics::{BodyBuilder, BodyHandle};

/// Constructs a body at `(x, y)`; `index` is the batch index or `-1`
pub type Placement<'a> = Box<dyn FnOnce(f32, f32, i32) -> BodyHandle + 'a>;

/// A named way of turning shape options into bodies
pub trait ShapeFactory {
    fn build<'a>(&'a self, ctx: &'a dyn BodyBuilder, options: &'a ShapeOptions) -> Placement<'a>;
}

/// Radius rule shared by `circle` and `unknown`: half the width, else the
/// radius, else the default
pub fn circle_radius(options: &ShapeOptions) -> f32 {
    options
        .width()
        .map(|w| w / 2.0)
        .or(options.radius())
        .unwrap_or(DEFAULT_CIRCLE_RADIUS)
}

/// Rectangle size: given width and height, each defaulting independently
pub fn rectangle_size(options: &ShapeOptions) -> (f32, f32) {
    (
        options.width().unwrap_or(DEFAULT_RECTANGLE_SIZE),
        options.height().unwrap_or(DEFAULT_RECTANGLE_SIZE),
    )
}

/// Factories that ship with the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinShape {
    Circle,
    Rectangle,
    /// Fallback for unrecognised names; sized like a circle
    Unknown,
}

impl BuiltinShape {
    pub const ALL: [BuiltinShape; 3] = [Self::Circle, Self::Rectangle, Self::Unknown];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinShape::Circle => "circle",
            BuiltinShape::Rectangle => "rectangle",
            BuiltinShape::Unknown => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Construct a body of this kind immediately
    pub fn place(&self, ctx: &dyn BodyBuilder, options: &ShapeOptions, x: f32, y: f32) -> BodyHandle {
        let position = Vec2::new(x, y);
        match self {
            BuiltinShape::Circle | BuiltinShape::Unknown => {
                ctx.circle(position, circle_radius(options), &options.properties)
            }
            BuiltinShape::Rectangle => {
                let (width, height) = rectangle_size(options);
                ctx.rectangle(position, width, height, &options.properties)
            }
        }
    }
}

impl ShapeFactory for BuiltinShape {
    fn build<'a>(&'a self, ctx: &'a dyn BodyBuilder, options: &'a ShapeOptions) -> Placement<'a> {
        let kind = *self;
        Box::new(move |x: f32, y: f32, _index: i32| kind.place(ctx, options, x, y))
    }
}

/// Data-declared override: a built-in base shape with default options
///
/// Decoded from `shapeOverrides` entries such as
/// `{ "base": "circle", "radius": 8, "restitution": 0.9 }`. Options on the
/// body win over the template's defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemplateFactory {
    pub base: Option<String>,
    #[serde(flatten)]
    pub defaults: ShapeOptions,
}

impl TemplateFactory {
    pub fn new(base: BuiltinShape, defaults: ShapeOptions) -> Self {
        Self {
            base: Some(base.name().to_string()),
            defaults,
        }
    }

    /// Base shape; unknown or missing names fall back to `unknown`
    pub fn base_shape(&self) -> BuiltinShape {
        self.base
            .as_deref()
            .and_then(BuiltinShape::from_name)
            .unwrap_or(BuiltinShape::Unknown)
    }
}

impl ShapeFactory for TemplateFactory {
    fn build<'a>(&'a self, ctx: &'a dyn BodyBuilder, options: &'a ShapeOptions) -> Placement<'a> {
        let kind = self.base_shape();
        let merged = options.with_defaults(&self.defaults);
        Box::new(move |x: f32, y: f32, _index: i32| kind.place(ctx, &merged, x, y))
    }
}

/// Closure-backed factory for overrides supplied from Rust
pub struct FnFactory<F>(F);

impl<F> ShapeFactory for FnFactory<F>
where
    F: Fn(&dyn BodyBuilder, &ShapeOptions, f32, f32, i32) -> BodyHandle,
{
    fn build<'a>(&'a self, ctx: &'a dyn BodyBuilder, options: &'a ShapeOptions) -> Placement<'a> {
        Box::new(move |x: f32, y: f32, index: i32| (self.0)(ctx, options, x, y, index))
    }
}

type FactoryMap = HashMap<String, Rc<dyn ShapeFactory>>;

/// Per-scene shape table, consulted before the registry
#[derive(Clone, Default)]
pub struct ShapeOverrides {
    factories: FactoryMap,
}

impl ShapeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, factory: impl ShapeFactory + 'static) {
        self.factories.insert(name.into(), Rc::new(factory));
    }

    pub fn insert_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&dyn BodyBuilder, &ShapeOptions, f32, f32, i32) -> BodyHandle + 'static,
    {
        self.insert(name, FnFactory(f));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ShapeFactory> {
        self.factories.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ShapeOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ShapeOverrides").field("shapes", &names).finish()
    }
}

impl<'de> Deserialize<'de> for ShapeOverrides {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, Value>::deserialize(deserializer)?;
        let mut overrides = ShapeOverrides::new();
        for (name, value) in raw {
            match serde_json::from_value::<TemplateFactory>(value) {
                Ok(template) => overrides.insert(name, template),
                Err(e) => log::warn!("Ignoring shape override '{}': {}", name, e),
            }
        }
        Ok(overrides)
    }
}

/// Global shape table
pub struct ShapeRegistry {
    factories: FactoryMap,
}

static UNKNOWN: BuiltinShape = BuiltinShape::Unknown;

impl ShapeRegistry {
    /// Registry holding only the built-in shapes
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        for shape in BuiltinShape::ALL {
            registry.register(shape.name(), shape);
        }
        registry
    }

    /// Add or replace a global factory
    pub fn register(&mut self, name: impl Into<String>, factory: impl ShapeFactory + 'static) {
        self.factories.insert(name.into(), Rc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Pick the factory for `name`; always returns one
    pub fn resolve<'a>(
        &'a self,
        overrides: Option<&'a ShapeOverrides>,
        name: &str,
    ) -> &'a dyn ShapeFactory {
        if let Some(factory) = overrides.and_then(|o| o.get(name)) {
            return factory;
        }
        if let Some(factory) = self.factories.get(name) {
            return factory.as_ref();
        }
        log::trace!("Shape '{}' not registered, using unknown", name);
        self.factories
            .get(BuiltinShape::Unknown.name())
            .map(|f| f.as_ref())
            .unwrap_or(&UNKNOWN)
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ShapeRegistry").field("shapes", &names).finish()
    }
}
