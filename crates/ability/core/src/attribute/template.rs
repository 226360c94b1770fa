use super::formula::Formula;
use crate::ids::AttributeId;

/// Authored description of one attribute.
///
/// Only child edges are authored; parents are derived when the schema is built.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeTemplate {
    pub id: AttributeId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial_value: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub min: i32,
    #[cfg_attr(feature = "serde", serde(default = "default_max"))]
    pub max: i32,
    /// Clamp the final value into `[min, max]`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub clamp: bool,
    /// Present for depletable pools (health, mana, ...).
    #[cfg_attr(feature = "serde", serde(default))]
    pub resource: Option<ResourceSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<ChildEdge>,
    /// Non-propagating lookups used by formulas that read another attribute's bounds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub dependencies: Vec<AttributeId>,
}

#[cfg(feature = "serde")]
fn default_max() -> i32 {
    i32::MAX
}

impl AttributeTemplate {
    pub fn new(id: AttributeId, name: impl Into<String>, initial_value: i32) -> Self {
        Self {
            id,
            name: name.into(),
            initial_value,
            min: 0,
            max: i32::MAX,
            clamp: false,
            resource: None,
            children: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Marks this attribute as a resource pool.
    #[must_use]
    pub fn resource(mut self, spec: ResourceSpec) -> Self {
        self.resource = Some(spec);
        self
    }

    #[must_use]
    pub fn clamped(mut self, min: i32, max: i32) -> Self {
        self.min = min;
        self.max = max;
        self.clamp = true;
        self
    }

    #[must_use]
    pub fn child(mut self, child: AttributeId, formula: Formula) -> Self {
        self.children.push(ChildEdge { child, formula });
        self
    }

    #[must_use]
    pub fn dependency(mut self, dependency: AttributeId) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn is_resource(&self) -> bool {
        self.resource.is_some()
    }
}

/// Child edge: `child`'s final value feeds this attribute's modifier through `formula`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChildEdge {
    pub child: AttributeId,
    pub formula: Formula,
}

/// Resource pool behaviour.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceSpec {
    /// Points restored per second of simulated time.
    #[cfg_attr(feature = "serde", serde(default))]
    pub regen_per_second: f32,
    /// Start with `current == final` instead of empty.
    #[cfg_attr(feature = "serde", serde(default = "default_starts_full"))]
    pub starts_full: bool,
}

#[cfg(feature = "serde")]
fn default_starts_full() -> bool {
    true
}

impl ResourceSpec {
    pub const FULL: Self = Self {
        regen_per_second: 0.0,
        starts_full: true,
    };

    pub const fn regenerating(regen_per_second: f32) -> Self {
        Self {
            regen_per_second,
            starts_full: true,
        }
    }
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self::FULL
    }
}
