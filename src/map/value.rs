use std::collections::BTreeMap;
use std::fmt;

use anyhow::anyhow;

use crate::core::Result;
use crate::map::FlexMap;

/// A self-describing tree value stored inside a [`FlexMap`].
///
/// Mappings come in two shapes: [`Value::Map`] is a plain `BTreeMap` without
/// any special behavior, [`Value::Flex`] is a vivifying [`FlexMap`]. Every
/// insertion path of `FlexMap` coerces direct `Map` values into `Flex`;
/// mappings nested inside a [`Value::List`] are left plain.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Flex(FlexMap),
}

impl Value {
    /// Returns a short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Flex(_) => "flex map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for both mapping shapes, plain and vivifying.
    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Flex(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_flex(&self) -> Option<&FlexMap> {
        match self {
            Value::Flex(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_flex_mut(&mut self) -> Option<&mut FlexMap> {
        match self {
            Value::Flex(map) => Some(map),
            _ => None,
        }
    }

    /// Attribute-style read through a value.
    ///
    /// Delegates to [`FlexMap::attr`] when the value is a vivifying mapping,
    /// so chains like `m.attr("a")?.attr("b")?` compose. Any other variant
    /// returns an error.
    pub fn attr(&mut self, name: &str) -> Result<&mut Value> {
        match self {
            Value::Flex(map) => map.attr(name),
            other => Err(anyhow!(
                "cannot read attribute `{name}`: {} is not a mapping",
                other.kind()
            )),
        }
    }

    /// Attribute-style write through a value. See [`FlexMap::set_attr`].
    pub fn set_attr<V: Into<Value>>(&mut self, name: &str, value: V) -> Result<()> {
        match self {
            Value::Flex(map) => map.set_attr(name, value),
            other => Err(anyhow!(
                "cannot set attribute `{name}`: {} is not a mapping",
                other.kind()
            )),
        }
    }

    /// Attribute-style delete through a value. See [`FlexMap::del_attr`].
    pub fn del_attr(&mut self, name: &str) -> Result<Value> {
        match self {
            Value::Flex(map) => map.del_attr(name),
            other => Err(anyhow!(
                "cannot delete attribute `{name}`: {} is not a mapping",
                other.kind()
            )),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<FlexMap> for Value {
    fn from(map: FlexMap) -> Self {
        Value::Flex(map)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Flex(map) => write!(f, "{map}"),
        }
    }
}
