//! Property maps: attributes, style, class, and event bindings.
//!
//! Props are an insertion-ordered list of `(name, value)` pairs with
//! last-write-wins `set` semantics. The map is deliberately Vec-backed:
//! prop lists are small, order is observable (diffing walks them in
//! declaration order), and a linear scan beats a hash map at this size.
//!
//! Two entries are special-cased by the builder and never applied to the
//! render target: the node `key` and the lifecycle `hooks`, both of which
//! live as dedicated fields rather than named entries.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::vnode::{Done, Hooks, Key, NodeId};
use crate::{Value, fmt_num};

/// An ordered style map. Dash-prefixed names (`--accent`) are custom
/// properties and take the custom-property write path on the target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap {
    entries: Vec<(String, String)>,
}

impl StyleMap {
    /// Empty style map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a style property, replacing an existing entry in place.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
        self
    }

    /// Look up a style property.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// True when no property is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>, const LEN: usize> From<[(N, V); LEN]> for StyleMap {
    fn from(entries: [(N, V); LEN]) -> Self {
        entries
            .into_iter()
            .fold(StyleMap::new(), |m, (n, v)| m.set(n, v))
    }
}

/// A class specification: a plain name, a name→enabled toggle map, or a
/// nested list of specs. Normalizes to a space-joined class string.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassSpec {
    /// A literal class string (may contain several space-separated names).
    Name(String),
    /// Conditionally enabled names.
    Toggle(Vec<(String, bool)>),
    /// Nested specs, flattened in order.
    Many(Vec<ClassSpec>),
}

impl ClassSpec {
    /// Normalize to the class string applied to the target. Empty output
    /// means the class attribute is removed entirely.
    pub fn to_class_string(&self) -> String {
        let mut out = String::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut String) {
        match self {
            Self::Name(name) => {
                if !name.is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(name);
                }
            }
            Self::Toggle(entries) => {
                for (name, enabled) in entries {
                    if *enabled && !name.is_empty() {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(name);
                    }
                }
            }
            Self::Many(specs) => {
                for spec in specs {
                    spec.collect(out);
                }
            }
        }
    }
}

impl From<&str> for ClassSpec {
    fn from(s: &str) -> Self {
        Self::Name(s.to_owned())
    }
}

impl From<String> for ClassSpec {
    fn from(s: String) -> Self {
        Self::Name(s)
    }
}

/// One property value.
///
/// Handlers never compare equal: every render produces fresh action values,
/// and rebinding is an O(1) table swap on the target side, so "always
/// changed" is both correct and cheap.
#[derive(Clone)]
pub enum PropValue<A> {
    /// Explicit absence; patching to `Null` removes the attribute.
    Null,
    /// Boolean attribute; `false` removes it.
    Bool(bool),
    /// Numeric value, stringified for the attribute path.
    Num(f64),
    /// String value.
    Str(String),
    /// Style map; diffed per-property, never as a whole string.
    Style(StyleMap),
    /// Class specification; normalized to one class string.
    Class(ClassSpec),
    /// Event handler carrying an action for the dispatch loop.
    Handler(A),
}

impl<A> PropValue<A> {
    /// The attribute text this value writes, or `None` when it removes the
    /// attribute instead. Style and handler values never take the
    /// attribute path.
    pub fn attr_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::Bool(false) => None,
            Self::Bool(true) => Some(String::new()),
            Self::Num(n) => Some(fmt_num(*n)),
            Self::Str(s) => Some(s.clone()),
            Self::Class(spec) => {
                let s = spec.to_class_string();
                (!s.is_empty()).then_some(s)
            }
            Self::Style(_) | Self::Handler(_) => None,
        }
    }

    /// The value as a data value for the direct-property write path.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Null => Some(Value::Null),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::Num(n) => serde_json::Number::from_f64(*n).map(Value::Number),
            Self::Str(s) => Some(Value::String(s.clone())),
            Self::Class(spec) => Some(Value::String(spec.to_class_string())),
            Self::Style(_) | Self::Handler(_) => None,
        }
    }

    /// The style map of a `Style` value; empty for anything else.
    pub fn as_style(&self) -> Option<&StyleMap> {
        match self {
            Self::Style(map) => Some(map),
            _ => None,
        }
    }

    /// The action of a `Handler` value.
    pub fn as_handler(&self) -> Option<&A> {
        match self {
            Self::Handler(a) => Some(a),
            _ => None,
        }
    }
}

impl<A> PartialEq for PropValue<A> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Num(a), Self::Num(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Style(a), Self::Style(b)) => a == b,
            (Self::Class(a), Self::Class(b)) => a == b,
            // Handlers are opaque; treat every pair as changed.
            (Self::Handler(_), Self::Handler(_)) => false,
            _ => false,
        }
    }
}

impl<A> fmt::Debug for PropValue<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Num(n) => f.debug_tuple("Num").field(n).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Style(m) => f.debug_tuple("Style").field(m).finish(),
            Self::Class(c) => f.debug_tuple("Class").field(c).finish(),
            Self::Handler(_) => write!(f, "Handler(..)"),
        }
    }
}

impl<A> From<&str> for PropValue<A> {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl<A> From<String> for PropValue<A> {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl<A> From<bool> for PropValue<A> {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<A> From<f64> for PropValue<A> {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl<A> From<i32> for PropValue<A> {
    fn from(n: i32) -> Self {
        Self::Num(n.into())
    }
}

/// The property map of one element node.
///
/// Construction is builder-style and consuming, mirroring how a view
/// function declares props inline:
///
/// ```
/// use mosaic_core::{Props, StyleMap};
///
/// let props: Props<()> = Props::new()
///     .key("row-1")
///     .class("selected")
///     .style(StyleMap::from([("color", "red")]))
///     .set("id", "first");
/// assert!(props.get("id").is_some());
/// ```
pub struct Props<A> {
    entries: SmallVec<[(String, PropValue<A>); 8]>,
    key: Option<Key>,
    hooks: Option<Rc<Hooks>>,
}

impl<A> Default for Props<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Props<A> {
    /// Empty property map.
    pub fn new() -> Self {
        Self {
            entries: SmallVec::new(),
            key: None,
            hooks: None,
        }
    }

    /// Set a named property; replaces an existing entry in place so the
    /// declared order is stable under overwrite.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<PropValue<A>>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
        self
    }

    /// Set the stable identity key for this node.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Bind an action to an event type (`on("click", ...)` becomes the
    /// `onclick` property).
    pub fn on(self, event: &str, action: A) -> Self {
        let name = format!("on{event}");
        self.set(name, PropValue::Handler(action))
    }

    /// Set the class specification.
    pub fn class(self, spec: impl Into<ClassSpec>) -> Self {
        self.set("class", PropValue::Class(spec.into()))
    }

    /// Set the style map.
    pub fn style(self, map: impl Into<StyleMap>) -> Self {
        self.set("style", PropValue::Style(map.into()))
    }

    /// Attach an `oncreate` lifecycle hook.
    pub fn on_create(mut self, hook: impl Fn(NodeId) + 'static) -> Self {
        self.hooks_mut().on_create = Some(Rc::new(hook));
        self
    }

    /// Attach an `onupdate` lifecycle hook.
    pub fn on_update(mut self, hook: impl Fn(NodeId) + 'static) -> Self {
        self.hooks_mut().on_update = Some(Rc::new(hook));
        self
    }

    /// Attach an `onremove` hook; detachment waits for the `Done` token.
    pub fn on_remove(mut self, hook: impl Fn(NodeId, Done) + 'static) -> Self {
        self.hooks_mut().on_remove = Some(Rc::new(hook));
        self
    }

    /// Attach an `ondestroy` lifecycle hook.
    pub fn on_destroy(mut self, hook: impl Fn(NodeId) + 'static) -> Self {
        self.hooks_mut().on_destroy = Some(Rc::new(hook));
        self
    }

    fn hooks_mut(&mut self) -> &mut Hooks {
        let hooks = self.hooks.get_or_insert_with(|| Rc::new(Hooks::default()));
        // Props are built single-threaded before the node is shared, so the
        // Rc is still unique here.
        Rc::make_mut(hooks)
    }

    /// Look up a property by name.
    pub fn get(&self, name: &str) -> Option<&PropValue<A>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue<A>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Declared property names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// True when no named property is set (key and hooks do not count).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn key_ref(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub(crate) fn hooks_ref(&self) -> Option<&Rc<Hooks>> {
        self.hooks.as_ref()
    }
}

impl<A> fmt::Debug for Props<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(n, v)| (n, v)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type P = Props<()>;

    #[test]
    fn set_is_last_write_wins_in_place() {
        let p: P = Props::new().set("id", "a").set("title", "t").set("id", "b");
        assert!(matches!(p.get("id"), Some(PropValue::Str(s)) if s == "b"));
        let names: Vec<_> = p.names().collect();
        assert_eq!(names, vec!["id", "title"]);
    }

    #[test]
    fn on_binds_lowercase_prefixed_handler() {
        let p: P = Props::new().on("click", ());
        assert!(p.get("onclick").is_some_and(|v| v.as_handler().is_some()));
    }

    #[test]
    fn class_spec_normalization() {
        let spec = ClassSpec::Many(vec![
            ClassSpec::Name("a".into()),
            ClassSpec::Toggle(vec![("b".into(), true), ("c".into(), false)]),
            ClassSpec::Name(String::new()),
        ]);
        assert_eq!(spec.to_class_string(), "a b");
    }

    #[test]
    fn empty_class_spec_normalizes_to_empty_string() {
        let spec = ClassSpec::Toggle(vec![("x".into(), false)]);
        assert_eq!(spec.to_class_string(), "");
        let v: PropValue<()> = PropValue::Class(spec);
        assert!(v.attr_text().is_none(), "empty class removes the attribute");
    }

    #[test]
    fn style_map_set_replaces_in_place() {
        let m = StyleMap::from([("color", "red"), ("width", "1px")]).set("color", "blue");
        assert_eq!(m.get("color"), Some("blue"));
        let order: Vec<_> = m.iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["color", "width"]);
    }

    #[test]
    fn attr_text_rules() {
        assert_eq!(PropValue::<()>::Str("x".into()).attr_text().as_deref(), Some("x"));
        assert_eq!(PropValue::<()>::Bool(true).attr_text().as_deref(), Some(""));
        assert!(PropValue::<()>::Bool(false).attr_text().is_none());
        assert!(PropValue::<()>::Null.attr_text().is_none());
        assert_eq!(PropValue::<()>::Num(3.0).attr_text().as_deref(), Some("3"));
        assert_eq!(PropValue::<()>::Num(3.5).attr_text().as_deref(), Some("3.5"));
    }

    #[test]
    fn handlers_never_compare_equal() {
        let a: PropValue<()> = PropValue::Handler(());
        let b: PropValue<()> = PropValue::Handler(());
        assert_ne!(a, b);
        assert_eq!(PropValue::<()>::Null, PropValue::<()>::Null);
    }

    #[test]
    fn hooks_attach_through_props() {
        let p: P = Props::new().on_create(|_| {}).on_destroy(|_| {});
        let hooks = p.hooks_ref().expect("hooks set");
        assert!(hooks.on_create.is_some());
        assert!(hooks.on_destroy.is_some());
        assert!(hooks.on_remove.is_none());
    }
}
