//! Minimal-diff application of one property.
//!
//! [`patch_property`] is the per-entry workhorse of the element patcher. It
//! decides, for a single `(name, old, new)` triple, which write path the
//! render target takes:
//!
//! - `style` values diff per style property; properties absent from the new
//!   map are reset with an empty write, so the style attribute survives as
//!   an empty string rather than being removed.
//! - `on*` names route through the [`EventRouter`]; handler values never
//!   compare equal, so a rebind happens every pass but costs one table
//!   write and zero native listener churn.
//! - everything else tries the direct-property path first (HTML namespace
//!   only, never for `list`) and falls back to attributes, where `Null`,
//!   `false`, and an empty class string remove the attribute.
//!
//! Equal old/new values short-circuit before touching the target, which is
//! what makes an identical patch pass observably mutation-free.

use mosaic_core::{NodeId, PropValue, StyleMap, Value};

use crate::dom::{Dom, DomError, Namespace};
use crate::router::EventRouter;

/// Apply the difference between `old` and `new` for property `name` on
/// `node`. `None` on either side means the property is absent in that tree.
pub fn patch_property<A: Clone>(
    dom: &mut dyn Dom,
    router: &mut EventRouter<A>,
    node: NodeId,
    name: &str,
    old: Option<&PropValue<A>>,
    new: Option<&PropValue<A>>,
    ns: Namespace,
) -> Result<(), DomError> {
    // The key is identity metadata, lifted off the map at build time; it
    // never reaches the target even if a caller injects one manually.
    if name == "key" {
        return Ok(());
    }

    if let Some(event_type) = name.strip_prefix("on") {
        let event_type = event_type.to_ascii_lowercase();
        return match new.and_then(PropValue::as_handler) {
            Some(action) => router.bind(dom, node, &event_type, action.clone()),
            None if old.is_some() => router.unbind(dom, node, &event_type),
            None => Ok(()),
        };
    }

    let old_style = old.and_then(PropValue::as_style);
    let new_style = new.and_then(PropValue::as_style);
    if new_style.is_some() || old_style.is_some() {
        return patch_style(dom, node, old_style, new_style);
    }

    if old == new {
        return Ok(());
    }

    // Direct-property path: HTML only, and never for `list`, which must
    // stay an attribute to keep its datalist association.
    if !ns.is_namespaced() && name != "list" {
        let value = match new {
            Some(v) => v.to_json(),
            None => Some(Value::Null),
        };
        if let Some(value) = value
            && dom.set_property(node, name, &value)?
        {
            return Ok(());
        }
    }

    match new.and_then(PropValue::attr_text) {
        Some(text) => dom.set_attribute(node, name, &text),
        None => dom.remove_attribute(node, name),
    }
}

fn patch_style(
    dom: &mut dyn Dom,
    node: NodeId,
    old: Option<&StyleMap>,
    new: Option<&StyleMap>,
) -> Result<(), DomError> {
    let empty = StyleMap::new();
    let old = old.unwrap_or(&empty);
    let new = new.unwrap_or(&empty);

    for (prop, value) in new.iter() {
        if old.get(prop) != Some(value) {
            dom.set_style(node, prop, value, prop.starts_with("--"))?;
        }
    }
    for (prop, _) in old.iter() {
        if new.get(prop).is_none() {
            // Reset, not remove: the style attribute is left empty.
            dom.set_style(node, prop, "", prop.starts_with("--"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::ClassSpec;

    use crate::headless::HeadlessDom;

    fn elem(dom: &mut HeadlessDom, name: &str) -> NodeId {
        let node = dom.create_element(name, Namespace::Html);
        let root = dom.root();
        dom.insert_before(root, node, None).unwrap();
        node
    }

    #[test]
    fn equal_values_touch_nothing() {
        let mut dom = HeadlessDom::new();
        let mut router: EventRouter<()> = EventRouter::new();
        let node = elem(&mut dom, "div");
        let v: PropValue<()> = PropValue::Str("x".into());
        dom.set_attribute(node, "id", "x").unwrap();

        let before = dom.mutations();
        patch_property(&mut dom, &mut router, node, "id", Some(&v), Some(&v), Namespace::Html)
            .unwrap();
        assert_eq!(dom.mutations(), before);
    }

    #[test]
    fn null_and_false_remove_the_attribute() {
        let mut dom = HeadlessDom::new();
        let mut router: EventRouter<()> = EventRouter::new();
        let node = elem(&mut dom, "div");

        let t: PropValue<()> = PropValue::Bool(true);
        patch_property(&mut dom, &mut router, node, "hidden", None, Some(&t), Namespace::Html)
            .unwrap();
        assert_eq!(dom.attr(node, "hidden"), Some(""));

        let f: PropValue<()> = PropValue::Bool(false);
        patch_property(&mut dom, &mut router, node, "hidden", Some(&t), Some(&f), Namespace::Html)
            .unwrap();
        assert_eq!(dom.attr(node, "hidden"), None);
    }

    #[test]
    fn style_diff_writes_only_changed_properties() {
        let mut dom = HeadlessDom::new();
        let mut router: EventRouter<()> = EventRouter::new();
        let node = elem(&mut dom, "div");

        let old: PropValue<()> =
            PropValue::Style(StyleMap::from([("color", "red"), ("width", "1px")]));
        let new: PropValue<()> =
            PropValue::Style(StyleMap::from([("color", "blue"), ("width", "1px")]));
        patch_property(&mut dom, &mut router, node, "style", None, Some(&old), Namespace::Html)
            .unwrap();

        let before = dom.mutations();
        patch_property(
            &mut dom, &mut router, node, "style",
            Some(&old), Some(&new), Namespace::Html,
        )
        .unwrap();
        assert_eq!(dom.mutations(), before + 1, "only color changed");
        assert_eq!(dom.style_text(node), "color:blue;width:1px;");
    }

    #[test]
    fn dropped_style_properties_are_reset_not_removed() {
        let mut dom = HeadlessDom::new();
        let mut router: EventRouter<()> = EventRouter::new();
        let node = elem(&mut dom, "div");

        let old: PropValue<()> = PropValue::Style(StyleMap::from([("color", "red")]));
        patch_property(&mut dom, &mut router, node, "style", None, Some(&old), Namespace::Html)
            .unwrap();
        patch_property(&mut dom, &mut router, node, "style", Some(&old), None, Namespace::Html)
            .unwrap();
        assert_eq!(dom.style_text(node), "", "left empty, not absent");
    }

    #[test]
    fn custom_properties_take_the_custom_write_path() {
        let mut dom = HeadlessDom::new();
        let mut router: EventRouter<()> = EventRouter::new();
        let node = elem(&mut dom, "div");

        let v: PropValue<()> = PropValue::Style(StyleMap::from([("--accent", "teal")]));
        patch_property(&mut dom, &mut router, node, "style", None, Some(&v), Namespace::Html)
            .unwrap();
        assert_eq!(dom.style_text(node), "--accent:teal;");
    }

    #[test]
    fn empty_class_string_removes_the_attribute() {
        let mut dom = HeadlessDom::new();
        let mut router: EventRouter<()> = EventRouter::new();
        let node = elem(&mut dom, "div");

        let on: PropValue<()> = PropValue::Class(ClassSpec::Toggle(vec![("sel".into(), true)]));
        let off: PropValue<()> = PropValue::Class(ClassSpec::Toggle(vec![("sel".into(), false)]));
        patch_property(&mut dom, &mut router, node, "class", None, Some(&on), Namespace::Html)
            .unwrap();
        assert_eq!(dom.attr(node, "class"), Some("sel"));
        patch_property(&mut dom, &mut router, node, "class", Some(&on), Some(&off), Namespace::Html)
            .unwrap();
        assert_eq!(dom.attr(node, "class"), None);
    }

    #[test]
    fn writable_properties_bypass_attributes_in_html() {
        let mut dom = HeadlessDom::new();
        let mut router: EventRouter<()> = EventRouter::new();
        let node = elem(&mut dom, "input");

        let v: PropValue<()> = PropValue::Str("typed".into());
        patch_property(&mut dom, &mut router, node, "value", None, Some(&v), Namespace::Html)
            .unwrap();
        assert_eq!(dom.property(node, "value"), Some(&Value::String("typed".into())));
        assert_eq!(dom.attr(node, "value"), None);
    }

    #[test]
    fn svg_namespace_always_takes_the_attribute_path() {
        let mut dom = HeadlessDom::new();
        let mut router: EventRouter<()> = EventRouter::new();
        let node = dom.create_element("text", Namespace::Svg);

        let v: PropValue<()> = PropValue::Str("x".into());
        patch_property(&mut dom, &mut router, node, "value", None, Some(&v), Namespace::Svg)
            .unwrap();
        assert_eq!(dom.attr(node, "value"), Some("x"));
        assert_eq!(dom.property(node, "value"), None);
    }

    #[test]
    fn handler_props_bind_and_unbind_listeners() {
        let mut dom = HeadlessDom::new();
        let mut router: EventRouter<u32> = EventRouter::new();
        let node = elem(&mut dom, "button");

        let h1: PropValue<u32> = PropValue::Handler(7);
        patch_property(&mut dom, &mut router, node, "onclick", None, Some(&h1), Namespace::Html)
            .unwrap();
        assert_eq!(router.route(node, "click"), Some(&7));
        assert!(dom.has_listener(node, "click"));

        patch_property(&mut dom, &mut router, node, "onclick", Some(&h1), None, Namespace::Html)
            .unwrap();
        assert!(router.route(node, "click").is_none());
        assert!(!dom.has_listener(node, "click"));
    }
}
