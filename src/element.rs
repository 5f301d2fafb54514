//! Host-owned visual element arena
//!
//! The engine never renders; it mutates semantic style channels on elements
//! the host created alongside the lyrics document. Each slot carries a style
//! map, a class set, layout geometry the host keeps up to date (the engine
//! only ever reads the stored offset, never triggers a layout query), and a
//! connectivity flag.
//!
//! Writes to a missing or disconnected slot silently no-op: detachment is an
//! expected transient state during teardown and song-transition races, not
//! an error.

use std::collections::HashMap;

/// Handle to one visual element in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

/// One visual element: styles, lifecycle classes, layout geometry.
#[derive(Debug, Default, Clone)]
pub struct Element {
    styles: HashMap<&'static str, String>,
    classes: Vec<&'static str>,
    /// Offset from the scroll container's content origin, in logical pixels.
    pub offset_top: f32,
    /// Box height in logical pixels.
    pub height: f32,
    connected: bool,
}

impl Element {
    pub fn style(&self, prop: &str) -> Option<&str> {
        self.styles.get(prop).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| *c == class)
    }

    pub fn classes(&self) -> &[&'static str] {
        &self.classes
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Arena of visual elements addressed by [`ElementId`].
#[derive(Debug, Default, Clone)]
pub struct Elements {
    slots: Vec<Element>,
    /// Effective style commits: writes that actually changed a value.
    committed_writes: u64,
}

impl Elements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a connected element with zeroed geometry.
    pub fn create(&mut self) -> ElementId {
        self.create_with_geometry(0.0, 0.0)
    }

    /// Allocate a connected element at the given layout box.
    pub fn create_with_geometry(&mut self, offset_top: f32, height: f32) -> ElementId {
        let id = ElementId(self.slots.len() as u32);
        self.slots.push(Element {
            offset_top,
            height,
            connected: true,
            ..Element::default()
        });
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.slots.get(id.0 as usize)
    }

    /// Update the host-measured layout box for an element.
    pub fn set_geometry(&mut self, id: ElementId, offset_top: f32, height: f32) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            slot.offset_top = offset_top;
            slot.height = height;
        }
    }

    /// Layout box of a connected element, if any.
    pub fn geometry(&self, id: ElementId) -> Option<(f32, f32)> {
        self.get(id)
            .filter(|e| e.connected)
            .map(|e| (e.offset_top, e.height))
    }

    /// Mark an element as removed from the visual tree. Subsequent writes
    /// to it are dropped.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            slot.connected = false;
        }
    }

    /// Write a style property, returning whether the stored value changed.
    /// Disconnected or unknown targets swallow the write.
    pub fn set_style(&mut self, id: ElementId, prop: &'static str, value: String) -> bool {
        let Some(slot) = self.slots.get_mut(id.0 as usize) else {
            return false;
        };
        if !slot.connected {
            return false;
        }
        if slot.styles.get(prop).is_some_and(|prev| *prev == value) {
            return false;
        }
        slot.styles.insert(prop, value);
        self.committed_writes += 1;
        true
    }

    /// Remove a style property entirely (used before re-triggering a
    /// keyframe animation).
    pub fn remove_style(&mut self, id: ElementId, prop: &str) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize)
            && slot.connected
            && slot.styles.remove(prop).is_some()
        {
            self.committed_writes += 1;
        }
    }

    pub fn add_class(&mut self, id: ElementId, class: &'static str) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize)
            && slot.connected
            && !slot.classes.contains(&class)
        {
            slot.classes.push(class);
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize)
            && slot.connected
        {
            slot.classes.retain(|c| *c != class);
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.get(id).is_some_and(|e| e.has_class(class))
    }

    pub fn style(&self, id: ElementId, prop: &str) -> Option<&str> {
        self.get(id).and_then(|e| e.style(prop))
    }

    /// Number of style writes that actually changed a value.
    pub fn committed_writes(&self) -> u64 {
        self.committed_writes
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Hint that an element's transform-related channels will animate.
pub(crate) fn promote_to_gpu(elements: &mut Elements, id: ElementId) {
    elements.set_style(
        id,
        "will-change",
        "transform, opacity, text-shadow, scale".to_owned(),
    );
    elements.set_style(id, "backface-visibility", "hidden".to_owned());
}

/// Variant that also hints filter changes (the blur pass).
pub(crate) fn promote_to_gpu_with_filter(elements: &mut Elements, id: ElementId) {
    let needs_upgrade = elements
        .style(id, "will-change")
        .map(|existing| !existing.contains("filter"))
        .unwrap_or(true);
    if needs_upgrade {
        elements.set_style(
            id,
            "will-change",
            "transform, opacity, text-shadow, scale, filter".to_owned(),
        );
    }
    elements.set_style(id, "backface-visibility", "hidden".to_owned());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_value_is_not_a_committed_write() {
        let mut elements = Elements::new();
        let el = elements.create();
        assert!(elements.set_style(el, "opacity", "0.5".into()));
        assert!(!elements.set_style(el, "opacity", "0.5".into()));
        assert_eq!(elements.committed_writes(), 1);
    }

    #[test]
    fn detached_element_swallows_writes() {
        let mut elements = Elements::new();
        let el = elements.create();
        elements.detach(el);
        assert!(!elements.set_style(el, "scale", "1".into()));
        assert_eq!(elements.style(el, "scale"), None);
        assert_eq!(elements.committed_writes(), 0);
    }

    #[test]
    fn class_membership_round_trips() {
        let mut elements = Elements::new();
        let el = elements.create();
        elements.add_class(el, "Active");
        elements.add_class(el, "Active");
        assert!(elements.has_class(el, "Active"));
        assert_eq!(elements.get(el).unwrap().classes().len(), 1);
        elements.remove_class(el, "Active");
        assert!(!elements.has_class(el, "Active"));
    }

    #[test]
    fn filter_promotion_upgrades_existing_hint() {
        let mut elements = Elements::new();
        let el = elements.create();
        promote_to_gpu(&mut elements, el);
        promote_to_gpu_with_filter(&mut elements, el);
        assert!(elements.style(el, "will-change").unwrap().contains("filter"));
    }

    #[test]
    fn geometry_is_none_for_detached() {
        let mut elements = Elements::new();
        let el = elements.create_with_geometry(120.0, 48.0);
        assert_eq!(elements.geometry(el), Some((120.0, 48.0)));
        elements.detach(el);
        assert_eq!(elements.geometry(el), None);
    }
}
