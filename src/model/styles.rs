//! Named, reusable attribute bundles.

use serde::{Deserialize, Serialize};

use super::Attribute;
use crate::error::ValidationError;

/// A named bundle of attributes referenced from an element's style list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// The document's style table. Names are unique; styles never nest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Style>", into = "Vec<Style>")]
pub struct StyleRegistry {
    styles: Vec<Style>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a style, or append to the attributes of an existing one.
    pub fn add_style<I>(&mut self, name: &str, attributes: I)
    where
        I: IntoIterator<Item = Attribute>,
    {
        match self.styles.iter_mut().find(|s| s.name == name) {
            Some(style) => style.attributes.extend(attributes),
            None => self.styles.push(Style {
                name: name.to_string(),
                attributes: attributes.into_iter().collect(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Concatenate the attributes of every named style, in list order.
    pub fn resolve_style_list<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<&Attribute>, ValidationError> {
        let mut merged = Vec::new();
        for name in names {
            let name = name.as_ref();
            let style = self
                .get(name)
                .ok_or_else(|| ValidationError::UnknownStyle(name.to_string()))?;
            merged.extend(style.attributes.iter());
        }
        Ok(merged)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Style> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl From<Vec<Style>> for StyleRegistry {
    fn from(styles: Vec<Style>) -> Self {
        let mut registry = StyleRegistry::new();
        for style in styles {
            registry.add_style(&style.name, style.attributes);
        }
        registry
    }
}

impl From<StyleRegistry> for Vec<Style> {
    fn from(registry: StyleRegistry) -> Self {
        registry.styles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str, value: &str) -> Attribute {
        Attribute::new(name, value)
    }

    #[test]
    fn add_style_appends_to_existing() {
        let mut reg = StyleRegistry::new();
        reg.add_style("a", [attr("font-color", "#000000")]);
        reg.add_style("a", [attr("font-size", "4mm")]);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("a").unwrap().attributes.len(), 2);
    }

    #[test]
    fn resolve_concatenates_in_list_order() {
        let mut reg = StyleRegistry::new();
        reg.add_style("a", [attr("font-color", "#111111")]);
        reg.add_style("b", [attr("font-color", "#222222")]);
        let merged = reg.resolve_style_list(&["a", "b"]).unwrap();
        let values: Vec<&str> = merged.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, ["#111111", "#222222"]);
    }

    #[test]
    fn unknown_style_names_the_missing_style() {
        let reg = StyleRegistry::new();
        let err = reg.resolve_style_list(&["ghost"]).unwrap_err();
        assert_eq!(err, ValidationError::UnknownStyle("ghost".into()));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn duplicate_names_in_json_are_merged() {
        let reg: StyleRegistry = serde_json::from_str(
            r##"[{"name":"x","attributes":[{"name":"font-size","value":"3mm"}]},
                {"name":"x","attributes":[{"name":"font-color","value":"#ff0000"}]}]"##,
        )
        .unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("x").unwrap().attributes.len(), 2);
    }
}
