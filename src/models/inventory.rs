//! Inventory listings: cameras, servers, sites and descriptor vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::deserializers::lenient_string;

/// A named upstream resource (camera, server or site).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamedResource {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NamedResource {
    /// Name for display, falling back to the id.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
    }
}

pub type Camera = NamedResource;
pub type Server = NamedResource;
pub type Site = NamedResource;

/// One descriptor facet/tag pair used by descriptor-based appearance search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub facet: String,
    pub tag: String,
}

impl QueryDescriptor {
    pub fn new(facet: &str, tag: &str) -> Self {
        Self {
            facet: facet.to_string(),
            tag: tag.to_string(),
        }
    }
}

impl std::str::FromStr for QueryDescriptor {
    type Err = String;

    /// Parse `facet:tag`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((facet, tag)) if !facet.trim().is_empty() && !tag.trim().is_empty() => {
                Ok(Self::new(facet.trim(), tag.trim()))
            }
            _ => Err(format!("expected facet:tag, got {s:?}")),
        }
    }
}

/// Group descriptors by facet, keeping first-seen order of facets and tags.
pub fn facet_tags(descriptors: &[QueryDescriptor]) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for d in descriptors {
        match grouped.iter_mut().find(|(facet, _)| *facet == d.facet) {
            Some((_, tags)) => tags.push(d.tag.clone()),
            None => grouped.push((d.facet.clone(), vec![d.tag.clone()])),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_falls_back_to_id() {
        let cam: Camera = serde_json::from_value(json!({"id": "c1"})).unwrap();
        assert_eq!(cam.label(), "c1");
        let cam: Camera = serde_json::from_value(json!({"id": "c1", "name": "Lobby"})).unwrap();
        assert_eq!(cam.label(), "Lobby");
    }

    #[test]
    fn test_parse_descriptor() {
        let d: QueryDescriptor = "upperClothing:red".parse().unwrap();
        assert_eq!(d, QueryDescriptor::new("upperClothing", "red"));
        assert!("nocolon".parse::<QueryDescriptor>().is_err());
        assert!(":red".parse::<QueryDescriptor>().is_err());
    }

    #[test]
    fn test_facet_tags_groups_in_order() {
        let descriptors = vec![
            QueryDescriptor::new("gender", "male"),
            QueryDescriptor::new("upperClothing", "red"),
            QueryDescriptor::new("gender", "female"),
        ];
        let grouped = facet_tags(&descriptors);
        assert_eq!(
            grouped,
            vec![
                ("gender".to_string(), vec!["male".to_string(), "female".to_string()]),
                ("upperClothing".to_string(), vec!["red".to_string()]),
            ]
        );
    }
}
