// Composite identity keys for the navigation tree
//
// Runtime code always works with these structured keys; the dotted string
// form ("section.sub" / "section.sub.tab") exists only at the persistence
// boundary, where JSON object keys must be strings.
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
#[error("malformed navigation key: {0:?}")]
pub struct KeyParseError(String);

/// Identity of an L2 sub: `(section, sub)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubKey {
    pub section: String,
    pub sub: String,
}

impl SubKey {
    pub fn new(section: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            sub: sub.into(),
        }
    }

    /// The leaf this sub renders when no L3 tab is selected.
    pub fn leaf(&self) -> LeafKey {
        LeafKey {
            section: self.section.clone(),
            sub: self.sub.clone(),
            tab: None,
        }
    }

    pub fn tab_leaf(&self, tab: impl Into<String>) -> LeafKey {
        LeafKey {
            section: self.section.clone(),
            sub: self.sub.clone(),
            tab: Some(tab.into()),
        }
    }
}

impl fmt::Display for SubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.sub)
    }
}

impl FromStr for SubKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(section), Some(sub), None) if !section.is_empty() && !sub.is_empty() => {
                Ok(SubKey::new(section, sub))
            }
            _ => Err(KeyParseError(s.to_string())),
        }
    }
}

impl Serialize for SubKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SubKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SubKeyVisitor;

        impl Visitor<'_> for SubKeyVisitor {
            type Value = SubKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a \"section.sub\" key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SubKey, E> {
                v.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(SubKeyVisitor)
    }
}

/// Identity of a navigable leaf: a sub, or a `(sub, L3 tab)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafKey {
    pub section: String,
    pub sub: String,
    pub tab: Option<String>,
}

impl LeafKey {
    pub fn sub_key(&self) -> SubKey {
        SubKey::new(self.section.clone(), self.sub.clone())
    }

    pub fn belongs_to(&self, key: &SubKey) -> bool {
        self.section == key.section && self.sub == key.sub
    }
}

impl fmt::Display for LeafKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tab {
            Some(tab) => write!(f, "{}.{}.{}", self.section, self.sub, tab),
            None => write!(f, "{}.{}", self.section, self.sub),
        }
    }
}

impl FromStr for LeafKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [section, sub] if !section.is_empty() && !sub.is_empty() => Ok(LeafKey {
                section: section.to_string(),
                sub: sub.to_string(),
                tab: None,
            }),
            [section, sub, tab] if !section.is_empty() && !sub.is_empty() && !tab.is_empty() => {
                Ok(LeafKey {
                    section: section.to_string(),
                    sub: sub.to_string(),
                    tab: Some(tab.to_string()),
                })
            }
            _ => Err(KeyParseError(s.to_string())),
        }
    }
}

impl Serialize for LeafKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LeafKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LeafKeyVisitor;

        impl Visitor<'_> for LeafKeyVisitor {
            type Value = LeafKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a \"section.sub\" or \"section.sub.tab\" key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<LeafKey, E> {
                v.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(LeafKeyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_key_string_form() {
        let key = SubKey::new("marketing", "performance");
        assert_eq!(key.to_string(), "marketing.performance");
        assert_eq!("marketing.performance".parse::<SubKey>().unwrap(), key);
        assert!("marketing".parse::<SubKey>().is_err());
        assert!("a.b.c".parse::<SubKey>().is_err());
    }

    #[test]
    fn test_leaf_key_with_and_without_tab() {
        let sub = SubKey::new("marketing", "cx_1");
        assert_eq!(sub.leaf().to_string(), "marketing.cx_1");

        let leaf = sub.tab_leaf("t_9");
        assert_eq!(leaf.to_string(), "marketing.cx_1.t_9");
        assert_eq!("marketing.cx_1.t_9".parse::<LeafKey>().unwrap(), leaf);
        assert!(leaf.belongs_to(&sub));
        assert!(!leaf.belongs_to(&SubKey::new("marketing", "cx_2")));
    }

    #[test]
    fn test_keys_serialize_as_json_strings() {
        let leaf = SubKey::new("product", "funnel").tab_leaf("t_1");
        assert_eq!(
            serde_json::to_string(&leaf).unwrap(),
            "\"product.funnel.t_1\""
        );
        let back: LeafKey = serde_json::from_str("\"product.funnel.t_1\"").unwrap();
        assert_eq!(back, leaf);
    }
}
