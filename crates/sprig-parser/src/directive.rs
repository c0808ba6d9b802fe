// File: src/directive.rs
// Purpose: Identify declarative directive attributes (@click, @ref, @portal, data-slot)

use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("invalid portal target `{0}`")]
    InvalidPortal(String),
}

/// Attribute names the engine reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveNames {
    pub click: String,
    pub reference: String,
    pub portal: String,
    pub slot: String,
    pub portaled: String,
}

impl Default for DirectiveNames {
    fn default() -> Self {
        Self {
            click: "@click".to_string(),
            reference: "@ref".to_string(),
            portal: "@portal".to_string(),
            slot: "data-slot".to_string(),
            portaled: "data-portaled".to_string(),
        }
    }
}

/// Where relocated content lands inside the target container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Before the container's first child (`.start`)
    Start,
    /// After the container's last child
    End,
}

/// Typed portal destination, resolved by the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalTarget {
    Body,
    Head,
    Element(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSpec {
    pub target: PortalTarget,
    pub placement: Placement,
}

static BY_ID_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^document\.getElementById\(\s*["']([^"']+)["']\s*\)$"#)
        .expect("getElementById pattern is valid")
});

impl FromStr for PortalSpec {
    type Err = DirectiveError;

    /// Accepts `body`, `document.body`, `head`, `document.head`, `#id` and
    /// `document.getElementById('id')`, each optionally followed by `.start`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let (target, placement) = match value.strip_suffix(".start") {
            Some(target) => (target.trim(), Placement::Start),
            None => (value, Placement::End),
        };

        let target = match target {
            "body" | "document.body" => PortalTarget::Body,
            "head" | "document.head" => PortalTarget::Head,
            _ => {
                if let Some(id) = target.strip_prefix('#').filter(|id| !id.is_empty()) {
                    PortalTarget::Element(id.to_string())
                } else if let Some(caps) = BY_ID_CALL.captures(target) {
                    PortalTarget::Element(caps[1].to_string())
                } else {
                    return Err(DirectiveError::InvalidPortal(value.to_string()));
                }
            }
        };

        Ok(Self { target, placement })
    }
}

/// A recognised directive attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Named action on the owning component
    Click(String),
    /// Reactive reference id
    Ref(String),
    Portal(PortalSpec),
    Slot(String),
}

impl DirectiveNames {
    /// Classify one attribute.
    ///
    /// A click attribute is always a directive, even when empty (the lookup
    /// fails later, at dispatch). Empty ref and portal attributes are ignored.
    pub fn classify(&self, name: &str, value: &str) -> Result<Option<Directive>, DirectiveError> {
        let directive = if name == self.click {
            Some(Directive::Click(value.trim().to_string()))
        } else if name == self.reference {
            (!value.trim().is_empty()).then(|| Directive::Ref(value.trim().to_string()))
        } else if name == self.portal {
            if value.trim().is_empty() {
                None
            } else {
                Some(Directive::Portal(value.parse()?))
            }
        } else if name == self.slot {
            Some(Directive::Slot(value.to_string()))
        } else {
            None
        };
        Ok(directive)
    }

    /// All directives carried by an attribute list, in attribute order.
    pub fn parse_directives(
        &self,
        attributes: &[(String, String)],
    ) -> Result<Vec<Directive>, DirectiveError> {
        attributes
            .iter()
            .filter_map(|(name, value)| self.classify(name, value).transpose())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("body", PortalTarget::Body, Placement::End)]
    #[case("document.body", PortalTarget::Body, Placement::End)]
    #[case("document.body.start", PortalTarget::Body, Placement::Start)]
    #[case("head.start", PortalTarget::Head, Placement::Start)]
    #[case("#modals", PortalTarget::Element("modals".into()), Placement::End)]
    #[case("#modals.start", PortalTarget::Element("modals".into()), Placement::Start)]
    #[case("document.getElementById('toasts')", PortalTarget::Element("toasts".into()), Placement::End)]
    fn test_portal_spec(#[case] input: &str, #[case] target: PortalTarget, #[case] placement: Placement) {
        let spec: PortalSpec = input.parse().unwrap();
        assert_eq!(spec, PortalSpec { target, placement });
    }

    #[rstest]
    #[case("window.alert(1)")]
    #[case("#")]
    #[case(".start")]
    fn test_invalid_portal(#[case] input: &str) {
        assert!(matches!(
            input.parse::<PortalSpec>(),
            Err(DirectiveError::InvalidPortal(_))
        ));
    }

    #[test]
    fn test_parse_directives() {
        let names = DirectiveNames::default();
        let attrs = vec![
            ("class".to_string(), "btn".to_string()),
            ("@click".to_string(), "save".to_string()),
            ("@ref".to_string(), "".to_string()),
            ("data-slot".to_string(), "innerHTML".to_string()),
        ];
        let directives = names.parse_directives(&attrs).unwrap();
        assert_eq!(
            directives,
            vec![
                Directive::Click("save".into()),
                Directive::Slot("innerHTML".into()),
            ]
        );
    }

    #[test]
    fn test_custom_names() {
        let names = DirectiveNames {
            click: "on-tap".into(),
            ..DirectiveNames::default()
        };
        assert_eq!(
            names.classify("on-tap", "go").unwrap(),
            Some(Directive::Click("go".into()))
        );
        assert_eq!(names.classify("@click", "go").unwrap(), None);
    }
}
