//! UI targets on the destination page and the selector lists used to find them.

use std::fmt;

use serde::Serialize;

use crate::config::SelectorConfig;

/// Icon marker carried by the "Website" source chip
pub const WEB_ICON_SELECTOR: &str = r#"mat-icon[data-mat-icon-type="font"]"#;
pub const WEB_ICON_TEXT: &str = "web";

const CREATE_SELECTORS: &[&str] = &[
    "button.create-new-button",
    r#"[data-test-id="create-new-button"]"#,
    "button.mat-button",
    "button.mat-raised-button",
    "button.mat-flat-button",
    "button",
    r#"a[role="button"]"#,
];

const WEBSITE_SELECTORS: &[&str] = &[
    r#"mat-chip[jslog*="230546"]"#,
    "mat-chip.mat-mdc-chip",
    r#".mat-mdc-chip:has(mat-icon[data-mat-icon-type="font"])"#,
    ".mdc-evolution-chip",
    ".mat-mdc-chip .mdc-evolution-chip__text-label",
    r#"[class*="chip"]"#,
];

const URL_INPUT_SELECTORS: &[&str] = &[
    r#"input[type="url"]"#,
    r#"input[placeholder*="url" i]"#,
    r#"textarea[placeholder*="url" i]"#,
    "input.mat-mdc-input-element",
    ".mat-mdc-form-field input",
    ".mat-mdc-input-element",
];

const INSERT_SELECTORS: &[&str] = &[
    "button.mat-mdc-button-base",
    ".mat-mdc-button:not([disabled])",
    ".mdc-button",
    r#"[jslog*="generic_click"]"#,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    CreateButton,
    WebsiteChip,
    UrlInput,
    InsertButton,
}

impl Target {
    pub const ALL: [Target; 4] = [
        Target::CreateButton,
        Target::WebsiteChip,
        Target::UrlInput,
        Target::InsertButton,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Target::CreateButton => "create",
            Target::WebsiteChip => "website",
            Target::UrlInput => "url-input",
            Target::InsertButton => "insert",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Target::CreateButton => "\"Create new\" button",
            Target::WebsiteChip => "\"Website\" chip",
            Target::UrlInput => "URL input field",
            Target::InsertButton => "\"Insert\" button",
        }
    }

    fn builtin_selectors(&self) -> &'static [&'static str] {
        match self {
            Target::CreateButton => CREATE_SELECTORS,
            Target::WebsiteChip => WEBSITE_SELECTORS,
            Target::UrlInput => URL_INPUT_SELECTORS,
            Target::InsertButton => INSERT_SELECTORS,
        }
    }

    fn predicate(&self) -> Predicate {
        match self {
            Target::CreateButton => Predicate::TextContains("create new".to_string()),
            Target::WebsiteChip => Predicate::TextOrIcon {
                text: "website".to_string(),
                icon_selector: WEB_ICON_SELECTOR.to_string(),
                icon_text: WEB_ICON_TEXT.to_string(),
            },
            Target::UrlInput => Predicate::Any,
            Target::InsertButton => Predicate::TextContains("insert".to_string()),
        }
    }

    fn configured<'a>(&self, config: &'a SelectorConfig) -> &'a [String] {
        match self {
            Target::CreateButton => &config.create,
            Target::WebsiteChip => &config.website,
            Target::UrlInput => &config.url_input,
            Target::InsertButton => &config.insert,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Target::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown target '{}', expected one of: create, website, url-input, insert",
                    s
                )
            })
    }
}

/// Condition an element must satisfy once a selector has matched it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The first selector match wins
    Any,
    /// Case-insensitive substring of the element's text content
    TextContains(String),
    /// Text substring, or a descendant icon whose text is exactly `icon_text`
    TextOrIcon {
        text: String,
        icon_selector: String,
        icon_text: String,
    },
}

impl Predicate {
    pub fn needs_text(&self) -> bool {
        !matches!(self, Predicate::Any)
    }

    pub fn text_matches(&self, text: &str) -> bool {
        let needle = match self {
            Predicate::Any => return true,
            Predicate::TextContains(needle) => needle,
            Predicate::TextOrIcon { text, .. } => text,
        };
        text.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// A target together with the ordered strategies used to locate it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub target: Target,
    pub selectors: Vec<String>,
    pub predicate: Predicate,
}

impl TargetSpec {
    pub fn builtin(target: Target) -> Self {
        Self {
            target,
            selectors: target
                .builtin_selectors()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            predicate: target.predicate(),
        }
    }

    /// Use configured selectors when present, otherwise the built-in list
    pub fn resolve(target: Target, config: &SelectorConfig) -> Self {
        let configured: Vec<String> = target
            .configured(config)
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if configured.is_empty() {
            Self::builtin(target)
        } else {
            Self {
                target,
                selectors: configured,
                predicate: target.predicate(),
            }
        }
    }
}

/// The full set of specs for one run
#[derive(Debug, Clone)]
pub struct TargetSet {
    pub create: TargetSpec,
    pub website: TargetSpec,
    pub url_input: TargetSpec,
    pub insert: TargetSpec,
}

impl TargetSet {
    pub fn from_config(config: &SelectorConfig) -> Self {
        Self {
            create: TargetSpec::resolve(Target::CreateButton, config),
            website: TargetSpec::resolve(Target::WebsiteChip, config),
            url_input: TargetSpec::resolve(Target::UrlInput, config),
            insert: TargetSpec::resolve(Target::InsertButton, config),
        }
    }

    pub fn get(&self, target: Target) -> &TargetSpec {
        match target {
            Target::CreateButton => &self.create,
            Target::WebsiteChip => &self.website,
            Target::UrlInput => &self.url_input,
            Target::InsertButton => &self.insert,
        }
    }
}

impl Default for TargetSet {
    fn default() -> Self {
        Self::from_config(&SelectorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_predicate_is_case_insensitive_substring() {
        let predicate = Predicate::TextContains("create new".to_string());
        assert!(predicate.text_matches("  + Create New notebook"));
        assert!(!predicate.text_matches("Create"));
    }

    #[test]
    fn any_predicate_matches_everything() {
        assert!(Predicate::Any.text_matches(""));
        assert!(!Predicate::Any.needs_text());
    }

    #[test]
    fn builtin_lists_keep_original_order() {
        let spec = TargetSpec::builtin(Target::CreateButton);
        assert_eq!(spec.selectors.first().unwrap(), "button.create-new-button");
        assert_eq!(spec.selectors.last().unwrap(), r#"a[role="button"]"#);
        assert_eq!(spec.selectors.len(), 7);
    }

    #[test]
    fn resolve_prefers_configured_selectors() {
        let config = SelectorConfig {
            insert: vec!["  ".to_string(), "button.add-source".to_string()],
            ..Default::default()
        };

        let spec = TargetSpec::resolve(Target::InsertButton, &config);
        assert_eq!(spec.selectors, vec!["button.add-source"]);
        assert_eq!(spec.predicate, Predicate::TextContains("insert".to_string()));

        let fallback = TargetSpec::resolve(Target::CreateButton, &config);
        assert_eq!(fallback, TargetSpec::builtin(Target::CreateButton));
    }

    #[test]
    fn target_parses_from_name() {
        assert_eq!("url-input".parse::<Target>().unwrap(), Target::UrlInput);
        assert_eq!("Website".parse::<Target>().unwrap(), Target::WebsiteChip);
        assert!("submit".parse::<Target>().is_err());
    }
}
