//! Offline `PageDom` over a saved HTML document.
//!
//! Interactions are recorded instead of executed, which makes this the backend
//! for `clipbook probe` and for driving the automation against fixtures.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::dom::PageDom;
use crate::error::{ClipbookError, Result};

/// Handle to an element of one snapshot document generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotElement {
    generation: u64,
    index: usize,
}

impl SnapshotElement {
    /// Position of the element in document order
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Something the automation did to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
    Click { index: usize, text: String },
    SetValue { index: usize, value: String },
    Event { index: usize, event_type: String },
}

struct SnapshotState {
    html: String,
    generation: u64,
    values: HashMap<usize, String>,
    interactions: Vec<Interaction>,
}

pub struct SnapshotPage {
    state: Mutex<SnapshotState>,
}

impl SnapshotPage {
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(SnapshotState {
                html: html.into(),
                generation: 0,
                values: HashMap::new(),
                interactions: Vec::new(),
            }),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let html = std::fs::read_to_string(path).map_err(|e| {
            ClipbookError::SnapshotError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::from_html(html))
    }

    /// Replace the document, invalidating every handle handed out so far
    pub fn load(&self, html: impl Into<String>) -> Result<()> {
        let mut state = self.lock()?;
        state.html = html.into();
        state.generation += 1;
        state.values.clear();
        Ok(())
    }

    pub fn interactions(&self) -> Result<Vec<Interaction>> {
        Ok(self.lock()?.interactions.clone())
    }

    /// Current `value` of an input: the assigned value, else its `value` attribute
    pub fn value_of(&self, element: &SnapshotElement) -> Result<Option<String>> {
        let state = self.lock()?;
        check_generation(&state, element)?;
        if let Some(value) = state.values.get(&element.index) {
            return Ok(Some(value.clone()));
        }
        let document = Html::parse_document(&state.html);
        let el = resolve(&document, element)?;
        Ok(el.value().attr("value").map(str::to_string))
    }

    fn lock(&self) -> Result<MutexGuard<'_, SnapshotState>> {
        self.state
            .lock()
            .map_err(|_| ClipbookError::SnapshotError("snapshot state poisoned".to_string()))
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ClipbookError::InvalidSelector(format!("{}: {:?}", selector, e)))
}

fn all_elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.root_element().descendants().filter_map(ElementRef::wrap)
}

fn check_generation(state: &SnapshotState, element: &SnapshotElement) -> Result<()> {
    if element.generation != state.generation {
        return Err(ClipbookError::ElementNotFound(format!(
            "element #{} belongs to a replaced document",
            element.index
        )));
    }
    Ok(())
}

fn resolve<'a>(document: &'a Html, element: &SnapshotElement) -> Result<ElementRef<'a>> {
    all_elements(document).nth(element.index).ok_or_else(|| {
        ClipbookError::ElementNotFound(format!("element #{} is out of range", element.index))
    })
}

fn text_of(el: &ElementRef<'_>) -> String {
    el.text().collect()
}

#[async_trait]
impl PageDom for SnapshotPage {
    type Element = SnapshotElement;

    async fn query_all(&self, selector: &str) -> Result<Vec<SnapshotElement>> {
        let selector = parse_selector(selector)?;
        let state = self.lock()?;
        let document = Html::parse_document(&state.html);

        Ok(all_elements(&document)
            .enumerate()
            .filter(|(_, el)| selector.matches(el))
            .map(|(index, _)| SnapshotElement {
                generation: state.generation,
                index,
            })
            .collect())
    }

    async fn text_content(&self, element: &SnapshotElement) -> Result<String> {
        let state = self.lock()?;
        check_generation(&state, element)?;
        let document = Html::parse_document(&state.html);
        Ok(text_of(&resolve(&document, element)?))
    }

    async fn descendant_text(
        &self,
        element: &SnapshotElement,
        selector: &str,
    ) -> Result<Option<String>> {
        let selector = parse_selector(selector)?;
        let state = self.lock()?;
        check_generation(&state, element)?;
        let document = Html::parse_document(&state.html);
        let el = resolve(&document, element)?;
        Ok(el.select(&selector).next().map(|child| text_of(&child)))
    }

    async fn click(&self, element: &SnapshotElement) -> Result<()> {
        let mut state = self.lock()?;
        check_generation(&state, element)?;
        let text = {
            let document = Html::parse_document(&state.html);
            text_of(&resolve(&document, element)?).trim().to_string()
        };
        state.interactions.push(Interaction::Click {
            index: element.index,
            text,
        });
        Ok(())
    }

    async fn set_value(&self, element: &SnapshotElement, value: &str) -> Result<()> {
        let mut state = self.lock()?;
        check_generation(&state, element)?;
        state.values.insert(element.index, value.to_string());
        state.interactions.push(Interaction::SetValue {
            index: element.index,
            value: value.to_string(),
        });
        Ok(())
    }

    async fn dispatch_event(&self, element: &SnapshotElement, event_type: &str) -> Result<()> {
        let mut state = self.lock()?;
        check_generation(&state, element)?;
        state.interactions.push(Interaction::Event {
            index: element.index,
            event_type: event_type.to_string(),
        });
        Ok(())
    }
}
