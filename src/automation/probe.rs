//! Ordered selector probing.
//!
//! Strategies are tried top to bottom; within a strategy elements are scanned
//! in document order. The first element satisfying the predicate wins.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use super::dom::PageDom;
use super::target::{Predicate, TargetSpec};
use crate::error::{ClipbookError, Result};

/// A located element and the strategy that found it
#[derive(Debug, Clone)]
pub struct Match<E> {
    pub element: E,
    pub selector: String,
    pub strategy_index: usize,
}

/// Probe the page once for `spec`
pub async fn locate<D: PageDom>(dom: &D, spec: &TargetSpec) -> Result<Option<Match<D::Element>>> {
    for (strategy_index, selector) in spec.selectors.iter().enumerate() {
        let elements = match dom.query_all(selector).await {
            Ok(elements) => elements,
            Err(ClipbookError::InvalidSelector(e)) => {
                tracing::warn!(target_name = %spec.target, "Skipping selector: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        for element in elements {
            if satisfies(dom, &element, &spec.predicate).await? {
                tracing::debug!(
                    target_name = %spec.target,
                    selector = selector.as_str(),
                    strategy_index,
                    "Matched element"
                );
                return Ok(Some(Match {
                    element,
                    selector: selector.clone(),
                    strategy_index,
                }));
            }
        }
    }

    Ok(None)
}

async fn satisfies<D: PageDom>(dom: &D, element: &D::Element, predicate: &Predicate) -> Result<bool> {
    if !predicate.needs_text() {
        return Ok(true);
    }

    let text = dom.text_content(element).await?;
    if predicate.text_matches(&text) {
        return Ok(true);
    }

    if let Predicate::TextOrIcon {
        icon_selector,
        icon_text,
        ..
    } = predicate
    {
        let icon = match dom.descendant_text(element, icon_selector).await {
            Ok(icon) => icon,
            Err(ClipbookError::InvalidSelector(_)) => None,
            Err(e) => return Err(e),
        };
        return Ok(icon.as_deref() == Some(icon_text.as_str()));
    }

    Ok(false)
}

/// Re-probe every `poll_interval` until `spec` matches or `timeout` elapses.
///
/// The page is always probed at least once. A probe interrupted by the
/// document changing counts as a miss. `Ok(None)` means the deadline passed
/// without a match.
pub async fn wait_for<D: PageDom>(
    dom: &D,
    spec: &TargetSpec,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Option<Match<D::Element>>> {
    let deadline = Instant::now() + timeout;

    loop {
        match locate(dom, spec).await {
            Ok(Some(found)) => return Ok(Some(found)),
            Ok(None) => {}
            Err(ClipbookError::PageUnstable(e)) => {
                tracing::debug!(target_name = %spec.target, "Page changed while probing: {}", e);
            }
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(target_name = %spec.target, ?timeout, "Gave up waiting for element");
            return Ok(None);
        }
        sleep(poll_interval.min(deadline - now)).await;
    }
}
