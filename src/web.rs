//! Browser host: real DOM containers, `window` error hooks, embedded manifest.
//!
//! Compiled only with the `hydrate` feature.

use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast, JsValue};

use crate::config::LoaderConfig;
use crate::diagnostics::{Diagnostics, HostSignal};
use crate::error::{HostError, ManifestError};
use crate::host::RenderHost;
use crate::loader::GlooTimer;
use crate::page::{PageContext, PageManifest};
use crate::view::ViewNode;

// =============================================================================
// DOM HOST
// =============================================================================

/// Host writing serialized views into elements looked up by id.
#[derive(Clone, Debug)]
pub struct DomHost {
    document: web_sys::Document,
}

impl DomHost {
    /// `None` outside a window with a document.
    #[must_use]
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }

    fn element(&self, container_id: &str) -> Option<web_sys::Element> {
        self.document.get_element_by_id(container_id)
    }
}

impl RenderHost for DomHost {
    fn has_container(&self, container_id: &str) -> bool {
        self.element(container_id).is_some()
    }

    fn is_empty(&self, container_id: &str) -> bool {
        self.element(container_id).map_or(true, |el| el.inner_html().trim().is_empty())
    }

    fn mount(&self, container_id: &str, node: ViewNode) -> Result<(), HostError> {
        let el = self
            .element(container_id)
            .ok_or_else(|| HostError::ContainerNotFound(container_id.to_owned()))?;
        el.set_inner_html(&node.to_html());
        Ok(())
    }

    fn unmount(&self, container_id: &str) {
        if let Some(el) = self.element(container_id) {
            el.set_inner_html("");
        }
    }
}

// =============================================================================
// GLOBAL HANDLERS
// =============================================================================

/// Route `window` `error` and `unhandledrejection` events into diagnostics.
/// Listeners live for the rest of the page.
///
/// # Errors
///
/// Returns the JS exception if a listener could not be attached.
pub fn install_global_handlers(diagnostics: &Diagnostics) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let Some(window) = web_sys::window() else {
        return Ok(());
    };

    let errors = diagnostics.clone();
    let on_error = Closure::wrap(Box::new(move |event: web_sys::ErrorEvent| {
        let stack = js_sys::Reflect::get(&event.error(), &JsValue::from_str("stack"))
            .ok()
            .and_then(|v| v.as_string());
        let source = event.filename();
        errors.capture_host_signal(HostSignal::UncaughtError {
            message: event.message(),
            source: (!source.is_empty()).then_some(source),
            line: Some(event.lineno()),
            column: Some(event.colno()),
            component: None,
            stack,
        });
    }) as Box<dyn FnMut(web_sys::ErrorEvent)>);
    window.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())?;
    on_error.forget();

    let rejections = diagnostics.clone();
    let on_rejection = Closure::wrap(Box::new(move |event: web_sys::PromiseRejectionEvent| {
        rejections.capture_host_signal(HostSignal::UnhandledRejection { reason: describe(&event.reason()) });
    }) as Box<dyn FnMut(web_sys::PromiseRejectionEvent)>);
    window.add_event_listener_with_callback("unhandledrejection", on_rejection.as_ref().unchecked_ref())?;
    on_rejection.forget();

    tracing::debug!("global error handlers installed");
    Ok(())
}

fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{value:?}")
}

// =============================================================================
// PAGE BOOTSTRAP
// =============================================================================

/// Parse the manifest embedded as JSON text in element `element_id`.
///
/// # Errors
///
/// Returns [`ManifestError::MissingElement`] when the element is absent, or
/// the parse/validation error of [`PageManifest::from_json`].
pub fn read_manifest(element_id: &str) -> Result<PageManifest, ManifestError> {
    let text = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(element_id))
        .and_then(|el| el.text_content())
        .ok_or_else(|| ManifestError::MissingElement(element_id.to_owned()))?;
    PageManifest::from_json(&text)
}

/// Page context over the live document with browser timers and global
/// error capture installed. `None` outside a browser window.
#[must_use]
pub fn browser_page(config: LoaderConfig) -> Option<PageContext> {
    let host = DomHost::new()?;
    let page = PageContext::new(Rc::new(host), Rc::new(GlooTimer), config);
    if let Err(err) = install_global_handlers(page.diagnostics()) {
        tracing::warn!(error = ?err, "global error handlers not installed");
    }
    Some(page)
}

/// Entry point for pages: reads the manifest embedded in `manifest_element_id`
/// and mounts every target on the browser's task queue.
///
/// # Errors
///
/// Rejects when the manifest is missing or invalid, or when there is no
/// browser window.
#[wasm_bindgen(js_name = hydrate)]
pub fn hydrate(manifest_element_id: &str) -> Result<(), JsValue> {
    let manifest = read_manifest(manifest_element_id).map_err(|err| JsValue::from_str(&err.to_string()))?;
    let config = manifest.config.clone().unwrap_or_default();
    let page = browser_page(config).ok_or_else(|| JsValue::from_str("no browser window"))?;
    wasm_bindgen_futures::spawn_local(async move {
        let outcomes = page.mount_manifest(&manifest).await;
        let mounted = outcomes.iter().filter(|outcome| outcome.is_mounted()).count();
        tracing::info!(mounted, total = outcomes.len(), "page hydrated");
    });
    Ok(())
}
