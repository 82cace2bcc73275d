use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::browser::error::WebDriverError;
use crate::browser::webdriver::{ElementRef, Locator, WebDriver};

/// A live browser session behind chromedriver, geckodriver or msedgedriver
/// (or a Selenium server), driven through `fantoccini`.
///
/// The session owns a single-threaded tokio runtime and blocks on it for
/// every command, so the page layer above stays synchronous. Found
/// elements are kept by their W3C reference until the next navigation.
///
/// Dropping the session ends it; `detach` leaves the window open.
pub struct RemoteSession {
    client: Client,
    elements: HashMap<ElementRef, Element>,
    endpoint: String,
    closed: bool,
    runtime: Runtime,
}

impl RemoteSession {
    /// Open a new session with the given `alwaysMatch` capabilities.
    pub fn start(
        endpoint: &str,
        capabilities: &Value,
        connect_timeout: Duration,
    ) -> Result<Self, WebDriverError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(WebDriverError::Runtime)?;
        let caps = capabilities.as_object().cloned().unwrap_or_default();

        let connected = runtime.block_on(async {
            tokio::time::timeout(
                connect_timeout,
                ClientBuilder::native().capabilities(caps).connect(endpoint),
            )
            .await
        });
        let client = match connected {
            Ok(Ok(client)) => client,
            Ok(Err(source)) => {
                return Err(WebDriverError::NewSession {
                    endpoint: endpoint.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(WebDriverError::ConnectTimeout {
                    endpoint: endpoint.to_string(),
                    after: connect_timeout,
                });
            }
        };

        let session_id = runtime.block_on(client.session_id()).ok().flatten();
        debug!(?session_id, %endpoint, "webdriver session started");

        Ok(RemoteSession {
            client,
            elements: HashMap::new(),
            endpoint: endpoint.to_string(),
            closed: false,
            runtime,
        })
    }

    /// Give up ownership of the browser window without closing it.
    pub fn detach(mut self) {
        match self.runtime.block_on(self.client.persist()) {
            Ok(()) => self.closed = true,
            Err(e) => warn!(error = %e, "could not detach from browser session"),
        }
    }

    fn element(&self, handle: &ElementRef) -> Result<&Element, WebDriverError> {
        self.elements
            .get(handle)
            .ok_or_else(|| WebDriverError::StaleElement(handle.0.clone()))
    }

    /// Keep the element under its W3C reference.
    fn remember(&mut self, element: Element) -> Result<ElementRef, WebDriverError> {
        let handle = serde_json::to_value(&element)
            .ok()
            .as_ref()
            .and_then(ElementRef::from_json)
            .ok_or(WebDriverError::MissingElementId)?;
        self.elements.insert(handle.clone(), element);
        Ok(handle)
    }
}

/// Fantoccini locator for a page locator. A bare tag name is a valid CSS
/// selector.
fn by(locator: &Locator) -> fantoccini::Locator<'_> {
    match locator {
        Locator::XPath(expr) => fantoccini::Locator::XPath(expr),
        Locator::TagName(tag) => fantoccini::Locator::Css(tag),
    }
}

impl fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSession")
            .field("endpoint", &self.endpoint)
            .field("elements", &self.elements.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl WebDriver for RemoteSession {
    fn navigate(&mut self, url: &str) -> Result<(), WebDriverError> {
        self.elements.clear();
        self.runtime
            .block_on(self.client.goto(url))
            .map_err(|e| WebDriverError::from_cmd("navigate", e))
    }

    fn current_url(&mut self) -> Result<String, WebDriverError> {
        self.runtime
            .block_on(self.client.current_url())
            .map(|url| url.to_string())
            .map_err(|e| WebDriverError::from_cmd("current_url", e))
    }

    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, WebDriverError> {
        let element = self
            .runtime
            .block_on(self.client.find(by(locator)))
            .map_err(|e| match WebDriverError::from_cmd("find_element", e) {
                WebDriverError::NoSuchElement(_) => WebDriverError::NoSuchElement(locator.to_string()),
                other => other,
            })?;
        self.remember(element)
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, WebDriverError> {
        let el = self.element(element)?;
        self.runtime
            .block_on(el.is_displayed())
            .map_err(|e| WebDriverError::from_cmd("is_displayed", e))
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), WebDriverError> {
        let el = self.element(element)?;
        self.runtime
            .block_on(el.click())
            .map_err(|e| WebDriverError::from_cmd("click", e))
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), WebDriverError> {
        let el = self.element(element)?;
        self.runtime
            .block_on(el.send_keys(text))
            .map_err(|e| WebDriverError::from_cmd("send_keys", e))
    }

    fn property(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>, WebDriverError> {
        let el = self.element(element)?;
        self.runtime
            .block_on(el.prop(name))
            .map_err(|e| WebDriverError::from_cmd("property", e))
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, WebDriverError> {
        let el = self.element(element)?;
        self.runtime
            .block_on(el.text())
            .map_err(|e| WebDriverError::from_cmd("text", e))
    }

    fn execute_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value, WebDriverError> {
        self.runtime
            .block_on(self.client.execute(script, args))
            .map_err(|e| WebDriverError::from_cmd("execute_script", e))
    }

    fn screenshot_png(&mut self) -> Result<Vec<u8>, WebDriverError> {
        self.runtime
            .block_on(self.client.screenshot())
            .map_err(|e| WebDriverError::from_cmd("screenshot", e))
    }

    fn quit(&mut self) -> Result<(), WebDriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.elements.clear();
        self.runtime
            .block_on(self.client.clone().close())
            .map_err(|e| WebDriverError::from_cmd("quit", e))?;
        debug!(endpoint = %self.endpoint, "webdriver session closed");
        Ok(())
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        if let Err(e) = self.quit() {
            warn!(error = %e, "failed to close browser session on drop");
        }
    }
}
