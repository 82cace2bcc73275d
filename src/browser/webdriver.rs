use std::fmt;

use serde_json::{Value, json};

use crate::browser::error::WebDriverError;

/// W3C web element identifier key.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Special key codepoints understood by "Element Send Keys".
pub mod keys {
    /// Releases held modifiers.
    pub const NULL: char = '\u{E000}';
    pub const ENTER: char = '\u{E007}';
    pub const CONTROL: char = '\u{E009}';
}

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(String),
    TagName(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn tag_name(tag: impl Into<String>) -> Self {
        Locator::TagName(tag.into())
    }

    /// The W3C `using` strategy name.
    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::XPath(_) => "xpath",
            Locator::TagName(_) => "tag name",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::XPath(v) | Locator::TagName(v) => v,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// Opaque handle to an element inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    /// Wire form used as a script argument.
    pub fn to_json(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        value[ELEMENT_KEY].as_str().map(|id| ElementRef(id.to_string()))
    }
}

/// The browser operations the page layer is written against.
///
/// `RemoteSession` drives a real browser through fantoccini; tests plug in
/// a scripted in-memory implementation.
pub trait WebDriver: fmt::Debug + Send {
    fn navigate(&mut self, url: &str) -> Result<(), WebDriverError>;

    fn current_url(&mut self) -> Result<String, WebDriverError>;

    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, WebDriverError>;

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, WebDriverError>;

    fn click(&mut self, element: &ElementRef) -> Result<(), WebDriverError>;

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), WebDriverError>;

    /// DOM property (`value` of an input, resolved `href` of a link).
    fn property(&mut self, element: &ElementRef, name: &str)
        -> Result<Option<String>, WebDriverError>;

    /// Rendered text of the element.
    fn text(&mut self, element: &ElementRef) -> Result<String, WebDriverError>;

    fn execute_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value, WebDriverError>;

    /// PNG bytes of the current viewport.
    fn screenshot_png(&mut self) -> Result<Vec<u8>, WebDriverError>;

    fn quit(&mut self) -> Result<(), WebDriverError>;
}

/// Select-all, type `value`, press Enter.
pub fn replace_value_keys(value: &str) -> String {
    format!("{}a{}{}{}", keys::CONTROL, keys::NULL, value, keys::ENTER)
}

impl<D: WebDriver + ?Sized> WebDriver for Box<D> {
    fn navigate(&mut self, url: &str) -> Result<(), WebDriverError> {
        (**self).navigate(url)
    }

    fn current_url(&mut self) -> Result<String, WebDriverError> {
        (**self).current_url()
    }

    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, WebDriverError> {
        (**self).find_element(locator)
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, WebDriverError> {
        (**self).is_displayed(element)
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), WebDriverError> {
        (**self).click(element)
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), WebDriverError> {
        (**self).send_keys(element, text)
    }

    fn property(&mut self, element: &ElementRef, name: &str)
        -> Result<Option<String>, WebDriverError> {
        (**self).property(element, name)
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, WebDriverError> {
        (**self).text(element)
    }

    fn execute_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value, WebDriverError> {
        (**self).execute_script(script, args)
    }

    fn screenshot_png(&mut self) -> Result<Vec<u8>, WebDriverError> {
        (**self).screenshot_png()
    }

    fn quit(&mut self) -> Result<(), WebDriverError> {
        (**self).quit()
    }
}
