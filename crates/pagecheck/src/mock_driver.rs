//! Scripted in-memory driver.
//!
//! [`MockDriver`] serves a small site of [`MockPage`] templates keyed by URL.
//! Navigating instantiates a fresh [`MockDocument`]; clicks run element
//! handlers that schedule [`Effect`]s, which land after their delay on the
//! next driver call. This models client-side redirects and asynchronous
//! content without a browser.
//!
//! CSS fragments are matched by a compound-selector subset: an optional tag
//! followed by any number of `#id`, `.class` and `[attr]` / `[attr op 'v']`
//! parts (`=`, `*=`, `^=`, `$=`, `~=`). Combinators and pseudo-classes are
//! rejected with a protocol error.

use crate::driver::{Driver, PNG_SIGNATURE};
use crate::locator::{Locator, Strategy};
use crate::result::{DriverError, DriverResult};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Identifier of an element inside one loaded document
pub type ElementId = u64;

/// Click behaviour attached to a [`MockElement`]
pub type ClickHandler = Arc<dyn Fn(&MockDocument) -> Vec<Effect> + Send + Sync>;

// =============================================================================
// ELEMENTS
// =============================================================================

/// Template of a DOM element
#[derive(Clone)]
pub struct MockElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    value: String,
    visible: bool,
    enabled: bool,
    obscured: bool,
    on_click: Option<ClickHandler>,
}

impl fmt::Debug for MockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockElement")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("text", &self.text)
            .field("value", &self.value)
            .field("visible", &self.visible)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl MockElement {
    /// Create a visible, enabled element
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            visible: true,
            enabled: true,
            obscured: false,
            on_click: None,
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Add a class
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        let classes = match self.attributes.get("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        let _ = self.attributes.insert("class".to_string(), classes);
        self
    }

    /// Set the rendered text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the initial value of an input
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Present in the DOM but not rendered
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Rendered but not accepting input
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Covered by another element
    #[must_use]
    pub const fn obscured(mut self) -> Self {
        self.obscured = true;
        self
    }

    /// Attach click behaviour
    #[must_use]
    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&MockDocument) -> Vec<Effect> + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(handler));
        self
    }

    /// Tag name
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Current input value
    #[must_use]
    pub fn current_value(&self) -> &str {
        &self.value
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn matches(&self, locator: &Locator) -> DriverResult<bool> {
        match locator.strategy() {
            Strategy::Css => {
                for fragment in locator.fragments() {
                    if Compound::parse(fragment)?.matches(self) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Strategy::Attribute(attr) => Ok(self
                .attribute(attr)
                .is_some_and(|value| locator.fragments().contains(&value))),
            Strategy::Text => Ok(locator
                .fragments()
                .iter()
                .any(|snippet| self.text.contains(snippet))),
        }
    }

    fn to_html(&self) -> String {
        let mut attrs: Vec<String> = self
            .attributes
            .iter()
            .map(|(k, v)| format!(" {k}=\"{}\"", escape_html(v)))
            .collect();
        if !self.value.is_empty() {
            attrs.push(format!(" value=\"{}\"", escape_html(&self.value)));
        }
        if !self.visible {
            attrs.push(" hidden".to_string());
        }
        if !self.enabled {
            attrs.push(" disabled".to_string());
        }
        let attrs = attrs.concat();
        if self.tag == "input" {
            format!("<input{attrs}>")
        } else {
            format!("<{tag}{attrs}>{}</{tag}>", escape_html(&self.text), tag = self.tag)
        }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// =============================================================================
// CSS COMPOUND SELECTORS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    Attr {
        name: String,
        op: AttrOp,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"^(?:\*|[a-zA-Z][a-zA-Z0-9-]*)").expect("valid tag regex"))
}

fn part_pattern() -> &'static Regex {
    static PART: OnceLock<Regex> = OnceLock::new();
    PART.get_or_init(|| {
        Regex::new(
            r#"^(?:#([\w-]+)|\.([\w-]+)|\[\s*([\w-]+)\s*(?:([*^$~]?=)\s*(?:'([^']*)'|"([^"]*)"|([\w-]+))\s*)?\])"#,
        )
        .expect("valid selector regex")
    })
}

impl Compound {
    fn parse(selector: &str) -> DriverResult<Self> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(DriverError::protocol("empty selector"));
        }

        let (tag, mut rest) = match tag_pattern().find(selector) {
            Some(m) => (Some(m.as_str().to_ascii_lowercase()), &selector[m.end()..]),
            None => (None, selector),
        };

        let mut conditions = Vec::new();
        while !rest.is_empty() {
            let caps = part_pattern().captures(rest).ok_or_else(|| {
                DriverError::protocol(format!("unsupported selector syntax in '{selector}'"))
            })?;
            let condition = if let Some(id) = caps.get(1) {
                Condition::Id(id.as_str().to_string())
            } else if let Some(class) = caps.get(2) {
                Condition::Class(class.as_str().to_string())
            } else {
                let name = caps.get(3).map_or("", |m| m.as_str()).to_string();
                let value = [5, 6, 7]
                    .iter()
                    .find_map(|&i| caps.get(i))
                    .map_or(String::new(), |m| m.as_str().to_string());
                let op = match caps.get(4).map(|m| m.as_str()) {
                    None => AttrOp::Exists,
                    Some("=") => AttrOp::Equals,
                    Some("*=") => AttrOp::Contains,
                    Some("^=") => AttrOp::Prefix,
                    Some("$=") => AttrOp::Suffix,
                    Some(_) => AttrOp::Word,
                };
                Condition::Attr { name, op, value }
            };
            conditions.push(condition);
            rest = &rest[caps.get(0).map_or(rest.len(), |m| m.end())..];
        }

        Ok(Self {
            tag: tag.filter(|t| t != "*"),
            conditions,
        })
    }

    fn matches(&self, element: &MockElement) -> bool {
        if self.tag.as_deref().is_some_and(|t| t != element.tag) {
            return false;
        }
        self.conditions.iter().all(|condition| match condition {
            Condition::Id(id) => element.attribute("id") == Some(id.as_str()),
            Condition::Class(class) => element.has_class(class),
            Condition::Attr { name, op, value } => {
                element.attribute(name).is_some_and(|actual| match op {
                    AttrOp::Exists => true,
                    AttrOp::Equals => actual == value,
                    AttrOp::Contains => actual.contains(value.as_str()),
                    AttrOp::Prefix => actual.starts_with(value.as_str()),
                    AttrOp::Suffix => actual.ends_with(value.as_str()),
                    AttrOp::Word => actual.split_whitespace().any(|w| w == value),
                })
            }
        })
    }
}

// =============================================================================
// PAGES, DOCUMENTS, EFFECTS
// =============================================================================

/// A state change applied to the loaded document
#[derive(Debug, Clone)]
pub enum Change {
    /// Client-side navigation to another URL
    Navigate(String),
    /// Append an element to the document
    Insert(MockElement),
    /// Remove every element matching the locator
    Remove(Locator),
    /// Make matching elements visible
    Show(Locator),
    /// Hide matching elements
    Hide(Locator),
    /// Enable matching elements
    Enable(Locator),
}

/// A [`Change`] that lands after a delay
#[derive(Debug, Clone)]
pub struct Effect {
    /// Delay measured from scheduling
    pub delay: Duration,
    /// The change to apply
    pub change: Change,
}

impl Effect {
    /// Apply on the next driver call
    #[must_use]
    pub const fn now(change: Change) -> Self {
        Self {
            delay: Duration::ZERO,
            change,
        }
    }

    /// Apply once `delay` has passed
    #[must_use]
    pub const fn after(delay: Duration, change: Change) -> Self {
        Self { delay, change }
    }
}

/// Template served for one URL
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    title: String,
    elements: Vec<MockElement>,
    on_load: Vec<Effect>,
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Append an element in document order
    #[must_use]
    pub fn element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Schedule an effect every time the page loads
    #[must_use]
    pub fn on_load(mut self, effect: Effect) -> Self {
        self.on_load.push(effect);
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    id: ElementId,
    element: MockElement,
}

/// A loaded page: what click handlers observe
#[derive(Debug, Clone, Default)]
pub struct MockDocument {
    url: String,
    title: String,
    nodes: Vec<Node>,
}

impl MockDocument {
    /// URL of the document
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Value of the first element matching `locator`
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.element.matches(locator).unwrap_or(false))
            .map(|n| n.element.current_value())
    }

    fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn to_html(&self) -> String {
        let body: String = self.nodes.iter().map(|n| n.element.to_html()).collect();
        format!(
            "<html><head><title>{}</title></head><body>{body}</body></html>",
            escape_html(&self.title)
        )
    }
}

/// Handle to an element of one loaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockHandle {
    id: ElementId,
    generation: u64,
}

#[derive(Debug, Clone)]
struct Scheduled {
    due: Instant,
    change: Change,
}

fn route_key(url: &str) -> &str {
    url.trim_end_matches('/')
}

// =============================================================================
// DRIVER
// =============================================================================

/// Driver backed by a scripted in-memory site
#[derive(Debug, Default)]
pub struct MockDriver {
    routes: HashMap<String, MockPage>,
    document: MockDocument,
    generation: u64,
    next_id: ElementId,
    pending: Vec<Scheduled>,
    screenshot: Option<Vec<u8>>,
    closed: bool,
    quit_calls: usize,
    /// Call history for verification
    pub call_history: Vec<String>,
}

impl MockDriver {
    /// Create a driver with no routes, sitting on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self {
            document: MockDocument {
                url: "about:blank".to_string(),
                ..MockDocument::default()
            },
            ..Self::default()
        }
    }

    /// Serve `page` at `url` (trailing slash ignored)
    #[must_use]
    pub fn with_page(mut self, url: &str, page: MockPage) -> Self {
        self.add_page(url, page);
        self
    }

    /// Serve `page` at `url` (trailing slash ignored)
    pub fn add_page(&mut self, url: &str, page: MockPage) {
        let _ = self.routes.insert(route_key(url).to_string(), page);
    }

    /// Override screenshot bytes
    pub fn set_screenshot(&mut self, data: Vec<u8>) {
        self.screenshot = Some(data);
    }

    /// Schedule a change from outside, e.g. to mutate the DOM mid-test
    pub fn schedule(&mut self, effect: Effect) {
        self.pending.push(Scheduled {
            due: Instant::now() + effect.delay,
            change: effect.change,
        });
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// History entries that change page state (navigation and input)
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        self.call_history
            .iter()
            .map(String::as_str)
            .filter(|c| {
                ["navigate:", "click:", "clear:", "type:"]
                    .iter()
                    .any(|prefix| c.starts_with(prefix))
            })
            .collect()
    }

    /// Number of times `quit` was called
    #[must_use]
    pub const fn quit_calls(&self) -> usize {
        self.quit_calls
    }

    /// Whether the session was shut down
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Current input value of the first element matching `locator`
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<String> {
        self.document.value_of(locator).map(str::to_string)
    }

    fn load(&mut self, url: &str) {
        let page = self.routes.get(route_key(url)).cloned().unwrap_or_else(|| {
            MockPage::new("404 Not Found").element(MockElement::new("h1").text("Not Found"))
        });

        self.generation += 1;
        self.pending.clear();
        let nodes = page
            .elements
            .into_iter()
            .map(|element| {
                self.next_id += 1;
                Node {
                    id: self.next_id,
                    element,
                }
            })
            .collect();
        self.document = MockDocument {
            url: url.to_string(),
            title: page.title,
            nodes,
        };
        for effect in page.on_load {
            self.schedule(effect);
        }
    }

    fn apply(&mut self, change: Change) -> DriverResult<()> {
        match change {
            Change::Navigate(url) => self.load(&url),
            Change::Insert(element) => {
                self.next_id += 1;
                self.document.nodes.push(Node {
                    id: self.next_id,
                    element,
                });
            }
            Change::Remove(locator) => {
                let mut doomed = Vec::new();
                for node in &self.document.nodes {
                    if node.element.matches(&locator)? {
                        doomed.push(node.id);
                    }
                }
                self.document.nodes.retain(|n| !doomed.contains(&n.id));
            }
            Change::Show(locator) => self.update(&locator, |e| e.visible = true)?,
            Change::Hide(locator) => self.update(&locator, |e| e.visible = false)?,
            Change::Enable(locator) => self.update(&locator, |e| e.enabled = true)?,
        }
        Ok(())
    }

    fn update(&mut self, locator: &Locator, f: impl Fn(&mut MockElement)) -> DriverResult<()> {
        for node in &mut self.document.nodes {
            if node.element.matches(locator)? {
                f(&mut node.element);
            }
        }
        Ok(())
    }

    /// Apply due effects; fails once the session is closed
    fn tick(&mut self) -> DriverResult<()> {
        if self.closed {
            return Err(DriverError::SessionClosed);
        }
        let now = Instant::now();
        while let Some(pos) = self.pending.iter().position(|s| s.due <= now) {
            let scheduled = self.pending.remove(pos);
            self.apply(scheduled.change)?;
        }
        Ok(())
    }

    fn live(&self, handle: &MockHandle) -> DriverResult<&MockElement> {
        if handle.generation != self.generation {
            return Err(DriverError::stale("document was replaced by navigation"));
        }
        self.document
            .node(handle.id)
            .map(|n| &n.element)
            .ok_or_else(|| DriverError::stale("element was removed from the document"))
    }

    fn live_mut(&mut self, handle: &MockHandle) -> DriverResult<&mut MockElement> {
        if handle.generation != self.generation {
            return Err(DriverError::stale("document was replaced by navigation"));
        }
        self.document
            .node_mut(handle.id)
            .map(|n| &mut n.element)
            .ok_or_else(|| DriverError::stale("element was removed from the document"))
    }
}

impl Driver for MockDriver {
    type Element = MockHandle;

    fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.tick()?;
        self.call_history.push(format!("navigate:{url}"));
        self.load(url);
        Ok(())
    }

    fn find_all(&mut self, locator: &Locator) -> DriverResult<Vec<MockHandle>> {
        self.tick()?;
        self.call_history.push(format!("find:{}", locator.name()));
        let mut found = Vec::new();
        for node in &self.document.nodes {
            if node.element.matches(locator)? {
                found.push(MockHandle {
                    id: node.id,
                    generation: self.generation,
                });
            }
        }
        Ok(found)
    }

    fn click(&mut self, element: &MockHandle) -> DriverResult<()> {
        self.tick()?;
        self.call_history.push(format!("click:{}", element.id));
        let target = self.live(element)?;
        if !target.visible || !target.enabled || target.obscured {
            return Err(DriverError::protocol("element is not interactable"));
        }
        if let Some(handler) = target.on_click.clone() {
            let effects = handler(&self.document);
            for effect in effects {
                self.schedule(effect);
            }
        }
        Ok(())
    }

    fn clear(&mut self, element: &MockHandle) -> DriverResult<()> {
        self.tick()?;
        self.call_history.push(format!("clear:{}", element.id));
        self.live_mut(element)?.value.clear();
        Ok(())
    }

    fn type_text(&mut self, element: &MockHandle, text: &str) -> DriverResult<()> {
        self.tick()?;
        self.call_history.push(format!("type:{}:{text}", element.id));
        self.live_mut(element)?.value.push_str(text);
        Ok(())
    }

    fn text(&mut self, element: &MockHandle) -> DriverResult<String> {
        self.tick()?;
        Ok(self.live(element)?.text.clone())
    }

    fn is_displayed(&mut self, element: &MockHandle) -> DriverResult<bool> {
        self.tick()?;
        Ok(self.live(element)?.visible)
    }

    fn is_enabled(&mut self, element: &MockHandle) -> DriverResult<bool> {
        self.tick()?;
        Ok(self.live(element)?.enabled)
    }

    fn is_clickable(&mut self, element: &MockHandle) -> DriverResult<bool> {
        self.tick()?;
        let target = self.live(element)?;
        Ok(target.visible && target.enabled && !target.obscured)
    }

    fn current_url(&mut self) -> DriverResult<String> {
        self.tick()?;
        Ok(self.document.url.clone())
    }

    fn title(&mut self) -> DriverResult<String> {
        self.tick()?;
        Ok(self.document.title.clone())
    }

    fn screenshot(&mut self) -> DriverResult<Vec<u8>> {
        self.tick()?;
        self.call_history.push("screenshot".to_string());
        Ok(self
            .screenshot
            .clone()
            .unwrap_or_else(|| PNG_SIGNATURE.to_vec()))
    }

    fn page_source(&mut self) -> DriverResult<String> {
        self.tick()?;
        Ok(self.document.to_html())
    }

    fn quit(&mut self) -> DriverResult<()> {
        self.quit_calls += 1;
        self.call_history.push("quit".to_string());
        self.closed = true;
        self.pending.clear();
        Ok(())
    }
}

// =============================================================================
// DEMO LOGIN SITE
// =============================================================================

/// Parameters of the scripted login site
#[derive(Debug, Clone)]
pub struct DemoSite {
    /// Login form URL
    pub login_url: String,
    /// Landing page after a successful login
    pub projects_url: String,
    /// Accepted email
    pub valid_email: String,
    /// Accepted password
    pub valid_password: String,
    /// Delay of the client-side redirect after a successful submit
    pub redirect_delay: Duration,
    /// How long the projects page shows its loading spinner
    pub spinner_duration: Duration,
}

impl Default for DemoSite {
    fn default() -> Self {
        Self {
            login_url: "https://app.example.test/".to_string(),
            projects_url: "https://app.example.test/lk/projects".to_string(),
            valid_email: "test@example.com".to_string(),
            valid_password: "password".to_string(),
            redirect_delay: Duration::from_millis(150),
            spinner_duration: Duration::from_millis(100),
        }
    }
}

impl DemoSite {
    /// Build a driver serving this site
    #[must_use]
    pub fn driver(&self) -> MockDriver {
        let email = Locator::css("email input", &["input[type='email']"]);
        let password = Locator::css("password input", &["input[type='password']"]);
        let spinner = Locator::css("loading spinner", &[".spinner"]);

        let valid_email = self.valid_email.clone();
        let valid_password = self.valid_password.clone();
        let projects_url = self.projects_url.clone();
        let redirect_delay = self.redirect_delay;

        let submit = MockElement::new("button")
            .attr("type", "submit")
            .class("login-btn")
            .text("Войти")
            .on_click(move |doc| {
                let given_email = doc.value_of(&email).unwrap_or_default();
                let given_password = doc.value_of(&password).unwrap_or_default();
                // required fields block submission client-side
                if given_email.is_empty() || given_password.is_empty() {
                    return Vec::new();
                }
                if given_email == valid_email && given_password == valid_password {
                    vec![Effect::after(
                        redirect_delay,
                        Change::Navigate(projects_url.clone()),
                    )]
                } else {
                    vec![Effect::after(
                        Duration::from_millis(50),
                        Change::Insert(
                            MockElement::new("div")
                                .class("error-message")
                                .text("Неверный email или пароль"),
                        ),
                    )]
                }
            });

        let login = MockPage::new("Вход")
            .element(
                MockElement::new("input")
                    .attr("type", "email")
                    .attr("name", "email")
                    .id("email"),
            )
            .element(
                MockElement::new("input")
                    .attr("type", "password")
                    .attr("name", "password")
                    .id("password"),
            )
            .element(submit);

        let projects = MockPage::new("Проекты")
            .element(MockElement::new("div").class("spinner"))
            .element(MockElement::new("div").class("user-menu"))
            .element(MockElement::new("h1").class("welcome").text("Проекты"))
            .on_load(Effect::after(self.spinner_duration, Change::Remove(spinner)));

        MockDriver::new()
            .with_page(&self.login_url, login)
            .with_page(&self.projects_url, projects)
    }
}
