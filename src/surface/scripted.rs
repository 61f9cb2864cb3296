//! In-memory control surface with scripted misbehaviour, for unit tests.

use super::ControlSurface;
use crate::model::OptionEntry;
use crate::{Error, Result};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub(crate) const UNSET: &str = "Select ...";

type Pricing = Box<dyn Fn(&HashMap<String, String>) -> Option<String>>;

struct Control {
    entries: Vec<OptionEntry>,
    displayed: String,
}

#[derive(Default)]
struct State {
    controls: HashMap<String, Control>,
    open: Option<String>,
    alive: bool,
    ignored: HashMap<String, usize>,
    stale: HashMap<String, usize>,
    resets: HashMap<String, Vec<String>>,
    pricing: Option<Pricing>,
    price: Option<String>,
    activations: Vec<(String, String)>,
    kill_after: Option<usize>,
    blips: usize,
    waited_ms: u64,
    reloads: usize,
    screenshots: Vec<PathBuf>,
}

pub(crate) struct ScriptedSurface {
    state: RefCell<State>,
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                alive: true,
                ..Default::default()
            }),
        }
    }

    /// Add a control whose entries are plain text.
    pub fn control(self, name: &str, texts: &[&str]) -> Self {
        let entries = texts.iter().map(|t| OptionEntry::text(*t)).collect();
        self.control_entries(name, entries)
    }

    /// Add a control whose entries carry identifiers equal to their text.
    pub fn numeric_control(self, name: &str, values: &[&str]) -> Self {
        let entries = values
            .iter()
            .map(|v| OptionEntry::with_id(*v, *v))
            .collect();
        self.control_entries(name, entries)
    }

    pub fn control_entries(mut self, name: &str, entries: Vec<OptionEntry>) -> Self {
        self.state.get_mut().controls.insert(
            name.to_string(),
            Control {
                entries,
                displayed: UNSET.to_string(),
            },
        );
        self
    }

    /// The first `n` activations of `name` are accepted but change nothing.
    pub fn ignore_first(mut self, name: &str, n: usize) -> Self {
        self.state.get_mut().ignored.insert(name.to_string(), n);
        self
    }

    /// The first `n` activations of `name` fail as if the element went stale.
    pub fn stale_first(mut self, name: &str, n: usize) -> Self {
        self.state.get_mut().stale.insert(name.to_string(), n);
        self
    }

    /// Activating `name` puts every control in `others` back to unset.
    pub fn resets(mut self, name: &str, others: &[&str]) -> Self {
        self.state
            .get_mut()
            .resets
            .insert(name.to_string(), others.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Price text as a function of every control's displayed value.
    pub fn pricing(
        mut self,
        f: impl Fn(&HashMap<String, String>) -> Option<String> + 'static,
    ) -> Self {
        self.state.get_mut().pricing = Some(Box::new(f));
        self
    }

    /// The page dies once `n` activations have happened.
    pub fn kill_after(mut self, n: usize) -> Self {
        self.state.get_mut().kill_after = Some(n);
        self
    }

    /// The next `n` liveness checks report a dead page although it is not.
    pub fn alive_blips(mut self, n: usize) -> Self {
        self.state.get_mut().blips = n;
        self
    }

    /// Swallow the next `n` activations of `name` from here on.
    pub fn ignore_next(&self, name: &str, n: usize) {
        self.state.borrow_mut().ignored.insert(name.to_string(), n);
    }

    pub fn activations_of(&self, name: &str) -> usize {
        self.state
            .borrow()
            .activations
            .iter()
            .filter(|(c, _)| c == name)
            .count()
    }

    pub fn activation_log(&self) -> Vec<(String, String)> {
        self.state.borrow().activations.clone()
    }

    pub fn displayed(&self, name: &str) -> String {
        self.state
            .borrow()
            .controls
            .get(name)
            .map(|c| c.displayed.clone())
            .unwrap_or_default()
    }

    pub fn waited_ms(&self) -> u64 {
        self.state.borrow().waited_ms
    }

    pub fn reloads(&self) -> usize {
        self.state.borrow().reloads
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.state.borrow().screenshots.clone()
    }

    fn closed() -> Error {
        Error::Browser(eoka::Error::CdpSimple("target closed".into()))
    }
}

#[async_trait(?Send)]
impl ControlSurface for ScriptedSurface {
    async fn is_alive(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.blips > 0 {
            state.blips -= 1;
            return false;
        }
        state.alive
    }

    async fn wait(&self, ms: u64) {
        self.state.borrow_mut().waited_ms += ms;
    }

    async fn settle(&self) -> Result<()> {
        Ok(())
    }

    async fn dismiss(&self) -> Result<()> {
        self.state.borrow_mut().open = None;
        Ok(())
    }

    async fn open(&self, control: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.alive {
            return Err(Self::closed());
        }
        if !state.controls.contains_key(control) {
            return Err(Error::ControlNotFound(control.to_string()));
        }
        state.open = Some(control.to_string());
        Ok(())
    }

    async fn options(&self, control: &str) -> Result<Vec<OptionEntry>> {
        let state = self.state.borrow();
        state
            .controls
            .get(control)
            .map(|c| c.entries.clone())
            .ok_or_else(|| Error::ControlNotFound(control.to_string()))
    }

    async fn activate(&self, control: &str, index: usize) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.alive {
            return Err(Self::closed());
        }
        if state.open.as_deref() != Some(control) {
            return Err(Error::Browser(eoka::Error::ElementNotFound(format!(
                "menu of {} is not open",
                control
            ))));
        }
        let text = state
            .controls
            .get(control)
            .and_then(|c| c.entries.get(index))
            .map(|e| e.text.clone())
            .ok_or_else(|| Error::ControlNotFound(control.to_string()))?;

        state.activations.push((control.to_string(), text.clone()));
        state.open = None;
        if let Some(n) = state.kill_after {
            if state.activations.len() >= n {
                state.alive = false;
            }
        }

        if let Some(n) = state.stale.get_mut(control) {
            if *n > 0 {
                *n -= 1;
                return Err(Error::Browser(eoka::Error::ElementNotFound(
                    "stale element".into(),
                )));
            }
        }
        if let Some(n) = state.ignored.get_mut(control) {
            if *n > 0 {
                *n -= 1;
                return Ok(());
            }
        }

        if let Some(c) = state.controls.get_mut(control) {
            c.displayed = text;
        }
        let reset: Vec<String> = state.resets.get(control).cloned().unwrap_or_default();
        for other in reset {
            if let Some(c) = state.controls.get_mut(&other) {
                c.displayed = UNSET.to_string();
            }
        }
        Ok(())
    }

    async fn displayed_value(&self, control: &str) -> Result<String> {
        let state = self.state.borrow();
        if !state.alive {
            return Err(Self::closed());
        }
        state
            .controls
            .get(control)
            .map(|c| c.displayed.clone())
            .ok_or_else(|| Error::ControlNotFound(control.to_string()))
    }

    async fn clear_price(&self) -> Result<()> {
        self.state.borrow_mut().price = None;
        Ok(())
    }

    async fn request_price(&self) -> Result<()> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if !state.alive {
            return Err(Self::closed());
        }
        let shown: HashMap<String, String> = state
            .controls
            .iter()
            .map(|(k, c)| (k.clone(), c.displayed.clone()))
            .collect();
        let price = state.pricing.as_ref().and_then(|f| f(&shown));
        state.price = price;
        Ok(())
    }

    async fn price_text(&self) -> Result<Option<String>> {
        Ok(self.state.borrow().price.clone())
    }

    async fn reload(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.alive {
            return Err(Self::closed());
        }
        state.reloads += 1;
        state.open = None;
        state.price = None;
        for c in state.controls.values_mut() {
            c.displayed = UNSET.to_string();
        }
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.state.borrow_mut().screenshots.push(path.to_path_buf());
        Ok(())
    }
}
