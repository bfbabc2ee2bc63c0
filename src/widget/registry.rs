//! Explicit registry of live widgets.
//!
//! A host that embeds several widgets keeps one registry, initializes each
//! widget through it, and tears them all down together. There is no global
//! instance; whoever owns the host owns the registry.

use std::sync::Arc;

use log::info;

use crate::core::config::{ConfigError, WidgetOptions};
use crate::transport::ChatTransport;
use crate::widget::{Surface, Widget};

pub struct WidgetRegistry<S: Surface> {
    instances: Vec<Widget<S>>,
}

impl<S: Surface> Default for WidgetRegistry<S> {
    fn default() -> Self {
        Self {
            instances: Vec::new(),
        }
    }
}

impl<S: Surface> WidgetRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds, mounts and registers a widget talking HTTP to its backend.
    pub fn init(&mut self, options: WidgetOptions, surface: S) -> Result<&mut Widget<S>, ConfigError> {
        let widget = Widget::new(options, surface)?;
        Ok(self.register(widget))
    }

    pub fn init_with_transport(
        &mut self,
        options: WidgetOptions,
        transport: Arc<dyn ChatTransport>,
        surface: S,
    ) -> Result<&mut Widget<S>, ConfigError> {
        let widget = Widget::with_transport(options, transport, surface)?;
        Ok(self.register(widget))
    }

    fn register(&mut self, mut widget: Widget<S>) -> &mut Widget<S> {
        widget.mount();
        self.instances.push(widget);
        let index = self.instances.len() - 1;
        &mut self.instances[index]
    }

    pub fn instances(&self) -> &[Widget<S>] {
        &self.instances
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Widget<S>> {
        self.instances.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Destroys every registered widget, newest first, and empties the registry.
    pub fn destroy_all(&mut self) {
        let count = self.instances.len();
        while let Some(mut widget) = self.instances.pop() {
            widget.destroy();
        }
        info!("Destroyed {} widget(s)", count);
    }
}
