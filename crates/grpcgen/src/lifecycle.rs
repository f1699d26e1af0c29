//! Host integration.
//!
//! The plugin has two entry points into a host application: an explicit
//! `protoc` command and a listener on the host's post-update event. Both read
//! the project configuration afresh and go through [`Driver::run_once`]. They
//! differ in how failures surface:
//!
//! - the command returns the generator's exit code as its own;
//! - the listener turns a non-zero exit into [`GenerateError::HookFailed`],
//!   which aborts the host command that fired the event.
//!
//! When the project has no tool section the listener does nothing at all,
//! while the command still runs on its own options.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ToolConfig, TOOL_NAME};
use crate::driver::Driver;
use crate::env::EnvPaths;
use crate::error::{GenerateError, Result};

/// Name under which the explicit command is registered.
pub const PROTOC_COMMAND: &str = "protoc";

/// Project metadata provided by the host.
pub trait ProjectMetadata: Send + Sync {
    /// Returns the raw `[tool.<tool>]` table, if the project has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the project metadata cannot be read.
    fn tool_config(&self, tool: &str) -> Result<Option<serde_json::Value>>;

    /// Returns the importable module name of the project.
    fn module_name(&self) -> String;
}

/// Host lifecycle events the plugin can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Fired after the host has updated the project's dependencies.
    PostUpdate,
}

impl EventKind {
    /// Returns the event name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PostUpdate => "post-update",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle event as delivered to listeners.
#[derive(Debug, Clone)]
pub struct HostEvent {
    /// Which event fired.
    pub kind: EventKind,
    /// The managed environment of the triggering command.
    pub env: EnvPaths,
}

impl HostEvent {
    /// Creates a post-update event.
    #[must_use]
    pub const fn post_update(env: EnvPaths) -> Self {
        Self {
            kind: EventKind::PostUpdate,
            env,
        }
    }
}

/// Listener callback.
pub type EventHandler = Box<dyn Fn(&HostEvent) -> Result<()>>;

/// Host event subscription.
pub trait EventBus {
    /// Registers `handler` for events of `kind`.
    fn subscribe(&mut self, kind: EventKind, handler: EventHandler);
}

/// A command the host can run on demand.
pub trait HostCommand {
    /// Command name.
    fn name(&self) -> &'static str;

    /// Runs the command with command-line `options` and returns its exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not run to completion.
    fn execute(&self, options: ToolConfig, env: &EnvPaths) -> Result<i32>;
}

/// Builds a fresh command instance each time the host needs one.
pub type CommandFactory = Box<dyn Fn() -> Result<Box<dyn HostCommand>>>;

/// Registration surface exposed by the host.
pub trait Host {
    /// Registers a lazily built command.
    fn register_command(&mut self, name: &'static str, factory: CommandFactory);

    /// Returns the host's event bus, if it has one.
    fn event_bus(&mut self) -> Option<&mut dyn EventBus>;
}

/// The code-generation plugin.
pub struct GrpcPlugin {
    project: Arc<dyn ProjectMetadata>,
    driver: Driver,
}

impl fmt::Debug for GrpcPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcPlugin")
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

impl GrpcPlugin {
    /// Creates the plugin for a project.
    #[must_use]
    pub fn new(project: Arc<dyn ProjectMetadata>, driver: Driver) -> Self {
        Self { project, driver }
    }

    /// Registers the `protoc` command and, when possible, the post-update
    /// listener.
    pub fn activate(self: Arc<Self>, host: &mut dyn Host) {
        let plugin = Arc::clone(&self);
        host.register_command(
            PROTOC_COMMAND,
            Box::new(move || -> Result<Box<dyn HostCommand>> {
                Ok(Box::new(plugin.protoc_command()?))
            }),
        );

        match host.event_bus() {
            Some(bus) => {
                let plugin = Arc::clone(&self);
                bus.subscribe(
                    EventKind::PostUpdate,
                    Box::new(move |event: &HostEvent| plugin.on_post_update(event)),
                );
                debug!("Added protoc post-update listener");
            }
            None => warn!("Not adding post-update listener, host has no event bus"),
        }
    }

    /// Reads the tool section and fills in project defaults.
    ///
    /// Returns `None` when the project does not configure the plugin.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be read or the section is
    /// invalid.
    pub fn load_config(&self) -> Result<Option<ToolConfig>> {
        let Some(raw) = self.project.tool_config(TOOL_NAME)? else {
            return Ok(None);
        };
        let config = ToolConfig::from_value(raw)?;
        Ok(Some(config.with_project_defaults(&self.project.module_name())))
    }

    /// Builds the explicit command with the current configuration as its
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn protoc_command(&self) -> Result<ProtocCommand> {
        Ok(ProtocCommand {
            defaults: self.load_config()?.unwrap_or_default(),
            module_name: self.project.module_name(),
            driver: self.driver.clone(),
        })
    }

    /// Handles a post-update event.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::HookFailed`] if the generator exits non-zero,
    /// or any pipeline error.
    pub fn on_post_update(&self, event: &HostEvent) -> Result<()> {
        let Some(config) = self.load_config()? else {
            debug!(
                tool = TOOL_NAME,
                "Skipped {} hook, tool section missing", event.kind
            );
            return Ok(());
        };

        info!(event = %event.kind, "Generating protobuf bindings");
        let result = self.driver.run_once(&config.resolve()?, &event.env)?;
        if result.success() {
            Ok(())
        } else {
            Err(GenerateError::HookFailed {
                event: event.kind.name(),
                code: result.code(),
            })
        }
    }
}

/// The explicit `protoc` command.
#[derive(Debug, Clone)]
pub struct ProtocCommand {
    defaults: ToolConfig,
    module_name: String,
    driver: Driver,
}

impl ProtocCommand {
    /// Returns the configured defaults for the command options.
    #[must_use]
    pub const fn defaults(&self) -> &ToolConfig {
        &self.defaults
    }
}

impl HostCommand for ProtocCommand {
    fn name(&self) -> &'static str {
        PROTOC_COMMAND
    }

    fn execute(&self, options: ToolConfig, env: &EnvPaths) -> Result<i32> {
        let config = self
            .defaults
            .clone()
            .merge(options)
            .with_project_defaults(&self.module_name)
            .resolve()?;
        Ok(self.driver.run_once(&config, env)?.code())
    }
}

/// Event listeners grouped by kind.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: BTreeMap<EventKind, Vec<EventHandler>>,
}

impl EventDispatcher {
    /// Delivers `event` to its listeners in registration order, stopping at
    /// the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first listener error.
    pub fn dispatch(&self, event: &HostEvent) -> Result<()> {
        for handler in self.listeners.get(&event.kind).into_iter().flatten() {
            handler(event)?;
        }
        Ok(())
    }

    /// Returns the number of listeners for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }
}

impl EventBus for EventDispatcher {
    fn subscribe(&mut self, kind: EventKind, handler: EventHandler) {
        self.listeners.entry(kind).or_default().push(handler);
    }
}

/// A minimal in-process host: a command registry plus an optional event
/// dispatcher.
pub struct HostApp {
    commands: BTreeMap<&'static str, CommandFactory>,
    dispatcher: Option<EventDispatcher>,
}

impl Default for HostApp {
    fn default() -> Self {
        Self::new()
    }
}

impl HostApp {
    /// Creates a host with an event dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
            dispatcher: Some(EventDispatcher::default()),
        }
    }

    /// Creates a host without an event dispatcher.
    #[must_use]
    pub fn without_event_bus() -> Self {
        Self {
            commands: BTreeMap::new(),
            dispatcher: None,
        }
    }

    /// Returns the registered command names.
    pub fn command_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Builds a registered command.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::UnknownCommand`] if `name` is not registered,
    /// or the factory's error.
    pub fn command(&self, name: &str) -> Result<Box<dyn HostCommand>> {
        let factory = self
            .commands
            .get(name)
            .ok_or_else(|| GenerateError::UnknownCommand {
                name: name.to_string(),
            })?;
        factory()
    }

    /// Runs a registered command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is unknown or fails to run.
    pub fn run_command(&self, name: &str, options: ToolConfig, env: &EnvPaths) -> Result<i32> {
        let command = self.command(name)?;
        debug!(command = command.name(), "Running host command");
        command.execute(options, env)
    }

    /// Fires `event`. Without an event dispatcher this does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first listener error.
    pub fn dispatch(&self, event: &HostEvent) -> Result<()> {
        self.dispatcher
            .as_ref()
            .map_or(Ok(()), |dispatcher| dispatcher.dispatch(event))
    }

    /// Returns the number of listeners for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.dispatcher
            .as_ref()
            .map_or(0, |dispatcher| dispatcher.listener_count(kind))
    }
}

impl Host for HostApp {
    fn register_command(&mut self, name: &'static str, factory: CommandFactory) {
        self.commands.insert(name, factory);
    }

    fn event_bus(&mut self) -> Option<&mut dyn EventBus> {
        self.dispatcher
            .as_mut()
            .map(|dispatcher| dispatcher as &mut dyn EventBus)
    }
}
