//! The command tree.
//!
//! A [`Command`] owns its options, arguments, and subcommands. Every mutation
//! is applied to the local [`CommandDef`] first and then mirrored to the
//! native engine when the command is bound to one, so a command can always
//! continue on the fallback engine without losing anything.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::definition::CommandDef;
use super::errors::DefinitionError;
use super::outcome::ParsedOutcome;
use super::value::{OptionMap, OptionValue};
use crate::engine::fallback;
use crate::engine::{BackendStatus, EngineError, Handle, NativeAdapter, Runtime};

/// Callback bound to a command, invoked with the positional arguments and
/// the parsed options.
pub type Action = Box<dyn FnMut(&[String], &OptionMap) -> anyhow::Result<()>>;

/// How a new command picks its engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineMode {
    /// Native when the runtime has an engine, fallback otherwise
    #[default]
    Auto,
    /// Always the fallback engine
    ForceFallback,
}

/// Why a command runs on the fallback engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// The runtime has no native engine
    Unavailable,
    /// Requested with [`EngineMode::ForceFallback`]
    Forced,
    /// The engine refused to register the command
    RegistrationFailed(String),
    /// A native call failed after registration
    Degraded(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Unavailable => write!(f, "native engine unavailable"),
            FallbackReason::Forced => write!(f, "fallback forced"),
            FallbackReason::RegistrationFailed(msg) => write!(f, "registration failed: {}", msg),
            FallbackReason::Degraded(msg) => write!(f, "degraded: {}", msg),
        }
    }
}

/// Which engine a command is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineBinding {
    Native(Handle),
    Fallback(FallbackReason),
}

/// Command half of [`CommandDiagnostics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSnapshot {
    pub name: String,
    pub fallback_mode: bool,
    pub fallback_reason: Option<String>,
    pub handle: Option<u64>,
    pub options_count: usize,
    pub arguments_count: usize,
    /// Engine failures recorded against this command
    pub issues: Vec<String>,
}

/// Read-only view of a command and the engine behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDiagnostics {
    pub command: CommandSnapshot,
    pub backend: BackendStatus,
}

/// A node in the command tree.
pub struct Command {
    runtime: Rc<Runtime>,
    def: CommandDef,
    aliases: Vec<String>,
    /// Ancestor names, root first
    lineage: Vec<String>,
    children: IndexMap<String, Command>,
    action: Option<Action>,
    binding: EngineBinding,
    issues: Vec<String>,
}

impl Command {
    /// Create a command, binding it to the native engine when one is available.
    pub fn new(runtime: &Rc<Runtime>, name: impl Into<String>) -> Self {
        Self::with_mode(runtime, name, EngineMode::Auto)
    }

    /// Create a command with an explicit engine choice.
    pub fn with_mode(runtime: &Rc<Runtime>, name: impl Into<String>, mode: EngineMode) -> Self {
        let name = name.into();
        let mut issues = Vec::new();

        let binding = match mode {
            EngineMode::ForceFallback => EngineBinding::Fallback(FallbackReason::Forced),
            EngineMode::Auto if !runtime.is_available() => {
                runtime.notify_fallback();
                EngineBinding::Fallback(FallbackReason::Unavailable)
            }
            EngineMode::Auto => match runtime.with_engine(|engine| engine.create_command(&name)) {
                Ok(handle) => EngineBinding::Native(handle),
                Err(err) => {
                    tracing::warn!(
                        "could not register `{}` with the native engine: {}",
                        name,
                        err
                    );
                    issues.push(err.to_string());
                    EngineBinding::Fallback(FallbackReason::RegistrationFailed(err.to_string()))
                }
            },
        };

        Self::from_parts(runtime, name, binding, issues)
    }

    fn from_parts(
        runtime: &Rc<Runtime>,
        name: String,
        binding: EngineBinding,
        issues: Vec<String>,
    ) -> Self {
        Command {
            runtime: Rc::clone(runtime),
            def: CommandDef::new(name),
            aliases: Vec::new(),
            lineage: Vec::new(),
            children: IndexMap::new(),
            action: None,
            binding,
            issues,
        }
    }

    // ------------------------------------------------------------------
    // Engine plumbing
    // ------------------------------------------------------------------

    /// Apply a mirrored call to the native engine, degrading on failure.
    fn mirror(&mut self, call: impl FnOnce(&mut NativeAdapter, Handle) -> Result<(), EngineError>) {
        let EngineBinding::Native(handle) = self.binding else {
            return;
        };
        if let Err(err) = self.runtime.with_engine(|engine| call(engine, handle)) {
            self.degrade(err);
        }
    }

    /// Move this command onto the fallback engine for the rest of its life.
    fn degrade(&mut self, err: EngineError) {
        tracing::warn!(
            "command `{}` switched to the fallback engine: {}",
            self.def.name,
            err
        );
        let message = err.to_string();
        self.issues.push(message.clone());
        if let EngineBinding::Native(handle) = self.binding {
            if let Err(release) = self.runtime.with_engine(|engine| engine.release(handle)) {
                tracing::debug!("release of handle {} failed: {}", handle, release);
            }
        }
        self.binding = EngineBinding::Fallback(FallbackReason::Degraded(message));
    }

    /// Scan `tokens` on the bound engine.
    pub fn parse_tokens(&mut self, tokens: &[String]) -> ParsedOutcome {
        if let EngineBinding::Native(handle) = self.binding {
            match self
                .runtime
                .with_engine(|engine| engine.parse_args(handle, tokens))
            {
                Ok(outcome) => return outcome,
                Err(err) => self.degrade(err),
            }
        }
        fallback::parse_args(&self.def, tokens)
    }

    /// Rendered help text from the bound engine.
    ///
    /// The native engine only knows subcommands that are bound to it, so a
    /// command with any fallback child renders locally.
    pub fn help_text(&mut self) -> String {
        if let EngineBinding::Native(handle) = self.binding {
            if !self.children.values().any(Command::is_fallback) {
                match self.runtime.with_engine(|engine| engine.get_help(handle)) {
                    Ok(text) => return text,
                    Err(err) => self.degrade(err),
                }
            }
        }
        let subcommands: Vec<(String, String)> = self
            .children
            .values()
            .map(|c| (c.def.name.clone(), c.def.description.clone()))
            .collect();
        fallback::get_help(&self.def, &self.qualified_name(), &subcommands)
    }

    /// Print help to stdout.
    pub fn output_help(&mut self) {
        print!("{}", self.help_text());
    }

    /// Print help to stdout and exit successfully.
    pub fn help(&mut self) -> ! {
        self.output_help();
        let _ = std::io::Write::flush(&mut std::io::stdout());
        std::process::exit(0)
    }

    // ------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------

    /// Add a subcommand and return it for further configuration.
    ///
    /// A subcommand with the same name replaces the earlier one.
    pub fn command(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Command {
        let name = name.into();
        let mut child = match &self.binding {
            EngineBinding::Native(_) | EngineBinding::Fallback(FallbackReason::Unavailable) => {
                Command::new(&self.runtime, name.clone())
            }
            EngineBinding::Fallback(FallbackReason::Forced) => {
                Command::with_mode(&self.runtime, name.clone(), EngineMode::ForceFallback)
            }
            EngineBinding::Fallback(_) => Command::from_parts(
                &self.runtime,
                name.clone(),
                EngineBinding::Fallback(FallbackReason::Degraded(format!(
                    "parent `{}` runs on the fallback engine",
                    self.def.name
                ))),
                Vec::new(),
            ),
        };
        child.lineage = self.lineage.clone();
        child.lineage.push(self.def.name.clone());

        let description = description.into();
        if !description.is_empty() {
            child.description(description);
        }

        if let (EngineBinding::Native(parent), EngineBinding::Native(handle)) =
            (&self.binding, &child.binding)
        {
            let (parent, handle) = (*parent, *handle);
            if let Err(err) = self
                .runtime
                .with_engine(|engine| engine.add_child(parent, handle))
            {
                child.degrade(err);
            }
        }

        if self.children.shift_remove(&name).is_some() {
            tracing::warn!("subcommand `{}` on `{}` was redefined", name, self.def.name);
        }
        let (index, _) = self.children.insert_full(name, child);
        &mut self.children[index]
    }

    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        self.mirror(|engine, handle| engine.set_description(handle, &text));
        self.def.description = text;
        self
    }

    pub fn version(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        self.mirror(|engine, handle| engine.set_version(handle, &text));
        self.def.version = Some(text);
        self
    }

    /// Add an option from a flag spec such as `"-p, --port <number>"`.
    ///
    /// An invalid spec is logged and ignored; use [`Command::try_option`] to
    /// handle the error.
    pub fn option(&mut self, flags: &str, description: &str) -> &mut Self {
        self.option_or_log(flags, description, None)
    }

    /// Add an option with a default value.
    pub fn option_with_default(
        &mut self,
        flags: &str,
        description: &str,
        default: impl Into<OptionValue>,
    ) -> &mut Self {
        self.option_or_log(flags, description, Some(default.into()))
    }

    fn option_or_log(
        &mut self,
        flags: &str,
        description: &str,
        default: Option<OptionValue>,
    ) -> &mut Self {
        if let Err(err) = self.try_option(flags, description, default) {
            tracing::warn!("ignoring option on `{}`: {}", self.def.name, err);
        }
        self
    }

    /// Add an option, reporting an invalid spec or a duplicate key.
    pub fn try_option(
        &mut self,
        flags: &str,
        description: &str,
        default: Option<OptionValue>,
    ) -> Result<&mut Self, DefinitionError> {
        fallback::add_option(&mut self.def, flags, description, default.clone())?;
        self.mirror(|engine, handle| engine.add_option(handle, flags, description, default.as_ref()));
        Ok(self)
    }

    /// Leave an option out of help. `key` is its long name without dashes,
    /// or its short letter when it has no long flag.
    pub fn hide_option(&mut self, key: &str) -> &mut Self {
        match fallback::hide_option(&mut self.def, key, true) {
            Ok(()) => self.mirror(|engine, handle| engine.set_option_hidden(handle, key, true)),
            Err(err) => tracing::warn!("cannot hide option: {}", err),
        }
        self
    }

    /// Read an option from environment variable `var` when its flag is not
    /// given. The variable is shown in help as `(env: VAR)`.
    pub fn option_env(&mut self, key: &str, var: &str) -> &mut Self {
        match fallback::set_option_env(&mut self.def, key, var) {
            Ok(()) => self.mirror(|engine, handle| engine.set_option_env(handle, key, var)),
            Err(err) => tracing::warn!("cannot attach `{}` to an option: {}", var, err),
        }
        self
    }

    /// Add a positional argument such as `"<file>"` or `"[files...]"`.
    pub fn argument(&mut self, token: &str, description: &str) -> &mut Self {
        if let Err(err) = self.try_argument(token, description, None) {
            tracing::warn!("ignoring argument on `{}`: {}", self.def.name, err);
        }
        self
    }

    /// Add a positional argument. `required` overrides the bracket notation.
    pub fn try_argument(
        &mut self,
        token: &str,
        description: &str,
        required: Option<bool>,
    ) -> Result<&mut Self, DefinitionError> {
        fallback::add_argument(&mut self.def, token, description, required)?;
        let required = self.def.arguments.last().map_or(true, |a| a.required);
        self.mirror(|engine, handle| engine.add_argument(handle, token, description, required));
        Ok(self)
    }

    pub fn action<F>(&mut self, action: F) -> &mut Self
    where
        F: FnMut(&[String], &OptionMap) -> anyhow::Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    pub fn alias(&mut self, name: impl Into<String>) -> &mut Self {
        self.aliases.push(name.into());
        self
    }

    pub fn aliases<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(names.into_iter().map(Into::into));
        self
    }

    /// Accept long options that were never defined.
    pub fn allow_unknown_option(&mut self, allow: bool) -> &mut Self {
        self.mirror(|engine, handle| engine.set_allow_unknown(handle, allow));
        self.def.allow_unknown = allow;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn get_name(&self) -> &str {
        &self.def.name
    }

    pub fn get_description(&self) -> &str {
        &self.def.description
    }

    pub fn get_version(&self) -> Option<&str> {
        self.def.version.as_deref()
    }

    pub fn get_aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn get_allow_unknown_option(&self) -> bool {
        self.def.allow_unknown
    }

    pub fn options_count(&self) -> usize {
        self.def.options.len()
    }

    pub fn arguments_count(&self) -> usize {
        self.def.arguments.len()
    }

    /// The engine-independent definition of this command.
    pub fn definition(&self) -> &CommandDef {
        &self.def
    }

    pub fn binding(&self) -> &EngineBinding {
        &self.binding
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.binding, EngineBinding::Fallback(_))
    }

    pub fn handle(&self) -> Option<Handle> {
        match self.binding {
            EngineBinding::Native(handle) => Some(handle),
            EngineBinding::Fallback(_) => None,
        }
    }

    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.runtime
    }

    /// Ancestor names and this command's name, space separated.
    pub fn qualified_name(&self) -> String {
        self.lineage
            .iter()
            .chain(std::iter::once(&self.def.name))
            .filter(|name| !name.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Subcommands in registration order.
    pub fn subcommands(&self) -> impl Iterator<Item = &Command> {
        self.children.values()
    }

    /// Find a direct subcommand by name or alias.
    pub fn find_subcommand(&self, token: &str) -> Option<&Command> {
        self.child_index(token).map(|index| &self.children[index])
    }

    pub(crate) fn child_index(&self, token: &str) -> Option<usize> {
        self.children.get_index_of(token).or_else(|| {
            self.children
                .values()
                .position(|child| child.aliases.iter().any(|alias| alias == token))
        })
    }

    pub(crate) fn child_at_mut(&mut self, index: usize) -> &mut Command {
        &mut self.children[index]
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Run the bound action, if there is one.
    pub(crate) fn run_action(
        &mut self,
        arguments: &[String],
        options: &OptionMap,
    ) -> Option<anyhow::Result<()>> {
        self.action
            .as_mut()
            .map(|action| action(arguments, options))
    }

    /// Snapshot of this command and the runtime's engine state.
    pub fn diagnostics(&self) -> CommandDiagnostics {
        let fallback_reason = match &self.binding {
            EngineBinding::Native(_) => None,
            EngineBinding::Fallback(reason) => Some(reason.to_string()),
        };
        CommandDiagnostics {
            command: CommandSnapshot {
                name: self.def.name.clone(),
                fallback_mode: self.is_fallback(),
                fallback_reason,
                handle: self.handle().map(Handle::get),
                options_count: self.options_count(),
                arguments_count: self.arguments_count(),
                issues: self.issues.clone(),
            },
            backend: self.runtime.backend_status(),
        }
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        if let EngineBinding::Native(handle) = self.binding {
            if let Err(err) = self.runtime.with_engine(|engine| engine.release(handle)) {
                tracing::debug!("release of handle {} failed: {}", handle, err);
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("def", &self.def)
            .field("aliases", &self.aliases)
            .field("lineage", &self.lineage)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("action", &self.action.is_some())
            .field("binding", &self.binding)
            .field("issues", &self.issues)
            .finish()
    }
}
