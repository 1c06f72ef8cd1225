//! Process-wide settings.
//!
//! Settings are written at most once, through [`configure`], before any
//! command runs. Parsing and dispatch only ever read them.
use std::{fmt, ops::ControlFlow, sync::Arc};

use once_cell::sync::OnceCell;

use crate::{
    error::{DefinitionError, UnknownFlag},
    help::{PlainRender, Render},
    parser::ParseOptions,
};

/// Decides what happens to an undeclared flag: `Continue` keeps parsing,
/// `Break` aborts the pending action.
pub type UnknownFlagHook = Arc<dyn Fn(&UnknownFlag) -> ControlFlow<()> + Send + Sync>;

#[derive(Clone)]
pub struct Settings {
    /// `None` aborts on every undeclared flag.
    pub unknown_flag: Option<UnknownFlagHook>,
    /// Handle `-h`/`--help`.
    pub help: bool,
    /// Handle `-v`/`--version`.
    pub version: bool,
    /// Show help, rather than running the action, when no arguments are given.
    pub help_on_empty: bool,
    pub parse: ParseOptions,
    pub renderer: Arc<dyn Render + Send + Sync>,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            unknown_flag: None,
            help: true,
            version: true,
            help_on_empty: true,
            parse: ParseOptions::default(),
            renderer: Arc::new(PlainRender),
        }
    }
}

impl Settings {
    pub fn unknown_flag(
        mut self,
        hook: impl Fn(&UnknownFlag) -> ControlFlow<()> + Send + Sync + 'static,
    ) -> Settings {
        self.unknown_flag = Some(Arc::new(hook));
        self
    }

    pub fn help_on_empty(mut self, yes: bool) -> Settings {
        self.help_on_empty = yes;
        self
    }

    pub fn parse_options(mut self, parse: ParseOptions) -> Settings {
        self.parse = parse;
        self
    }

    pub fn renderer(mut self, renderer: impl Render + Send + Sync + 'static) -> Settings {
        self.renderer = Arc::new(renderer);
        self
    }

    pub(crate) fn on_unknown(&self, flag: &UnknownFlag) -> ControlFlow<()> {
        match &self.unknown_flag {
            Some(hook) => hook(flag),
            None => ControlFlow::Break(()),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("unknown_flag", &self.unknown_flag.as_ref().map(|_| ".."))
            .field("help", &self.help)
            .field("version", &self.version)
            .field("help_on_empty", &self.help_on_empty)
            .field("parse", &self.parse)
            .finish_non_exhaustive()
    }
}

static SETTINGS: OnceCell<Arc<Settings>> = OnceCell::new();

/// Installs process-wide settings.
///
/// Fails if settings were already configured, or already read by a
/// running command.
pub fn configure(settings: Settings) -> Result<(), DefinitionError> {
    SETTINGS.set(Arc::new(settings)).map_err(|_| DefinitionError::AlreadyConfigured)
}

/// The process-wide settings, defaults if [`configure`] was never called.
pub fn settings() -> Arc<Settings> {
    SETTINGS.get_or_init(|| Arc::new(Settings::default())).clone()
}
