//! Command trees built from compact flag definitions.
//!
//! A command is declared with strings like `t,target <dir>`, `!force`,
//! `-jobs` or `...files`; the tree then routes an argument vector to the
//! matching subcommand and hands its action typed, defaulted values.
//!
//! ```
//! use xcmd::{Arg, Command};
//!
//! let cli = Command::main("pm", "1.0.0")
//!     .sub(
//!         Command::new("i, install [pkg!, ...files]")
//!             .arg(Arg::new("r,!recursive"))
//!             .action_sync(|ctx| {
//!                 let params = ctx.params.as_ref().unwrap();
//!                 assert_eq!(params.get_str("pkg"), Some("axios"));
//!                 assert_eq!(ctx.flags.get_bool("recursive"), Some(true));
//!                 Ok(())
//!             }),
//!     )
//!     .build()
//!     .unwrap();
//!
//! cli.run_blocking(["i", "axios", "a.js", "-r"]).unwrap();
//! ```
mod binder;
mod command;
mod config;
mod error;
mod help;
mod parser;
mod spec;
mod token;
mod value;

pub use crate::{
    binder::{bind, Binding},
    command::{Cli, Command, CommandInfo, CommandKind, Context, Outcome},
    config::{configure, settings, Settings, UnknownFlagHook},
    error::{DefinitionError, Error, UnknownFlag},
    help::{CommandSummary, HelpPage, PlainRender, Render},
    parser::{parse, parse_with, ParseOptions, ParsedArgs},
    spec::{compile_header, Arg, ArgSpec, CommandHeader, OptionSpec, ValueType},
    token::{
        is_flag, is_long_flag, is_numeric_like, is_short_flag, strip_sigil, strip_styling,
        to_camel_case, to_kebab_case,
    },
    value::Value,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
