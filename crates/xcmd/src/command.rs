//! Command tree and dispatch.
//!
//! [`Command`] is the builder; [`Command::build`] compiles every flag
//! string and header up front and freezes the tree into a [`Cli`]. Nodes
//! live in one arena, children are indices into it and each node keeps the
//! index of its parent.
use std::{cell::Cell, future::Future, sync::Arc};

use futures::future::{self, BoxFuture, FutureExt};
use strsim::levenshtein;

use crate::{
    binder::bind,
    config::{self, Settings},
    error::{DefinitionError, Error, UnknownFlag},
    help::{CommandSummary, HelpPage},
    parser::{parse_with, ParsedArgs},
    spec::{compile_header, Arg, ArgSpec, ValueType},
    token::{is_flag, is_long_flag, strip_sigil, strip_styling},
    Result,
};

type Action = Box<dyn Fn(Context) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Main,
    Sub,
}

/// Identity of the command an action runs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub aliases: Vec<String>,
    pub version: Option<String>,
    /// Names from the root down to this command, `pm install`.
    pub path: String,
    pub kind: CommandKind,
}

/// What an action gets to work with.
#[derive(Debug)]
pub struct Context {
    pub flags: ParsedArgs,
    /// Values of the positional parameters, if the command declares any
    /// and they were bound from the input.
    pub params: Option<ParsedArgs>,
    pub command: CommandInfo,
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action ran to completion.
    Done,
    /// Help was requested; the rendered page.
    Help(String),
    Version(String),
    /// The unknown-flag hook stopped the parse, no action ran.
    Aborted(UnknownFlag),
}

/// Declaration of a command and its subcommands.
pub struct Command {
    header: String,
    version: Option<String>,
    description: String,
    args: Vec<Arg>,
    params: Vec<Arg>,
    subs: Vec<Command>,
    action: Option<Action>,
    settings: Option<Settings>,
}

impl Command {
    /// The root command of a program.
    pub fn main(name: impl Into<String>, version: impl Into<String>) -> Command {
        Command::new(name).version(version)
    }

    /// A command from its header, `i,in, install [pkg!, ...files] <pkg>`.
    pub fn new(header: impl Into<String>) -> Command {
        Command {
            header: header.into(),
            version: None,
            description: String::new(),
            args: Vec::new(),
            params: Vec::new(),
            subs: Vec::new(),
            action: None,
            settings: None,
        }
    }

    /// Subcommands without a version of their own use their parent's.
    pub fn version(mut self, version: impl Into<String>) -> Command {
        self.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Command {
        self.description = description.into();
        self
    }

    pub fn arg(mut self, arg: impl Into<Arg>) -> Command {
        self.args.push(arg.into());
        self
    }

    pub fn args<I>(mut self, args: I) -> Command
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds a positional parameter after the ones listed in the header.
    pub fn param(mut self, param: impl Into<Arg>) -> Command {
        self.params.push(param.into());
        self
    }

    pub fn sub(mut self, sub: Command) -> Command {
        self.subs.push(sub);
        self
    }

    pub fn action<F, Fut>(mut self, f: F) -> Command
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.action = Some(Box::new(move |ctx| f(ctx).boxed()));
        self
    }

    pub fn action_sync<F>(mut self, f: F) -> Command
    where
        F: Fn(Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action = Some(Box::new(move |ctx| future::ready(f(ctx)).boxed()));
        self
    }

    /// Settings for this tree only, instead of the process-wide ones.
    /// Only honored on the root command.
    pub fn settings(mut self, settings: Settings) -> Command {
        self.settings = Some(settings);
        self
    }

    pub fn build(mut self) -> Result<Cli, DefinitionError> {
        let settings = self.settings.take().map(Arc::new);
        let mut cli = Cli { nodes: Vec::new(), settings };
        cli.add(self, None)?;
        tracing::debug!(commands = cli.nodes.len(), "built command tree");
        Ok(cli)
    }
}

struct Node {
    name: String,
    aliases: Vec<String>,
    hint: Option<String>,
    description: String,
    version: Option<String>,
    kind: CommandKind,
    flags: ArgSpec,
    params: ArgSpec,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    action: Option<Action>,
}

impl Node {
    fn matches(&self, candidate: &str) -> bool {
        let candidate = strip_styling(candidate);
        self.name == candidate || self.aliases.iter().any(|it| *it == candidate)
    }
}

/// A built command tree.
pub struct Cli {
    nodes: Vec<Node>,
    settings: Option<Arc<Settings>>,
}

enum Step<'a> {
    Done(Outcome),
    Run { action: &'a Action, ctx: Context },
}

impl Cli {
    fn add(&mut self, cmd: Command, parent: Option<NodeId>) -> Result<NodeId, DefinitionError> {
        let header = compile_header(&cmd.header)?;
        let params = header.params.iter().map(|it| Arg::new(it.as_str())).chain(cmd.params);
        let params = ArgSpec::compile(params)?;
        let flags = ArgSpec::compile(cmd.args)?;

        let id = self.nodes.len();
        let version = cmd.version.or_else(|| parent.and_then(|it| self.nodes[it].version.clone()));
        self.nodes.push(Node {
            name: header.name,
            aliases: header.aliases,
            hint: header.hint,
            description: cmd.description,
            version,
            kind: if parent.is_none() { CommandKind::Main } else { CommandKind::Sub },
            flags,
            params,
            parent,
            children: Vec::new(),
            action: cmd.action,
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }

        if cmd.subs.is_empty() && self.nodes[id].action.is_none() {
            return Err(DefinitionError::MissingAction(self.path(id)));
        }
        for sub in cmd.subs {
            let child = self.add(sub, Some(id))?;
            let node = &self.nodes[child];
            let taken = self.nodes[id].children.iter().filter(|&&it| it != child).find_map(|&it| {
                let other = &self.nodes[it];
                std::iter::once(&node.name).chain(&node.aliases).find(|name| other.matches(name))
            });
            if let Some(name) = taken {
                return Err(DefinitionError::DuplicateCommand {
                    parent: self.path(id),
                    name: name.clone(),
                });
            }
        }
        Ok(id)
    }

    /// Runs the command the arguments select.
    ///
    /// `args` excludes the program name, see [`Cli::run_or_exit`]. An
    /// action error is returned as [`Error::Action`], unchanged.
    ///
    /// A declared boolean flag in front of a command's arguments is moved
    /// behind them, once per command: `pm -D install x` runs as
    /// `pm install x -D`, but in `pm install -D -r x` only `-D` moves.
    pub async fn run<I>(&self, args: I) -> Result<Outcome>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let args = args.into_iter().map(Into::into).collect();
        self.dispatch(ROOT, args).await
    }

    pub fn run_blocking<I>(&self, args: I) -> Result<Outcome>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        futures::executor::block_on(self.run(args))
    }

    /// Runs the subcommand called `name`, wherever it is in the tree, as if
    /// it had been selected on the command line.
    pub async fn call<I>(&self, name: &str, args: I) -> Result<Outcome>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let id = match self.nodes.iter().skip(1).position(|it| it.matches(name)) {
            Some(idx) => idx + 1,
            None => {
                let names = self
                    .nodes
                    .iter()
                    .skip(1)
                    .flat_map(|it| std::iter::once(&it.name).chain(&it.aliases));
                return Err(Error::InvalidCommand {
                    command: name.to_string(),
                    suggestion: suggest(names, name),
                });
            }
        };
        let args = args.into_iter().map(Into::into).collect();
        self.dispatch(id, args).await
    }

    /// Runs with the process arguments, then exits on failure.
    ///
    /// Help and version go to stdout. Usage errors exit with status 2,
    /// action failures with status 1.
    pub fn run_or_exit(&self) {
        match self.run_blocking(std::env::args().skip(1)) {
            Ok(Outcome::Done) => (),
            Ok(Outcome::Help(help)) => print!("{help}"),
            Ok(Outcome::Version(version)) => println!("{version}"),
            Ok(Outcome::Aborted(flag)) => {
                eprintln!("error: {flag}");
                std::process::exit(2)
            }
            Err(err) => err.exit(),
        }
    }

    /// Help page of the root command.
    pub fn help(&self) -> String {
        self.render_help(ROOT, &self.settings())
    }

    pub fn info(&self) -> CommandInfo {
        self.command_info(ROOT)
    }

    fn settings(&self) -> Arc<Settings> {
        self.settings.clone().unwrap_or_else(config::settings)
    }

    async fn dispatch(&self, id: NodeId, args: Vec<String>) -> Result<Outcome> {
        match self.resolve(id, args)? {
            Step::Done(outcome) => Ok(outcome),
            Step::Run { action, ctx } => {
                tracing::debug!(command = %ctx.command.path, "running action");
                action(ctx).await.map_err(Error::Action)?;
                Ok(Outcome::Done)
            }
        }
    }

    fn resolve(&self, mut id: NodeId, mut args: Vec<String>) -> Result<Step<'_>> {
        let settings = self.settings();
        let mut rotated = false;
        loop {
            let node = &self.nodes[id];
            let first = match args.first() {
                Some(it) => it,
                None if settings.help_on_empty || node.action.is_none() => {
                    return Ok(Step::Done(Outcome::Help(self.render_help(id, &settings))));
                }
                None => return self.execute(id, args, &settings),
            };
            let help = settings.help && asks_for(node, &args, "help", "h");

            if is_flag(first) {
                if help {
                    return Ok(Step::Done(Outcome::Help(self.render_help(id, &settings))));
                }
                if let Some(version) = &node.version {
                    if settings.version && asks_for(node, &args, "version", "v") {
                        return Ok(Step::Done(Outcome::Version(version.clone())));
                    }
                }
                if !rotated && args.len() > 1 && is_boolean_flag(node, first) {
                    args.rotate_left(1);
                    rotated = true;
                    tracing::debug!(command = %node.name, ?args, "moved leading boolean flag to the end");
                    continue;
                }
                return self.execute(id, args, &settings);
            }

            if let Some(&child) = node.children.iter().find(|&&it| self.nodes[it].matches(first)) {
                tracing::debug!(command = %self.nodes[child].name, "matched subcommand");
                args.remove(0);
                id = child;
                rotated = false;
                continue;
            }
            if help {
                return Ok(Step::Done(Outcome::Help(self.render_help(id, &settings))));
            }
            if !node.params.is_empty() {
                return self.execute(id, args, &settings);
            }

            let names = node.children.iter().flat_map(|&it| {
                let child = &self.nodes[it];
                std::iter::once(&child.name).chain(&child.aliases)
            });
            return Err(Error::InvalidCommand {
                command: first.clone(),
                suggestion: suggest(names, first),
            });
        }
    }

    fn execute(&self, id: NodeId, args: Vec<String>, settings: &Settings) -> Result<Step<'_>> {
        let node = &self.nodes[id];
        let action = match &node.action {
            Some(it) => it,
            None => return Ok(Step::Done(Outcome::Help(self.render_help(id, settings)))),
        };

        let binding = bind(&node.params, &args)?;
        let path = self.path(id);
        let aborted = Cell::new(None);
        let hook = |flag: &str| {
            let unknown = UnknownFlag { flag: flag.to_string(), command: path.clone() };
            let res = settings.on_unknown(&unknown);
            if res.is_break() {
                aborted.set(Some(unknown));
            }
            res
        };

        let params = match binding.params {
            Some(tokens) => match parse_with(&tokens, &node.params, &settings.parse, Some(&hook)) {
                Some(it) => Some(it),
                None => return Ok(Step::Done(abort(aborted.take(), &path))),
            },
            None => None,
        };
        if let Some(params) = &params {
            if let Some(missing) = node.params.required().find(|it| !params.contains(&it.key())) {
                return Err(Error::MissingParameter(missing.name.clone()));
            }
        }
        let flags = match parse_with(&binding.flags, &node.flags, &settings.parse, Some(&hook)) {
            Some(it) => it,
            None => return Ok(Step::Done(abort(aborted.take(), &path))),
        };

        if let Some(missing) = node.flags.required().find(|it| !flags.contains(&it.key())) {
            return Err(Error::MissingFlag(missing.name.clone()));
        }

        let ctx = Context { flags, params, command: self.command_info(id) };
        Ok(Step::Run { action, ctx })
    }

    fn render_help(&self, id: NodeId, settings: &Settings) -> String {
        let node = &self.nodes[id];
        let commands = node
            .children
            .iter()
            .map(|&it| {
                let child = &self.nodes[it];
                CommandSummary {
                    name: &child.name,
                    aliases: &child.aliases,
                    hint: child.hint.as_deref(),
                    description: &child.description,
                }
            })
            .collect();
        let page = HelpPage {
            path: self.path(id),
            version: node.version.as_deref().filter(|_| node.kind == CommandKind::Main),
            hint: node.hint.as_deref(),
            description: &node.description,
            params: Some(&node.params).filter(|it| !it.is_empty()),
            flags: &node.flags,
            commands,
            help_flag: settings.help,
            version_flag: settings.version && node.version.is_some(),
        };
        settings.renderer.render(&page)
    }

    fn command_info(&self, id: NodeId) -> CommandInfo {
        let node = &self.nodes[id];
        CommandInfo {
            name: node.name.clone(),
            aliases: node.aliases.clone(),
            version: node.version.clone(),
            path: self.path(id),
            kind: node.kind,
        }
    }

    fn path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut curr = Some(id);
        while let Some(id) = curr {
            names.push(self.nodes[id].name.as_str());
            curr = self.nodes[id].parent;
        }
        names.reverse();
        names.join(" ")
    }
}

/// Whether `--{long}`, or `-{short}` when the command does not use it for
/// a flag of its own, appears before any `--`.
fn asks_for(node: &Node, args: &[String], long: &str, short: &str) -> bool {
    let short_free = !node.flags.claims_short(short);
    args.iter().take_while(|it| *it != "--").any(|it| {
        it.strip_prefix("--") == Some(long) || (short_free && it.strip_prefix('-') == Some(short))
    })
}

fn is_boolean_flag(node: &Node, token: &str) -> bool {
    let name = strip_sigil(token.split_once('=').map_or(token, |(it, _)| it));
    let option = if is_long_flag(token) {
        node.flags.get(name).or_else(|| node.flags.by_alias(name))
    } else {
        node.flags.by_alias(name).or_else(|| node.flags.get(name))
    };
    option.map_or(false, |it| it.value_type == ValueType::Boolean)
}

fn abort(flag: Option<UnknownFlag>, path: &str) -> Outcome {
    let flag =
        flag.unwrap_or_else(|| UnknownFlag { flag: String::new(), command: path.to_string() });
    tracing::debug!(flag = %flag.flag, command = %flag.command, "aborted on unknown flag");
    Outcome::Aborted(flag)
}

fn suggest<'a>(names: impl Iterator<Item = &'a String>, input: &str) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for name in names {
        let distance = levenshtein(input, name);
        if distance <= 2 && best.map_or(true, |(_, it)| distance < it) {
            best = Some((name.as_str(), distance));
        }
    }
    best.map(|(name, _)| name.to_string())
}
