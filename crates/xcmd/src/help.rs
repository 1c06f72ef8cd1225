//! Help pages.
//!
//! Dispatch builds a [`HelpPage`] for the command the user asked about and
//! hands it to the configured [`Render`]er. [`PlainRender`] lays it out in
//! the usual `ARGS:` / `OPTIONS:` / `SUBCOMMANDS:` sections.
use std::fmt::Write;

use crate::spec::{ArgSpec, OptionSpec, ValueType};

macro_rules! w {
    ($($tt:tt)*) => {{
        let _ = write!($($tt)*);
    }};
}

/// Turns a help page into text. Must not depend on anything but `page`.
pub trait Render {
    fn render(&self, page: &HelpPage<'_>) -> String;
}

#[derive(Debug, Clone)]
pub struct HelpPage<'a> {
    /// Command path from the root, `pm install`.
    pub path: String,
    pub version: Option<&'a str>,
    pub hint: Option<&'a str>,
    pub description: &'a str,
    pub params: Option<&'a ArgSpec>,
    pub flags: &'a ArgSpec,
    pub commands: Vec<CommandSummary<'a>>,
    /// List `--help` among the options.
    pub help_flag: bool,
    /// List `--version` among the options.
    pub version_flag: bool,
}

/// One line of the `SUBCOMMANDS:` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSummary<'a> {
    pub name: &'a str,
    pub aliases: &'a [String],
    pub hint: Option<&'a str>,
    pub description: &'a str,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRender;

impl Render for PlainRender {
    fn render(&self, page: &HelpPage<'_>) -> String {
        let mut buf = String::new();

        w!(buf, "{}", page.path);
        if let Some(version) = page.version {
            w!(buf, " {version}");
        }
        if let Some(hint) = page.hint {
            w!(buf, " <{hint}>");
        }
        w!(buf, "\n");
        if !page.description.is_empty() {
            write_lines_indented(&mut buf, page.description, 2);
        }

        let params = page.params.map(ArgSpec::options).unwrap_or_default();
        if !params.is_empty() {
            w!(buf, "\nARGS:\n");
            let mut blank = "";
            for param in params {
                w!(buf, "{blank}");
                blank = "\n";

                let (l, r) = if param.required { ("<", ">") } else { ("[", "]") };
                let repeat = if param.value_type == ValueType::Array { "..." } else { "" };
                w!(buf, "    {l}{}{r}{repeat}\n", param.name);
                write_doc(&mut buf, param);
            }
        }

        let flags = page.flags.options().iter().filter(|it| !it.hidden).collect::<Vec<_>>();
        if !flags.is_empty() || page.help_flag || page.version_flag {
            w!(buf, "\nOPTIONS:\n");
            let mut blank = "";
            for flag in flags {
                w!(buf, "{blank}");
                blank = "\n";

                let aliases =
                    flag.aliases.iter().map(|it| format!("{}, ", dashed(it))).collect::<String>();
                let value = match (&flag.hint, flag.value_type) {
                    (Some(hint), _) => format!(" <{hint}>"),
                    (None, ValueType::Boolean) => String::new(),
                    (None, value_type) => format!(" <{value_type}>"),
                };
                let repeat = if flag.value_type == ValueType::Array { "..." } else { "" };
                w!(buf, "    {aliases}--{}{value}{repeat}\n", flag.name);
                write_doc(&mut buf, flag);
            }
            for (enabled, short, long, doc) in [
                (page.help_flag, "h", "help", "Prints help information."),
                (page.version_flag, "v", "version", "Prints version information."),
            ] {
                if !enabled {
                    continue;
                }
                w!(buf, "{blank}");
                blank = "\n";
                let short = if page.flags.claims_short(short) {
                    String::new()
                } else {
                    format!("-{short}, ")
                };
                w!(buf, "    {short}--{long}\n");
                write_lines_indented(&mut buf, doc, 6);
            }
        }

        if !page.commands.is_empty() {
            w!(buf, "\nSUBCOMMANDS:\n");
            let mut blank = "";
            for cmd in &page.commands {
                w!(buf, "{blank}");
                blank = "\n";

                let aliases = cmd.aliases.iter().map(|it| format!("{it}, ")).collect::<String>();
                let hint = cmd.hint.map(|it| format!(" <{it}>")).unwrap_or_default();
                w!(buf, "    {aliases}{}{hint}\n", cmd.name);
                if !cmd.description.is_empty() {
                    write_lines_indented(&mut buf, cmd.description, 6);
                }
            }
        }

        buf
    }
}

fn dashed(alias: &str) -> String {
    if alias.chars().count() == 1 {
        format!("-{alias}")
    } else {
        format!("--{alias}")
    }
}

fn write_doc(buf: &mut String, option: &OptionSpec) {
    if !option.description.is_empty() {
        write_lines_indented(buf, &option.description, 6);
    }
    if let Some(default) = &option.default {
        w!(buf, "      [default: {default}]\n");
    }
}

fn write_lines_indented(buf: &mut String, multiline_str: &str, indent: usize) {
    for line in multiline_str.split('\n').map(str::trim_end) {
        if line.is_empty() {
            w!(buf, "\n")
        } else {
            w!(buf, "{blank:indent$}{line}\n", blank = "");
        }
    }
}
