//! Compiler for the flag-definition language.
//!
//! A definition is a comma separated list of names, the last one being
//! the canonical name and the rest its aliases:
//!
//! ```text
//! t,target <dir>     string, alias `t`, hint `dir`
//! !force             boolean
//! !force!            boolean, required
//! name!              string, required
//! -jobs              number
//! ...files           array
//! list |array        array, spelled as a suffix
//! ```
//!
//! Command headers use the same names, plus an optional bracketed list of
//! positional parameters: `i,in, install [pkg!, ...files] <pkg>`.
use std::{fmt, sync::Arc};

use crate::{
    error::DefinitionError,
    token::{strip_styling, to_camel_case},
    value::Value,
};

type Result<T, E = DefinitionError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Array,
}

impl ValueType {
    fn from_name(name: &str) -> Option<ValueType> {
        let res = match name {
            "string" => ValueType::String,
            "number" => ValueType::Number,
            "boolean" => ValueType::Boolean,
            "array" => ValueType::Array,
            _ => return None,
        };
        Some(res)
    }

    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ValueType::String, Value::Str(_) | Value::Number(_))
                | (ValueType::Number, Value::Number(_))
                | (ValueType::Boolean, Value::Bool(_))
                | (ValueType::Array, Value::Array(_))
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
        };
        f.write_str(name)
    }
}

/// Transform applied to a value after it is parsed.
#[derive(Clone)]
pub(crate) struct Coerce(pub(crate) Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl fmt::Debug for Coerce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Coerce(..)")
    }
}

/// One flag or positional parameter, as written by the user of the crate.
#[derive(Debug, Clone)]
pub struct Arg {
    flags: String,
    description: String,
    default: Option<Value>,
    hidden: bool,
    coerce: Option<Coerce>,
}

impl Arg {
    pub fn new(flags: impl Into<String>) -> Arg {
        Arg {
            flags: flags.into(),
            description: String::new(),
            default: None,
            hidden: false,
            coerce: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Arg {
        self.description = description.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Arg {
        self.default = Some(value.into());
        self
    }

    /// Keeps the option out of the help output.
    pub fn hidden(mut self) -> Arg {
        self.hidden = true;
        self
    }

    /// Runs `f` over the parsed value. Defaults are not transformed.
    pub fn coerce(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Arg {
        self.coerce = Some(Coerce(Arc::new(f)));
        self
    }
}

impl From<&str> for Arg {
    fn from(flags: &str) -> Arg {
        Arg::new(flags)
    }
}

impl From<(&str, &str)> for Arg {
    fn from((flags, description): (&str, &str)) -> Arg {
        Arg::new(flags).description(description)
    }
}

impl<V: Into<Value>> From<(&str, &str, V)> for Arg {
    fn from((flags, description, default): (&str, &str, V)) -> Arg {
        Arg::new(flags).description(description).default_value(default)
    }
}

/// A compiled [`Arg`].
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub value_type: ValueType,
    pub required: bool,
    pub default: Option<Value>,
    pub hint: Option<String>,
    pub description: String,
    pub hidden: bool,
    pub(crate) coerce: Option<Coerce>,
}

impl OptionSpec {
    /// Key of this option in [`ParsedArgs`](crate::ParsedArgs).
    pub fn key(&self) -> String {
        to_camel_case(&self.name)
    }

    fn is_named(&self, name: &str) -> bool {
        self.name == name || to_camel_case(&self.name) == to_camel_case(name)
    }

    fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|it| it == alias)
    }
}

/// Compiled flags of one command, or its positional parameters.
///
/// Option order is declaration order; for positional parameters that is
/// the order in which values are bound.
#[derive(Debug, Clone, Default)]
pub struct ArgSpec {
    options: Vec<OptionSpec>,
}

impl ArgSpec {
    pub fn compile<I>(args: I) -> Result<ArgSpec>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        let mut res = ArgSpec::default();
        for arg in args {
            res.push(compile_arg(&arg.into())?)?;
        }
        Ok(res)
    }

    pub(crate) fn push(&mut self, option: OptionSpec) -> Result<()> {
        for other in &self.options {
            if other.is_named(&option.name) {
                return Err(DefinitionError::DuplicateName(option.name));
            }
            for alias in &option.aliases {
                if other.has_alias(alias) || other.is_named(alias) {
                    return Err(DefinitionError::AliasCollision {
                        alias: alias.clone(),
                        option: option.name,
                        other: other.name.clone(),
                    });
                }
            }
            if let Some(alias) = other.aliases.iter().find(|it| option.is_named(it)) {
                return Err(DefinitionError::AliasCollision {
                    alias: alias.clone(),
                    option: other.name.clone(),
                    other: option.name,
                });
            }
        }
        self.options.push(option);
        Ok(())
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Looks an option up by canonical name, in kebab or camel case.
    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|it| it.is_named(name))
    }

    pub fn by_alias(&self, alias: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|it| it.has_alias(alias))
    }

    /// Whether `-{short}` means one of these options, by alias or by name.
    pub fn claims_short(&self, short: &str) -> bool {
        self.by_alias(short).is_some() || self.get(short).is_some()
    }

    /// Canonical names of all options of the given type.
    pub fn names_of(&self, value_type: ValueType) -> impl Iterator<Item = &str> + '_ {
        self.options.iter().filter(move |it| it.value_type == value_type).map(|it| it.name.as_str())
    }

    pub fn required(&self) -> impl Iterator<Item = &OptionSpec> + '_ {
        self.options.iter().filter(|it| it.required)
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.options.iter().filter_map(|it| Some((it.name.as_str(), it.default.as_ref()?)))
    }
}

/// Compiled `i,in, install [pkg!, ...files] <pkg>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHeader {
    pub name: String,
    pub aliases: Vec<String>,
    pub hint: Option<String>,
    /// Raw definitions of the bracketed positional parameters.
    pub params: Vec<String>,
}

pub fn compile_header(src: &str) -> Result<CommandHeader> {
    let src = strip_styling(src);
    let (names, params) = match src.find('[') {
        Some(l) => {
            let r =
                src.rfind(']').filter(|&r| r > l).ok_or_else(|| malformed(&src, "expected `]`"))?;
            let rest = format!("{}{}", &src[..l], &src[r + 1..]);
            let params = split_segments(&src[l + 1..r])
                .into_iter()
                .map(|it| it.trim().to_string())
                .filter(|it| !it.is_empty())
                .collect();
            (rest, params)
        }
        None => (src.to_string(), Vec::new()),
    };

    let mut segments = split_segments(&names);
    let last = segments.pop().unwrap_or_default();
    let p = &mut Cursor::new(last.trim());
    let name = p.name().ok_or_else(|| malformed(&src, "expected a command name"))?;
    let hint = p.opt_hint().map_err(|reason| malformed(&src, reason))?;
    p.expect_end().map_err(|reason| malformed(&src, reason))?;

    let aliases = segments
        .into_iter()
        .map(|it| {
            let p = &mut Cursor::new(it.trim());
            let alias = p.name().ok_or_else(|| malformed(&src, "expected an alias"))?;
            p.expect_end().map_err(|reason| malformed(&src, reason))?;
            Ok(alias)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CommandHeader { name, aliases, hint, params })
}

pub(crate) fn compile_arg(arg: &Arg) -> Result<OptionSpec> {
    let src = strip_styling(&arg.flags);
    if src.trim().is_empty() {
        return Err(DefinitionError::EmptyFlag);
    }

    let mut segments = split_segments(&src);
    let last = segments.pop().unwrap_or_default();
    let aliases = segments
        .into_iter()
        .map(|it| alias(it.trim()).map_err(|reason| malformed(&src, reason)))
        .collect::<Result<Vec<_>>>()?;
    let decl = canonical(last.trim()).map_err(|reason| malformed(&src, reason))?;

    if let Some(default) = &arg.default {
        if !decl.value_type.accepts(default) {
            return Err(DefinitionError::DefaultType {
                name: decl.name,
                value_type: decl.value_type,
                default: default.clone(),
            });
        }
    }

    Ok(OptionSpec {
        name: decl.name,
        aliases,
        value_type: decl.value_type,
        required: decl.required,
        default: arg.default.clone(),
        hint: decl.hint,
        description: arg.description.clone(),
        hidden: arg.hidden,
        coerce: arg.coerce.clone(),
    })
}

fn malformed(src: &str, reason: impl Into<String>) -> DefinitionError {
    DefinitionError::Malformed { def: src.to_string(), reason: reason.into() }
}

/// Splits on commas which are not inside `<...>`.
fn split_segments(src: &str) -> Vec<&str> {
    let mut res = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in src.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                res.push(&src[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }
    res.push(&src[start..]);
    res
}

struct Decl {
    name: String,
    value_type: ValueType,
    required: bool,
    hint: Option<String>,
}

fn canonical(src: &str) -> Result<Decl, String> {
    let p = &mut Cursor::new(src);
    let mut value_type = if p.eat_str("...") {
        ValueType::Array
    } else if p.eat('!') {
        ValueType::Boolean
    } else if p.eat('-') {
        if p.at('-') {
            return Err("write flag names without leading `--`".to_string());
        }
        ValueType::Number
    } else {
        ValueType::String
    };

    let name = match p.name() {
        Some(it) => it,
        None => return Err(format!("expected a flag name, got `{}`", p.rest())),
    };
    let required = p.eat('!');
    let hint = p.opt_hint()?;

    p.skip_ws();
    if p.eat('|') {
        p.skip_ws();
        let ty = p.word();
        value_type = ValueType::from_name(&ty).ok_or_else(|| {
            format!("expected one of `string`, `number`, `boolean`, `array`, got `{ty}`")
        })?;
    }
    p.expect_end()?;

    Ok(Decl { name, value_type, required, hint })
}

fn alias(src: &str) -> Result<String, String> {
    let p = &mut Cursor::new(src);
    let _sigil = p.eat_str("...") || p.eat('!') || p.eat('-');
    let name = match p.name() {
        Some(it) => it,
        None => return Err(format!("expected an alias, got `{src}`")),
    };
    let _required = p.eat('!');
    p.expect_end()?;
    Ok(name)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }
    fn at(&self, c: char) -> bool {
        self.peek() == Some(c)
    }
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.at(c) {
            self.bump();
            true
        } else {
            false
        }
    }
    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
    }

    fn word(&mut self) -> String {
        let mut buf = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_alphanumeric()) {
            buf.push(c);
            self.bump();
        }
        buf
    }

    /// `[A-Za-z0-9_][A-Za-z0-9_-]*`
    fn name(&mut self) -> Option<String> {
        if !self.peek().map_or(false, |c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        let mut buf = String::new();
        while let Some(c) = self.peek().filter(|&c| c.is_alphanumeric() || c == '_' || c == '-') {
            buf.push(c);
            self.bump();
        }
        Some(buf)
    }

    /// `<...>`, angle brackets may nest.
    fn opt_hint(&mut self) -> Result<Option<String>, String> {
        self.skip_ws();
        if !self.eat('<') {
            return Ok(None);
        }
        let start = self.pos;
        let mut depth = 1;
        while let Some(c) = self.bump() {
            match c {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        let hint = self.text[start..self.pos - 1].trim();
                        return Ok(Some(hint.to_string()));
                    }
                }
                _ => (),
            }
        }
        Err("expected `>`".to_string())
    }

    fn expect_end(&mut self) -> Result<(), String> {
        self.skip_ws();
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(format!("unexpected `{c}`")),
        }
    }
}
