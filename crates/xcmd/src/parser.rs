//! Runtime parser: raw tokens + [`ArgSpec`] -> [`ParsedArgs`].
use std::{fmt, mem, ops::ControlFlow};

use indexmap::IndexMap;
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::{
    spec::{ArgSpec, Coerce, OptionSpec, ValueType},
    token::{is_flag, is_long_flag, is_numeric_like, strip_sigil, to_camel_case, to_kebab_case},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Read `-abc` as `-a -b -c`.
    pub short_flag_group: bool,
    /// Keep the tokens after `--` separately, in [`ParsedArgs::double_dash`].
    pub populate_double_dash: bool,
    /// Turn values that look like numbers, booleans or array literals into
    /// those; otherwise values stay strings.
    pub coerce_values: bool,
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions { short_flag_group: true, populate_double_dash: false, coerce_values: true }
    }
}

/// Result of parsing one token vector.
///
/// Values are keyed by the camel-cased canonical name; lookups accept the
/// kebab-case spelling as well.
#[derive(Clone, Default, PartialEq)]
pub struct ParsedArgs {
    values: IndexMap<String, Value>,
    positionals: Vec<Value>,
    double_dash: Option<Vec<Value>>,
}

impl ParsedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).or_else(|| self.values.get(&to_camel_case(name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn get_array(&self, name: &str) -> Option<&[Value]> {
        self.get(name)?.as_array()
    }

    /// Tokens not consumed by any flag, `_`.
    pub fn positionals(&self) -> &[Value] {
        &self.positionals
    }

    /// Tokens after `--`, when [`ParseOptions::populate_double_dash`] is on.
    pub fn double_dash(&self) -> Option<&[Value]> {
        self.double_dash.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.positionals.is_empty()
    }
}

impl fmt::Debug for ParsedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        map.entries(self.values.iter());
        map.entry(&"_", &self.positionals);
        if let Some(rest) = &self.double_dash {
            map.entry(&"--", rest);
        }
        map.finish()
    }
}

impl Serialize for ParsedArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.values.len() + 1 + usize::from(self.double_dash.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (k, v) in &self.values {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry("_", &self.positionals)?;
        if let Some(rest) = &self.double_dash {
            map.serialize_entry("--", rest)?;
        }
        map.end()
    }
}

/// Parses `tokens` against `spec` with default options.
///
/// Undeclared flags are kept, so this never returns `None`.
pub fn parse<S: AsRef<str>>(tokens: &[S], spec: &ArgSpec) -> Option<ParsedArgs> {
    parse_with(tokens, spec, &ParseOptions::default(), None)
}

/// Parses `tokens` against `spec`.
///
/// `unknown` is called with each undeclared flag, as written. If it
/// returns `Break`, parsing stops and the result is `None`: the caller
/// should drop whatever it was about to do with the arguments.
pub fn parse_with<S: AsRef<str>>(
    tokens: &[S],
    spec: &ArgSpec,
    options: &ParseOptions,
    unknown: Option<&dyn Fn(&str) -> ControlFlow<()>>,
) -> Option<ParsedArgs> {
    let mut rargs = tokens.iter().map(|it| it.as_ref().to_string()).collect::<Vec<_>>();
    rargs.reverse();
    let p = Parser { spec, options, unknown, rargs, res: ParsedArgs::default() };
    p.run()
}

enum Resolved<'s> {
    Declared {
        option: &'s OptionSpec,
        negated: bool,
    },
    /// `-abc`: keys of the individual flags, and whether all are declared.
    Group {
        keys: Vec<String>,
        known: bool,
    },
    Unknown {
        name: String,
    },
}

struct Parser<'a> {
    spec: &'a ArgSpec,
    options: &'a ParseOptions,
    unknown: Option<&'a dyn Fn(&str) -> ControlFlow<()>>,
    rargs: Vec<String>,
    res: ParsedArgs,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<String> {
        self.rargs.pop()
    }

    fn peek(&self) -> Option<&str> {
        self.rargs.last().map(String::as_str)
    }

    fn next_value(&mut self) -> Option<String> {
        if is_flag(self.peek()?) {
            return None;
        }
        self.next()
    }

    fn value(&self, token: &str) -> Value {
        if self.options.coerce_values {
            Value::coerce(token)
        } else {
            Value::Str(token.trim_matches('"').to_string())
        }
    }

    fn run(mut self) -> Option<ParsedArgs> {
        if self.options.populate_double_dash {
            self.res.double_dash = Some(Vec::new());
        }

        while let Some(arg) = self.next() {
            if arg == "--" {
                let rest = mem::take(&mut self.rargs);
                let rest = rest.iter().rev().map(|it| self.value(it)).collect::<Vec<_>>();
                if let Some(dd) = &mut self.res.double_dash {
                    dd.extend(rest.iter().cloned());
                }
                self.res.positionals.extend(rest);
                break;
            }
            if !is_flag(&arg) || arg == "-" {
                let value = self.value(&arg);
                self.res.positionals.push(value);
                continue;
            }

            let (key, inline) = match arg.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (arg.as_str(), None),
            };
            let resolved = self.resolve(key);
            let known = match &resolved {
                Resolved::Declared { .. } => true,
                Resolved::Group { known, .. } => *known,
                Resolved::Unknown { .. } => false,
            };
            if !known {
                if let Some(unknown) = self.unknown {
                    if unknown(key).is_break() {
                        tracing::debug!(flag = key, "parse aborted on unknown flag");
                        return None;
                    }
                }
            }

            match resolved {
                Resolved::Declared { option, negated } => self.declared(option, negated, inline),
                Resolved::Group { keys, .. } => {
                    for key in keys {
                        self.res.values.insert(key, Value::Bool(true));
                    }
                }
                Resolved::Unknown { name } => {
                    let value = match inline {
                        Some(it) => self.value(it),
                        None if is_long_flag(key) => match self.next_value() {
                            Some(it) => self.value(&it),
                            None => Value::Bool(true),
                        },
                        None => Value::Bool(true),
                    };
                    self.res.values.insert(to_camel_case(&name), value);
                }
            }
        }

        Some(self.finish())
    }

    fn resolve(&self, key: &str) -> Resolved<'a> {
        let spec = self.spec;
        let name = strip_sigil(key);

        if is_long_flag(key) {
            if let Some(option) = spec.get(name).or_else(|| spec.by_alias(name)) {
                return Resolved::Declared { option, negated: false };
            }
            if let Some(positive) = to_kebab_case(name).strip_prefix("no-") {
                if let Some(option) =
                    spec.get(positive).filter(|it| it.value_type == ValueType::Boolean)
                {
                    return Resolved::Declared { option, negated: true };
                }
            }
            return Resolved::Unknown { name: name.to_string() };
        }

        if let Some(option) = spec.by_alias(name).or_else(|| spec.get(name)) {
            return Resolved::Declared { option, negated: false };
        }
        let chars = name.chars().filter(|c| c.is_alphanumeric()).collect::<Vec<_>>();
        if !self.options.short_flag_group || chars.is_empty() {
            return Resolved::Unknown { name: name.to_string() };
        }

        let mut known = true;
        let keys = chars
            .into_iter()
            .map(|c| {
                let c = c.to_string();
                match spec.by_alias(&c).or_else(|| spec.get(&c)) {
                    Some(option) => option.key(),
                    None => {
                        known = false;
                        to_camel_case(&c)
                    }
                }
            })
            .collect();
        Resolved::Group { keys, known }
    }

    fn declared(&mut self, option: &OptionSpec, negated: bool, inline: Option<&str>) {
        let key = option.key();
        tracing::trace!(option = %option.name, value_type = %option.value_type, "flag");
        match option.value_type {
            ValueType::Boolean => {
                let value = if negated {
                    false
                } else if let Some(inline) = inline {
                    !inline.eq_ignore_ascii_case("false")
                } else if let Some(explicit) = self.peek().and_then(bool_literal) {
                    self.next();
                    explicit
                } else {
                    true
                };
                self.res.values.insert(key, Value::Bool(value));
            }
            ValueType::Number => {
                let token = match inline {
                    Some(it) => Some(it.to_string()),
                    None => {
                        let numeric =
                            self.peek().map_or(false, |it| !is_flag(it) && is_numeric_like(it));
                        if numeric {
                            self.next()
                        } else {
                            None
                        }
                    }
                };
                match token.and_then(|it| it.trim().parse::<f64>().ok().filter(|n| n.is_finite())) {
                    Some(n) => {
                        self.res.values.insert(key, Value::Number(n));
                    }
                    None => {
                        tracing::warn!(option = %option.name, "no numeric value given, flag ignored")
                    }
                }
            }
            ValueType::String => {
                let value = match inline {
                    Some(it) => it.to_string(),
                    None => match self.next() {
                        Some(it) if is_flag(&it) => String::new(),
                        Some(it) => it,
                        None => return,
                    },
                };
                self.res.values.insert(key, Value::Str(value));
            }
            ValueType::Array => {
                let items = match inline {
                    Some(it) => it.split(',').map(|it| self.value(it)).collect(),
                    None => {
                        let mut items = Vec::new();
                        while let Some(it) = self.next_value() {
                            items.push(self.value(&it));
                        }
                        items
                    }
                };
                match self.res.values.get_mut(&key) {
                    Some(Value::Array(prev)) => prev.extend(items),
                    _ if items.is_empty() => (),
                    _ => {
                        self.res.values.insert(key, Value::Array(items));
                    }
                }
            }
        }
    }

    fn finish(mut self) -> ParsedArgs {
        for option in self.spec.options() {
            if let Some(Coerce(f)) = &option.coerce {
                if let Some(slot) = self.res.values.get_mut(&option.key()) {
                    let value = mem::replace(slot, Value::Bool(false));
                    *slot = f(value);
                }
            }
        }

        let mut values = IndexMap::with_capacity(self.res.values.len());
        for option in self.spec.options() {
            let key = option.key();
            match self.res.values.shift_remove(&key) {
                Some(value) => {
                    values.insert(key, value);
                }
                None => {
                    if let Some(default) = &option.default {
                        values.insert(key, default.clone());
                    }
                }
            }
        }
        values.extend(self.res.values.drain(..));
        self.res.values = values;
        self.res
    }
}

fn bool_literal(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("true") {
        Some(true)
    } else if token.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
