//! Binds positional parameters by rewriting them into flags.
//!
//! `install axios a.js b.js -r`, with parameters `[pkg!, ...files]`, is
//! split into `--pkg axios --files a.js b.js` and `-r`. Both halves then go
//! through the ordinary parser, against the parameter spec and the flag
//! spec respectively.
use crate::{
    error::Error,
    spec::{ArgSpec, ValueType},
    token::is_flag,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Positional segment with `--param` markers spliced in, `None` if the
    /// command declares no parameters.
    pub params: Option<Vec<String>>,
    /// Everything after the positional segment.
    pub flags: Vec<String>,
}

pub fn bind<S: AsRef<str>>(params: &ArgSpec, argv: &[S]) -> Result<Binding, Error> {
    let argv = argv.iter().map(|it| it.as_ref().to_string()).collect::<Vec<_>>();
    let last = match params.options().last() {
        Some(it) => it,
        None => return Ok(Binding { params: None, flags: argv }),
    };

    let flag_idx = argv.iter().position(|it| is_flag(it)).unwrap_or(argv.len());
    let mut candidate = argv[..flag_idx].to_vec();
    if candidate.len() >= params.len() && last.value_type != ValueType::Array {
        candidate.truncate(params.len());
    }
    let taken = candidate.len();

    let mut pending = params.options().iter();
    let mut i = 0;
    while i < candidate.len() {
        if i % 2 == 0 && !is_flag(&candidate[i]) {
            if let Some(param) = pending.next() {
                candidate.insert(i, format!("--{}", param.name));
            }
        }
        i += 1;
    }

    if let Some(missing) = params.required().find(|param| {
        let marker = format!("--{}", param.name);
        !candidate.contains(&marker)
    }) {
        return Err(Error::MissingParameter(missing.name.clone()));
    }

    let flags = argv[taken..].to_vec();
    tracing::debug!(?candidate, ?flags, "bound positional parameters");
    Ok(Binding { params: Some(candidate), flags })
}
