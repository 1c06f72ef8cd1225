use std::ops::ControlFlow;

use expect_test::expect;
use xcmd::{parse, parse_with, Arg, ArgSpec, ParseOptions, ParsedArgs, Value};

use crate::check;

fn spec<I>(defs: I) -> ArgSpec
where
    I: IntoIterator,
    I::Item: Into<Arg>,
{
    ArgSpec::compile(defs).unwrap()
}

fn parsed(spec: &ArgSpec) -> impl FnOnce(Vec<String>) -> xcmd::Result<ParsedArgs> + '_ {
    move |args| Ok(parse(&args, spec).unwrap())
}

fn parsed_with(
    spec: &ArgSpec,
    options: ParseOptions,
) -> impl FnOnce(Vec<String>) -> xcmd::Result<ParsedArgs> + '_ {
    move |args| Ok(parse_with(&args, spec, &options, None).unwrap())
}

#[test]
fn string_default() {
    let spec = spec([("n,name", "Who to greet", "will")]);
    check(parsed(&spec), "-n", expect![[r#"{"name": "will", "_": []}"#]]);
    check(parsed(&spec), "-n Xee", expect![[r#"{"name": "Xee", "_": []}"#]]);
    check(parsed(&spec), "--name=Xee", expect![[r#"{"name": "Xee", "_": []}"#]]);
}

#[test]
fn array_and_negated_boolean() {
    let spec = spec([Arg::new("!dice"), Arg::new("...list").default_value(Vec::<&str>::new())]);
    check(
        parsed(&spec),
        "--list a b c --no-dice",
        expect![[r#"{"dice": false, "list": ["a", "b", "c"], "_": []}"#]],
    );
    check(parsed(&spec), "", expect![[r#"{"list": [], "_": []}"#]]);
    check(parsed(&spec), "--list a --list=b,2", expect![[r#"{"list": ["a", "b", 2], "_": []}"#]]);
}

#[test]
fn aborted_by_unknown_flag() {
    let spec = spec(["name"]);
    let hook = |flag: &str| {
        if flag == "--x" {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    };

    let res = parse_with(&["--name", "a", "--x"], &spec, &ParseOptions::default(), Some(&hook));
    assert!(res.is_none());

    let res = parse_with(
        &["--name", "a", "--y", "1", "--z"],
        &spec,
        &ParseOptions::default(),
        Some(&hook),
    );
    expect![[r#"Some({"name": "a", "y": 1, "z": true, "_": []})"#]].assert_eq(&format!("{res:?}"));
}

#[test]
fn aliases_match_long_names() {
    let spec = spec(["t,target <dir>", "f,!force", "j,-jobs", "i,...include"]);
    let short = parse(&["-t", "out", "-f", "-j", "4", "-i", "a", "b"], &spec).unwrap();
    let long = parse(&["--target", "out", "--force", "--jobs", "4", "--include", "a", "b"], &spec)
        .unwrap();
    assert_eq!(short, long);
    check(
        parsed(&spec),
        "-t out -f -j 4 -i a b",
        expect![[r#"{"target": "out", "force": true, "jobs": 4, "include": ["a", "b"], "_": []}"#]],
    );
}

quickcheck::quickcheck! {
    fn short_and_long_spellings_agree(target: u8, force: bool, jobs: u16, include: Vec<u8>) -> bool {
        let spec = spec(["t,target <dir>", "f,!force", "j,-jobs", "i,...include"]);
        let spell = |names: [&str; 4]| {
            let mut args = vec![names[0].to_string(), format!("v{target}")];
            if force {
                args.push(names[1].to_string());
            }
            args.extend([names[2].to_string(), jobs.to_string(), names[3].to_string()]);
            args.extend(include.iter().map(|it| format!("v{it}")));
            args
        };
        let short = parse(&spell(["-t", "-f", "-j", "-i"]), &spec);
        let long = parse(&spell(["--target", "--force", "--jobs", "--include"]), &spec);
        short.is_some() && short == long
    }
}

#[test]
fn defaults_fill_empty_input() {
    let spec = spec([
        Arg::new("name").default_value("will"),
        Arg::new("-jobs").default_value(4),
        Arg::new("!dry-run").default_value(false),
        Arg::new("...tags").default_value(vec!["a"]),
        Arg::new("target"),
    ]);
    let res = parse::<&str>(&[], &spec).unwrap();
    for option in spec.options() {
        assert_eq!(res.get(&option.name), option.default.as_ref());
    }
    check(
        parsed(&spec),
        "",
        expect![[r#"{"name": "will", "jobs": 4, "dryRun": false, "tags": ["a"], "_": []}"#]],
    );
}

#[test]
fn number_without_value() {
    let spec = spec([Arg::new("-jobs").default_value(2)]);
    check(parsed(&spec), "--jobs fast", expect![[r#"{"jobs": 2, "_": ["fast"]}"#]]);
    check(parsed(&spec), "--jobs=x", expect![[r#"{"jobs": 2, "_": []}"#]]);
    check(parsed(&spec), "--jobs=8 1.5", expect![[r#"{"jobs": 8, "_": [1.5]}"#]]);
}

#[test]
fn string_takes_next_token() {
    let spec = spec(["name"]);
    check(parsed(&spec), "--name --other", expect![[r#"{"name": "", "_": []}"#]]);
    check(parsed(&spec), "--name 12", expect![[r#"{"name": "12", "_": []}"#]]);
    check(parsed(&spec), "--name", expect![[r#"{"_": []}"#]]);
}

#[test]
fn boolean_literal_values() {
    let spec = spec(["!force"]);
    check(parsed(&spec), "--force false x", expect![[r#"{"force": false, "_": ["x"]}"#]]);
    check(parsed(&spec), "--force x", expect![[r#"{"force": true, "_": ["x"]}"#]]);
    check(parsed(&spec), "--force=false", expect![[r#"{"force": false, "_": []}"#]]);
}

#[test]
fn short_groups() {
    let spec = spec(["a,!all", "!b"]);
    check(parsed(&spec), "-ab", expect![[r#"{"all": true, "b": true, "_": []}"#]]);
    check(parsed(&spec), "-abc", expect![[r#"{"all": true, "b": true, "c": true, "_": []}"#]]);

    let options = ParseOptions { short_flag_group: false, ..ParseOptions::default() };
    check(parsed_with(&spec, options), "-ab", expect![[r#"{"ab": true, "_": []}"#]]);
}

#[test]
fn double_dash() {
    let spec = spec(["!b"]);
    check(parsed(&spec), "a -- --b c", expect![[r#"{"_": ["a", "--b", "c"]}"#]]);

    let options = ParseOptions { populate_double_dash: true, ..ParseOptions::default() };
    check(
        parsed_with(&spec, options),
        "a -- --b c",
        expect![[r#"{"_": ["a", "--b", "c"], "--": ["--b", "c"]}"#]],
    );
}

#[test]
fn positionals() {
    let spec = spec(["!b"]);
    check(parsed(&spec), "- 1 true [1,2] x", expect![[r#"{"_": ["-", 1, true, [1, 2], "x"]}"#]]);

    let options = ParseOptions { coerce_values: false, ..ParseOptions::default() };
    check(parsed_with(&spec, options), "1 true", expect![[r#"{"_": ["1", "true"]}"#]]);
}

#[test]
fn undeclared_flags() {
    let spec = spec(["name"]);
    check(
        parsed(&spec),
        "--color red --verbose --dry-run -x",
        expect![[r#"{"color": "red", "verbose": true, "dryRun": true, "x": true, "_": []}"#]],
    );
}

#[test]
fn coerce_transform() {
    let spec = spec([Arg::new("name")
        .default_value("nobody")
        .coerce(|it| Value::Str(it.to_string().to_uppercase()))]);
    check(parsed(&spec), "--name will", expect![[r#"{"name": "WILL", "_": []}"#]]);
    check(parsed(&spec), "", expect![[r#"{"name": "nobody", "_": []}"#]]);
}

#[test]
fn lookups_and_json() {
    let spec = spec([Arg::new("!dry-run"), Arg::new("-jobs").default_value(2)]);
    let res = parse(&["--dry-run", "x"], &spec).unwrap();

    assert_eq!(res.get_bool("dry-run"), Some(true));
    assert_eq!(res.get_bool("dryRun"), Some(true));
    assert_eq!(res.get_f64("jobs"), Some(2.0));
    assert_eq!(res.positionals(), [Value::from("x")]);
    assert_eq!(res.double_dash(), None);

    let json = serde_json::to_string(&res).unwrap();
    expect![[r#"{"dryRun":true,"jobs":2.0,"_":["x"]}"#]].assert_eq(&json);
}
