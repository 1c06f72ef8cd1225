use expect_test::expect;
use xcmd::{Arg, Command, HelpPage, Outcome, Render, Settings};

fn noop(_: xcmd::Context) -> anyhow::Result<()> {
    Ok(())
}

fn help(cli: &xcmd::Cli, args: &[&str]) -> String {
    match cli.run_blocking(args.iter().copied()).unwrap() {
        Outcome::Help(help) => help,
        outcome => panic!("expected help, got {outcome:?}"),
    }
}

fn pm() -> xcmd::Cli {
    Command::main("pm", "1.2.0")
        .description("A tiny package manager.")
        .arg(Arg::new("D,!save-dev").description("Save to devDependencies"))
        .arg(Arg::new("!debug").hidden())
        .action_sync(noop)
        .sub(
            Command::new("i,in, install [pkg!, ...files]")
                .description("Install packages")
                .arg("r,!recursive")
                .arg(("t,tag <tag>", "Dist tag to install", "latest"))
                .action_sync(noop),
        )
        .sub(Command::new("run [script!] <script>").action_sync(noop))
        .sub(
            Command::new("cache")
                .description(
                    "Manage the cache.\n\nEntries older than a week are\nremoved on their own.",
                )
                .sub(Command::new("clean").action_sync(noop)),
        )
        .build()
        .unwrap()
}

#[test]
fn main_command() {
    let cli = pm();
    expect![[r#"
        pm 1.2.0
          A tiny package manager.

        OPTIONS:
            -D, --save-dev
              Save to devDependencies

            -h, --help
              Prints help information.

            -v, --version
              Prints version information.

        SUBCOMMANDS:
            i, in, install
              Install packages

            run <script>

            cache
              Manage the cache.

              Entries older than a week are
              removed on their own.
    "#]]
    .assert_eq(&cli.help());
    assert_eq!(help(&cli, &["--help"]), cli.help());
}

#[test]
fn subcommand() {
    let cli = pm();
    expect![[r#"
        pm install
          Install packages

        ARGS:
            <pkg>

            [files]...

        OPTIONS:
            -r, --recursive

            -t, --tag <tag>
              Dist tag to install
              [default: latest]

            -h, --help
              Prints help information.

            -v, --version
              Prints version information.
    "#]]
    .assert_eq(&help(&cli, &["install", "-h"]));
    assert_eq!(help(&cli, &["i", "axios", "--help"]), help(&cli, &["install", "-h"]));
}

#[test]
fn claimed_short_flags() {
    let cli = Command::main("tool", "0.1.0").arg("v,!verbose").action_sync(noop).build().unwrap();
    expect![[r#"
        tool 0.1.0

        OPTIONS:
            -v, --verbose

            -h, --help
              Prints help information.

            --version
              Prints version information.
    "#]]
    .assert_eq(&help(&cli, &["-h"]));
    assert_eq!(cli.run_blocking(["-v"]).unwrap(), Outcome::Done);
    assert_eq!(cli.run_blocking(["--version"]).unwrap(), Outcome::Version("0.1.0".to_string()));

    let cli = Command::main("du", "0.1.0").arg("!h").action_sync(noop).build().unwrap();
    expect![[r#"
        du 0.1.0

        OPTIONS:
            --h

            --help
              Prints help information.

            -v, --version
              Prints version information.
    "#]]
    .assert_eq(&help(&cli, &["--help"]));
    assert_eq!(cli.run_blocking(["-h"]).unwrap(), Outcome::Done);
}

#[test]
fn custom_renderer() {
    struct Names;

    impl Render for Names {
        fn render(&self, page: &HelpPage<'_>) -> String {
            let mut names = vec![page.path.clone()];
            names.extend(page.flags.options().iter().map(|it| format!("--{}", it.name)));
            names.extend(page.commands.iter().map(|it| it.name.to_string()));
            names.join(" ")
        }
    }

    let cli = Command::main("pm", "1.2.0")
        .settings(Settings::default().renderer(Names))
        .arg("!debug")
        .sub(Command::new("install").action_sync(noop))
        .sub(Command::new("run").action_sync(noop))
        .build()
        .unwrap();
    expect!["pm --debug install run"].assert_eq(&cli.help());
    assert_eq!(help(&cli, &[]), cli.help());
}
