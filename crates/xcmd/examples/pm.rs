//! A package-manager style CLI.
//!
//! ```text
//! $ cargo run --example pm -- i axios a.js -r --tag next
//! $ RUST_LOG=xcmd=debug cargo run --example pm -- -D install axios
//! ```
use std::ops::ControlFlow;

use xcmd::{Arg, Command, Context, Settings};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::default().unknown_flag(|flag| {
        if flag.flag.starts_with("--") {
            tracing::warn!("{flag}");
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    });
    if let Err(err) = xcmd::configure(settings) {
        panic!("{err}");
    }

    let cli = Command::main("pm", env!("CARGO_PKG_VERSION"))
        .description("A package manager that only pretends.")
        .arg(Arg::new("D,!save-dev").description("Save to devDependencies"))
        .sub(
            Command::new("i,in, install [pkg!, ...files]")
                .description("Install a package")
                .arg(Arg::new("D,!save-dev").description("Save to devDependencies"))
                .arg(("r,!recursive", "Install nested workspaces too"))
                .arg(("t,tag <tag>", "Dist tag to install", "latest"))
                .arg(Arg::new("-retries").default_value(3).hidden())
                .action(|ctx| async move { show(ctx) }),
        )
        .sub(
            Command::new("run [script!, ...args] <script>")
                .description("Run a script from the manifest")
                .action_sync(show),
        )
        .sub(
            Command::new("cache")
                .description("Manage the download cache")
                .sub(
                    Command::new("clean")
                        .arg(("!force", "Also remove entries in use"))
                        .action_sync(show),
                )
                .sub(Command::new("ls").action_sync(show)),
        )
        .build();

    match cli {
        Ok(cli) => cli.run_or_exit(),
        Err(err) => panic!("{err}"),
    }
}

fn show(ctx: Context) -> anyhow::Result<()> {
    let params = ctx.params.as_ref().map(serde_json::to_value).transpose()?;
    let res = serde_json::json!({
        "command": ctx.command.path,
        "flags": ctx.flags,
        "params": params,
    });
    println!("{}", serde_json::to_string_pretty(&res)?);
    Ok(())
}
