mod parser;
mod help;

use std::fmt;

use expect_test::Expect;

fn check<F, A>(f: F, args: &str, expect: Expect)
where
    F: FnOnce(Vec<String>) -> xcmd::Result<A>,
    A: fmt::Debug,
{
    let args = args.split_ascii_whitespace().map(String::from).collect::<Vec<_>>();
    let res = f(args);
    match res {
        Ok(res) => {
            expect.assert_eq(&format!("{res:?}"));
        }
        Err(err) => {
            expect.assert_eq(&err.to_string());
        }
    }
}
