#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let code = posterm::client::run().await?;

    // The console is restored by now; make sure nothing is left buffered
    use std::io::{self, Write};
    let _ = io::stderr().flush();
    let _ = io::stdout().flush();

    std::process::exit(code)
}
