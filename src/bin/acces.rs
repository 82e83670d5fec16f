use acces::cli::{actions, actions::Action, start};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let action = start()?;

    match action {
        Action::Server(args) => actions::server::execute(args).await?,
    }

    Ok(())
}
