use clap::{Args, Subcommand};

pub mod add;
pub mod ls;

use crate::op::Op;

crate::command_enum! {
    (Add, add::Add),
    (Ls, ls::Ls),
}

pub type PeerCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Peer {
    #[command(subcommand)]
    pub command: PeerCommand,
}

#[async_trait::async_trait]
impl Op for Peer {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
