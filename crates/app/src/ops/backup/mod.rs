use clap::{Args, Subcommand};

pub mod create;
pub mod restore;

use crate::op::Op;

crate::command_enum! {
    (Create, create::Create),
    (Restore, restore::Restore),
}

pub type BackupCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Backup {
    #[command(subcommand)]
    pub command: BackupCommand,
}

#[async_trait::async_trait]
impl Op for Backup {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
