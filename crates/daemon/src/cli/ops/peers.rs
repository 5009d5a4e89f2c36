use clap::Args;

use common::requests::ListParams;

use crate::cli::op::{Op, OpContext, RequestOpError};

/// Show this peer's node
#[derive(Args, Debug, Clone)]
pub struct Info;

#[async_trait::async_trait]
impl Op for Info {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let info = ctx.requests().await?.peers.info().await?;

        let mut lines = vec![
            format!("id:     {}", info.id),
            format!("online: {}", info.online),
        ];
        if !info.addresses.is_empty() {
            lines.push("addresses:".to_string());
            lines.extend(info.addresses.iter().map(|a| format!("  {}", a)));
        }
        Ok(lines.join("\n"))
    }
}

/// List connected peers
#[derive(Args, Debug, Clone)]
pub struct Peers {
    #[arg(long, default_value_t = 25)]
    pub limit: usize,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

#[async_trait::async_trait]
impl Op for Peers {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let peers = ctx
            .requests()
            .await?
            .peers
            .list(&ListParams {
                limit: self.limit,
                offset: self.offset,
            })
            .await?;

        if peers.is_empty() {
            return Ok("No connected peers".to_string());
        }
        Ok(peers
            .iter()
            .map(|p| format!("{}  {}", p.id, p.addresses.join(", ")))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
