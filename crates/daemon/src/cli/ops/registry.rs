use clap::Args;

use common::dataset::DatasetRef;
use common::requests::registry::PublishParams;

use crate::cli::op::{Op, OpContext, RequestOpError};

#[derive(Args, Debug, Clone)]
pub struct Publish {
    pub reference: DatasetRef,

    /// Ask the registry to pin a copy, bringing this peer online if needed
    #[arg(long)]
    pub pin: bool,
}

#[async_trait::async_trait]
impl Op for Publish {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let published = ctx
            .requests()
            .await?
            .registry
            .publish(&PublishParams {
                reference: self.reference.clone(),
                pin: self.pin,
            })
            .await?;
        Ok(format!("published {}", published))
    }
}

#[derive(Args, Debug, Clone)]
pub struct Unpublish {
    pub reference: DatasetRef,
}

#[async_trait::async_trait]
impl Op for Unpublish {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let withdrawn = ctx
            .requests()
            .await?
            .registry
            .unpublish(&self.reference)
            .await?;
        Ok(format!("unpublished {}", withdrawn))
    }
}

#[derive(Args, Debug, Clone)]
pub struct Status {
    pub reference: DatasetRef,
}

#[async_trait::async_trait]
impl Op for Status {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let status = ctx
            .requests()
            .await?
            .registry
            .status(&self.reference)
            .await?;
        Ok(format!(
            "{}: {}",
            self.reference,
            if status.published {
                "published"
            } else {
                "not published"
            }
        ))
    }
}
