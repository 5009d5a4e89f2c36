use clap::Args;

use common::dataset::DatasetRef;
use common::requests::log::LogParams;
use common::requests::ListParams;

use crate::cli::op::{Op, OpContext, RequestOpError};

#[derive(Args, Debug, Clone)]
pub struct Log {
    /// Dataset whose history to show
    pub reference: DatasetRef,

    #[arg(long, default_value_t = 25)]
    pub limit: usize,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

#[async_trait::async_trait]
impl Op for Log {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let versions = ctx
            .requests()
            .await?
            .log
            .log(&LogParams {
                reference: self.reference.clone(),
                page: ListParams {
                    limit: self.limit,
                    offset: self.offset,
                },
            })
            .await?;

        let output = versions
            .iter()
            .map(|version| {
                let when = version
                    .timestamp
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                format!(
                    "{}\n    {}  {}  {}",
                    version.path,
                    when,
                    version.author.as_deref().unwrap_or("unknown"),
                    version.title.as_deref().unwrap_or("")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(output)
    }
}
