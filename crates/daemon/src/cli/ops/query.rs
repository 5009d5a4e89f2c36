use std::path::PathBuf;

use clap::Args;

use common::dataset::DatasetRef;
use common::requests::render::RenderParams;
use common::requests::search::SearchParams;
use common::requests::selection::SelectParams;
use common::requests::ListParams;

use super::dataset::format_refs;
use crate::cli::op::{to_pretty, Op, OpContext, RequestOpError};

/// Find local datasets by name, title or keyword
#[derive(Args, Debug, Clone)]
pub struct Search {
    pub query: String,

    #[arg(long, default_value_t = 25)]
    pub limit: usize,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

#[async_trait::async_trait]
impl Op for Search {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let found = ctx
            .requests()
            .await?
            .search
            .search(&SearchParams {
                query: self.query.clone(),
                page: ListParams {
                    limit: self.limit,
                    offset: self.offset,
                },
            })
            .await?;
        Ok(format_refs(&found))
    }
}

/// Fill a template's `{{ path }}` placeholders from a dataset
#[derive(Args, Debug, Clone)]
pub struct Render {
    pub reference: DatasetRef,

    /// Template text
    #[arg(long, conflicts_with = "template_file")]
    pub template: Option<String>,

    /// File holding the template
    #[arg(long)]
    pub template_file: Option<PathBuf>,
}

#[async_trait::async_trait]
impl Op for Render {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let template = match (&self.template, &self.template_file) {
            (Some(template), _) => template.clone(),
            (None, Some(path)) => tokio::fs::read_to_string(path).await?,
            (None, None) => {
                return Err(RequestOpError::Input(
                    "either --template or --template-file is required".to_string(),
                ))
            }
        };

        let rendered = ctx
            .requests()
            .await?
            .render
            .render(&RenderParams {
                reference: self.reference.clone(),
                template,
            })
            .await?;
        Ok(rendered)
    }
}

/// Print the value at a dotted path, e.g. `meta.keywords.0`
#[derive(Args, Debug, Clone)]
pub struct Select {
    pub reference: DatasetRef,

    /// Dot-separated, case-insensitive; omit for the whole dataset
    #[arg(default_value = "")]
    pub path: String,
}

#[async_trait::async_trait]
impl Op for Select {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let value = ctx
            .requests()
            .await?
            .selection
            .select(&SelectParams {
                reference: self.reference.clone(),
                path: self.path.clone(),
            })
            .await?;
        match value {
            serde_json::Value::String(s) => Ok(s),
            other => to_pretty(&other),
        }
    }
}
