use std::path::PathBuf;

use chrono::Utc;
use clap::Args;

use common::dataset::{Commit, Dataset, DatasetRef};
use common::requests::dataset::{RenameParams, SaveParams};
use common::requests::ListParams;

use crate::cli::op::{to_pretty, Op, OpContext, RequestOpError};

const DEFAULT_COMMIT_TITLE: &str = "save dataset";

/// One line per reference: `peername/name@path  title`
pub fn format_refs(refs: &[DatasetRef]) -> String {
    if refs.is_empty() {
        return "No datasets found".to_string();
    }
    refs.iter()
        .map(|r| match &r.title {
            Some(title) => format!("{}  {}", r, title),
            None => r.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Args, Debug, Clone)]
pub struct List {
    #[arg(long, default_value_t = 25)]
    pub limit: usize,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

#[async_trait::async_trait]
impl Op for List {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let refs = ctx
            .requests()
            .await?
            .datasets
            .list(&ListParams {
                limit: self.limit,
                offset: self.offset,
            })
            .await?;
        Ok(format_refs(&refs))
    }
}

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Dataset reference, e.g. `me/precip` or `b5/precip@/map/<hash>`
    pub reference: DatasetRef,
}

#[async_trait::async_trait]
impl Op for Get {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let dataset = ctx.requests().await?.datasets.get(&self.reference).await?;
        to_pretty(&dataset)
    }
}

#[derive(Args, Debug, Clone)]
pub struct Save {
    /// Name to save the dataset under
    pub name: String,

    /// JSON file holding the dataset
    #[arg(long)]
    pub file: PathBuf,

    /// Commit title, overrides the one in the file
    #[arg(long)]
    pub title: Option<String>,

    /// Commit message
    #[arg(long)]
    pub message: Option<String>,
}

impl Save {
    /// Dataset from `contents` with a commit describing this save
    pub fn prepare(&self, contents: &str) -> Result<Dataset, RequestOpError> {
        let mut dataset: Dataset = serde_json::from_str(contents)?;
        let commit = dataset.commit.get_or_insert_with(|| Commit {
            title: DEFAULT_COMMIT_TITLE.to_string(),
            timestamp: Utc::now(),
            ..Default::default()
        });
        if let Some(title) = &self.title {
            commit.title = title.clone();
        }
        if let Some(message) = &self.message {
            commit.message = Some(message.clone());
        }
        Ok(dataset)
    }
}

#[async_trait::async_trait]
impl Op for Save {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let contents = tokio::fs::read_to_string(&self.file).await?;
        let dataset = self.prepare(&contents)?;
        let head = ctx
            .requests()
            .await?
            .datasets
            .save(&SaveParams {
                name: self.name.clone(),
                dataset,
            })
            .await?;
        Ok(format!("saved {}", head))
    }
}

#[derive(Args, Debug, Clone)]
pub struct Rename {
    pub reference: DatasetRef,
    pub new_name: String,
}

#[async_trait::async_trait]
impl Op for Rename {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let renamed = ctx
            .requests()
            .await?
            .datasets
            .rename(&RenameParams {
                current: self.reference.clone(),
                new_name: self.new_name.clone(),
            })
            .await?;
        Ok(format!("renamed {} to {}", self.reference, renamed))
    }
}

#[derive(Args, Debug, Clone)]
pub struct Remove {
    pub reference: DatasetRef,
}

#[async_trait::async_trait]
impl Op for Remove {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let removed = ctx.requests().await?.datasets.remove(&self.reference).await?;
        Ok(format!("removed {}", removed))
    }
}
