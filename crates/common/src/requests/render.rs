use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{canonicalize, ConfigError, Executor, RequestError};
use crate::dataset::DatasetRef;
use crate::document::{resolve, Document, ToDocument};
use crate::repo::Repo;
use crate::rpc::RpcClient;

pub const RENDER: &str = "RenderRequests.Render";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.]*)\s*\}\}").expect("hardcoded pattern must compile")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    #[serde(rename = "ref")]
    pub reference: DatasetRef,
    /// text with `{{ path }}` placeholders, each replaced by the value at
    ///  that path in the dataset
    pub template: String,
}

/// Fill a text template from a dataset
#[derive(Debug, Clone)]
pub struct RenderRequests {
    executor: Executor<Arc<dyn Repo>>,
}

fn render_value(value: &Document) -> String {
    match value.to_json() {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Replace every placeholder in `template` with the value its path
///  selects from `document`. Strings are inserted bare, everything else
///  as JSON.
pub fn render_template(template: &str, document: &Document) -> Result<String, RequestError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for captures in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(path)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        out.push_str(&render_value(resolve(document, path.as_str())?));
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

impl RenderRequests {
    pub fn new(local: Option<Arc<dyn Repo>>, remote: Option<RpcClient>) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: Executor::from_parts(local, remote)?,
        })
    }

    pub async fn render(&self, params: &RenderParams) -> Result<String, RequestError> {
        let repo = match &self.executor {
            Executor::Remote(remote) => return remote.call(RENDER, params).await,
            Executor::Local(local) => local.handle(),
        };
        let reference = canonicalize(repo.as_ref(), &params.reference).await?;
        let dataset = repo.load_dataset(&reference.path).await?;
        render_template(&params.template, &dataset.to_document())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::document::PathError;
    use crate::testkit::sample_repo;

    #[test]
    fn test_render_template() {
        let doc = Document::from(json!({
            "meta": {"title": "Rain", "keywords": ["a", "b"]},
            "structure": {"entries": 3}
        }));

        assert_eq!(
            render_template("# {{ meta.title }} ({{structure.entries}} rows)", &doc).unwrap(),
            "# Rain (3 rows)"
        );
        assert_eq!(
            render_template("tags: {{ Meta.Keywords }}", &doc).unwrap(),
            r#"tags: ["a","b"]"#
        );
        assert_eq!(render_template("no placeholders", &doc).unwrap(), "no placeholders");
        assert_eq!(
            render_template("{{ meta.nope }}", &doc).unwrap_err(),
            RequestError::Path(PathError::InvalidPath("meta.nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_render_dataset() {
        let requests = RenderRequests::new(Some(sample_repo().await), None).unwrap();

        let out = requests
            .render(&RenderParams {
                reference: DatasetRef::new("me", "precip"),
                template: "{{ commit.title }} by {{ commit.author }}: {{ body.0.city }}".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(out, "update by b5: toronto");
    }
}
