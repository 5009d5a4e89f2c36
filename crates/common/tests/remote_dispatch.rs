//! Request objects configured with a remote client forward every operation
//! exactly once and surface the daemon's answer unchanged.

mod common;

use std::sync::Arc;

use serde_json::json;

use ::common::config::P2pConfig;
use ::common::dataset::DatasetRef;
use ::common::document::PathError;
use ::common::node::Node;
use ::common::repo::Repo;
use ::common::requests::dataset::{self, RenameParams, SaveParams};
use ::common::requests::log::{self, LogParams};
use ::common::requests::registry::{self, PublishParams};
use ::common::requests::render::{self, RenderParams};
use ::common::requests::search::{self, SearchParams};
use ::common::requests::selection::{self, SelectParams};
use ::common::requests::{
    peer, profile, ConfigError, DatasetRequests, ListParams, LogRequests, PeerRequests,
    ProfileRequests, RegistryContext, RegistryRequests, RenderRequests, RequestError,
    SearchRequests, SelectionRequests,
};
use ::common::rpc::WireError;
use ::common::testkit::{sample_repo, CallLog, RecordingFactory, RecordingNode, RecordingRegistry};

use common::ScriptedDaemon;

fn precip() -> DatasetRef {
    DatasetRef::new("b5", "precip").with_path("/map/abc")
}

#[tokio::test]
async fn test_every_domain_rejects_two_targets() {
    let daemon = ScriptedDaemon::default();
    let client = daemon.serve().await;
    let repo: Arc<dyn Repo> = sample_repo().await;
    let node: Arc<dyn Node> = Arc::new(RecordingNode::new(CallLog::default()));
    let ctx = Arc::new(RegistryContext::new(
        repo.clone(),
        Arc::new(RecordingRegistry::new(CallLog::default())),
        Arc::new(RecordingFactory::new(CallLog::default())),
        P2pConfig::default(),
    ));

    let both = ConfigError::BothTargets;
    assert_eq!(
        DatasetRequests::new(Some(repo.clone()), Some(client.clone())).unwrap_err(),
        both
    );
    assert_eq!(
        LogRequests::new(Some(repo.clone()), Some(client.clone())).unwrap_err(),
        both
    );
    assert_eq!(
        PeerRequests::new(Some(node), Some(client.clone())).unwrap_err(),
        both
    );
    assert_eq!(
        ProfileRequests::new(Some(repo.clone()), Some(client.clone())).unwrap_err(),
        both
    );
    assert_eq!(
        RegistryRequests::new(Some(ctx), Some(client.clone())).unwrap_err(),
        both
    );
    assert_eq!(
        RenderRequests::new(Some(repo.clone()), Some(client.clone())).unwrap_err(),
        both
    );
    assert_eq!(
        SearchRequests::new(Some(repo.clone()), Some(client.clone())).unwrap_err(),
        both
    );
    assert_eq!(
        SelectionRequests::new(Some(repo), Some(client)).unwrap_err(),
        both
    );

    assert_eq!(
        DatasetRequests::new(None, None).unwrap_err(),
        ConfigError::NoTarget
    );
    assert!(daemon.calls().is_empty());
}

#[tokio::test]
async fn test_dataset_operations_forward_once() {
    let daemon = ScriptedDaemon::default();
    daemon
        .reply(dataset::LIST, json!([{"peername": "b5", "name": "precip"}]))
        .reply(dataset::GET, json!({"path": "/map/abc", "body": [1, 2]}))
        .reply(dataset::SAVE, json!({"peername": "b5", "name": "snow"}))
        .reply(dataset::RENAME, json!({"peername": "b5", "name": "rain"}))
        .reply(dataset::REMOVE, json!({"peername": "b5", "name": "rain"}));
    let requests = DatasetRequests::new(None, Some(daemon.serve().await)).unwrap();

    let listed = requests.list(&ListParams::default()).await.unwrap();
    assert_eq!(listed, vec![DatasetRef::new("b5", "precip")]);

    let got = requests.get(&precip()).await.unwrap();
    assert_eq!(got.body, Some(json!([1, 2])));

    requests
        .save(&SaveParams {
            name: "snow".to_string(),
            dataset: Default::default(),
        })
        .await
        .unwrap();
    requests
        .rename(&RenameParams {
            current: precip(),
            new_name: "rain".to_string(),
        })
        .await
        .unwrap();
    let removed = requests.remove(&DatasetRef::new("b5", "rain")).await.unwrap();
    assert_eq!(removed.name, "rain");

    for method in [
        dataset::LIST,
        dataset::GET,
        dataset::SAVE,
        dataset::RENAME,
        dataset::REMOVE,
    ] {
        assert_eq!(daemon.calls_to(method), 1, "{}", method);
    }
    let (_, params) = &daemon.calls()[1];
    assert_eq!(params["path"], json!("/map/abc"));
}

#[tokio::test]
async fn test_remote_publish_skips_local_workflow() {
    let daemon = ScriptedDaemon::default();
    daemon.reply(registry::PUBLISH, json!({"peername": "b5", "name": "precip"}));
    let requests = RegistryRequests::new(None, Some(daemon.serve().await)).unwrap();

    let published = requests
        .publish(&PublishParams {
            reference: precip(),
            pin: true,
        })
        .await
        .unwrap();
    assert_eq!(published.name, "precip");

    let calls = daemon.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "RegistryRequests.Publish");
    assert_eq!(calls[0].1["pin"], json!(true));
    assert_eq!(calls[0].1["ref"]["name"], json!("precip"));
}

#[tokio::test]
async fn test_remote_errors_keep_their_variant() {
    let daemon = ScriptedDaemon::default();
    daemon
        .fail(registry::PUBLISH, WireError::new("registry", "registry responded 503"))
        .fail(registry::STATUS, WireError::new("empty_ref", ""))
        .fail(selection::SELECT, WireError::new("invalid_index", "5"))
        .fail(render::RENDER, WireError::new("invalid_path", "meta.nope"))
        .fail(log::LOG, WireError::new("not_found", "b5/precip"));
    let client = daemon.serve().await;

    let registry = RegistryRequests::new(None, Some(client.clone())).unwrap();
    assert_eq!(
        registry
            .publish(&PublishParams {
                reference: precip(),
                pin: false,
            })
            .await
            .unwrap_err(),
        RequestError::Registry("registry responded 503".to_string())
    );
    assert_eq!(
        registry.status(&DatasetRef::default()).await.unwrap_err(),
        RequestError::EmptyRef
    );

    let selection = SelectionRequests::new(None, Some(client.clone())).unwrap();
    assert_eq!(
        selection
            .select(&SelectParams {
                reference: precip(),
                path: "meta.keywords.5".to_string(),
            })
            .await
            .unwrap_err(),
        RequestError::Path(PathError::InvalidIndex("5".to_string()))
    );

    let render = RenderRequests::new(None, Some(client.clone())).unwrap();
    assert_eq!(
        render
            .render(&RenderParams {
                reference: precip(),
                template: "{{ meta.nope }}".to_string(),
            })
            .await
            .unwrap_err(),
        RequestError::Path(PathError::InvalidPath("meta.nope".to_string()))
    );

    let log = LogRequests::new(None, Some(client.clone())).unwrap();
    assert_eq!(
        log.log(&LogParams {
            reference: precip(),
            page: ListParams::default(),
        })
        .await
        .unwrap_err(),
        RequestError::NotFound("b5/precip".to_string())
    );

    // search was never scripted
    let search = SearchRequests::new(None, Some(client)).unwrap();
    assert_eq!(
        search
            .search(&SearchParams {
                query: "rain".to_string(),
                page: ListParams::default(),
            })
            .await
            .unwrap_err(),
        RequestError::UnknownMethod(search::SEARCH.to_string())
    );

    assert_eq!(daemon.calls().len(), 6);
}

#[tokio::test]
async fn test_parameterless_operations_forward() {
    let daemon = ScriptedDaemon::default();
    daemon
        .reply(peer::INFO, json!({"id": "abc", "online": true, "addresses": []}))
        .reply(peer::LIST, json!([]))
        .reply(
            profile::GET_PROFILE,
            json!({"id": "abc", "peername": "b5", "created": "2020-01-01T00:00:00Z"}),
        );
    let client = daemon.serve().await;

    let peers = PeerRequests::new(None, Some(client.clone())).unwrap();
    let info = peers.info().await.unwrap();
    assert!(info.online);
    assert!(peers.list(&ListParams::default()).await.unwrap().is_empty());

    let profiles = ProfileRequests::new(None, Some(client)).unwrap();
    assert_eq!(profiles.get_profile().await.unwrap().peername, "b5");

    let calls = daemon.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].1, serde_json::Value::Null);
}
