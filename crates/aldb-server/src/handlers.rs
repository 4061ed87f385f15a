//! RPC method handlers organized by domain.

use std::sync::Arc;

use aldb_core::ActivityVersion;
use aldb_store::{ActivityDirectory, Traversal};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::presenter::NavigationPresenter;
use crate::rpc::{self, RpcResponse};

/// Shared state available to all RPC handlers.
pub struct HandlerState {
    pub presenter: Arc<NavigationPresenter>,
}

impl HandlerState {
    pub fn new(presenter: Arc<NavigationPresenter>) -> Self {
        Self { presenter }
    }

    pub fn directory(&self) -> &Arc<ActivityDirectory> {
        self.presenter.directory()
    }
}

/// Dispatch an RPC method to the appropriate handler.
pub async fn dispatch(
    state: &Arc<HandlerState>,
    method: &str,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    debug!(method, "rpc dispatch");
    match method {
        // ── Activities ──────────────────────────────────────────────
        "activity.getMain" => activity_get_main(state, id).await,
        "activity.get" => activity_get(state, params, id).await,
        "activity.subs" => activity_links(state, params, id, Link::Subs).await,
        "activity.supers" => activity_links(state, params, id, Link::Supers).await,
        "activity.descendants" => activity_walk(state, params, id, Link::Subs).await,
        "activity.ancestors" => activity_walk(state, params, id, Link::Supers).await,

        // ── Navigation ──────────────────────────────────────────────
        "nav.tree" => nav_tree(state, params, id).await,

        // ── Directory ───────────────────────────────────────────────
        "directory.reload" => directory_reload(state, id).await,
        "directory.consistency" => directory_consistency(state, id).await,

        // ── System ──────────────────────────────────────────────────
        "system.ping" | "health" => health(state, id).await,

        _ => RpcResponse::method_not_found(id, method),
    }
}

#[derive(Clone, Copy)]
enum Link {
    Subs,
    Supers,
}

fn to_json<T: Serialize>(value: &T, id: Option<serde_json::Value>) -> RpcResponse {
    match serde_json::to_value(value) {
        Ok(v) => RpcResponse::success(id, v),
        Err(e) => RpcResponse::internal_error(id, e.to_string()),
    }
}

async fn activity_get_main(state: &Arc<HandlerState>, id: Option<serde_json::Value>) -> RpcResponse {
    match state.directory().get_main_activity().await {
        Ok(activity) => to_json(&*activity, id),
        Err(e) => RpcResponse::directory_error(id, &e),
    }
}

async fn activity_get(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    let activity_id = match rpc::require_str(params, "id") {
        Ok(s) => s,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    let version = rpc::optional_str(params, "version");

    match state.directory().get_by_id(activity_id, version).await {
        Ok(activity) => to_json(&*activity, id),
        Err(e) => RpcResponse::directory_error(id, &e),
    }
}

async fn activity_links(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
    link: Link,
) -> RpcResponse {
    let activity_id = match rpc::require_str(params, "id") {
        Ok(s) => s,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };

    let directory = state.directory();
    let result = match link {
        Link::Subs => directory.get_subs(activity_id).await,
        Link::Supers => directory.get_supers(activity_id).await,
    };
    match result {
        Ok(list) => {
            let items: Vec<&ActivityVersion> = list.iter().map(|a| a.as_ref()).collect();
            to_json(&items, id)
        }
        Err(e) => RpcResponse::directory_error(id, &e),
    }
}

#[derive(Serialize)]
struct WalkEntry<'a> {
    depth: usize,
    activity: &'a ActivityVersion,
}

async fn activity_walk(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
    link: Link,
) -> RpcResponse {
    let activity_id = match rpc::require_str(params, "id") {
        Ok(s) => s,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };
    let max_depth = match rpc::optional_usize(params, "maxDepth") {
        Ok(d) => d,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };

    let directory = state.directory();
    let walk: Traversal = match link {
        Link::Subs => match directory.descendants(activity_id, max_depth).await {
            Ok(w) => w,
            Err(e) => return RpcResponse::directory_error(id, &e),
        },
        Link::Supers => match directory.ancestors(activity_id, max_depth).await {
            Ok(w) => w,
            Err(e) => return RpcResponse::directory_error(id, &e),
        },
    };

    let found: Vec<_> = walk.collect();
    let entries: Vec<WalkEntry<'_>> = found
        .iter()
        .map(|(depth, activity)| WalkEntry {
            depth: *depth,
            activity: activity.as_ref(),
        })
        .collect();
    to_json(&entries, id)
}

async fn nav_tree(
    state: &Arc<HandlerState>,
    params: &serde_json::Value,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    let locale = rpc::optional_str(params, "locale");
    let max_depth = match rpc::optional_usize(params, "maxDepth") {
        Ok(d) => d,
        Err(e) => return RpcResponse::invalid_params(id, e),
    };

    match state.presenter.nav_tree(locale, max_depth).await {
        Ok(tree) => to_json(&tree, id),
        Err(e) => RpcResponse::directory_error(id, &e),
    }
}

async fn directory_reload(state: &Arc<HandlerState>, id: Option<serde_json::Value>) -> RpcResponse {
    match state.directory().reload().await {
        Ok(records) => {
            info!(records, "directory reloaded via rpc");
            RpcResponse::success(id, json!({ "records": records }))
        }
        Err(e) => RpcResponse::directory_error(id, &e),
    }
}

async fn directory_consistency(
    state: &Arc<HandlerState>,
    id: Option<serde_json::Value>,
) -> RpcResponse {
    match state.directory().consistency_issues().await {
        Ok(issues) => {
            let described: Vec<serde_json::Value> = issues
                .iter()
                .map(|i| {
                    json!({
                        "from": i.from,
                        "to": i.to,
                        "relation": i.relation,
                        "message": i.to_string(),
                    })
                })
                .collect();
            RpcResponse::success(id, json!({ "issues": described }))
        }
        Err(e) => RpcResponse::directory_error(id, &e),
    }
}

/// Loads the directory if needed; `healthy` once it is usable.
async fn health(state: &Arc<HandlerState>, id: Option<serde_json::Value>) -> RpcResponse {
    let directory = state.directory();
    let load_error = directory.index().await.err();
    let stats = directory.stats().await;

    let mut body = json!({
        "status": if load_error.is_none() { "healthy" } else { "degraded" },
        "components": {
            "directory": stats,
        },
    });
    if let Some(e) = load_error {
        body["error"] = json!({ "code": e.code(), "message": e.to_string() });
    }
    RpcResponse::success(id, body)
}

#[cfg(test)]
mod tests {
    use aldb_core::sample;
    use aldb_store::{JsonFileSource, SourceSnapshot, StaticSource};

    use super::*;

    fn state_with(directory: ActivityDirectory) -> Arc<HandlerState> {
        let presenter = NavigationPresenter::new(Arc::new(directory), "en", 8);
        Arc::new(HandlerState::new(Arc::new(presenter)))
    }

    fn setup() -> Arc<HandlerState> {
        state_with(ActivityDirectory::new(Arc::new(StaticSource::sample())))
    }

    async fn call(state: &Arc<HandlerState>, method: &str, params: serde_json::Value) -> RpcResponse {
        dispatch(state, method, &params, Some(json!(1))).await
    }

    #[tokio::test]
    async fn get_main_returns_root() {
        let resp = call(&setup(), "activity.getMain", json!({})).await;
        assert!(resp.success);
        let result = resp.result.unwrap();
        assert_eq!(result["id"], sample::PROJECT_X);
        assert_eq!(result["label"]["*"], "Project X");
    }

    #[tokio::test]
    async fn get_by_id_and_version() {
        let state = setup();
        let resp = call(&state, "activity.get", json!({"id": sample::DOC_3, "version": "1"})).await;
        assert!(resp.success);
        assert_eq!(
            resp.result.unwrap()["blob"]["manifest"]["mediaType"],
            "text/plain; charset=UTF-8"
        );

        let resp = call(&state, "activity.get", json!({"id": "urn:act:9"})).await;
        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_id_is_invalid_params() {
        let resp = call(&setup(), "activity.subs", json!({})).await;
        assert_eq!(resp.error.unwrap().code, "INVALID_PARAMS");
    }

    #[tokio::test]
    async fn subs_and_supers() {
        let state = setup();
        let subs = call(&state, "activity.subs", json!({"id": sample::PROJECT_X})).await;
        let subs = subs.result.unwrap();
        assert_eq!(subs.as_array().unwrap().len(), 1);
        assert_eq!(subs[0]["id"], sample::RND);
        assert_eq!(subs[0]["label"]["*"], "R&D");

        let supers = call(&state, "activity.supers", json!({"id": sample::DOC_3})).await;
        assert_eq!(supers.result.unwrap()[0]["id"], sample::RND);
    }

    #[tokio::test]
    async fn descendants_carry_depth() {
        let state = setup();
        let resp = call(&state, "activity.descendants", json!({"id": sample::PROJECT_X})).await;
        let list = resp.result.unwrap();
        assert_eq!(list[0]["depth"], 1);
        assert_eq!(list[1]["depth"], 2);
        assert_eq!(list[1]["activity"]["id"], sample::DOC_3);

        let resp = call(
            &state,
            "activity.ancestors",
            json!({"id": sample::DOC_3, "maxDepth": 1}),
        )
        .await;
        assert_eq!(resp.result.unwrap().as_array().unwrap().len(), 1);

        let resp = call(&state, "activity.ancestors", json!({"id": sample::DOC_3, "maxDepth": "x"})).await;
        assert_eq!(resp.error.unwrap().code, "INVALID_PARAMS");
    }

    #[tokio::test]
    async fn nav_tree_method() {
        let resp = call(&setup(), "nav.tree", json!({"locale": "en", "maxDepth": 1})).await;
        let tree = resp.result.unwrap();
        assert_eq!(tree["label"], "Project X");
        assert_eq!(tree["children"][0]["truncated"], true);
    }

    #[tokio::test]
    async fn reload_and_consistency() {
        let state = setup();
        let resp = call(&state, "directory.reload", json!({})).await;
        assert_eq!(resp.result.unwrap()["records"], 3);

        let resp = call(&state, "directory.consistency", json!({})).await;
        assert_eq!(resp.result.unwrap()["issues"], json!([]));
    }

    #[tokio::test]
    async fn consistency_issues_are_described() {
        let parent = ActivityVersion::stub("urn:act:1", "1").with_sub(ActivityVersion::stub("urn:act:2", "1"));
        let child = ActivityVersion::stub("urn:act:2", "1").with_super(ActivityVersion::stub("urn:act:3", "1"));
        let source = StaticSource::new(SourceSnapshot::new(
            Some("urn:act:1".into()),
            vec![parent, child, ActivityVersion::stub("urn:act:3", "1")],
        ));
        let state = state_with(ActivityDirectory::new(Arc::new(source)));
        let resp = call(&state, "directory.consistency", json!({})).await;
        let issues = resp.result.unwrap()["issues"].clone();
        assert_eq!(issues[0]["relation"], "sub");
        assert_eq!(issues[0]["from"]["id"], "urn:act:1");
    }

    #[tokio::test]
    async fn health_reports_directory() {
        let resp = call(&setup(), "system.ping", json!({})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["status"], "healthy");
        assert_eq!(result["components"]["directory"]["records"], 3);
        assert_eq!(result["components"]["directory"]["loaded"], true);
    }

    #[tokio::test]
    async fn health_degraded_when_source_fails() {
        let state = state_with(ActivityDirectory::new(Arc::new(JsonFileSource::new(
            "/nonexistent/aldb/activities.json",
        ))));
        let resp = call(&state, "health", json!({})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["status"], "degraded");
        assert_eq!(result["error"]["code"], "SOURCE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn unknown_method() {
        let resp = call(&setup(), "activity.delete", json!({})).await;
        assert_eq!(resp.error.unwrap().code, "METHOD_NOT_FOUND");
    }
}
