//! Navigation pane model: the main activity and its sub-activity tree.

use std::collections::HashSet;
use std::sync::Arc;

use aldb_core::{ActivityKey, ActivityVersion};
use aldb_store::{ActivityDirectory, DirectoryError, DirectoryIndex};
use serde::Serialize;
use tracing::{debug, warn};

/// One row of the navigation tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
    /// Has children beyond the depth limit.
    #[serde(skip_serializing_if = "is_false")]
    pub truncated: bool,
    /// Already on the path from the root; children omitted.
    #[serde(skip_serializing_if = "is_false")]
    pub cycle: bool,
    /// Expanded earlier in the tree under another parent; children omitted.
    #[serde(skip_serializing_if = "is_false")]
    pub repeated: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl NavNode {
    fn leaf(activity: &ActivityVersion, locale: &str) -> Self {
        let id = activity.id_str().to_string();
        let label = activity
            .label
            .display(locale)
            .map(String::from)
            .unwrap_or_else(|| id.clone());
        Self {
            id,
            version: activity.version.clone(),
            label,
            children: Vec::new(),
            truncated: false,
            cycle: false,
            repeated: false,
        }
    }

    /// Nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            total += 1;
            pending.extend(&node.children);
        }
        total
    }
}

/// What the host renders: a tree, or why there is none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum NavView {
    Ready {
        tree: NavNode,
    },
    Error {
        kind: String,
        code: String,
        message: String,
    },
}

impl From<&DirectoryError> for NavView {
    fn from(e: &DirectoryError) -> Self {
        NavView::Error {
            kind: e.error_kind().to_string(),
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

/// Deepest tree any caller can ask for.
pub const MAX_NAV_DEPTH: usize = 256;

pub struct NavigationPresenter {
    directory: Arc<ActivityDirectory>,
    default_locale: String,
    max_depth: usize,
}

impl NavigationPresenter {
    pub fn new(
        directory: Arc<ActivityDirectory>,
        default_locale: impl Into<String>,
        max_depth: usize,
    ) -> Self {
        Self {
            directory,
            default_locale: default_locale.into(),
            max_depth: max_depth.min(MAX_NAV_DEPTH),
        }
    }

    pub fn directory(&self) -> &Arc<ActivityDirectory> {
        &self.directory
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The activity the navigation pane is rooted at.
    pub async fn root_activity(&self) -> Result<Arc<ActivityVersion>, DirectoryError> {
        self.directory.get_main_activity().await.inspect_err(|e| {
            warn!(error = %e, kind = e.error_kind(), "no root activity for navigation");
        })
    }

    /// Sub-activity tree under the root, `max_depth` levels deep. Requests
    /// deeper than the configured depth are cut to it.
    pub async fn nav_tree(
        &self,
        locale: Option<&str>,
        max_depth: Option<usize>,
    ) -> Result<NavNode, DirectoryError> {
        let index = self.directory.index().await?;
        let root = self.directory.main_activity_in(&index).inspect_err(|e| {
            warn!(error = %e, kind = e.error_kind(), "no root activity for navigation");
        })?;
        let locale = locale.unwrap_or(self.default_locale.as_str());
        let max_depth = max_depth.map_or(self.max_depth, |d| d.min(self.max_depth));

        let tree = build(&index, &root, locale, max_depth);
        debug!(nodes = tree.count(), locale, max_depth, "built navigation tree");
        Ok(tree)
    }

    /// Like [`nav_tree`](Self::nav_tree), folded into a renderable view.
    pub async fn view(&self, locale: Option<&str>, max_depth: Option<usize>) -> NavView {
        match self.nav_tree(locale, max_depth).await {
            Ok(tree) => NavView::Ready { tree },
            Err(e) => NavView::from(&e),
        }
    }
}

/// A node whose children are still being emitted.
struct Frame {
    node: NavNode,
    key: ActivityKey,
    children: std::vec::IntoIter<Arc<ActivityVersion>>,
}

enum Visit {
    Leaf(NavNode),
    Expand(Frame),
}

/// Depth-first, without recursion. Each activity is expanded at most once.
fn build(
    index: &DirectoryIndex,
    root: &Arc<ActivityVersion>,
    locale: &str,
    max_depth: usize,
) -> NavNode {
    let mut expanded = HashSet::new();
    let mut root = match visit(index, root, locale, 0, max_depth, &|_| false, &mut expanded) {
        Visit::Leaf(node) => return node,
        Visit::Expand(frame) => frame,
    };
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let top = stack.last_mut().unwrap_or(&mut root);
        match top.children.next() {
            Some(child) => {
                let on_path =
                    |key: &ActivityKey| root.key == *key || stack.iter().any(|f| f.key == *key);
                let depth = stack.len() + 1;
                match visit(index, &child, locale, depth, max_depth, &on_path, &mut expanded) {
                    Visit::Leaf(node) => {
                        stack.last_mut().unwrap_or(&mut root).node.children.push(node);
                    }
                    Visit::Expand(frame) => stack.push(frame),
                }
            }
            None => match stack.pop() {
                Some(done) => {
                    stack.last_mut().unwrap_or(&mut root).node.children.push(done.node);
                }
                None => return root.node,
            },
        }
    }
}

fn visit(
    index: &DirectoryIndex,
    activity: &Arc<ActivityVersion>,
    locale: &str,
    depth: usize,
    max_depth: usize,
    on_path: &dyn Fn(&ActivityKey) -> bool,
    expanded: &mut HashSet<ActivityKey>,
) -> Visit {
    let mut node = NavNode::leaf(activity, locale);
    let Some(key) = activity.key() else {
        return Visit::Leaf(node);
    };
    if on_path(&key) {
        node.cycle = true;
        return Visit::Leaf(node);
    }

    let children = index.resolve_all(&activity.subs);
    if children.is_empty() {
        return Visit::Leaf(node);
    }
    if expanded.contains(&key) {
        node.repeated = true;
        return Visit::Leaf(node);
    }
    if depth >= max_depth {
        node.truncated = true;
        return Visit::Leaf(node);
    }

    let _ = expanded.insert(key.clone());
    Visit::Expand(Frame {
        node,
        key,
        children: children.into_iter(),
    })
}
