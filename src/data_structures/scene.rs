//! Root-level scene state and the copy-on-write update entry point.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::data_structures::scene_graph::{Node, NodeId};
use crate::error::SceneError;
use crate::math::Matrix4;

/// Name of the synthetic group the renderer draws the roots under.
pub const SCENE_ROOT: &str = "scene-root";

/// One immutable version of the scene: an ordered list of root nodes.
///
/// Versions share untouched subtrees, so cloning a `Scene` or keeping an old
/// one around is cheap.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    roots: Vec<Arc<Node>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roots(roots: impl IntoIterator<Item = Node>) -> Self {
        let roots = roots
            .into_iter()
            .map(|mut node| {
                node.compute_world_transform(None, true);
                Arc::new(node)
            })
            .collect();
        Self { roots }
    }

    pub fn roots(&self) -> &[Arc<Node>] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Appends a root. A root with the same id is replaced in place.
    pub fn push_root(&mut self, mut node: Node) {
        node.compute_world_transform(None, true);
        match self.roots.iter().position(|r| r.id() == node.id()) {
            Some(idx) => {
                self.roots[idx].kill(false);
                self.roots[idx] = Arc::new(node);
            }
            None => self.roots.push(Arc::new(node)),
        }
    }

    /// Removes a root and tombstones its whole subtree.
    pub fn remove_root(&mut self, id: NodeId) -> Option<Arc<Node>> {
        let idx = self.roots.iter().position(|r| r.id() == id)?;
        let removed = self.roots.remove(idx);
        removed.kill(true);
        Some(removed)
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.roots.iter().find_map(|r| r.find(id))
    }

    pub fn find_shared(&self, id: NodeId) -> Option<&Arc<Node>> {
        find_shared_in(&self.roots, id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.roots.iter().find_map(|r| r.find_by_name(name))
    }

    pub fn camera(&self, id: NodeId) -> Result<&Node, SceneError> {
        let node = self.find(id).ok_or(SceneError::NotFound(id))?;
        if node.is_camera() {
            Ok(node)
        } else {
            Err(SceneError::NotACamera(id))
        }
    }

    /// All roots wrapped in one group, the shape the renderer consumes.
    pub fn render_root(&self) -> Node {
        Node::group_of(SCENE_ROOT, self.roots.clone())
    }

    /**
    Returns the next scene version with `changed` substituted for the node
    that has its id.

    Only the nodes on the path from a root to the changed node are rebuilt;
    the changed subtree itself goes through [`Node::clone_and_change`] and
    every sibling subtree is shared with `self`. Each superseded node is
    tombstoned. Cameras and lights are swapped in directly.
    */
    pub fn apply_change(&self, changed: Node) -> Result<Scene, SceneError> {
        let id = changed.id();
        let mut roots = self.roots.clone();
        let idx = roots
            .iter()
            .position(|r| r.contains(id))
            .ok_or(SceneError::NotFound(id))?;
        let rebuilt = path_copy(&roots[idx], &changed, None)?;
        roots[idx] = Arc::new(rebuilt);
        Ok(Scene { roots })
    }

    /// Rebuilds every root through [`Node::clone_and_change`], tombstoning
    /// the entire previous version. Camera and light roots are carried over
    /// or swapped in directly.
    pub fn replace_with_copy(&self, changed: Option<&Node>) -> Result<Scene, SceneError> {
        let mut roots = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            if root.is_camera() || root.is_light() {
                match changed {
                    Some(c) if c.id() == root.id() => {
                        root.kill(true);
                        roots.push(Arc::new(c.clone()));
                    }
                    _ => roots.push(Arc::clone(root)),
                }
                continue;
            }
            let mut copy = Node::clone_and_change(root, changed)?;
            copy.compute_world_transform(None, true);
            roots.push(Arc::new(copy));
        }
        Ok(Scene { roots })
    }

    /// TRS-only json of every root.
    pub fn to_json(&self) -> Result<String, SceneError> {
        let trees: Vec<_> = self.roots.iter().map(|r| r.to_trs_json()).collect();
        Ok(serde_json::to_string(&trees)?)
    }

    pub fn from_json(json: &str) -> Result<Scene, SceneError> {
        let trees: Vec<crate::data_structures::scene_graph::TrsJson> = serde_json::from_str(json)?;
        Ok(Scene::from_roots(trees.iter().map(Node::from_trs_json)))
    }
}

fn find_shared_in(nodes: &[Arc<Node>], id: NodeId) -> Option<&Arc<Node>> {
    nodes.iter().find_map(|n| {
        if n.id() == id {
            Some(n)
        } else {
            n.find_shared(id)
        }
    })
}

fn path_copy(node: &Arc<Node>, changed: &Node, parent_world: Option<&Matrix4>) -> Result<Node, SceneError> {
    if node.id() == changed.id() {
        if changed.is_camera() || changed.is_light() || node.is_camera() || node.is_light() {
            node.kill(false);
            let mut fresh = changed.clone();
            fresh.compute_world_transform(parent_world, true);
            return Ok(fresh);
        }
        let mut fresh = Node::clone_and_change(node, Some(changed))?;
        fresh.compute_world_transform(parent_world, true);
        return Ok(fresh);
    }

    let mut copy = Node::clone(node);
    node.kill(false);
    copy.compute_world_transform(parent_world, false);
    let world = copy.world_transform();
    let idx = copy
        .children()
        .iter()
        .position(|c| c.contains(changed.id()))
        .ok_or(SceneError::NotFound(changed.id()))?;
    let rebuilt = path_copy(&copy.children()[idx], changed, Some(&world))?;
    copy.replace_child(idx, rebuilt);
    Ok(copy)
}

/// Read-through id → node cache over the current scene.
///
/// Entries hold weak handles. An entry whose node was dropped or tombstoned
/// counts as a miss and is searched for again in the scene passed to
/// [`NodeLookup::get`].
#[derive(Debug, Default)]
pub struct NodeLookup {
    cache: HashMap<NodeId, Weak<Node>>,
}

impl NodeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, id: NodeId, scene: &Scene) -> Option<Arc<Node>> {
        if let Some(node) = self.cache.get(&id).and_then(Weak::upgrade) {
            if !node.is_dead() {
                return Some(node);
            }
            log::trace!("lookup cache entry for {id} is tombstoned");
        }
        self.cache.remove(&id);
        let found = Arc::clone(scene.find_shared(id)?);
        self.cache.insert(id, Arc::downgrade(&found));
        Some(found)
    }

    pub fn invalidate(&mut self, id: NodeId) {
        self.cache.remove(&id);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
