//! Scene graph nodes.
//!
//! A [`Node`] owns its children through `Arc`s, so two versions of a tree can
//! share every subtree that did not change between them. Nodes never point
//! back at their parent; anything that needs the parent walks down from a
//! root instead.
//!
//! Editing follows a copy-on-write protocol: the live tree is never mutated,
//! a replacement is built next to it and every node it supersedes is
//! tombstoned (see [`Node::kill`]). Cameras and lights are excluded from the
//! structural rebuild and are always substituted directly.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cgmath::SquareMatrix;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data_structures::camera::{Camera, Projection};
use crate::data_structures::color::Color;
use crate::data_structures::geometry::BufferGeometry;
use crate::data_structures::light::{Light, LightKind};
use crate::data_structures::material::Material;
use crate::data_structures::transform::Transform;
use crate::error::SceneError;
use crate::math::{self, Euler, Matrix4, Quaternion, Vector3, VectorExt};

/// Stable node identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        NodeId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub geometry: BufferGeometry,
    pub material: Material,
}

/// What a node is, beyond its transform.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Camera(Camera),
    Light(Light),
    Mesh(Mesh),
}

/// Component selector for [`Node::get_property`] / [`Node::set_property`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl FromStr for Axis {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(SceneError::InvalidProperty(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyType {
    Position,
    Rotation,
    Scale,
}

impl FromStr for PropertyType {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "position" => Ok(PropertyType::Position),
            "rotation" => Ok(PropertyType::Rotation),
            "scale" => Ok(PropertyType::Scale),
            other => Err(SceneError::InvalidProperty(other.to_string())),
        }
    }
}

fn component(v: [f32; 3], axis: Axis) -> f32 {
    match axis {
        Axis::X => v[0],
        Axis::Y => v[1],
        Axis::Z => v[2],
    }
}

fn with_component(mut v: [f32; 3], axis: Axis, value: f32) -> [f32; 3] {
    match axis {
        Axis::X => v[0] = value,
        Axis::Y => v[1] = value,
        Axis::Z => v[2] = value,
    }
    v
}

/// TRS-only persistence format. Geometry, materials, names and ids are not stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrsJson {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    #[serde(alias = "enabled")]
    pub enable: bool,
    #[serde(default)]
    pub children: Vec<TrsJson>,
}

#[derive(Debug)]
pub struct Node {
    id: NodeId,
    name: String,
    transform: Transform,
    local: Matrix4,
    world: Matrix4,
    enabled: bool,
    dead: AtomicBool,
    kind: NodeKind,
    children: Vec<Arc<Node>>,
}

/// Keeps the id and shares the children. The copy starts alive even when
/// the original has been tombstoned.
impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            transform: self.transform.clone(),
            local: self.local,
            world: self.world,
            enabled: self.enabled,
            dead: AtomicBool::new(false),
            kind: self.kind.clone(),
            children: self.children.clone(),
        }
    }
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            transform: Transform::new(),
            local: Matrix4::identity(),
            world: Matrix4::identity(),
            enabled: true,
            dead: AtomicBool::new(false),
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Group over subtrees that are already placed; their world matrices
    /// are left as they are.
    pub fn group_of(name: impl Into<String>, children: Vec<Arc<Node>>) -> Self {
        let mut node = Self::group(name);
        node.children = children;
        node
    }

    pub fn mesh(geometry: BufferGeometry, material: Material) -> Self {
        Self::new("", NodeKind::Mesh(Mesh { geometry, material }))
    }

    pub fn camera(projection: Projection) -> Self {
        let camera = Camera::new(projection, Vector3::new(0.0, 0.0, 0.0));
        Self::new("", NodeKind::Camera(camera))
    }

    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::camera(Projection::Perspective {
            fov,
            aspect,
            near,
            far,
        })
    }

    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self::camera(Projection::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            far,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn oblique(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
        theta: f32,
        ratio: f32,
    ) -> Self {
        Self::camera(Projection::Oblique {
            left,
            right,
            bottom,
            top,
            near,
            far,
            theta,
            ratio,
        })
    }

    /// A light placed at its kind's default position.
    pub fn light(color: Color, intensity: f32, kind: LightKind) -> Self {
        let mut node = Self::new(
            "",
            NodeKind::Light(Light {
                color,
                intensity,
                kind,
            }),
        );
        node.transform.set_position(kind.default_position());
        node
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_position(mut self, position: Vector3) -> Self {
        self.set_position(position);
        self
    }

    pub fn with_rotation(mut self, rotation: Euler) -> Self {
        self.set_rotation(rotation);
        self
    }

    pub fn with_scale(mut self, scale: Vector3) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.add(child);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Re-stamps the identity, for copies meant to stand in for an existing node.
    pub fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn is_camera(&self) -> bool {
        matches!(self.kind, NodeKind::Camera(_))
    }

    pub fn is_light(&self) -> bool {
        matches!(self.kind, NodeKind::Light(_))
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    fn is_camera_or_light(&self) -> bool {
        self.is_camera() || self.is_light()
    }

    pub fn as_camera(&self) -> Option<&Camera> {
        match &self.kind {
            NodeKind::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_camera_mut(&mut self) -> Option<&mut Camera> {
        match &mut self.kind {
            NodeKind::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.kind {
            NodeKind::Light(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(m) => Some(m),
            _ => None,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vector3 {
        self.transform.position()
    }

    pub fn rotation(&self) -> Euler {
        self.transform.rotation()
    }

    pub fn quaternion(&self) -> Quaternion {
        self.transform.quaternion()
    }

    pub fn scale(&self) -> Vector3 {
        self.transform.scale()
    }

    /// Moves the node. A camera's frustum depends on its distance, so its
    /// projection is recomputed as well.
    pub fn set_position(&mut self, position: Vector3) {
        self.transform.set_position(position);
        if let NodeKind::Camera(camera) = &mut self.kind {
            camera.update_projection_matrix(position);
        }
    }

    pub fn set_rotation(&mut self, rotation: Euler) {
        self.transform.set_rotation(rotation);
    }

    pub fn set_quaternion(&mut self, quaternion: Quaternion) {
        self.transform.set_quaternion(quaternion);
    }

    pub fn set_scale(&mut self, scale: Vector3) {
        self.transform.set_scale(scale);
    }

    pub fn get_property(&self, axis: Axis, ty: PropertyType) -> f32 {
        let v = match ty {
            PropertyType::Position => self.position().to_array(),
            PropertyType::Rotation => self.rotation().to_array(),
            PropertyType::Scale => self.scale().to_array(),
        };
        component(v, axis)
    }

    pub fn set_property(&mut self, axis: Axis, ty: PropertyType, value: f32) {
        match ty {
            PropertyType::Position => {
                let v = with_component(self.position().to_array(), axis, value);
                self.set_position(v.into());
            }
            PropertyType::Rotation => {
                let v = with_component(self.rotation().to_array(), axis, value);
                self.set_rotation(v.into());
            }
            PropertyType::Scale => {
                let v = with_component(self.scale().to_array(), axis, value);
                self.set_scale(v.into());
            }
        }
    }

    /// [`Node::get_property`] addressed by the inspector's string tokens.
    pub fn get_property_by_name(&self, axis: &str, ty: &str) -> Result<f32, SceneError> {
        Ok(self.get_property(axis.parse()?, ty.parse()?))
    }

    pub fn set_property_by_name(&mut self, axis: &str, ty: &str, value: f32) -> Result<(), SceneError> {
        self.set_property(axis.parse()?, ty.parse()?, value);
        Ok(())
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn local_transform(&self) -> Matrix4 {
        self.local
    }

    pub fn world_transform(&self) -> Matrix4 {
        self.world
    }

    pub fn world_position(&self) -> Vector3 {
        math::extract_position(&self.world)
    }

    pub fn children(&self) -> &[Arc<Node>] {
        &self.children
    }

    /// Mutable access to the children; shared children are copied first.
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.children.iter_mut().map(Arc::make_mut)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.children.get_mut(index).map(Arc::make_mut)
    }

    /// Appends `child`. A node with the same id anywhere below this one is
    /// detached first, so a node never has two parents.
    pub fn add(&mut self, child: Node) {
        self.add_shared(Arc::new(child));
    }

    pub fn add_shared(&mut self, child: Arc<Node>) {
        let id = child.id;
        if id == self.id {
            log::warn!("refusing to add node {id} as a child of itself");
            return;
        }
        self.remove(id);
        let mut child = child;
        Arc::make_mut(&mut child).compute_world_transform(Some(&self.world), true);
        self.children.push(child);
    }

    /// Swaps the child at `index` for `child`, keeping its slot.
    pub fn replace_child(&mut self, index: usize, child: Node) {
        if let Some(slot) = self.children.get_mut(index) {
            *slot = Arc::new(child);
        }
    }

    /// Detaches the node `id` from anywhere in this subtree and returns it.
    /// The detached node is not tombstoned.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        if let Some(idx) = self.children.iter().position(|c| c.id == id) {
            let arc = self.children.remove(idx);
            return Some(Arc::try_unwrap(arc).unwrap_or_else(|shared| (*shared).clone()));
        }
        let idx = self.children.iter().position(|c| c.contains(id))?;
        Arc::make_mut(&mut self.children[idx]).remove(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Depth-first search including this node.
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Like [`Node::find`] but returns the owning handle; does not match `self`.
    pub fn find_shared(&self, id: NodeId) -> Option<&Arc<Node>> {
        for child in &self.children {
            if child.id == id {
                return Some(child);
            }
            if let Some(found) = child.find_shared(id) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        let idx = self.children.iter().position(|c| c.contains(id))?;
        Arc::make_mut(&mut self.children[idx]).find_mut(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_name(name))
    }

    pub fn parent_of(&self, id: NodeId) -> Option<&Node> {
        if self.children.iter().any(|c| c.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.parent_of(id))
    }

    /// Child indices leading from this node to `id`; empty when `id` is this node.
    pub fn path_to(&self, id: NodeId) -> Option<Vec<usize>> {
        if self.id == id {
            return Some(Vec::new());
        }
        self.children.iter().enumerate().find_map(|(i, c)| {
            c.path_to(id).map(|mut rest| {
                rest.insert(0, i);
                rest
            })
        })
    }

    /// Total number of nodes in this subtree.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(|c| c.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Visits this node and every descendant, parents before children.
    pub fn for_each(&self, f: &mut impl FnMut(&Node)) {
        f(self);
        for child in &self.children {
            child.for_each(f);
        }
    }

    pub fn compute_local_transform(&mut self) {
        self.local = self.transform.to_matrix();
    }

    /// Recomputes the local matrix and `world = parent_world × local`
    /// (`world = local` for a root). With `update_children` the whole subtree
    /// follows.
    pub fn compute_world_transform(&mut self, parent_world: Option<&Matrix4>, update_children: bool) {
        self.compute_local_transform();
        self.world = match parent_world {
            Some(parent) => *parent * self.local,
            None => self.local,
        };
        if update_children {
            let world = self.world;
            for child in self.children.iter_mut() {
                Arc::make_mut(child).compute_world_transform(Some(&world), true);
            }
        }
    }

    /// Recomputes the world transform of the descendant `id`, treating this
    /// node as the root. With `update_parent` every ancestor on the way down
    /// is refreshed too; otherwise their stored world matrices are trusted.
    pub fn compute_world_transform_of(&mut self, id: NodeId, update_parent: bool, update_children: bool) -> Result<(), SceneError> {
        let path = self.path_to(id).ok_or(SceneError::NotFound(id))?;
        let Some((last, ancestors)) = path.split_last() else {
            self.compute_world_transform(None, update_children);
            return Ok(());
        };
        if update_parent {
            self.compute_world_transform(None, false);
        }
        let mut parent = self;
        for &i in ancestors {
            let world = parent.world;
            let child = Arc::make_mut(&mut parent.children[i]);
            if update_parent {
                child.compute_world_transform(Some(&world), false);
            }
            parent = child;
        }
        let world = parent.world;
        Arc::make_mut(&mut parent.children[*last]).compute_world_transform(Some(&world), update_children);
        Ok(())
    }

    /// Tombstones this node, and with `kill_children` its whole subtree.
    pub fn kill(&self, kill_children: bool) {
        self.dead.store(true, Ordering::Release);
        if kill_children {
            for child in &self.children {
                child.kill(true);
            }
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }

    /// Deep copy in which every node receives a fresh id.
    pub fn duplicate(&self) -> Node {
        let mut copy = self.clone();
        copy.id = NodeId::new();
        copy.children = self
            .children
            .iter()
            .map(|c| Arc::new(c.duplicate()))
            .collect();
        copy
    }

    /**
    Builds a replacement for `copy` as part of a copy-on-write update.

    The result carries `copy`'s id. Its data comes from `changed` when that
    node has the same id and from `copy` otherwise; mesh geometry and
    material are deep-copied. Children are rebuilt the same way, with
    `changed` handed down until it has been consumed. Every node that was
    read from is tombstoned, and so is the whole subtree `changed` replaces.

    Fails with [`SceneError::StructuralCopy`] when `copy`, or the node
    substituted for it, is a camera or a light. Cameras and lights further
    down are substituted as-is instead of being rebuilt.
    */
    pub fn clone_and_change(copy: &Node, changed: Option<&Node>) -> Result<Node, SceneError> {
        let source = match changed {
            Some(c) if c.id == copy.id => c,
            _ => copy,
        };
        if copy.is_camera_or_light() || source.is_camera_or_light() {
            return Err(SceneError::StructuralCopy);
        }
        Ok(Self::rebuild(copy, changed))
    }

    fn rebuild(copy: &Node, changed: Option<&Node>) -> Node {
        let (source, rest) = match changed {
            Some(c) if c.id == copy.id => (c, None),
            _ => (copy, changed),
        };
        // a substitution supersedes the whole subtree it replaces
        copy.kill(!std::ptr::eq(source, copy));
        source.kill(false);

        if source.is_camera_or_light() {
            let mut node = source.clone();
            node.id = copy.id;
            return node;
        }

        Node {
            id: copy.id,
            name: source.name.clone(),
            transform: source.transform.clone(),
            local: source.local,
            world: source.world,
            enabled: source.enabled,
            dead: AtomicBool::new(false),
            kind: source.kind.clone(),
            children: source
                .children
                .iter()
                .map(|child| Arc::new(Self::rebuild(child, rest)))
                .collect(),
        }
    }

    pub fn to_trs_json(&self) -> TrsJson {
        TrsJson {
            position: self.position().to_array(),
            rotation: self.rotation().to_array(),
            scale: self.scale().to_array(),
            enable: self.enabled,
            children: self.children.iter().map(|c| c.to_trs_json()).collect(),
        }
    }

    /// Rebuilds a group tree from its TRS-only form. Ids are fresh.
    pub fn from_trs_json(json: &TrsJson) -> Node {
        let mut node = Node::group("");
        node.transform.set_position(json.position.into());
        node.transform.set_rotation(json.rotation.into());
        node.transform.set_scale(json.scale.into());
        node.enabled = json.enable;
        node.children = json
            .children
            .iter()
            .map(|c| Arc::new(Node::from_trs_json(c)))
            .collect();
        node.compute_world_transform(None, true);
        node
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string(&self.to_trs_json())?)
    }

    pub fn from_json(json: &str) -> Result<Node, SceneError> {
        let trs: TrsJson = serde_json::from_str(json)?;
        Ok(Node::from_trs_json(&trs))
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::group("")
    }
}
