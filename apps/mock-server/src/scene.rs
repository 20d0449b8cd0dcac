//! # Scene
//!
//! In-memory object model of the simulated engine.
//!
//! ## Structure
//! ```text
//! Root graph (handle 1)
//!   ├── Render target ──pin camera──► Thin lens camera
//!   ├── Thin lens camera
//!   └── Node graph
//!         └── Mesh ──pin material──► (empty)
//! ```
//!
//! ## Invariants
//! - Handles are never reused, not even across reset or load.
//! - A node's pins are stored in pin table order.
//! - Connections only link nodes owned by the same graph.
//! - Destroying an item removes every connection that pointed at it.
//! - Every item is reachable from the root graph exactly once; a loaded
//!   project that breaks this is rejected.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use octane_core::{
    AttrValue, AttributeId, Float2, Float3, GraphType, NodeType, ObjectRef, ObjectType, PinId,
    PinInfo, ValueKind,
};
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

/// Format version written into project files.
pub const PROJECT_FORMAT_VERSION: u32 = 1;

// =============================================================================
// Items
// =============================================================================

/// State of one input pin.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum PinState {
    #[default]
    Empty,
    Value(AttrValue),
    Connected(u64),
}

/// What an item is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    Node {
        node_type: NodeType,
        pins: Vec<PinState>,
    },
    Graph {
        graph_type: GraphType,
        owned: Vec<u64>,
    },
}

/// One object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub handle: u64,
    pub unique_id: u64,
    pub name: String,
    pub position: Float2,
    /// Owning graph; `None` only for the root graph.
    pub owner: Option<u64>,
    #[serde(default)]
    pub attributes: BTreeMap<u32, AttrValue>,
    pub kind: ItemKind,
}

impl Item {
    pub fn object_type(&self) -> ObjectType {
        match &self.kind {
            ItemKind::Node { .. } => ObjectType::Node,
            ItemKind::Graph {
                graph_type: GraphType::Root,
                ..
            } => ObjectType::RootNodeGraph,
            ItemKind::Graph { .. } => ObjectType::NodeGraph,
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.object_type(), self.handle)
    }

    pub fn node_type(&self) -> Option<NodeType> {
        match &self.kind {
            ItemKind::Node { node_type, .. } => Some(*node_type),
            ItemKind::Graph { .. } => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            ItemKind::Node { .. } => "node",
            ItemKind::Graph { .. } => "graph",
        }
    }
}

// =============================================================================
// Project Snapshot
// =============================================================================

/// Project file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub root: u64,
    /// Every item, root first, owners before the items they own.
    pub items: Vec<Item>,
}

// =============================================================================
// Scene
// =============================================================================

/// The simulated engine's object model.
#[derive(Debug)]
pub struct Scene {
    items: HashMap<u64, Item>,
    root: u64,
    next_handle: u64,
    next_unique_id: u64,
    render_target: Option<u64>,
    project_path: Option<PathBuf>,
    /// Bumped on every mutation.
    revision: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene holding only an empty root graph.
    pub fn new() -> Self {
        let mut scene = Scene {
            items: HashMap::new(),
            root: ObjectRef::NULL_HANDLE,
            next_handle: 1,
            next_unique_id: 1,
            render_target: None,
            project_path: None,
            revision: 0,
        };
        scene.root = scene.insert_root();
        scene
    }

    fn allocate_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn allocate_unique_id(&mut self) -> u64 {
        let id = self.next_unique_id;
        self.next_unique_id = self.next_unique_id.saturating_add(1);
        id
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn insert_root(&mut self) -> u64 {
        let handle = self.allocate_handle();
        let unique_id = self.allocate_unique_id();
        self.items.insert(
            handle,
            Item {
                handle,
                unique_id,
                name: "Root graph".to_string(),
                position: Float2::default(),
                owner: None,
                attributes: BTreeMap::new(),
                kind: ItemKind::Graph {
                    graph_type: GraphType::Root,
                    owned: Vec::new(),
                },
            },
        );
        handle
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn root(&self) -> ObjectRef {
        ObjectRef::new(ObjectType::RootNodeGraph, self.root)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolves a reference sent by a client. A reference typed as a plain
    /// item matches any object; any other type must match exactly.
    pub fn resolve(&self, object: ObjectRef) -> SceneResult<&Item> {
        if object.is_null() {
            return Err(SceneError::NullObject("item"));
        }
        let item = self
            .items
            .get(&object.handle)
            .ok_or(SceneError::UnknownHandle(object.handle))?;

        let actual = item.object_type();
        if object.object_type != ObjectType::Item && object.object_type != actual {
            return Err(SceneError::WrongObjectType {
                handle: object.handle,
                expected: type_name(object.object_type),
                actual: type_name(actual),
            });
        }
        Ok(item)
    }

    pub fn item(&self, handle: u64) -> SceneResult<&Item> {
        self.items.get(&handle).ok_or(SceneError::UnknownHandle(handle))
    }

    fn item_mut(&mut self, handle: u64) -> SceneResult<&mut Item> {
        self.items
            .get_mut(&handle)
            .ok_or(SceneError::UnknownHandle(handle))
    }

    fn node(&self, handle: u64) -> SceneResult<(NodeType, &[PinState])> {
        let item = self.item(handle)?;
        match &item.kind {
            ItemKind::Node { node_type, pins } => Ok((*node_type, pins.as_slice())),
            ItemKind::Graph { .. } => Err(SceneError::WrongObjectType {
                handle,
                expected: "node",
                actual: item.kind_name(),
            }),
        }
    }

    fn graph(&self, handle: u64) -> SceneResult<(GraphType, &[u64])> {
        let item = self.item(handle)?;
        match &item.kind {
            ItemKind::Graph { graph_type, owned } => Ok((*graph_type, owned.as_slice())),
            ItemKind::Node { .. } => Err(SceneError::WrongObjectType {
                handle,
                expected: "graph",
                actual: item.kind_name(),
            }),
        }
    }

    fn pin_state_mut(&mut self, handle: u64, pin: PinId) -> SceneResult<(&'static PinInfo, &mut PinState)> {
        let (node_type, _) = self.node(handle)?;
        let info = node_type.pin(pin)?;
        let index = node_type.pin_index(pin)?;
        match &mut self.item_mut(handle)?.kind {
            ItemKind::Node { pins, .. } => Ok((info, &mut pins[index])),
            ItemKind::Graph { .. } => Err(SceneError::UnknownHandle(handle)),
        }
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub fn set_name(&mut self, handle: u64, name: &str) -> SceneResult<()> {
        self.item_mut(handle)?.name = name.to_string();
        self.touch();
        Ok(())
    }

    pub fn set_position(&mut self, handle: u64, position: Float2) -> SceneResult<()> {
        self.item_mut(handle)?.position = position;
        self.touch();
        Ok(())
    }

    /// The owning graph, or the null reference for the root.
    pub fn graph_owner(&self, handle: u64) -> SceneResult<ObjectRef> {
        match self.item(handle)?.owner {
            Some(owner) => Ok(self.item(owner)?.object_ref()),
            None => Ok(ObjectRef::null()),
        }
    }

    pub fn attribute(&self, handle: u64, id: AttributeId) -> SceneResult<Option<AttrValue>> {
        check_attribute(id, None)?;
        Ok(self.item(handle)?.attributes.get(&id.0).cloned())
    }

    pub fn set_attribute(&mut self, handle: u64, id: AttributeId, value: AttrValue) -> SceneResult<()> {
        check_attribute(id, Some(value.kind()))?;
        self.item_mut(handle)?.attributes.insert(id.0, value);
        self.touch();
        Ok(())
    }

    /// Destroys an item and, for graphs, everything it owns.
    pub fn destroy(&mut self, handle: u64) -> SceneResult<()> {
        let item = self.item(handle)?;
        let owner = item.owner.ok_or(SceneError::CannotDestroyRoot)?;

        let mut doomed = Vec::new();
        self.collect_subtree(handle, &mut doomed);

        if let ItemKind::Graph { owned, .. } = &mut self.item_mut(owner)?.kind {
            owned.retain(|h| *h != handle);
        }
        self.remove_items(&doomed);
        Ok(())
    }

    fn collect_subtree(&self, handle: u64, out: &mut Vec<u64>) {
        out.push(handle);
        if let Some(Item {
            kind: ItemKind::Graph { owned, .. },
            ..
        }) = self.items.get(&handle)
        {
            for child in owned {
                self.collect_subtree(*child, out);
            }
        }
    }

    fn remove_items(&mut self, doomed: &[u64]) {
        for handle in doomed {
            self.items.remove(handle);
        }
        for item in self.items.values_mut() {
            if let ItemKind::Node { pins, .. } = &mut item.kind {
                for pin in pins.iter_mut() {
                    if let PinState::Connected(source) = *pin {
                        if doomed.contains(&source) {
                            *pin = PinState::Empty;
                        }
                    }
                }
            }
        }
        if self.render_target.is_some_and(|t| doomed.contains(&t)) {
            self.render_target = None;
        }
        self.touch();
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Creates a node in `owner`. With `configure_pins`, value pins get
    /// defaults and linkable pins get a freshly created, configured source.
    pub fn create_node(&mut self, owner: u64, node_type: NodeType, configure_pins: bool) -> SceneResult<u64> {
        self.graph(owner)?;

        let handle = self.allocate_handle();
        let unique_id = self.allocate_unique_id();
        let pins = vec![PinState::Empty; node_type.pins().len()];
        self.items.insert(
            handle,
            Item {
                handle,
                unique_id,
                name: node_type.default_name().to_string(),
                position: Float2::default(),
                owner: Some(owner),
                attributes: BTreeMap::new(),
                kind: ItemKind::Node { node_type, pins },
            },
        );
        if let ItemKind::Graph { owned, .. } = &mut self.item_mut(owner)?.kind {
            owned.push(handle);
        }

        if configure_pins {
            self.configure_pins(handle, node_type, owner)?;
        }
        self.touch();
        Ok(handle)
    }

    fn configure_pins(&mut self, handle: u64, node_type: NodeType, owner: u64) -> SceneResult<()> {
        for (index, pin) in node_type.pins().iter().enumerate() {
            let state = match pin.accepts.first() {
                Some(source_type) => {
                    let source = self.create_node(owner, *source_type, true)?;
                    if let Some(value) = default_pin_value(pin) {
                        self.item_mut(source)?.attributes.insert(AttributeId::VALUE.0, value);
                    }
                    PinState::Connected(source)
                }
                None => match default_pin_value(pin) {
                    Some(value) => PinState::Value(value),
                    None => PinState::Empty,
                },
            };
            if let ItemKind::Node { pins, .. } = &mut self.item_mut(handle)?.kind {
                pins[index] = state;
            }
        }
        Ok(())
    }

    pub fn node_type(&self, handle: u64) -> SceneResult<NodeType> {
        Ok(self.node(handle)?.0)
    }

    pub fn pin_count(&self, handle: u64) -> SceneResult<u32> {
        Ok(self.node(handle)?.1.len() as u32)
    }

    pub fn pin_name(&self, handle: u64, index: u32) -> SceneResult<&'static str> {
        let (node_type, _) = self.node(handle)?;
        let pins = node_type.pins();
        pins.get(index as usize)
            .map(|pin| pin.name)
            .ok_or(SceneError::PinIndexOutOfRange {
                index,
                count: pins.len() as u32,
            })
    }

    /// Connects `source` to `pin` of `target`; `None` disconnects.
    pub fn connect(&mut self, target: u64, pin: PinId, source: Option<u64>) -> SceneResult<()> {
        let new_state = match source {
            None => PinState::Empty,
            Some(source) => {
                if source == target {
                    return Err(SceneError::SelfConnection(target));
                }
                let (source_type, _) = self.node(source)?;
                let (target_type, _) = self.node(target)?;
                let info = target_type.pin(pin)?;
                if !info.accepts(source_type) {
                    return Err(SceneError::IncompatibleSource { pin, source_type });
                }
                if self.item(source)?.owner != self.item(target)?.owner {
                    return Err(SceneError::DifferentGraphs {
                        source_node: source,
                        target,
                    });
                }
                PinState::Connected(source)
            }
        };

        let (_, state) = self.pin_state_mut(target, pin)?;
        *state = new_state;
        self.touch();
        Ok(())
    }

    pub fn connected_node(&self, target: u64, pin: PinId) -> SceneResult<ObjectRef> {
        let (node_type, pins) = self.node(target)?;
        match &pins[node_type.pin_index(pin)?] {
            PinState::Connected(source) => Ok(self.item(*source)?.object_ref()),
            _ => Ok(ObjectRef::null()),
        }
    }

    pub fn pin_value(&self, target: u64, pin: PinId) -> SceneResult<Option<AttrValue>> {
        let (node_type, pins) = self.node(target)?;
        match &pins[node_type.pin_index(pin)?] {
            PinState::Value(value) => Ok(Some(value.clone())),
            _ => Ok(None),
        }
    }

    /// Stores a value on a pin, dropping any connection.
    pub fn set_pin_value(&mut self, target: u64, pin: PinId, value: AttrValue) -> SceneResult<()> {
        let (info, state) = self.pin_state_mut(target, pin)?;
        if info.value_kind != Some(value.kind()) {
            return Err(SceneError::ValueKindMismatch {
                pin,
                actual: value.kind(),
            });
        }
        *state = PinState::Value(value);
        self.touch();
        Ok(())
    }

    /// The value a pin evaluates to: its own value, or the `VALUE`
    /// attribute of the connected source node.
    pub fn evaluate_pin(&self, target: u64, pin: PinId) -> Option<AttrValue> {
        let (node_type, pins) = self.node(target).ok()?;
        match pins.get(node_type.pin_index(pin).ok()?)? {
            PinState::Value(value) => Some(value.clone()),
            PinState::Connected(source) => self
                .item(*source)
                .ok()?
                .attributes
                .get(&AttributeId::VALUE.0)
                .cloned(),
            PinState::Empty => None,
        }
    }

    /// The node connected to `pin`, if any.
    pub fn source_of(&self, target: u64, pin: PinId) -> Option<u64> {
        let (node_type, pins) = self.node(target).ok()?;
        match pins.get(node_type.pin_index(pin).ok()?)? {
            PinState::Connected(source) => Some(*source),
            _ => None,
        }
    }

    // =========================================================================
    // Graphs
    // =========================================================================

    pub fn create_graph(&mut self, owner: u64, graph_type: GraphType) -> SceneResult<u64> {
        if graph_type == GraphType::Root {
            return Err(SceneError::CannotCreateRoot);
        }
        self.graph(owner)?;

        let handle = self.allocate_handle();
        let unique_id = self.allocate_unique_id();
        self.items.insert(
            handle,
            Item {
                handle,
                unique_id,
                name: "Node graph".to_string(),
                position: Float2::default(),
                owner: Some(owner),
                attributes: BTreeMap::new(),
                kind: ItemKind::Graph {
                    graph_type,
                    owned: Vec::new(),
                },
            },
        );
        if let ItemKind::Graph { owned, .. } = &mut self.item_mut(owner)?.kind {
            owned.push(handle);
        }
        self.touch();
        Ok(handle)
    }

    pub fn graph_type(&self, handle: u64) -> SceneResult<GraphType> {
        Ok(self.graph(handle)?.0)
    }

    pub fn owned_items(&self, handle: u64) -> SceneResult<Vec<ObjectRef>> {
        let (_, owned) = self.graph(handle)?;
        owned
            .iter()
            .map(|h| self.item(*h).map(Item::object_ref))
            .collect()
    }

    /// Nodes of `node_type` in the graph, depth first in creation order.
    pub fn find_nodes(&self, handle: u64, node_type: NodeType, recurse: bool) -> SceneResult<Vec<ObjectRef>> {
        let mut found = Vec::new();
        self.find_nodes_into(handle, node_type, recurse, &mut found)?;
        Ok(found)
    }

    fn find_nodes_into(
        &self,
        handle: u64,
        node_type: NodeType,
        recurse: bool,
        found: &mut Vec<ObjectRef>,
    ) -> SceneResult<()> {
        let (_, owned) = self.graph(handle)?;
        for child in owned {
            let item = self.item(*child)?;
            match &item.kind {
                ItemKind::Node { node_type: ty, .. } if *ty == node_type => found.push(item.object_ref()),
                ItemKind::Graph { .. } if recurse => self.find_nodes_into(*child, node_type, true, found)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Destroys every item owned by the graph.
    pub fn clear_graph(&mut self, handle: u64) -> SceneResult<()> {
        let owned = self.graph(handle)?.1.to_vec();
        let mut doomed = Vec::new();
        for child in owned {
            self.collect_subtree(child, &mut doomed);
        }
        if let ItemKind::Graph { owned, .. } = &mut self.item_mut(handle)?.kind {
            owned.clear();
        }
        self.remove_items(&doomed);
        Ok(())
    }

    // =========================================================================
    // Render Target
    // =========================================================================

    /// Selects the render target. Returns false if `handle` is not a render
    /// target node; `None` clears the selection.
    pub fn set_render_target(&mut self, handle: Option<u64>) -> SceneResult<bool> {
        match handle {
            None => self.render_target = None,
            Some(handle) => {
                if self.item(handle)?.node_type() != Some(NodeType::RenderTarget) {
                    return Ok(false);
                }
                self.render_target = Some(handle);
            }
        }
        self.touch();
        Ok(true)
    }

    pub fn render_target(&self) -> Option<u64> {
        self.render_target
    }

    // =========================================================================
    // Project
    // =========================================================================

    pub fn project_path(&self) -> Option<&PathBuf> {
        self.project_path.as_ref()
    }

    pub fn set_project_path(&mut self, path: Option<PathBuf>) {
        self.project_path = path;
    }

    /// Replaces the scene with an empty project. Handle numbering continues.
    pub fn reset(&mut self) {
        self.items.clear();
        self.render_target = None;
        self.project_path = None;
        self.root = self.insert_root();
        self.touch();
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        let mut order = Vec::with_capacity(self.items.len());
        self.collect_subtree(self.root, &mut order);
        ProjectSnapshot {
            format_version: PROJECT_FORMAT_VERSION,
            saved_at: Utc::now(),
            root: self.root,
            items: order
                .iter()
                .filter_map(|h| self.items.get(h).cloned())
                .collect(),
        }
    }

    /// Replaces the scene with `snapshot`, giving every item a fresh handle.
    /// The scene is left untouched if the snapshot is inconsistent.
    pub fn restore(&mut self, snapshot: ProjectSnapshot) -> SceneResult<()> {
        if snapshot.format_version != PROJECT_FORMAT_VERSION {
            return Err(SceneError::CorruptProject(format!(
                "unsupported format version {}",
                snapshot.format_version
            )));
        }

        let mut renumber = HashMap::with_capacity(snapshot.items.len());
        let mut next = self.next_handle;
        for item in &snapshot.items {
            if renumber.insert(item.handle, next).is_some() {
                return Err(SceneError::CorruptProject(format!(
                    "duplicate handle {}",
                    item.handle
                )));
            }
            next += 1;
        }
        let map = |old: u64| {
            renumber
                .get(&old)
                .copied()
                .ok_or_else(|| SceneError::CorruptProject(format!("dangling handle {}", old)))
        };

        let root = map(snapshot.root)?;
        let mut items = HashMap::with_capacity(snapshot.items.len());
        let mut max_unique_id = 0;
        for mut item in snapshot.items {
            item.handle = map(item.handle)?;
            item.owner = item.owner.map(map).transpose()?;
            max_unique_id = max_unique_id.max(item.unique_id);
            match &mut item.kind {
                ItemKind::Node { node_type, pins } => {
                    if pins.len() != node_type.pins().len() {
                        return Err(SceneError::CorruptProject(format!(
                            "{} has {} pins, expected {}",
                            node_type,
                            pins.len(),
                            node_type.pins().len()
                        )));
                    }
                    for pin in pins.iter_mut() {
                        if let PinState::Connected(source) = pin {
                            *source = map(*source)?;
                        }
                    }
                }
                ItemKind::Graph { owned, .. } => {
                    for child in owned.iter_mut() {
                        *child = map(*child)?;
                    }
                }
            }
            items.insert(item.handle, item);
        }

        check_tree(&items, root)?;

        self.items = items;
        self.root = root;
        self.next_handle = next;
        self.next_unique_id = self.next_unique_id.max(max_unique_id.saturating_add(1));
        self.render_target = None;
        self.touch();
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Checks that loaded items form a single tree under `root`.
///
/// Owners are graphs that list each owned item exactly once, only `root` is
/// a root graph, every item is reachable from it once, and connections link
/// nodes of the same graph.
fn check_tree(items: &HashMap<u64, Item>, root: u64) -> SceneResult<()> {
    match items.get(&root) {
        Some(item) if item.object_type() == ObjectType::RootNodeGraph && item.owner.is_none() => {}
        _ => return Err(SceneError::CorruptProject("missing root graph".to_string())),
    }

    for item in items.values() {
        let is_root_graph = item.object_type() == ObjectType::RootNodeGraph;
        match item.owner {
            None if item.handle == root => {}
            None => {
                return Err(SceneError::CorruptProject(format!(
                    "{} {} has no owner",
                    item.kind_name(),
                    item.handle
                )))
            }
            Some(_) if is_root_graph => {
                return Err(SceneError::CorruptProject(format!(
                    "second root graph {}",
                    item.handle
                )))
            }
            Some(owner) => {
                let listed = match items.get(&owner).map(|o| &o.kind) {
                    Some(ItemKind::Graph { owned, .. }) => owned.iter().filter(|h| **h == item.handle).count(),
                    _ => {
                        return Err(SceneError::CorruptProject(format!(
                            "owner {} of {} is not a graph",
                            owner, item.handle
                        )))
                    }
                };
                if listed != 1 {
                    return Err(SceneError::CorruptProject(format!(
                        "graph {} lists {} {} times",
                        owner, item.handle, listed
                    )));
                }
            }
        }

        match &item.kind {
            ItemKind::Graph { owned, .. } => {
                for child in owned {
                    if items.get(child).and_then(|c| c.owner) != Some(item.handle) {
                        return Err(SceneError::CorruptProject(format!(
                            "graph {} lists {} which it does not own",
                            item.handle, child
                        )));
                    }
                }
            }
            ItemKind::Node { pins, .. } => {
                for pin in pins {
                    let PinState::Connected(source) = pin else {
                        continue;
                    };
                    let valid = *source != item.handle
                        && items
                            .get(source)
                            .is_some_and(|s| matches!(s.kind, ItemKind::Node { .. }) && s.owner == item.owner);
                    if !valid {
                        return Err(SceneError::CorruptProject(format!(
                            "invalid connection from {} to {}",
                            source, item.handle
                        )));
                    }
                }
            }
        }
    }

    let mut seen = HashSet::with_capacity(items.len());
    let mut pending = vec![root];
    while let Some(handle) = pending.pop() {
        if !seen.insert(handle) {
            return Err(SceneError::CorruptProject(format!(
                "item {} is reachable twice",
                handle
            )));
        }
        if let Some(ItemKind::Graph { owned, .. }) = items.get(&handle).map(|i| &i.kind) {
            pending.extend(owned.iter().copied());
        }
    }
    if seen.len() != items.len() {
        return Err(SceneError::CorruptProject(format!(
            "{} items are not reachable from the root",
            items.len() - seen.len()
        )));
    }
    Ok(())
}

fn type_name(object_type: ObjectType) -> &'static str {
    match object_type {
        ObjectType::Item => "item",
        ObjectType::Node => "node",
        ObjectType::NodeGraph => "node graph",
        ObjectType::RootNodeGraph => "root node graph",
    }
}

/// Validates an attribute id and, for writes, the value kind.
fn check_attribute(id: AttributeId, kind: Option<ValueKind>) -> SceneResult<()> {
    let allowed = match id {
        AttributeId::VALUE => None,
        AttributeId::FILENAME => Some(ValueKind::String),
        AttributeId::ENABLED => Some(ValueKind::Bool),
        _ => return Err(SceneError::UnknownAttribute(id.0)),
    };
    match (allowed, kind) {
        (Some(allowed), Some(actual)) if allowed != actual => {
            Err(SceneError::AttributeKindMismatch { id: id.0, actual })
        }
        _ => Ok(()),
    }
}

/// Value a freshly configured pin starts with.
fn default_pin_value(pin: &PinInfo) -> Option<AttrValue> {
    let value = match pin.id {
        PinId::FOV => AttrValue::Float(39.6),
        PinId::POSITION => AttrValue::Float3(Float3::new(0.0, 0.5, 5.0)),
        PinId::TARGET => AttrValue::Float3(Float3::default()),
        PinId::SUN_DIRECTION => AttrValue::Float3(Float3::new(0.0, 1.0, 0.3)),
        PinId::POWER => AttrValue::Float(1.0),
        PinId::MAX_SAMPLES => AttrValue::Int(1000),
        PinId::MAX_DEPTH => AttrValue::Int(16),
        PinId::WIDTH => AttrValue::Int(1024),
        PinId::HEIGHT => AttrValue::Int(512),
        PinId::DIFFUSE => AttrValue::Float3(Float3::new(0.7, 0.7, 0.7)),
        PinId::SPECULAR => AttrValue::Float3(Float3::new(1.0, 1.0, 1.0)),
        PinId::ROUGHNESS => AttrValue::Float(0.1),
        _ => return None,
    };
    (pin.value_kind == Some(value.kind())).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(scene: &Scene) -> u64 {
        scene.root().handle
    }

    #[test]
    fn test_new_scene_has_root() {
        let scene = Scene::new();
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.graph_type(root(&scene)).unwrap(), GraphType::Root);
        assert!(scene.graph_owner(root(&scene)).unwrap().is_null());
    }

    #[test]
    fn test_resolve_checks_type() {
        let mut scene = Scene::new();
        let node = scene.create_node(root(&scene), NodeType::Mesh, false).unwrap();

        assert!(scene.resolve(ObjectRef::new(ObjectType::Item, node)).is_ok());
        assert!(scene.resolve(ObjectRef::new(ObjectType::Node, node)).is_ok());
        assert!(matches!(
            scene.resolve(ObjectRef::new(ObjectType::NodeGraph, node)),
            Err(SceneError::WrongObjectType { .. })
        ));
        assert_eq!(
            scene.resolve(ObjectRef::new(ObjectType::Node, 999)).unwrap_err(),
            SceneError::UnknownHandle(999)
        );
        assert!(scene.resolve(ObjectRef::null()).is_err());
    }

    #[test]
    fn test_handles_never_reused() {
        let mut scene = Scene::new();
        let r = root(&scene);
        let a = scene.create_node(r, NodeType::Mesh, false).unwrap();
        scene.destroy(a).unwrap();
        let b = scene.create_node(r, NodeType::Mesh, false).unwrap();
        assert!(b > a);

        scene.reset();
        assert!(root(&scene) > b);
    }

    #[test]
    fn test_destroy_graph_cascades_and_clears_pins() {
        let mut scene = Scene::new();
        let r = root(&scene);
        let nested = scene.create_graph(r, GraphType::Standard).unwrap();
        let inner = scene.create_node(nested, NodeType::Mesh, false).unwrap();
        let material = scene.create_node(nested, NodeType::DiffuseMaterial, false).unwrap();
        scene.connect(inner, PinId::MATERIAL, Some(material)).unwrap();

        let outer = scene.create_node(r, NodeType::Mesh, false).unwrap();
        let outer_material = scene.create_node(r, NodeType::GlossyMaterial, false).unwrap();
        scene.connect(outer, PinId::MATERIAL, Some(outer_material)).unwrap();

        scene.destroy(nested).unwrap();
        assert!(scene.item(inner).is_err());
        assert!(scene.item(material).is_err());
        assert_eq!(scene.owned_items(r).unwrap().len(), 2);

        scene.destroy(outer_material).unwrap();
        assert!(scene.connected_node(outer, PinId::MATERIAL).unwrap().is_null());
    }

    #[test]
    fn test_root_cannot_be_destroyed_or_created() {
        let mut scene = Scene::new();
        let r = root(&scene);
        assert_eq!(scene.destroy(r), Err(SceneError::CannotDestroyRoot));
        assert_eq!(
            scene.create_graph(r, GraphType::Root),
            Err(SceneError::CannotCreateRoot)
        );
    }

    #[test]
    fn test_connect_rules() {
        let mut scene = Scene::new();
        let r = root(&scene);
        let nested = scene.create_graph(r, GraphType::Standard).unwrap();
        let target = scene.create_node(r, NodeType::RenderTarget, false).unwrap();
        let camera = scene.create_node(r, NodeType::ThinLensCamera, false).unwrap();
        let far_camera = scene.create_node(nested, NodeType::ThinLensCamera, false).unwrap();
        let mesh = scene.create_node(r, NodeType::Mesh, false).unwrap();

        scene.connect(target, PinId::CAMERA, Some(camera)).unwrap();
        assert_eq!(
            scene.connect(target, PinId::CAMERA, Some(mesh)),
            Err(SceneError::IncompatibleSource {
                pin: PinId::CAMERA,
                source_type: NodeType::Mesh
            })
        );
        assert!(matches!(
            scene.connect(target, PinId::CAMERA, Some(far_camera)),
            Err(SceneError::DifferentGraphs { .. })
        ));
        assert_eq!(
            scene.connect(mesh, PinId::MATERIAL, Some(mesh)),
            Err(SceneError::SelfConnection(mesh))
        );
        assert!(matches!(
            scene.connect(target, PinId::FOV, Some(camera)),
            Err(SceneError::Core(_))
        ));
        assert!(matches!(
            scene.connect(nested, PinId::CAMERA, Some(camera)),
            Err(SceneError::WrongObjectType { .. })
        ));

        scene.connect(target, PinId::CAMERA, None).unwrap();
        assert!(scene.connected_node(target, PinId::CAMERA).unwrap().is_null());
    }

    #[test]
    fn test_pin_values() {
        let mut scene = Scene::new();
        let r = root(&scene);
        let film = scene.create_node(r, NodeType::FilmSettings, false).unwrap();

        scene.set_pin_value(film, PinId::WIDTH, AttrValue::Int(800)).unwrap();
        assert_eq!(scene.pin_value(film, PinId::WIDTH).unwrap(), Some(AttrValue::Int(800)));
        assert_eq!(scene.evaluate_pin(film, PinId::WIDTH), Some(AttrValue::Int(800)));
        assert_eq!(
            scene.set_pin_value(film, PinId::WIDTH, AttrValue::Float(800.0)),
            Err(SceneError::ValueKindMismatch {
                pin: PinId::WIDTH,
                actual: ValueKind::Float
            })
        );
        assert_eq!(scene.pin_name(film, 1).unwrap(), "height");
        assert!(scene.pin_name(film, 2).is_err());
    }

    #[test]
    fn test_configure_pins_creates_sources() {
        let mut scene = Scene::new();
        let r = root(&scene);
        let camera = scene.create_node(r, NodeType::ThinLensCamera, true).unwrap();

        let fov_source = scene.source_of(camera, PinId::FOV).unwrap();
        assert_eq!(scene.node_type(fov_source).unwrap(), NodeType::FloatValue);
        assert_eq!(scene.evaluate_pin(camera, PinId::FOV), Some(AttrValue::Float(39.6)));
        assert!(scene.pin_value(camera, PinId::POSITION).unwrap().is_some());
        // camera + fov source
        assert_eq!(scene.owned_items(r).unwrap().len(), 2);
    }

    #[test]
    fn test_find_nodes_recursive() {
        let mut scene = Scene::new();
        let r = root(&scene);
        let nested = scene.create_graph(r, GraphType::Standard).unwrap();
        scene.create_node(r, NodeType::Mesh, false).unwrap();
        scene.create_node(nested, NodeType::Mesh, false).unwrap();

        assert_eq!(scene.find_nodes(r, NodeType::Mesh, false).unwrap().len(), 1);
        assert_eq!(scene.find_nodes(r, NodeType::Mesh, true).unwrap().len(), 2);
    }

    #[test]
    fn test_render_target_cleared_on_destroy() {
        let mut scene = Scene::new();
        let r = root(&scene);
        let target = scene.create_node(r, NodeType::RenderTarget, false).unwrap();
        let mesh = scene.create_node(r, NodeType::Mesh, false).unwrap();

        assert!(!scene.set_render_target(Some(mesh)).unwrap());
        assert!(scene.set_render_target(Some(target)).unwrap());
        scene.destroy(target).unwrap();
        assert_eq!(scene.render_target(), None);
    }

    #[test]
    fn test_snapshot_restore_renumbers() {
        let mut scene = Scene::new();
        let r = root(&scene);
        let target = scene.create_node(r, NodeType::RenderTarget, false).unwrap();
        let camera = scene.create_node(r, NodeType::ThinLensCamera, false).unwrap();
        scene.set_name(camera, "Hero cam").unwrap();
        scene.connect(target, PinId::CAMERA, Some(camera)).unwrap();
        let camera_uid = scene.item(camera).unwrap().unique_id;

        let json = serde_json::to_string(&scene.snapshot()).unwrap();
        let snapshot: ProjectSnapshot = serde_json::from_str(&json).unwrap();

        scene.reset();
        scene.restore(snapshot).unwrap();

        let new_root = root(&scene);
        assert_ne!(new_root, r);
        let targets = scene.find_nodes(new_root, NodeType::RenderTarget, false).unwrap();
        assert_eq!(targets.len(), 1);
        assert!(targets[0].handle > camera);

        let new_camera = scene.connected_node(targets[0].handle, PinId::CAMERA).unwrap();
        let item = scene.item(new_camera.handle).unwrap();
        assert_eq!(item.name, "Hero cam");
        assert_eq!(item.unique_id, camera_uid);

        // Fresh items get unique ids past the loaded ones
        let fresh = scene.create_node(new_root, NodeType::Mesh, false).unwrap();
        assert!(scene.item(fresh).unwrap().unique_id > camera_uid);
    }

    #[test]
    fn test_restore_rejects_dangling_handles() {
        let mut scene = Scene::new();
        let r = root(&scene);
        scene.create_node(r, NodeType::Mesh, false).unwrap();

        let mut snapshot = scene.snapshot();
        snapshot.items.pop();
        let before = scene.len();
        assert!(matches!(
            scene.restore(snapshot),
            Err(SceneError::CorruptProject(_))
        ));
        assert_eq!(scene.len(), before);
    }

    /// Scene with a nested graph holding a mesh, for corrupting snapshots.
    fn nested_scene() -> (Scene, u64, u64) {
        let mut scene = Scene::new();
        let r = root(&scene);
        let graph = scene.create_graph(r, GraphType::Standard).unwrap();
        let mesh = scene.create_node(graph, NodeType::Mesh, false).unwrap();
        (scene, graph, mesh)
    }

    fn snapshot_item(snapshot: &mut ProjectSnapshot, handle: u64) -> &mut Item {
        snapshot.items.iter_mut().find(|i| i.handle == handle).unwrap()
    }

    fn assert_rejected(scene: &mut Scene, snapshot: ProjectSnapshot) {
        let before = scene.len();
        let old_root = root(scene);
        assert!(matches!(
            scene.restore(snapshot),
            Err(SceneError::CorruptProject(_))
        ));
        assert_eq!(scene.len(), before);
        assert_eq!(root(scene), old_root);
    }

    #[test]
    fn test_restore_rejects_self_owning_graph() {
        let (mut scene, graph, mesh) = nested_scene();
        let r = root(&scene);
        let mut snapshot = scene.snapshot();

        // Detach the group from the root and make it own itself
        if let ItemKind::Graph { owned, .. } = &mut snapshot_item(&mut snapshot, r).kind {
            owned.retain(|h| *h != graph);
        }
        let item = snapshot_item(&mut snapshot, graph);
        item.owner = Some(graph);
        if let ItemKind::Graph { owned, .. } = &mut item.kind {
            owned.push(graph);
        }
        assert_rejected(&mut scene, snapshot);

        // The live scene still walks fine
        assert_eq!(scene.find_nodes(r, NodeType::Mesh, true).unwrap().len(), 1);
        assert!(scene.item(mesh).is_ok());
    }

    #[test]
    fn test_restore_rejects_owner_mismatch() {
        let (mut scene, graph, mesh) = nested_scene();
        let r = root(&scene);

        // Owner says root, but only the group lists it
        let mut snapshot = scene.snapshot();
        snapshot_item(&mut snapshot, mesh).owner = Some(r);
        assert_rejected(&mut scene, snapshot);

        // Listed twice by its owner
        let mut snapshot = scene.snapshot();
        if let ItemKind::Graph { owned, .. } = &mut snapshot_item(&mut snapshot, graph).kind {
            owned.push(mesh);
        }
        assert_rejected(&mut scene, snapshot);

        // Owned by a node
        let mut snapshot = scene.snapshot();
        snapshot_item(&mut snapshot, graph).owner = Some(mesh);
        assert_rejected(&mut scene, snapshot);
    }

    #[test]
    fn test_restore_rejects_second_root() {
        let (mut scene, graph, _) = nested_scene();
        let mut snapshot = scene.snapshot();
        if let ItemKind::Graph { graph_type, .. } = &mut snapshot_item(&mut snapshot, graph).kind {
            *graph_type = GraphType::Root;
        }
        assert_rejected(&mut scene, snapshot);
    }

    #[test]
    fn test_restore_rejects_bad_connections() {
        let mut scene = Scene::new();
        let r = root(&scene);
        let target = scene.create_node(r, NodeType::RenderTarget, false).unwrap();
        let camera = scene.create_node(r, NodeType::ThinLensCamera, false).unwrap();
        let graph = scene.create_graph(r, GraphType::Standard).unwrap();
        let nested = scene.create_node(graph, NodeType::ThinLensCamera, false).unwrap();
        scene.connect(target, PinId::CAMERA, Some(camera)).unwrap();
        let camera_index = NodeType::RenderTarget.pin_index(PinId::CAMERA).unwrap();

        for source in [graph, nested, target] {
            let mut snapshot = scene.snapshot();
            if let ItemKind::Node { pins, .. } = &mut snapshot_item(&mut snapshot, target).kind {
                pins[camera_index] = PinState::Connected(source);
            }
            assert_rejected(&mut scene, snapshot);
        }

        // The untouched snapshot still loads
        let snapshot = scene.snapshot();
        scene.restore(snapshot).unwrap();
    }

    #[test]
    fn test_restore_with_largest_unique_id() {
        let (mut scene, _, mesh) = nested_scene();
        let mut snapshot = scene.snapshot();
        snapshot_item(&mut snapshot, mesh).unique_id = u64::MAX;
        scene.restore(snapshot).unwrap();

        let r = root(&scene);
        let fresh = scene.create_node(r, NodeType::Mesh, false).unwrap();
        assert_eq!(scene.item(fresh).unwrap().unique_id, u64::MAX);
        scene.create_node(r, NodeType::Mesh, false).unwrap();
    }
}
