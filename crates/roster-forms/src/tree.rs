//! The field tree: leaves, groups and repeatable collections.
//!
//! Paths are dot-separated child names, with numeric segments selecting an
//! element of a collection (`emailGroup.email`, `skills.1.skillName`). The
//! empty path is the root group.

use serde_json::{Map, Value};

use roster_types::{Result, RosterError};

use crate::events::{EventEmitter, FormEvent};
use crate::validators::{FailureCode, GroupValidator, Validator};

// ---------------------------------------------------------------------------
// Leaf
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    value: String,
    dirty: bool,
    touched: bool,
    validators: Vec<Validator>,
    errors: Vec<FailureCode>,
}

impl Leaf {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            dirty: false,
            touched: false,
            validators: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_validators(mut self, validators: Vec<Validator>) -> Self {
        self.validators = validators;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_pristine(&self) -> bool {
        !self.dirty
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Failure codes from the last revalidation, in validator order.
    pub fn errors(&self) -> &[FailureCode] {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Replace the value. Only edits made by the user mark the leaf dirty.
    pub fn set(&mut self, value: impl Into<String>, by_user: bool) {
        self.value = value.into();
        if by_user {
            self.dirty = true;
        }
    }

    pub fn mark_touched(&mut self) {
        self.touched = true;
    }

    pub fn set_validators(&mut self, validators: Vec<Validator>) {
        self.validators = validators;
    }

    pub fn clear_validators(&mut self) {
        self.validators.clear();
    }

    pub fn revalidate(&mut self) {
        self.errors = self
            .validators
            .iter()
            .filter_map(|v| v.check(&self.value).err())
            .collect();
    }
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    children: Vec<(String, FieldNode)>,
    validators: Vec<GroupValidator>,
    errors: Vec<FailureCode>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a named child.
    pub fn with(mut self, name: impl Into<String>, node: FieldNode) -> Self {
        self.children.push((name.into(), node));
        self
    }

    pub fn with_validators(mut self, validators: Vec<GroupValidator>) -> Self {
        self.validators = validators;
        self
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &FieldNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub(crate) fn children_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldNode)> {
        self.children
            .iter_mut()
            .map(|(name, node)| (name.as_str(), node))
    }

    pub fn child(&self, name: &str) -> Option<&FieldNode> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut FieldNode> {
        self.children
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    pub fn leaf(&self, name: &str) -> Option<&Leaf> {
        match self.child(name) {
            Some(FieldNode::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    pub fn validators(&self) -> &[GroupValidator] {
        &self.validators
    }

    /// The group's own cross-field failures; children keep theirs.
    pub fn errors(&self) -> &[FailureCode] {
        &self.errors
    }

    pub fn set_validators(&mut self, validators: Vec<GroupValidator>) {
        self.validators = validators;
    }

    pub fn clear_validators(&mut self) {
        self.validators.clear();
    }

    /// Re-run the group's own validators against its current children.
    pub fn revalidate(&mut self) {
        let errors: Vec<FailureCode> = self
            .validators
            .iter()
            .filter_map(|v| v.check(self).err())
            .collect();
        self.errors = errors;
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.children.iter().all(|(_, c)| c.is_valid())
    }

    pub fn is_dirty(&self) -> bool {
        self.children.iter().any(|(_, c)| c.is_dirty())
    }

    pub fn is_touched(&self) -> bool {
        self.children.iter().any(|(_, c)| c.is_touched())
    }
}

// ---------------------------------------------------------------------------
// FieldArray
// ---------------------------------------------------------------------------

/// An ordered, resizable sequence of groups cloned from one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldArray {
    template: Group,
    // Always `FieldNode::Group`.
    items: Vec<FieldNode>,
}

impl FieldArray {
    pub fn new(template: Group, initial_len: usize) -> Self {
        let mut array = Self {
            template,
            items: Vec::new(),
        };
        array.resize(initial_len);
        array
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Group> {
        match self.items.get(index) {
            Some(FieldNode::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.items.iter().filter_map(|item| match item {
            FieldNode::Group(group) => Some(group),
            _ => None,
        })
    }

    /// Append a fresh copy of the template, already validated. Returns its index.
    pub fn push_default(&mut self) -> usize {
        let mut item = FieldNode::Group(self.template.clone());
        item.revalidate_tree();
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Group> {
        if index >= self.items.len() {
            return None;
        }
        match self.items.remove(index) {
            FieldNode::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn resize(&mut self, len: usize) {
        self.items.truncate(len);
        while self.items.len() < len {
            self.push_default();
        }
    }

    pub fn is_valid(&self) -> bool {
        self.items.iter().all(FieldNode::is_valid)
    }
}

// ---------------------------------------------------------------------------
// FieldNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldNode {
    Leaf(Leaf),
    Group(Group),
    Array(FieldArray),
}

impl FieldNode {
    pub fn leaf(value: impl Into<String>, validators: Vec<Validator>) -> Self {
        FieldNode::Leaf(Leaf::new(value).with_validators(validators))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FieldNode::Leaf(_) => "form control",
            FieldNode::Group(_) => "form group",
            FieldNode::Array(_) => "form array",
        }
    }

    /// The node's own failure codes. Collections carry none.
    pub fn errors(&self) -> &[FailureCode] {
        match self {
            FieldNode::Leaf(leaf) => leaf.errors(),
            FieldNode::Group(group) => group.errors(),
            FieldNode::Array(_) => &[],
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            FieldNode::Leaf(leaf) => leaf.is_valid(),
            FieldNode::Group(group) => group.is_valid(),
            FieldNode::Array(array) => array.is_valid(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            FieldNode::Leaf(leaf) => leaf.is_dirty(),
            FieldNode::Group(group) => group.is_dirty(),
            FieldNode::Array(array) => array.items.iter().any(FieldNode::is_dirty),
        }
    }

    pub fn is_touched(&self) -> bool {
        match self {
            FieldNode::Leaf(leaf) => leaf.is_touched(),
            FieldNode::Group(group) => group.is_touched(),
            FieldNode::Array(array) => array.items.iter().any(FieldNode::is_touched),
        }
    }

    /// Whether the node's value counts as "entered". Groups and collections
    /// hold a structured value, which always does.
    pub fn has_value(&self) -> bool {
        match self {
            FieldNode::Leaf(leaf) => !leaf.value().is_empty(),
            FieldNode::Group(_) | FieldNode::Array(_) => true,
        }
    }

    /// Re-run this node's own validators only.
    pub fn revalidate(&mut self) {
        match self {
            FieldNode::Leaf(leaf) => leaf.revalidate(),
            FieldNode::Group(group) => group.revalidate(),
            FieldNode::Array(_) => {}
        }
    }

    /// Revalidate the whole subtree, children before their parent.
    pub fn revalidate_tree(&mut self) {
        match self {
            FieldNode::Leaf(leaf) => leaf.revalidate(),
            FieldNode::Group(group) => {
                for (_, child) in group.children_mut() {
                    child.revalidate_tree();
                }
                group.revalidate();
            }
            FieldNode::Array(array) => {
                for item in array.items.iter_mut() {
                    item.revalidate_tree();
                }
            }
        }
    }

    fn mark_all_touched(&mut self) {
        match self {
            FieldNode::Leaf(leaf) => leaf.mark_touched(),
            FieldNode::Group(group) => {
                for (_, child) in group.children_mut() {
                    child.mark_all_touched();
                }
            }
            FieldNode::Array(array) => {
                for item in array.items.iter_mut() {
                    item.mark_all_touched();
                }
            }
        }
    }

    fn child(&self, segment: &str) -> Option<&FieldNode> {
        match self {
            FieldNode::Leaf(_) => None,
            FieldNode::Group(group) => group.child(segment),
            FieldNode::Array(array) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| array.items.get(i)),
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut FieldNode> {
        match self {
            FieldNode::Leaf(_) => None,
            FieldNode::Group(group) => group.child_mut(segment),
            FieldNode::Array(array) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| array.items.get_mut(i)),
        }
    }

    /// JSON view of every leaf value under this node.
    pub fn value(&self) -> Value {
        match self {
            FieldNode::Leaf(leaf) => Value::String(leaf.value().to_string()),
            FieldNode::Group(group) => {
                let map: Map<String, Value> = group
                    .children()
                    .map(|(name, child)| (name.to_string(), child.value()))
                    .collect();
                Value::Object(map)
            }
            FieldNode::Array(array) => {
                Value::Array(array.items.iter().map(FieldNode::value).collect())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// One node as seen by [`FormTree::walk`].
#[derive(Debug, Clone)]
pub struct NodeRef<'a> {
    pub path: String,
    /// Child name in the parent group, or the index for collection elements.
    pub name: String,
    pub node: &'a FieldNode,
}

fn walk_into<'a>(node: &'a FieldNode, name: String, path: String, out: &mut Vec<NodeRef<'a>>) {
    out.push(NodeRef {
        path: path.clone(),
        name,
        node,
    });
    match node {
        FieldNode::Leaf(_) => {}
        FieldNode::Group(group) => {
            for (child_name, child) in group.children() {
                walk_into(child, child_name.to_string(), join(&path, child_name), out);
            }
        }
        FieldNode::Array(array) => {
            for (i, item) in array.items.iter().enumerate() {
                let index = i.to_string();
                walk_into(item, index.clone(), join(&path, &index), out);
            }
        }
    }
}

fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Patching
// ---------------------------------------------------------------------------

fn leaf_text(path: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(RosterError::InvalidValue {
            path: path.to_string(),
            message: format!("expected a string, got {other}"),
        }),
    }
}

fn expected(path: &str, what: &str) -> RosterError {
    RosterError::InvalidValue {
        path: path.to_string(),
        message: format!("expected {what}"),
    }
}

/// Lenient update: keys that are absent keep their value, keys that name no
/// control are ignored, collection elements past the end are ignored.
fn patch_node(node: &mut FieldNode, path: &str, value: &Value) -> Result<()> {
    match node {
        FieldNode::Leaf(leaf) => leaf.set(leaf_text(path, value)?, false),
        FieldNode::Group(group) => {
            let map = value.as_object().ok_or_else(|| expected(path, "an object"))?;
            for (name, child_value) in map {
                if let Some(child) = group.child_mut(name) {
                    patch_node(child, &join(path, name), child_value)?;
                }
            }
        }
        FieldNode::Array(array) => {
            let items = value.as_array().ok_or_else(|| expected(path, "an array"))?;
            for (i, (item, item_value)) in array.items.iter_mut().zip(items).enumerate() {
                patch_node(item, &join(path, &i.to_string()), item_value)?;
            }
        }
    }
    Ok(())
}

/// Strict update: every control must be given a value and nothing else may
/// be supplied.
fn replace_node(node: &mut FieldNode, path: &str, value: &Value) -> Result<()> {
    match node {
        FieldNode::Leaf(leaf) => leaf.set(leaf_text(path, value)?, false),
        FieldNode::Group(group) => {
            let map = value.as_object().ok_or_else(|| expected(path, "an object"))?;
            if let Some(unknown) = map.keys().find(|k| group.child(k).is_none()) {
                return Err(RosterError::UnknownPath {
                    path: join(path, unknown),
                });
            }
            for (name, child) in group.children_mut() {
                let child_path = join(path, name);
                let child_value = map.get(name).ok_or_else(|| RosterError::MissingValue {
                    path: child_path.clone(),
                })?;
                replace_node(child, &child_path, child_value)?;
            }
        }
        FieldNode::Array(array) => {
            let items = value.as_array().ok_or_else(|| expected(path, "an array"))?;
            if items.len() > array.len() {
                return Err(RosterError::UnknownPath {
                    path: join(path, &array.len().to_string()),
                });
            }
            if items.len() < array.len() {
                return Err(RosterError::MissingValue {
                    path: join(path, &items.len().to_string()),
                });
            }
            for (i, (item, item_value)) in array.items.iter_mut().zip(items).enumerate() {
                replace_node(item, &join(path, &i.to_string()), item_value)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FormTree
// ---------------------------------------------------------------------------

/// A mutable form rooted at a group, with value-change notifications.
#[derive(Debug)]
pub struct FormTree {
    root: FieldNode,
    events: EventEmitter,
}

impl FormTree {
    /// Wrap `root` and run every validator once.
    pub fn new(root: Group) -> Self {
        let mut root = FieldNode::Group(root);
        root.revalidate_tree();
        Self {
            root,
            events: EventEmitter::default(),
        }
    }

    pub fn root(&self) -> &FieldNode {
        &self.root
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: FormEvent) {
        self.events.emit(event);
    }

    pub fn node(&self, path: &str) -> Result<&FieldNode> {
        let mut node = &self.root;
        for segment in segments(path) {
            node = node.child(segment).ok_or_else(|| RosterError::UnknownPath {
                path: path.to_string(),
            })?;
        }
        Ok(node)
    }

    pub(crate) fn node_mut(&mut self, path: &str) -> Result<&mut FieldNode> {
        let mut node = &mut self.root;
        for segment in segments(path) {
            node = node.child_mut(segment).ok_or_else(|| RosterError::UnknownPath {
                path: path.to_string(),
            })?;
        }
        Ok(node)
    }

    pub fn leaf(&self, path: &str) -> Result<&Leaf> {
        match self.node(path)? {
            FieldNode::Leaf(leaf) => Ok(leaf),
            _ => Err(wrong_kind(path, "form control")),
        }
    }

    pub(crate) fn leaf_mut(&mut self, path: &str) -> Result<&mut Leaf> {
        match self.node_mut(path)? {
            FieldNode::Leaf(leaf) => Ok(leaf),
            _ => Err(wrong_kind(path, "form control")),
        }
    }

    pub fn group(&self, path: &str) -> Result<&Group> {
        match self.node(path)? {
            FieldNode::Group(group) => Ok(group),
            _ => Err(wrong_kind(path, "form group")),
        }
    }

    pub(crate) fn group_mut(&mut self, path: &str) -> Result<&mut Group> {
        match self.node_mut(path)? {
            FieldNode::Group(group) => Ok(group),
            _ => Err(wrong_kind(path, "form group")),
        }
    }

    pub fn array(&self, path: &str) -> Result<&FieldArray> {
        match self.node(path)? {
            FieldNode::Array(array) => Ok(array),
            _ => Err(wrong_kind(path, "form array")),
        }
    }

    pub(crate) fn array_mut(&mut self, path: &str) -> Result<&mut FieldArray> {
        match self.node_mut(path)? {
            FieldNode::Array(array) => Ok(array),
            _ => Err(wrong_kind(path, "form array")),
        }
    }

    /// Current value of a leaf.
    pub fn value_of(&self, path: &str) -> Result<&str> {
        Ok(self.leaf(path)?.value())
    }

    /// JSON view of the whole form.
    pub fn value(&self) -> Value {
        self.root.value()
    }

    pub fn is_valid(&self) -> bool {
        self.root.is_valid()
    }

    // --- Mutations -------------------------------------------------------

    /// A user edit of one leaf. Marks it dirty and revalidates the leaf and
    /// every group above it.
    pub fn set_value(&mut self, path: &str, value: impl Into<String>) -> Result<()> {
        self.set_value_quiet(path, value)?;
        self.emit(FormEvent::ValueChanged {
            path: path.to_string(),
        });
        Ok(())
    }

    pub(crate) fn set_value_quiet(&mut self, path: &str, value: impl Into<String>) -> Result<()> {
        self.leaf_mut(path)?.set(value, true);
        self.revalidate_with_ancestors(path)
    }

    pub fn mark_touched(&mut self, path: &str) -> Result<()> {
        self.leaf_mut(path)?.mark_touched();
        self.emit(FormEvent::Touched {
            path: path.to_string(),
        });
        Ok(())
    }

    pub fn mark_all_touched(&mut self) {
        self.root.mark_all_touched();
        self.emit(FormEvent::Touched {
            path: String::new(),
        });
    }

    /// Programmatic partial update from a JSON object. Leaves stay pristine.
    /// On error nothing is changed.
    pub fn patch(&mut self, value: &Value) -> Result<()> {
        self.apply_patch(value)?;
        self.root.revalidate_tree();
        self.emit(FormEvent::Patched);
        Ok(())
    }

    pub(crate) fn apply_patch(&mut self, value: &Value) -> Result<()> {
        let mut next = self.root.clone();
        patch_node(&mut next, "", value)?;
        self.root = next;
        Ok(())
    }

    /// Programmatic full update: every control must be supplied. On error
    /// nothing is changed.
    pub fn set_form_value(&mut self, value: &Value) -> Result<()> {
        let mut next = self.root.clone();
        replace_node(&mut next, "", value)?;
        next.revalidate_tree();
        self.root = next;
        self.emit(FormEvent::ValueChanged {
            path: String::new(),
        });
        Ok(())
    }

    /// Replace a leaf's validators. Cached failures are untouched until the
    /// next revalidation.
    pub fn set_validators(&mut self, path: &str, validators: Vec<Validator>) -> Result<()> {
        self.leaf_mut(path)?.set_validators(validators);
        self.emit(FormEvent::ValidatorsChanged {
            path: path.to_string(),
        });
        Ok(())
    }

    pub fn set_group_validators(
        &mut self,
        path: &str,
        validators: Vec<GroupValidator>,
    ) -> Result<()> {
        self.group_mut(path)?.set_validators(validators);
        self.emit(FormEvent::ValidatorsChanged {
            path: path.to_string(),
        });
        Ok(())
    }

    pub fn clear_validators(&mut self, path: &str) -> Result<()> {
        self.clear_validators_quiet(path)?;
        self.emit(FormEvent::ValidatorsChanged {
            path: path.to_string(),
        });
        Ok(())
    }

    pub(crate) fn clear_validators_quiet(&mut self, path: &str) -> Result<()> {
        match self.node_mut(path)? {
            FieldNode::Leaf(leaf) => leaf.clear_validators(),
            FieldNode::Group(group) => group.clear_validators(),
            FieldNode::Array(_) => return Err(wrong_kind(path, "form control or group")),
        }
        Ok(())
    }

    /// Re-run one node's own validators. Does not descend into children.
    pub fn revalidate(&mut self, path: &str) -> Result<()> {
        self.node_mut(path)?.revalidate();
        self.emit(FormEvent::Revalidated {
            path: path.to_string(),
        });
        Ok(())
    }

    pub fn revalidate_all(&mut self) {
        self.revalidate_all_quiet();
        self.emit(FormEvent::Revalidated {
            path: String::new(),
        });
    }

    pub(crate) fn revalidate_all_quiet(&mut self) {
        self.root.revalidate_tree();
    }

    fn revalidate_with_ancestors(&mut self, path: &str) -> Result<()> {
        let parts: Vec<&str> = segments(path).collect();
        for end in (0..=parts.len()).rev() {
            self.node_mut(&parts[..end].join("."))?.revalidate();
        }
        Ok(())
    }

    /// Append a default element to the collection at `path`. Returns its index.
    pub fn push_group(&mut self, path: &str) -> Result<usize> {
        let index = self.array_mut(path)?.push_default();
        self.emit(FormEvent::GroupAdded {
            path: path.to_string(),
            index,
        });
        Ok(index)
    }

    /// Remove element `index`; an index past the end fails and changes nothing.
    pub fn remove_group(&mut self, path: &str, index: usize) -> Result<()> {
        let array = self.array_mut(path)?;
        let len = array.len();
        if array.remove(index).is_none() {
            return Err(RosterError::OutOfRange {
                path: path.to_string(),
                index,
                len,
            });
        }
        self.emit(FormEvent::GroupRemoved {
            path: path.to_string(),
            index,
        });
        Ok(())
    }

    pub(crate) fn resize_array(&mut self, path: &str, len: usize) -> Result<()> {
        self.array_mut(path)?.resize(len);
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> FieldNode {
        self.root.clone()
    }

    pub(crate) fn restore(&mut self, root: FieldNode) {
        self.root = root;
    }

    /// Depth-first, parents before children, every node exactly once
    /// (the root first, with an empty path).
    pub fn walk(&self) -> Vec<NodeRef<'_>> {
        let mut out = Vec::new();
        walk_into(&self.root, String::new(), String::new(), &mut out);
        out
    }
}

fn wrong_kind(path: &str, expected: &'static str) -> RosterError {
    RosterError::WrongNodeKind {
        path: path.to_string(),
        expected,
    }
}
