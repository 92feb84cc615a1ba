//! In-memory hierarchies rebuilt from flat, parent-referencing collections.
//!
//! Folders and q-tree nodes are stored flat with weak parent references.
//! The nested views handed to clients are derived here on every fetch and
//! never persisted.

use super::{DestinationEntry, Folder, QTreeNode};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// Deepest nesting of folders, and of q-tree nodes below their root.
///
/// Creates and moves past it are rejected, and built trees stop there, so
/// nested views stay shallow enough to serialize and drop on a worker stack.
pub const MAX_TREE_DEPTH: usize = 64;

/// An entity together with its ordered children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub item: T,
    pub children: Vec<TreeNode<T>>,
}

pub type FolderNode = TreeNode<Folder>;
pub type QTreeNodeTree = TreeNode<QTreeNode>;

impl<T> TreeNode<T> {
    /// Pre-order traversal: visits the node, then each child subtree.
    pub fn walk<F>(&self, depth: usize, visit: &mut F)
    where
        F: FnMut(&T, usize),
    {
        let mut stack = vec![(self, depth)];
        while let Some((node, depth)) = stack.pop() {
            visit(&node.item, depth);
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }

    /// Number of entities in this subtree, the node included.
    pub fn size(&self) -> usize {
        let mut count = 0;
        self.walk(0, &mut |_, _| count += 1);
        count
    }

    /// Converts every item, keeping the shape.
    pub fn map<U, F>(self, f: &F) -> TreeNode<U>
    where
        F: Fn(T) -> U,
    {
        struct Frame<T, U> {
            item: T,
            pending: std::vec::IntoIter<TreeNode<T>>,
            done: Vec<TreeNode<U>>,
        }

        fn open<T, U>(node: TreeNode<T>) -> Frame<T, U> {
            Frame {
                item: node.item,
                pending: node.children.into_iter(),
                done: Vec::new(),
            }
        }

        let mut current = open(self);
        let mut ancestors: Vec<Frame<T, U>> = Vec::new();
        loop {
            if let Some(child) = current.pending.next() {
                ancestors.push(std::mem::replace(&mut current, open(child)));
                continue;
            }

            let node = TreeNode {
                item: f(current.item),
                children: current.done,
            };
            match ancestors.pop() {
                Some(mut parent) => {
                    parent.done.push(node);
                    current = parent;
                }
                None => return node,
            }
        }
    }
}

/// Where an entity lands when the forest is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Root,
    ChildOf(Uuid),
    Detached,
}

/// Assembles a forest from a flat list.
///
/// `place` decides, with the set of known ids at hand, whether an item is
/// top-level, nested under another item, or left out. Sibling order follows
/// input order. When ids repeat, the last item wins and takes the slot of the
/// first occurrence. Items whose parent chain loops back on itself are never
/// reachable from a top-level item and are omitted.
/// Nesting stops at [`MAX_TREE_DEPTH`] levels; anything deeper is omitted.
pub fn build_forest<T, K, P>(items: &[T], key: K, place: P) -> Vec<TreeNode<T>>
where
    T: Clone,
    K: Fn(&T) -> Uuid,
    P: Fn(&T, &dyn Fn(Uuid) -> bool) -> Placement,
{
    let mut slots: Vec<T> = Vec::with_capacity(items.len());
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(items.len());

    for item in items {
        match index.get(&key(item)) {
            Some(&slot) => slots[slot] = item.clone(),
            None => {
                index.insert(key(item), slots.len());
                slots.push(item.clone());
            }
        }
    }

    let known = |id: Uuid| index.contains_key(&id);
    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];

    for (slot, item) in slots.iter().enumerate() {
        match place(item, &known) {
            Placement::Root => roots.push(slot),
            Placement::ChildOf(parent) => {
                if let Some(&parent_slot) = index.get(&parent) {
                    children[parent_slot].push(slot);
                }
            }
            Placement::Detached => {}
        }
    }

    roots
        .into_iter()
        .map(|slot| assemble(slot, &slots, &children))
        .collect()
}

/// Builds the subtree under `top` in post-order with an explicit stack.
/// Levels below `MAX_TREE_DEPTH` are left out.
fn assemble<T: Clone>(top: usize, slots: &[T], children: &[Vec<usize>]) -> TreeNode<T> {
    struct Frame<T> {
        slot: usize,
        next_child: usize,
        built: Vec<TreeNode<T>>,
    }

    let open = |slot: usize| Frame {
        slot,
        next_child: 0,
        built: Vec::with_capacity(children[slot].len()),
    };

    let mut current = open(top);
    let mut ancestors: Vec<Frame<T>> = Vec::new();
    loop {
        let depth = ancestors.len() + 1;
        if depth < MAX_TREE_DEPTH {
            if let Some(&child) = children[current.slot].get(current.next_child) {
                current.next_child += 1;
                ancestors.push(std::mem::replace(&mut current, open(child)));
                continue;
            }
        }

        let node = TreeNode {
            item: slots[current.slot].clone(),
            children: current.built,
        };
        match ancestors.pop() {
            Some(mut parent) => {
                parent.built.push(node);
                current = parent;
            }
            None => return node,
        }
    }
}

/// Folder forest. A folder whose parent is missing from `folders` is an
/// orphan and becomes top-level.
pub fn build_folder_tree(folders: &[Folder]) -> Vec<FolderNode> {
    build_forest(
        folders,
        |folder| folder.id,
        |folder, known| match folder.parent_id {
            Some(parent) if known(parent) => Placement::ChildOf(parent),
            _ => Placement::Root,
        },
    )
}

/// Node forest of the tree rooted at `root_id`.
///
/// Unlike folders, a node whose parent node is missing is dropped rather
/// than promoted to the top level.
pub fn build_node_tree(root_id: Uuid, nodes: &[QTreeNode]) -> Vec<QTreeNodeTree> {
    build_forest(
        nodes,
        |node| node.id,
        |node, known| {
            if node.parent_root_id == Some(root_id) {
                return Placement::Root;
            }
            match node.parent_node_id {
                Some(parent) if known(parent) => Placement::ChildOf(parent),
                _ => Placement::Detached,
            }
        },
    )
}

/// Ancestor path of `target`, top-level folder first and `target` last.
///
/// Stops at the first missing parent and at the first id seen twice, so
/// broken or cyclic parent chains yield a partial path.
pub fn folder_breadcrumbs(folders: &[Folder], target: Uuid) -> Vec<Folder> {
    let by_id: HashMap<Uuid, &Folder> = folders.iter().map(|f| (f.id, f)).collect();
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    let mut current = by_id.get(&target).copied();

    while let Some(folder) = current {
        if !visited.insert(folder.id) {
            break;
        }
        path.push(folder.clone());
        current = folder.parent_id.and_then(|parent| by_id.get(&parent).copied());
    }

    path.reverse();
    path
}

/// The folders a move of `moved` must not target: `moved` itself and every
/// folder reachable from it through child links.
pub fn excluded_destinations(folders: &[Folder], moved: Uuid) -> HashSet<Uuid> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for folder in folders {
        if let Some(parent) = folder.parent_id {
            children.entry(parent).or_default().push(folder.id);
        }
    }

    let mut excluded = HashSet::from([moved]);
    let mut queue = VecDeque::from([moved]);
    while let Some(id) = queue.pop_front() {
        for &child in children.get(&id).into_iter().flatten() {
            if excluded.insert(child) {
                queue.push_back(child);
            }
        }
    }

    excluded
}

/// Picker rows for a move, in display order. The subtree of `exclude` is
/// left out entirely. Top-level folders sit at depth 1, below the implicit
/// top-level choice.
pub fn move_destinations(tree: &[FolderNode], exclude: Option<Uuid>) -> Vec<DestinationEntry> {
    let mut entries = Vec::new();
    let mut stack: Vec<(&FolderNode, usize)> = tree.iter().rev().map(|node| (node, 1)).collect();

    while let Some((node, depth)) = stack.pop() {
        if Some(node.item.id) == exclude {
            continue;
        }
        entries.push(DestinationEntry {
            id: node.item.id,
            name: node.item.name.clone(),
            depth,
        });
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
    entries
}

/// Levels in the subtree rooted at `top`, `top` included. Cycles are
/// counted once.
pub fn subtree_height(folders: &[Folder], top: Uuid) -> usize {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for folder in folders {
        if let Some(parent) = folder.parent_id {
            children.entry(parent).or_default().push(folder.id);
        }
    }

    let mut seen = HashSet::from([top]);
    let mut level = vec![top];
    let mut height = 0;
    while !level.is_empty() {
        height += 1;
        level = level
            .iter()
            .flat_map(|id| children.get(id).into_iter().flatten())
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
    }
    height
}

/// Level of a node below its root, top-level nodes being 1. Stops at a
/// missing parent or a repeated id.
pub fn node_depth(nodes: &[QTreeNode], node_id: Uuid) -> usize {
    let by_id: HashMap<Uuid, &QTreeNode> = nodes.iter().map(|n| (n.id, n)).collect();
    let mut visited = HashSet::new();
    let mut depth = 0;
    let mut current = by_id.get(&node_id).copied();

    while let Some(node) = current {
        if !visited.insert(node.id) {
            break;
        }
        depth += 1;
        current = node.parent_node_id.and_then(|parent| by_id.get(&parent).copied());
    }
    depth
}

/// `(item, depth)` pairs of a whole forest in pre-order.
pub fn flatten_with_depth<T: Clone>(forest: &[TreeNode<T>]) -> Vec<(T, usize)> {
    let mut rows = Vec::new();
    for node in forest {
        node.walk(0, &mut |item: &T, depth| rows.push((item.clone(), depth)));
    }
    rows
}
