//! Cascade resolver: which selector is shown at each depth, and what it holds.
//!
//! Given a tree and a (possibly partial) selection, [`resolve`] walks the path
//! from the root and emits one [`Level`] per depth:
//!
//! ```text
//! tree:  region { north { store-12 } south }  online
//! path:  region/north
//!
//! level 0  [region*, online]      visible
//! level 1  [north*, south]        visible
//! level 2  [store-12]             visible, nothing selected yet
//! ```
//!
//! Descent stops at a leaf, when the path runs out, or at the first key the
//! tree no longer contains. The last case is reported as a [`BrokenPath`]
//! rather than an error: trees are edited after records are saved.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::path::SelectionPath;
use crate::tree::{find, Choice, ChoiceTree};

/// One selectable option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub key: String,
    pub label: String,
}

impl From<&Choice> for ChoiceOption {
    fn from(choice: &Choice) -> Self {
        Self {
            key: choice.key().to_string(),
            label: choice.label().to_string(),
        }
    }
}

/// Selector state for one depth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub depth: usize,
    pub options: Vec<ChoiceOption>,
    pub selected: Option<String>,
    /// Root is always visible; deeper levels only below a selection.
    pub visible: bool,
    /// The stored key at this depth no longer exists in the tree.
    pub broken: bool,
}

/// A stored selection that references a key no longer in the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenPath {
    /// Depth of the first unknown key.
    pub depth: usize,
    pub key: String,
    /// The unknown key and every segment after it.
    pub unresolved: Vec<String>,
}

/// Output of [`resolve`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub levels: Vec<Level>,
    pub broken: Option<BrokenPath>,
    /// The deepest selected choice has no children.
    pub leaf_selected: bool,
}

impl Resolution {
    /// The valid prefix of the requested path.
    pub fn selected_path(&self) -> SelectionPath {
        self.levels
            .iter()
            .map_while(|level| level.selected.as_deref())
            .collect()
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }

    /// Nothing selected at all.
    pub fn is_empty(&self) -> bool {
        self.levels.first().is_none_or(|l| l.selected.is_none())
    }

    /// The level a user should pick from next, if any.
    pub fn pending_level(&self) -> Option<&Level> {
        self.levels.iter().find(|l| l.selected.is_none())
    }
}

/// Resolve `path` against `tree`.
///
/// Deterministic and side-effect free apart from a warning event when the
/// path is broken.
pub fn resolve(tree: &ChoiceTree, path: &SelectionPath) -> Resolution {
    let mut resolution = Resolution::default();
    let mut options: &[Choice] = tree.roots();

    for depth in 0.. {
        let mut level = Level {
            depth,
            options: options.iter().map(ChoiceOption::from).collect(),
            selected: None,
            visible: depth == 0
                || resolution
                    .levels
                    .last()
                    .is_some_and(|parent| parent.selected.is_some()),
            broken: false,
        };

        let Some(key) = path.get(depth) else {
            resolution.levels.push(level);
            break;
        };

        let Some(choice) = find(options, key) else {
            warn!(path = %path, depth, key, "stored selection references a missing choice");
            level.broken = true;
            resolution.broken = Some(BrokenPath {
                depth,
                key: key.to_string(),
                unresolved: path.segments()[depth..].to_vec(),
            });
            resolution.levels.push(level);
            break;
        };

        level.selected = Some(key.to_string());
        resolution.levels.push(level);

        if choice.is_leaf() {
            resolution.leaf_selected = true;
            break;
        }
        options = choice.children();
    }

    resolution
}

/// Resolver bound to one tree, for the change-driven re-resolution a
/// presentation layer performs.
#[derive(Clone, Copy, Debug)]
pub struct CascadeResolver<'a> {
    tree: &'a ChoiceTree,
}

impl<'a> CascadeResolver<'a> {
    pub fn new(tree: &'a ChoiceTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a ChoiceTree {
        self.tree
    }

    pub fn resolve(&self, path: &SelectionPath) -> Resolution {
        resolve(self.tree, path)
    }

    /// Apply a selector change at `depth` and resolve the result.
    ///
    /// Deeper selections are cleared; an empty `key` clears `depth` as well.
    /// A change at a depth that is not currently shown is ignored.
    pub fn change(&self, path: &mut SelectionPath, depth: usize, key: &str) -> Resolution {
        let current = self.resolve(path);
        let shown = current.levels.get(depth).is_some_and(|l| l.visible);
        if shown {
            path.select(depth, key);
        }
        self.resolve(path)
    }
}
