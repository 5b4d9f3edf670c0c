//! Choice tree: ordered, labeled hierarchy with unique sibling keys.

use serde::{Deserialize, Serialize};

use crate::error::ChoiceError;
use crate::path::SelectionPath;

/// A node in the choice tree.
///
/// `key` is unique among its siblings only; the same key may appear under
/// different parents. Children keep insertion order, which is the order the
/// options are offered in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    key: String,
    label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Choice>,
}

impl Choice {
    /// Create a leaf choice.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Expansion target of the `choices!` macro, which checks sibling keys
    /// at compile time.
    #[doc(hidden)]
    pub fn __branch(
        key: impl Into<String>,
        label: impl Into<String>,
        children: Vec<Choice>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            children,
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    #[inline]
    pub fn children(&self) -> &[Choice] {
        &self.children
    }

    /// True if this choice has no sub-choices.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child by key.
    pub fn child(&self, key: &str) -> Option<&Choice> {
        find(&self.children, key)
    }

    /// Append a child, rejecting a key already used by a sibling.
    pub fn push(&mut self, child: Choice) -> Result<(), ChoiceError> {
        let parent = self.key.clone();
        push_unique(&mut self.children, child, &parent)
    }

    /// Builder form of [`Choice::push`].
    pub fn with_child(mut self, child: Choice) -> Result<Self, ChoiceError> {
        self.push(child)?;
        Ok(self)
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Choice> {
        &mut self.children
    }
}

/// Ordered root-level choices.
///
/// An empty tree is valid and means no choices are configured.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Choice>", into = "Vec<Choice>")]
pub struct ChoiceTree {
    roots: Vec<Choice>,
}

/// A choice together with its position in the tree, as yielded by
/// [`ChoiceTree::walk`].
#[derive(Clone, Copy, Debug)]
pub struct ChoiceEntry<'a> {
    /// Keys from the root down to (but excluding) this choice.
    pub ancestors: &'a [&'a str],
    pub choice: &'a Choice,
}

impl ChoiceEntry<'_> {
    /// 0 for root-level choices.
    #[inline]
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Full selection path to this choice.
    pub fn path(&self) -> SelectionPath {
        self.ancestors
            .iter()
            .copied()
            .chain(std::iter::once(self.choice.key()))
            .collect()
    }
}

impl ChoiceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from root choices, validating sibling uniqueness at
    /// every level.
    pub fn from_choices(roots: Vec<Choice>) -> Result<Self, ChoiceError> {
        validate_level(&roots, &mut Vec::new())?;
        Ok(Self { roots })
    }

    /// Expansion target of the `choices!` macro.
    #[doc(hidden)]
    pub fn __from_macro(roots: Vec<Choice>) -> Self {
        Self { roots }
    }

    #[inline]
    pub fn roots(&self) -> &[Choice] {
        &self.roots
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of choices at all depths.
    pub fn len(&self) -> usize {
        fn count(level: &[Choice]) -> usize {
            level.iter().map(|c| 1 + count(&c.children)).sum()
        }
        count(&self.roots)
    }

    /// Number of levels (0 = empty, 1 = only root choices, etc.).
    pub fn depth(&self) -> usize {
        fn deepest(level: &[Choice]) -> usize {
            level
                .iter()
                .map(|c| 1 + deepest(&c.children))
                .max()
                .unwrap_or(0)
        }
        deepest(&self.roots)
    }

    /// Append a root-level choice.
    pub fn push(&mut self, choice: Choice) -> Result<(), ChoiceError> {
        validate_level(&choice.children, &mut vec![choice.key.clone()])?;
        push_unique(&mut self.roots, choice, "")
    }

    /// Choice reached by following `keys` from the root.
    pub fn get<S: AsRef<str>>(&self, keys: &[S]) -> Option<&Choice> {
        let (first, rest) = keys.split_first()?;
        let mut node = find(&self.roots, first.as_ref())?;
        for key in rest {
            node = node.child(key.as_ref())?;
        }
        Some(node)
    }

    /// Choice at the end of a selection path.
    pub fn get_path(&self, path: &SelectionPath) -> Option<&Choice> {
        self.get(path.segments())
    }

    pub fn contains_path(&self, path: &SelectionPath) -> bool {
        self.get_path(path).is_some()
    }

    /// Options offered below `path`: the root choices for an empty path,
    /// otherwise the children of the choice it names.
    pub fn options_at(&self, path: &SelectionPath) -> Option<&[Choice]> {
        if path.is_empty() {
            return Some(&self.roots);
        }
        self.get_path(path).map(Choice::children)
    }

    /// Visit every choice depth-first, parent before children, in insertion
    /// order.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(ChoiceEntry<'_>),
    {
        fn recurse<'a, F: FnMut(ChoiceEntry<'_>)>(
            level: &'a [Choice],
            ancestors: &mut Vec<&'a str>,
            visit: &mut F,
        ) {
            for choice in level {
                visit(ChoiceEntry {
                    ancestors: ancestors.as_slice(),
                    choice,
                });
                if !choice.children.is_empty() {
                    ancestors.push(choice.key.as_str());
                    recurse(&choice.children, ancestors, visit);
                    ancestors.pop();
                }
            }
        }
        recurse(&self.roots, &mut Vec::new(), &mut visit);
    }

    /// Every selection path in DFS order.
    pub fn paths(&self) -> Vec<SelectionPath> {
        let mut out = Vec::with_capacity(self.len());
        self.walk(|entry| out.push(entry.path()));
        out
    }

    pub(crate) fn roots_mut(&mut self) -> &mut Vec<Choice> {
        &mut self.roots
    }
}

impl TryFrom<Vec<Choice>> for ChoiceTree {
    type Error = ChoiceError;

    fn try_from(roots: Vec<Choice>) -> Result<Self, Self::Error> {
        Self::from_choices(roots)
    }
}

impl From<ChoiceTree> for Vec<Choice> {
    fn from(tree: ChoiceTree) -> Self {
        tree.roots
    }
}

/// Sibling lookup. Levels are small; a linear scan keeps insertion order
/// without a secondary index.
pub(crate) fn find<'a>(level: &'a [Choice], key: &str) -> Option<&'a Choice> {
    level.iter().find(|c| c.key == key)
}

pub(crate) fn position(level: &[Choice], key: &str) -> Option<usize> {
    level.iter().position(|c| c.key == key)
}

fn push_unique(level: &mut Vec<Choice>, choice: Choice, parent: &str) -> Result<(), ChoiceError> {
    if position(level, &choice.key).is_some() {
        return Err(ChoiceError::DuplicateKey {
            parent: parent.to_string(),
            key: choice.key,
        });
    }
    level.push(choice);
    Ok(())
}

fn validate_level(level: &[Choice], parents: &mut Vec<String>) -> Result<(), ChoiceError> {
    for (i, choice) in level.iter().enumerate() {
        if level[..i].iter().any(|c| c.key == choice.key) {
            return Err(ChoiceError::DuplicateKey {
                parent: parents.join("/"),
                key: choice.key.clone(),
            });
        }
        parents.push(choice.key.clone());
        validate_level(&choice.children, parents)?;
        parents.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChoiceTree {
        let region = Choice::new("region", "Region")
            .with_child(
                Choice::new("north", "North")
                    .with_child(Choice::new("store-12", "Store 12"))
                    .unwrap(),
            )
            .unwrap()
            .with_child(Choice::new("south", "South"))
            .unwrap();
        let mut tree = ChoiceTree::new();
        tree.push(region).unwrap();
        tree.push(Choice::new("online", "Online")).unwrap();
        tree
    }

    #[test]
    fn lookup_by_keys() {
        let tree = sample();
        assert_eq!(tree.get(&["region", "north"]).unwrap().label(), "North");
        assert_eq!(
            tree.get(&["region", "north", "store-12"]).unwrap().label(),
            "Store 12"
        );
        assert!(tree.get(&["north"]).is_none());
        assert!(tree.get::<&str>(&[]).is_none());
    }

    #[test]
    fn counts_and_depth() {
        let tree = sample();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.depth(), 3);
        assert_eq!(ChoiceTree::new().depth(), 0);
        assert!(ChoiceTree::new().is_empty());
    }

    #[test]
    fn walk_is_preorder_in_insertion_order() {
        let tree = sample();
        let paths: Vec<String> = tree.paths().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            paths,
            [
                "region",
                "region/north",
                "region/north/store-12",
                "region/south",
                "online"
            ]
        );
    }

    #[test]
    fn rejects_duplicate_root() {
        let mut tree = sample();
        let err = tree.push(Choice::new("online", "Again")).unwrap_err();
        assert_eq!(
            err,
            ChoiceError::DuplicateKey {
                parent: String::new(),
                key: "online".into()
            }
        );
    }

    #[test]
    fn rejects_duplicate_child() {
        let err = Choice::new("a", "A")
            .with_child(Choice::new("b", "B"))
            .unwrap()
            .with_child(Choice::new("b", "B2"))
            .unwrap_err();
        assert!(matches!(err, ChoiceError::DuplicateKey { ref key, .. } if key == "b"));
    }

    #[test]
    fn same_key_under_different_parents() {
        let tree = ChoiceTree::from_choices(vec![
            Choice::__branch("a", "A", vec![Choice::new("x", "X")]),
            Choice::__branch("b", "B", vec![Choice::new("x", "X")]),
        ]);
        assert!(tree.is_ok());
    }

    #[test]
    fn from_choices_validates_nested_levels() {
        let err = ChoiceTree::from_choices(vec![Choice::__branch(
            "a",
            "A",
            vec![Choice::new("x", "X"), Choice::new("x", "Y")],
        )])
        .unwrap_err();
        assert_eq!(
            err,
            ChoiceError::DuplicateKey {
                parent: "a".into(),
                key: "x".into()
            }
        );
    }

    #[test]
    fn options_at_root_and_branch() {
        let tree = sample();
        let root = tree.options_at(&SelectionPath::new()).unwrap();
        assert_eq!(root.len(), 2);
        let region = tree.options_at(&"region".into()).unwrap();
        assert_eq!(region[0].key(), "north");
        assert!(tree.options_at(&"nowhere".into()).is_none());
    }

    #[test]
    fn serde_rejects_duplicate_siblings() {
        let json = r#"[{"key":"a","label":"A"},{"key":"a","label":"B"}]"#;
        assert!(serde_json::from_str::<ChoiceTree>(json).is_err());

        let tree = sample();
        let json = serde_json::to_string(&tree).unwrap();
        let back: ChoiceTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
