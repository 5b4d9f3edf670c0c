//! Pre-rendered cascade selectors and the change behaviour applied to them.
//!
//! Every non-leaf choice gets its own selector up front, hidden until its
//! parent selects it. A change on one selector hides and resets the subtree
//! of the previous value and reveals the selector of the new one, so no
//! round-trip to the resolver is needed while the user clicks through.

use serde::{Deserialize, Serialize};

use crate::path::SelectionPath;
use crate::resolve::{resolve, ChoiceOption};
use crate::tree::{Choice, ChoiceTree};

/// Label of the empty option that starts every selector.
pub const PLACEHOLDER_LABEL: &str = "- Select -";

const VALUE_SUFFIX: &str = "[value]";

/// One rendered selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectInput {
    /// Form name, `field[0][k1]…[value]`.
    pub name: String,
    /// Path of the choice whose children this selector offers.
    pub parent: SelectionPath,
    /// Placeholder first, then the children in tree order.
    pub options: Vec<ChoiceOption>,
    pub value: Option<String>,
    pub hidden: bool,
    pub disabled: bool,
}

impl SelectInput {
    #[inline]
    pub fn depth(&self) -> usize {
        self.parent.len()
    }
}

/// Form name of the selector listing the children of `parent`.
pub fn select_name(field_name: &str, parent: &SelectionPath) -> String {
    let mut name = format!("{field_name}[{}]", crate::form::ROOT_SENTINEL);
    for key in parent.segments() {
        name.push('[');
        name.push_str(key);
        name.push(']');
    }
    name.push_str(VALUE_SUFFIX);
    name
}

/// Render one selector for the root and for every non-leaf choice, in
/// depth-first order.
///
/// Only the valid prefix of `selection` is used: a broken stored path shows
/// the levels that still resolve and blanks the rest.
pub fn select_inputs(
    field_name: &str,
    tree: &ChoiceTree,
    selection: &SelectionPath,
) -> Vec<SelectInput> {
    let selection = resolve(tree, selection).selected_path();
    let mut inputs = Vec::new();
    collect(
        field_name,
        tree.roots(),
        &SelectionPath::new(),
        &selection,
        &mut inputs,
    );
    inputs
}

fn collect(
    field_name: &str,
    level: &[Choice],
    parent: &SelectionPath,
    selection: &SelectionPath,
    out: &mut Vec<SelectInput>,
) {
    let on_path = selection.starts_with(parent);
    let mut options = Vec::with_capacity(level.len() + 1);
    options.push(ChoiceOption {
        key: String::new(),
        label: PLACEHOLDER_LABEL.to_string(),
    });
    options.extend(level.iter().map(ChoiceOption::from));

    out.push(SelectInput {
        name: select_name(field_name, parent),
        parent: parent.clone(),
        options,
        value: if on_path {
            selection.get(parent.len()).map(str::to_string)
        } else {
            None
        },
        hidden: !on_path,
        disabled: !on_path,
    });

    for choice in level.iter().filter(|c| !c.is_leaf()) {
        collect(
            field_name,
            choice.children(),
            &parent.child(choice.key()),
            selection,
            out,
        );
    }
}

/// What a value change on one selector does to the others.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEffect {
    /// Name prefix of every selector under the previous value; those are
    /// reset, hidden and disabled.
    pub reset_prefix: Option<String>,
    /// Selector for the new value, shown and enabled.
    pub show: Option<String>,
}

impl ChangeEffect {
    /// Does this change reset the selector called `name`?
    pub fn resets(&self, name: &str) -> bool {
        self.reset_prefix
            .as_deref()
            .is_some_and(|prefix| name.starts_with(prefix))
    }
}

/// Effect of changing selector `name` from `previous` to `current`.
///
/// `None` if `name` is not a cascade selector name.
pub fn change_effect(name: &str, previous: &str, current: &str) -> Option<ChangeEffect> {
    let stem = name.strip_suffix(VALUE_SUFFIX)?;
    let child = |key: &str| format!("{stem}[{key}]");

    Some(ChangeEffect {
        reset_prefix: (!previous.is_empty() && previous != current).then(|| child(previous)),
        show: (!current.is_empty()).then(|| format!("{}{VALUE_SUFFIX}", child(current))),
    })
}

/// Apply a change to a rendered set of selectors.
///
/// Returns the effect, or `None` if no selector is called `name`.
pub fn apply_change(
    inputs: &mut [SelectInput],
    name: &str,
    current: &str,
) -> Option<ChangeEffect> {
    let changed = inputs.iter_mut().find(|input| input.name == name)?;
    let previous = changed.value.take().unwrap_or_default();
    changed.value = (!current.is_empty()).then(|| current.to_string());

    let effect = change_effect(name, &previous, current)?;
    for input in inputs.iter_mut() {
        if effect.resets(&input.name) {
            input.value = None;
            input.hidden = true;
            input.disabled = true;
        }
        if effect.show.as_deref() == Some(input.name.as_str()) {
            input.hidden = false;
            input.disabled = false;
        }
    }
    Some(effect)
}
