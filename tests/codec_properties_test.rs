//! Round-trip properties of the choice codec over generated trees and text.

use proptest::prelude::*;
use treeselect::{decode, encode, Choice, ChoiceError, ChoiceTree};

/// Key and label pieces, weighted towards plain words but including every
/// character the text format gives meaning to.
fn fragment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => "[a-zA-Z0-9_-]{1,4}",
        1 => Just(" ".to_string()),
        1 => Just(":".to_string()),
        1 => Just(" : ".to_string()),
        1 => Just("/".to_string()),
        1 => Just("[".to_string()),
        1 => Just("value".to_string()),
        1 => Just("\t".to_string()),
        1 => Just("\r".to_string()),
        1 => Just("é".to_string()),
    ]
}

fn key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment_strategy(), 0..4).prop_map(|parts| parts.concat())
}

fn label_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![6 => fragment_strategy(), 1 => Just("\n".to_string())],
        0..5,
    )
    .prop_map(|parts| parts.concat())
}

/// Choices with unique sibling keys; later duplicates are dropped.
fn choice_strategy() -> impl Strategy<Value = Choice> {
    let leaf = (key_strategy(), label_strategy()).prop_map(|(key, label)| Choice::new(key, label));
    leaf.prop_recursive(3, 32, 4, |inner| {
        (
            key_strategy(),
            label_strategy(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(key, label, children)| {
                let mut choice = Choice::new(key, label);
                for child in children {
                    let _ = choice.push(child);
                }
                choice
            })
    })
}

fn tree_strategy() -> impl Strategy<Value = ChoiceTree> {
    prop::collection::vec(choice_strategy(), 0..5).prop_map(|roots| {
        let mut tree = ChoiceTree::new();
        for root in roots {
            let _ = tree.push(root);
        }
        tree
    })
}

/// Multi-line text assembled from path, separator and label pieces.
fn text_strategy() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        4 => "[a-c]{1,2}",
        2 => Just(" / ".to_string()),
        1 => Just("/".to_string()),
        3 => Just(" : ".to_string()),
        1 => Just(":".to_string()),
        1 => Just(" ".to_string()),
        1 => Just("value".to_string()),
        1 => Just("]".to_string()),
        1 => Just("\r".to_string()),
    ];
    let line = prop::collection::vec(piece, 0..7).prop_map(|parts| parts.concat());
    prop::collection::vec(line, 0..8).prop_map(|lines| lines.join("\n"))
}

proptest! {
    /// A tree either refuses to encode or reads back identical.
    #[test]
    fn encoded_trees_decode_to_themselves(tree in tree_strategy()) {
        match encode(&tree) {
            Ok(text) => {
                prop_assert_eq!(decode(&text), Ok(tree));
            }
            Err(ChoiceError::MalformedChoice { .. }) => {}
            Err(other) => {
                prop_assert!(false, "unexpected encode error: {:?}", other);
            }
        }
    }

    /// Whatever decodes is encodable, and the canonical text is stable.
    #[test]
    fn decoded_text_is_stable(text in text_strategy()) {
        if let Ok(tree) = decode(&text) {
            let canonical = encode(&tree);
            prop_assert!(canonical.is_ok(), "decoded tree failed to encode: {:?}", canonical);
            let canonical = canonical.unwrap_or_default();
            prop_assert_eq!(decode(&canonical), Ok(tree));
        }
    }

    /// Plain word trees always encode.
    #[test]
    fn word_keys_always_encode(
        keys in prop::collection::hash_set("[a-z]{1,6}", 1..6),
        label in "[A-Z][a-z]{0,8}( [a-z]{1,5}){0,2}",
    ) {
        let mut tree = ChoiceTree::new();
        for key in keys.iter().filter(|k| k.as_str() != "value") {
            tree.push(Choice::new(key.as_str(), label.as_str())).unwrap();
        }
        let text = encode(&tree).unwrap();
        prop_assert_eq!(decode(&text), Ok(tree));
    }
}

#[test]
fn known_separator_collisions() {
    // Keys whose edges meet the spaces of the path separator
    for key in [": x", "x :"] {
        let tree = ChoiceTree::from_choices(vec![Choice::__branch(
            "p",
            "P",
            vec![Choice::new(key, "L")],
        )])
        .unwrap();
        assert!(matches!(
            encode(&tree),
            Err(ChoiceError::MalformedChoice { .. })
        ));
    }
    assert!(decode("p : P\np/: x : L\n").is_err());
}
