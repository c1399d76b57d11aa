//! Threading of flat comment rows into reply trees.
//!
//! Everything here is a pure transformation over rows that were already
//! fetched for one request. The children index is built once and every
//! traversal goes through it instead of rescanning the flat list.

use std::collections::{HashMap, HashSet};

use super::{AnswerStatus, Author, Comment, CommentView};

/// Display names for comment authors, keyed by customer or staff code.
#[derive(Debug, Default, Clone)]
pub struct NameMaps {
    pub customers: HashMap<String, String>,
    pub staff: HashMap<String, String>,
}

impl NameMaps {
    /// Name on file for `author`, or the raw id when there is none.
    pub fn resolve(&self, author: &Author) -> String {
        let names = match author {
            Author::Customer(_) => &self.customers,
            Author::Staff(_) => &self.staff,
        };
        names
            .get(author.id())
            .cloned()
            .unwrap_or_else(|| author.id().to_string())
    }
}

/// Direct children of each comment, newest first.
pub type ChildrenIndex<'a> = HashMap<&'a str, Vec<&'a Comment>>;

fn newest_first(a: &&Comment, b: &&Comment) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Groups replies under their parent id. Root comments are not indexed.
pub fn build_children_index(flat: &[Comment]) -> ChildrenIndex<'_> {
    let mut index: ChildrenIndex<'_> = HashMap::new();
    for comment in flat {
        if let Some(parent_id) = comment.parent_id.as_deref() {
            index.entry(parent_id).or_default().push(comment);
        }
    }
    for children in index.values_mut() {
        children.sort_by(newest_first);
    }
    index
}

/// View of a single comment without expanding its replies.
pub fn to_flat_view(comment: &Comment, names: &NameMaps) -> CommentView {
    CommentView {
        id: comment.id.clone(),
        product_id: comment.product_id.clone(),
        author: comment.author.clone(),
        author_name: names.resolve(&comment.author),
        body: comment.body.clone(),
        created_at: comment.created_at,
        parent_id: comment.parent_id.clone(),
        replies: Vec::new(),
    }
}

/// View of `comment` with all of its replies expanded, newest first.
pub fn to_view_recursive(
    comment: &Comment,
    index: &ChildrenIndex<'_>,
    names: &NameMaps,
) -> CommentView {
    let mut path = HashSet::new();
    expand(comment, index, names, &mut path)
}

fn expand<'a>(
    comment: &'a Comment,
    index: &ChildrenIndex<'a>,
    names: &NameMaps,
    path: &mut HashSet<&'a str>,
) -> CommentView {
    let mut view = to_flat_view(comment, names);
    // A parent chain that loops back on itself is corrupt data; stop there.
    if !path.insert(comment.id.as_str()) {
        return view;
    }
    if let Some(children) = index.get(comment.id.as_str()) {
        view.replies = children
            .iter()
            .map(|&child| expand(child, index, names, path))
            .collect();
    }
    path.remove(comment.id.as_str());
    view
}

/// Every root comment, newest first, with its replies expanded.
pub fn build_forest(flat: &[Comment], names: &NameMaps) -> Vec<CommentView> {
    let index = build_children_index(flat);
    roots_newest_first(flat)
        .into_iter()
        .map(|root| to_view_recursive(root, &index, names))
        .collect()
}

/// Tree rooted at `root_id`, or `None` when it is not part of `flat`.
pub fn build_subtree(flat: &[Comment], root_id: &str, names: &NameMaps) -> Option<CommentView> {
    let root = flat.iter().find(|c| c.id == root_id)?;
    let index = build_children_index(flat);
    Some(to_view_recursive(root, &index, names))
}

pub fn roots_newest_first(flat: &[Comment]) -> Vec<&Comment> {
    let mut roots: Vec<&Comment> = flat.iter().filter(|c| c.is_root()).collect();
    roots.sort_by(newest_first);
    roots
}

/// Follows the newest reply from `root` down to the end of the thread.
/// The thread counts as answered when that last comment was written by staff.
pub fn derive_status(root: &Comment, index: &ChildrenIndex<'_>) -> AnswerStatus {
    let mut current = root;
    let mut seen = HashSet::new();
    while seen.insert(current.id.as_str()) {
        match index.get(current.id.as_str()).and_then(|c| c.first()).copied() {
            Some(newest) => current = newest,
            None => break,
        }
    }
    if current.author.is_staff() {
        AnswerStatus::Answered
    } else {
        AnswerStatus::Unanswered
    }
}

/// All replies below `id`, depth first, each descendant listed before its parent.
/// Deleting in this order never leaves a row pointing at a removed parent.
pub fn collect_descendants<'a>(index: &ChildrenIndex<'a>, id: &str) -> Vec<&'a Comment> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(id.to_string());
    collect_into(index, id, &mut out, &mut seen);
    out
}

fn collect_into<'a>(
    index: &ChildrenIndex<'a>,
    id: &str,
    out: &mut Vec<&'a Comment>,
    seen: &mut HashSet<String>,
) {
    let Some(children) = index.get(id) else {
        return;
    };
    for &child in children {
        if !seen.insert(child.id.clone()) {
            continue;
        }
        collect_into(index, &child.id, out, seen);
        out.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn comment(id: &str, parent: Option<&str>, ts: i64, author: Author) -> Comment {
        Comment {
            id: id.to_string(),
            product_id: "T001".to_string(),
            author,
            body: format!("body of {id}"),
            created_at: Utc.timestamp_opt(ts, 0).unwrap(),
            parent_id: parent.map(str::to_string),
        }
    }

    fn customer(id: &str) -> Author {
        Author::Customer(id.to_string())
    }

    fn staff(id: &str) -> Author {
        Author::Staff(id.to_string())
    }

    fn node_count(view: &CommentView) -> usize {
        1 + view.replies.iter().map(node_count).sum::<usize>()
    }

    fn ids(views: &[CommentView]) -> Vec<&str> {
        views.iter().map(|v| v.id.as_str()).collect()
    }

    #[test]
    fn staff_reply_answers_the_root() {
        let flat = vec![
            comment("A", None, 1, customer("KH0001")),
            comment("B", Some("A"), 2, staff("S1")),
        ];

        let forest = build_forest(&flat, &NameMaps::default());
        assert_eq!(ids(&forest), vec!["A"]);
        assert_eq!(ids(&forest[0].replies), vec!["B"]);

        let index = build_children_index(&flat);
        assert_eq!(derive_status(&flat[0], &index), AnswerStatus::Answered);
    }

    #[test]
    fn forest_holds_only_roots_newest_first_and_every_node() {
        let flat = vec![
            comment("A", None, 10, customer("KH0001")),
            comment("B", None, 30, customer("KH0002")),
            comment("C", None, 20, customer("KH0003")),
            comment("A1", Some("A"), 11, staff("NV0001")),
            comment("A2", Some("A1"), 12, customer("KH0001")),
            comment("C1", Some("C"), 21, staff("NV0001")),
        ];

        let forest = build_forest(&flat, &NameMaps::default());
        assert_eq!(ids(&forest), vec!["B", "C", "A"]);
        let total: usize = forest.iter().map(node_count).sum();
        assert_eq!(total, flat.len());
        assert_eq!(ids(&forest[2].replies[0].replies), vec!["A2"]);
    }

    #[test]
    fn index_places_each_reply_under_its_parent_only() {
        let flat = vec![
            comment("A", None, 1, customer("KH0001")),
            comment("B", Some("A"), 2, staff("NV0001")),
            comment("C", Some("B"), 3, customer("KH0001")),
            comment("D", Some("A"), 4, customer("KH0002")),
        ];

        let index = build_children_index(&flat);
        assert!(!index.values().flatten().any(|c| c.id == "A"));
        for c in flat.iter().filter(|c| !c.is_root()) {
            let parent = c.parent_id.as_deref().unwrap();
            let holders: Vec<&str> = index
                .iter()
                .filter(|(_, kids)| kids.iter().any(|k| k.id == c.id))
                .map(|(p, _)| *p)
                .collect();
            assert_eq!(holders, vec![parent]);
        }
        // newest first within a parent
        let under_a: Vec<&str> = index["A"].iter().map(|c| c.id.as_str()).collect();
        assert_eq!(under_a, vec!["D", "B"]);
    }

    #[test]
    fn root_without_replies_is_unanswered() {
        let flat = vec![comment("A", None, 1, customer("KH0001"))];
        let index = build_children_index(&flat);
        assert_eq!(derive_status(&flat[0], &index), AnswerStatus::Unanswered);
    }

    #[test]
    fn customer_reply_leaves_root_unanswered() {
        let flat = vec![
            comment("A", None, 1, customer("KH0001")),
            comment("B", Some("A"), 2, customer("KH0002")),
        ];
        let index = build_children_index(&flat);
        assert_eq!(derive_status(&flat[0], &index), AnswerStatus::Unanswered);
    }

    #[test]
    fn status_follows_the_chain_to_its_end() {
        let flat = vec![
            comment("A", None, 1, customer("KH0001")),
            comment("B", Some("A"), 2, staff("NV0001")),
            comment("C", Some("B"), 3, customer("KH0001")),
        ];
        let index = build_children_index(&flat);
        assert_eq!(derive_status(&flat[0], &index), AnswerStatus::Unanswered);
    }

    #[test]
    fn status_picks_the_newest_of_several_replies() {
        let flat = vec![
            comment("A", None, 1, customer("KH0001")),
            comment("old", Some("A"), 2, customer("KH0002")),
            comment("new", Some("A"), 5, staff("NV0001")),
        ];
        let index = build_children_index(&flat);
        assert_eq!(derive_status(&flat[0], &index), AnswerStatus::Answered);
    }

    #[test]
    fn names_fall_back_to_raw_ids() {
        let mut names = NameMaps::default();
        names
            .customers
            .insert("KH0001".to_string(), "Nguyen Van A".to_string());
        let flat = vec![
            comment("A", None, 1, customer("KH0001")),
            comment("B", Some("A"), 2, staff("NV0009")),
        ];

        let tree = build_subtree(&flat, "A", &names).unwrap();
        assert_eq!(tree.author_name, "Nguyen Van A");
        assert_eq!(tree.replies[0].author_name, "NV0009");
    }

    #[test]
    fn subtree_of_unknown_id_is_none() {
        let flat = vec![comment("A", None, 1, customer("KH0001"))];
        assert!(build_subtree(&flat, "missing", &NameMaps::default()).is_none());
    }

    #[test]
    fn subtree_starts_at_a_reply() {
        let flat = vec![
            comment("A", None, 1, customer("KH0001")),
            comment("B", Some("A"), 2, staff("NV0001")),
            comment("C", Some("B"), 3, customer("KH0001")),
        ];
        let tree = build_subtree(&flat, "B", &NameMaps::default()).unwrap();
        assert_eq!(tree.id, "B");
        assert_eq!(ids(&tree.replies), vec!["C"]);
    }

    #[test]
    fn descendants_come_before_their_parents() {
        let flat = vec![
            comment("A", None, 1, customer("KH0001")),
            comment("B", Some("A"), 2, staff("NV0001")),
            comment("C", Some("B"), 3, customer("KH0001")),
            comment("D", Some("A"), 4, customer("KH0002")),
            comment("X", None, 5, customer("KH0003")),
        ];
        let index = build_children_index(&flat);

        let order: Vec<&str> = collect_descendants(&index, "A")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(order, vec!["D", "C", "B"]);
        assert!(collect_descendants(&index, "X").is_empty());
    }

    #[test]
    fn cyclic_parents_do_not_recurse_forever() {
        let flat = vec![
            comment("P", Some("Q"), 1, customer("KH0001")),
            comment("Q", Some("P"), 2, staff("NV0001")),
        ];
        let index = build_children_index(&flat);

        let tree = build_subtree(&flat, "P", &NameMaps::default()).unwrap();
        assert_eq!(node_count(&tree), 3);
        assert_eq!(collect_descendants(&index, "P").len(), 1);
        assert_eq!(derive_status(&flat[0], &index), AnswerStatus::Unanswered);
    }
}
