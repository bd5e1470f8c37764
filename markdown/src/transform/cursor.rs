use crate::parser::Node;

/// Forward cursor over a node sequence with one slot of push-back.
///
/// The section grammar reads one node ahead; when that node belongs to an
/// enclosing section it is handed back with [`push_back`](Self::push_back)
/// and returned again by the next call to [`next`](Iterator::next).
#[derive(Debug)]
pub struct NodeCursor {
    nodes: std::vec::IntoIter<Node>,
    pending: Option<(usize, Node)>,
    taken: usize,
    current: usize,
}

impl NodeCursor {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into_iter(),
            pending: None,
            taken: 0,
            current: 0,
        }
    }

    /// Index of the node most recently returned.
    pub fn index(&self) -> usize {
        self.current
    }

    /// Returns `node` to the cursor.
    ///
    /// # Panics
    ///
    /// Panics if a node is already pending; the grammar never needs more
    /// than one token of lookahead.
    pub fn push_back(&mut self, node: Node) {
        assert!(
            self.pending.is_none(),
            "push_back called while a node is already pending"
        );
        self.pending = Some((self.current, node));
    }
}

impl Iterator for NodeCursor {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        if let Some((index, node)) = self.pending.take() {
            self.current = index;
            return Some(node);
        }
        let node = self.nodes.next()?;
        self.current = self.taken;
        self.taken += 1;
        Some(node)
    }
}
