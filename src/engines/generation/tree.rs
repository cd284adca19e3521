//! Arena-backed binary expression trees.
//!
//! A [`DualTree`] stores its nodes in a [`SlotMap`] and addresses them by
//! [`NodeId`]. Nodes only point downwards; a node's parent is recomputed by
//! traversal whenever an operator needs it, so there are no back-references to
//! keep in sync while splicing subtrees.

use crate::engines::evaluation::expression::{apply_binary, apply_unary};
use crate::error::{CoevoError, EvaluationError, Result};
use crate::types::{Bindings, SymbolicExpression};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use slotmap::{new_key_type, SlotMap};
use std::collections::{HashSet, VecDeque};

new_key_type! {
    /// Tree-local identity of a node.
    pub struct NodeId;
}

/// Attempts made by the value-mutating operators before giving up.
pub const MAX_MUTATION_RETRIES: usize = 8;

/// Upper bound accepted by [`DualTree::random`]; 2^depth leaves are allocated.
pub const MAX_RANDOM_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct DualTreeNode {
    pub expression: SymbolicExpression,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl DualTreeNode {
    fn new(expression: SymbolicExpression) -> Self {
        Self {
            expression,
            left: None,
            right: None,
        }
    }

    pub fn child_count(&self) -> usize {
        self.left.is_some() as usize + self.right.is_some() as usize
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        self.left.into_iter().chain(self.right)
    }
}

#[derive(Debug, Default)]
pub struct DualTree {
    nodes: SlotMap<NodeId, DualTreeNode>,
    root: Option<NodeId>,
}

impl Clone for DualTree {
    /// Rebuilds the reachable nodes into a fresh arena.
    fn clone(&self) -> Self {
        let mut tree = DualTree::new();
        if let Some(root) = self.root {
            let copied = tree.graft(self, root);
            tree.root = Some(copied);
        }
        tree
    }
}

impl DualTree {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
        }
    }

    /// Tree made of a single terminal.
    pub fn leaf(expression: SymbolicExpression) -> Self {
        let mut tree = Self::new();
        let id = tree.nodes.insert(DualTreeNode::new(expression));
        tree.root = Some(id);
        tree
    }

    /// Weaves a flat terminal/non-terminal sequence into a balanced tree.
    ///
    /// Terminals seed a queue of subtrees. Each non-terminal, in order, pops
    /// `arity` subtrees from the front of the queue and pushes the combined
    /// subtree to the back, so `2^d` terminals and `2^d - 1` binary operators
    /// produce a full tree of depth `d`. Exactly one subtree must remain.
    pub fn from_sequence(
        terminals: &[SymbolicExpression],
        non_terminals: &[SymbolicExpression],
    ) -> Result<Self> {
        if terminals.is_empty() {
            return Err(CoevoError::InvalidShape(
                "cannot weave a tree without terminals".to_string(),
            ));
        }

        let mut tree = Self::new();
        let mut queue = VecDeque::with_capacity(terminals.len());

        for terminal in terminals {
            if !terminal.is_terminal() || !terminal.is_well_formed() {
                return Err(CoevoError::InvalidShape(format!(
                    "'{}' is not a terminal",
                    terminal.value
                )));
            }
            queue.push_back(tree.nodes.insert(DualTreeNode::new(terminal.clone())));
        }

        for operator in non_terminals {
            if operator.is_terminal() || !operator.is_well_formed() {
                return Err(CoevoError::InvalidShape(format!(
                    "'{}' is not a non-terminal with arity 1 or 2",
                    operator.value
                )));
            }

            let mut node = DualTreeNode::new(operator.clone());
            node.left = queue.pop_front();
            if operator.arity == 2 {
                node.right = queue.pop_front();
            }
            if node.child_count() != operator.arity as usize {
                return Err(CoevoError::InvalidShape(format!(
                    "not enough operands for '{}'",
                    operator.value
                )));
            }
            queue.push_back(tree.nodes.insert(node));
        }

        if queue.len() != 1 {
            return Err(CoevoError::InvalidShape(format!(
                "sequence left {} disconnected subtrees",
                queue.len()
            )));
        }

        tree.root = queue.pop_front();
        Ok(tree)
    }

    /// Random tree of the requested depth.
    ///
    /// Depth 0 is a single terminal and depth 1 a non-terminal over `arity`
    /// terminals. Deeper trees are full and balanced, so they only draw binary
    /// operators from the pool: `2^depth` terminals and `2^depth - 1`
    /// non-terminals, sampled uniformly with replacement.
    pub fn random<R: Rng + ?Sized>(
        depth: usize,
        terminals: &[SymbolicExpression],
        non_terminals: &[SymbolicExpression],
        rng: &mut R,
    ) -> Result<Self> {
        if terminals.is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "terminal pool is empty".to_string(),
            ));
        }
        if depth > MAX_RANDOM_DEPTH {
            return Err(CoevoError::InvalidConfiguration(format!(
                "random tree depth {} exceeds maximum {}",
                depth, MAX_RANDOM_DEPTH
            )));
        }

        let sample_terminals = |count: usize, rng: &mut R| -> Vec<SymbolicExpression> {
            (0..count)
                .filter_map(|_| terminals.choose(rng).cloned())
                .collect()
        };

        if depth == 0 {
            return Self::from_sequence(&sample_terminals(1, rng), &[]);
        }

        if non_terminals.is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "non-terminal pool is empty".to_string(),
            ));
        }

        if depth == 1 {
            let operator = non_terminals
                .choose(rng)
                .cloned()
                .ok_or_else(|| {
                    CoevoError::InvalidConfiguration("non-terminal pool is empty".to_string())
                })?;
            let leaves = sample_terminals(operator.arity as usize, rng);
            return Self::from_sequence(&leaves, &[operator]);
        }

        let binary: Vec<&SymbolicExpression> =
            non_terminals.iter().filter(|e| e.arity == 2).collect();
        if binary.is_empty() {
            return Err(CoevoError::InvalidConfiguration(format!(
                "a depth {} tree needs at least one binary operator",
                depth
            )));
        }

        let leaf_count = 1usize << depth;
        let leaves = sample_terminals(leaf_count, rng);
        let operators: Vec<SymbolicExpression> = (0..leaf_count - 1)
            .filter_map(|_| binary.choose(rng).map(|e| (*e).clone()))
            .collect();

        Self::from_sequence(&leaves, &operators)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&DualTreeNode> {
        self.nodes.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of reachable nodes.
    pub fn size(&self) -> usize {
        self.preorder().len()
    }

    /// Node ids in pre-order (root, left, right).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            order.push(id);
            if let Some(right) = node.right {
                stack.push(right);
            }
            if let Some(left) = node.left {
                stack.push(left);
            }
        }
        order
    }

    /// Terminal (leaf) node ids.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.nodes[*id].expression.is_terminal())
            .collect()
    }

    /// Non-terminal node ids.
    pub fn branches(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| !self.nodes[*id].expression.is_terminal())
            .collect()
    }

    pub fn terminal_count(&self) -> usize {
        self.leaves().len()
    }

    pub fn non_terminal_count(&self) -> usize {
        self.branches().len()
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> Result<usize> {
        let root = self.root.ok_or(CoevoError::EmptyTree)?;
        let mut deepest = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children().map(|child| (child, depth + 1)));
            }
        }
        Ok(deepest)
    }

    /// Depth of a given node, or `None` if it is not reachable from the root.
    pub fn depth_at(&self, target: NodeId) -> Option<usize> {
        let root = self.root?;
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            if id == target {
                return Some(depth);
            }
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children().map(|child| (child, depth + 1)));
            }
        }
        None
    }

    /// All nodes sitting exactly `depth` edges below the root.
    pub fn nodes_at_depth(&self, depth: usize) -> Vec<NodeId> {
        let mut level: Vec<NodeId> = self.root.into_iter().collect();
        for _ in 0..depth {
            level = level
                .iter()
                .filter_map(|id| self.nodes.get(*id))
                .flat_map(|node| node.children())
                .collect();
            if level.is_empty() {
                break;
            }
        }
        level
    }

    /// Parent of `target`, recomputed by traversal.
    pub fn parent_of(&self, target: NodeId) -> Option<NodeId> {
        self.preorder().into_iter().find(|id| {
            let node = &self.nodes[*id];
            node.left == Some(target) || node.right == Some(target)
        })
    }

    /// Checks every arity invariant reachable from the root.
    pub fn validate(&self) -> Result<()> {
        let root = self.root.ok_or(CoevoError::EmptyTree)?;
        let mut visited = HashSet::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                return Err(CoevoError::InvalidShape(
                    "node reachable through more than one path".to_string(),
                ));
            }
            let node = self.nodes.get(id).ok_or_else(|| {
                CoevoError::InvalidShape("dangling child reference".to_string())
            })?;
            let expression = &node.expression;

            if !expression.is_well_formed() {
                return Err(CoevoError::InvalidShape(format!(
                    "'{}' has arity {} which does not fit its kind",
                    expression.value, expression.arity
                )));
            }
            if node.child_count() != expression.arity as usize {
                return Err(CoevoError::InvalidShape(format!(
                    "'{}' expects {} children, has {}",
                    expression.value,
                    expression.arity,
                    node.child_count()
                )));
            }
            if expression.arity == 1 && node.left.is_none() {
                return Err(CoevoError::InvalidShape(format!(
                    "unary '{}' must hold its operand on the left",
                    expression.value
                )));
            }
            stack.extend(node.children());
        }

        Ok(())
    }

    /// Fully parenthesized infix rendering, produced by in-order traversal.
    /// Unary nodes are wrapped too, so `-` keeps its operand under `^`.
    pub fn to_mathematical_string(&self) -> Result<String> {
        let root = self.root.ok_or(CoevoError::EmptyTree)?;
        self.render(root)
    }

    fn render(&self, id: NodeId) -> Result<String> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| CoevoError::InvalidShape("dangling child reference".to_string()))?;
        let expression = &node.expression;

        if node.child_count() != expression.arity as usize {
            return Err(CoevoError::InvalidShape(format!(
                "'{}' expects {} children, has {}",
                expression.value,
                expression.arity,
                node.child_count()
            )));
        }

        match (node.left, node.right) {
            (None, None) => {
                if expression.value.starts_with('-') {
                    Ok(format!("({})", expression.value))
                } else {
                    Ok(expression.value.clone())
                }
            }
            (Some(operand), None) => {
                Ok(format!("({}({}))", expression.value, self.render(operand)?))
            }
            (Some(left), Some(right)) => Ok(format!(
                "({}{}{})",
                self.render(left)?,
                expression.value,
                self.render(right)?
            )),
            (None, Some(_)) => Err(CoevoError::InvalidShape(format!(
                "'{}' has a right child but no left child",
                expression.value
            ))),
        }
    }

    /// Evaluates the tree directly, without going through a string.
    pub fn evaluate(&self, bindings: &Bindings) -> Result<f64> {
        let root = self.root.ok_or(CoevoError::EmptyTree)?;
        self.evaluate_node(root, bindings)
    }

    fn evaluate_node(&self, id: NodeId, bindings: &Bindings) -> Result<f64> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| CoevoError::InvalidShape("dangling child reference".to_string()))?;
        let value = &node.expression.value;

        match (node.left, node.right) {
            (None, None) => {
                if let Some(constant) = node.expression.constant_value() {
                    return Ok(constant);
                }
                bindings
                    .get(value)
                    .copied()
                    .ok_or_else(|| EvaluationError::UnknownSymbol(value.clone()).into())
            }
            (Some(operand), None) => {
                let operand = self.evaluate_node(operand, bindings)?;
                Ok(apply_unary(value, operand)?)
            }
            (Some(left), Some(right)) => {
                let lhs = self.evaluate_node(left, bindings)?;
                let rhs = self.evaluate_node(right, bindings)?;
                Ok(apply_binary(value, lhs, rhs)?)
            }
            (None, Some(_)) => Err(CoevoError::InvalidShape(format!(
                "'{}' has a right child but no left child",
                value
            ))),
        }
    }

    /// Replaces the value of a random leaf with a different terminal from `pool`.
    ///
    /// Returns `false` when every retry drew the current value again.
    pub fn mutate_terminal<R: Rng + ?Sized>(
        &mut self,
        pool: &[SymbolicExpression],
        rng: &mut R,
    ) -> Result<bool> {
        let candidates: Vec<&SymbolicExpression> =
            pool.iter().filter(|e| e.is_terminal()).collect();
        if candidates.is_empty() {
            return Err(CoevoError::InvalidConfiguration(
                "terminal pool is empty".to_string(),
            ));
        }
        let target = *self.leaves().choose(rng).ok_or(CoevoError::EmptyTree)?;
        self.substitute(target, &candidates, rng)
    }

    /// Replaces a random operator with a different one of the same arity.
    pub fn mutate_non_terminal<R: Rng + ?Sized>(
        &mut self,
        pool: &[SymbolicExpression],
        rng: &mut R,
    ) -> Result<bool> {
        if self.is_empty() {
            return Err(CoevoError::EmptyTree);
        }
        let Some(&target) = self.branches().choose(rng) else {
            debug!("mutate_non_terminal: tree has no operators");
            return Ok(false);
        };
        let arity = self.nodes[target].expression.arity;
        let candidates: Vec<&SymbolicExpression> = pool
            .iter()
            .filter(|e| !e.is_terminal() && e.arity == arity)
            .collect();
        if candidates.is_empty() {
            debug!("mutate_non_terminal: no arity-{} operator in pool", arity);
            return Ok(false);
        }
        self.substitute(target, &candidates, rng)
    }

    fn substitute<R: Rng + ?Sized>(
        &mut self,
        target: NodeId,
        candidates: &[&SymbolicExpression],
        rng: &mut R,
    ) -> Result<bool> {
        let current = self.nodes[target].expression.value.clone();
        for _ in 0..MAX_MUTATION_RETRIES {
            let Some(candidate) = candidates.choose(rng) else {
                break;
            };
            if candidate.value != current {
                self.nodes[target].expression = (*candidate).clone();
                return Ok(true);
            }
        }
        debug!("mutation retries exhausted on '{}'", current);
        Ok(false)
    }

    /// Sets a random leaf to `0`.
    pub fn delete_terminal<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let target = *self.leaves().choose(rng).ok_or(CoevoError::EmptyTree)?;
        self.collapse(target);
        Ok(())
    }

    /// Collapses a random non-root operator's subtree to `0`.
    ///
    /// Trees shallower than 2 only have the root as an operator, so a leaf is
    /// zeroed in place instead of emptying the tree.
    pub fn delete_non_terminal<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        if self.depth()? < 2 {
            return self.delete_terminal(rng);
        }
        let root = self.root;
        let candidates: Vec<NodeId> = self
            .branches()
            .into_iter()
            .filter(|id| Some(*id) != root)
            .collect();
        let target = *candidates.choose(rng).ok_or(CoevoError::EmptyTree)?;
        self.collapse(target);
        Ok(())
    }

    /// Collapses any node, the root included, to `0`.
    pub fn delete_malicious<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let target = *self.preorder().choose(rng).ok_or(CoevoError::EmptyTree)?;
        self.collapse(target);
        Ok(())
    }

    /// Reduces the whole tree to `0`.
    pub fn fell_tree(&mut self) {
        *self = Self::leaf(SymbolicExpression::zero());
    }

    /// Splices a copy of `donor` over a random operator's subtree.
    pub fn replace_branch<R: Rng + ?Sized>(
        &mut self,
        donor: &DualTree,
        rng: &mut R,
    ) -> Result<bool> {
        if self.is_empty() {
            return Err(CoevoError::EmptyTree);
        }
        let Some(&target) = self.branches().choose(rng) else {
            debug!("replace_branch: tree has no operators");
            return Ok(false);
        };
        self.replace_subtree(target, donor)?;
        Ok(true)
    }

    /// Replaces a random leaf with a copy of `donor`.
    pub fn add_to_leaf<R: Rng + ?Sized>(&mut self, donor: &DualTree, rng: &mut R) -> Result<()> {
        let target = *self.leaves().choose(rng).ok_or(CoevoError::EmptyTree)?;
        self.replace_subtree(target, donor)
    }

    /// Replaces a random leaf `l` with `(l + donor)`.
    ///
    /// On a tree that is a lone terminal this wraps the root in a new `+`, so
    /// the result always stays evaluable.
    pub fn add_sub_tree<R: Rng + ?Sized>(&mut self, donor: &DualTree, rng: &mut R) -> Result<()> {
        let donor_root = donor.root.ok_or(CoevoError::EmptyTree)?;
        let target = *self.leaves().choose(rng).ok_or(CoevoError::EmptyTree)?;
        let parent = self.parent_of(target);

        let grafted = self.graft(donor, donor_root);
        let mut plus = DualTreeNode::new(SymbolicExpression::non_terminal("+", 2));
        plus.left = Some(target);
        plus.right = Some(grafted);
        let plus = self.nodes.insert(plus);

        match parent {
            Some(parent) => {
                let node = &mut self.nodes[parent];
                if node.left == Some(target) {
                    node.left = Some(plus);
                } else {
                    node.right = Some(plus);
                }
            }
            None => self.root = Some(plus),
        }
        Ok(())
    }

    /// Copy of the subtree rooted at `id`.
    pub fn subtree(&self, id: NodeId) -> Result<DualTree> {
        if !self.nodes.contains_key(id) {
            return Err(CoevoError::InvalidShape("unknown node".to_string()));
        }
        let mut tree = DualTree::new();
        let copied = tree.graft(self, id);
        tree.root = Some(copied);
        Ok(tree)
    }

    /// Overwrites the subtree at `target` with a copy of `donor`. `target`
    /// keeps its id, so the parent's link stays valid.
    pub fn replace_subtree(&mut self, target: NodeId, donor: &DualTree) -> Result<()> {
        let donor_root = donor.root.ok_or(CoevoError::EmptyTree)?;
        if !self.nodes.contains_key(target) {
            return Err(CoevoError::InvalidShape("unknown node".to_string()));
        }

        self.remove_descendants(target);
        let grafted = self.graft(donor, donor_root);
        let replacement = self
            .nodes
            .remove(grafted)
            .ok_or_else(|| CoevoError::InvalidShape("graft failed".to_string()))?;
        self.nodes[target] = replacement;
        Ok(())
    }

    /// Exchanges two subtrees between trees.
    pub fn swap_subtrees(
        first: &mut DualTree,
        first_node: NodeId,
        second: &mut DualTree,
        second_node: NodeId,
    ) -> Result<()> {
        let from_first = first.subtree(first_node)?;
        let from_second = second.subtree(second_node)?;
        first.replace_subtree(first_node, &from_second)?;
        second.replace_subtree(second_node, &from_first)
    }

    fn collapse(&mut self, target: NodeId) {
        self.remove_descendants(target);
        self.nodes[target] = DualTreeNode::new(SymbolicExpression::zero());
    }

    fn remove_descendants(&mut self, id: NodeId) {
        let mut stack: Vec<NodeId> = match self.nodes.get(id) {
            Some(node) => node.children().collect(),
            None => return,
        };
        while let Some(child) = stack.pop() {
            if let Some(node) = self.nodes.remove(child) {
                stack.extend(node.children());
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.left = None;
            node.right = None;
        }
    }

    /// Copies `source`'s subtree at `from` into this arena and returns its new id.
    fn graft(&mut self, source: &DualTree, from: NodeId) -> NodeId {
        let node = &source.nodes[from];
        let left = node.left.map(|child| self.graft(source, child));
        let right = node.right.map(|child| self.graft(source, child));
        self.nodes.insert(DualTreeNode {
            expression: node.expression.clone(),
            left,
            right,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::expression::{ArithmeticEvaluator, Evaluator};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn terminals() -> Vec<SymbolicExpression> {
        vec![
            SymbolicExpression::terminal("x"),
            SymbolicExpression::terminal("1"),
            SymbolicExpression::terminal("2"),
        ]
    }

    fn non_terminals() -> Vec<SymbolicExpression> {
        vec![
            SymbolicExpression::non_terminal("+", 2),
            SymbolicExpression::non_terminal("*", 2),
            SymbolicExpression::non_terminal("-", 2),
        ]
    }

    fn x_plus_one() -> DualTree {
        DualTree::from_sequence(
            &[
                SymbolicExpression::terminal("x"),
                SymbolicExpression::terminal("1"),
            ],
            &[SymbolicExpression::non_terminal("+", 2)],
        )
        .unwrap()
    }

    #[test]
    fn test_weave_balanced_sequence() {
        let tree = DualTree::from_sequence(
            &[
                SymbolicExpression::terminal("x"),
                SymbolicExpression::terminal("1"),
                SymbolicExpression::terminal("2"),
                SymbolicExpression::terminal("3"),
            ],
            &[
                SymbolicExpression::non_terminal("+", 2),
                SymbolicExpression::non_terminal("-", 2),
                SymbolicExpression::non_terminal("*", 2),
            ],
        )
        .unwrap();

        assert_eq!(tree.depth().unwrap(), 2);
        assert_eq!(tree.to_mathematical_string().unwrap(), "((x+1)*(2-3))");
    }

    #[test]
    fn test_weave_rejects_leftover_operands() {
        let result = DualTree::from_sequence(
            &[
                SymbolicExpression::terminal("x"),
                SymbolicExpression::terminal("1"),
            ],
            &[],
        );
        assert!(matches!(result, Err(CoevoError::InvalidShape(_))));
    }

    #[test]
    fn test_unary_rendering() {
        let tree = DualTree::from_sequence(
            &[SymbolicExpression::terminal("x")],
            &[SymbolicExpression::non_terminal("sin", 1)],
        )
        .unwrap();
        assert_eq!(tree.to_mathematical_string().unwrap(), "(sin(x))");
        assert_eq!(tree.depth().unwrap(), 1);
    }

    #[test]
    fn test_unary_minus_under_power_keeps_its_operand() {
        let tree = DualTree::from_sequence(
            &[
                SymbolicExpression::terminal("2"),
                SymbolicExpression::terminal("1"),
                SymbolicExpression::terminal("1"),
            ],
            &[
                SymbolicExpression::non_terminal("-", 1),
                SymbolicExpression::non_terminal("+", 2),
                SymbolicExpression::non_terminal("^", 2),
            ],
        )
        .unwrap();

        let rendered = tree.to_mathematical_string().unwrap();
        assert_eq!(rendered, "((-(2))^(1+1))");
        assert_eq!(tree.evaluate(&Bindings::new()).unwrap(), 4.0);
        assert_eq!(
            ArithmeticEvaluator::new()
                .evaluate(&rendered, &Bindings::new())
                .unwrap(),
            4.0
        );
    }

    #[test]
    fn test_non_finite_spellings_are_not_constants() {
        let evaluator = ArithmeticEvaluator::new();
        for spelling in ["inf", "NaN", "infinity"] {
            let expression = SymbolicExpression::terminal(spelling);
            assert!(!expression.is_constant());

            let tree = DualTree::leaf(expression);
            let rendered = tree.to_mathematical_string().unwrap();
            assert!(matches!(
                tree.evaluate(&Bindings::new()),
                Err(CoevoError::Evaluation(EvaluationError::UnknownSymbol(_)))
            ));
            assert_eq!(
                evaluator.evaluate(&rendered, &Bindings::new()),
                Err(EvaluationError::UnknownSymbol(spelling.to_string()))
            );
        }
        assert!(SymbolicExpression::terminal("2.5").is_constant());
    }

    #[test]
    fn test_negative_constant_is_parenthesized() {
        let tree = DualTree::from_sequence(
            &[
                SymbolicExpression::terminal("4"),
                SymbolicExpression::terminal("-9"),
            ],
            &[SymbolicExpression::non_terminal("-", 2)],
        )
        .unwrap();
        assert_eq!(tree.to_mathematical_string().unwrap(), "(4-(-9))");
        assert_eq!(tree.evaluate(&Bindings::new()).unwrap(), 13.0);
    }

    #[test]
    fn test_random_special_depths() {
        let mut rng = StdRng::seed_from_u64(7);
        let leaf = DualTree::random(0, &terminals(), &non_terminals(), &mut rng).unwrap();
        assert_eq!(leaf.size(), 1);
        assert_eq!(leaf.depth().unwrap(), 0);

        let pair = DualTree::random(1, &terminals(), &non_terminals(), &mut rng).unwrap();
        assert_eq!(pair.depth().unwrap(), 1);
        assert_eq!(pair.terminal_count(), 2);
        assert_eq!(pair.non_terminal_count(), 1);
    }

    #[test]
    fn test_random_requires_pools() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            DualTree::random(2, &[], &non_terminals(), &mut rng),
            Err(CoevoError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            DualTree::random(2, &terminals(), &[], &mut rng),
            Err(CoevoError::InvalidConfiguration(_))
        ));
        assert!(DualTree::random(0, &terminals(), &[], &mut rng).is_ok());
    }

    #[test]
    fn test_validate_reports_arity_violation() {
        let mut tree = x_plus_one();
        let root = tree.root().unwrap();
        tree.nodes[root].right = None;

        match tree.validate() {
            Err(CoevoError::InvalidShape(message)) => assert!(message.contains('+')),
            other => panic!("expected InvalidShape, got {:?}", other),
        }
        assert!(matches!(
            tree.to_mathematical_string(),
            Err(CoevoError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_empty_tree_queries() {
        let tree = DualTree::new();
        assert!(matches!(tree.depth(), Err(CoevoError::EmptyTree)));
        assert!(matches!(tree.validate(), Err(CoevoError::EmptyTree)));
        assert!(tree.nodes_at_depth(0).is_empty());
    }

    #[test]
    fn test_depth_queries() {
        let mut rng = StdRng::seed_from_u64(11);
        let tree = DualTree::random(3, &terminals(), &non_terminals(), &mut rng).unwrap();
        assert_eq!(tree.nodes_at_depth(0).len(), 1);
        assert_eq!(tree.nodes_at_depth(2).len(), 4);
        assert_eq!(tree.nodes_at_depth(3).len(), 8);
        assert!(tree.nodes_at_depth(4).is_empty());

        for id in tree.nodes_at_depth(2) {
            assert_eq!(tree.depth_at(id), Some(2));
        }
    }

    #[test]
    fn test_mutate_terminal_changes_value() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut tree = DualTree::leaf(SymbolicExpression::terminal("x"));
        let changed = tree.mutate_terminal(&terminals(), &mut rng).unwrap();
        assert!(changed);
        assert_ne!(tree.to_mathematical_string().unwrap(), "x");
    }

    #[test]
    fn test_mutate_terminal_single_value_pool_is_noop() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut tree = DualTree::leaf(SymbolicExpression::terminal("x"));
        let changed = tree
            .mutate_terminal(&[SymbolicExpression::terminal("x")], &mut rng)
            .unwrap();
        assert!(!changed);
        assert_eq!(tree.to_mathematical_string().unwrap(), "x");
    }

    #[test]
    fn test_mutate_non_terminal_keeps_arity() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut tree = x_plus_one();
        let pool = vec![
            SymbolicExpression::non_terminal("+", 2),
            SymbolicExpression::non_terminal("sin", 1),
        ];
        // the only alternative has the wrong arity
        assert!(!tree.mutate_non_terminal(&pool, &mut rng).unwrap());
        tree.validate().unwrap();

        assert!(tree.mutate_non_terminal(&non_terminals(), &mut rng).unwrap());
        tree.validate().unwrap();
    }

    #[test]
    fn test_safe_deletion_on_shallow_tree() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut tree = x_plus_one();
        tree.delete_non_terminal(&mut rng).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.non_terminal_count(), 1);
        assert!(tree.to_mathematical_string().unwrap().contains('0'));
    }

    #[test]
    fn test_delete_non_terminal_spares_root() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut tree = DualTree::random(3, &terminals(), &non_terminals(), &mut rng).unwrap();
        tree.delete_non_terminal(&mut rng).unwrap();
        tree.validate().unwrap();
        assert!(!tree.nodes[tree.root().unwrap()].expression.is_terminal());
        assert!(tree.size() < 15);
    }

    #[test]
    fn test_fell_tree() {
        let mut tree = x_plus_one();
        tree.fell_tree();
        assert_eq!(tree.to_mathematical_string().unwrap(), "0");
    }

    #[test]
    fn test_add_sub_tree_wraps_lone_terminal() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tree = DualTree::leaf(SymbolicExpression::terminal("x"));
        tree.add_sub_tree(&x_plus_one(), &mut rng).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.to_mathematical_string().unwrap(), "(x+(x+1))");
    }

    #[test]
    fn test_replace_branch_and_add_to_leaf() {
        let mut rng = StdRng::seed_from_u64(2);
        let donor = DualTree::leaf(SymbolicExpression::terminal("2"));

        let mut tree = x_plus_one();
        assert!(tree.replace_branch(&donor, &mut rng).unwrap());
        assert_eq!(tree.to_mathematical_string().unwrap(), "2");

        let mut tree = x_plus_one();
        tree.add_to_leaf(&x_plus_one(), &mut rng).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.depth().unwrap(), 2);

        let mut lone = DualTree::leaf(SymbolicExpression::terminal("x"));
        assert!(!lone.replace_branch(&donor, &mut rng).unwrap());
    }

    #[test]
    fn test_swap_subtrees() {
        let mut first = x_plus_one();
        let mut second = DualTree::leaf(SymbolicExpression::terminal("2"));
        let first_root = first.root().unwrap();
        let second_root = second.root().unwrap();

        DualTree::swap_subtrees(&mut first, first_root, &mut second, second_root).unwrap();
        assert_eq!(first.to_mathematical_string().unwrap(), "2");
        assert_eq!(second.to_mathematical_string().unwrap(), "(x+1)");
    }

    #[test]
    fn test_operators_release_removed_nodes() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut tree = DualTree::random(3, &terminals(), &non_terminals(), &mut rng).unwrap();
        tree.delete_malicious(&mut rng).unwrap();
        assert_eq!(tree.nodes.len(), tree.size());
    }
}
