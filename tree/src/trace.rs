//! Step log of tree operations.
//!
//! Every public operation opens an [`OperationTrace`], pushes [`Step`]s while
//! it works and closes the trace with its outcome. Closed traces are kept in a
//! [`History`]. Recording is advisory: nothing in the tree reads it back.

use core::fmt;
use std::cmp::Ordering;
use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::red_black_tree::{Color, Side};
use crate::{Key, TreeError};

const SEPARATOR: &str = "────────────────────";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Delete,
    Search,
    Bfs,
    Dfs,
    Clear,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Search => "search",
            Self::Bfs => "BFS",
            Self::Dfs => "DFS",
            Self::Clear => "clear",
        })
    }
}

/// Insert fixup cases, named after the shape around the red-red violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertCase {
    /// Uncle is red: push the blackness of the grandparent down one level.
    RedUncle,
    /// Uncle is black and the node is an inner grandchild.
    Triangle,
    /// Uncle is black and the node is an outer grandchild.
    Line,
}

impl fmt::Display for InsertCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RedUncle => "case A, uncle is RED",
            Self::Triangle => "case B, uncle is BLACK and node is an inner grandchild",
            Self::Line => "case C, uncle is BLACK and node is an outer grandchild",
        })
    }
}

/// Delete fixup cases. Nephews are the children of the double black's sibling,
/// the near one being on the same side as the double black.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteCase {
    RedSibling,
    BlackNephews,
    NearNephewRed,
    FarNephewRed,
}

impl fmt::Display for DeleteCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RedSibling => "case 1, sibling is RED",
            Self::BlackNephews => "case 2, sibling and both its children are BLACK",
            Self::NearNephewRed => "case 3, sibling's near child is RED and far child is BLACK",
            Self::FarNephewRed => "case 4, sibling's far child is RED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Compare {
        key: Key,
        node: Key,
        ordering: Ordering,
    },
    CreateRed {
        key: Key,
    },
    AttachRoot {
        key: Key,
    },
    Attach {
        key: Key,
        parent: Key,
        side: Side,
    },
    InsertFixup {
        case: InsertCase,
        node: Key,
    },
    DeleteShape {
        key: Key,
        children: usize,
    },
    Successor {
        of: Key,
        successor: Key,
    },
    CopyKey {
        from: Key,
        into: Key,
    },
    Splice {
        removed: Key,
        replacement: Option<Key>,
    },
    DoubleBlack {
        at: Option<Key>,
        parent: Option<Key>,
    },
    DeleteFixup {
        case: DeleteCase,
        parent: Key,
    },
    Recolor {
        key: Key,
        from: Color,
        to: Color,
    },
    Rotate {
        side: Side,
        pivot: Key,
    },
    Enqueue {
        key: Key,
    },
    Visit {
        key: Key,
    },
    Descend {
        from: Key,
        side: Side,
    },
    Cleared {
        removed: usize,
    },
}

struct OrNil(Option<Key>);

impl fmt::Display for OrNil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(key) => write!(f, "{key}"),
            None => f.write_str("NIL"),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Compare {
                key,
                node,
                ordering,
            } => match ordering {
                Ordering::Less => write!(f, "{key} < {node}, go left"),
                Ordering::Equal => write!(f, "{key} = {node}, found"),
                Ordering::Greater => write!(f, "{key} > {node}, go right"),
            },
            Self::CreateRed { key } => write!(f, "create RED node {key}"),
            Self::AttachRoot { key } => write!(f, "tree is empty, {key} becomes the root"),
            Self::Attach { key, parent, side } => {
                write!(f, "attach {key} as the {side} child of {parent}")
            }
            Self::InsertFixup { case, node } => write!(f, "fix red-red at {node}: {case}"),
            Self::DeleteShape { key, children } => match children {
                0 => write!(f, "{key} is a leaf"),
                1 => write!(f, "{key} has one child"),
                _ => write!(f, "{key} has two children"),
            },
            Self::Successor { of, successor } => {
                write!(f, "in-order successor of {of} is {successor}")
            }
            Self::CopyKey { from, into } => write!(f, "copy key {from} into node {into}"),
            Self::Splice {
                removed,
                replacement,
            } => write!(
                f,
                "splice out {removed}, {} takes its place",
                OrNil(replacement)
            ),
            Self::DoubleBlack { at, parent } => write!(
                f,
                "removed a BLACK node, double black at {} under {}",
                OrNil(at),
                OrNil(parent)
            ),
            Self::DeleteFixup { case, parent } => {
                write!(f, "fix double black under {parent}: {case}")
            }
            Self::Recolor { key, from, to } => write!(f, "recolor {key} {from} -> {to}"),
            Self::Rotate { side, pivot } => write!(f, "rotate {side} at {pivot}"),
            Self::Enqueue { key } => write!(f, "enqueue {key}"),
            Self::Visit { key } => write!(f, "visit {key}"),
            Self::Descend { from, side } => write!(f, "descend into the {side} subtree of {from}"),
            Self::Cleared { removed } => write!(f, "removed {removed} nodes"),
        }
    }
}

/// Everything one public operation did, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTrace {
    pub operation: Operation,
    pub key: Option<Key>,
    pub steps: Vec<Step>,
    pub outcome: Result<(), TreeError>,
}

impl OperationTrace {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn rotations(&self) -> impl Iterator<Item = (Side, Key)> + '_ {
        self.steps.iter().filter_map(|step| match *step {
            Step::Rotate { side, pivot } => Some((side, pivot)),
            _ => None,
        })
    }
}

impl fmt::Display for OperationTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            Some(key) => writeln!(f, "{} {key}", self.operation)?,
            None => writeln!(f, "{}", self.operation)?,
        }
        for step in &self.steps {
            writeln!(f, "  {step}")?;
        }
        match &self.outcome {
            Ok(()) => writeln!(f, "  done")?,
            Err(e) => writeln!(f, "  failed: {e}")?,
        }
        writeln!(f, "{SEPARATOR}")
    }
}

/// Closed operation traces, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    traces: VecDeque<OperationTrace>,
    limit: Option<usize>,
}

impl History {
    fn with_limit(limit: Option<usize>) -> Self {
        Self {
            traces: VecDeque::new(),
            limit,
        }
    }

    fn push(&mut self, trace: OperationTrace) {
        if let Some(limit) = self.limit {
            while self.traces.len() >= limit {
                self.traces.pop_front();
            }
        }
        self.traces.push_back(trace);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn last(&self) -> Option<&OperationTrace> {
        self.traces.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationTrace> + '_ {
        self.traces.iter()
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for trace in &self.traces {
            write!(f, "{trace}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Recorder {
    record_steps: bool,
    current: Option<OperationTrace>,
    history: History,
}

impl Recorder {
    pub(crate) fn new(config: &EngineConfig) -> Self {
        Self {
            record_steps: config.record_steps,
            current: None,
            history: History::with_limit(config.history_limit),
        }
    }

    pub(crate) fn begin(&mut self, operation: Operation, key: Option<Key>) {
        self.current = Some(OperationTrace {
            operation,
            key,
            steps: Vec::new(),
            outcome: Ok(()),
        });
    }

    pub(crate) fn record(&mut self, step: Step) {
        trace!("{step}");
        if !self.record_steps {
            return;
        }
        if let Some(current) = self.current.as_mut() {
            current.steps.push(step);
        }
    }

    pub(crate) fn finish(&mut self, outcome: Result<(), TreeError>) {
        if let Some(mut current) = self.current.take() {
            current.outcome = outcome;
            debug!(
                operation = %current.operation,
                key = ?current.key,
                outcome = ?current.outcome,
                steps = current.steps.len(),
                "operation finished"
            );
            self.history.push(current);
        }
    }

    pub(crate) fn history(&self) -> &History {
        &self.history
    }

    pub(crate) fn clear_history(&mut self) {
        self.history.traces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(record_steps: bool, history_limit: Option<usize>) -> Recorder {
        Recorder::new(&EngineConfig {
            record_steps,
            history_limit,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn step_text() {
        let step = Step::Compare {
            key: 3,
            node: 7,
            ordering: Ordering::Less,
        };
        assert_eq!(step.to_string(), "3 < 7, go left");

        let step = Step::Splice {
            removed: 5,
            replacement: None,
        };
        assert_eq!(step.to_string(), "splice out 5, NIL takes its place");

        let step = Step::Recolor {
            key: 9,
            from: Color::Red,
            to: Color::Black,
        };
        assert_eq!(step.to_string(), "recolor 9 RED -> BLACK");

        let step = Step::Rotate {
            side: Side::Left,
            pivot: 10,
        };
        assert_eq!(step.to_string(), "rotate left at 10");
    }

    #[test]
    fn trace_text() {
        let mut rec = recorder(true, None);
        rec.begin(Operation::Insert, Some(4));
        rec.record(Step::CreateRed { key: 4 });
        rec.record(Step::AttachRoot { key: 4 });
        rec.finish(Ok(()));

        rec.begin(Operation::Search, Some(8));
        rec.finish(Err(TreeError::KeyNotFound(8)));

        let text = rec.history().to_string();
        let expected = format!(
            "insert 4\n  create RED node 4\n  tree is empty, 4 becomes the root\n  done\n{SEPARATOR}\n\
             search 8\n  failed: key 8 not found\n{SEPARATOR}\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn disabled_steps_keep_outcome() {
        let mut rec = recorder(false, None);
        rec.begin(Operation::Delete, Some(1));
        rec.record(Step::DeleteShape {
            key: 1,
            children: 0,
        });
        rec.finish(Err(TreeError::EmptyTree));

        let last = rec.history().last().unwrap();
        assert!(last.steps.is_empty());
        assert_eq!(last.outcome, Err(TreeError::EmptyTree));
    }

    #[test]
    fn bounded_history_drops_oldest() {
        let mut rec = recorder(true, Some(2));
        for key in 0..5 {
            rec.begin(Operation::Insert, Some(key));
            rec.finish(Ok(()));
        }

        let keys: Vec<_> = rec.history().iter().map(|t| t.key).collect();
        assert_eq!(keys, [Some(3), Some(4)]);

        rec.clear_history();
        assert!(rec.history().is_empty());
    }

    #[test]
    fn steps_outside_an_operation_are_dropped() {
        let mut rec = recorder(true, None);
        rec.record(Step::Visit { key: 1 });
        rec.finish(Ok(()));
        assert!(rec.history().is_empty());
    }
}
