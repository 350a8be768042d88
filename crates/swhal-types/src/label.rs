//! MPLS label types.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-bit MPLS label value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(u32);

impl Label {
    /// The maximum encodable label value.
    pub const MAX: u32 = (1 << 20) - 1;

    /// Creates a label, validating the 20-bit range.
    pub fn new(value: u32) -> Result<Self, ParseError> {
        if value > Self::MAX {
            return Err(ParseError::InvalidLabel(value));
        }
        Ok(Label(value))
    }

    /// Returns the raw label value.
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Label {
    type Error = ParseError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Label::new(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered stack of MPLS labels, top of stack first.
pub type LabelStack = Vec<Label>;

/// The label operation a next-hop applies to forwarded traffic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelAction {
    /// Swap the incoming top label for the given label.
    Swap(Label),
    /// Push the given stack onto the packet.
    Push(LabelStack),
}

impl LabelAction {
    /// Validates the action. A push with an empty stack is a caller mistake.
    pub fn validate(&self) -> Result<(), ParseError> {
        match self {
            LabelAction::Swap(_) => Ok(()),
            LabelAction::Push(stack) => {
                if stack.is_empty() {
                    Err(ParseError::EmptyLabelStack)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Returns the label the egress entry carries: the swap label, or the
    /// bottom-most label of a pushed stack.
    pub fn egress_label(&self) -> Option<Label> {
        match self {
            LabelAction::Swap(label) => Some(*label),
            LabelAction::Push(stack) => stack.last().copied(),
        }
    }
}

impl fmt::Display for LabelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelAction::Swap(label) => write!(f, "swap:{}", label),
            LabelAction::Push(stack) => {
                let labels: Vec<_> = stack.iter().map(Label::to_string).collect();
                write!(f, "push:{}", labels.join("/"))
            }
        }
    }
}
