// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Conditional directive state management.

use crate::core::error::{PreprocessError, PreprocessErrorKind};

/// The directive that most recently shaped a nesting level. `endif` pops
/// the level and is never recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalKind {
    If,
    Elif,
    Else,
}

/// State of one `if`/`elif`/`else` nesting level.
///
/// `ancestors_active` is frozen when the level is pushed and holds for the
/// whole chain: an `elif` in an inactive enclosing context can never turn
/// its body on, no matter what its condition evaluates to.
#[derive(Debug, Clone)]
struct ConditionalBranch {
    emit_now: bool,
    any_branch_matched: bool,
    ancestors_active: bool,
    last_directive: ConditionalKind,
}

/// Stack of nested conditional branch states.
#[derive(Debug, Default)]
pub struct ConditionalStack {
    stack: Vec<ConditionalBranch>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether a line at the current nesting should be emitted.
    pub fn emitting(&self) -> bool {
        match self.stack.last() {
            Some(branch) => branch.emit_now,
            None => true,
        }
    }

    /// Open a new level for `if <condition>`.
    pub fn push_if(&mut self, condition: bool) {
        // The innermost emit flag already folds in every enclosing level.
        let ancestors_active = self.emitting();
        self.stack.push(ConditionalBranch {
            emit_now: condition && ancestors_active,
            any_branch_matched: condition,
            ancestors_active,
            last_directive: ConditionalKind::If,
        });
    }

    /// Handle `elif`. The chain position is validated before `condition`
    /// is invoked, so a structural error wins over an expression error.
    pub fn elif_branch(
        &mut self,
        condition: impl FnOnce() -> Result<bool, PreprocessError>,
    ) -> Result<(), PreprocessError> {
        let Some(top) = self.stack.last_mut() else {
            return Err(PreprocessError::new(
                PreprocessErrorKind::DirectiveSyntax,
                "elif without matching if",
            ));
        };
        if top.last_directive == ConditionalKind::Else {
            return Err(PreprocessError::new(
                PreprocessErrorKind::DirectiveSyntax,
                "elif after else",
            ));
        }
        let curr = condition()?;
        top.emit_now = !top.any_branch_matched && curr && top.ancestors_active;
        top.any_branch_matched |= curr;
        top.last_directive = ConditionalKind::Elif;
        Ok(())
    }

    /// Handle `else`: fires when no earlier branch of the chain matched.
    pub fn else_branch(&mut self) -> Result<(), PreprocessError> {
        let Some(top) = self.stack.last_mut() else {
            return Err(PreprocessError::new(
                PreprocessErrorKind::DirectiveSyntax,
                "else without matching if",
            ));
        };
        if top.last_directive == ConditionalKind::Else {
            return Err(PreprocessError::new(
                PreprocessErrorKind::DirectiveSyntax,
                "else after else",
            ));
        }
        top.emit_now = !top.any_branch_matched && top.ancestors_active;
        top.any_branch_matched = true;
        top.last_directive = ConditionalKind::Else;
        Ok(())
    }

    /// Handle `endif`: pops the current level unconditionally.
    pub fn end_branch(&mut self) -> Result<(), PreprocessError> {
        if self.stack.pop().is_none() {
            return Err(PreprocessError::new(
                PreprocessErrorKind::DirectiveSyntax,
                "endif without matching if",
            ));
        }
        Ok(())
    }
}
