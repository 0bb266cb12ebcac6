//! Structural timeline edits.
//!
//! Every operation takes an explicit index selection, validates all of it against the current
//! length, and only then mutates. A failed call leaves the sequence untouched.

use std::ops::Range;

use crate::{
    foundation::error::{GifloomError, GifloomResult},
    sequence::model::{Frame, Sequence, check_duration},
};

/// Upper bound on timeline length for operations that grow it multiplicatively.
pub const MAX_FRAMES: usize = 1 << 20;

impl Sequence {
    /// Sort, de-duplicate and bounds-check a selection.
    pub fn validate_selection(&self, indices: &[usize]) -> GifloomResult<Vec<usize>> {
        if indices.is_empty() {
            return Err(GifloomError::invalid_input("frame selection is empty"));
        }
        let len = self.frames.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(GifloomError::index_out_of_range(bad, len));
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        Ok(sorted)
    }

    /// Insert `frame` before index `at`; `at == len()` appends.
    pub fn insert(&mut self, at: usize, frame: Frame) -> GifloomResult<()> {
        if at > self.frames.len() {
            return Err(GifloomError::index_out_of_range(at, self.frames.len()));
        }
        self.frames.insert(at, frame);
        Ok(())
    }

    /// Remove the selected frames and return them in their former order.
    pub fn remove(&mut self, indices: &[usize]) -> GifloomResult<Vec<Frame>> {
        let selected = self.validate_selection(indices)?;
        let (removed, kept) = partition(std::mem::take(&mut self.frames), &selected);
        self.frames = kept;
        Ok(removed)
    }

    /// Move the selected frames, as one block in their relative order, to insertion point `to`.
    ///
    /// `to` is expressed in current coordinates (`0..=len()`): the block lands just before the
    /// frame that currently sits at `to`, or at the end for `to == len()`. When that frame is
    /// itself selected, the block lands before the next unselected frame.
    pub fn move_frames(&mut self, indices: &[usize], to: usize) -> GifloomResult<()> {
        let selected = self.validate_selection(indices)?;
        if to > self.frames.len() {
            return Err(GifloomError::index_out_of_range(to, self.frames.len()));
        }
        let dest = (0..to).filter(|i| selected.binary_search(i).is_err()).count();
        let (block, mut rest) = partition(std::mem::take(&mut self.frames), &selected);
        rest.splice(dest..dest, block);
        self.frames = rest;
        Ok(())
    }

    /// Copy the selected frames and insert the copies right after the last selected index.
    ///
    /// Returns the index range the copies occupy.
    pub fn duplicate(&mut self, indices: &[usize]) -> GifloomResult<Range<usize>> {
        let selected = self.validate_selection(indices)?;
        let copies: Vec<Frame> = selected.iter().map(|&i| self.frames[i].clone()).collect();
        let at = selected[selected.len() - 1] + 1;
        let n = copies.len();
        self.frames.splice(at..at, copies);
        Ok(at..at + n)
    }

    /// Set the duration of every selected frame.
    pub fn set_duration(&mut self, indices: &[usize], duration_ms: u32) -> GifloomResult<()> {
        check_duration(duration_ms)?;
        let selected = self.validate_selection(indices)?;
        for i in selected {
            self.frames[i].set_duration_ms(duration_ms)?;
        }
        Ok(())
    }

    /// Set the duration of every frame.
    pub fn set_all_durations(&mut self, duration_ms: u32) -> GifloomResult<()> {
        check_duration(duration_ms)?;
        for frame in &mut self.frames {
            frame.set_duration_ms(duration_ms)?;
        }
        Ok(())
    }

    /// Play the selected frames `count` times in total.
    ///
    /// The `count - 1` extra copies of the selection follow the last selected frame; everything
    /// else keeps its relative position. `[A, B]` repeated 3 times is `[A, B, A, B, A, B]`.
    pub fn repeat(&mut self, indices: &[usize], count: usize) -> GifloomResult<()> {
        if count < 1 {
            return Err(GifloomError::invalid_input("repeat count must be >= 1"));
        }
        let selected = self.validate_selection(indices)?;
        let added = selected
            .len()
            .checked_mul(count - 1)
            .filter(|&n| n <= MAX_FRAMES.saturating_sub(self.frames.len()))
            .ok_or_else(|| {
                GifloomError::invalid_input(format!(
                    "repeating {} frames {count} times exceeds {MAX_FRAMES} frames",
                    selected.len()
                ))
            })?;
        let block: Vec<Frame> = selected.iter().map(|&i| self.frames[i].clone()).collect();
        let at = selected[selected.len() - 1] + 1;
        let extra = block
            .iter()
            .cycle()
            .take(added)
            .cloned()
            .collect::<Vec<_>>();
        self.frames.splice(at..at, extra);
        Ok(())
    }

    /// Reverse the frames between the first and last selected index, inclusive.
    ///
    /// Unselected frames inside that range are reversed along with the selected ones and end up
    /// at their mirrored position.
    pub fn reverse(&mut self, indices: &[usize]) -> GifloomResult<()> {
        let selected = self.validate_selection(indices)?;
        let first = selected[0];
        let last = selected[selected.len() - 1];
        self.frames[first..=last].reverse();
        Ok(())
    }
}

/// Split `frames` into (selected, rest), both keeping relative order. `selected` is sorted.
fn partition(frames: Vec<Frame>, selected: &[usize]) -> (Vec<Frame>, Vec<Frame>) {
    let mut picked = Vec::with_capacity(selected.len());
    let mut rest = Vec::with_capacity(frames.len() - selected.len());
    for (i, frame) in frames.into_iter().enumerate() {
        if selected.binary_search(&i).is_ok() {
            picked.push(frame);
        } else {
            rest.push(frame);
        }
    }
    (picked, rest)
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/editor.rs"]
mod tests;
