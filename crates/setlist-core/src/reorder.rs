//! Single-position moves within an ordered track list.

use crate::error::ReorderError;

/// Move the item at `from` to `to`, shifting everything in between by one.
///
/// Both indices must address existing items. `from == to` succeeds without
/// touching the list. On error the list is left as it was.
pub fn move_track<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), ReorderError> {
    let len = items.len();
    if from >= len || to >= len {
        return Err(ReorderError::OutOfBounds { from, to, len });
    }
    if from == to {
        return Ok(());
    }

    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Move the item at `index` one step towards the front.
///
/// The first item stays where it is.
pub fn move_up<T>(items: &mut Vec<T>, index: usize) -> Result<(), ReorderError> {
    move_track(items, index, index.saturating_sub(1))
}

/// Move the item at `index` one step towards the back.
///
/// The last item stays where it is.
pub fn move_down<T>(items: &mut Vec<T>, index: usize) -> Result<(), ReorderError> {
    let to = index
        .checked_add(1)
        .filter(|next| *next < items.len())
        .unwrap_or(index);
    move_track(items, index, to)
}
