//! Move selection from a policy distribution
//!
//! The top `k` policy entries are tried in descending probability order and
//! the first one that names a legal move of the position wins. When none of
//! them does, a uniformly random legal move is played instead, so selection
//! never fails on a position that still has moves.

use chess_rules::{GameState, Move};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::encoding::MoveIndex;

/// Number of policy entries tried before falling back to a random move
pub const DEFAULT_TOP_K: usize = 10;

/// Policy indices of the `k` largest probabilities, largest first
///
/// Ties keep the lower index first. Non-finite entries are never chosen.
pub fn top_k_indices(policy: &[f32], k: usize) -> Vec<MoveIndex> {
    let mut ranked: Vec<(usize, f32)> = policy
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, p)| p.is_finite())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .filter_map(|(index, _)| MoveIndex::new(index))
        .take(k)
        .collect()
}

/// Pick a legal move of `state` from `policy`
///
/// Returns `None` only when `state` has no legal moves.
pub fn select<R: Rng + ?Sized>(
    policy: &[f32],
    state: &GameState,
    top_k: usize,
    rng: &mut R,
) -> Option<Move> {
    let legal = state.legal_moves();
    top_k_indices(policy, top_k)
        .into_iter()
        .find_map(|index| index.resolve_in(&legal))
        .or_else(|| legal.choose(rng))
        .cloned()
}
