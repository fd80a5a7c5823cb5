//! Self-play: choosing moves, playing games, labelling the result
//!
//! # Flow
//!
//! 1. [`play_game`] alternates the two [`Mover`]s until the rules engine
//!    reports game over, appending one [`ExperienceRecord`] per half-move
//! 2. [`label_outcomes`] rewrites every record's outcome from the point of
//!    view of the side that made the move
//! 3. The labelled records are appended to an [`ExperienceBuffer`]

pub mod experience;
pub mod game;
pub mod labeler;
pub mod mover;
pub mod selector;

pub use experience::{ExperienceBuffer, ExperienceRecord, PENDING_OUTCOME};
pub use game::{play_game, GameRecord};
pub use labeler::label_outcomes;
pub use mover::{MoveContext, Mover, SelfPlayConfig};
pub use selector::{select, top_k_indices, DEFAULT_TOP_K};
