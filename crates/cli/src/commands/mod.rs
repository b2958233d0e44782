//! CLI subcommands

pub mod convert;
pub mod inspect;
pub mod normalize;
