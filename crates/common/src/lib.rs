// autolog-common: shared types and pure algorithms for the autolog workspace

pub mod diff;
pub mod journal;
pub mod types;
