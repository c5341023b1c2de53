//! Background tasks

mod reaper;

pub use reaper::ReaperTask;
