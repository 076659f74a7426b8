mod reducer;
mod runtime;
mod shortcuts;

pub(in crate::app) use runtime::{Flow, Runtime};
