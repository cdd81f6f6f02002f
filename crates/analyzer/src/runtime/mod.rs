//! Runtime module — process lifecycle: boot, command dispatch, rendering.

pub mod boot;
pub mod run;
