mod controls;
mod data;
pub(in crate::app) mod details;
pub(in crate::app) mod fullscreen;
mod header;
pub(in crate::app) mod legend;
pub(in crate::app) mod notices;
pub(in crate::app) mod placement;
pub(in crate::app) mod zoom;
