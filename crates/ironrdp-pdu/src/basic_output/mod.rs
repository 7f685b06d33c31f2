pub mod bitmap;
pub mod fast_path;
pub mod pointer;
pub mod surface_commands;
