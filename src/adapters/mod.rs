// Adapters layer: concrete implementations for the Tryton server and the shell.

pub mod loaders;
pub mod process;
pub mod rpc;
pub mod session;
