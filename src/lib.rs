// Re-export modules for testing and external use
pub mod config;
pub mod error;

pub mod terraform {
    pub mod model;
    pub mod parser;
    pub mod scaffold;
    pub mod synth;

    // Re-export commonly used items
    pub use model::{Environment, ModuleDescription, OutputDeclaration, TfValue, VariableDeclaration};
    pub use scaffold::{ScaffoldError, ScaffoldReport};
}

pub mod registry {
    pub mod client;

    pub use client::{ModuleCheck, RegistryClient};
}

pub mod hub {
    pub mod client;

    pub use client::{HubClient, RepositoryFiles};
}

pub mod mcp {
    pub mod resources;
    pub mod server;
    pub mod types;

    pub use server::ScaffoldServer;
}

pub use config::Config;
pub use error::ApiError;
