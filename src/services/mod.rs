// Boundary services.
// Traits for the host browser and in-page agents, the periodic poller, the
// command dispatcher, badge rendering, and the stdio transport.

pub mod badge;
pub mod dispatcher;
pub mod host;
pub mod poller;
pub mod remote_agent;
pub mod stdio_bridge;
