// Application layer: commands, queries, their buses and handlers, domain
// events, validation, and the scheme/license services.

pub mod command_bus;
pub mod command_handlers;
pub mod commands;
pub mod events;
pub mod queries;
pub mod query_bus;
pub mod query_handlers;
pub mod services;
pub mod validators;
